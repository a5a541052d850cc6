use std::fmt;

/// Stable identity of a dashboard query: what data, for which record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    SiteAnalytics(String),
    SiteTrials(String),
    SiteInvitations(String),
    SiteTrialDocuments { site_id: String, trial_id: String },
    MatchingTrials(String),
    SponsorDetails(String),
    SponsorInvitations(String),
    TrialDetails(String),
    TrialSites(String),
    TrialWithSites(String),
    MatchingSites(String),
}

impl QueryKey {
    /// Entity-type segment, e.g. `site-trials`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SiteAnalytics(_) => "site-analytics",
            Self::SiteTrials(_) => "site-trials",
            Self::SiteInvitations(_) => "site-invitations",
            Self::SiteTrialDocuments { .. } => "site-trial-documents",
            Self::MatchingTrials(_) => "matching-trials",
            Self::SponsorDetails(_) => "sponsor-details",
            Self::SponsorInvitations(_) => "sponsor-invitations",
            Self::TrialDetails(_) => "trial-details",
            Self::TrialSites(_) => "trial-sites",
            Self::TrialWithSites(_) => "trial-with-sites",
            Self::MatchingSites(_) => "matching-sites",
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SiteTrialDocuments { site_id, trial_id } => {
                write!(f, "[{}, {site_id}, {trial_id}]", self.kind())
            }
            Self::SiteAnalytics(id)
            | Self::SiteTrials(id)
            | Self::SiteInvitations(id)
            | Self::MatchingTrials(id)
            | Self::SponsorDetails(id)
            | Self::SponsorInvitations(id)
            | Self::TrialDetails(id)
            | Self::TrialSites(id)
            | Self::TrialWithSites(id)
            | Self::MatchingSites(id) => write!(f, "[{}, {id}]", self.kind()),
        }
    }
}

/// A state-changing facade call and the queries it makes stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Site accepts a sponsor's invitation.
    AcceptTrialInvitation { site_id: String, trial_id: String },
    DeclineTrialInvitation { site_id: String, trial_id: String },
    /// Sponsor accepts a site's request to join a trial.
    AcceptSiteInvitation { trial_id: String, site_id: String },
    DeclineSiteInvitation { trial_id: String, site_id: String },
}

impl Mutation {
    /// Whether a successful run of this mutation makes `key` stale.
    pub fn affects(&self, key: &QueryKey) -> bool {
        use QueryKey as K;
        match self {
            Self::AcceptTrialInvitation { site_id, trial_id } => match key {
                K::SiteInvitations(s) | K::SiteTrials(s) | K::MatchingTrials(s) => s == site_id,
                K::TrialSites(t) | K::TrialWithSites(t) | K::MatchingSites(t) => t == trial_id,
                // Accepting also settles the site's own request, if any.
                K::SponsorInvitations(_) => true,
                _ => false,
            },
            Self::DeclineTrialInvitation { site_id, .. } => {
                matches!(key, K::SiteInvitations(s) | K::SiteTrials(s) if s == site_id)
            }
            Self::AcceptSiteInvitation { trial_id, site_id } => match key {
                K::SponsorInvitations(_) | K::SponsorDetails(_) => true,
                K::TrialDetails(t) | K::TrialSites(t) | K::TrialWithSites(t) | K::MatchingSites(t) => {
                    t == trial_id
                }
                K::SiteTrials(s) | K::SiteInvitations(s) | K::MatchingTrials(s) => s == site_id,
                _ => false,
            },
            Self::DeclineSiteInvitation { trial_id, .. } => match key {
                K::SponsorInvitations(_) => true,
                K::MatchingSites(t) => t == trial_id,
                _ => false,
            },
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcceptTrialInvitation { site_id, trial_id } => {
                write!(f, "accept trial invitation ({site_id}, {trial_id})")
            }
            Self::DeclineTrialInvitation { site_id, trial_id } => {
                write!(f, "decline trial invitation ({site_id}, {trial_id})")
            }
            Self::AcceptSiteInvitation { trial_id, site_id } => {
                write!(f, "accept site invitation ({trial_id}, {site_id})")
            }
            Self::DeclineSiteInvitation { trial_id, site_id } => {
                write!(f, "decline site invitation ({trial_id}, {site_id})")
            }
        }
    }
}
