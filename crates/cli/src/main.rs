mod app;
mod config;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use trialdesk_api::{Identity, User};
use trialdesk_query::Queries;

use app::App;
use output::print_json;

#[derive(Parser)]
#[command(name = "trialdesk", about = "TrialDesk CLI - clinical trial dashboard data")]
struct Cli {
    /// Path to a trialdesk.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Act as the site with this number
    #[arg(long, global = true, conflicts_with = "sponsor")]
    site: Option<u32>,

    /// Act as the sponsor with this number
    #[arg(long, global = true)]
    sponsor: Option<u32>,

    /// Override the simulated backend latency
    #[arg(long, global = true)]
    latency_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print the current user
    Whoami,

    /// Print the home dashboard for the current user
    Dashboard,

    /// Matching trials for a site, or matching sites for one of a sponsor's trials
    Matches {
        /// Trial to match sites against (sponsors only)
        trial_id: Option<String>,
    },

    /// Show a trial with its participating sites
    Trial { trial_id: String },

    /// List the current site's documents for a trial
    Documents { trial_id: String },

    /// Accept a pending invitation and print the refreshed pending list
    ///
    /// The mock backend lives only as long as this process, so the change
    /// is not visible to later runs.
    Accept {
        trial_id: String,
        /// Requesting site (sponsors only)
        site_id: Option<String>,
    },

    /// Decline a pending invitation and print the refreshed pending list
    ///
    /// The mock backend lives only as long as this process, so the change
    /// is not visible to later runs.
    Decline {
        trial_id: String,
        /// Requesting site (sponsors only)
        site_id: Option<String>,
    },

    /// Forget the saved login
    Logout,

    /// Show the effective configuration
    Config,
}

impl Cli {
    fn requested_identity(&self) -> Option<Identity> {
        self.site
            .map(Identity::site)
            .or_else(|| self.sponsor.map(Identity::sponsor))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trialdesk=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = config::resolve_path(cli.config.as_deref());
    let config = config::load(config_path.as_deref())?;

    if let Commands::Config = cli.command {
        return config::show_config(&config, config_path.as_deref());
    }

    let app = App::build(&config, cli.latency_ms.map(Duration::from_millis))?;

    if let Commands::Logout = cli.command {
        app.session.logout();
        return print_json(&json!({ "logged_out": true }));
    }

    let user = app.current_user(cli.requested_identity()).await?;
    let q = &app.queries;

    match (&cli.command, &user) {
        (Commands::Whoami, _) => print_json(&user),

        (Commands::Dashboard, User::Site(site)) => {
            let (analytics, trials, invitations) = tokio::try_join!(
                q.site_analytics(&site.id),
                q.site_trials(&site.id),
                q.site_invitations(&site.id),
            )?;
            print_json(&json!({
                "user": &user,
                "analytics": &*analytics,
                "trials": &*trials,
                "pending_invitations": &*invitations,
            }))
        }
        (Commands::Dashboard, User::Sponsor(sponsor)) => {
            let (details, invitations) = tokio::try_join!(
                q.sponsor_details(&sponsor.id),
                q.sponsor_invitations(&sponsor.id),
            )?;
            print_json(&json!({
                "user": &user,
                "details": &*details,
                "pending_invitations": &*invitations,
            }))
        }

        (Commands::Matches { .. }, User::Site(site)) => {
            print_json(&*q.matching_trials(&site.id).await?)
        }
        (Commands::Matches { trial_id: Some(trial_id) }, User::Sponsor(_)) => {
            print_json(&*q.matching_sites(trial_id).await?)
        }
        (Commands::Matches { trial_id: None }, User::Sponsor(_)) => {
            bail!("sponsors must name the trial to match sites against")
        }

        (Commands::Trial { trial_id }, _) => print_json(&*q.trial_with_sites(trial_id).await?),

        (Commands::Documents { trial_id }, User::Site(site)) => {
            print_json(&*q.site_trial_documents(&site.id, trial_id).await?)
        }
        (Commands::Documents { .. }, User::Sponsor(_)) => {
            bail!("documents are only available to sites")
        }

        (Commands::Accept { trial_id, site_id }, _) => {
            answer(q, &user, trial_id, site_id.as_deref(), Answer::Accept).await
        }
        (Commands::Decline { trial_id, site_id }, _) => {
            answer(q, &user, trial_id, site_id.as_deref(), Answer::Decline).await
        }

        (Commands::Logout | Commands::Config, _) => Ok(()),
    }
}

#[derive(Clone, Copy)]
enum Answer {
    Accept,
    Decline,
}

/// Answer an invitation, then read the pending list back through the cache
/// so the invalidated query is refetched.
async fn answer(
    q: &Queries,
    user: &User,
    trial_id: &str,
    site_id: Option<&str>,
    choice: Answer,
) -> Result<()> {
    match (user, site_id) {
        (User::Site(site), _) => {
            let before = q.site_invitations(&site.id).await?;
            let result = match choice {
                Answer::Accept => q.accept_trial_invitation(&site.id, trial_id).await?,
                Answer::Decline => q.decline_trial_invitation(&site.id, trial_id).await?,
            };
            let after = q.site_invitations(&site.id).await?;
            print_json(&json!({
                "result": result,
                "pending_before": before.total_count,
                "pending_invitations": &*after,
            }))
        }
        (User::Sponsor(sponsor), Some(site_id)) => {
            let before = q.sponsor_invitations(&sponsor.id).await?;
            let result = match choice {
                Answer::Accept => q.accept_site_invitation(trial_id, site_id).await?,
                Answer::Decline => q.decline_site_invitation(trial_id, site_id).await?,
            };
            let after = q.sponsor_invitations(&sponsor.id).await?;
            print_json(&json!({
                "result": result,
                "pending_before": before.total_count,
                "pending_invitations": &*after,
            }))
        }
        (User::Sponsor(_), None) => bail!("sponsors must name the requesting site"),
    }
}
