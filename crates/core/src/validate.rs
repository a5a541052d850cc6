use crate::{MatchRecord, SiteAnalytics, Trial};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("missing required field: {field}")]
    MissingField { field: String },
    #[error("{field} must be a percentage (0-100), got {value}")]
    PercentOutOfRange { field: String, value: u32 },
    #[error("role distribution sums to {sum}, expected total_staff {total}")]
    RoleDistributionMismatch { sum: u32, total: u32 },
    #[error("{field} ({value}) exceeds {limit_field} ({limit})")]
    ExceedsTotal {
        field: String,
        value: u32,
        limit_field: String,
        limit: u32,
    },
}

/// Validate a site analytics snapshot by composing independent validators.
pub fn validate_analytics(analytics: &SiteAnalytics) -> Result<(), Vec<ValidationError>> {
    let validators: &[fn(&SiteAnalytics) -> Vec<ValidationError>] = &[
        validate_analytics_fields,
        validate_staff,
        validate_readiness,
        validate_patients,
    ];
    collect(validators.iter().flat_map(|v| v(analytics)))
}

/// Validate a precomputed match: score within 0–100, eligible within total.
pub fn validate_match(record: &MatchRecord) -> Result<(), Vec<ValidationError>> {
    let mut errors = missing_fields(&[
        ("site_id", &record.site_id),
        ("trial_id", &record.trial_id),
    ]);
    errors.extend(percent("compatibility_score", record.compatibility_score));
    errors.extend(not_exceeding(
        ("eligible_patients", record.eligible_patients),
        ("total_patients", record.total_patients),
    ));
    collect(errors)
}

pub fn validate_trial(trial: &Trial) -> Result<(), Vec<ValidationError>> {
    collect(missing_fields(&[
        ("id", &trial.id),
        ("name", &trial.name),
        ("sponsor_id", &trial.sponsor_id),
    ]))
}

fn collect(errors: impl IntoIterator<Item = ValidationError>) -> Result<(), Vec<ValidationError>> {
    let errors: Vec<ValidationError> = errors.into_iter().collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn missing_fields(fields: &[(&str, &String)]) -> Vec<ValidationError> {
    fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| ValidationError::MissingField {
            field: field.to_string(),
        })
        .collect()
}

fn percent(field: &str, value: u8) -> Option<ValidationError> {
    (value > 100).then(|| ValidationError::PercentOutOfRange {
        field: field.to_string(),
        value: u32::from(value),
    })
}

fn not_exceeding((field, value): (&str, u32), (limit_field, limit): (&str, u32)) -> Option<ValidationError> {
    (value > limit).then(|| ValidationError::ExceedsTotal {
        field: field.to_string(),
        value,
        limit_field: limit_field.to_string(),
        limit,
    })
}

fn validate_analytics_fields(analytics: &SiteAnalytics) -> Vec<ValidationError> {
    missing_fields(&[("site_id", &analytics.site_id)])
}

fn validate_staff(analytics: &SiteAnalytics) -> Vec<ValidationError> {
    let staff = &analytics.staff_statistics;
    let mut errors = Vec::new();
    let sum = staff.role_total();
    if sum != staff.total_staff {
        errors.push(ValidationError::RoleDistributionMismatch {
            sum,
            total: staff.total_staff,
        });
    }
    errors.extend(not_exceeding(
        ("active_staff", staff.active_staff),
        ("total_staff", staff.total_staff),
    ));
    errors
}

fn validate_readiness(analytics: &SiteAnalytics) -> Vec<ValidationError> {
    let readiness = &analytics.site_readiness;
    [
        ("overall_score", readiness.overall_score),
        ("document_completion", readiness.document_completion),
        ("training_completion", readiness.training_completion),
    ]
    .into_iter()
    .filter_map(|(field, value)| percent(field, value))
    .collect()
}

fn validate_patients(analytics: &SiteAnalytics) -> Vec<ValidationError> {
    let patients = &analytics.patient_statistics;
    [
        not_exceeding(
            ("eligible_patients", patients.eligible_patients),
            ("total_patients", patients.total_patients),
        ),
        not_exceeding(
            ("enrolled_patients", patients.enrolled_patients),
            ("eligible_patients", patients.eligible_patients),
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}
