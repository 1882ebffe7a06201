//! Input validation for experiments.
//!
//! Checks structural integrity of jobs and resource definitions before an
//! optimizer is built. Detects:
//! - Duplicate IDs
//! - Empty workloads and pools
//! - Pools too small to mutate over
//! - Negative or non-finite times and prices
//!
//! All problems are collected in one pass so a bad experiment file can be
//! fixed at once.

use crate::models::{Job, PricingSpec, ResourceSpec};
use std::collections::HashSet;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// No jobs to schedule.
    EmptyWorkload,
    /// No resources to schedule on.
    EmptyResourcePool,
    /// Only one resource, so no job can ever move.
    SingleResource,
    /// A job time is negative or not finite.
    InvalidTime,
    /// A pricing parameter is negative or not finite.
    InvalidPrice,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Validates the input data of an experiment.
///
/// Checks:
/// 1. No duplicate job IDs
/// 2. No duplicate resource IDs
/// 3. At least one job and at least two resources
/// 4. Submit, run, and wall times are finite and non-negative
/// 5. Pricing parameters are finite and non-negative
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(jobs: &[Job], resources: &[ResourceSpec]) -> ValidationResult {
    let mut errors = Vec::new();

    if jobs.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyWorkload,
            "Workload has no jobs",
        ));
    }
    match resources.len() {
        0 => errors.push(ValidationError::new(
            ValidationErrorKind::EmptyResourcePool,
            "Resource pool has no resources",
        )),
        1 => errors.push(ValidationError::new(
            ValidationErrorKind::SingleResource,
            format!(
                "Resource pool has only resource {}; mutation needs at least two",
                resources[0].id
            ),
        )),
        _ => {}
    }

    let mut job_ids = HashSet::new();
    for job in jobs {
        if !job_ids.insert(job.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate job ID: {}", job.id),
            ));
        }
        for (name, value) in [
            ("submit time", job.submit_time),
            ("run time", job.run_time),
            ("wall time", job.wall_time),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidTime,
                    format!("Job {} has invalid {name}: {value}", job.id),
                ));
            }
        }
    }

    let mut resource_ids = HashSet::new();
    for r in resources {
        if !resource_ids.insert(r.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate resource ID: {}", r.id),
            ));
        }
        let params = match r.pricing {
            PricingSpec::Linear { base, rate } => vec![("base", base), ("rate", rate)],
            PricingSpec::Flat { price } => vec![("price", price)],
        };
        for (name, value) in params {
            if !value.is_finite() || value < 0.0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidPrice,
                    format!("Resource '{}' has invalid {name}: {value}", r.name),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_jobs() -> Vec<Job> {
        vec![
            Job::new(1, 0.0, 10.0),
            Job::new(2, 5.0, 3.0).with_wall_time(6.0),
            Job::new(7, 5.0, 1.0),
        ]
    }

    fn sample_resources() -> Vec<ResourceSpec> {
        vec![
            ResourceSpec::linear(0, 0.0, 0.1),
            ResourceSpec::linear(1, 1.0, 0.2).with_name("fast"),
        ]
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_input(&sample_jobs(), &sample_resources()).is_ok());
    }

    #[test]
    fn test_duplicate_job_id() {
        let mut jobs = sample_jobs();
        jobs.push(Job::new(2, 9.0, 1.0));

        let errors = validate_input(&jobs, &sample_resources()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("job")));
    }

    #[test]
    fn test_duplicate_resource_id() {
        let resources = vec![ResourceSpec::linear(0, 0.0, 0.1), ResourceSpec::linear(0, 0.0, 0.2)];

        let errors = validate_input(&sample_jobs(), &resources).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("resource")));
    }

    #[test]
    fn test_single_resource() {
        let resources = vec![ResourceSpec::linear(3, 0.0, 0.1)];

        let errors = validate_input(&sample_jobs(), &resources).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::SingleResource);
    }

    #[test]
    fn test_invalid_times() {
        let jobs = vec![Job::new(1, -1.0, 2.0), Job::new(2, 0.0, f64::NAN)];

        let errors = validate_input(&jobs, &sample_resources()).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::InvalidTime)
                .count(),
            // NaN run time also propagates into the default wall time.
            3
        );
    }

    #[test]
    fn test_invalid_price() {
        let mut resources = sample_resources();
        resources.push(ResourceSpec {
            id: 2,
            name: "broken".into(),
            pricing: PricingSpec::Flat { price: -1.0 },
        });

        let errors = validate_input(&sample_jobs(), &resources).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidPrice && e.message.contains("broken")));
    }

    #[test]
    fn test_multiple_errors() {
        let errors = validate_input(&[], &[]).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].to_string().contains("EmptyWorkload"));
    }
}
