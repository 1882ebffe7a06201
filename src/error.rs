//! Error types.
//!
//! Every operation in this crate is an in-memory, deterministic computation,
//! so nothing here is retried. An error is either a contract violation by
//! the caller (stale state, an out-of-range grid lookup, unknown ids) or a
//! precondition on the input data (trace syntax, empty pools).

use thiserror::Error;

use crate::models::{JobId, ResourceId};

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PaesError>;

/// Errors raised by the PAES engine and its input helpers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PaesError {
    /// Cached totals were read while flagged invalid.
    #[error("stale state: totals of {entity} read while tainted")]
    StaleState {
        /// Description of the tainted entity.
        entity: String,
    },

    /// A grid address was requested for a value outside the tracked range.
    #[error("value {value} lies outside the tracked range [{min}, {max}]")]
    InvalidLocation { value: f64, min: f64, max: f64 },

    /// A job id is not part of the workload.
    #[error("unknown job id: {0}")]
    UnknownJob(JobId),

    /// A resource id is not part of the pool.
    #[error("unknown resource id: {0}")]
    UnknownResource(ResourceId),

    /// A job id was added twice to one workload.
    #[error("duplicate job id: {0}")]
    DuplicateJob(JobId),

    /// A resource id was added twice to one pool.
    #[error("duplicate resource id: {0}")]
    DuplicateResource(ResourceId),

    /// The workload holds no jobs.
    #[error("workload is empty")]
    EmptyWorkload,

    /// The resource pool holds no resources.
    #[error("resource pool is empty")]
    EmptyResourcePool,

    /// Mutation needs at least one assignment and two resources.
    #[error("cannot mutate: {0}")]
    CannotMutate(String),

    /// A workload trace line could not be parsed.
    #[error("trace line {line}: {message}")]
    TraceParse { line: usize, message: String },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PaesError {
    pub(crate) fn stale(entity: impl Into<String>) -> Self {
        Self::StaleState {
            entity: entity.into(),
        }
    }

    pub(crate) fn trace(line: usize, message: impl Into<String>) -> Self {
        Self::TraceParse {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = PaesError::stale("resource 3");
        assert_eq!(e.to_string(), "stale state: totals of resource 3 read while tainted");

        let e = PaesError::InvalidLocation {
            value: 12.0,
            min: 0.0,
            max: 10.0,
        };
        assert!(e.to_string().contains("[0, 10]"));

        let e = PaesError::trace(7, "missing run time");
        assert_eq!(e.to_string(), "trace line 7: missing run time");
    }
}
