//! Job model.
//!
//! A job is a single-resource unit of work taken from a workload trace.
//! Jobs are immutable once created; every other component refers to them
//! by [`JobId`] through the owning [`Workload`](super::Workload).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Job identifier as found in the workload trace.
pub type JobId = u32;

/// A job to be placed on exactly one resource.
///
/// # Time Representation
/// All times share the trace's unit (seconds in the traces this crate was
/// built for) relative to the trace epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier within its workload.
    pub id: JobId,
    /// Time the job enters the system.
    pub submit_time: f64,
    /// Actual processing time.
    pub run_time: f64,
    /// Requested (upper bound) processing time.
    pub wall_time: f64,
    /// Requested processor count. Carried through, not simulated.
    pub size: u32,
}

impl Job {
    /// Creates a single-processor job whose wall time equals its run time.
    pub fn new(id: JobId, submit_time: f64, run_time: f64) -> Self {
        Self {
            id,
            submit_time,
            run_time,
            wall_time: run_time,
            size: 1,
        }
    }

    /// Sets the requested wall time.
    pub fn with_wall_time(mut self, wall_time: f64) -> Self {
        self.wall_time = wall_time;
        self
    }

    /// Sets the requested processor count.
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Job {}: submit={}, run={}, wall={}, size={}",
            self.id, self.submit_time, self.run_time, self.wall_time, self.size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_builder() {
        let job = Job::new(7, 10.0, 25.0).with_wall_time(60.0).with_size(4);
        assert_eq!(job.id, 7);
        assert!((job.submit_time - 10.0).abs() < 1e-10);
        assert!((job.run_time - 25.0).abs() < 1e-10);
        assert!((job.wall_time - 60.0).abs() < 1e-10);
        assert_eq!(job.size, 4);
    }

    #[test]
    fn test_job_defaults() {
        let job = Job::new(1, 0.0, 5.0);
        assert!((job.wall_time - 5.0).abs() < 1e-10);
        assert_eq!(job.size, 1);
    }

    #[test]
    fn test_job_display() {
        let job = Job::new(3, 1.0, 2.0);
        assert_eq!(job.to_string(), "Job 3: submit=1, run=2, wall=2, size=1");
    }
}
