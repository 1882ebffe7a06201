//! Workload model and trace parsing.
//!
//! A workload is the fixed, read-only set of jobs of one experiment. It acts
//! as the arena for [`Job`] values: resources and schedules hold only job
//! ids and resolve them here.
//!
//! # Trace Format
//!
//! One job per line, whitespace separated:
//!
//! ```text
//! # job_id submit_time run_time wall_time size
//! 1 0 5 10 1
//! 2 0 3 10 1
//! ```
//!
//! Lines starting with `#` and blank lines are ignored. Ids need not be
//! contiguous or sorted; trailing extra columns are ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::{Job, JobId};
use crate::error::{PaesError, Result};

/// Read-only collection of jobs keyed by job id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workload {
    jobs: BTreeMap<JobId, Job>,
}

impl Workload {
    /// Creates an empty workload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a workload from jobs, rejecting duplicate ids.
    pub fn from_jobs(jobs: impl IntoIterator<Item = Job>) -> Result<Self> {
        let mut workload = Self::new();
        for job in jobs {
            workload.add(job)?;
        }
        Ok(workload)
    }

    /// Parses a workload trace (see module docs for the format).
    ///
    /// # Example
    /// ```
    /// use u_paes::models::Workload;
    ///
    /// let trace = "# id submit run wall size\n4 0 5 10 1\n2 0 3 10 1\n";
    /// let workload = Workload::parse_trace(trace).unwrap();
    /// assert_eq!(workload.len(), 2);
    /// assert_eq!(workload.job_ids(), vec![2, 4]);
    /// ```
    pub fn parse_trace(text: &str) -> Result<Self> {
        let mut workload = Self::new();
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let id: JobId = parse_field(fields.next(), "job id", line_no)?;
            let submit_time: f64 = parse_field(fields.next(), "submit time", line_no)?;
            let run_time: f64 = parse_field(fields.next(), "run time", line_no)?;
            let wall_time: f64 = parse_field(fields.next(), "wall time", line_no)?;
            let size: u32 = parse_field(fields.next(), "size", line_no)?;

            workload
                .add(
                    Job::new(id, submit_time, run_time)
                        .with_wall_time(wall_time)
                        .with_size(size),
                )
                .map_err(|e| PaesError::trace(line_no, e.to_string()))?;
        }
        Ok(workload)
    }

    /// Adds a job.
    pub fn add(&mut self, job: Job) -> Result<()> {
        if self.jobs.contains_key(&job.id) {
            return Err(PaesError::DuplicateJob(job.id));
        }
        self.jobs.insert(job.id, job);
        Ok(())
    }

    /// Looks up a job.
    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    /// Looks up a job, failing for ids outside the workload.
    pub fn job(&self, id: JobId) -> Result<&Job> {
        self.get(id).ok_or(PaesError::UnknownJob(id))
    }

    /// Job ids in increasing order.
    pub fn job_ids(&self) -> Vec<JobId> {
        self.jobs.keys().copied().collect()
    }

    /// Jobs in increasing id order.
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    /// Number of jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the workload holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Sum of run times over all jobs.
    pub fn total_run_time(&self) -> f64 {
        self.jobs.values().map(|j| j.run_time).sum()
    }

    /// Ids of jobs submitted earlier than their id-order predecessor.
    ///
    /// Resources process jobs in id order, so each id returned here marks a
    /// place where the simulated queue differs from submit-time order.
    pub fn submit_order_inversions(&self) -> Vec<JobId> {
        let mut inversions = Vec::new();
        let mut last_submit = f64::NEG_INFINITY;
        for job in self.jobs.values() {
            if job.submit_time < last_submit {
                inversions.push(job.id);
            }
            last_submit = last_submit.max(job.submit_time);
        }
        inversions
    }

    /// One-line description.
    pub fn summary(&self) -> String {
        format!(
            "Workload of {} jobs, total run time {}",
            self.len(),
            self.total_run_time()
        )
    }
}

fn parse_field<T: FromStr>(field: Option<&str>, name: &str, line: usize) -> Result<T> {
    let raw = field.ok_or_else(|| PaesError::trace(line, format!("missing {name}")))?;
    raw.parse()
        .map_err(|_| PaesError::trace(line, format!("invalid {name}: '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trace() {
        let trace = "\
# comment line
10 0 5 10 1

3 2.5 3 4 2
7 1 1 1 1 extra columns
";
        let w = Workload::parse_trace(trace).unwrap();
        assert_eq!(w.len(), 3);
        assert_eq!(w.job_ids(), vec![3, 7, 10]);

        let j = w.job(3).unwrap();
        assert!((j.submit_time - 2.5).abs() < 1e-10);
        assert!((j.run_time - 3.0).abs() < 1e-10);
        assert!((j.wall_time - 4.0).abs() < 1e-10);
        assert_eq!(j.size, 2);
    }

    #[test]
    fn test_parse_missing_field() {
        let err = Workload::parse_trace("1 0 5 10 1\n2 0 3\n").unwrap_err();
        assert_eq!(err, PaesError::trace(2, "missing wall time"));
    }

    #[test]
    fn test_parse_invalid_number() {
        let err = Workload::parse_trace("x 0 5 10 1\n").unwrap_err();
        assert!(matches!(err, PaesError::TraceParse { line: 1, .. }));
    }

    #[test]
    fn test_parse_duplicate_id() {
        let err = Workload::parse_trace("1 0 5 10 1\n1 0 3 10 1\n").unwrap_err();
        assert!(matches!(err, PaesError::TraceParse { line: 2, .. }));
    }

    #[test]
    fn test_duplicate_add() {
        let mut w = Workload::new();
        w.add(Job::new(1, 0.0, 1.0)).unwrap();
        assert_eq!(
            w.add(Job::new(1, 5.0, 1.0)).unwrap_err(),
            PaesError::DuplicateJob(1)
        );
    }

    #[test]
    fn test_unknown_job() {
        let w = Workload::from_jobs([Job::new(1, 0.0, 1.0)]).unwrap();
        assert!(w.get(2).is_none());
        assert_eq!(w.job(2).unwrap_err(), PaesError::UnknownJob(2));
    }

    #[test]
    fn test_submit_order_inversions() {
        let w = Workload::from_jobs([
            Job::new(1, 0.0, 1.0),
            Job::new(2, 10.0, 1.0),
            Job::new(3, 5.0, 1.0),
            Job::new(4, 12.0, 1.0),
        ])
        .unwrap();
        assert_eq!(w.submit_order_inversions(), vec![3]);
    }

    #[test]
    fn test_total_run_time() {
        let w = Workload::from_jobs([Job::new(1, 0.0, 5.0), Job::new(2, 0.0, 3.0)]).unwrap();
        assert!((w.total_run_time() - 8.0).abs() < 1e-10);
        assert!(w.summary().contains("2 jobs"));
    }
}
