//! Resource model and single-queue simulation.
//!
//! A resource is a named, priced execution unit. Besides its fixed identity
//! it carries derived state, rebuilt from scratch every time a schedule is
//! evaluated: the set of jobs currently assigned to it, one [`Allocation`]
//! per job, and cumulative totals.
//!
//! # Algorithm
//!
//! [`SimpleResource`] is a single-server first-come-first-served queue.
//! Jobs are processed in increasing job-id order:
//!
//! ```text
//! start  = max(free_time, submit_time)
//! queue  = start - submit_time
//! finish = start + run_time
//! free_time = finish
//! ```
//!
//! Id order equals submit order for the traces this crate targets; use
//! [`Workload::submit_order_inversions`] to detect traces where it does not.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Debug;

use super::{JobId, PricingPlan, Workload};
use crate::error::{PaesError, Result};

/// Resource identifier.
pub type ResourceId = u32;

/// Simulated placement of one job on one resource.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Allocated job.
    pub job_id: JobId,
    /// Time the job starts running.
    pub start_time: f64,
    /// Time spent waiting: `start_time - submit_time`.
    pub queue_time: f64,
    /// Time the job finishes.
    pub finish_time: f64,
    /// Price charged by the resource's plan.
    pub price: f64,
}

impl Allocation {
    /// Submit time recovered from start and queue time.
    #[inline]
    pub fn submit_time(&self) -> f64 {
        self.start_time - self.queue_time
    }
}

/// An execution unit that simulates its own job queue.
pub trait Resource: Debug + Send {
    /// Resource identifier, unique within its pool.
    fn id(&self) -> ResourceId;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Pricing plan bound to this resource.
    fn pricing(&self) -> &dyn PricingPlan;

    /// Adds a job to the pending set and marks the resource tainted.
    fn add_job(&mut self, job_id: JobId);

    /// Clears jobs, allocations and totals. Leaves the resource clean.
    fn remove_all_jobs(&mut self);

    /// Recomputes every allocation and the totals from the pending jobs.
    fn reschedule(&mut self, workload: &Workload) -> Result<()>;

    /// Whether the totals are out of date.
    fn is_tainted(&self) -> bool;

    /// Number of pending jobs.
    fn job_count(&self) -> usize;

    /// Allocations in processing order.
    fn allocations(&self) -> &[Allocation];

    /// Sum of queue times. Fails while tainted.
    fn total_queue_time(&self) -> Result<f64>;

    /// Sum of prices. Fails while tainted.
    fn total_price(&self) -> Result<f64>;

    /// Verifies the allocations form a valid FCFS queue.
    ///
    /// Diagnostic only: violations are logged and reported as `false`.
    fn sanity_check(&self) -> bool;

    /// One-line description.
    fn describe(&self) -> String;
}

/// Single-server FCFS resource.
#[derive(Debug)]
pub struct SimpleResource {
    id: ResourceId,
    name: String,
    pricing: Box<dyn PricingPlan>,
    jobs: BTreeSet<JobId>,
    allocations: Vec<Allocation>,
    total_queue_time: f64,
    total_price: f64,
    tainted: bool,
}

impl SimpleResource {
    /// Creates an idle resource.
    pub fn new(id: ResourceId, name: impl Into<String>, pricing: Box<dyn PricingPlan>) -> Self {
        Self {
            id,
            name: name.into(),
            pricing,
            jobs: BTreeSet::new(),
            allocations: Vec::new(),
            total_queue_time: 0.0,
            total_price: 0.0,
            tainted: false,
        }
    }

    /// Finds the allocation of a job.
    pub fn allocation(&self, job_id: JobId) -> Option<&Allocation> {
        self.allocations.iter().find(|a| a.job_id == job_id)
    }
}

impl Resource for SimpleResource {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn pricing(&self) -> &dyn PricingPlan {
        self.pricing.as_ref()
    }

    fn add_job(&mut self, job_id: JobId) {
        self.jobs.insert(job_id);
        self.tainted = true;
    }

    fn remove_all_jobs(&mut self) {
        self.jobs.clear();
        self.allocations.clear();
        self.total_queue_time = 0.0;
        self.total_price = 0.0;
        self.tainted = false;
    }

    fn reschedule(&mut self, workload: &Workload) -> Result<()> {
        self.allocations.clear();
        self.allocations.reserve(self.jobs.len());
        let mut total_queue_time = 0.0;
        let mut total_price = 0.0;
        let mut free_time = 0.0_f64;

        for &job_id in &self.jobs {
            let job = workload.job(job_id)?;
            let start_time = free_time.max(job.submit_time);
            let queue_time = start_time - job.submit_time;
            let finish_time = start_time + job.run_time;
            let price = self.pricing.price(job);

            total_queue_time += queue_time;
            total_price += price;
            free_time = finish_time;

            self.allocations.push(Allocation {
                job_id,
                start_time,
                queue_time,
                finish_time,
                price,
            });
        }

        self.total_queue_time = total_queue_time;
        self.total_price = total_price;
        self.tainted = false;
        tracing::trace!(
            resource = self.id,
            jobs = self.jobs.len(),
            queue_time = total_queue_time,
            price = total_price,
            "rescheduled"
        );
        Ok(())
    }

    fn is_tainted(&self) -> bool {
        self.tainted
    }

    fn job_count(&self) -> usize {
        self.jobs.len()
    }

    fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    fn total_queue_time(&self) -> Result<f64> {
        if self.tainted {
            return Err(PaesError::stale(format!("resource {}", self.id)));
        }
        Ok(self.total_queue_time)
    }

    fn total_price(&self) -> Result<f64> {
        if self.tainted {
            return Err(PaesError::stale(format!("resource {}", self.id)));
        }
        Ok(self.total_price)
    }

    fn sanity_check(&self) -> bool {
        let mut ok = true;
        let mut previous: Option<&Allocation> = None;

        for current in &self.allocations {
            let submit = current.submit_time();
            if current.start_time < submit {
                tracing::warn!(
                    resource = self.id,
                    job = current.job_id,
                    start = current.start_time,
                    submit,
                    "job starts before its submission"
                );
                ok = false;
            }
            if let Some(prev) = previous {
                if current.start_time < prev.finish_time {
                    tracing::warn!(
                        resource = self.id,
                        job = current.job_id,
                        start = current.start_time,
                        previous_job = prev.job_id,
                        previous_finish = prev.finish_time,
                        "job starts before its predecessor finishes"
                    );
                    ok = false;
                }
                if submit < prev.submit_time() {
                    tracing::warn!(
                        resource = self.id,
                        job = current.job_id,
                        submit,
                        previous_job = prev.job_id,
                        previous_submit = prev.submit_time(),
                        "submit times decrease in processing order"
                    );
                    ok = false;
                }
            }
            previous = Some(current);
        }
        ok
    }

    fn describe(&self) -> String {
        format!(
            "Simple resource {} (id: {}), {} jobs, total QT: {}, total price: {} [{}]",
            self.name,
            self.id,
            self.jobs.len(),
            self.total_queue_time,
            self.total_price,
            self.pricing.describe()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlatPricing, Job, LinearPricing};

    fn two_job_workload() -> Workload {
        Workload::from_jobs([Job::new(1, 0.0, 5.0), Job::new(2, 0.0, 3.0)]).unwrap()
    }

    fn unit_rate_resource() -> SimpleResource {
        SimpleResource::new(0, "R0", Box::new(LinearPricing::new(0.0, 1.0)))
    }

    #[test]
    fn test_fcfs_two_jobs() {
        let w = two_job_workload();
        let mut r = unit_rate_resource();
        r.add_job(1);
        r.add_job(2);
        r.reschedule(&w).unwrap();

        let a1 = r.allocation(1).unwrap();
        assert!((a1.start_time - 0.0).abs() < 1e-10);
        assert!((a1.queue_time - 0.0).abs() < 1e-10);
        assert!((a1.finish_time - 5.0).abs() < 1e-10);
        assert!((a1.price - 5.0).abs() < 1e-10);

        let a2 = r.allocation(2).unwrap();
        assert!((a2.start_time - 5.0).abs() < 1e-10);
        assert!((a2.queue_time - 5.0).abs() < 1e-10);
        assert!((a2.finish_time - 8.0).abs() < 1e-10);
        assert!((a2.price - 3.0).abs() < 1e-10);

        assert!((r.total_queue_time().unwrap() - 5.0).abs() < 1e-10);
        assert!((r.total_price().unwrap() - 8.0).abs() < 1e-10);
        assert!(r.sanity_check());
    }

    #[test]
    fn test_idle_gap() {
        // J2 arrives after J1 finished: no queueing.
        let w = Workload::from_jobs([Job::new(1, 0.0, 2.0), Job::new(2, 10.0, 2.0)]).unwrap();
        let mut r = unit_rate_resource();
        r.add_job(2);
        r.add_job(1);
        r.reschedule(&w).unwrap();

        assert_eq!(r.allocations()[0].job_id, 1);
        assert!((r.allocation(2).unwrap().start_time - 10.0).abs() < 1e-10);
        assert!((r.total_queue_time().unwrap() - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_processing_follows_job_id_order() {
        // J1 is submitted after J2 but still runs first.
        let w = Workload::from_jobs([Job::new(1, 4.0, 2.0), Job::new(2, 0.0, 2.0)]).unwrap();
        let mut r = unit_rate_resource();
        r.add_job(1);
        r.add_job(2);
        r.reschedule(&w).unwrap();

        let a2 = r.allocation(2).unwrap();
        assert!((a2.start_time - 6.0).abs() < 1e-10);
        assert!((a2.queue_time - 6.0).abs() < 1e-10);
        // Valid queue, but submit times decrease in processing order.
        assert!(!r.sanity_check());
    }

    #[test]
    fn test_tainted_reads_fail() {
        let w = two_job_workload();
        let mut r = unit_rate_resource();
        r.add_job(1);
        assert!(r.is_tainted());
        assert!(matches!(
            r.total_queue_time(),
            Err(PaesError::StaleState { .. })
        ));
        assert!(r.total_price().is_err());

        r.reschedule(&w).unwrap();
        assert!(!r.is_tainted());
        assert!(r.total_price().is_ok());
    }

    #[test]
    fn test_remove_all_jobs() {
        let w = two_job_workload();
        let mut r = unit_rate_resource();
        r.add_job(1);
        r.add_job(2);
        r.reschedule(&w).unwrap();

        r.remove_all_jobs();
        assert!(!r.is_tainted());
        assert_eq!(r.job_count(), 0);
        assert!(r.allocations().is_empty());
        assert!((r.total_queue_time().unwrap() - 0.0).abs() < 1e-10);
        assert!((r.total_price().unwrap() - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_unknown_job_fails_reschedule() {
        let w = two_job_workload();
        let mut r = unit_rate_resource();
        r.add_job(99);
        assert_eq!(r.reschedule(&w).unwrap_err(), PaesError::UnknownJob(99));
    }

    #[test]
    fn test_flat_pricing_resource() {
        let w = two_job_workload();
        let mut r = SimpleResource::new(1, "flat", Box::new(FlatPricing::new(1.0)));
        r.add_job(1);
        r.add_job(2);
        r.reschedule(&w).unwrap();
        assert!((r.total_price().unwrap() - 2.0).abs() < 1e-10);
        assert!(r.describe().contains("Flat pricing"));
    }

    #[test]
    fn test_sanity_check_detects_overlap() {
        let mut r = unit_rate_resource();
        r.allocations = vec![
            Allocation {
                job_id: 1,
                start_time: 0.0,
                queue_time: 0.0,
                finish_time: 5.0,
                price: 5.0,
            },
            Allocation {
                job_id: 2,
                start_time: 3.0,
                queue_time: 3.0,
                finish_time: 6.0,
                price: 3.0,
            },
        ];
        assert!(!r.sanity_check());
    }
}
