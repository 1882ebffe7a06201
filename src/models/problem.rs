//! Problem instance: workload plus resource pool.

use super::{ResourcePool, Workload};
use crate::error::{PaesError, Result};

/// A workload together with the pool its jobs are assigned to.
///
/// Resource simulation state is shared by every schedule evaluated against
/// the problem. Operations that rebuild it take `&mut SchedulingProblem`,
/// so only one schedule can drive the pool at a time.
#[derive(Debug)]
pub struct SchedulingProblem {
    workload: Workload,
    pool: ResourcePool,
}

impl SchedulingProblem {
    /// Creates a problem, rejecting an empty workload or pool.
    ///
    /// Logs a warning when job-id order disagrees with submit order, since
    /// resources simulate their queues in job-id order.
    pub fn new(workload: Workload, pool: ResourcePool) -> Result<Self> {
        if workload.is_empty() {
            return Err(PaesError::EmptyWorkload);
        }
        if pool.is_empty() {
            return Err(PaesError::EmptyResourcePool);
        }

        let inversions = workload.submit_order_inversions();
        if !inversions.is_empty() {
            tracing::warn!(
                count = inversions.len(),
                first = inversions[0],
                "job ids are not monotonic in submit time; queues follow job-id order"
            );
        }

        Ok(Self { workload, pool })
    }

    /// The workload.
    pub fn workload(&self) -> &Workload {
        &self.workload
    }

    /// The resource pool.
    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    /// Borrows the workload immutably and the pool mutably at once.
    pub fn split_mut(&mut self) -> (&Workload, &mut ResourcePool) {
        (&self.workload, &mut self.pool)
    }

    /// One-line description.
    pub fn summary(&self) -> String {
        format!(
            "{} jobs on {} resources",
            self.workload.len(),
            self.pool.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Job;

    #[test]
    fn test_problem_new() {
        let w = Workload::from_jobs([Job::new(1, 0.0, 1.0)]).unwrap();
        let p = SchedulingProblem::new(w, ResourcePool::three_simple()).unwrap();
        assert_eq!(p.summary(), "1 jobs on 3 resources");
        assert_eq!(p.workload().len(), 1);
        assert_eq!(p.pool().len(), 3);
    }

    #[test]
    fn test_problem_rejects_empty_inputs() {
        let err = SchedulingProblem::new(Workload::new(), ResourcePool::three_simple()).unwrap_err();
        assert_eq!(err, PaesError::EmptyWorkload);

        let w = Workload::from_jobs([Job::new(1, 0.0, 1.0)]).unwrap();
        let err = SchedulingProblem::new(w, ResourcePool::new()).unwrap_err();
        assert_eq!(err, PaesError::EmptyResourcePool);
    }
}
