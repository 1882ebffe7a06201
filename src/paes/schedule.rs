//! Candidate solution: one resource per job.
//!
//! # Encoding
//!
//! A schedule is a vector of `(job_id, resource_id)` pairs, one per job of
//! the workload, in job-id order. Its objective totals are cached and only
//! recomputed on [`Schedule::evaluate`]; any change to the assignment marks
//! the cache as tainted.
//!
//! # Mutation
//!
//! The single search operator moves one uniformly chosen job to a different,
//! uniformly chosen resource.

use std::collections::HashSet;
use std::fmt::Write as _;

use super::{Domination, GridLocation, Objectives};
use crate::error::{PaesError, Result};
use crate::models::{JobId, ResourceId, SchedulingProblem};
use crate::random::RandomSource;

/// Record of one applied mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation {
    /// Position in the assignment vector.
    pub index: usize,
    /// Moved job.
    pub job_id: JobId,
    /// Previous resource.
    pub from: ResourceId,
    /// New resource.
    pub to: ResourceId,
}

/// Job-to-resource assignment with lazily evaluated objectives.
#[derive(Debug, Clone)]
pub struct Schedule {
    assignments: Vec<(JobId, ResourceId)>,
    objectives: Objectives,
    tainted: bool,
    location: Option<GridLocation>,
}

impl Schedule {
    /// Assigns every job to a uniformly random resource.
    ///
    /// # Example
    /// ```
    /// use u_paes::models::{Job, ResourcePool, SchedulingProblem, Workload};
    /// use u_paes::paes::Schedule;
    /// use u_paes::random::SeededRng;
    ///
    /// let workload = Workload::from_jobs([Job::new(1, 0.0, 5.0), Job::new(2, 0.0, 3.0)]).unwrap();
    /// let mut problem = SchedulingProblem::new(workload, ResourcePool::three_simple()).unwrap();
    /// let mut rng = SeededRng::new(42);
    ///
    /// let mut schedule = Schedule::random(&problem, &mut rng).unwrap();
    /// assert!(schedule.is_tainted());
    /// let totals = schedule.evaluate(&mut problem).unwrap();
    /// assert!(totals.price > 0.0);
    /// ```
    pub fn random<R: RandomSource + ?Sized>(
        problem: &SchedulingProblem,
        rng: &mut R,
    ) -> Result<Self> {
        let pool = problem.pool();
        let assignments = problem
            .workload()
            .job_ids()
            .into_iter()
            .map(|job_id| Ok((job_id, pool.random_resource_id(rng)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::tainted_with(assignments))
    }

    /// Builds a schedule from explicit pairs.
    ///
    /// Every job of the workload must appear exactly once, and every
    /// resource id must belong to the pool.
    pub fn from_assignments(
        problem: &SchedulingProblem,
        assignments: Vec<(JobId, ResourceId)>,
    ) -> Result<Self> {
        let workload = problem.workload();
        let mut seen = HashSet::with_capacity(assignments.len());
        for &(job_id, resource_id) in &assignments {
            workload.job(job_id)?;
            if !seen.insert(job_id) {
                return Err(PaesError::DuplicateJob(job_id));
            }
            if !problem.pool().contains(resource_id) {
                return Err(PaesError::UnknownResource(resource_id));
            }
        }
        if let Some(missing) = workload.jobs().find(|j| !seen.contains(&j.id)) {
            return Err(PaesError::UnknownJob(missing.id));
        }
        Ok(Self::tainted_with(assignments))
    }

    fn tainted_with(assignments: Vec<(JobId, ResourceId)>) -> Self {
        Self {
            assignments,
            objectives: Objectives::default(),
            tainted: true,
            location: None,
        }
    }

    /// Moves one random job to a different random resource.
    ///
    /// Resamples the resource until it differs from the current one, then
    /// rebuilds the pool's job sets and marks the schedule tainted.
    pub fn mutate<R: RandomSource + ?Sized>(
        &mut self,
        problem: &mut SchedulingProblem,
        rng: &mut R,
    ) -> Result<Mutation> {
        if self.assignments.is_empty() {
            return Err(PaesError::CannotMutate("schedule has no assignments".into()));
        }
        if problem.pool().len() < 2 {
            return Err(PaesError::CannotMutate(
                "resource pool needs at least two resources".into(),
            ));
        }

        let index = rng.next_index(self.assignments.len());
        let (job_id, from) = self.assignments[index];
        let to = loop {
            let candidate = problem.pool().random_resource_id(rng)?;
            if candidate != from {
                break candidate;
            }
        };
        self.assignments[index].1 = to;
        self.propagate(problem)?;
        self.tainted = true;
        self.location = None;

        Ok(Mutation {
            index,
            job_id,
            from,
            to,
        })
    }

    /// Clears every resource and re-adds each job to its assigned resource.
    ///
    /// Always rebuilt from scratch: the pool is shared with every other
    /// schedule evaluated against the same problem.
    pub fn propagate(&self, problem: &mut SchedulingProblem) -> Result<()> {
        let (workload, pool) = problem.split_mut();
        pool.remove_all_jobs();
        for &(job_id, resource_id) in &self.assignments {
            workload.job(job_id)?;
            pool.get_mut(resource_id)?.add_job(job_id);
        }
        Ok(())
    }

    /// Simulates every resource and caches the summed totals.
    pub fn evaluate(&mut self, problem: &mut SchedulingProblem) -> Result<Objectives> {
        self.propagate(problem)?;
        let (workload, pool) = problem.split_mut();
        pool.reschedule_all(workload)?;

        let mut totals = Objectives::default();
        for resource in pool.iter() {
            totals.queue_time += resource.total_queue_time()?;
            totals.price += resource.total_price()?;
        }

        self.objectives = totals;
        self.tainted = false;
        Ok(totals)
    }

    /// Compares against `other`, evaluating `self` first if tainted.
    ///
    /// `other` is never modified and must already be evaluated.
    pub fn compare(
        &mut self,
        other: &Schedule,
        problem: &mut SchedulingProblem,
    ) -> Result<Domination> {
        if self.tainted {
            self.evaluate(problem)?;
        }
        Ok(self.objectives.compare(&other.objectives()?))
    }

    /// Whether `self` dominates `other`. Both must be evaluated.
    pub fn dominates(&self, other: &Schedule) -> Result<bool> {
        Ok(self.objectives()?.dominates(&other.objectives()?))
    }

    /// Objective-pair equality; the assignments themselves are not compared.
    pub fn equals(&self, other: &Schedule) -> Result<bool> {
        Ok(self.objectives()? == other.objectives()?)
    }

    /// Cached totals. Fails while tainted.
    pub fn objectives(&self) -> Result<Objectives> {
        if self.tainted {
            return Err(PaesError::stale("schedule"));
        }
        Ok(self.objectives)
    }

    /// Cached totals without the taint check; archive members are always
    /// evaluated.
    pub(crate) fn cached_objectives(&self) -> Objectives {
        self.objectives
    }

    /// Cached total queue time. Fails while tainted.
    pub fn total_queue_time(&self) -> Result<f64> {
        self.objectives().map(|o| o.queue_time)
    }

    /// Cached total price. Fails while tainted.
    pub fn total_price(&self) -> Result<f64> {
        self.objectives().map(|o| o.price)
    }

    /// Whether the cached totals are out of date.
    pub fn is_tainted(&self) -> bool {
        self.tainted
    }

    /// Grid cell last assigned by an archive.
    pub fn location(&self) -> Option<GridLocation> {
        self.location
    }

    pub(crate) fn set_location(&mut self, location: GridLocation) {
        self.location = Some(location);
    }

    /// `(job_id, resource_id)` pairs.
    pub fn assignments(&self) -> &[(JobId, ResourceId)] {
        &self.assignments
    }

    /// Resource assigned to `job_id`.
    pub fn resource_of(&self, job_id: JobId) -> Option<ResourceId> {
        self.assignments
            .iter()
            .find(|(j, _)| *j == job_id)
            .map(|&(_, r)| r)
    }

    /// Number of assigned jobs.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether no job is assigned.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// One-line description.
    pub fn summary(&self) -> String {
        if self.tainted {
            format!("Schedule: {} jobs (tainted)", self.assignments.len())
        } else {
            format!(
                "Schedule: {} jobs, {} (not tainted)",
                self.assignments.len(),
                self.objectives
            )
        }
    }

    /// Tab-separated `job id\tresource id` table with a header line.
    pub fn allocation_table(&self) -> String {
        let mut out = String::from("job id\tresource id\n");
        for (job_id, resource_id) in &self.assignments {
            let _ = writeln!(out, "{job_id}\t{resource_id}");
        }
        out
    }

    #[cfg(test)]
    pub(crate) fn evaluated(queue_time: f64, price: f64) -> Self {
        Self {
            assignments: Vec::new(),
            objectives: Objectives::new(queue_time, price),
            tainted: false,
            location: None,
        }
    }
}
