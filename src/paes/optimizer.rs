//! The (1+1)-PAES search loop.
//!
//! # Algorithm
//!
//! The optimizer keeps one current schedule and a [`ScheduleArchive`].
//! Each iteration:
//!
//! 1. Copy the current schedule and mutate one assignment.
//! 2. Evaluate the mutation and compare it with the current schedule.
//! 3. Dominated by current: discard.
//! 4. Dominates current: it becomes current and is offered to the archive.
//! 5. Neither dominates: discard if any archive member dominates it;
//!    otherwise archive it and make it current when it sits in a less
//!    crowded grid cell than the current schedule, or when no archive
//!    member dominates it.
//!
//! Grid locations are refreshed whenever the archive's membership changes.
//!
//! # Termination
//! - `max_iterations` reached
//! - Archive distance unchanged between two samples `stability_interval`
//!   iterations apart
//! - The observer passed to [`Optimizer::run_with`] returns
//!   [`ControlFlow::Break`]
//!
//! # Reference
//! Knowles & Corne (2000), "Approximating the Nondominated Front Using the
//! Pareto Archived Evolution Strategy", Evolutionary Computation 8(2)

use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;

use super::{ArchiveOutcome, ArchiveSnapshot, Domination, Objectives, Schedule, ScheduleArchive};
use crate::config::PaesConfig;
use crate::error::Result;
use crate::models::SchedulingProblem;
use crate::random::{RandomSource, SeededRng};

/// What one iteration did with its mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The current schedule dominates the mutation.
    Rejected,
    /// The mutation dominates the current schedule and replaced it.
    Improved(ArchiveOutcome),
    /// Neither dominates, but an archive member dominates the mutation.
    DominatedByArchive,
    /// Offered to the archive; the current schedule was kept.
    Kept(ArchiveOutcome),
    /// Offered to the archive and promoted to current.
    Promoted(ArchiveOutcome),
}

impl StepOutcome {
    /// Whether the mutation became the current schedule.
    pub fn replaced_current(&self) -> bool {
        matches!(self, Self::Improved(_) | Self::Promoted(_))
    }
}

/// Per-outcome iteration counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCounts {
    pub rejected: u64,
    pub improved: u64,
    pub dominated_by_archive: u64,
    pub kept: u64,
    pub promoted: u64,
}

impl StepCounts {
    fn record(&mut self, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Rejected => self.rejected += 1,
            StepOutcome::Improved(_) => self.improved += 1,
            StepOutcome::DominatedByArchive => self.dominated_by_archive += 1,
            StepOutcome::Kept(_) => self.kept += 1,
            StepOutcome::Promoted(_) => self.promoted += 1,
        }
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The iteration limit was reached.
    MaxIterations,
    /// The archive distance stopped changing.
    Stable,
    /// The observer asked to stop.
    Interrupted,
}

/// Point-in-time view of a run, used for progress reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Completed iterations.
    pub iteration: u64,
    /// Archived schedules.
    pub archive_size: usize,
    /// Archive distance.
    pub distance: f64,
    /// Objectives of the current schedule.
    pub current: Objectives,
}

/// Outcome of [`Optimizer::run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Why the run ended.
    pub stop_reason: StopReason,
    /// Completed iterations.
    pub iterations: u64,
    /// Seed that reproduces the run.
    pub seed: u64,
    /// Archived schedules at the end.
    pub archive_size: usize,
    /// Archive distance at the end.
    pub distance: f64,
    /// Iteration outcomes.
    pub counts: StepCounts,
}

/// PAES optimizer over one scheduling problem.
///
/// # Example
/// ```
/// use u_paes::config::PaesConfig;
/// use u_paes::models::{Job, ResourcePool, SchedulingProblem, Workload};
/// use u_paes::paes::{Optimizer, StopReason};
///
/// let jobs = (1..=10).map(|i| Job::new(i, f64::from(i), 4.0));
/// let workload = Workload::from_jobs(jobs).unwrap();
/// let problem = SchedulingProblem::new(workload, ResourcePool::three_simple()).unwrap();
/// let config = PaesConfig::default()
///     .with_archive_size(20)
///     .with_max_iterations(500)
///     .with_seed(42);
///
/// let mut optimizer = Optimizer::new(problem, config).unwrap();
/// let summary = optimizer.run().unwrap();
/// assert_eq!(summary.stop_reason, StopReason::MaxIterations);
/// assert!(!optimizer.archive().is_empty());
/// ```
#[derive(Debug)]
pub struct Optimizer<R: RandomSource = SeededRng> {
    problem: SchedulingProblem,
    config: PaesConfig,
    rng: R,
    current: Schedule,
    archive: ScheduleArchive,
    iteration: u64,
    last_distance: Option<f64>,
    counts: StepCounts,
}

impl Optimizer<SeededRng> {
    /// Creates an optimizer seeded from `config.seed` (or the OS).
    pub fn new(problem: SchedulingProblem, config: PaesConfig) -> Result<Self> {
        let rng = SeededRng::from_optional(config.seed);
        Self::with_rng(problem, config, rng)
    }
}

impl<R: RandomSource> Optimizer<R> {
    /// Creates an optimizer drawing from `rng`.
    ///
    /// Builds a random initial schedule, evaluates it, and archives it.
    pub fn with_rng(mut problem: SchedulingProblem, config: PaesConfig, mut rng: R) -> Result<Self> {
        config.validate()?;
        let mut archive = ScheduleArchive::new(config.archive_size, config.location_bits)?;

        let mut current = Schedule::random(&problem, &mut rng)?;
        current.evaluate(&mut problem)?;
        archive.archive_schedule(&current, &mut rng)?;
        archive.update_all_locations()?;
        archive.assign_location(&mut current)?;

        tracing::debug!(seed = rng.seed(), initial = %current.summary(), "optimizer initialized");

        Ok(Self {
            problem,
            config,
            rng,
            current,
            archive,
            iteration: 0,
            last_distance: None,
            counts: StepCounts::default(),
        })
    }

    /// Runs one iteration.
    pub fn step(&mut self) -> Result<StepOutcome> {
        let mut mutation = self.current.clone();
        let applied = mutation.mutate(&mut self.problem, &mut self.rng)?;
        let relation = mutation.compare(&self.current, &mut self.problem)?;
        self.iteration += 1;

        let outcome = match relation {
            Domination::IsDominated => StepOutcome::Rejected,
            Domination::Dominates => {
                let archived = self.archive.insert(&mutation, &mut self.rng)?;
                self.current = mutation;
                self.refresh_grid(archived)?;
                StepOutcome::Improved(archived)
            }
            Domination::NoDomination => {
                if self.archive.dominates(&mutation)? {
                    StepOutcome::DominatedByArchive
                } else {
                    let archived = self.archive.insert(&mutation, &mut self.rng)?;
                    self.refresh_grid(archived)?;
                    self.archive.assign_location(&mut mutation)?;

                    let less_crowded = self.population_of(&mutation) < self.population_of(&self.current);
                    if less_crowded || self.archive.is_dominated(&mutation)? {
                        self.current = mutation;
                        StepOutcome::Promoted(archived)
                    } else {
                        StepOutcome::Kept(archived)
                    }
                }
            }
        };

        tracing::trace!(
            iteration = self.iteration,
            job = applied.job_id,
            from = applied.from,
            to = applied.to,
            ?outcome,
            "step"
        );
        self.counts.record(outcome);
        Ok(outcome)
    }

    fn refresh_grid(&mut self, archived: ArchiveOutcome) -> Result<()> {
        if archived.changed_membership() {
            self.archive.update_all_locations()?;
        }
        self.archive.assign_location(&mut self.current)?;
        Ok(())
    }

    fn population_of(&self, schedule: &Schedule) -> usize {
        schedule
            .location()
            .map_or(0, |l| self.archive.population_count(l))
    }

    /// Runs until the iteration limit or the stability stop.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.run_with(|_| ControlFlow::Continue(()))
    }

    /// Runs like [`run`](Self::run), consulting `observer` before every
    /// iteration; [`ControlFlow::Break`] stops the run early.
    pub fn run_with<F>(&mut self, mut observer: F) -> Result<RunSummary>
    where
        F: FnMut(&Self) -> ControlFlow<()>,
    {
        tracing::info!(
            problem = %self.problem.summary(),
            seed = self.rng.seed(),
            archive_size = self.config.archive_size,
            max_iterations = self.config.max_iterations,
            "PAES run started"
        );

        let stop_reason = loop {
            if self.iteration >= self.config.max_iterations {
                break StopReason::MaxIterations;
            }
            if observer(&*self).is_break() {
                break StopReason::Interrupted;
            }

            self.step()?;

            if self.config.report_interval > 0 && self.iteration % self.config.report_interval == 0 {
                let p = self.progress();
                tracing::info!(
                    iteration = p.iteration,
                    archive_size = p.archive_size,
                    distance = p.distance,
                    current = %p.current,
                    "progress"
                );
            }
            if self.distance_is_stable() {
                break StopReason::Stable;
            }
        };

        let summary = RunSummary {
            stop_reason,
            iterations: self.iteration,
            seed: self.rng.seed(),
            archive_size: self.archive.len(),
            distance: self.archive.distance(),
            counts: self.counts,
        };
        tracing::info!(
            reason = ?summary.stop_reason,
            iterations = summary.iterations,
            archive_size = summary.archive_size,
            distance = summary.distance,
            "PAES run finished"
        );
        Ok(summary)
    }

    fn distance_is_stable(&mut self) -> bool {
        let Some(interval) = self.config.stability_interval else {
            return false;
        };
        if self.iteration % interval != 0 {
            return false;
        }
        let distance = self.archive.distance();
        let stable = self.last_distance == Some(distance);
        tracing::debug!(iteration = self.iteration, distance, stable, "distance sample");
        self.last_distance = Some(distance);
        stable
    }

    /// Current progress.
    pub fn progress(&self) -> Progress {
        Progress {
            iteration: self.iteration,
            archive_size: self.archive.len(),
            distance: self.archive.distance(),
            current: self.current.cached_objectives(),
        }
    }

    /// Serializable view of the archive.
    pub fn snapshot(&self) -> ArchiveSnapshot {
        self.archive.snapshot(self.problem.workload().len())
    }

    /// The current schedule (always evaluated).
    pub fn current(&self) -> &Schedule {
        &self.current
    }

    /// The archive.
    pub fn archive(&self) -> &ScheduleArchive {
        &self.archive
    }

    /// The problem being optimized.
    pub fn problem(&self) -> &SchedulingProblem {
        &self.problem
    }

    /// The configuration.
    pub fn config(&self) -> &PaesConfig {
        &self.config
    }

    /// Completed iterations.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Iteration outcomes so far.
    pub fn counts(&self) -> StepCounts {
        self.counts
    }

    /// Seed that reproduces this run.
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }
}
