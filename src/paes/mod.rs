//! Pareto Archived Evolution Strategy over job-to-resource assignments.
//!
//! Two objectives are minimized: the total time jobs spend queueing and
//! the total price paid for running them.
//!
//! # Components
//!
//! - [`Objectives`] / [`Domination`]: objective pair and the dominance rule
//! - [`Schedule`]: candidate assignment with lazily evaluated totals
//! - [`ScheduleArchive`]: bounded non-dominated set with grid crowding
//! - [`Optimizer`]: the (1+1)-PAES acceptance loop
//!
//! # Reference
//! Knowles & Corne (2000), "Approximating the Nondominated Front Using the
//! Pareto Archived Evolution Strategy", Evolutionary Computation 8(2)

mod archive;
mod grid;
mod objectives;
mod optimizer;
mod schedule;

pub use archive::{ArchiveOutcome, ArchiveSnapshot, ScheduleArchive};
pub use grid::{AxisRange, GridLocation, MAX_LOCATION_BITS};
pub use objectives::{Domination, Objectives};
pub use optimizer::{Optimizer, Progress, RunSummary, StepCounts, StepOutcome, StopReason};
pub use schedule::{Mutation, Schedule};
