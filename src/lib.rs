//! Bi-objective job-to-resource scheduling with PAES.
//!
//! Searches for assignments of a fixed workload onto a fixed pool of priced
//! resources that trade total queueing delay against total price, and
//! reports an approximation of the Pareto front.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Job`, `Workload`, `PricingPlan`,
//!   `Resource`, `ResourcePool`, `SchedulingProblem`
//! - **`paes`**: `Schedule`, `ScheduleArchive`, and the `Optimizer` loop
//! - **`config`**: Optimizer parameters and TOML experiment files
//! - **`validation`**: Input integrity checks (duplicate IDs, empty pools, bad times)
//! - **`report`**: Plain-text front and allocation reports
//! - **`random`**: Injectable, seedable random source
//!
//! # Architecture
//!
//! A `SchedulingProblem` owns the workload and the resource pool. Every
//! schedule is evaluated by replaying it onto the pool's single-queue
//! simulations, so operations that evaluate take the problem by `&mut`.
//!
//! # References
//!
//! - Knowles & Corne (2000), "Approximating the Nondominated Front Using the
//!   Pareto Archived Evolution Strategy"
//! - Deb (2001), "Multi-Objective Optimization using Evolutionary Algorithms"

pub mod config;
pub mod error;
pub mod models;
pub mod paes;
pub mod random;
pub mod report;
pub mod validation;

pub use error::{PaesError, Result};
