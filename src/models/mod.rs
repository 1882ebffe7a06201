//! Problem domain models.
//!
//! Provides the immutable inputs of an experiment (jobs, the workload
//! arena, pricing plans) and the resources whose single-queue simulation
//! turns an assignment into queue-time and price totals.
//!
//! # Ownership
//!
//! | Type | Owned by | Referenced as |
//! |------|----------|---------------|
//! | `Job` | `Workload` | `JobId` |
//! | `Resource` | `ResourcePool` | `ResourceId` |
//! | `Workload`, `ResourcePool` | `SchedulingProblem` | `&` / `&mut` |

mod job;
mod pool;
mod pricing;
mod problem;
mod resource;
mod workload;

pub use job::{Job, JobId};
pub use pool::{ResourcePool, ResourceSpec};
pub use pricing::{FlatPricing, LinearPricing, PricingPlan, PricingSpec};
pub use problem::SchedulingProblem;
pub use resource::{Allocation, Resource, ResourceId, SimpleResource};
pub use workload::Workload;
