//! Objective pair and Pareto dominance.
//!
//! Both objectives are minimized. `A` dominates `B` iff
//!
//! ```text
//! price(A) <= price(B) && queue(A) <= queue(B)
//!   && (price(A) < price(B) || queue(A) < queue(B))
//! ```
//!
//! which is a strict partial order: irreflexive, antisymmetric, transitive.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of comparing two candidate solutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domination {
    /// The left-hand side dominates the other.
    Dominates,
    /// The other dominates the left-hand side.
    IsDominated,
    /// Neither dominates the other.
    NoDomination,
}

/// Total queue time and total price of an evaluated assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Objectives {
    /// Sum of per-job queue times.
    pub queue_time: f64,
    /// Sum of per-job prices.
    pub price: f64,
}

impl Objectives {
    /// Creates an objective pair.
    pub fn new(queue_time: f64, price: f64) -> Self {
        Self { queue_time, price }
    }

    /// Whether `self` Pareto-dominates `other`.
    #[inline]
    pub fn dominates(&self, other: &Objectives) -> bool {
        self.price <= other.price
            && self.queue_time <= other.queue_time
            && (self.price < other.price || self.queue_time < other.queue_time)
    }

    /// Classifies `self` against `other`.
    pub fn compare(&self, other: &Objectives) -> Domination {
        if self.dominates(other) {
            Domination::Dominates
        } else if other.dominates(self) {
            Domination::IsDominated
        } else {
            Domination::NoDomination
        }
    }

    /// Per-job averages for a workload of `job_count` jobs.
    pub fn per_job(&self, job_count: usize) -> Objectives {
        if job_count == 0 {
            return *self;
        }
        let n = job_count as f64;
        Objectives::new(self.queue_time / n, self.price / n)
    }
}

impl fmt::Display for Objectives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue time {}, price {}", self.queue_time, self.price)
    }
}
