//! Pricing plans.
//!
//! A pricing plan maps a job to the price charged for running it on a
//! resource. Plans are stateless and pure; one plan instance is bound to each
//! resource for the lifetime of an experiment.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use super::Job;

/// Strategy mapping a job to a price.
pub trait PricingPlan: Debug + Send + Sync {
    /// Price charged for running `job`.
    fn price(&self, job: &Job) -> f64;

    /// Human-readable description.
    fn describe(&self) -> String;
}

/// `price = base + rate * run_time`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearPricing {
    /// Fixed charge per job.
    pub base: f64,
    /// Charge per unit of run time.
    pub rate: f64,
}

impl LinearPricing {
    /// Creates a linear plan.
    pub fn new(base: f64, rate: f64) -> Self {
        Self { base, rate }
    }
}

impl PricingPlan for LinearPricing {
    fn price(&self, job: &Job) -> f64 {
        self.base + self.rate * job.run_time
    }

    fn describe(&self) -> String {
        format!("Linear pricing: base={}, rate={}", self.base, self.rate)
    }
}

/// Constant price per job, independent of run time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatPricing {
    /// Charge per job.
    pub price: f64,
}

impl FlatPricing {
    /// Creates a flat plan.
    pub fn new(price: f64) -> Self {
        Self { price }
    }
}

impl PricingPlan for FlatPricing {
    fn price(&self, _job: &Job) -> f64 {
        self.price
    }

    fn describe(&self) -> String {
        format!("Flat pricing: price={}", self.price)
    }
}

/// Serializable description of a pricing plan, as found in experiment files.
///
/// ```
/// use u_paes::models::PricingSpec;
///
/// let spec: PricingSpec = serde_json::from_str(r#"{"kind":"linear","base":1.0,"rate":0.5}"#).unwrap();
/// assert_eq!(spec, PricingSpec::Linear { base: 1.0, rate: 0.5 });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingSpec {
    /// See [`LinearPricing`].
    Linear { base: f64, rate: f64 },
    /// See [`FlatPricing`].
    Flat { price: f64 },
}

impl PricingSpec {
    /// Instantiates the described plan.
    pub fn build(&self) -> Box<dyn PricingPlan> {
        match *self {
            PricingSpec::Linear { base, rate } => Box::new(LinearPricing::new(base, rate)),
            PricingSpec::Flat { price } => Box::new(FlatPricing::new(price)),
        }
    }
}
