//! Resource pool.
//!
//! The fixed set of resources of one experiment, keyed by resource id.
//! The pool owns the resources' derived simulation state; schedules reach it
//! only through [`SchedulingProblem`](super::SchedulingProblem).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{PricingSpec, Resource, ResourceId, SimpleResource};
use crate::error::{PaesError, Result};
use crate::random::RandomSource;

/// Serializable definition of one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Resource identifier.
    pub id: ResourceId,
    /// Human-readable name.
    pub name: String,
    /// Pricing plan.
    pub pricing: PricingSpec,
}

impl ResourceSpec {
    /// Creates a linearly priced resource definition named `Resource-<id>`.
    pub fn linear(id: ResourceId, base: f64, rate: f64) -> Self {
        Self {
            id,
            name: format!("Resource-{id}"),
            pricing: PricingSpec::Linear { base, rate },
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Definitions behind [`ResourcePool::three_simple`].
    pub fn three_simple() -> Vec<ResourceSpec> {
        (0..3)
            .map(|i| Self::linear(i, 0.0, 0.1 * f64::from(i + 1)))
            .collect()
    }
}

/// Named set of resources.
#[derive(Debug, Default)]
pub struct ResourcePool {
    resources: BTreeMap<ResourceId, Box<dyn Resource>>,
}

impl ResourcePool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds simple FCFS resources from their definitions.
    pub fn from_specs(specs: &[ResourceSpec]) -> Result<Self> {
        let mut pool = Self::new();
        for spec in specs {
            pool.add(Box::new(SimpleResource::new(
                spec.id,
                spec.name.clone(),
                spec.pricing.build(),
            )))?;
        }
        Ok(pool)
    }

    /// Three simple resources with zero base price and rates 0.1, 0.2, 0.3.
    pub fn three_simple() -> Self {
        let mut pool = Self::new();
        for spec in ResourceSpec::three_simple() {
            pool.resources.insert(
                spec.id,
                Box::new(SimpleResource::new(spec.id, spec.name, spec.pricing.build())),
            );
        }
        pool
    }

    /// One linearly priced resource per `(base, rate)` pair, ids from 0.
    pub fn linear(bases: &[f64], rates: &[f64]) -> Result<Self> {
        if bases.len() != rates.len() {
            return Err(PaesError::InvalidConfig(format!(
                "{} base prices but {} rates",
                bases.len(),
                rates.len()
            )));
        }
        let specs: Vec<ResourceSpec> = bases
            .iter()
            .zip(rates)
            .enumerate()
            .map(|(i, (&base, &rate))| ResourceSpec::linear(i as ResourceId, base, rate))
            .collect();
        Self::from_specs(&specs)
    }

    /// Adds a resource.
    pub fn add(&mut self, resource: Box<dyn Resource>) -> Result<()> {
        let id = resource.id();
        if self.resources.contains_key(&id) {
            return Err(PaesError::DuplicateResource(id));
        }
        self.resources.insert(id, resource);
        Ok(())
    }

    /// Looks up a resource.
    pub fn get(&self, id: ResourceId) -> Option<&(dyn Resource + 'static)> {
        self.resources.get(&id).map(|r| r.as_ref())
    }

    /// Looks up a resource for mutation, failing for unknown ids.
    pub fn get_mut(&mut self, id: ResourceId) -> Result<&mut (dyn Resource + 'static)> {
        self.resources
            .get_mut(&id)
            .map(|r| r.as_mut())
            .ok_or(PaesError::UnknownResource(id))
    }

    /// Resource ids in increasing order.
    pub fn resource_ids(&self) -> Vec<ResourceId> {
        self.resources.keys().copied().collect()
    }

    /// Whether `id` belongs to the pool.
    pub fn contains(&self, id: ResourceId) -> bool {
        self.resources.contains_key(&id)
    }

    /// Resources in increasing id order.
    pub fn iter(&self) -> impl Iterator<Item = &(dyn Resource + 'static)> {
        self.resources.values().map(|r| r.as_ref())
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the pool holds no resources.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Draws a resource id uniformly at random.
    pub fn random_resource_id<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Result<ResourceId> {
        if self.resources.is_empty() {
            return Err(PaesError::EmptyResourcePool);
        }
        let idx = rng.next_index(self.resources.len());
        self.resources
            .keys()
            .nth(idx)
            .copied()
            .ok_or(PaesError::EmptyResourcePool)
    }

    /// Clears the derived state of every resource.
    pub fn remove_all_jobs(&mut self) {
        for resource in self.resources.values_mut() {
            resource.remove_all_jobs();
        }
    }

    /// Runs every resource's simulation.
    pub fn reschedule_all(&mut self, workload: &super::Workload) -> Result<()> {
        for resource in self.resources.values_mut() {
            resource.reschedule(workload)?;
        }
        Ok(())
    }

    /// Runs [`Resource::sanity_check`] on every resource.
    pub fn sanity_check(&self) -> bool {
        // Check all resources so every violation gets logged.
        self.resources
            .values()
            .fold(true, |ok, r| r.sanity_check() && ok)
    }

    /// Multi-line description, one resource per line.
    pub fn summary(&self) -> String {
        let mut out = format!("Resource pool of {} resources:", self.len());
        for resource in self.resources.values() {
            out.push('\n');
            out.push_str(&resource.describe());
        }
        out
    }
}
