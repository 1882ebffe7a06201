//! Bounded Pareto archive with grid-based crowding control.
//!
//! # Algorithm
//!
//! [`ScheduleArchive::insert`] keeps the archive a mutually non-dominated
//! set of at most `max_size` members:
//!
//! 1. A candidate with the same objective pair as a member is rejected.
//! 2. An empty archive accepts the candidate.
//! 3. A candidate dominated by any member is rejected.
//! 4. Members dominated by the candidate are evicted and it is inserted.
//! 5. Otherwise it is inserted while there is room.
//! 6. A full archive evicts one member from the most populated grid cell
//!    (uniform tie-break) to make room.
//!
//! Grid locations are only valid right after
//! [`ScheduleArchive::update_all_locations`]; every membership change
//! invalidates them.
//!
//! # Reference
//! Knowles & Corne (2000), "Approximating the Nondominated Front Using the
//! Pareto Archived Evolution Strategy", Evolutionary Computation 8(2)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::grid::{AxisRange, GridLocation, MAX_LOCATION_BITS};
use super::{Objectives, Schedule};
use crate::error::{PaesError, Result};
use crate::random::RandomSource;

/// What [`ScheduleArchive::insert`] did with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// A member already has the same objective pair.
    Duplicate,
    /// A member dominates the candidate.
    Dominated,
    /// Inserted without evicting anything.
    Inserted,
    /// Inserted after evicting this many dominated members.
    ReplacedDominated(usize),
    /// Inserted after evicting one member from the most crowded cell.
    ReplacedCrowded,
}

impl ArchiveOutcome {
    /// Whether the archive's membership changed.
    pub fn changed_membership(&self) -> bool {
        !matches!(self, Self::Duplicate | Self::Dominated)
    }

    /// Whether at least one dominated member was evicted.
    pub fn evicted_dominated(&self) -> bool {
        matches!(self, Self::ReplacedDominated(_))
    }
}

/// Serializable view of the archive for reports and checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveSnapshot {
    /// Number of members.
    pub size: usize,
    /// Capacity.
    pub max_size: usize,
    /// Area metric, see [`ScheduleArchive::distance`].
    pub distance: f64,
    /// Members' objectives sorted by queue time.
    pub front: Vec<Objectives>,
    /// `front` divided by the workload size.
    pub relative_front: Vec<Objectives>,
}

/// Bounded, mutually non-dominated set of evaluated schedules.
#[derive(Debug, Clone)]
pub struct ScheduleArchive {
    members: Vec<Schedule>,
    max_size: usize,
    location_bits: u32,
    queue_range: AxisRange,
    price_range: AxisRange,
    population: HashMap<GridLocation, usize>,
    grid_current: bool,
}

impl ScheduleArchive {
    /// Creates an empty archive.
    ///
    /// `location_bits` is the grid resolution per objective axis (1..=32).
    pub fn new(max_size: usize, location_bits: u32) -> Result<Self> {
        if max_size == 0 {
            return Err(PaesError::InvalidConfig(
                "archive size must be at least 1".into(),
            ));
        }
        if location_bits == 0 || location_bits > MAX_LOCATION_BITS {
            return Err(PaesError::InvalidConfig(format!(
                "location bits must be in 1..={MAX_LOCATION_BITS}, got {location_bits}"
            )));
        }
        Ok(Self {
            members: Vec::with_capacity(max_size),
            max_size,
            location_bits,
            queue_range: AxisRange::new(0.0, 0.0),
            price_range: AxisRange::new(0.0, 0.0),
            population: HashMap::new(),
            grid_current: true,
        })
    }

    /// Offers an evaluated candidate; see module docs for the policy.
    ///
    /// The archive stores its own copy of the candidate.
    pub fn insert<R: RandomSource + ?Sized>(
        &mut self,
        candidate: &Schedule,
        rng: &mut R,
    ) -> Result<ArchiveOutcome> {
        let objectives = candidate.objectives()?;

        if self
            .members
            .iter()
            .any(|m| m.cached_objectives() == objectives)
        {
            return Ok(ArchiveOutcome::Duplicate);
        }

        if self.members.is_empty() {
            self.push(candidate);
            return Ok(ArchiveOutcome::Inserted);
        }

        if self
            .members
            .iter()
            .any(|m| m.cached_objectives().dominates(&objectives))
        {
            return Ok(ArchiveOutcome::Dominated);
        }

        let before = self.members.len();
        self.members
            .retain(|m| !objectives.dominates(&m.cached_objectives()));
        let evicted = before - self.members.len();
        if evicted > 0 {
            self.push(candidate);
            tracing::debug!(evicted, size = self.members.len(), "archive: replaced dominated");
            return Ok(ArchiveOutcome::ReplacedDominated(evicted));
        }

        if self.members.len() < self.max_size {
            self.push(candidate);
            return Ok(ArchiveOutcome::Inserted);
        }

        self.update_all_locations()?;
        let victim = self.most_crowded_member(rng);
        let removed = self.members.remove(victim);
        tracing::debug!(
            location = ?removed.location(),
            population = removed.location().map_or(0, |l| self.population_count(l)),
            "archive: evicted crowded member"
        );
        self.push(candidate);
        Ok(ArchiveOutcome::ReplacedCrowded)
    }

    /// Offers an evaluated candidate.
    ///
    /// Returns `true` iff at least one dominated member was evicted to make
    /// room for it.
    ///
    /// # Example
    /// ```
    /// # use u_paes::models::{Job, ResourcePool, SchedulingProblem, Workload};
    /// # use u_paes::paes::{Schedule, ScheduleArchive};
    /// # use u_paes::random::SeededRng;
    /// let workload = Workload::from_jobs([Job::new(1, 0.0, 5.0)]).unwrap();
    /// let mut problem = SchedulingProblem::new(workload, ResourcePool::three_simple()).unwrap();
    /// let mut rng = SeededRng::new(1);
    /// let mut schedule = Schedule::random(&problem, &mut rng).unwrap();
    /// schedule.evaluate(&mut problem).unwrap();
    ///
    /// let mut archive = ScheduleArchive::new(10, 8).unwrap();
    /// assert!(!archive.archive_schedule(&schedule, &mut rng).unwrap());
    /// assert_eq!(archive.len(), 1);
    /// ```
    pub fn archive_schedule<R: RandomSource + ?Sized>(
        &mut self,
        candidate: &Schedule,
        rng: &mut R,
    ) -> Result<bool> {
        self.insert(candidate, rng).map(|o| o.evicted_dominated())
    }

    fn push(&mut self, candidate: &Schedule) {
        self.members.push(candidate.clone());
        self.grid_current = false;
    }

    fn most_crowded_member<R: RandomSource + ?Sized>(&self, rng: &mut R) -> usize {
        let counts: Vec<usize> = self
            .members
            .iter()
            .map(|m| m.location().map_or(0, |l| self.population_count(l)))
            .collect();
        let max = counts.iter().copied().max().unwrap_or(0);
        let ties: Vec<usize> = counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == max)
            .map(|(i, _)| i)
            .collect();
        ties[rng.next_index(ties.len())]
    }

    /// Refreshes axis ranges, then every member's location and the
    /// per-cell population table.
    pub fn update_all_locations(&mut self) -> Result<()> {
        let zero = AxisRange::new(0.0, 0.0);
        self.queue_range =
            AxisRange::covering(self.members.iter().map(|m| m.cached_objectives().queue_time))
                .unwrap_or(zero);
        self.price_range =
            AxisRange::covering(self.members.iter().map(|m| m.cached_objectives().price))
                .unwrap_or(zero);

        self.population.clear();
        for member in &mut self.members {
            let location = encode(
                &self.price_range,
                &self.queue_range,
                self.location_bits,
                &member.cached_objectives(),
            )?;
            member.set_location(location);
            *self.population.entry(location).or_insert(0) += 1;
        }
        self.grid_current = true;
        Ok(())
    }

    /// Grid cell of an objective pair under the current ranges.
    pub fn locate(&self, objectives: &Objectives) -> Result<GridLocation> {
        encode(
            &self.price_range,
            &self.queue_range,
            self.location_bits,
            objectives,
        )
    }

    /// Sets `schedule`'s location when its objectives lie within the current
    /// ranges; otherwise leaves its last location in place.
    ///
    /// Returns whether the location was updated.
    pub fn assign_location(&self, schedule: &mut Schedule) -> Result<bool> {
        let objectives = schedule.objectives()?;
        if !self.price_range.contains(objectives.price)
            || !self.queue_range.contains(objectives.queue_time)
        {
            return Ok(false);
        }
        schedule.set_location(self.locate(&objectives)?);
        Ok(true)
    }

    /// Members in `location` as of the last refresh.
    pub fn population_count(&self, location: GridLocation) -> usize {
        self.population.get(&location).copied().unwrap_or(0)
    }

    /// Whether locations reflect the current membership.
    pub fn is_grid_current(&self) -> bool {
        self.grid_current
    }

    /// Whether any member dominates `candidate`.
    pub fn dominates(&self, candidate: &Schedule) -> Result<bool> {
        let objectives = candidate.objectives()?;
        Ok(self
            .members
            .iter()
            .any(|m| m.cached_objectives().dominates(&objectives)))
    }

    /// Whether **no** member dominates `candidate`, i.e. the candidate is
    /// non-dominated with respect to the whole archive.
    ///
    /// Note the inverted sense: this is exactly `!self.dominates(candidate)`.
    pub fn is_dominated(&self, candidate: &Schedule) -> Result<bool> {
        self.dominates(candidate).map(|d| !d)
    }

    /// Trapezoidal area between the front and its minimum-price baseline.
    ///
    /// Members are sorted by `(queue_time, price)`; each successive pair
    /// contributes `Δqueue * ((p_i - p_min) + (p_j - p_min)) / 2`. Used as a
    /// convergence statistic only.
    pub fn distance(&self) -> f64 {
        let front = self.front();
        if front.len() < 2 {
            return 0.0;
        }
        let min_price = front
            .iter()
            .map(|o| o.price)
            .fold(f64::INFINITY, f64::min);
        front
            .windows(2)
            .map(|w| {
                let width = w[1].queue_time - w[0].queue_time;
                width * ((w[0].price - min_price) + (w[1].price - min_price)) / 2.0
            })
            .sum()
    }

    /// Members' objectives sorted by `(queue_time, price)`.
    pub fn front(&self) -> Vec<Objectives> {
        let mut front: Vec<Objectives> = self
            .members
            .iter()
            .map(|m| m.cached_objectives())
            .collect();
        front.sort_by(|a, b| {
            a.queue_time
                .total_cmp(&b.queue_time)
                .then(a.price.total_cmp(&b.price))
        });
        front
    }

    /// [`front`](Self::front) normalized to per-job values.
    pub fn relative_front(&self, job_count: usize) -> Vec<Objectives> {
        self.front()
            .into_iter()
            .map(|o| o.per_job(job_count))
            .collect()
    }

    /// Serializable view for reports.
    pub fn snapshot(&self, job_count: usize) -> ArchiveSnapshot {
        ArchiveSnapshot {
            size: self.len(),
            max_size: self.max_size,
            distance: self.distance(),
            front: self.front(),
            relative_front: self.relative_front(job_count),
        }
    }

    /// Archived schedules.
    pub fn members(&self) -> &[Schedule] {
        &self.members
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the archive is empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Capacity.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Grid bits per axis.
    pub fn location_bits(&self) -> u32 {
        self.location_bits
    }

    /// Queue-time range as of the last refresh.
    pub fn queue_range(&self) -> AxisRange {
        self.queue_range
    }

    /// Price range as of the last refresh.
    pub fn price_range(&self) -> AxisRange {
        self.price_range
    }

    /// One-line description.
    pub fn summary(&self) -> String {
        format!(
            "ScheduleArchive contains {} of at most {} schedules.",
            self.members.len(),
            self.max_size
        )
    }
}

fn encode(
    price_range: &AxisRange,
    queue_range: &AxisRange,
    bits: u32,
    objectives: &Objectives,
) -> Result<GridLocation> {
    let price_code = price_range.encode(objectives.price, bits)?;
    let queue_code = queue_range.encode(objectives.queue_time, bits)?;
    Ok(GridLocation::from_codes(price_code, queue_code, bits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::tests::ScriptedRng;
    use crate::random::SeededRng;
    use proptest::prelude::*;

    /// `(price, queue_time)` in the argument order used by the scenarios.
    fn s(price: f64, queue_time: f64) -> Schedule {
        Schedule::evaluated(queue_time, price)
    }

    fn assert_non_dominated(archive: &ScheduleArchive) {
        let front = archive.front();
        for a in &front {
            for b in &front {
                assert!(!a.dominates(b), "{a} dominates {b}");
            }
        }
    }

    #[test]
    fn test_new_validates() {
        assert!(ScheduleArchive::new(0, 8).is_err());
        assert!(ScheduleArchive::new(10, 0).is_err());
        assert!(ScheduleArchive::new(10, 33).is_err());
        assert!(ScheduleArchive::new(10, 32).is_ok());
    }

    #[test]
    fn test_full_archive_evicts_crowded() {
        let mut archive = ScheduleArchive::new(2, 8).unwrap();
        let mut rng = SeededRng::new(42);
        let a = s(10.0, 1.0);
        let b = s(1.0, 10.0);
        let c = s(5.0, 5.0);

        assert!(!archive.archive_schedule(&a, &mut rng).unwrap());
        assert!(!archive.archive_schedule(&b, &mut rng).unwrap());
        assert_eq!(archive.len(), 2);

        assert!(!archive.archive_schedule(&c, &mut rng).unwrap());
        assert_eq!(archive.len(), 2);
        let front = archive.front();
        assert!(front.contains(&Objectives::new(5.0, 5.0)));
        assert!(
            front.contains(&Objectives::new(1.0, 10.0))
                ^ front.contains(&Objectives::new(10.0, 1.0))
        );
    }

    #[test]
    fn test_crowded_tie_break_uses_rng() {
        for (draw, survivor) in [(0u64, Objectives::new(10.0, 1.0)), (1, Objectives::new(1.0, 10.0))] {
            let mut archive = ScheduleArchive::new(2, 8).unwrap();
            let mut rng = ScriptedRng::new([draw]);
            archive.insert(&s(10.0, 1.0), &mut rng).unwrap();
            archive.insert(&s(1.0, 10.0), &mut rng).unwrap();
            let outcome = archive.insert(&s(5.0, 5.0), &mut rng).unwrap();
            assert_eq!(outcome, ArchiveOutcome::ReplacedCrowded);
            // Draw 0 evicts the first member (A), draw 1 the second (B).
            assert!(archive.front().contains(&survivor));
        }
    }

    #[test]
    fn test_eviction_prefers_most_populated_cell() {
        // One bit per axis. A and B share the high-price/low-queue cell.
        let mut archive = ScheduleArchive::new(3, 1).unwrap();
        let mut rng = SeededRng::new(3);
        archive.insert(&s(10.0, 0.0), &mut rng).unwrap();
        archive.insert(&s(9.0, 1.0), &mut rng).unwrap();
        archive.insert(&s(0.0, 10.0), &mut rng).unwrap();

        let outcome = archive.insert(&s(5.0, 5.0), &mut rng).unwrap();
        assert_eq!(outcome, ArchiveOutcome::ReplacedCrowded);
        let front = archive.front();
        assert_eq!(front.len(), 3);
        assert!(front.contains(&Objectives::new(10.0, 0.0)));
        assert!(front.contains(&Objectives::new(5.0, 5.0)));
        let crowded_survivors = [Objectives::new(0.0, 10.0), Objectives::new(1.0, 9.0)]
            .iter()
            .filter(|o| front.contains(o))
            .count();
        assert_eq!(crowded_survivors, 1);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut archive = ScheduleArchive::new(5, 8).unwrap();
        let mut rng = SeededRng::new(1);
        archive.insert(&s(3.0, 3.0), &mut rng).unwrap();
        assert_eq!(
            archive.insert(&s(3.0, 3.0), &mut rng).unwrap(),
            ArchiveOutcome::Duplicate
        );
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_dominated_candidate_rejected() {
        let mut archive = ScheduleArchive::new(5, 8).unwrap();
        let mut rng = SeededRng::new(1);
        archive.insert(&s(3.0, 3.0), &mut rng).unwrap();
        assert_eq!(
            archive.insert(&s(4.0, 3.0), &mut rng).unwrap(),
            ArchiveOutcome::Dominated
        );
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_dominating_candidate_replaces_members() {
        let mut archive = ScheduleArchive::new(5, 8).unwrap();
        let mut rng = SeededRng::new(1);
        archive.insert(&s(10.0, 1.0), &mut rng).unwrap();
        archive.insert(&s(5.0, 5.0), &mut rng).unwrap();
        archive.insert(&s(1.0, 10.0), &mut rng).unwrap();

        let outcome = archive.insert(&s(4.0, 4.0), &mut rng).unwrap();
        assert_eq!(outcome, ArchiveOutcome::ReplacedDominated(1));
        assert!(outcome.evicted_dominated());
        assert_eq!(archive.len(), 3);

        assert!(archive.archive_schedule(&s(0.5, 0.5), &mut rng).unwrap());
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_tainted_candidate_fails() {
        use crate::models::{Job, ResourcePool, SchedulingProblem, Workload};

        let workload = Workload::from_jobs([Job::new(1, 0.0, 1.0)]).unwrap();
        let problem = SchedulingProblem::new(workload, ResourcePool::three_simple()).unwrap();
        let mut rng = SeededRng::new(1);
        let tainted = Schedule::random(&problem, &mut rng).unwrap();

        let mut archive = ScheduleArchive::new(5, 8).unwrap();
        assert!(matches!(
            archive.insert(&tainted, &mut rng),
            Err(PaesError::StaleState { .. })
        ));
    }

    #[test]
    fn test_update_all_locations() {
        let mut archive = ScheduleArchive::new(5, 2).unwrap();
        let mut rng = SeededRng::new(1);
        archive.insert(&s(8.0, 0.0), &mut rng).unwrap();
        archive.insert(&s(0.0, 8.0), &mut rng).unwrap();
        archive.insert(&s(3.0, 3.0), &mut rng).unwrap();
        assert!(!archive.is_grid_current());

        archive.update_all_locations().unwrap();
        assert!(archive.is_grid_current());
        assert_eq!(archive.price_range(), AxisRange::new(0.0, 8.0));
        assert_eq!(archive.queue_range(), AxisRange::new(0.0, 8.0));

        let locations: Vec<GridLocation> =
            archive.members().iter().map(|m| m.location().unwrap()).collect();
        // price 8 -> 11, queue 0 -> 00
        assert_eq!(locations[0], GridLocation::from_codes(0b11, 0b00, 2));
        // price 0 -> 00, queue 8 -> 11
        assert_eq!(locations[1], GridLocation::from_codes(0b00, 0b11, 2));
        // 3 -> [0,4) then [2,4) -> 01
        assert_eq!(locations[2], GridLocation::from_codes(0b01, 0b01, 2));

        for loc in &locations {
            assert_eq!(archive.population_count(*loc), 1);
        }
        assert_eq!(archive.population_count(GridLocation::from_codes(0b10, 0b10, 2)), 0);
    }

    #[test]
    fn test_locate_out_of_range() {
        let mut archive = ScheduleArchive::new(5, 4).unwrap();
        let mut rng = SeededRng::new(1);
        archive.insert(&s(2.0, 2.0), &mut rng).unwrap();
        archive.insert(&s(1.0, 4.0), &mut rng).unwrap();
        archive.update_all_locations().unwrap();

        assert!(matches!(
            archive.locate(&Objectives::new(100.0, 1.0)),
            Err(PaesError::InvalidLocation { .. })
        ));

        let mut outside = s(0.5, 9.0);
        assert!(!archive.assign_location(&mut outside).unwrap());
        assert!(outside.location().is_none());

        let mut inside = s(1.5, 3.0);
        assert!(archive.assign_location(&mut inside).unwrap());
        assert!(inside.location().is_some());
    }

    #[test]
    fn test_dominates_and_is_dominated() {
        let mut archive = ScheduleArchive::new(5, 8).unwrap();
        let mut rng = SeededRng::new(1);
        archive.insert(&s(2.0, 2.0), &mut rng).unwrap();

        let worse = s(3.0, 3.0);
        assert!(archive.dominates(&worse).unwrap());
        assert!(!archive.is_dominated(&worse).unwrap());

        let trade_off = s(1.0, 5.0);
        assert!(!archive.dominates(&trade_off).unwrap());
        assert!(archive.is_dominated(&trade_off).unwrap());
    }

    #[test]
    fn test_distance() {
        let mut archive = ScheduleArchive::new(5, 8).unwrap();
        let mut rng = SeededRng::new(1);
        assert_eq!(archive.distance(), 0.0);

        // (queue, price): (0, 4), (2, 2), (4, 0)
        archive.insert(&s(4.0, 0.0), &mut rng).unwrap();
        assert_eq!(archive.distance(), 0.0);
        archive.insert(&s(0.0, 4.0), &mut rng).unwrap();
        archive.insert(&s(2.0, 2.0), &mut rng).unwrap();

        // 2 * (4 + 2) / 2 + 2 * (2 + 0) / 2 = 6 + 2
        assert!((archive.distance() - 8.0).abs() < 1e-10);
    }

    #[test]
    fn test_front_and_snapshot() {
        let mut archive = ScheduleArchive::new(5, 8).unwrap();
        let mut rng = SeededRng::new(1);
        archive.insert(&s(1.0, 10.0), &mut rng).unwrap();
        archive.insert(&s(10.0, 2.0), &mut rng).unwrap();

        let front = archive.front();
        assert_eq!(front[0], Objectives::new(2.0, 10.0));
        assert_eq!(front[1], Objectives::new(10.0, 1.0));

        let relative = archive.relative_front(2);
        assert_eq!(relative[0], Objectives::new(1.0, 5.0));

        let snap = archive.snapshot(2);
        assert_eq!(snap.size, 2);
        assert_eq!(snap.max_size, 5);
        let json = serde_json::to_string(&snap).unwrap();
        let back: ArchiveSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
        assert!(archive.summary().contains("2 of at most 5"));
    }

    proptest! {
        #[test]
        fn prop_archive_stays_non_dominated_and_bounded(
            points in proptest::collection::vec((0u8..20, 0u8..20), 1..60),
            max_size in 1usize..8,
            seed in any::<u64>(),
        ) {
            let mut archive = ScheduleArchive::new(max_size, 4).unwrap();
            let mut rng = SeededRng::new(seed);
            for (p, q) in points {
                archive.insert(&s(f64::from(p), f64::from(q)), &mut rng).unwrap();
                prop_assert!(archive.len() <= max_size);
                assert_non_dominated(&archive);
                let front = archive.front();
                for w in front.windows(2) {
                    prop_assert_ne!(w[0], w[1]);
                }
            }
        }
    }
}
