//! Density-based priority tiers.
//!
//! A report's tier is a function of `nearby_count`: the number of *other*
//! located reports in the comparison set within [`PROXIMITY_RADIUS_METERS`]
//! of it.
//!
//! | `nearby_count` | tier     |
//! |----------------|----------|
//! | `>= 5`         | `High`   |
//! | `2..=4`        | `Medium` |
//! | `< 2`          | `Low`    |
//!
//! Unlocated reports are always `Low`.

use std::collections::BTreeMap;

use sahaayak_report_models::{Coordinates, Location, PriorityTier, Report, ReportId};

use crate::distance::distance_between;

/// Radius within which two reports count as clustered, in meters.
///
/// Midpoint of the 200-300 m clustering band.
pub const PROXIMITY_RADIUS_METERS: f64 = 250.0;

/// Minimum `nearby_count` for [`PriorityTier::Medium`].
pub const MEDIUM_THRESHOLD: usize = 2;

/// Minimum `nearby_count` for [`PriorityTier::High`].
pub const HIGH_THRESHOLD: usize = 5;

/// Computed tier per report. Advisory and never persisted.
pub type Classification = BTreeMap<ReportId, PriorityTier>;

/// Anything that can take part in proximity classification.
pub trait Locatable {
    /// Identifier used to exclude a report from its own count.
    fn report_id(&self) -> ReportId;

    /// Position of the report, if any.
    fn location(&self) -> Location;
}

impl Locatable for Report {
    fn report_id(&self) -> ReportId {
        self.id
    }

    fn location(&self) -> Location {
        self.location
    }
}

/// Counts reports of a comparison set near a position.
pub trait NearbyCounter {
    /// Number of located reports whose id differs from `exclude` and whose
    /// distance to `origin` is at most `radius_meters`.
    fn count_nearby(&self, origin: Coordinates, exclude: ReportId, radius_meters: f64) -> usize;
}

/// Inclusive radius test: a report exactly on the boundary is nearby.
#[must_use]
pub fn within_radius(distance_meters: f64, radius_meters: f64) -> bool {
    distance_meters <= radius_meters
}

/// Maps a nearby count to its tier.
#[must_use]
pub const fn tier_for_count(nearby_count: usize) -> PriorityTier {
    if nearby_count >= HIGH_THRESHOLD {
        PriorityTier::High
    } else if nearby_count >= MEDIUM_THRESHOLD {
        PriorityTier::Medium
    } else {
        PriorityTier::Low
    }
}

/// Brute-force counter that measures the distance to every located report.
#[derive(Debug, Clone, Default)]
pub struct LinearScan {
    points: Vec<(ReportId, Coordinates)>,
}

impl LinearScan {
    /// Snapshots the located reports of `reports`. Unlocated ones are
    /// dropped up front since they can never be nearby.
    #[must_use]
    pub fn new<T: Locatable>(reports: &[T]) -> Self {
        let points = reports
            .iter()
            .filter_map(|r| r.location().coordinates().map(|c| (r.report_id(), c)))
            .collect();
        Self { points }
    }
}

impl NearbyCounter for LinearScan {
    fn count_nearby(&self, origin: Coordinates, exclude: ReportId, radius_meters: f64) -> usize {
        self.points
            .iter()
            .filter(|(id, coordinates)| {
                *id != exclude && within_radius(distance_between(origin, *coordinates), radius_meters)
            })
            .count()
    }
}

/// Classifies `target` against `all_reports` with a [`LinearScan`].
///
/// `target` is excluded from its own count by id, so it may or may not be
/// a member of `all_reports`.
#[must_use]
pub fn classify<T: Locatable>(target: &T, all_reports: &[T]) -> PriorityTier {
    classify_with(&LinearScan::new(all_reports), target)
}

/// Classifies `target` using a prebuilt counter over the comparison set.
#[must_use]
pub fn classify_with<C, T>(counter: &C, target: &T) -> PriorityTier
where
    C: NearbyCounter + ?Sized,
    T: Locatable + ?Sized,
{
    let Location::Located(origin) = target.location() else {
        return PriorityTier::Low;
    };

    tier_for_count(counter.count_nearby(origin, target.report_id(), PROXIMITY_RADIUS_METERS))
}

/// Classifies every report in `reports` against `reports` itself.
///
/// The comparison set is exactly what the caller passes in. When the caller
/// has already applied status/category/date filters, the tiers reflect only
/// the clustering among the filtered reports, not the whole store.
#[must_use]
pub fn classify_all<T: Locatable>(reports: &[T]) -> Classification {
    classify_all_with(&LinearScan::new(reports), reports)
}

/// Classifies every report in `reports` using `counter`, which must have
/// been built over the same set.
#[must_use]
pub fn classify_all_with<C, T>(counter: &C, reports: &[T]) -> Classification
where
    C: NearbyCounter + ?Sized,
    T: Locatable,
{
    let classification: Classification = reports
        .iter()
        .map(|r| (r.report_id(), classify_with(counter, r)))
        .collect();

    if log::log_enabled!(log::Level::Debug) {
        let high = classification
            .values()
            .filter(|t| **t == PriorityTier::High)
            .count();
        let medium = classification
            .values()
            .filter(|t| **t == PriorityTier::Medium)
            .count();
        log::debug!(
            "Classified {} reports ({high} high, {medium} medium)",
            classification.len()
        );
    }

    classification
}
