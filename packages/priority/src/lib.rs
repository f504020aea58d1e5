#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Proximity-based priority classification for civic reports.
//!
//! Each report gets an advisory [`PriorityTier`] derived from how many
//! *other* located reports sit within [`PROXIMITY_RADIUS_METERS`] of it.
//! Distances are great-circle distances from the haversine formula (see
//! [`distance`]).
//!
//! Counting is isolated behind the [`NearbyCounter`] trait. [`LinearScan`]
//! compares every pair (quadratic in the size of the comparison set);
//! [`ProximityIndex`] answers the same question from an R-tree and is
//! interchangeable with it.
//!
//! Classification is a pure function of the supplied comparison set. The
//! same report can land in a different tier when the caller narrows the
//! set (e.g. by a status or category filter) before classifying.

pub mod classifier;
pub mod distance;
pub mod index;

pub use classifier::{
    Classification, HIGH_THRESHOLD, LinearScan, Locatable, MEDIUM_THRESHOLD, NearbyCounter,
    PROXIMITY_RADIUS_METERS, classify, classify_all, classify_all_with, classify_with,
    tier_for_count, within_radius,
};
pub use distance::{EARTH_RADIUS_METERS, distance, distance_between};
pub use index::ProximityIndex;
pub use sahaayak_report_models::PriorityTier;
