//! R-tree backed [`NearbyCounter`].
//!
//! Points are indexed in `[longitude, latitude]` degree space. A radius
//! query is turned into one or two degree-space envelopes that are
//! guaranteed to contain every point within the radius (the spherical cap
//! bounding box), and candidates are then confirmed with the exact
//! haversine distance. Results are identical to [`LinearScan`].
//!
//! [`LinearScan`]: crate::LinearScan

use std::collections::BTreeSet;

use rstar::{AABB, RTree, RTreeObject};
use sahaayak_report_models::{Coordinates, ReportId};

use crate::classifier::{Locatable, NearbyCounter, within_radius};
use crate::distance::{EARTH_RADIUS_METERS, distance_between};

/// Relative padding applied to envelope half-widths to absorb rounding.
const ENVELOPE_PADDING: f64 = 1.0e-6;

/// A located report stored in the R-tree.
struct IndexedReport {
    slot: usize,
    id: ReportId,
    coordinates: Coordinates,
}

impl RTreeObject for IndexedReport {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.coordinates.longitude(), self.coordinates.latitude()])
    }
}

/// Spatial index over the located reports of one comparison set.
pub struct ProximityIndex {
    tree: RTree<IndexedReport>,
}

impl ProximityIndex {
    /// Bulk-loads the located reports of `reports`.
    #[must_use]
    pub fn new<T: Locatable>(reports: &[T]) -> Self {
        let entries: Vec<IndexedReport> = reports
            .iter()
            .filter_map(|r| r.location().coordinates().map(|c| (r.report_id(), c)))
            .enumerate()
            .map(|(slot, (id, coordinates))| IndexedReport {
                slot,
                id,
                coordinates,
            })
            .collect();

        log::debug!("Built proximity index over {} located reports", entries.len());

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of located reports in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no located reports.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl NearbyCounter for ProximityIndex {
    fn count_nearby(&self, origin: Coordinates, exclude: ReportId, radius_meters: f64) -> usize {
        if radius_meters.is_nan() || radius_meters < 0.0 {
            return 0;
        }

        // Envelopes may overlap when they are clamped, so dedupe by slot.
        let mut matched = BTreeSet::new();

        for envelope in search_envelopes(origin, radius_meters) {
            for entry in self.tree.locate_in_envelope_intersecting(&envelope) {
                if entry.id != exclude
                    && within_radius(distance_between(origin, entry.coordinates), radius_meters)
                {
                    matched.insert(entry.slot);
                }
            }
        }

        matched.len()
    }
}

/// Degree-space envelopes covering every point within `radius_meters` of
/// `origin`.
///
/// Returns a single envelope spanning all longitudes when the cap reaches a
/// pole, and a second envelope on the far side when the cap crosses the
/// antimeridian.
fn search_envelopes(origin: Coordinates, radius_meters: f64) -> Vec<AABB<[f64; 2]>> {
    let pad = |degrees: f64| degrees.mul_add(1.0 + ENVELOPE_PADDING, ENVELOPE_PADDING);

    let angular = radius_meters / EARTH_RADIUS_METERS;
    let lat = origin.latitude();
    let lon = origin.longitude();

    let dlat = pad(angular.to_degrees());
    let south = (lat - dlat).max(-90.0);
    let north = (lat + dlat).min(90.0);

    let full_band = || vec![AABB::from_corners([-180.0, south], [180.0, north])];

    if lat.abs() + dlat >= 90.0 {
        return full_band();
    }

    let ratio = angular.sin() / lat.to_radians().cos();
    if ratio >= 1.0 {
        return full_band();
    }

    let dlon = pad(ratio.asin().to_degrees());
    if dlon >= 180.0 {
        return full_band();
    }

    let west = lon - dlon;
    let east = lon + dlon;

    let mut envelopes = vec![AABB::from_corners(
        [west.max(-180.0), south],
        [east.min(180.0), north],
    )];
    if west < -180.0 {
        envelopes.push(AABB::from_corners([west + 360.0, south], [180.0, north]));
    }
    if east > 180.0 {
        envelopes.push(AABB::from_corners([-180.0, south], [east - 360.0, north]));
    }

    envelopes
}
