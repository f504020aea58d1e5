#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Civic report types shared across the Sahaayak workspace.
//!
//! A [`Report`] is a citizen-filed civic issue (pothole, broken streetlight,
//! garbage dump, ...) with an optional geotag. Coordinates are modelled as a
//! [`Location`] sum type so that "no location" is a distinct state rather
//! than a pair of nullable floats.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Category assigned to reports submitted without one.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Stable identifier of a report within the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub i64);

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ReportId {
    /// Returns the raw numeric identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for ReportId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Error returned when a latitude/longitude pair is not a valid WGS84
/// position.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum InvalidCoordinatesError {
    /// One of the components is `NaN` or infinite.
    #[error("coordinates must be finite (got {latitude}, {longitude})")]
    NonFinite {
        /// Offending latitude.
        latitude: f64,
        /// Offending longitude.
        longitude: f64,
    },
    /// Latitude outside `[-90, 90]`.
    #[error("latitude {0} out of range: expected -90..=90")]
    LatitudeOutOfRange(f64),
    /// Longitude outside `[-180, 180]`.
    #[error("longitude {0} out of range: expected -180..=180")]
    LongitudeOutOfRange(f64),
}

/// A validated WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Creates a position after checking that both components are finite
    /// and within range.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinatesError`] if either component is
    /// non-finite or out of range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinatesError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(InvalidCoordinatesError::NonFinite {
                latitude,
                longitude,
            });
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidCoordinatesError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinatesError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn latitude(self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn longitude(self) -> f64 {
        self.longitude
    }
}

/// Where a report was filed from, if the reporter shared it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Location {
    /// The report carries a valid position.
    Located(Coordinates),
    /// No position, or the supplied one was malformed.
    Unlocated,
}

impl Location {
    /// Builds a location from the raw, optional columns of a stored or
    /// submitted report.
    ///
    /// A missing component or an invalid pair yields [`Location::Unlocated`]
    /// rather than an error: a malformed geotag is treated exactly like an
    /// absent one.
    #[must_use]
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => {
                Coordinates::new(lat, lon).map_or(Self::Unlocated, Self::Located)
            }
            _ => Self::Unlocated,
        }
    }

    /// Returns the coordinates if located.
    #[must_use]
    pub const fn coordinates(self) -> Option<Coordinates> {
        match self {
            Self::Located(c) => Some(c),
            Self::Unlocated => None,
        }
    }

    /// Whether this location carries coordinates.
    #[must_use]
    pub const fn is_located(self) -> bool {
        matches!(self, Self::Located(_))
    }

    /// Latitude if located.
    #[must_use]
    pub const fn latitude(self) -> Option<f64> {
        match self {
            Self::Located(c) => Some(c.latitude),
            Self::Unlocated => None,
        }
    }

    /// Longitude if located.
    #[must_use]
    pub const fn longitude(self) -> Option<f64> {
        match self {
            Self::Located(c) => Some(c.longitude),
            Self::Unlocated => None,
        }
    }
}

impl From<Coordinates> for Location {
    fn from(value: Coordinates) -> Self {
        Self::Located(value)
    }
}

/// Triage priority of a report.
///
/// Used both for the manually assigned, persisted priority and for the
/// advisory tier computed from report density.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum PriorityTier {
    /// Isolated report.
    Low,
    /// A handful of reports nearby.
    Medium,
    /// Dense cluster of reports.
    High,
}

impl PriorityTier {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High]
    }
}

/// Lifecycle status of a report as set by the authority.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ReportStatus {
    /// Filed, not yet picked up.
    #[default]
    Pending,
    /// Being worked on.
    #[serde(rename = "In Progress")]
    #[strum(serialize = "In Progress")]
    InProgress,
    /// Closed by the authority.
    Resolved,
}

impl ReportStatus {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Pending, Self::InProgress, Self::Resolved]
    }
}

/// Citizen satisfaction rating, 1 (worst) to 5 (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    /// Creates a rating from a numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-5.
    pub const fn from_value(value: i64) -> Result<Self, InvalidRatingError> {
        match value {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            1..=5 => Ok(Self(value as u8)),
            _ => Err(InvalidRatingError { value }),
        }
    }

    /// Returns the numeric value of this rating.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// Error returned when attempting to create a [`Rating`] from an invalid
/// numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid rating {value}: expected 1-5")]
pub struct InvalidRatingError {
    /// The invalid rating value that was provided.
    pub value: i64,
}

/// A civic issue report.
///
/// Everything except `id` and `location` is opaque to priority
/// classification and simply carried through.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Primary key.
    pub id: ReportId,
    /// Name of the citizen who filed the report.
    pub name: Option<String>,
    /// Free-text description of the issue.
    pub description: Option<String>,
    /// Free-form category label (e.g. "Roads", "Sanitation").
    pub category: String,
    /// Stored path of the attached photo, if any.
    pub photo: Option<String>,
    /// Stored path of the attached voice note, if any.
    pub voice: Option<String>,
    /// Where the issue was reported.
    pub location: Location,
    /// Human-readable address supplied with the report.
    pub address: Option<String>,
    /// Current lifecycle status.
    pub status: ReportStatus,
    /// Manually assigned priority. Independent of the computed tier.
    pub priority: PriorityTier,
    /// Citizen rating once resolved.
    pub rating: Option<Rating>,
    /// Citizen feedback text accompanying the rating.
    pub feedback: Option<String>,
    /// When the report was filed (local time, second precision).
    pub created_at: NaiveDateTime,
}
