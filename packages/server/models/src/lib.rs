#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the Sahaayak report server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the domain types in `sahaayak_report_models` so the API contract can
//! evolve independently (e.g. coordinates are flattened to two nullable
//! numbers here).

use sahaayak_report_models::{PriorityTier, Report, ReportStatus};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Format of `createdAt` in API responses.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A civic report as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReport {
    /// Unique report ID.
    pub id: i64,
    /// Citizen name.
    pub name: Option<String>,
    /// Issue description.
    pub description: Option<String>,
    /// Category label.
    pub category: String,
    /// Stored photo path.
    pub photo: Option<String>,
    /// Stored voice note path.
    pub voice: Option<String>,
    /// Latitude, if the report is located.
    pub latitude: Option<f64>,
    /// Longitude, if the report is located.
    pub longitude: Option<f64>,
    /// Human-readable address.
    pub address: Option<String>,
    /// Lifecycle status.
    pub status: ReportStatus,
    /// Manually assigned priority.
    pub priority: PriorityTier,
    /// Density-based tier computed for this response only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_priority: Option<PriorityTier>,
    /// Citizen rating (1-5).
    pub rating: Option<u8>,
    /// Citizen feedback.
    pub feedback: Option<String>,
    /// When the report was filed.
    pub created_at: String,
}

impl ApiReport {
    /// Attaches a computed tier.
    #[must_use]
    pub fn with_auto_priority(mut self, tier: PriorityTier) -> Self {
        self.auto_priority = Some(tier);
        self
    }
}

impl From<Report> for ApiReport {
    fn from(report: Report) -> Self {
        Self {
            id: report.id.value(),
            name: report.name,
            description: report.description,
            category: report.category,
            photo: report.photo,
            voice: report.voice,
            latitude: report.location.latitude(),
            longitude: report.location.longitude(),
            address: report.address,
            status: report.status,
            priority: report.priority,
            auto_priority: None,
            rating: report.rating.map(sahaayak_report_models::Rating::value),
            feedback: report.feedback,
            created_at: report.created_at.format(CREATED_AT_FORMAT).to_string(),
        }
    }
}

/// Query parameters for the dashboard listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportListParams {
    /// Only reports with this status.
    pub status: Option<String>,
    /// Only reports in this category.
    pub category: Option<String>,
    /// Only reports filed on this day (`YYYY-MM-DD`).
    pub date: Option<String>,
    /// Only reports whose computed tier matches.
    pub priority: Option<String>,
}

/// Query parameters for a citizen's own reports.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MyReportsParams {
    /// Citizen name. Required; an absent name yields an empty list.
    pub name: Option<String>,
    /// Only reports with this status.
    pub status: Option<String>,
    /// `newest` (default) or `oldest`.
    pub sort: Option<String>,
}

/// Body of a report submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    /// Citizen name.
    pub name: Option<String>,
    /// Issue description.
    pub description: Option<String>,
    /// Category label (defaults to `"Other"`).
    pub category: Option<String>,
    /// Latitude in decimal degrees.
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub longitude: Option<f64>,
    /// Human-readable address.
    pub address: Option<String>,
    /// Path of an already stored photo.
    pub photo: Option<String>,
    /// Path of an already stored voice note.
    pub voice: Option<String>,
}

/// Reads a submitted coordinate.
///
/// Browser forms send numbers, numeric strings, or `""` when geolocation
/// was denied. Anything that is not a number or a numeric string reads as
/// `None` instead of failing the whole request.
///
/// # Errors
///
/// Only if the input is not valid JSON.
pub fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Body of a status update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdateRequest {
    /// New status name.
    pub status: Option<String>,
}

/// Body of a manual priority update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriorityUpdateRequest {
    /// New priority name.
    pub priority: Option<String>,
}

/// Body of a feedback submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackRequest {
    /// Rating from 1 to 5.
    pub rating: Option<i64>,
    /// Optional free-text feedback.
    pub feedback: Option<String>,
}

/// Acknowledgement for mutation endpoints.
#[derive(Debug, Serialize)]
pub struct ApiSuccess {
    /// Always `true`.
    pub success: bool,
}

/// Error payload.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}
