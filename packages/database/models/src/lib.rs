#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Report store query parameters and insert payloads.
//!
//! These types describe what callers ask of the report store. They are
//! distinct from the API types in `sahaayak_server_models` so the storage
//! layer can evolve independently of the JSON contract.

use chrono::NaiveDate;
use sahaayak_report_models::{Location, ReportStatus};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Ordering of listed reports by id.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportSort {
    /// Most recently filed first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
}

/// Filters for listing reports. `None` means "don't filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportQuery {
    /// Only reports with this status.
    pub status: Option<ReportStatus>,
    /// Only reports with this exact category label.
    pub category: Option<String>,
    /// Only reports filed on this calendar day.
    pub date: Option<NaiveDate>,
    /// Only reports filed under this citizen name.
    pub name: Option<String>,
    /// Result ordering.
    pub sort: ReportSort,
}

/// A report as submitted, before the store assigns an id and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    /// Citizen name.
    pub name: Option<String>,
    /// Issue description.
    pub description: Option<String>,
    /// Category label; the store falls back to `"Other"` when absent.
    pub category: Option<String>,
    /// Stored photo path.
    pub photo: Option<String>,
    /// Stored voice note path.
    pub voice: Option<String>,
    /// Geotag, if supplied and valid.
    pub location: Location,
    /// Human-readable address.
    pub address: Option<String>,
}
