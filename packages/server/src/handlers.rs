//! HTTP handler functions for the report API.

use std::str::FromStr;
use std::sync::MutexGuard;

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use sahaayak_database::reports;
use sahaayak_database_models::{NewReport, ReportQuery, ReportSort};
use sahaayak_priority::{Classification, ProximityIndex, classify_all, classify_all_with};
use sahaayak_report_models::{Location, PriorityTier, Rating, Report, ReportId, ReportStatus};
use sahaayak_server_models::{
    ApiError, ApiHealth, ApiReport, ApiSuccess, CreateReportRequest, FeedbackRequest,
    MyReportsParams, PriorityUpdateRequest, ReportListParams, StatusUpdateRequest,
};

use crate::AppState;

/// Above this many reports the listing builds an R-tree instead of
/// comparing every pair.
pub const INDEX_THRESHOLD: usize = 512;

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError {
        error: message.to_string(),
    })
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiError {
        error: "Report not found".to_string(),
    })
}

fn internal_error(message: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiError {
        error: message.to_string(),
    })
}

fn lock_db(state: &AppState) -> Result<MutexGuard<'_, duckdb::Connection>, HttpResponse> {
    state.db.lock().map_err(|_| {
        log::error!("Report store mutex poisoned");
        internal_error("Report store unavailable")
    })
}

/// Treats absent and blank query values alike.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_filter<T: FromStr>(value: Option<&str>, message: &str) -> Result<Option<T>, HttpResponse> {
    non_empty(value)
        .map(|v| v.parse().map_err(|_| bad_request(message)))
        .transpose()
}

fn parse_status(value: Option<&str>) -> Result<Option<ReportStatus>, HttpResponse> {
    parse_filter(value, "Status must be Pending, In Progress, or Resolved")
}

fn classify_snapshot(reports: &[Report]) -> Classification {
    if reports.len() >= INDEX_THRESHOLD {
        classify_all_with(&ProximityIndex::new(reports), reports)
    } else {
        classify_all(reports)
    }
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/reports`
///
/// Lists reports for the dashboard, newest first, filtered by status,
/// category and day. Every returned report carries an `autoPriority`
/// computed against the *filtered* set, so narrowing the filters can lower
/// (or raise) a report's tier. The optional `priority` filter is applied to
/// the computed tiers afterwards.
pub async fn list_reports(
    state: web::Data<AppState>,
    params: web::Query<ReportListParams>,
) -> HttpResponse {
    let status = match parse_status(params.status.as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let priority: Option<PriorityTier> = match parse_filter(
        params.priority.as_deref(),
        "Priority must be Low, Medium, or High",
    ) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let date = match non_empty(params.date.as_deref())
        .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
        .transpose()
    {
        Ok(v) => v,
        Err(_) => return bad_request("Date must be YYYY-MM-DD"),
    };

    let query = ReportQuery {
        status,
        category: non_empty(params.category.as_deref()).map(ToString::to_string),
        date,
        name: None,
        sort: ReportSort::Newest,
    };

    let snapshot = {
        let conn = match lock_db(&state) {
            Ok(conn) => conn,
            Err(resp) => return resp,
        };
        match reports::query_reports(&conn, &query) {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("Failed to query reports: {e}");
                return internal_error("Failed to query reports");
            }
        }
    };

    let classification = classify_snapshot(&snapshot);

    let api_reports: Vec<ApiReport> = snapshot
        .into_iter()
        .map(|report| {
            let tier = classification
                .get(&report.id)
                .copied()
                .unwrap_or(PriorityTier::Low);
            ApiReport::from(report).with_auto_priority(tier)
        })
        .filter(|r| priority.is_none_or(|p| r.auto_priority == Some(p)))
        .collect();

    HttpResponse::Ok().json(api_reports)
}

/// `POST /api/reports`
///
/// Files a new report. Malformed coordinates are dropped and the report is
/// stored without a location.
pub async fn create_report(
    state: web::Data<AppState>,
    body: web::Json<CreateReportRequest>,
) -> HttpResponse {
    let body = body.into_inner();
    let location = Location::from_parts(body.latitude, body.longitude);
    if !location.is_located() && (body.latitude.is_some() || body.longitude.is_some()) {
        log::warn!(
            "Discarding malformed coordinates ({:?}, {:?}) on new report",
            body.latitude,
            body.longitude
        );
    }

    let new_report = NewReport {
        name: body.name,
        description: body.description,
        category: body.category,
        photo: body.photo,
        voice: body.voice,
        location,
        address: body.address,
    };
    let created_at = chrono::Local::now().naive_local();

    let conn = match lock_db(&state) {
        Ok(conn) => conn,
        Err(resp) => return resp,
    };
    match reports::insert_report(&conn, &new_report, created_at) {
        Ok(report) => HttpResponse::Created().json(ApiReport::from(report)),
        Err(e) => {
            log::error!("Failed to store report: {e}");
            internal_error("Failed to store report")
        }
    }
}

/// `GET /api/my-reports`
///
/// Lists a citizen's own reports. No priority is computed here.
pub async fn my_reports(
    state: web::Data<AppState>,
    params: web::Query<MyReportsParams>,
) -> HttpResponse {
    let Some(name) = non_empty(params.name.as_deref()) else {
        return HttpResponse::Ok().json(Vec::<ApiReport>::new());
    };
    let status = match parse_status(params.status.as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let sort = non_empty(params.sort.as_deref())
        .and_then(|s| ReportSort::from_str(s).ok())
        .unwrap_or_default();

    let query = ReportQuery {
        status,
        name: Some(name.to_string()),
        sort,
        ..ReportQuery::default()
    };

    let conn = match lock_db(&state) {
        Ok(conn) => conn,
        Err(resp) => return resp,
    };
    match reports::query_reports(&conn, &query) {
        Ok(rows) => {
            let api_reports: Vec<ApiReport> = rows.into_iter().map(ApiReport::from).collect();
            HttpResponse::Ok().json(api_reports)
        }
        Err(e) => {
            log::error!("Failed to query reports for {name}: {e}");
            internal_error("Failed to query reports")
        }
    }
}

/// `PUT /api/reports/{id}/status`
pub async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
) -> HttpResponse {
    let id = ReportId(path.into_inner());
    let status = match parse_status(body.status.as_deref()) {
        Ok(Some(status)) => status,
        Ok(None) => return bad_request("Status is required"),
        Err(resp) => return resp,
    };

    let conn = match lock_db(&state) {
        Ok(conn) => conn,
        Err(resp) => return resp,
    };
    match reports::update_status(&conn, id, status) {
        Ok(true) => {
            log::info!("Report {id} status -> {status}");
            HttpResponse::Ok().json(ApiSuccess { success: true })
        }
        Ok(false) => not_found(),
        Err(e) => {
            log::error!("Failed to update status of report {id}: {e}");
            internal_error("Failed to update status")
        }
    }
}

/// `POST /api/reports/{id}/feedback`
pub async fn submit_feedback(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<FeedbackRequest>,
) -> HttpResponse {
    let id = ReportId(path.into_inner());
    let Some(Ok(rating)) = body.rating.map(Rating::from_value) else {
        return bad_request("Rating must be between 1 and 5");
    };
    let feedback = body.feedback.as_deref().unwrap_or_default();

    let conn = match lock_db(&state) {
        Ok(conn) => conn,
        Err(resp) => return resp,
    };
    match reports::submit_feedback(&conn, id, rating, feedback) {
        Ok(true) => HttpResponse::Ok().json(ApiSuccess { success: true }),
        Ok(false) => not_found(),
        Err(e) => {
            log::error!("Failed to store feedback for report {id}: {e}");
            internal_error("Failed to store feedback")
        }
    }
}

/// `PUT /api/reports/{id}/priority`
///
/// Sets the manually assigned priority. The computed `autoPriority` is
/// unaffected.
pub async fn update_priority(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<PriorityUpdateRequest>,
) -> HttpResponse {
    let id = ReportId(path.into_inner());
    let Some(Ok(priority)) = body.priority.as_deref().map(PriorityTier::from_str) else {
        return bad_request("Priority must be Low, Medium, or High");
    };

    let conn = match lock_db(&state) {
        Ok(conn) => conn,
        Err(resp) => return resp,
    };
    match reports::update_priority(&conn, id, priority) {
        Ok(true) => {
            log::info!("Report {id} priority -> {priority}");
            HttpResponse::Ok().json(ApiSuccess { success: true })
        }
        Ok(false) => not_found(),
        Err(e) => {
            log::error!("Failed to update priority of report {id}: {e}");
            internal_error("Failed to update priority")
        }
    }
}
