#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for civic report triage.
//!
//! Citizens submit geotagged reports; the authority dashboard lists them
//! with an advisory `autoPriority` computed by `sahaayak_priority` over the
//! currently filtered set, and updates status and manual priority. Reports
//! live in a single `DuckDB` file (see `sahaayak_database`).

mod handlers;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use sahaayak_database::{paths, reports};
use sahaayak_server_models::ApiError;

/// Shared application state.
pub struct AppState {
    /// Long-lived report store connection.
    /// `duckdb::Connection` is `Send` but not `Sync`, so a `Mutex` is needed.
    pub db: Arc<Mutex<duckdb::Connection>>,
}

impl AppState {
    /// Wraps an open report store connection.
    #[must_use]
    pub fn new(conn: duckdb::Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }
}

/// Where the server listens and which database it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind_addr: String,
    /// TCP port.
    pub port: u16,
    /// Path of the reports `DuckDB` file.
    pub db_path: PathBuf,
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT` and `SAHAAYAK_DB_PATH`, falling back to
    /// `127.0.0.1:8080` and `data/reports.duckdb`.
    #[must_use]
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        Self {
            bind_addr,
            port,
            db_path: paths::reports_db_path_from_env(),
        }
    }
}

/// Turns an extractor failure into an [`ApiError`] response.
fn extractor_error<E>(err: E, status: StatusCode, message: String) -> actix_web::Error
where
    E: std::fmt::Debug + std::fmt::Display + 'static,
{
    log::debug!("Rejected request: {err}");
    InternalError::from_response(err, HttpResponse::build(status).json(ApiError { error: message }))
        .into()
}

/// Registers the `/api` routes.
///
/// Malformed bodies and query strings answer `400` and unparseable ids
/// answer `404`, all with an `{"error": ...}` body.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        extractor_error(err, StatusCode::BAD_REQUEST, message)
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        extractor_error(err, StatusCode::BAD_REQUEST, message)
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        extractor_error(err, StatusCode::NOT_FOUND, "Report not found".to_string())
    }))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/reports", web::get().to(handlers::list_reports))
            .route("/reports", web::post().to(handlers::create_report))
            .route("/my-reports", web::get().to(handlers::my_reports))
            .route("/reports/{id}/status", web::put().to(handlers::update_status))
            .route(
                "/reports/{id}/feedback",
                web::post().to(handlers::submit_feedback),
            )
            .route(
                "/reports/{id}/priority",
                web::put().to(handlers::update_priority),
            ),
    );
}

/// Starts the report API server.
///
/// Opens (or creates) the report store at `config.db_path` and serves the
/// API until the server is stopped. The caller provides the async runtime
/// (e.g. via `#[actix_web::main]`) and logger.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the report store cannot be opened,
/// the HTTP server fails to bind, or it encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    log::info!("Opening report store at {}", config.db_path.display());
    let conn = reports::open(&config.db_path).map_err(std::io::Error::other)?;

    let state = web::Data::new(AppState::new(conn));

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use chrono::NaiveDate;
    use sahaayak_database_models::NewReport;
    use sahaayak_report_models::{Location, PriorityTier, ReportId, ReportStatus};
    use serde_json::{Value, json};

    use super::*;

    fn located(lat: f64, lon: f64) -> Location {
        Location::from_parts(Some(lat), Some(lon))
    }

    fn seed(conn: &duckdb::Connection, name: &str, location: Location, day: u32) -> ReportId {
        let created_at = NaiveDate::from_ymd_opt(2025, 9, day)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        reports::insert_report(
            conn,
            &NewReport {
                name: Some(name.to_string()),
                description: Some("Pothole".to_string()),
                category: Some("Roads".to_string()),
                photo: None,
                voice: None,
                location,
                address: None,
            },
            created_at,
        )
        .unwrap()
        .id
    }

    /// Six reports on one corner (two of them resolved), plus one unlocated.
    fn cluster_state() -> (web::Data<AppState>, Vec<ReportId>) {
        let conn = reports::open_in_memory().unwrap();
        let mut ids = Vec::new();
        for i in 0..6 {
            ids.push(seed(&conn, &format!("citizen{i}"), located(28.6139, 77.2090), 1));
        }
        ids.push(seed(&conn, "nomad", Location::Unlocated, 2));
        reports::update_status(&conn, ids[0], ReportStatus::Resolved).unwrap();
        reports::update_status(&conn, ids[1], ReportStatus::Resolved).unwrap();
        (web::Data::new(AppState::new(conn)), ids)
    }

    fn auto_priority_of(body: &[Value], id: ReportId) -> Option<String> {
        body.iter()
            .find(|r| r["id"] == id.value())
            .and_then(|r| r["autoPriority"].as_str().map(ToString::to_string))
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let (state, _) = cluster_state();
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
    }

    #[actix_web::test]
    async fn lists_reports_with_auto_priority() {
        let (state, ids) = cluster_state();
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/reports").to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.len(), 7);
        // Newest first.
        assert_eq!(body[0]["id"], ids[6].value());
        for id in &ids[..6] {
            assert_eq!(auto_priority_of(&body, *id).as_deref(), Some("High"));
        }
        assert_eq!(auto_priority_of(&body, ids[6]).as_deref(), Some("Low"));
        // Persisted priority is untouched.
        assert!(body.iter().all(|r| r["priority"] == "Medium"));
    }

    #[actix_web::test]
    async fn auto_priority_follows_the_filtered_set() {
        let (state, ids) = cluster_state();
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri("/api/reports?status=Pending")
            .to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;

        // Four pending on the corner plus the unlocated one.
        assert_eq!(body.len(), 5);
        for id in &ids[2..6] {
            assert_eq!(auto_priority_of(&body, *id).as_deref(), Some("Medium"));
        }
    }

    #[actix_web::test]
    async fn priority_filter_applies_after_classification() {
        let (state, _) = cluster_state();
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri("/api/reports?priority=High")
            .to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.len(), 6);

        let req = test::TestRequest::get()
            .uri("/api/reports?status=Pending&priority=High")
            .to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(body.is_empty());
    }

    #[actix_web::test]
    async fn rejects_unknown_filters() {
        let (state, _) = cluster_state();
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        for uri in [
            "/api/reports?priority=Urgent",
            "/api/reports?status=Closed",
            "/api/reports?date=yesterday",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[actix_web::test]
    async fn filters_by_date() {
        let (state, ids) = cluster_state();
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri("/api/reports?date=2025-09-02")
            .to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["id"], ids[6].value());
    }

    #[actix_web::test]
    async fn creates_reports() {
        let (state, _) = cluster_state();
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(json!({
                "name": "Meera",
                "description": "Broken streetlight",
                "latitude": 12.9716,
                "longitude": 77.5946
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["category"], "Other");
        assert_eq!(body["status"], "Pending");
        assert_eq!(body["latitude"], 12.9716);

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(json!({ "name": "Meera", "latitude": 123.0, "longitude": 77.0 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["latitude"].is_null());
    }

    #[actix_web::test]
    async fn my_reports_by_name() {
        let (state, ids) = cluster_state();
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/my-reports").to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(body.is_empty());

        let req = test::TestRequest::get()
            .uri("/api/my-reports?name=citizen0")
            .to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["id"], ids[0].value());
        assert!(body[0].get("autoPriority").is_none());

        let req = test::TestRequest::get()
            .uri("/api/my-reports?name=citizen0&status=Pending")
            .to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(body.is_empty());
    }

    #[actix_web::test]
    async fn updates_status() {
        let (state, ids) = cluster_state();
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(configure),
        )
        .await;

        let uri = format!("/api/reports/{}/status", ids[3].value());
        let req = test::TestRequest::put()
            .uri(&uri)
            .set_json(json!({ "status": "In Progress" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);

        let stored = {
            let conn = state.db.lock().unwrap();
            reports::get_report(&conn, ids[3]).unwrap().unwrap()
        };
        assert_eq!(stored.status, ReportStatus::InProgress);

        let req = test::TestRequest::put()
            .uri(&uri)
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri("/api/reports/9999/status")
            .set_json(json!({ "status": "Resolved" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn validates_feedback_rating() {
        let (state, ids) = cluster_state();
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;
        let uri = format!("/api/reports/{}/feedback", ids[0].value());

        for bad in [json!({}), json!({ "rating": 0 }), json!({ "rating": 6 })] {
            let req = test::TestRequest::post()
                .uri(&uri)
                .set_json(bad)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }

        let req = test::TestRequest::post()
            .uri(&uri)
            .set_json(json!({ "rating": 5, "feedback": "Fixed in a day" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);

        let req = test::TestRequest::get()
            .uri("/api/my-reports?name=citizen0")
            .to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["rating"], 5);
        assert_eq!(body[0]["feedback"], "Fixed in a day");
    }

    #[actix_web::test]
    async fn manual_priority_is_independent_of_auto_priority() {
        let (state, ids) = cluster_state();
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let uri = format!("/api/reports/{}/priority", ids[6].value());
        let req = test::TestRequest::put()
            .uri(&uri)
            .set_json(json!({ "priority": "High" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);

        let req = test::TestRequest::get().uri("/api/reports").to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        let nomad = body.iter().find(|r| r["id"] == ids[6].value()).unwrap();
        assert_eq!(nomad["priority"], "High");
        assert_eq!(nomad["autoPriority"], PriorityTier::Low.to_string());

        let req = test::TestRequest::put()
            .uri(&uri)
            .set_json(json!({ "priority": "Critical" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn creates_reports_with_loose_coordinates() {
        let (state, _) = cluster_state();
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(json!({ "name": "Asha", "latitude": "28.6139", "longitude": "77.2090" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["latitude"], 28.6139);
        assert_eq!(body["longitude"], 77.209);

        for coords in [
            json!({ "name": "Asha", "latitude": "", "longitude": "" }),
            json!({ "name": "Asha", "latitude": "north", "longitude": "east" }),
            json!({ "name": "Asha", "latitude": "28.6", "longitude": {} }),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/reports")
                .set_json(&coords)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED, "{coords}");
            let body: Value = test::read_body_json(resp).await;
            assert!(body["latitude"].is_null(), "{coords}");
            assert!(body["longitude"].is_null(), "{coords}");
        }

        let req = test::TestRequest::get()
            .uri("/api/my-reports?name=Asha")
            .to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.len(), 4);
    }

    #[actix_web::test]
    async fn malformed_requests_get_json_errors() {
        let (state, ids) = cluster_state();
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;
        let status_uri = format!("/api/reports/{}/status", ids[0].value());

        let requests = [
            (
                test::TestRequest::put()
                    .uri(&status_uri)
                    .set_json(json!({ "status": 5 }))
                    .to_request(),
                StatusCode::BAD_REQUEST,
            ),
            (
                test::TestRequest::post()
                    .uri("/api/reports")
                    .insert_header(("content-type", "application/json"))
                    .set_payload("{not json")
                    .to_request(),
                StatusCode::BAD_REQUEST,
            ),
            (
                test::TestRequest::get()
                    .uri("/api/reports?status=Pending&status=Resolved")
                    .to_request(),
                StatusCode::BAD_REQUEST,
            ),
            (
                test::TestRequest::put()
                    .uri("/api/reports/abc/status")
                    .set_json(json!({ "status": "Resolved" }))
                    .to_request(),
                StatusCode::NOT_FOUND,
            ),
        ];

        for (req, expected) in requests {
            let uri = req.path().to_string();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected, "{uri}");
            let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
            assert!(body["error"].is_string(), "{uri}: {body}");
        }
    }

    #[actix_web::test]
    async fn my_reports_sort_order() {
        let (state, ids) = cluster_state();
        let later = {
            let conn = state.db.lock().unwrap();
            seed(&conn, "citizen0", located(12.9716, 77.5946), 3)
        };
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        for (query, expected) in [
            ("", vec![later, ids[0]]),
            ("&sort=newest", vec![later, ids[0]]),
            ("&sort=oldest", vec![ids[0], later]),
            ("&sort=sideways", vec![later, ids[0]]),
        ] {
            let req = test::TestRequest::get()
                .uri(&format!("/api/my-reports?name=citizen0{query}"))
                .to_request();
            let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
            let got: Vec<i64> = body.iter().filter_map(|r| r["id"].as_i64()).collect();
            let expected: Vec<i64> = expected.iter().map(|id| id.value()).collect();
            assert_eq!(got, expected, "{query}");
        }
    }

    #[actix_web::test]
    async fn large_listings_classify_through_the_index() {
        let conn = reports::open_in_memory().unwrap();
        // Corners about 1.1 km apart: five reports on each, six on the last.
        let corners = handlers::INDEX_THRESHOLD / 5 + 1;
        let mut high = Vec::new();
        for corner in 0..corners {
            #[allow(clippy::cast_precision_loss)]
            let lat = (corner as f64).mul_add(0.01, 10.0);
            let size = if corner + 1 == corners { 6 } else { 5 };
            for i in 0..size {
                let id = seed(&conn, &format!("c{corner}-{i}"), located(lat, 77.0), 1);
                if size == 6 {
                    high.push(id);
                }
            }
        }
        let total = (corners - 1) * 5 + 6;
        assert!(total >= handlers::INDEX_THRESHOLD);

        let state = web::Data::new(AppState::new(conn));
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/reports").to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.len(), total);
        for report in &body {
            let id = ReportId(report["id"].as_i64().unwrap());
            let expected = if high.contains(&id) { "High" } else { "Medium" };
            assert_eq!(report["autoPriority"], expected, "report {id}");
        }

        let req = test::TestRequest::get()
            .uri("/api/reports?priority=High")
            .to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.len(), 6);
    }
}
