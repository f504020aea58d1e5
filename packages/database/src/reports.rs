//! The `reports` table.
//!
//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` text in local time so the
//! day filter is a plain prefix comparison. Status and priority are stored
//! by their display names (`"In Progress"`, `"High"`, ...).

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDateTime;
use duckdb::Connection;
use sahaayak_database_models::{NewReport, ReportQuery, ReportSort};
use sahaayak_report_models::{
    DEFAULT_CATEGORY, Location, PriorityTier, Rating, Report, ReportId, ReportStatus,
};

use crate::DbError;

/// Storage format of `created_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_COLUMNS: &str = "SELECT id, name, description, category, photo, voice, \
     latitude, longitude, address, status, priority, rating, feedback, created_at \
     FROM reports";

/// Opens (or creates) the reports `DuckDB` and ensures the schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent() {
        crate::paths::ensure_dir(parent)?;
    }

    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Opens the reports DB at the configured path (see
/// [`crate::paths::reports_db_path_from_env`]).
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_default() -> Result<Connection, DbError> {
    open(&crate::paths::reports_db_path_from_env())
}

/// Opens a throwaway in-memory store with the schema applied.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_in_memory() -> Result<Connection, DbError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE SEQUENCE IF NOT EXISTS reports_id_seq START 1;

        CREATE TABLE IF NOT EXISTS reports (
            id BIGINT PRIMARY KEY DEFAULT nextval('reports_id_seq'),
            name TEXT,
            description TEXT,
            category TEXT NOT NULL DEFAULT 'Other',
            photo TEXT,
            voice TEXT,
            latitude DOUBLE,
            longitude DOUBLE,
            address TEXT,
            status TEXT NOT NULL DEFAULT 'Pending',
            priority TEXT NOT NULL DEFAULT 'Medium',
            rating INTEGER,
            feedback TEXT,
            created_at TEXT NOT NULL
        );",
    )?;

    Ok(())
}

/// Inserts a new report filed at `created_at` and returns it as stored.
///
/// New reports start `Pending` with a manual priority of `Medium`.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub fn insert_report(
    conn: &Connection,
    report: &NewReport,
    created_at: NaiveDateTime,
) -> Result<Report, DbError> {
    let category = report
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CATEGORY)
        .to_string();
    let created_at_text = created_at.format(TIMESTAMP_FORMAT).to_string();

    let id: i64 = conn.query_row(
        "INSERT INTO reports
            (name, description, category, photo, voice, latitude, longitude, address, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING id",
        duckdb::params![
            report.name.as_deref(),
            report.description.as_deref(),
            category.as_str(),
            report.photo.as_deref(),
            report.voice.as_deref(),
            report.location.latitude(),
            report.location.longitude(),
            report.address.as_deref(),
            created_at_text.as_str(),
        ],
        |row| row.get(0),
    )?;

    log::info!("Stored report {id} ({category})");

    Ok(Report {
        id: ReportId(id),
        name: report.name.clone(),
        description: report.description.clone(),
        category,
        photo: report.photo.clone(),
        voice: report.voice.clone(),
        location: report.location,
        address: report.address.clone(),
        status: ReportStatus::Pending,
        priority: PriorityTier::Medium,
        rating: None,
        feedback: None,
        // Round-trip through the storage format so callers see what a
        // later read would return.
        created_at: parse_timestamp(&created_at_text)?,
    })
}

/// Fetches a single report by id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a stored value is malformed.
pub fn get_report(conn: &Connection, id: ReportId) -> Result<Option<Report>, DbError> {
    let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?"))?;
    stmt.raw_bind_parameter(1, id.value())?;
    stmt.raw_execute()?;

    let mut rows = stmt.raw_query();
    match rows.next()? {
        Some(row) => Ok(Some(row_to_report(row)?)),
        None => Ok(None),
    }
}

/// Lists reports matching `query`, ordered by id.
///
/// This is the snapshot the priority classifier runs over, so the filters
/// here also define the comparison set for clustering.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a stored value is malformed.
pub fn query_reports(conn: &Connection, query: &ReportQuery) -> Result<Vec<Report>, DbError> {
    let mut sql = format!("{SELECT_COLUMNS} WHERE 1=1");
    let mut params: Vec<String> = Vec::new();

    if let Some(name) = &query.name {
        sql.push_str(" AND name = ?");
        params.push(name.clone());
    }
    if let Some(status) = query.status {
        sql.push_str(" AND status = ?");
        params.push(status.as_ref().to_string());
    }
    if let Some(category) = &query.category {
        sql.push_str(" AND category = ?");
        params.push(category.clone());
    }
    if let Some(date) = query.date {
        sql.push_str(" AND substr(created_at, 1, 10) = ?");
        params.push(date.format("%Y-%m-%d").to_string());
    }

    let order = match query.sort {
        ReportSort::Newest => "DESC",
        ReportSort::Oldest => "ASC",
    };
    sql.push_str(" ORDER BY id ");
    sql.push_str(order);

    let mut stmt = conn.prepare(&sql)?;
    for (i, value) in params.iter().enumerate() {
        stmt.raw_bind_parameter(i + 1, value)?;
    }
    stmt.raw_execute()?;

    let mut reports = Vec::new();
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        reports.push(row_to_report(row)?);
    }

    log::debug!("Loaded {} reports for {query:?}", reports.len());

    Ok(reports)
}

/// Sets the status of a report. Returns `false` if no such report exists.
///
/// # Errors
///
/// Returns [`DbError`] if the update fails.
pub fn update_status(
    conn: &Connection,
    id: ReportId,
    status: ReportStatus,
) -> Result<bool, DbError> {
    let changed = conn.execute(
        "UPDATE reports SET status = ? WHERE id = ?",
        duckdb::params![status.as_ref(), id.value()],
    )?;
    Ok(changed > 0)
}

/// Sets the manually assigned priority of a report. Returns `false` if no
/// such report exists.
///
/// # Errors
///
/// Returns [`DbError`] if the update fails.
pub fn update_priority(
    conn: &Connection,
    id: ReportId,
    priority: PriorityTier,
) -> Result<bool, DbError> {
    let changed = conn.execute(
        "UPDATE reports SET priority = ? WHERE id = ?",
        duckdb::params![priority.as_ref(), id.value()],
    )?;
    Ok(changed > 0)
}

/// Records a citizen's rating and feedback. Returns `false` if no such
/// report exists.
///
/// # Errors
///
/// Returns [`DbError`] if the update fails.
pub fn submit_feedback(
    conn: &Connection,
    id: ReportId,
    rating: Rating,
    feedback: &str,
) -> Result<bool, DbError> {
    let changed = conn.execute(
        "UPDATE reports SET rating = ?, feedback = ? WHERE id = ?",
        duckdb::params![i32::from(rating.value()), feedback, id.value()],
    )?;
    Ok(changed > 0)
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|e| DbError::Conversion {
        message: format!("Invalid created_at {value:?}: {e}"),
    })
}

fn parse_column<T: FromStr>(column: &str, value: &str) -> Result<T, DbError> {
    value.parse().map_err(|_| DbError::Conversion {
        message: format!("Invalid {column} {value:?}"),
    })
}

fn row_to_report(row: &duckdb::Row<'_>) -> Result<Report, DbError> {
    let id: i64 = row.get(0)?;
    let latitude: Option<f64> = row.get(6)?;
    let longitude: Option<f64> = row.get(7)?;
    let status: String = row.get(9)?;
    let priority: String = row.get(10)?;
    let rating: Option<i32> = row.get(11)?;
    let created_at: String = row.get(13)?;

    let rating = rating
        .map(|v| Rating::from_value(i64::from(v)))
        .transpose()
        .map_err(|e| DbError::Conversion {
            message: format!("Report {id}: {e}"),
        })?;

    Ok(Report {
        id: ReportId(id),
        name: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        photo: row.get(4)?,
        voice: row.get(5)?,
        location: Location::from_parts(latitude, longitude),
        address: row.get(8)?,
        status: parse_column("status", &status)?,
        priority: parse_column("priority", &priority)?,
        rating,
        feedback: row.get(12)?,
        created_at: parse_timestamp(&created_at)?,
    })
}
