#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for civic report triage.
//!
//! ```text
//! sahaayak_server [--bind 0.0.0.0] [--port 8080] [--db data/reports.duckdb]
//! ```
//!
//! Flags override the `BIND_ADDR`, `PORT` and `SAHAAYAK_DB_PATH`
//! environment variables.

use std::path::PathBuf;

use clap::Parser;
use sahaayak_server::{ServerConfig, run_server};

#[derive(Parser)]
#[command(name = "sahaayak_server", about = "Serve the civic report triage API")]
struct Cli {
    /// Interface to bind (default: `BIND_ADDR` or 127.0.0.1)
    #[arg(long)]
    bind: Option<String>,
    /// Port to listen on (default: `PORT` or 8080)
    #[arg(long)]
    port: Option<u16>,
    /// Reports `DuckDB` file (default: `SAHAAYAK_DB_PATH` or data/reports.duckdb)
    #[arg(long)]
    db: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let cli = Cli::parse();
    let mut config = ServerConfig::from_env();
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    run_server(config).await
}
