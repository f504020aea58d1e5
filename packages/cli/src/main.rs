#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Offline proximity priority classifier.
//!
//! ```text
//! sahaayak_cli classify reports.json [--index]
//! sahaayak_cli distance <lat1> <lon1> <lat2> <lon2>
//! ```
//!
//! `classify` prints one `id<TAB>tier` line per report, ordered by id.

mod export;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sahaayak_report_models::Coordinates;

#[derive(Parser)]
#[command(
    name = "sahaayak_cli",
    about = "Classify exported civic reports by proximity"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the priority tier of every report in a JSON export
    Classify {
        /// Path to a JSON array of reports
        file: PathBuf,
        /// Use the R-tree index instead of comparing every pair
        #[arg(long)]
        index: bool,
    },
    /// Print the haversine distance in meters between two points
    Distance {
        /// Latitude of the first point
        #[arg(allow_hyphen_values = true)]
        lat1: f64,
        /// Longitude of the first point
        #[arg(allow_hyphen_values = true)]
        lon1: f64,
        /// Latitude of the second point
        #[arg(allow_hyphen_values = true)]
        lat2: f64,
        /// Longitude of the second point
        #[arg(allow_hyphen_values = true)]
        lon2: f64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { file, index } => {
            let reports = export::load(&file)?;
            for (id, tier) in export::classify(&reports, index) {
                println!("{id}\t{tier}");
            }
        }
        Commands::Distance {
            lat1,
            lon1,
            lat2,
            lon2,
        } => {
            let a = Coordinates::new(lat1, lon1)?;
            let b = Coordinates::new(lat2, lon2)?;
            println!("{:.3}", sahaayak_priority::distance_between(a, b));
        }
    }

    Ok(())
}
