#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for radius crime searches.
//!
//! Each search runs exactly the cycle a map click would: debounce gate,
//! radius query, fetch, incident grouping, marker generation. Results are
//! printed as a summary or as a `GeoJSON` feature collection.

mod interactive;
mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use crime_radius_geo::distance_feet;
use crime_radius_geo_models::Coordinate;
use crime_radius_map::{ClickOutcome, GeoJsonRenderer, MapConfig, Session};
use crime_radius_source::registry::{all_datasets, dataset_by_id};
use crime_radius_source::socrata::SocrataClient;

#[derive(Parser)]
#[command(name = "crime_radius", about = "Recent crime reports around a point")]
struct Cli {
    /// Path to a TOML config file (overrides `CRIME_RADIUS_CONFIG`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search around a point and print the resulting markers
    Query {
        #[command(flatten)]
        search: SearchArgs,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,
    },
    /// Print the encoded request URL for a search without sending it
    Url {
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Great-circle distance in feet between two points
    Distance {
        #[arg(allow_negative_numbers = true)]
        lat1: f64,
        #[arg(allow_negative_numbers = true)]
        lng1: f64,
        #[arg(allow_negative_numbers = true)]
        lat2: f64,
        #[arg(allow_negative_numbers = true)]
        lng2: f64,
    },
    /// List the built-in datasets
    Datasets,
    /// Enter coordinates repeatedly, as if clicking a map
    Interactive,
}

#[derive(Args)]
struct SearchArgs {
    /// Latitude of the search center
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,
    /// Longitude of the search center
    #[arg(long, allow_negative_numbers = true)]
    lng: f64,
    /// Search radius in feet
    #[arg(long)]
    radius: Option<f64>,
    /// How many days back to search
    #[arg(long)]
    lookback_days: Option<u32>,
    /// Dataset id (see `datasets`)
    #[arg(long)]
    dataset: Option<String>,
    /// Maximum number of rows to request
    #[arg(long)]
    limit: Option<u64>,
    /// Keep rows whose location was redacted by the source
    #[arg(long)]
    include_redacted: bool,
}

impl SearchArgs {
    fn apply(&self, config: &mut MapConfig) {
        if let Some(radius) = self.radius {
            config.radius_feet = radius;
        }
        if let Some(days) = self.lookback_days {
            config.lookback_days = days;
        }
        if let Some(dataset) = &self.dataset {
            config.dataset.clone_from(dataset);
        }
        if self.limit.is_some() {
            config.max_results = self.limit;
        }
        if self.include_redacted {
            config.exclude_redacted = false;
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One line per marker
    Summary,
    /// `GeoJSON` feature collection of markers and the search window
    Geojson,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let mut config = MapConfig::load(cli.config.as_deref())?;

    let Some(command) = cli.command else {
        return interactive::run(&config).await;
    };

    match command {
        Commands::Query { search, format } => {
            search.apply(&mut config);
            let center = Coordinate::new(search.lat, search.lng)?;
            let mut session = Session::new(&config, SocrataClient::new(), GeoJsonRenderer::new())?;

            match session.handle_click(center).await? {
                ClickOutcome::Failed { error, .. } => return Err(error.into()),
                ClickOutcome::Rendered { .. } => match format {
                    OutputFormat::Summary => output::print_summary(
                        session.current_markers(),
                        session.current_window(),
                    ),
                    OutputFormat::Geojson => {
                        let collection = session.renderer().feature_collection();
                        println!("{}", serde_json::to_string_pretty(&collection)?);
                    }
                },
                ClickOutcome::Ignored | ClickOutcome::Stale { .. } => {
                    log::warn!("Search was not applied");
                }
            }
        }
        Commands::Url { search } => {
            search.apply(&mut config);
            config.validate()?;
            let center = Coordinate::new(search.lat, search.lng)?;
            let dataset = dataset_by_id(&config.dataset)?;
            let now = chrono::Local::now().naive_local();
            let query = config.radius_query().build(&dataset, center, now)?;
            println!("{}", query.url);
        }
        Commands::Distance {
            lat1,
            lng1,
            lat2,
            lng2,
        } => {
            let a = Coordinate::new(lat1, lng1)?;
            let b = Coordinate::new(lat2, lng2)?;
            println!("{:.1} ft", distance_feet(a, b));
        }
        Commands::Datasets => {
            for dataset in all_datasets() {
                output::print_dataset(&dataset);
            }
        }
        Commands::Interactive => interactive::run(&config).await?,
    }

    Ok(())
}
