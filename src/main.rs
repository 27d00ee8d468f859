use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use suburb_lens::color::{self, ColorAssignmentCache};
use suburb_lens::config::AppConfig;
use suburb_lens::ranking;
use suburb_lens::series::{self, CategorySelection};
use suburb_lens::{apply_range, data, geometry, FeatureIndex, Rectangle};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalise readings, color them and rank them
    Normalize {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Select the features inside a drawn rectangle
    Select {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Overrides the configured rectangle: lat1,lng1,lat2,lng2
        #[arg(short, long, value_name = "RECT", allow_hyphen_values = true)]
        rect: Option<String>,
        /// Write the selection as a `NAME[]=id&...` query instead of an id map
        #[arg(short, long, value_name = "NAME")]
        query: Option<String>,
    },
    /// Category sums per date for the line chart
    Series {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Keep the strongest correlations
    Correlations {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[derive(Serialize)]
struct SeriesPoint {
    date: String,
    value: f64,
}

#[derive(Serialize)]
struct ColoredReading {
    rank: usize,
    id: i64,
    name: String,
    reading: Option<f64>,
    #[serde(rename = "readingNormalised")]
    reading_normalised: Option<f64>,
    color: String,
    #[serde(rename = "seriesColor")]
    series_color: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Normalize { config } => {
            let app_config = AppConfig::load_from_file(config)?;
            let path = app_config
                .input
                .readings
                .as_ref()
                .ok_or_else(|| anyhow!("[input] readings is not configured"))?;

            let readings = data::load_readings(path)?;
            let normalised = apply_range(readings);

            let mut palette = match app_config.palette.seed {
                Some(seed) => ColorAssignmentCache::with_seed(seed),
                None => ColorAssignmentCache::new(),
            };

            let rows: Vec<ColoredReading> = ranking::rank_by(normalised, |row| row.reading_normalised)
                .into_iter()
                .map(|(rank, row)| ColoredReading {
                    rank,
                    id: row.entity.id,
                    color: color::to_hex(color::gradient(row.reading_normalised)),
                    series_color: color::to_hex(palette.get(row.entity.id).border),
                    name: row.entity.name,
                    reading: row.entity.reading,
                    reading_normalised: row.reading_normalised,
                })
                .collect();

            tracing::info!(count = rows.len(), "normalised readings");
            write_output(&app_config, &rows)?;
        }
        Commands::Select { config, rect, query } => {
            let app_config = AppConfig::load_from_file(config)?;
            let path = app_config
                .input
                .features
                .as_ref()
                .ok_or_else(|| anyhow!("[input] features is not configured"))?;

            let rectangle = match rect {
                Some(raw) => Some(
                    Rectangle::parse(raw)
                        .ok_or_else(|| anyhow!("Invalid rectangle '{}', expected lat1,lng1,lat2,lng2", raw))?,
                ),
                None => app_config.selection.rectangle,
            };
            if rectangle.is_none() {
                tracing::info!("No rectangle drawn, selection is empty");
            }

            let features = data::load_features(path, &app_config.input.id_property)?;
            let selected = if app_config.selection.use_index {
                let index = FeatureIndex::build(features)?;
                if index.is_empty() {
                    tracing::warn!("Feature layer is empty");
                }
                tracing::info!(features = index.len(), kind = ?index.kind(), "indexed feature layer");
                index.select(rectangle.as_ref())
            } else {
                geometry::select(rectangle.as_ref(), &features)?
            };

            tracing::info!(selected = selected.len(), "selection complete");
            match query {
                Some(name) => {
                    let ids: Vec<String> = selected.iter().map(|id| id.to_string()).collect();
                    write_output(&app_config, &series::fetch_array(name, &ids))?;
                }
                None => write_output(&app_config, &selected)?,
            }
        }
        Commands::Series { config } => {
            let app_config = AppConfig::load_from_file(config)?;
            let path = app_config
                .input
                .category_sums
                .as_ref()
                .ok_or_else(|| anyhow!("[input] category_sums is not configured"))?;

            let sums = data::load_category_sums(path)?;
            let labels = series::labels_for(&sums, app_config.series.from, app_config.series.to);
            let selection = app_config
                .series
                .category
                .as_deref()
                .map(CategorySelection::from_name);
            let values = series::category_values(&sums, selection.as_ref(), &labels);

            let points: Vec<SeriesPoint> = labels
                .into_iter()
                .zip(values)
                .map(|(date, value)| SeriesPoint { date, value })
                .collect();
            tracing::info!(points = points.len(), "built category series");
            write_output(&app_config, &points)?;
        }
        Commands::Correlations { config } => {
            let app_config = AppConfig::load_from_file(config)?;
            let path = app_config
                .input
                .correlations
                .as_ref()
                .ok_or_else(|| anyhow!("[input] correlations is not configured"))?;

            let results = data::load_correlations(path)?;
            let top = ranking::top_correlations(results, app_config.analysis.top_correlations);
            write_output(&app_config, &top)?;
        }
    }

    Ok(())
}

fn write_output<T: Serialize>(config: &AppConfig, value: &T) -> Result<()> {
    let json = if config.output.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    match &config.output.path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).context("Failed to create output directory")?;
            }
            fs::write(path, json).with_context(|| format!("Failed to write output: {:?}", path))?;
            tracing::info!("wrote {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
