use crate::types::Rectangle;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub palette: PaletteConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub series: SeriesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub readings: Option<PathBuf>, // JSON array or CSV (id,name,reading)
    pub features: Option<PathBuf>, // GeoJSON FeatureCollection
    pub correlations: Option<PathBuf>,
    pub category_sums: Option<PathBuf>, // {"yyyy-mm-dd": {"category": sum}}
    #[serde(default = "default_id_property")]
    pub id_property: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SelectionConfig {
    /// `[[lat, lng], [lat, lng]]`
    pub rectangle: Option<Rectangle>,
    #[serde(default)]
    pub use_index: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    pub path: Option<PathBuf>, // stdout when unset
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PaletteConfig {
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default = "default_top_correlations")]
    pub top_correlations: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            top_correlations: default_top_correlations(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeriesConfig {
    /// `ALL` or a single category name; no values are produced when unset.
    pub category: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

fn default_id_property() -> String {
    "id".to_string()
}

fn default_top_correlations() -> usize {
    5
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let config = AppConfig::from_toml(
            r#"
            [input]
            readings = "data/emissions.csv"
            features = "data/suburbs.geojson"
            id_property = "suburb_id"

            [selection]
            rectangle = [[-37.80, 144.90], [-37.85, 144.98]]
            use_index = true

            [output]
            path = "out/selection.json"
            pretty = true

            [palette]
            seed = 7

            [analysis]
            top_correlations = 3

            [series]
            category = "ALL"
            from = "2022-01-01"
            to = "2022-01-31"
            "#,
        )
        .unwrap();

        assert_eq!(config.input.id_property, "suburb_id");
        assert_eq!(
            config.selection.rectangle,
            Some(Rectangle::new([-37.80, 144.90], [-37.85, 144.98]))
        );
        assert!(config.selection.use_index);
        assert_eq!(config.palette.seed, Some(7));
        assert_eq!(config.analysis.top_correlations, 3);
        assert_eq!(config.series.category.as_deref(), Some("ALL"));
        assert_eq!(config.series.from, NaiveDate::from_ymd_opt(2022, 1, 1));
        assert_eq!(config.series.to, NaiveDate::from_ymd_opt(2022, 1, 31));
    }

    #[test]
    fn optional_sections_default() {
        let config = AppConfig::from_toml("[input]\nreadings = \"r.json\"\n").unwrap();
        assert_eq!(config.input.id_property, "id");
        assert!(config.selection.rectangle.is_none());
        assert!(config.output.path.is_none());
        assert_eq!(config.analysis.top_correlations, 5);
        assert!(config.series.category.is_none());
    }

    #[test]
    fn missing_input_section_is_an_error() {
        assert!(AppConfig::from_toml("[output]\npretty = true\n").is_err());
    }
}
