use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::compose::DEFAULT_MA_WINDOWS;
use crate::error::ConfigError;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_base_url() -> String {
    "https://query2.finance.yahoo.com".into()
}

fn default_user_agent() -> String {
    concat!("price-plotter/", env!("CARGO_PKG_VERSION")).into()
}

fn default_requests_per_second() -> u32 {
    2
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_ma_windows() -> Vec<usize> {
    DEFAULT_MA_WINDOWS.to_vec()
}

fn default_chart_width() -> u16 {
    120
}

fn default_chart_height() -> u16 {
    32
}

fn default_image_width() -> u32 {
    1200
}

fn default_image_height() -> u32 {
    600
}

pub const MIN_CHART_WIDTH: u16 = 40;
pub const MIN_CHART_HEIGHT: u16 = 10;
pub const MIN_IMAGE_WIDTH: u32 = 320;
pub const MIN_IMAGE_HEIGHT: u32 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub chart: ChartConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Market-data source settings.
#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            requests_per_second: default_requests_per_second(),
            timeout_secs: default_timeout_secs(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_ma_windows")]
    pub ma_windows: Vec<usize>,
    /// Terminal chart size in character cells.
    #[serde(default = "default_chart_width")]
    pub width: u16,
    #[serde(default = "default_chart_height")]
    pub height: u16,
    /// PNG export size in pixels.
    #[serde(default = "default_image_width")]
    pub image_width: u32,
    #[serde(default = "default_image_height")]
    pub image_height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            ma_windows: default_ma_windows(),
            width: default_chart_width(),
            height: default_chart_height(),
            image_width: default_image_width(),
            image_height: default_image_height(),
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

/// Load from `path` when given, otherwise fall back to built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<AppConfig, Report<ConfigError>> {
    match path {
        Some(path) => load(path),
        None => Ok(AppConfig::default()),
    }
}

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(config)?;
    validate_source(config)?;
    validate_chart(config)?;
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_general(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let format = config.general.log_format.as_str();
    if !VALID_LOG_FORMATS.contains(&format) {
        return Err(invalid(format!(
            "general.log_format \"{format}\" is not one of {VALID_LOG_FORMATS:?}"
        )));
    }
    Ok(())
}

fn validate_source(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let source = &config.source;
    if !(source.base_url.starts_with("http://") || source.base_url.starts_with("https://")) {
        return Err(invalid(format!(
            "source.base_url \"{}\" must be an http(s) URL",
            source.base_url
        )));
    }
    if source.requests_per_second == 0 {
        return Err(invalid("source.requests_per_second must be > 0".into()));
    }
    if source.timeout_secs == 0 {
        return Err(invalid("source.timeout_secs must be > 0".into()));
    }
    if source.max_concurrent_fetches == 0 {
        return Err(invalid("source.max_concurrent_fetches must be > 0".into()));
    }
    Ok(())
}

fn validate_chart(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let chart = &config.chart;
    if chart.ma_windows.is_empty() {
        return Err(invalid("chart.ma_windows must not be empty".into()));
    }
    if chart.ma_windows.contains(&0) {
        return Err(invalid("chart.ma_windows entries must be > 0".into()));
    }
    if chart.width < MIN_CHART_WIDTH || chart.height < MIN_CHART_HEIGHT {
        return Err(invalid(format!(
            "chart size {}x{} is below the {MIN_CHART_WIDTH}x{MIN_CHART_HEIGHT} minimum",
            chart.width, chart.height
        )));
    }
    if chart.image_width < MIN_IMAGE_WIDTH || chart.image_height < MIN_IMAGE_HEIGHT {
        return Err(invalid(format!(
            "chart image size {}x{} is below the {MIN_IMAGE_WIDTH}x{MIN_IMAGE_HEIGHT} minimum",
            chart.image_width, chart.image_height
        )));
    }
    Ok(())
}
