mod compose;
mod config;
mod error;
mod export;
mod indicator;
mod model;
mod normalize;
mod render;
mod retrieval;
mod source;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use compose::Composer;
use config::AppConfig;
use export::{ChartExporter, FileExporter};
use model::DATE_FORMAT;
use normalize::normalize;
use render::bitmap::BitmapRenderer;
use render::terminal::TerminalRenderer;
use render::{Chart, ChartRenderer};
use source::MarketDataSource;
use source::yahoo::YahooSource;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("invalid input")]
    Input,
    #[display("market data source error")]
    Source,
    #[display("failed to build chart dataset")]
    Pipeline,
    #[display("failed to render chart")]
    Render,
}

#[derive(Parser)]
#[command(
    name = "price-plotter",
    about = "Plot historical daily prices with optional 20/50-day moving averages"
)]
struct Cli {
    /// Comma-separated ticker symbols
    #[arg(short, long, default_value = "AAPL, MSFT")]
    symbols: String,

    /// Start date (YYYY-MM-DD)
    #[arg(long, default_value = "2023-01-01")]
    start: String,

    /// End date (YYYY-MM-DD), exclusive; defaults to today
    #[arg(long)]
    end: Option<String>,

    /// Overlay moving averages
    #[arg(long)]
    ma: bool,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Save the chart to this path (.png, .txt or .json)
    #[arg(long)]
    save: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config =
        config::load_or_default(cli.config.as_deref()).change_context(AppError::Config)?;

    init_tracing(&config);

    let end = cli
        .end
        .unwrap_or_else(|| Local::now().format(DATE_FORMAT).to_string());
    let input = normalize(&cli.symbols, &cli.start, &end).change_context(AppError::Input)?;

    let source: Arc<dyn MarketDataSource> =
        Arc::new(YahooSource::new(&config.source).change_context(AppError::Source)?);
    let composer = Composer::new(source, &config.chart.ma_windows)
        .change_context(AppError::Config)?
        .with_max_concurrent(config.source.max_concurrent_fetches);

    info!(
        symbols = input.symbols.len(),
        range = %input.range,
        moving_averages = cli.ma,
        "fetching price history"
    );

    let dataset = composer
        .compose(&input.symbols, &input.range, cli.ma)
        .await
        .change_context(AppError::Pipeline)
        .attach_with(|| format!("symbols: {}, range: {}", cli.symbols, input.range))?;

    info!(lines = ?dataset.labels(), "dataset ready");
    for warning in dataset.warnings() {
        warn!(symbol = %warning.symbol, reason = %warning.reason, "no data for symbol");
    }

    let chart = Chart::new(&input.symbols, dataset);
    let renderer = TerminalRenderer::new(config.chart.width, config.chart.height);
    let rendered = renderer.render(&chart).change_context(AppError::Render)?;
    println!("{}", rendered.to_text());

    // Export failure is reported but does not invalidate the chart
    if let Some(path) = cli.save {
        let exporter = FileExporter::new(BitmapRenderer::new(
            config.chart.image_width,
            config.chart.image_height,
        ));
        match exporter.export(&chart, &rendered, &path) {
            Ok(()) => info!(path = %path.display(), "chart saved"),
            Err(e) => error!(error = ?e, "chart export failed"),
        }
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_the_input_form() {
        let cli = Cli::parse_from(["price-plotter"]);
        assert_eq!(cli.symbols, "AAPL, MSFT");
        assert_eq!(cli.start, "2023-01-01");
        assert!(cli.end.is_none());
        assert!(!cli.ma);
        assert!(cli.save.is_none());
    }

    #[test]
    fn cli_accepts_all_inputs() {
        let cli = Cli::parse_from([
            "price-plotter",
            "--symbols",
            "tsla,nvda",
            "--start",
            "2022-01-01",
            "--end",
            "2022-12-31",
            "--ma",
            "--save",
            "out/chart.json",
        ]);
        assert_eq!(cli.symbols, "tsla,nvda");
        assert_eq!(cli.end.as_deref(), Some("2022-12-31"));
        assert!(cli.ma);
        assert_eq!(cli.save, Some(PathBuf::from("out/chart.json")));
    }
}
