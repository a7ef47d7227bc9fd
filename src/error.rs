use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum SourceError {
    #[display("failed to build HTTP client for {provider}")]
    Client { provider: String },
    #[display("request to {provider} failed")]
    Request { provider: String },
    #[display("{provider} returned HTTP {status}")]
    Status { provider: String, status: u16 },
    #[display("failed to parse response from {provider}")]
    ResponseParse { provider: String },
    #[display("{provider} reported an error: {message}")]
    Api { provider: String, message: String },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

/// Hard failures of the retrieval-and-aggregation pipeline.
///
/// Per-symbol problems never show up here; they are carried as warnings on
/// the returned dataset.
#[derive(Debug, Display, Error)]
pub enum PipelineError {
    #[display("no symbols given")]
    InvalidInput,
    #[display("no valid data for any symbol ({attempted} attempted)")]
    AggregateFailure { attempted: usize },
}

#[derive(Debug, Display, Error)]
pub enum RenderError {
    #[display("dataset has no points to draw")]
    EmptyDataset,
    #[display("chart area too small: {width}x{height}")]
    AreaTooSmall { width: u32, height: u32 },
    #[display("failed to load chart font")]
    Font,
    #[display("failed to draw chart image")]
    Draw,
}

#[derive(Debug, Display, Error)]
pub enum ExportError {
    #[display("unsupported export format: {extension}")]
    UnsupportedFormat { extension: String },
    #[display("failed to serialize chart")]
    Serialize,
    #[display("failed to render chart image")]
    Render,
    #[display("failed to write chart file")]
    Write,
}
