use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("dataset file not found: {path}")]
    FileNotFound {
        path: String,
    },
    #[error("can not read dataset '{path}': {reason}")]
    Read {
        path: String,
        reason: String,
    },
    #[error("dataset is empty")]
    Empty,
    #[error("dataset has no header row")]
    MissingHeader,
    #[error("dataset is not CSV text: {reason}")]
    NotCsv {
        reason: String,
    },
    #[error("csv parse failed at line {line}: {reason}")]
    Parse {
        line: u64,
        reason: String,
    },
    #[error("dataset has {rows} records, max supported {max}")]
    TooManyRecords {
        rows: usize,
        max: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("invalid amount range: min {min}, max {max}")]
    InvalidAmountRange {
        min: f64,
        max: f64,
    },
    #[error("activity window must cover at least one day")]
    EmptyActivityWindow,
    #[error("unknown filter field: '{name}'")]
    UnknownField {
        name: String,
    },
}

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("narrative service is not configured: {reason}")]
    NotConfigured {
        reason: String,
    },
    #[error("narrative request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("narrative service returned status {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },
    #[error("narrative response is malformed: {reason}")]
    Malformed {
        reason: String,
    },
    #[error("narrative response contains no text")]
    EmptyResponse,
    #[error("can not serialize prompt data: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue {
        key: String,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("can not serialize records: {0}")]
    Json(#[from] serde_json::Error),
    #[error("can not write export file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum GlobalError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Narrative(#[from] NarrativeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Export(#[from] ExportError),
}
