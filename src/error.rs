use std::path::PathBuf;
use thiserror::Error;

/// Invalid or missing search parameters. Always fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid electrode name '{0}' (expected a letter followed by letters or digits)")]
    InvalidElectrode(String),

    #[error("Electrode pool '{0}' is empty")]
    EmptyPool(String),

    #[error("Total current must be positive (got {0})")]
    NonPositiveCurrent(f64),

    #[error("Current step must satisfy 0 < step <= total current (step {step}, total {total})")]
    StepOutOfRange { step: f64, total: f64 },

    #[error("Channel limit must satisfy 0 < limit <= total current (limit {limit}, total {total})")]
    LimitOutOfRange { limit: f64, total: f64 },

    #[error("Missing required parameter: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("ROI file error ({path}): {reason}")]
    RoiFile { path: PathBuf, reason: String },

    #[error("No valid current ratios for total {total}, step {step}, limit {limit:?}")]
    NoCurrentRatios {
        total: f64,
        step: f64,
        limit: Option<f64>,
    },

    #[error("Search has no candidates: {0}")]
    NoCandidates(String),

    #[error("Configuration file error: {0}")]
    File(String),
}

/// Leadfield container missing or structurally invalid. Always fatal.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Leadfield container not found: {0}")]
    NotFound(PathBuf),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a leadfield container (bad magic {0:?})")]
    InvalidMagic([u8; 4]),

    #[error("Unsupported container version {found} (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Payload checksum mismatch")]
    ChecksumMismatch,

    #[error("Payload decode error: {0}")]
    Decode(String),

    #[error("Malformed leadfield: {0}")]
    Shape(String),
}

/// Failure while scoring one candidate. Recovered by the driver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Electrode '{0}' is not present in the leadfield")]
    UnknownElectrode(String),

    #[error("Element index {index} out of range ({n_elements} elements)")]
    ElementOutOfRange { index: usize, n_elements: usize },

    #[error("Region weights sum to zero")]
    DegenerateWeights,

    #[error("Non-finite envelope value at element {0}")]
    NonFinite(usize),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Plot Error: {0}")]
    Plot(String),
}

#[derive(Error, Debug)]
pub enum TiError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),

    #[error("Leadfield Load Error: {0}")]
    Load(#[from] LoadError),

    #[error("Evaluation Error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Report Error: {0}")]
    Report(#[from] ReportError),
}

pub type TiResult<T> = Result<T, TiError>;
