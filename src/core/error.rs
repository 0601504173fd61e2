//! Error types for regionflow.

use thiserror::Error;

/// Result type alias for regionflow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in regionflow operations.
#[derive(Error, Debug)]
pub enum Error {
    // Construction errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{}unsupported provider {provider:?}", module_prefix(.module))]
    UnsupportedProvider {
        provider: String,
        module: Option<String>,
    },

    // Region errors
    #[error("region {0:?} not configured")]
    UnknownRegion(String),

    #[error("weight {weight} for region {region:?} out of range [0, 100]")]
    WeightOutOfRange { region: String, weight: i64 },

    #[error("invalid failover: {0}")]
    InvalidFailover(String),

    #[error("no healthy region available")]
    NoHealthyRegion,

    // Backend errors
    #[error("backend unavailable during {operation}{}: {message}", region_suffix(.region))]
    BackendUnavailable {
        operation: String,
        region: Option<String>,
        message: String,
    },

    #[error("{module}: {operation}{} failed: {source}", region_suffix(.region))]
    Operation {
        module: String,
        operation: &'static str,
        region: Option<String>,
        #[source]
        source: Box<Error>,
    },

    // Service registry errors
    #[error("service {0:?} not found in registry")]
    ServiceNotFound(String),

    #[error("service {name:?} is not a {expected}")]
    ServiceTypeMismatch { name: String, expected: &'static str },

    #[error("service {0:?} is already registered")]
    DuplicateService(String),

    // Pipeline errors
    #[error("step {step:?}: {message}")]
    StepConfig { step: String, message: String },

    #[error("step {step:?}: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<Error>,
    },

    // Serialization errors
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn region_suffix(region: &Option<String>) -> String {
    match region {
        Some(r) => format!(" of region {:?}", r),
        None => String::new(),
    }
}

fn module_prefix(module: &Option<String>) -> String {
    match module {
        Some(m) => format!("platform.region {:?}: ", m),
        None => String::new(),
    }
}

impl Error {
    /// Whether this error is fatal at construction time.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::UnsupportedProvider { .. })
    }

    /// Unwrap context layers down to the originating error.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Operation { source, .. } | Error::StepFailed { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
