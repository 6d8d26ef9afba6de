use std::path::PathBuf;

/// Errors related to locating and loading the coordinator configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No config file at {path}")]
    FileNotFound { path: PathBuf },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Config at {path} has no [{symbol}] table")]
    MissingSymbol { path: PathBuf, symbol: String },

    #[error("Invalid config at {path}: {message}")]
    Invalid { path: PathBuf, message: String },

    #[error("Coordinator configuration not found; tried: {}", .attempts.join("; "))]
    NotFound { attempts: Vec<String> },
}

/// Errors produced while picking a specialist for a query.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("No specialist matches the query and no default specialist is configured")]
    NoSpecialist,
}

/// Errors produced while assembling a specialist request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Routing decision payload is missing required field `{0}`")]
    MissingField(String),
}

/// Errors produced while normalizing a specialist reply.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Unsupported specialist result shape: {shape}")]
    UnsupportedShape { shape: &'static str },
}

/// Errors related to invoking a specialist.
#[derive(Debug, thiserror::Error)]
pub enum SpecialistError {
    #[error("Unknown specialist '{0}'")]
    Unknown(String),

    #[error("Failed to spawn specialist '{name}': {message}")]
    SpawnFailed { name: String, message: String },

    #[error("Specialist '{name}' failed: {message}")]
    Failed { name: String, message: String },

    #[error("Specialist '{name}' timed out after {timeout_secs}s")]
    TimedOut { name: String, timeout_secs: u64 },

    #[error("Specialist '{name}' call was cancelled")]
    Cancelled { name: String },

    #[error("Transport error talking to specialist '{name}': {message}")]
    Transport { name: String, message: String },
}

/// A per-request failure, tagged with the stage it happened in.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Specialist(#[from] SpecialistError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}
