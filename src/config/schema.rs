use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::dispatch::types::ResponseStatus;
use crate::error::ConfigError;

/// The `[coordinator]` table of `coordinator_config.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct CoordinatorSection {
    pub name: Option<String>,
    pub default_specialist: Option<String>,
    pub specialist_timeout_secs: Option<u64>,
    pub max_concurrent_requests: Option<usize>,
    /// Status reported when a text reply cannot be parsed as a record.
    pub degraded_status: Option<ResponseStatus>,
    #[serde(default)]
    pub specialists: BTreeMap<String, SpecialistEntry>,
}

/// One `[coordinator.specialists.<name>]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct SpecialistEntry {
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub instructions: Option<String>,
    pub command: Option<String>,
    pub endpoint: Option<String>,
}

impl SpecialistEntry {
    /// Resolve the entry into a [`SpecialistConfig`]. Exactly one of
    /// `command` or `endpoint` must be set.
    pub fn into_specialist(self, name: &str, path: &Path) -> Result<SpecialistConfig, ConfigError> {
        let transport = match (self.command, self.endpoint) {
            (Some(command), None) => SpecialistTransport::Command(command),
            (None, Some(endpoint)) => SpecialistTransport::Http(endpoint),
            (Some(_), Some(_)) => {
                return Err(ConfigError::Invalid {
                    path: path.to_path_buf(),
                    message: format!("specialist '{name}' sets both `command` and `endpoint`"),
                });
            }
            (None, None) => {
                return Err(ConfigError::Invalid {
                    path: path.to_path_buf(),
                    message: format!("specialist '{name}' needs a `command` or an `endpoint`"),
                });
            }
        };

        Ok(SpecialistConfig {
            name: name.to_string(),
            description: self.description,
            keywords: self.keywords,
            instructions: self.instructions,
            transport,
        })
    }
}

/// How the coordinator reaches a specialist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialistTransport {
    /// Shell command run via `sh -c`; request on stdin, reply on stdout.
    Command(String),
    /// HTTP endpoint receiving a JSON POST.
    Http(String),
}

#[derive(Debug, Clone)]
pub struct SpecialistConfig {
    pub name: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub instructions: Option<String>,
    pub transport: SpecialistTransport,
}

/// Fully-resolved coordinator configuration. Immutable after load and shared
/// behind an `Arc` for the life of the process.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub name: String,
    /// File the configuration was loaded from.
    pub source: PathBuf,
    pub default_specialist: Option<String>,
    pub specialist_timeout_secs: u64,
    pub max_concurrent_requests: usize,
    pub degraded_status: ResponseStatus,
    pub specialists: BTreeMap<String, SpecialistConfig>,
}

impl CoordinatorConfig {
    pub fn specialist(&self, name: &str) -> Option<&SpecialistConfig> {
        self.specialists.get(name)
    }
}

/// Partial config used during merge. All fields are Option so that
/// missing fields don't override lower-priority values.
#[derive(Debug, Clone, Default)]
pub struct PartialConfig {
    pub name: Option<String>,
    pub default_specialist: Option<String>,
    pub specialist_timeout_secs: Option<u64>,
    pub max_concurrent_requests: Option<usize>,
    pub degraded_status: Option<ResponseStatus>,
}
