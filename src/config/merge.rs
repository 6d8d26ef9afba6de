use super::schema::{CoordinatorConfig, CoordinatorSection, PartialConfig, SpecialistConfig};
use crate::dispatch::types::ResponseStatus;
use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_NAME: &str = "concierge";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

impl PartialConfig {
    /// Merge self with a lower-priority fallback.
    /// Self's non-None values take precedence.
    pub fn with_fallback(self, fallback: PartialConfig) -> PartialConfig {
        PartialConfig {
            name: self.name.or(fallback.name),
            default_specialist: self.default_specialist.or(fallback.default_specialist),
            specialist_timeout_secs: self
                .specialist_timeout_secs
                .or(fallback.specialist_timeout_secs),
            max_concurrent_requests: self
                .max_concurrent_requests
                .or(fallback.max_concurrent_requests),
            degraded_status: self.degraded_status.or(fallback.degraded_status),
        }
    }

    /// Convert to CoordinatorConfig, filling any remaining gaps with defaults
    /// and validating the result against the specialist table.
    pub fn finalize(
        self,
        specialists: BTreeMap<String, SpecialistConfig>,
        source: PathBuf,
    ) -> Result<CoordinatorConfig, ConfigError> {
        let invalid = |message: String| ConfigError::Invalid {
            path: source.clone(),
            message,
        };

        if specialists.is_empty() {
            return Err(invalid("no specialists configured".to_string()));
        }
        if let Some(default) = &self.default_specialist {
            if !specialists.contains_key(default) {
                return Err(invalid(format!(
                    "default_specialist '{default}' is not a configured specialist"
                )));
            }
        }

        let specialist_timeout_secs = self.specialist_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if specialist_timeout_secs == 0 {
            return Err(invalid("specialist_timeout_secs must be at least 1".to_string()));
        }
        let max_concurrent_requests = self.max_concurrent_requests.unwrap_or(DEFAULT_MAX_CONCURRENT);
        if max_concurrent_requests == 0 {
            return Err(invalid("max_concurrent_requests must be at least 1".to_string()));
        }

        Ok(CoordinatorConfig {
            name: self.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
            source: source.clone(),
            default_specialist: self.default_specialist,
            specialist_timeout_secs,
            max_concurrent_requests,
            degraded_status: self.degraded_status.unwrap_or(ResponseStatus::Ok),
            specialists,
        })
    }
}

impl CoordinatorSection {
    /// Split the file section into its mergeable scalars and its specialist table.
    pub fn to_partial(&self) -> PartialConfig {
        PartialConfig {
            name: self.name.clone(),
            default_specialist: self.default_specialist.clone(),
            specialist_timeout_secs: self.specialist_timeout_secs,
            max_concurrent_requests: self.max_concurrent_requests,
            degraded_status: self.degraded_status,
        }
    }
}

impl CoordinatorConfig {
    fn to_partial(&self) -> PartialConfig {
        PartialConfig {
            name: Some(self.name.clone()),
            default_specialist: self.default_specialist.clone(),
            specialist_timeout_secs: Some(self.specialist_timeout_secs),
            max_concurrent_requests: Some(self.max_concurrent_requests),
            degraded_status: Some(self.degraded_status),
        }
    }

    /// Layer higher-priority overrides (e.g. CLI flags) on top of a loaded
    /// config. The result is re-validated.
    pub fn with_overrides(self, overrides: PartialConfig) -> Result<CoordinatorConfig, ConfigError> {
        let merged = overrides.with_fallback(self.to_partial());
        merged.finalize(self.specialists, self.source)
    }
}
