//! Specialist invocation boundary.
//!
//! A [`Specialist`] takes one [`SpecialistRequest`] by value and returns one
//! raw reply as a [`serde_json::Value`] (text or a JSON object; any other
//! shape is rejected later by the normalizer). Specialists are stateless:
//! they never see the routing decision or the canonical response.
//!
//! Timeouts and cancellation are applied by the coordinator, which drops the
//! returned future. Implementations must clean up on drop.

pub mod command;
pub mod http;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::config::{CoordinatorConfig, SpecialistTransport};
use crate::dispatch::types::SpecialistRequest;
use crate::error::SpecialistError;

pub use command::CommandSpecialist;
pub use http::HttpSpecialist;

pub trait Specialist: Send + Sync {
    fn name(&self) -> &str;

    fn invoke(&self, request: SpecialistRequest) -> BoxFuture<'_, Result<Value, SpecialistError>>;
}

/// Specialists by name, shared across requests.
#[derive(Clone, Default)]
pub struct SpecialistRegistry {
    specialists: HashMap<String, Arc<dyn Specialist>>,
}

impl SpecialistRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one specialist per configured entry. Command specialists run in
    /// the directory holding the config file so relative scripts resolve.
    pub fn from_config(config: &CoordinatorConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
        let working_dir = config.source.parent().map(Path::to_path_buf);

        let mut registry = Self::new();
        for specialist in config.specialists.values() {
            match &specialist.transport {
                SpecialistTransport::Command(command) => {
                    let mut s = CommandSpecialist::new(&specialist.name, command);
                    if let Some(dir) = &working_dir {
                        s = s.with_working_dir(dir);
                    }
                    registry.insert(Arc::new(s));
                }
                SpecialistTransport::Http(endpoint) => {
                    registry.insert(Arc::new(HttpSpecialist::new(
                        &specialist.name,
                        endpoint,
                        client.clone(),
                    )));
                }
            }
        }

        tracing::debug!(count = registry.len(), "Specialist registry built");
        Ok(registry)
    }

    /// Register a specialist under its own name, replacing any previous one.
    pub fn insert(&mut self, specialist: Arc<dyn Specialist>) {
        self.specialists
            .insert(specialist.name().to_string(), specialist);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Specialist>, SpecialistError> {
        self.specialists
            .get(name)
            .cloned()
            .ok_or_else(|| SpecialistError::Unknown(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.specialists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specialists.is_empty()
    }
}
