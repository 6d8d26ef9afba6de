//! The coordinator: route, build request, invoke, normalize.
//!
//! [`SmartCoordinator::handle`] never returns an error. Any per-request
//! failure becomes a [`CanonicalResponse`] with `status: error` and a
//! human-readable summary naming the stage that failed. Nothing is retried.
//!
//! The coordinator holds only read-only shared state (config, router,
//! specialists), so one instance can serve concurrent requests behind an
//! `Arc` without locking.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::normalize::ResponseNormalizer;
use super::request::RequestBuilder;
use super::types::{CanonicalResponse, SpecialistRequest};
use crate::config::CoordinatorConfig;
use crate::error::{DispatchError, SpecialistError};
use crate::routing::Router;
use crate::specialist::SpecialistRegistry;

/// Stage of a single request. `Failed` is reachable from every other stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Route,
    BuildRequest,
    Invoke,
    Normalize,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Route => "routing",
            Stage::BuildRequest => "request building",
            Stage::Invoke => "specialist invocation",
            Stage::Normalize => "response normalization",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

pub struct SmartCoordinator {
    config: Arc<CoordinatorConfig>,
    router: Arc<dyn Router>,
    specialists: SpecialistRegistry,
    builder: RequestBuilder,
    normalizer: ResponseNormalizer,
}

impl SmartCoordinator {
    /// Create a coordinator over an already-resolved configuration.
    pub fn new(
        config: Arc<CoordinatorConfig>,
        router: Arc<dyn Router>,
        specialists: SpecialistRegistry,
    ) -> Self {
        let normalizer = ResponseNormalizer::new(config.degraded_status);
        Self {
            config,
            router,
            specialists,
            builder: RequestBuilder::new(),
            normalizer,
        }
    }

    /// Handle one query end to end.
    pub async fn handle(&self, query: &str) -> CanonicalResponse {
        self.handle_with_cancel(query, &CancellationToken::new()).await
    }

    /// Handle one query, aborting the specialist call if `cancel` fires.
    pub async fn handle_with_cancel(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> CanonicalResponse {
        let request_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("request", id = %request_id);

        async {
            let start = Instant::now();
            match self.dispatch(query, cancel).await {
                Ok(response) => {
                    tracing::info!(
                        stage = %Stage::Done,
                        status = %response.status,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Request handled"
                    );
                    response
                }
                Err((stage, e)) => {
                    tracing::warn!(
                        stage = %Stage::Failed,
                        failed_in = %stage,
                        error = %e,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Request failed"
                    );
                    CanonicalResponse::error(format!("{stage} failed: {e}"))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Handle many queries concurrently, at most `max_concurrent_requests`
    /// at a time. Responses are returned in input order.
    pub async fn handle_batch(&self, queries: Vec<String>) -> Vec<CanonicalResponse> {
        let limit = self.config.max_concurrent_requests.max(1);
        stream::iter(queries)
            .map(|query| async move { self.handle(&query).await })
            .buffered(limit)
            .collect()
            .await
    }

    async fn dispatch(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<CanonicalResponse, (Stage, DispatchError)> {
        let decision = self
            .router
            .route(query)
            .map_err(|e| (Stage::Route, DispatchError::from(e)))?;
        tracing::debug!(stage = %Stage::Route, specialist = decision.specialist(), "Routed");

        let request = self
            .builder
            .build(&decision)
            .map_err(|e| (Stage::BuildRequest, DispatchError::from(e)))?;
        tracing::debug!(stage = %Stage::BuildRequest, bytes = request.text().len(), "Request built");

        let raw = self
            .invoke(request, cancel)
            .await
            .map_err(|e| (Stage::Invoke, DispatchError::from(e)))?;

        self.normalizer
            .normalize(raw)
            .map_err(|e| (Stage::Normalize, DispatchError::from(e)))
    }

    /// Call the request's specialist, bounded by the configured timeout and
    /// the cancellation token. Dropping the call future cleans it up.
    async fn invoke(
        &self,
        request: SpecialistRequest,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, SpecialistError> {
        let specialist = self.specialists.get(request.specialist())?;
        let name = specialist.name().to_string();
        let timeout_secs = self.config.specialist_timeout_secs;

        tracing::debug!(stage = %Stage::Invoke, specialist = %name, timeout_secs, "Invoking specialist");

        tokio::select! {
            result = specialist.invoke(request) => result,
            _ = tokio::time::sleep(Duration::from_secs(timeout_secs)) => {
                Err(SpecialistError::TimedOut { name, timeout_secs })
            }
            _ = cancel.cancelled() => {
                Err(SpecialistError::Cancelled { name })
            }
        }
    }
}
