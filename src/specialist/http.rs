//! HTTP specialist.
//!
//! POSTs `{"specialist": <name>, "request": <text>}` to the configured
//! endpoint. A JSON body is returned as-is; any other body, including a
//! body labelled JSON that does not parse, is returned as text. Non-2xx
//! statuses are failures.

use futures::future::BoxFuture;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Value, json};

use super::Specialist;
use crate::dispatch::types::SpecialistRequest;
use crate::error::SpecialistError;

pub struct HttpSpecialist {
    name: String,
    endpoint: String,
    client: reqwest::Client,
}

impl HttpSpecialist {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            client,
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> SpecialistError {
        SpecialistError::Transport {
            name: self.name.clone(),
            message: e.to_string(),
        }
    }

    async fn run(&self, request: SpecialistRequest) -> Result<Value, SpecialistError> {
        let body = json!({
            "specialist": self.name,
            "request": request.into_text(),
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(SpecialistError::Failed {
                name: self.name.clone(),
                message: format!("HTTP {status}: {}", text.trim()),
            });
        }

        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let text = resp.text().await.map_err(|e| self.transport_error(e))?;
        if !is_json {
            return Ok(Value::String(text));
        }
        // A mislabelled prose body still reaches the caller verbatim.
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::debug!(specialist = %self.name, error = %e, "JSON content type with non-JSON body");
                Ok(Value::String(text))
            }
        }
    }
}

impl Specialist for HttpSpecialist {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, request: SpecialistRequest) -> BoxFuture<'_, Result<Value, SpecialistError>> {
        Box::pin(self.run(request))
    }
}
