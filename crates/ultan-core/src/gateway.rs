//! Text generation seam.
//!
//! The engine only sees [`Generator`]. [`HttpGenerator`] talks to any
//! OpenAI-compatible chat completions endpoint; tests plug in scripted
//! generators instead.
//!
//! No retries or backoff happen here. A transport failure, a non-2xx status,
//! a timeout or an unreadable body all surface as [`Error::Generation`].

use crate::config::Config;
use crate::error::{Error, Result};
use log::debug;
use reqwest::Client;
use serde_json::{Value, json};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed, Send future returned by generators.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Something that turns a prompt into text.
///
/// Returns a boxed future so `&dyn Generator` works.
pub trait Generator: Send + Sync {
    /// Generate text for `prompt`, using `model` or the generator's default.
    fn generate<'a>(&'a self, prompt: &'a str, model: Option<&'a str>)
    -> BoxFuture<'a, Result<String>>;
}

/// Generator backed by an OpenAI-compatible HTTP API.
pub struct HttpGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    default_model: String,
    timeout: Duration,
}

impl HttpGenerator {
    /// Build from configuration. Fails if no API key is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let timeout = config.timeout()?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Generation(format!("failed to build HTTP client: {}", e)))?;

        Ok(HttpGenerator {
            client,
            base_url: config.base_url.clone(),
            api_key,
            default_model: config.model.clone(),
            timeout,
        })
    }

    async fn complete(&self, prompt: &str, model: Option<&str>) -> Result<String> {
        let model = model.unwrap_or(&self.default_model);
        debug!(
            "generating with model {} ({} prompt chars)",
            model,
            prompt.chars().count()
        );

        let body = json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Generation(format!("API error ({}): {}", status, body)));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;
        extract_content(&value)
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Generation(format!(
                "request timed out after {:.1}s",
                self.timeout.as_secs_f64()
            ))
        } else {
            Error::Generation(format!("request failed: {}", e))
        }
    }
}

impl Generator for HttpGenerator {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        model: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.complete(prompt, model))
    }
}

/// Pull `choices[0].message.content` out of a chat completions response.
///
/// A null content (some providers send it for empty answers) is an empty
/// string; a missing message is an error.
fn extract_content(value: &Value) -> Result<String> {
    let message = value
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| Error::Generation("response has no choices[0].message".to_string()))?;

    Ok(message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string())
}
