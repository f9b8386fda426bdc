use crate::config::Config;
use crate::i18n::{Language, TranslationMetrics};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// LibreTranslate `/translate` request body
#[derive(Debug, Serialize)]
struct TranslationRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslationResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Failed to send translation request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Translation API error ({status}): {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse translation response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Translation response contained no translatedText")]
    EmptyTranslation,
}

/// Client for a LibreTranslate-compatible translation endpoint.
///
/// Cheap to clone; clones share the HTTP connection pool and metrics.
#[derive(Debug, Clone)]
pub struct Translator {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    metrics: Arc<TranslationMetrics>,
}

impl Translator {
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        api_key: Option<String>,
        metrics: Arc<TranslationMetrics>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key,
            metrics,
        }
    }

    pub fn from_config(
        client: reqwest::Client,
        config: &Config,
        metrics: Arc<TranslationMetrics>,
    ) -> Self {
        Self::new(
            client,
            config.translate_api_url.clone(),
            config.translate_api_key.clone(),
            metrics,
        )
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    /// Translate `text`, falling back to the original text on any failure.
    ///
    /// Never fails: a translation problem only shows up as untranslated content.
    pub async fn translate(&self, text: &str, from: Language, to: Language) -> String {
        match self.try_translate(text, from, to).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!("Translation {} -> {} failed, keeping original text: {}", from, to, e);
                text.to_string()
            }
        }
    }

    /// Translate `text` and report failures to the caller.
    ///
    /// Same-language and blank inputs are returned as-is without a request.
    pub async fn try_translate(
        &self,
        text: &str,
        from: Language,
        to: Language,
    ) -> Result<String, TranslateError> {
        if from == to || text.trim().is_empty() {
            return Ok(text.to_string());
        }

        self.metrics.record_api_call();
        let result = self.request(text, from, to).await;
        if result.is_err() {
            self.metrics.record_api_failure();
        }
        result
    }

    async fn request(&self, text: &str, from: Language, to: Language) -> Result<String, TranslateError> {
        debug!("Translating {} chars {} -> {}", text.chars().count(), from, to);

        let request = TranslationRequest {
            q: text,
            source: from.code(),
            target: to.code(),
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await
            .map_err(TranslateError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(TranslateError::Status { status, body });
        }

        let parsed: TranslationResponse = response.json().await.map_err(TranslateError::Decode)?;

        parsed
            .translated_text
            .filter(|translated| !translated.is_empty())
            .ok_or(TranslateError::EmptyTranslation)
    }
}
