//! Translation client: best-effort Spanish → target-language lookups.
//!
//! All translation calls go through the `Translator` trait. Failures never
//! propagate: callers get `Translation::Unavailable` and carry on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://api.mymemory.translated.net";
const SOURCE_LANG: &str = "es";
const BACKOFF_BASE_MS: u64 = 250;
const BACKOFF_MAX_MS: u64 = 2_000;
/// Upper bound on attempts per lookup, including the first.
pub const MAX_ATTEMPTS_LIMIT: u32 = 5;

/// Outcome of a translation lookup. Serializes as the translated string or
/// `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Translation {
    Available(String),
    Unavailable,
}

impl Translation {
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Translation::Available(text) => Some(text),
            Translation::Unavailable => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("translation API returned HTTP {0}")]
    Status(u16),

    #[error("translation API reported status {status}: {details}")]
    Upstream { status: String, details: String },

    #[error("translation API response has no translatedText")]
    MissingText,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl TranslationError {
    fn is_retryable(&self) -> bool {
        match self {
            TranslationError::Http(_) => true,
            TranslationError::Status(status) => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Seam between handlers and the translation backend.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str) -> Translation;
}

#[derive(Debug, Deserialize)]
struct MyMemoryResponse {
    #[serde(rename = "responseStatus", default)]
    response_status: serde_json::Value,
    #[serde(rename = "responseData", default)]
    response_data: Option<MyMemoryData>,
    #[serde(rename = "responseDetails", default)]
    response_details: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MyMemoryData {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

fn is_ok_status(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Number(n) => n.as_u64() == Some(200),
        serde_json::Value::String(s) => s.trim() == "200",
        _ => false,
    }
}

/// Client for the MyMemory translation API.
#[derive(Clone)]
pub struct MyMemoryClient {
    client: Client,
    base_url: String,
    max_attempts: u32,
}

impl MyMemoryClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        max_attempts: u32,
    ) -> Result<Self, TranslationError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into(),
            max_attempts: max_attempts.clamp(1, MAX_ATTEMPTS_LIMIT),
        })
    }

    /// Fetches a translation, retrying transport errors, 429 and 5xx with
    /// exponential backoff.
    pub async fn fetch(&self, text: &str, target_lang: &str) -> Result<String, TranslationError> {
        let mut last_error: Option<TranslationError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "Translation attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.fetch_once(text, target_lang).await {
                Ok(translated) => return Ok(translated),
                Err(e) if e.is_retryable() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(TranslationError::MissingText))
    }

    async fn fetch_once(&self, text: &str, target_lang: &str) -> Result<String, TranslationError> {
        let url = format!("{}/get", self.base_url.trim_end_matches('/'));
        let langpair = format!("{SOURCE_LANG}|{target_lang}");

        let response = self
            .client
            .get(&url)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: MyMemoryResponse = serde_json::from_str(&body)?;

        if !is_ok_status(&parsed.response_status) {
            let details = match parsed.response_details {
                serde_json::Value::String(s) if !s.is_empty() => s,
                serde_json::Value::Null => "unknown error".to_string(),
                other => other.to_string(),
            };
            return Err(TranslationError::Upstream {
                status: parsed.response_status.to_string(),
                details,
            });
        }

        let translated = parsed
            .response_data
            .and_then(|d| d.translated_text)
            .ok_or(TranslationError::MissingText)?;

        debug!("Translated {} chars to {target_lang}", text.chars().count());
        Ok(translated)
    }
}

#[async_trait]
impl Translator for MyMemoryClient {
    async fn translate(&self, text: &str, target_lang: &str) -> Translation {
        match self.fetch(text, target_lang).await {
            Ok(translated) => Translation::Available(translated),
            Err(e) => {
                warn!("Translation unavailable for {:?}: {e}", truncate(text, 60));
                Translation::Unavailable
            }
        }
    }
}

/// Delay before retry number `attempt` (1-based): 250ms, 500ms, 1s, 2s, then
/// capped at 2s.
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1_u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    Duration::from_millis(BACKOFF_BASE_MS.saturating_mul(factor).min(BACKOFF_MAX_MS))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer, max_attempts: u32) -> MyMemoryClient {
        MyMemoryClient::new(server.base_url(), Duration::from_secs(2), max_attempts).unwrap()
    }

    #[tokio::test]
    async fn test_translate_success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/get")
                    .query_param("q", "Oratoria")
                    .query_param("langpair", "es|en");
                then.status(200).json_body(json!({
                    "responseStatus": 200,
                    "responseData": { "translatedText": "Public speaking" }
                }));
            })
            .await;

        let result = client(&server, 1).translate("Oratoria", "en").await;

        mock.assert_async().await;
        assert_eq!(result, Translation::Available("Public speaking".to_string()));
    }

    #[tokio::test]
    async fn test_upstream_status_is_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/get");
                then.status(200).json_body(json!({
                    "responseStatus": "403",
                    "responseDetails": "INVALID LANGUAGE PAIR",
                    "responseData": { "translatedText": "INVALID LANGUAGE PAIR" }
                }));
            })
            .await;

        let result = client(&server, 1).translate("Hola", "xx").await;
        assert_eq!(result, Translation::Unavailable);
    }

    #[tokio::test]
    async fn test_missing_translated_text_is_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/get");
                then.status(200)
                    .json_body(json!({ "responseStatus": 200, "responseData": {} }));
            })
            .await;

        let result = client(&server, 1).translate("Hola", "en").await;
        assert_eq!(result, Translation::Unavailable);
    }

    #[tokio::test]
    async fn test_malformed_body_is_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/get");
                then.status(200).body("<html>not json</html>");
            })
            .await;

        let result = client(&server, 1).translate("Hola", "en").await;
        assert_eq!(result, Translation::Unavailable);
    }

    #[tokio::test]
    async fn test_server_error_is_retried_then_unavailable() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/get");
                then.status(503);
            })
            .await;

        let result = client(&server, 2).translate("Hola", "en").await;

        mock.assert_hits_async(2).await;
        assert_eq!(result, Translation::Unavailable);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/get");
                then.status(404);
            })
            .await;

        let err = client(&server, 3).fetch("Hola", "en").await.unwrap_err();

        mock.assert_hits_async(1).await;
        assert!(matches!(err, TranslationError::Status(404)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let client =
            MyMemoryClient::new("http://127.0.0.1:9", Duration::from_millis(500), 1).unwrap();
        assert_eq!(client.translate("Hola", "en").await, Translation::Unavailable);
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out_as_unavailable() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/get");
                then.status(200)
                    .delay(Duration::from_millis(1_500))
                    .json_body(json!({
                        "responseStatus": 200,
                        "responseData": { "translatedText": "Hello" }
                    }));
            })
            .await;

        let client =
            MyMemoryClient::new(server.base_url(), Duration::from_millis(200), 1).unwrap();

        assert_eq!(client.translate("Hola", "en").await, Translation::Unavailable);
        mock.assert_hits_async(1).await;
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff_delay(1), Duration::from_millis(250));
        assert_eq!(backoff_delay(2), Duration::from_millis(500));
        assert_eq!(backoff_delay(4), Duration::from_millis(2_000));
        assert_eq!(backoff_delay(10), Duration::from_millis(2_000));
        assert_eq!(backoff_delay(70), Duration::from_millis(2_000));
    }

    #[test]
    fn test_attempts_are_clamped() {
        let client = MyMemoryClient::new("http://localhost", Duration::from_secs(1), 70).unwrap();
        assert_eq!(client.max_attempts, MAX_ATTEMPTS_LIMIT);
        let client = MyMemoryClient::new("http://localhost", Duration::from_secs(1), 0).unwrap();
        assert_eq!(client.max_attempts, 1);
    }

    #[test]
    fn test_translation_serializes_as_string_or_null() {
        assert_eq!(
            serde_json::to_value(Translation::Available("Hi".into())).unwrap(),
            json!("Hi")
        );
        assert_eq!(
            serde_json::to_value(Translation::Unavailable).unwrap(),
            serde_json::Value::Null
        );
    }
}
