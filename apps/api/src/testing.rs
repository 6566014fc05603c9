//! Test doubles shared by handler and pipeline tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::notify::{MailError, MailTransport, Notifier, OutgoingEmail};
use crate::profile::catalog::Catalog;
use crate::state::AppState;
use crate::store::RecordStore;
use crate::translation::{Translation, Translator};

pub const OPERATOR: &str = "vocari@example.com";

/// Translator that prefixes its input, or reports everything unavailable.
pub struct StubTranslator {
    prefix: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl StubTranslator {
    pub fn prefixing(prefix: &str) -> Self {
        Self {
            prefix: Some(prefix.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            prefix: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for StubTranslator {
    async fn translate(&self, text: &str, _target_lang: &str) -> Translation {
        self.calls.lock().unwrap().push(text.to_string());
        match &self.prefix {
            Some(prefix) => Translation::Available(format!("{prefix}{text}")),
            None => Translation::Unavailable,
        }
    }
}

/// Mail transport that records batches, or fails every send.
#[derive(Default)]
pub struct RecordingTransport {
    batches: Mutex<Vec<Vec<OutgoingEmail>>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn batches(&self) -> Vec<Vec<OutgoingEmail>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.batches().into_iter().flatten().collect()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send_batch(&self, messages: &[OutgoingEmail]) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        self.batches.lock().unwrap().push(messages.to_vec());
        Ok(())
    }
}

pub fn test_state(
    store: Arc<dyn RecordStore>,
    transport: Arc<dyn MailTransport>,
    translator: StubTranslator,
) -> AppState {
    AppState {
        store,
        translator: Arc::new(translator),
        notifier: Notifier::new(transport, true, OPERATOR),
        catalog: Arc::new(Catalog::standard()),
        target_lang: "en".to_string(),
    }
}

pub async fn read_body(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn read_json_body(response: Response) -> Value {
    serde_json::from_str(&read_body(response).await).expect("json body")
}
