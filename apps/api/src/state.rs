use std::sync::Arc;

use crate::notify::Notifier;
use crate::profile::catalog::Catalog;
use crate::store::RecordStore;
use crate::translation::Translator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    /// Pluggable translation backend. Default: MyMemoryClient.
    pub translator: Arc<dyn Translator>,
    pub notifier: Notifier,
    /// Read-only category catalog, built once at startup.
    pub catalog: Arc<Catalog>,
    pub target_lang: String,
}
