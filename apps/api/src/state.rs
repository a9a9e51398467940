use std::sync::Arc;

use crate::config::Config;
use crate::conversation::session::SessionStore;
use crate::doctor_search::DoctorSearch;
use crate::llm_client::LanguageModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Language-model port. `LlmClient` in production, a scripted model in tests.
    pub llm: Arc<dyn LanguageModel>,
    /// Pluggable doctor search. Google Places when a key is configured, mock otherwise.
    pub doctor_search: Arc<dyn DoctorSearch>,
    pub sessions: SessionStore,
    pub config: Config,
}
