use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::recognition::store::RecognitionStore;
use crate::recognition::summaries::CandidateSummarizer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Weekly and period-winner persistence. Default: PgRecognitionStore.
    pub store: Arc<dyn RecognitionStore>,
    pub llm: LlmClient,
    /// Pluggable tie-candidate summarizer. Default: LlmCandidateSummarizer.
    pub summarizer: Arc<dyn CandidateSummarizer>,
    pub config: Config,
}
