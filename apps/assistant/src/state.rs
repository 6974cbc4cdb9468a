use crate::chat::responder::Responder;
use crate::chat::session::SessionRegistry;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Immutable knowledge base plus the response picker, shared by every session.
    pub responder: Responder,
    pub sessions: SessionRegistry,
}

#[cfg(test)]
impl AppState {
    /// Embedded knowledge base, first-entry picker, no typing delay.
    pub fn for_tests() -> Self {
        use std::sync::Arc;

        use crate::chat::knowledge::KnowledgeBase;
        use crate::chat::responder::FixedPicker;

        Self {
            config: Config {
                port: 0,
                rust_log: "debug".to_string(),
                typing_delay_ms: 0,
                response_seed: None,
                knowledge_base_path: None,
                session_idle_ttl_secs: 0,
                session_sweep_interval_secs: 0,
            },
            responder: Responder::new(
                Arc::new(KnowledgeBase::embedded().expect("embedded knowledge base")),
                Arc::new(FixedPicker(0)),
            ),
            sessions: SessionRegistry::new(),
        }
    }
}
