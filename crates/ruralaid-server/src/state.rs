//! Shared application state.

use std::sync::Arc;

use ruralaid_chat::{Responder, SessionRegistry};
use ruralaid_core::RuralAidConfig;
use ruralaid_match::{Pipeline, Vocabulary};
use ruralaid_store::SqliteCatalog;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: RuralAidConfig,
    pub catalog: Arc<SqliteCatalog>,
    pub pipeline: Pipeline,
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Conversations are answered by the same pipeline that backs
    /// `/api/programs/search`.
    pub fn new(config: RuralAidConfig, catalog: Arc<SqliteCatalog>, vocabulary: Vocabulary) -> Self {
        let pipeline =
            Pipeline::new(vocabulary, catalog.clone()).with_limit(config.result_limit);
        let responder = Arc::new(pipeline.clone());
        Self::assemble(config, catalog, pipeline, responder)
    }

    /// Like [`new`](Self::new), but conversations are answered by `responder`.
    pub fn with_responder(
        config: RuralAidConfig,
        catalog: Arc<SqliteCatalog>,
        vocabulary: Vocabulary,
        responder: Arc<dyn Responder>,
    ) -> Self {
        let pipeline =
            Pipeline::new(vocabulary, catalog.clone()).with_limit(config.result_limit);
        Self::assemble(config, catalog, pipeline, responder)
    }

    fn assemble(
        config: RuralAidConfig,
        catalog: Arc<SqliteCatalog>,
        pipeline: Pipeline,
        responder: Arc<dyn Responder>,
    ) -> Self {
        Self {
            config,
            catalog,
            pipeline,
            sessions: SessionRegistry::new(responder),
        }
    }
}
