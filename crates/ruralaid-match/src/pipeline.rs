//! End-to-end turn pipeline: extract → classify → search → compose.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use ruralaid_store::{Program, ProgramCatalog};

use crate::compose::ResponseComposer;
use crate::extract::extract_keywords;
use crate::matcher::ProgramMatcher;
use crate::vocabulary::Vocabulary;

/// Intermediate results for one query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub query: String,
    pub keywords: Vec<String>,
    pub on_topic: bool,
    pub programs: Vec<Program>,
}

/// Shared, stateless answer pipeline. Cheap to clone.
#[derive(Clone)]
pub struct Pipeline {
    vocabulary: Arc<Vocabulary>,
    matcher: ProgramMatcher,
    composer: ResponseComposer,
}

impl Pipeline {
    pub fn new(vocabulary: Vocabulary, catalog: Arc<dyn ProgramCatalog>) -> Self {
        let vocabulary = Arc::new(vocabulary);
        Self {
            matcher: ProgramMatcher::new(catalog),
            composer: ResponseComposer::new(vocabulary.clone()),
            vocabulary,
        }
    }

    /// Lower the per-turn result cap.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.matcher = self.matcher.with_limit(limit);
        self
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Run extraction, classification and search. The catalog is only
    /// consulted for on-topic queries.
    pub async fn analyze(&self, query: &str) -> Analysis {
        let keywords = extract_keywords(&self.vocabulary, query);
        let on_topic = !keywords.is_empty();
        let programs = if on_topic {
            self.matcher.search_programs(&keywords).await
        } else {
            Vec::new()
        };

        debug!(
            keywords = keywords.len(),
            on_topic,
            programs = programs.len(),
            "analyzed query"
        );

        Analysis {
            query: query.to_string(),
            keywords,
            on_topic,
            programs,
        }
    }

    /// Produce the assistant reply for `query`.
    pub async fn answer(&self, query: &str) -> String {
        let analysis = self.analyze(query).await;
        self.composer
            .compose_reply(query, &analysis.keywords, &analysis.programs)
    }
}
