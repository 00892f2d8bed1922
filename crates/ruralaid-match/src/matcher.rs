//! Program matcher — keywords to catalog rows.

use std::sync::Arc;

use tracing::{debug, warn};

use ruralaid_store::{CatalogQuery, Program, ProgramCatalog};

/// Hard cap on programs returned for one turn.
pub const MAX_RESULTS: usize = 5;

/// Looks up programs whose title, description or category contains any keyword.
#[derive(Clone)]
pub struct ProgramMatcher {
    catalog: Arc<dyn ProgramCatalog>,
    limit: usize,
}

impl ProgramMatcher {
    pub fn new(catalog: Arc<dyn ProgramCatalog>) -> Self {
        Self {
            catalog,
            limit: MAX_RESULTS,
        }
    }

    /// Lower the row cap. Values above [`MAX_RESULTS`] are clamped.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_RESULTS);
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// One `contains` clause per keyword × searchable field, OR-combined.
    pub fn build_query(&self, keywords: &[String]) -> CatalogQuery {
        keywords
            .iter()
            .fold(CatalogQuery::new(self.limit), |query, keyword| {
                query.or_contains_any_field(keyword)
            })
    }

    /// Search the catalog for `keywords`.
    ///
    /// Returns an empty list without touching the catalog when `keywords` is
    /// empty. Catalog failures are logged and reported as no matches.
    pub async fn search_programs(&self, keywords: &[String]) -> Vec<Program> {
        if keywords.is_empty() {
            return Vec::new();
        }

        let query = self.build_query(keywords);
        let catalog = Arc::clone(&self.catalog);
        let outcome = tokio::task::spawn_blocking(move || catalog.search(&query)).await;

        match outcome {
            Ok(Ok(mut programs)) => {
                programs.truncate(self.limit);
                debug!(keywords = ?keywords, hits = programs.len(), "matched programs");
                programs
            }
            Ok(Err(e)) => {
                warn!("Program search failed, treating as no matches: {}", e);
                Vec::new()
            }
            Err(e) => {
                warn!("Program search task aborted, treating as no matches: {}", e);
                Vec::new()
            }
        }
    }
}
