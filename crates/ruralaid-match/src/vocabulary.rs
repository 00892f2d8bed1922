//! Domain vocabulary used to decide whether a question is in scope.

use std::path::Path;

use once_cell::sync::Lazy;
use tracing::{info, warn};

use ruralaid_core::Result;

/// Built-in rural development terms.
///
/// Order matters: the first term found in a question is the one named in the
/// "no matching programs" reply.
pub const DEFAULT_TERMS: &[&str] = &[
    "rural",
    "housing",
    "home",
    "mortgage",
    "rental",
    "repair",
    "loan",
    "grant",
    "business",
    "entrepreneur",
    "cooperative",
    "broadband",
    "internet",
    "telecommunication",
    "energy",
    "solar",
    "renewable",
    "electric",
    "water",
    "wastewater",
    "sewer",
    "community",
    "facility",
    "facilities",
    "clinic",
    "farm",
    "farming",
    "agricultur",
    "usda",
];

static BUILTIN: Lazy<Vocabulary> = Lazy::new(|| Vocabulary::new(DEFAULT_TERMS.iter().copied()));

/// Ordered, lowercase, duplicate-free list of terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

impl Vocabulary {
    /// Build a vocabulary. Terms are trimmed and lowercased; blanks and
    /// repeats are dropped, keeping the first occurrence.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if !term.is_empty() && !out.contains(&term) {
                out.push(term);
            }
        }
        Self { terms: out }
    }

    /// Shared instance of the built-in vocabulary.
    pub fn builtin() -> &'static Vocabulary {
        &BUILTIN
    }

    /// Load a JSON array of terms.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let terms: Vec<String> = serde_json::from_str(&data)?;
        Ok(Self::new(terms))
    }

    /// Load `path` if it exists and parses to a non-empty list, otherwise the
    /// built-in vocabulary.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(vocab) if !vocab.is_empty() => {
                info!("Loaded {} vocabulary terms from {}", vocab.len(), path.display());
                vocab
            }
            Ok(_) => {
                warn!("{} has no terms, using built-in vocabulary", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Failed to load {}: {}. Using built-in vocabulary.", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
