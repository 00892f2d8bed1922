//! Storage-agnostic catalog query model.

use serde::{Deserialize, Serialize};

use crate::types::Program;
use ruralaid_core::Result;

/// Searchable program columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramField {
    Title,
    Description,
    Category,
}

impl ProgramField {
    /// Fields the matcher searches, in clause order.
    pub const SEARCHABLE: [ProgramField; 3] = [
        ProgramField::Title,
        ProgramField::Description,
        ProgramField::Category,
    ];

    /// Backing column name.
    pub fn column(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Category => "category",
        }
    }

    /// Value of this field on a program, empty when unset.
    pub fn value_of(self, program: &Program) -> &str {
        match self {
            Self::Title => &program.title,
            Self::Description => program.description.as_deref().unwrap_or(""),
            Self::Category => &program.category,
        }
    }
}

impl std::fmt::Display for ProgramField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Comparison applied by a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOp {
    /// Case-insensitive substring containment.
    Contains,
}

/// A single `field op value` test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub field: ProgramField,
    pub op: MatchOp,
    pub value: String,
}

impl Clause {
    pub fn contains(field: ProgramField, value: impl Into<String>) -> Self {
        Self {
            field,
            op: MatchOp::Contains,
            value: value.into(),
        }
    }

    /// Evaluate the clause against an in-memory row.
    pub fn matches(&self, program: &Program) -> bool {
        match self.op {
            MatchOp::Contains => self
                .field
                .value_of(program)
                .to_lowercase()
                .contains(&self.value.to_lowercase()),
        }
    }
}

/// Clauses combined with OR, plus a row cap.
///
/// A query with no clauses matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub any_of: Vec<Clause>,
    pub limit: usize,
}

impl CatalogQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            any_of: Vec::new(),
            limit,
        }
    }

    /// Add one clause per searchable field for `value`.
    pub fn or_contains_any_field(mut self, value: &str) -> Self {
        for field in ProgramField::SEARCHABLE {
            self.any_of.push(Clause::contains(field, value));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.any_of.is_empty()
    }

    /// Evaluate the whole predicate against an in-memory row.
    pub fn matches(&self, program: &Program) -> bool {
        self.any_of.iter().any(|c| c.matches(program))
    }
}

/// Read capability over the program catalog.
pub trait ProgramCatalog: Send + Sync {
    /// Return rows matching any clause of `query`, at most `query.limit`.
    fn search(&self, query: &CatalogQuery) -> Result<Vec<Program>>;
}

impl ProgramCatalog for Vec<Program> {
    fn search(&self, query: &CatalogQuery) -> Result<Vec<Program>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .iter()
            .filter(|p| query.matches(p))
            .take(query.limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broadband_program() -> Program {
        Program {
            description: Some("Funds BROADBAND buildout in rural towns".into()),
            ..Program::new("ReConnect Loans", "Telecommunications")
        }
    }

    #[test]
    fn test_or_contains_builds_one_clause_per_field() {
        let query = CatalogQuery::new(5)
            .or_contains_any_field("rural")
            .or_contains_any_field("water");
        assert_eq!(query.any_of.len(), 6);
        assert_eq!(query.any_of[0], Clause::contains(ProgramField::Title, "rural"));
        assert_eq!(query.any_of[5], Clause::contains(ProgramField::Category, "water"));
    }

    #[test]
    fn test_clause_is_case_insensitive() {
        let program = broadband_program();
        assert!(Clause::contains(ProgramField::Description, "broadband").matches(&program));
        assert!(Clause::contains(ProgramField::Category, "TELECOM").matches(&program));
        assert!(!Clause::contains(ProgramField::Title, "broadband").matches(&program));
    }

    #[test]
    fn test_missing_description_never_matches() {
        let program = Program::new("Water Grants", "Water");
        assert!(!Clause::contains(ProgramField::Description, "water").matches(&program));
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let rows = vec![broadband_program()];
        assert!(rows.search(&CatalogQuery::new(5)).unwrap().is_empty());
    }

    #[test]
    fn test_vec_catalog_honors_limit() {
        let rows: Vec<Program> = (0..10)
            .map(|i| Program::new(format!("Housing {}", i), "Housing"))
            .collect();
        let query = CatalogQuery::new(3).or_contains_any_field("housing");
        let hits = rows.search(&query).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].title, "Housing 0");
    }
}
