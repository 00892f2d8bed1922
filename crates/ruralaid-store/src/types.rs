//! Data types for catalog rows and statistics.

use serde::{Deserialize, Serialize};

/// One assistance program from the catalog.
///
/// Only `title` and `category` are required. The remaining fields are
/// informational and rendered only when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    /// Row id assigned by the store; ignored on insert.
    #[serde(default)]
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_code: Option<String>,
}

impl Program {
    /// Minimal program with only the required fields set.
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            ..Default::default()
        }
    }
}

/// Number of programs filed under one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub programs: i64,
}

/// Catalog-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_programs: i64,
    pub total_categories: i64,
    pub db_path: String,
    pub db_size_mb: f64,
}
