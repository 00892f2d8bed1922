//! Database schema SQL for the program catalog.

/// Program catalog table.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS programs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    url TEXT,
    category TEXT NOT NULL,
    eligibility TEXT,
    benefits TEXT,
    application_process TEXT,
    contact_info TEXT,
    funding_range TEXT,
    program_code TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_programs_category ON programs(category);
"#;
