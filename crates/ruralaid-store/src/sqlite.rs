//! SQLite-backed program catalog.
//!
//! Substring search is expressed as `lower(column) LIKE '%value%'` with
//! `%`, `_` and `\` in the value escaped, so keywords are always matched
//! literally.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::catalog::{CatalogQuery, MatchOp, ProgramCatalog};
use crate::schema::SCHEMA_SQL;
use crate::types::*;
use ruralaid_core::{Error, Result};

const DB_FILE: &str = "catalog.db";

/// Program catalog stored in a single SQLite file.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteCatalog {
    /// Open or create the catalog.
    ///
    /// `db_dir` is the directory (e.g., `data/catalog/`). The file will be `db_dir/catalog.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join(DB_FILE);

        let conn = Connection::open(&db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Self::init_schema(&conn)?;

        info!("SqliteCatalog opened at {}", db_path.display());
        let catalog = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        info!("SqliteCatalog initialized: {} programs", catalog.count_programs()?);

        Ok(catalog)
    }

    /// Open a private in-memory catalog.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Database(e.to_string()))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))
    }

    // ---------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------

    /// Insert a program. Returns the new row id.
    pub fn add_program(&self, program: &Program) -> Result<i64> {
        validate(program)?;
        let conn = self.conn.lock();
        insert_program(&conn, program)
    }

    /// Insert many programs in one transaction. Returns how many were added.
    ///
    /// Nothing is written if any program is invalid.
    pub fn add_programs(&self, programs: &[Program]) -> Result<usize> {
        for program in programs {
            validate(program)?;
        }

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(e.to_string()))?;
        for program in programs {
            insert_program(&tx, program)?;
        }
        tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        Ok(programs.len())
    }

    /// Load a JSON array of programs into the catalog.
    pub fn load_seed_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let programs: Vec<Program> = serde_json::from_str(&data)?;
        let added = self.add_programs(&programs)?;
        info!("Seeded {} programs from {}", added, path.display());
        Ok(added)
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// Get a program by id.
    pub fn get_program(&self, id: i64) -> Result<Option<Program>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM programs WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], |row| Ok(Self::row_to_program(row)))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    /// Count total programs.
    pub fn count_programs(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM programs", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Categories in first-inserted order with their program counts.
    pub fn list_categories(&self) -> Result<Vec<CategoryCount>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT category, COUNT(*) FROM programs GROUP BY category ORDER BY MIN(id)",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CategoryCount {
                    category: row.get(0)?,
                    programs: row.get(1)?,
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Run a declarative query. Rows come back in id order.
    pub fn search_programs(&self, query: &CatalogQuery) -> Result<Vec<Program>> {
        if query.is_empty() || query.limit == 0 {
            return Ok(Vec::new());
        }

        let mut conditions = Vec::with_capacity(query.any_of.len());
        let mut values: Vec<Value> = Vec::with_capacity(query.any_of.len() + 1);
        for clause in &query.any_of {
            match clause.op {
                MatchOp::Contains => {
                    conditions.push(format!(
                        "lower(COALESCE({}, '')) LIKE ? ESCAPE '\\'",
                        clause.field.column()
                    ));
                    values.push(Value::Text(contains_pattern(&clause.value)));
                }
            }
        }
        values.push(Value::Integer(query.limit as i64));

        let sql = format!(
            "SELECT * FROM programs WHERE {} ORDER BY id LIMIT ?",
            conditions.join(" OR ")
        );

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(Self::row_to_program(row))
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        let programs: Vec<Program> = rows.filter_map(|r| r.ok()).collect();

        debug!(
            clauses = query.any_of.len(),
            hits = programs.len(),
            "catalog search"
        );
        Ok(programs)
    }

    /// Catalog statistics.
    pub fn get_stats(&self) -> Result<CatalogStats> {
        let total_programs = self.count_programs()?;
        let total_categories: i64 = {
            let conn = self.conn.lock();
            conn.query_row("SELECT COUNT(DISTINCT category) FROM programs", [], |row| {
                row.get(0)
            })
            .map_err(|e| Error::Database(e.to_string()))?
        };

        let (db_path, db_size_mb) = match &self.db_path {
            Some(path) => {
                let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                (
                    path.display().to_string(),
                    size as f64 / (1024.0 * 1024.0),
                )
            }
            None => (":memory:".to_string(), 0.0),
        };

        Ok(CatalogStats {
            total_programs,
            total_categories,
            db_path,
            db_size_mb,
        })
    }

    // ---------------------------------------------------------------
    // Row Mapping Helpers
    // ---------------------------------------------------------------

    fn row_to_program(row: &rusqlite::Row<'_>) -> Program {
        Program {
            id: row.get("id").unwrap_or(0),
            title: row.get("title").unwrap_or_default(),
            description: row.get("description").ok().flatten(),
            url: row.get("url").ok().flatten(),
            category: row.get("category").unwrap_or_default(),
            eligibility: row.get("eligibility").ok().flatten(),
            benefits: row.get("benefits").ok().flatten(),
            application_process: row.get("application_process").ok().flatten(),
            contact_info: row.get("contact_info").ok().flatten(),
            funding_range: row.get("funding_range").ok().flatten(),
            program_code: row.get("program_code").ok().flatten(),
        }
    }
}

impl ProgramCatalog for SqliteCatalog {
    fn search(&self, query: &CatalogQuery) -> Result<Vec<Program>> {
        self.search_programs(query)
    }
}

fn validate(program: &Program) -> Result<()> {
    if program.title.trim().is_empty() {
        return Err(Error::Invalid("program title is required".into()));
    }
    if program.category.trim().is_empty() {
        return Err(Error::Invalid(format!(
            "program '{}' has no category",
            program.title
        )));
    }
    Ok(())
}

fn insert_program(conn: &Connection, program: &Program) -> Result<i64> {
    let now = chrono::Utc::now().timestamp_millis();
    conn.prepare_cached(
        "INSERT INTO programs (title, description, url, category, eligibility, benefits, \
         application_process, contact_info, funding_range, program_code, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )
    .map_err(|e| Error::Database(e.to_string()))?
    .insert(params![
        program.title,
        program.description,
        program.url,
        program.category,
        program.eligibility,
        program.benefits,
        program.application_process,
        program.contact_info,
        program.funding_range,
        program.program_code,
        now,
    ])
    .map_err(|e| Error::Database(e.to_string()))
}

/// `%value%` with LIKE metacharacters escaped, lowercased to match `lower(column)`.
fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
