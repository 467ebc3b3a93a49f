//! SQLite-backed story table.
//!
//! One row per distinct story URL. Ingestion only ever inserts (existing rows
//! are never replaced); enrichment only ever fills empty fields. Labels are
//! owned by external tooling and never written here.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::Result;
use crate::models::Record;

/// Bump when the table needs an in-place migration.
const SCHEMA_VERSION: i32 = 1;

/// Rows still waiting for page content.
const UNENRICHED: &str = "(COALESCE(title, '') = '' OR COALESCE(text, '') = '')";

/// Result of fetching one story's page, as written back to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    Enriched { title: String, text: String },
    Failed { error: String },
}

/// How many outcomes of a committed batch landed as what.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Rows that now have both a title and text.
    pub enriched: usize,
    /// Rows that had a failed attempt recorded.
    pub failed: usize,
}

impl BatchSummary {
    /// Rows changed by the batch.
    pub fn changed(&self) -> usize {
        self.enriched + self.failed
    }
}

/// Row counts for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordStats {
    pub total: u64,
    pub enriched: u64,
    /// Unenriched and still eligible for another attempt.
    pub pending: u64,
    /// Unenriched with no attempts left.
    pub exhausted: u64,
}

/// Repository for the `data` table.
pub struct RecordRepository {
    db_path: PathBuf,
}

impl RecordRepository {
    /// Open the repository, creating or migrating the schema as needed.
    pub fn new(db_path: &Path) -> Result<Self> {
        let repo = Self {
            db_path: db_path.to_path_buf(),
        };
        repo.ensure_schema()?;
        Ok(repo)
    }

    fn connect(&self) -> Result<Connection> {
        super::connect(&self.db_path)
    }

    /// Get the database path.
    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    /// Create the table if absent and bring older layouts up to date.
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS data (
                url TEXT PRIMARY KEY,
                title TEXT NOT NULL DEFAULT '',
                text TEXT NOT NULL DEFAULT '',
                website TEXT NOT NULL DEFAULT '',
                time INTEGER,
                label TEXT NOT NULL DEFAULT '',
                attempts INTEGER NOT NULL DEFAULT 0,
                last_error TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_data_website ON data(website);
            "#,
        )?;

        // Tables created by earlier tooling lack the retry bookkeeping
        let columns = table_columns(&conn)?;
        if !columns.iter().any(|c| c == "attempts") {
            conn.execute(
                "ALTER TABLE data ADD COLUMN attempts INTEGER NOT NULL DEFAULT 0",
                [],
            )?;
            debug!("Added attempts column");
        }
        if !columns.iter().any(|c| c == "last_error") {
            conn.execute("ALTER TABLE data ADD COLUMN last_error TEXT", [])?;
            debug!("Added last_error column");
        }

        conn.execute_batch(&format!(
            r#"
            CREATE INDEX IF NOT EXISTS idx_data_unenriched
                ON data(attempts) WHERE {UNENRICHED};
            PRAGMA user_version = {SCHEMA_VERSION};
            "#
        ))?;

        Ok(())
    }

    /// Insert records, leaving any existing row with the same URL untouched.
    ///
    /// Returns the number of rows actually inserted.
    pub fn upsert_ignoring_duplicates(&self, records: &[Record]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR IGNORE INTO data (url, title, text, website, time, label)
                VALUES (?1, ?2, ?3, ?4, ?5, '')
                "#,
            )?;
            for record in records {
                inserted += stmt.execute(params![
                    record.url,
                    record.title,
                    record.text,
                    record.website,
                    record.time,
                ])?;
            }
        }
        tx.commit()?;

        debug!(
            offered = records.len(),
            inserted, "Upserted records ignoring duplicates"
        );
        Ok(inserted)
    }

    /// Count rows whose title or text is still empty.
    pub fn count_unenriched(&self) -> Result<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM data WHERE {UNENRICHED}"),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Count unenriched rows that have attempts left.
    pub fn count_pending(&self, max_attempts: u32) -> Result<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM data WHERE {UNENRICHED} AND attempts < ?1"),
            params![max_attempts],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Select up to `limit` unenriched URLs with attempts left.
    ///
    /// No ordering is promised; least-attempted rows happen to come first.
    pub fn select_unenriched_batch(&self, limit: usize, max_attempts: u32) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT url FROM data
            WHERE {UNENRICHED} AND attempts < ?1
            ORDER BY attempts ASC, rowid ASC
            LIMIT ?2
            "#
        ))?;

        let urls = stmt
            .query_map(params![max_attempts, limit as i64], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(urls)
    }

    /// Fill a row's enrichment fields.
    ///
    /// Only empty fields are written: an existing title or text is never
    /// replaced, and already-enriched rows are left alone. Title and text are
    /// written together; if either would still be empty afterwards the call
    /// records a failed attempt instead. Returns `true` only when the row
    /// ends up enriched.
    pub fn update_enrichment(&self, url: &str, title: &str, text: &str) -> Result<bool> {
        let conn = self.connect()?;
        Ok(write_enrichment(&conn, url, title, text)? == Written::Enriched)
    }

    /// Record a failed enrichment attempt without touching title or text.
    pub fn mark_enrichment_failed(&self, url: &str, error: &str) -> Result<bool> {
        let conn = self.connect()?;
        Ok(write_failure(&conn, url, error)? > 0)
    }

    /// Write a whole batch of outcomes in one transaction.
    ///
    /// Either every outcome is committed or none is; on error every row in the
    /// batch keeps its previous state and will be selected again.
    pub fn apply_enrichment_batch(
        &self,
        outcomes: &[(String, EnrichmentOutcome)],
    ) -> Result<BatchSummary> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let mut summary = BatchSummary::default();
        for (url, outcome) in outcomes {
            let written = match outcome {
                EnrichmentOutcome::Enriched { title, text } => {
                    write_enrichment(&tx, url, title, text)?
                }
                EnrichmentOutcome::Failed { error } => {
                    if write_failure(&tx, url, error)? > 0 {
                        Written::Failed
                    } else {
                        Written::Unchanged
                    }
                }
            };
            match written {
                Written::Enriched => summary.enriched += 1,
                Written::Failed => summary.failed += 1,
                Written::Unchanged => {}
            }
        }

        tx.commit()?;
        Ok(summary)
    }

    /// Make every exhausted row eligible again. Returns rows reset.
    pub fn reset_failures(&self) -> Result<usize> {
        let conn = self.connect()?;
        let reset = conn.execute(
            &format!("UPDATE data SET attempts = 0, last_error = NULL WHERE attempts > 0 AND {UNENRICHED}"),
            [],
        )?;
        if reset > 0 {
            info!(reset, "Cleared enrichment failure markers");
        }
        Ok(reset)
    }

    /// Fetch a single record by URL.
    pub fn get(&self, url: &str) -> Result<Option<Record>> {
        let conn = self.connect()?;
        let record = conn
            .query_row(
                r#"
                SELECT url, COALESCE(title, ''), COALESCE(text, ''), COALESCE(website, ''),
                       CAST(time AS INTEGER), COALESCE(label, '')
                FROM data WHERE url = ?1
                "#,
                params![url],
                |row| {
                    Ok(Record {
                        url: row.get(0)?,
                        title: row.get(1)?,
                        text: row.get(2)?,
                        website: row.get(3)?,
                        time: row.get(4)?,
                        label: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Last stored failure for a URL, if any.
    pub fn last_error(&self, url: &str) -> Result<Option<(u32, Option<String>)>> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                "SELECT attempts, last_error FROM data WHERE url = ?1",
                params![url],
                |row| Ok((row.get::<_, u32>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    /// Row counts by enrichment state.
    pub fn stats(&self, max_attempts: u32) -> Result<RecordStats> {
        let conn = self.connect()?;
        let (total, unenriched, exhausted): (i64, i64, i64) = conn.query_row(
            &format!(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(CASE WHEN {UNENRICHED} THEN 1 ELSE 0 END), 0),
                       COALESCE(SUM(CASE WHEN {UNENRICHED} AND attempts >= ?1 THEN 1 ELSE 0 END), 0)
                FROM data
                "#
            ),
            params![max_attempts],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(RecordStats {
            total: total as u64,
            enriched: (total - unenriched) as u64,
            pending: (unenriched - exhausted) as u64,
            exhausted: exhausted as u64,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Written {
    Enriched,
    Failed,
    Unchanged,
}

fn write_enrichment(conn: &Connection, url: &str, title: &str, text: &str) -> Result<Written> {
    let changed = conn.execute(
        &format!(
            r#"
            UPDATE data SET
                title = CASE WHEN COALESCE(title, '') = '' THEN ?2 ELSE title END,
                text = CASE WHEN COALESCE(text, '') = '' THEN ?3 ELSE text END,
                attempts = attempts + 1,
                last_error = NULL
            WHERE url = ?1 AND {UNENRICHED}
              AND (COALESCE(title, '') <> '' OR ?2 <> '')
              AND (COALESCE(text, '') <> '' OR ?3 <> '')
            "#
        ),
        params![url, title, text],
    )?;
    if changed > 0 {
        return Ok(Written::Enriched);
    }

    // Nothing written: either the row is gone or already enriched, or the
    // fetched page could not fill both fields
    let reason = if title.is_empty() {
        "page has no title"
    } else {
        "page has no text"
    };
    if write_failure(conn, url, reason)? > 0 {
        Ok(Written::Failed)
    } else {
        Ok(Written::Unchanged)
    }
}

fn write_failure(conn: &Connection, url: &str, error: &str) -> Result<usize> {
    let changed = conn.execute(
        &format!(
            "UPDATE data SET attempts = attempts + 1, last_error = ?2 WHERE url = ?1 AND {UNENRICHED}"
        ),
        params![url, error],
    )?;
    Ok(changed)
}

fn table_columns(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("PRAGMA table_info(data)")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}
