use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::domain::model::TitleRecord;
use crate::domain::ports::TitleStore;
use crate::utils::error::{DigestError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS movies (
        title          TEXT NOT NULL PRIMARY KEY,
        original_title TEXT,
        catalog_id     TEXT,
        first_showing  TEXT NOT NULL,
        latest_showing TEXT NOT NULL
    );
";

/// Title registry on a single SQLite connection. Every call takes the
/// connection lock, so writers are serialized.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        tracing::debug!("🗄️ Opened title registry at {}", path.as_ref().display());
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DigestError::ProcessingError {
            message: "title registry lock poisoned".to_string(),
        })
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(title: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| DigestError::ProcessingError {
        message: format!("stored date {:?} for {:?} is invalid: {}", raw, title, e),
    })
}

impl TitleStore for SqliteStore {
    fn get(&self, title: &str) -> Result<Option<TitleRecord>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT original_title, catalog_id, first_showing, latest_showing
                 FROM movies WHERE title = ?1",
                params![title],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((secondary_title, catalog_id, first, latest)) = row else {
            return Ok(None);
        };

        Ok(Some(TitleRecord {
            title: title.to_string(),
            first_seen: parse_date(title, &first)?,
            last_seen: parse_date(title, &latest)?,
            // older registries stored "" for "unknown"
            secondary_title: secondary_title.filter(|s| !s.is_empty()),
            catalog_id: catalog_id.filter(|s| !s.is_empty()),
        }))
    }

    fn insert(&self, record: &TitleRecord) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO movies (title, original_title, catalog_id, first_showing, latest_showing)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.title,
                record.secondary_title,
                record.catalog_id,
                format_date(record.first_seen),
                format_date(record.last_seen),
            ],
        )?;
        Ok(())
    }

    fn reset_dates(&self, title: &str, date: NaiveDate) -> Result<()> {
        let conn = self.conn()?;
        let day = format_date(date);
        conn.execute(
            "UPDATE movies SET first_showing = ?1, latest_showing = ?1 WHERE title = ?2",
            params![day, title],
        )?;
        Ok(())
    }

    fn touch(&self, title: &str, date: NaiveDate) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE movies SET latest_showing = ?1 WHERE title = ?2",
            params![format_date(date), title],
        )?;
        Ok(())
    }

    fn set_enrichment(
        &self,
        title: &str,
        secondary_title: Option<&str>,
        catalog_id: &str,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE movies SET original_title = ?1, catalog_id = ?2 WHERE title = ?3",
            params![secondary_title, catalog_id, title],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_insert_and_get_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert(&TitleRecord::first_seen_on("ANORA", date(2026, 10, 1)))
            .unwrap();

        let record = store.get("ANORA").unwrap().unwrap();
        assert_eq!(record.first_seen, date(2026, 10, 1));
        assert_eq!(record.secondary_title, None);
        assert!(store.get("FLOW").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_insert_is_a_store_error() {
        let store = SqliteStore::in_memory().unwrap();
        let record = TitleRecord::first_seen_on("ANORA", date(2026, 10, 1));
        store.insert(&record).unwrap();

        let err = store.insert(&record).unwrap_err();
        assert!(matches!(err, DigestError::Store(_)));
    }

    #[test]
    fn test_touch_reset_and_enrichment() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert(&TitleRecord::first_seen_on("FLOW", date(2026, 9, 1)))
            .unwrap();

        store.touch("FLOW", date(2026, 9, 2)).unwrap();
        let record = store.get("FLOW").unwrap().unwrap();
        assert_eq!(record.first_seen, date(2026, 9, 1));
        assert_eq!(record.last_seen, date(2026, 9, 2));

        store.reset_dates("FLOW", date(2026, 10, 16)).unwrap();
        store
            .set_enrichment("FLOW", Some("Straume"), "Straume-2024-10052360")
            .unwrap();
        let record = store.get("FLOW").unwrap().unwrap();
        assert_eq!(record.first_seen, date(2026, 10, 16));
        assert_eq!(record.last_seen, date(2026, 10, 16));
        assert_eq!(record.secondary_title.as_deref(), Some("Straume"));
        assert_eq!(record.catalog_id.as_deref(), Some("Straume-2024-10052360"));
    }

    #[test]
    fn test_schema_creation_is_idempotent_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("movies.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .insert(&TitleRecord::first_seen_on("ANORA", date(2026, 10, 1)))
                .unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("ANORA").unwrap().unwrap().first_seen,
            date(2026, 10, 1)
        );
    }

    #[test]
    fn test_legacy_empty_original_title_reads_as_none() {
        let store = SqliteStore::in_memory().unwrap();
        {
            let conn = store.conn().unwrap();
            conn.execute(
                "INSERT INTO movies (title, original_title, first_showing, latest_showing)
                 VALUES ('KONKLAWE', '', '2026-10-01', '2026-10-15')",
                [],
            )
            .unwrap();
        }
        let record = store.get("KONKLAWE").unwrap().unwrap();
        assert_eq!(record.secondary_title, None);
        assert_eq!(record.last_seen, date(2026, 10, 15));
    }
}
