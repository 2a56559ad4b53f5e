//! SQLite-backed relational store

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::errors::{StoreError, StoreResult};
use super::RelationalStore;
use crate::sql::quote_ident;

/// Store backed by a single SQLite connection
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a database file
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".to_string(),
            source,
        })?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RelationalStore for SqliteStore {
    fn table_exists(&self, name: &str) -> StoreResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master
                 WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE",
                params![name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn table_columns(&self, name: &str) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
        let rows = stmt.query_map(params![name], |row| row.get::<_, String>(0))?;
        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        Ok(columns)
    }

    fn level_counts(&self, query: &str) -> StoreResult<Vec<(Option<String>, u64)>> {
        let mut stmt = self.conn.prepare(query)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut counts = Vec::new();
        for row in rows {
            let (level, count) = row?;
            let count = u64::try_from(count)
                .map_err(|_| StoreError::InvalidCount {
                    level: level.clone(),
                    count,
                })?;
            counts.push((level, count));
        }
        Ok(counts)
    }

    fn row_count(&self, table: &str) -> StoreResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn execute(&mut self, statement: &str) -> StoreResult<()> {
        self.conn.execute_batch(statement)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch(
                "CREATE TABLE events (id INTEGER PRIMARY KEY, label TEXT);
                 INSERT INTO events (label) VALUES ('a'), ('a'), ('b'), (NULL);",
            )
            .unwrap();
        store
    }

    #[test]
    fn test_table_exists() {
        let store = store();
        assert!(store.table_exists("events").unwrap());
        assert!(store.table_exists("EVENTS").unwrap());
        assert!(!store.table_exists("missing").unwrap());
    }

    #[test]
    fn test_table_columns_in_schema_order() {
        let store = store();
        assert_eq!(
            store.table_columns("events").unwrap(),
            vec!["id".to_string(), "label".to_string()]
        );
        assert!(store.table_columns("missing").unwrap().is_empty());
    }

    #[test]
    fn test_level_counts_and_row_count() {
        let store = store();
        let mut counts = store
            .level_counts("SELECT label, COUNT(*) FROM events GROUP BY label")
            .unwrap();
        counts.sort();
        assert_eq!(
            counts,
            vec![(None, 1), (Some("a".to_string()), 2), (Some("b".to_string()), 1)]
        );
        assert_eq!(store.row_count("events").unwrap(), 4);
    }

    #[test]
    fn test_execute_creates_table() {
        let mut store = store();
        store
            .execute("CREATE TABLE copy AS SELECT * FROM events")
            .unwrap();
        assert!(store.table_exists("copy").unwrap());
        assert!(store.execute("NOT SQL").is_err());
    }
}
