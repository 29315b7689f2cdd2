//! SQLite connection handle for the index database.
//!
//! The connection is protected by a `parking_lot::ReentrantMutex<RefCell<..>>`
//! so that `transaction()` can hold the lock while calling the closure, which
//! also needs to lock in order to execute SQL. Writer serialization itself is
//! SQLite's job, not this layer's.

use std::cell::{Cell, RefCell};

use parking_lot::ReentrantMutex;
use rusqlite::Connection;

use super::errors::{StorageError, StorageResult};
use super::sql::{value_to_sql, SqlParts};

/// Handle onto the SQLite database holding index tables and metadata.
pub struct Database {
    conn: ReentrantMutex<RefCell<Connection>>,
}

impl Database {
    /// Opens a file-backed index database.
    pub fn open(path: &str) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;",
        )?;
        Ok(Self {
            conn: ReentrantMutex::new(RefCell::new(conn)),
        })
    }

    /// Opens an in-memory index database (useful for tests).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: ReentrantMutex::new(RefCell::new(conn)),
        })
    }

    /// Execute `f` with a shared reference to the underlying connection.
    fn with_conn<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let guard = self.conn.lock();
        let conn = guard.borrow();
        f(&conn).map_err(StorageError::from)
    }

    /// Executes a DDL/DML fragment, returning the affected row count.
    pub fn execute(&self, parts: &SqlParts) -> StorageResult<usize> {
        self.check_balanced(parts)?;
        self.with_conn(|conn| {
            conn.execute(
                parts.sql(),
                rusqlite::params_from_iter(parts.parameters().iter().map(value_to_sql)),
            )
        })
    }

    /// Runs a query, mapping each row through `map`.
    pub fn query_rows<T, F>(&self, parts: &SqlParts, map: F) -> StorageResult<Vec<T>>
    where
        F: Fn(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    {
        self.check_balanced(parts)?;
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(parts.sql())?;
            let rows = stmt.query_map(
                rusqlite::params_from_iter(parts.parameters().iter().map(value_to_sql)),
                |row| map(row),
            )?;
            rows.collect()
        })
    }

    /// Runs a query whose first column is a document id.
    pub fn query_ids(&self, parts: &SqlParts) -> StorageResult<Vec<String>> {
        self.query_rows(parts, |row| row.get::<_, String>(0))
    }

    /// Runs `f` inside a transaction scope.
    ///
    /// Uses a SAVEPOINT so calls compose with outer transactions; each
    /// invocation gets a unique name. On `Err` the savepoint is rolled back
    /// and the error propagated unchanged, so the caller observes no partial
    /// state.
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StorageError>,
        F: FnOnce(&Database) -> Result<T, E>,
    {
        thread_local! {
            static SP_COUNTER: Cell<u64> = const { Cell::new(0) };
        }
        let sp_name = SP_COUNTER.with(|c| {
            let n = c.get();
            c.set(n + 1);
            format!("sp_{n}")
        });

        self.with_conn(|conn| conn.execute_batch(&format!("SAVEPOINT {sp_name}")))?;

        match f(self) {
            Ok(value) => {
                self.with_conn(|conn| {
                    conn.execute_batch(&format!("RELEASE SAVEPOINT {sp_name}"))
                })
                .map_err(|_| {
                    let _ = self.with_conn(|conn| {
                        conn.execute_batch(&format!("ROLLBACK TO SAVEPOINT {sp_name}"))
                    });
                    StorageError::Transaction(format!("RELEASE SAVEPOINT {sp_name} failed"))
                })?;
                Ok(value)
            }
            Err(e) => {
                let _ = self.with_conn(|conn| {
                    conn.execute_batch(&format!(
                        "ROLLBACK TO SAVEPOINT {sp_name}; RELEASE SAVEPOINT {sp_name}"
                    ))
                });
                Err(e)
            }
        }
    }

    fn check_balanced(&self, parts: &SqlParts) -> StorageResult<()> {
        if parts.is_balanced() {
            Ok(())
        } else {
            Err(StorageError::MalformedParts(format!(
                "{} placeholders, {} parameters: {}",
                parts.placeholder_count(),
                parts.parameters().len(),
                parts.sql()
            )))
        }
    }
}
