//! SQLite backend for curds.
//!
//! `dbprocess` command lists are planned into a single `SELECT` (see
//! [`dbprocess`]) and run against a read-only connection. Rows are read
//! in full at execute time.

pub mod dbprocess;

use curds_service::rows::time::utc_datetime;
use curds_service::rows::{ColumnDescriptor, Row, Value};
use curds_service::{Connection, Cursor, CursorOptions, DBPROCESS, Database, DatabaseError};
use rusqlite::OpenFlags;
use rusqlite::types::ValueRef;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

const BUSY_TIMEOUT_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    busy_timeout: Duration,
}

impl Default for SqliteDatabase {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(BUSY_TIMEOUT_MS),
        }
    }
}

impl SqliteDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }
}

impl Database for SqliteDatabase {
    type Connection = SqliteConnection;

    /// Open the database file at `identifier` read-only.
    fn connect(&self, identifier: &str) -> Result<SqliteConnection, DatabaseError> {
        let connect_err = |e: rusqlite::Error| DatabaseError::Connect {
            identifier: identifier.to_string(),
            message: e.to_string(),
        };
        let conn = rusqlite::Connection::open_with_flags(identifier, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(connect_err)?;
        conn.busy_timeout(self.busy_timeout).map_err(connect_err)?;
        debug!("opened {}", identifier);
        Ok(SqliteConnection { conn })
    }
}

/// Closed when dropped.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl Connection for SqliteConnection {
    type Cursor<'c> = SqliteCursor<'c>;

    fn cursor(&self, options: &CursorOptions) -> Result<SqliteCursor<'_>, DatabaseError> {
        Ok(SqliteCursor {
            conn: &self.conn,
            convert_datetime: options.convert_datetime,
            description: Vec::new(),
            rows: VecDeque::new(),
        })
    }
}

pub struct SqliteCursor<'c> {
    conn: &'c rusqlite::Connection,
    convert_datetime: bool,
    description: Vec<ColumnDescriptor>,
    rows: VecDeque<Row>,
}

impl SqliteCursor<'_> {
    fn read_row(&self, description: &[ColumnDescriptor], row: &rusqlite::Row<'_>) -> Result<Row, DatabaseError> {
        let mut values = Vec::with_capacity(description.len());
        for (i, col) in description.iter().enumerate() {
            let v = value_from_ref(row.get_ref(i).map_err(fetch_err)?);
            let v = if self.convert_datetime && col.type_code.is_time() && !v.is_null() {
                utc_datetime(v).map_err(|e| DatabaseError::Fetch(format!("{}: {}", col.name, e)))?
            } else {
                v
            };
            values.push(v);
        }
        Ok(values)
    }
}

impl Cursor for SqliteCursor<'_> {
    fn execute(&mut self, operation: &str, args: &[Vec<String>]) -> Result<usize, DatabaseError> {
        if operation != DBPROCESS {
            return Err(DatabaseError::Execute(format!("unsupported operation: {}", operation)));
        }
        let cmds = args
            .first()
            .ok_or_else(|| DatabaseError::Execute("dbprocess expects a command list".into()))?;
        let conn = self.conn;
        let query = dbprocess::plan(conn, cmds)?;
        debug!("dbprocess sql: {}", query.sql);

        let mut stmt = conn.prepare(&query.sql).map_err(execute_err)?;
        let mut rows = stmt.query([]).map_err(execute_err)?;
        let mut out = VecDeque::new();
        while let Some(row) = rows.next().map_err(fetch_err)? {
            out.push_back(self.read_row(&query.description, row)?);
        }

        self.description = query.description;
        self.rows = out;
        Ok(self.rows.len())
    }

    fn description(&self) -> &[ColumnDescriptor] {
        &self.description
    }
}

impl Iterator for SqliteCursor<'_> {
    type Item = Result<Row, DatabaseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.pop_front().map(Ok)
    }
}

fn value_from_ref(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Float(f),
        // SQLite does not enforce UTF-8 in TEXT cells; keep such bytes intact
        ValueRef::Text(t) => match std::str::from_utf8(t) {
            Ok(s) => Value::Text(s.to_string()),
            Err(_) => Value::Blob(t.to_vec()),
        },
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

pub(crate) fn execute_err(e: rusqlite::Error) -> DatabaseError {
    DatabaseError::Execute(e.to_string())
}

fn fetch_err(e: rusqlite::Error) -> DatabaseError {
    DatabaseError::Fetch(e.to_string())
}
