use crate::{CursorOptions, DatabaseError};
use curds_rows::{ColumnDescriptor, Row};

/// A database reachable by identifier (a path, a URL, a name).
pub trait Database {
    type Connection: Connection;

    fn connect(&self, identifier: &str) -> Result<Self::Connection, DatabaseError>;
}

/// An open connection. Dropping it closes it.
pub trait Connection {
    type Cursor<'c>: Cursor
    where
        Self: 'c;

    fn cursor(&self, options: &CursorOptions) -> Result<Self::Cursor<'_>, DatabaseError>;
}

/// Iterating a cursor yields the rows of the last `execute`, in result order.
pub trait Cursor: Iterator<Item = Result<Row, DatabaseError>> {
    /// Run `operation` with `args`; returns the record count and fills in
    /// [`Cursor::description`].
    fn execute(&mut self, operation: &str, args: &[Vec<String>]) -> Result<usize, DatabaseError>;

    fn description(&self) -> &[ColumnDescriptor];
}
