//! curds_service: run a `dbprocess` call as a JSONRPC-style method.
//! - `driver` holds the traits a database backend implements
//! - `Service` opens a connection per call, drains the cursor and shapes rows
//! - `run` turns a request mapping into a reply carrying `result` or `error`

pub mod config;
pub mod driver;
mod error;
mod service;

pub use config::{CursorOptions, ServiceConfig};
pub use driver::{Connection, Cursor, Database};
pub use error::{DatabaseError, ErrorEnvelope, ServiceError};
pub use service::{CursorResult, DBPROCESS, DbProcessResult, Request, Service};

pub use curds_rows as rows;
