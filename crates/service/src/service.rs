use crate::{Connection, Cursor, CursorOptions, Database, ErrorEnvelope, ServiceConfig, ServiceError};
use curds_rows::{ColumnDescriptor, Row, ShapedRecord};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Operation name passed to `Cursor::execute`, and the default RPC method.
pub const DBPROCESS: &str = "dbprocess";

/// A JSONRPC-style request mapping; `run` adds `result` or `error` to it.
pub type Request = Map<String, JsonValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorResult {
    pub description: Vec<ColumnDescriptor>,
    pub rows: Vec<ShapedRecord>,
}

/// `{"cursor": {"description": [...], "rows": [...]}}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DbProcessResult {
    pub cursor: CursorResult,
}

type Handler<D> = fn(&Service<D>, &[JsonValue], &CursorOptions) -> Result<JsonValue, ServiceError>;

fn dbprocess_handler<D: Database>(
    service: &Service<D>,
    args: &[JsonValue],
    options: &CursorOptions,
) -> Result<JsonValue, ServiceError> {
    let result = service.dbprocess(args, options)?;
    Ok(serde_json::to_value(result)?)
}

/// Serves database calls for one configured database identifier.
///
/// Cursor options travel with each call; the service keeps no per-request
/// state, so one instance can serve requests from several callers.
pub struct Service<D: Database> {
    db: D,
    database: String,
    cursor: CursorOptions,
    methods: HashMap<&'static str, Handler<D>>,
}

impl<D: Database> Service<D> {
    pub fn new(db: D, config: ServiceConfig) -> Result<Self, ServiceError> {
        if config.database.is_empty() {
            return Err(ServiceError::Configuration);
        }
        let mut methods: HashMap<&'static str, Handler<D>> = HashMap::new();
        methods.insert(DBPROCESS, dbprocess_handler::<D>);
        Ok(Self {
            db,
            database: config.database,
            cursor: config.cursor,
            methods,
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Options used when a request does not bring its own.
    pub fn default_cursor_options(&self) -> &CursorOptions {
        &self.cursor
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Connect, run `dbprocess` with the command tokens in `args[0]`, drain
    /// the cursor and close the connection.
    ///
    /// The connection is closed on every path out of here, including a
    /// failed execute or a cursor that errors halfway through.
    pub fn dbprocess(&self, args: &[JsonValue], options: &CursorOptions) -> Result<DbProcessResult, ServiceError> {
        let cmds = command_tokens(args)?;
        let (description, raw) = {
            let conn = self.db.connect(&self.database)?;
            let mut cursor = conn.cursor(options)?;
            let nrecs = cursor.execute(DBPROCESS, std::slice::from_ref(&cmds))?;
            let description = cursor.description().to_vec();
            let rows = cursor.by_ref().collect::<Result<Vec<Row>, _>>()?;
            debug!(
                "dbprocess on {}: {} commands, {} records, {} rows",
                self.database,
                cmds.len(),
                nrecs,
                rows.len()
            );
            (description, rows)
        };
        let rows = raw
            .into_iter()
            .map(|row| ShapedRecord::from_row(options.row_factory, &description, row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DbProcessResult {
            cursor: CursorResult { description, rows },
        })
    }

    /// Invoke the method registered under `method`.
    pub fn execute(&self, args: &[JsonValue], method: &str, options: &CursorOptions) -> Result<JsonValue, ServiceError> {
        let handler = self
            .methods
            .get(method)
            .ok_or_else(|| ServiceError::MethodNotFound(method.to_string()))?;
        handler(self, args, options)
    }

    /// Turn a request into a reply. Never fails: a failure while handling
    /// the request lands under `error` instead of `result`.
    pub fn run(&self, mut request: Request) -> Request {
        request.remove("result");
        request.remove("error");
        match self.process(&mut request) {
            Ok(result) => {
                request.insert("result".to_string(), result);
            }
            Err(e) => {
                warn!("request failed ({}): {}", e.kind(), e);
                let envelope = ErrorEnvelope::from(&e);
                request.insert("error".to_string(), error_json(&envelope));
            }
        }
        request
    }

    /// Like [`Service::run`] for a request that has not been checked to be
    /// a mapping yet.
    pub fn run_value(&self, request: JsonValue) -> JsonValue {
        match request {
            JsonValue::Object(map) => JsonValue::Object(self.run(map)),
            _ => {
                let e = ServiceError::invalid("request", "expected a JSON object");
                warn!("request failed ({}): {}", e.kind(), e);
                let mut reply = Map::new();
                reply.insert("error".to_string(), error_json(&ErrorEnvelope::from(&e)));
                JsonValue::Object(reply)
            }
        }
    }

    fn process(&self, request: &mut Request) -> Result<JsonValue, ServiceError> {
        let method = match request.get("method") {
            None => DBPROCESS.to_string(),
            Some(JsonValue::String(m)) => m.clone(),
            Some(_) => return Err(ServiceError::invalid("method", "expected a string")),
        };
        let params = request
            .remove("params")
            .ok_or(ServiceError::MissingParameter("params"))?;
        let JsonValue::Object(mut params) = params else {
            return Err(ServiceError::invalid("params", "expected a mapping"));
        };
        let args = match params.remove("args") {
            None => Vec::new(),
            Some(JsonValue::Array(a)) => a,
            Some(_) => return Err(ServiceError::invalid("args", "expected a list")),
        };
        let options = match params.remove("cursor") {
            None => self.cursor.clone(),
            Some(v) => CursorOptions::from_json(v)?,
        };
        self.execute(&args, &method, &options)
    }
}

fn error_json(envelope: &ErrorEnvelope) -> JsonValue {
    // two string fields, so this never fails
    serde_json::to_value(envelope).unwrap_or_default()
}

/// `args[0]` as command tokens; numbers are accepted and rendered as text.
fn command_tokens(args: &[JsonValue]) -> Result<Vec<String>, ServiceError> {
    let Some(JsonValue::Array(tokens)) = args.first() else {
        return Err(ServiceError::invalid(
            "args",
            "expected a list of command tokens as the first argument",
        ));
    };
    tokens
        .iter()
        .map(|t| match t {
            JsonValue::String(s) => Ok(s.clone()),
            JsonValue::Number(n) => Ok(n.to_string()),
            other => Err(ServiceError::invalid("args", format!("cannot use {} as a command", other))),
        })
        .collect()
}
