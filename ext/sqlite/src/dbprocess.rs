//! Plan a `dbprocess` command list as one SQL query.
//!
//! Each token is one command, verb first:
//!
//! | command                 | effect                                        |
//! |-------------------------|-----------------------------------------------|
//! | `dbopen <table>`        | start the view from `table` (must be first)   |
//! | `dbjoin <table>`        | join on shared column names, cross join if none |
//! | `dbsubset <expr>`       | keep rows matching the SQL expression `expr`  |
//! | `dbsort [-r] <key> ...` | order by the keys, descending with `-r`       |
//!
//! A single-table view names its columns plainly; once joined, every column
//! is named `table.column`.

use crate::execute_err;
use curds_service::DatabaseError;
use curds_service::rows::{ColumnDescriptor, TypeCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(String),
    Join(String),
    Subset(String),
    Sort { keys: Vec<String>, reverse: bool },
}

impl Command {
    pub fn parse(token: &str) -> Result<Command, DatabaseError> {
        let token = token.trim();
        let (verb, rest) = match token.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (token, ""),
        };
        let need_arg = |what: &str| {
            if rest.is_empty() {
                Err(DatabaseError::Execute(format!("{}: missing {}", verb, what)))
            } else {
                Ok(rest.to_string())
            }
        };
        match verb {
            "dbopen" => Ok(Command::Open(table_name(&need_arg("table name")?)?)),
            "dbjoin" => Ok(Command::Join(table_name(&need_arg("table name")?)?)),
            "dbsubset" => Ok(Command::Subset(need_arg("expression")?)),
            "dbsort" => {
                let mut reverse = false;
                let mut keys = Vec::new();
                for word in rest.split_whitespace() {
                    if word == "-r" {
                        reverse = true;
                    } else {
                        keys.push(sort_key(word)?);
                    }
                }
                if keys.is_empty() {
                    return Err(DatabaseError::Execute("dbsort: missing sort keys".into()));
                }
                Ok(Command::Sort { keys, reverse })
            }
            "" => Err(DatabaseError::Execute("empty command".into())),
            other => Err(DatabaseError::Execute(format!("unknown command: {}", other))),
        }
    }
}

/// The SQL to run and the description of what it returns.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub sql: String,
    pub description: Vec<ColumnDescriptor>,
}

struct Table {
    name: String,
    columns: Vec<(String, TypeCode)>,
}

impl Table {
    fn load(conn: &rusqlite::Connection, name: String) -> Result<Table, DatabaseError> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({})", quote(&name)))
            .map_err(execute_err)?;
        let columns = stmt
            .query_map([], |row| {
                let col: String = row.get(1)?;
                let decl: String = row.get(2)?;
                Ok((col, type_code_for(&decl)))
            })
            .map_err(execute_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(execute_err)?;
        if columns.is_empty() {
            return Err(DatabaseError::Execute(format!("no such table: {}", name)));
        }
        Ok(Table { name, columns })
    }

    fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|(c, _)| c == column)
    }
}

/// Build the query for `cmds` against the schema of `conn`.
pub fn plan(conn: &rusqlite::Connection, cmds: &[String]) -> Result<Query, DatabaseError> {
    let mut commands = cmds.iter().map(|c| Command::parse(c));
    let first = match commands.next() {
        Some(cmd) => cmd?,
        None => return Err(DatabaseError::Execute("empty command list".into())),
    };
    let Command::Open(base) = first else {
        return Err(DatabaseError::Execute("the first command must be dbopen".into()));
    };

    let mut tables = vec![Table::load(conn, base)?];
    let mut from = quote(&tables[0].name);
    let mut filters: Vec<String> = Vec::new();
    let mut order: Option<(Vec<String>, bool)> = None;

    for cmd in commands {
        match cmd? {
            Command::Open(_) => {
                return Err(DatabaseError::Execute("dbopen may only appear first".into()));
            }
            Command::Join(name) => {
                if tables.iter().any(|t| t.name == name) {
                    return Err(DatabaseError::Execute(format!("{} is already in the view", name)));
                }
                let table = Table::load(conn, name)?;
                let on: Vec<String> = table
                    .columns
                    .iter()
                    .filter_map(|(col, _)| {
                        tables.iter().find(|t| t.has_column(col)).map(|left| {
                            format!(
                                "{}.{} = {}.{}",
                                quote(&left.name),
                                quote(col),
                                quote(&table.name),
                                quote(col)
                            )
                        })
                    })
                    .collect();
                if on.is_empty() {
                    from.push_str(&format!(" CROSS JOIN {}", quote(&table.name)));
                } else {
                    from.push_str(&format!(" JOIN {} ON {}", quote(&table.name), on.join(" AND ")));
                }
                tables.push(table);
            }
            Command::Subset(expr) => filters.push(format!("({})", expr)),
            // the latest sort replaces any earlier one
            Command::Sort { keys, reverse } => order = Some((keys, reverse)),
        }
    }

    let joined = tables.len() > 1;
    let mut select = Vec::new();
    let mut description = Vec::new();
    for table in &tables {
        for (col, code) in &table.columns {
            let name = if joined {
                format!("{}.{}", table.name, col)
            } else {
                col.clone()
            };
            select.push(format!("{}.{} AS {}", quote(&table.name), quote(col), quote(&name)));
            description.push(ColumnDescriptor::new(name, *code));
        }
    }

    let mut sql = format!("SELECT {} FROM {}", select.join(", "), from);
    if !filters.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&filters.join(" AND "));
    }
    if let Some((keys, reverse)) = order {
        let dir = if reverse { " DESC" } else { "" };
        let keys: Vec<String> = keys
            .iter()
            .map(|k| format!("{}{}", quote_key(k), dir))
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&keys.join(", "));
    }
    Ok(Query { sql, description })
}

/// Map a declared SQLite column type onto a [`TypeCode`].
pub fn type_code_for(decl: &str) -> TypeCode {
    let decl = decl.to_ascii_uppercase();
    if decl.contains("TIME") || decl.contains("DATE") {
        TypeCode::TIME
    } else if decl.contains("INT") {
        TypeCode::INTEGER
    } else if decl.contains("CHAR") || decl.contains("CLOB") || decl.contains("TEXT") {
        TypeCode::STRING
    } else if decl.contains("BLOB") {
        TypeCode::BLOB
    } else if decl.contains("REAL") || decl.contains("FLOA") || decl.contains("DOUB") {
        TypeCode::REAL
    } else {
        TypeCode::UNKNOWN
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn table_name(s: &str) -> Result<String, DatabaseError> {
    if is_ident(s) {
        Ok(s.to_string())
    } else {
        Err(DatabaseError::Execute(format!("invalid table name: {}", s)))
    }
}

// `col` or `table.col`
fn sort_key(s: &str) -> Result<String, DatabaseError> {
    if s.split('.').count() <= 2 && s.split('.').all(is_ident) {
        Ok(s.to_string())
    } else {
        Err(DatabaseError::Execute(format!("invalid sort key: {}", s)))
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn quote_key(key: &str) -> String {
    key.split('.').map(quote).collect::<Vec<_>>().join(".")
}
