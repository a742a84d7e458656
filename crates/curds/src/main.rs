use anyhow::Context;
use clap::Parser;
use curds_ext_sqlite::SqliteDatabase;
use curds_service::rows::RowFactoryKind;
use curds_service::{CursorOptions, Database, ErrorEnvelope, Service, ServiceConfig};
use serde_json::{Value as JsonValue, json};
use std::io::{self, BufRead, Write};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    name = "curds",
    version,
    about = "Serve dbprocess requests as JSONRPC",
    disable_help_subcommand = true
)]
struct Cli {
    /// SQLite database file to run requests against
    #[arg(short = 'd', long = "db", env = "CURDS_DB", value_name = "PATH")]
    db: Option<String>,

    /// Row factory for requests that bring no cursor options
    /// (named_tuple, ordered_dict, utc_ordered_dict, sql_values)
    #[arg(short = 'f', long = "row-factory", value_name = "NAME")]
    row_factory: Option<RowFactoryKind>,

    /// Return time columns as timestamps for requests that bring no cursor options
    #[arg(long = "convert-datetime")]
    convert_datetime: bool,

    /// Handle this one JSON request instead of reading requests from stdin
    #[arg(short = 'r', long = "request", value_name = "JSON")]
    request: Option<String>,
}

/// Parse one request line and run it; unparseable input still gets a reply.
fn handle_line<D: Database>(service: &Service<D>, line: &str) -> JsonValue {
    match serde_json::from_str::<JsonValue>(line) {
        Ok(request) => service.run_value(request),
        Err(e) => json!({ "error": ErrorEnvelope::new(e.to_string(), "ParseError") }),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "curds=info,curds_service=info,curds_ext_sqlite=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cursor = CursorOptions::default()
        .set_row_factory(cli.row_factory)
        .set_convert_datetime(cli.convert_datetime);
    let config = ServiceConfig::new(cli.db.unwrap_or_default()).set_cursor_options(cursor);
    let service = Service::new(SqliteDatabase::new(), config).context("cannot start service")?;

    if let Some(request) = cli.request.as_deref() {
        println!("{}", handle_line(&service, request));
        return Ok(());
    }

    info!("serving {} from stdin", service.database());
    let mut out = io::stdout().lock();
    for line in io::stdin().lock().lines() {
        let line = line.context("cannot read request")?;
        if line.trim().is_empty() {
            continue;
        }
        writeln!(out, "{}", handle_line(&service, &line))?;
        out.flush()?;
    }
    Ok(())
}
