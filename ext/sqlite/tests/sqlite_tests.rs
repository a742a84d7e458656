use curds_ext_sqlite::SqliteDatabase;
use curds_service::rows::{ColumnDescriptor, TypeCode, Value};
use curds_service::{
    Connection, Cursor, CursorOptions, Database, DatabaseError, Request, Service, ServiceConfig,
};
use serde_json::{Value as JsonValue, json};
use std::time::Duration;
use tempfile::TempDir;

const SCHEMA: &str = "
    CREATE TABLE origin (orid INTEGER, evid INTEGER, lat REAL, lon REAL, time TIME, auth VARCHAR(15));
    CREATE TABLE event (evid INTEGER, evname VARCHAR(15));
    INSERT INTO origin VALUES (1, 10, 34.9, -106.5, 1000000000.5, 'ANF');
    INSERT INTO origin VALUES (2, 10, 35.0, -106.4, 1000000060.0, 'O''Neil');
    INSERT INTO origin VALUES (3, 20, -12.1, 77.0, NULL, 'NEIC');
    INSERT INTO event VALUES (10, 'socorro');
    INSERT INTO event VALUES (20, 'lima');
    CREATE TABLE stamp (id INTEGER, created DATETIME, day DATE);
    INSERT INTO stamp VALUES (1, '2026-10-15 18:05:22', '2026-10-15');
    INSERT INTO stamp VALUES (2, NULL, NULL);
    CREATE TABLE note (id INTEGER, body TEXT);
    INSERT INTO note VALUES (1, CAST(X'61FF62' AS TEXT));
    INSERT INTO note VALUES (2, 'plain');
";

fn fixture() -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.db");
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    (dir, path.to_string_lossy().into_owned())
}

fn run_cmds(path: &str, cmds: &[&str], options: &CursorOptions) -> Result<(Vec<ColumnDescriptor>, Vec<Vec<Value>>), DatabaseError> {
    let conn = SqliteDatabase::new().connect(path)?;
    let mut cursor = conn.cursor(options)?;
    let cmds: Vec<String> = cmds.iter().map(|c| c.to_string()).collect();
    let n = cursor.execute("dbprocess", &[cmds])?;
    let description = cursor.description().to_vec();
    let rows = cursor.by_ref().collect::<Result<Vec<_>, _>>()?;
    assert_eq!(n, rows.len());
    Ok((description, rows))
}

fn request(value: JsonValue) -> Request {
    match value {
        JsonValue::Object(m) => m,
        _ => panic!("request must be an object"),
    }
}

#[test]
fn dbopen_describes_single_table() {
    let (_dir, path) = fixture();
    let (desc, rows) = run_cmds(&path, &["dbopen origin"], &CursorOptions::default()).unwrap();
    let names: Vec<&str> = desc.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["orid", "evid", "lat", "lon", "time", "auth"]);
    assert_eq!(desc[0].type_code, TypeCode::INTEGER);
    assert_eq!(desc[2].type_code, TypeCode::REAL);
    assert_eq!(desc[4].type_code, TypeCode::TIME);
    assert_eq!(desc[5].type_code, TypeCode::STRING);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], Value::Integer(1));
    assert_eq!(rows[0][4], Value::Float(1000000000.5));
    assert_eq!(rows[2][4], Value::Null);
}

#[test]
fn subset_and_reverse_sort() {
    let (_dir, path) = fixture();
    let (_, rows) = run_cmds(
        &path,
        &["dbopen origin", "dbsubset lat > 0", "dbsort -r orid"],
        &CursorOptions::default(),
    )
    .unwrap();
    let orids: Vec<&Value> = rows.iter().map(|r| &r[0]).collect();
    assert_eq!(orids, vec![&Value::Integer(2), &Value::Integer(1)]);
}

#[test]
fn join_names_columns_by_table() {
    let (_dir, path) = fixture();
    let (desc, rows) = run_cmds(
        &path,
        &["dbopen origin", "dbjoin event", "dbsort origin.orid"],
        &CursorOptions::default(),
    )
    .unwrap();
    assert_eq!(desc.len(), 8);
    assert_eq!(desc[0].name, "origin.orid");
    assert_eq!(desc[7].name, "event.evname");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2][7], Value::from("lima"));
}

#[test]
fn convert_datetime_turns_time_columns_into_timestamps() {
    let (_dir, path) = fixture();
    let options = CursorOptions::default().set_convert_datetime(true);
    let (_, rows) = run_cmds(&path, &["dbopen origin", "dbsort orid"], &options).unwrap();
    assert!(matches!(rows[0][4], Value::Time(_)));
    assert_eq!(rows[2][4], Value::Null);
    assert_eq!(rows[0][2], Value::Float(34.9));
}

#[test]
fn bad_pipelines_fail() {
    let (_dir, path) = fixture();
    let opts = CursorOptions::default();
    for cmds in [
        &["dbopen nosuchtable"][..],
        &["dbjoin event"][..],
        &["dbopen origin", "dbopen event"][..],
        &["dbopen origin", "dbfrobnicate"][..],
        &["dbopen origin", "dbsubset nosuchcolumn > 1"][..],
        &[][..],
    ] {
        let err = run_cmds(&path, cmds, &opts).unwrap_err();
        assert!(matches!(err, DatabaseError::Execute(_)), "{cmds:?}: {err}");
    }
}

#[test]
fn missing_database_fails_to_connect() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.db");
    let err = SqliteDatabase::new()
        .connect(&path.to_string_lossy())
        .err()
        .unwrap();
    assert!(matches!(err, DatabaseError::Connect { .. }));
}

#[test]
fn service_runs_against_sqlite() {
    let (_dir, path) = fixture();
    let svc = Service::new(SqliteDatabase::new(), ServiceConfig::new(path)).unwrap();

    let reply = svc.run(request(json!({
        "method": "dbprocess",
        "params": {"args": [["dbopen event", "dbsort evid"]], "cursor": {}}
    })));
    assert_eq!(
        reply["result"],
        json!({"cursor": {
            "description": [["evid", 2], ["evname", 3]],
            "rows": [[10, "socorro"], [20, "lima"]]
        }})
    );

    let reply = svc.run(request(json!({
        "params": {
            "args": [["dbopen origin", "dbjoin event", "dbsubset origin.orid == 2"]],
            "cursor": {"row_factory": "named_tuple"}
        }
    })));
    let row = &reply["result"]["cursor"]["rows"][0];
    assert_eq!(row["origin_auth"], json!("O'Neil"));
    assert_eq!(row["event_evname"], json!("socorro"));

    let reply = svc.run(request(json!({
        "params": {
            "args": [["dbopen origin", "dbsubset orid == 2"]],
            "cursor": {"row_factory": "sql_values"}
        }
    })));
    assert_eq!(
        reply["result"]["cursor"]["rows"],
        json!([["2", "10", "35.0", "-106.4", "1000000060", "'O''Neil'"]])
    );

    let reply = svc.run(request(json!({
        "params": {
            "args": [["dbopen origin", "dbsubset orid == 1"]],
            "cursor": {"row_factory": "utc_ordered_dict"}
        }
    })));
    assert_eq!(
        reply["result"]["cursor"]["rows"][0]["time"],
        json!("2001-09-09T01:46:40.500000Z")
    );
}

#[test]
fn service_reports_sqlite_errors() {
    let (_dir, path) = fixture();
    let svc = Service::new(SqliteDatabase::new(), ServiceConfig::new(path)).unwrap();
    let reply = svc.run(request(json!({"params": {"args": [["dbopen nosuchtable"]]}})));
    assert!(!reply.contains_key("result"));
    assert_eq!(reply["error"]["type"], json!("DatabaseError"));
    assert_eq!(reply["error"]["message"], json!("execute failed: no such table: nosuchtable"));
}

#[test]
fn sql_date_time_text_converts() {
    let (_dir, path) = fixture();
    let options = CursorOptions::default().set_convert_datetime(true);
    let (desc, rows) = run_cmds(&path, &["dbopen stamp", "dbsort id"], &options).unwrap();
    assert!(desc[1].type_code.is_time());
    assert!(desc[2].type_code.is_time());
    assert!(matches!(rows[0][1], Value::Time(_)));
    assert!(matches!(rows[0][2], Value::Time(_)));
    assert_eq!(rows[1][1], Value::Null);

    let svc = Service::new(SqliteDatabase::new(), ServiceConfig::new(path)).unwrap();
    let reply = svc.run(request(json!({
        "params": {
            "args": [["dbopen stamp", "dbsubset id == 1"]],
            "cursor": {"row_factory": "utc_ordered_dict"}
        }
    })));
    assert_eq!(
        reply["result"]["cursor"]["rows"],
        json!([{
            "id": 1,
            "created": "2026-10-15T18:05:22.000000Z",
            "day": "2026-10-15T00:00:00.000000Z"
        }])
    );
}

#[test]
fn invalid_utf8_text_comes_back_as_bytes() {
    let (_dir, path) = fixture();
    let (_, rows) = run_cmds(&path, &["dbopen note", "dbsort id"], &CursorOptions::default()).unwrap();
    assert_eq!(rows[0][1], Value::Blob(vec![0x61, 0xff, 0x62]));
    assert_eq!(rows[1][1], Value::from("plain"));

    let svc = Service::new(SqliteDatabase::new(), ServiceConfig::new(path)).unwrap();
    let reply = svc.run(request(json!({
        "params": {
            "args": [["dbopen note", "dbsubset id == 1"]],
            "cursor": {"row_factory": "sql_values"}
        }
    })));
    assert_eq!(reply["error"]["type"], json!("ValueConversionError"));
}

#[test]
fn busy_timeout_is_configurable() {
    let (_dir, path) = fixture();
    let db = SqliteDatabase::new().set_busy_timeout(Duration::from_millis(5));
    let svc = Service::new(db, ServiceConfig::new(path)).unwrap();
    let reply = svc.run(request(json!({"params": {"args": [["dbopen event"]]}})));
    assert_eq!(reply["result"]["cursor"]["rows"], json!([[10, "socorro"], [20, "lima"]]));
}
