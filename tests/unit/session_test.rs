use crate::support::{build_database, numbers, users_and_orders};
use litefetch::error::LitefetchError;
use litefetch::session::{Session, TableMetadata};
use litefetch::shaper::CellValue;

fn opened(buffer: Vec<u8>) -> Session {
    let mut session = Session::new();
    session.open(buffer).unwrap();
    session
}

#[test]
fn select_one_returns_single_row() {
    let session = opened(users_and_orders());
    let result = session.execute("SELECT 1").unwrap();

    assert_eq!(result.columns, vec!["1".to_string()]);
    assert_eq!(result.rows, vec![vec![CellValue::Integer(1)]]);
    assert_eq!(
        result.into_table(),
        vec![vec![CellValue::from("1")], vec![CellValue::Integer(1)]]
    );
}

#[test]
fn default_cap_bounds_uncapped_queries() {
    let session = opened(numbers(40));
    let result = session.execute("SELECT n FROM nums ORDER BY n").unwrap();

    assert_eq!(result.rows.len(), 25);
    assert_eq!(result.limit_applied, Some(25));
    assert!(result.hit_cap());
    assert_eq!(result.rows[24], vec![CellValue::Integer(25)]);
}

#[test]
fn existing_limit_is_respected() {
    let session = opened(numbers(40));

    let upper = session.execute("SELECT n FROM nums LIMIT 10").unwrap();
    assert_eq!(upper.rows.len(), 10);
    assert_eq!(upper.limit_applied, None);
    assert!(!upper.hit_cap());

    let lower = session.execute("select n from nums limit 30;").unwrap();
    assert_eq!(lower.rows.len(), 30);
}

#[test]
fn trailing_semicolons_are_stripped_before_capping() {
    let session = opened(numbers(40));
    let result = session.execute("SELECT n FROM nums;;").unwrap();
    assert_eq!(result.rows.len(), 25);
}

#[test]
fn limit_word_in_literal_suppresses_cap() {
    let session = opened(numbers(40));
    let result = session
        .execute("SELECT 'no limit' AS label, n FROM nums")
        .unwrap();
    assert_eq!(result.rows.len(), 40);
    assert_eq!(result.limit_applied, None);
}

#[test]
fn custom_and_disabled_row_limits() {
    let mut session = Session::new().with_row_limit(Some(5));
    session.open(numbers(40)).unwrap();
    assert_eq!(session.execute("SELECT n FROM nums").unwrap().rows.len(), 5);

    let mut session = Session::new().with_row_limit(None);
    session.open(numbers(40)).unwrap();
    assert_eq!(session.execute("SELECT n FROM nums").unwrap().rows.len(), 40);
}

#[test]
fn execute_before_open_is_not_ready() {
    let session = Session::new();
    let err = session.execute("SELECT 1").unwrap_err();
    assert!(matches!(err, LitefetchError::NotReady), "got {err:?}");
}

#[test]
fn invalid_image_fails_initialization() {
    let mut session = Session::new();
    let garbage = b"definitely not a database image ".repeat(256);

    let err = session.open(garbage).unwrap_err();
    assert!(matches!(err, LitefetchError::Initialization { .. }), "got {err:?}");
    assert!(!session.is_ready());
    assert!(matches!(session.execute("SELECT 1"), Err(LitefetchError::NotReady)));
}

#[test]
fn failed_reopen_releases_previous_handle() {
    let mut session = opened(users_and_orders());
    assert!(session.is_ready());

    assert!(session.open(vec![0u8; 4096]).is_err());
    assert!(!session.is_ready());
    assert!(matches!(session.execute("SELECT 1"), Err(LitefetchError::NotReady)));
}

#[test]
fn reopen_replaces_dataset() {
    let mut session = opened(users_and_orders());
    session
        .open(build_database("CREATE TABLE metrics (ts INTEGER, value REAL);"))
        .unwrap();

    let schema = session.schema().unwrap();
    assert_eq!(
        schema,
        vec![TableMetadata {
            name: "metrics".to_string(),
            columns: vec!["ts".to_string(), "value".to_string()],
        }]
    );

    let err = session.execute("SELECT * FROM users").unwrap_err();
    assert!(matches!(err, LitefetchError::Query { .. }), "got {err:?}");
}

#[test]
fn query_error_keeps_session_usable() {
    let session = opened(users_and_orders());

    let err = session.execute("SELEC nonsense").unwrap_err();
    assert!(matches!(err, LitefetchError::Query { .. }), "got {err:?}");

    let err = session.execute("SELECT * FROM missing_table").unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("query:"), "Got: {msg}");
    assert!(msg.contains("missing_table"), "Got: {msg}");

    let result = session.execute("SELECT count(*) AS n FROM users").unwrap();
    assert_eq!(result.rows, vec![vec![CellValue::Integer(2)]]);
}

#[test]
fn database_is_read_only() {
    let session = opened(users_and_orders());
    let err = session
        .execute("DELETE FROM users WHERE id = 1")
        .unwrap_err();
    assert!(matches!(err, LitefetchError::Query { .. }), "got {err:?}");

    let result = session.execute("SELECT count(*) FROM users").unwrap();
    assert_eq!(result.rows, vec![vec![CellValue::Integer(2)]]);
}

#[test]
fn schema_lists_tables_with_ordered_columns() {
    let session = opened(users_and_orders());
    let mut schema = session.schema().unwrap();
    schema.sort_by(|a, b| a.name.cmp(&b.name));

    assert_eq!(
        schema,
        vec![
            TableMetadata {
                name: "orders".to_string(),
                columns: vec!["id".to_string(), "user_id".to_string()],
            },
            TableMetadata {
                name: "users".to_string(),
                columns: vec!["id".to_string(), "name".to_string()],
            },
        ]
    );
}

#[test]
fn schema_skips_views_and_quotes_odd_names() {
    let session = opened(build_database(
        "CREATE TABLE \"odd \"\"name\"\" t\" (a INTEGER, b TEXT);
         CREATE VIEW v AS SELECT a FROM \"odd \"\"name\"\" t\";",
    ));
    let schema = session.schema().unwrap();

    assert_eq!(schema.len(), 1);
    assert_eq!(schema[0].name, "odd \"name\" t");
    assert_eq!(schema[0].columns, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn schema_of_empty_database_is_empty() {
    let session = opened(build_database("CREATE TABLE scratch (a); DROP TABLE scratch;"));
    assert!(session.schema().unwrap().is_empty());
}

#[test]
fn all_scalar_kinds_round_trip() {
    let session = opened(build_database(
        "CREATE TABLE kinds (i INTEGER, r REAL, t TEXT, b BLOB, z);
         INSERT INTO kinds VALUES (-7, 1.5, 'héllo', x'00ff10', NULL);",
    ));
    let result = session.execute("SELECT i, r, t, b, z FROM kinds").unwrap();

    assert_eq!(result.columns, vec!["i", "r", "t", "b", "z"]);
    assert_eq!(
        result.rows,
        vec![vec![
            CellValue::Integer(-7),
            CellValue::Real(1.5),
            CellValue::from("héllo"),
            CellValue::Blob(vec![0x00, 0xff, 0x10]),
            CellValue::Null,
        ]]
    );
}

#[test]
fn non_utf8_text_is_returned_as_bytes() {
    let session = opened(build_database(
        "CREATE TABLE raw (t TEXT);
         INSERT INTO raw VALUES (CAST(x'fffe41' AS TEXT)), ('plain');",
    ));
    let result = session
        .execute("SELECT typeof(t), t FROM raw ORDER BY rowid")
        .unwrap();

    assert_eq!(
        result.rows,
        vec![
            vec![CellValue::from("text"), CellValue::Blob(vec![0xff, 0xfe, 0x41])],
            vec![CellValue::from("text"), CellValue::from("plain")],
        ]
    );
}

#[test]
fn result_of_exactly_cap_rows_reaches_cap() {
    let session = opened(numbers(25));
    let capped = session.execute("SELECT n FROM nums").unwrap();
    assert_eq!(capped.rows.len(), 25);
    assert!(capped.hit_cap());

    let mut uncapped = Session::new().with_row_limit(None);
    uncapped.open(numbers(25)).unwrap();
    assert_eq!(uncapped.execute("SELECT n FROM nums").unwrap().rows.len(), 25);
}

#[test]
fn close_releases_handle() {
    let mut session = opened(users_and_orders());
    session.close();
    assert!(!session.is_ready());
    assert!(matches!(session.schema(), Err(LitefetchError::NotReady)));
}
