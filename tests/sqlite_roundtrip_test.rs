use tablebridge::{
    Backend, ClientConfig, Column, Error, IfExists, Table, TableClient, Value, WriteOptions,
    WriteSummary,
};
use tempfile::NamedTempFile;

fn sqlite_client() -> TableClient {
    TableClient::new(ClientConfig::default().with_backends(vec![Backend::Sqlite]))
}

fn people() -> Table {
    Table::from_columns(vec![
        Column::new("id", vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        Column::new(
            "name",
            vec![
                Value::Text("ada".to_string()),
                Value::Text("grace".to_string()),
                Value::Null,
            ],
        ),
        Column::new(
            "score",
            vec![Value::Float(1.5), Value::Null, Value::Float(3.25)],
        ),
        Column::new(
            "active",
            vec![Value::Bool(true), Value::Bool(false), Value::Bool(true)],
        ),
    ])
    .unwrap()
}

#[tokio::test]
async fn write_then_read_roundtrip() {
    let db_file = NamedTempFile::new().unwrap();
    let db = db_file.path().to_str().unwrap();
    let client = sqlite_client();

    let written = client
        .write_table(&people(), "people", db, &WriteOptions::new(IfExists::Replace))
        .await
        .unwrap();
    assert_eq!(written, WriteSummary::Written { rows: 3 });

    let back = client.read_table(db, "people").await.unwrap();
    assert_eq!(back.column_names(), vec!["id", "name", "score", "active"]);
    assert_eq!(back.row_count(), 3);
    assert_eq!(back.column("id").unwrap().values()[1], Value::Int(2));
    assert_eq!(
        back.column("name").unwrap().values()[0],
        Value::Text("ada".to_string())
    );
    assert_eq!(back.column("name").unwrap().values()[2], Value::Null);
    assert_eq!(back.column("score").unwrap().values()[2], Value::Float(3.25));
    assert_eq!(back.column("active").unwrap().values()[0], Value::Bool(true));
}

#[tokio::test]
async fn append_adds_rows_and_replace_resets() {
    let db_file = NamedTempFile::new().unwrap();
    let db = db_file.path().to_str().unwrap();
    let client = sqlite_client();

    client
        .write_table(&people(), "runs", db, &WriteOptions::new(IfExists::Replace))
        .await
        .unwrap();
    client
        .write_table(&people(), "runs", db, &WriteOptions::new(IfExists::Append))
        .await
        .unwrap();
    let doubled = client.read_table(db, "runs").await.unwrap();
    assert_eq!(doubled.row_count(), 6);

    client
        .write_table(&people(), "runs", db, &WriteOptions::new(IfExists::Replace))
        .await
        .unwrap();
    let reset = client.read_table(db, "runs").await.unwrap();
    assert_eq!(reset.row_count(), 3);
}

#[tokio::test]
async fn small_chunks_write_every_row() {
    let db_file = NamedTempFile::new().unwrap();
    let db = db_file.path().to_str().unwrap();
    let client = sqlite_client();

    let opts = WriteOptions::new(IfExists::Replace).with_chunk_rows(2);
    let written = client
        .write_table(&people(), "chunked", db, &opts)
        .await
        .unwrap();
    assert_eq!(written, WriteSummary::Written { rows: 3 });

    let back = client.read_table(db, "chunked").await.unwrap();
    assert_eq!(back.row_count(), 3);
}

#[tokio::test]
async fn include_index_prepends_row_numbers() {
    let db_file = NamedTempFile::new().unwrap();
    let db = db_file.path().to_str().unwrap();
    let client = sqlite_client();

    let opts = WriteOptions::new(IfExists::Replace).with_include_index(true);
    client
        .write_table(&people(), "indexed", db, &opts)
        .await
        .unwrap();

    let back = client.read_table(db, "indexed").await.unwrap();
    assert_eq!(
        back.column_names(),
        vec!["index", "id", "name", "score", "active"]
    );
    assert_eq!(back.column("index").unwrap().values()[2], Value::Int(2));
}

#[tokio::test]
async fn text_width_hints_feed_the_schema() {
    let db_file = NamedTempFile::new().unwrap();
    let db = db_file.path().to_str().unwrap();
    let client = sqlite_client();

    let table = people();
    let widths = table.text_widths(Some(16));
    let opts = WriteOptions::new(IfExists::Replace).with_text_widths(widths);
    client
        .write_table(&table, "sized", db, &opts)
        .await
        .unwrap();

    // VARCHAR columns still read back as text
    let back = client.read_table(db, "sized").await.unwrap();
    assert_eq!(
        back.column("name").unwrap().values()[1],
        Value::Text("grace".to_string())
    );
}

#[tokio::test]
async fn empty_table_write_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    // A database that could never be opened: parent directory is missing.
    let db = dir.path().join("missing").join("never.db");
    let client = sqlite_client();

    let empty = Table::from_columns(vec![
        Column::new("id", vec![]),
        Column::new("name", vec![]),
    ])
    .unwrap();
    let summary = client
        .write_table(
            &empty,
            "nothing",
            db.to_str().unwrap(),
            &WriteOptions::new(IfExists::Replace),
        )
        .await
        .unwrap();
    assert_eq!(summary, WriteSummary::SkippedEmpty);
}

#[tokio::test]
async fn fail_policy_errors_on_existing_table() {
    let db_file = NamedTempFile::new().unwrap();
    let db = db_file.path().to_str().unwrap();
    let client = sqlite_client();

    client
        .write_table(&people(), "guarded", db, &WriteOptions::new(IfExists::Fail))
        .await
        .unwrap();

    let err = client
        .write_table(&people(), "guarded", db, &WriteOptions::new(IfExists::Fail))
        .await
        .unwrap_err();
    match err {
        Error::Write {
            database,
            table,
            message,
            rescue_file,
        } => {
            assert_eq!(database, db);
            assert_eq!(table, "guarded");
            assert!(message.contains("already exists"));
            assert!(rescue_file.is_none());
        }
        other => panic!("expected write error, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_write_rescues_to_csv() {
    let db_file = NamedTempFile::new().unwrap();
    let db = db_file.path().to_str().unwrap();
    let client = sqlite_client();

    client
        .write_table(&people(), "rescued", db, &WriteOptions::new(IfExists::Fail))
        .await
        .unwrap();

    let opts = WriteOptions::new(IfExists::Fail).with_rescue_to_csv(true);
    let err = client
        .write_table(&people(), "rescued", db, &opts)
        .await
        .unwrap_err();

    let rescue = err.rescue_file().expect("rescue file path in error").clone();
    assert!(rescue.to_string_lossy().ends_with("_rescued.csv"));
    assert!(
        rescue
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("error_uploading")
    );

    let contents = std::fs::read_to_string(&rescue).unwrap();
    // header plus one line per original row
    assert_eq!(contents.lines().count(), 4);
    assert!(contents.starts_with("id,name,score,active"));

    std::fs::remove_file(&rescue).unwrap();
}

#[tokio::test]
async fn drop_table_is_idempotent() {
    let db_file = NamedTempFile::new().unwrap();
    let db = db_file.path().to_str().unwrap();
    let client = sqlite_client();

    // missing table: not an error
    client.drop_table(db, "ghost").await.unwrap();

    client
        .write_table(&people(), "doomed", db, &WriteOptions::new(IfExists::Replace))
        .await
        .unwrap();
    client.drop_table(db, "doomed").await.unwrap();

    let err = client.read_table(db, "doomed").await.unwrap_err();
    assert!(matches!(err, Error::Query { .. }));
}

#[tokio::test]
async fn execute_reports_affected_rows() {
    let db_file = NamedTempFile::new().unwrap();
    let db = db_file.path().to_str().unwrap();
    let client = sqlite_client();

    client
        .execute(db, "CREATE TABLE counters (name TEXT, hits BIGINT)")
        .await
        .unwrap();
    let summary = client
        .execute(db, "INSERT INTO counters VALUES ('a', 1), ('b', 2)")
        .await
        .unwrap();
    assert_eq!(summary.rows_affected, 2);

    let result = client
        .read_query(db, "SELECT name FROM counters WHERE hits > 1")
        .await
        .unwrap();
    assert_eq!(result.row_count(), 1);
    assert_eq!(
        result.column("name").unwrap().values()[0],
        Value::Text("b".to_string())
    );
}

#[tokio::test]
async fn execute_bad_statement_is_an_execution_error() {
    let db_file = NamedTempFile::new().unwrap();
    let db = db_file.path().to_str().unwrap();
    let client = sqlite_client();

    let err = client.execute(db, "NOT EVEN SQL").await.unwrap_err();
    assert!(matches!(err, Error::Execution { .. }));
}

#[tokio::test]
async fn procedures_are_unsupported_on_sqlite() {
    let db_file = NamedTempFile::new().unwrap();
    let db = db_file.path().to_str().unwrap();
    let client = sqlite_client();

    let err = client
        .call_procedure(db, "refresh_totals", &[Value::Int(1)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedProcedure {
            backend: Backend::Sqlite
        }
    ));
}

#[tokio::test]
async fn hostile_table_names_are_rejected_before_connecting() {
    let client = sqlite_client();
    // the database path is bogus on purpose: validation fires first
    let err = client
        .read_table("/does/not/exist.db", "users; DROP TABLE users")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidIdentifier(_)));
}
