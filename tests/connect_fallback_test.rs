use tablebridge::{Backend, ClientConfig, Error, PoolOptions, TableClient};

fn fast_pool() -> PoolOptions {
    PoolOptions {
        acquire_timeout_secs: Some(5),
        ..PoolOptions::default()
    }
}

#[tokio::test]
async fn unreachable_host_exhausts_every_backend() {
    // nothing listens on port 1
    let config = ClientConfig::new("127.0.0.1", 1, "user", "secret")
        .with_backends(vec![Backend::MySql, Backend::Postgres])
        .with_pool(fast_pool());
    let client = TableClient::new(config);

    let err = client.connect("warehouse").await.unwrap_err();
    match err {
        Error::Connection { attempts } => {
            assert_eq!(attempts.len(), 2);
            assert_eq!(attempts[0].backend, Backend::MySql);
            assert_eq!(attempts[1].backend, Backend::Postgres);
            assert!(!attempts[0].detail.is_empty());
        }
        other => panic!("expected connection error, got {other:?}"),
    }
}

#[tokio::test]
async fn connection_error_message_names_each_backend() {
    let config = ClientConfig::new("127.0.0.1", 1, "user", "secret")
        .with_backends(vec![Backend::MySql, Backend::Postgres])
        .with_pool(fast_pool());
    let client = TableClient::new(config);

    let err = client.connect("warehouse").await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("mysql:"));
    assert!(message.contains("postgres:"));
}

#[tokio::test]
async fn sqlite_with_missing_parent_directory_fails_to_connect() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("no-such-dir").join("data.db");

    let config = ClientConfig::default()
        .with_backends(vec![Backend::Sqlite])
        .with_pool(fast_pool());
    let client = TableClient::new(config);

    let err = client.connect(db.to_str().unwrap()).await.unwrap_err();
    match err {
        Error::Connection { attempts } => assert_eq!(attempts.len(), 1),
        other => panic!("expected connection error, got {other:?}"),
    }
}

#[tokio::test]
async fn first_working_backend_wins() {
    let db_file = tempfile::NamedTempFile::new().unwrap();
    let config = ClientConfig::new("127.0.0.1", 1, "user", "secret")
        .with_backends(vec![Backend::MySql, Backend::Sqlite])
        .with_pool(fast_pool());
    let client = TableClient::new(config);

    // MySQL fails, the chain falls through to SQLite
    let pool = client
        .connect(db_file.path().to_str().unwrap())
        .await
        .unwrap();
    assert_eq!(pool.backend(), Backend::Sqlite);
    pool.close().await;
}
