//! Statement execution plumbing.
//!
//! Thin per-backend wrappers around sqlx. Unparameterized statements run
//! over the raw text protocol, which matters for SQL that cannot be
//! prepared (stored procedure definitions, some DDL). Parameterized
//! statements bind [`Value`]s positionally.

use crate::db::backend::DbPool;
use crate::db::decode;
use crate::error::{Error, Result};
use crate::table::{Table, Value};
use sqlx::Executor;

/// Fetch every row the statement produces and decode into a [`Table`].
pub(crate) async fn fetch_table(pool: &DbPool, sql: &str) -> Result<Table> {
    match pool {
        DbPool::MySql(p) => {
            let rows = p.fetch_all(sql).await.map_err(Error::query)?;
            decode::table_from_mysql(&rows)
        }
        DbPool::Postgres(p) => {
            let rows = p.fetch_all(sql).await.map_err(Error::query)?;
            decode::table_from_postgres(&rows)
        }
        DbPool::Sqlite(p) => {
            let rows = p.fetch_all(sql).await.map_err(Error::query)?;
            decode::table_from_sqlite(&rows)
        }
    }
}

/// Execute an unparameterized statement over the text protocol and return
/// the affected-row count.
pub(crate) async fn execute_raw(pool: &DbPool, sql: &str) -> Result<u64> {
    match pool {
        DbPool::MySql(p) => {
            let done = p.execute(sql).await.map_err(Error::execution)?;
            Ok(done.rows_affected())
        }
        DbPool::Postgres(p) => {
            let done = p.execute(sql).await.map_err(Error::execution)?;
            Ok(done.rows_affected())
        }
        DbPool::Sqlite(p) => {
            let done = p.execute(sql).await.map_err(Error::execution)?;
            Ok(done.rows_affected())
        }
    }
}

/// Execute a statement with positionally bound parameters.
pub(crate) async fn execute_bound(pool: &DbPool, sql: &str, params: &[Value]) -> Result<u64> {
    match pool {
        DbPool::MySql(p) => {
            let mut query = sqlx::query(sql);
            for param in params {
                query = mysql::bind_value(query, param);
            }
            let done = query.execute(p).await.map_err(Error::execution)?;
            Ok(done.rows_affected())
        }
        DbPool::Postgres(p) => {
            let mut query = sqlx::query(sql);
            for param in params {
                query = postgres::bind_value(query, param);
            }
            let done = query.execute(p).await.map_err(Error::execution)?;
            Ok(done.rows_affected())
        }
        DbPool::Sqlite(p) => {
            let mut query = sqlx::query(sql);
            for param in params {
                query = sqlite::bind_value(query, param);
            }
            let done = query.execute(p).await.map_err(Error::execution)?;
            Ok(done.rows_affected())
        }
    }
}

/// Probe the catalog for a table with the given name.
pub(crate) async fn table_exists(pool: &DbPool, name: &str) -> Result<bool> {
    let count: i64 = match pool {
        DbPool::MySql(p) => sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name = ?",
        )
        .bind(name)
        .fetch_one(p)
        .await
        .map_err(Error::execution)?,
        DbPool::Postgres(p) => sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1",
        )
        .bind(name)
        .fetch_one(p)
        .await
        .map_err(Error::execution)?,
        DbPool::Sqlite(p) => sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(name)
        .fetch_one(p)
        .await
        .map_err(Error::execution)?,
    };
    Ok(count > 0)
}

// Parallel per-backend binders, adapted to each database's argument type.

mod mysql {
    use super::*;
    use sqlx::MySql;
    use sqlx::mysql::MySqlArguments;

    pub(super) fn bind_value<'q>(
        query: sqlx::query::Query<'q, MySql, MySqlArguments>,
        value: &'q Value,
    ) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
        match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(v) => query.bind(*v),
            Value::Int(v) => query.bind(*v),
            Value::Float(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.as_str()),
            Value::Bytes(v) => query.bind(v.as_slice()),
        }
    }
}

mod postgres {
    use super::*;
    use sqlx::Postgres;
    use sqlx::postgres::PgArguments;

    pub(super) fn bind_value<'q>(
        query: sqlx::query::Query<'q, Postgres, PgArguments>,
        value: &'q Value,
    ) -> sqlx::query::Query<'q, Postgres, PgArguments> {
        match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(v) => query.bind(*v),
            Value::Int(v) => query.bind(*v),
            Value::Float(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.as_str()),
            Value::Bytes(v) => query.bind(v.as_slice()),
        }
    }
}

mod sqlite {
    use super::*;
    use sqlx::Sqlite;
    use sqlx::sqlite::SqliteArguments;

    pub(super) fn bind_value<'q>(
        query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
        value: &'q Value,
    ) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
        match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(v) => query.bind(*v),
            Value::Int(v) => query.bind(*v),
            Value::Float(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.as_str()),
            Value::Bytes(v) => query.bind(v.as_slice()),
        }
    }
}
