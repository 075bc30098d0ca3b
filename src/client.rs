//! The database table client.
//!
//! [`TableClient`] is the single public entry point: it holds an immutable
//! [`ClientConfig`] and exposes one method per operation. Each method opens
//! a fresh connection through the backend chain, performs its one
//! operation, and closes the connection on every exit path. There is no
//! session or transaction spanning calls, so concurrent callers are
//! naturally independent.

use crate::config::ClientConfig;
use crate::db::backend::{self, Backend, DbPool};
use crate::db::writer::{self, WriteOptions, WriteSummary};
use crate::db::{executor, quote_ident, validate_identifier};
use crate::error::{Error, Result};
use crate::table::csv::{self, CsvReadOptions, CsvWriteOptions};
use crate::table::{Table, Value};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Driver-level metadata for an executed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub rows_affected: u64,
    pub execution_time_ms: u64,
}

/// Client binding a tabular model to a relational database.
#[derive(Debug, Clone)]
pub struct TableClient {
    config: ClientConfig,
}

impl TableClient {
    pub fn new(config: ClientConfig) -> Self {
        debug!(
            host = %config.host,
            port = config.port,
            user = %config.user,
            backends = ?config.backends,
            "table client created"
        );
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Open a pool to the named database, trying each configured backend
    /// in order. See [`crate::ClientConfig::with_backends`].
    ///
    /// The returned pool is not cached; callers that use it directly are
    /// responsible for closing it.
    pub async fn connect(&self, database: &str) -> Result<DbPool> {
        backend::connect_chain(&self.config, database).await
    }

    /// Read a whole table into memory.
    pub async fn read_table(&self, database: &str, table: &str) -> Result<Table> {
        validate_identifier(table)?;
        let pool = self.connect(database).await?;
        let sql = format!("SELECT * FROM {}", quote_ident(pool.backend(), table));
        let result = executor::fetch_table(&pool, &sql).await;
        pool.close().await;
        let fetched = result?;
        debug!(
            table = %table,
            database = %database,
            rows = fetched.row_count(),
            "table read"
        );
        Ok(fetched)
    }

    /// Read the result of an arbitrary query into memory.
    ///
    /// The query string is passed through verbatim: no validation and no
    /// injection protection. Correctness is the caller's responsibility.
    pub async fn read_query(&self, database: &str, query: &str) -> Result<Table> {
        let pool = self.connect(database).await?;
        let result = executor::fetch_table(&pool, query).await;
        pool.close().await;
        let fetched = result?;
        debug!(database = %database, rows = fetched.row_count(), "query read");
        Ok(fetched)
    }

    /// Execute an arbitrary statement and return driver metadata. No retry.
    pub async fn execute(&self, database: &str, statement: &str) -> Result<ExecutionSummary> {
        let pool = self.connect(database).await?;
        let start = Instant::now();
        let result = executor::execute_raw(&pool, statement).await;
        pool.close().await;
        let rows_affected = result?;
        let summary = ExecutionSummary {
            rows_affected,
            execution_time_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            database = %database,
            rows_affected = summary.rows_affected,
            execution_time_ms = summary.execution_time_ms,
            "statement executed"
        );
        Ok(summary)
    }

    /// Call a named stored procedure with positional parameters.
    pub async fn call_procedure(
        &self,
        database: &str,
        procedure: &str,
        params: &[Value],
    ) -> Result<ExecutionSummary> {
        validate_identifier(procedure)?;
        let pool = self.connect(database).await?;
        let backend = pool.backend();
        if backend == Backend::Sqlite {
            pool.close().await;
            return Err(Error::UnsupportedProcedure { backend });
        }
        let sql = call_sql(backend, procedure, params.len());
        let start = Instant::now();
        let result = executor::execute_bound(&pool, &sql, params).await;
        pool.close().await;
        let rows_affected = result?;
        let summary = ExecutionSummary {
            rows_affected,
            execution_time_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            database = %database,
            procedure = %procedure,
            params = params.len(),
            "procedure executed"
        );
        Ok(summary)
    }

    /// Write a table to the database.
    ///
    /// An empty table is a no-op: nothing is sent to the database and
    /// [`WriteSummary::SkippedEmpty`] is returned. On write failure the
    /// call returns [`Error::Write`]; when
    /// [`WriteOptions::with_rescue_to_csv`] is set, the table is first
    /// serialized to `error_uploading{database}_{table}.csv` in the
    /// current working directory and the error carries that path.
    pub async fn write_table(
        &self,
        table: &Table,
        table_name: &str,
        database: &str,
        options: &WriteOptions,
    ) -> Result<WriteSummary> {
        if table.is_empty() {
            info!(
                table = %table_name,
                database = %database,
                "table is empty, skipping write"
            );
            return Ok(WriteSummary::SkippedEmpty);
        }
        validate_identifier(table_name)?;
        info!(
            table = %table_name,
            database = %database,
            policy = %options.if_exists,
            rows = table.row_count(),
            columns = table.column_count(),
            "writing table"
        );

        let pool = self.connect(database).await?;
        let result = writer::write_table(&pool, table, table_name, options).await;
        pool.close().await;

        match result {
            Ok(rows) => {
                info!(table = %table_name, database = %database, rows, "table written");
                Ok(WriteSummary::Written { rows })
            }
            Err(err) => {
                let message = failure_message(err);
                warn!(
                    table = %table_name,
                    database = %database,
                    error = %message,
                    "table write failed"
                );
                let rescue_file = if options.rescue_to_csv {
                    self.rescue(table, database, table_name, options)
                } else {
                    None
                };
                Err(Error::Write {
                    database: database.to_string(),
                    table: table_name.to_string(),
                    message,
                    rescue_file,
                })
            }
        }
    }

    fn rescue(
        &self,
        table: &Table,
        database: &str,
        table_name: &str,
        options: &WriteOptions,
    ) -> Option<PathBuf> {
        let file_name = rescue_file_name(database, table_name);
        let csv_opts = CsvWriteOptions {
            include_index: options.include_index,
            ..CsvWriteOptions::default()
        };
        match csv::write_file(table, Path::new(&file_name), &csv_opts) {
            Ok(path) => {
                warn!(path = %path.display(), "table rescued to local file");
                Some(path)
            }
            Err(err) => {
                warn!(error = %err, "failed to write rescue file");
                None
            }
        }
    }

    /// Drop a table if it exists. Dropping a missing table is not an error.
    pub async fn drop_table(&self, database: &str, table: &str) -> Result<()> {
        validate_identifier(table)?;
        let pool = self.connect(database).await?;
        let sql = format!("DROP TABLE IF EXISTS {}", quote_ident(pool.backend(), table));
        let result = executor::execute_raw(&pool, &sql).await;
        pool.close().await;
        result?;
        info!(table = %table, database = %database, "table dropped");
        Ok(())
    }

    /// Serialize a table to a delimited file. Relative paths resolve
    /// against the current working directory.
    pub fn export_csv(
        &self,
        table: &Table,
        path: impl AsRef<Path>,
        options: &CsvWriteOptions,
    ) -> Result<PathBuf> {
        csv::write_file(table, path.as_ref(), options)
    }

    /// Read a delimited file into a table.
    pub fn import_csv(&self, path: impl AsRef<Path>, options: &CsvReadOptions) -> Result<Table> {
        csv::read_file(path.as_ref(), options)
    }
}

/// Deterministic rescue file name for a failed write. Characters that
/// cannot appear in a bare file name (path separators in a SQLite database
/// path, for instance) are replaced with underscores.
pub(crate) fn rescue_file_name(database: &str, table: &str) -> String {
    format!(
        "error_uploading{}_{}.csv",
        sanitize_component(database),
        table
    )
}

fn sanitize_component(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn call_sql(backend: Backend, procedure: &str, params: usize) -> String {
    let placeholders: Vec<String> = (0..params)
        .map(|i| match backend {
            Backend::Postgres => format!("${}", i + 1),
            Backend::MySql | Backend::Sqlite => "?".to_string(),
        })
        .collect();
    format!(
        "CALL {}({})",
        quote_ident(backend, procedure),
        placeholders.join(", ")
    )
}

fn failure_message(err: Error) -> String {
    match err {
        Error::Execution { message, .. } | Error::Query { message, .. } => message,
        other => other.to_string(),
    }
}
