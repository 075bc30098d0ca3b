//! Table writes.
//!
//! Synthesizes `CREATE TABLE` DDL from a table's column kinds (plus
//! optional text width hints), applies the if-exists policy, and inserts
//! rows in chunks of multi-row `INSERT` statements. Chunk sizes are
//! ultimately bounded by the driver's bind-parameter limits; callers with
//! very wide tables should lower the chunk size accordingly.

use crate::config::DEFAULT_WRITE_CHUNK_ROWS;
use crate::db::backend::{Backend, DbPool};
use crate::db::{executor, quote_ident};
use crate::error::{Error, Result};
use crate::table::{INDEX_COLUMN, Table, Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Policy applied when the target table already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IfExists {
    /// Error out if the table exists.
    Fail,
    /// Drop and recreate the table.
    Replace,
    /// Keep the table and append rows.
    Append,
}

impl IfExists {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Replace => "replace",
            Self::Append => "append",
        }
    }
}

impl std::fmt::Display for IfExists {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options for a table write.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub if_exists: IfExists,
    /// Rows per `INSERT` statement (default: 50_000, minimum 1).
    pub chunk_rows: usize,
    /// Per-column VARCHAR widths for text columns; columns without an entry
    /// are created as `TEXT`.
    pub text_widths: BTreeMap<String, u32>,
    /// Prepend a 0-based row-index column named `index`.
    pub include_index: bool,
    /// On write failure, serialize the table to a local rescue file.
    pub rescue_to_csv: bool,
}

impl WriteOptions {
    pub fn new(if_exists: IfExists) -> Self {
        Self {
            if_exists,
            chunk_rows: DEFAULT_WRITE_CHUNK_ROWS,
            text_widths: BTreeMap::new(),
            include_index: false,
            rescue_to_csv: false,
        }
    }

    pub fn with_chunk_rows(mut self, chunk_rows: usize) -> Self {
        self.chunk_rows = chunk_rows.max(1);
        self
    }

    pub fn with_text_widths(mut self, widths: BTreeMap<String, u32>) -> Self {
        self.text_widths = widths;
        self
    }

    pub fn with_include_index(mut self, include_index: bool) -> Self {
        self.include_index = include_index;
        self
    }

    pub fn with_rescue_to_csv(mut self, rescue: bool) -> Self {
        self.rescue_to_csv = rescue;
        self
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::new(IfExists::Fail)
    }
}

/// Outcome of a successful [`crate::TableClient::write_table`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteSummary {
    /// The table held no rows; nothing was sent to the database.
    SkippedEmpty,
    /// The table was written.
    Written { rows: u64 },
}

/// Prepare the target table per the if-exists policy, then insert every
/// row in chunks. Returns the number of rows written.
pub(crate) async fn write_table(
    pool: &DbPool,
    table: &Table,
    name: &str,
    opts: &WriteOptions,
) -> Result<u64> {
    let backend = pool.backend();
    prepare_target(pool, table, name, opts).await?;

    let quoted = quote_ident(backend, name);
    let quoted_cols = quoted_column_list(backend, table, opts);
    let chunk_rows = opts.chunk_rows.max(1);
    let total_rows = table.row_count();
    let mut written = 0u64;
    let mut start = 0;
    while start < total_rows {
        let end = (start + chunk_rows).min(total_rows);
        let sql = insert_sql(backend, &quoted, &quoted_cols, end - start);
        let mut params = Vec::with_capacity((end - start) * quoted_cols.len());
        for row in start..end {
            if opts.include_index {
                params.push(Value::Int(row as i64));
            }
            for col in table.columns() {
                params.push(col.values()[row].clone());
            }
        }
        written += executor::execute_bound(pool, &sql, &params).await?;
        debug!(table = %name, rows = end - start, "chunk written");
        start = end;
    }
    Ok(written)
}

async fn prepare_target(
    pool: &DbPool,
    table: &Table,
    name: &str,
    opts: &WriteOptions,
) -> Result<()> {
    let backend = pool.backend();
    match opts.if_exists {
        IfExists::Replace => {
            let quoted = quote_ident(backend, name);
            executor::execute_raw(pool, &format!("DROP TABLE IF EXISTS {}", quoted)).await?;
            executor::execute_raw(pool, &create_table_sql(backend, name, table, opts, false))
                .await?;
        }
        IfExists::Append => {
            executor::execute_raw(pool, &create_table_sql(backend, name, table, opts, true))
                .await?;
        }
        IfExists::Fail => {
            if executor::table_exists(pool, name).await? {
                return Err(Error::Execution {
                    message: format!("table '{}' already exists and the policy is 'fail'", name),
                    code: None,
                });
            }
            executor::execute_raw(pool, &create_table_sql(backend, name, table, opts, false))
                .await?;
        }
    }
    Ok(())
}

fn quoted_column_list(backend: Backend, table: &Table, opts: &WriteOptions) -> Vec<String> {
    let mut cols = Vec::with_capacity(table.column_count() + usize::from(opts.include_index));
    if opts.include_index {
        cols.push(quote_ident(backend, INDEX_COLUMN));
    }
    for col in table.columns() {
        cols.push(quote_ident(backend, col.name()));
    }
    cols
}

fn create_table_sql(
    backend: Backend,
    name: &str,
    table: &Table,
    opts: &WriteOptions,
    if_not_exists: bool,
) -> String {
    let mut defs = Vec::with_capacity(table.column_count() + usize::from(opts.include_index));
    if opts.include_index {
        defs.push(format!(
            "{} BIGINT",
            quote_ident(backend, INDEX_COLUMN)
        ));
    }
    for col in table.columns() {
        let width = opts.text_widths.get(col.name()).copied();
        defs.push(format!(
            "{} {}",
            quote_ident(backend, col.name()),
            sql_type(backend, col.kind(), width)
        ));
    }
    format!(
        "CREATE TABLE {}{} ({})",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        quote_ident(backend, name),
        defs.join(", ")
    )
}

/// SQL storage type for a column kind. Width hints apply to text columns
/// (and to all-NULL columns, which default to text storage).
fn sql_type(backend: Backend, kind: ValueKind, width: Option<u32>) -> String {
    match kind {
        ValueKind::Int => "BIGINT".to_string(),
        ValueKind::Bool => "BOOLEAN".to_string(),
        ValueKind::Float => match backend {
            Backend::Postgres => "DOUBLE PRECISION".to_string(),
            Backend::MySql | Backend::Sqlite => "DOUBLE".to_string(),
        },
        ValueKind::Bytes => match backend {
            Backend::Postgres => "BYTEA".to_string(),
            Backend::MySql | Backend::Sqlite => "BLOB".to_string(),
        },
        ValueKind::Text | ValueKind::Null => match width {
            Some(w) => format!("VARCHAR({})", w),
            None => "TEXT".to_string(),
        },
    }
}

fn insert_sql(backend: Backend, quoted_table: &str, quoted_cols: &[String], rows: usize) -> String {
    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ",
        quoted_table,
        quoted_cols.join(", ")
    );
    let cols = quoted_cols.len();
    for row in 0..rows {
        if row > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for col in 0..cols {
            if col > 0 {
                sql.push_str(", ");
            }
            match backend {
                Backend::Postgres => {
                    sql.push('$');
                    sql.push_str(&(row * cols + col + 1).to_string());
                }
                Backend::MySql | Backend::Sqlite => sql.push('?'),
            }
        }
        sql.push(')');
    }
    sql
}
