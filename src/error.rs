//! Error types for tablebridge.
//!
//! All fallible operations return [`Error`] via the crate-wide [`Result`]
//! alias. Variants follow the operation that failed: connecting, reading,
//! executing, or writing. Write failures carry the path of the rescue file
//! when one was produced, so callers can branch without parsing logs.

use crate::db::backend::{Backend, ConnectAttempt};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Every backend in the configured chain failed to connect.
    #[error("all database backends failed to connect: {}", join_attempts(.attempts))]
    Connection { attempts: Vec<ConnectAttempt> },

    /// A table read or ad-hoc query failed.
    #[error("query failed: {message}")]
    Query {
        message: String,
        /// SQLSTATE code, when the driver reports one (e.g. "42S02").
        code: Option<String>,
    },

    /// An arbitrary statement or stored procedure call failed.
    #[error("statement execution failed: {message}")]
    Execution { message: String, code: Option<String> },

    /// The backend has no stored procedure support.
    #[error("stored procedures are not supported by the {backend} backend")]
    UnsupportedProcedure { backend: Backend },

    /// A table write failed. If a rescue file was produced its path is
    /// included, and the on-disk artifact holds the full table contents.
    #[error("write to table '{table}' in database '{database}' failed: {message}{}", rescue_note(.rescue_file))]
    Write {
        database: String,
        table: String,
        message: String,
        rescue_file: Option<PathBuf>,
    },

    /// A table or procedure name that cannot be safely interpolated into SQL.
    #[error("invalid identifier '{0}': expected [A-Za-z_][A-Za-z0-9_]*")]
    InvalidIdentifier(String),

    /// Column lengths or names violate the tabular shape invariant.
    #[error("malformed table: {0}")]
    Shape(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Map a driver error from a read path, keeping the SQLSTATE code.
    pub(crate) fn query(err: sqlx::Error) -> Self {
        let code = sql_state(&err);
        Self::Query {
            message: err.to_string(),
            code,
        }
    }

    /// Map a driver error from an execute path, keeping the SQLSTATE code.
    pub(crate) fn execution(err: sqlx::Error) -> Self {
        let code = sql_state(&err);
        Self::Execution {
            message: err.to_string(),
            code,
        }
    }

    /// The rescue file written for a failed table write, if any.
    pub fn rescue_file(&self) -> Option<&PathBuf> {
        match self {
            Self::Write { rescue_file, .. } => rescue_file.as_ref(),
            _ => None,
        }
    }
}

/// Extract the SQLSTATE code from a driver error, when present.
fn sql_state(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.to_string()),
        _ => None,
    }
}

fn join_attempts(attempts: &[ConnectAttempt]) -> String {
    if attempts.is_empty() {
        return "no backends configured".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.backend, a.detail))
        .collect::<Vec<_>>()
        .join("; ")
}

fn rescue_note(rescue_file: &Option<PathBuf>) -> String {
    match rescue_file {
        Some(path) => format!(" (table rescued to {})", path.display()),
        None => String::new(),
    }
}

/// Result type alias for tablebridge operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_lists_every_attempt() {
        let err = Error::Connection {
            attempts: vec![
                ConnectAttempt {
                    backend: Backend::MySql,
                    detail: "connection refused".to_string(),
                },
                ConnectAttempt {
                    backend: Backend::Postgres,
                    detail: "connection refused".to_string(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("mysql: connection refused"));
        assert!(msg.contains("postgres: connection refused"));
    }

    #[test]
    fn connection_error_with_empty_chain() {
        let err = Error::Connection { attempts: vec![] };
        assert!(err.to_string().contains("no backends configured"));
    }

    #[test]
    fn write_error_mentions_rescue_file() {
        let err = Error::Write {
            database: "sales".to_string(),
            table: "orders".to_string(),
            message: "disk full".to_string(),
            rescue_file: Some(PathBuf::from("error_uploadingsales_orders.csv")),
        };
        assert!(err.to_string().contains("error_uploadingsales_orders.csv"));
        assert!(err.rescue_file().is_some());
    }

    #[test]
    fn write_error_without_rescue_file() {
        let err = Error::Write {
            database: "sales".to_string(),
            table: "orders".to_string(),
            message: "disk full".to_string(),
            rescue_file: None,
        };
        assert!(!err.to_string().contains("rescued"));
        assert!(err.rescue_file().is_none());
    }
}
