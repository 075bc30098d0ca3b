//! Database layer.
//!
//! - Backend chain and pool construction
//! - Row decoding into the tabular model
//! - Statement execution and parameter binding
//! - Table writes: DDL synthesis and chunked inserts

pub mod backend;
pub(crate) mod decode;
pub(crate) mod executor;
pub mod writer;

use crate::db::backend::Backend;
use crate::error::{Error, Result};

/// Validate a table or procedure name before interpolating it into SQL.
///
/// Only `[A-Za-z_][A-Za-z0-9_]*` is accepted. Arbitrary query strings stay
/// verbatim passthrough; this guard applies to names the crate itself
/// splices into statements.
pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}

/// Quote an identifier in the backend's dialect, doubling any embedded
/// quote character.
pub(crate) fn quote_ident(backend: Backend, name: &str) -> String {
    match backend {
        Backend::MySql => format!("`{}`", name.replace('`', "``")),
        Backend::Postgres | Backend::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_accept_word_characters() {
        assert!(validate_identifier("orders").is_ok());
        assert!(validate_identifier("_staging_2024").is_ok());
        assert!(validate_identifier("Order_Items").is_ok());
    }

    #[test]
    fn identifiers_reject_injection_shapes() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1st").is_err());
        assert!(validate_identifier("orders; DROP TABLE users").is_err());
        assert!(validate_identifier("or`ders").is_err());
        assert!(validate_identifier("na me").is_err());
    }

    #[test]
    fn quoting_follows_the_dialect() {
        assert_eq!(quote_ident(Backend::MySql, "index"), "`index`");
        assert_eq!(quote_ident(Backend::Postgres, "index"), "\"index\"");
        assert_eq!(quote_ident(Backend::Sqlite, "a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_ident(Backend::MySql, "a`b"), "`a``b`");
    }
}
