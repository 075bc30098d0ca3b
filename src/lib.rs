//! tablebridge
//!
//! A thin bridge between in-memory tabular data and relational databases.
//! A [`TableClient`] reads whole tables or ad-hoc query results into a
//! [`Table`], writes tables back in chunks, imports/exports delimited flat
//! files, and runs arbitrary statements or stored procedures. Connection
//! management and SQL execution delegate to sqlx; flat-file parsing delegates
//! to the csv crate.
//!
//! Every operation opens its own connection and closes it before returning;
//! there is no session state spanning calls.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod table;

pub use client::{ExecutionSummary, TableClient};
pub use config::{ClientConfig, PoolOptions};
pub use db::backend::{Backend, ConnectAttempt, DbPool};
pub use db::writer::{IfExists, WriteOptions, WriteSummary};
pub use error::{Error, Result};
pub use table::csv::{CsvReadOptions, CsvWriteOptions, TextEncoding};
pub use table::{Column, Table, Value, ValueKind};
