//! The in-memory tabular model.
//!
//! A [`Table`] is an ordered collection of named, typed columns. Every
//! column holds the same number of values; the invariant is enforced at
//! construction and on row insertion. Tables are transient: read operations
//! produce one, write and export operations consume one, and no state is
//! shared across operations.

pub mod csv;

use crate::config::DEFAULT_TEXT_WIDTH;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the synthetic row-index column added by writes and exports
/// that include the row index.
pub const INDEX_COLUMN: &str = "index";

/// A single cell value.
///
/// Dates, times, and decimals read from a database are carried as [`Text`],
/// preserving the driver's string representation.
///
/// [`Text`]: Value::Text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Binary data (base64 encoded in serialized form)
    #[serde(with = "base64_bytes")]
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
            Self::Bytes(_) => ValueKind::Bytes,
        }
    }
}

/// Custom serialization for binary data as base64.
mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        STANDARD.encode(bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Logical type of a column or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Text,
    Bytes,
}

/// A named column of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Logical type of the column: the kind of its first non-null value, or
    /// [`ValueKind::Null`] when every value is NULL.
    pub fn kind(&self) -> ValueKind {
        self.values
            .iter()
            .find(|v| !v.is_null())
            .map(Value::kind)
            .unwrap_or(ValueKind::Null)
    }

    fn push(&mut self, value: Value) {
        self.values.push(value);
    }
}

/// An ordered collection of equally-sized named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// An empty table with no columns and no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from columns, enforcing the shape invariant: all
    /// columns share one length and carry unique, non-empty names.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let rows = first.len();
            for col in &columns {
                if col.name().is_empty() {
                    return Err(Error::Shape("column with empty name".to_string()));
                }
                if col.len() != rows {
                    return Err(Error::Shape(format!(
                        "column '{}' has {} values, expected {}",
                        col.name(),
                        col.len(),
                        rows
                    )));
                }
            }
            let mut seen = std::collections::BTreeSet::new();
            for col in &columns {
                if !seen.insert(col.name()) {
                    return Err(Error::Shape(format!(
                        "duplicate column name '{}'",
                        col.name()
                    )));
                }
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// True when the table holds no rows. A table with columns but zero
    /// rows is empty.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// One value per column for the given row.
    pub fn row(&self, idx: usize) -> Option<Vec<&Value>> {
        if idx >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values()[idx]).collect())
    }

    /// Append a row, one value per column in column order.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Shape(format!(
                "row has {} values, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        for (col, value) in self.columns.iter_mut().zip(row) {
            col.push(value);
        }
        Ok(())
    }

    /// Per-column text storage widths for every text column.
    ///
    /// For each column whose kind is [`ValueKind::Text`], the width is the
    /// maximum character count across its non-null values, clamped to `max`
    /// when supplied. A column whose values are all NULL resolves to `max`,
    /// or [`DEFAULT_TEXT_WIDTH`] when no ceiling was given. Columns of other
    /// kinds are omitted.
    ///
    /// The result feeds [`crate::WriteOptions::with_text_widths`] to size
    /// VARCHAR columns before a write.
    pub fn text_widths(&self, max: Option<u32>) -> BTreeMap<String, u32> {
        let mut widths = BTreeMap::new();
        for col in &self.columns {
            let width = match col.kind() {
                ValueKind::Text => {
                    let observed = col
                        .values()
                        .iter()
                        .filter_map(|v| match v {
                            Value::Text(s) => Some(s.chars().count() as u32),
                            _ => None,
                        })
                        .max()
                        .unwrap_or(0);
                    match max {
                        Some(cap) => observed.min(cap),
                        None => observed,
                    }
                }
                ValueKind::Null => max.unwrap_or(DEFAULT_TEXT_WIDTH),
                _ => continue,
            };
            widths.insert(col.name().to_string(), width);
        }
        widths
    }
}
