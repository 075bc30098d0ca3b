//! Delimited flat-file import and export.
//!
//! Files are written and parsed by the csv crate; non-UTF-8 encodings go
//! through encoding_rs on the way in and out. Binary values are exported
//! as base64 text and do not round-trip back to [`Value::Bytes`].

use crate::error::{Error, Result};
use crate::table::{Column, INDEX_COLUMN, Table, Value};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Text encoding of a flat file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    #[default]
    Utf8,
    Windows1252,
}

impl TextEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Windows1252 => "windows-1252",
        }
    }

    fn encoding(&self) -> &'static encoding_rs::Encoding {
        match self {
            Self::Utf8 => encoding_rs::UTF_8,
            Self::Windows1252 => encoding_rs::WINDOWS_1252,
        }
    }
}

/// Export options.
#[derive(Debug, Clone)]
pub struct CsvWriteOptions {
    /// Field delimiter (default: b',').
    pub delimiter: u8,
    /// Write a header row of column names (default: true).
    pub headers: bool,
    /// Prepend a 0-based row-index column named `index` (default: false).
    pub include_index: bool,
    pub encoding: TextEncoding,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            headers: true,
            include_index: false,
            encoding: TextEncoding::Utf8,
        }
    }
}

/// Import options.
#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    /// Field delimiter (default: b',').
    pub delimiter: u8,
    /// Whether the first row is headers (default: true).
    pub has_headers: bool,
    /// Parse integers, floats, and booleans out of fields (default: true).
    /// When off, every non-empty field imports as text. Empty fields import
    /// as NULL either way.
    pub infer_types: bool,
    pub encoding: TextEncoding,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
            infer_types: true,
            encoding: TextEncoding::Utf8,
        }
    }
}

/// Serialize a table to a delimited file.
///
/// Relative paths resolve against the current working directory; absolute
/// paths are used as given. Returns the path written.
pub fn write_file(table: &Table, path: &Path, opts: &CsvWriteOptions) -> Result<PathBuf> {
    let target = if path.is_absolute() {
        path.to_path_buf()
    } else {
        Path::new(".").join(path)
    };
    let bytes = table_to_bytes(table, opts)?;
    fs::write(&target, bytes)?;
    debug!(
        path = %target.display(),
        rows = table.row_count(),
        encoding = opts.encoding.label(),
        "table exported"
    );
    Ok(target)
}

/// Read a delimited file into a table.
pub fn read_file(path: &Path, opts: &CsvReadOptions) -> Result<Table> {
    let raw = fs::read(path)?;
    let text = decode_bytes(&raw, opts.encoding)?;

    let mut reader = ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .has_headers(opts.has_headers)
        .from_reader(text.as_bytes());

    let mut names: Vec<String> = if opts.has_headers {
        reader.headers()?.iter().map(String::from).collect()
    } else {
        Vec::new()
    };

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        if names.is_empty() {
            names = (0..record.len()).map(|i| format!("column_{}", i)).collect();
        }
        rows.push(
            record
                .iter()
                .map(|field| parse_field(field, opts.infer_types))
                .collect(),
        );
    }

    let columns = names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            Column::new(
                name,
                rows.iter().map(|row| row[idx].clone()).collect::<Vec<_>>(),
            )
        })
        .collect();
    let table = Table::from_columns(columns)?;
    debug!(path = %path.display(), rows = table.row_count(), "table imported");
    Ok(table)
}

pub(crate) fn table_to_bytes(table: &Table, opts: &CsvWriteOptions) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new()
            .delimiter(opts.delimiter)
            .from_writer(&mut buf);

        let extra = usize::from(opts.include_index);
        if opts.headers {
            let mut headers = Vec::with_capacity(table.column_count() + extra);
            if opts.include_index {
                headers.push(INDEX_COLUMN.to_string());
            }
            headers.extend(table.column_names().iter().map(|s| s.to_string()));
            writer.write_record(&headers)?;
        }
        for row in 0..table.row_count() {
            let mut record = Vec::with_capacity(table.column_count() + extra);
            if opts.include_index {
                record.push(row.to_string());
            }
            for col in table.columns() {
                record.push(format_field(&col.values()[row]));
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
    }

    match opts.encoding {
        TextEncoding::Utf8 => Ok(buf),
        other => {
            // buf came from our own writer and is valid UTF-8
            let text = String::from_utf8_lossy(&buf);
            let (encoded, _, _) = other.encoding().encode(&text);
            Ok(encoded.into_owned())
        }
    }
}

fn decode_bytes(raw: &[u8], encoding: TextEncoding) -> Result<String> {
    match encoding {
        TextEncoding::Utf8 => String::from_utf8(raw.to_vec()).map_err(|e| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("file is not valid utf-8: {}", e),
            ))
        }),
        TextEncoding::Windows1252 => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(raw);
            Ok(text.into_owned())
        }
    }
}

fn format_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Text(v) => v.clone(),
        Value::Bytes(v) => STANDARD.encode(v),
    }
}

fn parse_field(field: &str, infer_types: bool) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    if !infer_types {
        return Value::Text(field.to_string());
    }
    if let Ok(v) = field.parse::<i64>() {
        return Value::Int(v);
    }
    if let Ok(v) = field.parse::<f64>() {
        return Value::Float(v);
    }
    if field.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if field.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::Text(field.to_string())
}
