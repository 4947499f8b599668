// crates/shp-pivot-core/src/codec/dbf.rs

//! # Attribute table (`.dbf`)
//!
//! dBase III layout as written by shapefile producers: a 32-byte header,
//! 32-byte field descriptors terminated by `0x0D`, then fixed-width records
//! each prefixed by a deletion flag (`' '` live, `'*'` deleted).

use super::cursor::Cursor;
use crate::error::{LoadError, Result};
use crate::model::{Column, ColumnKind, Value};
use std::path::Path;
use time::{Date, Month};

const FIELD_TERMINATOR: u8 = 0x0D;
const DELETED: u8 = b'*';

/// How text bytes are turned into `String`s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8 when valid, Latin-1 otherwise.
    #[default]
    Auto,
    Utf8,
    Latin1,
}

impl TextEncoding {
    /// Interprets the contents of a `.cpg` code-page file.
    pub fn from_cpg(label: &str) -> Self {
        let label = label.trim().to_ascii_uppercase().replace(['-', '_', ' '], "");
        match label.as_str() {
            "UTF8" | "65001" => TextEncoding::Utf8,
            "ISO88591" | "88591" | "LATIN1" | "1252" | "CP1252" | "WINDOWS1252" | "ANSI1252" => {
                TextEncoding::Latin1
            }
            _ => TextEncoding::Auto,
        }
    }

    fn decode(self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Latin1 => latin1(bytes),
            TextEncoding::Auto => match std::str::from_utf8(bytes) {
                Ok(s) => s.to_owned(),
                Err(_) => latin1(bytes),
            },
        }
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbfField {
    pub name: String,
    pub code: u8,
    pub length: usize,
    pub decimals: u8,
}

impl DbfField {
    pub fn kind(&self) -> ColumnKind {
        match self.code {
            b'N' if self.decimals == 0 && self.length < 19 => ColumnKind::Integer,
            b'N' | b'F' => ColumnKind::Float,
            b'L' => ColumnKind::Bool,
            b'D' => ColumnKind::Date,
            b'I' | b'+' => ColumnKind::Integer,
            b'B' | b'O' if self.length == 8 => ColumnKind::Float,
            _ => ColumnKind::Text,
        }
    }

    fn decode(&self, raw: &[u8], encoding: TextEncoding) -> Value {
        match (self.code, self.kind()) {
            (b'I' | b'+', _) if raw.len() == 4 => {
                Value::Integer(i64::from(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])))
            }
            (b'B' | b'O', ColumnKind::Float) => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(raw);
                Value::Float(f64::from_le_bytes(buf))
            }
            // Memo payloads live in a .dbt we never open.
            (b'M' | b'G' | b'P' | b'B', _) => Value::Null,
            (_, ColumnKind::Integer) => numeric_text(raw)
                .and_then(|s| s.parse::<i64>().ok())
                .map_or(Value::Null, Value::Integer),
            (_, ColumnKind::Float) => numeric_text(raw)
                .and_then(|s| s.parse::<f64>().ok())
                .map_or(Value::Null, Value::Float),
            (_, ColumnKind::Bool) => match raw.first() {
                Some(b'T' | b't' | b'Y' | b'y') => Value::Bool(true),
                Some(b'F' | b'f' | b'N' | b'n') => Value::Bool(false),
                _ => Value::Null,
            },
            (_, ColumnKind::Date) => parse_date(raw).map_or(Value::Null, Value::Date),
            _ => {
                let text = encoding.decode(raw);
                let text = text.trim_end_matches([' ', '\0']);
                if text.is_empty() {
                    Value::Null
                } else {
                    Value::Text(text.to_string())
                }
            }
        }
    }
}

/// Trimmed ASCII numeric text; `None` for blanks and `*` overflow markers.
fn numeric_text(raw: &[u8]) -> Option<&str> {
    let s = std::str::from_utf8(raw).ok()?.trim_matches([' ', '\0']);
    if s.is_empty() || s.starts_with('*') {
        None
    } else {
        Some(s)
    }
}

fn parse_date(raw: &[u8]) -> Option<Date> {
    let s = std::str::from_utf8(raw).ok()?.trim();
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u8 = s[4..6].parse().ok()?;
    let day: u8 = s[6..8].parse().ok()?;
    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}

/// Decoded table. Deleted records are kept as `None` so row indices stay
/// aligned with `.shp` record numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct DbfTable {
    pub fields: Vec<DbfField>,
    pub records: Vec<Option<Vec<Value>>>,
}

impl DbfTable {
    pub fn columns(&self) -> Vec<Column> {
        self.fields
            .iter()
            .map(|f| Column {
                name: f.name.clone(),
                kind: f.kind(),
            })
            .collect()
    }
}

struct Header {
    num_records: usize,
    header_len: usize,
    record_len: usize,
}

pub fn read_table(data: &[u8], file: &Path, encoding: TextEncoding) -> Result<DbfTable> {
    let header = read_header(data).map_err(|reason| LoadError::invalid(file, reason))?;
    let fields = read_fields(data, &header, encoding).map_err(|reason| LoadError::invalid(file, reason))?;

    let mut offsets = Vec::with_capacity(fields.len());
    let mut offset = 1;
    for f in &fields {
        offsets.push(offset);
        offset += f.length;
    }
    if offset > header.record_len {
        return Err(LoadError::invalid(
            file,
            format!("fields span {offset} bytes but records are {} bytes", header.record_len),
        ));
    }

    let mut records = Vec::with_capacity(header.num_records);
    for i in 0..header.num_records {
        let start = header.header_len + i * header.record_len;
        let raw = data.get(start..start + header.record_len).ok_or_else(|| {
            LoadError::invalid(
                file,
                format!("truncated at record {} of {}", i + 1, header.num_records),
            )
        })?;
        if raw[0] == DELETED {
            records.push(None);
            continue;
        }
        let row = fields
            .iter()
            .zip(&offsets)
            .map(|(f, &at)| f.decode(&raw[at..at + f.length], encoding))
            .collect();
        records.push(Some(row));
    }

    Ok(DbfTable { fields, records })
}

fn read_header(data: &[u8]) -> std::result::Result<Header, String> {
    let mut c = Cursor::new(data);
    c.skip(4)?;
    let n = c.take(4)?;
    let num_records = u32::from_le_bytes([n[0], n[1], n[2], n[3]]) as usize;
    let h = c.take(2)?;
    let header_len = u16::from_le_bytes([h[0], h[1]]) as usize;
    let r = c.take(2)?;
    let record_len = u16::from_le_bytes([r[0], r[1]]) as usize;
    if header_len < 33 || header_len > data.len() {
        return Err(format!("header length {header_len} out of range"));
    }
    if record_len == 0 {
        return Err("record length is zero".to_string());
    }
    // The count comes straight from the file; never size anything by it
    // before checking the bytes are really there.
    let room = (data.len() - header_len) / record_len;
    if num_records > room {
        return Err(format!(
            "header declares {num_records} records but the file holds at most {room}"
        ));
    }
    Ok(Header {
        num_records,
        header_len,
        record_len,
    })
}

fn read_fields(data: &[u8], header: &Header, encoding: TextEncoding) -> std::result::Result<Vec<DbfField>, String> {
    let mut c = Cursor::new(&data[..header.header_len]);
    c.skip(32)?;
    let mut fields: Vec<DbfField> = Vec::new();
    while c.remaining() >= 32 {
        let desc = c.take(32)?;
        if desc[0] == FIELD_TERMINATOR {
            break;
        }
        let name_end = desc[..11].iter().position(|&b| b == 0).unwrap_or(11);
        let name = encoding.decode(&desc[..name_end]).trim().to_string();
        let mut field = DbfField {
            name,
            code: desc[11].to_ascii_uppercase(),
            length: usize::from(desc[16]),
            decimals: desc[17],
        };
        // Character fields longer than 255 borrow the decimal byte as a high byte.
        if field.code == b'C' && field.decimals > 0 {
            field.length += usize::from(field.decimals) << 8;
            field.decimals = 0;
        }
        if fields.iter().any(|f| f.name == field.name) {
            field.name = dedupe(&field.name, &fields);
        }
        fields.push(field);
    }
    Ok(fields)
}

fn dedupe(name: &str, existing: &[DbfField]) -> String {
    (1..)
        .map(|i| format!("{name}_{i}"))
        .find(|candidate| existing.iter().all(|f| &f.name != candidate))
        .unwrap_or_else(|| name.to_string())
}
