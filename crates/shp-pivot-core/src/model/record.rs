// crates/shp-pivot-core/src/model/record.rs

use super::geometry::Geometry;
use crate::text::fold_key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use time::macros::format_description;
use time::Date;

/// Name of the column that carries shape geometry when it is loaded.
pub const GEOMETRY_COLUMN: &str = "geometry";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
    Bool,
    Date,
    Geometry,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// One cell of a [`RecordSet`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(Date),
    Geometry(Box<Geometry>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Human-readable cell text. Geometry is rendered as full WKT.
    pub fn display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Date(d) => format_date(*d),
            Value::Geometry(g) => g.to_wkt(),
        }
    }

    #[cfg(feature = "json")]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Integer(i) => J::from(*i),
            // NaN/inf have no JSON representation.
            Value::Float(f) => serde_json::Number::from_f64(*f).map_or(J::Null, J::Number),
            Value::Text(s) => J::String(s.clone()),
            Value::Date(d) => J::String(format_date(*d)),
            Value::Geometry(g) => J::String(g.to_wkt()),
        }
    }
}

pub(crate) fn format_date(d: Date) -> String {
    d.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| d.to_string())
}

/// Where a record set came from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Descriptor path relative to the archive root.
    pub descriptor: PathBuf,
    /// Hex SHA-256 of the uploaded archive bytes.
    pub fingerprint: String,
}

/// Aggregate statistics for a loaded record set, in the spirit of a table
/// `describe()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordStats {
    pub rows: usize,
    pub columns: usize,
    pub has_geometry: bool,
    /// Count of features per geometry type name; `Null` for empty shapes.
    pub geometry_types: BTreeMap<String, usize>,
    pub has_crs: bool,
}

/// The loaded table: attribute columns in `.dbf` order, plus an optional
/// trailing `geometry` column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    pub(crate) columns: Vec<Column>,
    pub(crate) rows: Vec<Vec<Value>>,
    pub(crate) crs: Option<String>,
    pub(crate) source: SourceInfo,
}

impl RecordSet {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>, crs: Option<String>, source: SourceInfo) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self {
            columns,
            rows,
            crs,
            source,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Projection WKT from the `.prj` sibling, if one was shipped.
    pub fn crs(&self) -> Option<&str> {
        self.crs.as_deref()
    }

    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    pub fn has_geometry(&self) -> bool {
        self.columns.iter().any(|c| c.kind == ColumnKind::Geometry)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// First `n` rows, like a dataframe `head()`.
    pub fn head(&self, n: usize) -> &[Vec<Value>] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn stats(&self) -> RecordStats {
        let mut geometry_types = BTreeMap::new();
        if let Some(idx) = self.columns.iter().position(|c| c.kind == ColumnKind::Geometry) {
            for row in &self.rows {
                let name = match &row[idx] {
                    Value::Geometry(g) => g.type_name(),
                    _ => "Null",
                };
                *geometry_types.entry(name.to_string()).or_insert(0) += 1;
            }
        }
        RecordStats {
            rows: self.rows.len(),
            columns: self.columns.len(),
            has_geometry: self.has_geometry(),
            geometry_types,
            has_crs: self.crs.is_some(),
        }
    }

    /// Rows whose text cells contain `query`, ignoring case and accents.
    ///
    /// With `column` set only that column is inspected; unknown columns
    /// match nothing.
    pub fn find_rows_containing(&self, query: &str, column: Option<&str>) -> Vec<&[Value]> {
        let q = fold_key(query);
        if q.is_empty() {
            return Vec::new();
        }
        let targets: Vec<usize> = match column {
            Some(name) => match self.column_index(name) {
                Some(i) => vec![i],
                None => return Vec::new(),
            },
            None => self
                .columns
                .iter()
                .enumerate()
                .filter(|(_, c)| c.kind == ColumnKind::Text)
                .map(|(i, _)| i)
                .collect(),
        };

        self.rows
            .iter()
            .filter(|row| {
                targets
                    .iter()
                    .any(|&i| row[i].as_str().is_some_and(|s| fold_key(s).contains(&q)))
            })
            .map(Vec::as_slice)
            .collect()
    }

    /// Rows as JSON objects keyed by column name.
    #[cfg(feature = "json")]
    pub fn to_json_rows(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(c, v)| (c.name.clone(), v.to_json()))
                    .collect()
            })
            .collect()
    }

    /// Write the whole table as CSV (RFC 4180 quoting), geometry as WKT.
    pub fn write_csv<W: std::io::Write>(&self, mut out: W) -> std::io::Result<()> {
        let header: Vec<String> = self.columns.iter().map(|c| csv_field(&c.name)).collect();
        writeln!(out, "{}", header.join(","))?;
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(|v| csv_field(&v.display())).collect();
            writeln!(out, "{}", line.join(","))?;
        }
        out.flush()
    }
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
