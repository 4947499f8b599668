// crates/shp-pivot-core/src/widget.rs

// ---------------------------------------------------------------------------
// ⚠️ FILE GUARD: This entire module is skipped if 'json' feature is missing.
// ---------------------------------------------------------------------------
#![cfg(feature = "json")]

//! # Pivot widget hand-off
//!
//! The interactive pivot/chart widget is an external component. This module
//! produces the table it consumes and persists the view configuration it
//! writes back.

use crate::config::WidgetConfig;
use crate::error::Result;
use crate::model::{ColumnKind, RecordSet};
use serde::Serialize;
use serde_json::{Map, Value as Json};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("table has {cells} cells ({rows} rows × {columns} columns), limit is {max}")]
    TooLarge {
        rows: usize,
        columns: usize,
        cells: usize,
        max: usize,
    },
    #[error("table has no columns to analyse")]
    NoColumns,
}

/// Semantic role of a field as the widget understands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Quantitative,
    Nominal,
    Temporal,
    Geographic,
}

impl From<ColumnKind> for SemanticType {
    fn from(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Integer | ColumnKind::Float => SemanticType::Quantitative,
            ColumnKind::Text | ColumnKind::Bool => SemanticType::Nominal,
            ColumnKind::Date => SemanticType::Temporal,
            ColumnKind::Geometry => SemanticType::Geographic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub semantic_type: SemanticType,
    /// Measures aggregate; dimensions group.
    pub analytic_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetPayload {
    pub fields: Vec<Field>,
    pub rows: Vec<Map<String, Json>>,
}

impl WidgetPayload {
    pub fn build(rs: &RecordSet, config: &WidgetConfig) -> std::result::Result<Self, RenderError> {
        let columns = rs.columns().len();
        if columns == 0 {
            return Err(RenderError::NoColumns);
        }
        let cells = rs.len().saturating_mul(columns);
        if cells > config.max_cells {
            return Err(RenderError::TooLarge {
                rows: rs.len(),
                columns,
                cells,
                max: config.max_cells,
            });
        }

        let fields = rs
            .columns()
            .iter()
            .map(|c| {
                let semantic_type = SemanticType::from(c.kind);
                Field {
                    name: c.name.clone(),
                    semantic_type,
                    analytic_type: if semantic_type == SemanticType::Quantitative {
                        "measure"
                    } else {
                        "dimension"
                    },
                }
            })
            .collect();

        Ok(Self {
            fields,
            rows: rs.to_json_rows(),
        })
    }
}

/// The widget's saved view (chart layout, encodings). Opaque to us; stored
/// as pretty JSON next to the application.
#[derive(Debug, Clone)]
pub struct WidgetSpecStore {
    path: PathBuf,
}

impl WidgetSpecStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Empty object when nothing has been saved yet.
    pub fn read(&self) -> Result<Json> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Json::Object(Map::new())),
            Err(e) => Err(e.into()),
        }
    }

    pub fn write(&self, spec: &Json) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(spec)?)?;
        Ok(())
    }
}
