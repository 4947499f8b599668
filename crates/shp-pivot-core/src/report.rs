// crates/shp-pivot-core/src/report.rs

//! User-facing surfaces of a load: the status line and the preview table.

use crate::error::{ErrorKind, LoadError};
use crate::loader::LoadOutcome;
use crate::model::{RecordSet, Value};
use crate::text::group_thousands;
use serde::Serialize;
use std::fmt;

pub const NOT_FOUND_MESSAGE: &str = "No valid .shp file found in the ZIP.";
pub const RENDER_HINT: &str = "Try reducing the file size or run without the geometry option.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Success,
    Warning,
    Error,
}

/// One line of feedback for the person who uploaded the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub level: Level,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl StatusMessage {
    pub fn loaded(rows: usize) -> Self {
        Self {
            level: Level::Success,
            text: format!("Data loaded successfully! Total rows: {}", group_thousands(rows)),
            hint: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            level: Level::Error,
            text: NOT_FOUND_MESSAGE.to_string(),
            hint: None,
        }
    }

    pub fn load_failed(err: &LoadError) -> Self {
        let (text, hint) = match err.kind() {
            ErrorKind::Archive => (format!("Error reading file: {err}"), None),
            ErrorKind::Parse => (format!("Error reading shapefile: {err}"), None),
            ErrorKind::Ambiguous => (
                format!("{err}"),
                Some("Upload a ZIP with a single .shp file.".to_string()),
            ),
            ErrorKind::Internal => (format!("Internal error: {err}"), None),
        };
        Self {
            level: Level::Error,
            text,
            hint,
        }
    }

    pub fn render_failed(err: &impl fmt::Display) -> Self {
        Self {
            level: Level::Error,
            text: format!("Failed to load visualization: {err}"),
            hint: Some(RENDER_HINT.to_string()),
        }
    }

    pub fn for_outcome(outcome: &LoadOutcome) -> Self {
        match outcome.record_set() {
            Some(rs) => Self::loaded(rs.len()),
            None => Self::not_found(),
        }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n{hint}")?;
        }
        Ok(())
    }
}

/// Longest cell text shown in a preview before it is cut.
const MAX_CELL_WIDTH: usize = 40;

/// The first rows of a record set, as strings ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

impl Preview {
    pub fn new(rs: &RecordSet, n: usize) -> Self {
        Self {
            columns: rs.columns().iter().map(|c| c.name.clone()).collect(),
            rows: rs
                .head(n)
                .iter()
                .map(|row| row.iter().map(preview_cell).collect())
                .collect(),
            total_rows: rs.len(),
        }
    }
}

/// Geometry is abbreviated (`Polygon[5]`); full WKT would swamp the table.
fn preview_cell(v: &Value) -> String {
    let text = match v {
        Value::Geometry(g) => format!("{}[{}]", g.type_name(), g.point_count()),
        other => other.display(),
    };
    if text.chars().count() > MAX_CELL_WIDTH {
        let cut: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
        format!("{cut}…")
    } else {
        text
    }
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }
        let line = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(c, &w)| format!("{c:<w$}"))
                .collect();
            writeln!(f, "{}", padded.join(" | ").trim_end())
        };
        line(f, &self.columns)?;
        let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;
        for row in &self.rows {
            line(f, row)?;
        }
        if self.total_rows > self.rows.len() {
            writeln!(
                f,
                "... {} more rows",
                group_thousands(self.total_rows - self.rows.len())
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, ColumnKind, Coord, Geometry, SourceInfo};
    use std::path::PathBuf;

    fn rs(rows: usize) -> RecordSet {
        RecordSet::new(
            vec![
                Column {
                    name: "ID".into(),
                    kind: ColumnKind::Integer,
                },
                Column {
                    name: "geometry".into(),
                    kind: ColumnKind::Geometry,
                },
            ],
            (0..rows)
                .map(|i| {
                    vec![
                        Value::Integer(i as i64),
                        Value::Geometry(Box::new(Geometry::Point(Coord::xy(0.0, 0.0)))),
                    ]
                })
                .collect(),
            None,
            SourceInfo {
                descriptor: PathBuf::from("p.shp"),
                fingerprint: String::new(),
            },
        )
    }

    #[test]
    fn success_message_groups_thousands() {
        assert_eq!(
            StatusMessage::loaded(1200).text,
            "Data loaded successfully! Total rows: 1,200"
        );
    }

    #[test]
    fn archive_errors_read_as_file_errors() {
        let err = LoadError::UnsafeEntry("../etc/passwd".into());
        let msg = StatusMessage::load_failed(&err);
        assert_eq!(msg.level, Level::Error);
        assert!(msg.text.starts_with("Error reading file:"), "{}", msg.text);
    }

    #[test]
    fn render_failure_carries_hint() {
        let msg = StatusMessage::render_failed(&"too many cells");
        assert_eq!(msg.hint.as_deref(), Some(RENDER_HINT));
        assert!(msg.to_string().ends_with(RENDER_HINT));
    }

    #[test]
    fn preview_takes_head_and_abbreviates_geometry() {
        let p = Preview::new(&rs(12), 5);
        assert_eq!(p.rows.len(), 5);
        assert_eq!(p.rows[0], vec!["0".to_string(), "Point[1]".to_string()]);
        let text = p.to_string();
        assert!(text.lines().next().unwrap().starts_with("ID | geometry"));
        assert!(text.contains("... 7 more rows"));
    }
}
