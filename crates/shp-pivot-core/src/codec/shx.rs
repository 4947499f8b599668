// crates/shp-pivot-core/src/codec/shx.rs

//! # Spatial index (`.shx`)
//!
//! Same 100-byte header as the `.shp`, then one 8-byte (offset, length)
//! entry per record. Only the record count is used here.

use super::shp::{parse_header, HEADER_LEN};
use crate::error::{LoadError, Result};
use std::path::Path;

pub fn record_count(data: &[u8], file: &Path) -> Result<usize> {
    let header = parse_header(data, file)?;
    let len = if header.file_len >= HEADER_LEN && header.file_len <= data.len() {
        header.file_len
    } else {
        data.len()
    };
    let body = len - HEADER_LEN;
    if body % 8 != 0 {
        return Err(LoadError::invalid(
            file,
            format!("index body of {body} bytes is not a multiple of 8"),
        ));
    }
    Ok(body / 8)
}
