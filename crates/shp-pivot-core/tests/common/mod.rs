// crates/shp-pivot-core/tests/common/mod.rs
#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

/// In-memory point shapefile: `.shp`, `.shx` and `.dbf` bytes for `n`
/// features with `ID` and `NAME` attributes.
pub struct PointLayer {
    pub shp: Vec<u8>,
    pub shx: Vec<u8>,
    pub dbf: Vec<u8>,
}

fn file_header(shape_type: i32, total_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(100);
    out.extend_from_slice(&9994i32.to_be_bytes());
    out.extend_from_slice(&[0u8; 20]);
    out.extend_from_slice(&((total_len / 2) as i32).to_be_bytes());
    out.extend_from_slice(&1000i32.to_le_bytes());
    out.extend_from_slice(&shape_type.to_le_bytes());
    out.extend_from_slice(&[0u8; 64]);
    out
}

pub fn point_layer(n: usize) -> PointLayer {
    const CONTENT_LEN: usize = 20;
    let record_len = 8 + CONTENT_LEN;

    let mut shp = file_header(1, 100 + n * record_len);
    let mut shx = file_header(1, 100 + n * 8);
    for i in 0..n {
        let offset = 100 + i * record_len;
        shx.extend_from_slice(&((offset / 2) as i32).to_be_bytes());
        shx.extend_from_slice(&((CONTENT_LEN / 2) as i32).to_be_bytes());

        shp.extend_from_slice(&((i + 1) as i32).to_be_bytes());
        shp.extend_from_slice(&((CONTENT_LEN / 2) as i32).to_be_bytes());
        shp.extend_from_slice(&1i32.to_le_bytes());
        shp.extend_from_slice(&(i as f64).to_le_bytes());
        shp.extend_from_slice(&(-(i as f64)).to_le_bytes());
    }

    let fields: [(&str, u8, u8); 2] = [("ID", b'N', 8), ("NAME", b'C', 16)];
    let record_len = 1 + fields.iter().map(|f| f.2 as usize).sum::<usize>();
    let header_len = 32 + 32 * fields.len() + 1;
    let mut dbf = vec![0x03, 124, 1, 1];
    dbf.extend_from_slice(&(n as u32).to_le_bytes());
    dbf.extend_from_slice(&(header_len as u16).to_le_bytes());
    dbf.extend_from_slice(&(record_len as u16).to_le_bytes());
    dbf.extend_from_slice(&[0u8; 20]);
    for (name, code, len) in fields {
        let mut desc = [0u8; 32];
        desc[..name.len()].copy_from_slice(name.as_bytes());
        desc[11] = code;
        desc[16] = len;
        dbf.extend_from_slice(&desc);
    }
    dbf.push(0x0D);
    for i in 0..n {
        dbf.push(b' ');
        dbf.extend_from_slice(format!("{:>8}", i + 1).as_bytes());
        dbf.extend_from_slice(format!("{:<16}", format!("parcel {}", i + 1)).as_bytes());
    }
    dbf.push(0x1A);

    PointLayer { shp, shx, dbf }
}

/// Zip archive of `(name, bytes)` entries, stored uncompressed.
pub fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut w = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, data) in entries {
        w.start_file(*name, opts).unwrap();
        w.write_all(data).unwrap();
    }
    w.finish().unwrap().into_inner()
}

/// `parcels.shp/.shx/.dbf` with `n` features under `prefix`.
pub fn parcels_zip(prefix: &str, n: usize) -> Vec<u8> {
    let layer = point_layer(n);
    let shp = format!("{prefix}parcels.shp");
    let shx = format!("{prefix}parcels.shx");
    let dbf = format!("{prefix}parcels.dbf");
    zip_of(&[
        (shp.as_str(), layer.shp.as_slice()),
        (shx.as_str(), layer.shx.as_slice()),
        (dbf.as_str(), layer.dbf.as_slice()),
    ])
}
