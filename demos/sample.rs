//! Builds a small zipped point shapefile in memory for the demos.
#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

const CITIES: &[(&str, i64, f64, f64)] = &[
    ("Zürich", 421_878, 8.5417, 47.3769),
    ("Genève", 203_856, 6.1432, 46.2044),
    ("Basel", 173_863, 7.5886, 47.5596),
    ("Lausanne", 139_111, 6.6323, 46.5197),
    ("Bern", 134_794, 7.4474, 46.9480),
    ("Winterthur", 114_220, 8.7241, 47.4988),
    ("Luzern", 82_620, 8.3093, 47.0502),
];

pub fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut w = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        w.start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        w.write_all(data).expect("write zip entry");
    }
    w.finish().expect("finish zip").into_inner()
}

/// `cities/cities.{shp,shx,dbf,prj,cpg}` with NAME and POP attributes.
pub fn cities_zip() -> Vec<u8> {
    let (shp, shx) = point_files();
    let dbf = dbf_file();
    zip_of(&[
        ("cities/cities.shp", &shp),
        ("cities/cities.shx", &shx),
        ("cities/cities.dbf", &dbf),
        ("cities/cities.prj", br#"GEOGCS["GCS_WGS_1984"]"#),
        ("cities/cities.cpg", b"UTF-8"),
    ])
}

/// The bare `.shp` of the sample layer.
pub fn cities_shp() -> Vec<u8> {
    point_files().0
}

fn header(file_len: usize) -> Vec<u8> {
    let mut h = Vec::with_capacity(100);
    h.extend_from_slice(&9994i32.to_be_bytes());
    h.extend_from_slice(&[0u8; 20]);
    h.extend_from_slice(&((file_len / 2) as i32).to_be_bytes());
    h.extend_from_slice(&1000i32.to_le_bytes());
    h.extend_from_slice(&1i32.to_le_bytes());
    h.extend_from_slice(&[0u8; 64]);
    h
}

fn point_files() -> (Vec<u8>, Vec<u8>) {
    let record_len = 8 + 20;
    let mut shp = header(100 + CITIES.len() * record_len);
    let mut shx = header(100 + CITIES.len() * 8);
    for (i, (_, _, x, y)) in CITIES.iter().enumerate() {
        shx.extend_from_slice(&(((100 + i * record_len) / 2) as i32).to_be_bytes());
        shx.extend_from_slice(&10i32.to_be_bytes());
        shp.extend_from_slice(&(i as i32 + 1).to_be_bytes());
        shp.extend_from_slice(&10i32.to_be_bytes());
        shp.extend_from_slice(&1i32.to_le_bytes());
        shp.extend_from_slice(&x.to_le_bytes());
        shp.extend_from_slice(&y.to_le_bytes());
    }
    (shp, shx)
}

fn dbf_file() -> Vec<u8> {
    let fields: [(&str, u8, u8); 2] = [("NAME", b'C', 24), ("POP", b'N', 10)];
    let record_len = 1 + fields.iter().map(|f| f.2 as usize).sum::<usize>();
    let header_len = 32 + 32 * fields.len() + 1;

    let mut out = vec![0x03, 124, 1, 1];
    out.extend_from_slice(&(CITIES.len() as u32).to_le_bytes());
    out.extend_from_slice(&(header_len as u16).to_le_bytes());
    out.extend_from_slice(&(record_len as u16).to_le_bytes());
    out.extend_from_slice(&[0u8; 20]);
    for (name, code, len) in fields {
        let mut desc = [0u8; 32];
        desc[..name.len()].copy_from_slice(name.as_bytes());
        desc[11] = code;
        desc[16] = len;
        out.extend_from_slice(&desc);
    }
    out.push(0x0D);
    for (name, pop, _, _) in CITIES {
        out.push(b' ');
        let mut text = name.as_bytes().to_vec();
        text.resize(24, b' ');
        out.extend_from_slice(&text);
        out.extend_from_slice(format!("{pop:>10}").as_bytes());
    }
    out.push(0x1A);
    out
}
