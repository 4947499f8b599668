// crates/shp-pivot-core/src/codec/shp.rs

//! # Geometry stream (`.shp`)
//!
//! 100-byte header followed by variable-length records. Header integers and
//! record headers are big-endian; everything else is little-endian.

use super::cursor::{Cursor, CursorResult};
use crate::error::{LoadError, Result};
use crate::model::{Coord, Geometry, Patch, PatchKind};
use std::path::Path;

pub const FILE_CODE: i32 = 9994;
pub const VERSION: i32 = 1000;
pub const HEADER_LEN: usize = 100;

/// Values below this are the shapefile "no data" marker for measures.
const NO_DATA: f64 = -1e38;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
    MultiPatch,
}

impl ShapeType {
    pub fn from_code(code: i32) -> Option<Self> {
        use ShapeType::*;
        Some(match code {
            0 => Null,
            1 => Point,
            3 => PolyLine,
            5 => Polygon,
            8 => MultiPoint,
            11 => PointZ,
            13 => PolyLineZ,
            15 => PolygonZ,
            18 => MultiPointZ,
            21 => PointM,
            23 => PolyLineM,
            25 => PolygonM,
            28 => MultiPointM,
            31 => MultiPatch,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        use ShapeType::*;
        match self {
            Null => 0,
            Point => 1,
            PolyLine => 3,
            Polygon => 5,
            MultiPoint => 8,
            PointZ => 11,
            PolyLineZ => 13,
            PolygonZ => 15,
            MultiPointZ => 18,
            PointM => 21,
            PolyLineM => 23,
            PolygonM => 25,
            MultiPointM => 28,
            MultiPatch => 31,
        }
    }

    fn has_z(self) -> bool {
        use ShapeType::*;
        matches!(self, PointZ | PolyLineZ | PolygonZ | MultiPointZ | MultiPatch)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShpHeader {
    pub shape_type: ShapeType,
    /// Declared file length in bytes.
    pub file_len: usize,
    /// `[xmin, ymin, xmax, ymax]`
    pub bbox: [f64; 4],
}

/// Parses the shared `.shp`/`.shx` header.
pub fn parse_header(data: &[u8], file: &Path) -> Result<ShpHeader> {
    read_header(data).map_err(|reason| LoadError::invalid(file, reason))
}

fn read_header(data: &[u8]) -> CursorResult<ShpHeader> {
    let mut c = Cursor::new(data);
    let code = c.i32_be()?;
    if code != FILE_CODE {
        return Err(format!("bad file code {code}, expected {FILE_CODE}"));
    }
    c.skip(20)?;
    let words = c.i32_be()?;
    let version = c.i32_le()?;
    if version != VERSION {
        return Err(format!("unsupported version {version}"));
    }
    let raw_type = c.i32_le()?;
    let shape_type =
        ShapeType::from_code(raw_type).ok_or_else(|| format!("unknown shape type {raw_type}"))?;
    let bbox = [c.f64_le()?, c.f64_le()?, c.f64_le()?, c.f64_le()?];
    // Z and M ranges are not needed: each record carries its own.
    c.skip(32)?;
    Ok(ShpHeader {
        shape_type,
        file_len: usize::try_from(words).unwrap_or(0) * 2,
        bbox,
    })
}

/// Iterates record contents without decoding them.
struct Records<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> Records<'a> {
    fn new(data: &'a [u8], header: &ShpHeader) -> Self {
        // Trust the bytes we have over the declared length when they disagree.
        let end = if header.file_len >= HEADER_LEN && header.file_len <= data.len() {
            header.file_len
        } else {
            data.len()
        };
        Self {
            data,
            pos: HEADER_LEN,
            end,
        }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = CursorResult<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos + 8 > self.end {
            return None;
        }
        let data: &'a [u8] = self.data;
        match read_record(&data[self.pos..self.end], self.pos) {
            Ok(content) => {
                self.pos += 8 + content.len();
                Some(Ok(content))
            }
            Err(e) => {
                self.pos = self.end;
                Some(Err(e))
            }
        }
    }
}

fn read_record(buf: &[u8], offset: usize) -> CursorResult<&[u8]> {
    let mut c = Cursor::new(buf);
    let _number = c.i32_be()?;
    let words = c.i32_be()?;
    let len = usize::try_from(words)
        .map_err(|_| format!("negative content length at offset {offset}"))?;
    c.take(len * 2)
        .map_err(|_| format!("truncated record at offset {offset}"))
}

/// Decodes every record. Null shapes come back as `None`.
pub fn read_geometries(data: &[u8], file: &Path) -> Result<Vec<Option<Geometry>>> {
    let header = parse_header(data, file)?;
    Records::new(data, &header)
        .enumerate()
        .map(|(i, content)| {
            content
                .and_then(decode_shape)
                .map_err(|reason| LoadError::invalid(file, format!("record {}: {reason}", i + 1)))
        })
        .collect()
}

/// Walks record headers only; used when geometry is not wanted but no
/// attribute table exists to supply the row count.
pub fn count_records(data: &[u8], file: &Path) -> Result<usize> {
    let header = parse_header(data, file)?;
    let mut n = 0;
    for content in Records::new(data, &header) {
        content.map_err(|reason| LoadError::invalid(file, reason))?;
        n += 1;
    }
    Ok(n)
}

fn decode_shape(content: &[u8]) -> CursorResult<Option<Geometry>> {
    let mut c = Cursor::new(content);
    let raw = c.i32_le()?;
    let ty = ShapeType::from_code(raw).ok_or_else(|| format!("unknown shape type {raw}"))?;
    use ShapeType::*;
    let geom = match ty {
        Null => return Ok(None),
        Point => Geometry::Point(Coord::xy(c.f64_le()?, c.f64_le()?)),
        PointZ => {
            let (x, y, z) = (c.f64_le()?, c.f64_le()?, c.f64_le()?);
            let m = if c.remaining() >= 8 { measure(c.f64_le()?) } else { None };
            Geometry::Point(Coord { x, y, z: Some(z), m })
        }
        PointM => {
            let (x, y, m) = (c.f64_le()?, c.f64_le()?, c.f64_le()?);
            Geometry::Point(Coord {
                x,
                y,
                z: None,
                m: measure(m),
            })
        }
        MultiPoint | MultiPointZ | MultiPointM => {
            c.skip(32)?;
            let n = c.count_le(16, "point count")?;
            let mut points = read_points(&mut c, n)?;
            read_extras(&mut c, ty, &mut points)?;
            Geometry::MultiPoint(points)
        }
        PolyLine | PolyLineZ | PolyLineM | Polygon | PolygonZ | PolygonM => {
            c.skip(32)?;
            let num_parts = c.count_le(4, "part count")?;
            let num_points = c.count_le(16, "point count")?;
            let starts = read_part_starts(&mut c, num_parts, num_points)?;
            let mut points = read_points(&mut c, num_points)?;
            read_extras(&mut c, ty, &mut points)?;
            let parts = split_parts(points, &starts);
            if matches!(ty, Polygon | PolygonZ | PolygonM) {
                Geometry::Polygon(parts)
            } else {
                Geometry::PolyLine(parts)
            }
        }
        MultiPatch => {
            c.skip(32)?;
            let num_parts = c.count_le(8, "part count")?;
            let num_points = c.count_le(16, "point count")?;
            let starts = read_part_starts(&mut c, num_parts, num_points)?;
            let mut kinds = Vec::with_capacity(num_parts);
            for _ in 0..num_parts {
                let code = c.i32_le()?;
                kinds.push(PatchKind::from_code(code).ok_or_else(|| format!("unknown patch type {code}"))?);
            }
            let mut points = read_points(&mut c, num_points)?;
            read_extras(&mut c, ty, &mut points)?;
            let patches = split_parts(points, &starts)
                .into_iter()
                .zip(kinds)
                .map(|(points, kind)| Patch { kind, points })
                .collect();
            Geometry::MultiPatch(patches)
        }
    };
    Ok(Some(geom))
}

fn measure(v: f64) -> Option<f64> {
    (v > NO_DATA).then_some(v)
}

fn read_points(c: &mut Cursor<'_>, n: usize) -> CursorResult<Vec<Coord>> {
    let mut points = Vec::with_capacity(n);
    for _ in 0..n {
        points.push(Coord::xy(c.f64_le()?, c.f64_le()?));
    }
    Ok(points)
}

fn read_part_starts(c: &mut Cursor<'_>, num_parts: usize, num_points: usize) -> CursorResult<Vec<usize>> {
    let mut starts = Vec::with_capacity(num_parts);
    for _ in 0..num_parts {
        let raw = c.i32_le()?;
        let start = usize::try_from(raw).map_err(|_| format!("negative part index {raw}"))?;
        if start > num_points || starts.last().is_some_and(|&prev| start < prev) {
            return Err(format!("part index {start} out of order or range"));
        }
        starts.push(start);
    }
    Ok(starts)
}

/// Z block (Z types) and M block (Z, M and MultiPatch types) trailing the
/// XY points. The M block is optional in practice and skipped when short.
fn read_extras(c: &mut Cursor<'_>, ty: ShapeType, points: &mut [Coord]) -> CursorResult<()> {
    use ShapeType::*;
    if ty.has_z() {
        c.skip(16)?;
        for p in points.iter_mut() {
            p.z = Some(c.f64_le()?);
        }
    }
    let has_m_block = !matches!(ty, MultiPoint | PolyLine | Polygon);
    if has_m_block && c.remaining() >= 16 + 8 * points.len() {
        c.skip(16)?;
        for p in points.iter_mut() {
            p.m = measure(c.f64_le()?);
        }
    }
    Ok(())
}

fn split_parts(points: Vec<Coord>, starts: &[usize]) -> Vec<Vec<Coord>> {
    if starts.is_empty() {
        return if points.is_empty() { Vec::new() } else { vec![points] };
    }
    let mut parts = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(points.len());
        parts.push(points[start..end].to_vec());
    }
    parts
}
