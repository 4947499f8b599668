// crates/shp-pivot-core/src/model/geometry.rs

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

/// A single vertex. `z` and `m` are only present for Z/M shape types.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub m: Option<f64>,
}

impl Coord {
    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            m: None,
        }
    }
}

/// Surface patch kinds found in MultiPatch records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatchKind {
    TriangleStrip,
    TriangleFan,
    OuterRing,
    InnerRing,
    FirstRing,
    Ring,
}

impl PatchKind {
    pub(crate) fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => PatchKind::TriangleStrip,
            1 => PatchKind::TriangleFan,
            2 => PatchKind::OuterRing,
            3 => PatchKind::InnerRing,
            4 => PatchKind::FirstRing,
            5 => PatchKind::Ring,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub kind: PatchKind,
    pub points: Vec<Coord>,
}

/// Decoded shape geometry, one per non-null `.shp` record.
///
/// Parts and rings keep the order in which they were stored; polygon rings
/// are only grouped into shells and holes when rendered (see [`Geometry::to_wkt`]).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Coord),
    MultiPoint(Vec<Coord>),
    PolyLine(Vec<Vec<Coord>>),
    Polygon(Vec<Vec<Coord>>),
    MultiPatch(Vec<Patch>),
}

impl Geometry {
    /// OGC type name used in WKT and summaries.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::PolyLine(parts) if parts.len() == 1 => "LineString",
            Geometry::PolyLine(_) => "MultiLineString",
            Geometry::Polygon(rings) if group_rings(rings).len() <= 1 => "Polygon",
            Geometry::Polygon(_) => "MultiPolygon",
            Geometry::MultiPatch(_) => "MultiPatch",
        }
    }

    pub fn point_count(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            Geometry::MultiPoint(points) => points.len(),
            Geometry::PolyLine(parts) | Geometry::Polygon(parts) => parts.iter().map(Vec::len).sum(),
            Geometry::MultiPatch(patches) => patches.iter().map(|p| p.points.len()).sum(),
        }
    }

    fn has_z(&self) -> bool {
        self.first_coord().is_some_and(|c| c.z.is_some())
    }

    fn first_coord(&self) -> Option<&Coord> {
        match self {
            Geometry::Point(c) => Some(c),
            Geometry::MultiPoint(points) => points.first(),
            Geometry::PolyLine(parts) | Geometry::Polygon(parts) => {
                parts.iter().find_map(|p| p.first())
            }
            Geometry::MultiPatch(patches) => patches.iter().find_map(|p| p.points.first()),
        }
    }

    /// Render as Well-Known Text (2D, or 3D when the shape carries Z).
    ///
    /// MultiPatch has no WKT counterpart; it is rendered as a
    /// `GEOMETRYCOLLECTION` of polygons, one per patch.
    pub fn to_wkt(&self) -> String {
        let z = self.has_z();
        let tag = if z { " Z" } else { "" };
        let mut out = String::new();
        match self {
            Geometry::Point(c) => {
                let _ = write!(out, "POINT{tag} ({})", CoordText(c, z));
            }
            Geometry::MultiPoint(points) => {
                out.push_str("MULTIPOINT");
                out.push_str(tag);
                out.push(' ');
                write_list(&mut out, points, |o, c| {
                    let _ = write!(o, "({})", CoordText(c, z));
                });
            }
            Geometry::PolyLine(parts) if parts.len() == 1 => {
                out.push_str("LINESTRING");
                out.push_str(tag);
                out.push(' ');
                write_ring(&mut out, &parts[0], z);
            }
            Geometry::PolyLine(parts) => {
                out.push_str("MULTILINESTRING");
                out.push_str(tag);
                out.push(' ');
                write_list(&mut out, parts, |o, p| write_ring(o, p, z));
            }
            Geometry::Polygon(rings) => {
                let polygons = group_rings(rings);
                if polygons.len() == 1 {
                    out.push_str("POLYGON");
                    out.push_str(tag);
                    out.push(' ');
                    write_list(&mut out, &polygons[0], |o, r| write_ring(o, r, z));
                } else {
                    out.push_str("MULTIPOLYGON");
                    out.push_str(tag);
                    out.push(' ');
                    write_list(&mut out, &polygons, |o, poly| {
                        write_list(o, poly, |o, r| write_ring(o, r, z))
                    });
                }
            }
            Geometry::MultiPatch(patches) => {
                out.push_str("GEOMETRYCOLLECTION");
                out.push_str(tag);
                out.push(' ');
                write_list(&mut out, patches, |o, p| {
                    o.push_str("POLYGON");
                    o.push_str(tag);
                    o.push_str(" (");
                    write_ring(o, &p.points, z);
                    o.push(')');
                });
            }
        }
        out
    }
}

/// Signed area via the shoelace formula; negative means clockwise.
pub(crate) fn signed_area(ring: &[Coord]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for pair in ring.windows(2) {
        sum += pair[0].x * pair[1].y - pair[1].x * pair[0].y;
    }
    let (first, last) = (&ring[0], &ring[ring.len() - 1]);
    sum += last.x * first.y - first.x * last.y;
    sum / 2.0
}

/// Groups shapefile rings into polygons: a clockwise ring opens a new shell,
/// counter-clockwise rings are holes of the most recent shell. A leading
/// hole with no shell is promoted to a shell.
pub(crate) fn group_rings(rings: &[Vec<Coord>]) -> Vec<Vec<&[Coord]>> {
    let mut polygons: Vec<Vec<&[Coord]>> = Vec::new();
    for ring in rings {
        let is_shell = signed_area(ring) <= 0.0;
        if !is_shell {
            if let Some(poly) = polygons.last_mut() {
                poly.push(ring.as_slice());
                continue;
            }
        }
        polygons.push(vec![ring.as_slice()]);
    }
    polygons
}

struct CoordText<'a>(&'a Coord, bool);

impl fmt::Display for CoordText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.0;
        write!(f, "{} {}", c.x, c.y)?;
        if self.1 {
            write!(f, " {}", c.z.unwrap_or(0.0))?;
        }
        Ok(())
    }
}

fn write_ring(out: &mut String, ring: &[Coord], z: bool) {
    write_list(out, ring, |o, c| {
        let _ = write!(o, "{}", CoordText(c, z));
    });
}

fn write_list<T>(out: &mut String, items: &[T], mut each: impl FnMut(&mut String, &T)) {
    if items.is_empty() {
        // Drop the trailing space written before the list.
        out.truncate(out.trim_end().len());
        out.push_str(" EMPTY");
        return;
    }
    out.push('(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        each(out, item);
    }
    out.push(')');
}
