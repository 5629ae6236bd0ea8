// 🗺️ Geometry
// Minimal geometry values, persisted as WKT text

use serde::{Deserialize, Serialize};
use std::fmt;

/// Longitude/latitude (x/y) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn to_wkt(&self) -> String {
        format!("POINT ({} {})", self.x, self.y)
    }

    /// Parse `POINT (x y)`.
    pub fn from_wkt(wkt: &str) -> Option<Point> {
        let inner = wkt
            .trim()
            .strip_prefix("POINT")?
            .trim()
            .strip_prefix('(')?
            .strip_suffix(')')?;

        let mut coords = inner.split_whitespace().map(str::parse::<f64>);
        let x = coords.next()?.ok()?;
        let y = coords.next()?.ok()?;
        if coords.next().is_some() {
            return None;
        }
        Some(Point { x, y })
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wkt())
    }
}

/// Ring of points; the first point is repeated at the end.
pub type Ring = Vec<Point>;

/// Geometry read from a shapefile feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    LineString(Vec<Point>),
    /// Polygons, each an outer ring followed by its holes
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// WKT geometry type name.
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "POINT",
            Geometry::LineString(_) => "LINESTRING",
            Geometry::MultiPolygon(_) => "MULTIPOLYGON",
        }
    }

    pub fn to_wkt(&self) -> String {
        match self {
            Geometry::Point(p) => p.to_wkt(),
            Geometry::LineString(points) => format!("LINESTRING {}", coords(points)),
            Geometry::MultiPolygon(polygons) => {
                let body: Vec<String> = polygons
                    .iter()
                    .map(|rings| {
                        let rings: Vec<String> = rings.iter().map(|r| coords(r)).collect();
                        format!("({})", rings.join(", "))
                    })
                    .collect();
                format!("MULTIPOLYGON ({})", body.join(", "))
            }
        }
    }
}

fn coords(points: &[Point]) -> String {
    let pairs: Vec<String> = points.iter().map(|p| format!("{} {}", p.x, p.y)).collect();
    format!("({})", pairs.join(", "))
}
