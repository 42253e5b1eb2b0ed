/*
This code is part of the ShapeKit vector data library.
Created: 02/04/2024
Last Modified: 19/11/2024
License: MIT
*/
use crate::error::{Result, ShapefileError};
use crate::shapefile::geometry::{Geometry, MultiPart};
use crate::structures::Point2D;

/// Renders a decoded geometry as well-known text.
///
/// Degenerate inputs collapse to the `EMPTY` form of their type. A polygon
/// always keeps the per-ring parentheses (`POLYGON ((...))` even for a
/// single ring); a single-part polyline flattens to `LINESTRING (...)`.
/// Null shapes have no WKT form and are a caller error.
pub fn geometry_to_wkt(geometry: &Geometry) -> Result<String> {
    match geometry {
        Geometry::Null => Err(ShapefileError::NoWktForm),
        Geometry::Point(p) => Ok(format!("POINT ({} {})", p.x, p.y)),
        Geometry::PolyLine(multi) => Ok(polyline_wkt(multi)),
        Geometry::Polygon(multi) => Ok(polygon_wkt(multi)),
        Geometry::MultiPoint { points, .. } => Ok(multipoint_wkt(points)),
    }
}

fn coord_list(points: &[Point2D]) -> String {
    points
        .iter()
        .map(|p| format!("{} {}", p.x, p.y))
        .collect::<Vec<String>>()
        .join(",")
}

fn polyline_wkt(multi: &MultiPart) -> String {
    let non_empty: Vec<&Vec<Point2D>> = multi.parts.iter().filter(|p| !p.is_empty()).collect();
    if non_empty.is_empty() {
        return "LINESTRING EMPTY".to_string();
    }
    if multi.parts.len() == 1 {
        return format!("LINESTRING ({})", coord_list(&multi.parts[0]));
    }
    let rendered: Vec<String> = non_empty
        .iter()
        .map(|part| format!("({})", coord_list(part)))
        .collect();
    format!("MULTILINESTRING ({})", rendered.join(","))
}

fn polygon_wkt(multi: &MultiPart) -> String {
    let non_empty: Vec<&Vec<Point2D>> = multi.parts.iter().filter(|p| !p.is_empty()).collect();
    if non_empty.is_empty() {
        return "POLYGON EMPTY".to_string();
    }
    let rendered: Vec<String> = non_empty
        .iter()
        .map(|ring| format!("({})", coord_list(ring)))
        .collect();
    format!("POLYGON ({})", rendered.join(","))
}

fn multipoint_wkt(points: &[Point2D]) -> String {
    if points.is_empty() {
        return "MULTIPOINT EMPTY".to_string();
    }
    let rendered: Vec<String> = points
        .iter()
        .map(|p| format!("({} {})", p.x, p.y))
        .collect();
    format!("MULTIPOINT ({})", rendered.join(","))
}
