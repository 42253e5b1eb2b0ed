/*
This code is part of the ShapeKit vector data library.
Created: 18/03/2024
Last Modified: 02/06/2025
License: MIT
*/
use crate::error::{Result, ShapefileError};
use crate::structures::{BoundingBox, Point2D};
use std::fmt;

/// The ESRI shape-type codes this library decodes. Z- and M-bearing variants
/// of the base types are deliberately not handled; their codes surface as
/// [`ShapefileError::UnsupportedShapeType`].
#[repr(i32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShapeType {
    Null = 0,
    Point = 1,
    PolyLine = 3,
    Polygon = 5,
    MultiPoint = 8,
}

impl ShapeType {
    pub fn from_int(value: i32) -> Result<ShapeType> {
        match value {
            0 => Ok(ShapeType::Null),
            1 => Ok(ShapeType::Point),
            3 => Ok(ShapeType::PolyLine),
            5 => Ok(ShapeType::Polygon),
            8 => Ok(ShapeType::MultiPoint),
            _ => Err(ShapefileError::UnsupportedShapeType(value)),
        }
    }

    pub fn to_int(&self) -> i32 {
        *self as i32
    }
}

impl Default for ShapeType {
    fn default() -> ShapeType {
        ShapeType::Null
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let printable = match *self {
            ShapeType::Null => "Null",
            ShapeType::Point => "Point",
            ShapeType::PolyLine => "PolyLine",
            ShapeType::Polygon => "Polygon",
            ShapeType::MultiPoint => "MultiPoint",
        };
        write!(f, "{}", printable)
    }
}

/// The payload shared by the line-based multi-part geometries: an on-disk
/// MBR plus the points partitioned into parts. A part is one ring of a
/// polygon or one chain of a polyline; both types share this representation
/// and differ only in the [`Geometry`] tag carrying it.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiPart {
    pub bbox: BoundingBox,
    pub parts: Vec<Vec<Point2D>>,
}

impl MultiPart {
    pub fn num_parts(&self) -> usize {
        self.parts.len()
    }

    pub fn num_points(&self) -> usize {
        self.parts.iter().map(|p| p.len()).sum()
    }
}

/// A decoded shape record. Immutable once constructed; the MBR read from
/// (or, for points, implied by) the record travels with the variant.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Null,
    Point(Point2D),
    PolyLine(MultiPart),
    Polygon(MultiPart),
    MultiPoint {
        bbox: BoundingBox,
        points: Vec<Point2D>,
    },
}

impl Geometry {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Geometry::Null => ShapeType::Null,
            Geometry::Point(_) => ShapeType::Point,
            Geometry::PolyLine(_) => ShapeType::PolyLine,
            Geometry::Polygon(_) => ShapeType::Polygon,
            Geometry::MultiPoint { .. } => ShapeType::MultiPoint,
        }
    }

    /// The cached minimum bounding rectangle. A point's MBR collapses onto
    /// the point; a null shape carries the zero box.
    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Geometry::Null => BoundingBox::default(),
            Geometry::Point(p) => BoundingBox::from_point(p.x, p.y),
            Geometry::PolyLine(multi) | Geometry::Polygon(multi) => multi.bbox,
            Geometry::MultiPoint { bbox, .. } => *bbox,
        }
    }
}
