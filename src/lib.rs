/*
This code is part of the ShapeKit vector data library.
Created: 14/03/2024
Last Modified: 02/06/2025
License: MIT

Notes: Read-only decoding of the ESRI Shapefile format family (SHP, SHX,
DBF, PRJ) and MBR-based spatial queries over the decoded records.
*/

pub mod error;
pub mod shapefile;
pub mod structures;
pub mod utils;

// exports the commonly-used identifiers in the crate namespace
pub use crate::error::{Result, ShapefileError};
pub use crate::shapefile::attributes::{FieldDescriptor, FieldValue};
pub use crate::shapefile::geometry::{Geometry, MultiPart, ShapeType};
pub use crate::shapefile::wkt::geometry_to_wkt;
pub use crate::shapefile::{Entity, Shapefile};
