/*
This code is part of the ShapeKit vector data library.
Created: 14/03/2024
Last Modified: 19/11/2024
License: MIT
*/
use thiserror::Error;

/// Failure modes of the shapefile decoders and the query facade.
///
/// Range errors (`RecordOutOfRange`, `InvalidRecordWindow`) identify a bad
/// request from the caller; `Io` and `MalformedRecord` identify data that
/// could not be decoded. The distinction matters to callers deciding whether
/// to blame their own arithmetic or the file on disk.
#[derive(Debug, Error)]
pub enum ShapefileError {
    /// The byte source ended, or failed, before the expected number of bytes
    /// could be read.
    #[error("i/o failure reading shapefile data: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes were read in full but their internal structure is
    /// inconsistent.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// A record number outside `1..=count` was requested.
    #[error("record number out of range: requested {requested}, store holds {available}")]
    RecordOutOfRange { requested: usize, available: usize },

    /// A geometry record was requested with a degenerate byte window.
    #[error("invalid record window: {length} bytes at offset {offset}")]
    InvalidRecordWindow { offset: usize, length: usize },

    /// A shape-type code outside the supported set
    /// {Null, Point, PolyLine, Polygon, MultiPoint}.
    #[error("shape type code {0} is not supported")]
    UnsupportedShapeType(i32),

    /// Null shapes have no well-known-text rendition.
    #[error("geometry has no well-known-text form")]
    NoWktForm,
}

pub type Result<T> = std::result::Result<T, ShapefileError>;
