/*
This code is part of the ShapeKit vector data library.
Created: 21/03/2024
Last Modified: 02/06/2025
License: MIT
*/
use crate::error::{Result, ShapefileError};
use crate::shapefile::geometry::{Geometry, MultiPart, ShapeType};
use crate::shapefile::header::ShapefileHeader;
use crate::structures::{BoundingBox, Point2D};
use crate::utils::{ByteOrderReader, Endianness};
use log::debug;
use std::io::{Cursor, Read, Seek};

/// Byte length of the sub-header preceding each record's content.
pub const RECORD_HEADER_LENGTH: usize = 8;

/// One decoded SHP record: the sub-header fields plus the geometry built
/// from the record content.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    pub record_num: i32,
    /// Content length declared by the sub-header, converted from 16-bit
    /// words to bytes. Informational; addressing always comes from the SHX.
    pub content_length: usize,
    pub shape_type: ShapeType,
    pub geometry: Geometry,
}

/// The SHP store: a 100-byte header followed by variable-length records.
/// Records are not self-addressing — callers obtain each record's byte
/// offset and length from the index store.
pub struct ShapeStore<R: Read + Seek> {
    bor: ByteOrderReader<R>,
    header: ShapefileHeader,
}

impl<R: Read + Seek> ShapeStore<R> {
    pub fn open(source: R) -> Result<ShapeStore<R>> {
        let mut bor = ByteOrderReader::new(source, Endianness::BigEndian)?;
        let header = ShapefileHeader::read_from(&mut bor)?;
        debug!("shp open: header [{}]", header);
        Ok(ShapeStore { bor, header })
    }

    pub fn header(&self) -> &ShapefileHeader {
        &self.header
    }

    /// Decodes the record whose content occupies `length` bytes immediately
    /// after the 8-byte sub-header found at `offset`.
    pub fn record_at(&mut self, offset: usize, length: usize) -> Result<ShapeRecord> {
        if length == 0 {
            return Err(ShapefileError::InvalidRecordWindow { offset, length });
        }

        self.bor.set_byte_order(Endianness::BigEndian);
        self.bor.seek(offset)?;
        let record_num = self.bor.read_i32()?;
        let length_words = self.bor.read_i32()?;
        if length_words < 0 {
            return Err(ShapefileError::MalformedRecord(format!(
                "record {} declares a negative content length",
                record_num
            )));
        }

        let mut content = vec![0u8; length];
        self.bor.read_exact(&mut content)?;

        let geometry = decode_geometry(&content)?;
        Ok(ShapeRecord {
            record_num,
            content_length: length_words as usize * 2,
            shape_type: geometry.shape_type(),
            geometry,
        })
    }
}

/// Builds a typed geometry from one record's content bytes. The first four
/// bytes select the variant; everything after is little-endian.
fn decode_geometry(content: &[u8]) -> Result<Geometry> {
    let mut bor = ByteOrderReader::new(Cursor::new(content), Endianness::LittleEndian)?;
    let code = bor.read_i32()?;
    let geometry = match ShapeType::from_int(code)? {
        ShapeType::Null => Geometry::Null,
        ShapeType::Point => Geometry::Point(Point2D::new(bor.read_f64()?, bor.read_f64()?)),
        ShapeType::PolyLine => Geometry::PolyLine(read_multi_part(&mut bor)?),
        // a polygon record has the polyline layout; only the tag differs
        ShapeType::Polygon => Geometry::Polygon(read_multi_part(&mut bor)?),
        ShapeType::MultiPoint => {
            let bbox = read_bbox(&mut bor)?;
            let num_points = read_count(&mut bor, "point")?;
            let mut points = Vec::with_capacity(num_points);
            for _ in 0..num_points {
                points.push(Point2D::new(bor.read_f64()?, bor.read_f64()?));
            }
            Geometry::MultiPoint { bbox, points }
        }
    };
    Ok(geometry)
}

fn read_bbox<R: Read + Seek>(bor: &mut ByteOrderReader<R>) -> Result<BoundingBox> {
    let x_min = bor.read_f64()?;
    let y_min = bor.read_f64()?;
    let x_max = bor.read_f64()?;
    let y_max = bor.read_f64()?;
    Ok(BoundingBox::new(x_min, y_min, x_max, y_max))
}

fn read_count<R: Read + Seek>(bor: &mut ByteOrderReader<R>, what: &str) -> Result<usize> {
    let count = bor.read_i32()?;
    if count < 0 {
        return Err(ShapefileError::MalformedRecord(format!(
            "negative {} count: {}",
            what, count
        )));
    }
    Ok(count as usize)
}

/// Reads the shared polyline/polygon layout: MBR, part count, point count,
/// the part-start table, then the flat point list, which is partitioned by
/// the start table. Part `i` runs from `start[i]` to `start[i+1]` (the last
/// part runs to the end of the point list); a table that does not partition
/// the points is malformed.
fn read_multi_part<R: Read + Seek>(bor: &mut ByteOrderReader<R>) -> Result<MultiPart> {
    let bbox = read_bbox(bor)?;
    let num_parts = read_count(bor, "part")?;
    let num_points = read_count(bor, "point")?;

    let mut starts = Vec::with_capacity(num_parts);
    for _ in 0..num_parts {
        starts.push(read_count(bor, "part start")?);
    }

    let mut points = Vec::with_capacity(num_points);
    for _ in 0..num_points {
        points.push(Point2D::new(bor.read_f64()?, bor.read_f64()?));
    }

    let mut parts = Vec::with_capacity(num_parts);
    for i in 0..num_parts {
        let start = starts[i];
        let end = if i + 1 < num_parts {
            starts[i + 1]
        } else {
            num_points
        };
        if start > end || end > num_points {
            return Err(ShapefileError::MalformedRecord(format!(
                "part start table {:?} does not partition {} points",
                starts, num_points
            )));
        }
        parts.push(points[start..end].to_vec());
    }

    Ok(MultiPart { bbox, parts })
}
