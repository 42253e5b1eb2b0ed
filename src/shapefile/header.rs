/*
This code is part of the ShapeKit vector data library.
Created: 18/03/2024
Last Modified: 11/01/2025
License: MIT
*/
use crate::error::Result;
use crate::structures::BoundingBox;
use crate::utils::{ByteOrderReader, Endianness};
use std::fmt;
use std::io::{Read, Seek};

/// Byte length of the fixed header shared by SHP and SHX files.
pub const SHAPE_HEADER_LENGTH: usize = 100;

/// The fixed 100-byte header common to the SHP and SHX files.
///
/// The two files carry the same layout in independent storage: a big-endian
/// prefix (file code 9994, total file length in 16-bit words at offset 24)
/// followed by a little-endian run from offset 28 (version, shape-type code,
/// X/Y extent, Z and M ranges).
#[derive(Debug, Default, Clone)]
pub struct ShapefileHeader {
    pub file_code: i32,   // BigEndian; 9994 for valid files
    pub file_length: i32, // BigEndian; in 16-bit words
    pub version: i32,     // LittleEndian
    pub shape_type: i32,  // LittleEndian; raw on-disk code
    pub x_min: f64,       // LittleEndian
    pub y_min: f64,       // LittleEndian
    pub x_max: f64,       // LittleEndian
    pub y_max: f64,       // LittleEndian
    pub z_min: f64,       // LittleEndian; 0f64 unless the type carries z
    pub z_max: f64,       // LittleEndian
    pub m_min: f64,       // LittleEndian; 0f64 unless the type carries m
    pub m_max: f64,       // LittleEndian
}

impl ShapefileHeader {
    /// The declared global extent of the file.
    pub fn mbr(&self) -> BoundingBox {
        BoundingBox::new(self.x_min, self.y_min, self.x_max, self.y_max)
    }

    /// Reads the header from the start of the source, leaving the reader
    /// positioned at the first record.
    pub(crate) fn read_from<R: Read + Seek>(
        bor: &mut ByteOrderReader<R>,
    ) -> Result<ShapefileHeader> {
        bor.set_byte_order(Endianness::BigEndian);
        bor.seek(0)?;
        let file_code = bor.read_i32()?;
        bor.seek(24)?;
        let file_length = bor.read_i32()?;

        // the remainder of the header is in LittleEndian format
        bor.set_byte_order(Endianness::LittleEndian);
        let version = bor.read_i32()?;
        let shape_type = bor.read_i32()?;

        Ok(ShapefileHeader {
            file_code,
            file_length,
            version,
            shape_type,
            // bounding box, then the z and m ranges
            x_min: bor.read_f64()?,
            y_min: bor.read_f64()?,
            x_max: bor.read_f64()?,
            y_max: bor.read_f64()?,
            z_min: bor.read_f64()?,
            z_max: bor.read_f64()?,
            m_min: bor.read_f64()?,
            m_max: bor.read_f64()?,
        })
    }
}

impl fmt::Display for ShapefileHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "file_code: {}, file_length: {} words, version: {}, shape_type: {}, \
             extent: [{}, {}, {}, {}], z: [{}, {}], m: [{}, {}]",
            self.file_code,
            self.file_length,
            self.version,
            self.shape_type,
            self.x_min,
            self.y_min,
            self.x_max,
            self.y_max,
            self.z_min,
            self.z_max,
            self.m_min,
            self.m_max
        )
    }
}


#[cfg(test)]
mod test {
    use super::test_support::{patch_file_length, write_shape_header};
    use super::{ShapefileHeader, SHAPE_HEADER_LENGTH};
    use crate::utils::{ByteOrderReader, Endianness};
    use std::io::Cursor;

    #[test]
    fn test_read_header() {
        let mut buf = vec![];
        write_shape_header(&mut buf, 5, [-10.0, -20.0, 30.0, 40.0]);
        patch_file_length(&mut buf);

        let mut bor = ByteOrderReader::new(Cursor::new(buf), Endianness::BigEndian).unwrap();
        let header = ShapefileHeader::read_from(&mut bor).unwrap();
        assert_eq!(header.file_code, 9994);
        assert_eq!(header.file_length as usize, SHAPE_HEADER_LENGTH / 2);
        assert_eq!(header.version, 1000);
        assert_eq!(header.shape_type, 5);
        assert_eq!(header.x_min, -10.0);
        assert_eq!(header.y_min, -20.0);
        assert_eq!(header.x_max, 30.0);
        assert_eq!(header.y_max, 40.0);
        assert_eq!(bor.pos(), SHAPE_HEADER_LENGTH);
    }

    #[test]
    fn test_truncated_header_fails() {
        let buf = vec![0u8; 50];
        let mut bor = ByteOrderReader::new(Cursor::new(buf), Endianness::BigEndian).unwrap();
        assert!(ShapefileHeader::read_from(&mut bor).is_err());
    }
}
