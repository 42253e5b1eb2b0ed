/*
This code is part of the ShapeKit vector data library.
Created: 14/03/2024
Last Modified: 07/02/2025
License: MIT
*/
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::prelude::*;
use std::io::{Result, SeekFrom};

/// A positioned cursor over a byte source with a switchable byte order.
///
/// The shapefile family mixes endianness within single structures (record
/// counts are big-endian while coordinates are little-endian), so the byte
/// order is carried as state and switched by the caller per field rather
/// than fixed per reader.
pub struct ByteOrderReader<R: Read + Seek> {
    is_le: bool,
    reader: R,
    pos: usize,
    len: usize,
}

impl<R: Read + Seek> ByteOrderReader<R> {
    pub fn new(mut reader: R, byte_order: Endianness) -> Result<ByteOrderReader<R>> {
        let len = reader.seek(SeekFrom::End(0))? as usize;
        reader.seek(SeekFrom::Start(0))?;
        Ok(ByteOrderReader {
            is_le: byte_order == Endianness::LittleEndian,
            reader,
            pos: 0usize,
            len,
        })
    }

    pub fn set_byte_order(&mut self, byte_order: Endianness) {
        self.is_le = byte_order == Endianness::LittleEndian;
    }

    pub fn get_byte_order(&self) -> Endianness {
        if self.is_le {
            return Endianness::LittleEndian;
        }
        Endianness::BigEndian
    }

    pub fn seek(&mut self, position: usize) -> Result<()> {
        self.reader.seek(SeekFrom::Start(position as u64))?;
        self.pos = position;
        Ok(())
    }

    pub fn inc_pos(&mut self, skip: usize) -> Result<()> {
        self.seek(self.pos + skip)
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads `length` bytes as text, replacing invalid sequences rather than
    /// failing; fixed-width shapefile text fields are space- or NUL-padded
    /// ASCII.
    pub fn read_utf8(&mut self, length: usize) -> Result<String> {
        let mut bytes = vec![0u8; length];
        self.reader.read_exact(&mut bytes)?;
        self.pos += length;
        Ok(String::from_utf8_lossy(&bytes).to_string())
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.reader.read_exact(buf)?;
        self.pos += buf.len();
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        // single bytes carry no endian concern
        let val = self.reader.read_u8()?;
        self.pos += 1;
        Ok(val)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let val = if self.is_le {
            self.reader.read_u16::<LittleEndian>()?
        } else {
            self.reader.read_u16::<BigEndian>()?
        };
        self.pos += 2;
        Ok(val)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let val = if self.is_le {
            self.reader.read_u32::<LittleEndian>()?
        } else {
            self.reader.read_u32::<BigEndian>()?
        };
        self.pos += 4;
        Ok(val)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let val = if self.is_le {
            self.reader.read_i32::<LittleEndian>()?
        } else {
            self.reader.read_i32::<BigEndian>()?
        };
        self.pos += 4;
        Ok(val)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let val = if self.is_le {
            self.reader.read_f64::<LittleEndian>()?
        } else {
            self.reader.read_f64::<BigEndian>()?
        };
        self.pos += 8;
        Ok(val)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Endianness {
    LittleEndian,
    BigEndian,
}

impl Default for Endianness {
    fn default() -> Endianness {
        Endianness::LittleEndian
    }
}
