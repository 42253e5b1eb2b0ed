/*
This code is part of the ShapeKit vector data library.
Created: 21/03/2024
Last Modified: 11/01/2025
License: MIT
*/
use crate::error::{Result, ShapefileError};
use crate::shapefile::header::{ShapefileHeader, SHAPE_HEADER_LENGTH};
use crate::utils::{ByteOrderReader, Endianness};
use log::debug;
use std::io::{Read, Seek};

/// Byte length of one fixed-size SHX record.
pub const INDEX_RECORD_LENGTH: usize = 8;

/// One entry of the index: where the matching geometry record lives in the
/// SHP file. Offset and length are stored on disk in 16-bit words and are
/// already doubled into byte units here.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub record_num: usize,
    pub offset: usize,
    pub length: usize,
}

/// The SHX store: a 100-byte header followed by a fixed-size record array,
/// addressed by 1-based record number.
pub struct ShapeIndex<R: Read + Seek> {
    bor: ByteOrderReader<R>,
    header: ShapefileHeader,
    num_records: usize,
}

impl<R: Read + Seek> ShapeIndex<R> {
    /// Opens the index and reads its header eagerly. The record count is
    /// derived from the source length; every record past the header is
    /// exactly 8 bytes.
    pub fn open(source: R) -> Result<ShapeIndex<R>> {
        let mut bor = ByteOrderReader::new(source, Endianness::BigEndian)?;
        let header = ShapefileHeader::read_from(&mut bor)?;
        let num_records = bor.len().saturating_sub(SHAPE_HEADER_LENGTH) / INDEX_RECORD_LENGTH;
        debug!("shx open: {} records, header [{}]", num_records, header);
        Ok(ShapeIndex {
            bor,
            header,
            num_records,
        })
    }

    pub fn header(&self) -> &ShapefileHeader {
        &self.header
    }

    pub fn num_records(&self) -> usize {
        self.num_records
    }

    /// Decodes the index entry for the given 1-based record number.
    pub fn record_at(&mut self, record_num: usize) -> Result<IndexRecord> {
        if record_num < 1 || record_num > self.num_records {
            return Err(ShapefileError::RecordOutOfRange {
                requested: record_num,
                available: self.num_records,
            });
        }

        let position = SHAPE_HEADER_LENGTH + (record_num - 1) * INDEX_RECORD_LENGTH;
        self.bor.set_byte_order(Endianness::BigEndian);
        self.bor.seek(position)?;
        let offset_words = self.bor.read_i32()?;
        let length_words = self.bor.read_i32()?;
        if offset_words < 0 || length_words < 0 {
            return Err(ShapefileError::MalformedRecord(format!(
                "index record {} has negative offset/length ({} words @ {} words)",
                record_num, length_words, offset_words
            )));
        }

        // on-disk values are in 16-bit words
        Ok(IndexRecord {
            record_num,
            offset: offset_words as usize * 2,
            length: length_words as usize * 2,
        })
    }
}
