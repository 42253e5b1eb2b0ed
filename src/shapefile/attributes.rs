/*
This code is part of the ShapeKit vector data library.
Created: 25/03/2024
Last Modified: 02/06/2025
License: MIT

NOTE: Structures and functions for the tabular attribute store (.dbf) that
accompanies the geometry and index stores.
*/
use crate::error::{Result, ShapefileError};
use crate::utils::{ByteOrderReader, Endianness};
use chrono::NaiveDate;
use log::{debug, warn};
use std::io::{Read, Seek};

/// Byte length of the fixed header prefix and of each field descriptor.
pub const HEADER_PREFIX_LENGTH: usize = 32;
const FIELD_DESCRIPTOR_LENGTH: usize = 32;

/// Value of the record liveness marker that flags a deleted record.
pub const DELETED_MARKER: u8 = 0x2A;

/// The fixed fields of the DBF header. `num_fields` is not stored on disk;
/// it is derived from the header size.
#[derive(Debug, Default, Clone)]
pub struct AttributeHeader {
    pub version: u8,
    pub date_modified: Option<NaiveDate>,
    pub num_records: u32,
    pub num_fields: u32,
    pub bytes_in_header: u16,
    pub bytes_in_record: u16,
}

/// One column of the attribute table, in on-disk order. Shared read-only by
/// every record of the store.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: char,
    pub field_length: u8,
    pub decimal_count: u8,
}

/// One attribute cell. `N` and `F` fields both decode to `Numeric` (a 64-bit
/// float) regardless of their decimal count; empty or unparsable numeric and
/// date text decodes to `Null` rather than failing the record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Numeric(f64),
    Text(String),
    Date(NaiveDate),
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// One row of the attribute table: the liveness flag plus exactly one value
/// per field descriptor, in descriptor order. Deleted rows decode normally
/// and are merely flagged.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRecord {
    pub record_num: usize,
    pub active: bool,
    pub values: Vec<FieldValue>,
}

/// The DBF store: a variable-length header (fixed prefix + one descriptor
/// per field) followed by fixed-length records addressed by 1-based record
/// number.
pub struct AttributeTable<R: Read + Seek> {
    bor: ByteOrderReader<R>,
    header: AttributeHeader,
    fields: Vec<FieldDescriptor>,
}

impl<R: Read + Seek> AttributeTable<R> {
    pub fn open(source: R) -> Result<AttributeTable<R>> {
        let mut bor = ByteOrderReader::new(source, Endianness::LittleEndian)?;

        let version = bor.read_u8()?;
        let year = bor.read_u8()?;
        let month = bor.read_u8()?;
        let day = bor.read_u8()?;
        let date_modified = NaiveDate::from_ymd_opt(1900 + year as i32, month as u32, day as u32);
        if date_modified.is_none() {
            warn!(
                "dbf header carries an unparsable last-modified date ({}-{}-{})",
                1900 + year as i32,
                month,
                day
            );
        }
        let num_records = bor.read_u32()?;
        let bytes_in_header = bor.read_u16()?;
        let bytes_in_record = bor.read_u16()?;

        if (bytes_in_header as usize) < HEADER_PREFIX_LENGTH {
            return Err(ShapefileError::MalformedRecord(format!(
                "dbf header size {} is smaller than the fixed prefix",
                bytes_in_header
            )));
        }
        let num_fields =
            ((bytes_in_header as usize - HEADER_PREFIX_LENGTH) / FIELD_DESCRIPTOR_LENGTH) as u32;
        let header = AttributeHeader {
            version,
            date_modified,
            num_records,
            num_fields,
            bytes_in_header,
            bytes_in_record,
        };

        bor.seek(HEADER_PREFIX_LENGTH)?;
        let mut fields = Vec::with_capacity(header.num_fields as usize);
        for _ in 0..header.num_fields {
            let name = bor.read_utf8(11)?.replace(char::from(0), "").trim().to_string();
            let field_type = char::from(bor.read_u8()?);
            bor.inc_pos(4)?;
            let field_length = bor.read_u8()?;
            let decimal_count = bor.read_u8()?;
            bor.inc_pos(14)?;

            if !matches!(field_type.to_ascii_uppercase(), 'N' | 'F' | 'C' | 'D') {
                warn!(
                    "dbf field '{}' has unsupported type code '{}'; its values decode as null",
                    name, field_type
                );
            }
            fields.push(FieldDescriptor {
                name,
                field_type,
                field_length,
                decimal_count,
            });
        }

        debug!(
            "dbf open: {} records of {} bytes, {} fields",
            header.num_records, header.bytes_in_record, header.num_fields
        );
        Ok(AttributeTable {
            bor,
            header,
            fields,
        })
    }

    pub fn header(&self) -> &AttributeHeader {
        &self.header
    }

    pub fn record_count(&self) -> usize {
        self.header.num_records as usize
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Returns the ordinal of the named field, if present.
    pub fn field_num(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Whether the field at `index` holds numeric (`N`/`F`) data.
    pub fn is_field_numeric(&self, index: usize) -> bool {
        match self.fields.get(index) {
            Some(f) => matches!(f.field_type.to_ascii_uppercase(), 'N' | 'F'),
            None => false,
        }
    }

    /// Decodes the record for the given 1-based record number.
    pub fn record_at(&mut self, record_num: usize) -> Result<AttributeRecord> {
        let available = self.record_count();
        if record_num < 1 || record_num > available {
            return Err(ShapefileError::RecordOutOfRange {
                requested: record_num,
                available,
            });
        }

        let record_size = self.header.bytes_in_record as usize;
        if record_size == 0 {
            return Err(ShapefileError::MalformedRecord(
                "dbf header declares zero-byte records".to_string(),
            ));
        }
        let position = self.header.bytes_in_header as usize + (record_num - 1) * record_size;
        self.bor.seek(position)?;
        let mut data = vec![0u8; record_size];
        self.bor.read_exact(&mut data)?;

        let active = data[0] != DELETED_MARKER;
        let mut values = Vec::with_capacity(self.fields.len());
        let mut offset = 1usize; // field regions follow the liveness marker
        for field in &self.fields {
            let width = field.field_length as usize;
            if offset + width > data.len() {
                return Err(ShapefileError::MalformedRecord(format!(
                    "field '{}' overruns the {}-byte record",
                    field.name, record_size
                )));
            }
            let text = String::from_utf8_lossy(&data[offset..offset + width])
                .replace(char::from(0), "")
                .trim()
                .to_string();
            values.push(parse_field_value(&text, field.field_type));
            offset += width;
        }

        Ok(AttributeRecord {
            record_num,
            active,
            values,
        })
    }
}

/// Parses one trimmed field region by its descriptor's type code. Recovery
/// is local: bad numeric or date text becomes `Null`, never an error, and
/// unrecognized type codes yield `Null` so every descriptor keeps a value.
fn parse_field_value(text: &str, field_type: char) -> FieldValue {
    match field_type.to_ascii_uppercase() {
        'N' | 'F' => {
            if text.is_empty() {
                FieldValue::Null
            } else {
                match text.parse::<f64>() {
                    Ok(v) => FieldValue::Numeric(v),
                    Err(_) => FieldValue::Null,
                }
            }
        }
        'C' => FieldValue::Text(text.to_string()),
        'D' => match NaiveDate::parse_from_str(text, "%Y%m%d") {
            Ok(d) => FieldValue::Date(d),
            Err(_) => FieldValue::Null,
        },
        _ => FieldValue::Null,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use byteorder::{LittleEndian, WriteBytesExt};

    /// Emits a DBF image: header prefix, descriptors, then one fixed-width
    /// row per entry of `rows` (marker byte + concatenated field text).
    pub fn build_dbf(
        date: (u8, u8, u8),
        fields: &[(&str, char, u8, u8)],
        rows: &[(u8, Vec<String>)],
    ) -> Vec<u8> {
        let header_size = 32 + 32 * fields.len();
        let record_size = 1 + fields.iter().map(|f| f.2 as usize).sum::<usize>();

        let mut buf = vec![];
        buf.write_u8(3).unwrap(); // dBASE III version byte
        buf.write_u8(date.0).unwrap();
        buf.write_u8(date.1).unwrap();
        buf.write_u8(date.2).unwrap();
        buf.write_u32::<LittleEndian>(rows.len() as u32).unwrap();
        buf.write_u16::<LittleEndian>(header_size as u16).unwrap();
        buf.write_u16::<LittleEndian>(record_size as u16).unwrap();
        buf.resize(32, 0);

        for (name, field_type, length, decimals) in fields {
            let mut name_bytes = name.as_bytes().to_vec();
            name_bytes.resize(11, 0);
            buf.extend_from_slice(&name_bytes);
            buf.write_u8(*field_type as u8).unwrap();
            buf.resize(buf.len() + 4, 0);
            buf.write_u8(*length).unwrap();
            buf.write_u8(*decimals).unwrap();
            buf.resize(buf.len() + 14, 0);
        }

        for (marker, cells) in rows {
            buf.write_u8(*marker).unwrap();
            for (cell, field) in cells.iter().zip(fields) {
                let mut bytes = cell.as_bytes().to_vec();
                bytes.resize(field.2 as usize, b' ');
                buf.extend_from_slice(&bytes);
            }
        }
        buf
    }
}
