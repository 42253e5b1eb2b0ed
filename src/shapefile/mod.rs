/*
This code is part of the ShapeKit vector data library.
Created: 02/04/2024
Last Modified: 02/06/2025
License: MIT

Notes: The query facade joining the three mandatory stores of a shapefile
(geometry, index, attributes) plus the optional projection text.
*/

pub mod attributes;
pub mod geometry;
pub mod header;
pub mod shp;
pub mod shx;
pub mod wkt;

pub use self::attributes::{AttributeRecord, AttributeTable, FieldDescriptor, FieldValue};
pub use self::geometry::{Geometry, MultiPart, ShapeType};
pub use self::header::ShapefileHeader;
pub use self::shp::{ShapeRecord, ShapeStore};
pub use self::shx::{IndexRecord, ShapeIndex};

use crate::error::{Result, ShapefileError};
use crate::structures::BoundingBox;
use log::debug;
use std::io::{Read, Seek};

/// One joined result of a query: the record number shared by the three
/// stores, the shape decoded from the geometry store (absent when the index
/// has no entry for the record), and the attribute values (empty unless
/// requested).
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub record_num: usize,
    pub shape_type: Option<ShapeType>,
    pub geometry: Option<Geometry>,
    pub attributes: Vec<FieldValue>,
}

/// A shapefile opened for querying.
///
/// The SHP, SHX, and DBF sources are mandatory; PRJ is optional and carried
/// as opaque text. All headers are read eagerly at open time and never
/// change afterwards. Record access re-reads the underlying sources and
/// repositions each store's cursor, hence `&mut self` on the query methods;
/// callers needing concurrent queries open one facade per thread.
pub struct Shapefile<R: Read + Seek> {
    shp: ShapeStore<R>,
    shx: ShapeIndex<R>,
    dbf: AttributeTable<R>,
    projection: Option<String>,
}

impl<R: Read + Seek> Shapefile<R> {
    /// Opens the three mandatory stores and, when given, slurps the
    /// projection text. Fails if any mandatory header cannot be decoded.
    pub fn open(shp: R, shx: R, dbf: R, prj: Option<R>) -> Result<Shapefile<R>> {
        let shp = ShapeStore::open(shp)?;
        let shx = ShapeIndex::open(shx)?;
        let dbf = AttributeTable::open(dbf)?;

        let projection = match prj {
            Some(mut source) => {
                let mut bytes = Vec::new();
                source.read_to_end(&mut bytes)?;
                Some(String::from_utf8_lossy(&bytes).to_string())
            }
            None => None,
        };

        debug!(
            "shapefile open: {} entities, {} indexed records, projection {}",
            dbf.record_count(),
            shx.num_records(),
            if projection.is_some() { "present" } else { "absent" }
        );
        Ok(Shapefile {
            shp,
            shx,
            dbf,
            projection,
        })
    }

    /// The geometry store's header: declared shape type and global extent.
    pub fn header(&self) -> &ShapefileHeader {
        self.shp.header()
    }

    /// The number of entities in the file. The attribute store's record
    /// count is authoritative.
    pub fn entity_count(&self) -> usize {
        self.dbf.record_count()
    }

    /// The attribute table's column layout, in on-disk order.
    pub fn field_descriptors(&self) -> &[FieldDescriptor] {
        self.dbf.fields()
    }

    /// The projection text, when a PRJ source was supplied.
    pub fn projection(&self) -> Option<&str> {
        self.projection.as_deref()
    }

    /// Fetches the entity with the given 1-based record number. Attribute
    /// values are decoded only when `include_attributes` is set; skipping
    /// them avoids a read of the attribute store.
    pub fn entity_by_record_number(
        &mut self,
        record_num: usize,
        include_attributes: bool,
    ) -> Result<Entity> {
        let available = self.entity_count();
        if record_num < 1 || record_num > available {
            return Err(ShapefileError::RecordOutOfRange {
                requested: record_num,
                available,
            });
        }

        let mut entity = Entity {
            record_num,
            shape_type: None,
            geometry: None,
            attributes: Vec::new(),
        };

        // the index is best-effort; a record it does not cover simply has
        // no geometry
        if record_num <= self.shx.num_records() {
            let index_record = self.shx.record_at(record_num)?;
            let shape_record = self.shp.record_at(index_record.offset, index_record.length)?;
            entity.shape_type = Some(shape_record.shape_type);
            entity.geometry = Some(shape_record.geometry);
        }

        if include_attributes {
            entity.attributes = self.dbf.record_at(record_num)?.values;
        }

        Ok(entity)
    }

    /// Returns, in ascending record order, every entity whose geometry MBR
    /// strictly overlaps the query rectangle (see
    /// [`BoundingBox::overlaps_interior`]: touching edges do not count).
    /// Attributes are decoded only for entities that pass the filter, and
    /// only when requested.
    pub fn entities_in_rectangle(
        &mut self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        include_attributes: bool,
    ) -> Result<Vec<Entity>> {
        let query = BoundingBox::new(min_x, min_y, max_x, max_y);
        let mut output = Vec::new();
        for record_num in 1..=self.entity_count() {
            let mut entity = self.entity_by_record_number(record_num, false)?;
            let hit = match entity.geometry {
                Some(ref geometry) => geometry.bounding_box().overlaps_interior(query),
                None => false,
            };
            if !hit {
                continue;
            }
            if include_attributes {
                entity.attributes = self.dbf.record_at(record_num)?.values;
            }
            output.push(entity);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod test {
    use super::{Entity, Shapefile};
    use crate::error::ShapefileError;
    use crate::shapefile::attributes::test_support::build_dbf;
    use crate::shapefile::geometry::ShapeType;
    use crate::shapefile::header::test_support::{patch_file_length, write_shape_header};
    use crate::shapefile::shp::test_support::{append_record, point_content, poly_content};
    use crate::shapefile::attributes::FieldValue;
    use byteorder::{BigEndian, WriteBytesExt};
    use std::io::Cursor;

    const PRJ_TEXT: &str =
        "GEOGCS[\"GCS_WGS_1984\",DATUM[\"D_WGS_1984\",SPHEROID[\"WGS_1984\",6378137.0,298.257223563]]]";

    /// Builds a consistent SHP + SHX pair from record contents, plus a DBF
    /// with fields Field1 (N) and Name (C) holding `rows`.
    fn build_trio(
        contents: &[Vec<u8>],
        rows: &[(&str, &str)],
    ) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
        let mut shp = vec![];
        write_shape_header(&mut shp, 5, [0.0, 0.0, 100.0, 100.0]);
        let mut shx = vec![];
        write_shape_header(&mut shx, 5, [0.0, 0.0, 100.0, 100.0]);

        for (i, content) in contents.iter().enumerate() {
            let (offset, length) = append_record(&mut shp, (i + 1) as i32, content);
            shx.write_i32::<BigEndian>((offset / 2) as i32).unwrap();
            shx.write_i32::<BigEndian>((length / 2) as i32).unwrap();
        }
        patch_file_length(&mut shp);
        patch_file_length(&mut shx);

        let dbf_rows: Vec<(u8, Vec<String>)> = rows
            .iter()
            .map(|(a, b)| (0x20u8, vec![a.to_string(), b.to_string()]))
            .collect();
        let dbf = build_dbf(
            (124, 5, 17),
            &[("Field1", 'N', 4, 0), ("Name", 'C', 8, 0)],
            &dbf_rows,
        );
        (shp, shx, dbf)
    }

    fn sample_shapefile(with_prj: bool) -> Shapefile<Cursor<Vec<u8>>> {
        // record 1: a point at (1, 1)
        // record 2: a square polygon covering [2, 2, 6, 6]
        // record 3: a point at (10, 10)
        let contents = vec![
            point_content(1.0, 1.0),
            poly_content(
                5,
                [2.0, 2.0, 6.0, 6.0],
                &[0],
                &[(2.0, 2.0), (6.0, 2.0), (6.0, 6.0), (2.0, 2.0)],
            ),
            point_content(10.0, 10.0),
        ];
        let rows = [("   1", "first"), ("   2", "square"), ("   3", "far")];
        let (shp, shx, dbf) = build_trio(&contents, &rows);
        let prj = if with_prj {
            Some(Cursor::new(PRJ_TEXT.as_bytes().to_vec()))
        } else {
            None
        };
        Shapefile::open(Cursor::new(shp), Cursor::new(shx), Cursor::new(dbf), prj).unwrap()
    }

    fn record_nums(entities: &[Entity]) -> Vec<usize> {
        entities.iter().map(|e| e.record_num).collect()
    }

    #[test]
    fn test_open_reads_all_headers() {
        let sf = sample_shapefile(true);
        assert_eq!(sf.entity_count(), 3);
        assert_eq!(sf.field_descriptors().len(), 2);
        assert_eq!(sf.field_descriptors()[0].name, "Field1");
        assert_eq!(sf.header().shape_type, 5);
        assert!(sf.projection().unwrap().starts_with("GEOGCS"));
    }

    #[test]
    fn test_missing_prj_is_not_an_error() {
        let sf = sample_shapefile(false);
        assert_eq!(sf.projection(), None);
    }

    #[test]
    fn test_entity_round_trip_by_record_number() {
        let mut sf = sample_shapefile(false);
        for n in 1..=sf.entity_count() {
            let entity = sf.entity_by_record_number(n, true).unwrap();
            assert_eq!(entity.record_num, n);
            assert_eq!(entity.attributes.len(), sf.field_descriptors().len());
        }
        let entity = sf.entity_by_record_number(2, true).unwrap();
        assert_eq!(entity.shape_type, Some(ShapeType::Polygon));
        assert_eq!(entity.attributes[0], FieldValue::Numeric(2.0));
        assert_eq!(entity.attributes[1], FieldValue::Text("square".to_string()));
    }

    #[test]
    fn test_decoded_point_round_trips_through_wkt() {
        let mut sf = sample_shapefile(false);
        let entity = sf.entity_by_record_number(1, false).unwrap();
        let wkt = crate::shapefile::wkt::geometry_to_wkt(entity.geometry.as_ref().unwrap());
        assert_eq!(wkt.unwrap(), "POINT (1 1)");
    }

    #[test]
    fn test_attributes_only_on_request() {
        let mut sf = sample_shapefile(false);
        let entity = sf.entity_by_record_number(1, false).unwrap();
        assert!(entity.attributes.is_empty());
        assert!(entity.geometry.is_some());
    }

    #[test]
    fn test_record_number_bounds() {
        let mut sf = sample_shapefile(false);
        for bad in [0usize, 4] {
            match sf.entity_by_record_number(bad, false) {
                Err(ShapefileError::RecordOutOfRange {
                    requested,
                    available,
                }) => {
                    assert_eq!(requested, bad);
                    assert_eq!(available, 3);
                }
                other => panic!("expected RecordOutOfRange, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_rectangle_query_filters_and_orders() {
        let mut sf = sample_shapefile(false);
        // covers the point at (1, 1) and the edge of the square
        let hits = sf.entities_in_rectangle(0.0, 0.0, 3.0, 3.0, false).unwrap();
        assert_eq!(record_nums(&hits), vec![1, 2]);
        assert!(hits.iter().all(|e| e.attributes.is_empty()));

        // far corner: only the point at (10, 10)
        let hits = sf.entities_in_rectangle(9.0, 9.0, 11.0, 11.0, true).unwrap();
        assert_eq!(record_nums(&hits), vec![3]);
        assert_eq!(hits[0].attributes.len(), 2);

        // everything
        let hits = sf
            .entities_in_rectangle(-100.0, -100.0, 100.0, 100.0, false)
            .unwrap();
        assert_eq!(record_nums(&hits), vec![1, 2, 3]);
    }

    #[test]
    fn test_rectangle_query_is_strict_about_touching_edges() {
        let mut sf = sample_shapefile(false);
        // shares only an edge with the square's MBR [2, 2, 6, 6]
        let hits = sf.entities_in_rectangle(6.0, 2.0, 8.0, 6.0, false).unwrap();
        assert!(hits.is_empty());
        // shares only a corner with the point at (1, 1)
        let hits = sf.entities_in_rectangle(1.0, 1.0, 2.0, 2.0, false).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_records_beyond_the_index_have_no_geometry() {
        // two geometry records, but three attribute rows: the DBF count is
        // authoritative and the third entity simply has no shape
        let contents = vec![point_content(1.0, 1.0), point_content(2.0, 2.0)];
        let rows = [("   1", "one"), ("   2", "two"), ("   3", "three")];
        let (shp, shx, dbf) = build_trio(&contents, &rows);
        let mut sf =
            Shapefile::open(Cursor::new(shp), Cursor::new(shx), Cursor::new(dbf), None).unwrap();
        assert_eq!(sf.entity_count(), 3);
        let entity = sf.entity_by_record_number(3, true).unwrap();
        assert_eq!(entity.geometry, None);
        assert_eq!(entity.shape_type, None);
        assert_eq!(entity.attributes.len(), 2);
        // and the rectangle scan skips it rather than failing
        let hits = sf
            .entities_in_rectangle(-10.0, -10.0, 10.0, 10.0, false)
            .unwrap();
        assert_eq!(record_nums(&hits), vec![1, 2]);
    }
}
