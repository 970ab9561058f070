//! Shapefile reading.
//!
//! [`ShapefileSource`] exposes the declared attribute fields of a shapefile and streams its
//! features as [`FeatureRow`]s: geometry serialized as WKT plus the attribute values for a
//! requested list of columns, in that list's order.

use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use geozero::ToWkt;
use shapefile::dbase;

use crate::error::{LoadError, Result, SchemaError};
use crate::fields::{FieldDescriptor, FieldKind, FieldValue, SourceField};

/// Name of the synthetic deletion marker some dBASE readers expose as a field.
const DELETION_FLAG: &str = "DeletionFlag";

/// One feature ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    /// Zero-based index of the feature within its shapefile.
    pub index: usize,
    /// Geometry as Well-Known Text, in the shapefile's native reference system.
    pub wkt: String,
    /// Attribute values, ordered like the column list they were read for.
    pub values: Vec<FieldValue>,
}

/// A shapefile on disk together with its attribute table layout.
#[derive(Debug, Clone)]
pub struct ShapefileSource {
    path: PathBuf,
    fields: Vec<SourceField>,
}

impl ShapefileSource {
    /// Opens a shapefile and reads its field definitions in declared order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Open`] if the `.dbf` attribute table cannot be read.
    pub fn open(path: &Path) -> Result<Self> {
        let dbf_path = path.with_extension("dbf");
        let table = dbase::Reader::from_path(&dbf_path).map_err(|e| SchemaError::Open {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        let fields = table
            .fields()
            .iter()
            .filter(|f| f.name() != DELETION_FLAG)
            .map(|f| SourceField {
                name: f.name().to_string(),
                kind: FieldKind::from_dbase(f.field_type()),
            })
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            fields,
        })
    }

    /// Path of the `.shp` file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Declared attribute fields, in order.
    #[must_use]
    pub fn fields(&self) -> &[SourceField] {
        &self.fields
    }

    /// Checks that every column can be read from this shapefile.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MissingField`] naming the first absent field.
    pub fn check_columns(&self, columns: &[FieldDescriptor]) -> Result<()> {
        for column in columns {
            if !self.fields.iter().any(|f| f.name == column.source_name) {
                return Err(LoadError::MissingField {
                    path: self.path.clone(),
                    field: column.source_name.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Opens the shapefile for reading features.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Open`] if the `.shp`, `.shx` or `.dbf` file cannot be opened.
    pub fn reader(&self) -> Result<shapefile::Reader<impl Read + Seek, impl Read + Seek>> {
        shapefile::Reader::from_path(&self.path).map_err(|e| {
            SchemaError::Open {
                path: self.path.clone(),
                source: Box::new(e),
            }
            .into()
        })
    }

    /// Streams every feature from `reader`, reading values for `columns` in order.
    ///
    /// Features are read lazily. Per-feature problems (unreadable records, null or invalid
    /// shapes, mismatched values) are yielded as [`LoadError`] items carrying the feature
    /// index.
    pub fn rows<'a, T, D>(
        &'a self,
        reader: &'a mut shapefile::Reader<T, D>,
        columns: &'a [FieldDescriptor],
    ) -> impl Iterator<Item = Result<FeatureRow>> + 'a
    where
        T: Read + Seek,
        D: Read + Seek,
    {
        reader
            .iter_shapes_and_records()
            .enumerate()
            .map(move |(index, item)| {
                let (shape, record) = item.map_err(|e| self.read_error(index, e.to_string()))?;
                self.to_row(index, shape, &record, columns)
            })
    }

    fn to_row(
        &self,
        index: usize,
        shape: shapefile::Shape,
        record: &dbase::Record,
        columns: &[FieldDescriptor],
    ) -> Result<FeatureRow> {
        let geometry = geo_types::Geometry::<f64>::try_from(shape)
            .map_err(|e| self.read_error(index, format!("unsupported shape: {e}")))?;
        let wkt = geometry
            .to_wkt()
            .map_err(|e| self.read_error(index, format!("WKT encoding failed: {e}")))?;

        let mut values = Vec::with_capacity(columns.len());
        for column in columns {
            let raw = record
                .get(&column.source_name)
                .ok_or_else(|| LoadError::MissingField {
                    path: self.path.clone(),
                    field: column.source_name.clone(),
                })?;
            let value = FieldValue::from_dbase(raw, column.sql_type).map_err(|found| {
                LoadError::ValueMismatch {
                    path: self.path.clone(),
                    feature_index: index,
                    field: column.source_name.clone(),
                    expected: column.sql_type.to_string(),
                    found: found.to_string(),
                }
            })?;
            values.push(value);
        }

        Ok(FeatureRow { index, wkt, values })
    }

    fn read_error(&self, feature_index: usize, message: String) -> crate::error::TigerError {
        LoadError::FeatureRead {
            path: self.path.clone(),
            feature_index,
            message,
        }
        .into()
    }
}
