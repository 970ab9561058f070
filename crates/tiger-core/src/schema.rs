//! Schema inference for table groups.
//!
//! The first shapefile of a group is the template: its fields, in declared order, become
//! the table's attribute columns. Creation is unconditional. Every run drops the group's
//! table (`DROP ... CASCADE`) and creates it again, so re-running replaces previously
//! loaded rows instead of appending to them.

use std::collections::HashSet;
use std::path::Path;

use log::debug;

use crate::error::{Result, SchemaError};
use crate::fields::FieldDescriptor;
use crate::source::ShapefileSource;
use crate::sql::{self, GEOMETRY_COLUMN, Identifier, PRIMARY_KEY_COLUMN, QualifiedTable};

/// Everything needed to create and fill one group table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Schema-qualified table name.
    pub table: QualifiedTable,
    /// Attribute columns in insert order.
    pub fields: Vec<FieldDescriptor>,
    /// SRID of the source geometries.
    pub source_srid: i32,
    /// SRID the geometries are transformed to.
    pub target_srid: i32,
    /// `DROP TABLE IF EXISTS ... CASCADE`
    pub drop_statement: String,
    /// `CREATE TABLE ...`
    pub create_statement: String,
    /// Parameterized `INSERT ...` for one feature.
    pub insert_statement: String,
}

impl TableSpec {
    /// Builds the statements for `table` with the given columns.
    #[must_use]
    pub fn new(
        table: QualifiedTable,
        fields: Vec<FieldDescriptor>,
        source_srid: i32,
        target_srid: i32,
    ) -> Self {
        Self {
            drop_statement: sql::drop_table(&table),
            create_statement: sql::create_table(&table, target_srid, &fields),
            insert_statement: sql::insert_feature(&table, &fields),
            table,
            fields,
            source_srid,
            target_srid,
        }
    }

    /// `ALTER TABLE ... ADD COLUMN "id" serial PRIMARY KEY`
    #[must_use]
    pub fn primary_key_statement(&self) -> String {
        sql::add_primary_key(&self.table)
    }

    /// `CREATE INDEX ... USING GIST`
    #[must_use]
    pub fn spatial_index_statement(&self) -> String {
        sql::create_spatial_index(&self.table)
    }
}

/// Reads the template shapefile and maps each field to a column.
///
/// # Errors
///
/// Returns [`SchemaError::UnsupportedFieldType`] for the first field whose type has no
/// column mapping, [`SchemaError::InvalidIdentifier`] if a lowercased field name is not a
/// safe identifier, and [`SchemaError::DuplicateColumn`] if two fields (or a field and a
/// reserved column) share a name. No partial field list is ever returned.
pub fn infer_fields(source: &ShapefileSource) -> Result<Vec<FieldDescriptor>> {
    let mut seen: HashSet<String> = [GEOMETRY_COLUMN, PRIMARY_KEY_COLUMN]
        .iter()
        .map(ToString::to_string)
        .collect();
    let mut descriptors = Vec::with_capacity(source.fields().len());

    for field in source.fields() {
        let sql_type = field
            .kind
            .sql_type()
            .ok_or_else(|| SchemaError::UnsupportedFieldType {
                path: source.path().to_path_buf(),
                field: field.name.clone(),
                field_type: field.kind.to_string(),
            })?;

        let name = Identifier::parse(&field.name.to_lowercase())?;
        if !seen.insert(name.as_str().to_string()) {
            return Err(SchemaError::DuplicateColumn {
                path: source.path().to_path_buf(),
                column: name.to_string(),
            }
            .into());
        }

        descriptors.push(FieldDescriptor {
            source_name: field.name.clone(),
            name: name.to_string(),
            sql_type,
        });
    }

    Ok(descriptors)
}

/// Infers the table specification for a group from its template shapefile.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidIdentifier`] if `group_key` is not a safe table name, or
/// any error from opening the shapefile or [`infer_fields`].
pub fn infer_table_spec(
    template: &Path,
    schema: &Identifier,
    group_key: &str,
    source_srid: i32,
    target_srid: i32,
) -> Result<TableSpec> {
    let table = QualifiedTable::new(schema.clone(), Identifier::parse(group_key)?);
    let source = ShapefileSource::open(template)?;
    let fields = infer_fields(&source)?;

    debug!(
        "Inferred {} column(s) for {table} from {}",
        fields.len(),
        template.display()
    );
    Ok(TableSpec::new(table, fields, source_srid, target_srid))
}
