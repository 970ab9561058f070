//! SQL identifiers and statement builders.
//!
//! Only identifiers (schema, table, column and index names) are ever spliced into
//! statement text, and only after [`Identifier::parse`] has accepted them. Data values
//! always travel as bind parameters (`$1`, `$2`, ...).

use std::fmt;

use crate::error::SchemaError;
use crate::fields::FieldDescriptor;

/// Column holding the reprojected geometry.
pub const GEOMETRY_COLUMN: &str = "geom";

/// Surrogate primary key column added after loading.
pub const PRIMARY_KEY_COLUMN: &str = "id";

/// PostgreSQL truncates identifiers longer than this many bytes.
const MAX_IDENTIFIER_LEN: usize = 63;

/// A validated SQL identifier: lowercase ASCII letters, digits and underscores,
/// not starting with a digit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Validates `name` as an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidIdentifier`] if the name is empty, too long, starts
    /// with a digit, or contains anything other than `[a-z0-9_]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tiger_core::sql::Identifier;
    ///
    /// assert_eq!(Identifier::parse("tract_2014").unwrap().quoted(), "\"tract_2014\"");
    /// assert!(Identifier::parse("Robert'); DROP TABLE students;--").is_err());
    /// ```
    pub fn parse(name: &str) -> std::result::Result<Self, SchemaError> {
        let invalid = |reason: &str| SchemaError::InvalidIdentifier {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(invalid("longer than 63 bytes"));
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid("must not start with a digit"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(invalid("only lowercase letters, digits and '_' are allowed"));
        }

        Ok(Self(name.to_string()))
    }

    /// The bare name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name wrapped in double quotes.
    #[must_use]
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedTable {
    /// Target schema.
    pub schema: Identifier,
    /// Table name, the group key.
    pub table: Identifier,
}

impl QualifiedTable {
    /// Creates a qualified table name.
    #[must_use]
    pub fn new(schema: Identifier, table: Identifier) -> Self {
        Self { schema, table }
    }

    /// `"schema"."table"`, ready to splice into a statement.
    #[must_use]
    pub fn quoted(&self) -> String {
        format!("{}.{}", self.schema.quoted(), self.table.quoted())
    }
}

impl fmt::Display for QualifiedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// `CREATE SCHEMA "schema"`
#[must_use]
pub fn create_schema(schema: &Identifier) -> String {
    format!("CREATE SCHEMA {}", schema.quoted())
}

/// `DROP TABLE IF EXISTS "schema"."table" CASCADE`
#[must_use]
pub fn drop_table(table: &QualifiedTable) -> String {
    format!("DROP TABLE IF EXISTS {} CASCADE", table.quoted())
}

/// `CREATE TABLE` with the geometry column first, then one column per field.
///
/// Column names must already be validated identifiers.
#[must_use]
pub fn create_table(table: &QualifiedTable, target_srid: i32, fields: &[FieldDescriptor]) -> String {
    let mut columns = vec![format!(
        "    \"{GEOMETRY_COLUMN}\" geometry(Geometry, {target_srid})"
    )];
    columns.extend(
        fields
            .iter()
            .map(|f| format!("    \"{}\" {}", f.name, f.sql_type.as_sql())),
    );
    format!("CREATE TABLE {} (\n{}\n)", table.quoted(), columns.join(",\n"))
}

/// Parameterized `INSERT` for one feature.
///
/// `$1` is the WKT geometry, `$2` the source SRID and `$3` the target SRID; attribute
/// values follow from `$4` in field order.
#[must_use]
pub fn insert_feature(table: &QualifiedTable, fields: &[FieldDescriptor]) -> String {
    let mut columns = vec![format!("\"{GEOMETRY_COLUMN}\"")];
    let mut values = vec!["ST_Transform(ST_GeomFromText($1, $2), $3)".to_string()];
    for (i, field) in fields.iter().enumerate() {
        columns.push(format!("\"{}\"", field.name));
        values.push(format!("${}", i + 4));
    }
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.quoted(),
        columns.join(", "),
        values.join(", ")
    )
}

/// `ALTER TABLE ... ADD COLUMN "id" serial PRIMARY KEY`
#[must_use]
pub fn add_primary_key(table: &QualifiedTable) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN \"{PRIMARY_KEY_COLUMN}\" serial PRIMARY KEY",
        table.quoted()
    )
}

/// Name of the spatial index on a group table.
#[must_use]
pub fn spatial_index_name(table: &QualifiedTable) -> String {
    format!("{}_{GEOMETRY_COLUMN}_gist", table.table)
}

/// `CREATE INDEX ... USING GIST ("geom")`
#[must_use]
pub fn create_spatial_index(table: &QualifiedTable) -> String {
    format!(
        "CREATE INDEX \"{}\" ON {} USING GIST (\"{GEOMETRY_COLUMN}\")",
        spatial_index_name(table),
        table.quoted()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::SqlType;

    fn table() -> QualifiedTable {
        QualifiedTable::new(
            Identifier::parse("tiger").unwrap(),
            Identifier::parse("tract_2014").unwrap(),
        )
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor {
                source_name: "NAME".to_string(),
                name: "name".to_string(),
                sql_type: SqlType::Text,
            },
            FieldDescriptor {
                source_name: "POP".to_string(),
                name: "pop".to_string(),
                sql_type: SqlType::Numeric,
            },
        ]
    }

    #[test]
    fn test_identifier_validation() {
        assert!(Identifier::parse("block_group_2014").is_ok());
        assert!(Identifier::parse("_private").is_ok());
        assert!(Identifier::parse("").is_err());
        assert!(Identifier::parse("2014_tract").is_err());
        assert!(Identifier::parse("Tract").is_err());
        assert!(Identifier::parse("tract-2014").is_err());
        assert!(Identifier::parse("a\"b").is_err());
        assert!(Identifier::parse(&"x".repeat(64)).is_err());
        assert!(Identifier::parse(&"x".repeat(63)).is_ok());
    }

    #[test]
    fn test_drop_and_schema_statements() {
        assert_eq!(
            drop_table(&table()),
            "DROP TABLE IF EXISTS \"tiger\".\"tract_2014\" CASCADE"
        );
        assert_eq!(
            create_schema(&Identifier::parse("tiger").unwrap()),
            "CREATE SCHEMA \"tiger\""
        );
    }

    #[test]
    fn test_create_table_puts_geometry_first() {
        let sql = create_table(&table(), 2913, &fields());
        assert_eq!(
            sql,
            "CREATE TABLE \"tiger\".\"tract_2014\" (\n    \"geom\" geometry(Geometry, 2913),\n    \"name\" text,\n    \"pop\" numeric\n)"
        );
    }

    #[test]
    fn test_insert_is_parameterized() {
        let sql = insert_feature(&table(), &fields());
        assert_eq!(
            sql,
            "INSERT INTO \"tiger\".\"tract_2014\" (\"geom\", \"name\", \"pop\") \
             VALUES (ST_Transform(ST_GeomFromText($1, $2), $3), $4, $5)"
        );
    }

    #[test]
    fn test_insert_without_attributes() {
        let sql = insert_feature(&table(), &[]);
        assert!(sql.ends_with("(\"geom\") VALUES (ST_Transform(ST_GeomFromText($1, $2), $3))"));
    }

    #[test]
    fn test_post_load_statements() {
        assert_eq!(
            add_primary_key(&table()),
            "ALTER TABLE \"tiger\".\"tract_2014\" ADD COLUMN \"id\" serial PRIMARY KEY"
        );
        assert_eq!(
            create_spatial_index(&table()),
            "CREATE INDEX \"tract_2014_geom_gist\" ON \"tiger\".\"tract_2014\" USING GIST (\"geom\")"
        );
    }
}
