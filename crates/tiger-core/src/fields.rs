//! Attribute field kinds, the SQL type mapping, and attribute values.
//!
//! Shapefile attributes live in a dBASE table. Each declared dBASE field type is first
//! classified into a [`FieldKind`] following the vector field types GIS tools report
//! (`String`, `Real`, `Integer`, ...), then mapped to a column [`SqlType`]. Only `String`
//! and `Real` map; any other kind is an error, never a silent coercion.

use std::fmt;

use shapefile::dbase::{FieldType, FieldValue as DbaseValue};

/// Vector field type of a shapefile attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Character and memo fields.
    String,
    /// Numeric, float, double and currency fields.
    Real,
    /// Binary integer fields.
    Integer,
    /// Calendar dates.
    Date,
    /// Timestamps.
    DateTime,
    /// Boolean flags.
    Logical,
}

impl FieldKind {
    /// Classifies a declared dBASE field type.
    #[must_use]
    pub fn from_dbase(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Character | FieldType::Memo => FieldKind::String,
            FieldType::Numeric | FieldType::Float | FieldType::Double | FieldType::Currency => {
                FieldKind::Real
            },
            FieldType::Integer => FieldKind::Integer,
            FieldType::Date => FieldKind::Date,
            FieldType::DateTime => FieldKind::DateTime,
            FieldType::Logical => FieldKind::Logical,
        }
    }

    /// Maps this kind to a column type, or `None` if it has no mapping.
    ///
    /// # Examples
    ///
    /// ```
    /// use tiger_core::fields::{FieldKind, SqlType};
    ///
    /// assert_eq!(FieldKind::String.sql_type(), Some(SqlType::Text));
    /// assert_eq!(FieldKind::Real.sql_type(), Some(SqlType::Numeric));
    /// assert_eq!(FieldKind::Date.sql_type(), None);
    /// ```
    #[must_use]
    pub fn sql_type(&self) -> Option<SqlType> {
        match self {
            FieldKind::String => Some(SqlType::Text),
            FieldKind::Real => Some(SqlType::Numeric),
            FieldKind::Integer | FieldKind::Date | FieldKind::DateTime | FieldKind::Logical => {
                None
            },
        }
    }

    /// Returns the type name as reported by GIS tooling.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::String => "String",
            FieldKind::Real => "Real",
            FieldKind::Integer => "Integer",
            FieldKind::Date => "Date",
            FieldKind::DateTime => "DateTime",
            FieldKind::Logical => "Logical",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column type of a loaded attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    /// `text`
    Text,
    /// `numeric`
    Numeric,
}

impl SqlType {
    /// Returns the SQL spelling of this type.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "text",
            SqlType::Numeric => "numeric",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A shapefile field declared in the attribute table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceField {
    /// Field name exactly as declared.
    pub name: String,
    /// Classified field type.
    pub kind: FieldKind,
}

/// A loaded column: lowercase name plus column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name as declared in the shapefile, used to read values.
    pub source_name: String,
    /// Lowercased column name.
    pub name: String,
    /// Column type.
    pub sql_type: SqlType,
}

impl FieldDescriptor {
    /// Returns the `(name, sql_type)` pair.
    #[must_use]
    pub fn pair(&self) -> (&str, &str) {
        (&self.name, self.sql_type.as_sql())
    }
}

/// One attribute value ready to bind to a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Value for a `text` column.
    Text(Option<String>),
    /// Value for a `numeric` column.
    Real(Option<f64>),
}

impl FieldValue {
    /// Converts a dBASE value for a column of type `sql_type`.
    ///
    /// Returns `Err` with the dBASE value's type name if it does not fit the column.
    pub fn from_dbase(
        value: &DbaseValue,
        sql_type: SqlType,
    ) -> std::result::Result<Self, &'static str> {
        match (sql_type, value) {
            (SqlType::Text, DbaseValue::Character(text)) => Ok(FieldValue::Text(text.clone())),
            (SqlType::Text, DbaseValue::Memo(text)) => Ok(FieldValue::Text(Some(text.clone()))),
            (SqlType::Numeric, DbaseValue::Numeric(number)) => Ok(FieldValue::Real(*number)),
            (SqlType::Numeric, DbaseValue::Float(number)) => {
                Ok(FieldValue::Real(number.map(f64::from)))
            },
            (SqlType::Numeric, DbaseValue::Double(number))
            | (SqlType::Numeric, DbaseValue::Currency(number)) => {
                Ok(FieldValue::Real(Some(*number)))
            },
            (_, other) => Err(dbase_type_name(other)),
        }
    }

    /// Returns `true` if the value is SQL `NULL`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Text(None) | FieldValue::Real(None))
    }
}

fn dbase_type_name(value: &DbaseValue) -> &'static str {
    match value {
        DbaseValue::Character(_) => "Character",
        DbaseValue::Numeric(_) => "Numeric",
        DbaseValue::Logical(_) => "Logical",
        DbaseValue::Date(_) => "Date",
        DbaseValue::Float(_) => "Float",
        DbaseValue::Integer(_) => "Integer",
        DbaseValue::Currency(_) => "Currency",
        DbaseValue::DateTime(_) => "DateTime",
        DbaseValue::Double(_) => "Double",
        DbaseValue::Memo(_) => "Memo",
    }
}
