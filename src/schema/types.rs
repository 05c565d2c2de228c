//! Schema types

use arrow::datatypes::{DataType, Field, Fields, Schema, SchemaRef};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Semantic type of a canonical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Text,
    Int64,
    Float64,
    UInt8,
    UInt16,
    List(Box<SemanticType>),
    Struct(Vec<CanonicalField>),
}

impl SemanticType {
    /// The Arrow type columns of this semantic type are stored as
    pub fn data_type(&self) -> DataType {
        match self {
            SemanticType::Text => DataType::Utf8,
            SemanticType::Int64 => DataType::Int64,
            SemanticType::Float64 => DataType::Float64,
            SemanticType::UInt8 => DataType::UInt8,
            SemanticType::UInt16 => DataType::UInt16,
            SemanticType::List(inner) => {
                DataType::List(Arc::new(Field::new("item", inner.data_type(), true)))
            }
            SemanticType::Struct(fields) => DataType::Struct(Fields::from(
                fields.iter().map(CanonicalField::arrow_field).collect::<Vec<_>>(),
            )),
        }
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SemanticType::Text => write!(f, "text"),
            SemanticType::Int64 => write!(f, "int64"),
            SemanticType::Float64 => write!(f, "float64"),
            SemanticType::UInt8 => write!(f, "uint8"),
            SemanticType::UInt16 => write!(f, "uint16"),
            SemanticType::List(inner) => write!(f, "list<{inner}>"),
            SemanticType::Struct(fields) => {
                write!(f, "struct<")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.semantic_type)?;
                }
                write!(f, ">")
            }
        }
    }
}

/// One named field of a canonical schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalField {
    /// Column name
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,
}

impl CanonicalField {
    /// Create a new field
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
        }
    }

    /// Arrow field for this canonical field. Canonical fields are always nullable.
    pub fn arrow_field(&self) -> Field {
        Field::new(&self.name, self.semantic_type.data_type(), true)
    }
}

/// An immutable, ordered set of fields every aligned batch exposes.
///
/// Besides the field list it names the columns the temporal partitioner
/// reads from and writes to, so no other module hard-codes column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSchema {
    fields: Vec<CanonicalField>,
    start_timestamp: String,
    end_timestamp: String,
    year_column: String,
    month_column: String,
}

impl CanonicalSchema {
    /// Create a canonical schema.
    ///
    /// The timestamp, year and month columns must all be declared in `fields`,
    /// the timestamps as text, the year as uint16 and the month as uint8.
    pub fn new(
        fields: Vec<CanonicalField>,
        start_timestamp: impl Into<String>,
        end_timestamp: impl Into<String>,
        year_column: impl Into<String>,
        month_column: impl Into<String>,
    ) -> crate::Result<Self> {
        let schema = Self {
            fields,
            start_timestamp: start_timestamp.into(),
            end_timestamp: end_timestamp.into(),
            year_column: year_column.into(),
            month_column: month_column.into(),
        };
        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> crate::Result<()> {
        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(crate::Error::schema(&field.name, "declared more than once"));
            }
        }

        let expect = |name: &str, ty: SemanticType| -> crate::Result<()> {
            match self.field(name) {
                Some(field) if field.semantic_type == ty => Ok(()),
                Some(field) => Err(crate::Error::schema(
                    name,
                    format!("declared as {}, expected {ty}", field.semantic_type),
                )),
                None => Err(crate::Error::schema(name, "not declared in canonical schema")),
            }
        };
        expect(&self.start_timestamp, SemanticType::Text)?;
        expect(&self.end_timestamp, SemanticType::Text)?;
        expect(&self.year_column, SemanticType::UInt16)?;
        expect(&self.month_column, SemanticType::UInt8)
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[CanonicalField] {
        &self.fields
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&CanonicalField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Position of a field
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the schema has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column holding the text start timestamp
    pub fn start_timestamp(&self) -> &str {
        &self.start_timestamp
    }

    /// Column holding the text end timestamp
    pub fn end_timestamp(&self) -> &str {
        &self.end_timestamp
    }

    /// Partition year column
    pub fn year_column(&self) -> &str {
        &self.year_column
    }

    /// Partition month column
    pub fn month_column(&self) -> &str {
        &self.month_column
    }

    /// Arrow schema with exactly the canonical columns
    pub fn arrow_schema(&self) -> SchemaRef {
        Arc::new(Schema::new(
            self.fields
                .iter()
                .map(CanonicalField::arrow_field)
                .collect::<Vec<_>>(),
        ))
    }
}
