use chrono::NaiveDate;
use tracing::trace;

use crate::error::{Error, Result};
use crate::value::Value;

/// Accepted date layout (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Represents the field types a schema may declare.
/// Every user input enters the store through [`DataType::convert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// A 64-bit signed integer, written in base 10.
    Int,
    /// A UTF-8 string, stored verbatim.
    Text,
    /// A calendar date without time zone.
    Date,
}

/// A registered field type: its schema name and converter.
#[derive(Debug, Clone, Copy)]
pub struct FieldType {
    pub name: &'static str,
    pub data_type: DataType,
    converter: fn(&str) -> Result<Value>,
}

/// Type registry keyed by the names used in schema sources.
/// Read-only for the lifetime of the process.
static FIELD_TYPES: [FieldType; 3] = [
    FieldType {
        name: "integer",
        data_type: DataType::Int,
        converter: convert_integer,
    },
    FieldType {
        name: "string",
        data_type: DataType::Text,
        converter: convert_string,
    },
    FieldType {
        name: "date",
        data_type: DataType::Date,
        converter: convert_date,
    },
];

impl FieldType {
    /// Looks up a registered type by its schema name.
    pub fn lookup(name: &str) -> Option<&'static FieldType> {
        FIELD_TYPES.iter().find(|t| t.name == name)
    }
}

impl DataType {
    /// Resolves a schema type name (`integer`, `string`, `date`).
    pub fn from_name(name: &str) -> Option<Self> {
        FieldType::lookup(name).map(|t| t.data_type)
    }

    /// The name this type is registered under.
    pub fn name(self) -> &'static str {
        self.field_type().name
    }

    /// Converts raw user input into a typed value.
    ///
    /// # Errors
    /// Returns [`Error::EntryInvalid`] when the input does not parse.
    ///
    /// # Example
    /// ```
    /// # use mintable::{DataType, Value};
    /// assert_eq!(DataType::Int.convert("123").unwrap(), Value::Int(123));
    /// assert!(DataType::Int.convert("12a").is_err());
    /// ```
    pub fn convert(self, raw: &str) -> Result<Value> {
        let value = (self.field_type().converter)(raw)?;
        trace!(data_type = self.name(), raw, "converted value");
        Ok(value)
    }

    fn field_type(self) -> &'static FieldType {
        match self {
            Self::Int => &FIELD_TYPES[0],
            Self::Text => &FIELD_TYPES[1],
            Self::Date => &FIELD_TYPES[2],
        }
    }
}

fn convert_integer(raw: &str) -> Result<Value> {
    raw.parse::<i64>()
        .map(Value::Int)
        .map_err(|_| Error::EntryInvalid(format!("invalid integer: {raw}")))
}

fn convert_string(raw: &str) -> Result<Value> {
    Ok(Value::Text(raw.into()))
}

fn convert_date(raw: &str) -> Result<Value> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(Value::Date)
        .map_err(|_| {
            Error::EntryInvalid(format!(
                "incorrect date format, should be YYYY-MM-DD: {raw}"
            ))
        })
}
