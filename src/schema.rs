//! Schema manager: the declared field list of the single entity type.
//!
//! The schema source is YAML:
//!
//! ```yaml
//! columns:
//!   - name: id
//!     type: integer
//!     attribute: primary_key
//!   - name: name
//!     type: string
//!   - name: in_date
//!     type: date
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::data_type::DataType;
use crate::error::{Error, Result};
use crate::storage::Row;
use crate::value::Value;

const PRIMARY_KEY_ATTRIBUTE: &str = "primary_key";

/// A declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub primary_key: bool,
}

/// Ordered field declarations with exactly one primary key.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
    primary_key: usize,
}

#[derive(Debug, Deserialize)]
struct SchemaSource {
    #[serde(default)]
    columns: Option<Vec<ColumnSource>>,
}

#[derive(Debug, Deserialize)]
struct ColumnSource {
    name: Option<String>,
    #[serde(rename = "type")]
    type_name: Option<String>,
    #[serde(default)]
    attribute: Option<String>,
}

impl ColumnSource {
    fn has_attribute(&self, wanted: &str) -> bool {
        self.attribute
            .as_deref()
            .is_some_and(|attrs| attrs.split(',').any(|a| a.trim() == wanted))
    }
}

impl Schema {
    /// Builds a schema from already-declared fields.
    ///
    /// # Errors
    /// Returns [`Error::SchemaInvalid`] if `fields` is empty, has duplicate
    /// names, or does not declare exactly one primary key.
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        if fields.is_empty() {
            return Err(Error::SchemaInvalid(
                "`columns` is required to be a non-empty list".into(),
            ));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(Error::SchemaInvalid(format!(
                    "duplicate column name: {}",
                    field.name
                )));
            }
        }

        let mut keys = fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.primary_key)
            .map(|(i, _)| i);
        let primary_key = keys.next().ok_or_else(|| {
            Error::SchemaInvalid("no primary_key found within schema definition".into())
        })?;
        if keys.next().is_some() {
            return Err(Error::SchemaInvalid(
                "multiple primary key is not allowed".into(),
            ));
        }

        Ok(Self {
            fields,
            primary_key,
        })
    }

    /// Parses a YAML schema source.
    ///
    /// # Errors
    /// Returns [`Error::SchemaInvalid`] when the document is malformed, a
    /// column lacks `name` or `type`, a type is not registered, or the
    /// primary-key count is not exactly one.
    pub fn from_yaml(source: &str) -> Result<Self> {
        let source: SchemaSource = serde_yaml::from_str(source)
            .map_err(|e| Error::SchemaInvalid(format!("cannot parse schema: {e}")))?;

        let columns = source.columns.unwrap_or_default();
        let mut fields = Vec::with_capacity(columns.len());
        for column in &columns {
            let name = column
                .name
                .clone()
                .ok_or_else(|| Error::SchemaInvalid("`name` required in schema definition".into()))?;
            let type_name = column.type_name.as_deref().ok_or_else(|| {
                Error::SchemaInvalid("`type` required in schema definition".into())
            })?;
            let data_type = DataType::from_name(type_name).ok_or_else(|| {
                Error::SchemaInvalid(format!(
                    "invalid value of `type` within schema definition: {type_name}"
                ))
            })?;
            fields.push(Field {
                name,
                data_type,
                primary_key: column.has_attribute(PRIMARY_KEY_ATTRIBUTE),
            });
        }

        Self::new(fields)
    }

    /// Reads and parses a YAML schema file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| {
            Error::SchemaInvalid(format!("cannot read {}: {e}", path.display()))
        })?;
        let schema = Self::from_yaml(&source)?;
        info!(
            path = %path.display(),
            fields = schema.fields.len(),
            primary_key = schema.primary_key(),
            "schema loaded"
        );
        Ok(schema)
    }

    /// Declared field names in schema order.
    pub fn fields(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// The primary-key field name.
    pub fn primary_key(&self) -> &str {
        &self.fields[self.primary_key].name
    }

    /// Checks the key set of `entry` against the declared fields.
    ///
    /// # Errors
    /// Returns [`Error::EntryInvalid`] naming the missing keys (when
    /// `no_missing`) or the unexpected ones (when `no_extra`). Missing keys
    /// are reported first.
    pub fn validate_keys<V>(
        &self,
        entry: &HashMap<String, V>,
        no_missing: bool,
        no_extra: bool,
    ) -> Result<()> {
        if no_missing {
            let missing: Vec<&str> = self
                .fields
                .iter()
                .map(|f| f.name.as_str())
                .filter(|name| !entry.contains_key(*name))
                .collect();
            if !missing.is_empty() {
                return Err(Error::EntryInvalid(format!(
                    "missing keys: {}",
                    missing.join(", ")
                )));
            }
        }

        if no_extra {
            let extra: BTreeSet<&str> = entry
                .keys()
                .map(String::as_str)
                .filter(|key| !self.has_field(key))
                .collect();
            if !extra.is_empty() {
                return Err(Error::EntryInvalid(format!(
                    "unexpected extra keys: {}",
                    extra.into_iter().collect::<Vec<_>>().join(", ")
                )));
            }
        }

        Ok(())
    }

    /// Converts every present field of `entry` with its declared type.
    /// Absent fields are simply not in the result, so partial entries
    /// (updates, filters) convert too.
    ///
    /// # Errors
    /// Returns [`Error::EntryInvalid`] when a value does not convert or a
    /// key is not a declared field.
    pub fn convert_types(&self, entry: HashMap<String, String>) -> Result<Row> {
        let mut row = Row::with_capacity(entry.len());
        for (name, raw) in entry {
            let field = self
                .field(&name)
                .ok_or_else(|| Error::EntryInvalid(format!("unexpected extra keys: {name}")))?;
            let value = field.data_type.convert(&raw)?;
            row.insert(name, value);
        }
        debug!(fields = row.len(), "entry converted");
        Ok(row)
    }

    /// Converts a raw primary-key value with the primary key's type.
    pub fn convert_primary_key(&self, raw: &str) -> Result<Value> {
        self.fields[self.primary_key].data_type.convert(raw)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const EMPLOYEES: &str = "
columns:
  - name: id
    type: integer
    attribute: primary_key
  - name: name
    type: string
  - name: in_date
    type: date
  - name: department
    type: string
";

    fn entry(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_load_fields_in_order() {
        let schema = Schema::from_yaml(EMPLOYEES).unwrap();
        assert_eq!(schema.fields(), vec!["id", "name", "in_date", "department"]);
        assert_eq!(schema.primary_key(), "id");
        assert_eq!(schema.field("in_date").unwrap().data_type, DataType::Date);
    }

    #[test]
    fn test_attribute_list() {
        let schema = Schema::from_yaml(
            "columns:\n  - name: code\n    type: string\n    attribute: unique, primary_key\n",
        )
        .unwrap();
        assert_eq!(schema.primary_key(), "code");
    }

    #[test]
    fn test_invalid_sources() {
        let cases = [
            "columns: []\n",
            "other: 1\n",
            "columns:\n  - name: id\n",
            "columns:\n  - name: id\n    type: float\n    attribute: primary_key\n",
            "columns:\n  - type: integer\n    attribute: primary_key\n",
            "columns:\n  - name: id\n    type: integer\n",
            "columns:\n  - name: a\n    type: integer\n    attribute: primary_key\n  - name: b\n    type: integer\n    attribute: primary_key\n",
            "columns:\n  - name: a\n    type: integer\n    attribute: primary_key\n  - name: a\n    type: string\n",
            "columns: [",
        ];
        for source in cases {
            assert!(
                matches!(Schema::from_yaml(source), Err(Error::SchemaInvalid(_))),
                "accepted: {source}"
            );
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EMPLOYEES.as_bytes()).unwrap();
        let schema = Schema::load(file.path()).unwrap();
        assert_eq!(schema.fields().len(), 4);

        let missing = Schema::load("/definitely/not/here.yaml");
        assert!(matches!(missing, Err(Error::SchemaInvalid(_))));
    }

    #[test]
    fn test_validate_keys() {
        let schema = Schema::from_yaml(EMPLOYEES).unwrap();
        let partial = entry(&[("id", "1"), ("name", "A")]);
        let err = schema.validate_keys(&partial, true, true).unwrap_err();
        assert_eq!(
            err,
            Error::EntryInvalid("missing keys: in_date, department".into())
        );
        assert!(schema.validate_keys(&partial, false, true).is_ok());

        let extra = entry(&[("id", "1"), ("salary", "9")]);
        let err = schema.validate_keys(&extra, false, true).unwrap_err();
        assert_eq!(err, Error::EntryInvalid("unexpected extra keys: salary".into()));
        assert!(schema.validate_keys(&extra, false, false).is_ok());
    }

    #[test]
    fn test_convert_types_partial() {
        let schema = Schema::from_yaml(EMPLOYEES).unwrap();
        let row = schema
            .convert_types(entry(&[("id", "123"), ("in_date", "2022-06-25")]))
            .unwrap();
        assert_eq!(row.len(), 2);
        assert_eq!(row["id"], Value::Int(123));
        assert_eq!(row["in_date"].to_string(), "2022-06-25");
    }

    #[test]
    fn test_convert_types_rejects_bad_values() {
        let schema = Schema::from_yaml(EMPLOYEES).unwrap();
        assert!(matches!(
            schema.convert_types(entry(&[("id", "12a")])),
            Err(Error::EntryInvalid(_))
        ));
        assert!(matches!(
            schema.convert_types(entry(&[("in_date", "2022-6-32")])),
            Err(Error::EntryInvalid(_))
        ));
        assert!(matches!(
            schema.convert_types(entry(&[("salary", "1")])),
            Err(Error::EntryInvalid(_))
        ));
    }

    #[test]
    fn test_convert_primary_key() {
        let schema = Schema::from_yaml(EMPLOYEES).unwrap();
        assert_eq!(schema.convert_primary_key("42").unwrap(), Value::Int(42));
        assert!(schema.convert_primary_key("abc").is_err());
    }
}
