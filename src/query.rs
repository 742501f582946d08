use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::grammar::pairs_into_map;
use crate::schema::Schema;
use crate::storage::{Row, StorageDriver, scan};

/// Prefix marking a magic directive instead of a filter field.
pub const MAGIC_PREFIX: char = '$';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Resolves a magic directive key.
    ///
    /// # Errors
    /// Returns [`Error::Internal`] for an unknown directive.
    pub fn from_magic(key: &str) -> Result<Self> {
        match key {
            "$sort_asc" => Ok(Self::Asc),
            "$sort_desc" => Ok(Self::Desc),
            other => Err(Error::Internal(format!("unknown magic argument: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// A parsed `list` statement: equality filters plus ordered sort keys.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Typed filter values; a row matches when every one is equal.
    pub filters: Row,
    /// The first key is the primary order, later ones break ties.
    pub sort: Vec<SortKey>,
}

impl ListQuery {
    /// Separates filters from sort directives and converts the filters.
    ///
    /// # Errors
    /// - [`Error::ArgumentConflict`] if a filter field repeats
    /// - [`Error::Internal`] for an unknown `$` directive
    /// - [`Error::InvalidValueArgument`] if a directive names an unknown field
    /// - [`Error::EntryInvalid`] if a filter names an unknown field or its
    ///   value does not convert
    pub fn from_pairs(schema: &Schema, pairs: Vec<(String, String)>) -> Result<Self> {
        let mut raw_filters = Vec::new();
        let mut sort = Vec::new();

        for (key, value) in pairs {
            if key.starts_with(MAGIC_PREFIX) {
                let direction = SortDirection::from_magic(&key)?;
                if !schema.has_field(&value) {
                    return Err(Error::InvalidValueArgument(value));
                }
                sort.push(SortKey {
                    field: value,
                    direction,
                });
            } else {
                raw_filters.push((key, value));
            }
        }

        let raw_filters: HashMap<String, String> = pairs_into_map(raw_filters)?;
        schema.validate_keys(&raw_filters, false, true)?;
        let filters = schema.convert_types(raw_filters)?;

        Ok(Self { filters, sort })
    }

    /// Whether `row` carries every filter value.
    pub fn matches(&self, row: &Row) -> bool {
        self.filters
            .iter()
            .all(|(field, wanted)| row.get(field) == Some(wanted))
    }

    /// Scans the whole store, keeps matching rows and orders them.
    /// Without sort keys rows stay in scan order.
    pub fn execute(&self, driver: &dyn StorageDriver) -> Result<Vec<Row>> {
        let cursor = driver.build_cursor();
        let scanned = cursor.len();
        let mut rows = scan(driver, cursor)?;
        rows.retain(|row| self.matches(row));

        if !self.sort.is_empty() {
            sort_rows(&mut rows, &self.sort);
        }

        debug!(
            scanned,
            matched = rows.len(),
            filters = self.filters.len(),
            sort_keys = self.sort.len(),
            "list executed"
        );
        Ok(rows)
    }
}

/// Stable multi-key sort: the first non-equal key decides.
pub fn sort_rows(rows: &mut [Row], keys: &[SortKey]) {
    rows.sort_by(|a, b| {
        for key in keys {
            let mut ord = a.get(&key.field).cmp(&b.get(&key.field));
            if key.direction == SortDirection::Desc {
                ord = ord.reverse();
            }
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryDriver;
    use crate::value::Value;

    const SCHEMA: &str = "
columns:
  - name: id
    type: integer
    attribute: primary_key
  - name: k
    type: integer
  - name: k1
    type: integer
  - name: k2
    type: integer
  - name: name
    type: string
";

    fn schema() -> Schema {
        Schema::from_yaml(SCHEMA).unwrap()
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn row(items: &[(&str, i64)]) -> Row {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), Value::Int(*v)))
            .collect()
    }

    fn sorted(rows: &[Row], directives: &[(&str, &str)]) -> Vec<Row> {
        let query = ListQuery::from_pairs(&schema(), pairs(directives)).unwrap();
        let mut rows = rows.to_vec();
        sort_rows(&mut rows, &query.sort);
        rows
    }

    #[test]
    fn test_sort_asc_desc() {
        let rows = [row(&[("k", 2)]), row(&[("k", 1)])];
        assert_eq!(
            sorted(&rows, &[("$sort_asc", "k")]),
            vec![row(&[("k", 1)]), row(&[("k", 2)])]
        );
        assert_eq!(
            sorted(&rows, &[("$sort_desc", "k")]),
            vec![row(&[("k", 2)]), row(&[("k", 1)])]
        );
    }

    #[test]
    fn test_multi_key_sort() {
        let rows = [
            row(&[("k1", 2), ("k2", 1)]),
            row(&[("k1", 1), ("k2", 3)]),
            row(&[("k1", 2), ("k2", 2)]),
        ];
        assert_eq!(
            sorted(&rows, &[("$sort_desc", "k1"), ("$sort_asc", "k2")]),
            vec![
                row(&[("k1", 2), ("k2", 1)]),
                row(&[("k1", 2), ("k2", 2)]),
                row(&[("k1", 1), ("k2", 3)]),
            ]
        );
    }

    #[test]
    fn test_sort_is_stable() {
        let rows = [
            row(&[("id", 1), ("k", 5)]),
            row(&[("id", 2), ("k", 1)]),
            row(&[("id", 3), ("k", 5)]),
            row(&[("id", 4), ("k", 1)]),
        ];
        let ids: Vec<_> = sorted(&rows, &[("$sort_desc", "k")])
            .iter()
            .map(|r| r["id"].as_int().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_filter_conflict() {
        let err = ListQuery::from_pairs(&schema(), pairs(&[("k", "1"), ("k", "2")])).unwrap_err();
        assert_eq!(err, Error::ArgumentConflict("k".into()));
    }

    #[test]
    fn test_repeated_sort_directive_is_allowed() {
        let query =
            ListQuery::from_pairs(&schema(), pairs(&[("$sort_asc", "k"), ("$sort_asc", "k1")])).unwrap();
        assert_eq!(query.sort.len(), 2);
    }

    #[test]
    fn test_unknown_magic_key() {
        let err = ListQuery::from_pairs(&schema(), pairs(&[("$illegal", "k")])).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_sort_on_unknown_field() {
        let err = ListQuery::from_pairs(&schema(), pairs(&[("$sort_asc", "nope")])).unwrap_err();
        assert_eq!(err, Error::InvalidValueArgument("nope".into()));
    }

    #[test]
    fn test_filters_are_typed() {
        let query = ListQuery::from_pairs(&schema(), pairs(&[("k", "007")])).unwrap();
        assert_eq!(query.filters["k"], Value::Int(7));
        assert!(query.matches(&row(&[("k", 7)])));
        assert!(!query.matches(&row(&[("k", 8)])));

        assert!(matches!(
            ListQuery::from_pairs(&schema(), pairs(&[("k", "seven")])),
            Err(Error::EntryInvalid(_))
        ));
        assert!(matches!(
            ListQuery::from_pairs(&schema(), pairs(&[("salary", "1")])),
            Err(Error::EntryInvalid(_))
        ));
    }

    #[test]
    fn test_execute_filters_and_sorts() {
        let mut driver = MemoryDriver::new("id");
        for (id, k, name) in [(1, 2, "a"), (2, 1, "b"), (3, 2, "c")] {
            let mut fields = row(&[("k", k)]);
            fields.insert("name".into(), Value::Text(name.into()));
            driver.create_one(Value::Int(id), fields).unwrap();
        }

        let all = ListQuery::default().execute(&driver).unwrap();
        let ids: Vec<_> = all.iter().map(|r| r["id"].as_int().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let query =
            ListQuery::from_pairs(&schema(), pairs(&[("k", "2"), ("$sort_desc", "name")])).unwrap();
        let ids: Vec<_> = query
            .execute(&driver)
            .unwrap()
            .iter()
            .map(|r| r["id"].as_int().unwrap())
            .collect();
        assert_eq!(ids, vec![3, 1]);

        let none = ListQuery::from_pairs(&schema(), pairs(&[("k", "9")])).unwrap();
        assert!(none.execute(&driver).unwrap().is_empty());
    }
}
