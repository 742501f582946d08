//! Storage driver contract and backend selection.
//!
//! A driver owns the rows, keyed by their typed primary-key value. The key
//! is stored out-of-band and re-attached, under the primary-key field name,
//! to every row handed back to callers.

pub mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::value::Value;

pub use memory::MemoryDriver;

/// One record: field name to typed value.
pub type Row = HashMap<String, Value>;

/// Operations every storage backend provides.
pub trait StorageDriver {
    /// Name of the field the primary key is re-attached under.
    fn primary_key(&self) -> &str;

    /// Stores `fields` under `pk`.
    ///
    /// # Errors
    /// [`Error::DuplicateEntry`] if `pk` already exists.
    fn create_one(&mut self, pk: Value, fields: Row) -> Result<Row>;

    /// # Errors
    /// [`Error::EntryNotFound`] if `pk` is absent.
    fn read_one(&self, pk: &Value) -> Result<Row>;

    /// Overwrites the given fields of an existing row; other fields keep
    /// their value. Returns the merged row.
    ///
    /// # Errors
    /// [`Error::EntryNotFound`] if `pk` is absent.
    fn update_one(&mut self, pk: &Value, fields: Row) -> Result<Row>;

    /// Removes a row and returns it.
    ///
    /// # Errors
    /// [`Error::EntryNotFound`] if `pk` is absent.
    fn delete_one(&mut self, pk: &Value) -> Result<Row>;

    /// Snapshots the current keys in insertion order.
    fn build_cursor(&self) -> Cursor;

    /// Returns the row under the cursor and the advanced cursor. Callers
    /// check [`Cursor::has_more`] first.
    fn next_row(&self, cursor: &Cursor) -> Result<(Cursor, Row)>;

    /// Number of stored rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable scan position over a snapshot of primary keys.
///
/// The key list is copied when the cursor is built and shared between the
/// cursors derived from it, so later writes never change an in-flight scan.
#[derive(Debug, Clone)]
pub struct Cursor {
    keys: Arc<[Value]>,
    position: usize,
}

impl Cursor {
    pub fn new(keys: Vec<Value>) -> Self {
        Self {
            keys: keys.into(),
            position: 0,
        }
    }

    /// Whether a row remains under this cursor.
    pub fn has_more(&self) -> bool {
        self.position < self.keys.len()
    }

    /// The key under the cursor.
    pub fn current(&self) -> Option<&Value> {
        self.keys.get(self.position)
    }

    /// A cursor one step further over the same snapshot.
    pub fn advance(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
            position: self.position + 1,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Total number of keys in the snapshot.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Available storage backends, selected once at startup from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    /// Rows live in process memory and vanish on exit.
    #[default]
    #[serde(alias = "memory_dict")]
    Memory,
}

/// Builds the driver for `kind`.
pub fn open_driver(kind: DriverKind, primary_key: &str) -> Box<dyn StorageDriver> {
    match kind {
        DriverKind::Memory => Box::new(MemoryDriver::new(primary_key)),
    }
}

/// Reads every remaining row from `cursor` onwards.
pub fn scan(driver: &dyn StorageDriver, mut cursor: Cursor) -> Result<Vec<Row>> {
    let mut rows = Vec::with_capacity(cursor.len().saturating_sub(cursor.position()));
    while cursor.has_more() {
        let (next, row) = driver.next_row(&cursor)?;
        rows.push(row);
        cursor = next;
    }
    Ok(rows)
}

pub(crate) fn not_found(field: &str, pk: &Value) -> Error {
    Error::EntryNotFound {
        field: field.to_string(),
        value: pk.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_advance_is_persistent() {
        let first = Cursor::new(vec![Value::Int(1), Value::Int(2)]);
        let second = first.advance();
        assert_eq!(first.current(), Some(&Value::Int(1)));
        assert_eq!(second.current(), Some(&Value::Int(2)));
        assert!(second.has_more());
        assert!(!second.advance().has_more());
        assert_eq!(second.advance().current(), None);
    }

    #[test]
    fn test_empty_cursor() {
        let cursor = Cursor::new(Vec::new());
        assert!(cursor.is_empty());
        assert!(!cursor.has_more());
    }

    #[test]
    fn test_driver_kind_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            driver: DriverKind,
        }
        let parsed: Wrapper = toml::from_str("driver = \"memory\"").unwrap();
        assert_eq!(parsed.driver, DriverKind::Memory);
        let parsed: Wrapper = toml::from_str("driver = \"memory_dict\"").unwrap();
        assert_eq!(parsed.driver, DriverKind::Memory);
        assert!(toml::from_str::<Wrapper>("driver = \"rocks\"").is_err());
    }

    #[test]
    fn test_open_driver() {
        let driver = open_driver(DriverKind::Memory, "id");
        assert_eq!(driver.primary_key(), "id");
        assert!(driver.is_empty());
    }
}
