use std::collections::HashMap;
use std::mem;

use bitvec::prelude::*;
use tracing::{debug, trace};

use super::{Cursor, Row, StorageDriver, not_found};
use crate::error::{Error, Result};
use crate::value::Value;

/// Dead slots are only reclaimed past this count, and only when they
/// outnumber the live ones.
const COMPACT_MIN_DEAD: usize = 32;

#[derive(Debug, Clone)]
struct Slot {
    key: Value,
    fields: Row,
}

/// In-memory storage backend.
///
/// Rows are appended to a slot vector in insertion order. A bitmap marks
/// which slots are live (a deletion vector), so deleting a row never shifts
/// the others; a hash index maps each primary key to its slot.
#[derive(Debug, Clone)]
pub struct MemoryDriver {
    primary_key: String,
    slots: Vec<Slot>,
    /// `true` when the slot at that index holds a live row.
    live: BitVec,
    index: HashMap<Value, usize>,
}

impl MemoryDriver {
    /// Creates an empty store whose keys are reported under `primary_key`.
    pub fn new(primary_key: &str) -> Self {
        Self {
            primary_key: primary_key.to_string(),
            slots: Vec::new(),
            live: bitvec![],
            index: HashMap::new(),
        }
    }

    /// Returns a copy of the stored fields with the key re-attached.
    fn attach(&self, key: &Value, fields: &Row) -> Row {
        let mut row = fields.clone();
        row.insert(self.primary_key.clone(), key.clone());
        row
    }

    fn slot_of(&self, pk: &Value) -> Result<usize> {
        self.index
            .get(pk)
            .copied()
            .ok_or_else(|| not_found(&self.primary_key, pk))
    }

    /// Drops dead slots once they outnumber live ones, keeping the order of
    /// the remaining rows.
    fn maybe_compact(&mut self) {
        let live = self.index.len();
        let dead = self.slots.len() - live;
        if dead < COMPACT_MIN_DEAD || dead <= live {
            return;
        }

        let slots = mem::take(&mut self.slots);
        let bitmap = mem::take(&mut self.live);
        self.slots = slots
            .into_iter()
            .zip(bitmap.iter().by_vals())
            .filter_map(|(slot, alive)| alive.then_some(slot))
            .collect();
        self.live = bitvec![1; self.slots.len()];
        self.index = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.key.clone(), i))
            .collect();
        debug!(reclaimed = dead, live, "compacted memory store");
    }
}

impl StorageDriver for MemoryDriver {
    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    fn create_one(&mut self, pk: Value, mut fields: Row) -> Result<Row> {
        if self.index.contains_key(&pk) {
            return Err(Error::DuplicateEntry {
                field: self.primary_key.clone(),
                value: pk.to_string(),
            });
        }
        fields.remove(&self.primary_key);

        let row = self.attach(&pk, &fields);
        self.index.insert(pk.clone(), self.slots.len());
        self.slots.push(Slot { key: pk, fields });
        self.live.push(true);
        trace!(rows = self.index.len(), "row created");
        Ok(row)
    }

    fn read_one(&self, pk: &Value) -> Result<Row> {
        let slot = &self.slots[self.slot_of(pk)?];
        Ok(self.attach(&slot.key, &slot.fields))
    }

    fn update_one(&mut self, pk: &Value, mut fields: Row) -> Result<Row> {
        let idx = self.slot_of(pk)?;
        fields.remove(&self.primary_key);
        self.slots[idx].fields.extend(fields);
        trace!(%pk, "row updated");
        let slot = &self.slots[idx];
        Ok(self.attach(&slot.key, &slot.fields))
    }

    fn delete_one(&mut self, pk: &Value) -> Result<Row> {
        let idx = self.slot_of(pk)?;
        self.index.remove(pk);
        self.live.set(idx, false);
        let fields = mem::take(&mut self.slots[idx].fields);
        let row = self.attach(pk, &fields);
        trace!(%pk, "row deleted");
        self.maybe_compact();
        Ok(row)
    }

    fn build_cursor(&self) -> Cursor {
        Cursor::new(
            self.live
                .iter_ones()
                .map(|i| self.slots[i].key.clone())
                .collect(),
        )
    }

    fn next_row(&self, cursor: &Cursor) -> Result<(Cursor, Row)> {
        let key = cursor
            .current()
            .ok_or_else(|| Error::Internal("cursor is exhausted".into()))?;
        let row = self.read_one(key)?;
        Ok((cursor.advance(), row))
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}
