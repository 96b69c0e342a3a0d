// This file is part of a Part 21 (STEP exchange file) reader.
// Copyright (C) 2020 Jeffrey Sharp
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published
// by the Free Software Foundation, either version 3 of the License,
// or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! The indexed table of data-section entity records.
//!
//! The original tool backed this with an embedded SQL table: `id` as a
//! `WITHOUT ROWID` primary key, a secondary index on `type_name` collated
//! `NOCASE`, and a secondary index on `entity_type`. This module keeps that
//! same logical shape — one primary lookup plus two secondary multi-maps —
//! over a plain insertion-ordered vector, so record order (and therefore
//! source order) is preserved without reaching for an embedded database
//! dependency this crate otherwise has no use for.

use std::collections::HashMap;

use crate::error::ParseError;

/// Whether a data-section instance was a simple (single-keyword) or complex
/// (parenthesized concatenation of typed sub-instances) entity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum EntityType {
    /// `S` — a single leading `KEYWORD`.
    Simple,

    /// `C` — no leading keyword; a concatenation of typed sub-instances.
    Complex,
}

impl EntityType {
    pub fn as_char(self) -> char {
        match self {
            EntityType::Simple  => 'S',
            EntityType::Complex => 'C',
        }
    }
}

/// One row of the entity store: a parsed data-section instance.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EntityRecord {
    /// `#<digits>`, unique within the store.
    pub id: String,

    /// The instance's leading keyword. `None` for complex instances.
    pub type_name: Option<String>,

    /// The verbatim text between the leading keyword (or `=`, for complex
    /// instances) and the terminating `;`.
    pub raw_data: String,

    /// 1-based line number of the `#id` token that introduced this instance.
    pub lineno: u32,

    pub entity_type: EntityType,
}

/// An indexed, insertion-ordered table of [`EntityRecord`]s.
#[derive(Clone, Default, Debug)]
pub struct EntityStore {
    records: Vec<EntityRecord>,
    by_id: HashMap<String, usize>,
    by_type_name: HashMap<String, Vec<usize>>,
    by_entity_type: HashMap<EntityType, Vec<usize>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record, failing if its `id` is already present or if a
    /// simple instance has no `type_name`.
    pub fn append(&mut self, record: EntityRecord) -> Result<(), ParseError> {
        if self.by_id.contains_key(&record.id) {
            return Err(ParseError::StoreConstraintViolation {
                line: record.lineno,
                reason: format!("duplicate id {}", record.id),
            });
        }
        if record.entity_type == EntityType::Simple && record.type_name.is_none() {
            return Err(ParseError::StoreConstraintViolation {
                line: record.lineno,
                reason: format!("simple instance {} has no type_name", record.id),
            });
        }

        let index = self.records.len();
        self.by_id.insert(record.id.clone(), index);

        if let Some(type_name) = &record.type_name {
            self.by_type_name
                .entry(type_name.to_ascii_uppercase())
                .or_default()
                .push(index);
        }

        self.by_entity_type
            .entry(record.entity_type)
            .or_default()
            .push(index);

        self.records.push(record);
        Ok(())
    }

    /// All records, in the order they were appended (source order).
    pub fn scan(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a record by its `#id`, in O(1).
    pub fn get(&self, id: &str) -> Option<&EntityRecord> {
        self.by_id.get(id).map(|&i| &self.records[i])
    }

    /// Records whose `type_name` matches, case-insensitively.
    pub fn scan_by_type_name<'s>(&'s self, type_name: &str) -> impl Iterator<Item = &'s EntityRecord> {
        let key = type_name.to_ascii_uppercase();
        self.by_type_name
            .get(&key)
            .into_iter()
            .flatten()
            .map(move |&i| &self.records[i])
    }

    /// Records of the given [`EntityType`] (simple or complex).
    pub fn scan_by_entity_type(&self, entity_type: EntityType) -> impl Iterator<Item = &EntityRecord> {
        self.by_entity_type
            .get(&entity_type)
            .into_iter()
            .flatten()
            .map(move |&i| &self.records[i])
    }

    /// Empties the store and re-prepares its indexes.
    pub fn reset(&mut self) {
        self.records.clear();
        self.by_id.clear();
        self.by_type_name.clear();
        self.by_entity_type.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple(id: &str, type_name: &str, raw_data: &str, lineno: u32) -> EntityRecord {
        EntityRecord {
            id: id.to_string(),
            type_name: Some(type_name.to_string()),
            raw_data: raw_data.to_string(),
            lineno,
            entity_type: EntityType::Simple,
        }
    }

    fn complex(id: &str, raw_data: &str, lineno: u32) -> EntityRecord {
        EntityRecord {
            id: id.to_string(),
            type_name: None,
            raw_data: raw_data.to_string(),
            lineno,
            entity_type: EntityType::Complex,
        }
    }

    #[test]
    fn append_and_get() {
        let mut store = EntityStore::new();
        store.append(simple("#10", "CARTESIAN_POINT", "('',(0.,0.,0.))", 5)).unwrap();

        let rec = store.get("#10").unwrap();
        assert_eq!(rec.type_name.as_deref(), Some("CARTESIAN_POINT"));
        assert_eq!(rec.entity_type, EntityType::Simple);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut store = EntityStore::new();
        store.append(simple("#1", "FOO", "()", 1)).unwrap();
        let err = store.append(simple("#1", "BAR", "()", 2)).unwrap_err();
        assert!(matches!(err, ParseError::StoreConstraintViolation { .. }));
    }

    #[test]
    fn complex_instance_has_no_type_name() {
        let mut store = EntityStore::new();
        store.append(complex("#20", "(A()B(#10))", 9)).unwrap();
        assert_eq!(store.get("#20").unwrap().type_name, None);
    }

    #[test]
    fn type_name_lookup_is_case_insensitive() {
        let mut store = EntityStore::new();
        store.append(simple("#1", "CARTESIAN_POINT", "()", 1)).unwrap();

        let found: Vec<_> = store.scan_by_type_name("cartesian_point").collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "#1");
    }

    #[test]
    fn scan_preserves_insertion_order() {
        let mut store = EntityStore::new();
        store.append(simple("#1", "A", "()", 1)).unwrap();
        store.append(simple("#2", "B", "()", 2)).unwrap();
        store.append(simple("#3", "C", "()", 3)).unwrap();

        let ids: Vec<_> = store.scan().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["#1", "#2", "#3"]);
    }

    #[test]
    fn reset_empties_store_and_indexes() {
        let mut store = EntityStore::new();
        store.append(simple("#1", "A", "()", 1)).unwrap();
        store.reset();

        assert!(store.is_empty());
        assert!(store.get("#1").is_none());
        assert_eq!(store.scan_by_type_name("A").count(), 0);
    }

    #[test]
    fn scan_by_entity_type() {
        let mut store = EntityStore::new();
        store.append(simple("#1", "A", "()", 1)).unwrap();
        store.append(complex("#2", "(A())", 2)).unwrap();

        assert_eq!(store.scan_by_entity_type(EntityType::Simple).count(), 1);
        assert_eq!(store.scan_by_entity_type(EntityType::Complex).count(), 1);
    }
}
