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

//! Schema registration hooks.
//!
//! These exist in the original tool and are preserved here for interface
//! compatibility, but the core parser never consults them: a data-section
//! instance's tail is captured as `RAW` regardless of which schema, if any,
//! is active. Whether an activated schema should constrain the set of
//! allowed data-section keywords is left an open question upstream; absent
//! a specification for that behavior, this port does not add one.

use std::collections::HashMap;

use crate::token::TokenKind;

/// Base token kinds a schema's entity names are not allowed to collide
/// with, by their canonical spelling.
const RESERVED_NAMES: &[&str] = &[
    "PART21_START", "PART21_END", "HEADER", "DATA", "ENDSEC",
    "INTEGER", "REAL", "STRING", "BINARY", "ENUMERATION", "KEYWORD", "EID", "RAW",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    AlreadyRegistered(String),
    NotRegistered(String),
    ReservedName(String),
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::AlreadyRegistered(name) => write!(f, "schema {name:?} already registered"),
            SchemaError::NotRegistered(name)     => write!(f, "schema {name:?} not registered"),
            SchemaError::ReservedName(name)      => write!(f, "entity name {name:?} collides with a base token kind"),
        }
    }
}

impl std::error::Error for SchemaError {}

/// A registry of named schemas, each a set of entity keyword spellings.
/// Holds the registry and tracks which schema, if any, is active. Neither
/// registration nor activation is consulted by [`crate::parser::Parser`].
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Vec<String>>,
    active: Option<String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, entities: Vec<String>) -> Result<(), SchemaError> {
        if self.schemas.contains_key(name) {
            return Err(SchemaError::AlreadyRegistered(name.to_string()));
        }
        for entity in &entities {
            if RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(entity)) {
                return Err(SchemaError::ReservedName(entity.clone()));
            }
        }
        self.schemas.insert(name.to_string(), entities);
        Ok(())
    }

    pub fn activate(&mut self, name: &str) -> Result<(), SchemaError> {
        if !self.schemas.contains_key(name) {
            return Err(SchemaError::NotRegistered(name.to_string()));
        }
        self.active = Some(name.to_string());
        Ok(())
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }
}

// Reference a `TokenKind` so the reserved-name note above stays truthful if
// the token set ever changes shape; this module otherwise has no need to
// name individual kinds.
#[allow(dead_code)]
fn _assert_token_kind_exists(_: TokenKind) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_activate() {
        let mut reg = SchemaRegistry::new();
        reg.register("AP203", vec!["CARTESIAN_POINT".into()]).unwrap();
        reg.activate("AP203").unwrap();
        assert_eq!(reg.active(), Some("AP203"));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut reg = SchemaRegistry::new();
        reg.register("AP203", vec![]).unwrap();
        let err = reg.register("AP203", vec![]).unwrap_err();
        assert_eq!(err, SchemaError::AlreadyRegistered("AP203".into()));
    }

    #[test]
    fn activating_unknown_schema_rejected() {
        let mut reg = SchemaRegistry::new();
        let err = reg.activate("NOPE").unwrap_err();
        assert_eq!(err, SchemaError::NotRegistered("NOPE".into()));
    }

    #[test]
    fn reserved_name_rejected() {
        let mut reg = SchemaRegistry::new();
        let err = reg.register("X", vec!["DATA".into()]).unwrap_err();
        assert_eq!(err, SchemaError::ReservedName("DATA".into()));
    }
}
