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

//! A reader for ISO 10303-21 (STEP) Part 21 exchange files.
//!
//! [`Parser::parse`] turns the text of one exchange file into a [`File`]
//! (the header plus a marker per data section) and populates an
//! [`EntityStore`] with every data-section instance it found, while
//! [`Diagnostics`] collects anything recoverable it had to drop along the
//! way. See [`crate::lexer`] and [`crate::parser`] for how the two stages
//! are built.

pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod schema;
pub mod store;
pub mod token;

pub use ast::{File, Header, HeaderEntity, Parameter, Section, TypedParameter};
pub use diagnostics::{Diagnostic, Diagnostics, Location, Severity};
pub use error::ParseError;
pub use parser::{Parser, ParserOptions};
pub use schema::SchemaError;
pub use store::{EntityRecord, EntityStore, EntityType};
