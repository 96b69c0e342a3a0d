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

//! The recursive-descent grammar driver.
//!
//! [`Parser`] is the crate's public entry point: it owns the long-lived
//! state (entity store, schema registry, diagnostics) across calls to
//! [`Parser::parse`], while [`ParseSession`] is the short-lived grammar
//! walk over one input, built fresh for each call and holding only a
//! one-token lookahead into the lexer.
//!
//! A single production gets special treatment: `entity_instance := EID '='
//! error ';'`. A malformed instance does not abort the parse — it is
//! dropped, a warning is recorded in [`crate::diagnostics::Diagnostics`], and
//! scanning resumes at the next top-level `;`. This recovery is for
//! instance-level *syntax* errors only; a duplicate `#id` is a store
//! constraint violation, not a syntax error, and aborts the parse (see
//! [`crate::error::ParseError::StoreConstraintViolation`]).

use crate::ast::{File, Header, HeaderEntity, Parameter, Section, TypedParameter};
use crate::diagnostics::{Diagnostics, Location};
use crate::error::ParseError;
use crate::lexer::{Lexer, DEFAULT_HEADER_LIMIT};
use crate::schema::{SchemaError, SchemaRegistry};
use crate::store::{EntityRecord, EntityStore, EntityType};
use crate::token::{Token, TokenKind};

/// Knobs that affect how a [`Parser`] scans and parses, apart from the
/// schema registry (which is mutated directly through [`Parser`]'s own
/// methods rather than bundled in here).
///
/// The original tool's lexer also took `debug` and `optimize` flags; those
/// configured a parser-generator's tracing and table-caching and have no
/// counterpart in a hand-written recursive-descent parser, so they are not
/// carried forward here.
#[derive(Clone, Copy, Debug)]
pub struct ParserOptions {
    /// Upper bound, in bytes, on how far the lexer will scan for
    /// `ISO-10303-21;` before giving up. See [`crate::error::ParseError::LexerHeaderOverflow`].
    pub header_limit: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self { header_limit: DEFAULT_HEADER_LIMIT }
    }
}

/// A reusable Part 21 exchange-file parser.
///
/// Holds the entity store, schema registry, and diagnostics across calls to
/// [`Parser::parse`]; each call first resets the store and diagnostics (but
/// not the schema registry — registered schemas persist across parses).
#[derive(Debug)]
pub struct Parser {
    options: ParserOptions,
    schemas: SchemaRegistry,
    store: EntityStore,
    diagnostics: Diagnostics,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default())
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self {
            options,
            schemas: SchemaRegistry::new(),
            store: EntityStore::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Registers a named EXPRESS schema's set of entity keywords. Not
    /// consulted by `parse`; see [`crate::schema`].
    pub fn register_schema(&mut self, name: &str, entities: Vec<String>) -> Result<(), SchemaError> {
        self.schemas.register(name, entities)
    }

    /// Marks a previously registered schema active. Not consulted by `parse`.
    pub fn activate_schema(&mut self, name: &str) -> Result<(), SchemaError> {
        self.schemas.activate(name)
    }

    pub fn active_schema(&self) -> Option<&str> {
        self.schemas.active()
    }

    /// The entity store accumulated by the most recent `parse`.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Diagnostics accumulated by the most recent `parse`.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Clears the entity store and diagnostics. Schema registrations are
    /// untouched. `parse` calls this itself before scanning.
    pub fn reset(&mut self) {
        self.store.reset();
        self.diagnostics.clear();
    }

    /// Parses one exchange file, returning its header and section markers.
    /// Data-section instances land in [`Parser::store`], not in the
    /// returned [`File`].
    pub fn parse<'a>(&mut self, input: &'a str) -> Result<File, ParseError> {
        self.reset();
        let lexer = Lexer::with_header_limit(input, self.options.header_limit);
        let mut session = ParseSession::new(lexer, &mut self.store, &mut self.diagnostics)?;
        session.parse_exchange_file()
    }
}

/// One grammar walk over a single input. Built and discarded within
/// [`Parser::parse`].
struct ParseSession<'a, 's> {
    lexer: Lexer<'a>,
    store: &'s mut EntityStore,
    diagnostics: &'s mut Diagnostics,
    cur: Token<'a>,
}

impl<'a, 's> ParseSession<'a, 's> {
    fn new(mut lexer: Lexer<'a>, store: &'s mut EntityStore, diagnostics: &'s mut Diagnostics) -> Result<Self, ParseError> {
        let cur = lexer.next_token()?;
        Ok(Self { lexer, store, diagnostics, cur })
    }

    fn bump(&mut self) -> Result<Token<'a>, ParseError> {
        let prev = self.cur;
        self.cur = self.lexer.next_token()?;
        Ok(prev)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, ParseError> {
        if self.cur.kind == kind {
            self.bump()
        } else {
            Err(self.syntax_error(kind.name()))
        }
    }

    fn syntax_error(&self, expected: &'static str) -> ParseError {
        ParseError::ParserSyntaxError {
            line: self.cur.line,
            expected,
            found: self.cur.text_or_kind(),
        }
    }

    fn warn(&mut self, line: u32, message: impl Into<String>) {
        self.diagnostics.warn(Location::new(line, 0), message);
    }

    // -- grammar ------------------------------------------------------

    fn parse_exchange_file(&mut self) -> Result<File, ParseError> {
        self.expect(TokenKind::Part21Start)?;
        let header = self.parse_header_section()?;

        let mut sections = Vec::new();
        while self.cur.kind == TokenKind::Data {
            sections.push(self.parse_data_section()?);
        }

        self.expect(TokenKind::Part21End)?;
        Ok(File { header, sections })
    }

    fn parse_header_section(&mut self) -> Result<Header, ParseError> {
        self.expect(TokenKind::Header)?;

        let file_description = self.parse_header_entity()?;
        let file_name = self.parse_header_entity()?;
        let file_schema = self.parse_header_entity()?;

        let mut extra_headers = Vec::new();
        while self.cur.kind == TokenKind::Keyword {
            extra_headers.push(self.parse_header_entity()?);
        }

        self.expect(TokenKind::Endsec)?;
        Ok(Header { file_description, file_name, file_schema, extra_headers })
    }

    fn parse_header_entity(&mut self) -> Result<HeaderEntity, ParseError> {
        let keyword = self.expect(TokenKind::Keyword)?;
        self.expect(TokenKind::LParen)?;
        let params = self.parse_parameter_list()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semi)?;
        Ok(HeaderEntity { type_name: keyword.text.to_string(), params })
    }

    /// `(parameter (',' parameter)*)?` — a leniency beyond the strict
    /// grammar, which requires at least one parameter: an empty list (e.g.
    /// `FOO()`) parses as zero parameters rather than a syntax error.
    fn parse_parameter_list(&mut self) -> Result<Vec<Parameter>, ParseError> {
        let mut params = Vec::new();
        if self.cur.kind == TokenKind::RParen {
            return Ok(params);
        }
        params.push(self.parse_parameter()?);
        while self.cur.kind == TokenKind::Comma {
            self.bump()?;
            params.push(self.parse_parameter()?);
        }
        Ok(params)
    }

    fn parse_parameter(&mut self) -> Result<Parameter, ParseError> {
        match self.cur.kind {
            TokenKind::Integer => Ok(Parameter::Integer(self.bump()?.text.to_string())),
            TokenKind::Real => Ok(Parameter::Real(self.bump()?.text.to_string())),
            TokenKind::Str => Ok(Parameter::String(self.bump()?.text.to_string())),
            TokenKind::Binary => Ok(Parameter::Binary(self.bump()?.text.to_string())),
            TokenKind::Enumeration => Ok(Parameter::Enumeration(self.bump()?.text.to_string())),
            TokenKind::Eid => Ok(Parameter::Eid(self.bump()?.text.to_string())),
            TokenKind::Star => {
                self.bump()?;
                Ok(Parameter::Omitted)
            }
            TokenKind::Dollar => {
                self.bump()?;
                Ok(Parameter::Unset)
            }
            TokenKind::LParen => {
                self.bump()?;
                if self.cur.kind == TokenKind::RParen {
                    self.bump()?;
                    return Ok(Parameter::EmptyList);
                }
                let items = self.parse_parameter_list()?;
                self.expect(TokenKind::RParen)?;
                Ok(Parameter::List(items))
            }
            TokenKind::Keyword => {
                let keyword = self.bump()?;
                self.expect(TokenKind::LParen)?;
                let param = self.parse_parameter()?;
                self.expect(TokenKind::RParen)?;
                Ok(Parameter::Typed(Box::new(TypedParameter {
                    type_name: keyword.text.to_string(),
                    param,
                })))
            }
            _ => Err(self.syntax_error("a parameter")),
        }
    }

    fn parse_data_section(&mut self) -> Result<Section, ParseError> {
        self.expect(TokenKind::Data)?;
        if self.cur.kind == TokenKind::LParen {
            self.bump()?;
            self.parse_parameter_list()?;
            self.expect(TokenKind::RParen)?;
        }
        self.expect(TokenKind::Semi)?;

        let mut entity_count = 0;
        while self.cur.kind == TokenKind::Eid {
            match self.parse_entity_instance() {
                Ok(record) => {
                    self.store.append(record)?;
                    entity_count += 1;
                }
                Err(ParseError::ParserSyntaxError { line, .. })
                | Err(ParseError::LexerInvalidToken { line, .. }) => {
                    self.recover_instance(line)?;
                }
                Err(other) => return Err(other),
            }
        }

        self.expect(TokenKind::Endsec)?;
        Ok(Section { entity_count })
    }

    /// `entity_instance := EID '=' (KEYWORD)? raw_data ';'`
    ///
    /// `raw_data` is the verbatim text between the keyword (or `=`, for a
    /// complex instance) and the terminating `;`. The lexer usually captures
    /// that whole tail as one `RAW` token, but splits its capture around any
    /// `/* ... */` comment inside the tail (see [`crate::lexer`]), so more
    /// than one `RAW` token can appear here; this concatenates all of them,
    /// which is exactly the `raw_data := RAW | raw_data RAW` concatenation
    /// the grammar calls for. `raw_data` must be non-empty per the §3
    /// invariant — an instance with no tail at all (`#1=;`, or a simple
    /// instance with no parameter list such as `#1=FOO;`) is a syntax error.
    fn parse_entity_instance(&mut self) -> Result<EntityRecord, ParseError> {
        let eid = self.expect(TokenKind::Eid)?;
        let lineno = eid.line;
        self.expect(TokenKind::Equals)?;

        let (entity_type, type_name) = match self.cur.kind {
            TokenKind::Keyword => (EntityType::Simple, Some(self.bump()?.text.to_string())),
            TokenKind::Raw => (EntityType::Complex, None),
            _ => return Err(self.syntax_error("a type keyword or '('")),
        };

        let mut raw_data = String::new();
        while self.cur.kind == TokenKind::Raw {
            raw_data.push_str(self.bump()?.text);
        }
        if raw_data.is_empty() {
            return Err(self.syntax_error("a non-empty raw_data tail"));
        }
        self.expect(TokenKind::Semi)?;

        Ok(EntityRecord {
            id: eid.text.to_string(),
            type_name,
            raw_data,
            lineno,
            entity_type,
        })
    }

    /// Resynchronizes after a malformed `entity_instance` by discarding
    /// tokens up to and including the next top-level `;`, then records a
    /// warning naming the span that was skipped.
    ///
    /// The first candidate examined is `self.cur` itself, not a freshly
    /// pulled token: a grammar mismatch that fails on a plain token check
    /// (rather than inside `bump`/`expect`) leaves `self.cur` already sitting
    /// on the resync boundary — e.g. an empty-tailed instance `#1=;` fails
    /// with `self.cur` holding that very `;`. Treating it as stale and
    /// pulling a fresh token first would skip straight past it and
    /// swallow the next, perfectly valid, instance along with the bad one.
    /// Once that one candidate is consumed, subsequent tokens are pulled
    /// straight from the lexer (bypassing `bump`/`expect`), because a
    /// corrupt instance can also make the lexer itself error byte-by-byte
    /// before it reaches a `;` it recognizes, which this loop tolerates
    /// rather than propagating.
    fn recover_instance(&mut self, start_line: u32) -> Result<(), ParseError> {
        let mut end_line = start_line;
        let mut pending = Some(self.cur);
        loop {
            let tok = match pending.take() {
                Some(tok) => tok,
                None => match self.lexer.next_token() {
                    Ok(tok) => tok,
                    Err(_) => continue,
                },
            };
            end_line = tok.line;
            match tok.kind {
                TokenKind::Semi => {
                    self.cur = self.lexer.next_token()?;
                    break;
                }
                TokenKind::Endsec | TokenKind::Eof => {
                    self.cur = tok;
                    break;
                }
                _ => {}
            }
        }
        self.warn(
            start_line,
            format!("resyncing parser, check input between line {start_line} and {end_line}"),
        );
        Ok(())
    }
}

impl<'a> Token<'a> {
    fn text_or_kind(&self) -> String {
        if self.text.is_empty() {
            self.kind.name().to_string()
        } else {
            self.text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "\
ISO-10303-21;
HEADER;
FILE_DESCRIPTION((),'2;1');
FILE_NAME('','',(),(),'','','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#10=CARTESIAN_POINT('',(0.,0.,0.));
#20=(GEOMETRIC_REPRESENTATION_CONTEXT()GLOBAL_UNIT_ASSIGNED_CONTEXT((#10)));
ENDSEC;
END-ISO-10303-21;
";

    #[test]
    fn parses_minimal_file() {
        let mut parser = Parser::new();
        let file = parser.parse(MINIMAL).unwrap();

        assert_eq!(file.header.file_description.type_name, "FILE_DESCRIPTION");
        assert_eq!(file.header.file_schema.params.len(), 1);
        assert_eq!(file.sections.len(), 1);
        assert_eq!(file.sections[0].entity_count, 2);

        let simple = parser.store().get("#10").unwrap();
        assert_eq!(simple.type_name.as_deref(), Some("CARTESIAN_POINT"));
        assert_eq!(simple.entity_type, EntityType::Simple);

        let complex = parser.store().get("#20").unwrap();
        assert_eq!(complex.type_name, None);
        assert_eq!(complex.entity_type, EntityType::Complex);
        assert!(complex.raw_data.starts_with('('));
    }

    #[test]
    fn duplicate_id_is_fatal() {
        let input = "\
ISO-10303-21;
HEADER;
FILE_DESCRIPTION((),'');
FILE_NAME('','',(),(),'','','');
FILE_SCHEMA(());
ENDSEC;
DATA;
#1=FOO();
#1=BAR();
ENDSEC;
END-ISO-10303-21;
";
        let mut parser = Parser::new();
        let err = parser.parse(input).unwrap_err();
        assert!(matches!(err, ParseError::StoreConstraintViolation { .. }));
    }

    #[test]
    fn empty_parameter_list_is_accepted() {
        let input = "\
ISO-10303-21;
HEADER;
FILE_DESCRIPTION();
FILE_NAME();
FILE_SCHEMA();
ENDSEC;
DATA;
ENDSEC;
END-ISO-10303-21;
";
        let mut parser = Parser::new();
        let file = parser.parse(input).unwrap();
        assert!(file.header.file_description.params.is_empty());
    }

    #[test]
    fn missing_part21_end_is_fatal() {
        let input = "ISO-10303-21;HEADER;FILE_DESCRIPTION();FILE_NAME();FILE_SCHEMA();ENDSEC;";
        let mut parser = Parser::new();
        let err = parser.parse(input).unwrap_err();
        assert!(matches!(err, ParseError::ParserSyntaxError { .. }));
    }

    #[test]
    fn typed_parameter_wraps_a_single_value() {
        let input = "\
ISO-10303-21;
HEADER;
FILE_DESCRIPTION((),'');
FILE_NAME('','',(),(),'','','');
FILE_SCHEMA(());
ENDSEC;
DATA;
#1=LENGTH_MEASURE_WRAP(LENGTH_MEASURE(3.0));
ENDSEC;
END-ISO-10303-21;
";
        let mut parser = Parser::new();
        parser.parse(input).unwrap();
        let rec = parser.store().get("#1").unwrap();
        assert_eq!(rec.raw_data, "(LENGTH_MEASURE(3.0))");
    }

    #[test]
    fn instance_with_unrecognizable_bytes_is_dropped_and_recovered() {
        let input = "\
ISO-10303-21;
HEADER;
FILE_DESCRIPTION((),'');
FILE_NAME('','',(),(),'','','');
FILE_SCHEMA(());
ENDSEC;
DATA;
#1 = @@@;
#2 = FOO(1);
ENDSEC;
END-ISO-10303-21;
";
        let mut parser = Parser::new();
        let file = parser.parse(input).unwrap();

        assert_eq!(file.sections[0].entity_count, 1);
        assert!(parser.store().get("#1").is_none());
        assert_eq!(parser.store().get("#2").unwrap().type_name.as_deref(), Some("FOO"));
        assert_eq!(parser.diagnostics().len(), 1);
    }

    #[test]
    fn empty_tail_instance_is_a_recovered_syntax_error() {
        let input = "\
ISO-10303-21;
HEADER;
FILE_DESCRIPTION((),'');
FILE_NAME('','',(),(),'','','');
FILE_SCHEMA(());
ENDSEC;
DATA;
#1=;
#2=FOO(1);
ENDSEC;
END-ISO-10303-21;
";
        let mut parser = Parser::new();
        let file = parser.parse(input).unwrap();

        assert_eq!(file.sections[0].entity_count, 1);
        assert!(parser.store().get("#1").is_none());
        assert_eq!(parser.store().get("#2").unwrap().type_name.as_deref(), Some("FOO"));
        assert_eq!(parser.diagnostics().len(), 1);
    }

    #[test]
    fn reusing_parser_resets_store_but_keeps_schemas() {
        let mut parser = Parser::new();
        parser.register_schema("IFC4", vec!["IFCWALL".into()]).unwrap();
        parser.activate_schema("IFC4").unwrap();
        parser.parse(MINIMAL).unwrap();
        assert_eq!(parser.store().len(), 2);

        parser.parse(MINIMAL).unwrap();
        assert_eq!(parser.store().len(), 2);
        assert_eq!(parser.active_schema(), Some("IFC4"));
    }
}
