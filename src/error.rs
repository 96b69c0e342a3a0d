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

//! Fatal errors: conditions a parse cannot recover from.
//!
//! An instance-level syntax error is *not* one of these — it is recovered by
//! the parser's error production and reported through
//! [`crate::diagnostics::Diagnostics`] instead. Everything here aborts
//! [`crate::parser::Parser::parse`].

use thiserror::Error;

/// Fatal conditions that abort a parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The pre-header scan consumed `header_limit` bytes without finding
    /// `ISO-10303-21;` or the start of a comment.
    #[error("scanning error: no ISO-10303-21; found within the first {limit} bytes (near {excerpt:?})")]
    LexerHeaderOverflow {
        limit: usize,
        excerpt: String,
    },

    /// No lexical rule matched at this position, in a mode where that is
    /// fatal rather than recoverable.
    #[error("line {line}: invalid token near {excerpt:?}")]
    LexerInvalidToken {
        line: u32,
        offset: usize,
        excerpt: String,
    },

    /// A syntax error outside the scope of the single `entity_instance`
    /// error production: the parser cannot resynchronize and gives up.
    #[error("line {line}: syntax error, expected {expected}, found {found:?}")]
    ParserSyntaxError {
        line: u32,
        expected: &'static str,
        found: String,
    },

    /// A duplicate `id`, or a null `type_name` on a simple instance: the
    /// store's primary-key or not-null constraint was violated.
    #[error("line {line}: store constraint violation: {reason}")]
    StoreConstraintViolation {
        line: u32,
        reason: String,
    },
}
