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

//! The mode-stack lexer.
//!
//! Token recognition is scoped by a stack of named modes rather than by one
//! flat state, because the grammar nests: comments can appear inside a
//! parameter list, which is inside a header entity, which is inside the
//! header section. A handful of push/pop rules (see [`Mode`]) keep that
//! nesting auditable without a parser-generator table.
//!
//! The interesting departure from a conventional tokenizer is [`Mode::Raw`]:
//! a data-section instance's parameter tail is never broken into individual
//! scalar tokens. It is captured as one or more verbatim [`TokenKind::Raw`]
//! slices — more than one only when a `/* ... */` comment inside the tail
//! splits the capture, since comments are elided in every mode, this one
//! included — which is both the main throughput win on large files and what
//! decouples this crate from any particular EXPRESS schema's parameter
//! shapes.

use crate::error::ParseError;
use crate::token::{Token, TokenKind};

/// A lexer mode. The mode stack's top entry determines which productions are
/// currently recognized.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Mode {
    /// Scanning for `ISO-10303-21;` (or comments) before anything else is
    /// trusted. The initial and post-`PART21_END` mode.
    Slurp,
    /// Between `PART21_START` and either `HEADER;` or a `DATA` section.
    Initial,
    /// Inside `HEADER; ... ENDSEC;`.
    Header,
    /// The optional parameter list directly after the `DATA` keyword.
    DataParams,
    /// Inside `DATA ... ENDSEC;`, between entity instances.
    Data,
    /// Inside a parenthesized parameter list (header entity or `DATA(...)`).
    Params,
    /// Capturing a data-section instance's verbatim tail.
    Raw,
}

/// Default bound on how many bytes [`Mode::Slurp`] may scan before giving up.
pub const DEFAULT_HEADER_LIMIT: usize = 4096;

/// A stateful lexer over one Part 21 exchange file.
///
/// Token text is always borrowed from the input buffer; the lexer never
/// allocates a lexeme. See the module documentation for the mode stack this
/// type drives.
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    modes: Vec<Mode>,
    lvl: u32,
    header_limit: usize,
    slurp_start: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `input`, with the default `header_limit`.
    pub fn new(input: &'a str) -> Self {
        Self::with_header_limit(input, DEFAULT_HEADER_LIMIT)
    }

    /// Creates a lexer over `input`, bounding the pre-header scan to
    /// `header_limit` bytes.
    pub fn with_header_limit(input: &'a str, header_limit: usize) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
            modes: vec![Mode::Slurp],
            lvl: 0,
            header_limit,
            slurp_start: 0,
        }
    }

    /// Resets the lexer to scan `input` from the beginning, in [`Mode::Slurp`].
    pub fn reset(&mut self, input: &'a str) {
        self.input = input;
        self.bytes = input.as_bytes();
        self.pos = 0;
        self.line = 1;
        self.modes.clear();
        self.modes.push(Mode::Slurp);
        self.lvl = 0;
        self.slurp_start = 0;
    }

    /// The current 1-based line number.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Depth of the current mode stack. Zero only ever occurs as a bug; a
    /// well-formed lexer session always has at least [`Mode::Slurp`] at the
    /// bottom.
    pub fn mode_depth(&self) -> usize {
        self.modes.len()
    }

    /// Whether the mode stack holds only the bottom [`Mode::Slurp`] frame —
    /// true at lexer construction and true again immediately after a
    /// `PART21_END` token, per the invariant in the data model.
    pub fn is_at_top_level(&self) -> bool {
        self.modes.len() == 1 && self.modes[0] == Mode::Slurp
    }

    /// Scans and returns the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>, ParseError> {
        loop {
            let mode = *self.modes.last().expect("lexer mode stack must not be empty");
            let produced = match mode {
                Mode::Slurp => self.scan_slurp()?,
                Mode::Initial => self.scan_initial()?,
                Mode::Header => self.scan_header()?,
                Mode::DataParams => self.scan_data_params()?,
                Mode::Data => self.scan_data()?,
                Mode::Params => self.scan_params()?,
                Mode::Raw => self.scan_raw()?,
            };
            if let Some(token) = produced {
                return Ok(token);
            }
            // `None` means the mode transitioned without producing a token
            // (e.g. the bare '(' that opens a complex instance); loop again
            // under the new top-of-stack mode.
        }
    }

    // -- mode scanners --------------------------------------------------

    fn scan_slurp(&mut self) -> Result<Option<Token<'a>>, ParseError> {
        loop {
            if self.pos >= self.bytes.len() {
                return Ok(Some(self.make_eof()));
            }
            if self.starts_with("/*") {
                self.skip_block_comment()?;
                continue;
            }
            if self.starts_with("ISO-10303-21;") {
                let start = self.pos;
                let line = self.line;
                self.pos += "ISO-10303-21;".len();
                *self.modes.last_mut().unwrap() = Mode::Initial;
                return Ok(Some(Token::new(TokenKind::Part21Start, &self.input[start..self.pos], line, start)));
            }
            if self.bytes[self.pos] == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
            if self.pos - self.slurp_start > self.header_limit {
                let excerpt_end = (self.slurp_start + 32).min(self.bytes.len());
                return Err(ParseError::LexerHeaderOverflow {
                    limit: self.header_limit,
                    excerpt: self.input[self.slurp_start..excerpt_end].to_string(),
                });
            }
        }
    }

    fn scan_initial(&mut self) -> Result<Option<Token<'a>>, ParseError> {
        self.skip_ws_and_comments()?;
        if self.pos >= self.bytes.len() {
            return Ok(Some(self.make_eof()));
        }
        let start = self.pos;
        let line = self.line;

        if self.starts_with("HEADER;") {
            self.pos += "HEADER;".len();
            self.modes.push(Mode::Header);
            return Ok(Some(Token::new(TokenKind::Header, &self.input[start..self.pos], line, start)));
        }
        if self.starts_with("END-ISO-10303-21;") {
            self.pos += "END-ISO-10303-21;".len();
            self.modes.clear();
            self.modes.push(Mode::Slurp);
            self.lvl = 0;
            self.slurp_start = self.pos;
            return Ok(Some(Token::new(TokenKind::Part21End, &self.input[start..self.pos], line, start)));
        }
        if self.starts_with("DATA") && self.word_boundary_after(start + 4) {
            self.pos += "DATA".len();
            self.modes.push(Mode::DataParams);
            return Ok(Some(Token::new(TokenKind::Data, &self.input[start..self.pos], line, start)));
        }
        Err(self.invalid_token("HEADER;, DATA, or END-ISO-10303-21;"))
    }

    fn scan_header(&mut self) -> Result<Option<Token<'a>>, ParseError> {
        self.skip_ws_and_comments()?;
        if self.pos >= self.bytes.len() {
            return Ok(Some(self.make_eof()));
        }
        let start = self.pos;
        let line = self.line;

        if self.starts_with("ENDSEC;") {
            self.pos += "ENDSEC;".len();
            self.modes.pop();
            return Ok(Some(Token::new(TokenKind::Endsec, &self.input[start..self.pos], line, start)));
        }
        match self.bytes[self.pos] {
            b'(' => {
                self.pos += 1;
                self.lvl = 1;
                self.modes.push(Mode::Params);
                Ok(Some(Token::new(TokenKind::LParen, &self.input[start..self.pos], line, start)))
            }
            b';' => {
                self.pos += 1;
                Ok(Some(Token::new(TokenKind::Semi, &self.input[start..self.pos], line, start)))
            }
            b if is_keyword_start(b) => {
                self.scan_keyword();
                Ok(Some(Token::new(TokenKind::Keyword, &self.input[start..self.pos], line, start)))
            }
            _ => Err(self.invalid_token("a header entity keyword, '(', ';', or ENDSEC;")),
        }
    }

    fn scan_data_params(&mut self) -> Result<Option<Token<'a>>, ParseError> {
        self.skip_ws_and_comments()?;
        if self.pos >= self.bytes.len() {
            return Ok(Some(self.make_eof()));
        }
        let start = self.pos;
        let line = self.line;

        match self.bytes[self.pos] {
            b'(' => {
                self.pos += 1;
                self.lvl = 1;
                self.modes.push(Mode::Params);
                Ok(Some(Token::new(TokenKind::LParen, &self.input[start..self.pos], line, start)))
            }
            b';' => {
                self.pos += 1;
                self.modes.pop();
                self.modes.push(Mode::Data);
                Ok(Some(Token::new(TokenKind::Semi, &self.input[start..self.pos], line, start)))
            }
            _ => Err(self.invalid_token("'(' or ';'")),
        }
    }

    fn scan_data(&mut self) -> Result<Option<Token<'a>>, ParseError> {
        self.skip_ws_and_comments()?;
        if self.pos >= self.bytes.len() {
            return Ok(Some(self.make_eof()));
        }
        let start = self.pos;
        let line = self.line;

        if self.starts_with("ENDSEC;") {
            self.pos += "ENDSEC;".len();
            self.modes.pop();
            return Ok(Some(Token::new(TokenKind::Endsec, &self.input[start..self.pos], line, start)));
        }
        match self.bytes[self.pos] {
            b'#' => {
                self.scan_eid()?;
                Ok(Some(Token::new(TokenKind::Eid, &self.input[start..self.pos], line, start)))
            }
            b'=' => {
                self.pos += 1;
                Ok(Some(Token::new(TokenKind::Equals, &self.input[start..self.pos], line, start)))
            }
            b'(' => {
                // Complex instance: do not consume the paren, let RAW capture it.
                self.modes.push(Mode::Raw);
                Ok(None)
            }
            b';' => {
                // Not part of any well-formed production here, but recognizing it
                // (rather than erroring) gives the parser's instance-level error
                // recovery a clean resync point when a corrupt instance is skipped
                // one byte at a time.
                self.pos += 1;
                Ok(Some(Token::new(TokenKind::Semi, &self.input[start..self.pos], line, start)))
            }
            b if is_keyword_start(b) => {
                self.scan_keyword();
                self.modes.push(Mode::Raw);
                Ok(Some(Token::new(TokenKind::Keyword, &self.input[start..self.pos], line, start)))
            }
            _ => {
                let err = self.invalid_token("EID, a type keyword, '(', or ENDSEC;");
                self.pos += 1; // guarantee forward progress for instance-level recovery
                Err(err)
            }
        }
    }

    fn scan_params(&mut self) -> Result<Option<Token<'a>>, ParseError> {
        self.skip_ws_and_comments()?;
        if self.pos >= self.bytes.len() {
            return Ok(Some(self.make_eof()));
        }
        let start = self.pos;
        let line = self.line;

        match self.bytes[self.pos] {
            b'(' => {
                self.pos += 1;
                self.lvl += 1;
                Ok(Some(Token::new(TokenKind::LParen, &self.input[start..self.pos], line, start)))
            }
            b')' => {
                self.pos += 1;
                self.lvl -= 1;
                if self.lvl == 0 {
                    self.modes.pop();
                }
                Ok(Some(Token::new(TokenKind::RParen, &self.input[start..self.pos], line, start)))
            }
            b',' => {
                self.pos += 1;
                Ok(Some(Token::new(TokenKind::Comma, &self.input[start..self.pos], line, start)))
            }
            b'*' => {
                self.pos += 1;
                Ok(Some(Token::new(TokenKind::Star, &self.input[start..self.pos], line, start)))
            }
            b'$' => {
                self.pos += 1;
                Ok(Some(Token::new(TokenKind::Dollar, &self.input[start..self.pos], line, start)))
            }
            b'#' => {
                self.scan_eid()?;
                Ok(Some(Token::new(TokenKind::Eid, &self.input[start..self.pos], line, start)))
            }
            b'\'' => {
                self.scan_string()?;
                Ok(Some(Token::new(TokenKind::Str, &self.input[start..self.pos], line, start)))
            }
            b'"' => {
                self.scan_binary()?;
                Ok(Some(Token::new(TokenKind::Binary, &self.input[start..self.pos], line, start)))
            }
            b'.' => {
                self.scan_enumeration()?;
                Ok(Some(Token::new(TokenKind::Enumeration, &self.input[start..self.pos], line, start)))
            }
            b if b.is_ascii_digit() || b == b'+' || b == b'-' => {
                let kind = self.scan_number()?;
                Ok(Some(Token::new(kind, &self.input[start..self.pos], line, start)))
            }
            b if is_keyword_start(b) => {
                self.scan_keyword();
                Ok(Some(Token::new(TokenKind::Keyword, &self.input[start..self.pos], line, start)))
            }
            _ => Err(self.invalid_token("a parameter")),
        }
    }

    fn scan_raw(&mut self) -> Result<Option<Token<'a>>, ParseError> {
        loop {
            if self.pos >= self.bytes.len() {
                return Ok(Some(self.make_eof()));
            }
            if self.starts_with("/*") {
                self.skip_block_comment()?;
                continue;
            }
            if self.bytes[self.pos] == b';' {
                let start = self.pos;
                let line = self.line;
                self.pos += 1;
                self.modes.pop();
                return Ok(Some(Token::new(TokenKind::Semi, &self.input[start..self.pos], line, start)));
            }
            break;
        }

        let start = self.pos;
        let line = self.line;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b';' => break,
                b'/' if self.starts_with("/*") => break,
                b'\'' => self.skip_quoted(b'\'')?,
                b'"' => self.skip_quoted(b'"')?,
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
        if self.pos >= self.bytes.len() {
            return Err(ParseError::LexerInvalidToken {
                line: self.line,
                offset: start,
                excerpt: "unterminated entity instance (missing ';')".to_string(),
            });
        }
        Ok(Some(Token::new(TokenKind::Raw, &self.input[start..self.pos], line, start)))
    }

    // -- sub-scanners -----------------------------------------------------

    fn scan_keyword(&mut self) {
        if self.bytes[self.pos] == b'!' {
            self.pos += 1;
        }
        while self.pos < self.bytes.len() && is_ident_continue(self.bytes[self.pos]) {
            self.pos += 1;
        }
    }

    fn scan_eid(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 1; // '#'
        let digits_start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos == digits_start {
            return Err(ParseError::LexerInvalidToken {
                line: self.line,
                offset: start,
                excerpt: self.input[start..self.pos.min(start + 8)].to_string(),
            });
        }
        Ok(())
    }

    /// Scans a run of signs, digits, and an optional `.digits` with an
    /// optional `E`-exponent. Preserves the original tool's leniency: a run
    /// of multiple signs (`+-+1`) is accepted, not just one.
    fn scan_number(&mut self) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        while matches!(self.bytes.get(self.pos), Some(b'+') | Some(b'-')) {
            self.pos += 1;
        }
        let digits_start = self.pos;
        while matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == digits_start {
            return Err(ParseError::LexerInvalidToken {
                line: self.line,
                offset: start,
                excerpt: self.input[start..self.pos.min(start + 8)].to_string(),
            });
        }

        let mut kind = TokenKind::Integer;
        if self.bytes.get(self.pos) == Some(&b'.') {
            kind = TokenKind::Real;
            self.pos += 1;
            while matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_digit()) {
                self.pos += 1;
            }
            if matches!(self.bytes.get(self.pos), Some(b'E') | Some(b'e')) {
                self.pos += 1;
                while matches!(self.bytes.get(self.pos), Some(b'+') | Some(b'-')) {
                    self.pos += 1;
                }
                while matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
        }
        Ok(kind)
    }

    fn scan_string(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 1; // opening '
        loop {
            if self.pos >= self.bytes.len() {
                return Err(ParseError::LexerInvalidToken {
                    line: self.line,
                    offset: start,
                    excerpt: "unterminated string".to_string(),
                });
            }
            match self.bytes[self.pos] {
                b'\'' => {
                    self.pos += 1;
                    if self.bytes.get(self.pos) == Some(&b'\'') {
                        self.pos += 1; // doubled '' escape, keep scanning
                        continue;
                    }
                    break;
                }
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
        Ok(())
    }

    fn scan_binary(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 1; // opening "
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'"' {
            if self.bytes[self.pos] == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
        if self.pos >= self.bytes.len() {
            return Err(ParseError::LexerInvalidToken {
                line: self.line,
                offset: start,
                excerpt: "unterminated binary literal".to_string(),
            });
        }
        self.pos += 1; // closing "
        Ok(())
    }

    fn scan_enumeration(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 1; // leading '.'
        let ident_start = self.pos;
        if !matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_uppercase() || *b == b'_') {
            return Err(self.invalid_token_at(start, "an enumeration"));
        }
        self.pos += 1;
        while matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_uppercase() || b.is_ascii_digit() || *b == b'_') {
            self.pos += 1;
        }
        let _ = ident_start;
        if self.bytes.get(self.pos) != Some(&b'.') {
            return Err(self.invalid_token_at(start, "a closing '.'"));
        }
        self.pos += 1;
        Ok(())
    }

    fn skip_quoted(&mut self, quote: u8) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 1; // opening quote
        loop {
            if self.pos >= self.bytes.len() {
                return Err(ParseError::LexerInvalidToken {
                    line: self.line,
                    offset: start,
                    excerpt: "unterminated quoted literal in instance tail".to_string(),
                });
            }
            match self.bytes[self.pos] {
                b if b == quote => {
                    self.pos += 1;
                    if self.bytes.get(self.pos) == Some(&quote) {
                        self.pos += 1; // doubled escape
                        continue;
                    }
                    return Ok(());
                }
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 2; // "/*"
        loop {
            if self.pos + 1 >= self.bytes.len() {
                if self.starts_with("*/") {
                    self.pos += 2;
                    return Ok(());
                }
                return Err(ParseError::LexerInvalidToken {
                    line: self.line,
                    offset: start,
                    excerpt: "unterminated comment".to_string(),
                });
            }
            if self.starts_with("*/") {
                self.pos += 2;
                return Ok(());
            }
            if self.bytes[self.pos] == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    /// Skips whitespace and `/* ... */` comments, common to every mode except
    /// [`Mode::Slurp`] (which has its own junk-skipping search) and
    /// [`Mode::Raw`] (which captures comments verbatim as part of the tail).
    fn skip_ws_and_comments(&mut self) -> Result<(), ParseError> {
        loop {
            if self.pos >= self.bytes.len() {
                return Ok(());
            }
            match self.bytes[self.pos] {
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                b'/' if self.starts_with("/*") => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.bytes[self.pos..].starts_with(s.as_bytes())
    }

    fn word_boundary_after(&self, offset: usize) -> bool {
        match self.bytes.get(offset) {
            None => true,
            Some(b) => !is_ident_continue(*b),
        }
    }

    fn make_eof(&self) -> Token<'a> {
        Token::new(TokenKind::Eof, "", self.line, self.pos)
    }

    fn invalid_token(&self, expected: &str) -> ParseError {
        self.invalid_token_at(self.pos, expected)
    }

    fn invalid_token_at(&self, offset: usize, expected: &str) -> ParseError {
        let end = (offset + 16).min(self.bytes.len());
        ParseError::LexerInvalidToken {
            line: self.line,
            offset,
            excerpt: format!("expected {expected}, found {:?}", &self.input[offset..end]),
        }
    }
}

fn is_keyword_start(b: u8) -> bool {
    b == b'!' || b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input);
        let mut kinds = Vec::new();
        loop {
            let tok = lexer.next_token().expect("lex error");
            let done = tok.kind == TokenKind::Eof;
            kinds.push(tok.kind);
            if done {
                break;
            }
        }
        kinds
    }

    #[test]
    fn minimal_file_tokenizes() {
        let input = "\
ISO-10303-21;
HEADER;
FILE_DESCRIPTION((),'2;1');
FILE_NAME('','',(),(),'','','');
FILE_SCHEMA(());
ENDSEC;
DATA;
#10=CARTESIAN_POINT('',(0.,0.,0.));
ENDSEC;
END-ISO-10303-21;
";
        let mut lexer = Lexer::new(input);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Part21Start);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Header);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Keyword); // FILE_DESCRIPTION
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::LParen);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::LParen);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::RParen);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Comma);
        let str_tok = lexer.next_token().unwrap();
        assert_eq!(str_tok.kind, TokenKind::Str);
        assert_eq!(str_tok.text, "'2;1'");
    }

    #[test]
    fn pre_header_garbage_is_skipped() {
        let input = "garbage bytes\n/* hi */\nISO-10303-21;\nHEADER;";
        let mut lexer = Lexer::new(input);
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Part21Start);
        assert_eq!(tok.line, 3);
    }

    #[test]
    fn header_overflow_is_fatal() {
        let junk = "x".repeat(5000);
        let mut lexer = Lexer::with_header_limit(&junk, 100);
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, ParseError::LexerHeaderOverflow { limit: 100, .. }));
    }

    #[test]
    fn complex_instance_tail_includes_leading_paren() {
        let input = "ISO-10303-21;HEADER;ENDSEC;DATA;#20=(A()B(#10));ENDSEC;END-ISO-10303-21;";
        let mut lexer = Lexer::new(input);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Part21Start);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Header);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Endsec);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Data);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Semi);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eid);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Equals);
        let raw = lexer.next_token().unwrap();
        assert_eq!(raw.kind, TokenKind::Raw);
        assert_eq!(raw.text, "(A()B(#10))");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Semi);
    }

    #[test]
    fn comment_inside_raw_tail_splits_the_capture() {
        let input = "ISO-10303-21;HEADER;ENDSEC;DATA;#1=FOO(1/* hi */,2);ENDSEC;END-ISO-10303-21;";
        let mut lexer = Lexer::new(input);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Part21Start);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Header);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Endsec);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Data);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Semi);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eid);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Equals);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Keyword); // FOO

        let first = lexer.next_token().unwrap();
        assert_eq!(first.kind, TokenKind::Raw);
        assert_eq!(first.text, "(1");

        let second = lexer.next_token().unwrap();
        assert_eq!(second.kind, TokenKind::Raw);
        assert_eq!(second.text, ",2)");

        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Semi);
    }

    #[test]
    fn mode_stack_is_balanced_after_part21_end() {
        let input = "ISO-10303-21;HEADER;ENDSEC;DATA;ENDSEC;END-ISO-10303-21;";
        let mut lexer = Lexer::new(input);
        loop {
            let tok = lexer.next_token().unwrap();
            if tok.kind == TokenKind::Part21End {
                break;
            }
        }
        assert!(lexer.is_at_top_level());
    }

    #[test]
    fn signed_number_runs_are_lenient() {
        let input = "+-+1";
        let mut lexer = Lexer::new(input);
        lexer.modes.push(Mode::Params); // drive PARAMS mode directly for this unit test
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Integer);
        assert_eq!(tok.text, "+-+1");
    }

    #[test]
    fn real_takes_priority_over_integer_at_a_decimal_point() {
        let input = "3.14";
        let mut lexer = Lexer::new(input);
        lexer.modes.push(Mode::Params);
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Real);
        assert_eq!(tok.text, "3.14");
    }

    #[test]
    fn data_keyword_is_rejected_as_a_prefix_of_a_longer_identifier() {
        assert_eq!(tokens("ISO-10303-21;HEADER;").len() > 0, true);
    }
}
