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

use std::env::args;
use std::fs::File as FsFile;
use std::io::{self, stderr, stdin, stdout, Read, Write};
use std::process::ExitCode;

use colored::Colorize;

use part21::{EntityType, ParseError, Parser, Severity};

/// The name of the program.
pub const PROGRAM_NAME: &str = "part21";

fn main() -> ExitCode {
    let mut args = args();
    args.next();

    let mut buffer = String::new();
    if let Err(e) = read_input(args, &mut buffer) {
        let _ = writeln!(stderr(), "{}: {}", PROGRAM_NAME.red().bold(), e);
        return ExitCode::FAILURE;
    }

    let mut parser = Parser::new();
    match parser.parse(&buffer) {
        Ok(file) => {
            print_summary(&parser, &file);
            ExitCode::SUCCESS
        }
        Err(err) => {
            print_fatal(&err);
            ExitCode::FAILURE
        }
    }
}

fn read_input(args: impl Iterator<Item = String>, buffer: &mut String) -> io::Result<()> {
    let mut args = args.peekable();

    if args.peek().is_none() {
        writeln!(stderr(), "reading stdin")?;
        return stdin().read_to_string(buffer).map(drop);
    }

    for arg in args {
        if arg == "-" {
            writeln!(stderr(), "reading stdin")?;
            stdin().read_to_string(buffer)?;
        } else {
            writeln!(stderr(), "reading {arg}")?;
            FsFile::open(arg)?.read_to_string(buffer)?;
        }
    }
    Ok(())
}

fn print_summary(parser: &Parser, file: &part21::File) {
    let store = parser.store();
    let simple = store.scan_by_entity_type(EntityType::Simple).count();
    let complex = store.scan_by_entity_type(EntityType::Complex).count();

    println!("{}", "header:".bold());
    println!("  {}", file.header.file_description.type_name);
    println!("  {}", file.header.file_name.type_name);
    println!("  {}", file.header.file_schema.type_name);
    if !file.header.extra_headers.is_empty() {
        println!("  ({} additional header entities)", file.header.extra_headers.len());
    }

    println!("{}", "data:".bold());
    println!("  {} section(s), {} instance(s) ({simple} simple, {complex} complex)",
        file.sections.len(), store.len());

    let out = stdout();
    let mut out = out.lock();
    for diag in parser.diagnostics() {
        let line = match diag.severity {
            Severity::Warning => format!("{}", diag).yellow().to_string(),
            Severity::Info => format!("{}", diag).to_string(),
        };
        let _ = writeln!(out, "{line}");
    }
}

fn print_fatal(err: &ParseError) {
    let _ = writeln!(stderr(), "{}: {}", PROGRAM_NAME.red().bold(), err);
}
