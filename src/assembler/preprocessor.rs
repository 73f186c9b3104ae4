//! Macro preprocessing: trims the source, collects `mcro` definitions and
//! writes the macro-expanded `.am` file
//!
//! Macro markers are only recognized at the start of a line, which is why
//! the source is first rewritten with leading whitespace removed. The
//! trimmed copy exists on disk only while this stage runs.

use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{Diagnostics, ErrorKind, Stage};
use super::parser;

const MACRO_START: &str = "mcro";
const MACRO_END: &str = "mcroend";

/// Longest permitted source line, newline excluded.
pub const MAX_LINE_LENGTH: usize = 80;

#[derive(Debug)]
struct Macro {
    name: String,
    body: String,
}

/// Named macro bodies in definition order.
#[derive(Debug, Default)]
pub struct MacroTable {
    macros: Vec<Macro>,
}

impl MacroTable {
    pub fn new() -> MacroTable {
        MacroTable::default()
    }

    /// Store a definition; a name that already exists keeps its first body.
    fn define(&mut self, name: String, body: String) {
        if self.contains(&name) {
            return;
        }
        self.macros.push(Macro { name, body });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.macros
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.body.as_str())
    }
}

/// Remove leading whitespace from every line.
pub fn trim_lines(source: &str) -> String {
    let mut trimmed = String::new();
    for line in source.lines() {
        trimmed.push_str(line.trim_start());
        trimmed.push('\n');
    }
    trimmed
}

/// Report an over-long line (kind 4) and keep only its first
/// [MAX_LINE_LENGTH] characters.
fn enforce_line_limit<'a>(line: &'a str, diag: &mut Diagnostics) -> &'a str {
    if line.len() <= MAX_LINE_LENGTH {
        return line;
    }
    diag.report(ErrorKind::LineTooLong, Stage::Source);
    let mut end = MAX_LINE_LENGTH;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}

/// Scan the trimmed source for `mcro <name> … mcroend` blocks and collect
/// their bodies. Invalid names are diagnosed but the definition is stored
/// anyway; only a duplicate name is dropped.
pub fn collect_macros(trimmed: &str, diag: &mut Diagnostics) -> MacroTable {
    let mut table = MacroTable::new();
    let mut lines = trimmed.lines();
    let mut line_number = 0;

    while let Some(line) = lines.next() {
        line_number += 1;
        diag.set_line(line_number);
        let line = enforce_line_limit(line, diag);

        let mut tokens = line.split_whitespace();
        if tokens.next() != Some(MACRO_START) {
            continue;
        }
        let name = tokens.next().unwrap_or("").to_string();
        if tokens.next().is_some() {
            diag.report(ErrorKind::MacroExtraChars, Stage::Source);
        }
        if parser::is_reserved_name(&name) {
            diag.report(ErrorKind::MacroNameReserved, Stage::Source);
        }
        if table.contains(&name) {
            diag.report(ErrorKind::MacroNameTaken, Stage::Source);
        }
        if !name.is_ascii() {
            diag.report(ErrorKind::MacroNameNotAscii, Stage::Source);
        }

        let mut body = String::new();
        for line in lines.by_ref() {
            line_number += 1;
            diag.set_line(line_number);
            let line = enforce_line_limit(line, diag);
            let mut tokens = line.split_whitespace();
            if tokens.next() == Some(MACRO_END) {
                if tokens.next().is_some() {
                    diag.report(ErrorKind::MacroEndExtraChars, Stage::Source);
                }
                break;
            }
            body.push_str(line);
            body.push('\n');
        }
        table.define(name, body);
    }

    diag.reset_line();
    table
}

/// Rewrite the trimmed source with macro definitions elided and macro
/// calls replaced by their bodies. A label that shadows a macro name is
/// kind 13.
pub fn expand(trimmed: &str, macros: &MacroTable, diag: &mut Diagnostics) -> String {
    let mut output = String::new();
    let mut lines = trimmed.lines();
    let mut line_number = 0;

    while let Some(line) = lines.next() {
        line_number += 1;
        diag.set_line(line_number);

        if let Some(label) = parser::label_declaration(line) {
            if macros.contains(label) {
                diag.report(ErrorKind::LabelNameIsMacro, Stage::Source);
            }
        }

        let first_token = line.split_whitespace().next();
        if first_token == Some(MACRO_START) {
            // definition blocks do not reach the expanded file
            for line in lines.by_ref() {
                line_number += 1;
                if line.split_whitespace().next() == Some(MACRO_END) {
                    break;
                }
            }
        } else if let Some(body) = first_token.and_then(|token| macros.lookup(token)) {
            output.push_str(body);
        } else {
            output.push_str(line);
            output.push('\n');
        }
    }

    diag.reset_line();
    output
}

/// The transient trimmed copy lives next to the source, with `trimmed_`
/// prefixed to the file name.
fn trimmed_file_path(stem: &str) -> PathBuf {
    let path = Path::new(stem);
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    path.with_file_name(format!("trimmed_{name}.as"))
}

/// Run the whole preprocessing stage for one stem: `<stem>.as` in,
/// `<stem>.am` out. I/O failures report kind 2 and abort the stage.
pub fn expand_file(stem: &str, diag: &mut Diagnostics) {
    let source = match fs::read_to_string(format!("{stem}.as")) {
        Ok(source) => source,
        Err(_) => {
            diag.report(ErrorKind::FileAccessFailed, Stage::Internal);
            return;
        }
    };

    let trimmed = trim_lines(&source);
    let trimmed_path = trimmed_file_path(stem);
    if fs::write(&trimmed_path, &trimmed).is_err() {
        diag.report(ErrorKind::FileAccessFailed, Stage::Internal);
        return;
    }

    let macros = collect_macros(&trimmed, diag);
    let expanded = expand(&trimmed, &macros, diag);
    if fs::write(format!("{stem}.am"), &expanded).is_err() {
        diag.report(ErrorKind::FileAccessFailed, Stage::Internal);
    }

    let _ = fs::remove_file(&trimmed_path);
}
