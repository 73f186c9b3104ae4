//! Pass 2: entry resolution, pending-slot fixup and artifact output
//!
//! The expanded file is scanned once more, this time only for `.entry`
//! directives, then every pending code slot is rewritten from the now
//! complete symbol table. Output files are produced only when the whole
//! run stayed clean.

use std::fs;

use super::encoder;
use super::errors::{Diagnostics, ErrorKind, Stage};
use super::first_pass::ProgramImage;
use super::lexer::{self, Cursor};
use super::parser::{self, Directive};
use super::tables::{CodeTable, DataTable, LabelRow, SecondaryKind, Slot};

/// Largest object image (code plus data words) that fits the 21-bit
/// address space.
const MAX_IMAGE_WORDS: u32 = 1 << 21;

/// The label rows derived during resolution: exported definitions and
/// external reference sites.
#[derive(Debug, Default)]
pub struct Resolved {
    pub entries: Vec<LabelRow>,
    pub externs: Vec<LabelRow>,
}

/// Run pass 2 over the expanded file and, if nothing was ever diagnosed,
/// write the `.ob`/`.ent`/`.ext` artifacts for `stem`.
pub fn run(expanded: &str, image: &mut ProgramImage, diag: &mut Diagnostics, stem: &str) {
    let resolved = resolve(expanded, image, diag);
    if diag.clean() {
        write_outputs(stem, image, &resolved, diag);
    }
}

/// The in-memory half of pass 2: mark entries, build the entries table,
/// fix up pending slots, and check the image size.
pub fn resolve(expanded: &str, image: &mut ProgramImage, diag: &mut Diagnostics) -> Resolved {
    mark_entries(expanded, image, diag);

    let entries = image
        .symbols
        .iter()
        .filter(|symbol| symbol.linkage == SecondaryKind::Entry)
        .map(|symbol| LabelRow { name: symbol.name.clone(), address: symbol.address })
        .collect();

    let externs = fix_up_pending_slots(image, diag);

    diag.reset_line();
    if image.code.word_count() + image.data.counter() > MAX_IMAGE_WORDS {
        diag.report(ErrorKind::ObjectTooLarge, Stage::Expanded);
    }

    Resolved { entries, externs }
}

/// Re-scan the expanded file for `.entry` directives and flip the named
/// symbols' linkage. An entry for an external symbol is kind 10 and the
/// symbol stays external.
fn mark_entries(expanded: &str, image: &mut ProgramImage, diag: &mut Diagnostics) {
    for (index, line) in expanded.lines().enumerate() {
        diag.set_line(index + 1);

        let mut cursor = Cursor::new(line);
        cursor.skip_whitespace();
        if cursor.is_at_end() || cursor.peek() == Some(b';') {
            continue;
        }
        if parser::take_directive_name(&mut cursor) != Some(Directive::Entry) {
            continue;
        }

        let label = parser::take_label_operand(&mut cursor, diag);
        lexer::check_no_extra_chars(&mut cursor, diag);
        let Some(label) = label else { continue };

        match image.symbols.get_mut(&label) {
            None => diag.report(ErrorKind::EntryLabelUndefined, Stage::Expanded),
            Some(symbol) if symbol.linkage == SecondaryKind::External => {
                diag.report(ErrorKind::EntryConflictsExternal, Stage::Expanded);
            }
            Some(symbol) => symbol.linkage = SecondaryKind::Entry,
        }
    }
    diag.reset_line();
}

/// Replace every pending slot with its encoded word, collecting one
/// externals row per direct reference to an external symbol. Unresolvable
/// slots are kind 37 at the slot's own source line.
fn fix_up_pending_slots(image: &mut ProgramImage, diag: &mut Diagnostics) -> Vec<LabelRow> {
    let mut externs = Vec::new();

    for index in 0..image.code.words.len() {
        let word = match &image.code.words[index].slot {
            Slot::Encoded(_) => continue,
            Slot::PendingDirect(name) => {
                let Some(symbol) = image.symbols.get(name) else {
                    diag.set_line(image.code.words[index].line);
                    diag.report(ErrorKind::LabelNeverDeclared, Stage::Expanded);
                    continue;
                };
                let external = symbol.linkage == SecondaryKind::External;
                if external {
                    externs.push(LabelRow {
                        name: name.clone(),
                        address: image.code.words[index].address,
                    });
                }
                encoder::direct_word(symbol.address, external)
            }
            Slot::PendingRelative(name) => {
                let Some(symbol) = image.symbols.get(name) else {
                    diag.set_line(image.code.words[index].line);
                    diag.report(ErrorKind::LabelNeverDeclared, Stage::Expanded);
                    continue;
                };
                if symbol.linkage == SecondaryKind::External {
                    diag.set_line(image.code.words[index].line);
                    diag.report(ErrorKind::ExternalInRelative, Stage::Expanded);
                }
                // the slot right before this one is the instruction's
                // first word
                let base = image.code.words[index - 1].address;
                encoder::relative_word(i64::from(symbol.address) - i64::from(base))
            }
        };
        image.code.words[index].slot = Slot::Encoded(word);
    }

    externs
}

/// Render the object file: a count header, then one `address word` row
/// per code word and per data word (data placed after the code image).
pub fn render_object(code: &CodeTable, data: &DataTable) -> String {
    let mut out = format!("     {} {}\n", code.word_count(), data.counter());
    for word in &code.words {
        out.push_str(&format!(
            "{:07} {}\n",
            word.address,
            encoder::render_hex(word.slot.value())
        ));
    }
    let icf = code.counter();
    for word in &data.words {
        out.push_str(&format!(
            "{:07} {}\n",
            word.offset + icf,
            encoder::render_hex(word.word)
        ));
    }
    out
}

/// Render an entries or externals file: one `label address` row each.
pub fn render_rows(rows: &[LabelRow]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&format!("{} {:07}\n", row.name, row.address));
    }
    out
}

/// Write `.ob` always, `.ent`/`.ext` only when they would be non-empty.
fn write_outputs(stem: &str, image: &ProgramImage, resolved: &Resolved, diag: &mut Diagnostics) {
    let object = render_object(&image.code, &image.data);
    if fs::write(format!("{stem}.ob"), object).is_err() {
        diag.report(ErrorKind::FileAccessFailed, Stage::Internal);
        return;
    }
    if !resolved.entries.is_empty()
        && fs::write(format!("{stem}.ent"), render_rows(&resolved.entries)).is_err()
    {
        diag.report(ErrorKind::FileAccessFailed, Stage::Internal);
        return;
    }
    if !resolved.externs.is_empty()
        && fs::write(format!("{stem}.ext"), render_rows(&resolved.externs)).is_err()
    {
        diag.report(ErrorKind::FileAccessFailed, Stage::Internal);
    }
}
