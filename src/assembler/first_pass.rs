//! Pass 1: statement-by-statement encoding of the expanded file
//!
//! Builds the code and data images and the symbol table. Instruction
//! operands in direct or relative mode become pending slots for pass 2;
//! everything else is encoded on the spot. When the file has been
//! consumed, data symbols are relocated above the final code image.

use super::encoder;
use super::errors::{Diagnostics, ErrorKind, Stage};
use super::lexer::{self, Cursor};
use super::parser::{self, AddressingMode, Directive};
use super::tables::{CodeTable, DataTable, PrimaryKind, SecondaryKind, Slot, SymbolTable};

/// Everything pass 1 produces and pass 2 consumes.
#[derive(Debug, Default)]
pub struct ProgramImage {
    pub code: CodeTable,
    pub data: DataTable,
    pub symbols: SymbolTable,
}

/// Run pass 1 over the expanded file.
pub fn run(expanded: &str, diag: &mut Diagnostics) -> ProgramImage {
    let mut image = ProgramImage::default();
    for (index, line) in expanded.lines().enumerate() {
        diag.set_line(index + 1);
        encode_line(line, &mut image, diag);
    }
    diag.reset_line();

    let icf = image.code.counter();
    image.symbols.relocate_data(icf);
    image
}

fn encode_line(line: &str, image: &mut ProgramImage, diag: &mut Diagnostics) {
    let mut cursor = Cursor::new(line);
    cursor.skip_whitespace();
    if cursor.is_at_end() || cursor.peek() == Some(b';') {
        return;
    }

    if cursor.rest().contains(':') {
        parser::validate_label_declaration(&mut cursor, diag);
    }

    // scan forward to the statement: a directive starts with '.', an
    // instruction with a lowercase mnemonic
    let mut stray_reported = false;
    while let Some(c) = cursor.peek() {
        if c == b'.' || c.is_ascii_lowercase() {
            break;
        }
        if !c.is_ascii_whitespace() && !stray_reported {
            diag.report(ErrorKind::StrayCharsBeforeStatement, Stage::Expanded);
            stray_reported = true;
        }
        cursor.advance(1);
    }

    if cursor.peek() == Some(b'.') {
        encode_directive(&mut cursor, line, image, diag);
    } else {
        encode_instruction(&mut cursor, line, image, diag);
    }
}

fn encode_directive(cursor: &mut Cursor, line: &str, image: &mut ProgramImage, diag: &mut Diagnostics) {
    let Some(directive) = parser::take_directive_name(cursor) else {
        diag.report(ErrorKind::UnknownDirective, Stage::Expanded);
        return;
    };

    if let Some(label) = parser::label_declaration(line) {
        match directive {
            Directive::Data | Directive::String => {
                let dc = image.data.counter();
                image.symbols.insert(label, dc, PrimaryKind::Data, SecondaryKind::None, diag);
            }
            // a label in front of these is meaningless and dropped
            Directive::Entry | Directive::Extern => {
                diag.report(ErrorKind::LabelBeforeEntryExtern, Stage::Expanded);
            }
        }
    }

    match directive {
        Directive::Data => encode_data(cursor, image, diag),
        Directive::String => encode_string(cursor, image, diag),
        // resolved entirely in pass 2
        Directive::Entry => {}
        Directive::Extern => {
            if let Some(name) = parser::take_label_operand(cursor, diag) {
                image.symbols.insert(&name, 0, PrimaryKind::None, SecondaryKind::External, diag);
            }
            lexer::check_no_extra_chars(cursor, diag);
        }
    }
}

/// `.data`: one word per integer. The scan stops at the first invalid
/// number; whatever follows it then trips the trailing-characters check.
fn encode_data(cursor: &mut Cursor, image: &mut ProgramImage, diag: &mut Diagnostics) {
    let mut values = 0;
    let mut expected_commas = 0;
    loop {
        let commas = cursor.skip_whitespace_and_commas();
        if cursor.is_at_end() {
            break;
        }
        if commas != expected_commas {
            diag.report(ErrorKind::BadCommaCount, Stage::Expanded);
        }
        expected_commas = 1;

        let text = cursor.take_until(|c| c.is_ascii_whitespace() || c == b',');
        if !lexer::is_valid_number(text, diag) {
            break;
        }
        let value = text.parse::<i64>().unwrap_or(0);
        image.data.emit(encoder::data_word(value));
        values += 1;
    }

    if values == 0 {
        diag.report(ErrorKind::EmptyData, Stage::Expanded);
    }
    lexer::check_no_extra_chars(cursor, diag);
}

/// `.string`: one word per character plus a terminating null word.
fn encode_string(cursor: &mut Cursor, image: &mut ProgramImage, diag: &mut Diagnostics) {
    if let Some(text) = parser::take_string_literal(cursor, diag) {
        for c in text.bytes() {
            image.data.emit(encoder::data_word(i64::from(c)));
        }
        image.data.emit(encoder::data_word(0));
    }
    lexer::check_no_extra_chars(cursor, diag);
}

fn encode_instruction(cursor: &mut Cursor, line: &str, image: &mut ProgramImage, diag: &mut Diagnostics) {
    let Some(spec) = parser::take_instruction_name(cursor) else {
        if cursor.is_at_end() {
            diag.report(ErrorKind::MissingInstruction, Stage::Expanded);
        } else {
            diag.report(ErrorKind::UnknownInstruction, Stage::Expanded);
        }
        return;
    };

    let (source, destination) = match spec.operands {
        0 => (None, None),
        1 => (None, Some(parser::take_operand(cursor, 0, diag))),
        _ => {
            let source = parser::take_operand(cursor, 0, diag);
            let destination = parser::take_operand(cursor, 1, diag);
            (Some(source), Some(destination))
        }
    };
    lexer::check_no_extra_chars(cursor, diag);

    let source_mode = source.and_then(|op| parser::addressing_mode(spec, op, diag));
    let destination_mode = destination.and_then(|op| parser::addressing_mode(spec, op, diag));

    if let Some(op) = source {
        if op.is_empty() {
            diag.report(ErrorKind::MissingSourceOperand, Stage::Expanded);
        } else if !parser::mode_is_legal(spec, source_mode, true) {
            diag.report(ErrorKind::BadSourceMode, Stage::Expanded);
        }
    }
    if let Some(op) = destination {
        if op.is_empty() {
            diag.report(ErrorKind::MissingDestinationOperand, Stage::Expanded);
        } else if !parser::mode_is_legal(spec, destination_mode, false) {
            diag.report(ErrorKind::BadDestinationMode, Stage::Expanded);
        }
    }

    if let Some(label) = parser::label_declaration(line) {
        let ic = image.code.counter();
        image.symbols.insert(label, ic, PrimaryKind::Code, SecondaryKind::None, diag);
    }

    // an unclassifiable operand still occupies its fields; the line is
    // already diagnosed, so encode it as zeroed immediate
    let source_mode = source_mode.unwrap_or(AddressingMode::Immediate);
    let destination_mode = destination_mode.unwrap_or(AddressingMode::Immediate);

    let first = encoder::first_word(
        spec,
        source_mode,
        parser::register_number(source),
        destination_mode,
        parser::register_number(destination),
    );
    image.code.emit(Slot::Encoded(first), diag.line());

    if let Some(op) = source {
        emit_operand_word(op, source_mode, image, diag);
    }
    if let Some(op) = destination {
        emit_operand_word(op, destination_mode, image, diag);
    }
}

/// Append the extra word an operand contributes, if any. Direct-register
/// operands live in the first word; direct and relative operands become
/// pending slots.
fn emit_operand_word(
    operand: &str,
    mode: AddressingMode,
    image: &mut ProgramImage,
    diag: &mut Diagnostics,
) {
    let slot = match mode {
        AddressingMode::DirectRegister => return,
        AddressingMode::Immediate => {
            let digits = operand.strip_prefix('#').unwrap_or(operand);
            let value = digits.parse::<i64>().unwrap_or(0);
            Slot::Encoded(encoder::immediate_word(value))
        }
        AddressingMode::Direct => Slot::PendingDirect(operand.to_string()),
        AddressingMode::Relative => {
            Slot::PendingRelative(operand.strip_prefix('&').unwrap_or(operand).to_string())
        }
    };
    image.code.emit(slot, diag.line());
}
