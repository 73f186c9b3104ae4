//! Statement-level parsing: mnemonic and directive recognition, operand
//! extraction, label handling and addressing-mode classification
//!
//! The grammar is flat enough that everything works directly on a
//! [Cursor]; the only compiled pattern is the label-declaration shape,
//! which both the preprocessor and the first pass need.

use std::sync::LazyLock;

use regex::Regex;

use super::errors::{Diagnostics, ErrorKind, Stage};
use super::lexer::{self, Cursor};

/// Longest a declared label may be, in characters.
pub const MAX_LABEL_LENGTH: usize = 31;

/// The four operand addressing modes; the discriminant is the two-bit
/// field value in the first instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Immediate = 0,
    Direct = 1,
    Relative = 2,
    DirectRegister = 3,
}

use AddressingMode::{Direct, DirectRegister, Immediate, Relative};

/// One row of the fixed instruction table.
#[derive(Debug)]
pub struct InstructionSpec {
    pub name: &'static str,
    pub opcode: u32,
    pub funct: u32,
    pub source_modes: &'static [AddressingMode],
    pub destination_modes: &'static [AddressingMode],
    pub operands: usize,
}

/// The full instruction set: name, opcode, funct, legal source modes,
/// legal destination modes, operand count.
pub const INSTRUCTIONS: [InstructionSpec; 16] = [
    instruction("mov", 0, 0, &[Immediate, Direct, DirectRegister], &[Direct, DirectRegister], 2),
    instruction("cmp", 1, 0, &[Immediate, Direct, DirectRegister], &[Immediate, Direct, DirectRegister], 2),
    instruction("add", 2, 1, &[Immediate, Direct, DirectRegister], &[Direct, DirectRegister], 2),
    instruction("sub", 2, 2, &[Immediate, Direct, DirectRegister], &[Direct, DirectRegister], 2),
    instruction("lea", 4, 0, &[Direct], &[Direct, DirectRegister], 2),
    instruction("clr", 5, 1, &[], &[Direct, DirectRegister], 1),
    instruction("not", 5, 2, &[], &[Direct, DirectRegister], 1),
    instruction("inc", 5, 3, &[], &[Direct, DirectRegister], 1),
    instruction("dec", 5, 4, &[], &[Direct, DirectRegister], 1),
    instruction("jmp", 9, 1, &[], &[Direct, Relative], 1),
    instruction("bne", 9, 2, &[], &[Direct, Relative], 1),
    instruction("jsr", 9, 3, &[], &[Direct, Relative], 1),
    instruction("red", 12, 0, &[], &[Direct, DirectRegister], 1),
    instruction("prn", 13, 0, &[], &[Immediate, Direct, DirectRegister], 1),
    instruction("rts", 14, 0, &[], &[], 0),
    instruction("stop", 15, 0, &[], &[], 0),
];

const fn instruction(
    name: &'static str,
    opcode: u32,
    funct: u32,
    source_modes: &'static [AddressingMode],
    destination_modes: &'static [AddressingMode],
    operands: usize,
) -> InstructionSpec {
    InstructionSpec { name, opcode, funct, source_modes, destination_modes, operands }
}

/// The four assembler directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Data,
    String,
    Entry,
    Extern,
}

impl Directive {
    pub fn name(self) -> &'static str {
        match self {
            Directive::Data => ".data",
            Directive::String => ".string",
            Directive::Entry => ".entry",
            Directive::Extern => ".extern",
        }
    }
}

const DIRECTIVES: [Directive; 4] =
    [Directive::Data, Directive::String, Directive::Entry, Directive::Extern];

/// Register names; the index is the register number.
pub const REGISTERS: [&str; 8] = ["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7"];

static LABEL_DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z][A-Za-z0-9]*):").unwrap());

/// A name ends where whitespace or the line does; `movx` is not `mov`.
fn at_name_boundary(cursor: &Cursor, len: usize) -> bool {
    match cursor.rest().as_bytes().get(len) {
        Some(c) => c.is_ascii_whitespace(),
        None => true,
    }
}

/// Recognize an instruction mnemonic under the cursor and step past it.
/// The cursor is left untouched when nothing matches.
pub fn take_instruction_name(cursor: &mut Cursor) -> Option<&'static InstructionSpec> {
    for spec in &INSTRUCTIONS {
        if cursor.rest().starts_with(spec.name) && at_name_boundary(cursor, spec.name.len()) {
            cursor.advance(spec.name.len());
            return Some(spec);
        }
    }
    None
}

/// Recognize a directive name under the cursor and step past it.
pub fn take_directive_name(cursor: &mut Cursor) -> Option<Directive> {
    for directive in DIRECTIVES {
        let name = directive.name();
        if cursor.rest().starts_with(name) && at_name_boundary(cursor, name.len()) {
            cursor.advance(name.len());
            return Some(directive);
        }
    }
    None
}

/// Extract the next operand. `expected_commas` is 0 before the first
/// operand and 1 between operands; any other count found is kind 21.
/// The operand may come back empty at end of line.
pub fn take_operand<'a>(
    cursor: &mut Cursor<'a>,
    expected_commas: usize,
    diag: &mut Diagnostics,
) -> &'a str {
    if cursor.skip_whitespace_and_commas() != expected_commas {
        diag.report(ErrorKind::BadCommaCount, Stage::Expanded);
    }
    cursor.take_until(|c| c.is_ascii_whitespace() || c == b',')
}

/// Pure form of label-declaration recognition: `NAME:` at the start of
/// the line (leading whitespace allowed), at most [MAX_LABEL_LENGTH]
/// characters. Used where the declaration has already been validated and
/// only the name is wanted.
pub fn label_declaration(line: &str) -> Option<&str> {
    let name = LABEL_DECLARATION.captures(line)?.get(1)?.as_str();
    (name.len() <= MAX_LABEL_LENGTH).then_some(name)
}

/// Validate a label declaration in place, reporting every problem it has,
/// and leave the cursor just past the `:`. Callers only invoke this when a
/// `:` is present in the remainder of the line.
pub fn validate_label_declaration(cursor: &mut Cursor, diag: &mut Diagnostics) {
    match cursor.peek() {
        None => diag.report(ErrorKind::MissingLabel, Stage::Expanded),
        Some(c) if !c.is_ascii_alphabetic() => {
            diag.report(ErrorKind::LabelMustStartAlphabetic, Stage::Expanded);
        }
        Some(_) => {}
    }

    let name = {
        let mut probe = cursor.clone();
        probe.take_until(|c| c == b':')
    };
    if name.bytes().any(|c| !c.is_ascii_alphanumeric()) {
        diag.report(ErrorKind::LabelCharset, Stage::Expanded);
    }
    if name.len() > MAX_LABEL_LENGTH {
        diag.report(ErrorKind::LabelTooLong, Stage::Expanded);
    }
    if is_reserved_name(name) {
        diag.report(ErrorKind::LabelNameReserved, Stage::Expanded);
    }

    // past the name and its colon
    cursor.advance(name.len() + 1);
}

/// Parse a label operand (the argument of `.entry`/`.extern`), reporting
/// kinds 33/17/18/19/12 as applicable. A name with a bad character or a
/// reserved name is still returned so the caller can keep going; a missing,
/// misshapen-start or over-long name is not.
pub fn take_label_operand(cursor: &mut Cursor, diag: &mut Diagnostics) -> Option<String> {
    cursor.skip_whitespace();
    let starts_alphabetic = cursor.peek().is_some_and(|c| c.is_ascii_alphabetic());

    let mut charset_reported = false;
    let name = {
        let mut probe = cursor.clone();
        probe.take_until(|c| c.is_ascii_whitespace())
    };
    for c in name.bytes() {
        if !c.is_ascii_alphanumeric() && !charset_reported {
            diag.report(ErrorKind::LabelCharset, Stage::Expanded);
            charset_reported = true;
        }
    }

    if !starts_alphabetic {
        if name.is_empty() {
            diag.report(ErrorKind::MissingLabel, Stage::Expanded);
        } else {
            diag.report(ErrorKind::LabelMustStartAlphabetic, Stage::Expanded);
        }
        cursor.advance(name.len());
        return None;
    }
    if name.len() > MAX_LABEL_LENGTH {
        diag.report(ErrorKind::LabelTooLong, Stage::Expanded);
        cursor.advance(name.len());
        return None;
    }

    let name = name.to_string();
    cursor.advance(name.len());
    if is_reserved_name(&name) {
        diag.report(ErrorKind::LabelNameReserved, Stage::Expanded);
    }
    Some(name)
}

/// Parse the quoted argument of `.string`. Any quote or ASCII problem is
/// reported and the contents are discarded.
pub fn take_string_literal(cursor: &mut Cursor, diag: &mut Diagnostics) -> Option<String> {
    cursor.skip_whitespace();
    let mut broken = false;

    if cursor.peek() == Some(b'"') {
        cursor.advance(1);
    } else {
        diag.report(ErrorKind::StringMissingOpenQuote, Stage::Expanded);
        broken = true;
    }

    let content = {
        let mut probe = cursor.clone();
        probe.take_until(|c| c == b'"')
    };
    if !content.is_ascii() {
        diag.report(ErrorKind::StringNotAscii, Stage::Expanded);
        broken = true;
    }
    if cursor.rest().as_bytes().get(content.len()) != Some(&b'"') {
        diag.report(ErrorKind::StringMissingCloseQuote, Stage::Expanded);
        broken = true;
    }

    // past the contents and the closing quote
    cursor.advance(content.len() + 1);
    (!broken).then(|| content.to_string())
}

pub fn is_register(operand: &str) -> bool {
    REGISTERS.contains(&operand)
}

/// The register sub-field value for an operand; anything that is not
/// `r0`..`r7` (including an absent operand) contributes zero.
pub fn register_number(operand: Option<&str>) -> u32 {
    operand
        .and_then(|op| REGISTERS.iter().position(|name| *name == op))
        .map_or(0, |index| index as u32)
}

fn is_jump_instruction(spec: &InstructionSpec) -> bool {
    matches!(spec.name, "jmp" | "bne" | "jsr")
}

/// Classify an operand's addressing mode, or `None` when it fits no mode.
/// Number validation inside `#N` reports kinds 22/23 as a side effect.
pub fn addressing_mode(
    spec: &InstructionSpec,
    operand: &str,
    diag: &mut Diagnostics,
) -> Option<AddressingMode> {
    if let Some(number) = operand.strip_prefix('#') {
        if lexer::is_valid_number(number, diag) {
            return Some(Immediate);
        }
    }
    if is_register(operand) {
        return Some(DirectRegister);
    }
    if is_jump_instruction(spec) {
        if let Some(label) = operand.strip_prefix('&') {
            if lexer::is_valid_label_syntax(label) {
                return Some(Relative);
            }
        }
    }
    if lexer::is_valid_label_syntax(operand) {
        return Some(Direct);
    }
    None
}

/// Check a classified mode against the instruction table's legal modes for
/// the operand position. An unclassifiable operand is never legal.
pub fn mode_is_legal(
    spec: &InstructionSpec,
    mode: Option<AddressingMode>,
    is_source: bool,
) -> bool {
    let allowed = if is_source { spec.source_modes } else { spec.destination_modes };
    mode.is_some_and(|mode| allowed.contains(&mode))
}

/// Instruction, directive and register names cannot be used as macro or
/// label names. Directives count with their leading dot.
pub fn is_reserved_name(name: &str) -> bool {
    INSTRUCTIONS.iter().any(|spec| spec.name == name)
        || DIRECTIVES.iter().any(|directive| directive.name() == name)
        || is_register(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_names_need_a_boundary() {
        let mut cursor = Cursor::new("mov r1, r2");
        let spec = take_instruction_name(&mut cursor).unwrap();
        assert_eq!(spec.name, "mov");
        assert_eq!(spec.opcode, 0);
        assert_eq!(cursor.rest(), " r1, r2");

        let mut cursor = Cursor::new("movx r1");
        assert!(take_instruction_name(&mut cursor).is_none());
        assert_eq!(cursor.rest(), "movx r1");

        let mut cursor = Cursor::new("stop");
        assert_eq!(take_instruction_name(&mut cursor).unwrap().name, "stop");
    }

    #[test]
    fn directive_names_need_a_boundary() {
        let mut cursor = Cursor::new(".data 5");
        assert_eq!(take_directive_name(&mut cursor), Some(Directive::Data));
        assert_eq!(cursor.rest(), " 5");

        let mut cursor = Cursor::new(".datax 5");
        assert_eq!(take_directive_name(&mut cursor), None);
    }

    #[test]
    fn label_declaration_shape() {
        assert_eq!(label_declaration("LOOP: mov r1, r2"), Some("LOOP"));
        assert_eq!(label_declaration("  x9:"), Some("x9"));
        assert_eq!(label_declaration("9x: stop"), None);
        assert_eq!(label_declaration("stop"), None);

        let max = "A".repeat(31);
        assert_eq!(label_declaration(&format!("{max}: stop")), Some(max.as_str()));
        let over = "A".repeat(32);
        assert_eq!(label_declaration(&format!("{over}: stop")), None);
    }

    #[test]
    fn label_declaration_validation() {
        let mut diag = Diagnostics::new();
        let mut cursor = Cursor::new("L1: mov r1, r2");
        validate_label_declaration(&mut cursor, &mut diag);
        assert!(diag.clean());
        assert_eq!(cursor.rest(), " mov r1, r2");

        let mut cursor = Cursor::new("mov: stop");
        validate_label_declaration(&mut cursor, &mut diag);
        assert_eq!(diag.latest(), Some(ErrorKind::LabelNameReserved));

        let mut diag = Diagnostics::new();
        let mut cursor = Cursor::new("a b: stop");
        validate_label_declaration(&mut cursor, &mut diag);
        assert_eq!(diag.latest(), Some(ErrorKind::LabelCharset));

        let mut diag = Diagnostics::new();
        let mut cursor = Cursor::new("1A: stop");
        validate_label_declaration(&mut cursor, &mut diag);
        assert_eq!(diag.latest(), Some(ErrorKind::LabelMustStartAlphabetic));
    }

    #[test]
    fn label_operand_errors() {
        let mut diag = Diagnostics::new();
        let mut cursor = Cursor::new("  HELLO");
        assert_eq!(take_label_operand(&mut cursor, &mut diag), Some("HELLO".to_string()));
        assert!(diag.clean());

        let mut cursor = Cursor::new("");
        assert_eq!(take_label_operand(&mut cursor, &mut diag), None);
        assert_eq!(diag.latest(), Some(ErrorKind::MissingLabel));

        let mut diag = Diagnostics::new();
        let mut cursor = Cursor::new("9abc");
        assert_eq!(take_label_operand(&mut cursor, &mut diag), None);
        assert_eq!(diag.latest(), Some(ErrorKind::LabelMustStartAlphabetic));

        // a bad character is reported but the name still comes back
        let mut diag = Diagnostics::new();
        let mut cursor = Cursor::new("ab$c");
        assert_eq!(take_label_operand(&mut cursor, &mut diag), Some("ab$c".to_string()));
        assert_eq!(diag.latest(), Some(ErrorKind::LabelCharset));

        let mut diag = Diagnostics::new();
        let long = "B".repeat(32);
        let mut cursor = Cursor::new(&long);
        assert_eq!(take_label_operand(&mut cursor, &mut diag), None);
        assert_eq!(diag.latest(), Some(ErrorKind::LabelTooLong));
    }

    #[test]
    fn string_literals() {
        let mut diag = Diagnostics::new();
        let mut cursor = Cursor::new(" \"AB\"");
        assert_eq!(take_string_literal(&mut cursor, &mut diag), Some("AB".to_string()));
        assert!(diag.clean());
        assert!(cursor.is_at_end());

        let mut diag = Diagnostics::new();
        let mut cursor = Cursor::new("\"AB");
        assert_eq!(take_string_literal(&mut cursor, &mut diag), None);
        assert_eq!(diag.latest(), Some(ErrorKind::StringMissingCloseQuote));

        let mut diag = Diagnostics::new();
        let mut cursor = Cursor::new("AB\"");
        assert_eq!(take_string_literal(&mut cursor, &mut diag), None);
        assert_eq!(diag.latest(), Some(ErrorKind::StringMissingOpenQuote));
    }

    #[test]
    fn operand_extraction_counts_commas() {
        let mut diag = Diagnostics::new();
        let mut cursor = Cursor::new(" r1, r2");
        assert_eq!(take_operand(&mut cursor, 0, &mut diag), "r1");
        assert_eq!(take_operand(&mut cursor, 1, &mut diag), "r2");
        assert!(diag.clean());

        let mut cursor = Cursor::new("r1,,r2");
        assert_eq!(take_operand(&mut cursor, 0, &mut diag), "r1");
        assert_eq!(take_operand(&mut cursor, 1, &mut diag), "r2");
        assert_eq!(diag.latest(), Some(ErrorKind::BadCommaCount));
    }

    #[test]
    fn addressing_mode_classification() {
        let mut diag = Diagnostics::new();
        let mov = &INSTRUCTIONS[0];
        let jmp = &INSTRUCTIONS[9];
        assert_eq!(jmp.name, "jmp");

        assert_eq!(addressing_mode(mov, "#5", &mut diag), Some(Immediate));
        assert_eq!(addressing_mode(mov, "#-12", &mut diag), Some(Immediate));
        assert_eq!(addressing_mode(mov, "r3", &mut diag), Some(DirectRegister));
        assert_eq!(addressing_mode(mov, "LBL", &mut diag), Some(Direct));
        assert_eq!(addressing_mode(jmp, "&LBL", &mut diag), Some(Relative));
        // relative mode exists only for the jump family
        assert_eq!(addressing_mode(mov, "&LBL", &mut diag), None);
        // r9 is not a register, but it is a fine label
        assert_eq!(addressing_mode(mov, "r9", &mut diag), Some(Direct));
        assert_eq!(addressing_mode(mov, "x$y", &mut diag), None);
        assert!(diag.clean());

        assert_eq!(addressing_mode(mov, "#0", &mut diag), None);
        assert_eq!(diag.latest(), Some(ErrorKind::NumberLeadingZero));
    }

    #[test]
    fn mode_legality_follows_the_table() {
        let mov = &INSTRUCTIONS[0];
        let lea = &INSTRUCTIONS[4];
        let jmp = &INSTRUCTIONS[9];
        let prn = &INSTRUCTIONS[13];

        assert!(mode_is_legal(mov, Some(Immediate), true));
        assert!(!mode_is_legal(mov, Some(Immediate), false));
        assert!(!mode_is_legal(lea, Some(Immediate), true));
        assert!(mode_is_legal(lea, Some(Direct), true));
        assert!(mode_is_legal(jmp, Some(Relative), false));
        assert!(!mode_is_legal(jmp, Some(DirectRegister), false));
        assert!(mode_is_legal(prn, Some(Immediate), false));
        assert!(!mode_is_legal(mov, None, true));
    }

    #[test]
    fn reserved_names() {
        assert!(is_reserved_name("mov"));
        assert!(is_reserved_name("stop"));
        assert!(is_reserved_name(".data"));
        assert!(is_reserved_name("r7"));
        assert!(!is_reserved_name("data"));
        assert!(!is_reserved_name("r8"));
        assert!(!is_reserved_name("hello"));
    }

    #[test]
    fn register_numbers() {
        assert_eq!(register_number(Some("r5")), 5);
        assert_eq!(register_number(Some("r9")), 0);
        assert_eq!(register_number(None), 0);
    }
}
