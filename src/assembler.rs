//! Converts assembly source for a 24-bit word machine into loadable
//! object text, in a two-pass manner over a macro-expanded copy of the
//! source
//!
//! For an input stem `prog`, the pipeline reads `prog.as`, writes the
//! macro-expanded `prog.am`, and on a clean run produces `prog.ob`
//! (object words in hexadecimal) plus `prog.ent`/`prog.ext` when the
//! program exports or imports labels.
//!
//! Comments start with a semicolon (`;`) as the first non-blank character
//! of a line and run to its end. A label is declared by writing
//! `name:` in front of a statement; label names start with a letter,
//! continue with letters and digits, and are at most 31 characters long.
//!
//! The machine has eight registers `r0`..`r7` and four operand addressing
//! modes:
//! - immediate: `#N` with a signed decimal number
//! - direct: a label name, resolved in the second pass
//! - relative: `&label`, the jump distance to the label (only for `jmp`,
//!   `bne` and `jsr`)
//! - direct register: `r0`..`r7`
//!
//! The instruction set is `mov`, `cmp`, `add`, `sub`, `lea` (two
//! operands), `clr`, `not`, `inc`, `dec`, `jmp`, `bne`, `jsr`, `red`,
//! `prn` (one operand) and `rts`, `stop` (none). Four directives lay out
//! data and drive linkage:
//! - `.data N, N, ...`: one word per signed decimal number
//! - `.string "text"`: one word per ASCII character plus a null word
//! - `.entry label`: export the label's address
//! - `.extern label`: import a label defined elsewhere
//!
//! Macros are defined with `mcro name` ... `mcroend`, each marker on its
//! own line, and are expanded wherever a line starts with the macro's
//! name:
//!
//! ```ignore
//! mcro NEGATE
//! not r1
//! inc r1
//! mcroend
//!
//! MAIN: mov #-5, r1
//! NEGATE
//! stop
//! ```

pub mod encoder;
pub mod errors;
pub mod first_pass;
pub mod lexer;
pub mod parser;
pub mod preprocessor;
pub mod second_pass;
pub mod tables;

use std::fs;

use errors::{Diagnostics, ErrorKind, Stage};

/// Assemble one source stem end to end. Returns whether the run was clean
/// (and therefore produced output files).
pub fn assemble(stem: &str) -> bool {
    let mut diag = Diagnostics::new();

    preprocessor::expand_file(stem, &mut diag);
    if !diag.clean() {
        return false;
    }

    let expanded = match fs::read_to_string(format!("{stem}.am")) {
        Ok(expanded) => expanded,
        Err(_) => {
            diag.report(ErrorKind::FileAccessFailed, Stage::Internal);
            return false;
        }
    };

    let mut image = first_pass::run(&expanded, &mut diag);
    second_pass::run(&expanded, &mut image, &mut diag, stem);
    diag.clean()
}
