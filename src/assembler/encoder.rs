//! Packing statement fields into 24-bit machine words
//!
//! A first instruction word lays out, MSB first:
//! opcode(6) src_mode(2) src_reg(3) dst_mode(2) dst_reg(3) funct(5) A R E.
//! Additional operand words carry a 21-bit payload over the same three
//! A/R/E flag bits. Negative payloads are two's complement, truncated to
//! the field width.

use super::parser::{AddressingMode, InstructionSpec};

/// Machine word width in bits.
pub const WORD_BITS: u32 = 24;
/// Payload width of an additional operand word.
pub const PAYLOAD_BITS: u32 = 21;
/// Mask selecting the 24 bits of a word.
pub const WORD_MASK: u32 = (1 << WORD_BITS) - 1;

// A/R/E flag bits, word bits 2..0
const ABSOLUTE: u32 = 1 << 2;
const RELOCATABLE: u32 = 1 << 1;
const EXTERNAL: u32 = 1;

/// Truncate a signed value into an unsigned field of `width` bits.
/// Negative values come out as two's complement.
pub fn field(value: i64, width: u32) -> u32 {
    (value as u32) & ((1u32 << width) - 1)
}

/// Build the first word of an instruction. Register sub-fields are zero
/// unless the corresponding mode is direct-register; A is always set.
pub fn first_word(
    spec: &InstructionSpec,
    source_mode: AddressingMode,
    source_register: u32,
    destination_mode: AddressingMode,
    destination_register: u32,
) -> u32 {
    (spec.opcode << 18)
        | ((source_mode as u32) << 16)
        | (source_register << 13)
        | ((destination_mode as u32) << 11)
        | (destination_register << 8)
        | (spec.funct << 3)
        | ABSOLUTE
}

/// The word for a `#N` operand: 21-bit two's complement payload, A=1.
pub fn immediate_word(value: i64) -> u32 {
    (field(value, PAYLOAD_BITS) << 3) | ABSOLUTE
}

/// The word for a resolved direct operand: the label's address as payload,
/// R for internal labels, E (with a zero payload) for external ones.
pub fn direct_word(address: u32, external: bool) -> u32 {
    let flag = if external { EXTERNAL } else { RELOCATABLE };
    (field(address as i64, PAYLOAD_BITS) << 3) | flag
}

/// The word for a resolved `&label` operand: the jumping distance from the
/// instruction's first word, 21-bit two's complement, A=1.
pub fn relative_word(distance: i64) -> u32 {
    (field(distance, PAYLOAD_BITS) << 3) | ABSOLUTE
}

/// A `.data` integer or `.string` character as a full 24-bit word.
pub fn data_word(value: i64) -> u32 {
    field(value, WORD_BITS)
}

/// Render a word as exactly six lowercase hexadecimal digits.
pub fn render_hex(word: u32) -> String {
    format!("{:06x}", word & WORD_MASK)
}
