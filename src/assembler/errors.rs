//! The closed set of numbered diagnostics and the per-file sink that
//! tracks them
//!
//! Every diagnostic the assembler can produce is one of the [ErrorKind]
//! variants below; the discriminant is the number printed to the user.
//! Output-file emission is gated on the sink never having recorded a kind,
//! so "report and keep scanning" is the default everywhere: only I/O
//! failures make a caller return early.

use crate::logging;

/// Which file (or neither) the diagnostic points into.
///
/// Preprocessing scans the original source, so its diagnostics blame the
/// `.as` file; both passes run over the macro-expanded `.am` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The original `.as` source file
    Source,
    /// The macro-expanded `.am` file
    Expanded,
    /// Not tied to a file position (I/O, capacity)
    Internal,
}

/// Everything that can go wrong while assembling one file.
///
/// The discriminant is the user-visible error number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AllocationFailed = 1,
    FileAccessFailed = 2,
    ObjectTooLarge = 3,
    LineTooLong = 4,
    MacroNameReserved = 5,
    MacroNameTaken = 6,
    MacroExtraChars = 7,
    ExternalInRelative = 8,
    LabelBeforeEntryExtern = 9,
    EntryConflictsExternal = 10,
    LabelRedefined = 11,
    LabelNameReserved = 12,
    LabelNameIsMacro = 13,
    UnknownDirective = 14,
    UnknownInstruction = 15,
    BadOperandCount = 16,
    LabelMustStartAlphabetic = 17,
    LabelCharset = 18,
    LabelTooLong = 19,
    StrayCharsBeforeStatement = 20,
    BadCommaCount = 21,
    NumberLeadingZero = 22,
    NumberBadDigit = 23,
    StringMissingOpenQuote = 24,
    StringNotAscii = 25,
    StringMissingCloseQuote = 26,
    TrailingChars = 27,
    BadSourceMode = 28,
    BadDestinationMode = 29,
    MissingSourceOperand = 30,
    MissingDestinationOperand = 31,
    EmptyData = 32,
    MissingLabel = 33,
    MissingInstruction = 34,
    MacroNameNotAscii = 35,
    EntryLabelUndefined = 36,
    LabelNeverDeclared = 37,
    /// Dormant: a source operand shaped like `r9` is a label use, not a
    /// register; never reported and never gates output.
    SourceLooksLikeRegister = 38,
    /// Dormant counterpart of [ErrorKind::SourceLooksLikeRegister] for the
    /// destination position.
    DestinationLooksLikeRegister = 39,
    MacroEndExtraChars = 40,
}

impl ErrorKind {
    /// The number printed in the `Error [<n>]` tag.
    pub fn number(self) -> i32 {
        self as i32
    }

    /// The user-facing message for this kind.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::AllocationFailed => "Memory allocation failed",
            ErrorKind::FileAccessFailed => "File opening failed",
            ErrorKind::ObjectTooLarge => {
                "The number of words in the object file exceeds the maximum allowed"
            }
            ErrorKind::LineTooLong => "Line is too long",
            ErrorKind::MacroNameReserved => {
                "Macro name is invalid (equal to instruction/directive/register name)"
            }
            ErrorKind::MacroNameTaken => "Macro name is invalid (equal to an existing macro name)",
            ErrorKind::MacroExtraChars => "Macro definition contains extra characters",
            ErrorKind::ExternalInRelative => {
                "Label address cannot be external in relative addressing mode"
            }
            ErrorKind::LabelBeforeEntryExtern => "Label before entry/extern directive",
            ErrorKind::EntryConflictsExternal => {
                "Label cannot be defined as both entry and external"
            }
            ErrorKind::LabelRedefined => "Label cannot be defined more than once",
            ErrorKind::LabelNameReserved => {
                "Label name is invalid (equal to instruction/directive/register name)"
            }
            ErrorKind::LabelNameIsMacro => "Label name is invalid (equal to macro name)",
            ErrorKind::UnknownDirective => "Invalid directive name",
            ErrorKind::UnknownInstruction => "Invalid instruction name",
            ErrorKind::BadOperandCount => "Invalid number of instruction arguments",
            ErrorKind::LabelMustStartAlphabetic => {
                "Label name must start with an alphabetic symbol"
            }
            ErrorKind::LabelCharset => {
                "Label name must contain only alphabetic symbols and digits"
            }
            ErrorKind::LabelTooLong => "Label name exceeds maximum length",
            ErrorKind::StrayCharsBeforeStatement => {
                "Invalid character before directive/instruction sentence"
            }
            ErrorKind::BadCommaCount => "Invalid number of commas between parameters/names",
            ErrorKind::NumberLeadingZero => "Number cannot start with 0",
            ErrorKind::NumberBadDigit => "Number contains an illegal character",
            ErrorKind::StringMissingOpenQuote => {
                "A valid directive string must start with a \" char"
            }
            ErrorKind::StringNotAscii => {
                "A valid directive string must contain only ASCII characters"
            }
            ErrorKind::StringMissingCloseQuote => {
                "A valid directive string must end with a \" char"
            }
            ErrorKind::TrailingChars => "Unexpected characters after valid input",
            ErrorKind::BadSourceMode => "Invalid source operand type",
            ErrorKind::BadDestinationMode => "Invalid destination operand type",
            ErrorKind::MissingSourceOperand => "Missing source operand",
            ErrorKind::MissingDestinationOperand => "Missing destination operand",
            ErrorKind::EmptyData => ".data directive must contain at least one number",
            ErrorKind::MissingLabel => "Missing label",
            ErrorKind::MissingInstruction => "Missing instruction name",
            ErrorKind::MacroNameNotAscii => "Macro name must contain only ASCII characters",
            ErrorKind::EntryLabelUndefined => "Label not found in label table",
            ErrorKind::LabelNeverDeclared => "Label was never declared",
            ErrorKind::SourceLooksLikeRegister => {
                "Source operand is referenced to as a label (and not as a register)"
            }
            ErrorKind::DestinationLooksLikeRegister => {
                "Destination operand is referenced to as a label (and not as a register)"
            }
            ErrorKind::MacroEndExtraChars => "Macro ending contains extra characters",
        }
    }
}

/// Per-file diagnostic sink.
///
/// Holds the current line number of whichever file is being scanned and the
/// latest reported kind. A fresh sink is constructed for every input stem,
/// which is what resets the error state between files.
#[derive(Debug, Default)]
pub struct Diagnostics {
    line: usize,
    latest: Option<ErrorKind>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    /// Record `kind` and print its message, located in the file named by
    /// `stage` at the current line.
    pub fn report(&mut self, kind: ErrorKind, stage: Stage) {
        self.latest = Some(kind);
        let location = match stage {
            Stage::Source => Some((self.line, "as")),
            Stage::Expanded => Some((self.line, "am")),
            Stage::Internal => None,
        };
        logging::diagnostic(kind.number(), location, kind.message());
    }

    /// True while no kind has been recorded; gates output emission.
    pub fn clean(&self) -> bool {
        self.latest.is_none()
    }

    /// The most recently recorded kind, if any.
    pub fn latest(&self) -> Option<ErrorKind> {
        self.latest
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn set_line(&mut self, line: usize) {
        self.line = line;
    }

    /// Line numbers restart from zero between phases.
    pub fn reset_line(&mut self) {
        self.line = 0;
    }
}
