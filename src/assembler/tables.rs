//! The tables built during pass 1 and consumed during pass 2: code words,
//! data words, symbols, and the entries/externals rows derived from them

use super::errors::{Diagnostics, ErrorKind, Stage};

/// First address of the code image.
pub const INITIAL_IC: u32 = 100;

/// A code-table word. Direct and relative operands cannot be encoded until
/// the symbol table is complete, so pass 1 leaves them pending under the
/// operand's label name and pass 2 swaps the encoded word in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Encoded(u32),
    PendingDirect(String),
    PendingRelative(String),
}

impl Slot {
    /// The machine word for output; a still-pending slot renders as zero
    /// (it can only be reached when emission is already gated off).
    pub fn value(&self) -> u32 {
        match self {
            Slot::Encoded(word) => *word,
            Slot::PendingDirect(_) | Slot::PendingRelative(_) => 0,
        }
    }
}

#[derive(Debug)]
pub struct CodeWord {
    pub address: u32,
    pub slot: Slot,
    /// Line in the expanded file that produced this word, for pass-2
    /// diagnostics.
    pub line: usize,
}

/// The code image; owns the instruction counter.
#[derive(Debug)]
pub struct CodeTable {
    pub words: Vec<CodeWord>,
    counter: u32,
}

impl CodeTable {
    pub fn new() -> CodeTable {
        CodeTable { words: Vec::new(), counter: INITIAL_IC }
    }

    /// Append a word at the current IC and advance it.
    pub fn emit(&mut self, slot: Slot, line: usize) {
        self.words.push(CodeWord { address: self.counter, slot, line });
        self.counter += 1;
    }

    /// The current IC; after pass 1 this is ICF.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// How many code words exist (ICF − 100).
    pub fn word_count(&self) -> u32 {
        self.counter - INITIAL_IC
    }
}

impl Default for CodeTable {
    fn default() -> CodeTable {
        CodeTable::new()
    }
}

#[derive(Debug)]
pub struct DataWord {
    /// Offset from the start of the data image; the final address adds ICF.
    pub offset: u32,
    pub word: u32,
}

/// The data image; owns the data counter.
#[derive(Debug, Default)]
pub struct DataTable {
    pub words: Vec<DataWord>,
    counter: u32,
}

impl DataTable {
    pub fn new() -> DataTable {
        DataTable::default()
    }

    pub fn emit(&mut self, word: u32) {
        self.words.push(DataWord { offset: self.counter, word });
        self.counter += 1;
    }

    /// The current DC; after pass 1 this is DCF.
    pub fn counter(&self) -> u32 {
        self.counter
    }
}

/// Which image a symbol's address points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKind {
    Code,
    Data,
    /// Externs point into neither image.
    None,
}

/// A symbol's linkage attribute. `Entry` and `External` are mutually
/// exclusive; trying to combine them is kind 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryKind {
    Entry,
    External,
    None,
}

#[derive(Debug)]
pub struct Symbol {
    pub name: String,
    pub address: u32,
    pub kind: PrimaryKind,
    pub linkage: SecondaryKind,
}

/// Label definitions in insertion order. Lookup is linear; programs small
/// enough for a 2^21-word image never make that matter, and the entries
/// file depends on the order.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// Define a symbol. Redefinition of a name is kind 11 and leaves the
    /// first definition in place.
    pub fn insert(
        &mut self,
        name: &str,
        address: u32,
        kind: PrimaryKind,
        linkage: SecondaryKind,
        diag: &mut Diagnostics,
    ) {
        if self.get(name).is_some() {
            diag.report(ErrorKind::LabelRedefined, Stage::Expanded);
            return;
        }
        self.symbols.push(Symbol { name: name.to_string(), address, kind, linkage });
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|symbol| symbol.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.symbols.iter_mut().find(|symbol| symbol.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// The pass-1 finale: data symbols move from data offsets to final
    /// addresses above the code image.
    pub fn relocate_data(&mut self, icf: u32) {
        for symbol in &mut self.symbols {
            if symbol.kind == PrimaryKind::Data {
                symbol.address += icf;
            }
        }
    }
}

/// One row of the entries or externals file: a label and an address
/// (definition address for entries, reference-site address for externals).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRow {
    pub name: String,
    pub address: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_addresses_start_at_100() {
        let mut code = CodeTable::new();
        code.emit(Slot::Encoded(0x00_1B04), 1);
        code.emit(Slot::PendingDirect("LBL".to_string()), 1);
        assert_eq!(code.words[0].address, 100);
        assert_eq!(code.words[1].address, 101);
        assert_eq!(code.counter(), 102);
        assert_eq!(code.word_count(), 2);
    }

    #[test]
    fn pending_slots_render_as_zero() {
        assert_eq!(Slot::Encoded(0x32).value(), 0x32);
        assert_eq!(Slot::PendingDirect("X".to_string()).value(), 0);
        assert_eq!(Slot::PendingRelative("X".to_string()).value(), 0);
    }

    #[test]
    fn duplicate_symbols_are_kind_11() {
        let mut diag = Diagnostics::new();
        let mut symbols = SymbolTable::new();
        symbols.insert("A", 100, PrimaryKind::Code, SecondaryKind::None, &mut diag);
        assert!(diag.clean());
        symbols.insert("A", 0, PrimaryKind::Data, SecondaryKind::None, &mut diag);
        assert_eq!(diag.latest(), Some(ErrorKind::LabelRedefined));
        // the first definition survives
        assert_eq!(symbols.get("A").unwrap().address, 100);
        assert_eq!(symbols.get("A").unwrap().kind, PrimaryKind::Code);
    }

    #[test]
    fn relocation_shifts_only_data_symbols() {
        let mut diag = Diagnostics::new();
        let mut symbols = SymbolTable::new();
        symbols.insert("CODE", 100, PrimaryKind::Code, SecondaryKind::None, &mut diag);
        symbols.insert("DATA", 3, PrimaryKind::Data, SecondaryKind::None, &mut diag);
        symbols.insert("EXT", 0, PrimaryKind::None, SecondaryKind::External, &mut diag);
        symbols.relocate_data(107);
        assert_eq!(symbols.get("CODE").unwrap().address, 100);
        assert_eq!(symbols.get("DATA").unwrap().address, 110);
        assert_eq!(symbols.get("EXT").unwrap().address, 0);
    }
}
