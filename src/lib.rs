//! A two-pass assembler for a 24-bit word instruction set, featuring:
//! - macro preprocessor
//! - symbol table with entry/extern attributes
//! - object, entries and externals file output

pub mod assembler;
pub mod logging;
