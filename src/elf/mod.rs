//! ELF (Executable and Linkable Format) data structures and utilities.

mod defs;
mod dynamic;
mod ehdr;
mod ident;
mod phdrs;
mod shdrs;
mod strtab;
mod symbol;
mod version;

// Internal module re-exports for use within the crate
pub(crate) use defs::Parser;
pub(crate) use dynamic::{is_string_tag, parse_dynamic};
pub(crate) use ehdr::TableLayout;
pub(crate) use symbol::RawSymbol;
pub(crate) use version::ElfVersion;

// Public API exports
/// Decoded header records and the width/byte-order tags selecting their layout.
pub use defs::{EI_NIDENT, ElfClass, Endian, ProgFlags, SectionFlags};
pub use dynamic::DynamicEntry;
pub use ehdr::ElfHeader;
pub use ident::ElfIdent;
pub use phdrs::ProgHeader;
pub use shdrs::{CompressionHeader, SectionHeader};
pub use strtab::ElfStringTable;
pub use symbol::{Symbol, SymbolTable};
/// ELF ABI constants and definitions from the elf crate.
pub use elf::abi::*;
