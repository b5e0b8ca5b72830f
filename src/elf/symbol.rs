//! ELF symbol table entries
//!
//! This module provides the decoded symbol record and the table holding
//! them. Tables keep every entry in file order, the null symbol at index 0
//! included, so relocation entries can address symbols by their index.

use super::{
    defs::{ElfClass, Parser},
    ident::ElfIdent,
};
use crate::Result;
use elf::abi::SHN_UNDEF;

/// A symbol from an ELF symbol table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Symbol {
    /// The symbol name; empty for unnamed entries.
    pub name: String,
    /// Binding and type (`st_info`).
    pub info: u8,
    /// Visibility (`st_other`).
    pub other: u8,
    /// Index of the section defining the symbol (`st_shndx`).
    pub section: u16,
    /// The symbol value, widened to 64 bits.
    pub value: u64,
    /// The symbol size, widened to 64 bits.
    pub size: u64,
    /// Version name. Only filled for dynamic symbols with version information.
    pub version: String,
    /// Library the versioned symbol is expected from. Only filled for
    /// undefined dynamic symbols listed in the version needs.
    pub library: String,
}

impl Symbol {
    /// Returns the symbol binding.
    #[inline]
    pub fn bind(&self) -> u8 {
        self.info >> 4
    }

    /// Returns the symbol type.
    #[inline]
    pub fn sym_type(&self) -> u8 {
        self.info & 0xf
    }

    /// Returns the symbol visibility.
    #[inline]
    pub fn visibility(&self) -> u8 {
        self.other & 0x3
    }

    /// Returns true if the symbol is undefined (not defined in this object file).
    #[inline]
    pub fn is_undef(&self) -> bool {
        self.section == SHN_UNDEF as u16
    }
}

/// A symbol entry as stored in the file, before name resolution.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawSymbol {
    pub(crate) name_offset: u32,
    pub(crate) info: u8,
    pub(crate) other: u8,
    pub(crate) shndx: u16,
    pub(crate) value: u64,
    pub(crate) size: u64,
}

impl RawSymbol {
    pub(crate) fn parse(p: &mut Parser<'_>, ident: &ElfIdent) -> Result<Self> {
        let name_offset = p.u32()?;
        match ident.class {
            ElfClass::Elf32 => {
                let value = p.word()?;
                let size = p.word()?;
                Ok(RawSymbol {
                    name_offset,
                    value,
                    size,
                    info: p.u8()?,
                    other: p.u8()?,
                    shndx: p.u16()?,
                })
            }
            ElfClass::Elf64 => Ok(RawSymbol {
                name_offset,
                info: p.u8()?,
                other: p.u8()?,
                shndx: p.u16()?,
                value: p.word()?,
                size: p.word()?,
            }),
        }
    }
}

/// Symbol table of an ELF file.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    #[inline]
    pub(crate) fn new(symbols: Vec<Symbol>) -> Self {
        Self { symbols }
    }

    /// Get the number of entries, the null symbol included.
    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Get a symbol by its index in the table.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&Symbol> {
        self.symbols.get(idx)
    }

    /// Iterates over all entries in table order.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, Symbol> {
        self.symbols.iter()
    }

    /// Iterates over the entries that have a name, as listings show them.
    pub fn named(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|sym| !sym.name.is_empty())
    }

    /// Looks up the first symbol called `name`.
    pub fn lookup_by_name(&self, name: impl AsRef<str>) -> Option<&Symbol> {
        let name = name.as_ref();
        self.symbols.iter().find(|sym| sym.name == name)
    }

    /// Returns the entries as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Symbol] {
        &self.symbols
    }

    #[inline]
    pub fn into_vec(self) -> Vec<Symbol> {
        self.symbols
    }
}

impl<'a> IntoIterator for &'a SymbolTable {
    type Item = &'a Symbol;
    type IntoIter = core::slice::Iter<'a, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.symbols.iter()
    }
}
