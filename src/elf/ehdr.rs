//! ELF header parsing and validation
//!
//! This module decodes the fixed-layout file header that follows the
//! identification block. Besides the retained header fields it produces the
//! transient [`TableLayout`] describing where the program and section
//! header tables live, which the table readers consume and then drop.

use super::{
    defs::{ElfClass, Endian, Parser},
    ident::ElfIdent,
};
use crate::{Result, error::parse_ehdr_error, input::ElfReader};
use elf::abi::{ET_DYN, ET_EXEC, ET_REL, SHN_XINDEX};

/// The decoded ELF file header.
///
/// Table offsets, entry sizes and counts are not retained here; after
/// decoding they are represented by the section and program lists of
/// [`ElfObject`](crate::ElfObject).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfHeader {
    ident: ElfIdent,
    e_type: u16,
    e_machine: u16,
    e_entry: u64,
    e_flags: u32,
}

/// Where the header tables are, as read from the file header.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TableLayout {
    pub(crate) phoff: u64,
    pub(crate) phentsize: usize,
    pub(crate) phnum: usize,
    pub(crate) shoff: u64,
    pub(crate) shentsize: usize,
    pub(crate) shnum: usize,
    pub(crate) shstrndx: usize,
}

impl ElfHeader {
    /// Reads the file header at offset 0 using the layout selected by `ident`.
    ///
    /// # Returns
    /// * `Ok((header, layout))` - The retained header and the table layout
    /// * `Err(Error)` - If the header is truncated or inconsistent
    pub(crate) fn read(reader: &dyn ElfReader, ident: ElfIdent) -> Result<(Self, TableLayout)> {
        let mut buf = [0u8; ElfClass::Elf64.ehdr_size()];
        let buf = &mut buf[..ident.class.ehdr_size()];
        reader.read(buf, 0)?;
        Self::parse(buf, ident)
    }

    pub(crate) fn parse(data: &[u8], ident: ElfIdent) -> Result<(Self, TableLayout)> {
        let mut parser = Parser::new(data, 0, ident.endian, ident.class);
        parser.skip(super::defs::EI_NIDENT)?;
        let e_type = parser.u16()?;
        let e_machine = parser.u16()?;
        let e_version = parser.u32()?;
        let e_entry = parser.word()?;
        let e_phoff = parser.word()?;
        let e_shoff = parser.word()?;
        let e_flags = parser.u32()?;
        let _e_ehsize = parser.u16()?;
        let e_phentsize = parser.u16()?;
        let e_phnum = parser.u16()?;
        let e_shentsize = parser.u16()?;
        let e_shnum = parser.u16()?;
        let e_shstrndx = parser.u16()?;

        let header = ElfHeader {
            ident,
            e_type,
            e_machine,
            e_entry,
            e_flags,
        };
        let layout = TableLayout {
            phoff: e_phoff,
            phentsize: e_phentsize as usize,
            phnum: e_phnum as usize,
            shoff: e_shoff,
            shentsize: e_shentsize as usize,
            shnum: e_shnum as usize,
            shstrndx: e_shstrndx as usize,
        };
        header.validate(e_version, &layout)?;
        Ok((header, layout))
    }

    /// Validates the header against the identification block and checks
    /// that the table descriptors are usable.
    ///
    /// The section entry size is checked by the section table reader, once
    /// the extended section count has been resolved.
    fn validate(&self, e_version: u32, layout: &TableLayout) -> Result<()> {
        if e_version != u32::from(self.ident.version) {
            return Err(parse_ehdr_error(format!(
                "header version {e_version} does not match identification version {}",
                self.ident.version
            )));
        }
        if (layout.shoff as i64) < 0 {
            return Err(parse_ehdr_error("negative section header table offset"));
        }
        if (layout.phoff as i64) < 0 {
            return Err(parse_ehdr_error("negative program header table offset"));
        }
        if layout.shoff == 0 && layout.shnum != 0 {
            return Err(parse_ehdr_error(
                "section header table offset is zero but the section count is not",
            ));
        }
        // SHN_XINDEX redirects to section 0 and is checked by the section table reader.
        if layout.shnum > 0
            && layout.shstrndx != SHN_XINDEX as usize
            && layout.shstrndx >= layout.shnum
        {
            return Err(parse_ehdr_error(format!(
                "section name string table index {} out of range for {} sections",
                layout.shstrndx, layout.shnum
            )));
        }
        if layout.phnum > 0 && layout.phentsize < self.class().phdr_size() {
            return Err(parse_ehdr_error(format!(
                "program header entry size {} is smaller than {}",
                layout.phentsize,
                self.class().phdr_size()
            )));
        }
        Ok(())
    }

    /// Gets the identification block.
    #[inline]
    pub fn ident(&self) -> &ElfIdent {
        &self.ident
    }

    /// Gets the width class.
    #[inline]
    pub fn class(&self) -> ElfClass {
        self.ident.class
    }

    /// Gets the byte order.
    #[inline]
    pub fn endian(&self) -> Endian {
        self.ident.endian
    }

    /// Gets the object file type (`e_type`).
    #[inline]
    pub fn e_type(&self) -> u16 {
        self.e_type
    }

    /// Gets the target machine (`e_machine`).
    #[inline]
    pub fn machine(&self) -> u16 {
        self.e_machine
    }

    /// Gets the entry point address, widened to 64 bits.
    #[inline]
    pub fn entry(&self) -> u64 {
        self.e_entry
    }

    /// Gets the processor-specific flags (`e_flags`).
    #[inline]
    pub fn flags(&self) -> u32 {
        self.e_flags
    }

    /// Checks if the ELF file is a relocatable object (`ET_REL`).
    #[inline]
    pub fn is_relocatable(&self) -> bool {
        self.e_type == ET_REL
    }

    /// Checks if the ELF file is a shared object or PIE (`ET_DYN`).
    #[inline]
    pub fn is_dylib(&self) -> bool {
        self.e_type == ET_DYN
    }

    /// Checks if the ELF file is an executable (either `ET_EXEC` or `ET_DYN`).
    #[inline]
    pub fn is_executable(&self) -> bool {
        self.e_type == ET_EXEC || self.e_type == ET_DYN
    }
}
