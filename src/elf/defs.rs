//! ELF format definitions and utilities.
//!
//! This module provides the width-dependent record layouts, the byte-order
//! aware field parser and the flag types shared by the header, section and
//! symbol decoders. The 32-bit and 64-bit layouts are selected once from the
//! identification block through [`ElfClass`]; every decoder dispatches on
//! that tag and normalizes the result into width-independent types.

use crate::{Result, error::truncated_error};
use bitflags::bitflags;
use elf::abi::{ELFCLASS32, ELFCLASS64, ELFDATA2LSB, ELFDATA2MSB};

/// Size of the identification block at the start of every ELF file.
pub const EI_NIDENT: usize = 16;

/// Width class of an ELF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElfClass {
    /// 32-bit objects (`ELFCLASS32`).
    Elf32,
    /// 64-bit objects (`ELFCLASS64`).
    Elf64,
}

impl ElfClass {
    /// Maps the `EI_CLASS` byte onto a width class.
    #[inline]
    pub fn from_ident(class: u8) -> Option<Self> {
        match class {
            ELFCLASS32 => Some(ElfClass::Elf32),
            ELFCLASS64 => Some(ElfClass::Elf64),
            _ => None,
        }
    }

    /// The `EI_CLASS` byte for this width.
    #[inline]
    pub fn to_ident(self) -> u8 {
        match self {
            ElfClass::Elf32 => ELFCLASS32,
            ElfClass::Elf64 => ELFCLASS64,
        }
    }

    /// Size in bytes of an address-sized word.
    #[inline]
    pub const fn word_size(self) -> usize {
        match self {
            ElfClass::Elf32 => 4,
            ElfClass::Elf64 => 8,
        }
    }

    /// Size of the file header, identification included.
    #[inline]
    pub const fn ehdr_size(self) -> usize {
        match self {
            ElfClass::Elf32 => 52,
            ElfClass::Elf64 => 64,
        }
    }

    /// Minimum size of a program header table entry.
    #[inline]
    pub const fn phdr_size(self) -> usize {
        match self {
            ElfClass::Elf32 => 8 * 4,
            ElfClass::Elf64 => 2 * 4 + 6 * 8,
        }
    }

    /// Minimum size of a section header table entry.
    #[inline]
    pub const fn shdr_size(self) -> usize {
        match self {
            ElfClass::Elf32 => 10 * 4,
            ElfClass::Elf64 => 4 * 4 + 6 * 8,
        }
    }

    /// Size of the compression header prefixed to `SHF_COMPRESSED` sections.
    #[inline]
    pub const fn chdr_size(self) -> usize {
        match self {
            ElfClass::Elf32 => 12,
            ElfClass::Elf64 => 24,
        }
    }

    /// Size of a symbol table entry.
    #[inline]
    pub const fn sym_size(self) -> usize {
        match self {
            ElfClass::Elf32 => 16,
            ElfClass::Elf64 => 24,
        }
    }

    /// Size of a dynamic section entry.
    #[inline]
    pub const fn dyn_size(self) -> usize {
        match self {
            ElfClass::Elf32 => 8,
            ElfClass::Elf64 => 16,
        }
    }
}

/// Data encoding of an ELF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    /// Two's complement, little-endian (`ELFDATA2LSB`).
    Little,
    /// Two's complement, big-endian (`ELFDATA2MSB`).
    Big,
}

impl Endian {
    /// Maps the `EI_DATA` byte onto a byte order.
    #[inline]
    pub fn from_ident(data: u8) -> Option<Self> {
        match data {
            ELFDATA2LSB => Some(Endian::Little),
            ELFDATA2MSB => Some(Endian::Big),
            _ => None,
        }
    }

    /// The `EI_DATA` byte for this byte order.
    #[inline]
    pub fn to_ident(self) -> u8 {
        match self {
            Endian::Little => ELFDATA2LSB,
            Endian::Big => ELFDATA2MSB,
        }
    }

    #[inline]
    pub(crate) fn u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            Endian::Little => u16::from_le_bytes(bytes),
            Endian::Big => u16::from_be_bytes(bytes),
        }
    }

    #[inline]
    pub(crate) fn u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        }
    }

    #[inline]
    pub(crate) fn u64(self, bytes: [u8; 8]) -> u64 {
        match self {
            Endian::Little => u64::from_le_bytes(bytes),
            Endian::Big => u64::from_be_bytes(bytes),
        }
    }
}

/// A cursor decoding fixed-layout records in the file's byte order.
///
/// `base` is the file offset of `data[0]` and is only used to report where
/// a truncated read happened.
pub(crate) struct Parser<'data> {
    data: &'data [u8],
    pos: usize,
    base: u64,
    endian: Endian,
    class: ElfClass,
}

impl<'data> Parser<'data> {
    #[inline]
    pub(crate) fn new(data: &'data [u8], base: u64, endian: Endian, class: ElfClass) -> Self {
        Self {
            data,
            pos: 0,
            base,
            endian,
            class,
        }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self
            .pos
            .checked_add(N)
            .and_then(|end| self.data.get(self.pos..end))
            .ok_or_else(|| truncated_error(self.base + self.pos as u64, N))?;
        self.pos += N;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    #[inline]
    pub(crate) fn skip(&mut self, n: usize) -> Result<()> {
        if self.data.len().saturating_sub(self.pos) < n {
            return Err(truncated_error(self.base + self.pos as u64, n));
        }
        self.pos += n;
        Ok(())
    }

    #[inline]
    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    #[inline]
    pub(crate) fn u16(&mut self) -> Result<u16> {
        Ok(self.endian.u16(self.take()?))
    }

    #[inline]
    pub(crate) fn u32(&mut self) -> Result<u32> {
        Ok(self.endian.u32(self.take()?))
    }

    #[inline]
    pub(crate) fn u64(&mut self) -> Result<u64> {
        Ok(self.endian.u64(self.take()?))
    }

    /// Reads an address-sized field (`Elf32_Addr`/`Elf32_Off`/`Elf32_Word`
    /// or their 64-bit counterparts), widened to 64 bits.
    #[inline]
    pub(crate) fn word(&mut self) -> Result<u64> {
        match self.class {
            ElfClass::Elf32 => self.u32().map(u64::from),
            ElfClass::Elf64 => self.u64(),
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    /// Section attribute flags (`sh_flags`).
    ///
    /// Unknown bits, including the OS and processor specific ranges, are
    /// retained as-is.
    pub struct SectionFlags: u64 {
        /// The section contains data writable during execution.
        const WRITE = 0x1;
        /// The section occupies memory during execution.
        const ALLOC = 0x2;
        /// The section contains executable machine instructions.
        const EXECINSTR = 0x4;
        /// The data may be merged to eliminate duplication.
        const MERGE = 0x10;
        /// The section consists of null-terminated strings.
        const STRINGS = 0x20;
        /// `sh_info` holds a section header table index.
        const INFO_LINK = 0x40;
        /// Special ordering requirements for link editors.
        const LINK_ORDER = 0x80;
        /// OS-specific processing is required.
        const OS_NONCONFORMING = 0x100;
        /// The section is a member of a section group.
        const GROUP = 0x200;
        /// The section holds thread-local storage.
        const TLS = 0x400;
        /// The section holds compressed data prefixed by a compression header.
        const COMPRESSED = 0x800;

        const _ = !0;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    /// Segment permission flags (`p_flags`).
    pub struct ProgFlags: u32 {
        /// Execute permission.
        const X = 0x1;
        /// Write permission.
        const W = 0x2;
        /// Read permission.
        const R = 0x4;

        const _ = !0;
    }
}
