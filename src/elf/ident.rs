//! ELF identification block
//!
//! The first [`EI_NIDENT`] bytes of every ELF file describe how the rest of
//! the file has to be decoded: its width class and byte order.

use super::defs::{EI_NIDENT, ElfClass, Endian};
use crate::{Result, error::parse_ident_error, input::ElfReader};
use elf::abi::{EI_ABIVERSION, EI_CLASS, EI_DATA, EI_OSABI, EI_VERSION, ELFMAGIC, EV_CURRENT};

/// The decoded identification block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfIdent {
    /// Width class (`EI_CLASS`).
    pub class: ElfClass,
    /// Data encoding (`EI_DATA`).
    pub endian: Endian,
    /// Format version (`EI_VERSION`), always `EV_CURRENT`.
    pub version: u8,
    /// OS/ABI tag (`EI_OSABI`), kept as an opaque value.
    pub os_abi: u8,
    /// ABI version (`EI_ABIVERSION`), kept as an opaque value.
    pub abi_version: u8,
}

impl ElfIdent {
    /// Reads and validates the identification block at offset 0.
    pub(crate) fn read(reader: &dyn ElfReader) -> Result<Self> {
        let mut ident = [0u8; EI_NIDENT];
        reader.read(&mut ident, 0)?;
        Self::parse(&ident)
    }

    /// Validates the magic, class, data encoding and version bytes.
    ///
    /// OS/ABI and ABI version are accepted whatever their value.
    pub fn parse(ident: &[u8; EI_NIDENT]) -> Result<Self> {
        if ident[0..4] != ELFMAGIC {
            return Err(parse_ident_error("invalid ELF magic"));
        }
        let class = ElfClass::from_ident(ident[EI_CLASS])
            .ok_or_else(|| parse_ident_error(format!("unknown ELF class {}", ident[EI_CLASS])))?;
        let endian = Endian::from_ident(ident[EI_DATA]).ok_or_else(|| {
            parse_ident_error(format!("unknown ELF data encoding {}", ident[EI_DATA]))
        })?;
        let version = ident[EI_VERSION];
        if version != EV_CURRENT {
            return Err(parse_ident_error(format!("unknown ELF version {version}")));
        }
        Ok(Self {
            class,
            endian,
            version,
            os_abi: ident[EI_OSABI],
            abi_version: ident[EI_ABIVERSION],
        })
    }
}
