use super::{
    defs::{ElfClass, Parser, ProgFlags},
    ident::ElfIdent,
};
use crate::{Result, error::parse_phdr_error};

/// A program header entry, normalized to 64-bit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgHeader {
    /// Segment type (`p_type`).
    pub p_type: u32,
    /// Segment permissions (`p_flags`).
    pub flags: ProgFlags,
    /// File offset of the segment contents.
    pub offset: u64,
    /// Virtual address of the segment in memory.
    pub vaddr: u64,
    /// Physical address, where relevant.
    pub paddr: u64,
    /// Number of bytes in the file image.
    pub filesz: u64,
    /// Number of bytes in the memory image.
    pub memsz: u64,
    /// Alignment of the segment.
    pub align: u64,
}

impl ProgHeader {
    /// Decodes one entry. The 64-bit layout moves `p_flags` right after
    /// `p_type` so the following words stay naturally aligned.
    pub(crate) fn parse(data: &[u8], base: u64, ident: &ElfIdent) -> Result<Self> {
        let mut p = Parser::new(data, base, ident.endian, ident.class);
        let phdr = match ident.class {
            ElfClass::Elf32 => {
                let p_type = p.u32()?;
                let offset = p.word()?;
                let vaddr = p.word()?;
                let paddr = p.word()?;
                let filesz = p.word()?;
                let memsz = p.word()?;
                let flags = p.u32()?;
                let align = p.word()?;
                ProgHeader {
                    p_type,
                    flags: ProgFlags::from_bits_retain(flags),
                    offset,
                    vaddr,
                    paddr,
                    filesz,
                    memsz,
                    align,
                }
            }
            ElfClass::Elf64 => {
                let p_type = p.u32()?;
                let flags = p.u32()?;
                ProgHeader {
                    p_type,
                    flags: ProgFlags::from_bits_retain(flags),
                    offset: p.word()?,
                    vaddr: p.word()?,
                    paddr: p.word()?,
                    filesz: p.word()?,
                    memsz: p.word()?,
                    align: p.word()?,
                }
            }
        };
        phdr.validate()?;
        Ok(phdr)
    }

    fn validate(&self) -> Result<()> {
        if (self.offset as i64) < 0 {
            return Err(parse_phdr_error("negative segment offset"));
        }
        if (self.filesz as i64) < 0 {
            return Err(parse_phdr_error("negative segment file size"));
        }
        if self.offset.checked_add(self.filesz).is_none() {
            return Err(parse_phdr_error("segment file range overflows"));
        }
        Ok(())
    }
}
