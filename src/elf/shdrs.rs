use super::{
    defs::{ElfClass, Parser, SectionFlags},
    ident::ElfIdent,
};
use crate::{Result, error::parse_shdr_error};

/// A section header entry, normalized to 64-bit fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectionHeader {
    /// Section name, resolved through the section name string table.
    /// Empty when the file has no such table.
    pub name: String,
    /// Section type (`sh_type`).
    pub sh_type: u32,
    /// Section attributes (`sh_flags`).
    pub flags: SectionFlags,
    /// Virtual address of the section in memory.
    pub addr: u64,
    /// File offset of the section contents.
    pub offset: u64,
    /// Logical size of the section. For compressed sections this is the
    /// uncompressed size taken from the compression header.
    pub size: u64,
    /// Size of the section contents in the file.
    pub file_size: u64,
    /// Section index link, interpreted per section type.
    pub link: u32,
    /// Extra information, interpreted per section type.
    pub info: u32,
    /// Alignment of the section. For compressed sections this is the
    /// alignment of the uncompressed data.
    pub addralign: u64,
    /// Size of each entry for sections holding fixed-size records.
    pub entsize: u64,
}

impl SectionHeader {
    /// Decodes one entry.
    ///
    /// # Returns
    /// The offset of the section name in the section name string table, and
    /// the header with `size == file_size` and an empty name.
    pub(crate) fn parse(data: &[u8], base: u64, ident: &ElfIdent) -> Result<(u32, Self)> {
        let mut p = Parser::new(data, base, ident.endian, ident.class);
        let name_offset = p.u32()?;
        let sh_type = p.u32()?;
        let flags = p.word()?;
        let addr = p.word()?;
        let offset = p.word()?;
        let file_size = p.word()?;
        let link = p.u32()?;
        let info = p.u32()?;
        let addralign = p.word()?;
        let entsize = p.word()?;

        if (offset as i64) < 0 {
            return Err(parse_shdr_error("negative section offset"));
        }
        if (file_size as i64) < 0 {
            return Err(parse_shdr_error("negative section size"));
        }
        Ok((
            name_offset,
            SectionHeader {
                name: String::new(),
                sh_type,
                flags: SectionFlags::from_bits_retain(flags),
                addr,
                offset,
                size: file_size,
                file_size,
                link,
                info,
                addralign,
                entsize,
            },
        ))
    }

    /// Whether the section contents are stored compressed.
    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.flags.contains(SectionFlags::COMPRESSED)
    }
}

/// The header prefixed to the contents of an `SHF_COMPRESSED` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionHeader {
    /// Compression format (`ch_type`), e.g. `ELFCOMPRESS_ZLIB`.
    pub ch_type: u32,
    /// Size of the uncompressed data.
    pub size: u64,
    /// Alignment of the uncompressed data.
    pub addralign: u64,
}

impl CompressionHeader {
    pub(crate) fn parse(data: &[u8], base: u64, ident: &ElfIdent) -> Result<Self> {
        let mut p = Parser::new(data, base, ident.endian, ident.class);
        let ch_type = p.u32()?;
        if ident.class == ElfClass::Elf64 {
            // ch_reserved
            p.skip(4)?;
        }
        Ok(CompressionHeader {
            ch_type,
            size: p.word()?,
            addralign: p.word()?,
        })
    }
}
