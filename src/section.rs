//! Section headers and section contents
//!
//! The section header table is decoded in two phases. The first phase
//! decodes every entry, applying the extended section count and extended
//! string table index conventions stored in section 0 and reading the
//! compression header of compressed sections. The second phase resolves
//! the names of all sections against the section name string table. Only
//! the fully resolved list is handed out.

use crate::{
    Result,
    elf::{
        CompressionHeader, ElfIdent, ElfStringTable, SectionFlags, SectionHeader, TableLayout,
    },
    error::{
        decompress_error, extended_index_error, parse_ehdr_error, parse_shdr_error,
        truncated_error,
    },
    input::ElfReader,
    reader::{RangeView, SectionReader, ZeroReader},
};
use delegate::delegate;
use elf::abi::{
    ELFCOMPRESS_ZLIB, SHN_LORESERVE, SHN_UNDEF, SHN_XINDEX, SHT_NOBITS, SHT_NULL, SHT_STRTAB,
};
use std::io::Read;

/// Upper bound on speculative allocations driven by header counts and sizes.
const MAX_PREALLOC: usize = 1 << 16;

/// A section header together with a view over its on-disk bytes.
#[derive(Debug, Clone)]
pub struct Section<'src> {
    header: SectionHeader,
    compression: Option<CompressionHeader>,
    payload_offset: u64,
    view: RangeView<'src>,
}

impl<'src> Section<'src> {
    /// Gets the decoded section header.
    #[inline]
    pub fn header(&self) -> &SectionHeader {
        &self.header
    }

    /// Gets the section name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.header.name
    }

    delegate! {
        to self.header {
            /// Gets the section type (`sh_type`).
            #[field]
            pub fn sh_type(&self) -> u32;
            /// Gets the section flags.
            #[field]
            pub fn flags(&self) -> SectionFlags;
            #[field]
            pub fn addr(&self) -> u64;
            /// Gets the file offset of the section.
            #[field]
            pub fn offset(&self) -> u64;
            /// Gets the logical (uncompressed) size of the section.
            #[field]
            pub fn size(&self) -> u64;
            /// Gets the size of the section in the file.
            #[field]
            pub fn file_size(&self) -> u64;
            #[field]
            pub fn link(&self) -> u32;
            #[field]
            pub fn info(&self) -> u32;
            #[field]
            pub fn addralign(&self) -> u64;
            #[field]
            pub fn entsize(&self) -> u64;
            /// Whether the section contents are stored compressed.
            pub fn is_compressed(&self) -> bool;
        }
    }

    /// Gets the compression header of a compressed section.
    #[inline]
    pub fn compression(&self) -> Option<&CompressionHeader> {
        self.compression.as_ref()
    }

    /// Reads section bytes starting `offset` bytes into the section.
    ///
    /// `SHT_NOBITS` sections read as zeros up to their declared size.
    /// Compressed sections cannot be read at random offsets; use
    /// [`Self::open`] instead.
    ///
    /// # Returns
    /// The number of bytes read. It is smaller than `buf.len()` only when
    /// the read reaches the end of the section.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        if self.compression.is_some() {
            return Err(decompress_error(format!(
                "section {} is compressed and cannot be read at an offset",
                self.name()
            )));
        }
        if self.header.sh_type == SHT_NOBITS {
            let n = (buf.len() as u64).min(self.header.size.saturating_sub(offset)) as usize;
            buf[..n].fill(0);
            return Ok(n);
        }
        self.view.read_at(buf, offset)
    }

    /// Opens a sequential reader over the logical section contents.
    ///
    /// Every call returns an independent reader positioned at the start; a
    /// decompressing reader sets up its own stream on first read.
    ///
    /// # Returns
    /// * `Ok(reader)` - A reader over the uncompressed contents
    /// * `Err(Error::Decompress)` - If the compression format is not supported
    pub fn open(&self) -> Result<SectionReader<'src>> {
        if self.header.sh_type == SHT_NOBITS {
            return Ok(SectionReader::Zero(ZeroReader::new(self.header.size)));
        }
        let Some(chdr) = &self.compression else {
            return Ok(SectionReader::Raw(self.view.reader()));
        };
        if chdr.ch_type != ELFCOMPRESS_ZLIB as u32 {
            return Err(decompress_error(format!(
                "unsupported compression type {} in section {}",
                chdr.ch_type,
                self.name()
            )));
        }
        zlib_reader(self.view.slice_from(self.payload_offset), self.header.size)
    }

    /// Reads the whole logical contents of the section into a buffer.
    ///
    /// Fails when fewer bytes than the logical size can be produced: with
    /// [`Error::Decompress`](crate::Error::Decompress) for compressed
    /// sections and [`Error::Truncated`](crate::Error::Truncated) otherwise.
    pub fn data(&self) -> Result<Vec<u8>> {
        let size = self.header.size;
        let capacity = usize::try_from(size).map_or(MAX_PREALLOC, |size| size.min(MAX_PREALLOC));
        let mut data = Vec::with_capacity(capacity);
        self.open()?.take(size).read_to_end(&mut data)?;
        if (data.len() as u64) < size {
            if self.compression.is_some() {
                return Err(decompress_error(format!(
                    "section {} decompressed to {} bytes, expected {size}",
                    self.name(),
                    data.len()
                )));
            }
            return Err(truncated_error(
                self.header.offset + data.len() as u64,
                (size - data.len() as u64) as usize,
            ));
        }
        Ok(data)
    }
}

#[cfg(feature = "compression")]
#[inline]
fn zlib_reader(payload: RangeView<'_>, size: u64) -> Result<SectionReader<'_>> {
    Ok(SectionReader::Zlib(crate::reader::DecompressReader::new(payload, size)))
}

#[cfg(not(feature = "compression"))]
fn zlib_reader(_payload: RangeView<'_>, _size: u64) -> Result<SectionReader<'_>> {
    Err(decompress_error(
        "zlib decompression is disabled, enable the `compression` feature",
    ))
}

/// Fields of section 0 that carry the extended conventions.
struct InitialSection {
    sh_type: u32,
    size: u64,
    link: u32,
}

fn read_initial_section(
    src: &dyn ElfReader,
    ident: &ElfIdent,
    shoff: u64,
) -> Result<InitialSection> {
    let mut buf = [0u8; 64];
    let buf = &mut buf[..ident.class.shdr_size()];
    src.read(buf, shoff)?;
    let (_, shdr) = SectionHeader::parse(buf, shoff, ident)?;
    Ok(InitialSection {
        sh_type: shdr.sh_type,
        size: shdr.file_size,
        link: shdr.link,
    })
}

/// Resolves the real section count and section name string table index.
fn resolve_extended(
    src: &dyn ElfReader,
    ident: &ElfIdent,
    layout: &TableLayout,
) -> Result<(usize, usize)> {
    let mut shnum = layout.shnum;
    let mut shstrndx = layout.shstrndx;
    let extended_count = layout.shoff > 0 && shnum == 0;
    let extended_index = shstrndx == SHN_XINDEX as usize;
    if !extended_count && !extended_index {
        return Ok((shnum, shstrndx));
    }
    if layout.shoff == 0 {
        // No table at all, there is nothing to redirect to.
        return Ok((0, shstrndx));
    }

    let initial = read_initial_section(src, ident, layout.shoff)?;
    if extended_count {
        if initial.sh_type != SHT_NULL {
            return Err(extended_index_error(format!(
                "initial section has type {} but holds the section count",
                initial.sh_type
            )));
        }
        shnum = usize::try_from(initial.size)
            .ok()
            .filter(|&count| count >= SHN_LORESERVE as usize)
            .ok_or_else(|| {
                extended_index_error(format!(
                    "invalid section count {} stored in the initial section",
                    initial.size
                ))
            })?;
        #[cfg(feature = "log")]
        log::debug!("[{}] extended section count {}", src.shortname(), shnum);
    }
    if extended_index {
        shstrndx = initial.link as usize;
        if shstrndx < SHN_LORESERVE as usize || shstrndx >= shnum {
            return Err(extended_index_error(format!(
                "invalid section name string table index {shstrndx} stored in the initial section"
            )));
        }
        #[cfg(feature = "log")]
        log::debug!("[{}] extended string table index {}", src.shortname(), shstrndx);
    }
    Ok((shnum, shstrndx))
}

fn read_section<'src>(
    src: &'src dyn ElfReader,
    ident: &ElfIdent,
    buf: &mut [u8],
    offset: u64,
) -> Result<(u32, Section<'src>)> {
    src.read(buf, offset)?;
    let (name_offset, mut header) = SectionHeader::parse(buf, offset, ident)?;
    let mut compression = None;
    let mut payload_offset = 0;
    if header.is_compressed() && header.sh_type != SHT_NOBITS {
        let chdr_size = ident.class.chdr_size();
        if header.file_size < chdr_size as u64 {
            return Err(parse_shdr_error(format!(
                "compressed section of {} bytes cannot hold its compression header",
                header.file_size
            )));
        }
        let mut chdr = [0u8; 24];
        let chdr = &mut chdr[..chdr_size];
        src.read(chdr, header.offset)?;
        let chdr = CompressionHeader::parse(chdr, header.offset, ident)?;
        header.size = chdr.size;
        header.addralign = chdr.addralign;
        payload_offset = chdr_size as u64;
        compression = Some(chdr);
    }
    let view = RangeView::new(src, header.offset, header.file_size);
    Ok((
        name_offset,
        Section {
            header,
            compression,
            payload_offset,
            view,
        },
    ))
}

/// Reads the section header table described by `layout` and resolves the
/// section names.
pub(crate) fn read_sections<'src>(
    src: &'src dyn ElfReader,
    ident: &ElfIdent,
    layout: &TableLayout,
) -> Result<Vec<Section<'src>>> {
    let (shnum, shstrndx) = resolve_extended(src, ident, layout)?;
    let entry_size = ident.class.shdr_size();
    if shnum > 0 && layout.shentsize < entry_size {
        return Err(parse_ehdr_error(format!(
            "section header entry size {} is smaller than {entry_size}",
            layout.shentsize
        )));
    }

    // Phase 1: decode every entry.
    let mut buf = [0u8; 64];
    let buf = &mut buf[..entry_size];
    let mut sections = Vec::with_capacity(shnum.min(MAX_PREALLOC));
    let mut name_offsets = Vec::with_capacity(shnum.min(MAX_PREALLOC));
    for idx in 0..shnum {
        let offset = (idx as u64)
            .checked_mul(layout.shentsize as u64)
            .and_then(|rel| layout.shoff.checked_add(rel))
            .ok_or_else(|| parse_ehdr_error("section header table offset overflows"))?;
        let (name_offset, section) = read_section(src, ident, buf, offset)?;
        #[cfg(feature = "log")]
        if section.compression.is_some() {
            log::trace!("[{}] section {} is compressed", src.shortname(), idx);
        }
        name_offsets.push(name_offset);
        sections.push(section);
    }
    #[cfg(feature = "log")]
    log::debug!("[{}] {} section headers", src.shortname(), sections.len());

    // Phase 2: resolve names.
    if sections.is_empty() || shstrndx == SHN_UNDEF as usize {
        return Ok(sections);
    }
    let shstrtab = sections.get(shstrndx).ok_or_else(|| {
        parse_ehdr_error(format!(
            "section name string table index {shstrndx} out of range for {shnum} sections"
        ))
    })?;
    if shstrtab.sh_type() != SHT_STRTAB {
        return Err(parse_shdr_error(format!(
            "section name string table {shstrndx} has type {}",
            shstrtab.sh_type()
        )));
    }
    let names = shstrtab.data()?;
    let strtab = ElfStringTable::new(&names);
    for (section, name_offset) in sections.iter_mut().zip(name_offsets) {
        section.header.name = strtab.get_str(name_offset as usize)?.into_owned();
    }
    Ok(sections)
}
