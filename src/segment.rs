//! Program headers and the segments they describe
//!
//! A [`Prog`] pairs a decoded program header with a view over the segment's
//! file image, `[offset, offset + filesz)`. The view is bound when the
//! table is decoded but nothing is read from it until a caller asks for the
//! segment contents.

use crate::{
    Result,
    elf::{ElfIdent, ProgFlags, ProgHeader, TableLayout},
    error::parse_ehdr_error,
    input::ElfReader,
    reader::{RangeReader, RangeView},
};
use delegate::delegate;

/// A program header together with a view over its file image.
#[derive(Debug, Clone)]
pub struct Prog<'src> {
    header: ProgHeader,
    view: RangeView<'src>,
}

impl<'src> Prog<'src> {
    /// Gets the decoded program header.
    #[inline]
    pub fn header(&self) -> &ProgHeader {
        &self.header
    }

    delegate! {
        to self.header {
            /// Gets the segment type (`p_type`).
            #[field]
            pub fn p_type(&self) -> u32;
            /// Gets the segment permissions.
            #[field]
            pub fn flags(&self) -> ProgFlags;
            /// Gets the file offset of the segment.
            #[field]
            pub fn offset(&self) -> u64;
            /// Gets the virtual address of the segment.
            #[field]
            pub fn vaddr(&self) -> u64;
            #[field]
            pub fn paddr(&self) -> u64;
            /// Gets the size of the file image.
            #[field]
            pub fn filesz(&self) -> u64;
            /// Gets the size of the memory image.
            #[field]
            pub fn memsz(&self) -> u64;
            #[field]
            pub fn align(&self) -> u64;
        }
    }

    /// Reads segment bytes starting `offset` bytes into the file image.
    ///
    /// # Returns
    /// The number of bytes read. It is smaller than `buf.len()` only when
    /// the read reaches the end of the file image.
    #[inline]
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        self.view.read_at(buf, offset)
    }

    /// Opens a sequential reader over the file image.
    ///
    /// Every call returns an independent reader positioned at the start.
    #[inline]
    pub fn open(&self) -> RangeReader<'src> {
        self.view.reader()
    }
}

/// Reads the program header table described by `layout`.
pub(crate) fn read_progs<'src>(
    src: &'src dyn ElfReader,
    ident: &ElfIdent,
    layout: &TableLayout,
) -> Result<Vec<Prog<'src>>> {
    let entry_size = ident.class.phdr_size();
    let mut buf = [0u8; 56];
    let buf = &mut buf[..entry_size];
    let mut progs = Vec::with_capacity(layout.phnum);
    for idx in 0..layout.phnum {
        let offset = (idx as u64)
            .checked_mul(layout.phentsize as u64)
            .and_then(|rel| layout.phoff.checked_add(rel))
            .ok_or_else(|| parse_ehdr_error("program header table offset overflows"))?;
        src.read(buf, offset)?;
        let header = ProgHeader::parse(buf, offset, ident)?;
        progs.push(Prog {
            view: RangeView::new(src, header.offset, header.filesz),
            header,
        });
    }
    #[cfg(feature = "log")]
    log::trace!("[{}] {} program headers", src.shortname(), progs.len());
    Ok(progs)
}
