//! ELF string table handling

use crate::{Result, error::unresolvable_string_error};
use std::borrow::Cow;

/// ELF string table wrapper
///
/// A string table is a blob of null-terminated strings addressed by byte
/// offset. Names are not required to be UTF-8; invalid sequences are
/// replaced when converting to `str`.
#[derive(Debug, Clone, Copy)]
pub struct ElfStringTable<'data> {
    data: &'data [u8],
}

impl<'data> ElfStringTable<'data> {
    #[inline]
    pub const fn new(data: &'data [u8]) -> Self {
        ElfStringTable { data }
    }

    /// Length of the underlying blob.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Gets the raw bytes of the string starting at `offset`.
    ///
    /// The string runs up to, but excluding, the first null byte, or to the
    /// end of the blob when there is none.
    ///
    /// # Returns
    /// * `Ok(bytes)` - The string without its terminator
    /// * `Err(Error::UnresolvableString)` - If `offset` is at or past the end of the blob
    pub fn get_bytes(&self, offset: usize) -> Result<&'data [u8]> {
        let tail = self
            .data
            .get(offset..)
            .filter(|tail| !tail.is_empty())
            .ok_or_else(|| unresolvable_string_error(offset, self.data.len()))?;
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        Ok(&tail[..end])
    }

    /// Gets the string starting at `offset`, see [`Self::get_bytes`].
    #[inline]
    pub fn get_str(&self, offset: usize) -> Result<Cow<'data, str>> {
        self.get_bytes(offset).map(String::from_utf8_lossy)
    }
}
