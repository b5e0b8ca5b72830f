use crate::Result;

/// A trait for reading ELF data from various sources.
///
/// `ElfReader` abstracts the underlying storage (memory, file system, etc.)
/// providing a unified, cursor-free interface for the decoder to access the
/// identification block, the header tables and section contents.
///
/// Implementations must not keep a shared stream position: the decoded
/// sections and segments hold views over the same source and may read from
/// it concurrently.
pub trait ElfReader: Sync {
    /// Returns the full name or path of the ELF object.
    fn file_name(&self) -> &str;

    /// Reads a chunk of data from the ELF object into the provided buffer.
    ///
    /// The buffer is either filled completely or the call fails; a read
    /// that runs past the end of the source fails with
    /// [`Error::Truncated`](crate::Error::Truncated).
    ///
    /// # Arguments
    /// * `buf` - The destination buffer. Its length determines the number of bytes read.
    /// * `offset` - The starting byte offset within the ELF source.
    fn read(&self, buf: &mut [u8], offset: u64) -> Result<()>;

    /// Returns the total length of the source in bytes, when known.
    fn size(&self) -> Option<u64>;

    /// Returns the short name of the ELF object (the filename without the path).
    fn shortname(&self) -> &str {
        let name = self.file_name();
        name.rsplit('/').next().unwrap_or(name)
    }
}

/// A trait for converting various input sources into an `ElfReader`.
///
/// This trait allows different types (like file paths or byte slices) to be
/// converted into a reader that implements `ElfReader`.
pub trait IntoElfReader<'a> {
    /// The type of reader produced by this conversion.
    type Reader: ElfReader + 'a;

    /// Converts the input into an `ElfReader`.
    ///
    /// # Returns
    /// * `Ok(reader)` - The converted reader.
    /// * `Err(error)` - If the conversion fails (e.g., file not found).
    fn into_reader(self) -> Result<Self::Reader>;
}

impl<T: ElfReader + ?Sized> ElfReader for &T {
    #[inline]
    fn file_name(&self) -> &str {
        (**self).file_name()
    }

    #[inline]
    fn read(&self, buf: &mut [u8], offset: u64) -> Result<()> {
        (**self).read(buf, offset)
    }

    #[inline]
    fn size(&self) -> Option<u64> {
        (**self).size()
    }
}
