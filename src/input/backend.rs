use super::{ElfReader, IntoElfReader};
use crate::{Result, error::truncated_error, os::RawFile};

/// Copies `buf.len()` bytes at `offset` out of an in-memory image.
fn read_slice(bytes: &[u8], buf: &mut [u8], offset: u64) -> Result<()> {
    let start = usize::try_from(offset).map_err(|_| truncated_error(offset, buf.len()))?;
    let src = start
        .checked_add(buf.len())
        .and_then(|end| bytes.get(start..end))
        .ok_or_else(|| truncated_error(offset, buf.len()))?;
    buf.copy_from_slice(src);
    Ok(())
}

/// An ELF object source backed by an in-memory byte slice.
///
/// This is useful for decoding ELF files that are already in memory, such as
/// those embedded in the binary or received over a network.
#[derive(Debug)]
pub struct ElfBinary<'bytes> {
    /// The name assigned to this ELF object.
    name: String,
    /// The raw ELF data.
    bytes: &'bytes [u8],
}

impl<'bytes> ElfBinary<'bytes> {
    /// Creates a new memory-based ELF object.
    ///
    /// # Arguments
    /// - `name` - A string identifier for the ELF object, typically the path
    ///            it was read from. Used for error reporting and debugging.
    /// - `bytes` - A byte slice containing the complete ELF data.
    ///
    /// # Examples
    /// ```rust
    /// use elf_decoder::input::ElfBinary;
    ///
    /// let data = &[]; // In practice, this would be the bytes of an ELF file
    /// let binary = ElfBinary::new("liba.so", data);
    /// ```
    pub fn new(name: &str, bytes: &'bytes [u8]) -> Self {
        Self {
            name: name.to_string(),
            bytes,
        }
    }

    /// Returns the underlying bytes.
    #[inline]
    pub fn bytes(&self) -> &'bytes [u8] {
        self.bytes
    }
}

impl<'bytes> ElfReader for ElfBinary<'bytes> {
    fn file_name(&self) -> &str {
        &self.name
    }

    /// Reads data from the memory-based ELF object.
    ///
    /// # Returns
    /// - `Ok(())` - If the read operation was successful.
    /// - `Err` - If the read operation would go beyond the available data.
    fn read(&self, buf: &mut [u8], offset: u64) -> Result<()> {
        read_slice(self.bytes, buf, offset)
    }

    fn size(&self) -> Option<u64> {
        Some(self.bytes.len() as u64)
    }
}

/// An ELF object source backed by a file on the filesystem.
///
/// Reads are positioned reads against the open file, no seek offset is
/// shared between the views decoded from it.
pub struct ElfFile {
    /// The underlying OS-specific file handle.
    inner: RawFile,
}

impl ElfFile {
    /// Creates a new file-based ELF object from an owned file descriptor.
    ///
    /// # Safety
    /// The caller must ensure that:
    /// - The `raw_fd` parameter is a valid, open file descriptor.
    /// - The file descriptor is owned by this object and will not be closed
    ///   by any other code while this object exists.
    ///
    /// # Arguments
    /// - `path` - The file path, used for identification and error reporting.
    /// - `raw_fd` - The raw file descriptor for the open ELF file.
    #[cfg(unix)]
    pub unsafe fn from_owned_fd(path: &str, raw_fd: i32) -> Result<Self> {
        Ok(ElfFile {
            inner: RawFile::from_owned_fd(path, raw_fd)?,
        })
    }

    /// Creates a new file-based ELF object by opening a file at the given path.
    ///
    /// The file is closed when the [`ElfFile`] instance is dropped.
    ///
    /// # Arguments
    /// - `path` - The path to the ELF file to open.
    ///
    /// # Returns
    /// - `Ok(ElfFile)` - If the file was successfully opened and is accessible.
    /// - `Err` - If the file could not be opened or accessed.
    pub fn from_path(path: impl AsRef<str>) -> Result<Self> {
        Ok(ElfFile {
            inner: RawFile::from_path(path.as_ref())?,
        })
    }
}

impl ElfReader for ElfFile {
    fn file_name(&self) -> &str {
        self.inner.file_name()
    }

    fn read(&self, buf: &mut [u8], offset: u64) -> Result<()> {
        self.inner.read(buf, offset)
    }

    fn size(&self) -> Option<u64> {
        Some(self.inner.len())
    }
}

// Byte slices read directly, without a name.
impl ElfReader for [u8] {
    fn file_name(&self) -> &str {
        "<memory>"
    }

    fn read(&self, buf: &mut [u8], offset: u64) -> Result<()> {
        read_slice(self, buf, offset)
    }

    fn size(&self) -> Option<u64> {
        Some(self.len() as u64)
    }
}

impl ElfReader for Vec<u8> {
    fn file_name(&self) -> &str {
        "<memory>"
    }

    fn read(&self, buf: &mut [u8], offset: u64) -> Result<()> {
        read_slice(self, buf, offset)
    }

    fn size(&self) -> Option<u64> {
        Some(self.len() as u64)
    }
}

// Implementation for string slices (file paths)
impl<'a> IntoElfReader<'a> for &'a str {
    type Reader = ElfFile;

    fn into_reader(self) -> Result<Self::Reader> {
        ElfFile::from_path(self)
    }
}

// Implementation for owned strings (file paths)
impl<'a> IntoElfReader<'a> for String {
    type Reader = ElfFile;

    fn into_reader(self) -> Result<Self::Reader> {
        ElfFile::from_path(&self)
    }
}

// Implementation for byte slices (in-memory ELF data)
impl<'a> IntoElfReader<'a> for &'a [u8] {
    type Reader = ElfBinary<'a>;

    fn into_reader(self) -> Result<Self::Reader> {
        Ok(ElfBinary::new("<memory>", self))
    }
}

impl<'a> IntoElfReader<'a> for &'a Vec<u8> {
    type Reader = ElfBinary<'a>;

    fn into_reader(self) -> Result<Self::Reader> {
        Ok(ElfBinary::new("<memory>", self.as_slice()))
    }
}

impl<'a> IntoElfReader<'a> for ElfFile {
    type Reader = ElfFile;

    fn into_reader(self) -> Result<Self::Reader> {
        Ok(self)
    }
}

impl<'a, 'b> IntoElfReader<'a> for ElfBinary<'b>
where
    'b: 'a,
{
    type Reader = ElfBinary<'b>;

    fn into_reader(self) -> Result<Self::Reader> {
        Ok(self)
    }
}
