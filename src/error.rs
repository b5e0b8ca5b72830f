use std::borrow::Cow;
use core::fmt::Display;

/// Error types used throughout the `elf_decoder` library.
///
/// Every failure aborts the whole decode: no partially populated object is
/// ever handed out. Errors are deterministic, retrying with the same input
/// yields the same error.
#[derive(Debug)]
pub enum Error {
    /// An error occurred while opening or reading the underlying source.
    ///
    /// This error typically indicates issues with file I/O operations such as:
    /// * File not found
    /// * Permission denied
    /// * I/O errors during positioned reads
    Io {
        /// A descriptive message about the I/O error.
        msg: Cow<'static, str>,
    },

    /// A required read ran past the end of the source.
    Truncated {
        /// Offset of the read that failed.
        offset: u64,
        /// Number of bytes that were requested.
        len: usize,
    },

    /// The 16-byte identification block is malformed.
    ///
    /// This error typically indicates:
    /// * Invalid magic bytes
    /// * Unsupported ELF class or data encoding
    /// * Unsupported identification version
    ParseIdent {
        /// A descriptive message about the identification error.
        msg: Cow<'static, str>,
    },

    /// The file header is internally inconsistent.
    ///
    /// This error typically indicates issues such as:
    /// * Version mismatch between identification and header
    /// * Negative or zero table offsets with a non-zero count
    /// * Undersized table entry sizes
    ParseEhdr {
        /// A descriptive message about the ELF header parsing error.
        msg: Cow<'static, str>,
    },

    /// A program header entry is malformed.
    ParsePhdr {
        /// A descriptive message about the program header parsing error.
        msg: Cow<'static, str>,
    },

    /// A section header entry is malformed.
    ParseShdr {
        /// A descriptive message about the section header parsing error.
        msg: Cow<'static, str>,
    },

    /// The extended section count or extended string-table index stored in
    /// section 0 is invalid.
    ExtendedIndex {
        /// A descriptive message about the extended convention error.
        msg: Cow<'static, str>,
    },

    /// A name offset points at or past the end of its string table.
    UnresolvableString {
        /// The offset that was looked up.
        offset: usize,
        /// The length of the string table.
        len: usize,
    },

    /// A symbol table's entry size does not match the record size of the class.
    BadEntrySize {
        /// The fixed record size for the file's class.
        expected: u64,
        /// The entry size found in the section header or section length.
        found: u64,
    },

    /// A compressed section could not be decompressed.
    Decompress {
        /// A descriptive message about the decompression error.
        msg: Cow<'static, str>,
    },

    /// An error occurred while parsing the dynamic section.
    ParseDynamic {
        /// A descriptive message about the dynamic section parsing error.
        msg: Cow<'static, str>,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Io { msg } => write!(f, "I/O error: {msg}"),
            Error::Truncated { offset, len } => {
                write!(f, "truncated input: cannot read {len} bytes at offset 0x{offset:x}")
            }
            Error::ParseIdent { msg } => write!(f, "ELF identification error: {msg}"),
            Error::ParseEhdr { msg } => write!(f, "ELF header parsing error: {msg}"),
            Error::ParsePhdr { msg } => write!(f, "Program header parsing error: {msg}"),
            Error::ParseShdr { msg } => write!(f, "Section header parsing error: {msg}"),
            Error::ExtendedIndex { msg } => write!(f, "Extended section index error: {msg}"),
            Error::UnresolvableString { offset, len } => write!(
                f,
                "string offset {offset} is out of range for a string table of {len} bytes"
            ),
            Error::BadEntrySize { expected, found } => {
                write!(f, "bad symbol entry size {found}, expected {expected}")
            }
            Error::Decompress { msg } => write!(f, "Decompression error: {msg}"),
            Error::ParseDynamic { msg } => write!(f, "Dynamic section parsing error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        // Decode errors that went through a `Read`/`Seek` facade come back as-is.
        if !err.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            return io_error(err.to_string());
        }
        let msg = err.to_string();
        match err.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(inner)) => *inner,
            _ => io_error(msg),
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        let kind = match err {
            Error::Truncated { .. } => std::io::ErrorKind::UnexpectedEof,
            Error::Decompress { .. } => std::io::ErrorKind::InvalidData,
            _ => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

/// Creates an I/O error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn io_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::Io { msg: msg.into() }
}

#[cold]
#[inline(never)]
pub(crate) fn truncated_error(offset: u64, len: usize) -> Error {
    Error::Truncated { offset, len }
}

/// Creates an identification parsing error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn parse_ident_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::ParseIdent { msg: msg.into() }
}

/// Creates an ELF header parsing error with the specified message.
///
/// This is a convenience function for creating `Error::ParseEhdr` variants.
///
/// # Arguments
/// * `msg` - The error message.
///
/// # Returns
/// An `Error::ParseEhdr` variant with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn parse_ehdr_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::ParseEhdr { msg: msg.into() }
}

#[cold]
#[inline(never)]
pub(crate) fn parse_phdr_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::ParsePhdr { msg: msg.into() }
}

#[cold]
#[inline(never)]
pub(crate) fn parse_shdr_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::ParseShdr { msg: msg.into() }
}

#[cold]
#[inline(never)]
pub(crate) fn extended_index_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::ExtendedIndex { msg: msg.into() }
}

#[cold]
#[inline(never)]
pub(crate) fn unresolvable_string_error(offset: usize, len: usize) -> Error {
    Error::UnresolvableString { offset, len }
}

#[cold]
#[inline(never)]
pub(crate) fn bad_entry_size_error(expected: u64, found: u64) -> Error {
    Error::BadEntrySize { expected, found }
}

/// Creates a decompression error with the specified message.
///
/// Decompression errors surface lazily, the first time the content of a
/// compressed section is read.
#[cold]
#[inline(never)]
pub(crate) fn decompress_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::Decompress { msg: msg.into() }
}

/// Creates a dynamic section parsing error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn parse_dynamic_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::ParseDynamic { msg: msg.into() }
}
