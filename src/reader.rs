//! Byte-range views and the readers built on top of them
//!
//! Every decoded section and segment owns a [`RangeView`]: a non-owning
//! window over the underlying source. Content is exposed through
//! [`std::io::Read`] + [`std::io::Seek`] readers that each keep their own
//! position, so handing out several readers over the same source is safe.

use crate::{Result, input::ElfReader};
use std::io::{self, Read, Seek, SeekFrom};

/// A window `[start, start + len)` over an [`ElfReader`].
#[derive(Clone, Copy)]
pub(crate) struct RangeView<'src> {
    src: &'src dyn ElfReader,
    start: u64,
    len: u64,
}

impl core::fmt::Debug for RangeView<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RangeView")
            .field("source", &self.src.file_name())
            .field("start", &self.start)
            .field("len", &self.len)
            .finish()
    }
}

impl<'src> RangeView<'src> {
    /// The caller guarantees that `start + len` does not overflow.
    #[inline]
    pub(crate) fn new(src: &'src dyn ElfReader, start: u64, len: u64) -> Self {
        debug_assert!(start.checked_add(len).is_some());
        Self { src, start, len }
    }

    #[inline]
    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    /// A sub-window starting `offset` bytes into this one, clamped to its end.
    pub(crate) fn slice_from(&self, offset: u64) -> Self {
        let offset = offset.min(self.len);
        Self {
            src: self.src,
            start: self.start + offset,
            len: self.len - offset,
        }
    }

    /// Positioned read relative to the window start.
    ///
    /// Returns the number of bytes read, which is short only when the read
    /// reaches the end of the window.
    pub(crate) fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        if offset >= self.len {
            return Ok(0);
        }
        let n = (buf.len() as u64).min(self.len - offset) as usize;
        self.src.read(&mut buf[..n], self.start + offset)?;
        Ok(n)
    }

    #[inline]
    pub(crate) fn reader(&self) -> RangeReader<'src> {
        RangeReader {
            view: *self,
            pos: 0,
        }
    }
}

/// Resolves a seek request against a stream of `len` bytes positioned at `pos`.
fn seek_target(pos: u64, len: u64, style: SeekFrom) -> io::Result<u64> {
    let target = match style {
        SeekFrom::Start(n) => Some(n),
        SeekFrom::End(delta) => len.checked_add_signed(delta),
        SeekFrom::Current(delta) => pos.checked_add_signed(delta),
    };
    target.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "invalid seek to a negative or overflowing position",
        )
    })
}

/// A sequential reader over a [`RangeView`].
///
/// Seeking past the end is allowed; reads there return 0 bytes.
#[derive(Debug, Clone)]
pub struct RangeReader<'src> {
    view: RangeView<'src>,
    pos: u64,
}

impl RangeReader<'_> {
    /// Total length of the range in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.view.len()
    }

    /// Whether the range is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.view.len() == 0
    }
}

impl Read for RangeReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.view.read_at(buf, self.pos)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for RangeReader<'_> {
    fn seek(&mut self, style: SeekFrom) -> io::Result<u64> {
        self.pos = seek_target(self.pos, self.view.len(), style)?;
        Ok(self.pos)
    }
}

/// Synthetic content of an `SHT_NOBITS` section: `size` zero bytes.
#[derive(Debug, Clone)]
pub struct ZeroReader {
    size: u64,
    pos: u64,
}

impl ZeroReader {
    #[inline]
    pub(crate) fn new(size: u64) -> Self {
        Self { size, pos: 0 }
    }
}

impl Read for ZeroReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remain = self.size.saturating_sub(self.pos);
        let n = (buf.len() as u64).min(remain) as usize;
        buf[..n].fill(0);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for ZeroReader {
    fn seek(&mut self, style: SeekFrom) -> io::Result<u64> {
        self.pos = seek_target(self.pos, self.size, style)?;
        Ok(self.pos)
    }
}

/// Uncompressed content of an `SHF_COMPRESSED` section holding a zlib stream.
///
/// The decompression stream is created on the first read, positioned at the
/// start of the compressed payload. Decompression streams cannot be rewound:
/// seeking backwards drops the stream, a fresh one is opened from the
/// payload start and the bytes before the target are decompressed and
/// discarded.
#[cfg(feature = "compression")]
pub struct DecompressReader<'src> {
    payload: RangeView<'src>,
    size: u64,
    pos: u64,
    stream: Option<flate2::read::ZlibDecoder<RangeReader<'src>>>,
}

#[cfg(feature = "compression")]
impl<'src> DecompressReader<'src> {
    pub(crate) fn new(payload: RangeView<'src>, size: u64) -> Self {
        Self {
            payload,
            size,
            pos: 0,
            stream: None,
        }
    }

    /// Skips forward to `target` by decompressing and discarding.
    fn discard_to(&mut self, target: u64) -> io::Result<()> {
        let mut scratch = [0u8; 4096];
        while self.pos < target {
            let want = (target - self.pos).min(scratch.len() as u64) as usize;
            let n = self.read(&mut scratch[..want])?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "compressed stream ended before the seek target",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(feature = "compression")]
impl Read for DecompressReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.size {
            return Ok(0);
        }
        let remain = (self.size - self.pos).min(buf.len() as u64) as usize;
        let payload = self.payload;
        let stream = self
            .stream
            .get_or_insert_with(|| flate2::read::ZlibDecoder::new(payload.reader()));
        // Errors of the underlying source pass through, everything else is the stream's.
        let n = stream.read(&mut buf[..remain]).map_err(|err| {
            if err.kind() == io::ErrorKind::Interrupted
                || err.get_ref().is_some_and(|inner| inner.is::<crate::Error>())
            {
                err
            } else {
                io::Error::from(crate::error::decompress_error(err.to_string()))
            }
        })?;
        self.pos += n as u64;
        Ok(n)
    }
}

#[cfg(feature = "compression")]
impl Seek for DecompressReader<'_> {
    fn seek(&mut self, style: SeekFrom) -> io::Result<u64> {
        let target = seek_target(self.pos, self.size, style)?;
        if target == self.pos {
            return Ok(target);
        }
        if target > self.size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek past the end of a compressed section",
            ));
        }
        if target < self.pos {
            self.stream = None;
            self.pos = 0;
        }
        self.discard_to(target)?;
        Ok(self.pos)
    }
}

/// Reader returned by [`Section::open`](crate::Section::open).
///
/// All variants present the logical, uncompressed content of the section.
pub enum SectionReader<'src> {
    /// Bytes stored as-is in the file.
    Raw(RangeReader<'src>),
    /// Zero-filled content of an `SHT_NOBITS` section.
    Zero(ZeroReader),
    /// Lazily decompressed content of a zlib-compressed section.
    #[cfg(feature = "compression")]
    Zlib(DecompressReader<'src>),
}

impl Read for SectionReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SectionReader::Raw(r) => r.read(buf),
            SectionReader::Zero(r) => r.read(buf),
            #[cfg(feature = "compression")]
            SectionReader::Zlib(r) => r.read(buf),
        }
    }
}

impl Seek for SectionReader<'_> {
    fn seek(&mut self, style: SeekFrom) -> io::Result<u64> {
        match self {
            SectionReader::Raw(r) => r.seek(style),
            SectionReader::Zero(r) => r.seek(style),
            #[cfg(feature = "compression")]
            SectionReader::Zlib(r) => r.seek(style),
        }
    }
}
