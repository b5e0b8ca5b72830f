use crate::{Result, error::truncated_error};
use std::{fs::File, io, os::windows::fs::FileExt};

/// A read-only file read with `seek_read`, which does not share a cursor
/// between callers that only use positioned reads.
pub(crate) struct RawFile {
    name: String,
    file: File,
    len: u64,
}

impl RawFile {
    pub(crate) fn from_path(path: &str) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            name: path.to_string(),
            file,
            len,
        })
    }

    #[inline]
    pub(crate) fn file_name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    pub(crate) fn read(&self, mut buf: &mut [u8], offset: u64) -> Result<()> {
        let total = buf.len();
        let mut pos = offset;
        while !buf.is_empty() {
            match self.file.seek_read(buf, pos) {
                Ok(0) => return Err(truncated_error(offset, total)),
                Ok(n) => {
                    buf = &mut buf[n..];
                    pos += n as u64;
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}
