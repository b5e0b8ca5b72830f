use crate::{Result, error::truncated_error};
use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    sync::Mutex,
};

/// Fallback for targets without a positioned-read primitive: the cursor is
/// shared, so every read holds the lock across its seek and read.
pub(crate) struct RawFile {
    name: String,
    file: Mutex<File>,
    len: u64,
}

impl RawFile {
    pub(crate) fn from_path(path: &str) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            name: path.to_string(),
            file: Mutex::new(file),
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

    pub(crate) fn read(&self, buf: &mut [u8], offset: u64) -> Result<()> {
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        file.seek(SeekFrom::Start(offset))?;
        match file.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                Err(truncated_error(offset, buf.len()))
            }
            Err(err) => Err(err.into()),
        }
    }
}
