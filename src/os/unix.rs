use crate::{
    Result,
    error::{io_error, truncated_error},
};
use std::{ffi::CString, io};

/// A read-only file descriptor read with `pread(2)`.
pub(crate) struct RawFile {
    name: String,
    fd: i32,
    len: u64,
}

impl Drop for RawFile {
    fn drop(&mut self) {
        unsafe { libc::close(self.fd) };
    }
}

impl RawFile {
    pub(crate) fn from_path(path: &str) -> Result<Self> {
        let cpath = CString::new(path).map_err(|_| io_error("path contains a nul byte"))?;
        let fd = unsafe { libc::open(cpath.as_ptr(), libc::O_RDONLY | libc::O_CLOEXEC) };
        if fd == -1 {
            return Err(io::Error::last_os_error().into());
        }
        Self::from_owned_fd(path, fd)
    }

    pub(crate) fn from_owned_fd(path: &str, raw_fd: i32) -> Result<Self> {
        let mut file = Self {
            name: path.to_string(),
            fd: raw_fd,
            len: 0,
        };
        // `file` owns the fd from here on, so an fstat failure still closes it.
        file.len = fstat_len(raw_fd)?;
        Ok(file)
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
            let Ok(off) = libc::off_t::try_from(pos) else {
                return Err(truncated_error(offset, total));
            };
            let res = unsafe { libc::pread(self.fd, buf.as_mut_ptr().cast(), buf.len(), off) };
            if res < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err.into());
            }
            if res == 0 {
                return Err(truncated_error(offset, total));
            }
            let n = res as usize;
            buf = &mut buf[n..];
            pos += n as u64;
        }
        Ok(())
    }
}

fn fstat_len(fd: i32) -> Result<u64> {
    let mut st: libc::stat = unsafe { core::mem::zeroed() };
    if unsafe { libc::fstat(fd, &mut st) } != 0 {
        return Err(io::Error::last_os_error().into());
    }
    Ok(st.st_size as u64)
}
