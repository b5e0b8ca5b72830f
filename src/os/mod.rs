//! Platform file backends used by [`crate::input::ElfFile`].
//!
//! Every backend offers the same cursor-free positioned read so that range
//! views over one file can be read from several threads at once.

cfg_if::cfg_if! {
    if #[cfg(windows)]{
        mod windows;
        pub(crate) use windows::RawFile;
    }else if #[cfg(unix)]{
        mod unix;
        pub(crate) use unix::RawFile;
    }else {
        mod portable;
        pub(crate) use portable::RawFile;
    }
}
