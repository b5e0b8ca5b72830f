//! Random-access byte sources
//!
//! This module provides the traits and implementations the decoder reads
//! ELF bytes through, whether they are stored in memory or in files. The
//! decoder only ever issues positioned reads, so one source can back many
//! independent section and segment views at the same time.

pub use backend::{ElfBinary, ElfFile};
pub use traits::{ElfReader, IntoElfReader};

mod backend;
mod traits;
