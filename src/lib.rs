//! # elf_decoder
//! A `safe`, `lazy` and `endian-aware` decoder for ELF object files.
//! ## Usage
//! It decodes the identification block, the file header, the program header
//! table and the section header table of 32-bit and 64-bit ELF files of
//! either byte order, and gives access to section and segment contents,
//! symbol tables and dynamic entries.
//!
//! The decoder only issues positioned reads against an [`ElfReader`], so the
//! same source can back many section and segment readers at once. Section
//! contents are not read until asked for; compressed sections are inflated
//! lazily as they are read.
//! ## Example
//! ```no_run
//! use elf_decoder::{ElfObject, input::ElfFile};
//! use std::io::Read;
//!
//! let file = ElfFile::from_path("/bin/ls").unwrap();
//! let object = ElfObject::parse(&file).unwrap();
//! if let Some(comment) = object.section(".comment") {
//!     let mut text = String::new();
//!     comment.open().unwrap().read_to_string(&mut text).unwrap();
//! }
//! for library in object.imported_libraries().unwrap() {
//!     println!("{library}");
//! }
//! ```

pub mod elf;
mod error;
pub mod input;
mod object;
mod os;
mod reader;
mod section;
mod segment;

pub use error::Error;
pub use input::{ElfBinary, ElfFile, ElfReader, IntoElfReader};
pub use object::ElfObject;
#[cfg(feature = "compression")]
pub use reader::DecompressReader;
pub use reader::{RangeReader, SectionReader, ZeroReader};
pub use section::Section;
pub use segment::Prog;

pub type Result<T> = core::result::Result<T, Error>;
