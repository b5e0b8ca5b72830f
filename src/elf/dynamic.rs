//! Parsing `.dynamic` section
use super::{
    defs::{ElfClass, Parser},
    ident::ElfIdent,
};
use crate::{Result, error::parse_dynamic_error};
use elf::abi::{DT_NEEDED, DT_NULL, DT_RPATH, DT_RUNPATH, DT_SONAME};

/// One entry of the dynamic section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicEntry {
    /// Entry tag (`d_tag`), sign-extended for 32-bit objects.
    pub tag: i64,
    /// Value or address (`d_un`), widened to 64 bits.
    pub val: u64,
}

impl DynamicEntry {
    /// Whether `val` of this tag is an offset into the dynamic string table.
    #[inline]
    pub fn is_string(&self) -> bool {
        is_string_tag(self.tag)
    }
}

#[inline]
pub(crate) fn is_string_tag(tag: i64) -> bool {
    matches!(tag, DT_NEEDED | DT_SONAME | DT_RPATH | DT_RUNPATH)
}

/// Decodes the entries of an `SHT_DYNAMIC` section up to the first `DT_NULL`.
pub(crate) fn parse_dynamic(data: &[u8], base: u64, ident: &ElfIdent) -> Result<Vec<DynamicEntry>> {
    let dyn_size = ident.class.dyn_size();
    if data.len() % dyn_size != 0 {
        return Err(parse_dynamic_error(format!(
            "dynamic section size {} is not a multiple of the entry size {dyn_size}",
            data.len()
        )));
    }
    let mut entries = Vec::with_capacity(data.len() / dyn_size);
    let mut p = Parser::new(data, base, ident.endian, ident.class);
    for _ in 0..data.len() / dyn_size {
        let tag = match ident.class {
            ElfClass::Elf32 => i64::from(p.u32()? as i32),
            ElfClass::Elf64 => p.u64()? as i64,
        };
        let val = p.word()?;
        if tag == DT_NULL {
            break;
        }
        entries.push(DynamicEntry { tag, val });
    }
    Ok(entries)
}
