//! GNU symbol versioning
//!
//! `SHT_GNU_VERSYM` holds one 16-bit version index per dynamic symbol. The
//! index refers to an entry of `SHT_GNU_VERNEED` (versions required from
//! other libraries) or `SHT_GNU_VERDEF` (versions defined by this object).
//! Everything here is best effort: malformed version data is skipped and
//! leaves the affected symbols without version information.

use super::{
    defs::{ElfClass, Endian, Parser},
    strtab::ElfStringTable,
};
use hashbrown::HashMap;

/// Mask selecting the version index of a versym entry; the top bit marks
/// hidden symbols.
const VERSYM_VERSION: u16 = 0x7fff;
/// Indices 0 (local) and 1 (global, unversioned) carry no version.
const VER_NDX_GLOBAL: u16 = 1;

const VERNEED_SIZE: usize = 16;
const VERNAUX_SIZE: usize = 16;
const VERDEF_SIZE: usize = 20;
const VERDAUX_SIZE: usize = 8;

#[derive(Debug, Clone, Default)]
struct VersionEntry {
    library: String,
    version: String,
}

/// Version information of the dynamic symbol table.
#[derive(Debug, Default)]
pub(crate) struct ElfVersion {
    versym: Vec<u16>,
    entries: HashMap<u16, VersionEntry>,
}

impl ElfVersion {
    /// Builds the version lookup from the raw section contents.
    ///
    /// # Arguments
    /// * `versym` - Contents of `SHT_GNU_VERSYM`
    /// * `verneed` - Contents of `SHT_GNU_VERNEED` with its linked string table
    /// * `verdef` - Contents of `SHT_GNU_VERDEF` with its linked string table
    pub(crate) fn new(
        endian: Endian,
        versym: &[u8],
        verneed: Option<(&[u8], ElfStringTable<'_>)>,
        verdef: Option<(&[u8], ElfStringTable<'_>)>,
    ) -> Self {
        let versym = versym
            .chunks_exact(2)
            .map(|pair| endian.u16([pair[0], pair[1]]))
            .collect();
        let mut entries = HashMap::new();
        if let Some((data, strtab)) = verdef {
            parse_verdef(endian, data, &strtab, &mut entries);
        }
        if let Some((data, strtab)) = verneed {
            parse_verneed(endian, data, &strtab, &mut entries);
        }
        #[cfg(feature = "log")]
        log::trace!("[Version] {} versioned indices", entries.len());
        Self { versym, entries }
    }

    /// Gets `(library, version)` of the dynamic symbol at `idx`.
    pub(crate) fn get(&self, idx: usize) -> Option<(&str, &str)> {
        let ndx = *self.versym.get(idx)? & VERSYM_VERSION;
        if ndx <= VER_NDX_GLOBAL {
            return None;
        }
        self.entries
            .get(&ndx)
            .map(|entry| (entry.library.as_str(), entry.version.as_str()))
    }
}

fn record_parser(data: &[u8], offset: usize, size: usize, endian: Endian) -> Option<Parser<'_>> {
    let record = data.get(offset..offset.checked_add(size)?)?;
    // The class only matters for word-sized fields, which version records do not have.
    Some(Parser::new(record, offset as u64, endian, ElfClass::Elf32))
}

/// Walks the `Elf_Verneed` chain and its `Elf_Vernaux` entries.
fn parse_verneed(
    endian: Endian,
    data: &[u8],
    strtab: &ElfStringTable<'_>,
    entries: &mut HashMap<u16, VersionEntry>,
) {
    let mut offset = 0usize;
    while let Some(mut p) = record_parser(data, offset, VERNEED_SIZE, endian) {
        let (Ok(vn_version), Ok(vn_cnt), Ok(vn_file), Ok(vn_aux), Ok(vn_next)) =
            (p.u16(), p.u16(), p.u32(), p.u32(), p.u32())
        else {
            break;
        };
        if vn_version != 1 {
            break;
        }
        let library = strtab
            .get_str(vn_file as usize)
            .map(|s| s.into_owned())
            .unwrap_or_default();

        let mut aux = offset.checked_add(vn_aux as usize);
        for _ in 0..vn_cnt {
            let Some(mut a) = aux.and_then(|at| record_parser(data, at, VERNAUX_SIZE, endian))
            else {
                break;
            };
            let (Ok(_hash), Ok(_flags), Ok(other), Ok(name), Ok(next)) =
                (a.u32(), a.u16(), a.u16(), a.u32(), a.u32())
            else {
                break;
            };
            let version = strtab
                .get_str(name as usize)
                .map(|s| s.into_owned())
                .unwrap_or_default();
            entries.insert(
                other & VERSYM_VERSION,
                VersionEntry {
                    library: library.clone(),
                    version,
                },
            );
            if next == 0 {
                break;
            }
            aux = aux.and_then(|at| at.checked_add(next as usize));
        }

        if vn_next == 0 {
            break;
        }
        match offset.checked_add(vn_next as usize) {
            Some(next) => offset = next,
            None => break,
        }
    }
}

/// Walks the `Elf_Verdef` chain. The first `Elf_Verdaux` of each entry
/// names the version; the remaining ones name its predecessors.
fn parse_verdef(
    endian: Endian,
    data: &[u8],
    strtab: &ElfStringTable<'_>,
    entries: &mut HashMap<u16, VersionEntry>,
) {
    let mut offset = 0usize;
    while let Some(mut p) = record_parser(data, offset, VERDEF_SIZE, endian) {
        let (Ok(vd_version), Ok(_flags), Ok(vd_ndx), Ok(vd_cnt), Ok(_hash), Ok(vd_aux), Ok(vd_next)) =
            (p.u16(), p.u16(), p.u16(), p.u16(), p.u32(), p.u32(), p.u32())
        else {
            break;
        };
        if vd_version != 1 {
            break;
        }
        if vd_cnt > 0 {
            let name = offset
                .checked_add(vd_aux as usize)
                .and_then(|at| record_parser(data, at, VERDAUX_SIZE, endian))
                .and_then(|mut a| a.u32().ok())
                .and_then(|name| strtab.get_str(name as usize).ok());
            if let Some(version) = name {
                entries.insert(
                    vd_ndx & VERSYM_VERSION,
                    VersionEntry {
                        library: String::new(),
                        version: version.into_owned(),
                    },
                );
            }
        }
        if vd_next == 0 {
            break;
        }
        match offset.checked_add(vd_next as usize) {
            Some(next) => offset = next,
            None => break,
        }
    }
}
