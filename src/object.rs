//! The decoded ELF object
//!
//! [`ElfObject::parse`] builds the whole object at once: identification,
//! file header, program headers and section headers with resolved names.
//! Symbol tables and dynamic entries are decoded on demand.

use crate::{
    Result,
    elf::{
        DynamicEntry, ElfHeader, ElfIdent, ElfStringTable, ElfVersion, Parser, RawSymbol, Symbol,
        SymbolTable, is_string_tag, parse_dynamic,
    },
    error::{bad_entry_size_error, parse_dynamic_error, parse_shdr_error},
    input::ElfReader,
    section::{Section, read_sections},
    segment::{Prog, read_progs},
};
use core::hash::{Hash, Hasher};
use elf::abi::{
    DT_NEEDED, SHT_DYNAMIC, SHT_DYNSYM, SHT_GNU_VERDEF, SHT_GNU_VERNEED, SHT_GNU_VERSYM,
    SHT_SYMTAB, STB_GLOBAL, STB_WEAK,
};
use foldhash::{SharedSeed, fast::FoldHasher};
use hashbrown::HashTable;

const HASHER: FoldHasher<'static> = FoldHasher::with_seed(0, SharedSeed::global_fixed());

/// Maps section names to the index of the first section carrying them.
struct SectionIndex {
    table: HashTable<usize>,
}

impl SectionIndex {
    fn hash(name: &str) -> u64 {
        let mut hasher = HASHER.clone();
        name.hash(&mut hasher);
        hasher.finish()
    }

    fn new(sections: &[Section<'_>]) -> Self {
        let mut table = HashTable::with_capacity(sections.len());
        for (idx, section) in sections.iter().enumerate() {
            let name = section.name();
            if name.is_empty() {
                continue;
            }
            let hash = Self::hash(name);
            if table
                .find(hash, |&other: &usize| sections[other].name() == name)
                .is_some()
            {
                continue;
            }
            table.insert_unique(hash, idx, |&other| Self::hash(sections[other].name()));
        }
        Self { table }
    }

    fn get(&self, sections: &[Section<'_>], name: &str) -> Option<usize> {
        self.table
            .find(Self::hash(name), |&idx| sections[idx].name() == name)
            .copied()
    }
}

/// A decoded ELF object.
///
/// Sections and program headers hold views over the source they were
/// decoded from, so the object cannot outlive it. The object is immutable
/// and can be shared between threads.
pub struct ElfObject<'src> {
    src: &'src dyn ElfReader,
    header: ElfHeader,
    progs: Vec<Prog<'src>>,
    sections: Vec<Section<'src>>,
    index: SectionIndex,
}

impl core::fmt::Debug for ElfObject<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ElfObject")
            .field("name", &self.src.file_name())
            .field("header", &self.header)
            .field("progs", &self.progs.len())
            .field("sections", &self.sections.len())
            .finish()
    }
}

impl<'src> ElfObject<'src> {
    /// Decodes an ELF object from a random-access source.
    ///
    /// # Arguments
    /// * `src` - The source to read from. Every section and segment of the
    ///   returned object keeps a view over it.
    ///
    /// # Returns
    /// * `Ok(object)` - The fully decoded object
    /// * `Err(Error)` - If any part of the headers is malformed or truncated
    ///
    /// # Examples
    /// ```no_run
    /// use elf_decoder::{ElfObject, input::ElfBinary};
    ///
    /// let bytes = std::fs::read("/bin/true").unwrap();
    /// let binary = ElfBinary::new("true", &bytes);
    /// let object = ElfObject::parse(&binary).unwrap();
    /// for section in object.sections() {
    ///     println!("{} {:#x}", section.name(), section.size());
    /// }
    /// ```
    pub fn parse(src: &'src dyn ElfReader) -> Result<Self> {
        let ident = ElfIdent::read(src)?;
        let (header, layout) = ElfHeader::read(src, ident)?;
        #[cfg(feature = "log")]
        log::debug!(
            "[{}] {:?} {:?} type {:#x} machine {:#x}",
            src.shortname(),
            ident.class,
            ident.endian,
            header.e_type(),
            header.machine()
        );
        let progs = read_progs(src, &ident, &layout)?;
        let sections = read_sections(src, &ident, &layout)?;
        let index = SectionIndex::new(&sections);
        Ok(Self {
            src,
            header,
            progs,
            sections,
            index,
        })
    }

    /// Gets the name of the source this object was decoded from.
    #[inline]
    pub fn file_name(&self) -> &str {
        self.src.file_name()
    }

    /// Gets the identification block.
    #[inline]
    pub fn ident(&self) -> &ElfIdent {
        self.header.ident()
    }

    /// Gets the file header.
    #[inline]
    pub fn header(&self) -> &ElfHeader {
        &self.header
    }

    /// Gets all sections in section header table order.
    #[inline]
    pub fn sections(&self) -> &[Section<'src>] {
        &self.sections
    }

    /// Gets all program headers in table order.
    #[inline]
    pub fn progs(&self) -> &[Prog<'src>] {
        &self.progs
    }

    /// Gets the first section called `name`.
    pub fn section(&self, name: &str) -> Option<&Section<'src>> {
        self.index
            .get(&self.sections, name)
            .map(|idx| &self.sections[idx])
    }

    /// Gets the first section of type `sh_type`.
    pub fn section_by_type(&self, sh_type: u32) -> Option<&Section<'src>> {
        self.sections.iter().find(|s| s.sh_type() == sh_type)
    }

    /// Decodes the static symbol table (`SHT_SYMTAB`).
    ///
    /// # Returns
    /// * `Ok(None)` - If the object has no static symbol table
    pub fn symbols(&self) -> Result<Option<SymbolTable>> {
        self.section_by_type(SHT_SYMTAB)
            .map(|s| self.symbols_in(s))
            .transpose()
    }

    /// Decodes the dynamic symbol table (`SHT_DYNSYM`), including symbol
    /// versions when the object carries version sections.
    ///
    /// # Returns
    /// * `Ok(None)` - If the object has no dynamic symbol table
    pub fn dynamic_symbols(&self) -> Result<Option<SymbolTable>> {
        self.section_by_type(SHT_DYNSYM)
            .map(|s| self.symbols_in(s))
            .transpose()
    }

    /// Decodes the symbol table held by `section`.
    ///
    /// Names are resolved through the string table referenced by the
    /// section's `link`. Entries of an `SHT_DYNSYM` table also get their
    /// version and library.
    pub fn symbols_in(&self, section: &Section<'src>) -> Result<SymbolTable> {
        let class = self.ident().class;
        let sym_size = class.sym_size() as u64;
        if section.entsize() != sym_size {
            return Err(bad_entry_size_error(sym_size, section.entsize()));
        }
        let data = section.data()?;
        if data.len() as u64 % sym_size != 0 {
            return Err(bad_entry_size_error(sym_size, data.len() as u64));
        }
        let strings = self.linked_strings(section)?;
        let strtab = ElfStringTable::new(&strings);
        let versions = if section.sh_type() == SHT_DYNSYM {
            self.versions()
        } else {
            None
        };

        let count = data.len() / sym_size as usize;
        let mut parser = Parser::new(&data, section.offset(), self.ident().endian, class);
        let mut symbols = Vec::with_capacity(count);
        for idx in 0..count {
            let raw = RawSymbol::parse(&mut parser, self.ident())?;
            let mut symbol = Symbol {
                name: strtab.get_str(raw.name_offset as usize)?.into_owned(),
                info: raw.info,
                other: raw.other,
                section: raw.shndx,
                value: raw.value,
                size: raw.size,
                ..Default::default()
            };
            if let Some((library, version)) = versions.as_ref().and_then(|v| v.get(idx)) {
                symbol.library = library.to_owned();
                symbol.version = version.to_owned();
            }
            symbols.push(symbol);
        }
        #[cfg(feature = "log")]
        log::trace!(
            "[{}] {} symbols in {}",
            self.src.shortname(),
            symbols.len(),
            section.name()
        );
        Ok(SymbolTable::new(symbols))
    }

    /// Gets the undefined global and weak dynamic symbols, with the version
    /// and library they are expected from.
    pub fn imported_symbols(&self) -> Result<Vec<Symbol>> {
        let Some(symbols) = self.dynamic_symbols()? else {
            return Ok(Vec::new());
        };
        Ok(symbols
            .into_vec()
            .into_iter()
            .filter(|sym| sym.is_undef() && matches!(sym.bind(), STB_GLOBAL | STB_WEAK))
            .filter(|sym| !sym.name.is_empty())
            .collect())
    }

    /// Gets the libraries this object depends on (`DT_NEEDED`).
    #[inline]
    pub fn imported_libraries(&self) -> Result<Vec<String>> {
        self.dynamic_strings(DT_NEEDED)
    }

    /// Decodes the entries of the dynamic section (`SHT_DYNAMIC`).
    ///
    /// # Returns
    /// * `Ok(None)` - If the object has no dynamic section
    pub fn dynamic_entries(&self) -> Result<Option<Vec<DynamicEntry>>> {
        let Some(section) = self.section_by_type(SHT_DYNAMIC) else {
            return Ok(None);
        };
        let data = section.data()?;
        parse_dynamic(&data, section.offset(), self.ident()).map(Some)
    }

    /// Gets the strings of all dynamic entries tagged `tag`.
    ///
    /// Only tags whose value is a string table offset are accepted:
    /// `DT_NEEDED`, `DT_SONAME`, `DT_RPATH` and `DT_RUNPATH`.
    pub fn dynamic_strings(&self, tag: i64) -> Result<Vec<String>> {
        if !is_string_tag(tag) {
            return Err(parse_dynamic_error(format!(
                "dynamic tag {tag:#x} does not hold a string"
            )));
        }
        let Some(section) = self.section_by_type(SHT_DYNAMIC) else {
            return Ok(Vec::new());
        };
        let data = section.data()?;
        let entries = parse_dynamic(&data, section.offset(), self.ident())?;
        let strings = self.linked_strings(section)?;
        let strtab = ElfStringTable::new(&strings);
        entries
            .iter()
            .filter(|entry| entry.tag == tag)
            .map(|entry| {
                let offset = usize::try_from(entry.val)
                    .map_err(|_| parse_dynamic_error("string offset out of range"))?;
                Ok(strtab.get_str(offset)?.into_owned())
            })
            .collect()
    }

    /// Reads the contents of the string table linked from `section`.
    fn linked_strings(&self, section: &Section<'src>) -> Result<Vec<u8>> {
        let link = section.link() as usize;
        let strtab = self.sections.get(link).ok_or_else(|| {
            parse_shdr_error(format!(
                "section {} links to missing section {link}",
                section.name()
            ))
        })?;
        strtab.data()
    }

    /// Reads a version section with its linked string table, if both are readable.
    fn version_section(&self, sh_type: u32) -> Option<(Vec<u8>, Vec<u8>)> {
        let section = self.section_by_type(sh_type)?;
        let strings = self.linked_strings(section).ok()?;
        Some((section.data().ok()?, strings))
    }

    /// Builds the dynamic symbol versions. Unreadable version data yields `None`.
    fn versions(&self) -> Option<ElfVersion> {
        let versym = self.section_by_type(SHT_GNU_VERSYM)?.data().ok()?;
        let verneed = self.version_section(SHT_GNU_VERNEED);
        let verdef = self.version_section(SHT_GNU_VERDEF);
        Some(ElfVersion::new(
            self.ident().endian,
            &versym,
            verneed
                .as_ref()
                .map(|(data, strings)| (data.as_slice(), ElfStringTable::new(strings))),
            verdef
                .as_ref()
                .map(|(data, strings)| (data.as_slice(), ElfStringTable::new(strings))),
        ))
    }
}
