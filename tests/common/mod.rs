#![allow(dead_code)]

//! A small ELF writer producing synthetic images for the decoder tests.

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use elf_decoder::elf::{
    ELFCOMPRESS_ZLIB, SHF_COMPRESSED, SHN_LORESERVE, SHN_XINDEX, SHT_NULL, SHT_STRTAB,
};
use flate2::{Compression, write::ZlibEncoder};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Elf32,
    Elf64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Little,
    Big,
}

impl Class {
    pub fn ehdr_size(self) -> usize {
        match self {
            Class::Elf32 => 52,
            Class::Elf64 => 64,
        }
    }

    pub fn phdr_size(self) -> usize {
        match self {
            Class::Elf32 => 32,
            Class::Elf64 => 56,
        }
    }

    pub fn shdr_size(self) -> usize {
        match self {
            Class::Elf32 => 40,
            Class::Elf64 => 64,
        }
    }

    pub fn sym_size(self) -> usize {
        match self {
            Class::Elf32 => 16,
            Class::Elf64 => 24,
        }
    }
}

/// Byte-order and class aware encoder.
pub struct Enc {
    pub class: Class,
    pub order: Order,
    pub buf: Vec<u8>,
}

impl Enc {
    pub fn new(class: Class, order: Order) -> Self {
        Self {
            class,
            order,
            buf: Vec::new(),
        }
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        match self.order {
            Order::Little => self.buf.write_u16::<LittleEndian>(v),
            Order::Big => self.buf.write_u16::<BigEndian>(v),
        }
        .unwrap();
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        match self.order {
            Order::Little => self.buf.write_u32::<LittleEndian>(v),
            Order::Big => self.buf.write_u32::<BigEndian>(v),
        }
        .unwrap();
        self
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        match self.order {
            Order::Little => self.buf.write_u64::<LittleEndian>(v),
            Order::Big => self.buf.write_u64::<BigEndian>(v),
        }
        .unwrap();
        self
    }

    /// Address-sized field; truncated to 32 bits for `Elf32`.
    pub fn word(&mut self, v: u64) -> &mut Self {
        match self.class {
            Class::Elf32 => self.u32(v as u32),
            Class::Elf64 => self.u64(v),
        }
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    pub fn align(&mut self, align: usize) -> &mut Self {
        while self.buf.len() % align != 0 {
            self.buf.push(0);
        }
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug, Clone, Default)]
pub struct SectionDesc {
    pub name: String,
    pub sh_type: u32,
    pub flags: u64,
    pub addr: u64,
    pub link: u32,
    pub info: u32,
    pub addralign: u64,
    pub entsize: u64,
    /// Bytes stored in the file.
    pub data: Vec<u8>,
    /// Overrides `sh_size`, used for `SHT_NOBITS`.
    pub size: Option<u64>,
}

impl SectionDesc {
    pub fn new(name: &str, sh_type: u32, data: Vec<u8>) -> Self {
        Self {
            name: name.to_owned(),
            sh_type,
            addralign: 1,
            data,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgDesc {
    pub p_type: u32,
    pub flags: u32,
    pub vaddr: u64,
    pub paddr: u64,
    pub memsz: u64,
    pub align: u64,
    pub data: Vec<u8>,
}

/// The encoded image together with where its tables ended up.
pub struct Image {
    pub bytes: Vec<u8>,
    pub class: Class,
    pub order: Order,
    pub phoff: u64,
    pub shoff: u64,
    pub shnum: usize,
    pub shstrndx: usize,
}

impl Image {
    /// File offset of section header `idx`.
    pub fn shdr_at(&self, idx: usize) -> usize {
        self.shoff as usize + idx * self.class.shdr_size()
    }

    /// File offset of program header `idx`.
    pub fn phdr_at(&self, idx: usize) -> usize {
        self.phoff as usize + idx * self.class.phdr_size()
    }

    pub fn put_u16(&mut self, at: usize, v: u16) {
        let mut enc = Enc::new(self.class, self.order);
        enc.u16(v);
        self.bytes[at..at + 2].copy_from_slice(&enc.buf);
    }

    pub fn put_u32(&mut self, at: usize, v: u32) {
        let mut enc = Enc::new(self.class, self.order);
        enc.u32(v);
        self.bytes[at..at + 4].copy_from_slice(&enc.buf);
    }

    pub fn put_word(&mut self, at: usize, v: u64) {
        let mut enc = Enc::new(self.class, self.order);
        enc.word(v);
        let n = enc.buf.len();
        self.bytes[at..at + n].copy_from_slice(&enc.buf);
    }

    /// Offset of `e_shnum` in the file header.
    pub fn e_shnum_at(&self) -> usize {
        match self.class {
            Class::Elf32 => 48,
            Class::Elf64 => 60,
        }
    }

    /// Offset of `e_shstrndx` in the file header.
    pub fn e_shstrndx_at(&self) -> usize {
        self.e_shnum_at() + 2
    }

    /// Offset of `e_shentsize` in the file header.
    pub fn e_shentsize_at(&self) -> usize {
        self.e_shnum_at() - 2
    }

    /// Offset of the `sh_offset` field of section header `idx`.
    pub fn sh_offset_at(&self, idx: usize) -> usize {
        self.shdr_at(idx)
            + match self.class {
                Class::Elf32 => 16,
                Class::Elf64 => 24,
            }
    }

    /// Offset of the `sh_size` field of section header `idx`.
    pub fn sh_size_at(&self, idx: usize) -> usize {
        self.sh_offset_at(idx) + self.class_word()
    }

    /// Offset of the `sh_type` field of section header `idx`.
    pub fn sh_type_at(&self, idx: usize) -> usize {
        self.shdr_at(idx) + 4
    }

    fn class_word(&self) -> usize {
        match self.class {
            Class::Elf32 => 4,
            Class::Elf64 => 8,
        }
    }
}

pub struct ElfBuilder {
    pub class: Class,
    pub order: Order,
    pub e_type: u16,
    pub machine: u16,
    pub entry: u64,
    pub flags: u32,
    pub os_abi: u8,
    pub abi_version: u8,
    /// Number of empty `SHT_NULL` sections inserted before `.shstrtab`.
    pub padding_sections: usize,
    /// Store the section count in section 0 even when it would fit.
    pub force_extended_count: bool,
    /// Store the string table index in section 0 even when it would fit.
    pub force_extended_index: bool,
    /// Leave out `.shstrtab` and set `e_shstrndx` to 0.
    pub without_shstrtab: bool,
    sections: Vec<SectionDesc>,
    progs: Vec<ProgDesc>,
}

impl ElfBuilder {
    pub fn new(class: Class, order: Order) -> Self {
        Self {
            class,
            order,
            e_type: 2,
            machine: 62,
            entry: 0x401000,
            flags: 0,
            os_abi: 0,
            abi_version: 0,
            padding_sections: 0,
            force_extended_count: false,
            force_extended_index: false,
            without_shstrtab: false,
            sections: Vec::new(),
            progs: Vec::new(),
        }
    }

    /// Adds a section and returns its index in the section header table.
    pub fn section(&mut self, desc: SectionDesc) -> u32 {
        self.sections.push(desc);
        self.sections.len() as u32
    }

    pub fn prog(&mut self, desc: ProgDesc) -> &mut Self {
        self.progs.push(desc);
        self
    }

    pub fn build(&self) -> Image {
        let class = self.class;
        let ehsize = class.ehdr_size();

        let mut names = vec![0u8];
        let mut name_offsets = Vec::with_capacity(self.sections.len());
        for desc in &self.sections {
            name_offsets.push(names.len() as u32);
            names.extend_from_slice(desc.name.as_bytes());
            names.push(0);
        }
        let shstrtab_name = names.len() as u32;
        names.extend_from_slice(b".shstrtab\0");

        let shstrndx = if self.without_shstrtab {
            0
        } else {
            1 + self.sections.len() + self.padding_sections
        };
        let shnum = 1
            + self.sections.len()
            + self.padding_sections
            + usize::from(!self.without_shstrtab);

        // Contents: program data, section data, then the name table.
        let phoff = if self.progs.is_empty() { 0 } else { ehsize };
        let mut cursor = ehsize + self.progs.len() * class.phdr_size();
        let mut body = Vec::new();
        let mut place = |data: &[u8], cursor: &mut usize| -> u64 {
            while *cursor % 8 != 0 {
                body.push(0);
                *cursor += 1;
            }
            let at = *cursor;
            body.extend_from_slice(data);
            *cursor += data.len();
            at as u64
        };
        let prog_offsets: Vec<u64> = self
            .progs
            .iter()
            .map(|p| place(&p.data, &mut cursor))
            .collect();
        let section_offsets: Vec<u64> = self
            .sections
            .iter()
            .map(|s| place(&s.data, &mut cursor))
            .collect();
        let names_offset = place(&names, &mut cursor);
        while cursor % 8 != 0 {
            body.push(0);
            cursor += 1;
        }
        let shoff = cursor as u64;

        let extended_count = shnum >= SHN_LORESERVE as usize || self.force_extended_count;
        let extended_index = shstrndx >= SHN_LORESERVE as usize || self.force_extended_index;

        let mut enc = Enc::new(class, self.order);
        // e_ident
        enc.bytes(&[0x7f, b'E', b'L', b'F']);
        enc.u8(match class {
            Class::Elf32 => 1,
            Class::Elf64 => 2,
        });
        enc.u8(match self.order {
            Order::Little => 1,
            Order::Big => 2,
        });
        enc.u8(1).u8(self.os_abi).u8(self.abi_version).bytes(&[0; 7]);
        enc.u16(self.e_type).u16(self.machine).u32(1);
        enc.word(self.entry).word(phoff as u64).word(shoff);
        enc.u32(self.flags).u16(ehsize as u16);
        enc.u16(class.phdr_size() as u16).u16(self.progs.len() as u16);
        enc.u16(class.shdr_size() as u16);
        enc.u16(if extended_count { 0 } else { shnum as u16 });
        enc.u16(if extended_index {
            SHN_XINDEX as u16
        } else {
            shstrndx as u16
        });
        assert_eq!(enc.buf.len(), ehsize);

        for (prog, offset) in self.progs.iter().zip(&prog_offsets) {
            let filesz = prog.data.len() as u64;
            match class {
                Class::Elf32 => {
                    enc.u32(prog.p_type).word(*offset).word(prog.vaddr).word(prog.paddr);
                    enc.word(filesz).word(prog.memsz).u32(prog.flags).word(prog.align);
                }
                Class::Elf64 => {
                    enc.u32(prog.p_type).u32(prog.flags).word(*offset).word(prog.vaddr);
                    enc.word(prog.paddr).word(filesz).word(prog.memsz).word(prog.align);
                }
            }
        }
        enc.bytes(&body);
        assert_eq!(enc.buf.len() as u64, shoff);

        // Section 0 carries the extended count and index.
        let shdr = |enc: &mut Enc, name: u32, s: &SectionDesc, offset: u64, size: u64| {
            enc.u32(name).u32(s.sh_type).word(s.flags).word(s.addr);
            enc.word(offset).word(size).u32(s.link).u32(s.info);
            enc.word(s.addralign).word(s.entsize);
        };
        let null = SectionDesc {
            sh_type: SHT_NULL,
            link: if extended_index { shstrndx as u32 } else { 0 },
            ..Default::default()
        };
        shdr(
            &mut enc,
            0,
            &null,
            0,
            if extended_count { shnum as u64 } else { 0 },
        );
        for ((desc, name), offset) in self.sections.iter().zip(&name_offsets).zip(&section_offsets) {
            let size = desc.size.unwrap_or(desc.data.len() as u64);
            shdr(&mut enc, *name, desc, *offset, size);
        }
        let padding = SectionDesc::default();
        for _ in 0..self.padding_sections {
            shdr(&mut enc, 0, &padding, 0, 0);
        }
        if !self.without_shstrtab {
            let desc = SectionDesc::new(".shstrtab", SHT_STRTAB, Vec::new());
            shdr(&mut enc, shstrtab_name, &desc, names_offset, names.len() as u64);
        }

        Image {
            bytes: enc.finish(),
            class,
            order: self.order,
            phoff: phoff as u64,
            shoff,
            shnum,
            shstrndx,
        }
    }
}

/// Encodes a symbol table entry.
pub fn symbol(
    class: Class,
    order: Order,
    name: u32,
    info: u8,
    other: u8,
    shndx: u16,
    value: u64,
    size: u64,
) -> Vec<u8> {
    let mut enc = Enc::new(class, order);
    match class {
        Class::Elf32 => {
            enc.u32(name).word(value).word(size).u8(info).u8(other).u16(shndx);
        }
        Class::Elf64 => {
            enc.u32(name).u8(info).u8(other).u16(shndx).word(value).word(size);
        }
    }
    enc.finish()
}

/// Builds the contents of an `SHF_COMPRESSED` section holding `plain`.
pub fn compressed(class: Class, order: Order, plain: &[u8], align: u64) -> Vec<u8> {
    let mut enc = Enc::new(class, order);
    enc.u32(ELFCOMPRESS_ZLIB as u32);
    if class == Class::Elf64 {
        enc.u32(0);
    }
    enc.word(plain.len() as u64).word(align);
    let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
    zlib.write_all(plain).unwrap();
    enc.bytes(&zlib.finish().unwrap());
    enc.finish()
}

/// Flags of a compressed section.
pub fn compressed_flags() -> u64 {
    SHF_COMPRESSED as u64
}

/// A string table blob and the offsets of its entries.
pub fn strtab(names: &[&str]) -> (Vec<u8>, Vec<u32>) {
    let mut blob = vec![0u8];
    let mut offsets = Vec::with_capacity(names.len());
    for name in names {
        offsets.push(blob.len() as u32);
        blob.extend_from_slice(name.as_bytes());
        blob.push(0);
    }
    (blob, offsets)
}

pub fn init_logger() {
    #[cfg(feature = "log")]
    let _ = env_logger::builder().is_test(true).try_init();
}
