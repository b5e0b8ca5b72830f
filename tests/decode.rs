mod common;

use common::{Class, ElfBuilder, Order, ProgDesc, SectionDesc};
use elf_decoder::{
    ElfObject, Error,
    elf::{ElfClass, Endian, PT_LOAD, PT_NOTE, ProgFlags, SHT_PROGBITS},
    input::{ElfBinary, ElfFile, ElfReader, IntoElfReader},
};
use rstest::rstest;
use std::io::{Read, Seek, SeekFrom};

fn sample(class: Class, order: Order) -> ElfBuilder {
    let mut builder = ElfBuilder::new(class, order);
    builder.e_type = 3;
    builder.machine = 0xb7;
    builder.entry = 0x1234_5678;
    builder.flags = 0x5000_0400;
    builder.os_abi = 3;
    builder.abi_version = 1;
    builder.prog(ProgDesc {
        p_type: PT_LOAD,
        flags: 0x5,
        vaddr: 0x10000,
        paddr: 0x20000,
        memsz: 0x2000,
        align: 0x1000,
        data: (0u8..=99).collect(),
    });
    builder.prog(ProgDesc {
        p_type: PT_NOTE,
        flags: 0x4,
        vaddr: 0x30000,
        paddr: 0x30000,
        memsz: 4,
        align: 4,
        data: vec![9, 8, 7, 6],
    });
    let mut text = SectionDesc::new(".text", SHT_PROGBITS, vec![0x90; 16]);
    text.flags = 0x6;
    text.addr = 0x401000;
    text.addralign = 16;
    builder.section(text);
    builder.section(SectionDesc::new(".data", SHT_PROGBITS, vec![1, 2, 3]));
    builder
}

#[rstest]
#[case(Class::Elf32, Order::Little)]
#[case(Class::Elf32, Order::Big)]
#[case(Class::Elf64, Order::Little)]
#[case(Class::Elf64, Order::Big)]
fn header_fields_round_trip(#[case] class: Class, #[case] order: Order) {
    common::init_logger();
    let image = sample(class, order).build();
    let object = ElfObject::parse(&image.bytes).unwrap();

    let ident = object.ident();
    assert_eq!(
        ident.class,
        match class {
            Class::Elf32 => ElfClass::Elf32,
            Class::Elf64 => ElfClass::Elf64,
        }
    );
    assert_eq!(
        ident.endian,
        match order {
            Order::Little => Endian::Little,
            Order::Big => Endian::Big,
        }
    );
    assert_eq!(ident.version, 1);
    assert_eq!(ident.os_abi, 3);
    assert_eq!(ident.abi_version, 1);

    let header = object.header();
    assert_eq!(header.e_type(), 3);
    assert!(header.is_dylib());
    assert_eq!(header.machine(), 0xb7);
    assert_eq!(header.entry(), 0x1234_5678);
    assert_eq!(header.flags(), 0x5000_0400);

    let names: Vec<&str> = object.sections().iter().map(|s| s.name()).collect();
    assert_eq!(names, ["", ".text", ".data", ".shstrtab"]);
    let text = object.section(".text").unwrap();
    assert_eq!(text.addr(), 0x401000);
    assert_eq!(text.addralign(), 16);
    assert_eq!(text.size(), 16);
    assert_eq!(text.file_size(), 16);
    assert_eq!(text.data().unwrap(), vec![0x90; 16]);
    assert_eq!(object.section(".data").unwrap().data().unwrap(), [1, 2, 3]);
    assert!(object.section(".bss").is_none());
}

#[rstest]
#[case(Class::Elf32, Order::Little)]
#[case(Class::Elf32, Order::Big)]
#[case(Class::Elf64, Order::Little)]
#[case(Class::Elf64, Order::Big)]
fn program_headers_round_trip(#[case] class: Class, #[case] order: Order) {
    let image = sample(class, order).build();
    let object = ElfObject::parse(&image.bytes).unwrap();
    let progs = object.progs();
    assert_eq!(progs.len(), 2);

    let load = &progs[0];
    assert_eq!(load.p_type(), PT_LOAD);
    assert_eq!(load.flags(), ProgFlags::R | ProgFlags::X);
    assert_eq!(load.vaddr(), 0x10000);
    assert_eq!(load.paddr(), 0x20000);
    assert_eq!(load.filesz(), 100);
    assert_eq!(load.memsz(), 0x2000);
    assert_eq!(load.align(), 0x1000);

    let mut buf = [0u8; 8];
    assert_eq!(load.read_at(&mut buf, 96).unwrap(), 4);
    assert_eq!(&buf[..4], &[96, 97, 98, 99]);

    let mut reader = load.open();
    reader.seek(SeekFrom::Start(10)).unwrap();
    let mut rest = Vec::new();
    reader.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, (10u8..=99).collect::<Vec<_>>());

    let mut note = Vec::new();
    progs[1].open().read_to_end(&mut note).unwrap();
    assert_eq!(note, [9, 8, 7, 6]);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
#[case(3)]
fn corrupted_magic_is_rejected(#[case] idx: usize) {
    let mut image = sample(Class::Elf64, Order::Little).build();
    for value in [0u8, 0x45, 0xff] {
        image.bytes[idx] = value;
        if image.bytes[..4] == [0x7f, b'E', b'L', b'F'] {
            continue;
        }
        assert!(matches!(
            ElfObject::parse(&image.bytes),
            Err(Error::ParseIdent { .. })
        ));
    }
}

#[rstest]
#[case(4, 0)]
#[case(4, 3)]
#[case(5, 0)]
#[case(5, 3)]
#[case(6, 0)]
#[case(6, 2)]
fn unknown_identification_values_are_rejected(#[case] idx: usize, #[case] value: u8) {
    let mut image = sample(Class::Elf32, Order::Big).build();
    image.bytes[idx] = value;
    assert!(matches!(
        ElfObject::parse(&image.bytes),
        Err(Error::ParseIdent { .. })
    ));
}

#[test]
fn header_version_must_match_identification() {
    let mut image = sample(Class::Elf64, Order::Little).build();
    // e_version
    image.put_u32(20, 2);
    assert!(matches!(
        ElfObject::parse(&image.bytes),
        Err(Error::ParseEhdr { .. })
    ));
}

#[rstest]
#[case(10)]
#[case(20)]
#[case(63)]
fn truncated_header_is_reported(#[case] len: usize) {
    let image = sample(Class::Elf64, Order::Little).build();
    assert!(matches!(
        ElfObject::parse(&ElfBinary::new("truncated", &image.bytes[..len])),
        Err(Error::Truncated { .. })
    ));
}

#[test]
fn truncated_section_table_is_reported() {
    let image = sample(Class::Elf64, Order::Big).build();
    let cut = image.shdr_at(2) + 10;
    assert!(matches!(
        ElfObject::parse(&ElfBinary::new("truncated", &image.bytes[..cut])),
        Err(Error::Truncated { .. })
    ));
}

#[rstest]
#[case(Class::Elf32)]
#[case(Class::Elf64)]
fn negative_table_offset_is_rejected(#[case] class: Class) {
    let mut image = sample(class, Order::Little).build();
    let shoff_at = match class {
        Class::Elf32 => 32,
        Class::Elf64 => 40,
    };
    let negative = match class {
        Class::Elf32 => 0x8000_0000,
        Class::Elf64 => 0x8000_0000_0000_0000,
    };
    image.put_word(shoff_at, negative);
    let result = ElfObject::parse(&image.bytes);
    match class {
        // 32-bit offsets are unsigned words and cannot be negative once widened.
        Class::Elf32 => assert!(matches!(result, Err(Error::Truncated { .. }))),
        Class::Elf64 => assert!(matches!(result, Err(Error::ParseEhdr { .. }))),
    }
}

#[test]
fn zero_section_offset_with_sections_is_rejected() {
    let mut image = sample(Class::Elf64, Order::Little).build();
    image.put_word(40, 0);
    assert!(matches!(
        ElfObject::parse(&image.bytes),
        Err(Error::ParseEhdr { .. })
    ));
}

#[test]
fn string_table_index_out_of_range_is_rejected() {
    let mut image = sample(Class::Elf32, Order::Little).build();
    let at = image.e_shstrndx_at();
    image.put_u16(at, image.shnum as u16);
    assert!(matches!(
        ElfObject::parse(&image.bytes),
        Err(Error::ParseEhdr { .. })
    ));
}

#[rstest]
#[case(Class::Elf32, 39)]
#[case(Class::Elf64, 63)]
fn undersized_section_entries_are_rejected(#[case] class: Class, #[case] size: u16) {
    let mut image = sample(class, Order::Big).build();
    let at = image.e_shentsize_at();
    image.put_u16(at, size);
    assert!(matches!(
        ElfObject::parse(&image.bytes),
        Err(Error::ParseEhdr { .. })
    ));
}

#[rstest]
#[case(Order::Little)]
#[case(Order::Big)]
fn negative_section_offset_fails_whole_decode(#[case] order: Order) {
    let mut image = sample(Class::Elf64, order).build();
    let at = image.sh_offset_at(2);
    image.put_word(at, 0xffff_ffff_ffff_fff0);
    assert!(matches!(
        ElfObject::parse(&image.bytes),
        Err(Error::ParseShdr { .. })
    ));
}

#[test]
fn negative_section_size_fails_whole_decode() {
    let mut image = sample(Class::Elf64, Order::Big).build();
    let at = image.sh_size_at(1);
    image.put_word(at, 1 << 63);
    assert!(matches!(
        ElfObject::parse(&image.bytes),
        Err(Error::ParseShdr { .. })
    ));
}

#[test]
fn negative_segment_offset_fails_whole_decode() {
    let mut image = sample(Class::Elf64, Order::Little).build();
    // p_offset of the second program header
    let at = image.phdr_at(1) + 8;
    image.put_word(at, u64::MAX);
    assert!(matches!(
        ElfObject::parse(&image.bytes),
        Err(Error::ParsePhdr { .. })
    ));
}

#[test]
fn file_without_tables_decodes() {
    let mut builder = ElfBuilder::new(Class::Elf64, Order::Little);
    builder.without_shstrtab = true;
    let mut image = builder.build();
    // Drop the table entirely: no offset, no entries.
    image.put_word(40, 0);
    let at = image.e_shnum_at();
    image.put_u16(at, 0);
    let object = ElfObject::parse(&image.bytes).unwrap();
    assert!(object.sections().is_empty());
    assert!(object.progs().is_empty());
}

#[test]
fn segment_views_are_lazy() {
    let mut builder = sample(Class::Elf64, Order::Little);
    builder.prog(ProgDesc {
        p_type: PT_LOAD,
        data: vec![0; 8],
        ..Default::default()
    });
    let mut image = builder.build();
    // Point the new segment past the end of the file; decoding still succeeds.
    let at = image.phdr_at(2) + 8;
    image.put_word(at, 0x10_0000);
    let object = ElfObject::parse(&image.bytes).unwrap();
    let mut buf = [0u8; 4];
    assert!(matches!(
        object.progs()[2].read_at(&mut buf, 0),
        Err(Error::Truncated { .. })
    ));
}

#[test]
fn named_sources_and_files() {
    let image = sample(Class::Elf32, Order::Little).build();
    let binary = ElfBinary::new("sample.so", &image.bytes);
    let object = ElfObject::parse(&binary).unwrap();
    assert_eq!(object.file_name(), "sample.so");

    let path = std::env::temp_dir().join(format!("elf_decoder_{}.so", std::process::id()));
    std::fs::write(&path, &image.bytes).unwrap();
    let file = ElfFile::from_path(path.to_str().unwrap()).unwrap();
    let from_file = ElfObject::parse(&file).unwrap();
    assert_eq!(from_file.sections().len(), object.sections().len());
    assert_eq!(
        from_file.section(".text").unwrap().data().unwrap(),
        object.section(".text").unwrap().data().unwrap()
    );
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn readers_from_paths_and_bytes() {
    let image = sample(Class::Elf64, Order::Big).build();
    let path = std::env::temp_dir().join(format!("elf_decoder_into_{}.so", std::process::id()));
    std::fs::write(&path, &image.bytes).unwrap();
    let path = path.to_str().unwrap().to_owned();

    let from_str = path.as_str().into_reader().unwrap();
    assert_eq!(from_str.size(), Some(image.bytes.len() as u64));
    let from_string = path.clone().into_reader().unwrap();
    let from_file = ElfFile::from_path(&path).unwrap().into_reader().unwrap();
    for file in [&from_str, &from_string, &from_file] {
        let object = ElfObject::parse(file).unwrap();
        assert_eq!(object.file_name(), path);
        assert_eq!(object.section(".data").unwrap().data().unwrap(), [1, 2, 3]);
    }

    let from_slice = image.bytes.as_slice().into_reader().unwrap();
    let from_vec = (&image.bytes).into_reader().unwrap();
    let from_binary = ElfBinary::new("sample.so", &image.bytes).into_reader().unwrap();
    assert_eq!(from_slice.shortname(), "<memory>");
    for binary in [&from_slice, &from_vec, &from_binary] {
        let object = ElfObject::parse(binary).unwrap();
        assert_eq!(object.progs().len(), 2);
        assert_eq!(object.section(".text").unwrap().size(), 16);
    }
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        ElfFile::from_path("/this/location/is/definitely/missing.so"),
        Err(Error::Io { .. })
    ));
}
