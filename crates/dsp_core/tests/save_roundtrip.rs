mod common;

use std::io::Cursor;

use common::{CURRENT, Fixture, LEGACY};
use dsp_core::layout::{ByteRange, SectionId};
use dsp_core::{GameSave, GameVersion, RecordType};

#[test]
fn unmodified_save_reencodes_identically() {
    for version in [LEGACY, CURRENT, GameVersion::new(0, 8, 0, 0)] {
        let bytes = Fixture::at(version).build();
        let save = GameSave::from_bytes(&bytes).expect("decode");
        assert_eq!(save.to_bytes().expect("encode"), bytes, "version {version}");
    }
}

#[test]
fn decode_and_encode_through_io() {
    let bytes = Fixture::default().build();
    let save = dsp_core::decode(Cursor::new(bytes.clone())).expect("decode");
    let mut out = Vec::new();
    dsp_core::encode(&save, &mut out).expect("encode");
    assert_eq!(out, bytes);
}

#[test]
fn older_format_versions_roundtrip() {
    for format_version in [5, 6] {
        let fixture = Fixture {
            format_version,
            ..Fixture::default()
        };
        let bytes = fixture.build();
        let save = GameSave::from_bytes(&bytes).expect("decode");
        assert_eq!(save.header.sandbox_mode, None);
        assert_eq!(save.header.peace_mode.is_some(), format_version == 6);
        assert_eq!(save.to_bytes().expect("encode"), bytes);
    }
}

#[test]
fn trailing_bytes_are_kept_as_tail() {
    let fixture = Fixture {
        trailing: vec![0xde, 0xad, 0xbe, 0xef],
        ..Fixture::default()
    };
    let bytes = fixture.build();
    let save = GameSave::from_bytes(&bytes).expect("decode");
    assert_eq!(save.trailing, fixture.trailing);
    assert_eq!(
        save.layout().section(SectionId::Tail),
        Some(ByteRange::new(bytes.len() - 4, bytes.len()))
    );
    assert_eq!(save.to_bytes().expect("encode"), bytes);
}

#[test]
fn layout_tiles_the_file() {
    let bytes = Fixture::default().build();
    let save = GameSave::from_bytes(&bytes).expect("decode");
    let layout = save.layout();
    layout.validate().expect("layout");
    assert_eq!(layout.file_len, bytes.len());
    assert_eq!(layout.section(SectionId::Tail), None);

    let account = layout.section(SectionId::Account).expect("account section");
    assert_eq!(account, save.account.span());
    assert_eq!(account.len(), 4 + "Icarus".len() + 4);
    assert_eq!(
        layout.section(SectionId::GameData),
        Some(ByteRange::new(account.end, bytes.len()))
    );
}

#[test]
fn encoded_length_matches_stored_file_length() {
    let bytes = Fixture::default().build();
    let save = GameSave::from_bytes(&bytes).expect("decode");
    assert_eq!(save.encoded_length().expect("length"), bytes.len() - 14);
    assert_eq!(save.header.file_length, (bytes.len() - 14) as i64);
}

#[test]
fn stale_file_length_is_preserved_until_recomputed() {
    let fixture = Fixture {
        file_length: Some(9),
        ..Fixture::default()
    };
    let bytes = fixture.build();
    let mut save = GameSave::from_bytes(&bytes).expect("decode");
    assert_eq!(save.header.file_length, 9);
    assert_eq!(save.to_bytes().expect("encode"), bytes);

    save.recompute_file_length().expect("recompute");
    let fixed = save.to_bytes().expect("encode");
    assert_eq!(&fixed[6..14], &((bytes.len() - 14) as i64).to_le_bytes());
    assert_eq!(&fixed[14..], &bytes[14..]);
}

#[test]
fn account_section_from_the_sample() {
    let account = [0u8, 0, 0, 0, 42, 0, 0, 0];
    let record = dsp_core::codec::decode_record(RecordType::Account, &account, CURRENT)
        .expect("decode account");
    assert_eq!(record.str("user_name"), Some(""));
    assert_eq!(record.int("user_id"), Some(42));
    let encoded = dsp_core::codec::encode_record(&record, CURRENT, &Default::default())
        .expect("encode account");
    assert_eq!(encoded, account);

    let fixture = Fixture {
        user_name: String::new(),
        user_id: 42,
        ..Fixture::default()
    };
    let bytes = fixture.build();
    let save = GameSave::from_bytes(&bytes).expect("decode");
    assert_eq!(save.header.format_version, 7);
    assert_eq!(save.version(), GameVersion::new(0, 10, 33, 27005));
    assert_eq!(save.user_name(), Some(""));
    assert_eq!(save.account.int("user_id"), Some(42));
    let span = save.account.span();
    assert_eq!(&bytes[span.start..span.end], &account);
    assert_eq!(save.to_bytes().expect("encode"), bytes);
}
