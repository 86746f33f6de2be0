use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;

use dsp_core::layout::SectionId;
use dsp_core::{GameSave, GameVersion, VeinType};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures")
        .join(name)
}

#[test]
fn fixtures_roundtrip_byte_for_byte() {
    for name in ["current.dsv", "legacy.dsv"] {
        let path = fixture_path(name);
        let bytes = fs::read(&path).expect("failed to read fixture");
        let file = File::open(&path).expect("failed to open fixture");

        let save = dsp_core::decode(BufReader::new(file)).expect("failed to decode fixture");
        save.layout().validate().expect("invalid section layout");
        assert_eq!(save.layout().section(SectionId::Tail), None);
        assert_eq!(save.encoded_length().expect("length"), bytes.len() - 14);
        assert_eq!(save.to_bytes().expect("failed to encode"), bytes, "{name}");
    }
}

#[test]
fn current_fixture_contents() {
    let bytes = fs::read(fixture_path("current.dsv")).expect("failed to read fixture");
    let save = GameSave::from_bytes(&bytes).expect("decode");
    assert_eq!(save.version(), GameVersion::new(0, 10, 33, 27005));
    assert_eq!(save.header.peace_mode, Some(true));
    assert_eq!(save.header.sandbox_mode, Some(false));
    assert_eq!(save.user_name(), Some("Icarus"));
    assert_eq!(save.game_name(), Some("Sphere One"));
    assert_eq!(save.sand_count(), Some(125_000));
    assert_eq!(save.factories().count(), 2);

    let totals = save.vein_totals(1).expect("totals");
    assert_eq!(totals.get(&VeinType::Oil), Some(&90_000));
    assert_eq!(totals.get(&VeinType::Unknown(15)), Some(&12));
    assert!(save.check_counts().expect("check").is_empty());
}

#[test]
fn legacy_fixture_matches_current_totals() {
    let current = GameSave::from_bytes(&fs::read(fixture_path("current.dsv")).expect("read"))
        .expect("decode current");
    let legacy = GameSave::from_bytes(&fs::read(fixture_path("legacy.dsv")).expect("read"))
        .expect("decode legacy");
    assert_eq!(legacy.header.sandbox_mode, None);
    for index in 0..2 {
        assert_eq!(
            legacy.vein_totals(index).expect("legacy totals"),
            current.vein_totals(index).expect("current totals")
        );
    }
}
