use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use dsp_core::GameSave;
use serde_json::Value;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn fixture_path(name: &str) -> String {
    workspace_root()
        .join("tests/fixtures")
        .join(name)
        .to_string_lossy()
        .to_string()
}

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_dsp-save"))
        .args(args)
        .output()
        .expect("failed to run dsp-save CLI")
}

fn temp_output_path(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{}_{}.dsv", std::process::id(), nanos))
}

#[test]
fn default_output_is_a_text_tree() {
    let output = run_cli(&[fixture_path("current.dsv").as_str()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Dyson Sphere Program save (format 7, game 0.10.33.27005)"));
    assert!(stdout.contains("<AccountData ["));
}

#[test]
fn json_output_parses() {
    let output = run_cli(&["--json", &fixture_path("legacy.dsv")]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: Value = serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(json["game_version"], "0.9.24.11000");
    assert!(json["sandbox_mode"].is_null());
    assert_eq!(json["game_data"]["game_name"], "Sphere One");
}

#[test]
fn layout_and_veins_modes() {
    let output = run_cli(&["--layout", &fixture_path("current.dsv")]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("file length: 683 bytes"));

    let output = run_cli(&["--veins", &fixture_path("current.dsv")]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Planet 103"));
    assert!(stdout.contains("Crude Oil"));

    let output = run_cli(&["--veins", "--json", &fixture_path("current.dsv")]);
    let json: Value = serde_json::from_slice(&output.stdout).expect("vein json");
    assert_eq!(json[0]["veins"]["Iron Ore"], 1500);
}

#[test]
fn edits_are_written_with_recomputed_length() {
    let out = temp_output_path("dsp_save_edit");
    let out_str = out.to_string_lossy().to_string();
    let output = run_cli(&[
        "--set-user-name",
        "Daedalus Prime",
        "--set-sand",
        "999999",
        "--output",
        &out_str,
        &fixture_path("current.dsv"),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Wrote edited save to"));

    let bytes = fs::read(&out).expect("edited save should exist");
    let _ = fs::remove_file(&out);
    let save = GameSave::from_bytes(&bytes).expect("edited save should parse");
    assert_eq!(save.user_name(), Some("Daedalus Prime"));
    assert_eq!(save.sand_count(), Some(999_999));
    assert_eq!(save.header.file_length as usize, bytes.len() - 14);
    assert_eq!(bytes.len(), 683 + "Daedalus Prime".len() - "Icarus".len());
}

#[test]
fn edits_require_output_and_output_requires_edits() {
    let output = run_cli(&["--set-sand", "5", &fixture_path("current.dsv")]);
    assert_eq!(output.status.code(), Some(2));

    let out = temp_output_path("dsp_save_unused");
    let out_str = out.to_string_lossy().to_string();
    let output = run_cli(&["--output", &out_str, &fixture_path("current.dsv")]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!out.exists());
}

#[test]
fn unreadable_or_corrupt_saves_exit_one() {
    let output = run_cli(&["/nonexistent/dir/save.dsv"]);
    assert_eq!(output.status.code(), Some(1));

    let corrupt = temp_output_path("dsp_save_corrupt");
    let bytes = fs::read(fixture_path("current.dsv")).expect("fixture");
    fs::write(&corrupt, &bytes[..100]).expect("write corrupt fixture");
    let corrupt_str = corrupt.to_string_lossy().to_string();
    let output = run_cli(&[corrupt_str.as_str()]);
    let _ = fs::remove_file(&corrupt);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unexpected end of data"));
}
