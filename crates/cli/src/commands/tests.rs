use super::*;
use keypoint_config::LogLevel;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn write_book(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

fn test_manager() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, manager)
}

#[test]
fn test_load_book_defaults_to_sample() {
    let book = load_book(None).unwrap();
    assert_eq!(book, sample_book());
}

#[test]
fn test_load_book_from_file() {
    let file = write_book(
        r#"{
            "id": 5,
            "title": "Essentialism",
            "cover": "covers/essentialism.png",
            "key_points": [
                { "id": 51, "position": 0, "title": "Less but better", "audio": "a/51.mp3" },
                { "id": 52, "position": 1, "title": "Explore", "audio": "a/52.mp3" }
            ]
        }"#,
    );

    let book = load_book(file.path().to_str()).unwrap();
    assert_eq!(book.title, "Essentialism");
    assert_eq!(book.total_key_points(), 2);
}

#[test]
fn test_load_book_rejects_gapped_positions() {
    let file = write_book(
        r#"{
            "id": 6,
            "title": "Gaps",
            "cover": "c.png",
            "key_points": [
                { "id": 61, "position": 0, "title": "One", "audio": "a/61.mp3" },
                { "id": 62, "position": 4, "title": "Five", "audio": "a/62.mp3" }
            ]
        }"#,
    );

    let error = load_book(file.path().to_str()).unwrap_err();
    assert!(error.to_string().contains("Invalid book"));
}

#[test]
fn test_load_book_rejects_empty_book() {
    let file = write_book(r#"{ "id": 7, "title": "Empty", "cover": "c.png", "key_points": [] }"#);
    assert!(load_book(file.path().to_str()).is_err());
}

#[test]
fn test_load_book_missing_file() {
    let error = load_book(Some("/definitely/not/here.json")).unwrap_err();
    assert!(error.to_string().contains("not found"));
}

#[test]
fn test_load_book_garbage() {
    let file = write_book("not json at all");
    assert!(load_book(file.path().to_str()).is_err());
}

#[test]
fn test_render_config_is_toml() {
    let rendered = render_config(&Config::default()).unwrap();
    assert!(rendered.contains("[player]"));
    assert!(rendered.contains("seek_forward_ms = 10000"));
}

#[test]
fn test_config_init_and_reset() {
    let (_temp_dir, manager) = test_manager();
    let matches = crate::build_cli().get_matches_from(["keypoint", "config", "init"]);
    let (_, config_matches) = matches.subcommand().unwrap();

    run_config_command(&manager, config_matches).unwrap();
    assert!(manager.config_path().exists());

    manager
        .update(|config| config.app.log_level = LogLevel::Trace)
        .unwrap();

    let matches = crate::build_cli().get_matches_from(["keypoint", "config", "reset"]);
    let (_, config_matches) = matches.subcommand().unwrap();
    run_config_command(&manager, config_matches).unwrap();

    assert_eq!(manager.load().unwrap(), Config::default());
}
