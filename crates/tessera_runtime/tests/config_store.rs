//! Integration tests for the config store.

use std::fs;
use std::path::PathBuf;

use tessera_runtime::{ConfigStore, LoadStatus, RuntimeError};

fn temp_config_path(tag: &str) -> PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("test_config_{tag}_{id}.toml"))
}

#[test]
fn test_missing_file_reports_not_found() {
    let path = temp_config_path("missing");
    let config = ConfigStore::open(&path);

    assert_eq!(config.load_status(), LoadStatus::FileNotFound);
    assert!(config.is_file_not_found());
    assert!(!config.is_loaded());
    assert!(config.last_error().is_some());
    assert_eq!(config.filters().count(), 0);

    drop(config);
    // Nothing was set, so nothing is written.
    assert!(!path.exists());
}

#[test]
fn test_set_save_reopen() {
    let path = temp_config_path("roundtrip");
    {
        let mut config = ConfigStore::open(&path);
        config.set("player", "health", &100).unwrap();
        config.set("player", "name", "ada").unwrap();
        config.set("world", "gravity", &9.81).unwrap();
        assert!(config.is_dirty());
        config.save().unwrap();
        assert!(!config.is_dirty());
    }

    let config = ConfigStore::open(&path);
    assert!(config.is_loaded());
    assert_eq!(config.get::<i32>("player", "health").unwrap(), 100);
    assert_eq!(config.get::<String>("player", "name").unwrap(), "ada");
    assert!((config.get::<f64>("world", "gravity").unwrap() - 9.81).abs() < f64::EPSILON);
    assert_eq!(config.filters().collect::<Vec<_>>(), vec!["player", "world"]);
    assert_eq!(config.keys("player").collect::<Vec<_>>(), vec!["health", "name"]);

    drop(config);
    fs::remove_file(&path).ok();
}

#[test]
fn test_lookup_errors() {
    let path = temp_config_path("errors");
    let mut config = ConfigStore::open(&path);
    config.set("player", "name", "ada").unwrap();

    assert!(matches!(
        config.get::<i32>("audio", "volume"),
        Err(RuntimeError::FilterNotFound(f)) if f == "audio"
    ));
    assert!(matches!(
        config.get::<i32>("player", "level"),
        Err(RuntimeError::KeyNotFound { key, .. }) if key == "level"
    ));
    assert!(matches!(
        config.get::<i32>("player", "name"),
        Err(RuntimeError::InvalidValue { .. })
    ));

    assert_eq!(config.get_or("player", "level", 1), 1);
    assert_eq!(config.get_or("player", "name", 7), 7);
    assert!(config.contains("player", "name"));
    assert!(!config.contains("player", "level"));

    drop(config);
    fs::remove_file(&path).ok();
}

#[test]
fn test_get_bool_is_lenient() {
    let path = temp_config_path("bools");
    fs::write(
        &path,
        r#"
[flags]
native = true
word = "True"
lower = "false"
digit = "1"
zero = 0
one = 1
junk = "yes"
number = 2
"#,
    )
    .unwrap();

    let config = ConfigStore::open(&path);
    assert!(config.get_bool("flags", "native").unwrap());
    assert!(config.get_bool("flags", "word").unwrap());
    assert!(!config.get_bool("flags", "lower").unwrap());
    assert!(config.get_bool("flags", "digit").unwrap());
    assert!(!config.get_bool("flags", "zero").unwrap());
    assert!(config.get_bool("flags", "one").unwrap());
    assert!(matches!(
        config.get_bool("flags", "junk"),
        Err(RuntimeError::InvalidValue { .. })
    ));
    assert!(matches!(
        config.get_bool("flags", "number"),
        Err(RuntimeError::InvalidValue { .. })
    ));

    drop(config);
    fs::remove_file(&path).ok();
}

#[test]
fn test_malformed_file_is_read_error() {
    let path = temp_config_path("malformed");
    fs::write(&path, "[player\nhealth = = 3\n").unwrap();

    let config = ConfigStore::open(&path);
    assert_eq!(config.load_status(), LoadStatus::ReadError);
    assert!(config.last_error().is_some());
    assert_eq!(config.filters().count(), 0);

    drop(config);
    // Untouched store leaves the file as it was.
    assert_eq!(fs::read_to_string(&path).unwrap(), "[player\nhealth = = 3\n");
    fs::remove_file(&path).ok();
}

#[test]
fn test_dirty_store_saves_on_drop() {
    let path = temp_config_path("drop");
    {
        let mut config = ConfigStore::open(&path);
        config.set("session", "ticks", &42).unwrap();
    }

    let config = ConfigStore::open(&path);
    assert_eq!(config.get::<u32>("session", "ticks").unwrap(), 42);

    drop(config);
    fs::remove_file(&path).ok();
}

#[test]
fn test_top_level_values_are_ignored() {
    let path = temp_config_path("toplevel");
    fs::write(&path, "version = 3\n\n[window]\nwidth = 1280\n").unwrap();

    let config = ConfigStore::open(&path);
    assert!(config.is_loaded());
    assert_eq!(config.filters().collect::<Vec<_>>(), vec!["window"]);
    assert_eq!(config.get::<u32>("window", "width").unwrap(), 1280);

    drop(config);
    fs::remove_file(&path).ok();
}

#[test]
fn test_reload_discards_unsaved_changes() {
    let path = temp_config_path("reload");
    fs::write(&path, "[window]\nwidth = 800\n").unwrap();

    let mut config = ConfigStore::open(&path);
    config.set("window", "width", &1920).unwrap();
    assert!(config.remove("window", "width"));
    assert!(!config.remove("window", "width"));
    config.set("window", "height", &600).unwrap();

    fs::write(&path, "[window]\nwidth = 1024\n").unwrap();
    config.reload();

    assert!(!config.is_dirty());
    assert_eq!(config.get::<u32>("window", "width").unwrap(), 1024);
    assert!(!config.contains("window", "height"));

    drop(config);
    fs::remove_file(&path).ok();
}
