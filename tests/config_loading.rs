use evcal::config::Config;

#[test]
fn test_load_or_default_only_forgives_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    // 1. No file yet: defaults
    unsafe { std::env::set_var("EVCAL_CONFIG", &path) };
    let config = Config::load_or_default().unwrap();
    assert_eq!(config.utc_offset_minutes, 0);
    assert!(config.events_file.is_none());

    // 2. Broken file: error naming it
    std::fs::write(&path, "calendars = \"not a list\"").unwrap();
    let err = Config::load_or_default().unwrap_err();
    assert!(format!("{:#}", err).contains("config.toml"));

    // 3. Valid file: its values
    std::fs::write(&path, "utc_offset_minutes = -300\n").unwrap();
    assert_eq!(Config::load_or_default().unwrap().utc_offset_minutes, -300);

    unsafe { std::env::remove_var("EVCAL_CONFIG") };
}
