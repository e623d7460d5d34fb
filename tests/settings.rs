use std::fs;

use timecourse::factory::FactoryOptions;
use timecourse::settings::Settings;

#[test]
fn file_settings_override_defaults() {
    let path = std::env::temp_dir().join(format!("timecourse-settings-{}.toml", std::process::id()));
    fs::write(
        &path,
        r#"
log_filter = "timecourse=debug"

[factory]
legacy_maps_allowed = true
legacy_grammar = true

[time_axis]
named_stages = true
stage_names = ["cleavage", "blastula"]
"#,
    )
    .unwrap();
    let settings = Settings::load(Some(path.as_path())).expect("settings load");
    fs::remove_file(&path).ok();
    assert_eq!(settings.log_filter, "timecourse=debug");
    assert!(settings.factory.legacy_maps_allowed);
    assert!(settings.factory.legacy_grammar);
    // untouched keys keep their defaults
    assert!(settings.factory.serial_number_required);
    assert!(!settings.factory.meta_dataset);
    assert_eq!(settings.time_axis.display_time(1), "blastula");
    assert_eq!(settings.time_axis.display_time(4), "stage 4");
}

#[test]
fn missing_file_is_a_config_error() {
    let path = std::env::temp_dir().join("timecourse-settings-does-not-exist.toml");
    assert!(Settings::load(Some(path.as_path())).is_err());
}

#[test]
fn option_presets() {
    let modern = FactoryOptions::modern();
    assert!(!modern.legacy_maps_allowed && modern.serial_number_required && !modern.legacy_grammar);
    assert_eq!(FactoryOptions::default(), modern);
    let legacy = FactoryOptions::legacy().for_meta();
    assert!(legacy.legacy_maps_allowed && !legacy.serial_number_required && legacy.legacy_grammar);
    assert!(legacy.meta_dataset);
}
