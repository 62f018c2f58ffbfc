use std::path::Path;

use relcore::{config::TranslatorConfig, error::LowerError};

#[test]
fn defaults() {
    let config = TranslatorConfig::default();
    assert_eq!(config.printer.width, relterm::printer::DEFAULT_WIDTH);
    assert!(config.lowering.reset_names);
    assert!(config.lowering.field_typing);
    assert_eq!(TranslatorConfig::from_toml_str("").unwrap(), config);
}

#[test]
fn partial_tables_keep_other_defaults() {
    let config = TranslatorConfig::from_toml_str(
        r#"
        [printer]
        width = 40

        [lowering]
        field_typing = false
        "#,
    )
    .unwrap();
    assert_eq!(config.printer.width, 40);
    assert!(config.lowering.reset_names);
    assert!(!config.lowering.field_typing);
}

#[test]
fn invalid_configuration_is_reported() {
    let err = TranslatorConfig::from_toml_str("[printer]\nwidth = \"wide\"\n").unwrap_err();
    assert!(matches!(err, LowerError::Config { ref file, .. } if file == "<inline>"));

    let err = TranslatorConfig::from_file(Path::new("/nonexistent/relcore.toml")).unwrap_err();
    assert!(err.is_io());
}

#[test]
fn configuration_file_round_trip() {
    let path = std::env::temp_dir().join(format!("relcore-config-{}.toml", std::process::id()));
    std::fs::write(&path, "[lowering]\nreset_names = false\n").unwrap();
    let config = TranslatorConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(!config.lowering.reset_names);
    assert_eq!(config.printer.width, relterm::printer::DEFAULT_WIDTH);
}
