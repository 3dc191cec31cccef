use std::io::Write;

use tempfile::NamedTempFile;

use adiflog::{Error, config::AdifConfig, core::store::MemoryQsoStore, normalize::LogDefaults, types::Callsign};

#[test]
fn empty_document_gives_defaults() {
    let config = AdifConfig::from_toml_str("").expect("parse");

    assert_eq!(config, AdifConfig::default());
    assert!(config.decoder.preserve_value_case);
    assert_eq!(config.decoder.sniff_bytes, 1024);
    assert!(!config.normalizer.reject_out_of_range_frequency);
    assert_eq!(config.encoder.program_id, "adiflog");
    assert_eq!(config.runtime.job_queue_bound, 64);
    assert_eq!(config.runtime.finished_retention, 1024);
}

#[test]
fn partial_tables_override_only_named_keys() {
    let config = AdifConfig::from_toml_str(
        r#"
        [decoder]
        preserve_value_case = false

        [normalizer]
        reject_out_of_range_frequency = true

        [encoder]
        program_id = "my-logger"

        [runtime]
        event_capacity = 16
        "#,
    )
    .expect("parse");

    assert!(!config.decoder.preserve_value_case);
    assert_eq!(config.decoder.sniff_bytes, 1024);
    assert!(config.normalizer.reject_out_of_range_frequency);
    assert_eq!(config.encoder.program_id, "my-logger");
    assert_eq!(config.runtime.event_capacity, 16);
    assert_eq!(config.runtime.job_queue_bound, 64);
}

#[test]
fn malformed_document_is_a_config_error() {
    let err = AdifConfig::from_toml_str("[decoder]\nsniff_bytes = \"lots\"").expect_err("bad type");

    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn load_reads_a_file_and_builds_an_importer() {
    let mut file = NamedTempFile::new().expect("tmp");
    writeln!(file, "[normalizer]\nreject_out_of_range_frequency = true").expect("write");

    let config = AdifConfig::load(file.path()).expect("load");
    let importer = config.importer(LogDefaults {
        station_callsign: Callsign::parse("N0CALL").expect("call"),
    });

    let text = "<CALL:5>K1ABC <QSO_DATE:8>20240115 <TIME_ON:4>1430 <MODE:2>FM <FREQ:7>146.520 <EOR>";
    let mut store = MemoryQsoStore::new();
    let report = importer.import_reader(text.as_bytes(), &mut store, 1).expect("import");
    assert_eq!(report.tally.invalid, 1);
}

#[test]
fn missing_file_is_a_config_error() {
    assert!(matches!(AdifConfig::load("/no/such/adiflog.toml"), Err(Error::Config(_))));
}
