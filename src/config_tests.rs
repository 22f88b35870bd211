use super::*;

fn write_file(path: &Path, contents: &str) {
    std::fs::write(path, contents.as_bytes()).expect("write file");
}

#[test]
fn default_config_round_trips_and_validates() {
    let text = serde_json::to_string_pretty(&default_config()).expect("serialize config");
    let config: DiscoveryConfig = serde_json::from_str(&text).expect("parse config");
    validate_config(&config).expect("stub is valid");
    assert_eq!(config, default_config());
    assert_eq!(config.from_version, "7.2");
}

#[test]
fn omitted_fields_take_defaults() {
    let config: DiscoveryConfig =
        serde_json::from_str(r#"{"schema_version": 1}"#).expect("parse config");
    assert_eq!(config.from_version, DEFAULT_FROM_VERSION);
    assert_eq!(config.selected_services().unwrap(), Service::ALL.to_vec());
    assert!(config
        .skip_properties(Service::KafkaConnect)
        .contains("bootstrap.servers"));
    assert_eq!(config.skip_properties, default_config().skip_properties);
}

#[test]
fn default_skip_lists_name_known_services() {
    let config = default_config();
    validate_config(&config).expect("defaults are valid");
    assert!(config
        .skip_properties(Service::KafkaBroker)
        .contains("broker.id"));
    assert!(config.skip_properties(Service::Zookeeper).is_empty());
}

#[test]
fn explicit_skip_lists_replace_defaults() {
    let config: DiscoveryConfig = serde_json::from_str(
        r#"{"schema_version": 1, "skip_properties": {"kafka_connect": ["plugin.path"]}}"#,
    )
    .expect("parse config");
    assert_eq!(
        config.skip_properties(Service::KafkaConnect),
        BTreeSet::from(["plugin.path".to_string()])
    );
    assert!(config.skip_properties(Service::KafkaBroker).is_empty());
}

#[test]
fn unknown_fields_are_rejected() {
    let parsed = serde_json::from_str::<DiscoveryConfig>(
        r#"{"schema_version": 1, "from_versoin": "7.1"}"#,
    );
    assert!(parsed.is_err());
}

#[test]
fn validation_rejects_bad_values() {
    let mut config = default_config();
    config.schema_version = 2;
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.from_version = " ".to_string();
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.services = vec!["mds".to_string()];
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config
        .skip_properties
        .insert("kafka_conect".to_string(), vec!["plugin.path".to_string()]);
    assert!(validate_config(&config).is_err());
}

#[test]
fn selected_services_follow_discovery_order() {
    let mut config = default_config();
    config.services = vec!["kafka_connect".to_string(), "zookeeper".to_string()];
    assert_eq!(
        config.selected_services().unwrap(),
        vec![Service::Zookeeper, Service::KafkaConnect]
    );
}

#[test]
fn skip_properties_are_per_service() {
    let mut config = default_config();
    config.skip_properties.insert(
        "kafka_connect".to_string(),
        vec!["plugin.path".to_string(), "bootstrap.servers".to_string()],
    );
    let skip = config.skip_properties(Service::KafkaConnect);
    assert!(skip.contains("plugin.path"));
    assert_eq!(skip.len(), 2);
    assert!(config.skip_properties(Service::Zookeeper).is_empty());
}

#[test]
fn explicit_config_is_loaded_and_validated() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    write_file(
        &path,
        r#"{"schema_version": 1, "from_version": "7.1", "ssh": {"user": "ops", "sudo": true}}"#,
    );
    let config = effective_config(Some(&path)).expect("load config");
    assert_eq!(config.from_version, "7.1");
    assert_eq!(config.ssh.user.as_deref(), Some("ops"));
    assert!(config.ssh.sudo);

    write_file(&path, r#"{"schema_version": 9}"#);
    assert!(effective_config(Some(&path)).is_err());
}

#[test]
fn write_then_load_preserves_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("config.json");
    let mut config = default_config();
    config.services = vec!["ksql".to_string()];
    write_config(&path, &config).expect("write config");
    assert_eq!(load_config(&path).expect("load config"), config);
}
