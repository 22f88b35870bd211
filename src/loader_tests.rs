use super::*;
use crate::gateway::FixtureGateway;
use crate::locator::DEFAULT_KEY;

fn gateway() -> FixtureGateway {
    let fixture = r#"{
        "hosts": {
            "connect-1": {
                "units": {"confluent-kafka-connect": {
                    "ExecStart": "{ path=/usr/bin/connect-distributed ; argv[]=/usr/bin/connect-distributed /etc/kafka/connect-distributed.properties ; }",
                    "User": "cp-kafka-connect"
                }},
                "files": {"/etc/kafka/connect-distributed.properties": "group.id=connect-cluster\nlisteners=http://0.0.0.0:8083\n"}
            },
            "connect-2": {
                "files": {"/etc/kafka/connect-distributed.properties": "group.id=connect-cluster\n"}
            },
            "connect-3": {},
            "zk-1": {
                "units": {"confluent-zookeeper": {"ExecStart": "/usr/bin/zookeeper-server-start"}}
            }
        }
    }"#;
    FixtureGateway::from_slice(fixture.as_bytes()).unwrap()
}

fn hosts(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[test]
fn loads_primary_file_for_every_answering_host() {
    let loaded = load_service(
        &gateway(),
        Service::KafkaConnect,
        &hosts(&["connect-1", "connect-2", "connect-3"]),
    );
    assert_eq!(loaded.facts.unwrap().user(), Some("cp-kafka-connect"));
    assert_eq!(loaded.files.len(), 2);
    assert_eq!(
        loaded.files["connect-1"][DEFAULT_KEY]["listeners"],
        "http://0.0.0.0:8083"
    );
    assert_eq!(loaded.files["connect-2"][DEFAULT_KEY].len(), 1);
    assert!(!loaded.files.contains_key("connect-3"));
}

#[test]
fn empty_host_list_loads_nothing() {
    let loaded = load_service(&gateway(), Service::KafkaConnect, &[]);
    assert!(loaded.facts.is_none());
    assert!(loaded.files.is_empty());
}

#[test]
fn command_without_properties_keeps_facts_only() {
    let loaded = load_service(&gateway(), Service::Zookeeper, &hosts(&["zk-1"]));
    assert!(loaded.facts.is_some());
    assert!(loaded.files.is_empty());
    assert!(loaded.host_files("zk-1").is_empty());
}

#[test]
fn unreachable_first_host_loads_nothing() {
    let loaded = load_service(&gateway(), Service::KafkaConnect, &hosts(&["connect-3", "connect-1"]));
    assert!(loaded.facts.is_none());
    assert!(loaded.files.is_empty());
}

#[test]
fn invalid_base64_is_an_error() {
    assert!(decode_properties("not base64!").is_err());
}
