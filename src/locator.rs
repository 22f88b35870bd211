//! Locate configuration files declared on a service launch command line.
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// File-key used for a positional (unflagged) properties file.
pub const DEFAULT_KEY: &str = "Default";

static CONFIG_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:--(?P<flag>[\w.-]+\.config))?\s+(?P<path>[\w/.-]+\.properties)")
        .expect("config reference pattern")
});

/// Extract `file-key -> path` references from a launch command line.
///
/// `--<name>.config <path>.properties` pairs are keyed by `<name>.config`;
/// bare whitespace-preceded `*.properties` paths use [`DEFAULT_KEY`]. A key
/// repeated on the command line keeps its last path. An empty result means
/// nothing is discoverable from this command.
pub fn locate(command_line: &str) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    for captures in CONFIG_REFERENCE.captures_iter(command_line) {
        let key = captures
            .name("flag")
            .map_or(DEFAULT_KEY, |flag| flag.as_str());
        if let Some(path) = captures.name("path") {
            files.insert(key.to_string(), path.as_str().to_string());
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flagged_files_use_flag_names() {
        let files = locate("--consumer.config /a/c.properties --producer.config /a/p.properties");
        assert_eq!(files.len(), 2);
        assert_eq!(files["consumer.config"], "/a/c.properties");
        assert_eq!(files["producer.config"], "/a/p.properties");
        assert!(!files.contains_key(DEFAULT_KEY));
    }

    #[test]
    fn positional_file_uses_default_key() {
        let exec_start = "{ path=/usr/bin/zookeeper-server-start ; argv[]=/usr/bin/zookeeper-server-start /etc/kafka/zookeeper.properties ; ignore_errors=no ; pid=0 }";
        let files = locate(exec_start);
        assert_eq!(files.len(), 1);
        assert_eq!(files[DEFAULT_KEY], "/etc/kafka/zookeeper.properties");
    }

    #[test]
    fn replicator_command_keeps_last_repeated_flag() {
        let command = "/opt/confluent/confluent-7.2.0/bin/replicator \
            --consumer.config /opt/confluent/etc/kafka-connect-replicator/kafka-connect-replicator-consumer.properties \
            --producer.config /opt/confluent/etc/kafka-connect-replicator/kafka-connect-replicator-producer.properties \
            --cluster.id replicator \
            --replication.config /opt/confluent/etc/kafka-connect-replicator/first.properties \
            --consumer.monitoring.config /opt/confluent/etc/kafka-connect-replicator/kafka-connect-replicator-interceptors.properties \
            --producer.monitoring.config /opt/confluent/etc/kafka-connect-replicator/kafka-connect-replicator-interceptors.properties \
            TimeoutStopSec=180 \
            --replication.config /opt/confluent/etc/kafka-connect-replicator/kafka-connect-replicator.properties";
        let files = locate(command);
        assert_eq!(files.len(), 5);
        assert_eq!(
            files["replication.config"],
            "/opt/confluent/etc/kafka-connect-replicator/kafka-connect-replicator.properties"
        );
        assert!(files.contains_key("consumer.monitoring.config"));
        assert!(!files.contains_key("cluster.id"));
    }

    #[test]
    fn mixes_flagged_and_positional_references() {
        let files = locate(
            "/usr/bin/connect-distributed /etc/kafka/connect-distributed.properties --extra.config /etc/kafka/extra.properties",
        );
        assert_eq!(files.len(), 2);
        assert_eq!(files[DEFAULT_KEY], "/etc/kafka/connect-distributed.properties");
        assert_eq!(files["extra.config"], "/etc/kafka/extra.properties");
    }

    #[test]
    fn versioned_install_paths_are_matched_whole() {
        let files = locate("/opt/confluent-7.2.0/bin/schema-registry-start /opt/confluent-7.2.0/etc/schema-registry/schema-registry.properties");
        assert_eq!(
            files[DEFAULT_KEY],
            "/opt/confluent-7.2.0/etc/schema-registry/schema-registry.properties"
        );
    }

    #[test]
    fn no_references_yields_empty_map() {
        assert!(locate("/usr/bin/java -cp /opt/lib/* Main").is_empty());
        assert!(locate("").is_empty());
    }
}
