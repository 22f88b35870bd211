//! Mapped/custom property partitioning.
use super::MappedKeys;
use crate::catalog::{Service, ALL_GROUP};
use crate::inventory::Fragment;
use crate::properties::PropertiesMap;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// `all - mapped - skip`, with values carried over unchanged.
pub fn complement(
    all: &PropertiesMap,
    mapped: &MappedKeys,
    skip: &BTreeSet<String>,
) -> PropertiesMap {
    all.iter()
        .filter(|(key, _)| !mapped.contains(key) && !skip.contains(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Source properties no transform claimed, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomProperties {
    service: Service,
    properties: PropertiesMap,
}

impl CustomProperties {
    pub fn new(service: Service, properties: PropertiesMap) -> Self {
        Self {
            service,
            properties,
        }
    }

    /// Commit as `<group>_custom_properties` under the global group.
    pub fn into_fragment(self) -> Fragment {
        let properties: Map<String, Value> = self
            .properties
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        Fragment::new(ALL_GROUP).with(self.service.custom_properties_key(), properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> PropertiesMap {
        [
            ("group.id", "connect-cluster"),
            ("plugin.path", "/usr/share/java"),
            ("key.converter", "org.apache.kafka.connect.json.JsonConverter"),
            ("bootstrap.servers", "broker-1:9092"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn complement_partitions_snapshot_keys() {
        let all = snapshot();
        let mut mapped = MappedKeys::default();
        mapped.consider("group.id");
        mapped.consider("listeners");
        let skip: BTreeSet<String> = ["bootstrap.servers".to_string()].into();

        let custom = complement(&all, &mapped, &skip);
        let custom_keys: BTreeSet<String> = custom.keys().cloned().collect();
        let mapped_keys = mapped.within(&all);

        assert!(custom_keys.is_disjoint(&mapped_keys));
        let union: BTreeSet<String> = custom_keys.union(&mapped_keys).cloned().collect();
        let expected: BTreeSet<String> = all
            .keys()
            .filter(|key| !skip.contains(*key))
            .cloned()
            .collect();
        assert_eq!(union, expected);
        assert_eq!(custom["plugin.path"], "/usr/share/java");
    }

    #[test]
    fn custom_fragment_targets_global_group() {
        let custom: PropertiesMap = [("plugin.path".to_string(), "/opt".to_string())].into();
        let fragment = CustomProperties::new(Service::KafkaConnect, custom).into_fragment();
        assert_eq!(fragment.group, "all");
        assert_eq!(
            fragment.get("kafka_connect_custom_properties"),
            Some(&json!({"plugin.path": "/opt"}))
        );
    }
}
