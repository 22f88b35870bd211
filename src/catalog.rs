//! Static catalog of discoverable platform services.
//!
//! Each service carries the inventory group it populates, the systemd unit it
//! runs under, and the default ports used as fallback when a listener port
//! cannot be discovered.
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Global inventory group shared by every service.
pub const ALL_GROUP: &str = "all";

/// Immutable identity of a discoverable service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: &'static str,
    pub group: &'static str,
    pub unit: &'static str,
    /// Port hints, first one preferred; a discovered port always wins.
    pub default_ports: &'static [u16],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Zookeeper,
    KafkaBroker,
    SchemaRegistry,
    KafkaRest,
    Ksql,
    ControlCenter,
    KafkaConnect,
    KafkaConnectReplicator,
}

impl Service {
    /// Every service, in discovery order.
    pub const ALL: [Service; 8] = [
        Service::Zookeeper,
        Service::KafkaBroker,
        Service::SchemaRegistry,
        Service::KafkaRest,
        Service::Ksql,
        Service::ControlCenter,
        Service::KafkaConnect,
        Service::KafkaConnectReplicator,
    ];

    pub fn descriptor(self) -> ServiceDescriptor {
        match self {
            Service::Zookeeper => ServiceDescriptor {
                name: "zookeeper",
                group: "zookeeper",
                unit: "confluent-zookeeper",
                default_ports: &[2181],
            },
            Service::KafkaBroker => ServiceDescriptor {
                name: "kafka_broker",
                group: "kafka_broker",
                unit: "confluent-server",
                default_ports: &[9092, 9091],
            },
            Service::SchemaRegistry => ServiceDescriptor {
                name: "schema_registry",
                group: "schema_registry",
                unit: "confluent-schema-registry",
                default_ports: &[8081],
            },
            Service::KafkaRest => ServiceDescriptor {
                name: "kafka_rest",
                group: "kafka_rest",
                unit: "confluent-kafka-rest",
                default_ports: &[8082],
            },
            Service::Ksql => ServiceDescriptor {
                name: "ksql",
                group: "ksql",
                unit: "confluent-ksqldb",
                default_ports: &[8088],
            },
            Service::ControlCenter => ServiceDescriptor {
                name: "control_center",
                group: "control_center",
                unit: "confluent-control-center",
                default_ports: &[9021],
            },
            Service::KafkaConnect => ServiceDescriptor {
                name: "kafka_connect",
                group: "kafka_connect",
                unit: "confluent-kafka-connect",
                default_ports: &[8083],
            },
            Service::KafkaConnectReplicator => ServiceDescriptor {
                name: "kafka_connect_replicator",
                group: "kafka_connect_replicator",
                unit: "confluent-kafka-connect-replicator",
                default_ports: &[8083],
            },
        }
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn group(self) -> &'static str {
        self.descriptor().group
    }

    /// Name of the catch-all variable holding unmapped properties.
    pub fn custom_properties_key(self) -> String {
        format!("{}_custom_properties", self.group())
    }

    pub fn from_name(name: &str) -> Result<Service> {
        Service::ALL
            .into_iter()
            .find(|service| service.name() == name)
            .ok_or_else(|| anyhow!("unknown service {name:?}"))
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_lookup() {
        for service in Service::ALL {
            assert_eq!(Service::from_name(service.name()).unwrap(), service);
        }
        assert!(Service::from_name("mds").is_err());
    }

    #[test]
    fn custom_properties_key_uses_group() {
        assert_eq!(
            Service::KafkaConnect.custom_properties_key(),
            "kafka_connect_custom_properties"
        );
    }
}
