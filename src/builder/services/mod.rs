//! Transform tables of the built-in services.
use super::shared::TlsKeys;
use super::{PlatformVersion, ServiceBuilder};
use crate::catalog::Service;

mod control_center;
mod kafka_broker;
mod kafka_connect;
mod kafka_connect_replicator;
mod kafka_rest;
mod ksql;
mod schema_registry;
mod zookeeper;

/// Store settings of the REST services configured through plain `ssl.*` keys.
const HTTP_TLS_KEYS: TlsKeys = TlsKeys {
    keystore_location: "ssl.keystore.location",
    keystore_password: "ssl.keystore.password",
    key_password: "ssl.key.password",
    truststore_location: "ssl.truststore.location",
    truststore_password: "ssl.truststore.password",
};

/// Builder used when no registered version applies.
pub(super) fn base_builder(service: Service) -> ServiceBuilder {
    match service {
        Service::Zookeeper => zookeeper::builder(),
        Service::KafkaBroker => kafka_broker::builder(),
        Service::SchemaRegistry => schema_registry::builder(),
        Service::KafkaRest => kafka_rest::builder(),
        Service::Ksql => ksql::builder(),
        Service::ControlCenter => control_center::builder(),
        Service::KafkaConnect => kafka_connect::builder(),
        Service::KafkaConnectReplicator => kafka_connect_replicator::builder(),
    }
}

/// Builder that differs from the base at `version`, if any.
pub(super) fn versioned_builder(
    service: Service,
    version: PlatformVersion,
) -> Option<ServiceBuilder> {
    match service {
        Service::KafkaBroker if version >= kafka_broker::KRAFT_SINCE => {
            Some(kafka_broker::kraft_builder())
        }
        _ => None,
    }
}
