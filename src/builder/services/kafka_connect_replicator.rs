//! Replicator properties.
//!
//! The primary snapshot is the `replication.config` file; the consumer and
//! producer client files are carried over as a whole.
use crate::builder::shared::{self, TlsKeys};
use crate::builder::{BuildContext, PropertyReader, ServiceBuilder};
use crate::catalog::{Service, ALL_GROUP};
use crate::inventory::Fragment;
use serde_json::{Map, Value};

const TLS_KEYS: TlsKeys = TlsKeys {
    keystore_location: "listeners.https.ssl.keystore.location",
    keystore_password: "listeners.https.ssl.keystore.password",
    key_password: "listeners.https.ssl.key.password",
    truststore_location: "listeners.https.ssl.truststore.location",
    truststore_password: "listeners.https.ssl.truststore.password",
};

pub(crate) fn builder() -> ServiceBuilder {
    ServiceBuilder::new(Service::KafkaConnectReplicator, "kafka_connect_replicator")
        .primary_file("replication.config")
        .transform("listener", listener)
        .transform("topic_whitelist", topic_whitelist)
        .transform("consumer_properties", consumer_properties)
        .transform("producer_properties", producer_properties)
        .transform("monitoring_interceptor", monitoring_interceptor)
        .transform("tls", tls)
        .transform("jmx", shared::jmx)
}

fn listener(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::listener(context, reader, "listeners", "http_protocol", "listener_port")
}

fn topic_whitelist(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    context.fragment().with(
        context.var("topic_whitelist"),
        shared::str_or_null(reader.get("topic.whitelist")),
    )
}

fn client_file(context: &BuildContext<'_>, file_key: &str, variable: &str) -> Fragment {
    let fragment = Fragment::new(ALL_GROUP);
    let Some(properties) = context.file(file_key) else {
        return fragment;
    };
    let properties: Map<String, Value> = properties
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();
    fragment.with(context.var(variable), properties)
}

fn consumer_properties(context: &BuildContext<'_>, _reader: &mut PropertyReader<'_>) -> Fragment {
    client_file(context, "consumer.config", "consumer_custom_properties")
}

fn producer_properties(context: &BuildContext<'_>, _reader: &mut PropertyReader<'_>) -> Fragment {
    client_file(context, "producer.config", "producer_custom_properties")
}

/// Interceptors are on when either client points at a monitoring file.
fn monitoring_interceptor(
    context: &BuildContext<'_>,
    _reader: &mut PropertyReader<'_>,
) -> Fragment {
    let enabled = ["consumer.monitoring.config", "producer.monitoring.config"]
        .iter()
        .any(|file_key| context.file(file_key).is_some_and(|file| !file.is_empty()));
    context
        .fragment()
        .with(context.var("monitoring_interceptors_enabled"), enabled)
}

fn tls(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::https_listener_tls(context, reader, "listeners", &TLS_KEYS)
}
