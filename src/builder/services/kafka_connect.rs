//! Kafka Connect worker properties.
//!
//! `config_storage_topic` and `group_id` both write `kafka_connect_group_id`;
//! `listener` and `advertised_listener` both write the protocol and port. The
//! later transform wins when its source key is present.
use crate::builder::shared::{self, int_or_null, parse_listeners, TlsKeys};
use crate::builder::{BuildContext, PropertyReader, ServiceBuilder};
use crate::catalog::Service;
use crate::inventory::Fragment;
use serde_json::Value;

const TLS_KEYS: TlsKeys = TlsKeys {
    keystore_location: "listeners.https.ssl.keystore.location",
    keystore_password: "listeners.https.ssl.keystore.password",
    key_password: "listeners.https.ssl.key.password",
    truststore_location: "listeners.https.ssl.truststore.location",
    truststore_password: "listeners.https.ssl.truststore.password",
};

pub(crate) fn builder() -> ServiceBuilder {
    ServiceBuilder::new(Service::KafkaConnect, "kafka_connect")
        .transform("replication_factor", replication_factor)
        .transform("config_storage_topic", config_storage_topic)
        .transform("monitoring_interceptor", monitoring_interceptor)
        .transform("group_id", group_id)
        .transform("listener", listener)
        .transform("advertised_listener", advertised_listener)
        .transform("tls", tls)
        .transform("mutual_tls", mutual_tls)
        .transform("rbac", rbac)
        .transform("ldap", ldap)
        .transform("secret_registry", shared::secret_registry)
        .transform("telemetry", shared::telemetry)
        .transform("jmx", shared::jmx)
}

fn replication_factor(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::replication_factor(
        context,
        reader,
        "config.storage.replication.factor",
        "default_internal_replication_factor",
    )
}

/// Connect cluster name derived from the config storage topic.
fn config_storage_topic(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    let group_id = reader
        .get("config.storage.topic")
        .map(|topic| topic.strip_suffix("-configs").unwrap_or(topic));
    context
        .fragment()
        .with(context.var("group_id"), shared::str_or_null(group_id))
}

fn monitoring_interceptor(
    context: &BuildContext<'_>,
    reader: &mut PropertyReader<'_>,
) -> Fragment {
    shared::interceptors(context, reader, "confluent.monitoring.interceptor.topic")
}

fn group_id(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    let mut fragment = context.fragment();
    if let Some(group_id) = reader.get("group.id") {
        fragment.insert(context.var("group_id"), group_id);
    }
    fragment
}

fn listener(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::listener(context, reader, "listeners", "http_protocol", "rest_port")
}

fn advertised_listener(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    let mut fragment = context.fragment();
    if let Some(protocol) = reader.get("rest.advertised.listener") {
        fragment.insert(context.var("http_protocol"), protocol);
    }
    let port = int_or_null(reader.get("rest.advertised.port"));
    if port != Value::Null {
        fragment.insert(context.var("rest_port"), port);
    }
    fragment
}

/// REST protocol as the worker advertises it, else the first listener's.
fn rest_protocol(reader: &mut PropertyReader<'_>) -> Option<String> {
    if let Some(protocol) = reader.get("rest.advertised.listener") {
        return Some(protocol.to_string());
    }
    reader
        .get("listeners")
        .and_then(|value| parse_listeners(value).into_iter().next())
        .map(|listener| listener.name)
}

fn tls(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    match rest_protocol(reader) {
        Some(protocol) if protocol.eq_ignore_ascii_case("https") => {
            shared::tls(context, reader, &TLS_KEYS)
        }
        _ => context.fragment(),
    }
}

fn mutual_tls(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::mutual_tls(context, reader, "listeners.https.ssl.client.auth", "required")
}

fn rbac(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::rbac(context, reader, "rest.servlet.initializor.classes", |_| true)
}

fn ldap(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::ldap(context, reader, "confluent.metadata.basic.auth.user.info")
}
