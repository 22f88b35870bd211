//! Kafka broker properties, ZooKeeper and KRaft modes.
use crate::builder::shared::{self, jaas_values, parse_listeners, str_or_null, TlsKeys};
use crate::builder::{BuildContext, PlatformVersion, PropertyReader, ServiceBuilder};
use crate::catalog::{Service, ALL_GROUP};
use crate::inventory::Fragment;
use serde_json::{json, Map, Value};

/// First platform version whose brokers may run without ZooKeeper.
pub(crate) const KRAFT_SINCE: PlatformVersion = PlatformVersion::new(7, 4);

const TLS_KEYS: TlsKeys = TlsKeys {
    keystore_location: "ssl.keystore.location",
    keystore_password: "ssl.keystore.password",
    key_password: "ssl.key.password",
    truststore_location: "ssl.truststore.location",
    truststore_password: "ssl.truststore.password",
};

pub(crate) fn builder() -> ServiceBuilder {
    ServiceBuilder::new(Service::KafkaBroker, "kafka_broker")
        .transform("replication_factor", replication_factor)
        .transform("zookeeper_chroot", zookeeper_chroot)
        .transform("listeners", listeners)
        .transform("inter_broker_credentials", inter_broker_credentials)
        .transform("tls", tls)
        .transform("mutual_tls", mutual_tls)
        .transform("rbac", rbac)
        .transform("schema_validation", schema_validation)
        .transform("metric_reporter", metric_reporter)
        .transform("telemetry", shared::telemetry)
        .transform("jmx", shared::jmx)
}

pub(crate) fn kraft_builder() -> ServiceBuilder {
    builder().transform("kraft", kraft)
}

fn replication_factor(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::replication_factor(
        context,
        reader,
        "offsets.topic.replication.factor",
        "default_internal_replication_factor",
    )
}

/// Chroot path suffix of `zookeeper.connect`, e.g. `zk-1:2181/kafka`.
fn zookeeper_chroot(_context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    let fragment = Fragment::new(ALL_GROUP);
    match reader
        .get("zookeeper.connect")
        .and_then(|connect| connect.find('/').map(|index| &connect[index..]))
    {
        Some(chroot) if chroot != "/" => fragment.with("zookeeper_chroot", chroot),
        _ => fragment,
    }
}

fn sasl_protocol(mechanism: &str) -> &'static str {
    match mechanism.trim().to_ascii_uppercase().as_str() {
        "PLAIN" => "plain",
        "SCRAM-SHA-512" => "scram",
        "SCRAM-SHA-256" => "scram256",
        "GSSAPI" => "kerberos",
        "OAUTHBEARER" => "oauth",
        _ => "none",
    }
}

/// Per-listener name, port, TLS and SASL settings keyed by lowercase name.
fn listeners(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    let mut fragment = context.fragment();
    let Some(declared) = reader.get("listeners") else {
        return fragment;
    };
    let protocol_map: Map<String, Value> = reader
        .get("listener.security.protocol.map")
        .unwrap_or_default()
        .split(',')
        .filter_map(|pair| pair.split_once(':'))
        .map(|(name, protocol)| (name.trim().to_string(), Value::from(protocol.trim())))
        .collect();
    let default_mechanism = reader.get("sasl.enabled.mechanisms");

    let mut custom = Map::new();
    for listener in parse_listeners(declared) {
        let lower = listener.name.to_ascii_lowercase();
        let protocol = protocol_map
            .get(&listener.name)
            .and_then(Value::as_str)
            .unwrap_or(listener.name.as_str())
            .to_ascii_uppercase();
        let mechanism = reader
            .get(&format!("listener.name.{lower}.sasl.enabled.mechanisms"))
            .or(default_mechanism)
            .and_then(|mechanisms| mechanisms.split(',').next());
        let sasl = if protocol.starts_with("SASL") {
            mechanism.map_or("none", sasl_protocol)
        } else {
            "none"
        };
        custom.insert(
            lower,
            json!({
                "name": listener.name,
                "port": listener.port,
                "ssl_enabled": protocol.ends_with("SSL"),
                "sasl_protocol": sasl,
            }),
        );
    }
    fragment.insert(context.var("custom_listeners"), custom);
    if let Some(inter_broker) = reader.get("inter.broker.listener.name") {
        fragment.insert(
            context.var("inter_broker_listener_name"),
            inter_broker.to_ascii_lowercase(),
        );
    }
    fragment
}

/// PLAIN credentials of the inter-broker listener's JAAS entry.
fn inter_broker_credentials(
    context: &BuildContext<'_>,
    reader: &mut PropertyReader<'_>,
) -> Fragment {
    let fragment = context.fragment();
    let Some(listener) = reader.get("inter.broker.listener.name") else {
        return fragment;
    };
    let key = format!(
        "listener.name.{}.plain.sasl.jaas.config",
        listener.to_ascii_lowercase()
    );
    let Some(jaas) = reader.get(&key) else {
        return fragment;
    };
    let values = jaas_values(jaas);
    match (values.get("username"), values.get("password")) {
        (Some(username), Some(password)) => fragment.with(
            "sasl_plain_users",
            json!({ "admin": { "principal": username, "password": password } }),
        ),
        _ => fragment,
    }
}

fn tls(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    if !reader.has(TLS_KEYS.keystore_location) {
        return context.fragment();
    }
    shared::tls(context, reader, &TLS_KEYS)
}

fn mutual_tls(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::mutual_tls(context, reader, "ssl.client.auth", "required")
}

fn rbac(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::rbac(
        context,
        reader,
        "confluent.authorizer.access.rule.providers",
        |providers| providers.contains("CONFLUENT"),
    )
}

fn schema_validation(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    let url = reader.get("confluent.schema.registry.url");
    context
        .fragment()
        .with(context.var("schema_validation_enabled"), url.is_some())
}

fn metric_reporter(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    let enabled = reader
        .get("metric.reporters")
        .is_some_and(|reporters| reporters.contains("ConfluentMetricsReporter"));
    context
        .fragment()
        .with(context.var("metric_reporter_enabled"), enabled)
}

fn kraft(_context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    let roles = reader.get("process.roles");
    let voters = reader.get("controller.quorum.voters");
    let fragment = Fragment::new(ALL_GROUP).with("kraft_enabled", roles.is_some());
    match roles {
        Some(_) => fragment.with("kraft_controller_quorum_voters", str_or_null(voters)),
        None => fragment,
    }
}
