//! Transform building blocks shared by the service builders.
//!
//! Each helper reads through a [`PropertyReader`] so every probed key lands in
//! the mapped set, and returns a fragment for the caller's group. Absent
//! values become `null`; a failed precondition yields an empty fragment.
use super::runtime;
use super::{BuildContext, PropertyReader};
use crate::gateway::keystore_aliases;
use crate::inventory::Fragment;
use serde_json::Value;
use std::collections::BTreeMap;

/// One entry of a `listeners` style value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    /// Scheme or listener name, e.g. `https` or `PLAINTEXT`.
    pub name: String,
    pub port: Option<u16>,
}

/// Parse a comma separated listener list such as
/// `PLAINTEXT://:9092,SSL://broker-1:9093`.
pub fn parse_listeners(value: &str) -> Vec<Listener> {
    value
        .split(',')
        .map(str::trim)
        .filter_map(|entry| {
            let (name, address) = entry.split_once("://")?;
            let port = address
                .rsplit_once(':')
                .and_then(|(_, port)| port.trim_end_matches('/').parse().ok());
            Some(Listener {
                name: name.to_string(),
                port,
            })
        })
        .collect()
}

/// Integer coercion for numeric settings; non-numeric values become `null`.
pub fn int_or_null(value: Option<&str>) -> Value {
    value
        .and_then(|value| value.trim().parse::<i64>().ok())
        .map_or(Value::Null, Value::from)
}

pub fn str_or_null(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |value| Value::String(value.to_string()))
}

/// `key=value` pairs of a JAAS login module entry, quotes and the trailing
/// `;` stripped.
pub fn jaas_values(jaas_config: &str) -> BTreeMap<String, String> {
    jaas_config
        .split_whitespace()
        .filter_map(|token| token.split_once('='))
        .map(|(key, value)| {
            let value = value.trim_end_matches(';').trim_matches('"');
            (key.to_string(), value.to_string())
        })
        .collect()
}

pub(super) fn replication_factor(
    context: &BuildContext<'_>,
    reader: &mut PropertyReader<'_>,
    key: &str,
    variable: &str,
) -> Fragment {
    context
        .fragment()
        .with(context.var(variable), int_or_null(reader.get(key)))
}

/// `port`, else the service's catalog port hint, else `null`.
pub(super) fn port_or_default(context: &BuildContext<'_>, port: Option<u16>) -> Value {
    port.or_else(|| context.default_port()).map_or(Value::Null, Value::from)
}

/// Protocol and port of the first listener in `key`; the port falls back to
/// the catalog hint when the listener names none.
pub(super) fn listener(
    context: &BuildContext<'_>,
    reader: &mut PropertyReader<'_>,
    key: &str,
    protocol_variable: &str,
    port_variable: &str,
) -> Fragment {
    let first = reader
        .get(key)
        .and_then(|value| parse_listeners(value).into_iter().next());
    let (protocol, port) = match first {
        Some(listener) => (Value::String(listener.name), listener.port),
        None => (Value::Null, None),
    };
    let port = port_or_default(context, port);
    context
        .fragment()
        .with(context.var(protocol_variable), protocol)
        .with(context.var(port_variable), port)
}

/// Property names of one service's key and trust stores.
pub(super) struct TlsKeys {
    pub keystore_location: &'static str,
    pub keystore_password: &'static str,
    pub key_password: &'static str,
    pub truststore_location: &'static str,
    pub truststore_password: &'static str,
}

/// Store paths, passwords, and the first alias of each store.
///
/// Aliases are listed through the gateway against the first host; a store
/// without aliases yields an empty string.
pub(super) fn tls(
    context: &BuildContext<'_>,
    reader: &mut PropertyReader<'_>,
    keys: &TlsKeys,
) -> Fragment {
    let keystore_path = reader.get(keys.keystore_location);
    let keystore_password = reader.get(keys.keystore_password);
    let key_password = reader.get(keys.key_password);
    let truststore_path = reader.get(keys.truststore_location);
    let truststore_password = reader.get(keys.truststore_password);

    let first_alias = |path: Option<&str>, password: Option<&str>| -> String {
        path.and_then(|path| {
            keystore_aliases(context.gateway, context.hosts, path, password)
                .into_iter()
                .next()
        })
        .unwrap_or_default()
    };
    let keystore_alias = first_alias(keystore_path, keystore_password);
    let truststore_alias = first_alias(truststore_path, truststore_password);

    context
        .fragment()
        .with("ssl_enabled", true)
        .with("ssl_provided_keystore_and_truststore", true)
        .with("ssl_provided_keystore_and_truststore_remote_src", true)
        .with(context.var("keystore_path"), str_or_null(keystore_path))
        .with("ssl_keystore_store_password", str_or_null(keystore_password))
        .with("ssl_keystore_key_password", str_or_null(key_password))
        .with(context.var("truststore_path"), str_or_null(truststore_path))
        .with("ssl_truststore_password", str_or_null(truststore_password))
        .with("ssl_keystore_alias", keystore_alias)
        .with("ssl_truststore_ca_cert_alias", truststore_alias)
}

/// TLS material when the first listener of `key` speaks https.
pub(super) fn https_listener_tls(
    context: &BuildContext<'_>,
    reader: &mut PropertyReader<'_>,
    key: &str,
    keys: &TlsKeys,
) -> Fragment {
    let https = reader
        .get(key)
        .and_then(|value| parse_listeners(value).into_iter().next())
        .is_some_and(|listener| listener.name.eq_ignore_ascii_case("https"));
    if https {
        tls(context, reader, keys)
    } else {
        context.fragment()
    }
}

/// `ssl_mutual_auth_enabled` when `key` equals `required`, ignoring case.
pub(super) fn mutual_tls(
    context: &BuildContext<'_>,
    reader: &mut PropertyReader<'_>,
    key: &str,
    required: &str,
) -> Fragment {
    let fragment = context.fragment();
    match reader.get(key) {
        Some(value) if value.eq_ignore_ascii_case(required) => {
            fragment.with("ssl_mutual_auth_enabled", true)
        }
        _ => fragment,
    }
}

/// RBAC enablement from a marker property.
///
/// When the marker is absent only the marker itself is considered mapped.
pub(super) fn rbac(
    context: &BuildContext<'_>,
    reader: &mut PropertyReader<'_>,
    marker: &str,
    enabled: fn(&str) -> bool,
) -> Fragment {
    let fragment = context.fragment();
    match reader.get(marker) {
        Some(value) if enabled(value) => {
            reader.consider(&["confluent.metadata.bootstrap.server.urls"]);
            fragment.with("rbac_enabled", true).with(
                "rbac_enabled_public_pem_path",
                str_or_null(reader.get("public.key.path")),
            )
        }
        _ => fragment.with("rbac_enabled", false),
    }
}

/// Directory-service credentials from a `user:password` value.
pub(super) fn ldap(
    context: &BuildContext<'_>,
    reader: &mut PropertyReader<'_>,
    key: &str,
) -> Fragment {
    let mut fragment = context.fragment();
    if let Some((user, password)) = reader.get(key).and_then(|info| info.split_once(':')) {
        fragment.insert(context.var("ldap_user"), user);
        fragment.insert(context.var("ldap_password"), password);
    }
    fragment
}

pub(super) fn secret_registry(
    context: &BuildContext<'_>,
    reader: &mut PropertyReader<'_>,
) -> Fragment {
    let fragment = context.fragment();
    if !reader.has("config.providers") {
        return fragment.with(context.var("secret_registry_enabled"), false);
    }
    let key = reader.get("config.providers.secret.param.master.encryption.key");
    let replication =
        reader.get("config.providers.secret.param.kafkastore.topic.replication.factor");
    fragment
        .with(context.var("secret_registry_enabled"), true)
        .with(context.var("secret_registry_key"), str_or_null(key))
        .with(
            context.var("secret_registry_default_replication_factor"),
            int_or_null(replication),
        )
}

pub(super) fn telemetry(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    let enabled = reader
        .get("confluent.telemetry.enabled")
        .is_some_and(|value| value.eq_ignore_ascii_case("true"));
    let mut fragment = context.fragment().with("telemetry_enabled", enabled);
    if let Some(api_key) = reader.get("confluent.telemetry.api.key") {
        fragment.insert("telemetry_api_key", api_key);
    }
    if let Some(api_secret) = reader.get("confluent.telemetry.api.secret") {
        fragment.insert("telemetry_api_secret", api_secret);
    }
    fragment
}

/// `<group>_monitoring_interceptors_enabled` when `key` is present.
pub(super) fn interceptors(
    context: &BuildContext<'_>,
    reader: &mut PropertyReader<'_>,
    key: &str,
) -> Fragment {
    context
        .fragment()
        .with(context.var("monitoring_interceptors_enabled"), reader.has(key))
}

/// Monitoring agents, namespaced by the service group.
pub(super) fn jmx(context: &BuildContext<'_>, _reader: &mut PropertyReader<'_>) -> Fragment {
    let mut fragment = context.fragment();
    for (key, value) in runtime::monitoring_details(context) {
        fragment.insert(context.var(&key), value);
    }
    fragment
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listener_lists_parse_in_order() {
        let listeners = parse_listeners("PLAINTEXT://:9092, SSL://broker-1:9093");
        assert_eq!(listeners.len(), 2);
        assert_eq!(listeners[0].name, "PLAINTEXT");
        assert_eq!(listeners[0].port, Some(9092));
        assert_eq!(listeners[1].name, "SSL");
        assert_eq!(listeners[1].port, Some(9093));
    }

    #[test]
    fn listener_without_port_has_no_port() {
        let listeners = parse_listeners("http://connect-1");
        assert_eq!(listeners[0].name, "http");
        assert_eq!(listeners[0].port, None);
        assert!(parse_listeners("not a listener").is_empty());
    }

    #[test]
    fn numeric_coercion_is_lenient() {
        assert_eq!(int_or_null(Some("3")), json!(3));
        assert_eq!(int_or_null(Some(" 1 ")), json!(1));
        assert_eq!(int_or_null(Some("three")), Value::Null);
        assert_eq!(int_or_null(None), Value::Null);
    }

    #[test]
    fn jaas_values_strip_quotes() {
        let values = jaas_values(
            "org.apache.kafka.common.security.plain.PlainLoginModule required username=\"admin\" password=\"admin-secret\";",
        );
        assert_eq!(values["username"], "admin");
        assert_eq!(values["password"], "admin-secret");
        assert_eq!(values.len(), 2);
    }
}
