//! Always-run steps driven by the process environment rather than the
//! configuration files: daemon identity, JVM runtime arguments, and
//! monitoring agents.
use super::BuildContext;
use crate::catalog::ALL_GROUP;
use crate::inventory::Fragment;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Variable accumulating `-X...` JVM flags found in the environment.
pub const HEAP_OPTS_KEY: &str = "KAFKA_HEAP_OPTS";

const JVM_FLAG_MARKER: &str = "-X";
const JAVA_AGENT_MARKER: &str = "-javaagent:";

/// Parse a systemd `Environment=` value.
///
/// Tokens are whitespace separated. A token without `=` that starts with `-X`
/// is appended to [`HEAP_OPTS_KEY`] (space joined, encounter order); every
/// other token is split on its first `=`. Tokens that cannot be split are
/// skipped.
pub fn parse_environment(environment: &str) -> BTreeMap<String, String> {
    let mut details = BTreeMap::new();
    for raw in environment.split_whitespace() {
        let token = raw.trim_matches('"');
        if !token.contains('=') && token.starts_with(JVM_FLAG_MARKER) {
            let heap: &mut String = details.entry(HEAP_OPTS_KEY.to_string()).or_default();
            heap.push(' ');
            heap.push_str(token);
            continue;
        }
        match token.split_once('=') {
            Some((key, value)) => {
                details.insert(key.to_string(), value.to_string());
            }
            None => tracing::debug!(token, "skipping environment token without '='"),
        }
    }
    details
}

fn environment(context: &BuildContext<'_>) -> BTreeMap<String, String> {
    context
        .facts
        .and_then(|facts| facts.environment())
        .map(parse_environment)
        .unwrap_or_default()
}

fn optional(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |value| Value::String(value.to_string()))
}

/// Owning user, group, and log directory of the service daemon.
pub(super) fn daemon_identity(context: &BuildContext<'_>) -> Fragment {
    let env = environment(context);
    let facts = context.facts;
    Fragment::new(ALL_GROUP)
        .with(context.var("user"), optional(facts.and_then(|f| f.user())))
        .with(context.var("group"), optional(facts.and_then(|f| f.group())))
        .with(
            context.var("log_dir"),
            optional(env.get("LOG_DIR").map(String::as_str)),
        )
}

/// JVM heap and GC flags of the running process.
pub(super) fn runtime_arguments(context: &BuildContext<'_>) -> Fragment {
    let env = environment(context);
    let java_args = env
        .get(HEAP_OPTS_KEY)
        .map(|opts| opts.trim())
        .filter(|opts| !opts.is_empty());
    context
        .fragment()
        .with(context.var("custom_java_args"), optional(java_args))
}

/// Monitoring agents attached through `-javaagent:` flags in the environment.
///
/// Keys are returned unprefixed: `jmxexporter_*` for the Prometheus JMX
/// exporter and `jolokia_*` for Jolokia.
pub(super) fn monitoring_details(context: &BuildContext<'_>) -> Map<String, Value> {
    let raw = context
        .facts
        .and_then(|facts| facts.environment())
        .unwrap_or_default();
    agent_details(raw)
}

fn agent_details(environment: &str) -> Map<String, Value> {
    let mut details = Map::new();
    details.insert("jmxexporter_enabled".to_string(), Value::Bool(false));
    details.insert("jolokia_enabled".to_string(), Value::Bool(false));

    for raw in environment.split_whitespace() {
        let token = raw.trim_matches('"');
        let Some(index) = token.find(JAVA_AGENT_MARKER) else {
            continue;
        };
        let agent = &token[index + JAVA_AGENT_MARKER.len()..];
        let (jar, arguments) = agent.split_once('=').unwrap_or((agent, ""));
        if jar.contains("jmx_prometheus") {
            details.insert("jmxexporter_enabled".to_string(), Value::Bool(true));
            details.insert("jmxexporter_jar_path".to_string(), jar.into());
            let (port, config) = arguments.split_once(':').unwrap_or((arguments, ""));
            details.insert("jmxexporter_port".to_string(), port_value(port));
            if !config.is_empty() {
                details.insert("jmxexporter_config_path".to_string(), config.into());
            }
        } else if jar.contains("jolokia") {
            details.insert("jolokia_enabled".to_string(), Value::Bool(true));
            details.insert("jolokia_jar_path".to_string(), jar.into());
            let port = arguments
                .split(',')
                .filter_map(|option| option.split_once('='))
                .find(|(name, _)| *name == "port")
                .map_or("", |(_, port)| port);
            details.insert("jolokia_port".to_string(), port_value(port));
        }
    }
    details
}

fn port_value(port: &str) -> Value {
    port.parse::<u16>().map_or(Value::Null, Value::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn heap_flags_are_accumulated_and_pairs_split() {
        let env = parse_environment("-Xmx2g -Xms2g LOG_DIR=/var/log/svc");
        assert_eq!(env.len(), 2);
        assert_eq!(env[HEAP_OPTS_KEY], " -Xmx2g -Xms2g");
        assert_eq!(env["LOG_DIR"], "/var/log/svc");
    }

    #[test]
    fn heap_flags_extend_an_explicit_heap_variable() {
        let env = parse_environment("\"KAFKA_HEAP_OPTS=-Xmx1g -Xms1g\" LOG_DIR=/var/log/kafka");
        assert_eq!(env[HEAP_OPTS_KEY], "-Xmx1g -Xms1g");
        assert_eq!(env["LOG_DIR"], "/var/log/kafka");
    }

    #[test]
    fn values_keep_later_equals_signs() {
        let env = parse_environment("KAFKA_OPTS=-Djava.security.auth.login.config=/etc/jaas.conf");
        assert_eq!(
            env["KAFKA_OPTS"],
            "-Djava.security.auth.login.config=/etc/jaas.conf"
        );
    }

    #[test]
    fn unsplittable_tokens_are_skipped() {
        let env = parse_environment("-server LOG_DIR=/var/log");
        assert_eq!(env.len(), 1);
        assert!(parse_environment("").is_empty());
    }

    #[test]
    fn detects_prometheus_exporter_agent() {
        let details = agent_details(
            "KAFKA_OPTS=-javaagent:/opt/prometheus/jmx_prometheus_javaagent.jar=8077:/opt/prometheus/kafka.yml LOG_DIR=/var/log",
        );
        assert_eq!(details["jmxexporter_enabled"], json!(true));
        assert_eq!(
            details["jmxexporter_jar_path"],
            json!("/opt/prometheus/jmx_prometheus_javaagent.jar")
        );
        assert_eq!(details["jmxexporter_port"], json!(8077));
        assert_eq!(details["jmxexporter_config_path"], json!("/opt/prometheus/kafka.yml"));
        assert_eq!(details["jolokia_enabled"], json!(false));
    }

    #[test]
    fn detects_jolokia_agent_port() {
        let details = agent_details(
            "KAFKA_OPTS=-javaagent:/opt/jolokia/jolokia.jar=port=7771,host=0.0.0.0",
        );
        assert_eq!(details["jolokia_enabled"], json!(true));
        assert_eq!(details["jolokia_port"], json!(7771));
    }
}
