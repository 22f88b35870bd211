//! Gateway answering actions from a recorded JSON snapshot of hosts.
use super::{Action, Gateway, HostOutput, HostResults, ServiceFacts};
use anyhow::{Context, Result};
use base64::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureFile {
    #[serde(default)]
    hosts: BTreeMap<String, FixtureHost>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureHost {
    /// Unit name -> systemd properties.
    #[serde(default)]
    units: BTreeMap<String, BTreeMap<String, String>>,
    /// Absolute path -> plain-text file contents.
    #[serde(default)]
    files: BTreeMap<String, String>,
    /// Keystore path -> aliases in listing order.
    #[serde(default)]
    keystores: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
pub struct FixtureGateway {
    fixture: FixtureFile,
}

impl FixtureGateway {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("read fixture {}", path.display()))?;
        Self::from_slice(&bytes).with_context(|| format!("parse fixture {}", path.display()))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let fixture: FixtureFile =
            serde_json::from_slice(bytes).context("parse fixture JSON")?;
        Ok(Self { fixture })
    }

    fn answer(&self, host: &str, action: &Action) -> Option<HostOutput> {
        let recorded = self.fixture.hosts.get(host)?;
        match action {
            Action::ServiceStatus { unit } => recorded
                .units
                .get(unit)
                .map(|properties| HostOutput::Facts(ServiceFacts::new(properties.clone()))),
            Action::Slurp { path } => recorded.files.get(path).map(|text| HostOutput::Content {
                encoded: BASE64_STANDARD.encode(text),
            }),
            Action::KeystoreAliases { path, .. } => recorded
                .keystores
                .get(path)
                .map(|aliases| HostOutput::Aliases(aliases.clone())),
        }
    }
}

impl Gateway for FixtureGateway {
    fn execute(&self, action: &Action, hosts: &[String]) -> HostResults {
        let mut results = HostResults::new();
        for host in hosts {
            match self.answer(host, action) {
                Some(output) => {
                    results.insert(host.clone(), output);
                }
                None => tracing::debug!(host = %host, ?action, "fixture has no answer"),
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "hosts": {
            "connect-1": {
                "units": {"confluent-kafka-connect": {"User": "cp-kafka-connect"}},
                "files": {"/etc/kafka/connect.properties": "group.id=connect\n"},
                "keystores": {"/var/ssl/keystore.jks": ["connect", "caroot"]}
            }
        }
    }"#;

    #[test]
    fn slurp_content_is_base64_encoded() {
        let gateway = FixtureGateway::from_slice(FIXTURE.as_bytes()).unwrap();
        let results = gateway.execute(
            &Action::Slurp {
                path: "/etc/kafka/connect.properties".to_string(),
            },
            &["connect-1".to_string(), "connect-2".to_string()],
        );
        assert_eq!(results.len(), 1);
        let Some(HostOutput::Content { encoded }) = results.get("connect-1") else {
            panic!("expected content for connect-1");
        };
        let decoded = BASE64_STANDARD.decode(encoded).unwrap();
        assert_eq!(decoded, b"group.id=connect\n");
    }

    #[test]
    fn unknown_unit_yields_no_entry() {
        let gateway = FixtureGateway::from_slice(FIXTURE.as_bytes()).unwrap();
        let results = gateway.execute(
            &Action::ServiceStatus {
                unit: "confluent-server".to_string(),
            },
            &["connect-1".to_string()],
        );
        assert!(results.is_empty());
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(FixtureGateway::from_slice(br#"{"hosts": {}, "extra": 1}"#).is_err());
    }
}
