//! Remote introspection gateway.
//!
//! A gateway runs one described [`Action`] against a host list and returns the
//! per-host outputs it managed to collect. Hosts that failed are simply absent
//! from the result; callers treat absence as "this host yielded nothing".
use std::collections::BTreeMap;
use std::fmt;

mod fixture;
mod ssh;

pub use fixture::FixtureGateway;
pub use ssh::{SshGateway, SshSettings};

/// An action a gateway can run on remote hosts.
#[derive(Clone, PartialEq, Eq)]
pub enum Action {
    /// Read systemd properties (`ExecStart`, `User`, `Environment`, ...) of a unit.
    ServiceStatus { unit: String },
    /// Fetch file contents, returned base64 encoded.
    Slurp { path: String },
    /// List the entry aliases of a Java keystore.
    KeystoreAliases {
        path: String,
        password: Option<String>,
    },
}

// Keystore passwords never reach logs.
impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::ServiceStatus { unit } => {
                f.debug_struct("ServiceStatus").field("unit", unit).finish()
            }
            Action::Slurp { path } => f.debug_struct("Slurp").field("path", path).finish(),
            Action::KeystoreAliases { path, password } => f
                .debug_struct("KeystoreAliases")
                .field("path", path)
                .field("password", &password.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Output of one action on one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOutput {
    Facts(ServiceFacts),
    Content { encoded: String },
    Aliases(Vec<String>),
}

/// Per-host outputs of one gateway call.
pub type HostResults = BTreeMap<String, HostOutput>;

pub trait Gateway {
    fn execute(&self, action: &Action, hosts: &[String]) -> HostResults;
}

/// Systemd unit properties as reported by the host's service manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceFacts {
    properties: BTreeMap<String, String>,
}

impl ServiceFacts {
    pub fn new(properties: BTreeMap<String, String>) -> Self {
        Self { properties }
    }

    /// Parse `systemctl show` output (`Key=Value` per line).
    pub fn from_show_output(text: &str) -> Self {
        let properties = text
            .lines()
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .collect();
        Self { properties }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn exec_start(&self) -> Option<&str> {
        self.get("ExecStart")
    }

    pub fn user(&self) -> Option<&str> {
        self.get("User")
    }

    pub fn group(&self) -> Option<&str> {
        self.get("Group")
    }

    pub fn environment(&self) -> Option<&str> {
        self.get("Environment")
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Fetch unit facts from the first host, if it answered.
pub fn first_host_facts(
    gateway: &dyn Gateway,
    unit: &str,
    host: &str,
) -> Option<ServiceFacts> {
    let action = Action::ServiceStatus {
        unit: unit.to_string(),
    };
    let mut results = gateway.execute(&action, &[host.to_string()]);
    match results.remove(host) {
        Some(HostOutput::Facts(facts)) if !facts.is_empty() => Some(facts),
        _ => None,
    }
}

/// List keystore aliases as seen from the first host that answers.
pub fn keystore_aliases(
    gateway: &dyn Gateway,
    hosts: &[String],
    path: &str,
    password: Option<&str>,
) -> Vec<String> {
    let Some(host) = hosts.first() else {
        return Vec::new();
    };
    let action = Action::KeystoreAliases {
        path: path.to_string(),
        password: password.map(str::to_string),
    };
    match gateway.execute(&action, std::slice::from_ref(host)).remove(host) {
        Some(HostOutput::Aliases(aliases)) => aliases,
        _ => Vec::new(),
    }
}

/// Parse `keytool -list` output into alias names in listing order.
pub(crate) fn parse_keytool_aliases(text: &str) -> Vec<String> {
    let mut aliases = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        let alias = if let Some(name) = line.strip_prefix("Alias name:") {
            Some(name.trim())
        } else if line.contains("Entry,") {
            line.split(',').next().map(str::trim)
        } else {
            None
        };
        if let Some(alias) = alias.filter(|alias| !alias.is_empty()) {
            aliases.push(alias.to_string());
        }
    }
    aliases
}
