//! Service property loader.
//!
//! Resolves the configuration files of a running service from the launch
//! command on its first host, then fetches and parses every file across all
//! hosts of the service.
use crate::catalog::Service;
use crate::gateway::{first_host_facts, Action, Gateway, HostOutput, ServiceFacts};
use crate::locator::locate;
use crate::properties::{parse_properties, PropertiesMap};
use anyhow::{Context, Result};
use base64::prelude::*;
use std::collections::BTreeMap;

/// File-key -> parsed properties for one host.
pub type FileProperties = BTreeMap<String, PropertiesMap>;

/// Host -> file-key -> parsed properties for one service.
pub type HostProperties = BTreeMap<String, FileProperties>;

/// Everything the loader learned about one service.
#[derive(Debug, Default)]
pub struct LoadedService {
    /// Unit facts of the first host, if it answered.
    pub facts: Option<ServiceFacts>,
    pub files: HostProperties,
}

impl LoadedService {
    /// All file snapshots of one host; empty when the host yielded nothing.
    pub fn host_files(&self, host: &str) -> FileProperties {
        self.files.get(host).cloned().unwrap_or_default()
    }
}

pub fn load_service(gateway: &dyn Gateway, service: Service, hosts: &[String]) -> LoadedService {
    let Some(first) = hosts.first() else {
        tracing::error!(service = %service, "host list is empty");
        return LoadedService::default();
    };
    let unit = service.descriptor().unit;
    let facts = first_host_facts(gateway, unit, first);
    let command_line = facts
        .as_ref()
        .and_then(ServiceFacts::exec_start)
        .map(str::to_string);
    let Some(command_line) = command_line else {
        tracing::error!(service = %service, host = %first, unit, "could not read service launch command");
        return LoadedService {
            facts,
            files: HostProperties::new(),
        };
    };

    let references = locate(&command_line);
    if references.is_empty() {
        tracing::error!(service = %service, host = %first, "no properties file on launch command");
        return LoadedService {
            facts,
            files: HostProperties::new(),
        };
    }

    let mut files = HostProperties::new();
    for (file_key, path) in &references {
        let action = Action::Slurp { path: path.clone() };
        let results = gateway.execute(&action, hosts);
        for host in hosts {
            let properties = match results.get(host) {
                Some(HostOutput::Content { encoded }) => match decode_properties(encoded) {
                    Ok(properties) => properties,
                    Err(err) => {
                        tracing::warn!(service = %service, host = %host, path = %path, error = %err, "skipping unreadable properties file");
                        continue;
                    }
                },
                _ => {
                    tracing::warn!(service = %service, host = %host, path = %path, "properties file not fetched");
                    continue;
                }
            };
            tracing::debug!(service = %service, host = %host, file_key = %file_key, keys = properties.len(), "loaded properties");
            files
                .entry(host.clone())
                .or_default()
                .insert(file_key.clone(), properties);
        }
    }

    LoadedService { facts, files }
}

fn decode_properties(encoded: &str) -> Result<PropertiesMap> {
    let bytes = BASE64_STANDARD
        .decode(encoded.trim())
        .context("decode base64 file content")?;
    let text = String::from_utf8(bytes).context("decode file content as UTF-8")?;
    Ok(parse_properties(&text))
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
