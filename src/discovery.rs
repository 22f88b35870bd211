//! One discovery run: per service, load properties, resolve the builder for
//! the requested platform version, build fragments and merge them.
use crate::builder::{BuildContext, BuilderRegistry, ResolvedBy};
use crate::catalog::Service;
use crate::config::DiscoveryConfig;
use crate::gateway::Gateway;
use crate::inventory::{merge, InventorySink};
use crate::loader::load_service;
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Discovered,
    /// The inventory lists no hosts for the service group.
    NoHosts,
    NoBuilder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceReport {
    pub service: Service,
    pub status: ServiceStatus,
    pub hosts: usize,
    /// Hosts whose configuration files were fetched.
    pub hosts_loaded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<ResolvedBy>,
    pub fragments_applied: usize,
    pub fragments_rejected: usize,
    pub mapped: usize,
    pub custom: usize,
}

impl ServiceReport {
    fn skipped(service: Service, status: ServiceStatus, hosts: usize) -> Self {
        Self {
            service,
            status,
            hosts,
            hosts_loaded: 0,
            binding: None,
            resolved_by: None,
            fragments_applied: 0,
            fragments_rejected: 0,
            mapped: 0,
            custom: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    pub from_version: String,
    pub services: Vec<ServiceReport>,
}

impl DiscoveryReport {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "from version {}", self.from_version);
        for report in &self.services {
            let _ = write!(out, "{:<26}", report.service.name());
            match report.status {
                ServiceStatus::NoHosts => {
                    let _ = writeln!(out, "skipped (no hosts)");
                }
                ServiceStatus::NoBuilder => {
                    let _ = writeln!(out, "skipped (no builder)");
                }
                ServiceStatus::Discovered => {
                    let _ = writeln!(
                        out,
                        "{} hosts={}/{} fragments={} rejected={} mapped={} custom={}",
                        report.binding.as_deref().unwrap_or("-"),
                        report.hosts_loaded,
                        report.hosts,
                        report.fragments_applied,
                        report.fragments_rejected,
                        report.mapped,
                        report.custom
                    );
                }
            }
        }
        out
    }
}

/// Everything one run needs besides the inventory it writes to.
pub struct Discovery<'a> {
    pub gateway: &'a dyn Gateway,
    pub registry: &'a BuilderRegistry,
    pub config: &'a DiscoveryConfig,
}

impl Discovery<'_> {
    /// Discover `services` in order, merging into `inventory`.
    ///
    /// No failure inside one service stops the run.
    pub fn run(&self, inventory: &mut dyn InventorySink, services: &[Service]) -> DiscoveryReport {
        let services = services
            .iter()
            .map(|service| self.discover_service(inventory, *service))
            .collect();
        DiscoveryReport {
            from_version: self.config.from_version.clone(),
            services,
        }
    }

    fn discover_service(&self, inventory: &mut dyn InventorySink, service: Service) -> ServiceReport {
        let started = Instant::now();
        let hosts = inventory
            .groups()
            .remove(service.group())
            .unwrap_or_default();
        if hosts.is_empty() {
            tracing::error!(service = %service, group = service.group(), "no hosts in inventory group");
            return ServiceReport::skipped(service, ServiceStatus::NoHosts, 0);
        }
        let Some(resolution) = self.registry.resolve(service, &self.config.from_version) else {
            tracing::error!(service = %service, "no builder registered");
            return ServiceReport::skipped(service, ServiceStatus::NoBuilder, hosts.len());
        };

        let loaded = load_service(self.gateway, service, &hosts);
        let files = loaded.host_files(&hosts[0]);
        let context = BuildContext {
            gateway: self.gateway,
            service,
            hosts: &hosts,
            facts: loaded.facts.as_ref(),
            files: &files,
        };
        let output = resolution
            .builder
            .build(&context, &self.config.skip_properties(service));

        let mut applied = 0;
        let mut rejected = 0;
        for fragment in &output.fragments {
            if merge(inventory, fragment) {
                applied += 1;
            } else {
                rejected += 1;
            }
        }

        let elapsed_ms = started.elapsed().as_millis();
        tracing::info!(
            service = %service,
            binding = %resolution.binding,
            resolved_by = ?resolution.resolved_by,
            hosts = hosts.len(),
            elapsed_ms,
            "service discovered"
        );
        ServiceReport {
            service,
            status: ServiceStatus::Discovered,
            hosts: hosts.len(),
            hosts_loaded: loaded.files.len(),
            binding: Some(resolution.binding),
            resolved_by: Some(resolution.resolved_by),
            fragments_applied: applied,
            fragments_rejected: rejected,
            mapped: output.mapped.len(),
            custom: output.custom.len(),
        }
    }
}
