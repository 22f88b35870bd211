//! Builder registry keyed by service and platform version.
//!
//! Several platform versions share one builder instance; a binding only
//! records the version-qualified name it answers to.
use super::services;
use super::ServiceBuilder;
use crate::catalog::Service;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Platform versions every service registers a builder for.
const REGISTERED_VERSIONS: [PlatformVersion; 8] = [
    PlatformVersion::new(6, 0),
    PlatformVersion::new(6, 1),
    PlatformVersion::new(6, 2),
    PlatformVersion::new(7, 0),
    PlatformVersion::new(7, 1),
    PlatformVersion::new(7, 2),
    PlatformVersion::new(7, 3),
    PlatformVersion::new(7, 4),
];

/// `major.minor` platform version; patch levels are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformVersion {
    pub major: u32,
    pub minor: u32,
}

impl PlatformVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Version token used in binding names: dots removed, `7.2` -> `72`.
    pub fn token(self) -> String {
        format!("{}{}", self.major, self.minor)
    }
}

impl FromStr for PlatformVersion {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        let mut parts = input.trim().split('.');
        let major = parts
            .next()
            .filter(|part| !part.is_empty())
            .ok_or_else(|| anyhow!("empty platform version"))?
            .parse()
            .map_err(|_| anyhow!("invalid platform version {input:?}"))?;
        let minor = match parts.next() {
            Some(part) => part
                .parse()
                .map_err(|_| anyhow!("invalid platform version {input:?}"))?,
            None => 0,
        };
        Ok(Self { major, minor })
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedBy {
    /// A builder is registered for exactly the requested version.
    Exact,
    /// Nearest registered version below the requested one.
    Floor,
    /// No registered version applies; the service's base builder.
    Default,
}

/// Outcome of resolving one service for one requested version.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub binding: String,
    pub resolved_by: ResolvedBy,
    pub builder: Arc<ServiceBuilder>,
}

#[derive(Debug, Clone)]
struct ServiceBindings {
    base: Arc<ServiceBuilder>,
    versions: BTreeMap<PlatformVersion, Arc<ServiceBuilder>>,
}

#[derive(Debug, Clone, Default)]
pub struct BuilderRegistry {
    services: BTreeMap<Service, ServiceBindings>,
}

impl BuilderRegistry {
    /// Registry populated with every built-in service builder.
    pub fn standard() -> Self {
        let mut registry = Self::default();
        for service in Service::ALL {
            let base = Arc::new(services::base_builder(service));
            registry.register_base(base.clone());
            for version in REGISTERED_VERSIONS {
                let builder = services::versioned_builder(service, version)
                    .map(Arc::new)
                    .unwrap_or_else(|| base.clone());
                registry.register(version, builder);
            }
        }
        registry
    }

    pub fn register_base(&mut self, builder: Arc<ServiceBuilder>) {
        let service = builder.service();
        match self.services.get_mut(&service) {
            Some(bindings) => bindings.base = builder,
            None => {
                self.services.insert(
                    service,
                    ServiceBindings {
                        base: builder,
                        versions: BTreeMap::new(),
                    },
                );
            }
        }
    }

    /// Bind a version to a builder; the service must already have a base.
    pub fn register(&mut self, version: PlatformVersion, builder: Arc<ServiceBuilder>) {
        let service = builder.service();
        match self.services.get_mut(&service) {
            Some(bindings) => {
                bindings.versions.insert(version, builder);
            }
            None => tracing::error!(service = %service, %version, "no base builder registered"),
        }
    }

    /// Resolve the builder for `service` at `requested`.
    ///
    /// Exact binding first, then the nearest registered version at or below
    /// the request, then the base builder. Unparsable versions get the base.
    pub fn resolve(&self, service: Service, requested: &str) -> Option<Resolution> {
        let bindings = self.services.get(&service)?;
        let base_resolution = || Resolution {
            binding: format!("{}_base", service.name()),
            resolved_by: ResolvedBy::Default,
            builder: bindings.base.clone(),
        };
        let version = match requested.parse::<PlatformVersion>() {
            Ok(version) => version,
            Err(err) => {
                tracing::warn!(service = %service, error = %err, "using base builder");
                return Some(base_resolution());
            }
        };
        let Some((bound, builder)) = bindings.versions.range(..=version).next_back() else {
            return Some(base_resolution());
        };
        Some(Resolution {
            binding: format!("{}_{}", service.name(), bound.token()),
            resolved_by: if *bound == version {
                ResolvedBy::Exact
            } else {
                ResolvedBy::Floor
            },
            builder: builder.clone(),
        })
    }

    /// Version-qualified binding names of one service, oldest first.
    pub fn bindings(&self, service: Service) -> Vec<String> {
        self.services
            .get(&service)
            .map(|bindings| {
                bindings
                    .versions
                    .keys()
                    .map(|version| format!("{}_{}", service.name(), version.token()))
                    .collect()
            })
            .unwrap_or_default()
    }
}
