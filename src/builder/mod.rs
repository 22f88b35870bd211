//! Version-dispatched property builders.
//!
//! A [`ServiceBuilder`] is a registration table of transforms for one service.
//! Building a service runs the always-on daemon identity step, every
//! registered transform against the primary snapshot, the custom property
//! complement, and the runtime arguments step, yielding fragments ready for
//! the inventory merger.
use crate::catalog::Service;
use crate::gateway::{Gateway, ServiceFacts};
use crate::inventory::Fragment;
use crate::loader::FileProperties;
use crate::locator::DEFAULT_KEY;
use crate::properties::PropertiesMap;
use std::collections::BTreeSet;

mod dispatch;
mod registry;
mod runtime;
mod services;
mod shared;
mod tracker;

pub use dispatch::run_transforms;
pub use registry::{BuilderRegistry, PlatformVersion, ResolvedBy};
pub use tracker::{complement, CustomProperties};

/// Inputs shared by every transform of one build pass.
pub struct BuildContext<'a> {
    pub gateway: &'a dyn Gateway,
    pub service: Service,
    pub hosts: &'a [String],
    /// Unit facts of the first host.
    pub facts: Option<&'a ServiceFacts>,
    /// Every file snapshot of the first host, keyed by file-key.
    pub files: &'a FileProperties,
}

impl BuildContext<'_> {
    pub fn group(&self) -> &'static str {
        self.service.group()
    }

    /// Variable name namespaced by the service group.
    pub fn var(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.group())
    }

    pub fn file(&self, file_key: &str) -> Option<&PropertiesMap> {
        self.files.get(file_key)
    }

    pub fn fragment(&self) -> Fragment {
        Fragment::new(self.group())
    }

    /// Catalog port hint, used only when nothing was discovered.
    pub fn default_port(&self) -> Option<u16> {
        self.service.descriptor().default_ports.first().copied()
    }
}

/// Source keys considered by transforms during one build pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedKeys {
    keys: BTreeSet<String>,
}

impl MappedKeys {
    pub fn consider(&mut self, key: &str) {
        self.keys.insert(key.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Considered keys that actually occur in `snapshot`.
    pub fn within(&self, snapshot: &PropertiesMap) -> BTreeSet<String> {
        self.keys
            .iter()
            .filter(|key| snapshot.contains_key(*key))
            .cloned()
            .collect()
    }
}

/// Snapshot access that records every key a transform reads.
pub struct PropertyReader<'a> {
    snapshot: &'a PropertiesMap,
    mapped: &'a mut MappedKeys,
}

impl<'a> PropertyReader<'a> {
    pub fn new(snapshot: &'a PropertiesMap, mapped: &'a mut MappedKeys) -> Self {
        Self { snapshot, mapped }
    }

    /// Read a key, marking it mapped whether or not it is present.
    pub fn get(&mut self, key: &str) -> Option<&'a str> {
        self.mapped.consider(key);
        self.snapshot
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn has(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Mark keys that a transform accounts for without reading their values.
    pub fn consider(&mut self, keys: &[&str]) {
        for key in keys {
            self.mapped.consider(key);
        }
    }
}

pub type TransformFn = fn(&BuildContext<'_>, &mut PropertyReader<'_>) -> Fragment;

#[derive(Clone, Copy)]
pub struct Transform {
    pub name: &'static str,
    pub apply: TransformFn,
}

impl std::fmt::Debug for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transform").field("name", &self.name).finish()
    }
}

/// The transform table of one service's property semantics.
#[derive(Debug, Clone)]
pub struct ServiceBuilder {
    service: Service,
    name: &'static str,
    primary_file: &'static str,
    transforms: Vec<Transform>,
}

/// Fragments of one service, in merge order.
#[derive(Debug, Default)]
pub struct BuildOutput {
    pub fragments: Vec<Fragment>,
    pub mapped: BTreeSet<String>,
    pub custom: PropertiesMap,
}

impl ServiceBuilder {
    pub fn new(service: Service, name: &'static str) -> Self {
        Self {
            service,
            name,
            primary_file: DEFAULT_KEY,
            transforms: Vec::new(),
        }
    }

    /// Use a flagged file instead of the positional one as primary snapshot.
    pub fn primary_file(mut self, file_key: &'static str) -> Self {
        self.primary_file = file_key;
        self
    }

    pub fn transform(mut self, name: &'static str, apply: TransformFn) -> Self {
        self.transforms.push(Transform { name, apply });
        self
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn primary_file_key(&self) -> &'static str {
        self.primary_file
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// Run the full build pass for one service.
    pub fn build(&self, context: &BuildContext<'_>, skip: &BTreeSet<String>) -> BuildOutput {
        let empty = PropertiesMap::new();
        let primary = context.file(self.primary_file).unwrap_or(&empty);
        if primary.is_empty() {
            tracing::warn!(
                service = %self.service,
                file_key = self.primary_file,
                "primary snapshot is empty, transforms see no properties"
            );
        }

        let mut fragments = vec![runtime::daemon_identity(context)];
        let pass = run_transforms(self, context, primary);
        fragments.extend(pass.fragments);
        let custom = complement(primary, &pass.mapped, skip);
        fragments.push(CustomProperties::new(self.service, custom.clone()).into_fragment());
        fragments.push(runtime::runtime_arguments(context));

        BuildOutput {
            fragments,
            mapped: pass.mapped.within(primary),
            custom,
        }
    }
}
