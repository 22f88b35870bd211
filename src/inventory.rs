//! Inventory sink and fragment merger.
//!
//! The inventory is laid out the way Ansible YAML inventories are
//! (`group -> {hosts, vars}`), serialized as JSON, which YAML loaders accept.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// One unit of builder output: variables destined for a single group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fragment {
    pub group: String,
    pub properties: Map<String, Value>,
}

impl Fragment {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            properties: Map::new(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Check the fragment is well formed before it touches the inventory.
    pub fn validate(&self) -> Result<()> {
        if self.group.trim().is_empty() {
            return Err(anyhow!("fragment has no group"));
        }
        for key in self.properties.keys() {
            if !is_variable_name(key) {
                return Err(anyhow!(
                    "fragment for group {:?} has invalid variable name {key:?}",
                    self.group
                ));
            }
        }
        Ok(())
    }
}

fn is_variable_name(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Destination for discovered variables.
pub trait InventorySink {
    /// Group name -> member hosts, in inventory order.
    fn groups(&self) -> BTreeMap<String, Vec<String>>;
    fn set_variable(&mut self, group: &str, key: &str, value: Value);
}

/// Apply a fragment to the inventory, last write wins per (group, key).
///
/// A malformed fragment is rejected as a whole and logged; returns whether
/// the fragment was applied.
pub fn merge(inventory: &mut dyn InventorySink, fragment: &Fragment) -> bool {
    if let Err(err) = fragment.validate() {
        tracing::error!(error = %err, "rejected malformed fragment");
        return false;
    }
    for (key, value) in &fragment.properties {
        inventory.set_variable(&fragment.group, key, value.clone());
    }
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventoryGroup {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub hosts: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub vars: Map<String, Value>,
    /// Nested groups; `null` stands for a child defined elsewhere.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, Option<InventoryGroup>>,
}

/// Direct members of one group name, merged over every place it is defined.
#[derive(Debug, Default)]
struct GroupMembers {
    hosts: Vec<String>,
    children: Vec<String>,
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

fn index_group(name: &str, group: &InventoryGroup, index: &mut BTreeMap<String, GroupMembers>) {
    {
        let members = index.entry(name.to_string()).or_default();
        for host in group.hosts.keys() {
            push_unique(&mut members.hosts, host);
        }
        for child in group.children.keys() {
            push_unique(&mut members.children, child);
        }
    }
    for (child, nested) in &group.children {
        match nested {
            Some(nested) => index_group(child, nested, index),
            None => {
                index.entry(child.clone()).or_default();
            }
        }
    }
}

/// Hosts of `name` followed by the hosts of its descendants, each host once.
fn resolve_hosts(
    name: &str,
    index: &BTreeMap<String, GroupMembers>,
    visited: &mut BTreeSet<String>,
    hosts: &mut Vec<String>,
) {
    if !visited.insert(name.to_string()) {
        return;
    }
    let Some(members) = index.get(name) else {
        return;
    };
    for host in &members.hosts {
        push_unique(hosts, host);
    }
    for child in &members.children {
        resolve_hosts(child, index, visited, hosts);
    }
}

/// In-memory inventory shared by every service pass of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    groups: BTreeMap<String, InventoryGroup>,
}

impl Inventory {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("read inventory {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parse inventory JSON {}", path.display()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("create inventory output dir")?;
        }
        fs::write(path, self.to_json()?.as_bytes())
            .with_context(|| format!("write {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize inventory")
    }

    /// Hosts of one group including those of its child groups, in inventory
    /// order.
    pub fn hosts(&self, group: &str) -> Vec<String> {
        let index = self.index();
        let mut hosts = Vec::new();
        resolve_hosts(group, &index, &mut BTreeSet::new(), &mut hosts);
        hosts
    }

    fn index(&self) -> BTreeMap<String, GroupMembers> {
        let mut index = BTreeMap::new();
        for (name, group) in &self.groups {
            index_group(name, group, &mut index);
        }
        index
    }
}

#[cfg(test)]
impl Inventory {
    pub fn add_host(&mut self, group: &str, host: &str) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .hosts
            .insert(host.to_string(), Value::Object(Map::new()));
    }

    pub fn variable(&self, group: &str, key: &str) -> Option<&Value> {
        self.groups.get(group)?.vars.get(key)
    }

    pub fn group(&self, group: &str) -> Option<&InventoryGroup> {
        self.groups.get(group)
    }
}

#[cfg(test)]
impl Fragment {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

impl InventorySink for Inventory {
    fn groups(&self) -> BTreeMap<String, Vec<String>> {
        let index = self.index();
        index
            .keys()
            .map(|name| {
                let mut hosts = Vec::new();
                resolve_hosts(name, &index, &mut BTreeSet::new(), &mut hosts);
                (name.clone(), hosts)
            })
            .collect()
    }

    fn set_variable(&mut self, group: &str, key: &str, value: Value) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .vars
            .insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn later_merge_wins_for_same_key() {
        let mut inventory = Inventory::default();
        assert!(merge(
            &mut inventory,
            &Fragment::new("kafka_connect").with("kafka_connect_rest_port", 8083)
        ));
        assert!(merge(
            &mut inventory,
            &Fragment::new("kafka_connect").with("kafka_connect_rest_port", 8443)
        ));
        assert_eq!(
            inventory.variable("kafka_connect", "kafka_connect_rest_port"),
            Some(&json!(8443))
        );
    }

    #[test]
    fn groups_are_created_on_first_write() {
        let mut inventory = Inventory::default();
        assert!(merge(&mut inventory, &Fragment::new("all").with("ssl_enabled", true)));
        assert_eq!(inventory.variable("all", "ssl_enabled"), Some(&json!(true)));
        assert!(inventory.hosts("all").is_empty());
    }

    #[test]
    fn malformed_fragment_is_rejected_whole() {
        let mut inventory = Inventory::default();
        let fragment = Fragment::new("kafka_connect")
            .with("kafka_connect_group_id", "connect")
            .with("not a variable", 1);
        assert!(!merge(&mut inventory, &fragment));
        assert_eq!(inventory.group("kafka_connect"), None);

        assert!(!merge(&mut inventory, &Fragment::new("  ").with("ok", 1)));
        assert_eq!(inventory, Inventory::default());
    }

    #[test]
    fn parses_ansible_style_layout_in_host_order() {
        let inventory: Inventory = serde_json::from_value(json!({
            "kafka_connect": {"hosts": {"connect-2": {}, "connect-1": {}}},
            "all": {"vars": {"ansible_user": "ops"}}
        }))
        .unwrap();
        assert_eq!(inventory.hosts("kafka_connect"), vec!["connect-2", "connect-1"]);
        assert_eq!(inventory.groups()["all"], Vec::<String>::new());
        assert_eq!(inventory.variable("all", "ansible_user"), Some(&json!("ops")));
    }

    #[test]
    fn child_groups_contribute_their_hosts() {
        let inventory: Inventory = serde_json::from_value(json!({
            "kafka_cluster": {
                "hosts": {"edge-1": {}},
                "children": {
                    "kafka_broker": {"hosts": {"broker-1": {}, "broker-2": {}}},
                    "zookeeper": null
                }
            },
            "zookeeper": {"hosts": {"zk-1": {}}},
            "kafka_connect": {"children": {"kafka_cluster": {}}}
        }))
        .unwrap();

        let groups = inventory.groups();
        assert_eq!(groups["kafka_broker"], vec!["broker-1", "broker-2"]);
        assert_eq!(
            groups["kafka_cluster"],
            vec!["edge-1", "broker-1", "broker-2", "zk-1"]
        );
        assert_eq!(groups["kafka_connect"], groups["kafka_cluster"]);
        assert_eq!(inventory.hosts("zookeeper"), vec!["zk-1"]);
    }

    #[test]
    fn cyclic_children_resolve_once() {
        let inventory: Inventory = serde_json::from_value(json!({
            "a": {"hosts": {"h-1": {}}, "children": {"b": null}},
            "b": {"hosts": {"h-2": {}}, "children": {"a": null}}
        }))
        .unwrap();
        assert_eq!(inventory.hosts("a"), vec!["h-1", "h-2"]);
        assert_eq!(inventory.hosts("b"), vec!["h-2", "h-1"]);
    }

    #[test]
    fn children_survive_a_write_round() {
        let source = json!({
            "kafka_cluster": {"children": {"kafka_connect": {"hosts": {"connect-1": {}}}}}
        });
        let mut inventory: Inventory = serde_json::from_value(source.clone()).unwrap();
        inventory.set_variable("kafka_connect", "kafka_connect_group_id", json!("connect"));
        let value: Value = serde_json::from_str(&inventory.to_json().unwrap()).unwrap();
        assert_eq!(value["kafka_cluster"], source["kafka_cluster"]);
        assert_eq!(
            value["kafka_connect"],
            json!({"vars": {"kafka_connect_group_id": "connect"}})
        );
    }

    #[test]
    fn serializes_without_empty_sections() {
        let mut inventory = Inventory::default();
        inventory.add_host("zookeeper", "zk-1");
        let value: Value = serde_json::from_str(&inventory.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"zookeeper": {"hosts": {"zk-1": {}}}}));
    }
}
