//! Line-oriented `key=value` properties text model.
use std::collections::BTreeMap;

/// Parsed properties of one configuration file.
pub type PropertiesMap = BTreeMap<String, String>;

/// Parse properties text into a key/value mapping.
///
/// Blank lines and lines starting with `#` or `!` are ignored, keys and values
/// are trimmed, a trailing backslash continues the logical line, and later
/// duplicate keys overwrite earlier ones.
pub fn parse_properties(text: &str) -> PropertiesMap {
    let mut properties = PropertiesMap::new();
    let mut pending = String::new();

    for raw in text.lines() {
        let line = raw.trim();
        if pending.is_empty() && (line.is_empty() || is_comment(line)) {
            continue;
        }
        if let Some(continued) = line.strip_suffix('\\') {
            pending.push_str(continued);
            continue;
        }
        pending.push_str(line);
        insert_line(&mut properties, &pending);
        pending.clear();
    }
    if !pending.is_empty() {
        insert_line(&mut properties, &pending);
    }

    properties
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.starts_with('!')
}

fn insert_line(properties: &mut PropertiesMap, line: &str) {
    let (key, value) = split_entry(line);
    let key = key.trim();
    if key.is_empty() {
        return;
    }
    properties.insert(key.to_string(), value.trim().to_string());
}

fn split_entry(line: &str) -> (&str, &str) {
    if let Some(split) = line.split_once('=') {
        return split;
    }
    if let Some(split) = line.split_once(':') {
        return split;
    }
    (line, "")
}
