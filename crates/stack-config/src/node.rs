//! Configuration tree nodes
//!
//! A configuration source is parsed into a tree of [`ConfigNode`] values.
//! Tables use ordered keys so that every rendering of a tree is stable.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

use crate::secret::SecretHandle;

/// Key used by configuration files to mark a value as secure:
/// `password = { secure = "hunter2" }`.
pub const SECURE_MARKER: &str = "secure";

/// Text substituted for plaintext whenever a secure node is rendered.
pub const REDACTED: &str = "[redacted]";

/// A table of configuration nodes keyed by name
pub type ConfigTree = BTreeMap<String, ConfigNode>;

/// A single node in a configuration tree
#[derive(Clone, PartialEq)]
pub enum ConfigNode {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<ConfigNode>),
    Tree(ConfigTree),
    /// Plaintext marked as sensitive, awaiting replacement by a handle.
    Secure(String),
    /// Reference to a value held by a secret backend.
    Secret(SecretHandle),
}

impl ConfigNode {
    /// Short name of the node's shape, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigNode::Null => "null",
            ConfigNode::Bool(_) => "bool",
            ConfigNode::Integer(_) => "integer",
            ConfigNode::Float(_) => "float",
            ConfigNode::String(_) => "string",
            ConfigNode::List(_) => "list",
            ConfigNode::Tree(_) => "tree",
            ConfigNode::Secure(_) => "secure value",
            ConfigNode::Secret(_) => "secret handle",
        }
    }

    /// True for every node that is neither a list nor a tree.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, ConfigNode::List(_) | ConfigNode::Tree(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigNode::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigNode::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigNode::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigNode::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigNode::Float(f) => Some(*f),
            ConfigNode::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigNode]> {
        match self {
            ConfigNode::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&ConfigTree> {
        match self {
            ConfigNode::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_secret(&self) -> Option<&SecretHandle> {
        match self {
            ConfigNode::Secret(handle) => Some(handle),
            _ => None,
        }
    }

    /// Consume the node, returning its table if it is a tree.
    pub fn into_tree(self) -> Option<ConfigTree> {
        match self {
            ConfigNode::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// Look up a child of a tree node by key.
    pub fn child(&self, key: &str) -> Option<&ConfigNode> {
        self.as_tree().and_then(|tree| tree.get(key))
    }

    /// Look up a descendant by dotted path (`network.subnets`).
    ///
    /// An empty path returns the node itself.
    pub fn lookup(&self, path: &str) -> Option<&ConfigNode> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// True if any node in this subtree is still a plaintext secure value.
    pub fn contains_plaintext(&self) -> bool {
        match self {
            ConfigNode::Secure(_) => true,
            ConfigNode::List(items) => items.iter().any(ConfigNode::contains_plaintext),
            ConfigNode::Tree(tree) => tree.values().any(ConfigNode::contains_plaintext),
            _ => false,
        }
    }

    /// Convert into a JSON value suitable for typed deserialization.
    ///
    /// Secret handles become their URI string and plaintext secure values
    /// are redacted.
    pub fn to_json(&self) -> Value {
        match self {
            ConfigNode::Null => Value::Null,
            ConfigNode::Bool(b) => Value::Bool(*b),
            ConfigNode::Integer(i) => Value::from(*i),
            ConfigNode::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ConfigNode::String(s) => Value::String(s.clone()),
            ConfigNode::List(items) => Value::Array(items.iter().map(ConfigNode::to_json).collect()),
            ConfigNode::Tree(tree) => Value::Object(
                tree.iter()
                    .map(|(key, node)| (key.clone(), node.to_json()))
                    .collect(),
            ),
            ConfigNode::Secure(_) => Value::String(REDACTED.to_string()),
            ConfigNode::Secret(handle) => Value::String(handle.to_string()),
        }
    }
}

/// Recognise `{ secure = "..." }` tables.
fn secure_marker<'a, I>(mut entries: I, len: usize) -> Option<String>
where
    I: Iterator<Item = (&'a str, Option<&'a str>)>,
{
    if len != 1 {
        return None;
    }
    match entries.next() {
        Some((SECURE_MARKER, Some(text))) => Some(text.to_string()),
        _ => None,
    }
}

impl fmt::Debug for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigNode::Null => f.write_str("Null"),
            ConfigNode::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            ConfigNode::Integer(i) => f.debug_tuple("Integer").field(i).finish(),
            ConfigNode::Float(v) => f.debug_tuple("Float").field(v).finish(),
            ConfigNode::String(s) => f.debug_tuple("String").field(s).finish(),
            ConfigNode::List(items) => f.debug_tuple("List").field(items).finish(),
            ConfigNode::Tree(tree) => f.debug_tuple("Tree").field(tree).finish(),
            ConfigNode::Secure(_) => f.debug_tuple("Secure").field(&REDACTED).finish(),
            ConfigNode::Secret(handle) => f.debug_tuple("Secret").field(handle).finish(),
        }
    }
}

impl fmt::Display for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigNode::Null => f.write_str("null"),
            ConfigNode::Bool(b) => write!(f, "{b}"),
            ConfigNode::Integer(i) => write!(f, "{i}"),
            ConfigNode::Float(v) => write!(f, "{v}"),
            ConfigNode::String(s) => f.write_str(s),
            ConfigNode::List(items) => write!(f, "[{} items]", items.len()),
            ConfigNode::Tree(tree) => write!(f, "{{{} keys}}", tree.len()),
            ConfigNode::Secure(_) => f.write_str(REDACTED),
            ConfigNode::Secret(handle) => write!(f, "{handle}"),
        }
    }
}

impl Serialize for ConfigNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConfigNode::Null => serializer.serialize_unit(),
            ConfigNode::Bool(b) => serializer.serialize_bool(*b),
            ConfigNode::Integer(i) => serializer.serialize_i64(*i),
            ConfigNode::Float(v) => serializer.serialize_f64(*v),
            ConfigNode::String(s) => serializer.serialize_str(s),
            ConfigNode::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ConfigNode::Tree(tree) => {
                let mut map = serializer.serialize_map(Some(tree.len()))?;
                for (key, node) in tree {
                    map.serialize_entry(key, node)?;
                }
                map.end()
            }
            ConfigNode::Secure(_) => serializer.serialize_str(REDACTED),
            ConfigNode::Secret(handle) => serializer.collect_str(handle),
        }
    }
}

impl From<Value> for ConfigNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ConfigNode::Null,
            Value::Bool(b) => ConfigNode::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ConfigNode::Integer(i),
                None => ConfigNode::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => ConfigNode::String(s),
            Value::Array(items) => ConfigNode::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                let marker = secure_marker(
                    map.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                    map.len(),
                );
                match marker {
                    Some(text) => ConfigNode::Secure(text),
                    None => ConfigNode::Tree(
                        map.into_iter()
                            .map(|(key, value)| (key, Self::from(value)))
                            .collect(),
                    ),
                }
            }
        }
    }
}

impl From<toml::Value> for ConfigNode {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::Boolean(b) => ConfigNode::Bool(b),
            toml::Value::Integer(i) => ConfigNode::Integer(i),
            toml::Value::Float(f) => ConfigNode::Float(f),
            toml::Value::String(s) => ConfigNode::String(s),
            toml::Value::Datetime(dt) => ConfigNode::String(dt.to_string()),
            toml::Value::Array(items) => {
                ConfigNode::List(items.into_iter().map(Self::from).collect())
            }
            toml::Value::Table(table) => {
                let marker = secure_marker(
                    table.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                    table.len(),
                );
                match marker {
                    Some(text) => ConfigNode::Secure(text),
                    None => ConfigNode::Tree(
                        table
                            .into_iter()
                            .map(|(key, value)| (key, Self::from(value)))
                            .collect(),
                    ),
                }
            }
        }
    }
}

impl From<serde_yaml::Value> for ConfigNode {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value as Yaml;

        match value {
            Yaml::Null => ConfigNode::Null,
            Yaml::Bool(b) => ConfigNode::Bool(b),
            Yaml::Number(n) => match n.as_i64() {
                Some(i) => ConfigNode::Integer(i),
                None => ConfigNode::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Yaml::String(s) => ConfigNode::String(s),
            Yaml::Sequence(items) => {
                ConfigNode::List(items.into_iter().map(Self::from).collect())
            }
            Yaml::Mapping(mapping) => {
                let marker = secure_marker(
                    mapping.iter().map(|(k, v)| (k.as_str().unwrap_or_default(), v.as_str())),
                    mapping.len(),
                );
                if let Some(text) = marker {
                    return ConfigNode::Secure(text);
                }
                ConfigNode::Tree(
                    mapping
                        .into_iter()
                        .map(|(key, value)| (yaml_key(key), Self::from(value)))
                        .collect(),
                )
            }
            Yaml::Tagged(tagged) => Self::from(tagged.value),
        }
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        other => ConfigNode::from(other).to_string(),
    }
}

impl From<ConfigTree> for ConfigNode {
    fn from(tree: ConfigTree) -> Self {
        ConfigNode::Tree(tree)
    }
}

impl From<&str> for ConfigNode {
    fn from(s: &str) -> Self {
        ConfigNode::String(s.to_string())
    }
}

impl From<String> for ConfigNode {
    fn from(s: String) -> Self {
        ConfigNode::String(s)
    }
}

impl From<bool> for ConfigNode {
    fn from(b: bool) -> Self {
        ConfigNode::Bool(b)
    }
}

impl From<i64> for ConfigNode {
    fn from(i: i64) -> Self {
        ConfigNode::Integer(i)
    }
}

impl From<SecretHandle> for ConfigNode {
    fn from(handle: SecretHandle) -> Self {
        ConfigNode::Secret(handle)
    }
}
