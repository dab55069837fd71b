//! Loading configuration layers from files and the environment
//!
//! The [`LayerLoader`] gathers one layer per precedence tier:
//!
//! 1. Defaults - a tree supplied by the host program
//! 2. Organization - `<config_dir>/stack-manager/config.{toml,yaml,yml,json}`
//! 3. Project - `<root>/Stack.{toml,yaml,yml,json}`
//! 4. Stack - `<root>/Stack.<stack>.{toml,yaml,yml,json}`
//! 5. Runtime - `STACK_CONFIG__*` environment variables
//!
//! Missing sources are skipped. A source that exists but cannot be parsed
//! is an error.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::layer::{ConfigLayer, LayerStore, Precedence};
use crate::node::{ConfigNode, ConfigTree};

/// Default prefix for runtime override variables
pub const ENV_PREFIX: &str = "STACK_CONFIG__";

/// Separator between path segments in override variable names
pub const ENV_SEPARATOR: &str = "__";

/// Serialization formats accepted for configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Yaml,
    Json,
}

impl Format {
    /// File extensions probed when looking for a source, in priority order
    pub const EXTENSIONS: [&'static str; 4] = ["toml", "yaml", "yml", "json"];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Format::Toml),
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }

    /// Detect the format of a file from its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| Error::UnsupportedFormat {
                path: path.to_path_buf(),
            })
    }
}

/// Parse configuration text into a tree.
///
/// The document root must be a table; an empty document is an empty tree.
///
/// # Arguments
///
/// * `format` - Serialization format of `text`
/// * `origin` - Description of where the text came from, used in errors
/// * `text` - The raw document
pub fn parse_tree(format: Format, origin: &str, text: &str) -> Result<ConfigTree> {
    let parse_error = |message: String| Error::Parse {
        origin: origin.to_string(),
        message,
    };

    let node = match format {
        Format::Toml => {
            let table: toml::Table = toml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
            ConfigNode::from(toml::Value::Table(table))
        }
        Format::Yaml => {
            let value: serde_yaml::Value =
                serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
            ConfigNode::from(value)
        }
        Format::Json => {
            if text.trim().is_empty() {
                ConfigNode::Null
            } else {
                let value: serde_json::Value =
                    serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?;
                ConfigNode::from(value)
            }
        }
    };

    match node {
        ConfigNode::Tree(tree) => Ok(tree),
        ConfigNode::Null => Ok(ConfigTree::new()),
        other => Err(parse_error(format!(
            "top-level value must be a table, found {}",
            other.kind()
        ))),
    }
}

/// Read a configuration file into a layer of the given tier.
pub fn load_file(precedence: Precedence, path: &Path) -> Result<ConfigLayer> {
    let format = Format::from_path(path)?;
    let origin = path.display().to_string();
    let content = fs::read_to_string(path)?;
    let tree = parse_tree(format, &origin, &content)?;
    Ok(ConfigLayer::new(precedence, origin, tree))
}

/// Interpret an environment value as the narrowest matching scalar.
///
/// Numbers are only produced when they print back to exactly the input
/// text, so values such as `007` or `1e3` stay strings.
pub fn parse_scalar(raw: &str) -> ConfigNode {
    let trimmed = raw.trim();
    match trimmed {
        "true" | "TRUE" | "True" => return ConfigNode::Bool(true),
        "false" | "FALSE" | "False" => return ConfigNode::Bool(false),
        _ => {}
    }
    if let Ok(i) = trimmed.parse::<i64>()
        && i.to_string() == trimmed
    {
        return ConfigNode::Integer(i);
    }
    if let Ok(f) = trimmed.parse::<f64>()
        && f.is_finite()
        && (f.to_string() == trimmed || format!("{f:?}") == trimmed)
    {
        return ConfigNode::Float(f);
    }
    ConfigNode::String(raw.to_string())
}

/// Keep the variables whose name and value are both valid UTF-8.
fn utf8_vars<I>(vars: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| match (key.to_str(), value.to_str()) {
            (Some(key), Some(value)) => Some((key.to_string(), value.to_string())),
            _ => {
                tracing::debug!(key = ?key, "Skipping environment variable that is not valid UTF-8");
                None
            }
        })
        .collect()
}

/// Build a tree from `PREFIX` + `a__b__c=value` style variables.
///
/// Path segments are lower-cased. Variables are applied in sorted order so
/// the result does not depend on environment iteration order; a later,
/// deeper variable replaces a scalar at an intermediate segment.
pub fn env_tree<I, K, V>(prefix: &str, vars: I) -> ConfigTree
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut matching: Vec<(String, String)> = vars
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .filter(|(k, _)| k.starts_with(prefix))
        .collect();
    matching.sort();

    let mut tree = ConfigTree::new();
    for (key, value) in matching {
        let segments: Vec<String> = key[prefix.len()..]
            .split(ENV_SEPARATOR)
            .filter(|s| !s.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();
        insert_path(&mut tree, &segments, parse_scalar(&value));
    }
    tree
}

fn insert_path(tree: &mut ConfigTree, segments: &[String], value: ConfigNode) {
    match segments {
        [] => {}
        [last] => {
            tree.insert(last.clone(), value);
        }
        [first, rest @ ..] => {
            let entry = tree
                .entry(first.clone())
                .or_insert_with(|| ConfigNode::Tree(ConfigTree::new()));
            if !matches!(entry, ConfigNode::Tree(_)) {
                *entry = ConfigNode::Tree(ConfigTree::new());
            }
            if let ConfigNode::Tree(child) = entry {
                insert_path(child, rest, value);
            }
        }
    }
}

/// Loads every precedence tier for a project and stack.
///
/// The organization directory and the environment are injectable so tests
/// never touch the real user configuration.
#[derive(Debug, Clone)]
pub struct LayerLoader {
    root: PathBuf,
    stack: String,
    org_dir_override: Option<PathBuf>,
    defaults: ConfigTree,
    env_prefix: String,
    env_override: Option<Vec<(String, String)>>,
}

impl LayerLoader {
    /// Create a loader for a project root and stack name
    pub fn new(root: impl Into<PathBuf>, stack: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            stack: stack.into(),
            org_dir_override: None,
            defaults: ConfigTree::new(),
            env_prefix: ENV_PREFIX.to_string(),
            env_override: None,
        }
    }

    /// Use a custom organization config directory
    pub fn with_org_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.org_dir_override = Some(dir.into());
        self
    }

    /// Built-in defaults forming the lowest layer
    pub fn with_defaults(mut self, defaults: ConfigTree) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Read runtime overrides from these pairs instead of the process env
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_override = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    fn org_dir(&self) -> Option<PathBuf> {
        if let Some(ref dir) = self.org_dir_override {
            return Some(dir.clone());
        }
        dirs::config_dir().map(|d| d.join("stack-manager"))
    }

    /// First existing `<dir>/<stem>.<ext>` in extension priority order
    fn find_source(dir: &Path, stem: &str) -> Option<PathBuf> {
        Format::EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{stem}.{ext}")))
            .find(|path| path.is_file())
    }

    fn load_optional(
        store: &mut LayerStore,
        precedence: Precedence,
        dir: &Path,
        stem: &str,
    ) -> Result<()> {
        match Self::find_source(dir, stem) {
            Some(path) => {
                tracing::debug!(?path, %precedence, "Loading configuration layer");
                store.insert(load_file(precedence, &path)?);
            }
            None => {
                tracing::debug!(?dir, stem, %precedence, "No configuration source found, skipping");
            }
        }
        Ok(())
    }

    /// Load all tiers into a fresh store.
    ///
    /// # Errors
    ///
    /// Returns an error if a source exists but cannot be read or parsed.
    pub fn load(&self) -> Result<LayerStore> {
        let mut store = LayerStore::new();

        store.insert(ConfigLayer::new(
            Precedence::Defaults,
            "defaults",
            self.defaults.clone(),
        ));

        if let Some(org_dir) = self.org_dir() {
            Self::load_optional(&mut store, Precedence::Organization, &org_dir, "config")?;
        }

        Self::load_optional(&mut store, Precedence::Project, &self.root, "Stack")?;

        let stack_stem = format!("Stack.{}", self.stack);
        Self::load_optional(&mut store, Precedence::Stack, &self.root, &stack_stem)?;

        let env = match &self.env_override {
            Some(vars) => env_tree(&self.env_prefix, vars.iter().cloned()),
            None => env_tree(&self.env_prefix, utf8_vars(std::env::vars_os())),
        };
        if !env.is_empty() {
            tracing::debug!(keys = env.len(), "Loaded runtime overrides from environment");
            store.insert(ConfigLayer::new(Precedence::Runtime, "env", env));
        }

        Ok(store)
    }
}
