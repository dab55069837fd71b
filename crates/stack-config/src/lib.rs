//! Layered configuration for Stack Manager.
//!
//! Configuration is assembled from several precedence tiers, lowest first:
//!
//! 1. **Defaults** - built-in values supplied by the host program
//! 2. **Organization** - `<config_dir>/stack-manager/config.toml`
//! 3. **Project** - `Stack.toml` at the project root
//! 4. **Stack** - `Stack.<stack>.toml` for the selected environment
//! 5. **Runtime** - `STACK_CONFIG__*` environment variables
//!
//! Each tier is loaded into an immutable [`ConfigLayer`] and kept in a
//! [`LayerStore`]. The [`ConfigMerger`] folds the layers into a single
//! [`ResolvedConfig`], from which every module receives a read-only
//! [`ModuleConfig`] slice.
//!
//! # Example
//!
//! ```
//! use stack_config::{ConfigLayer, ConfigMerger, ConfigNode, Precedence};
//! use serde_json::json;
//!
//! let defaults = ConfigLayer::from_node(
//!     Precedence::Defaults,
//!     "defaults",
//!     ConfigNode::from(json!({ "region": "us-east-1" })),
//! );
//! let stack = ConfigLayer::from_node(
//!     Precedence::Stack,
//!     "Stack.prod.toml",
//!     ConfigNode::from(json!({ "region": "us-west-2", "tags": { "env": "prod" } })),
//! );
//!
//! let resolved = ConfigMerger::new().merge([&defaults, &stack]).unwrap();
//! assert_eq!(resolved.get("region").and_then(|n| n.as_str()), Some("us-west-2"));
//! assert_eq!(resolved.get("tags.env").and_then(|n| n.as_str()), Some("prod"));
//! ```

pub mod error;
pub mod layer;
pub mod loader;
pub mod merge;
pub mod node;
pub mod resolved;
pub mod secret;

pub use error::{Error, Result};
pub use layer::{ConfigLayer, LayerStore, Precedence};
pub use loader::{Format, LayerLoader, env_tree, load_file, parse_scalar, parse_tree};
pub use merge::{ConfigMerger, MergePolicy};
pub use node::{ConfigNode, ConfigTree};
pub use resolved::{ModuleConfig, ResolvedConfig};
pub use secret::SecretHandle;
