//! [`TestProject`] builder for configuration loading scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use stack_config::LayerLoader;
use tempfile::TempDir;

/// A temporary project directory plus a private organization config
/// directory, so tests never read the real user configuration.
///
/// # Example
///
/// ```rust,no_run
/// use stack_test_utils::project::TestProject;
///
/// let project = TestProject::new()
///     .with_org_config("region: us-east-1\n")
///     .with_project_config("region = \"us-east-2\"\n")
///     .with_stack_config("prod", "[db]\nsize = 5\n");
///
/// let store = project.loader("prod").load().unwrap();
/// assert_eq!(store.len(), 4);
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create empty project and organization directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("project")).unwrap();
        fs::create_dir_all(temp_dir.path().join("org")).unwrap();
        Self { temp_dir }
    }

    /// Project root, where `Stack.*` files live.
    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join("project")
    }

    /// Organization-wide config directory.
    pub fn org_dir(&self) -> PathBuf {
        self.temp_dir.path().join("org")
    }

    /// Path of the default module catalog.
    pub fn catalog_path(&self) -> PathBuf {
        self.root().join("modules.toml")
    }

    /// Write `content` to `path` relative to the project root, creating
    /// parent directories.
    pub fn write(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.root().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();
        full_path
    }

    /// `Stack.toml`
    pub fn with_project_config(self, toml: &str) -> Self {
        self.write("Stack.toml", toml);
        self
    }

    /// `Stack.<stack>.toml`
    pub fn with_stack_config(self, stack: &str, toml: &str) -> Self {
        self.write(&format!("Stack.{stack}.toml"), toml);
        self
    }

    /// `<org>/config.yaml`
    pub fn with_org_config(self, yaml: &str) -> Self {
        fs::write(self.org_dir().join("config.yaml"), yaml).unwrap();
        self
    }

    /// `modules.toml`
    pub fn with_catalog(self, toml: &str) -> Self {
        self.write("modules.toml", toml);
        self
    }

    /// A loader bound to this project with an empty environment.
    pub fn loader(&self, stack: &str) -> LayerLoader {
        LayerLoader::new(self.root(), stack)
            .with_org_dir(self.org_dir())
            .with_env(Vec::<(String, String)>::new())
    }

    /// Read a file relative to the project root.
    pub fn read(&self, path: impl AsRef<Path>) -> String {
        let full_path = self.root().join(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }
}
