//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Stack Manager - Resolve layered configuration and plan module deployments
#[derive(Parser, Debug)]
#[command(name = "stack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Project location and target stack
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ProjectArgs {
    /// Project root containing Stack.* files
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Stack to resolve (selects Stack.<stack>.* overrides)
    #[arg(short, long, env = "STACK_NAME", default_value = "dev")]
    pub stack: String,

    /// Organization config directory (defaults to the user config dir)
    #[arg(long, env = "STACK_ORG_DIR")]
    pub org_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print the merged configuration
    ///
    /// Secure values are shown as secret handles, never as plaintext.
    ///
    /// Examples:
    ///   stack resolve --stack prod
    ///   stack resolve --stack prod --module db --json
    Resolve {
        #[command(flatten)]
        project: ProjectArgs,

        /// Only print this module's configuration slice
        #[arg(short, long)]
        module: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Print the deployment order for enabled modules
    Plan {
        #[command(flatten)]
        project: ProjectArgs,

        /// Module catalog (defaults to <root>/modules.toml)
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List modules declared in a catalog
    Modules {
        /// Module catalog file
        #[arg(short, long, default_value = "modules.toml")]
        catalog: PathBuf,
    },
}
