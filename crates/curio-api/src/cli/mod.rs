//! CLI command definitions for the `curio` binary.

pub mod cache;
pub mod key;
pub mod quota;
pub mod recommend;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use curio_types::request::{
    DEFAULT_DIVERSITY_WEIGHT, DEFAULT_MAX_RESULTS, DEFAULT_QUALITY_THRESHOLD, EnginePreference,
};

/// Recommend saved content for what you are working on.
#[derive(Parser)]
#[command(name = "curio", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Also export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Content snapshot to load (defaults to `<data dir>/content.json`).
    #[arg(long, global = true, env = "CURIO_CONTENT")]
    pub content: Option<PathBuf>,

    /// Do not load the local embedding model.
    #[arg(long, global = true)]
    pub no_embeddings: bool,

    /// Derive the vault key from this password instead of `<data dir>/vault.key`.
    #[arg(long, global = true, env = "CURIO_VAULT_PASSWORD", hide_env_values = true)]
    pub vault_password: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank saved content for a query or project.
    Recommend(RecommendArgs),

    /// Show a user's LLM quota usage.
    Quota {
        /// User identifier.
        #[arg(short, long)]
        user: String,
    },

    /// Drop every cached recommendation list for a user.
    Invalidate {
        /// User identifier.
        #[arg(short, long)]
        user: String,
    },

    /// Manage a user's own LLM API key.
    Key {
        #[command(subcommand)]
        action: KeyCommand,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Args)]
pub struct RecommendArgs {
    /// Free-text query (may be omitted when --project is given).
    #[arg(default_value = "")]
    pub query: String,

    /// User identifier.
    #[arg(short, long)]
    pub user: String,

    /// Project to recommend for.
    #[arg(long)]
    pub project: Option<i64>,

    /// Task inside the project.
    #[arg(long, requires = "project")]
    pub task: Option<i64>,

    /// Your stack, comma separated (e.g. react,typescript).
    #[arg(long, value_delimiter = ',')]
    pub tech: Vec<String>,

    /// Engine: fast, context, ml or auto.
    #[arg(long, default_value = "auto")]
    pub engine: EnginePreference,

    /// Maximum results (capped at 50).
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_RESULTS)]
    pub max_results: usize,

    /// Diversity weight in [0, 1].
    #[arg(long, default_value_t = DEFAULT_DIVERSITY_WEIGHT)]
    pub diversity: f64,

    /// Minimum quality score (0-10).
    #[arg(long, default_value_t = DEFAULT_QUALITY_THRESHOLD)]
    pub min_quality: u8,
}

#[derive(Subcommand)]
pub enum KeyCommand {
    /// Store (or replace) a user's key. Prompts when --value is omitted.
    Set {
        #[arg(short, long)]
        user: String,

        /// Key value (script mode; prefer the prompt).
        #[arg(long)]
        value: Option<String>,
    },

    /// Remove a user's key.
    #[command(alias = "rm")]
    Delete {
        #[arg(short, long)]
        user: String,
    },

    /// Show whether a user has a key (masked).
    Show {
        #[arg(short, long)]
        user: String,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_recommend_args_parse() {
        let cli = Cli::try_parse_from([
            "curio", "recommend", "learn react hooks", "--user", "alice", "--tech", "react,hooks",
            "--engine", "ml", "-n", "5",
        ])
        .unwrap();
        let Commands::Recommend(args) = cli.command else {
            panic!("expected recommend");
        };
        assert_eq!(args.query, "learn react hooks");
        assert_eq!(args.tech, vec!["react", "hooks"]);
        assert_eq!(args.engine, EnginePreference::Ml);
        assert_eq!(args.max_results, 5);
        assert_eq!(args.min_quality, DEFAULT_QUALITY_THRESHOLD);
    }

    #[test]
    fn test_task_requires_project() {
        assert!(Cli::try_parse_from(["curio", "recommend", "--user", "a", "--task", "3"]).is_err());
    }

    #[test]
    fn test_key_subcommands_parse() {
        let cli = Cli::try_parse_from(["curio", "key", "rm", "--user", "alice"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Key {
                action: KeyCommand::Delete { .. }
            }
        ));
    }
}
