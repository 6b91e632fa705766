//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Cascade - cascading file resolver
///
/// Finds files across an ordered stack of overlay directories, where the
/// first root holding a file wins, and remembers the answers between runs.
#[derive(Parser, Debug)]
#[command(name = "cascade")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CASCADE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .cascade.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a file across the overlay roots
    Locate(LocateArgs),

    /// List files matching a filter in a directory of every root
    List(ListArgs),

    /// Inspect or clear the lookup cache
    Cache(CacheArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Search path overrides shared by `locate` and `list`
#[derive(Args, Debug, Default, Clone)]
pub struct RootArgs {
    /// Append an overlay root (lowest priority, repeatable)
    #[arg(short, long = "root")]
    pub roots: Vec<PathBuf>,

    /// Prepend an overlay root (highest persistent priority, repeatable)
    #[arg(long = "prepend")]
    pub prepend: Vec<PathBuf>,

    /// Flash root consulted ahead of all others for this lookup only
    #[arg(long = "flash")]
    pub flash: Vec<PathBuf>,

    /// Request root searched ahead of the persistent roots
    #[arg(long = "request-root")]
    pub request_roots: Vec<PathBuf>,

    /// Active module for the request
    #[arg(short, long)]
    pub module: Option<String>,

    /// Loaded package names (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub package: Vec<String>,
}

/// Arguments for the locate command
#[derive(Parser, Debug)]
pub struct LocateArgs {
    /// Directory relative to each root, e.g. "config"
    pub directory: String,

    /// File name, optionally namespaced ("Auth::login") or absolute
    pub name: String,

    /// Extension appended to the name (default: from config)
    #[arg(short, long)]
    pub ext: Option<String>,

    /// Return every match in root order instead of the first
    #[arg(short, long)]
    pub all: bool,

    /// Bypass the lookup cache
    #[arg(long)]
    pub no_cache: bool,

    #[command(flatten)]
    pub search: RootArgs,

    /// Output format
    #[arg(short, long, default_value = "plain")]
    pub format: OutputFormat,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Directory relative to each root; omit to list the roots themselves
    pub directory: Option<String>,

    /// Glob filter applied inside the directory
    #[arg(short = 'F', long, default_value = "*")]
    pub filter: String,

    #[command(flatten)]
    pub search: RootArgs,

    /// Output format
    #[arg(short, long, default_value = "plain")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for lookup results
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// One path per line
    Plain,
    /// JSON output
    Json,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show the persisted cache file and its entries
    Show {
        /// Output format
        #[arg(short, long, default_value = "plain")]
        format: OutputFormat,
    },

    /// Remove the persisted cache file
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the cache file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_locate() {
        let cli = Cli::parse_from(["cascade", "locate", "config", "db", "--ext", ".php", "--all"]);
        match cli.command {
            Commands::Locate(args) => {
                assert_eq!(args.directory, "config");
                assert_eq!(args.name, "db");
                assert_eq!(args.ext.as_deref(), Some(".php"));
                assert!(args.all);
                assert!(!args.no_cache);
            }
            _ => panic!("expected Locate command"),
        }
    }

    #[test]
    fn cli_parses_root_overrides() {
        let cli = Cli::parse_from([
            "cascade",
            "locate",
            "views",
            "home",
            "--root",
            "/srv/app",
            "-r",
            "/srv/core",
            "--flash",
            "/tmp/preview",
            "--package",
            "auth,blog",
        ]);
        match cli.command {
            Commands::Locate(args) => {
                assert_eq!(
                    args.search.roots,
                    vec![PathBuf::from("/srv/app"), PathBuf::from("/srv/core")]
                );
                assert_eq!(args.search.flash, vec![PathBuf::from("/tmp/preview")]);
                assert_eq!(args.search.package, vec!["auth", "blog"]);
                assert!(args.search.module.is_none());
            }
            _ => panic!("expected Locate command"),
        }
    }

    #[test]
    fn cli_parses_list_defaults() {
        let cli = Cli::parse_from(["cascade", "list", "lang"]);
        match cli.command {
            Commands::List(args) => {
                assert_eq!(args.directory.as_deref(), Some("lang"));
                assert_eq!(args.filter, "*");
            }
            _ => panic!("expected List command"),
        }
    }

    #[test]
    fn cli_parses_cache_clear() {
        let cli = Cli::parse_from(["cascade", "cache", "clear", "--yes"]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action: CacheAction::Clear { yes },
            }) => assert!(yes),
            _ => panic!("expected Cache Clear command"),
        }
    }

    #[test]
    fn cli_parses_config_init_force() {
        let cli = Cli::parse_from(["cascade", "config", "init", "--force"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Init { force }),
            }) => assert!(force),
            _ => panic!("expected Config Init command"),
        }
    }

    #[test]
    fn cli_no_local_flag() {
        let cli = Cli::parse_from(["cascade", "--no-local", "cache", "path"]);
        assert!(cli.no_local);
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["cascade", "cache", "path"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["cascade", "-v", "cache", "path"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["cascade", "-vv", "cache", "path"]);
        assert_eq!(cli.verbose, 2);
    }
}
