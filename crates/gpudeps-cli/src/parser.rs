//! Root CLI structure and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Fetch, verify, cache and install GPU runtime libraries and vendor tools.
#[derive(Parser)]
#[command(name = "gpudeps")]
#[command(version)]
pub struct Cli {
    /// Keep cache, libraries and config under this directory
    #[arg(long, global = true, env = "GPUDEPS_HOME")]
    pub home: Option<PathBuf>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Refresh the catalog from the release index
    Sync {
        #[arg(long)]
        os: Option<String>,
        #[arg(long)]
        arch: Option<String>,
    },

    /// List catalog entries
    List {
        #[arg(long)]
        os: Option<String>,
        #[arg(long)]
        arch: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "lib-version")]
        version: Option<String>,
    },

    /// Download an artifact into the cache
    Download {
        name: String,
        #[arg(long = "lib-version")]
        version: Option<String>,
    },

    /// Download (if needed) and install an artifact
    Install {
        name: String,
        #[arg(long = "lib-version")]
        version: Option<String>,
    },

    /// Remove an installed artifact
    Uninstall { name: String },

    /// List installed artifacts
    Installed,

    /// List cached artifacts
    Downloaded,

    /// Show artifacts with a newer catalog version
    CheckUpdates,

    /// Download and install every pending update
    Upgrade,

    /// Delete everything in the cache directory
    Clean,

    /// Print the path of an installed artifact
    Path { name: String },

    /// Re-hash an installed artifact against its recorded digest
    Verify { name: String },

    /// Make sure a vendor diagnostic tool is present and print its path
    Binary {
        vendor: String,
        #[arg(long)]
        os: Option<String>,
        #[arg(long)]
        arch: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_filters() {
        let cli = Cli::parse_from([
            "gpudeps", "list", "--arch", "x86_64", "--name", "libcuda.so.1",
        ]);
        match cli.command {
            Commands::List { arch, name, os, .. } => {
                assert_eq!(arch.as_deref(), Some("x86_64"));
                assert_eq!(name.as_deref(), Some("libcuda.so.1"));
                assert!(os.is_none());
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["gpudeps", "clean", "--home", "/tmp/gpudeps", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.home, Some(PathBuf::from("/tmp/gpudeps")));
    }
}
