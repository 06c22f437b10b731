//! CLI argument definitions for elm-ui.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use elmui_ops::ops_build::DEFAULT_BUILD_ENV;
use elmui_ops::ops_config::DEFAULT_CONFIG_ENV;
use elmui_ops::ops_server::{DEFAULT_PORT, DEFAULT_SERVER_ENV};

#[derive(Parser, Debug)]
#[command(
    name = "elm-ui",
    version,
    about = "Build tool, scaffolder and package installer for elm-ui applications"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scaffold a new project into a directory
    New {
        /// Target directory (created if missing)
        directory: PathBuf,
    },

    /// Resolve and install the packages in elm-package.json
    Install,

    /// Build the application into dist/
    Build {
        /// Environment whose config/<env>.json is embedded
        #[arg(short, long, default_value = DEFAULT_BUILD_ENV)]
        env: String,
    },

    /// Start the development server
    Server {
        /// Environment whose config/<env>.json is exposed as window.ENV
        #[arg(short, long, default_value = DEFAULT_SERVER_ENV)]
        env: String,

        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Print the configuration for an environment
    Config {
        /// Environment to read config/<env>.json for
        #[arg(short, long, default_value = DEFAULT_CONFIG_ENV)]
        env: String,
    },
}

/// Parse command-line arguments.
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn build_env_defaults_to_production() {
        let cli = Cli::try_parse_from(["elm-ui", "build"]).unwrap();
        match cli.command {
            Command::Build { env } => assert_eq!(env, "production"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn server_defaults() {
        let cli = Cli::try_parse_from(["elm-ui", "server"]).unwrap();
        match cli.command {
            Command::Server { env, port } => {
                assert_eq!(env, "development");
                assert_eq!(port, 8001);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        let cli = Cli::try_parse_from(["elm-ui", "server", "--port", "9000"]).unwrap();
        assert!(matches!(cli.command, Command::Server { port: 9000, .. }));
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["elm-ui", "install", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
