//! Command dispatch and handler modules.

mod build;
mod config;
mod install;
mod new;
mod server;

use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::New { directory } => new::exec(&directory),
        Command::Install => install::exec(cli.verbose).await,
        Command::Build { env } => build::exec(&env),
        Command::Server { env, port } => server::exec(&env, port).await,
        Command::Config { env } => config::exec(&env),
    }
}

/// Project root for the current working directory.
fn current_project() -> Result<std::path::PathBuf> {
    let cwd = std::env::current_dir().map_err(elmui_util::errors::ElmUiError::Io)?;
    elmui_ops::project_root(&cwd)
}
