//! Handler for `elm-ui build`.

use console::style;
use elmui_core::config::GlobalConfig;
use elmui_ops::ops_build::{build, BuildOptions};
use miette::Result;

pub fn exec(env: &str) -> Result<()> {
    let project_root = super::current_project()?;
    let config = GlobalConfig::load()?;
    let options = BuildOptions::new(env, &config.build);

    match build(&project_root, &options) {
        Ok(output) => {
            tracing::debug!("Build output in {}", output.dist.display());
            println!("{}", style("Build succeeded!").green().bold());
            Ok(())
        }
        Err(e) => {
            eprintln!("{e:?}");
            eprintln!("\n{}", style("Build failed!").red().bold());
            std::process::exit(1);
        }
    }
}
