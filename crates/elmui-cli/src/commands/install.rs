//! Handler for `elm-ui install`.

use elmui_core::config::GlobalConfig;
use miette::Result;

pub async fn exec(verbose: bool) -> Result<()> {
    let project_root = super::current_project()?;
    let config = GlobalConfig::load()?;
    elmui_ops::ops_install::install(&project_root, &config, verbose).await
}
