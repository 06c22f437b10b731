//! Handler for `elm-ui server`.

use elmui_core::config::GlobalConfig;
use elmui_ops::ops_server::{serve, ServerOptions};
use miette::Result;

pub async fn exec(env: &str, port: u16) -> Result<()> {
    let project_root = super::current_project()?;
    let config = GlobalConfig::load()?;
    serve(&project_root, ServerOptions::new(env, port, &config.build)).await
}
