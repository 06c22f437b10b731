//! Operation: show the environment configuration a build would embed.

use std::path::Path;

use elmui_core::config::load_env_config;
use elmui_util::errors::ElmUiError;

/// Default environment for `elm-ui config`.
pub const DEFAULT_CONFIG_ENV: &str = "development";

/// `config/<env>.json` rendered as pretty JSON (`{}` when missing or invalid).
pub fn show(project_root: &Path, env: &str) -> miette::Result<String> {
    let value = load_env_config(project_root, env);
    serde_json::to_string_pretty(&value).map_err(|e| {
        ElmUiError::Generic {
            message: format!("Failed to render configuration: {e}"),
        }
        .into()
    })
}
