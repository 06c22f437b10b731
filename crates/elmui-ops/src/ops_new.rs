//! Operation: scaffold a new project from the embedded template.

use std::path::Path;

use elmui_core::template::{ProjectTemplate, RenderSummary, TemplateContext};

/// Scaffold into `directory`, creating it if missing. Existing files are kept.
pub fn scaffold(directory: &Path) -> miette::Result<RenderSummary> {
    let name = directory
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "elm-ui-app".to_string());

    let template = ProjectTemplate::builtin()?;
    let summary = template.render(directory, &TemplateContext::new(&name))?;
    tracing::debug!(
        "Scaffolded {} files, kept {} existing",
        summary.created.len(),
        summary.skipped.len()
    );
    Ok(summary)
}
