//! Embedded project template for `elm-ui new`.
//!
//! The template is a TOML descriptor compiled into the binary via
//! `include_str!`. It declares the directories and files of a new project;
//! `{{variable}}` placeholders in file contents are filled in at render time.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use elmui_util::errors::ElmUiError;

/// Range written for `gdotdesign/elm-ui` into new projects.
pub const DEFAULT_ELM_UI_RANGE: &str = "1.0.0 <= v < 2.0.0";

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateMeta {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryEntry {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub content: String,
}

/// A project template parsed from a TOML descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectTemplate {
    pub template: TemplateMeta,
    #[serde(default)]
    pub directories: Vec<DirectoryEntry>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// Variables available for `{{variable}}` interpolation.
pub struct TemplateContext {
    vars: BTreeMap<String, String>,
}

impl TemplateContext {
    pub fn new(project_name: &str) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert("project_name".to_string(), project_name.to_string());
        vars.insert("elm_ui_range".to_string(), DEFAULT_ELM_UI_RANGE.to_string());
        Self { vars }
    }
}

/// Replace all `{{key}}` placeholders in `input` with values from `ctx`.
/// Unknown placeholders are left untouched.
pub fn interpolate(input: &str, ctx: &TemplateContext) -> String {
    ctx.vars.iter().fold(input.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{{{key}}}}}"), value)
    })
}

/// What [`ProjectTemplate::render`] did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    pub created: Vec<String>,
    /// Files left alone because they already existed.
    pub skipped: Vec<String>,
}

impl ProjectTemplate {
    pub fn parse_toml(toml_str: &str) -> miette::Result<Self> {
        toml::from_str(toml_str).map_err(|e| {
            ElmUiError::Generic {
                message: format!("Failed to parse project template: {e}"),
            }
            .into()
        })
    }

    /// The template embedded in the binary.
    pub fn builtin() -> miette::Result<Self> {
        Self::parse_toml(include_str!("../templates/app.toml"))
    }

    /// Create the template's directories and files under `root`.
    ///
    /// Existing files are never overwritten.
    pub fn render(&self, root: &Path, ctx: &TemplateContext) -> miette::Result<RenderSummary> {
        let mut summary = RenderSummary::default();
        std::fs::create_dir_all(root).map_err(ElmUiError::Io)?;

        for dir in &self.directories {
            std::fs::create_dir_all(root.join(&dir.path)).map_err(ElmUiError::Io)?;
        }

        for file in &self.files {
            let path = root.join(&file.path);
            if path.exists() {
                tracing::debug!("Keeping existing {}", path.display());
                summary.skipped.push(file.path.clone());
                continue;
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(ElmUiError::Io)?;
            }
            let content = interpolate(file.content.trim_start_matches('\n'), ctx);
            std::fs::write(&path, content).map_err(ElmUiError::Io)?;
            summary.created.push(file.path.clone());
        }

        Ok(summary)
    }
}
