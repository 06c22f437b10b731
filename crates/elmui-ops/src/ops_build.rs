//! Operation: build the application into `dist/`.
//!
//! Steps run in order and the first failure stops the build:
//! public assets -> `index.html` -> `elm-make` -> `sass`.

use std::path::{Path, PathBuf};

use elmui_core::config::{load_env_config, BuildConfig};
use elmui_core::html::render_html;
use elmui_core::lockfile::Lockfile;
use elmui_core::ELM_UI_PACKAGE;
use elmui_util::errors::ElmUiError;
use elmui_util::process::CommandBuilder;
use elmui_util::progress::status;

/// Default environment for `elm-ui build`.
pub const DEFAULT_BUILD_ENV: &str = "production";

pub const DIST_DIR: &str = "dist";
pub const ELM_ENTRY: &str = "source/Main.elm";
pub const SASS_ENTRY: &str = "stylesheets/main.scss";

/// Options for a build invocation.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Name of the `config/<env>.json` to embed.
    pub env: String,
    pub elm_make: String,
    pub sass: String,
}

impl BuildOptions {
    pub fn new(env: impl Into<String>, tools: &BuildConfig) -> Self {
        Self {
            env: env.into(),
            elm_make: tools.elm_make.clone(),
            sass: tools.sass.clone(),
        }
    }
}

/// Files written by a successful build.
#[derive(Debug)]
pub struct BuildOutput {
    pub dist: PathBuf,
    pub public_files: u64,
}

/// Run the full build pipeline for the project at `project_root`.
pub fn build(project_root: &Path, options: &BuildOptions) -> miette::Result<BuildOutput> {
    let dist = project_root.join(DIST_DIR);
    elmui_util::fs::ensure_dir(&dist).map_err(ElmUiError::Io)?;

    let public_files = copy_public(project_root, &dist)?;
    build_html(project_root, &dist, &options.env)?;
    build_elm(project_root, &dist, &options.elm_make)?;
    build_css(project_root, &dist, &options.sass)?;

    Ok(BuildOutput { dist, public_files })
}

fn copy_public(project_root: &Path, dist: &Path) -> miette::Result<u64> {
    let public = project_root.join("public");
    if !public.is_dir() {
        return Ok(0);
    }
    status("Copying", "public files");
    let copied = elmui_util::fs::copy_dir_all(&public, dist).map_err(ElmUiError::Io)?;
    tracing::debug!("Copied {copied} public files");
    Ok(copied)
}

fn build_html(project_root: &Path, dist: &Path, env: &str) -> miette::Result<()> {
    status("Building", "HTML");
    let config = load_env_config(project_root, env);
    std::fs::write(dist.join("index.html"), render_html(&config)).map_err(ElmUiError::Io)?;
    Ok(())
}

fn build_elm(project_root: &Path, dist: &Path, elm_make: &str) -> miette::Result<()> {
    status("Building", "JavaScript");
    let js = compile_elm(project_root, elm_make)?.into_result()?;
    std::fs::write(dist.join("main.js"), js).map_err(ElmUiError::Io)?;
    Ok(())
}

fn build_css(project_root: &Path, dist: &Path, sass: &str) -> miette::Result<()> {
    status("Building", "CSS");
    let css = compile_css(project_root, sass)?.into_result()?;
    std::fs::write(dist.join("main.css"), css).map_err(ElmUiError::Io)?;
    Ok(())
}

/// Result of running a compiler that could be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// The generated file's contents.
    Compiled(String),
    /// The compiler's own output.
    Failed(String),
}

impl CompileOutcome {
    /// Turn a compiler failure into a [`ElmUiError::Compilation`].
    pub fn into_result(self) -> miette::Result<String> {
        match self {
            CompileOutcome::Compiled(text) => Ok(text),
            CompileOutcome::Failed(output) => Err(ElmUiError::Compilation {
                message: format_error(&output),
            }
            .into()),
        }
    }
}

/// Compile `source/Main.elm` with `elm-make` and return the generated script.
///
/// Errors only when the compiler cannot be run at all.
pub fn compile_elm(project_root: &Path, elm_make: &str) -> miette::Result<CompileOutcome> {
    require_entry(project_root, ELM_ENTRY)?;
    let scratch = tempfile::tempdir().map_err(ElmUiError::Io)?;
    let output = scratch.path().join("main.js");
    let result = CommandBuilder::new(elm_make)
        .arg(ELM_ENTRY)
        .arg("--output")
        .arg(output.to_string_lossy())
        .arg("--yes")
        .cwd(project_root)
        .exec_captured()?;

    if !result.success || !output.is_file() {
        return Ok(CompileOutcome::Failed(result.text));
    }
    let js = std::fs::read_to_string(&output).map_err(ElmUiError::Io)?;
    Ok(CompileOutcome::Compiled(js))
}

/// Compile `stylesheets/main.scss` with `sass` and return the stylesheet.
///
/// The locked elm-ui package's stylesheets are put on the load path.
pub fn compile_css(project_root: &Path, sass: &str) -> miette::Result<CompileOutcome> {
    require_entry(project_root, SASS_ENTRY)?;
    let scratch = tempfile::tempdir().map_err(ElmUiError::Io)?;
    let output = scratch.path().join("main.css");

    let mut cmd = CommandBuilder::new(sass);
    if let Some(ui) = ui_stylesheets(project_root)? {
        cmd = cmd.arg("--load-path").arg(ui.to_string_lossy());
    }
    let result = cmd
        .arg(SASS_ENTRY)
        .arg(output.to_string_lossy())
        .cwd(project_root)
        .exec_captured()?;

    if !result.success || !output.is_file() {
        return Ok(CompileOutcome::Failed(result.text));
    }
    let css = std::fs::read_to_string(&output).map_err(ElmUiError::Io)?;
    Ok(CompileOutcome::Compiled(css))
}

fn require_entry(project_root: &Path, entry: &str) -> miette::Result<()> {
    if project_root.join(entry).is_file() {
        Ok(())
    } else {
        Err(ElmUiError::Generic {
            message: format!("{entry} not found"),
        }
        .into())
    }
}

/// Stylesheets shipped by the locked elm-ui package, if it is locked.
pub fn ui_stylesheets(project_root: &Path) -> miette::Result<Option<PathBuf>> {
    let Some(lock) = Lockfile::load(project_root)? else {
        return Ok(None);
    };
    Ok(lock.version_of(ELM_UI_PACKAGE).map(|version| {
        project_root
            .join("elm-stuff/packages")
            .join(ELM_UI_PACKAGE)
            .join(version)
            .join("stylesheets/ui")
    }))
}

/// Indent compiler output as `  > line`.
pub fn format_error(output: &str) -> String {
    output
        .trim_end()
        .lines()
        .map(|line| format!("  > {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
