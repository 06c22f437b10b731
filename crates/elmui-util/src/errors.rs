use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all elm-ui operations.
#[derive(Debug, Error, Diagnostic)]
pub enum ElmUiError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed project file (elm-package.json, elm-ui.json).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check your elm-package.json and elm-ui.json for syntax errors"))]
    Manifest { message: String },

    /// The Elm compiler or the Sass compiler reported errors.
    #[error("Compilation failed:\n{message}")]
    Compilation { message: String },

    /// Network request or download failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Global tool configuration could not be read.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check ~/.elm-ui/config.toml"))]
    Config { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type ElmUiResult<T> = miette::Result<T>;
