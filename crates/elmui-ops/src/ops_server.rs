//! Operation: the development server.
//!
//! `/` serves the HTML shell, `/main.js` and `/main.css` are compiled on every
//! request, and anything else is looked up in `public/`. A compiler failure
//! is answered with an overlay that shows the error in the browser.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use elmui_core::config::{load_env_config, BuildConfig};
use elmui_core::html::{render_css_error, render_html, render_js_error};
use elmui_util::errors::ElmUiError;
use elmui_util::progress::{status_error, status_info};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::ops_build::{compile_css, compile_elm, CompileOutcome};

/// Default environment for `elm-ui server`.
pub const DEFAULT_SERVER_ENV: &str = "development";
pub const DEFAULT_PORT: u16 = 8001;

/// Options for a server run.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Name of the `config/<env>.json` exposed as `window.ENV`.
    pub env: String,
    pub port: u16,
    pub elm_make: String,
    pub sass: String,
}

impl ServerOptions {
    pub fn new(env: impl Into<String>, port: u16, tools: &BuildConfig) -> Self {
        Self {
            env: env.into(),
            port,
            elm_make: tools.elm_make.clone(),
            sass: tools.sass.clone(),
        }
    }
}

struct ServerState {
    project_root: PathBuf,
    options: ServerOptions,
}

/// Routes of the development server for the project at `project_root`.
pub fn router(project_root: &Path, options: ServerOptions) -> Router {
    let public = ServeDir::new(project_root.join("public"));
    let state = Arc::new(ServerState {
        project_root: project_root.to_path_buf(),
        options,
    });
    Router::new()
        .route("/", get(index))
        .route("/main.js", get(main_js))
        .route("/main.css", get(main_css))
        .fallback_service(public)
        .with_state(state)
}

/// `elm-ui server`: listen on `localhost:<port>` until Ctrl-C.
pub async fn serve(project_root: &Path, options: ServerOptions) -> miette::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], options.port));
    let listener = TcpListener::bind(addr).await.map_err(|e| ElmUiError::Generic {
        message: format!("Cannot listen on {addr}: {e}"),
    })?;
    status_info("Listening", &format!("on http://localhost:{}", options.port));
    serve_on(listener, project_root, options).await
}

/// Serve on an already bound listener until Ctrl-C.
pub async fn serve_on(
    listener: TcpListener,
    project_root: &Path,
    options: ServerOptions,
) -> miette::Result<()> {
    axum::serve(listener, router(project_root, options))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|e| ElmUiError::Io(e).into())
}

async fn index(State(state): State<Arc<ServerState>>) -> Html<String> {
    let env = load_env_config(&state.project_root, &state.options.env);
    Html(render_html(&env))
}

async fn main_js(State(state): State<Arc<ServerState>>) -> Response {
    let root = state.project_root.clone();
    let elm_make = state.options.elm_make.clone();
    let outcome = tokio::task::spawn_blocking(move || compile_elm(&root, &elm_make)).await;
    respond(outcome, "text/javascript", |output| {
        render_js_error("You have errors in your Elm file(s):", output)
    })
}

async fn main_css(State(state): State<Arc<ServerState>>) -> Response {
    let root = state.project_root.clone();
    let sass = state.options.sass.clone();
    let outcome = tokio::task::spawn_blocking(move || compile_css(&root, &sass)).await;
    respond(outcome, "text/css", |output| {
        render_css_error("You have errors in your Sass file(s):", output)
    })
}

/// Compiled output, an error overlay, or a 500 when the compiler never ran.
fn respond(
    outcome: Result<miette::Result<CompileOutcome>, tokio::task::JoinError>,
    content_type: &'static str,
    overlay: impl FnOnce(&str) -> String,
) -> Response {
    let body = match outcome {
        Ok(Ok(CompileOutcome::Compiled(text))) => text,
        Ok(Ok(CompileOutcome::Failed(output))) => {
            status_error("Error", &format!("compiling {content_type} failed"));
            overlay(&output)
        }
        Ok(Err(e)) => {
            tracing::warn!("{e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("compiler task failed: {e}"))
                .into_response();
        }
    };
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}
