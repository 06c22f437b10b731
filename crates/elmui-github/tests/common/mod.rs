#![allow(dead_code)]

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use elmui_github::install::ArchiveSource;
use elmui_github::repository::GithubHost;
use elmui_resolver::source::FetchError;
use elmui_resolver::PackageId;
use semver::Version;
use tokio::net::TcpListener;
use zip::write::SimpleFileOptions;

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn serve(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move { axum::serve(listener, app).await });
    base
}

/// A host whose API, raw and web URLs live under `/api`, `/raw` and `/web` of `base`.
pub fn local_host(base: &str) -> GithubHost {
    GithubHost {
        api_url: format!("{base}/api"),
        raw_url: format!("{base}/raw"),
        web_url: format!("{base}/web"),
        token: None,
    }
}

/// Build a GitHub-style archive: every file under a `<repo>-<version>/` wrapper.
pub fn github_zip(repo: &str, version: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    let wrapper = format!("{repo}-{version}/");
    writer.add_directory(wrapper.as_str(), options).unwrap();
    for (path, content) in files {
        writer
            .start_file(format!("{wrapper}{path}"), options)
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Serves a generated archive for every package, counting fetches.
#[derive(Default)]
pub struct FakeArchives {
    pub fetches: AtomicUsize,
    failing: HashSet<PackageId>,
}

impl FakeArchives {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, package: &str) -> Self {
        self.failing.insert(PackageId::from(package));
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArchiveSource for FakeArchives {
    async fn fetch_archive(&self, package: &PackageId, version: &Version) -> Result<Vec<u8>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(package) {
            return Err(FetchError::new("HTTP 500"));
        }
        let repo = package.repo().unwrap_or(package.as_str());
        Ok(github_zip(
            repo,
            &version.to_string(),
            &[
                ("elm-package.json", r#"{ "version": "1.0.0" }"#),
                ("src/Main.elm", "module Main exposing (..)"),
            ],
        ))
    }
}
