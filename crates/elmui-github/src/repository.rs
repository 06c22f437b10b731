//! GitHub host abstraction: URL layout for tags, manifests and archives.

use elmui_core::config::NetworkConfig;
use elmui_resolver::PackageId;
use reqwest::RequestBuilder;

/// Tags requested per page of the tag listing.
pub const TAGS_PER_PAGE: usize = 100;

/// Base URLs of one GitHub installation, with an optional API token.
#[derive(Debug, Clone)]
pub struct GithubHost {
    pub api_url: String,
    pub raw_url: String,
    pub web_url: String,
    pub token: Option<String>,
}

impl GithubHost {
    /// Public github.com without credentials.
    pub fn github() -> Self {
        Self::from_config(&NetworkConfig {
            token: None,
            ..NetworkConfig::default()
        })
    }

    pub fn from_config(network: &NetworkConfig) -> Self {
        Self {
            api_url: network.api_url.trim_end_matches('/').to_string(),
            raw_url: network.raw_url.trim_end_matches('/').to_string(),
            web_url: network.web_url.trim_end_matches('/').to_string(),
            token: network.token(),
        }
    }

    /// One page of the tag listing (pages start at 1).
    ///
    /// `elm-lang/core` page 1 becomes
    /// `https://api.github.com/repos/elm-lang/core/tags?per_page=100&page=1`
    pub fn tags_url(&self, package: &PackageId, page: usize) -> String {
        format!(
            "{}/repos/{package}/tags?per_page={TAGS_PER_PAGE}&page={page}",
            self.api_url
        )
    }

    /// `elm-package.json` of `package` at `git_ref`.
    pub fn manifest_url(&self, package: &PackageId, git_ref: &str) -> String {
        format!("{}/{package}/{git_ref}/elm-package.json", self.raw_url)
    }

    /// Zip archive of `package` at `git_ref`.
    pub fn archive_url(&self, package: &PackageId, git_ref: &str) -> String {
        format!("{}/{package}/archive/{git_ref}.zip", self.web_url)
    }

    /// Attach the token, but only to requests aimed at the API host.
    pub fn authorize(&self, request: RequestBuilder, url: &str) -> RequestBuilder {
        match &self.token {
            Some(token) if url.starts_with(&self.api_url) => request.bearer_auth(token),
            _ => request,
        }
    }

    pub fn has_auth(&self) -> bool {
        self.token.is_some()
    }
}
