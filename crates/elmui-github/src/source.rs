//! [`VersionSource`] and [`ArchiveSource`] backed by the GitHub HTTP API.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use elmui_core::config::NetworkConfig;
use elmui_core::manifest::ElmPackage;
use elmui_resolver::source::{FetchError, VersionSource};
use elmui_resolver::PackageId;
use elmui_util::errors::ElmUiError;
use reqwest::Client;
use semver::Version;
use serde::Deserialize;

use crate::download::{self, RetryPolicy};
use crate::install::ArchiveSource;
use crate::repository::{GithubHost, TAGS_PER_PAGE};

/// Stop paging tag listings after this many pages.
const MAX_TAG_PAGES: usize = 50;

/// Tag pages one listing call is given time for when no deadline is configured.
const LISTING_PAGE_ALLOWANCE: u32 = 3;

/// Deadline the resolver should put on one call into a [`GithubSource`].
///
/// `fetch-timeout-secs` wins when set. Otherwise a call gets the full retry
/// budget of [`LISTING_PAGE_ALLOWANCE`] downloads, so the adapter's own
/// retries run before the resolver gives up.
pub fn call_deadline(network: &NetworkConfig) -> Duration {
    match network.fetch_timeout_secs {
        Some(secs) => Duration::from_secs(secs),
        None => RetryPolicy::with_attempts(network.retries)
            .budget(network.timeout())
            .saturating_mul(LISTING_PAGE_ALLOWANCE),
    }
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

/// Parse a git tag as a version, accepting an optional leading `v`.
pub fn parse_tag(tag: &str) -> Option<Version> {
    let trimmed = tag.trim();
    let text = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(text).ok()
}

pub struct GithubSource {
    client: Client,
    host: GithubHost,
    retry: RetryPolicy,
    /// Packages pinned to a single version published at a git ref.
    pins: Mutex<HashMap<PackageId, (Version, String)>>,
    /// Tag name each listed version came from, for fetching at the right ref.
    refs: Mutex<HashMap<(PackageId, Version), String>>,
}

impl GithubSource {
    pub fn new(client: Client, host: GithubHost, retry: RetryPolicy) -> Self {
        Self {
            client,
            host,
            retry,
            pins: Mutex::new(HashMap::new()),
            refs: Mutex::new(HashMap::new()),
        }
    }

    /// Build a source from the `[network]` section of the global config.
    pub fn from_config(network: &NetworkConfig) -> miette::Result<Self> {
        let client = download::build_client(network.timeout())?;
        let host = GithubHost::from_config(network);
        if !host.has_auth() {
            tracing::debug!("No GitHub token configured; API requests are rate limited");
        }
        Ok(Self::new(
            client,
            host,
            RetryPolicy::with_attempts(network.retries),
        ))
    }

    /// Declare that `package` publishes exactly `version`, found at `git_ref`.
    ///
    /// Later listings of `package` return only that version, and its manifest
    /// and archive are fetched at `git_ref`.
    pub fn pin(&self, package: PackageId, version: Version, git_ref: impl Into<String>) {
        if let Ok(mut pins) = self.pins.lock() {
            pins.insert(package, (version, git_ref.into()));
        }
    }

    fn pinned(&self, package: &PackageId) -> Option<(Version, String)> {
        self.pins.lock().ok()?.get(package).cloned()
    }

    /// The git ref to fetch `package` at `version` from.
    fn git_ref(&self, package: &PackageId, version: &Version) -> String {
        if let Some((pinned, git_ref)) = self.pinned(package) {
            if &pinned == version {
                return git_ref;
            }
        }
        self.refs
            .lock()
            .ok()
            .and_then(|refs| refs.get(&(package.clone(), version.clone())).cloned())
            .unwrap_or_else(|| version.to_string())
    }

    /// Download and parse `elm-package.json` of `package` at `git_ref`.
    pub async fn manifest_at(&self, package: &PackageId, git_ref: &str) -> miette::Result<ElmPackage> {
        let url = self.host.manifest_url(package, git_ref);
        match download::download_text(&self.client, &self.host, &url, &self.retry).await? {
            Some(text) => ElmPackage::parse(&text),
            None => Err(ElmUiError::Network {
                message: format!("{package} has no elm-package.json at '{git_ref}'"),
            }
            .into()),
        }
    }

    async fn list_tags(&self, package: &PackageId) -> miette::Result<Vec<String>> {
        let mut names = Vec::new();
        for page in 1..=MAX_TAG_PAGES {
            let url = self.host.tags_url(package, page);
            let Some(body) = download::download_text(&self.client, &self.host, &url, &self.retry).await? else {
                return Err(ElmUiError::Network {
                    message: format!("repository {package} not found"),
                }
                .into());
            };
            let tags: Vec<Tag> = serde_json::from_str(&body).map_err(|e| ElmUiError::Network {
                message: format!("Unexpected tag listing for {package}: {e}"),
            })?;
            let count = tags.len();
            names.extend(tags.into_iter().map(|t| t.name));
            if count < TAGS_PER_PAGE {
                break;
            }
        }
        Ok(names)
    }
}

#[async_trait]
impl VersionSource for GithubSource {
    async fn list_versions(&self, package: &PackageId) -> Result<Vec<Version>, FetchError> {
        if let Some((version, git_ref)) = self.pinned(package) {
            tracing::debug!("{package} pinned to {version} at '{git_ref}'");
            return Ok(vec![version]);
        }

        let tags = self
            .list_tags(package)
            .await
            .map_err(|e| FetchError::new(e.to_string()))?;

        let mut versions = Vec::new();
        let mut refs = self.refs.lock().map_err(|e| FetchError::new(e.to_string()))?;
        for tag in tags {
            match parse_tag(&tag) {
                Some(version) => {
                    refs.insert((package.clone(), version.clone()), tag);
                    versions.push(version);
                }
                None => tracing::debug!("Ignoring non-version tag '{tag}' of {package}"),
            }
        }
        Ok(versions)
    }

    async fn get_constraints(
        &self,
        package: &PackageId,
        version: &Version,
    ) -> Result<BTreeMap<PackageId, String>, FetchError> {
        let git_ref = self.git_ref(package, version);
        let manifest = self
            .manifest_at(package, &git_ref)
            .await
            .map_err(|e| FetchError::new(e.to_string()))?;
        manifest
            .dependencies
            .into_iter()
            .map(|(id, range)| {
                let id = PackageId::parse(&id).map_err(|e| FetchError::new(e.to_string()))?;
                Ok((id, range))
            })
            .collect()
    }
}

#[async_trait]
impl ArchiveSource for GithubSource {
    async fn fetch_archive(&self, package: &PackageId, version: &Version) -> Result<Vec<u8>, FetchError> {
        let git_ref = self.git_ref(package, version);
        let url = self.host.archive_url(package, &git_ref);
        tracing::info!("Downloading {url}");
        match download::download_bytes(&self.client, &self.host, &url, &self.retry).await {
            Ok(Some(bytes)) => Ok(bytes),
            Ok(None) => Err(FetchError::new(format!("no archive at {url}"))),
            Err(e) => Err(FetchError::new(e.to_string())),
        }
    }
}
