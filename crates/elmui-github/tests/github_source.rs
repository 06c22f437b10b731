mod common;

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use elmui_core::config::NetworkConfig;
use elmui_github::download::{build_client, RetryPolicy};
use elmui_github::source::{call_deadline, GithubSource};
use elmui_resolver::source::VersionSource;
use elmui_resolver::{resolve, Constraint, PackageId, ResolveOptions};
use semver::Version;
use serde_json::json;

fn source(base: &str, timeout: Duration, attempts: u32) -> GithubSource {
    GithubSource::new(
        build_client(timeout).unwrap(),
        common::local_host(base),
        RetryPolicy {
            attempts,
            base_delay: Duration::from_millis(50),
        },
    )
}

fn tags(names: impl IntoIterator<Item = String>) -> Json<serde_json::Value> {
    Json(json!(names.into_iter().map(|name| json!({ "name": name })).collect::<Vec<_>>()))
}

#[tokio::test]
async fn test_tag_listing_follows_pages() {
    let pages = Arc::new(Mutex::new(Vec::new()));
    let seen = pages.clone();
    let app = Router::new().route(
        "/api/repos/:owner/:repo/tags",
        get(move |Query(query): Query<HashMap<String, String>>| {
            let seen = seen.clone();
            async move {
                let page: usize = query["page"].parse().unwrap();
                seen.lock().unwrap().push(page);
                match page {
                    1 => tags((0..100).map(|patch| format!("0.0.{patch}"))),
                    _ => tags(["v1.0.0".to_string(), "not-a-version".to_string()]),
                }
            }
        }),
    );
    let base = common::serve(app).await;

    let versions = source(&base, Duration::from_secs(5), 1)
        .list_versions(&PackageId::from("owner/lib"))
        .await
        .unwrap();

    assert_eq!(*pages.lock().unwrap(), vec![1, 2]);
    assert_eq!(versions.len(), 101);
    assert!(versions.contains(&Version::new(1, 0, 0)));
}

#[tokio::test]
async fn test_constraints_are_read_at_the_tag() {
    let app = Router::new()
        .route(
            "/api/repos/:owner/:repo/tags",
            get(|| async { tags(["v1.0.0".to_string()]) }),
        )
        .route(
            "/raw/:owner/:repo/:git_ref/elm-package.json",
            get(|Path((_, _, git_ref)): Path<(String, String, String)>| async move {
                if git_ref != "v1.0.0" {
                    return StatusCode::NOT_FOUND.into_response();
                }
                Json(json!({
                    "version": "1.0.0",
                    "dependencies": { "elm-lang/core": "4.0.0 <= v < 5.0.0" }
                }))
                .into_response()
            }),
        );
    let base = common::serve(app).await;
    let source = source(&base, Duration::from_secs(5), 1);
    let pkg = PackageId::from("owner/lib");

    let versions = source.list_versions(&pkg).await.unwrap();
    assert_eq!(versions, vec![Version::new(1, 0, 0)]);

    let deps = source.get_constraints(&pkg, &Version::new(1, 0, 0)).await.unwrap();
    assert_eq!(deps[&PackageId::from("elm-lang/core")], "4.0.0 <= v < 5.0.0");
}

#[tokio::test]
async fn test_missing_manifest_is_a_network_error() {
    let base = common::serve(Router::new()).await;
    let err = source(&base, Duration::from_secs(5), 1)
        .manifest_at(&PackageId::from("owner/lib"), "master")
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("Network error"), "{text}");
    assert!(text.contains("no elm-package.json at 'master'"), "{text}");
}

#[tokio::test]
async fn test_dependency_names_must_be_owner_repo() {
    let app = Router::new().route(
        "/raw/:owner/:repo/:git_ref/elm-package.json",
        get(|| async {
            Json(json!({ "version": "1.0.0", "dependencies": { "../evil": "1.0.0 <= v < 2.0.0" } }))
        }),
    );
    let base = common::serve(app).await;

    let err = source(&base, Duration::from_secs(5), 1)
        .get_constraints(&PackageId::from("owner/lib"), &Version::new(1, 0, 0))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("../evil"), "{err}");
}

#[tokio::test]
async fn test_resolver_waits_for_retries() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new()
        .route(
            "/api/repos/:owner/:repo/tags",
            get(move || {
                let counter = counter.clone();
                async move {
                    // The first request outlives the client timeout.
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        tokio::time::sleep(Duration::from_secs(3)).await;
                    }
                    tags(["1.0.0".to_string()])
                }
            }),
        )
        .route(
            "/raw/:owner/:repo/:git_ref/elm-package.json",
            get(|| async { Json(json!({ "version": "1.0.0", "dependencies": {} })) }),
        );
    let base = common::serve(app).await;

    let network = NetworkConfig {
        timeout_secs: 1,
        retries: 2,
        ..NetworkConfig::default()
    };
    let source = source(&base, network.timeout(), network.retries);
    let mut root = BTreeMap::new();
    root.insert(
        PackageId::from("owner/slow"),
        Constraint::parse("1.0.0 <= v < 2.0.0").unwrap(),
    );
    let options = ResolveOptions {
        jobs: 1,
        fetch_timeout: call_deadline(&network),
    };

    let result = resolve(&root, &source, &options).await.unwrap();

    assert_eq!(result.resolution[&PackageId::from("owner/slow")], Version::new(1, 0, 0));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
