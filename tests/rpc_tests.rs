use panic_symbolicator::parser::schema::ResolvedVersion;
use panic_symbolicator::rpc::{
    build_http_client, CommitLookup, DebugInfoFetcher, DebugInfoSource, GitHubCommitLookup,
    VersionResolver,
};
use panic_symbolicator::utils::{ErrorKind, FetchError, SymbolicateError, VersionError};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FULL_SHA: &str = "abcdef0123456789abcdef0123456789abcdef01";
const TIMEOUT: Duration = Duration::from_secs(5);

async fn commit_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/denoland/deno/commits/abcdef0"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sha": FULL_SHA })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/denoland/deno/commits/bad0000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sha": "bad0000" })))
        .mount(&server)
        .await;

    server
}

fn fetcher(root: String) -> DebugInfoFetcher {
    DebugInfoFetcher::new(
        build_http_client(TIMEOUT).unwrap(),
        root,
        "deno-{target}.symcache",
    )
}

#[tokio::test]
async fn test_commit_lookup_resolves_canary() {
    let server = commit_server().await;
    let api = format!("{}/repos/denoland/deno/commits", server.uri());

    let resolved = tokio::task::spawn_blocking(move || {
        let lookup = GitHubCommitLookup::new(api, TIMEOUT).unwrap();
        VersionResolver::new(lookup).resolve("v2.2.3+abcdef0")
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(
        resolved,
        ResolvedVersion::Canary {
            tag: "v2.2.3".to_string(),
            sha: FULL_SHA.to_string(),
        }
    );
}

#[tokio::test]
async fn test_commit_lookup_unknown_hash() {
    let server = commit_server().await;
    let api = format!("{}/repos/denoland/deno/commits", server.uri());

    let err = tokio::task::spawn_blocking(move || {
        GitHubCommitLookup::new(api, TIMEOUT)
            .unwrap()
            .full_sha("0000000")
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(
        err,
        VersionError::LookupFailed { status: 404, .. }
    ));

    let err = SymbolicateError::from(err);
    assert_eq!(err.kind(), ErrorKind::Permanent);
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_commit_lookup_rejects_short_sha() {
    let server = commit_server().await;
    let api = format!("{}/repos/denoland/deno/commits", server.uri());

    let err = tokio::task::spawn_blocking(move || {
        GitHubCommitLookup::new(api, TIMEOUT)
            .unwrap()
            .full_sha("bad0000")
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(err, VersionError::InvalidResponse(_)));
    assert_eq!(SymbolicateError::from(err).kind(), ErrorKind::Transient);
}

#[tokio::test]
async fn test_commit_lookup_server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let api = server.uri();

    let err = tokio::task::spawn_blocking(move || {
        GitHubCommitLookup::new(api, TIMEOUT)
            .unwrap()
            .full_sha("abcdef0")
    })
    .await
    .unwrap()
    .unwrap_err();

    let err = SymbolicateError::from(err);
    assert_eq!(err.kind(), ErrorKind::Transient);
    assert_eq!(err.status_code(), 502);
}

#[tokio::test]
async fn test_fetch_release_and_canary_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/release/v2.2.5/deno-aarch64-apple-darwin.symcache"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"release-blob".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/canary/{}/deno-x86_64-unknown-linux-gnu.symcache",
            FULL_SHA
        )))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"canary-blob".to_vec()))
        .mount(&server)
        .await;
    let root = server.uri();

    let (release, canary) = tokio::task::spawn_blocking(move || {
        let fetcher = fetcher(root);
        let release = fetcher.fetch(
            &ResolvedVersion::Release("v2.2.5".to_string()),
            "aarch64-apple-darwin",
        );
        let canary = fetcher.fetch(
            &ResolvedVersion::Canary {
                tag: "v2.2.3".to_string(),
                sha: FULL_SHA.to_string(),
            },
            "x86_64-unknown-linux-gnu",
        );
        (release, canary)
    })
    .await
    .unwrap();

    assert_eq!(release.unwrap(), b"release-blob".to_vec());
    assert_eq!(canary.unwrap(), b"canary-blob".to_vec());
}

#[tokio::test]
async fn test_fetch_missing_artifact() {
    let server = MockServer::start().await;
    let root = server.uri();

    let err = tokio::task::spawn_blocking(move || {
        fetcher(root).fetch(&ResolvedVersion::Release("v0.0.1".to_string()), "t")
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(err, FetchError::NotFound { .. }));

    let err = SymbolicateError::from(err);
    assert!(matches!(err, SymbolicateError::DebugInfoNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::Permanent);
}

#[tokio::test]
async fn test_fetch_server_error_is_transfer_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let root = server.uri();

    let err = tokio::task::spawn_blocking(move || {
        fetcher(root).fetch(&ResolvedVersion::Release("v2.2.5".to_string()), "t")
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 500, .. }));

    let err = SymbolicateError::from(err);
    assert!(matches!(err, SymbolicateError::DebugInfoTransfer(_)));
    assert_eq!(err.kind(), ErrorKind::Transient);
    assert_eq!(err.status_code(), 502);
}
