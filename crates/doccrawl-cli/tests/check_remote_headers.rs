mod common;

use common::{add_page, add_source, doccrawl_cmd};
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/docs/a"))
        .respond_with(ResponseTemplate::new(200).insert_header("etag", "\"a-v1\""))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/docs/b"))
        .respond_with(ResponseTemplate::new(200).insert_header("etag", "\"b-v2\""))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn headers_only_compares_etags() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let server = site().await;
    let dir = add_source(
        tmp.path(),
        "docs",
        &format!("base_url = \"{}\"\n", server.uri()),
    );
    let a = format!("{}/docs/a", server.uri());
    let b = format!("{}/docs/b", server.uri());
    add_page(&dir, "docs/a", &a, "# A\n\nAlpha", Some("\"a-v1\""));
    add_page(&dir, "docs/b", &b, "# B\n\nBeta", Some("\"b-v1\""));

    let out = doccrawl_cmd(tmp.path())
        .args(["check-remote", "docs", "--headers-only", "-f", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: Value = serde_json::from_slice(&out)?;
    assert_eq!(v["mode"], "remote");
    assert_eq!(v["total"], 2);
    assert_eq!(v["hasDrift"], true);
    assert_eq!(v["unchanged"][0]["identifier"], "docs/a");
    assert_eq!(v["unchanged"][0]["reason"], "etag");
    assert_eq!(v["changed"][0]["identifier"], "docs/b");
    assert_eq!(v["changed"][0]["reason"], "content_hash");
    Ok(())
}

#[tokio::test]
async fn headers_only_text_suggests_recrawl() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let server = site().await;
    let dir = add_source(
        tmp.path(),
        "docs",
        &format!("base_url = \"{}\"\n", server.uri()),
    );
    add_page(
        &dir,
        "docs/b",
        &format!("{}/docs/b", server.uri()),
        "# B\n\nBeta",
        Some("\"b-v1\""),
    );

    doccrawl_cmd(tmp.path())
        .args(["check-remote", "docs", "--headers-only"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Checking remote changes for docs..."))
        .stdout(predicate::str::contains("  - 1 changed\n"))
        .stdout(predicate::str::contains("Changed pages:\n  - docs/b.md (content_hash)\n"))
        .stdout(predicate::str::contains("Run 'doccrawl crawl docs' to update."));
    Ok(())
}
