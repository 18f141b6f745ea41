#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use doccrawl_core::{CrawlState, PageRecord, fingerprint};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// Create a configured `doccrawl` command rooted at `root`.
#[allow(dead_code)]
pub fn doccrawl_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("doccrawl"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env_remove("DOCCRAWL_OUTPUT_FORMAT");
    cmd.env("DOCCRAWL_ROOT", root);
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Write `sources/<name>/config.toml` and return the source directory.
#[allow(dead_code)]
pub fn add_source(root: &Path, name: &str, config: &str) -> PathBuf {
    let dir = root.join("sources").join(name);
    fs::create_dir_all(&dir).expect("create source dir");
    fs::write(dir.join("config.toml"), config).expect("write config");
    dir
}

/// Write a generated page under `output/` and record it in the state file,
/// the way a crawl leaves them.
#[allow(dead_code)]
pub fn add_page(
    source_dir: &Path,
    identifier: &str,
    url: &str,
    body: &str,
    etag: Option<&str>,
) {
    let path = source_dir.join("output").join(format!("{identifier}.md"));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, format!("---\nsource_url: \"{url}\"\n---\n\n{body}\n")).unwrap();

    let mut state = CrawlState::load(source_dir);
    state.set_page(
        identifier,
        PageRecord::new(url, fingerprint(body), identifier)
            .with_validators(etag.map(ToString::to_string), None),
    );
    state.save().unwrap();
}
