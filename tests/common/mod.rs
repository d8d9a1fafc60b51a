#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use file_uploader::Config;
use url::Url;

/// Source/completed/failed under one temp root, poll-only with a fast scan.
pub fn pipeline_config(root: &Path, url: &str) -> Config {
    let mut cfg = Config::new(
        root.join("incoming"),
        root.join("completed"),
        root.join("failed"),
        Url::parse(url).unwrap(),
    );
    cfg.watch = false;
    cfg.scan_interval = Some(Duration::from_millis(50));
    cfg
}

pub fn upload_url(server: &wiremock::MockServer) -> String {
    format!("{}/upload", server.uri())
}

/// Poll until `path` exists or the deadline passes.
pub async fn wait_for(path: &Path, within: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    path.exists()
}

pub fn entries(dir: &Path) -> Vec<PathBuf> {
    let mut v: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|rd| rd.filter_map(|e| e.ok().map(|e| e.path())).collect())
        .unwrap_or_default();
    v.sort();
    v
}
