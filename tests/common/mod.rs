#![allow(dead_code)]

use confluence_snapshot::Settings;
use httpmock::MockServer;
use std::path::Path;
use tempfile::TempDir;

/// 指向 mock server 的 wiki 設定
pub fn wiki_settings(server: &MockServer, output: &TempDir) -> Settings {
    Settings {
        base_url: Some(server.url("/wiki")),
        username: Some("ada@example.com".to_string()),
        api_token: Some("secret".to_string()),
        output_path: output.path().to_str().unwrap().to_string(),
        ..Settings::default()
    }
}

pub fn read_json(dir: &TempDir, file: &str) -> serde_json::Value {
    let path = dir.path().join(file);
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.ends_with('\n'), "{} should end with a newline", path.display());
    serde_json::from_str(&content).unwrap()
}

pub fn exists(dir: &TempDir, file: &str) -> bool {
    Path::new(dir.path()).join(file).exists()
}
