use std::path::{Path, PathBuf};

use tracing::info;

use super::Config;
use crate::error::LoadError;

#[derive(Debug, PartialEq, Eq)]
enum Source<'a> {
    Http(&'a str),
    File(&'a Path),
}

impl<'a> Source<'a> {
    fn parse(url: &'a str) -> Self {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Source::Http(url);
        }
        Source::File(Path::new(url.strip_prefix("file://").unwrap_or(url)))
    }
}

/// Load the configuration from a `file://` URL, a bare path, or over HTTP.
///
/// Documents whose path ends in `.toml` are read as TOML, everything else
/// as JSON.
pub async fn load(url: &str) -> Result<Config, LoadError> {
    let source = Source::parse(url);
    let body = match source {
        Source::Http(url) => read_http(url).await?,
        Source::File(path) => read_local(path).await?,
    };
    info!("Loaded configuration from {} ({} bytes)", url, body.len());

    if is_toml(url) {
        let text = String::from_utf8_lossy(&body);
        Ok(toml::from_str(&text)?)
    } else {
        Ok(serde_json::from_slice(&body)?)
    }
}

fn is_toml(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.ends_with(".toml")
}

async fn read_http(url: &str) -> Result<Vec<u8>, LoadError> {
    let response = reqwest::get(url)
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(LoadError::Fetch)?;
    let body = response.bytes().await.map_err(LoadError::Fetch)?;
    Ok(body.to_vec())
}

async fn read_local(path: &Path) -> Result<Vec<u8>, LoadError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| LoadError::Read { path: PathBuf::from(path), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parsing() {
        assert_eq!(Source::parse("http://cfg/checks.json"), Source::Http("http://cfg/checks.json"));
        assert_eq!(Source::parse("https://cfg/checks.json"), Source::Http("https://cfg/checks.json"));
        assert_eq!(Source::parse("file:///etc/checkup.json"), Source::File(Path::new("/etc/checkup.json")));
        assert_eq!(Source::parse("checks.json"), Source::File(Path::new("checks.json")));
    }

    #[test]
    fn test_format_detection() {
        assert!(is_toml("file:///etc/checkup.toml"));
        assert!(is_toml("https://cfg/checkup.toml?rev=2"));
        assert!(!is_toml("/etc/checkup.json"));
    }

    #[tokio::test]
    async fn test_load_local_json_and_toml() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("checks.json");
        std::fs::write(&json_path, r#"{"Agents": {"h": {"Checks": ["p"]}}, "Products": {"p": []}}"#).unwrap();
        let config = load(&format!("file://{}", json_path.display())).await.unwrap();
        assert_eq!(config.agents["h"].checks, vec!["p".to_string()]);

        let toml_path = dir.path().join("checks.toml");
        std::fs::write(
            &toml_path,
            r#"
[Agents.h]
Checks = ["p"]

[Agents.h.Options]
File = "/tmp/status.json"

[[Products.p]]
Name = "home"
Service = "http"
Interval = "10s"

[Products.p.Options]
Url = "http://localhost/"

[Products.p.Tests.http-check-status.Arguments]
status = 200
"#,
        )
        .unwrap();
        let config = load(toml_path.to_str().unwrap()).await.unwrap();
        let check = &config.products["p"][0];
        assert_eq!(check.options.require_str("Url").unwrap(), "http://localhost/");
        assert_eq!(check.tests["http-check-status"].arguments.require_number("status").unwrap(), 200.0);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load("file:///definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }
}
