//! GitHub contents API client.

use async_trait::async_trait;
use gitmate_core::config::{DEFAULT_GITHUB_API_BASE, DEFAULT_USER_AGENT};
use gitmate_core::error::{GitMateError, Result};
use gitmate_core::source::{NodeKind, RepoCoordinates, RepoNode, RepositoryReader, sort_nodes};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

/// Reads listings and raw file bodies from GitHub.
#[derive(Clone)]
pub struct GitHubRepositoryReader {
    client: Client,
    api_base: String,
    user_agent: String,
}

impl Default for GitHubRepositoryReader {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubRepositoryReader {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn contents_url(&self, coordinates: &RepoCoordinates, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            coordinates.owner,
            coordinates.repo,
            path.trim_matches('/')
        )
    }
}

#[derive(Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    download_url: Option<String>,
}

impl From<ContentEntry> for RepoNode {
    fn from(entry: ContentEntry) -> Self {
        let kind = if entry.kind == "dir" {
            NodeKind::Dir
        } else {
            NodeKind::File
        };
        Self {
            name: entry.name,
            path: entry.path,
            kind,
            content_url: entry.download_url,
        }
    }
}

fn map_status(status: StatusCode, path: &str) -> GitMateError {
    match status {
        StatusCode::FORBIDDEN => GitMateError::RateLimited,
        StatusCode::NOT_FOUND => GitMateError::not_found(path),
        other => GitMateError::unavailable(format!("GitHub API returned HTTP {}", other.as_u16())),
    }
}

#[async_trait]
impl RepositoryReader for GitHubRepositoryReader {
    async fn list_directory(
        &self,
        coordinates: &RepoCoordinates,
        path: &str,
        token: Option<&str>,
    ) -> Result<Vec<RepoNode>> {
        let url = self.contents_url(coordinates, path);
        tracing::debug!("Listing {}", url);

        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
            .header(reqwest::header::USER_AGENT, &self.user_agent);
        if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
            request = request.header(reqwest::header::AUTHORIZATION, format!("token {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|err| GitMateError::unavailable(format!("GitHub request failed: {err}")))?;

        if !response.status().is_success() {
            let err = map_status(response.status(), path);
            tracing::warn!("Listing '{}' failed: {}", path, err);
            return Err(err);
        }

        let body: serde_json::Value = response.json().await.map_err(|err| {
            GitMateError::unavailable(format!("Malformed GitHub response: {err}"))
        })?;

        // A file path yields an object rather than an array
        let entries: Vec<ContentEntry> = match body {
            serde_json::Value::Array(_) => serde_json::from_value(body).map_err(|err| {
                GitMateError::unavailable(format!("Malformed GitHub listing: {err}"))
            })?,
            _ => Vec::new(),
        };

        let mut nodes: Vec<RepoNode> = entries.into_iter().map(RepoNode::from).collect();
        sort_nodes(&mut nodes);
        Ok(nodes)
    }

    async fn read_file(&self, content_url: &str) -> Result<String> {
        let response = self
            .client
            .get(content_url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|err| GitMateError::unavailable(format!("Download failed: {err}")))?;

        if !response.status().is_success() {
            return Err(GitMateError::unavailable(format!(
                "Download of '{content_url}' returned HTTP {}",
                response.status().as_u16()
            )));
        }

        response
            .text()
            .await
            .map_err(|err| GitMateError::unavailable(format!("Download failed: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;

    fn coords() -> RepoCoordinates {
        RepoCoordinates {
            owner: "octo".to_string(),
            repo: "demo".to_string(),
        }
    }

    async fn list_with_status(status: &str) -> GitMateError {
        let (base, _request) = serve_once(status, "application/json", "{}".to_string()).await;
        GitHubRepositoryReader::new()
            .with_api_base(base)
            .list_directory(&coords(), "src", None)
            .await
            .err()
            .unwrap()
    }

    #[tokio::test]
    async fn test_status_mapping() {
        assert_eq!(list_with_status("403 Forbidden").await, GitMateError::RateLimited);
        assert_eq!(
            list_with_status("404 Not Found").await,
            GitMateError::not_found("src")
        );
        assert!(matches!(
            list_with_status("500 Internal Server Error").await,
            GitMateError::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_listing_is_sorted_and_sends_headers() {
        let body = serde_json::json!([
            { "name": "b.rs", "path": "src/b.rs", "type": "file", "download_url": "http://raw/b.rs" },
            { "name": "util", "path": "src/util", "type": "dir", "download_url": null },
            { "name": "A.rs", "path": "src/A.rs", "type": "file", "download_url": "http://raw/A.rs" },
            { "name": "link", "path": "src/link", "type": "symlink", "download_url": null }
        ])
        .to_string();
        let (base, request) = serve_once("200 OK", "application/json", body).await;

        let nodes = GitHubRepositoryReader::new()
            .with_api_base(base)
            .with_user_agent("gitmate-test")
            .list_directory(&coords(), "src", Some("secret"))
            .await
            .unwrap();

        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["util", "A.rs", "b.rs", "link"]);
        assert!(nodes[0].is_dir());
        assert_eq!(nodes[1].content_url.as_deref(), Some("http://raw/A.rs"));
        assert_eq!(nodes[3].kind, NodeKind::File);

        let request = request.await.unwrap();
        let lowered = request.to_lowercase();
        assert!(request.starts_with("GET /repos/octo/demo/contents/src "));
        assert!(lowered.contains("accept: application/vnd.github.v3+json"));
        assert!(lowered.contains("user-agent: gitmate-test"));
        assert!(lowered.contains("authorization: token secret"));
    }

    #[tokio::test]
    async fn test_no_token_sends_no_authorization() {
        let (base, request) = serve_once("200 OK", "application/json", "[]".to_string()).await;
        let nodes = GitHubRepositoryReader::new()
            .with_api_base(base)
            .list_directory(&coords(), "", None)
            .await
            .unwrap();
        assert!(nodes.is_empty());

        let request = request.await.unwrap();
        assert!(request.starts_with("GET /repos/octo/demo/contents/ "));
        assert!(!request.to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_non_array_body_is_empty_listing() {
        let body = r#"{"name":"README.md","type":"file"}"#.to_string();
        let (base, _request) = serve_once("200 OK", "application/json", body).await;
        let nodes = GitHubRepositoryReader::new()
            .with_api_base(base)
            .list_directory(&coords(), "README.md", None)
            .await
            .unwrap();
        assert!(nodes.is_empty());
    }

    #[tokio::test]
    async fn test_read_file_returns_body() {
        let (base, _request) =
            serve_once("200 OK", "text/plain", "fn main() {}\n".to_string()).await;
        let body = GitHubRepositoryReader::new()
            .read_file(&format!("{base}/raw/main.rs"))
            .await
            .unwrap();
        assert_eq!(body, "fn main() {}\n");
    }

    #[tokio::test]
    async fn test_read_file_failure_is_unavailable() {
        let (base, _request) = serve_once("404 Not Found", "text/plain", String::new()).await;
        let err = GitHubRepositoryReader::new()
            .read_file(&format!("{base}/raw/missing.rs"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, GitMateError::Unavailable(_)));
    }
}
