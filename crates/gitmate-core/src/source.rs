//! Remote repository reader interface.
//!
//! Directory listings and raw file bodies come from a hosted source-control
//! API; this module holds the provider-neutral types and the reader trait.

use crate::error::{GitMateError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Owner/name pair identifying a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub owner: String,
    pub repo: String,
}

impl RepoCoordinates {
    /// Parses `owner/repo` from a repository URL.
    ///
    /// The first two path segments after the host are used; a trailing
    /// `.git` is dropped. URLs without a scheme are accepted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when fewer than two path segments are present.
    pub fn parse(url: &str) -> Result<Self> {
        let without_scheme = url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(url);
        let without_query = without_scheme
            .split(['?', '#'])
            .next()
            .unwrap_or(without_scheme);

        let mut segments = without_query.split('/').filter(|s| !s.is_empty()).skip(1);

        match (segments.next(), segments.next()) {
            (Some(owner), Some(repo)) => Ok(Self {
                owner: owner.to_string(),
                repo: repo.trim_end_matches(".git").to_string(),
            }),
            _ => Err(GitMateError::invalid_input(format!(
                "'{url}' is not a repository URL (expected https://github.com/<owner>/<repo>)"
            ))),
        }
    }
}

/// Kind of a listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Dir,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoNode {
    pub name: String,
    /// Path relative to the repository root
    pub path: String,
    pub kind: NodeKind,
    /// Raw download URL; absent for directories
    pub content_url: Option<String>,
}

impl RepoNode {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Dir
    }
}

/// Orders directories before files, then by name.
///
/// Names compare case-insensitively; ties fall back to the raw name so the
/// order is total.
pub fn compare_nodes(a: &RepoNode, b: &RepoNode) -> Ordering {
    match (a.kind, b.kind) {
        (NodeKind::Dir, NodeKind::File) => Ordering::Less,
        (NodeKind::File, NodeKind::Dir) => Ordering::Greater,
        _ => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
    }
}

/// Sorts a listing in display order.
pub fn sort_nodes(nodes: &mut [RepoNode]) {
    nodes.sort_by(compare_nodes);
}

/// Reads directory listings and file bodies from a hosted repository.
///
/// # Errors
///
/// - `RateLimited` on HTTP 403
/// - `NotFound` on HTTP 404
/// - `Unavailable` on any other failure
#[async_trait]
pub trait RepositoryReader: Send + Sync {
    /// Lists `path` (empty for the root), sorted with [`compare_nodes`].
    async fn list_directory(
        &self,
        coordinates: &RepoCoordinates,
        path: &str,
        token: Option<&str>,
    ) -> Result<Vec<RepoNode>>;

    /// Downloads a file body from a listing's content URL.
    async fn read_file(&self, content_url: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, kind: NodeKind) -> RepoNode {
        RepoNode {
            name: name.to_string(),
            path: name.to_string(),
            kind,
            content_url: None,
        }
    }

    #[test]
    fn test_parse_github_url() {
        let coords = RepoCoordinates::parse("https://github.com/rust-lang/rust").unwrap();
        assert_eq!(coords.owner, "rust-lang");
        assert_eq!(coords.repo, "rust");
    }

    #[test]
    fn test_parse_tolerates_suffixes() {
        let coords =
            RepoCoordinates::parse("https://github.com/o/r.git/tree/main?tab=readme").unwrap();
        assert_eq!(coords.owner, "o");
        assert_eq!(coords.repo, "r");

        let bare = RepoCoordinates::parse("github.com/o/r/").unwrap();
        assert_eq!(bare.repo, "r");
    }

    #[test]
    fn test_parse_rejects_missing_repo() {
        assert!(RepoCoordinates::parse("https://github.com/only-owner").is_err());
        assert!(RepoCoordinates::parse("").is_err());
    }

    #[test]
    fn test_sort_dirs_first_then_alphabetical() {
        let mut nodes = vec![
            node("zeta.rs", NodeKind::File),
            node("src", NodeKind::Dir),
            node("Cargo.toml", NodeKind::File),
            node("docs", NodeKind::Dir),
            node("alpha.rs", NodeKind::File),
        ];
        sort_nodes(&mut nodes);

        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "src", "alpha.rs", "Cargo.toml", "zeta.rs"]);
    }
}
