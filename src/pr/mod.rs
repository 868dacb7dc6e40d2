pub mod client;
pub mod types;

pub use client::{GitHubClient, PullRequestApi};
pub use types::{MergedPullRequest, RepoCoordinates};

use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("GitHub API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid repository '{0}', expected owner/name")]
    InvalidRepository(String),
}

/// Parse an `owner/name` repository slug, as found in `GITHUB_REPOSITORY`.
pub fn parse_repository(slug: &str) -> Result<RepoCoordinates, PrError> {
    let invalid = || PrError::InvalidRepository(slug.to_string());
    let (owner, repo) = slug.trim().split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(invalid());
    }
    Ok(RepoCoordinates {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

/// Find the merged pull request whose merge commit is `sha`.
///
/// Reads a single page of the most recently updated closed pull requests and
/// takes the first entry whose `merge_commit_sha` equals `sha` exactly. A
/// match further back than that page resolves to `None`. On a match the full
/// record is fetched once and projected. Failures of either request are
/// returned as-is; nothing is retried.
#[instrument(skip_all, fields(repo = %coords, sha = %sha))]
pub async fn resolve(
    api: &dyn PullRequestApi,
    coords: &RepoCoordinates,
    sha: &str,
) -> Result<Option<MergedPullRequest>, PrError> {
    let pulls = api.list_closed_pulls(coords).await?;
    let Some(summary) = pulls
        .iter()
        .find(|p| p.merge_commit_sha.as_deref() == Some(sha))
    else {
        debug!(scanned = pulls.len(), "no closed pull request merged this commit");
        return Ok(None);
    };

    info!(pr = summary.number, "matched merge commit");
    let detail = api.get_pull(coords, summary.number).await?;
    Ok(Some(MergedPullRequest::from(detail)))
}

#[cfg(test)]
mod tests {
    use super::types::{Label, PullRequestDetail, PullRequestSummary, User};
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory `PullRequestApi` that records every call it receives.
    #[derive(Default)]
    struct FakeApi {
        listing: Vec<PullRequestSummary>,
        details: Vec<PullRequestDetail>,
        fail_listing: Option<String>,
        fail_detail: Option<String>,
        list_calls: Mutex<usize>,
        get_calls: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl PullRequestApi for FakeApi {
        async fn list_closed_pulls(
            &self,
            _coords: &RepoCoordinates,
        ) -> Result<Vec<PullRequestSummary>, PrError> {
            *self.list_calls.lock().unwrap() += 1;
            if let Some(message) = &self.fail_listing {
                return Err(PrError::Status {
                    status: 401,
                    message: message.clone(),
                });
            }
            Ok(self.listing.clone())
        }

        async fn get_pull(
            &self,
            _coords: &RepoCoordinates,
            number: u64,
        ) -> Result<PullRequestDetail, PrError> {
            self.get_calls.lock().unwrap().push(number);
            if let Some(message) = &self.fail_detail {
                return Err(PrError::Status {
                    status: 502,
                    message: message.clone(),
                });
            }
            self.details
                .iter()
                .find(|d| d.number == number)
                .cloned()
                .ok_or(PrError::Status {
                    status: 404,
                    message: "Not Found".to_string(),
                })
        }
    }

    fn summary(number: u64, sha: Option<&str>) -> PullRequestSummary {
        PullRequestSummary {
            number,
            merge_commit_sha: sha.map(str::to_string),
        }
    }

    fn detail(
        number: u64,
        title: &str,
        labels: &[&str],
        assignees: &[&str],
        author: &str,
    ) -> PullRequestDetail {
        PullRequestDetail {
            number,
            title: title.to_string(),
            body: None,
            html_url: format!("https://github.com/org/repo/pull/{number}"),
            user: User {
                login: author.to_string(),
            },
            merged_by: None,
            labels: labels
                .iter()
                .map(|l| Label {
                    name: l.to_string(),
                })
                .collect(),
            assignees: assignees
                .iter()
                .map(|a| User {
                    login: a.to_string(),
                })
                .collect(),
        }
    }

    fn coords() -> RepoCoordinates {
        RepoCoordinates {
            owner: "org".to_string(),
            repo: "repo".to_string(),
        }
    }

    #[test]
    fn test_parse_valid_repository() {
        let coords = parse_repository("org/repo").unwrap();
        assert_eq!(coords.owner, "org");
        assert_eq!(coords.repo, "repo");
    }

    #[test]
    fn test_parse_invalid_repository() {
        assert!(parse_repository("repo").is_err());
        assert!(parse_repository("/repo").is_err());
        assert!(parse_repository("org/").is_err());
        assert!(parse_repository("org/repo/extra").is_err());
    }

    #[tokio::test]
    async fn test_resolve_matching_commit() {
        let api = FakeApi {
            listing: vec![summary(41, Some("fff000")), summary(42, Some("abc123"))],
            details: vec![detail(42, "Fix bug", &["bug", "urgent"], &["alice"], "bob")],
            ..Default::default()
        };

        let pr = resolve(&api, &coords(), "abc123").await.unwrap().unwrap();
        assert_eq!(pr.number, 42);
        assert_eq!(pr.title, "Fix bug");
        assert_eq!(pr.labels, vec!["bug", "urgent"]);
        assert_eq!(pr.assignees, vec!["alice"]);
        assert_eq!(pr.author, "bob");
        assert_eq!(*api.list_calls.lock().unwrap(), 1);
        assert_eq!(*api.get_calls.lock().unwrap(), vec![42]);
    }

    #[tokio::test]
    async fn test_resolve_no_match_skips_detail_request() {
        let api = FakeApi {
            listing: vec![summary(1, Some("abc123")), summary(2, None)],
            ..Default::default()
        };

        let result = resolve(&api, &coords(), "zzz999").await.unwrap();
        assert!(result.is_none());
        assert!(api.get_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_match_is_exact_and_case_sensitive() {
        let api = FakeApi {
            listing: vec![summary(1, Some("ABC123")), summary(2, Some("abc1234"))],
            ..Default::default()
        };

        assert!(resolve(&api, &coords(), "abc123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_first_match_in_listing_order_wins() {
        let api = FakeApi {
            listing: vec![summary(9, Some("abc123")), summary(5, Some("abc123"))],
            details: vec![detail(9, "Later", &[], &[], "x"), detail(5, "Earlier", &[], &[], "y")],
            ..Default::default()
        };

        let pr = resolve(&api, &coords(), "abc123").await.unwrap().unwrap();
        assert_eq!(pr.number, 9);
        assert_eq!(*api.get_calls.lock().unwrap(), vec![9]);
    }

    #[tokio::test]
    async fn test_resolve_listing_failure_propagates() {
        let api = FakeApi {
            fail_listing: Some("Bad credentials".to_string()),
            ..Default::default()
        };

        let err = resolve(&api, &coords(), "abc123").await.unwrap_err();
        assert!(err.to_string().contains("Bad credentials"));
        assert!(api.get_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_detail_failure_propagates() {
        let api = FakeApi {
            listing: vec![summary(42, Some("abc123"))],
            fail_detail: Some("upstream timeout".to_string()),
            ..Default::default()
        };

        let err = resolve(&api, &coords(), "abc123").await.unwrap_err();
        assert!(err.to_string().contains("upstream timeout"));
    }

    #[tokio::test]
    async fn test_resolve_without_merger() {
        let api = FakeApi {
            listing: vec![summary(42, Some("abc123"))],
            details: vec![detail(42, "Fix bug", &[], &[], "bob")],
            ..Default::default()
        };

        let pr = resolve(&api, &coords(), "abc123").await.unwrap().unwrap();
        assert!(pr.merged_by.is_none());
        assert!(pr.labels.is_empty());
        assert!(pr.assignees.is_empty());
    }
}
