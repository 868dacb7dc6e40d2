use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::{debug, instrument};

use super::types::{PullRequestDetail, PullRequestSummary, RepoCoordinates};
use super::PrError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Page size of the closed pull request listing. Only the first page is read.
pub const LIST_PAGE_SIZE: u32 = 100;

/// Read-only access to the pull request endpoints the resolver needs.
#[async_trait]
pub trait PullRequestApi: Send + Sync {
    /// List the most recently updated closed pull requests, newest first.
    async fn list_closed_pulls(
        &self,
        coords: &RepoCoordinates,
    ) -> Result<Vec<PullRequestSummary>, PrError>;

    /// Fetch the full record of one pull request.
    async fn get_pull(
        &self,
        coords: &RepoCoordinates,
        number: u64,
    ) -> Result<PullRequestDetail, PrError>;
}

/// `PullRequestApi` backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: token.into(),
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header(USER_AGENT, "merged-pr")
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, PrError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PrError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl PullRequestApi for GitHubClient {
    #[instrument(skip(self, coords), fields(repo = %coords))]
    async fn list_closed_pulls(
        &self,
        coords: &RepoCoordinates,
    ) -> Result<Vec<PullRequestSummary>, PrError> {
        let url = format!(
            "{}/repos/{}/{}/pulls",
            self.base_url, coords.owner, coords.repo
        );
        let per_page = LIST_PAGE_SIZE.to_string();
        let request = self.get(&url).query(&[
            ("state", "closed"),
            ("sort", "updated"),
            ("direction", "desc"),
            ("per_page", per_page.as_str()),
        ]);

        debug!("listing closed pull requests");
        let pulls: Vec<PullRequestSummary> = self.send_json(request).await?;
        debug!(count = pulls.len(), "received pull request listing");
        Ok(pulls)
    }

    #[instrument(skip(self, coords), fields(repo = %coords))]
    async fn get_pull(
        &self,
        coords: &RepoCoordinates,
        number: u64,
    ) -> Result<PullRequestDetail, PrError> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}",
            self.base_url, coords.owner, coords.repo, number
        );

        debug!("fetching pull request detail");
        let detail: PullRequestDetail = self.send_json(self.get(&url)).await?;
        debug!(title = %detail.title, "received pull request detail");
        Ok(detail)
    }
}
