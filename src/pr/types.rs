use serde::{Deserialize, Deserializer};

/// Owner and name of the repository being queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub owner: String,
    pub repo: String,
}

impl std::fmt::Display for RepoCoordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// One entry of the closed pull request listing.
/// Only the fields needed to match a commit are decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestSummary {
    pub number: u64,
    /// Null for pull requests that were closed without merging.
    #[serde(default)]
    pub merge_commit_sha: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

/// Full pull request record as returned by `GET /repos/{owner}/{repo}/pulls/{number}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestDetail {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub html_url: String,
    pub user: User,
    #[serde(default)]
    pub merged_by: Option<User>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub labels: Vec<Label>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub assignees: Vec<User>,
}

/// The API may send `null` instead of `[]` for collections.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// The merged pull request a commit resolved to, reduced to the fields
/// the pipeline consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedPullRequest {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub url: String,
    /// Login of the user who opened the pull request
    pub author: String,
    /// Absent when the merge did not record a merger
    pub merged_by: Option<String>,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
}

impl From<PullRequestDetail> for MergedPullRequest {
    fn from(detail: PullRequestDetail) -> Self {
        MergedPullRequest {
            number: detail.number,
            title: detail.title,
            body: detail.body,
            url: detail.html_url,
            author: detail.user.login,
            merged_by: detail.merged_by.map(|u| u.login),
            labels: detail.labels.into_iter().map(|l| l.name).collect(),
            assignees: detail.assignees.into_iter().map(|a| a.login).collect(),
        }
    }
}
