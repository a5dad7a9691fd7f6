//! GitHub REST implementation of the host and discovery collaborators.
//!
//! Uses a blocking `reqwest` client; every call runs on the calling thread,
//! which in fleet runs is one of the bounded worker threads. Requests time
//! out after `github.timeout_secs` and a timeout is reported like any other
//! failed request.

use crate::config::GitHubConfig;
use crate::error::{Error, Result};
use crate::repository::{RepoDiscovery, RepoRef, VersionControlHost};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RefEntry {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct OwnerEntry {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ParentEntry {
    name: String,
    owner: OwnerEntry,
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct RepoEntry {
    name: String,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    fork: bool,
    parent: Option<ParentEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Client for the GitHub REST API
#[derive(Clone)]
pub struct GitHubClient {
    api_url: String,
    token: Option<String>,
    client: Client,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig, token: Option<String>) -> Self {
        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token,
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, self.url(path))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, concat!("booster-release/", env!("CARGO_PKG_VERSION")));
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {}", token));
        }
        request
    }

    fn send(&self, request: RequestBuilder, operation: &str, repo: &str) -> Result<Response> {
        request.send().map_err(|e| Error::Host {
            operation: operation.to_string(),
            repo: repo.to_string(),
            message: e.to_string(),
        })
    }

    fn expect_success(response: Response, operation: &str, repo: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(Error::Host {
            operation: operation.to_string(),
            repo: repo.to_string(),
            message: format!("{}: {}", status, api_message(&body)),
        })
    }

    fn json<T: DeserializeOwned>(response: Response, operation: &str, repo: &str) -> Result<T> {
        response.json::<T>().map_err(|e| Error::Host {
            operation: operation.to_string(),
            repo: repo.to_string(),
            message: format!("unexpected response: {}", e),
        })
    }

    /// Fetches every page of a list endpoint.
    fn get_all<T: DeserializeOwned>(&self, path: &str, operation: &str, repo: &str) -> Result<Vec<T>> {
        let separator = if path.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();
        for page in 1.. {
            let paged = format!("{}{}per_page={}&page={}", path, separator, PAGE_SIZE, page);
            let response = self.send(self.request(Method::GET, &paged), operation, repo)?;
            let response = Self::expect_success(response, operation, repo)?;
            let batch: Vec<T> = Self::json(response, operation, repo)?;
            let done = batch.len() < PAGE_SIZE;
            items.extend(batch);
            if done {
                break;
            }
        }
        Ok(items)
    }
}

/// Extracts the `message` of a GitHub error body, or the body itself.
fn api_message(body: &str) -> String {
    serde_json::from_str::<ApiError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

impl VersionControlHost for GitHubClient {
    fn get_tags(&self, repo: &RepoRef) -> Result<Vec<String>> {
        let path = format!("/repos/{}/{}/tags", repo.owner, repo.name);
        let tags: Vec<TagEntry> = self.get_all(&path, "get_tags", &repo.full_name())?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }

    fn get_branch_sha(&self, repo: &RepoRef, branch: &str) -> Result<Option<String>> {
        let path = format!("/repos/{}/{}/git/ref/heads/{}", repo.owner, repo.name, branch);
        let full_name = repo.full_name();
        let response = self.send(self.request(Method::GET, &path), "get_branch_sha", &full_name)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::expect_success(response, "get_branch_sha", &full_name)?;
        let entry: RefEntry = Self::json(response, "get_branch_sha", &full_name)?;
        Ok(Some(entry.object.sha))
    }

    fn create_tag_ref(&self, repo: &RepoRef, name: &str, sha: &str) -> Result<()> {
        let path = format!("/repos/{}/{}/git/refs", repo.owner, repo.name);
        let request = self
            .request(Method::POST, &path)
            .json(&json!({ "ref": format!("refs/tags/{}", name), "sha": sha }));
        let full_name = repo.full_name();
        let response = self.send(request, "create_tag_ref", &full_name)?;
        Self::expect_success(response, "create_tag_ref", &full_name)?;
        Ok(())
    }

    fn delete_branch_ref(&self, repo: &RepoRef, branch: &str) -> Result<()> {
        let path = format!("/repos/{}/{}/git/refs/heads/{}", repo.owner, repo.name, branch);
        let full_name = repo.full_name();
        let response = self.send(self.request(Method::DELETE, &path), "delete_branch_ref", &full_name)?;
        Self::expect_success(response, "delete_branch_ref", &full_name)?;
        Ok(())
    }

    fn update_branch_ref(&self, repo: &RepoRef, branch: &str, sha: &str, force: bool) -> Result<()> {
        let path = format!("/repos/{}/{}/git/refs/heads/{}", repo.owner, repo.name, branch);
        let request = self
            .request(Method::PATCH, &path)
            .json(&json!({ "sha": sha, "force": force }));
        let full_name = repo.full_name();
        let response = self.send(request, "update_branch_ref", &full_name)?;
        Self::expect_success(response, "update_branch_ref", &full_name)?;
        Ok(())
    }

    fn fork_parent(&self, repo: &RepoRef) -> Result<Option<RepoRef>> {
        let path = format!("/repos/{}/{}", repo.owner, repo.name);
        let full_name = repo.full_name();
        let response = self.send(self.request(Method::GET, &path), "fork_parent", &full_name)?;
        let response = Self::expect_success(response, "fork_parent", &full_name)?;
        let entry: RepoEntry = Self::json(response, "fork_parent", &full_name)?;
        if !entry.fork {
            return Ok(None);
        }
        Ok(entry
            .parent
            .map(|parent| RepoRef::new(parent.owner.login, parent.name, parent.default_branch)))
    }

    fn create_pull_request(&self, repo: &RepoRef, head: &str, base: &str, title: &str) -> Result<()> {
        let path = format!("/repos/{}/{}/pulls", repo.owner, repo.name);
        let request = self
            .request(Method::POST, &path)
            .json(&json!({ "title": title, "head": head, "base": base }));
        let full_name = repo.full_name();
        let response = self.send(request, "create_pull_request", &full_name)?;
        Self::expect_success(response, "create_pull_request", &full_name)?;
        Ok(())
    }
}

impl RepoDiscovery for GitHubClient {
    fn find_repos(&self, org: &str, topic: &str, branch: &str) -> Result<Vec<RepoRef>> {
        let path = format!("/orgs/{}/repos?type=all", org);
        let repos: Vec<RepoEntry> = self.get_all(&path, "find_repos", org)?;
        Ok(select_repos(repos, org, topic, branch))
    }
}

fn select_repos(repos: Vec<RepoEntry>, org: &str, topic: &str, branch: &str) -> Vec<RepoRef> {
    let mut selected: Vec<RepoRef> = repos
        .into_iter()
        .filter(|repo| !repo.archived && repo.topics.iter().any(|t| t == topic))
        .map(|repo| RepoRef::new(org, repo.name, branch))
        .collect();
    selected.sort_by(|a, b| a.name.cmp(&b.name));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_message_prefers_json_message() {
        assert_eq!(
            api_message(r#"{"message":"Reference already exists","documentation_url":"x"}"#),
            "Reference already exists"
        );
        assert_eq!(api_message(" Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn test_select_repos_filters_topic_and_archived() {
        let repos: Vec<RepoEntry> = serde_json::from_str(
            r#"[
                {"name": "rest-http-example", "topics": ["booster", "spring-boot"]},
                {"name": "crud-example", "topics": ["booster"], "archived": false},
                {"name": "old-example", "topics": ["booster"], "archived": true},
                {"name": "spring-boot-bom", "topics": ["bom"]},
                {"name": "no-topics"}
            ]"#,
        )
        .unwrap();
        let selected = select_repos(repos, "snowdrop", "booster", "sb-2.2.x");
        let names: Vec<&str> = selected.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["crud-example", "rest-http-example"]);
        assert!(selected.iter().all(|r| r.branch == "sb-2.2.x" && r.owner == "snowdrop"));
    }

    #[test]
    fn test_parent_parsing() {
        let entry: RepoEntry = serde_json::from_str(
            r#"{"name": "launcher-booster-catalog", "fork": true,
                "parent": {"name": "launcher-booster-catalog", "default_branch": "master",
                           "owner": {"login": "fabric8-launcher"}}}"#,
        )
        .unwrap();
        assert!(entry.fork);
        let parent = entry.parent.unwrap();
        assert_eq!(parent.owner.login, "fabric8-launcher");
        assert_eq!(parent.default_branch, "master");
    }

    #[test]
    fn test_client_trims_api_url() {
        let config = GitHubConfig {
            api_url: "https://api.github.com/".to_string(),
            ..GitHubConfig::default()
        };
        let client = GitHubClient::new(&config, None);
        assert_eq!(client.url("/repos/a/b"), "https://api.github.com/repos/a/b");
    }

    #[test]
    #[cfg_attr(not(feature = "integration-tests"), ignore)]
    fn test_get_tags_from_public_repository() {
        let client = GitHubClient::new(&GitHubConfig::default(), std::env::var("GITHUB_TOKEN").ok());
        let repo = RepoRef::new("snowdrop", "rest-http-example", "sb-2.2.x");
        let tags = client.get_tags(&repo).unwrap();
        assert!(!tags.is_empty());
    }
}
