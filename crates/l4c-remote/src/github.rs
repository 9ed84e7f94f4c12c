//! Repository listing from the GitHub REST API.

use std::time::Duration;

use l4c_core::remote::{RepoRecord, RepoSource, is_github_username};
use reqwest::{Client, RequestBuilder, header};
use serde::Deserialize;

use crate::{Error, Result};

const PER_PAGE: usize = 100;
const MAX_PAGES: u32 = 10;

/// Connection settings for the GitHub API.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// Optional personal access token; raises the rate limit.
  #[serde(default)]
  pub token:    Option<String>,
}

fn default_base_url() -> String { "https://api.github.com".into() }

impl Default for GithubConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      token:    None,
    }
  }
}

/// Async client for `GET /users/{username}/repos`.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct GithubClient {
  client: Client,
  config: GithubConfig,
}

/// The subset of GitHub's repository object that becomes a link.
#[derive(Deserialize)]
struct GithubRepo {
  id:               i64,
  name:             String,
  description:      Option<String>,
  html_url:         String,
  language:         Option<String>,
  stargazers_count: i64,
  forks_count:      i64,
  #[serde(default)]
  topics:           Vec<String>,
  owner:            GithubOwner,
}

#[derive(Deserialize)]
struct GithubOwner {
  login: String,
}

impl From<GithubRepo> for RepoRecord {
  fn from(r: GithubRepo) -> Self {
    Self {
      id:          r.id,
      name:        r.name,
      description: r.description,
      url:         r.html_url,
      language:    r.language,
      stars:       r.stargazers_count,
      forks:       r.forks_count,
      topics:      r.topics,
      owner:       r.owner.login,
    }
  }
}

impl GithubClient {
  pub fn new(config: GithubConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .user_agent(concat!("link4coders/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    let req = req.header(header::ACCEPT, "application/vnd.github+json");
    match &self.config.token {
      Some(token) if !token.is_empty() => req.bearer_auth(token),
      _ => req,
    }
  }

  async fn fetch_page(&self, username: &str, page: u32) -> Result<Vec<GithubRepo>> {
    let resp = self
      .auth(self.client.get(self.url(&format!("/users/{username}/repos"))))
      .query(&[
        ("per_page", PER_PAGE.to_string()),
        ("page", page.to_string()),
        ("sort", "updated".to_string()),
      ])
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Status {
        service: "github",
        status:  status.as_u16(),
        body:    resp.text().await.unwrap_or_default(),
      });
    }
    Ok(resp.json().await?)
  }
}

impl RepoSource for GithubClient {
  type Error = Error;

  async fn list_repos(&self, username: &str) -> Result<Vec<RepoRecord>> {
    if !is_github_username(username) {
      return Err(Error::InvalidUsername(username.to_owned()));
    }
    let mut repos = Vec::new();
    for page in 1..=MAX_PAGES {
      let batch = self.fetch_page(username, page).await?;
      let short = batch.len() < PER_PAGE;
      repos.extend(batch.into_iter().map(RepoRecord::from));
      if short {
        break;
      }
    }
    tracing::debug!(username, count = repos.len(), "fetched github repositories");
    Ok(repos)
  }
}
