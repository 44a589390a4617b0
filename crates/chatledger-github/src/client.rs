//! Memoizing client for organization-scoped GitHub API calls.

use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::model::{Org, Repo};

/// Default API root.
const DEFAULT_BASE_URL: &str = "https://api.github.com/";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for one organization's GitHub API resources.
///
/// The expensive lookups ([`org`](Self::org) and [`repos`](Self::repos)) are
/// computed once per instance, lazily, on first access. A failed fetch is
/// not cached; the next access retries. Concurrent first access is
/// serialized so only one request is issued.
#[derive(Debug)]
pub struct OrgClient {
    org_name: String,
    token: Option<String>,
    base_url: Url,
    http_client: reqwest::Client,
    org: OnceCell<Org>,
    repos: OnceCell<Vec<Repo>>,
}

impl OrgClient {
    /// Creates a client for the given organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(org_name: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("chatledger/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            org_name: org_name.into(),
            token: None,
            base_url: Url::parse(DEFAULT_BASE_URL)?,
            http_client,
            org: OnceCell::new(),
            repos: OnceCell::new(),
        })
    }

    /// Sets a bearer token for authenticated access.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Overrides the API root (useful for tests and GitHub Enterprise).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Url::parse(base_url.as_ref())?;
        Ok(self)
    }

    /// The organization this client is scoped to.
    #[must_use]
    pub fn org_name(&self) -> &str {
        &self.org_name
    }

    /// Organization metadata, fetched once and memoized.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or the payload is not valid JSON. The failure is
    /// not cached.
    pub async fn org(&self) -> Result<&Org> {
        self.org
            .get_or_try_init(|| async {
                let url = self.base_url.join(&format!("orgs/{}", self.org_name))?;
                debug!("fetching organization metadata from {url}");
                self.get_json(url).await
            })
            .await
    }

    /// The endpoint listing the organization's public repositories.
    ///
    /// # Errors
    ///
    /// Propagates any error from fetching the organization metadata.
    pub async fn public_repos_url(&self) -> Result<&str> {
        Ok(self.org().await?.repos_url.as_str())
    }

    /// The organization's repository listing, fetched once and memoized.
    ///
    /// Follows the `repos_url` from the (memoized) organization payload.
    ///
    /// # Errors
    ///
    /// Returns an error if either fetch fails; failures are not cached.
    pub async fn repos(&self) -> Result<&[Repo]> {
        let repos = self
            .repos
            .get_or_try_init(|| async {
                let url = Url::parse(self.public_repos_url().await?)?;
                debug!("fetching repository listing from {url}");
                self.get_json(url).await
            })
            .await?;
        Ok(repos.as_slice())
    }

    /// Public repository names, optionally filtered by license key.
    ///
    /// # Errors
    ///
    /// Propagates any error from fetching the repository listing.
    pub async fn public_repos(&self, license: Option<&str>) -> Result<Vec<String>> {
        let repos = self.repos().await?;
        Ok(repos
            .iter()
            .filter(|repo| license.is_none_or(|key| repo.has_license(key)))
            .map(|repo| repo.name.clone())
            .collect())
    }

    /// Perform a GET request and decode the JSON payload.
    ///
    /// The body is read as text and parsed explicitly so a malformed payload
    /// surfaces as [`Error::Json`] rather than being swallowed.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let mut request = self.http_client.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(Into::into)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let client = OrgClient::new("rust-lang").unwrap();
        assert_eq!(client.org_name(), "rust-lang");
        assert_eq!(client.base_url.as_str(), "https://api.github.com/");
    }

    #[test]
    fn test_base_url_override() {
        let client = OrgClient::new("x")
            .unwrap()
            .with_base_url("http://127.0.0.1:9999/")
            .unwrap();
        let url = client.base_url.join("orgs/x").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9999/orgs/x");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = OrgClient::new("x").unwrap().with_base_url("not a url");
        assert!(matches!(err, Err(Error::Url(_))));
    }

    #[test]
    fn test_token_is_stored() {
        let client = OrgClient::new("x").unwrap().with_token("secret");
        assert_eq!(client.token.as_deref(), Some("secret"));
    }
}
