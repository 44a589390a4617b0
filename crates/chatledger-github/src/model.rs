//! Typed GitHub API payloads.

use serde::{Deserialize, Serialize};

/// Organization metadata returned by `GET /orgs/{org}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Org {
    /// Organization login name.
    pub login: String,
    /// Numeric organization ID.
    pub id: u64,
    /// Endpoint listing the organization's public repositories.
    pub repos_url: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Number of public repositories.
    #[serde(default)]
    pub public_repos: Option<u64>,
}

/// Repository record from the organization's repos listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Repo {
    /// Repository name.
    pub name: String,
    /// Owner-qualified name (`owner/name`).
    #[serde(default)]
    pub full_name: Option<String>,
    /// Whether the repository is private.
    #[serde(default)]
    pub private: bool,
    /// License metadata, absent for unlicensed repositories.
    #[serde(default)]
    pub license: Option<License>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
}

impl Repo {
    /// True when the repository carries a license with the given key.
    ///
    /// A repository without license metadata matches nothing.
    #[must_use]
    pub fn has_license(&self, key: &str) -> bool {
        self.license.as_ref().is_some_and(|l| l.key == key)
    }
}

/// License metadata attached to a repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct License {
    /// SPDX-ish license key (e.g. `apache-2.0`).
    pub key: String,
    /// Human-readable license name.
    #[serde(default)]
    pub name: Option<String>,
}
