//! # chatledger-github
//!
//! Thin GitHub REST API client for organization-scoped reads.
//!
//! ## Features
//!
//! - **Memoized lookups**: organization metadata and the repository listing
//!   are fetched once per client instance, lazily, on first access
//! - **Failure transparency**: errors are never cached; a later access
//!   retries the fetch
//! - **Concurrency-safe first access**: simultaneous first reads are
//!   serialized onto a single request
//! - **Typed payloads**: responses deserialize into [`Org`] and [`Repo`];
//!   malformed JSON is a hard error
//!
//! ## Quick Start
//!
//! ```ignore
//! use chatledger_github::OrgClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OrgClient::new("rust-lang")?;
//!
//!     // First access fetches; the second returns the cached payload.
//!     let org = client.org().await?;
//!     println!("{} has {:?} public repos", org.login, org.public_repos);
//!
//!     // Derived from the org payload's repos_url, also memoized.
//!     let apache = client.public_repos(Some("apache-2.0")).await?;
//!     println!("Apache-licensed: {apache:?}");
//!     Ok(())
//! }
//! ```
//!
//! ### Authenticated access
//!
//! ```ignore
//! let token = std::env::var("GITHUB_TOKEN")?;
//! let client = OrgClient::new("my-org")?.with_token(token);
//! ```
//!
//! The cache lives exactly as long as the client instance: there is no
//! expiry or invalidation. Create a fresh instance to refetch.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod model;

pub use client::OrgClient;
pub use error::{Error, Result};
pub use model::{License, Org, Repo};
