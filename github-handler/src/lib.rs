//! Code-hosting client seam: the [`CodeHost`] capability, its error taxonomy,
//! the rate-limit gate every handler goes through, and a GitHub REST adapter.

pub mod client;
pub mod error;
pub mod github;
pub mod rate;

pub use client::CodeHost;
pub use error::{HostError, HostResult};
pub use github::{GitHubClient, GitHubConfig};
pub use rate::{Fetched, RateGate, RateLimit};
