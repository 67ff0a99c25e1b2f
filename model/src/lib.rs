pub mod contribution;
pub mod developer;
pub mod github;
pub mod repo;
pub mod review;
pub mod task;

pub use contribution::{contribution_id, Contribution, ContributionType, CURRENT_SCORE_VERSION};
pub use developer::{
    Developer, DimensionScores, IngestionRun, IngestionStatus, QualificationFilter,
};
pub use repo::{DomainScore, RepoMetadata, RepoPortfolio};
pub use review::{review_id, Review, ReviewState};
pub use task::Task;

use sha2::{Digest, Sha256};

/// Lowercase hex sha256 of `input`, used for content-addressed record ids.
pub(crate) fn content_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    format!("{:x}", digest)
}

/// Fallback domain tag for contributions nothing else could place.
pub const DEFAULT_DOMAIN: &str = "general";

/// Upper bound on domain tags carried by one contribution.
pub const MAX_DOMAINS: usize = 5;
