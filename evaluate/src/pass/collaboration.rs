use crate::aggregate::{log_norm, DeveloperActivity};
use crate::config::EvaluationContext;
use crate::pass::{AnyEvaluationPass, PassData};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct CollaborationData {
    pub repos: usize,
    pub orgs: usize,
    pub collaborators: usize,
}

impl From<&DeveloperActivity> for CollaborationData {
    fn from(activity: &DeveloperActivity) -> Self {
        let login = activity.login.to_lowercase();
        let repos: HashSet<String> = activity
            .contributions
            .iter()
            .map(|c| c.repo.to_lowercase())
            .chain(activity.reviews.iter().map(|r| r.repo.to_lowercase()))
            .collect();
        let orgs: HashSet<&str> = repos
            .iter()
            .filter_map(|r| r.split_once('/').map(|(owner, _)| owner))
            .filter(|owner| *owner != login)
            .collect();
        let collaborators: HashSet<String> = activity
            .reviews
            .iter()
            .filter_map(|r| r.pr_author.as_ref())
            .map(|a| a.to_lowercase())
            .filter(|a| *a != login)
            .collect();
        Self {
            repos: repos.len(),
            orgs: orgs.len(),
            collaborators: collaborators.len(),
        }
    }
}

/// 100×(0.4·n(repos) + 0.3·n(orgs) + 0.3·n(collaborators))
pub struct Collaboration;

impl AnyEvaluationPass for Collaboration {
    fn apply(&self, ctx: &EvaluationContext, data: &dyn PassData) -> f64 {
        let Some(data) = data.as_any().downcast_ref::<CollaborationData>() else {
            return 0.0;
        };
        let agg = &ctx.aggregation;
        100.0
            * (0.4 * log_norm(data.repos as f64, agg.collaboration_repo_ref)
                + 0.3 * log_norm(data.orgs as f64, agg.collaboration_org_ref)
                + 0.3 * log_norm(data.collaborators as f64, agg.collaboration_peer_ref))
    }

    fn required_data(&self, activity: &DeveloperActivity) -> Box<dyn PassData> {
        Box::new(CollaborationData::from(activity))
    }

    fn name(&self) -> &'static str {
        "collaboration"
    }
}
