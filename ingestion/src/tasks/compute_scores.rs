use std::collections::HashMap;

use chrono::Utc;
use evaluate::classify::ClassificationInput;
use evaluate::{formula, DeveloperActivity};
use model::{RepoMetadata, Task};
use tracing::{debug, info};

use super::Pipeline;
use crate::error::{TaskError, TaskOutcome};

impl Pipeline {
    /// Classifies one batch; once nothing is left unclassified, scores and
    /// aggregates the whole developer.
    pub(crate) async fn compute_scores(&self, developer_id: &str) -> Result<TaskOutcome, TaskError> {
        let Some(developer) = self
            .store
            .get_developer(developer_id)
            .await
            .map_err(TaskError::Store)?
        else {
            return Ok(TaskOutcome::Skipped("developer vanished".into()));
        };
        if developer.opted_out {
            return Ok(TaskOutcome::Skipped("developer opted out".into()));
        }

        let batch = self
            .store
            .list_unclassified(developer_id, self.config.classify_batch)
            .await
            .map_err(TaskError::Store)?;
        for mut contribution in batch {
            let result = self
                .classifier
                .classify(&ClassificationInput::from(&contribution))
                .await;
            debug!(
                "{} classified {} via {:?}",
                contribution.sha,
                result.contribution_type.as_str(),
                result.source
            );
            contribution.contribution_type = Some(result.contribution_type);
            contribution.domains = result.domains;
            contribution.classified = true;
            self.store
                .update_contribution(&contribution)
                .await
                .map_err(TaskError::Store)?;
        }

        let remaining = self
            .store
            .count_unclassified(developer_id)
            .await
            .map_err(TaskError::Store)?;
        if remaining > 0 {
            info!("{} has {} contributions left to classify", developer_id, remaining);
            return Ok(TaskOutcome::Requeued(self.config.classify_requeue_delay()));
        }

        self.score_developer(developer_id, &developer.username).await
    }

    async fn score_developer(&self, developer_id: &str, login: &str) -> Result<TaskOutcome, TaskError> {
        let now = Utc::now();
        let mut contributions = self
            .store
            .list_contributions(developer_id)
            .await
            .map_err(TaskError::Store)?;

        let mut repos: HashMap<String, RepoMetadata> = HashMap::new();
        for c in &contributions {
            if repos.contains_key(&c.repo) {
                continue;
            }
            if let Some(meta) = self
                .store
                .get_repo_metadata(&c.repo)
                .await
                .map_err(TaskError::Store)?
            {
                repos.insert(c.repo.clone(), meta);
            }
        }

        let mut rescored = 0;
        for c in contributions.iter_mut().filter(|c| c.needs_scoring()) {
            formula::apply_score(&self.scoring.formula, c, repos.get(&c.repo), now);
            self.store
                .update_contribution(c)
                .await
                .map_err(TaskError::Store)?;
            rescored += 1;
        }

        let mut activity = DeveloperActivity::new(developer_id, login, now);
        activity.contributions = contributions;
        activity.reviews = self
            .store
            .list_reviews(developer_id)
            .await
            .map_err(TaskError::Store)?;
        activity.repos = repos;

        let evaluation = self.evaluation.evaluate(&self.scoring, &activity).await;
        self.store
            .upsert_domain_scores(&evaluation.domain_scores)
            .await
            .map_err(TaskError::Store)?;
        self.store
            .upsert_portfolios(&evaluation.portfolios)
            .await
            .map_err(TaskError::Store)?;

        // status may have moved since the batch started
        let _guard = self.coordinator.locks().lock(developer_id).await;
        let Some(mut developer) = self
            .store
            .get_developer(developer_id)
            .await
            .map_err(TaskError::Store)?
        else {
            return Ok(TaskOutcome::Skipped("developer vanished".into()));
        };
        evaluation.apply_to(&mut developer, now);
        self.store
            .upsert_developer(&developer)
            .await
            .map_err(TaskError::Store)?;
        info!(
            "scored {}: {} contributions rescored, overall {:.1}",
            developer_id, rescored, evaluation.overall
        );

        // vectors follow every fresh score
        self.queue
            .enqueue(Task::BuildVectors {
                developer_id: developer_id.to_owned(),
            })
            .await
            .map_err(TaskError::Store)?;
        Ok(TaskOutcome::Done)
    }
}
