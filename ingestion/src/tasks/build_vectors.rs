use search::document::index_developer;
use tracing::info;

use super::Pipeline;
use crate::error::{TaskError, TaskOutcome};

impl Pipeline {
    pub(crate) async fn build_vectors(&self, developer_id: &str) -> Result<TaskOutcome, TaskError> {
        let Some(developer) = self
            .store
            .get_developer(developer_id)
            .await
            .map_err(TaskError::Store)?
        else {
            return Ok(TaskOutcome::Skipped("developer vanished".into()));
        };
        if developer.opted_out {
            let removed = self
                .index
                .remove_developer(developer_id)
                .await
                .map_err(TaskError::Service)?;
            return Ok(TaskOutcome::Skipped(format!(
                "developer opted out, removed {} vectors",
                removed
            )));
        }

        // scores must postdate the run watermark, or they belong to an older run
        let fresh = developer
            .scored_at
            .is_some_and(|s| developer.last_ingested_at.map_or(true, |w| s >= w));
        if !fresh {
            return Ok(TaskOutcome::Deferred(self.config.vector_defer()));
        }

        let portfolios = self
            .store
            .list_portfolios(developer_id)
            .await
            .map_err(TaskError::Store)?;
        self.index
            .remove_developer(developer_id)
            .await
            .map_err(TaskError::Service)?;
        let written = index_developer(
            self.embedder.as_ref(),
            self.index.as_ref(),
            &developer,
            &portfolios,
        )
        .await
        .map_err(TaskError::Service)?;
        info!("{}: {} vectors built", developer_id, written);
        Ok(TaskOutcome::Done)
    }
}
