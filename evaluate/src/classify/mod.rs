pub mod domains;
pub mod heuristics;
pub mod vocabulary;

pub use heuristics::{default_policies, ClassificationInput, ClassificationPolicy};

use async_trait::async_trait;
use model::{ContributionType, MAX_DOMAINS};
use std::sync::Arc;
use tracing::{debug, warn};

use domains::{domains_for_paths, merge_domains};
use heuristics::guess_from_message;
use vocabulary::{normalize_domain, normalize_type, DOMAINS};

/// Fixed-vocabulary classification model. Returns free text; the classifier
/// does the parsing and normalization.
#[async_trait]
pub trait LabelModel: Send + Sync {
    async fn classify(&self, prompt: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationSource {
    Heuristic,
    Model,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub contribution_type: ContributionType,
    pub domains: Vec<String>,
    pub source: ClassificationSource,
}

pub struct Classifier {
    policies: Vec<Box<dyn ClassificationPolicy>>,
    model: Option<Arc<dyn LabelModel>>,
}

impl Classifier {
    pub fn new(model: Option<Arc<dyn LabelModel>>) -> Self {
        Self {
            policies: default_policies(),
            model,
        }
    }

    /// Heuristics only, never calls out.
    pub fn heuristic() -> Self {
        Self::new(None)
    }

    pub fn with_policies(mut self, policies: Vec<Box<dyn ClassificationPolicy>>) -> Self {
        self.policies = policies;
        self
    }

    pub fn resolve_heuristically(&self, input: &ClassificationInput) -> Option<ContributionType> {
        self.policies.iter().find_map(|policy| {
            let resolved = policy.resolve(input);
            if let Some(t) = resolved {
                debug!("classification policy {} resolved {}", policy.name(), t.as_str());
            }
            resolved
        })
    }

    pub async fn classify(&self, input: &ClassificationInput) -> Classification {
        let path_domains = domains_for_paths(&input.file_paths);

        if let Some(contribution_type) = self.resolve_heuristically(input) {
            return Classification {
                contribution_type,
                domains: path_domains,
                source: ClassificationSource::Heuristic,
            };
        }

        if let Some(model) = &self.model {
            match model.classify(&build_prompt(input)).await {
                Ok(answer) => {
                    let (model_type, model_domains) = parse_answer(&answer);
                    if let Some(contribution_type) = model_type {
                        return Classification {
                            contribution_type,
                            domains: merge_domains(&model_domains, &path_domains),
                            source: ClassificationSource::Model,
                        };
                    }
                    debug!("label model answered outside the vocabulary: {:?}", answer);
                }
                Err(e) => warn!("label model call failed, using fallback: {:#}", e),
            }
        }

        Classification {
            contribution_type: guess_from_message(&input.message).unwrap_or(ContributionType::Other),
            domains: path_domains,
            source: ClassificationSource::Fallback,
        }
    }
}

const PROMPT_PATHS: usize = 20;

pub fn build_prompt(input: &ClassificationInput) -> String {
    let types: Vec<&str> = ContributionType::ALL.iter().map(|t| t.as_str()).collect();
    let paths: Vec<&str> = input
        .file_paths
        .iter()
        .take(PROMPT_PATHS)
        .map(String::as_str)
        .collect();
    format!(
        "Classify this commit.\n\
         Allowed types: {}\n\
         Allowed domains (up to {}): {}\n\
         Answer with exactly two lines:\n\
         type: <one type>\n\
         domains: <comma separated domains>\n\n\
         Message: {}\n\
         Lines: +{} -{}\n\
         Files:\n{}",
        types.join(", "),
        MAX_DOMAINS,
        DOMAINS.join(", "),
        input.message,
        input.additions,
        input.deletions,
        paths.join("\n"),
    )
}

/// Pulls `type:` and `domains:` out of a model answer. Unknown domains are
/// dropped; an unknown type yields `None`.
pub fn parse_answer(answer: &str) -> (Option<ContributionType>, Vec<String>) {
    let mut contribution_type = None;
    let mut domains = Vec::new();
    for line in answer.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "type" => contribution_type = normalize_type(value),
            "domains" | "domain" => {
                for raw in value.split(',') {
                    if let Some(d) = normalize_domain(raw) {
                        if !domains.iter().any(|x: &String| x == d) {
                            domains.push(d.to_owned());
                        }
                    }
                }
            }
            _ => {}
        }
    }
    (contribution_type, domains)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedModel(anyhow::Result<String>);

    #[async_trait]
    impl LabelModel for CannedModel {
        async fn classify(&self, _prompt: &str) -> anyhow::Result<String> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(anyhow::anyhow!("{}", e)),
            }
        }
    }

    fn input(paths: &[&str], message: &str) -> ClassificationInput {
        ClassificationInput {
            message: message.to_owned(),
            file_paths: paths.iter().map(|s| s.to_string()).collect(),
            additions: 40,
            deletions: 5,
            ..Default::default()
        }
    }

    fn with_answer(answer: &str) -> Classifier {
        Classifier::new(Some(Arc::new(CannedModel(Ok(answer.to_owned())))))
    }

    #[tokio::test]
    async fn test_generated_path_wins_over_test_path() {
        let c = with_answer("type: feature\ndomains: backend")
            .classify(&input(&["tests/__generated__/snap.ts"], "regen snapshots"))
            .await;
        assert_eq!(c.contribution_type, ContributionType::Generated);
        assert_eq!(c.source, ClassificationSource::Heuristic);
    }

    #[tokio::test]
    async fn test_model_answer_is_normalized_and_merged() {
        let c = with_answer("Type: Bug-Fix\nDomains: Back End, quantum, databases")
            .classify(&input(&["api/handlers/user.go", "web/pages/user.tsx"], "handle nil user"))
            .await;
        assert_eq!(c.contribution_type, ContributionType::Bugfix);
        assert_eq!(c.source, ClassificationSource::Model);
        assert_eq!(c.domains[0], "backend");
        assert_eq!(c.domains[1], "databases");
        assert!(c.domains.contains(&"frontend".to_string()));
        assert!(c.domains.len() <= MAX_DOMAINS);
    }

    #[tokio::test]
    async fn test_out_of_vocabulary_answer_falls_back() {
        let c = with_answer("type: rewrite\ndomains: everything")
            .classify(&input(&["src/engine.rs"], "wip"))
            .await;
        assert_eq!(c.contribution_type, ContributionType::Other);
        assert_eq!(c.source, ClassificationSource::Fallback);
        assert_eq!(c.domains, vec!["systems".to_string()]);
    }

    #[tokio::test]
    async fn test_model_error_falls_back_to_message_guess() {
        let classifier = Classifier::new(Some(Arc::new(CannedModel(Err(anyhow::anyhow!("timeout"))))));
        let c = classifier
            .classify(&input(&["lib/thing.rb"], "Fix crash when list is empty"))
            .await;
        assert_eq!(c.contribution_type, ContributionType::Bugfix);
        assert_eq!(c.domains, vec!["general".to_string()]);
    }

    #[tokio::test]
    async fn test_heuristic_only_classifier() {
        let c = Classifier::heuristic()
            .classify(&input(&["docs/guide.md", "README.md"], "expand guide"))
            .await;
        assert_eq!(c.contribution_type, ContributionType::Docs);
        assert_eq!(c.domains, vec!["documentation".to_string()]);
    }

    #[test]
    fn test_parse_answer_ignores_noise() {
        let (t, d) = parse_answer("Sure!\ntype: deps\ndomains: infra, infra, ml");
        assert_eq!(t, Some(ContributionType::Dependency));
        assert_eq!(d, vec!["infrastructure".to_string(), "ml".to_string()]);
    }
}
