//! Fast classification policies. Each one either resolves a type outright or
//! declines; they rely on filename and message matching, so each is its own
//! replaceable policy rather than a load-bearing rule.

use model::{Contribution, ContributionType};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::signals::{classify_file, FileCategory};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationInput {
    pub message: String,
    pub file_paths: Vec<String>,
    pub languages: Vec<String>,
    pub additions: i64,
    pub deletions: i64,
    pub formatting_only: bool,
}

impl From<&Contribution> for ClassificationInput {
    fn from(c: &Contribution) -> Self {
        Self {
            message: c.message.clone(),
            file_paths: c.file_paths.clone(),
            languages: c.languages.clone(),
            additions: c.additions,
            deletions: c.deletions,
            formatting_only: c.formatting_only,
        }
    }
}

impl ClassificationInput {
    fn all_files(&self, pred: impl Fn(&str) -> bool) -> bool {
        !self.file_paths.is_empty() && self.file_paths.iter().all(|p| pred(p))
    }

    fn all_in(&self, category: FileCategory) -> bool {
        self.all_files(|p| classify_file(p) == category)
    }
}

pub trait ClassificationPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Some` when the change can be typed without asking the model.
    fn resolve(&self, input: &ClassificationInput) -> Option<ContributionType>;
}

static MANIFEST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(^|/)(cargo\.toml|package\.json|go\.mod|requirements[^/]*\.txt|pyproject\.toml|setup\.py|pipfile|gemfile|pom\.xml|build\.gradle(\.kts)?|composer\.json|mix\.exs|podfile|pubspec\.yaml)$",
    )
    .expect("valid manifest pattern")
});

static LOCKFILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(^|/)(cargo\.lock|package-lock\.json|yarn\.lock|pnpm-lock\.yaml|poetry\.lock|pipfile\.lock|gemfile\.lock|composer\.lock|go\.sum|mix\.lock|podfile\.lock|pubspec\.lock)$",
    )
    .expect("valid lockfile pattern")
});

pub struct GeneratedOnly;

impl ClassificationPolicy for GeneratedOnly {
    fn name(&self) -> &'static str {
        "generated_only"
    }

    fn resolve(&self, input: &ClassificationInput) -> Option<ContributionType> {
        // lock/sum-only changes are dependency bumps, not codegen
        if input.all_files(|p| LOCKFILE.is_match(p)) {
            return None;
        }
        input
            .all_in(FileCategory::Generated)
            .then_some(ContributionType::Generated)
    }
}

/// Manifest and lock/sum files only.
pub struct DependencyOnly;

impl ClassificationPolicy for DependencyOnly {
    fn name(&self) -> &'static str {
        "dependency_only"
    }

    fn resolve(&self, input: &ClassificationInput) -> Option<ContributionType> {
        input
            .all_files(|p| MANIFEST.is_match(p) || LOCKFILE.is_match(p))
            .then_some(ContributionType::Dependency)
    }
}

pub struct TestOnly;

impl ClassificationPolicy for TestOnly {
    fn name(&self) -> &'static str {
        "test_only"
    }

    fn resolve(&self, input: &ClassificationInput) -> Option<ContributionType> {
        input.all_in(FileCategory::Test).then_some(ContributionType::Test)
    }
}

pub struct DocOnly;

impl ClassificationPolicy for DocOnly {
    fn name(&self) -> &'static str {
        "doc_only"
    }

    fn resolve(&self, input: &ClassificationInput) -> Option<ContributionType> {
        input
            .all_in(FileCategory::Documentation)
            .then_some(ContributionType::Docs)
    }
}

pub struct FormattingOnly;

impl ClassificationPolicy for FormattingOnly {
    fn name(&self) -> &'static str {
        "formatting_only"
    }

    fn resolve(&self, input: &ClassificationInput) -> Option<ContributionType> {
        input.formatting_only.then_some(ContributionType::Formatting)
    }
}

static CONVENTIONAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(feat|fix|perf|refactor|test|docs|style|build|ci|chore|deps|security)(\([^)]*\))?!?:")
        .expect("valid conventional-commit pattern")
});

/// `feat(scope): ...` style prefixes.
pub struct ConventionalCommit;

impl ClassificationPolicy for ConventionalCommit {
    fn name(&self) -> &'static str {
        "conventional_commit"
    }

    fn resolve(&self, input: &ClassificationInput) -> Option<ContributionType> {
        let caps = CONVENTIONAL.captures(input.message.trim())?;
        let prefix = caps.get(1)?.as_str().to_ascii_lowercase();
        let t = match prefix.as_str() {
            "feat" => ContributionType::Feature,
            "fix" => ContributionType::Bugfix,
            "perf" => ContributionType::Performance,
            "refactor" => ContributionType::Refactor,
            "test" => ContributionType::Test,
            "docs" => ContributionType::Docs,
            "style" => ContributionType::Formatting,
            "build" | "ci" => ContributionType::Config,
            "deps" => ContributionType::Dependency,
            "security" => ContributionType::Security,
            _ => ContributionType::Chore,
        };
        Some(t)
    }
}

pub fn default_policies() -> Vec<Box<dyn ClassificationPolicy>> {
    vec![
        Box::new(GeneratedOnly),
        Box::new(DependencyOnly),
        Box::new(TestOnly),
        Box::new(DocOnly),
        Box::new(FormattingOnly),
        Box::new(ConventionalCommit),
    ]
}

static KEYWORD_GUESSES: Lazy<Vec<(Regex, ContributionType)>> = Lazy::new(|| {
    [
        (r"(?i)\b(fix(es|ed)?|bug|crash|regression|broken)\b", ContributionType::Bugfix),
        (r"(?i)\b(security|vulnerab\w*|cve|xss|csrf)\b", ContributionType::Security),
        (r"(?i)\b(perf|performance|optimi[sz]e\w*|faster|speed up)\b", ContributionType::Performance),
        (r"(?i)\b(refactor\w*|clean ?up|restructure|simplify)\b", ContributionType::Refactor),
        (r"(?i)\b(bump|upgrade|update) .*\b(deps?|dependenc\w*|version)\b", ContributionType::Dependency),
        (r"(?i)\b(add(s|ed)?|implement\w*|introduce\w*|support)\b", ContributionType::Feature),
    ]
    .into_iter()
    .map(|(p, t)| (Regex::new(p).expect("valid keyword pattern"), t))
    .collect()
});

/// Weak message-keyword guess, used only when the model is unavailable or
/// answers outside the vocabulary.
pub fn guess_from_message(message: &str) -> Option<ContributionType> {
    KEYWORD_GUESSES
        .iter()
        .find(|(pattern, _)| pattern.is_match(message))
        .map(|(_, t)| *t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(paths: &[&str], message: &str) -> ClassificationInput {
        ClassificationInput {
            message: message.to_owned(),
            file_paths: paths.iter().map(|s| s.to_string()).collect(),
            additions: 10,
            deletions: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_lock_only_is_dependency_not_generated() {
        let i = input(&["Cargo.lock"], "update lock");
        assert_eq!(GeneratedOnly.resolve(&i), None);
        assert_eq!(DependencyOnly.resolve(&i), Some(ContributionType::Dependency));
        let both = input(&["Cargo.toml", "Cargo.lock"], "bump serde");
        assert_eq!(DependencyOnly.resolve(&both), Some(ContributionType::Dependency));
    }

    #[test]
    fn test_generated_only() {
        let i = input(&["dist/app.min.js", "api/types.pb.go"], "regen");
        assert_eq!(GeneratedOnly.resolve(&i), Some(ContributionType::Generated));
    }

    #[test]
    fn test_mixed_changes_are_unresolved() {
        let i = input(&["src/lib.rs", "tests/it.rs"], "wire the thing");
        for policy in default_policies() {
            assert_eq!(policy.resolve(&i), None, "{} resolved", policy.name());
        }
    }

    #[test]
    fn test_empty_file_list_never_resolves_by_path() {
        let i = input(&[], "something");
        assert_eq!(TestOnly.resolve(&i), None);
        assert_eq!(DocOnly.resolve(&i), None);
    }

    #[test]
    fn test_conventional_commit() {
        let i = input(&["src/lib.rs"], "fix(parser)!: handle empty hunks");
        assert_eq!(ConventionalCommit.resolve(&i), Some(ContributionType::Bugfix));
        let j = input(&["src/lib.rs"], "fixture cleanup");
        assert_eq!(ConventionalCommit.resolve(&j), None);
    }

    #[test]
    fn test_guess_from_message() {
        assert_eq!(guess_from_message("Fixes crash on startup"), Some(ContributionType::Bugfix));
        assert_eq!(guess_from_message("Add retry support"), Some(ContributionType::Feature));
        assert_eq!(guess_from_message("wip"), None);
    }
}
