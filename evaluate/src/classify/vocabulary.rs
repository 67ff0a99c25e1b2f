//! Fixed label vocabulary and synonym normalization for model answers.

use model::ContributionType;

pub const DOMAINS: [&str; 13] = [
    "frontend",
    "backend",
    "infrastructure",
    "data",
    "ml",
    "mobile",
    "security",
    "systems",
    "testing",
    "documentation",
    "databases",
    "devtools",
    "general",
];

const TYPE_SYNONYMS: &[(&str, ContributionType)] = &[
    ("feat", ContributionType::Feature),
    ("enhancement", ContributionType::Feature),
    ("new feature", ContributionType::Feature),
    ("fix", ContributionType::Bugfix),
    ("bug", ContributionType::Bugfix),
    ("bug fix", ContributionType::Bugfix),
    ("hotfix", ContributionType::Bugfix),
    ("perf", ContributionType::Performance),
    ("optimization", ContributionType::Performance),
    ("refactoring", ContributionType::Refactor),
    ("cleanup", ContributionType::Refactor),
    ("tests", ContributionType::Test),
    ("testing", ContributionType::Test),
    ("doc", ContributionType::Docs),
    ("documentation", ContributionType::Docs),
    ("configuration", ContributionType::Config),
    ("ci", ContributionType::Config),
    ("build", ContributionType::Config),
    ("deps", ContributionType::Dependency),
    ("dependencies", ContributionType::Dependency),
    ("dependency update", ContributionType::Dependency),
    ("style", ContributionType::Formatting),
    ("format", ContributionType::Formatting),
    ("lint", ContributionType::Formatting),
    ("codegen", ContributionType::Generated),
    ("maintenance", ContributionType::Chore),
    ("sec", ContributionType::Security),
    ("vulnerability", ContributionType::Security),
];

const DOMAIN_SYNONYMS: &[(&str, &str)] = &[
    ("front end", "frontend"),
    ("ui", "frontend"),
    ("web", "frontend"),
    ("back end", "backend"),
    ("server", "backend"),
    ("api", "backend"),
    ("devops", "infrastructure"),
    ("infra", "infrastructure"),
    ("ci cd", "infrastructure"),
    ("cloud", "infrastructure"),
    ("machine learning", "ml"),
    ("ai", "ml"),
    ("database", "databases"),
    ("db", "databases"),
    ("sql", "databases"),
    ("docs", "documentation"),
    ("tests", "testing"),
    ("qa", "testing"),
    ("tooling", "devtools"),
    ("cli", "devtools"),
    ("developer tools", "devtools"),
    ("embedded", "systems"),
    ("low level", "systems"),
    ("analytics", "data"),
    ("data engineering", "data"),
    ("ios", "mobile"),
    ("android", "mobile"),
];

/// Lowercase, strip quotes/punctuation, fold `-`, `_` and `/` to spaces.
pub fn normalize_label(raw: &str) -> String {
    let folded: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '-' | '_' | '/' => ' ',
            c => c,
        })
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn normalize_type(raw: &str) -> Option<ContributionType> {
    let label = normalize_label(raw);
    ContributionType::parse(&label).or_else(|| {
        TYPE_SYNONYMS
            .iter()
            .find(|(synonym, _)| *synonym == label)
            .map(|(_, t)| *t)
    })
}

pub fn normalize_domain(raw: &str) -> Option<&'static str> {
    let label = normalize_label(raw);
    DOMAINS
        .iter()
        .copied()
        .find(|d| *d == label)
        .or_else(|| {
            DOMAIN_SYNONYMS
                .iter()
                .find(|(synonym, _)| *synonym == label)
                .map(|(_, d)| *d)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_type() {
        assert_eq!(normalize_type("Bug-Fix"), Some(ContributionType::Bugfix));
        assert_eq!(normalize_type("\"feature\"."), Some(ContributionType::Feature));
        assert_eq!(normalize_type(" deps "), Some(ContributionType::Dependency));
        assert_eq!(normalize_type("rewrite everything"), None);
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("Front-End"), Some("frontend"));
        assert_eq!(normalize_domain("CI/CD"), Some("infrastructure"));
        assert_eq!(normalize_domain("ml"), Some("ml"));
        assert_eq!(normalize_domain("quantum"), None);
    }
}
