//! Path/extension heuristics for domain tags.

use model::{DEFAULT_DOMAIN, MAX_DOMAINS};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::signals::{classify_file, detect_language, FileCategory};

static DOMAIN_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("frontend", r"(?i)((^|/)(components|pages|ui|frontend|web|views|styles)/|\.(tsx|jsx|vue|svelte|css|scss|html)$)"),
        ("backend", r"(?i)(^|/)(api|server|backend|handlers|routes|controllers|services|middleware)/"),
        ("infrastructure", r"(?i)((^|/)(terraform|k8s|kubernetes|helm|ansible|deploy|infra|\.github/workflows)/|(^|/)dockerfile$|\.tf$|docker-compose\.ya?ml$)"),
        ("data", r"(?i)(^|/)(etl|pipelines?|dags|analytics|warehouse)/"),
        ("ml", r"(?i)((^|/)(ml|models?|training|inference)/|\.ipynb$)"),
        ("mobile", r"(?i)((^|/)(ios|android|mobile)/|\.(swift|kt|dart)$)"),
        ("security", r"(?i)(^|/)(auth|crypto|security|oauth|permissions)/"),
        ("systems", r"(?i)((^|/)(kernel|drivers|runtime|allocator)/|\.(c|h|cc|cpp|hpp|rs|zig)$)"),
        ("databases", r"(?i)((^|/)(migrations?|db|schema|database)/|\.sql$)"),
        ("devtools", r"(?i)((^|/)(cli|scripts|tools|bin)/|\.(sh|bash)$|(^|/)makefile$)"),
    ]
    .into_iter()
    .map(|(domain, pattern)| (domain, Regex::new(pattern).expect("valid domain pattern")))
    .collect()
});

/// Domain tags ranked by how many paths point at them, capped at five.
/// Falls back to the default domain when nothing matches.
pub fn domains_for_paths(paths: &[String]) -> Vec<String> {
    let mut hits: HashMap<&'static str, usize> = HashMap::new();
    for path in paths {
        match classify_file(path) {
            FileCategory::Generated => continue,
            FileCategory::Test => *hits.entry("testing").or_insert(0) += 1,
            FileCategory::Documentation => *hits.entry("documentation").or_insert(0) += 1,
            FileCategory::Config | FileCategory::Source => {}
        }
        for (domain, pattern) in DOMAIN_PATTERNS.iter() {
            if pattern.is_match(path) {
                *hits.entry(*domain).or_insert(0) += 1;
            }
        }
        if detect_language(path) == Some("sql") {
            *hits.entry("databases").or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(&'static str, usize)> = hits.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    let domains: Vec<String> = ranked
        .into_iter()
        .take(MAX_DOMAINS)
        .map(|(d, _)| d.to_owned())
        .collect();
    if domains.is_empty() {
        vec![DEFAULT_DOMAIN.to_owned()]
    } else {
        domains
    }
}

/// Merge model-suggested domains ahead of heuristic ones, deduplicated and
/// capped; `general` is dropped once anything specific is present.
pub fn merge_domains(primary: &[String], secondary: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for domain in primary.iter().chain(secondary.iter()) {
        if !merged.contains(domain) {
            merged.push(domain.clone());
        }
    }
    if merged.len() > 1 {
        merged.retain(|d| d != DEFAULT_DOMAIN);
    }
    merged.truncate(MAX_DOMAINS);
    if merged.is_empty() {
        merged.push(DEFAULT_DOMAIN.to_owned());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_domains_from_paths() {
        let domains = domains_for_paths(&paths(&[
            "web/components/Button.tsx",
            "web/components/Card.tsx",
            "api/routes/users.go",
        ]));
        assert_eq!(domains[0], "frontend");
        assert!(domains.contains(&"backend".to_string()));
    }

    #[test]
    fn test_fallback_domain() {
        assert_eq!(domains_for_paths(&paths(&["Cargo.lock"])), vec!["general"]);
        assert_eq!(domains_for_paths(&[]), vec!["general"]);
    }

    #[test]
    fn test_merge_domains() {
        let merged = merge_domains(&paths(&["ml", "general"]), &paths(&["ml", "data"]));
        assert_eq!(merged, paths(&["ml", "data"]));
        let many = merge_domains(
            &paths(&["a", "b", "c", "d"]),
            &paths(&["e", "f", "g"]),
        );
        assert_eq!(many.len(), MAX_DOMAINS);
        assert_eq!(merge_domains(&[], &[]), paths(&["general"]));
    }
}
