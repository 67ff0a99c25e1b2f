//! Per-commit signal extraction over classified changed files.

use model::github::CommitFile;
use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use std::collections::{BTreeMap, HashMap};

use crate::diff::{self, PatchLines};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileCategory {
    Generated,
    Test,
    Documentation,
    Config,
    Source,
}

static GENERATED: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)(^|/)(cargo\.lock|package-lock\.json|npm-shrinkwrap\.json|yarn\.lock|pnpm-lock\.yaml|poetry\.lock|pipfile\.lock|gemfile\.lock|composer\.lock|go\.sum|flake\.lock|mix\.lock|podfile\.lock)$",
        r"(?i)\.min\.(js|css)$",
        r"(?i)\.(js|css)\.map$",
        r"(?i)(^|/)(dist|vendor|node_modules|__generated__|generated)/",
        r"(?i)(\.pb\.go|_pb2\.py|_pb2_grpc\.py|\.g\.dart|\.freezed\.dart|\.designer\.cs)$",
        r"(?i)[._-]generated\.[a-z0-9]+$",
    ])
    .expect("valid generated patterns")
});

static TEST: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)(^|/)(tests?|__tests__|specs?|testdata|test_data|fixtures)/",
        r"(?i)(_test\.(go|py|rs|exs?|c|cpp)|_spec\.rb|\.(test|spec)\.[jt]sx?)$",
        r"(?i)(^|/)(test_[^/]+\.py|conftest\.py)$",
        r"(^|/)[A-Z][A-Za-z0-9]*Tests?\.(java|kt|cs|swift|scala)$",
    ])
    .expect("valid test patterns")
});

static DOCUMENTATION: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)\.(md|mdx|rst|adoc|asciidoc|txt)$",
        r"(?i)(^|/)(docs?|documentation)/",
        r"(?i)(^|/)(readme|changelog|license|contributing|authors|notice)(\.[a-z]+)?$",
    ])
    .expect("valid documentation patterns")
});

static CONFIG: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)\.(toml|ya?ml|json|ini|cfg|conf|properties|xml|env)$",
        r"(?i)(^|/)(dockerfile|makefile|procfile|\.gitignore|\.gitattributes|\.editorconfig|\.dockerignore|\.npmrc|\.nvmrc)$",
        r"(?i)(^|/)\.(github|circleci|vscode|devcontainer)/",
    ])
    .expect("valid config patterns")
});

/// Priority-ordered: generated > test > documentation > config > source.
pub fn classify_file(path: &str) -> FileCategory {
    if GENERATED.is_match(path) {
        FileCategory::Generated
    } else if TEST.is_match(path) {
        FileCategory::Test
    } else if DOCUMENTATION.is_match(path) {
        FileCategory::Documentation
    } else if CONFIG.is_match(path) {
        FileCategory::Config
    } else {
        FileCategory::Source
    }
}

static EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.([A-Za-z0-9]+)$").expect("valid regex"));

/// Canonical language tag for a path, by extension.
pub fn detect_language(path: &str) -> Option<&'static str> {
    let ext = EXTENSION.captures(path)?.get(1)?.as_str().to_ascii_lowercase();
    let lang = match ext.as_str() {
        "rs" => "rust",
        "py" | "pyi" => "python",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" | "mts" => "typescript",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "swift" => "swift",
        "rb" => "ruby",
        "php" => "php",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" | "hh" => "cpp",
        "cs" => "csharp",
        "scala" => "scala",
        "ex" | "exs" => "elixir",
        "hs" => "haskell",
        "sql" => "sql",
        "sh" | "bash" | "zsh" => "shell",
        "lua" => "lua",
        "dart" => "dart",
        "jl" => "julia",
        "vue" => "vue",
        "svelte" => "svelte",
        "css" | "scss" | "sass" | "less" => "css",
        "html" | "htm" => "html",
        "ipynb" => "jupyter",
        _ => return None,
    };
    Some(lang)
}

/// Normalized Shannon entropy of per-file churn, in [0, 1].
///
/// Zero-churn files are dropped first; fewer than two remaining files (or no
/// churn at all) yields 0.
pub fn normalized_entropy(churns: &[i64]) -> f64 {
    let nonzero: Vec<f64> = churns.iter().filter(|c| **c > 0).map(|c| *c as f64).collect();
    let total: f64 = nonzero.iter().sum();
    if nonzero.len() < 2 || total <= 0.0 {
        return 0.0;
    }
    let entropy: f64 = nonzero
        .iter()
        .map(|c| {
            let p = c / total;
            -p * p.log2()
        })
        .sum();
    (entropy / (nonzero.len() as f64).log2()).clamp(0.0, 1.0)
}

pub const TEST_CORRELATION_MIN: f64 = -0.2;
pub const TEST_CORRELATION_MAX: f64 = 0.3;

/// Share of churn landing in tests, mapped linearly onto [-0.2, 0.3].
pub fn test_correlation(test_churn: i64, total_churn: i64) -> f64 {
    if total_churn <= 0 {
        return TEST_CORRELATION_MIN;
    }
    let ratio = (test_churn.max(0) as f64 / total_churn as f64).clamp(0.0, 1.0);
    TEST_CORRELATION_MIN + ratio * (TEST_CORRELATION_MAX - TEST_CORRELATION_MIN)
}

/// Cap on stored file paths per contribution.
pub const MAX_FILE_PATHS: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct CommitSignals {
    pub additions: i64,
    pub deletions: i64,
    pub churn: i64,
    pub file_count: i32,
    pub entropy: f64,
    pub complexity_added: usize,
    pub complexity_removed: usize,
    pub complexity_delta: i32,
    pub test_churn: i64,
    /// Test correlation signal in [-0.2, 0.3].
    pub test_ratio: f64,
    pub languages: Vec<String>,
    pub file_paths: Vec<String>,
    pub formatting_only: bool,
    pub category_churn: BTreeMap<FileCategory, i64>,
}

impl CommitSignals {
    pub fn abs_complexity_delta(&self) -> i32 {
        self.complexity_delta.abs()
    }
}

pub fn extract_commit_signals(files: &[CommitFile]) -> CommitSignals {
    let mut lines = PatchLines::default();
    let mut category_churn: BTreeMap<FileCategory, i64> = BTreeMap::new();
    let mut language_churn: HashMap<&'static str, i64> = HashMap::new();
    let mut churns = Vec::with_capacity(files.len());
    let (mut additions, mut deletions) = (0i64, 0i64);

    for file in files {
        let churn = file.churn();
        let category = classify_file(&file.filename);
        additions += file.additions;
        deletions += file.deletions;
        churns.push(churn);
        *category_churn.entry(category).or_insert(0) += churn;

        if category != FileCategory::Generated {
            if let Some(lang) = detect_language(&file.filename) {
                *language_churn.entry(lang).or_insert(0) += churn.max(1);
            }
            // generated files would swamp the complexity signal
            if let Some(patch) = &file.patch {
                lines.extend(diff::parse_patch(patch));
            }
        }
    }

    let churn = additions + deletions;
    let complexity = diff::complexity_delta(&lines);
    let test_churn = category_churn.get(&FileCategory::Test).copied().unwrap_or(0);

    let mut languages: Vec<(&'static str, i64)> = language_churn.into_iter().collect();
    languages.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    CommitSignals {
        additions,
        deletions,
        churn,
        file_count: files.len() as i32,
        entropy: normalized_entropy(&churns),
        complexity_added: complexity.added,
        complexity_removed: complexity.removed,
        complexity_delta: complexity.delta(),
        test_churn,
        test_ratio: test_correlation(test_churn, churn),
        languages: languages.into_iter().map(|(l, _)| l.to_owned()).collect(),
        file_paths: files
            .iter()
            .take(MAX_FILE_PATHS)
            .map(|f| f.filename.clone())
            .collect(),
        formatting_only: diff::is_formatting_only(&lines),
        category_churn,
    }
}
