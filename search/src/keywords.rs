//! Fixed alias tables that turn free query text into canonical language and
//! domain tags.

use std::collections::BTreeSet;

const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("rust", "rust"),
    ("rustlang", "rust"),
    ("go", "go"),
    ("golang", "go"),
    ("python", "python"),
    ("py", "python"),
    ("python3", "python"),
    ("javascript", "javascript"),
    ("js", "javascript"),
    ("node", "javascript"),
    ("nodejs", "javascript"),
    ("node.js", "javascript"),
    ("typescript", "typescript"),
    ("ts", "typescript"),
    ("java", "java"),
    ("kotlin", "kotlin"),
    ("kt", "kotlin"),
    ("swift", "swift"),
    ("ruby", "ruby"),
    ("rb", "ruby"),
    ("rails", "ruby"),
    ("php", "php"),
    ("c", "c"),
    ("c++", "cpp"),
    ("cpp", "cpp"),
    ("cplusplus", "cpp"),
    ("c#", "csharp"),
    ("csharp", "csharp"),
    ("dotnet", "csharp"),
    (".net", "csharp"),
    ("scala", "scala"),
    ("elixir", "elixir"),
    ("haskell", "haskell"),
    ("sql", "sql"),
    ("shell", "shell"),
    ("bash", "shell"),
    ("lua", "lua"),
    ("dart", "dart"),
    ("flutter", "dart"),
    ("julia", "julia"),
    ("vue", "vue"),
    ("svelte", "svelte"),
];

const DOMAIN_KEYWORDS: &[(&str, &[&str])] = &[
    ("frontend", &["frontend", "front end", "front-end", "ui", "react", "css", "web app", "browser"]),
    ("backend", &["backend", "back end", "back-end", "api", "apis", "server", "microservices", "rest", "grpc"]),
    ("infrastructure", &["infrastructure", "infra", "devops", "kubernetes", "k8s", "terraform", "cloud", "sre", "docker"]),
    ("data", &["data engineering", "etl", "pipelines", "analytics", "spark", "warehouse"]),
    ("ml", &["ml", "machine learning", "deep learning", "ai", "llm", "pytorch", "tensorflow", "nlp"]),
    ("mobile", &["mobile", "ios", "android", "react native"]),
    ("security", &["security", "appsec", "crypto", "cryptography", "auth", "oauth"]),
    ("systems", &["systems", "embedded", "kernel", "low level", "low-level", "compiler", "compilers"]),
    ("testing", &["testing", "qa", "test automation"]),
    ("documentation", &["documentation", "docs", "technical writing"]),
    ("databases", &["database", "databases", "postgres", "postgresql", "mysql", "storage engine"]),
    ("devtools", &["devtools", "developer tools", "tooling", "cli", "build systems"]),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySignals {
    pub languages: BTreeSet<String>,
    pub domains: BTreeSet<String>,
}

impl QuerySignals {
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty() && self.domains.is_empty()
    }

    /// Adds explicit filter values, canonicalized through the same tables.
    pub fn extend_explicit(&mut self, languages: &[String], domains: &[String]) {
        for lang in languages {
            let lang = lang.trim().to_lowercase();
            if let Some(canonical) = canonical_language(&lang) {
                self.languages.insert(canonical.to_owned());
            } else if !lang.is_empty() {
                self.languages.insert(lang);
            }
        }
        for domain in domains {
            let domain = domain.trim().to_lowercase();
            if let Some(canonical) = canonical_domain(&domain) {
                self.domains.insert(canonical.to_owned());
            } else if !domain.is_empty() {
                self.domains.insert(domain);
            }
        }
    }
}

pub fn canonical_language(alias: &str) -> Option<&'static str> {
    LANGUAGE_ALIASES
        .iter()
        .find(|(a, _)| *a == alias)
        .map(|(_, canonical)| *canonical)
}

pub fn canonical_domain(keyword: &str) -> Option<&'static str> {
    DOMAIN_KEYWORDS
        .iter()
        .find(|(domain, words)| *domain == keyword || words.contains(&keyword))
        .map(|(domain, _)| *domain)
}

/// Lowercased tokens split on whitespace and punctuation other than the
/// characters that appear inside language names (`+`, `#`, `.`, `-`).
fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.' | '-')))
        .map(|t| t.trim_matches(|c: char| c == '.' || c == '-'))
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn extract_signals(text: &str) -> QuerySignals {
    let tokens = tokens(text);
    let padded = format!(" {} ", tokens.join(" "));
    let mut signals = QuerySignals::default();

    for token in &tokens {
        if let Some(canonical) = canonical_language(token) {
            signals.languages.insert(canonical.to_owned());
        }
    }
    // leading-dot aliases lose the dot in tokenization
    if text.to_lowercase().contains(".net") {
        signals.languages.insert("csharp".to_owned());
    }
    for (domain, words) in DOMAIN_KEYWORDS {
        let hit = std::iter::once(domain)
            .chain(words.iter())
            .any(|w| padded.contains(&format!(" {} ", w)));
        if hit {
            signals.domains.insert((*domain).to_owned());
        }
    }
    signals
}
