//! Unified-diff patch parsing and decision-point counting.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static DECISION_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(if|else|elif|for|while|case|catch|switch)\b").expect("valid regex")
});

static LOGICAL_OPERATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"&&|\|\|").expect("valid regex"));

// `cond ? a : b`; whitespace on both sides keeps Rust's `?` operator out.
static TERNARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s\?\s").expect("valid regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchLines {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl PatchLines {
    pub fn extend(&mut self, other: PatchLines) {
        self.added.extend(other.added);
        self.removed.extend(other.removed);
    }
}

/// Split a unified-diff patch into added and removed lines, markers stripped.
/// File headers (`+++`/`---`), hunk headers and context lines are ignored.
pub fn parse_patch(patch: &str) -> PatchLines {
    let mut lines = PatchLines::default();
    for line in patch.lines() {
        if let Some(rest) = line.strip_prefix('+') {
            if !line.starts_with("+++") {
                lines.added.push(rest.to_owned());
            }
        } else if let Some(rest) = line.strip_prefix('-') {
            if !line.starts_with("---") {
                lines.removed.push(rest.to_owned());
            }
        }
    }
    lines
}

pub fn count_decision_points<S: AsRef<str>>(lines: &[S]) -> usize {
    lines
        .iter()
        .map(|line| {
            let line = line.as_ref();
            DECISION_KEYWORDS.find_iter(line).count()
                + LOGICAL_OPERATORS.find_iter(line).count()
                + TERNARY.find_iter(line).count()
        })
        .sum()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplexityDelta {
    pub added: usize,
    pub removed: usize,
}

impl ComplexityDelta {
    /// Negative means the change removed more branching than it introduced.
    pub fn delta(&self) -> i32 {
        self.added as i32 - self.removed as i32
    }
}

pub fn complexity_delta(lines: &PatchLines) -> ComplexityDelta {
    ComplexityDelta {
        added: count_decision_points(&lines.added),
        removed: count_decision_points(&lines.removed),
    }
}

/// Tolerance between additions and deletions for a formatting-only diff.
const FORMATTING_BALANCE: f64 = 0.10;

/// True when the diff only re-flows existing lines: additions and deletions
/// are near-equal and the whitespace-stripped added lines are a permutation of
/// the removed ones.
pub fn is_formatting_only(lines: &PatchLines) -> bool {
    if lines.added.is_empty() || lines.removed.is_empty() {
        return false;
    }
    let (a, d) = (lines.added.len() as f64, lines.removed.len() as f64);
    if (a - d).abs() > FORMATTING_BALANCE * a.max(d) {
        return false;
    }
    squashed_counts(&lines.added) == squashed_counts(&lines.removed)
}

fn squashed_counts(lines: &[String]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for line in lines {
        let squashed: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        if squashed.is_empty() {
            continue;
        }
        *counts.entry(squashed).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATCH: &str = "@@ -1,4 +1,5 @@\n\
--- a/src/lib.rs\n\
+++ b/src/lib.rs\n\
 fn main() {\n\
-    if a && b { run(); }\n\
+    run();\n\
+    let x = y;\n\
 }\n";

    #[test]
    fn test_parse_patch_strips_markers_and_headers() {
        let lines = parse_patch(PATCH);
        assert_eq!(lines.added, vec!["    run();", "    let x = y;"]);
        assert_eq!(lines.removed, vec!["    if a && b { run(); }"]);
    }

    #[test]
    fn test_decision_points_are_word_bounded() {
        assert_eq!(count_decision_points(&["if x { } else { }"]), 2);
        assert_eq!(count_decision_points(&["IF Foo"]), 1);
        assert_eq!(count_decision_points(&["let diff = notify(format);"]), 0);
        assert_eq!(count_decision_points(&["a && b || c"]), 2);
        assert_eq!(count_decision_points(&["x = ok ? 1 : 2", "foo()?;"]), 1);
        assert_eq!(count_decision_points(&["} catch (e) { switch (k) { case 1: } }"]), 3);
    }

    #[test]
    fn test_complexity_delta_sign() {
        let lines = parse_patch(PATCH);
        let delta = complexity_delta(&lines);
        assert_eq!(delta.added, 0);
        assert_eq!(delta.removed, 2);
        assert_eq!(delta.delta(), -2);

        let growing = PatchLines {
            added: vec!["while x { if y { } }".into()],
            removed: vec![],
        };
        assert_eq!(complexity_delta(&growing).delta(), 2);
    }

    #[test]
    fn test_formatting_only() {
        let lines = PatchLines {
            added: vec!["fn a() {".into(), "  call(x,y);".into(), "}".into()],
            removed: vec!["fn a(){".into(), "call(x, y);".into(), "}".into()],
        };
        assert!(is_formatting_only(&lines));

        let changed = PatchLines {
            added: vec!["call(x, z);".into()],
            removed: vec!["call(x, y);".into()],
        };
        assert!(!is_formatting_only(&changed));
        assert!(!is_formatting_only(&PatchLines::default()));
    }
}
