//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles
//! on the `presence-core` library:
//! - No `unwrap()`/`expect()` in library code (errors are propagated)
//! - No blocking sleeps (the library runs on tokio)
//! - No `println!` (the library reports through `tracing`)
//!
//! These tests are designed to catch violations early in the development cycle.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Files compiled only for tests; every line in them is test code
const TEST_ONLY_FILES: [&str; 1] = ["testing.rs"];

/// A forbidden pattern found in production code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File containing the match
    pub file: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The offending line, trimmed
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.file.display(), self.line, self.text)
    }
}

/// Source directory of the `presence-core` crate
pub fn core_source_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../presence/core/src")
}

/// Every non-test Rust source file under `root`
pub fn library_sources(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "rs"))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map_or(true, |name| !TEST_ONLY_FILES.contains(&name))
        })
        .collect()
}

/// Lines of `source` that belong to production code, with their line numbers
///
/// Stops at the first `#[cfg(test)]` item and skips comment lines.
pub fn production_lines(source: &str) -> Vec<(usize, &str)> {
    source
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(all(test"))
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !line.trim_start().starts_with("//"))
        .collect()
}

/// Find every production line under `root` containing one of `patterns`
pub fn find_violations(root: &Path, patterns: &[&str]) -> Vec<Violation> {
    let mut violations = Vec::new();

    for file in library_sources(root) {
        let Ok(source) = fs::read_to_string(&file) else {
            continue;
        };

        for (line, text) in production_lines(&source) {
            if patterns.iter().any(|pattern| text.contains(pattern)) {
                violations.push(Violation {
                    file: file.clone(),
                    line,
                    text: text.trim().to_string(),
                });
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let source = "fn a() {}\n// x.unwrap()\nfn b() {}\n#[cfg(test)]\nmod tests { fn c() { x.unwrap(); } }\n";
        let lines = production_lines(source);
        assert_eq!(lines, vec![(1, "fn a() {}"), (3, "fn b() {}")]);
    }

    #[test]
    fn test_production_lines_stop_at_platform_test_module() {
        let source = "fn a() {}\n#[cfg(all(test, unix))]\nmod tests {}\n";
        assert_eq!(production_lines(source), vec![(1, "fn a() {}")]);
    }
}
