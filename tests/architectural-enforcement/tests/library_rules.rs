//! Source-tree rules for the presence-core library

use architectural_enforcement::{core_source_dir, find_violations, library_sources, Violation};

fn assert_clean(violations: &[Violation], rule: &str) {
    assert!(
        violations.is_empty(),
        "{rule}:\n{}",
        violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    );
}

#[test]
fn test_sources_are_found() {
    let sources = library_sources(&core_source_dir());
    assert!(
        sources.iter().any(|p| p.ends_with("session.rs")),
        "expected to scan presence-core sources, found: {sources:?}"
    );
    assert!(!sources.iter().any(|p| p.ends_with("testing.rs")));
}

#[test]
fn test_no_unwrap_in_library_code() {
    let violations = find_violations(&core_source_dir(), &[".unwrap()", ".expect("]);
    assert_clean(&violations, "library code must propagate errors");
}

#[test]
fn test_no_blocking_sleep() {
    let violations = find_violations(&core_source_dir(), &["thread::sleep"]);
    assert_clean(&violations, "library code must not block the runtime");
}

#[test]
fn test_no_println_in_library_code() {
    let violations = find_violations(&core_source_dir(), &["println!", "eprintln!", "dbg!("]);
    assert_clean(&violations, "library code must log through tracing");
}
