mod support;

use docs_publisher_core::contract::{ToolCall, ToolOutput};
use docs_publisher_core::error::ResolveError;
use docs_publisher_core::version::{resolve, resolve_in, short_version, version_cmp};
use docs_publisher_core::workspace::LibraryWorkspace;
use std::cmp::Ordering;
use std::path::Path;
use support::{new_log, recording_tool};

#[test]
fn short_version_keeps_first_two_components() {
    let cases = [
        ("0.10.4", "0.10"),
        ("1.2", "1.2"),
        ("1", "1"),
        ("0.10.4-RC1", "0.10"),
        ("2.0.0.1", "2.0"),
    ];
    for (spec, expected) in cases {
        assert_eq!(short_version(spec).unwrap(), expected, "spec {spec}");
    }
}

#[test]
fn short_version_rejects_empty_components() {
    for spec in ["", ".1", "1."] {
        assert!(
            matches!(short_version(spec), Err(ResolveError::InvalidVersion { .. })),
            "spec {spec:?} should be invalid"
        );
    }
}

#[test]
fn version_cmp_orders_numeric_runs_numerically() {
    assert_eq!(version_cmp("0.9.0", "0.10.0"), Ordering::Less);
    assert_eq!(version_cmp("0.10.10", "0.10.2"), Ordering::Greater);
    assert_eq!(version_cmp("1.0.0", "1.0.0"), Ordering::Equal);
    // A longer string with the same prefix sorts after it, as `sort -V` does.
    assert_eq!(version_cmp("0.10.4", "0.10.4-RC1"), Ordering::Less);
    assert_eq!(version_cmp("0.10.04", "0.10.4"), Ordering::Less);
}

#[test]
fn resolve_picks_highest_matching_tag() {
    let tags = ["0.9.9", "0.10.0", "0.10.2", "0.10.10", "0.11.0", "v0.10.99"];
    let resolved = resolve("0.10", &tags).unwrap();
    assert_eq!(resolved.tag, "0.10.10");
    assert_eq!(resolved.short_version, "0.10");
    assert_eq!(resolved.spec, "0.10");
}

#[test]
fn resolve_is_independent_of_tag_order() {
    let mut tags = vec!["0.10.4", "0.10.4-RC1", "0.10.3", "0.10.40", "0.1.0"];
    let first = resolve("0.10.4", &tags).unwrap();
    tags.reverse();
    let second = resolve("0.10.4", &tags).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.tag, "0.10.40");
}

#[test]
fn resolve_without_match_is_an_error() {
    let tags = ["0.9.0", "0.11.0"];
    match resolve("0.10", &tags) {
        Err(ResolveError::NoMatchingTag { spec }) => assert_eq!(spec, "0.10"),
        other => panic!("expected NoMatchingTag, got {other:?}"),
    }
}

#[tokio::test]
async fn resolve_in_lists_tags_in_the_workspace() {
    let log = new_log();
    let git = recording_tool("git", &log, |_| {
        Ok(ToolOutput::with_stdout("0.10.0\n0.10.3\n0.9.1\n"))
    });
    let workspace = LibraryWorkspace::new(Path::new("/work"), "arrow-core");

    let resolved = resolve_in(&workspace, &git, "0.10").await.unwrap();
    assert_eq!(resolved.tag, "0.10.3");

    let calls = log.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].1,
        ToolCall::new(["tag", "--list"]).in_dir("/work/arrow-core")
    );
}

#[tokio::test]
async fn resolve_in_fails_on_empty_tag_list() {
    let log = new_log();
    let git = recording_tool("git", &log, |_| Ok(ToolOutput::default()));
    let workspace = LibraryWorkspace::new(Path::new("/work"), "arrow-core");

    let err = resolve_in(&workspace, &git, "0.10.4").await.unwrap_err();
    assert!(matches!(err, ResolveError::NoMatchingTag { .. }));
}
