mod support;

use docs_publisher_core::config::PublishSettings;
use docs_publisher_core::error::PublishError;
use docs_publisher_core::publish::{join_key, plan, PublishMode, Publisher, TransferKind};
use std::path::Path;
use support::{failed, new_log, ok, recording_tool, unused_tool, write};
use tempfile::tempdir;

fn site_output(root: &Path) {
    write(&root.join("index.html"), "landing");
    write(&root.join("css/site.css"), "body {}");
    write(&root.join("docs/0.10/index.html"), "docs");
}

fn settings(mode: PublishMode) -> PublishSettings {
    PublishSettings {
        bucket: "arrow-site".to_owned(),
        distribution_id: "E123ABC".to_owned(),
        s3_prefix: None,
        mode,
        main_content: vec!["index.html".to_owned(), "css".to_owned()],
    }
}

#[test]
fn join_key_drops_empty_segments_and_slashes() {
    assert_eq!(join_key(["", "docs/", "/0.10"]), "docs/0.10");
    assert_eq!(join_key(["preview", "docs", "0.10", "css"]), "preview/docs/0.10/css");
}

#[test]
fn plan_routes_allow_listed_entries_to_bucket_root() {
    let dir = tempdir().unwrap();
    site_output(dir.path());
    let allow = vec!["index.html".to_owned(), "css".to_owned()];

    let actions = plan(dir.path(), &allow, "docs/0.10").unwrap();
    let routes: Vec<(&str, TransferKind, &str, bool)> = actions
        .iter()
        .map(|a| (a.entry.as_str(), a.kind, a.key.as_str(), a.main_content))
        .collect();
    assert_eq!(
        routes,
        vec![
            ("css", TransferKind::Sync, "css", true),
            ("docs", TransferKind::Sync, "docs/0.10/docs", false),
            ("index.html", TransferKind::Copy, "index.html", true),
        ]
    );
}

#[test]
fn plan_partition_depends_only_on_names() {
    let dir = tempdir().unwrap();
    // A directory and a file whose names are allow-listed, and two that are not.
    write(&dir.path().join("img/logo.svg"), "<svg/>");
    write(&dir.path().join("robots.txt"), "User-agent: *");
    write(&dir.path().join("learn/index.html"), "learn");
    write(&dir.path().join("search.json"), "[]");
    let allow = vec!["img".to_owned(), "robots.txt".to_owned()];

    for action in plan(dir.path(), &allow, "docs/1.0").unwrap() {
        let expected_root = allow.contains(&action.entry);
        assert_eq!(action.main_content, expected_root, "{}", action.entry);
        if expected_root {
            assert_eq!(action.key, action.entry);
        } else {
            assert_eq!(action.key, format!("docs/1.0/{}", action.entry));
        }
    }
}

#[test]
fn plan_rejects_missing_output() {
    let dir = tempdir().unwrap();
    let err = plan(&dir.path().join("nope"), &[], "docs/0.10").unwrap_err();
    assert!(matches!(err, PublishError::NotADirectory { .. }));
}

#[tokio::test]
async fn live_publish_copies_syncs_then_invalidates() {
    let dir = tempdir().unwrap();
    site_output(dir.path());
    let settings = settings(PublishMode::Live);
    let log = new_log();
    let remote = recording_tool("aws", &log, |_| ok());

    let report = Publisher::new(&remote, &settings)
        .publish(dir.path(), "docs/0.10")
        .await
        .unwrap();
    assert!(report.invalidated);
    assert_eq!(report.actions.len(), 3);

    let root = dir.path().display().to_string();
    let commands: Vec<String> = log
        .lock()
        .unwrap()
        .iter()
        .map(|(_, call)| call.display_args())
        .collect();
    assert_eq!(
        commands,
        vec![
            format!("s3 sync --delete {root}/css s3://arrow-site/css"),
            format!("s3 sync --delete {root}/docs s3://arrow-site/docs/0.10/docs"),
            format!("s3 cp {root}/index.html s3://arrow-site/index.html"),
            "cloudfront create-invalidation --distribution-id E123ABC --paths /*".to_owned(),
        ]
    );
}

#[tokio::test]
async fn dry_run_never_touches_the_remote() {
    let dir = tempdir().unwrap();
    site_output(dir.path());
    let settings = settings(PublishMode::DryRun);
    let remote = unused_tool();

    let report = Publisher::new(&remote, &settings)
        .publish(dir.path(), "docs/0.10")
        .await
        .unwrap();
    assert_eq!(report.mode, PublishMode::DryRun);
    assert_eq!(report.actions.len(), 3);
    assert!(!report.invalidated);
}

#[tokio::test]
async fn failed_transfer_aborts_before_invalidation() {
    let dir = tempdir().unwrap();
    site_output(dir.path());
    let settings = settings(PublishMode::Live);
    let log = new_log();
    let remote = recording_tool("aws", &log, |call| {
        if call.args.iter().any(|a| a.ends_with("/docs")) {
            failed("aws")
        } else {
            ok()
        }
    });

    let err = Publisher::new(&remote, &settings)
        .publish(dir.path(), "docs/0.10")
        .await
        .unwrap_err();
    assert!(matches!(err, PublishError::Tool(_)));

    let calls = log.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(_, call)| call.args[0] == "s3"));
}

#[test]
fn publish_mode_parses_from_env_style_strings() {
    assert_eq!("live".parse::<PublishMode>().unwrap(), PublishMode::Live);
    assert_eq!("DRY-RUN".parse::<PublishMode>().unwrap(), PublishMode::DryRun);
    assert!("maybe".parse::<PublishMode>().is_err());
}
