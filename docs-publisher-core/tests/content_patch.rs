use docs_publisher_core::error::PatchError;
use docs_publisher_core::patch::{apply, PatchOutcome, PatchRule};
use std::fs;
use tempfile::tempdir;

#[test]
fn placeholder_is_replaced_and_reapplying_is_a_no_op() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("README.md");
    fs::write(&path, "version: <version>\ndepend on <version>\n").unwrap();
    let rule = PatchRule::placeholder("<version>", "0.10.4");

    let first = apply(&path, &rule).unwrap();
    assert_eq!(first, PatchOutcome::Changed { matches: 2 });
    let after_one = fs::read_to_string(&path).unwrap();
    assert_eq!(after_one, "version: 0.10.4\ndepend on 0.10.4\n");

    let second = apply(&path, &rule).unwrap();
    assert!(!second.changed());
    assert_eq!(fs::read_to_string(&path).unwrap(), after_one);
}

#[test]
fn placeholder_without_match_is_tolerated_by_default() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plain.txt");
    fs::write(&path, "nothing to see\n").unwrap();

    let outcome = apply(&path, &PatchRule::placeholder("<version>", "1.0")).unwrap();
    assert_eq!(outcome, PatchOutcome::Unchanged { matches: 0 });
}

#[test]
fn required_rules_are_satisfied_once_applied() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("build.gradle");
    fs::write(&path, "version '<version>'\nrepositories { mavenCentral() }\n").unwrap();
    let placeholder = PatchRule::placeholder("<version>", "0.10.4").required(true);
    let replace = PatchRule::replace("mavenCentral()", "maven { url 'https://repo.example' }")
        .required(true);

    assert!(apply(&path, &placeholder).unwrap().changed());
    assert!(apply(&path, &replace).unwrap().changed());
    let after_one = fs::read_to_string(&path).unwrap();

    assert_eq!(
        apply(&path, &placeholder).unwrap(),
        PatchOutcome::Unchanged { matches: 0 }
    );
    assert_eq!(
        apply(&path, &replace).unwrap(),
        PatchOutcome::Unchanged { matches: 0 }
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), after_one);
    assert_eq!(
        after_one,
        "version '0.10.4'\nrepositories { maven { url 'https://repo.example' } }\n"
    );
}

#[test]
fn placeholder_marked_required_fails_without_match() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plain.txt");
    fs::write(&path, "nothing to see\n").unwrap();

    let rule = PatchRule::placeholder("<version>", "1.0").required(true);
    assert!(matches!(apply(&path, &rule), Err(PatchError::NoMatch { .. })));
}

#[test]
fn key_value_rewrites_matching_lines_only() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gradle.properties");
    fs::write(
        &path,
        "GROUP=io.arrow-kt\nCOMMON_SETUP=local.gradle\n# COMMON_SETUP comment\n",
    )
    .unwrap();
    let rule = PatchRule::key_value("COMMON_SETUP", "../gradle/global.gradle");

    apply(&path, &rule).unwrap();
    let patched = fs::read_to_string(&path).unwrap();
    assert_eq!(
        patched,
        "GROUP=io.arrow-kt\nCOMMON_SETUP=../gradle/global.gradle\n# COMMON_SETUP comment\n"
    );

    let again = apply(&path, &rule).unwrap();
    assert_eq!(again, PatchOutcome::Unchanged { matches: 1 });
}

#[test]
fn key_value_without_matching_line_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gradle.properties");
    fs::write(&path, "GROUP=io.arrow-kt\n").unwrap();

    let err = apply(&path, &PatchRule::key_value("COMMON_SETUP", "x")).unwrap_err();
    assert!(matches!(err, PatchError::NoMatch { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), "GROUP=io.arrow-kt\n");
}

#[test]
fn key_value_can_be_made_optional() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gradle.properties");
    fs::write(&path, "GROUP=io.arrow-kt\n").unwrap();

    let rule = PatchRule::key_value("COMMON_SETUP", "x").required(false);
    assert_eq!(apply(&path, &rule).unwrap(), PatchOutcome::Unchanged { matches: 0 });
}

#[test]
fn append_line_injects_exactly_once() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.gradle");
    fs::write(&path, "include ':core'").unwrap();
    let rule = PatchRule::append_line("include ':arrow-docs'");

    apply(&path, &rule).unwrap();
    apply(&path, &rule).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "include ':core'\ninclude ':arrow-docs'\n");
    assert_eq!(content.matches("include ':arrow-docs'").count(), 1);
}

#[test]
fn replace_swaps_repository_coordinate() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("build.gradle");
    fs::write(&path, "repositories { mavenCentral() }\n").unwrap();
    let rule = PatchRule::replace("mavenCentral()", "maven { url 'https://repo.example/' }");

    apply(&path, &rule).unwrap();
    apply(&path, &rule).unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "repositories { maven { url 'https://repo.example/' } }\n"
    );
}

#[test]
fn replace_that_would_not_be_idempotent_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("build.gradle");
    fs::write(&path, "jcenter()\n").unwrap();

    let rule = PatchRule::replace("jcenter()", "jcenter()\nmavenLocal()");
    assert!(matches!(apply(&path, &rule), Err(PatchError::InvalidRule { .. })));
}

#[test]
fn missing_file_is_fatal_even_for_optional_rules() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.txt");
    let err = apply(&path, &PatchRule::placeholder("<v>", "1")).unwrap_err();
    assert!(matches!(err, PatchError::FileMissing { .. }));
}

#[test]
fn binary_files_are_refused() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logo.png");
    fs::write(&path, [0x89, 0x50, 0x4e, 0x47, 0xff, 0xfe]).unwrap();
    let err = apply(&path, &PatchRule::placeholder("<v>", "1")).unwrap_err();
    assert!(matches!(err, PatchError::NotText { .. }));
}
