// Exercises GitCli against throwaway local repositories, so no network is needed.

use flate2::read::GzDecoder;
use module_publisher_core::checkout::{checkout_path, GitCli};
use module_publisher_core::contract::SourceControl;
use module_publisher_core::error::PublishError;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git should run");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Creates a repository with a root README and a `lib/` subdirectory and
/// returns the commit id.
fn init_repo(dir: &Path) -> String {
    git(dir, &["init", "--quiet"]);
    fs::write(dir.join("README.md"), "# root\n").unwrap();
    fs::create_dir_all(dir.join("lib")).unwrap();
    fs::write(dir.join("lib/README.org"), "* lib\n").unwrap();
    fs::write(dir.join("lib/main.cf"), "bundle agent main {}\n").unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "--quiet", "-m", "initial"]);
    git(dir, &["rev-parse", "HEAD"])
}

fn archive_entries(archive: &Path) -> Vec<String> {
    let file = fs::File::open(archive).unwrap();
    let mut tarball = tar::Archive::new(GzDecoder::new(file));
    tarball
        .entries()
        .unwrap()
        .map(|entry| entry.unwrap())
        // git stores the commit id in a pax global header when archiving a commit
        .filter(|entry| !entry.header().entry_type().is_pax_global_extensions())
        .map(|entry| entry.path().unwrap().to_string_lossy().into_owned())
        .collect()
}

struct TestCase {
    name: &'static str,
    subdirectory: Option<&'static str>,
    expected_entries: Vec<&'static str>,
    unexpected_entries: Vec<&'static str>,
}

#[test]
fn test_checkout_and_archive_table_driven() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    let test_cases = vec![
        TestCase {
            name: "whole tree",
            subdirectory: None,
            expected_entries: vec!["README.md", "lib/main.cf"],
            unexpected_entries: vec![],
        },
        TestCase {
            name: "lib subdirectory",
            subdirectory: Some("lib"),
            expected_entries: vec!["lib/README.org", "lib/main.cf"],
            unexpected_entries: vec!["README.md"],
        },
    ];

    for tc in test_cases {
        let origin = tempdir().unwrap();
        let commit = init_repo(origin.path());
        let scratch = tempdir().unwrap();
        let dest = checkout_path(scratch.path(), "demo");
        let repo = origin.path().to_string_lossy().into_owned();

        let scm = GitCli::new();
        scm.checkout(&repo, &commit, &dest)
            .unwrap_or_else(|e| panic!("{}: checkout should succeed: {e}", tc.name));
        assert!(dest.join("README.md").is_file(), "{}: tree checked out", tc.name);

        let output = dest.join(format!("{commit}.tar.gz"));
        let subdirectory = tc.subdirectory.map(str::to_string);
        scm.archive("demo", &dest, &commit, subdirectory, &output)
            .unwrap_or_else(|e| panic!("{}: archive should succeed: {e}", tc.name));

        let entries = archive_entries(&output);
        for expected in &tc.expected_entries {
            assert!(
                entries.iter().any(|e| e == expected),
                "{}: archive should contain {expected}, got {entries:?}",
                tc.name
            );
        }
        for unexpected in &tc.unexpected_entries {
            assert!(
                !entries.iter().any(|e| e == unexpected),
                "{}: archive should not contain {unexpected}",
                tc.name
            );
        }
        if let Some(sub) = tc.subdirectory {
            let prefix = format!("{sub}/");
            assert!(
                entries.iter().all(|e| e.starts_with(&prefix)),
                "{}: every entry should be prefixed with {prefix}: {entries:?}",
                tc.name
            );
        }
    }
}

#[test]
fn test_checkout_unknown_commit_is_reported() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let origin = tempdir().unwrap();
    init_repo(origin.path());
    let scratch = tempdir().unwrap();
    let dest = checkout_path(scratch.path(), "demo");
    let repo = origin.path().to_string_lossy().into_owned();

    let err = GitCli::new()
        .checkout(&repo, "0000000000000000000000000000000000000000", &dest)
        .expect_err("checkout of a missing commit must fail");
    match err {
        PublishError::Git {
            operation, commit, ..
        } => {
            assert_eq!(operation, "checkout");
            assert_eq!(commit, "0000000000000000000000000000000000000000");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_clone_of_missing_repository_fails_without_prompting() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let scratch = tempdir().unwrap();
    let missing = scratch.path().join("does-not-exist");
    let dest = checkout_path(scratch.path(), "ghost");

    let err = GitCli::new()
        .checkout(&missing.to_string_lossy(), "abc123", &dest)
        .unwrap_err();
    assert!(matches!(err, PublishError::Git { operation: "clone", .. }));
}

#[test]
fn test_commit_naming_a_file_is_not_treated_as_a_path() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let origin = tempdir().unwrap();
    init_repo(origin.path());
    let scratch = tempdir().unwrap();
    let dest = checkout_path(scratch.path(), "demo");
    let repo = origin.path().to_string_lossy().into_owned();

    let err = GitCli::new()
        .checkout(&repo, "README.md", &dest)
        .expect_err("a file name is not a commit");
    assert!(matches!(err, PublishError::Git { operation: "checkout", .. }));
}

#[test]
fn test_option_like_commit_is_rejected_before_running_git() {
    let scratch = tempdir().unwrap();
    let dest = checkout_path(scratch.path(), "demo");

    let err = GitCli::new()
        .checkout("https://github.com/example/demo", "--orphan", &dest)
        .unwrap_err();
    assert!(matches!(err, PublishError::Git { operation: "checkout", .. }));
    assert!(!dest.exists(), "nothing should be cloned");
}

#[test]
fn test_archive_failure_names_the_module() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let origin = tempdir().unwrap();
    let commit = init_repo(origin.path());
    let output = origin.path().join("out.tar.gz");

    let err = GitCli::new()
        .archive("demo", origin.path(), &commit, Some("missing".to_string()), &output)
        .unwrap_err();
    match err {
        PublishError::Git {
            operation, target, ..
        } => {
            assert_eq!(operation, "archive");
            assert_eq!(target, "demo");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_checkout_path_is_hashed_per_module() {
    let scratch = Path::new("/scratch");
    let a = checkout_path(scratch, "masterfiles");
    let b = checkout_path(scratch, "masterfiles-gitlab");
    assert_ne!(a, b);
    assert_eq!(a, checkout_path(scratch, "masterfiles"));
    assert_eq!(a.parent(), Some(scratch));
    let dir_name = a.file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(dir_name.len(), 64);
    assert!(dir_name.chars().all(|c| c.is_ascii_hexdigit()));
}
