//! End-to-end tests for the commands that modify working trees: `revert`,
//! `add`, `commit`, `clean` and `distclean`.

#[allow(dead_code)]
mod common;
#[allow(unused_imports)]
use common::prelude::*;

#[test]
fn test_revert_after_confirmation() {
    let Some(fixture) = TestFixture::with_git() else {
        return;
    };
    fixture.git_repo("repo");
    fixture.write("repo/README.txt", "changed\n");

    fixture
        .scm_in("repo")
        .arg("revert")
        .write_stdin("y\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("README.txt"));

    assert_eq!(fixture.read("repo/README.txt"), "first line\n");
}

#[test]
fn test_revert_shows_diff_on_request() {
    let Some(fixture) = TestFixture::with_git() else {
        return;
    };
    fixture.git_repo("repo");
    fixture.write("repo/README.txt", "changed\n");

    fixture
        .scm_in("repo")
        .arg("revert")
        .write_stdin("d\nn\n")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("+changed"));

    assert_eq!(fixture.read("repo/README.txt"), "changed\n");
}

#[test]
fn test_revert_clean_repositories() {
    let Some(fixture) = TestFixture::with_git() else {
        return;
    };
    fixture.git_repo("repo");

    fixture
        .scm_in("repo")
        .arg("revert")
        .assert()
        .success()
        .stdout(predicate::str::contains("All repositories are clean."));
}

#[test]
fn test_add_and_commit_pass_arguments_through() {
    let Some(fixture) = TestFixture::with_git() else {
        return;
    };
    let root = fixture.git_repo("repo");
    fixture.write("repo/new.txt", "new\n");

    fixture.scm_in("repo").args(["add", "new.txt"]).assert().success();
    fixture
        .scm_in("repo")
        .args(["commit", "-q", "-m", "add new file"])
        .env("GIT_AUTHOR_NAME", "scm tests")
        .env("GIT_AUTHOR_EMAIL", "scm@example.com")
        .env("GIT_COMMITTER_NAME", "scm tests")
        .env("GIT_COMMITTER_EMAIL", "scm@example.com")
        .assert()
        .success();

    let log = common::git(&root, &["log", "--format=%s"]);
    assert!(log.starts_with("add new file"));
}

#[test]
fn test_clean_removes_backup_files() {
    let Some(fixture) = TestFixture::with_git() else {
        return;
    };
    fixture.git_repo("repo");
    fixture.write("repo/file.txt.orig", "backup");
    fixture.write("repo/pkg/__pycache__/mod.cpython.pyc", "bytecode");
    fixture.write("repo/keep.txt", "keep");

    fixture
        .scm_in("repo")
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing repo (git)"))
        .stdout(predicate::str::contains("Remove file: file.txt.orig"))
        .stdout(predicate::str::contains("Remove directory: pkg/__pycache__"));

    assert!(!fixture.join("repo/file.txt.orig").exists());
    assert!(!fixture.join("repo/pkg/__pycache__").exists());
    assert!(fixture.join("repo/keep.txt").exists());
}

#[test]
fn test_distclean_lists_then_removes() {
    let Some(fixture) = TestFixture::with_git() else {
        return;
    };
    fixture.git_repo("repo");
    fixture.write("repo/build/output.bin", "artifact");

    fixture
        .scm_in("repo")
        .arg("distclean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Remove directory"))
        .stdout(predicate::str::contains("--remove option"));
    assert!(fixture.join("repo/build/output.bin").exists());

    fixture
        .scm_in("repo")
        .args(["distclean", "--remove"])
        .assert()
        .success();
    assert!(!fixture.join("repo/build").exists());
    assert!(fixture.join("repo/README.txt").exists());
}
