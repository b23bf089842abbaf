//! End-to-end tests running `scm` against Mercurial repositories.
//!
//! Every test returns early when `hg` is not installed.

#[allow(dead_code)]
mod common;
#[allow(unused_imports)]
use common::prelude::*;

fn one_repository() -> Option<TestFixture> {
    let fixture = TestFixture::with_hg()?.with_config("lib/foo: hg=https://hg.example.com/foo\n");
    fixture.hg_repo("lib/foo");
    Some(fixture)
}

#[test]
fn test_status_relocates_names() {
    let Some(fixture) = one_repository() else {
        return;
    };
    fixture.write("lib/foo/README.txt", "edited\n");
    fixture.write("lib/foo/new.txt", "new\n");
    fixture.write("lib/foo/.new.txt.swp", "swap");

    fixture
        .scm()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("lib/foo: Status"))
        .stdout(predicate::str::contains("M lib/foo/README.txt"))
        .stdout(predicate::str::contains("? lib/foo/new.txt"))
        .stdout(predicate::str::contains(".swp").not());
}

#[test]
fn test_files_lists_tracked_files() {
    let Some(fixture) = one_repository() else {
        return;
    };
    fixture.write("lib/foo/untracked.txt", "not tracked\n");

    fixture
        .scm()
        .arg("files")
        .assert()
        .success()
        .stdout(predicate::str::contains("lib/foo/README.txt"))
        .stdout(predicate::str::contains("untracked.txt").not());
}

#[test]
fn test_branch_prints_default_branch() {
    let Some(fixture) = TestFixture::with_hg() else {
        return;
    };
    fixture.hg_repo("repo");

    fixture
        .scm_in("repo")
        .arg("branch")
        .assert()
        .success()
        .stdout(predicate::str::contains("repo: default"));
}

#[test]
fn test_tag_contains_lists_nearest_descendant_first() {
    let Some(fixture) = TestFixture::with_hg() else {
        return;
    };
    let root = fixture.hg_repo("repo");
    fixture.write("repo/README.txt", "second\n");
    common::hg(&root, &["commit", "-m", "second"]);
    fixture.write("repo/README.txt", "third\n");
    common::hg(&root, &["commit", "-m", "third"]);
    // tagging commits .hgtags, so revisions are tagged out of order
    common::hg(&root, &["tag", "-r", "2", "far"]);
    common::hg(&root, &["tag", "-r", "1", "near"]);
    common::hg(&root, &["tag", "-r", "0", "old"]);

    fixture
        .scm_in("repo")
        .args(["tag_contains", "1"])
        .assert()
        .success()
        .stdout("near\nfar\n");
}

#[test]
fn test_stash_and_unstash_round_trip() {
    if !common::program_available("patch") {
        return;
    }
    let Some(fixture) = TestFixture::with_hg() else {
        return;
    };
    fixture.hg_repo("repo");
    fixture.write("repo/README.txt", "first line\nsecond line\n");

    fixture.scm_in("repo").arg("stash").assert().success();

    assert_eq!(fixture.read("repo/README.txt"), "first line\n");
    assert!(fixture.join("repo/.hg/stash").exists());

    fixture.scm_in("repo").arg("unstash").assert().success();

    assert_eq!(fixture.read("repo/README.txt"), "first line\nsecond line\n");
    assert!(!fixture.join("repo/.hg/stash").exists());
}

#[test]
fn test_revert_discards_confirmed_changes() {
    let Some(fixture) = TestFixture::with_hg() else {
        return;
    };
    fixture.hg_repo("repo");
    fixture.write("repo/README.txt", "changed\n");

    fixture
        .scm_in("repo")
        .arg("revert")
        .write_stdin("y\n")
        .assert()
        .success();

    assert_eq!(fixture.read("repo/README.txt"), "first line\n");
}
