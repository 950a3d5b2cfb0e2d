use crate::common::command::{
    get_head_commit_sha, get_parent_commit_id, minivc_commit, repository_dir,
    repository_with_multiple_commits, run_minivc_command,
};
use crate::common::file::{FileSpec, delete_path, touch_file, write_file};
use crate::common::{read_to_string, stdout_of};
use assert_fs::TempDir;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::Path;

mod common;

/// (first, second, third) commit IDs of `repository_with_multiple_commits`
fn commit_ids(dir: &Path) -> (String, String, String) {
    let third = get_head_commit_sha(dir).unwrap();
    let second = get_parent_commit_id(dir, &third).unwrap().unwrap();
    let first = get_parent_commit_id(dir, &second).unwrap().unwrap();

    (first, second, third)
}

fn set_checkout_mode(dir: &Path, mode: &str) {
    std::fs::write(
        dir.join(".minivc/config.toml"),
        format!("[checkout]\nmode = \"{mode}\"\n"),
    )
    .unwrap();
}

#[rstest]
fn checkout_restores_an_older_commit_without_moving_head(
    repository_with_multiple_commits: TempDir,
) {
    let dir = repository_with_multiple_commits.path();
    let (first, _, third) = commit_ids(dir);

    run_minivc_command(dir, &["checkout", &first[..7]])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!(
            "Working tree is now at {} First commit",
            &first[..7]
        )))
        .stderr(predicate::str::contains("Note: checking out"));

    assert_eq!(read_to_string(&dir.join("file1.txt")), "content 1");
    assert!(!dir.join("file2.txt").exists());
    assert!(!dir.join("file3.txt").exists());
    assert_eq!(get_head_commit_sha(dir).unwrap(), third);
    assert_eq!(read_to_string(&dir.join(".minivc/CHECKOUT")).trim(), first);

    run_minivc_command(dir, &["status", "--porcelain"])
        .assert()
        .success()
        .stdout("");
}

#[rstest]
fn checkout_head_returns_to_the_tip(repository_with_multiple_commits: TempDir) {
    let dir = repository_with_multiple_commits.path();
    let (first, _, _) = commit_ids(dir);

    run_minivc_command(dir, &["checkout", &first])
        .assert()
        .success();
    run_minivc_command(dir, &["checkout", "head"])
        .assert()
        .success();

    assert_eq!(read_to_string(&dir.join("file2.txt")), "content 2");
    assert_eq!(read_to_string(&dir.join("file3.txt")), "content 3");
    assert!(!dir.join(".minivc/CHECKOUT").exists());
}

#[rstest]
fn history_cannot_change_while_an_older_commit_is_checked_out(
    repository_with_multiple_commits: TempDir,
) {
    let dir = repository_with_multiple_commits.path();
    let (first, _, _) = commit_ids(dir);
    run_minivc_command(dir, &["checkout", &first])
        .assert()
        .success();
    write_file(FileSpec::new(dir.join("new.txt"), "new".to_string()));

    run_minivc_command(dir, &["add", "new.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HEAD is not checked out"));
    minivc_commit(dir, "Detached work")
        .assert()
        .failure()
        .stderr(predicate::str::contains("HEAD is not checked out"));
}

#[rstest]
fn checkout_leaves_untracked_files_alone(repository_with_multiple_commits: TempDir) {
    let dir = repository_with_multiple_commits.path();
    let (first, _, _) = commit_ids(dir);
    write_file(FileSpec::new(dir.join("notes/todo.txt"), "keep me".to_string()));

    run_minivc_command(dir, &["checkout", &first])
        .assert()
        .success();

    assert_eq!(read_to_string(&dir.join("notes/todo.txt")), "keep me");
}

#[rstest]
fn force_checkout_overwrites_local_changes(repository_with_multiple_commits: TempDir) {
    let dir = repository_with_multiple_commits.path();
    let (first, _, _) = commit_ids(dir);
    write_file(FileSpec::new(dir.join("file1.txt"), "local edit".to_string()));

    run_minivc_command(dir, &["checkout", &first])
        .assert()
        .success();

    assert_eq!(read_to_string(&dir.join("file1.txt")), "content 1");
}

#[rstest]
fn safe_checkout_refuses_to_discard_local_changes(repository_with_multiple_commits: TempDir) {
    let dir = repository_with_multiple_commits.path();
    let (first, _, third) = commit_ids(dir);
    set_checkout_mode(dir, "safe");
    write_file(FileSpec::new(dir.join("file3.txt"), "unsaved work".to_string()));
    touch_file(&dir.join("file3.txt"));

    run_minivc_command(dir, &["checkout", &first])
        .assert()
        .failure()
        .stderr(predicate::str::contains("checkout would discard local changes"))
        .stderr(predicate::str::contains(
            "local changes would be overwritten: file3.txt",
        ));

    assert_eq!(read_to_string(&dir.join("file3.txt")), "unsaved work");
    assert!(dir.join("file2.txt").exists());
    assert_eq!(get_head_commit_sha(dir).unwrap(), third);
    assert!(!dir.join(".minivc/CHECKOUT").exists());
}

#[rstest]
fn safe_checkout_refuses_to_overwrite_untracked_files(repository_with_multiple_commits: TempDir) {
    let dir = repository_with_multiple_commits.path();
    let (first, second, _) = commit_ids(dir);
    set_checkout_mode(dir, "safe");
    run_minivc_command(dir, &["checkout", &first])
        .assert()
        .success();
    write_file(FileSpec::new(dir.join("file2.txt"), "my own file2".to_string()));

    run_minivc_command(dir, &["checkout", &second])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "untracked file would be overwritten: file2.txt",
        ));
}

#[rstest]
fn safe_checkout_proceeds_on_a_clean_tree(repository_with_multiple_commits: TempDir) {
    let dir = repository_with_multiple_commits.path();
    let (first, _, _) = commit_ids(dir);
    set_checkout_mode(dir, "safe");

    run_minivc_command(dir, &["checkout", &first])
        .assert()
        .success();

    assert!(!dir.join("file3.txt").exists());
}

#[rstest]
fn checkout_swaps_files_and_directories(repository_dir: TempDir) {
    let dir = repository_dir.path();
    run_minivc_command(dir, &["init"]).assert().success();
    write_file(FileSpec::new(dir.join("a/x.txt"), "inside".to_string()));
    run_minivc_command(dir, &["add", "."]).assert().success();
    minivc_commit(dir, "Directory a").assert().success();
    let first = get_head_commit_sha(dir).unwrap();

    delete_path(&dir.join("a"));
    write_file(FileSpec::new(dir.join("a"), "a file now".to_string()));
    run_minivc_command(dir, &["add", "."]).assert().success();
    minivc_commit(dir, "File a").assert().success();

    run_minivc_command(dir, &["checkout", &first]).assert().success();
    assert_eq!(read_to_string(&dir.join("a/x.txt")), "inside");

    run_minivc_command(dir, &["checkout", "HEAD"]).assert().success();
    assert_eq!(read_to_string(&dir.join("a")), "a file now");
}

#[cfg(unix)]
#[rstest]
fn checkout_restores_the_executable_bit(repository_dir: TempDir) {
    use crate::common::file::{is_executable, make_executable};

    let dir = repository_dir.path();
    run_minivc_command(dir, &["init"]).assert().success();
    write_file(FileSpec::new(dir.join("run.sh"), "#!/bin/sh\n".to_string()));
    make_executable(&dir.join("run.sh"));
    run_minivc_command(dir, &["add", "."]).assert().success();
    minivc_commit(dir, "Script").assert().success();

    delete_path(&dir.join("run.sh"));
    run_minivc_command(dir, &["checkout", "HEAD"]).assert().success();

    assert!(is_executable(&dir.join("run.sh")));
}

#[rstest]
fn reset_moves_head_and_drops_later_commits_from_history(
    repository_with_multiple_commits: TempDir,
) {
    let dir = repository_with_multiple_commits.path();
    let (first, _, third) = commit_ids(dir);

    run_minivc_command(dir, &["reset", &first[..8]])
        .assert()
        .success()
        .stdout(format!("HEAD is now at {} First commit\n", &first[..7]));

    assert_eq!(get_head_commit_sha(dir).unwrap(), first);
    assert!(!dir.join("file2.txt").exists());
    assert!(!dir.join("file3.txt").exists());

    let log = stdout_of(&run_minivc_command(dir, &["log", "--oneline"]).assert().success());
    assert_eq!(log.lines().count(), 2);
    assert!(log.starts_with("1 commit\n"));

    // later commits stay in the object database
    run_minivc_command(dir, &["cat-file", "-p", &third])
        .assert()
        .success()
        .stdout(predicate::str::contains("Third commit"));
}

#[rstest]
fn reset_clears_a_detached_checkout(repository_with_multiple_commits: TempDir) {
    let dir = repository_with_multiple_commits.path();
    let (first, second, _) = commit_ids(dir);
    run_minivc_command(dir, &["checkout", &first])
        .assert()
        .success();

    run_minivc_command(dir, &["reset", &second])
        .assert()
        .success();

    assert!(!dir.join(".minivc/CHECKOUT").exists());
    assert_eq!(get_head_commit_sha(dir).unwrap(), second);
    assert_eq!(read_to_string(&dir.join("file2.txt")), "content 2");
    assert!(!dir.join("file3.txt").exists());
}

#[rstest]
#[case("deadbeef", "unknown revision 'deadbeef'")]
#[case("not-a-commit", "unknown revision 'not-a-commit'")]
fn reset_to_an_unknown_revision_fails(
    repository_with_multiple_commits: TempDir,
    #[case] revision: &str,
    #[case] message: &str,
) {
    run_minivc_command(repository_with_multiple_commits.path(), &["reset", revision])
        .assert()
        .failure()
        .stderr(predicate::str::contains(message));
}

#[rstest]
fn checkout_of_a_tree_is_rejected(repository_with_multiple_commits: TempDir) {
    let dir = repository_with_multiple_commits.path();
    let head = get_head_commit_sha(dir).unwrap();
    let commit = stdout_of(
        &run_minivc_command(dir, &["cat-file", "-p", &head])
            .assert()
            .success(),
    );
    let tree = commit
        .lines()
        .find_map(|line| line.strip_prefix("tree "))
        .unwrap()
        .to_string();

    run_minivc_command(dir, &["checkout", &tree])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a commit"));
}
