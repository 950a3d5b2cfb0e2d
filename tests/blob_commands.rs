use crate::common::command::{repository_dir, run_minivc_command};
use crate::common::file::{FileSpec, write_file};
use assert_fs::TempDir;
use fake::Fake;
use fake::faker::lorem::en::Words;
use predicates::prelude::*;
use rstest::rstest;

mod common;

// blob framing matches git, so well known IDs apply
const HELLO_WORLD_BLOB: &str = "3b18e512dba79e4c8300dd08aeb37f8e728b8dad";

#[rstest]
fn hash_object_prints_the_blob_id(repository_dir: TempDir) {
    run_minivc_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    write_file(FileSpec::new(
        repository_dir.path().join("hello.txt"),
        "hello world\n".to_string(),
    ));

    run_minivc_command(repository_dir.path(), &["hash-object", "hello.txt"])
        .assert()
        .success()
        .stdout(format!("{HELLO_WORLD_BLOB}\n"));

    assert!(
        !repository_dir
            .path()
            .join(".minivc/objects/3b/18e512dba79e4c8300dd08aeb37f8e728b8dad")
            .exists()
    );
}

#[rstest]
fn hash_object_works_outside_a_repository(repository_dir: TempDir) {
    write_file(FileSpec::new(
        repository_dir.path().join("hello.txt"),
        "hello world\n".to_string(),
    ));

    run_minivc_command(repository_dir.path(), &["hash-object", "hello.txt"])
        .assert()
        .success()
        .stdout(format!("{HELLO_WORLD_BLOB}\n"));
}

#[rstest]
fn hash_object_reports_a_broken_repository(repository_dir: TempDir) {
    run_minivc_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    write_file(FileSpec::new(
        repository_dir.path().join(".minivc/config.toml"),
        "[checkout]\nmode = \"sideways\"\n".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("hello.txt"),
        "hello world\n".to_string(),
    ));

    run_minivc_command(repository_dir.path(), &["hash-object", "hello.txt"])
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("invalid configuration"));
}

#[rstest]
fn write_and_read_blob_object_successfully(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_minivc_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    let content = Words(5..10).fake::<Vec<String>>().join(" ");
    write_file(FileSpec::new(repository_dir.path().join("words.txt"), content.clone()));

    let output = run_minivc_command(repository_dir.path(), &["hash-object", "-w", "words.txt"])
        .assert()
        .success();
    let blob_id = String::from_utf8(output.get_output().stdout.clone())?
        .trim()
        .to_string();

    assert!(
        repository_dir
            .path()
            .join(".minivc/objects")
            .join(&blob_id[..2])
            .join(&blob_id[2..])
            .is_file()
    );

    run_minivc_command(repository_dir.path(), &["cat-file", "-p", &blob_id[..6]])
        .assert()
        .success()
        .stdout(format!("{content}\n"));

    Ok(())
}

#[rstest]
fn cat_file_of_an_unknown_object_fails(repository_dir: TempDir) {
    run_minivc_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    run_minivc_command(repository_dir.path(), &["cat-file", "-p", "abcdef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown revision 'abcdef'"));
}

#[rstest]
fn cat_file_of_head_without_commits_fails(repository_dir: TempDir) {
    run_minivc_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    run_minivc_command(repository_dir.path(), &["cat-file", "-p", "HEAD"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no commits yet"));
}

#[rstest]
fn corrupt_objects_are_reported(repository_dir: TempDir) {
    run_minivc_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    write_file(FileSpec::new(
        repository_dir.path().join("hello.txt"),
        "hello world\n".to_string(),
    ));
    run_minivc_command(repository_dir.path(), &["hash-object", "-w", "hello.txt"])
        .assert()
        .success();

    let object_path = repository_dir
        .path()
        .join(".minivc/objects/3b/18e512dba79e4c8300dd08aeb37f8e728b8dad");
    std::fs::write(&object_path, b"definitely not zlib").unwrap();

    run_minivc_command(repository_dir.path(), &["cat-file", "-p", HELLO_WORLD_BLOB])
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt object"));
}
