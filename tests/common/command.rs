use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

pub const AUTHOR_NAME: &str = "fake_user";
pub const AUTHOR_EMAIL: &str = "fake_email@email.com";
pub const AUTHOR_DATE: &str = "2023-01-01 12:00:00 +0000";

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Repository with one commit holding `1.txt`, `a/2.txt` and `a/b/3.txt`
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_minivc_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    write_file(FileSpec::new(repository_dir.path().join("1.txt"), "one".to_string()));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("2.txt"),
        "two".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("b").join("3.txt"),
        "three".to_string(),
    ));

    run_minivc_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();

    minivc_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    repository_dir
}

/// Repository with three commits, each adding `fileN.txt`
#[fixture]
pub fn repository_with_multiple_commits(repository_dir: TempDir) -> TempDir {
    run_minivc_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    for (i, message) in ["First commit", "Second commit", "Third commit"]
        .iter()
        .enumerate()
    {
        let n = i + 1;
        write_file(FileSpec::new(
            repository_dir.path().join(format!("file{n}.txt")),
            format!("content {n}"),
        ));
        run_minivc_command(repository_dir.path(), &["add", "."])
            .assert()
            .success();
        minivc_commit(repository_dir.path(), message)
            .assert()
            .success();
    }

    repository_dir
}

pub fn run_minivc_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("minivc").expect("Failed to find minivc binary");
    cmd.envs(vec![("NO_PAGER", "1")]);
    cmd.env_remove("MINIVC_LOG");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn minivc_commit(dir: &Path, message: &str) -> Command {
    let mut cmd = run_minivc_command(dir, &["commit", "-m", message]);
    cmd.envs(vec![
        ("MINIVC_AUTHOR_NAME", AUTHOR_NAME),
        ("MINIVC_AUTHOR_EMAIL", AUTHOR_EMAIL),
        ("MINIVC_AUTHOR_DATE", AUTHOR_DATE), // %Y-%m-%d %H:%M:%S %z
    ]);
    cmd
}

/// Commit as a random author, as the fake crate makes one up
pub fn minivc_commit_as_random_author(dir: &Path, message: &str) -> Command {
    use fake::Fake;
    use fake::faker::internet::en::FreeEmail;
    use fake::faker::name::en::Name;

    let mut cmd = run_minivc_command(dir, &["commit", "-m", message]);
    cmd.envs(vec![
        ("MINIVC_AUTHOR_NAME", Name().fake::<String>().replace(' ', "_")),
        ("MINIVC_AUTHOR_EMAIL", FreeEmail().fake::<String>()),
    ]);
    cmd.env_remove("MINIVC_AUTHOR_DATE");
    cmd
}

/// The commit ID stored in `.minivc/HEAD`
pub fn get_head_commit_sha(dir: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let head = std::fs::read_to_string(dir.join(".minivc").join("HEAD"))?;
    Ok(head.trim().to_string())
}

/// Parent of a commit, read back through `cat-file -p`
pub fn get_parent_commit_id(
    dir: &Path,
    commit_id: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let output = run_minivc_command(dir, &["cat-file", "-p", commit_id]).output()?;
    let stdout = String::from_utf8(output.stdout)?;

    Ok(stdout
        .lines()
        .find_map(|line| line.strip_prefix("parent "))
        .map(str::to_string))
}
