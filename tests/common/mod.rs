#![allow(dead_code)]

pub mod command;
pub mod file;

/// Read a repository file into a string, panicking with the path on failure
pub fn read_to_string(path: &std::path::Path) -> String {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {:?}: {}", path, e))
}

/// Stdout of a finished command as a string
pub fn stdout_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).expect("stdout is not UTF-8")
}
