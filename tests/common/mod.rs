/// Common test utilities and helpers for gitsync integration tests
use assert_fs::fixture::{FileWriteStr, PathChild, PathCreateDir};
use assert_fs::TempDir;
use std::process::{Command, Output};

/// Path of the compiled gitsync binary under test
pub const BIN: &str = env!("CARGO_BIN_EXE_gitsync");

/// A scratch workspace directory the binary runs inside.
///
/// The binary is started with the workspace as its working directory, so the
/// run log (`gitsync.log`) lands here as well.
pub struct TestWorkspace {
    pub dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn write_config(&self, json: &str) {
        self.dir
            .child("config.json")
            .write_str(json)
            .expect("Failed to write test config");
    }

    pub fn create_working_copy(&self, name: &str) {
        let child = self.dir.child(name);
        child.create_dir_all().expect("Failed to create working copy");
        child
            .child("marker.txt")
            .write_str("local state")
            .expect("Failed to write marker file");
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(BIN)
            .args(args)
            .current_dir(self.dir.path())
            .output()
            .expect("Failed to execute gitsync")
    }

    pub fn run_log(&self) -> String {
        std::fs::read_to_string(self.dir.child("gitsync.log").path())
            .expect("Failed to read gitsync.log")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Minimal valid configuration with `count` unauthenticated repositories
pub fn config_with_repos(count: usize) -> String {
    let repos: Vec<String> = (1..=count)
        .map(|i| {
            format!(
                r#"{{
                    "name": "repo{i}",
                    "source": {{ "url": "https://src.example/repo{i}.git", "branch": "main", "authentication": "" }},
                    "target": {{ "url": "https://dst.example/repo{i}.git", "branch": "main", "authentication": "" }}
                }}"#
            )
        })
        .collect();

    format!(
        r#"{{ "authentication": {{}}, "repository": [{}] }}"#,
        repos.join(",")
    )
}
