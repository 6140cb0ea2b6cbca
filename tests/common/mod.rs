//! Common test utilities

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Create a temporary directory with a devops-definition.yaml file
pub fn create_test_definition(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("devops-definition.yaml");
    fs::write(&path, content).unwrap();
    (temp_dir, path)
}

/// Wait until a file exists and holds a pid
pub async fn wait_for_pid(path: &Path) -> i32 {
    for _ in 0..200 {
        if let Ok(contents) = fs::read_to_string(path) {
            if let Ok(pid) = contents.trim().parse::<i32>() {
                return pid;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("pid file {} was never written", path.display());
}

/// Whether a process is still running (zombies count as gone)
#[cfg(unix)]
pub fn process_alive(pid: i32) -> bool {
    let exists = unsafe { libc::kill(pid as libc::pid_t, 0) == 0 };
    if !exists {
        return false;
    }
    match fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => !stat
            .rsplit(')')
            .next()
            .map(|rest| rest.trim_start().starts_with('Z'))
            .unwrap_or(false),
        Err(_) => true,
    }
}

/// Poll until the process is gone or the timeout passes
#[cfg(unix)]
pub async fn wait_until_gone(pid: i32, timeout: Duration) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if !process_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    !process_alive(pid)
}
