//! Unit tests for the subprocess transport
//!
//! Tests command resolution and environment handling
#![cfg(unix)]

use std::path::Path;

use kodegen_automation_client::transport::subprocess::{
    CLIENT_VERSION_ENV, CommandBuilder, DANGEROUS_ENV_VARS, resolve_program,
};
use kodegen_automation_client::{AutomationError, ClientOptions};

#[test]
fn test_resolve_bare_name_through_path() {
    let resolved = resolve_program("sh", None).unwrap();
    assert!(resolved.is_absolute());
}

#[test]
fn test_resolve_missing_program() {
    let result = resolve_program("kodegen-no-such-program", None);
    assert!(matches!(result, Err(AutomationError::Spawn(_))));
}

#[test]
fn test_relative_path_is_anchored_at_cwd() {
    let dir = Path::new("/opt/game");
    assert_eq!(
        resolve_program("./server.sh", Some(dir)).unwrap(),
        dir.join("./server.sh")
    );
    assert_eq!(
        resolve_program("/usr/bin/node", Some(dir)).unwrap(),
        Path::new("/usr/bin/node")
    );
}

#[test]
fn test_missing_working_directory() {
    let options = ClientOptions::builder()
        .command("sh")
        .cwd("/nonexistent/working/dir")
        .build();
    let result = CommandBuilder::new(&options).build();
    assert!(matches!(result, Err(AutomationError::Spawn(_))));
}

#[test]
fn test_dangerous_env_vars_listed() {
    assert!(DANGEROUS_ENV_VARS.contains(&"LD_PRELOAD"));
    assert!(DANGEROUS_ENV_VARS.contains(&"NODE_OPTIONS"));
}

#[tokio::test]
async fn test_environment_is_filtered() {
    let options = ClientOptions::builder()
        .command("sh")
        .arg("-c")
        .arg(format!(
            "printf '%s|%s|%s' \"$NODE_OPTIONS\" \"$GAME_MODE\" \"${CLIENT_VERSION_ENV}\""
        ))
        .env("NODE_OPTIONS", "--require=/tmp/evil.js")
        .env("GAME_MODE", "headless")
        .build();

    let output = CommandBuilder::new(&options)
        .build()
        .unwrap()
        .output()
        .await
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let fields: Vec<&str> = stdout.split('|').collect();

    assert!(!fields[0].contains("evil"));
    assert_eq!(fields[1], "headless");
    assert_eq!(fields[2], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_working_directory_applies() {
    let dir = tempfile::tempdir().unwrap();
    let options = ClientOptions::builder()
        .command("sh")
        .args(["-c", "pwd"])
        .cwd(dir.path())
        .build();

    let output = CommandBuilder::new(&options)
        .build()
        .unwrap()
        .output()
        .await
        .unwrap();
    let printed = String::from_utf8_lossy(&output.stdout);
    let expected = dir.path().canonicalize().unwrap();
    assert_eq!(Path::new(printed.trim()).canonicalize().unwrap(), expected);
}
