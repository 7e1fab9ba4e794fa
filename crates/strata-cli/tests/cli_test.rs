//! E2E tests for the strata binary.
//!
//! Each test runs inside its own `TestEnvironment`: the working directory is
//! the project root and `HOME` points at an isolated home directory.

use std::process::{Command, Output};

use strata_config::testing::TestEnvironment;
use strata_config::Config;
use strata_path::ErrorPolicy;

fn strata(env: &TestEnvironment, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(args)
        .current_dir(&env.project_root)
        .envs(env.cli_env())
        .env_remove("STRATA_ERROR_POLICY")
        .env_remove("STRATA_CHUNK_SIZE")
        .env_remove("STRATA_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute strata")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ========== canon ==========

#[test]
fn e2e_canon_follows_links() {
    let env = TestEnvironment::new().unwrap();
    env.create_dir("store/v2/bin").unwrap();
    env.symlink("v2", "store/current").unwrap();

    let output = strata(&env, &["canon", &env.path("store/current/bin/./tool")]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), env.path("store/v2/bin/tool"));
}

#[test]
fn e2e_canon_relative_input_uses_working_directory() {
    let env = TestEnvironment::new().unwrap();
    env.create_dir("real").unwrap();
    env.symlink("real", "alias").unwrap();

    let output = strata(&env, &["canon", "alias/file", "real/../real"]);
    assert!(output.status.success());
    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines, vec![env.path("real/file"), env.path("real")]);
}

#[test]
fn e2e_canon_cycle_fails_but_prints_other_paths() {
    let env = TestEnvironment::new().unwrap();
    env.symlink(env.path("b"), "a").unwrap();
    env.symlink(env.path("a"), "b").unwrap();
    env.create_dir("ok").unwrap();

    let output = strata(&env, &["canon", &env.path("a"), &env.path("ok")]);
    assert!(!output.status.success());
    assert_eq!(stdout(&output).trim(), env.path("ok"));
    assert!(String::from_utf8_lossy(&output.stderr).contains(&env.path("a")));
}

// ========== resolve ==========

#[test]
fn e2e_resolve_alias_from_project_config() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("vendor/lib/data.bin", b"12345").unwrap();

    let mut config = Config::default();
    config
        .search_paths
        .insert("lib".to_string(), vec![env.path("missing"), env.path("vendor/lib")]);
    env.write_project_config(&config).unwrap();

    let output = strata(&env, &["resolve", "lib:data.bin"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let out = stdout(&output);
    assert!(out.contains(&format!("canonical: {}", env.path("vendor/lib/data.bin"))));
    assert!(out.contains("type:      file"));
    assert!(out.contains("size:      5"));
}

#[test]
fn e2e_resolve_unknown_alias_fails() {
    let env = TestEnvironment::new().unwrap();
    let output = strata(&env, &["resolve", "nope:thing"]);
    assert!(!output.status.success());
}

#[test]
fn e2e_resolve_plain_missing_path_reports_missing() {
    let env = TestEnvironment::new().unwrap();
    let output = strata(&env, &["resolve", &env.path("ghost")]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("type:      missing"));
}

#[test]
fn e2e_resolve_reports_symlink() {
    let env = TestEnvironment::new().unwrap();
    env.create_dir("target").unwrap();
    env.symlink("target", "pointer").unwrap();

    let output = strata(&env, &["resolve", &env.path("pointer")]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("symlink:   yes"));
    assert!(out.contains("type:      directory"));
    assert!(out.contains(&format!("canonical: {}", env.path("target"))));
}

// ========== lines ==========

#[test]
fn e2e_lines_survive_tiny_chunks() {
    let env = TestEnvironment::new().unwrap();
    let file = env
        .create_file("input.txt", b"first line\nsecond\r\nthird without newline")
        .unwrap();

    let output = strata(
        &env,
        &["lines", "--chunk-size", "3", file.to_str().unwrap()],
    );
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "first line\nsecond\r\nthird without newline\n"
    );
}

#[test]
fn e2e_lines_uses_configured_chunk_size() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("input.txt", b"a\nbb\nccc\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(["lines", "input.txt"])
        .current_dir(&env.project_root)
        .envs(env.cli_env())
        .env("STRATA_CHUNK_SIZE", "1")
        .output()
        .expect("Failed to execute strata");
    assert!(output.status.success());
    assert_eq!(stdout(&output), "a\nbb\nccc\n");
}

#[test]
fn e2e_lines_missing_file_fails() {
    let env = TestEnvironment::new().unwrap();
    let output = strata(&env, &["lines", "nowhere.txt"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nowhere.txt"));
}

// ========== config ==========

#[test]
fn e2e_config_show_returns_valid_toml() {
    let env = TestEnvironment::new().unwrap();
    let output = strata(&env, &["config", "show"]);
    assert!(output.status.success());

    let parsed: Config = toml::from_str(&stdout(&output)).expect("config show should be TOML");
    assert_eq!(parsed, Config::default());
}

#[test]
fn e2e_config_show_merges_layers_and_flags() {
    let env = TestEnvironment::new().unwrap();
    let mut global = Config::default();
    global.buffer.read_chunk_size = 99;
    env.write_global_config(&global).unwrap();

    let output = strata(&env, &["--policy", "strict", "config", "show"]);
    assert!(output.status.success());
    let parsed: Config = toml::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed.buffer.read_chunk_size, 99);
    assert_eq!(parsed.resolver.error_policy, ErrorPolicy::Strict);
}

#[test]
fn e2e_config_path_shows_locations() {
    let env = TestEnvironment::new().unwrap();
    let output = strata(&env, &["config", "path"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Global:"));
    assert!(out.contains("Project:"));
    assert!(out.contains(".strata/config.toml"));
}

#[test]
fn e2e_malformed_config_is_reported() {
    let env = TestEnvironment::new().unwrap();
    env.create_file(".strata/config.toml", b"not = [valid").unwrap();
    let output = strata(&env, &["config", "show"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("configuration"));
}
