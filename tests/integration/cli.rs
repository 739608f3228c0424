//! Binary-level tests for the `launcher` command

use assert_cmd::Command;
use predicates::prelude::*;

use super::common::project_fixtures::{TestProject, FILLED_ENV};

fn launcher_cmd(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("launcher").unwrap();
    cmd.arg("--root")
        .arg(&project.root)
        .arg("--no-color")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_example_config_prints_defaults() {
    Command::cargo_bin("launcher")
        .unwrap()
        .arg("example-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[runtime]"))
        .stdout(predicate::str::contains("on_missing = \"halt\""));
}

#[test]
fn test_example_config_ignores_project_config() {
    let project = TestProject::bare();
    project.write("launcher.toml", "[worker]\ncommand = \"python main.py\"\n");

    launcher_cmd(&project)
        .arg("example-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[runtime]"));
    assert!(!project.path("logs").exists());
}

#[test]
fn test_missing_runtime_exits_1_without_side_effects() {
    let project = TestProject::bare();
    project.write(
        "launcher.toml",
        "[runtime]\ncandidates = [\"valhalla-no-such-python-xyz\"]\n",
    );
    project.write("requirements.txt", "");
    project.write(".env.example", "BOT_TOKEN=\n");

    launcher_cmd(&project)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("FATAL: missing runtime"));

    assert!(!project.path("venv").exists());
    assert!(!project.path("logs").exists());
    assert!(!project.path(".env").exists());
    assert!(!project.path("game.db").exists());
}

#[test]
fn test_invalid_launcher_toml_exits_1() {
    let project = TestProject::bare();
    project.write("launcher.toml", "[worker]\ncommand = \"python main.py\"\n");

    launcher_cmd(&project)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("launcher.toml"));
    assert!(!project.path("venv").exists());
}

#[test]
fn test_status_lists_gates() {
    let project = TestProject::new();

    launcher_cmd(&project)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Checking Python runtime"))
        .stdout(predicate::str::contains("Provisioning isolated environment"))
        .stdout(predicate::str::contains("Missing configuration policy: halt"));

    assert!(!project.path("venv").exists());
}

#[test]
fn test_status_shows_preflight_as_info() {
    let project = TestProject::new();
    project.configure("[preflight]\nenabled = true\n");

    launcher_cmd(&project)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "ℹ Running preflight tests: runs before every launch",
        ))
        .stdout(predicate::str::contains("⚠ Running preflight tests").not());
}

#[test]
fn test_backup_list_in_empty_project() {
    let project = TestProject::bare();

    launcher_cmd(&project)
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No backups"));
}

#[test]
fn test_backup_create_without_store_fails() {
    let project = TestProject::bare();

    launcher_cmd(&project)
        .args(["backup", "create"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Store not found"));
}

#[test]
fn test_backup_create_then_stats_json() {
    let project = TestProject::bare();
    launcher::data::Database::open(project.path("game.db")).unwrap();

    launcher_cmd(&project)
        .args(["backup", "create"])
        .assert()
        .success()
        .stdout(predicate::str::contains("game_backup_"));

    let output = launcher_cmd(&project)
        .args(["backup", "stats", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total_backups"], 1);
}

#[test]
fn test_backup_restore_onto_live_store_fails() {
    let project = TestProject::bare();
    launcher::data::Database::open(project.path("game.db")).unwrap();
    let size = std::fs::metadata(project.path("game.db")).unwrap().len();

    launcher_cmd(&project)
        .args(["backup", "restore", "--file"])
        .arg(project.path("game.db"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("it is the live store"));
    assert_eq!(std::fs::metadata(project.path("game.db")).unwrap().len(), size);
}

/// Interpreter stand-in: creates venvs by copying itself, accepts pip, and
/// exits 42 when asked to run the bot.
#[cfg(unix)]
const FAKE_PYTHON: &str = r#"#!/bin/sh
if [ "$1" = "-m" ] && [ "$2" = "venv" ]; then
    mkdir -p "$3/bin" && cp "$0" "$3/bin/python"
    exit $?
fi
if [ "$1" = "-m" ] && [ "$2" = "pip" ]; then
    exit 0
fi
if [ "$1" = "main.py" ]; then
    exit 42
fi
exit 0
"#;

#[cfg(unix)]
fn scripted_project() -> TestProject {
    let project = TestProject::new();
    let runtime = project.install_runtime("tools/python3", FAKE_PYTHON);
    project.write_launcher_toml(&runtime, "");
    project
}

#[cfg(unix)]
#[test]
fn test_fresh_checkout_halts_with_instructions() {
    let project = scripted_project();

    launcher_cmd(&project)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("BOT_TOKEN"))
        .stdout(predicate::str::contains("ADMIN_USER_ID"));

    assert!(project.path("venv/bin/python").exists());
    assert!(project.path("venv/.deps_installed").exists());
    assert!(project.path(".env").exists());
    assert!(!project.path("game.db").exists());
}

#[cfg(unix)]
#[test]
fn test_exit_code_mirrors_worker() {
    let project = scripted_project();
    project.write(".env", FILLED_ENV);

    launcher_cmd(&project).assert().code(42);

    assert!(project.path("game.db").exists());
    assert!(project.path("logs").is_dir());
    assert!(project.path("backups").is_dir());
    assert!(project.path("data").is_dir());

    // Second run: logging to file now that logs/ exists, same exit code
    launcher_cmd(&project).assert().code(42);
    let log = std::fs::read_to_string(project.path("logs/launcher.log")).unwrap();
    assert!(log.contains("Launcher started"));
}

/// Ctrl-C at the `.env` prompt must still end the launcher after an earlier
/// child process (venv creation, pip) has run.
#[cfg(unix)]
#[test]
fn test_interrupt_at_prompt_after_child_run_terminates() {
    use std::os::unix::process::ExitStatusExt;
    use std::process::Stdio;
    use std::time::{Duration, Instant};

    // Background jobs inherit an ignored SIGINT, which no child can undo
    let inherited = std::process::Command::new("sh")
        .args(["-c", "kill -INT $$; exit 0"])
        .status()
        .unwrap();
    if inherited.success() {
        return;
    }

    let project = scripted_project();
    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("launcher"))
        .arg("--root")
        .arg(&project.root)
        .arg("--no-color")
        .arg("--interactive")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // The prompt follows the template copy
    let deadline = Instant::now() + Duration::from_secs(20);
    while !project.path(".env").exists() {
        if Instant::now() > deadline || child.try_wait().unwrap().is_some() {
            let _ = child.kill();
            panic!("launcher never reached the configuration prompt");
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    std::thread::sleep(Duration::from_millis(300));
    assert!(child.try_wait().unwrap().is_none(), "launcher should be waiting at the prompt");

    let sent = std::process::Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(sent.success());

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            let _ = child.wait();
            panic!("launcher kept running after SIGINT at the prompt");
        }
        std::thread::sleep(Duration::from_millis(20));
    };
    assert!(!status.success());
    assert_eq!(status.signal(), Some(2));
}
