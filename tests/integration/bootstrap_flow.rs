//! Integration tests for the bootstrap gate sequence
//!
//! Runs the real setup steps against temporary checkouts with a mock process
//! runner standing in for python, pip and the bot.

use super::common::project_fixtures::{TestProject, ENV_TEMPLATE};
use launcher::bootstrap::{BootstrapOptions, ScriptedConfirm};
use launcher::{BootstrapError, MockProcessRunner, Outcome, Purpose, Stage};

/// Fresh checkout: environment, dependencies and .env are set up, then the run
/// halts without launching the bot.
#[tokio::test]
async fn test_fresh_checkout_halts_for_configuration() {
    let project = TestProject::new();
    let runner = MockProcessRunner::new();
    let (mut bootstrapper, reporter) = project.default_bootstrapper(&runner);

    let outcome = bootstrapper.run().await.unwrap();

    assert_eq!(outcome, Outcome::AwaitingConfiguration);
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(bootstrapper.stage(), Stage::AwaitingConfig);

    assert!(project.path("venv").is_dir());
    assert!(project.path("venv/.deps_installed").exists());
    assert_eq!(
        std::fs::read_to_string(project.path(".env")).unwrap(),
        ENV_TEMPLATE
    );
    assert_eq!(runner.count(Purpose::CreateEnvironment), 1);
    assert_eq!(runner.count(Purpose::UpgradePip), 1);
    assert_eq!(runner.count(Purpose::InstallDependencies), 1);
    assert_eq!(runner.count(Purpose::Worker), 0);
    assert!(!project.path("game.db").exists());

    let lines = reporter.lines();
    assert!(lines.iter().any(|l| l.contains("BOT_TOKEN")));
    assert!(lines.iter().any(|l| l.contains("ADMIN_USER_ID")));
}

/// Re-run after filling in .env: completed gates are skipped, the store is
/// created and the bot's exit code is returned.
#[tokio::test]
async fn test_rerun_after_configuration_launches_worker() {
    let project = TestProject::new();
    let first = MockProcessRunner::new();
    project.default_bootstrapper(&first).0.run().await.unwrap();
    project.write(".env", "BOT_TOKEN=12345:abc\nADMIN_USER_ID=7\n");

    let runner = MockProcessRunner::new().with_exit_code(Purpose::Worker, 3);
    let (mut bootstrapper, reporter) = project.default_bootstrapper(&runner);
    let outcome = bootstrapper.run().await.unwrap();

    assert_eq!(outcome, Outcome::Exited(3));
    assert_eq!(outcome.exit_code(), 3);
    assert_eq!(bootstrapper.stage(), Stage::Launched);
    assert_eq!(runner.count(Purpose::CreateEnvironment), 0);
    assert_eq!(runner.count(Purpose::InstallDependencies), 0);
    assert_eq!(runner.count(Purpose::Worker), 1);
    assert!(project.path("game.db").exists());
    for dir in ["logs", "backups", "data"] {
        assert!(project.path(dir).is_dir(), "{dir} should exist");
    }
    // The filled-in file is left alone
    assert!(std::fs::read_to_string(project.path(".env"))
        .unwrap()
        .contains("12345:abc"));
    assert!(reporter
        .lines()
        .iter()
        .any(|l| l.contains("Already done, skipping")));
}

/// Third run with every marker present repeats nothing but the launch
#[tokio::test]
async fn test_second_complete_run_is_idempotent() {
    let project = TestProject::new().with_filled_config();
    project.configure("[store]\ninitializer = [\"python\", \"init_db.py\"]\n");

    let create_store = |inv: &launcher::Invocation| {
        std::fs::write(inv.cwd.join("game.db"), b"").unwrap();
    };
    let first = MockProcessRunner::new().with_effect(Purpose::InitializeStore, create_store);
    let outcome = project.default_bootstrapper(&first).0.run().await.unwrap();
    assert_eq!(outcome, Outcome::Exited(0));
    assert_eq!(first.count(Purpose::InitializeStore), 1);

    let second = MockProcessRunner::new().with_effect(Purpose::InitializeStore, create_store);
    let outcome = project.default_bootstrapper(&second).0.run().await.unwrap();

    assert_eq!(outcome, Outcome::Exited(0));
    assert_eq!(second.count(Purpose::CreateEnvironment), 0);
    assert_eq!(second.count(Purpose::UpgradePip), 0);
    assert_eq!(second.count(Purpose::InstallDependencies), 0);
    assert_eq!(second.count(Purpose::InitializeStore), 0);
    assert_eq!(second.count(Purpose::Worker), 1);
}

/// No interpreter: abort before touching the filesystem
#[tokio::test]
async fn test_missing_runtime_has_no_side_effects() {
    let project = TestProject::new();
    project.write_launcher_toml(&project.path("tools/no-such-python"), "");
    let before = project.entries();

    let runner = MockProcessRunner::new();
    let (mut bootstrapper, reporter) = project.default_bootstrapper(&runner);
    let err = bootstrapper.run().await.unwrap_err();

    assert!(matches!(err, BootstrapError::MissingRuntime { .. }));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(bootstrapper.stage(), Stage::Aborted);
    assert!(runner.invocations().is_empty());
    assert_eq!(project.entries(), before);

    let lines = reporter.lines();
    assert!(lines
        .iter()
        .any(|l| l.starts_with("✗") && l.contains("FATAL: missing runtime")));
    assert!(lines.iter().any(|l| l.contains("Install Python")));
}

#[tokio::test]
async fn test_failing_preflight_blocks_launch() {
    let project = TestProject::new().with_filled_config();
    let runner = MockProcessRunner::new().with_exit_code(Purpose::Preflight, 1);
    let options = BootstrapOptions {
        preflight: Some(true),
        ..Default::default()
    };
    let (mut bootstrapper, _) =
        project.bootstrapper(&runner, options, ScriptedConfirm::default());

    let err = bootstrapper.run().await.unwrap_err();

    assert!(matches!(err, BootstrapError::PreflightTestFailure(_)));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(runner.count(Purpose::Preflight), 1);
    assert_eq!(runner.count(Purpose::Worker), 0);
}

#[tokio::test]
async fn test_preflight_enabled_in_launcher_toml() {
    let project = TestProject::new().with_filled_config();
    project.configure("[preflight]\nenabled = true\ncommand = [\"python\", \"-m\", \"pytest\"]\n");
    let runner = MockProcessRunner::new();

    let outcome = project.default_bootstrapper(&runner).0.run().await.unwrap();
    assert_eq!(outcome, Outcome::Exited(0));
    let preflight = runner.invocations_for(Purpose::Preflight);
    assert_eq!(preflight.len(), 1);
    assert_eq!(preflight[0].args, vec!["-m", "pytest"]);

    // --skip-preflight wins over launcher.toml
    let runner = MockProcessRunner::new();
    let options = BootstrapOptions {
        preflight: Some(false),
        ..Default::default()
    };
    project
        .bootstrapper(&runner, options, ScriptedConfirm::default())
        .0
        .run()
        .await
        .unwrap();
    assert_eq!(runner.count(Purpose::Preflight), 0);
}

#[tokio::test]
async fn test_worker_runs_inside_environment() {
    let project = TestProject::new().with_filled_config();
    let runner = MockProcessRunner::new();
    project.default_bootstrapper(&runner).0.run().await.unwrap();

    let worker = runner.invocations_for(Purpose::Worker);
    assert_eq!(worker.len(), 1);
    assert_eq!(worker[0].args, vec!["main.py"]);
    assert_eq!(worker[0].cwd, project.root);
    assert_eq!(
        worker[0].env_value("VIRTUAL_ENV"),
        Some(&project.path("venv").into_os_string())
    );
    assert!(worker[0].env_remove.contains(&"PYTHONHOME".to_string()));
    #[cfg(unix)]
    assert_eq!(worker[0].program, project.path("venv/bin/python"));

    let install = runner.invocations_for(Purpose::InstallDependencies);
    assert_eq!(install[0].args[..3], ["-m", "pip", "install"]);
}

#[tokio::test]
async fn test_worker_spawn_failure_is_launch_failure() {
    let project = TestProject::new().with_filled_config();
    let runner = MockProcessRunner::new().failing_spawn(Purpose::Worker);
    let (mut bootstrapper, _) = project.default_bootstrapper(&runner);

    let err = bootstrapper.run().await.unwrap_err();
    assert!(matches!(err, BootstrapError::LaunchFailure(_)));
    assert_eq!(bootstrapper.stage(), Stage::Aborted);
}

#[tokio::test]
async fn test_interactive_confirmation_continues_to_launch() {
    let project = TestProject::new();
    let runner = MockProcessRunner::new();
    let confirm = ScriptedConfirm::new([true]);
    let options = BootstrapOptions {
        interactive: true,
        ..Default::default()
    };
    let (mut bootstrapper, _) = project.bootstrapper(&runner, options, confirm.clone());

    let outcome = bootstrapper.run().await.unwrap();

    assert_eq!(outcome, Outcome::Exited(0));
    assert_eq!(confirm.prompts().len(), 1);
    assert!(confirm.prompts()[0].contains(".env"));
    assert_eq!(runner.count(Purpose::Worker), 1);
}

#[tokio::test]
async fn test_declined_confirmation_behaves_like_halt() {
    let project = TestProject::new();
    project.configure("[configuration]\non_missing = \"prompt\"\n");
    let runner = MockProcessRunner::new();
    let (mut bootstrapper, _) =
        project.bootstrapper(&runner, BootstrapOptions::default(), ScriptedConfirm::new([false]));

    let outcome = bootstrapper.run().await.unwrap();

    assert_eq!(outcome, Outcome::AwaitingConfiguration);
    assert_eq!(runner.count(Purpose::Worker), 0);
}

#[tokio::test]
async fn test_missing_template_is_missing_configuration() {
    let project = TestProject::new();
    project.remove(".env.example");
    let runner = MockProcessRunner::new();

    let err = project.default_bootstrapper(&runner).0.run().await.unwrap_err();

    assert!(matches!(err, BootstrapError::MissingConfiguration(_)));
    assert!(!project.path(".env").exists());
}

#[tokio::test]
async fn test_install_failure_leaves_no_marker() {
    let project = TestProject::new();
    let runner = MockProcessRunner::new().with_exit_code(Purpose::InstallDependencies, 1);

    let err = project.default_bootstrapper(&runner).0.run().await.unwrap_err();

    assert!(matches!(err, BootstrapError::InstallFailure(_)));
    assert!(!project.path("venv/.deps_installed").exists());
    // Configuration is never reached
    assert!(!project.path(".env").exists());
}

#[tokio::test]
async fn test_failed_pip_upgrade_only_warns() {
    let project = TestProject::new().with_filled_config();
    let runner = MockProcessRunner::new().with_exit_code(Purpose::UpgradePip, 1);
    let (mut bootstrapper, reporter) = project.default_bootstrapper(&runner);

    assert_eq!(bootstrapper.run().await.unwrap(), Outcome::Exited(0));
    assert!(reporter
        .lines()
        .iter()
        .any(|l| l.starts_with("⚠") && l.contains("pip upgrade")));
}

#[tokio::test]
async fn test_missing_requirements_is_install_failure() {
    let project = TestProject::new();
    project.remove("requirements.txt");
    let runner = MockProcessRunner::new();

    let err = project.default_bootstrapper(&runner).0.run().await.unwrap_err();

    assert!(matches!(err, BootstrapError::InstallFailure(_)));
    assert_eq!(runner.count(Purpose::InstallDependencies), 0);
}

#[tokio::test]
async fn test_initializer_without_store_file_fails() {
    let project = TestProject::new().with_filled_config();
    project.configure("[store]\ninitializer = [\"python\", \"init_db.py\"]\n");
    let runner = MockProcessRunner::new();

    let err = project.default_bootstrapper(&runner).0.run().await.unwrap_err();

    assert!(matches!(err, BootstrapError::StoreInitFailure(_)));
    assert_eq!(runner.count(Purpose::InitializeStore), 1);
    assert_eq!(runner.count(Purpose::Worker), 0);
}

#[tokio::test]
async fn test_failing_initializer_is_store_failure() {
    let project = TestProject::new().with_filled_config();
    project.configure("[store]\ninitializer = [\"python\", \"init_db.py\"]\n");
    let runner = MockProcessRunner::new().with_exit_code(Purpose::InitializeStore, 2);

    let err = project.default_bootstrapper(&runner).0.run().await.unwrap_err();
    assert!(matches!(err, BootstrapError::StoreInitFailure(_)));
}

/// The bot reads DATABASE_URL from .env; the store is created where it looks
#[tokio::test]
async fn test_store_follows_database_url() {
    let project = TestProject::new();
    project.write(
        ".env",
        "BOT_TOKEN=x\nADMIN_USER_ID=1\nDATABASE_URL=sqlite:///data/rpg.db\n",
    );
    let runner = MockProcessRunner::new();

    project.default_bootstrapper(&runner).0.run().await.unwrap();

    assert!(project.path("data/rpg.db").exists());
    assert!(!project.path("game.db").exists());
}

#[tokio::test]
async fn test_environment_without_interpreter_is_environment_failure() {
    let project = TestProject::new().with_filled_config();
    std::fs::create_dir_all(project.path("venv")).unwrap();
    let runner = MockProcessRunner::new();

    let err = project.default_bootstrapper(&runner).0.run().await.unwrap_err();

    assert!(matches!(err, BootstrapError::EnvironmentFailure(_)));
    assert_eq!(runner.count(Purpose::CreateEnvironment), 0);
}

#[tokio::test]
async fn test_status_reports_without_side_effects() {
    let project = TestProject::new();
    let runner = MockProcessRunner::new();
    let before = project.entries();
    let (bootstrapper, _) = project.default_bootstrapper(&runner);

    let status = bootstrapper.status();

    assert_eq!(status.len(), 7);
    assert!(status[0].satisfied, "runtime is configured");
    assert!(status[1..].iter().all(|gate| !gate.satisfied));
    assert!(runner.invocations().is_empty());
    assert_eq!(project.entries(), before);
}

#[test]
fn test_status_reports_preflight_as_every_launch() {
    let project = TestProject::new();
    let runner = MockProcessRunner::new();
    let options = BootstrapOptions {
        preflight: Some(true),
        ..Default::default()
    };
    let (bootstrapper, _) = project.bootstrapper(&runner, options, ScriptedConfirm::default());

    let status = bootstrapper.status();

    assert_eq!(status.len(), 8);
    let preflight = status.last().unwrap();
    assert_eq!(preflight.stage, Stage::TestsPassed);
    assert!(!preflight.satisfied);
    assert!(preflight.runs_every_launch);
    assert!(status[..7].iter().all(|gate| !gate.runs_every_launch));
}

#[tokio::test]
async fn test_step_markers_are_numbered() {
    let project = TestProject::new().with_filled_config();
    let runner = MockProcessRunner::new();
    let (mut bootstrapper, reporter) = project.default_bootstrapper(&runner);
    bootstrapper.run().await.unwrap();

    let markers: Vec<String> = reporter
        .lines()
        .into_iter()
        .filter(|l| l.starts_with('['))
        .collect();
    assert_eq!(markers.len(), 8);
    assert_eq!(markers[0], "[1/8] Checking Python runtime");
    assert_eq!(markers[7], "[8/8] Launching bot");
}
