//! Executor tests against the in-memory filesystem.

use std::io;
use std::time::Duration;

use camino::Utf8Path;
use mockall::mock;
use quill_config::PathPolicy;
use rstest::{fixture, rstest};

use super::*;
use crate::action::RawSpan;
use crate::fs::MemoryFileSystem;
use crate::imports::TreeSitterImportExtractor;

mock! {
    Runner {}
    impl CommandRunner for Runner {
        fn run(&self, command: &str, cwd: &Utf8Path, timeout: Duration) -> io::Result<CommandOutput>;
    }
}

const ROOT: &str = "/ws";

fn span() -> RawSpan {
    RawSpan::new("", 0, 0)
}

fn create_file(path: &str, content: &str) -> Action {
    Action::CreateFile {
        path: path.to_owned(),
        content: content.to_owned(),
        span: span(),
    }
}

fn run_command(command: &str) -> Action {
    Action::RunCommand {
        command: command.to_owned(),
        span: span(),
    }
}

fn output(status: CommandStatus, stdout: &str) -> CommandOutput {
    CommandOutput {
        status,
        stdout: stdout.to_owned(),
        stderr: String::new(),
    }
}

fn runner_unused() -> MockRunner {
    let mut runner = MockRunner::new();
    runner.expect_run().never();
    runner
}

fn runner_returning(result: io::Result<CommandOutput>) -> MockRunner {
    let mut runner = MockRunner::new();
    runner
        .expect_run()
        .once()
        .return_once(move |_command, _cwd, _timeout| result);
    runner
}

#[fixture]
fn workspace() -> MemoryFileSystem {
    MemoryFileSystem::new().with_directory(ROOT)
}

fn execute_with(
    fs: &MemoryFileSystem,
    runner: &MockRunner,
    settings: ExecutionSettings,
    actions: &[Action],
) -> Vec<ExecutionOutcome> {
    let safety = CommandSafetyChecker::new();
    ActionExecutor::new(Utf8Path::new(ROOT), fs, runner, &safety, settings)
        .with_import_extractor(&TreeSitterImportExtractor)
        .execute(actions)
}

fn execute(fs: &MemoryFileSystem, actions: &[Action]) -> Vec<ExecutionOutcome> {
    execute_with(fs, &runner_unused(), ExecutionSettings::default(), actions)
}

#[rstest]
fn creates_files_with_missing_parents(workspace: MemoryFileSystem) {
    let outcomes = execute(&workspace, &[create_file("src/lib/a.rs", "fn a() {}")]);

    assert!(outcomes[0].success, "{outcomes:?}");
    assert_eq!(outcomes[0].message, "created src/lib/a.rs");
    assert_eq!(
        workspace.contents("/ws/src/lib/a.rs").as_deref(),
        Some("fn a() {}")
    );
}

#[rstest]
fn parent_that_is_a_file_is_a_conflict(workspace: MemoryFileSystem) {
    let workspace = workspace.with_file("/ws/src", "not a dir");
    let outcomes = execute(&workspace, &[create_file("src/a.rs", "")]);

    assert_eq!(outcomes[0].error_kind, Some(ErrorKind::FilesystemConflict));
    assert_eq!(workspace.contents("/ws/src").as_deref(), Some("not a dir"));
}

#[rstest]
#[case::block(PathPolicy::Block)]
#[case::warn(PathPolicy::Warn)]
fn relative_escapes_are_refused_under_every_policy(
    workspace: MemoryFileSystem,
    #[case] path_policy: PathPolicy,
) {
    let settings = ExecutionSettings {
        path_policy,
        ..ExecutionSettings::default()
    };
    let outcomes = execute_with(
        &workspace,
        &runner_unused(),
        settings,
        &[create_file("../../etc/passwd", "root::0:0")],
    );

    assert_eq!(outcomes[0].error_kind, Some(ErrorKind::PathSecurityViolation));
    assert_eq!(workspace.files(), Vec::<camino::Utf8PathBuf>::new());
}

#[rstest]
fn absolute_paths_need_permission_or_a_lenient_policy(workspace: MemoryFileSystem) {
    let action = [create_file("/tmp/out.txt", "x")];
    let blocked = execute(&workspace, &action);
    assert_eq!(blocked[0].error_kind, Some(ErrorKind::PathSecurityViolation));

    let settings = ExecutionSettings {
        allow_absolute_paths: true,
        ..ExecutionSettings::default()
    };
    let allowed = execute_with(&workspace, &runner_unused(), settings, &action);
    assert!(allowed[0].success, "{allowed:?}");
    assert_eq!(workspace.contents("/tmp/out.txt").as_deref(), Some("x"));
}

#[rstest]
fn absolute_deletes_outside_the_root_follow_the_write_rules(workspace: MemoryFileSystem) {
    let workspace = workspace.with_directory("/tmp").with_file("/tmp/keep.txt", "kept");
    let action = [Action::DeleteFile {
        path: "/tmp/keep.txt".to_owned(),
        span: span(),
    }];
    let blocked = execute(&workspace, &action);
    assert_eq!(blocked[0].error_kind, Some(ErrorKind::PathSecurityViolation));
    assert_eq!(workspace.contents("/tmp/keep.txt").as_deref(), Some("kept"));

    let settings = ExecutionSettings {
        allow_absolute_paths: true,
        ..ExecutionSettings::default()
    };
    let allowed = execute_with(&workspace, &runner_unused(), settings, &action);
    assert!(allowed[0].success, "{allowed:?}");
    assert_eq!(workspace.contents("/tmp/keep.txt"), None);
}

#[rstest]
fn directories_are_created_first_and_idempotently(workspace: MemoryFileSystem) {
    let actions = [
        create_file("out/report.txt", "done"),
        Action::CreateDirectory {
            path: "out".to_owned(),
            span: span(),
        },
        Action::CreateDirectory {
            path: "out/".to_owned(),
            span: span(),
        },
    ];
    let outcomes = execute(&workspace, &actions);

    let order: Vec<_> = outcomes.iter().map(|outcome| outcome.action_index).collect();
    assert_eq!(order, [1, 2, 0]);
    assert!(outcomes.iter().all(|outcome| outcome.success), "{outcomes:?}");
}

#[rstest]
fn directory_over_a_file_is_a_conflict(workspace: MemoryFileSystem) {
    let workspace = workspace.with_file("/ws/logs", "");
    let outcomes = execute(
        &workspace,
        &[Action::CreateDirectory {
            path: "logs".to_owned(),
            span: span(),
        }],
    );
    assert_eq!(outcomes[0].error_kind, Some(ErrorKind::FilesystemConflict));
}

#[rstest]
fn modify_keeps_a_backup(workspace: MemoryFileSystem) {
    let workspace = workspace.with_file("/ws/config.toml", "old = true");
    let outcomes = execute(
        &workspace,
        &[Action::ModifyFile {
            path: "config.toml".to_owned(),
            content: "new = true".to_owned(),
            span: span(),
        }],
    );

    assert!(outcomes[0].success);
    assert_eq!(
        workspace.contents("/ws/config.toml").as_deref(),
        Some("new = true")
    );
    assert_eq!(
        workspace.contents("/ws/config.toml.bak").as_deref(),
        Some("old = true")
    );
}

#[rstest]
fn failed_modify_leaves_original_content(workspace: MemoryFileSystem) {
    let workspace = workspace.with_file("/ws/config.toml", "old = true");
    workspace.fail_writes_to("/ws/config.toml");
    let outcomes = execute(
        &workspace,
        &[Action::ModifyFile {
            path: "config.toml".to_owned(),
            content: "new = true".to_owned(),
            span: span(),
        }],
    );

    assert_eq!(outcomes[0].error_kind, Some(ErrorKind::Io));
    assert_eq!(
        workspace.contents("/ws/config.toml").as_deref(),
        Some("old = true")
    );
}

#[rstest]
fn modify_of_missing_file_creates_it(workspace: MemoryFileSystem) {
    let outcomes = execute(
        &workspace,
        &[Action::ModifyFile {
            path: "new.txt".to_owned(),
            content: "fresh".to_owned(),
            span: span(),
        }],
    );
    assert!(outcomes[0].success);
    assert!(outcomes[0].message.contains("did not exist"));
    assert_eq!(workspace.contents("/ws/new.txt.bak"), None);
}

#[rstest]
fn deletes_check_the_entry_kind(workspace: MemoryFileSystem) {
    let workspace = workspace
        .with_file("/ws/a.txt", "")
        .with_file("/ws/build/out.o", "");
    let actions = [
        Action::DeleteFile {
            path: "a.txt".to_owned(),
            span: span(),
        },
        Action::DeleteFile {
            path: "build".to_owned(),
            span: span(),
        },
        Action::DeleteFile {
            path: "missing.txt".to_owned(),
            span: span(),
        },
        Action::DeleteDirectory {
            path: "build".to_owned(),
            span: span(),
        },
    ];
    let outcomes = execute(&workspace, &actions);

    let kinds: Vec<_> = outcomes.iter().map(|outcome| outcome.error_kind).collect();
    assert_eq!(
        kinds,
        [
            None,
            Some(ErrorKind::FilesystemConflict),
            Some(ErrorKind::FilesystemConflict),
            None
        ]
    );
    assert!(workspace.files().is_empty());
}

#[rstest]
#[case(".")]
#[case("/ws")]
#[case("./")]
fn workspace_root_is_never_deleted(workspace: MemoryFileSystem, #[case] path: &str) {
    let outcomes = execute(
        &workspace,
        &[Action::DeleteDirectory {
            path: path.to_owned(),
            span: span(),
        }],
    );
    assert_eq!(outcomes[0].error_kind, Some(ErrorKind::FilesystemConflict));
    assert!(workspace.is_dir(Utf8Path::new(ROOT)));
}

#[rstest]
fn dangerous_commands_are_never_spawned(workspace: MemoryFileSystem) {
    let outcomes = execute(&workspace, &[run_command("rm -rf /")]);
    assert_eq!(outcomes[0].error_kind, Some(ErrorKind::DangerousCommand));
    assert!(!outcomes[0].success);
}

#[rstest]
fn disabled_commands_are_refused(workspace: MemoryFileSystem) {
    let settings = ExecutionSettings {
        allow_commands: false,
        ..ExecutionSettings::default()
    };
    let outcomes = execute_with(&workspace, &runner_unused(), settings, &[run_command("ls")]);
    assert_eq!(outcomes[0].error_kind, Some(ErrorKind::CommandDisabled));
    assert!(!outcomes[0].success);
    assert!(outcomes[0].message.contains("disabled by configuration"));
}

#[rstest]
fn commands_run_in_the_workspace_root(workspace: MemoryFileSystem) {
    let mut runner = MockRunner::new();
    runner
        .expect_run()
        .withf(|command, cwd, _timeout| command.trim() == "make test" && cwd.as_str() == ROOT)
        .once()
        .return_once(|_, _, _| Ok(output(CommandStatus::Exited(Some(0)), "all passed\n")));

    let outcomes = execute_with(
        &workspace,
        &runner,
        ExecutionSettings::default(),
        &[run_command("make test")],
    );
    assert!(outcomes[0].success);
    assert_eq!(outcomes[0].output.as_deref(), Some("all passed"));
}

#[rstest]
#[case::timeout(
    Ok(output(CommandStatus::TimedOut, "")),
    true,
    Some(ErrorKind::Timeout)
)]
#[case::non_zero(
    Ok(output(CommandStatus::Exited(Some(2)), "boom")),
    false,
    Some(ErrorKind::CommandFailed)
)]
#[case::signal(Ok(output(CommandStatus::Exited(None), "")), false, Some(ErrorKind::CommandFailed))]
#[case::spawn_failure(
    Err(io::Error::new(io::ErrorKind::NotFound, "sh missing")),
    false,
    Some(ErrorKind::Io)
)]
fn command_results_map_to_outcomes(
    workspace: MemoryFileSystem,
    #[case] result: io::Result<CommandOutput>,
    #[case] success: bool,
    #[case] error_kind: Option<ErrorKind>,
) {
    let outcomes = execute_with(
        &workspace,
        &runner_returning(result),
        ExecutionSettings::default(),
        &[run_command("make")],
    );
    assert_eq!(outcomes[0].success, success);
    assert_eq!(outcomes[0].error_kind, error_kind);
}

#[rstest]
fn timeouts_are_reported_as_still_running(workspace: MemoryFileSystem) {
    let outcomes = execute_with(
        &workspace,
        &runner_returning(Ok(output(CommandStatus::TimedOut, ""))),
        ExecutionSettings::default(),
        &[run_command("npm start")],
    );
    assert!(outcomes[0].message.contains("still running"));
}

#[rstest]
fn unsupported_directives_are_skipped(workspace: MemoryFileSystem) {
    let outcomes = execute(
        &workspace,
        &[Action::Unsupported {
            keyword: "rename-file".to_owned(),
            argument: "a.txt b.txt".to_owned(),
            span: span(),
        }],
    );
    assert!(outcomes[0].skipped);
    assert_eq!(outcomes[0].error_kind, Some(ErrorKind::UnknownActionKind));
}

#[rstest]
fn one_failure_does_not_stop_the_batch(workspace: MemoryFileSystem) {
    let actions = [
        create_file("../escape.txt", "x"),
        create_file("kept.txt", "y"),
    ];
    let outcomes = execute(&workspace, &actions);
    assert!(!outcomes[0].success);
    assert!(outcomes[1].success);
    assert_eq!(workspace.contents("/ws/kept.txt").as_deref(), Some("y"));
}

#[rstest]
fn imports_order_file_creation(workspace: MemoryFileSystem) {
    let actions = [
        create_file("app.js", "const { add } = require('./utils');\n"),
        create_file("utils.js", "module.exports = { add: (a, b) => a + b };\n"),
    ];
    let outcomes = execute(&workspace, &actions);
    let order: Vec<_> = outcomes.iter().map(|outcome| outcome.target.as_str()).collect();
    assert_eq!(order, ["utils.js", "app.js"]);
}

#[rstest]
fn path_cache_is_consulted(workspace: MemoryFileSystem) {
    let cache = PathCache::new("paths", 8);
    let safety = CommandSafetyChecker::new();
    let runner = runner_unused();
    let executor = ActionExecutor::new(
        Utf8Path::new(ROOT),
        &workspace,
        &runner,
        &safety,
        ExecutionSettings::default(),
    )
    .with_path_cache(&cache);

    let actions = [create_file("a.txt", "1")];
    drop(executor.execute(&actions));
    drop(executor.execute(&actions));

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert!(stats.hits >= 1);
}
