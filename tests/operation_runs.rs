//! Integration tests for running operations through real shells

mod common;

use devops::config::{load_definition, Operation, Stage};
use devops::error::ExecutionError;
use devops::runner::{
    ambient_snapshot, CommandResult, Context, DefaultExecutor, OperationRunner, ShellExecutor,
};
use std::time::{Duration, Instant};

fn runner() -> OperationRunner<Vec<u8>, Vec<u8>> {
    OperationRunner::new(Vec::new(), Vec::new())
}

fn text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap()
}

#[tokio::test]
async fn test_fail_fast_never_runs_later_steps() {
    let op = Operation::new(["echo a", "exit 2", "echo b"]).with_fail_fast(true);
    let mut executor = DefaultExecutor::new();
    let mut runner = runner();

    let err = runner
        .run(&Context::new(), &op, &ambient_snapshot(), &mut executor)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ExecutionError::CommandFailed { ref command, exit_code: 2 } if command == "exit 2"
    ));
    let (out, _) = runner.into_inner();
    let out = text(out);
    assert!(out.contains("[1] echo a\na\n"));
    assert!(out.contains("[2] exit 2"));
    assert!(!out.contains("[3]"));
    assert!(!out.lines().any(|l| l == "b"));
}

#[tokio::test]
async fn test_collect_all_names_only_failed_steps() {
    let op = Operation::new(["true", "false", "true"]);
    let mut executor = DefaultExecutor::new();
    let mut runner = runner();

    let err = runner
        .run(&Context::new(), &op, &ambient_snapshot(), &mut executor)
        .await
        .unwrap_err();

    match err {
        ExecutionError::StepsFailed(steps) => assert_eq!(steps, vec!["false"]),
        other => panic!("expected StepsFailed, got {:?}", other),
    }
    let (out, _) = runner.into_inner();
    let out = text(out);
    assert!(out.contains("[1] true"));
    assert!(out.contains("[2] false"));
    assert!(out.contains("[3] true"));
}

#[tokio::test]
async fn test_collect_all_reports_every_failure() {
    let op = Operation::new(["exit 3", "echo fine", "exit 4"]);
    let mut executor = DefaultExecutor::new();

    let err = runner()
        .run(&Context::new(), &op, &ambient_snapshot(), &mut executor)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "failed to run steps: [exit 3, exit 4]");
}

#[tokio::test]
async fn test_operation_env_reaches_steps() {
    let op = Operation::new(["echo \"$DEVOPS_GREETING from $DEVOPS_TARGET\""])
        .with_env("DEVOPS_GREETING", "hello")
        .with_env("DEVOPS_TARGET", "ops");
    let mut executor = DefaultExecutor::new();
    let mut runner = runner();

    runner
        .run(&Context::new(), &op, &ambient_snapshot(), &mut executor)
        .await
        .unwrap();

    let (out, _) = runner.into_inner();
    assert!(text(out).contains("hello from ops\n"));
    assert!(std::env::var("DEVOPS_GREETING").is_err());
}

#[tokio::test]
async fn test_override_wins_over_ambient_duplicate() {
    let mut ambient = ambient_snapshot();
    ambient.push(("DEVOPS_MODE".into(), "ambient".into()));
    let op = Operation::new(["echo $DEVOPS_MODE"]).with_env("DEVOPS_MODE", "override");
    let mut executor = DefaultExecutor::new();
    let mut runner = runner();

    runner
        .run(&Context::new(), &op, &ambient, &mut executor)
        .await
        .unwrap();

    let (out, _) = runner.into_inner();
    assert!(text(out).contains("\noverride\n"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_non_utf8_ambient_variable_reaches_steps() {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    std::env::set_var(
        "DEVOPS_RAW_BYTES",
        OsString::from_vec(b"a\xffb".to_vec()),
    );
    let op = Operation::new([
        "echo \"raw=${DEVOPS_RAW_BYTES+present}\"",
        "printf '%s\\n' \"$DEVOPS_RAW_BYTES\"",
    ])
    .with_env("DEVOPS_MODE", "override");
    let mut executor = DefaultExecutor::new();
    let mut runner = runner();

    runner
        .run(&Context::new(), &op, &ambient_snapshot(), &mut executor)
        .await
        .unwrap();

    let (out, _) = runner.into_inner();
    let out = text(out);
    assert!(out.contains("raw=present\n"));
    assert!(out.contains("a\u{FFFD}b\n"));
}

#[tokio::test]
async fn test_stderr_is_forwarded_separately() {
    let op = Operation::new(["echo visible && echo problem >&2"]);
    let mut executor = DefaultExecutor::new();
    let mut runner = runner();

    runner
        .run(&Context::new(), &op, &ambient_snapshot(), &mut executor)
        .await
        .unwrap();

    let (out, err) = runner.into_inner();
    let out = text(out);
    assert!(out.contains("visible\n"));
    assert!(!out.contains("problem"));
    assert_eq!(text(err), "problem\n");
}

#[tokio::test]
async fn test_round_trip_of_both_streams() {
    let result: CommandResult = DefaultExecutor::new()
        .execute(
            &Context::new(),
            "printf 'to-out'; printf 'to-err' >&2; printf '!'",
        )
        .await
        .unwrap();

    assert_eq!(result.stdout, "to-out!");
    assert_eq!(result.stderr, "to-err");
    assert_eq!(result.exit_code, 0);
}

#[tokio::test]
async fn test_stage_from_yaml_definition() {
    let def = load_definition(
        r#"
id: demo
codebase:
  language: shell
  test:
    fail_fast: true
    env:
      SUITE: unit
    steps:
      - test "$SUITE" = unit
      - echo suite passed
"#,
    )
    .unwrap();

    let mut executor = DefaultExecutor::new();
    let mut runner = runner();
    runner
        .run_stage(
            &Context::new(),
            &def,
            Stage::Test,
            &ambient_snapshot(),
            &mut executor,
        )
        .await
        .unwrap();

    let (out, _) = runner.into_inner();
    assert!(text(out).contains("suite passed"));
}

#[tokio::test]
async fn test_custom_interpreter_from_definition() {
    let def = load_definition(
        r#"
id: demo
interpreter: [sh, -e, -c]
codebase:
  language: shell
  build:
    steps:
      - false; echo unreachable
"#,
    )
    .unwrap();

    let ctx = Context::new().with_interpreter(def.interpreter.clone().unwrap());
    let mut executor = DefaultExecutor::new();
    let mut runner = runner();
    let err = runner
        .run_stage(&ctx, &def, Stage::Build, &ambient_snapshot(), &mut executor)
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 1);
    let (out, _) = runner.into_inner();
    assert!(!text(out).lines().any(|l| l == "unreachable"));
}

#[tokio::test]
async fn test_timeout_aborts_operation() {
    let op = Operation::new(["sleep 5", "echo after"]);
    let ctx = Context::new().with_timeout(Duration::from_millis(100));
    let mut executor = DefaultExecutor::new();
    let mut runner = runner();

    let started = Instant::now();
    let err = runner
        .run(&ctx, &op, &ambient_snapshot(), &mut executor)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(4));
    let (out, _) = runner.into_inner();
    assert!(!text(out).contains("[2] echo after"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_cancellation_terminates_child_process() {
    let dir = tempfile::TempDir::new().unwrap();
    let pid_file = dir.path().join("child.pid");
    let command = format!("echo $$ > '{}'; exec sleep 1", pid_file.display());

    let ctx = Context::new();
    let token = ctx.cancellation_token().clone();
    let probe = pid_file.clone();
    let canceller = tokio::spawn(async move {
        let pid = common::wait_for_pid(&probe).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
        pid
    });

    let err = DefaultExecutor::new()
        .execute(&ctx, &command)
        .await
        .unwrap_err();
    let pid = canceller.await.unwrap();

    assert!(matches!(err, ExecutionError::Cancelled { .. }));
    assert_eq!(err.exit_code(), -1);
    assert!(!common::process_alive(pid));
}

#[cfg(unix)]
#[tokio::test]
async fn test_cancellation_terminates_background_grandchild() {
    let dir = tempfile::TempDir::new().unwrap();
    let pid_file = dir.path().join("grandchild.pid");
    let command = format!("sleep 5 & echo $! > '{}'; wait", pid_file.display());

    let ctx = Context::new();
    let token = ctx.cancellation_token().clone();
    let probe = pid_file.clone();
    let canceller = tokio::spawn(async move {
        let pid = common::wait_for_pid(&probe).await;
        token.cancel();
        pid
    });

    let err = DefaultExecutor::new()
        .execute(&ctx, &command)
        .await
        .unwrap_err();
    let pid = canceller.await.unwrap();

    assert!(err.is_cancelled());
    assert!(common::wait_until_gone(pid, Duration::from_secs(2)).await);
}
