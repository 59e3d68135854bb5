use recon_core::testing::ScriptedRunner;
use recon_core::{EnvironmentSnapshot, ExecutionState, RetryingExecutor};

fn argv(parallel: bool) -> Vec<String> {
    let mut v: Vec<String> = ["recon-all", "-i", "/in/t1.nii.gz", "-subjid", "sub_01", "-all", "-qcache"].iter()
                                                                                                         .map(|s| s.to_string())
                                                                                                         .collect();
    if parallel {
        v.extend(["-parallel", "-openmp", "4"].iter().map(|s| s.to_string()));
    }
    v
}

#[test]
fn parallel_failure_is_retried_once_with_identical_argv() {
    let runner = ScriptedRunner::new().exits("recon-all", &[1, 0]);
    let env = EnvironmentSnapshot::empty();
    let cmd = argv(true);
    let outcome = RetryingExecutor::new(&runner, &env).execute(&cmd, false);

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], cmd);
    assert_eq!(calls[1], calls[0]);
    assert_eq!(outcome.attempts, 2);
    assert!(outcome.retried());
    assert_eq!(outcome.exit_code, Some(0));
    assert_eq!(outcome.state, ExecutionState::Succeeded);
    assert_eq!(outcome.attempt_records[0].exit_code, Some(1));
}

#[test]
fn parallel_second_failure_is_terminal() {
    let runner = ScriptedRunner::new().exits("recon-all", &[1, 3, 0]);
    let env = EnvironmentSnapshot::empty();
    let outcome = RetryingExecutor::new(&runner, &env).execute(&argv(true), false);

    assert_eq!(runner.calls().len(), 2);
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.exit_code, Some(3));
    assert_eq!(outcome.state, ExecutionState::FailedTerminal);
    assert!(!outcome.succeeded());
}

#[test]
fn serial_failure_is_not_retried() {
    let runner = ScriptedRunner::new().exits("recon-all", &[1, 0]);
    let env = EnvironmentSnapshot::empty();
    let outcome = RetryingExecutor::new(&runner, &env).execute(&argv(false), false);

    assert_eq!(runner.calls().len(), 1);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.exit_code, Some(1));
    assert_eq!(outcome.state, ExecutionState::FailedTerminal);
}

#[test]
fn first_success_needs_one_attempt() {
    let runner = ScriptedRunner::new();
    let env = EnvironmentSnapshot::empty();
    let outcome = RetryingExecutor::new(&runner, &env).with_log_path("/out/recon-all.log")
                                                      .execute(&argv(true), false);
    assert_eq!(outcome.attempts, 1);
    assert!(!outcome.retried());
    assert!(outcome.succeeded());
    assert_eq!(outcome.log_path.as_deref(), Some(std::path::Path::new("/out/recon-all.log")));
}

#[test]
fn dry_run_spawns_nothing_and_reports_success() {
    let runner = ScriptedRunner::new().exits("recon-all", &[1]);
    let env = EnvironmentSnapshot::empty();
    let cmd = argv(true);
    let outcome = RetryingExecutor::new(&runner, &env).execute(&cmd, true);

    assert!(runner.calls().is_empty());
    assert_eq!(outcome.attempts, 0);
    assert!(outcome.succeeded());
    assert!(outcome.dry_run);
    assert_eq!(outcome.command, cmd);
}

#[test]
fn launch_failure_is_not_retried() {
    let runner = ScriptedRunner::new().fails_to_launch("recon-all", "no such file");
    let env = EnvironmentSnapshot::empty();
    let outcome = RetryingExecutor::new(&runner, &env).execute(&argv(true), false);

    assert_eq!(runner.calls().len(), 1);
    assert_eq!(outcome.state, ExecutionState::FailedTerminal);
    assert_eq!(outcome.exit_code, None);
    assert_eq!(outcome.attempt_records[0].launch_error.as_deref(), Some("no such file"));
}

#[test]
fn signal_exit_triggers_the_retry_too() {
    let runner = ScriptedRunner::new().killed("recon-all");
    let env = EnvironmentSnapshot::empty();
    let outcome = RetryingExecutor::new(&runner, &env).execute(&argv(true), false);
    assert_eq!(outcome.attempts, 2);
    assert!(outcome.succeeded());
}

#[test]
fn fingerprint_depends_only_on_argv() {
    let env = EnvironmentSnapshot::empty();
    let a = RetryingExecutor::new(&ScriptedRunner::new(), &env).execute(&argv(true), true);
    let b = RetryingExecutor::new(&ScriptedRunner::new(), &env).execute(&argv(true), false);
    let c = RetryingExecutor::new(&ScriptedRunner::new(), &env).execute(&argv(false), true);
    assert_eq!(a.command_fingerprint, b.command_fingerprint);
    assert_ne!(a.command_fingerprint, c.command_fingerprint);
}
