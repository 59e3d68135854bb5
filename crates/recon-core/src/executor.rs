//! Retrying Executor.
//!
//! Estados:
//! `NotStarted -> Running -> {Succeeded | FailedRetrying -> Running -> {Succeeded | FailedTerminal}}`
//!
//! `FailedRetrying` sólo es alcanzable cuando el vector incluye el flag
//! paralelo, y a lo sumo una vez: el reintento es una rama explícita, no un
//! bucle de backoff.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::command::{command_fingerprint, uses_parallel_flag};
use crate::environ::EnvironmentSnapshot;
use crate::process::ProcessRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionState {
    NotStarted,
    Running,
    Succeeded,
    /// Transitorio: primer intento fallido con el flag paralelo.
    FailedRetrying,
    FailedTerminal,
}

impl ExecutionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::FailedTerminal)
    }
}

/// Un intento de ejecución.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based.
    pub attempt: u32,
    pub exit_code: Option<i32>,
    /// Error al lanzar el proceso (el intento nunca corrió).
    pub launch_error: Option<String>,
    pub elapsed_ms: u64,
}

impl AttemptRecord {
    pub fn succeeded(&self) -> bool {
        self.launch_error.is_none() && self.exit_code == Some(0)
    }
}

/// Resultado único e inmutable de la ejecución.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub command: Vec<String>,
    pub command_fingerprint: String,
    /// Código del último intento; `Some(0)` en dry-run.
    pub exit_code: Option<i32>,
    /// 0 en dry-run, 1 o 2 en otro caso.
    pub attempts: u32,
    pub attempt_records: Vec<AttemptRecord>,
    pub elapsed_ms: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Archivo con la salida capturada, si se configuró.
    pub log_path: Option<PathBuf>,
    pub state: ExecutionState,
    pub dry_run: bool,
}

impl ExecutionOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == ExecutionState::Succeeded
    }

    pub fn retried(&self) -> bool {
        self.attempts > 1
    }
}

pub struct RetryingExecutor<'a> {
    runner: &'a dyn ProcessRunner,
    environ: &'a EnvironmentSnapshot,
    log_path: Option<PathBuf>,
}

impl<'a> RetryingExecutor<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, environ: &'a EnvironmentSnapshot) -> Self {
        Self { runner,
               environ,
               log_path: None }
    }

    /// Referencia a la captura de salida que se reporta en el resultado.
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn execute(&self, argv: &[String], dry_run: bool) -> ExecutionOutcome {
        let started_at = Utc::now();
        let clock = Instant::now();
        let fingerprint = command_fingerprint(argv);

        if dry_run {
            info!("dry run, would execute: {}", argv.join(" "));
            return ExecutionOutcome { command: argv.to_vec(),
                                      command_fingerprint: fingerprint,
                                      exit_code: Some(0),
                                      attempts: 0,
                                      attempt_records: vec![],
                                      elapsed_ms: 0,
                                      started_at,
                                      finished_at: started_at,
                                      log_path: None,
                                      state: ExecutionState::Succeeded,
                                      dry_run: true };
        }

        let parallel = uses_parallel_flag(argv);
        let mut state = ExecutionState::NotStarted;
        let mut records = Vec::with_capacity(2);

        info!("executing: {}", argv.join(" "));
        state = transition(state, ExecutionState::Running);
        let first = self.attempt(1, argv);
        let first_ok = first.succeeded();
        let launch_failed = first.launch_error.is_some();
        records.push(first);

        if first_ok {
            state = transition(state, ExecutionState::Succeeded);
        } else if parallel && !launch_failed {
            state = transition(state, ExecutionState::FailedRetrying);
            warn!("first attempt exited with {:?} while using the parallel flag; retrying once with the identical command",
                  records[0].exit_code);
            state = transition(state, ExecutionState::Running);
            let second = self.attempt(2, argv);
            let next = if second.succeeded() {
                info!("retry occurred: second attempt succeeded");
                ExecutionState::Succeeded
            } else {
                error!("retry occurred: second attempt failed with exit code {:?}", second.exit_code);
                ExecutionState::FailedTerminal
            };
            records.push(second);
            state = transition(state, next);
        } else {
            if parallel {
                error!("could not launch the reconstruction; not retrying");
            } else {
                error!("reconstruction failed with exit code {:?}; no retry without the parallel flag",
                       records[0].exit_code);
            }
            state = transition(state, ExecutionState::FailedTerminal);
        }

        if records.len() == 1 && state == ExecutionState::Succeeded {
            info!("no retry occurred: first attempt succeeded");
        }

        let exit_code = records.last().and_then(|r| r.exit_code);
        ExecutionOutcome { command: argv.to_vec(),
                           command_fingerprint: fingerprint,
                           exit_code,
                           attempts: records.len() as u32,
                           attempt_records: records,
                           elapsed_ms: clock.elapsed().as_millis() as u64,
                           started_at,
                           finished_at: Utc::now(),
                           log_path: self.log_path.clone(),
                           state,
                           dry_run: false }
    }

    fn attempt(&self, attempt: u32, argv: &[String]) -> AttemptRecord {
        let clock = Instant::now();
        let (exit_code, launch_error) = match self.runner.run(argv, self.environ) {
            Ok(exit) => (exit.code, None),
            Err(e) => {
                error!("attempt {attempt}: could not launch `{}`: {e}", argv.first().map(String::as_str).unwrap_or(""));
                (None, Some(e.to_string()))
            }
        };
        let elapsed_ms = clock.elapsed().as_millis() as u64;
        info!("attempt {attempt} finished in {elapsed_ms} ms with exit code {exit_code:?}");
        AttemptRecord { attempt,
                        exit_code,
                        launch_error,
                        elapsed_ms }
    }
}

fn transition(from: ExecutionState, to: ExecutionState) -> ExecutionState {
    debug!("execution state {from:?} -> {to:?}");
    to
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(ExecutionState::Succeeded.is_terminal());
        assert!(ExecutionState::FailedTerminal.is_terminal());
        assert!(!ExecutionState::FailedRetrying.is_terminal());
        assert!(!ExecutionState::Running.is_terminal());
        assert!(!ExecutionState::NotStarted.is_terminal());
    }
}
