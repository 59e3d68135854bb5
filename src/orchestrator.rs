//! Orquestador de una corrida:
//! Config (ya resuelta) -> sujeto -> Command Builder -> Retrying Executor ->
//! Post-Processing Pipeline -> empaquetado -> Outcome Aggregator.
//!
//! Todo corre en un único hilo; cada proceso externo se espera antes de
//! seguir.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use recon_core::command::build_command;
use recon_core::constants::ARCHIVE_PREFIX;
use recon_core::environ::{LICENSE_VAR, SUBJECTS_DIR_VAR};
use recon_core::event::write_jsonl;
use recon_core::{aggregate, EnvironmentSnapshot, EventStore, ExecutionOutcome, InputSet, PipelineReport,
                 PostProcessingPipeline, ProcessRunner, ReconError, RetryingExecutor, RunConfig, RunEvent,
                 RunEventKind, StageContext, SubjectId, Verdict};
use recon_packaging::{archive_name, archive_subject, extract_prior_run, write_metadata, ArchiveSummary};
use serde::Serialize;
use uuid::Uuid;

/// Directorios de la corrida.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunLayout {
    /// Raíz equivalente a `SUBJECTS_DIR`.
    pub subjects_dir: PathBuf,
    /// Donde quedan el archivo, la metadata y el journal.
    pub output_dir: PathBuf,
}

impl RunLayout {
    pub fn new(subjects_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self { subjects_dir: subjects_dir.into(),
               output_dir: output_dir.into() }
    }

    pub fn subject_dir(&self, subject: &SubjectId) -> PathBuf {
        self.subjects_dir.join(subject.as_str())
    }
}

/// Todo lo que produjo la corrida.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub subject: Option<SubjectId>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// `None` si la reconstrucción no se ejecutó (sólo-post-procesado o
    /// error previo).
    pub execution: Option<ExecutionOutcome>,
    #[serde(skip)]
    pub pipeline: PipelineReport,
    pub archive: Option<ArchiveSummary>,
    pub metadata_path: Option<PathBuf>,
    pub journal_path: Option<PathBuf>,
    pub verdict: Verdict,
    #[serde(skip)]
    pub events: Vec<RunEvent>,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.verdict.exit_code
    }
}

pub struct Orchestrator<'a, E: EventStore> {
    config: &'a RunConfig,
    inputs: &'a InputSet,
    layout: &'a RunLayout,
    runner: &'a dyn ProcessRunner,
    pipeline: &'a PostProcessingPipeline,
    environ: EnvironmentSnapshot,
    store: E,
    run_id: Uuid,
    log_path: Option<PathBuf>,
}

impl<'a, E: EventStore> Orchestrator<'a, E> {
    pub fn new(config: &'a RunConfig,
               inputs: &'a InputSet,
               layout: &'a RunLayout,
               runner: &'a dyn ProcessRunner,
               pipeline: &'a PostProcessingPipeline,
               store: E)
               -> Self {
        Self { config,
               inputs,
               layout,
               runner,
               pipeline,
               environ: EnvironmentSnapshot::empty(),
               store,
               run_id: Uuid::new_v4(),
               log_path: None }
    }

    pub fn with_environ(mut self, environ: EnvironmentSnapshot) -> Self {
        self.environ = environ;
        self
    }

    /// Fija el id de corrida (nombres de archivo reproducibles en tests).
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn run(mut self) -> RunReport {
        let started_at = Utc::now();
        let mut report = RunReport { run_id: self.run_id,
                                     subject: None,
                                     started_at,
                                     finished_at: started_at,
                                     execution: None,
                                     pipeline: PipelineReport::default(),
                                     archive: None,
                                     metadata_path: None,
                                     journal_path: None,
                                     verdict: Verdict { exit_code: 0,
                                                        error: None,
                                                        summary_lines: vec![] },
                                     events: vec![] };

        let fatal = self.drive(&mut report).err();
        report.verdict = aggregate(report.execution.as_ref(), &report.pipeline, fatal);
        self.store.append_kind(self.run_id,
                               RunEventKind::RunCompleted { exit_code: report.verdict.exit_code,
                                                            error: report.verdict.error.clone() });
        report.finished_at = Utc::now();
        report.events = self.store.list(self.run_id);
        report.journal_path = self.write_journal(report.subject.as_ref(), &report.events);

        for line in &report.verdict.summary_lines {
            if report.verdict.is_success() {
                warn!("{line}");
            } else {
                error!("{line}");
            }
        }
        info!("run {} finished with exit code {}", self.run_id, report.verdict.exit_code);
        report
    }

    /// Fases en orden. Un `Err` es fatal para la corrida; lo ya producido
    /// queda en `report`.
    fn drive(&mut self, report: &mut RunReport) -> Result<(), ReconError> {
        self.inputs.validate()?;
        std::fs::create_dir_all(&self.layout.subjects_dir)?;
        std::fs::create_dir_all(&self.layout.output_dir)?;

        let subject = self.resolve_subject()?;
        report.subject = Some(subject.clone());
        self.export_environment();
        self.store.append_kind(self.run_id,
                               RunEventKind::RunInitialized { subject: subject.to_string(),
                                                              postprocessing_only: self.config.postprocessing_only,
                                                              dry_run: self.config.dry_run });

        let execution = self.execute(&subject);
        let execution_ok = execution.as_ref().map_or(true, ExecutionOutcome::succeeded);
        report.execution = execution;

        if execution_ok {
            let ctx = StageContext { subject: &subject,
                                     subjects_dir: &self.layout.subjects_dir,
                                     config: self.config,
                                     environ: &self.environ,
                                     runner: self.runner };
            report.pipeline = self.pipeline.run(&ctx, &mut self.store, self.run_id);
        } else {
            warn!("reconstruction failed; post-processing stages are not run");
        }

        self.package(&subject, execution_ok, report)
    }

    /// Sujeto de la corrida. En modo sólo-post-procesado, o si se entregó un
    /// archivo previo, sale del archivo.
    fn resolve_subject(&self) -> Result<SubjectId, ReconError> {
        match (&self.inputs.prior_archive, self.config.postprocessing_only) {
            (Some(archive), _) => {
                extract_prior_run(archive, &self.layout.subjects_dir, self.config.subject_id.as_ref())
            }
            (None, true) => {
                Err(ReconError::PriorRunUnavailable("post-processing only requires a prior output archive".into()))
            }
            (None, false) => {
                if self.inputs.anatomical.is_empty() {
                    return Err(ReconError::config("anatomical", "an anatomical volume or a prior archive is required"));
                }
                self.config
                    .subject_id
                    .clone()
                    .ok_or_else(|| ReconError::config("subject_id", "required when no prior archive is supplied"))
            }
        }
    }

    fn export_environment(&mut self) {
        let mut env = std::mem::take(&mut self.environ).with_var(SUBJECTS_DIR_VAR,
                                                                 self.layout.subjects_dir.display().to_string());
        if let Some(license) = &self.inputs.license {
            env = env.with_var(LICENSE_VAR, license.display().to_string());
        }
        log::debug!("environment: {}", env.describe());
        self.environ = env;
    }

    fn execute(&mut self, subject: &SubjectId) -> Option<ExecutionOutcome> {
        if self.config.postprocessing_only {
            info!("post-processing only: reconstruction is not run");
            self.store.append_kind(self.run_id,
                                   RunEventKind::ExecutionSkipped { reason: "postprocessing-only".into() });
            return None;
        }

        let argv = build_command(self.config, subject, self.inputs);
        let mut executor = RetryingExecutor::new(self.runner, &self.environ);
        if let Some(path) = &self.log_path {
            executor = executor.with_log_path(path);
        }
        let outcome = executor.execute(&argv, self.config.dry_run);

        if outcome.dry_run {
            self.store.append_kind(self.run_id, RunEventKind::ExecutionSkipped { reason: "dry-run".into() });
        }
        for attempt in &outcome.attempt_records {
            if attempt.attempt == 2 {
                self.store.append_kind(self.run_id,
                                       RunEventKind::ExecutionRetried { first_exit_code: outcome.attempt_records[0].exit_code });
            }
            self.store.append_kind(self.run_id,
                                   RunEventKind::ExecutionAttempt { attempt: attempt.attempt,
                                                                    exit_code: attempt.exit_code,
                                                                    fingerprint: outcome.command_fingerprint.clone() });
        }
        Some(outcome)
    }

    /// El árbol se empaqueta aunque la reconstrucción haya fallado, si
    /// existe. Sin árbol es un error salvo en dry-run o tras una falla de la
    /// reconstrucción (que ya es fatal).
    fn package(&mut self, subject: &SubjectId, execution_ok: bool, report: &mut RunReport) -> Result<(), ReconError> {
        let tree = self.layout.subject_dir(subject);
        if !tree.is_dir() {
            if self.config.dry_run {
                info!("dry run: no subject tree at {}, nothing to package", tree.display());
                return Ok(());
            }
            if !execution_ok {
                warn!("no subject tree at {} to package", tree.display());
                return Ok(());
            }
            return Err(ReconError::Packaging(format!("subject tree {} does not exist", tree.display())));
        }

        let target = self.layout.output_dir.join(archive_name(subject, self.run_id));
        let summary = archive_subject(&self.layout.subjects_dir, subject, &target)?;
        self.store.append_kind(self.run_id,
                               RunEventKind::ArchiveWritten { path: summary.path.display().to_string(),
                                                              digest: summary.digest.clone() });
        report.archive = Some(summary);
        report.metadata_path = Some(write_metadata(&self.layout.output_dir, &report.pipeline.metadata)?);
        Ok(())
    }

    fn write_journal(&self, subject: Option<&SubjectId>, events: &[RunEvent]) -> Option<PathBuf> {
        let name = match subject {
            Some(s) => format!("{ARCHIVE_PREFIX}_{s}_{}.journal.jsonl", self.run_id),
            None => format!("{ARCHIVE_PREFIX}_{}.journal.jsonl", self.run_id),
        };
        let path = self.layout.output_dir.join(name);
        match write_journal_file(&path, events) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("could not write run journal {}: {e}", path.display());
                None
            }
        }
    }
}

fn write_journal_file(path: &Path, events: &[RunEvent]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_jsonl(path, events)
}
