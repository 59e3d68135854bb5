//! Post-Processing Pipeline: motor secuencial de etapas.
//!
//! Las etapas se ordenan por el orden declarado de `StageKind`, sin importar
//! el orden en que se registran. Cada etapa:
//! - se salta si su gate está apagado (`attempted=false`),
//! - falla localmente si falta algún prerrequisito,
//! - corre su transformación y pliega su metadata en la de la corrida.
//!
//! Una falla no impide a las etapas siguientes, salvo que la política pida
//! abortar.

use std::path::PathBuf;
use std::time::Instant;

use log::{error, info, warn};
use serde_json::json;
use uuid::Uuid;

use crate::errors::{ReconError, StageError};
use crate::event::{EventStore, RunEventKind};
use crate::hashing::hash_value;
use crate::stage::{RunMetadata, SkipReason, StageContext, StageDefinition, StageKind, StageResult, StageRunResult};

#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Box<dyn StageDefinition>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stage<S: StageDefinition + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Ordena por `StageKind` y rechaza kinds duplicados.
    pub fn build(mut self) -> Result<PostProcessingPipeline, ReconError> {
        self.stages.sort_by_key(|s| s.kind());
        if let Some(pair) = self.stages.windows(2).find(|w| w[0].kind() == w[1].kind()) {
            return Err(ReconError::config("pipeline", format!("stage `{}` registered twice", pair[0].kind())));
        }
        Ok(PostProcessingPipeline { stages: self.stages })
    }
}

pub struct PostProcessingPipeline {
    stages: Vec<Box<dyn StageDefinition>>,
}

/// Resultados de una pasada del pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Una entrada por etapa registrada, en orden declarado.
    pub results: Vec<StageResult>,
    pub metadata: RunMetadata,
}

impl PipelineReport {
    pub fn result(&self, kind: StageKind) -> Option<&StageResult> {
        self.results.iter().find(|r| r.stage == kind)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StageResult> {
        self.results.iter().filter(|r| r.error.is_some())
    }

    /// Primera etapa requerida que falló.
    pub fn required_failure(&self) -> Option<&StageResult> {
        self.failures().find(|r| r.required)
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &PathBuf> {
        self.results.iter().flat_map(|r| r.artifacts.iter())
    }
}

impl PostProcessingPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Hash de las definiciones registradas, en orden.
    pub fn definition_hash(&self) -> String {
        let defs: Vec<String> = self.stages.iter().map(|s| s.definition_hash()).collect();
        hash_value(&json!({ "stages": defs }))
    }

    pub fn run<E: EventStore>(&self, ctx: &StageContext<'_>, store: &mut E, run_id: Uuid) -> PipelineReport {
        let mut report = PipelineReport::default();
        let mut aborted_after: Option<StageKind> = None;

        for stage in &self.stages {
            let kind = stage.kind();
            let required = ctx.config.is_required(kind);

            let skip = if !ctx.is_enabled(kind) {
                Some(SkipReason::Disabled)
            } else if ctx.config.dry_run {
                Some(SkipReason::DryRun)
            } else {
                aborted_after.map(|after| SkipReason::Aborted { after })
            };
            if let Some(reason) = skip {
                info!("skipping stage `{kind}` ({reason:?})");
                store.append_kind(run_id, RunEventKind::StageSkipped { stage: kind, reason });
                report.results.push(StageResult::skipped(kind, reason, required));
                continue;
            }

            store.append_kind(run_id, RunEventKind::StageStarted { stage: kind });
            info!("running stage `{}`", stage.name());
            let clock = Instant::now();

            let outcome = match missing_prerequisite(stage.as_ref(), ctx) {
                Some(path) => StageRunResult::Failure { error: StageError::MissingPrerequisite(path) },
                None => stage.run(ctx),
            };
            let elapsed_ms = clock.elapsed().as_millis() as u64;

            match outcome {
                StageRunResult::Success { artifacts, metadata } => {
                    let fingerprint = stage_fingerprint(stage.as_ref(), &artifacts, ctx);
                    info!("stage `{kind}` produced {} artifact(s) in {elapsed_ms} ms", artifacts.len());
                    store.append_kind(run_id,
                                      RunEventKind::StageFinished { stage: kind,
                                                                    artifacts: artifacts.len(),
                                                                    fingerprint });
                    for (key, value) in metadata {
                        if report.metadata.insert(key.clone(), value).is_some() {
                            warn!("metadata key `{key}` overwritten by stage `{kind}`");
                        }
                    }
                    report.results.push(StageResult::succeeded(kind, artifacts, required, elapsed_ms));
                }
                StageRunResult::Failure { error } => {
                    if required {
                        error!("required stage `{kind}` failed: {error}");
                    } else {
                        warn!("stage `{kind}` failed: {error}");
                    }
                    store.append_kind(run_id,
                                      RunEventKind::StageFailed { stage: kind,
                                                                  error: error.clone() });
                    report.results.push(StageResult::failed(kind, error, required, elapsed_ms));
                    if ctx.config.failure_policy.abort_on_failure && aborted_after.is_none() {
                        warn!("aborting remaining stages after `{kind}` failed");
                        aborted_after = Some(kind);
                    }
                }
            }
        }
        report
    }
}

fn missing_prerequisite(stage: &dyn StageDefinition, ctx: &StageContext<'_>) -> Option<PathBuf> {
    stage.prerequisites(ctx).into_iter().find(|p| !p.exists())
}

/// Fingerprint de una etapa terminada: definición más artefactos relativos
/// al árbol del sujeto.
fn stage_fingerprint(stage: &dyn StageDefinition, artifacts: &[PathBuf], ctx: &StageContext<'_>) -> String {
    let root = ctx.subject_dir();
    let mut rel: Vec<String> = artifacts.iter()
                                        .map(|p| p.strip_prefix(&root).unwrap_or(p).display().to_string())
                                        .collect();
    rel.sort();
    hash_value(&json!({
        "definition": stage.definition_hash(),
        "artifacts": rel,
    }))
}
