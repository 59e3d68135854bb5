use std::path::{Path, PathBuf};

use recon_core::event::{EventStore, InMemoryEventStore, RunEventKind};
use recon_core::testing::ScriptedRunner;
use recon_core::{manifest_defaults, ConfigResolver, EnvironmentSnapshot, PostProcessingPipeline, ReconError,
                 RunConfig, SkipReason, StageContext, StageDefinition, StageError, StageKind, StageRunResult,
                 StageStatus, SubjectId};
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Etapa de prueba: exige `needs` dentro del árbol del sujeto y escribe
/// `writes` en su directorio de derivados.
struct FakeStage {
    kind: StageKind,
    needs: Vec<&'static str>,
    writes: &'static str,
    fail: bool,
}

impl FakeStage {
    fn new(kind: StageKind) -> Self {
        Self { kind,
               needs: vec![],
               writes: "out.txt",
               fail: false }
    }

    fn needs(mut self, rel: &'static str) -> Self {
        self.needs.push(rel);
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl StageDefinition for FakeStage {
    fn kind(&self) -> StageKind {
        self.kind
    }

    fn prerequisites(&self, ctx: &StageContext<'_>) -> Vec<PathBuf> {
        self.needs.iter().map(|rel| ctx.subject_path(rel)).collect()
    }

    fn run(&self, ctx: &StageContext<'_>) -> StageRunResult {
        if self.fail {
            return StageRunResult::Failure { error: StageError::Conversion("boom".into()) };
        }
        let res = ctx.ensure_derived_dir(self.kind).and_then(|dir| {
                                                        let path = dir.join(self.writes);
                                                        std::fs::write(&path, self.kind.name())?;
                                                        Ok(vec![path])
                                                    });
        match res {
            Ok(artifacts) => {
                let mut metadata = recon_core::RunMetadata::new();
                metadata.insert(format!("{}.ran", self.kind.name()), json!(true));
                StageRunResult::Success { artifacts, metadata }
            }
            Err(error) => StageRunResult::Failure { error },
        }
    }
}

fn config(raw: Value) -> RunConfig {
    let map: Map<String, Value> = match raw {
        Value::Object(m) => m,
        _ => panic!("object expected"),
    };
    ConfigResolver::new(manifest_defaults()).with_host_cpus(2).resolve(&map).unwrap()
}

struct Fixture {
    _dir: tempfile::TempDir,
    subjects_dir: PathBuf,
    subject: SubjectId,
    env: EnvironmentSnapshot,
    runner: ScriptedRunner,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let subjects_dir = dir.path().to_path_buf();
        let subject = SubjectId::sanitize("sub-01").unwrap();
        std::fs::create_dir_all(subjects_dir.join("sub-01/stats")).unwrap();
        std::fs::write(subjects_dir.join("sub-01/stats/aseg.stats"), "# aseg").unwrap();
        Self { _dir: dir,
               subjects_dir,
               subject,
               env: EnvironmentSnapshot::empty(),
               runner: ScriptedRunner::new() }
    }

    fn ctx<'a>(&'a self, config: &'a RunConfig) -> StageContext<'a> {
        StageContext { subject: &self.subject,
                       subjects_dir: &self.subjects_dir,
                       config,
                       environ: &self.env,
                       runner: &self.runner }
    }

    fn root(&self) -> &Path {
        &self.subjects_dir
    }
}

#[test]
fn stages_run_in_declared_order_regardless_of_registration() {
    let fx = Fixture::new();
    let cfg = config(json!({}));
    let pipeline = PostProcessingPipeline::builder().add_stage(FakeStage::new(StageKind::ConvertStats))
                                                    .add_stage(FakeStage::new(StageKind::ConvertSurfaces))
                                                    .add_stage(FakeStage::new(StageKind::ConvertVolumes))
                                                    .build()
                                                    .unwrap();
    assert_eq!(pipeline.kinds(),
               vec![StageKind::ConvertSurfaces, StageKind::ConvertVolumes, StageKind::ConvertStats]);

    let mut store = InMemoryEventStore::default();
    let run = Uuid::new_v4();
    let report = pipeline.run(&fx.ctx(&cfg), &mut store, run);
    assert!(report.results.iter().all(|r| r.status() == StageStatus::Succeeded));
    assert_eq!(report.metadata.keys().collect::<Vec<_>>(),
               vec!["convert_surfaces.ran", "convert_volumes.ran", "convert_stats.ran"]);
    assert!(fx.root().join("sub-01/derived/convert_stats/out.txt").exists());

    let started: Vec<StageKind> = store.list(run)
                                       .into_iter()
                                       .filter_map(|e| match e.kind {
                                           RunEventKind::StageStarted { stage } => Some(stage),
                                           _ => None,
                                       })
                                       .collect();
    assert_eq!(started, pipeline.kinds());
}

#[test]
fn disabled_stage_is_recorded_as_not_attempted() {
    let fx = Fixture::new();
    // Y (stats) habilitada, X (superficies) apagada; X va antes en el orden.
    let cfg = config(json!({"gear-convert_surfaces": false, "gear-convert_volumes": false}));
    let pipeline = PostProcessingPipeline::builder().add_stage(FakeStage::new(StageKind::ConvertSurfaces))
                                                    .add_stage(FakeStage::new(StageKind::ConvertStats))
                                                    .build()
                                                    .unwrap();
    let report = pipeline.run(&fx.ctx(&cfg), &mut InMemoryEventStore::default(), Uuid::new_v4());

    let x = report.result(StageKind::ConvertSurfaces).unwrap();
    assert!(!x.attempted);
    assert_eq!(x.skip_reason, Some(SkipReason::Disabled));
    let y = report.result(StageKind::ConvertStats).unwrap();
    assert!(y.attempted && y.succeeded);
    assert!(!fx.root().join("sub-01/derived/convert_surfaces").exists());
}

#[test]
fn missing_prerequisite_fails_only_that_stage() {
    let fx = Fixture::new();
    let cfg = config(json!({}));
    let pipeline = PostProcessingPipeline::builder().add_stage(FakeStage::new(StageKind::ConvertSurfaces).needs("surf/lh.pial"))
                                                    .add_stage(FakeStage::new(StageKind::ConvertStats).needs("stats/aseg.stats"))
                                                    .build()
                                                    .unwrap();
    let report = pipeline.run(&fx.ctx(&cfg), &mut InMemoryEventStore::default(), Uuid::new_v4());

    let surf = report.result(StageKind::ConvertSurfaces).unwrap();
    assert_eq!(surf.status(), StageStatus::Failed);
    assert_eq!(surf.error,
               Some(StageError::MissingPrerequisite(fx.root().join("sub-01/surf/lh.pial"))));
    assert_eq!(report.result(StageKind::ConvertStats).unwrap().status(), StageStatus::Succeeded);
    assert_eq!(report.failures().count(), 1);
    assert!(report.required_failure().is_none());
}

#[test]
fn structural_dependency_on_disabled_stage_is_a_prerequisite_error() {
    let fx = Fixture::new();
    let cfg = config(json!({"gear-gtmseg": false}));
    let pipeline =
        PostProcessingPipeline::builder().add_stage(FakeStage::new(StageKind::Gtmseg))
                                         .add_stage(FakeStage::new(StageKind::ConvertVolumes).needs("derived/gtmseg/out.txt"))
                                         .build()
                                         .unwrap();
    let report = pipeline.run(&fx.ctx(&cfg), &mut InMemoryEventStore::default(), Uuid::new_v4());
    assert!(!report.result(StageKind::Gtmseg).unwrap().attempted);
    assert!(matches!(report.result(StageKind::ConvertVolumes).unwrap().error,
                     Some(StageError::MissingPrerequisite(_))));
}

#[test]
fn abort_policy_skips_the_rest() {
    let fx = Fixture::new();
    let cfg = config(json!({"gear-abort-on-stage-failure": true}));
    let pipeline = PostProcessingPipeline::builder().add_stage(FakeStage::new(StageKind::ConvertSurfaces).failing())
                                                    .add_stage(FakeStage::new(StageKind::ConvertVolumes))
                                                    .add_stage(FakeStage::new(StageKind::ConvertStats))
                                                    .build()
                                                    .unwrap();
    let mut store = InMemoryEventStore::default();
    let run = Uuid::new_v4();
    let report = pipeline.run(&fx.ctx(&cfg), &mut store, run);

    assert_eq!(report.results.len(), 3);
    for kind in [StageKind::ConvertVolumes, StageKind::ConvertStats] {
        let r = report.result(kind).unwrap();
        assert!(!r.attempted);
        assert_eq!(r.skip_reason, Some(SkipReason::Aborted { after: StageKind::ConvertSurfaces }));
    }
    let failed = store.list(run).iter().filter(|e| matches!(e.kind, RunEventKind::StageFailed { .. })).count();
    assert_eq!(failed, 1);
}

#[test]
fn failure_does_not_abort_by_default() {
    let fx = Fixture::new();
    let cfg = config(json!({}));
    let pipeline = PostProcessingPipeline::builder().add_stage(FakeStage::new(StageKind::ConvertSurfaces).failing())
                                                    .add_stage(FakeStage::new(StageKind::ConvertStats))
                                                    .build()
                                                    .unwrap();
    let report = pipeline.run(&fx.ctx(&cfg), &mut InMemoryEventStore::default(), Uuid::new_v4());
    assert_eq!(report.result(StageKind::ConvertStats).unwrap().status(), StageStatus::Succeeded);
}

#[test]
fn required_stage_is_flagged() {
    let fx = Fixture::new();
    let cfg = config(json!({"gear-required-stages": "convert_stats"}));
    let pipeline = PostProcessingPipeline::builder().add_stage(FakeStage::new(StageKind::ConvertStats).failing())
                                                    .build()
                                                    .unwrap();
    let report = pipeline.run(&fx.ctx(&cfg), &mut InMemoryEventStore::default(), Uuid::new_v4());
    assert_eq!(report.required_failure().map(|r| r.stage), Some(StageKind::ConvertStats));
}

#[test]
fn dry_run_attempts_nothing() {
    let fx = Fixture::new();
    let cfg = config(json!({"gear-dry-run": true}));
    let pipeline = PostProcessingPipeline::builder().add_stage(FakeStage::new(StageKind::ConvertStats))
                                                    .add_stage(FakeStage::new(StageKind::Gtmseg))
                                                    .build()
                                                    .unwrap();
    let report = pipeline.run(&fx.ctx(&cfg), &mut InMemoryEventStore::default(), Uuid::new_v4());
    assert_eq!(report.result(StageKind::ConvertStats).unwrap().skip_reason, Some(SkipReason::DryRun));
    assert_eq!(report.result(StageKind::Gtmseg).unwrap().skip_reason, Some(SkipReason::Disabled));
    assert!(!fx.root().join("sub-01/derived").exists());
}

#[test]
fn duplicate_kinds_are_rejected() {
    let err = PostProcessingPipeline::builder().add_stage(FakeStage::new(StageKind::ConvertStats))
                                               .add_stage(FakeStage::new(StageKind::ConvertStats))
                                               .build()
                                               .err()
                                               .unwrap();
    assert!(matches!(err, ReconError::Configuration { ref key, .. } if key == "pipeline"));
}

#[test]
fn definition_hash_is_stable() {
    let a = PostProcessingPipeline::builder().add_stage(FakeStage::new(StageKind::ConvertStats)).build().unwrap();
    let b = PostProcessingPipeline::builder().add_stage(FakeStage::new(StageKind::ConvertStats)).build().unwrap();
    assert_eq!(a.definition_hash(), b.definition_hash());
    assert_eq!(a.definition_hash().len(), 64);
}
