//! Registro inter-hemisférico contra `fsaverage_sym`.

use std::path::PathBuf;

use recon_core::{StageContext, StageDefinition, StageError, StageKind, StageRunResult};

const TARGET: &str = "fsaverage_sym";

#[derive(Debug, Default, Clone, Copy)]
pub struct RegisterSurfacesStage;

impl RegisterSurfacesStage {
    pub fn commands(ctx: &StageContext<'_>) -> Vec<Vec<String>> {
        let subject = ctx.subject.as_str();
        let cmd = |parts: &[&str]| parts.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        vec![cmd(&["xhemireg", "--s", subject]),
             cmd(&["surfreg", "--s", subject, "--t", TARGET, "--lh"]),
             cmd(&["surfreg", "--s", subject, "--t", TARGET, "--lh", "--xhemi"])]
    }

    fn register(&self, ctx: &StageContext<'_>) -> Result<Vec<PathBuf>, StageError> {
        for argv in Self::commands(ctx) {
            ctx.invoke(&argv)?;
        }
        let outputs = [format!("surf/lh.{TARGET}.sphere.reg"),
                       format!("xhemi/surf/lh.{TARGET}.sphere.reg")];
        Ok(outputs.iter().map(|rel| ctx.subject_path(rel)).filter(|p| p.exists()).collect())
    }
}

impl StageDefinition for RegisterSurfacesStage {
    fn kind(&self) -> StageKind {
        StageKind::RegisterSurfaces
    }

    fn prerequisites(&self, ctx: &StageContext<'_>) -> Vec<PathBuf> {
        ["surf/lh.sphere", "surf/rh.sphere"].iter().map(|rel| ctx.subject_path(rel)).collect()
    }

    fn run(&self, ctx: &StageContext<'_>) -> StageRunResult {
        self.register(ctx).into()
    }
}
