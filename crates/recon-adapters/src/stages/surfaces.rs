//! `surf/<superficie>` -> ASCII (`mris_convert`) -> OBJ.

use std::path::PathBuf;

use recon_core::{StageContext, StageDefinition, StageError, StageKind, StageRunResult};

use super::{file_label, read_text};
use crate::surface::ascii_to_obj;

pub const SURFACES: [&str; 6] = ["lh.pial", "rh.pial", "lh.white", "rh.white", "lh.inflated", "rh.inflated"];

#[derive(Debug, Clone)]
pub struct ConvertSurfacesStage {
    surfaces: Vec<String>,
}

impl Default for ConvertSurfacesStage {
    fn default() -> Self {
        Self { surfaces: SURFACES.iter().map(|s| s.to_string()).collect() }
    }
}

impl ConvertSurfacesStage {
    /// Sólo las superficies indicadas (`lh.pial`, ...).
    pub fn with_surfaces<I, S>(surfaces: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Self { surfaces: surfaces.into_iter().map(Into::into).collect() }
    }

    fn convert(&self, ctx: &StageContext<'_>) -> Result<Vec<PathBuf>, StageError> {
        let dir = ctx.ensure_derived_dir(self.kind())?;
        let mut artifacts = Vec::with_capacity(self.surfaces.len());
        for surf in &self.surfaces {
            let ascii = dir.join(format!("{surf}.asc"));
            ctx.invoke(&[
                "mris_convert".to_string(),
                ctx.subject_path(&format!("surf/{surf}")).display().to_string(),
                ascii.display().to_string(),
            ])?;
            let obj = ascii_to_obj(&file_label(&ascii), &read_text(&ascii)?)?;
            let target = dir.join(format!("{surf}.obj"));
            std::fs::write(&target, obj)?;
            std::fs::remove_file(&ascii)?;
            artifacts.push(target);
        }
        Ok(artifacts)
    }
}

impl StageDefinition for ConvertSurfacesStage {
    fn kind(&self) -> StageKind {
        StageKind::ConvertSurfaces
    }

    fn prerequisites(&self, ctx: &StageContext<'_>) -> Vec<PathBuf> {
        self.surfaces.iter().map(|s| ctx.subject_path(&format!("surf/{s}"))).collect()
    }

    fn run(&self, ctx: &StageContext<'_>) -> StageRunResult {
        self.convert(ctx).into()
    }
}
