//! `mri/*.mgz` -> NIfTI (`mri_convert`).
//!
//! Además de la lista fija se convierten las etiquetas de cada segmentación
//! habilitada; si la segmentación no las produjo, la etapa falla por
//! prerrequisito.

use std::path::PathBuf;

use recon_core::{StageContext, StageDefinition, StageError, StageKind, StageRunResult};

use super::SegmentationStage;

pub const VOLUMES: [&str; 9] = ["aparc+aseg.mgz",
                                "aparc.a2009s+aseg.mgz",
                                "brainmask.mgz",
                                "lh.ribbon.mgz",
                                "rh.ribbon.mgz",
                                "ribbon.mgz",
                                "aseg.mgz",
                                "orig.mgz",
                                "T1.mgz"];

#[derive(Debug, Default, Clone, Copy)]
pub struct ConvertVolumesStage;

impl ConvertVolumesStage {
    /// Volúmenes a convertir para esta corrida, en orden.
    pub fn volumes(ctx: &StageContext<'_>) -> Vec<&'static str> {
        let mut list = VOLUMES.to_vec();
        for kind in StageKind::ORDERED.into_iter().filter(|k| k.is_segmentation() && ctx.is_enabled(*k)) {
            if let Some(seg) = SegmentationStage::for_kind(kind) {
                list.extend_from_slice(seg.labels);
            }
        }
        list
    }

    fn convert(&self, ctx: &StageContext<'_>) -> Result<Vec<PathBuf>, StageError> {
        let dir = ctx.ensure_derived_dir(self.kind())?;
        let mut artifacts = Vec::new();
        for name in Self::volumes(ctx) {
            let target = dir.join(nifti_name(name));
            ctx.invoke(&[
                "mri_convert".to_string(),
                "-i".to_string(),
                ctx.subject_path(&format!("mri/{name}")).display().to_string(),
                "-o".to_string(),
                target.display().to_string(),
            ])?;
            artifacts.push(target);
        }
        Ok(artifacts)
    }
}

fn nifti_name(mgz: &str) -> String {
    format!("{}.nii.gz", mgz.strip_suffix(".mgz").unwrap_or(mgz))
}

impl StageDefinition for ConvertVolumesStage {
    fn kind(&self) -> StageKind {
        StageKind::ConvertVolumes
    }

    fn prerequisites(&self, ctx: &StageContext<'_>) -> Vec<PathBuf> {
        Self::volumes(ctx).into_iter().map(|v| ctx.subject_path(&format!("mri/{v}"))).collect()
    }

    fn run(&self, ctx: &StageContext<'_>) -> StageRunResult {
        self.convert(ctx).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nifti_names() {
        assert_eq!(nifti_name("aparc+aseg.mgz"), "aparc+aseg.nii.gz");
        assert_eq!(nifti_name("brainstemSsLabels.v12.FSvoxelSpace.mgz"),
                   "brainstemSsLabels.v12.FSvoxelSpace.nii.gz");
    }
}
