//! Pipeline estándar: todas las etapas conocidas, cada una con su gate.

use recon_core::{PostProcessingPipeline, ReconError};

use crate::stages::{ConvertStatsStage, ConvertSurfacesStage, ConvertVolumesStage, RegisterSurfacesStage,
                    SegmentationStage};

pub fn standard_pipeline() -> Result<PostProcessingPipeline, ReconError> {
    let mut builder = PostProcessingPipeline::builder();
    for seg in SegmentationStage::all() {
        builder = builder.add_stage(*seg);
    }
    builder.add_stage(RegisterSurfacesStage)
           .add_stage(ConvertSurfacesStage::default())
           .add_stage(ConvertVolumesStage)
           .add_stage(ConvertStatsStage)
           .build()
}

#[cfg(test)]
mod tests {
    use recon_core::StageKind;

    use super::*;

    #[test]
    fn registers_every_kind_once_in_declared_order() {
        let pipeline = standard_pipeline().unwrap();
        assert_eq!(pipeline.kinds(), StageKind::ORDERED.to_vec());
    }
}
