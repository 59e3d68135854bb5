//! Segmentaciones especializadas.
//!
//! Todas siguen la misma forma: correr la herramienta contra la
//! reconstrucción completa, leer las tablas de volúmenes que deja en `mri/`,
//! escribirlas como CSV y plegarlas en la metadata con el nombre del archivo
//! (sin extensión) como clave. Por eso se describen como datos y no como un
//! tipo por etapa.

use std::path::PathBuf;

use log::info;
use recon_core::{StageContext, StageDefinition, StageError, StageKind, StageRunResult};

use super::{emit_tables, file_label, read_text};
use crate::tables::{parse_volume_pairs, parse_wide_csv, seg_volume_table, StatsFile, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// `<estructura> <volumen>` por línea.
    VolumePairs,
    /// Encabezado + una fila, primera columna = sujeto.
    WideCsv,
    /// `.stats` de `mri_segstats`; la tabla lleva el nombre indicado.
    SegStats { stem: &'static str },
}

/// Tabla que deja la herramienta, relativa al árbol del sujeto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSource {
    pub file: &'static str,
    pub format: TableFormat,
}

impl TableSource {
    const fn pairs(file: &'static str) -> Self {
        Self { file,
               format: TableFormat::VolumePairs }
    }

    const fn csv(file: &'static str) -> Self {
        Self { file,
               format: TableFormat::WideCsv }
    }

    const fn seg_stats(file: &'static str, stem: &'static str) -> Self {
        Self { file,
               format: TableFormat::SegStats { stem } }
    }

    /// Nombre de la tabla: el fijado por el formato o, si no, el del archivo
    /// sin su última extensión.
    pub fn stem(&self) -> &'static str {
        if let TableFormat::SegStats { stem } = self.format {
            return stem;
        }
        let name = self.file.rsplit('/').next().unwrap_or(self.file);
        name.rsplit_once('.').map_or(name, |(stem, _)| stem)
    }

    fn parse(&self, path: &std::path::Path) -> Result<Table, StageError> {
        let text = read_text(path)?;
        let label = file_label(path);
        let table = match self.format {
            TableFormat::VolumePairs => parse_volume_pairs(&label, self.stem(), &text)?,
            TableFormat::WideCsv => parse_wide_csv(&label, self.stem(), &text)?,
            TableFormat::SegStats { stem } => seg_volume_table(&StatsFile::parse(&label, &text)?, stem)?,
        };
        Ok(table)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationStage {
    pub kind: StageKind,
    pub tool: &'static str,
    /// Flag previo al sujeto (`--s`); `None` si va posicional.
    pub subject_flag: Option<&'static str>,
    pub prerequisites: &'static [&'static str],
    pub tables: &'static [TableSource],
    /// Volúmenes de etiquetas en `mri/` que consume la conversión de
    /// volúmenes.
    pub labels: &'static [&'static str],
}

static SEGMENTATIONS: [SegmentationStage; 5] = [
    SegmentationStage { kind: StageKind::HippocampalSubfields,
                        tool: "segmentHA_T1.sh",
                        subject_flag: None,
                        prerequisites: &["mri/norm.mgz", "mri/aseg.mgz"],
                        tables: &[TableSource::pairs("mri/lh.hippoSfVolumes-T1.v21.txt"),
                                  TableSource::pairs("mri/rh.hippoSfVolumes-T1.v21.txt"),
                                  TableSource::pairs("mri/lh.amygNucVolumes-T1.v21.txt"),
                                  TableSource::pairs("mri/rh.amygNucVolumes-T1.v21.txt")],
                        labels: &["lh.hippoAmygLabels-T1.v21.FSvoxelSpace.mgz",
                                  "rh.hippoAmygLabels-T1.v21.FSvoxelSpace.mgz"] },
    SegmentationStage { kind: StageKind::BrainstemStructures,
                        tool: "segmentBS.sh",
                        subject_flag: None,
                        prerequisites: &["mri/norm.mgz", "mri/aseg.mgz"],
                        tables: &[TableSource::pairs("mri/brainstemSsVolumes.v12.txt")],
                        labels: &["brainstemSsLabels.v12.FSvoxelSpace.mgz"] },
    SegmentationStage { kind: StageKind::ThalamicNuclei,
                        tool: "segmentThalamicNuclei.sh",
                        subject_flag: None,
                        prerequisites: &["mri/norm.mgz", "mri/aseg.mgz"],
                        tables: &[TableSource::pairs("mri/ThalamicNuclei.v12.T1.volumes.txt")],
                        labels: &["ThalamicNuclei.v12.T1.FSvoxelSpace.mgz"] },
    SegmentationStage { kind: StageKind::HypothalamicSubunits,
                        tool: "mri_segment_hypothalamic_subunits",
                        subject_flag: Some("--s"),
                        prerequisites: &["mri/norm.mgz"],
                        tables: &[TableSource::csv("mri/hypothalamic_subunits_volumes.v1.csv")],
                        labels: &["hypothalamic_subunits_seg.v1.mgz"] },
    SegmentationStage { kind: StageKind::Gtmseg,
                        tool: "gtmseg",
                        subject_flag: Some("--s"),
                        prerequisites: &["mri/aparc+aseg.mgz"],
                        tables: &[TableSource::seg_stats("stats/gtmseg.stats", "gtmseg_stats_vol_mm3")],
                        labels: &["gtmseg.mgz"] },
];

impl SegmentationStage {
    pub fn all() -> &'static [SegmentationStage] {
        &SEGMENTATIONS
    }

    pub fn for_kind(kind: StageKind) -> Option<&'static SegmentationStage> {
        SEGMENTATIONS.iter().find(|s| s.kind == kind)
    }

    pub fn argv(&self, ctx: &StageContext<'_>) -> Vec<String> {
        let mut argv = vec![self.tool.to_string()];
        if let Some(flag) = self.subject_flag {
            argv.push(flag.to_string());
        }
        argv.push(ctx.subject.as_str().to_string());
        argv
    }

    fn segment(&self, ctx: &StageContext<'_>) -> Result<StageRunResult, StageError> {
        info!("starting {} segmentation", self.kind);
        ctx.invoke(&self.argv(ctx))?;

        let tables = self.tables
                         .iter()
                         .map(|src| src.parse(&ctx.subject_path(src.file)))
                         .collect::<Result<Vec<_>, _>>()?;
        let (mut artifacts, metadata) = emit_tables(ctx, self.kind, &tables)?;
        artifacts.extend(self.labels.iter().map(|l| ctx.subject_path(&format!("mri/{l}"))).filter(|p| p.exists()));
        Ok(StageRunResult::Success { artifacts, metadata })
    }
}

impl StageDefinition for SegmentationStage {
    fn kind(&self) -> StageKind {
        self.kind
    }

    fn prerequisites(&self, ctx: &StageContext<'_>) -> Vec<PathBuf> {
        self.prerequisites.iter().map(|p| ctx.subject_path(p)).collect()
    }

    fn run(&self, ctx: &StageContext<'_>) -> StageRunResult {
        self.segment(ctx).unwrap_or_else(|error| StageRunResult::Failure { error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_segmentation_kind_has_a_definition() {
        for kind in StageKind::ORDERED.into_iter().filter(|k| k.is_segmentation()) {
            assert_eq!(SegmentationStage::for_kind(kind).map(|s| s.kind), Some(kind));
        }
        assert!(SegmentationStage::for_kind(StageKind::ConvertStats).is_none());
    }

    #[test]
    fn table_stem_drops_directory_and_extension() {
        assert_eq!(TableSource::pairs("mri/ThalamicNuclei.v12.T1.volumes.txt").stem(),
                   "ThalamicNuclei.v12.T1.volumes");
        assert_eq!(TableSource::csv("mri/hypothalamic_subunits_volumes.v1.csv").stem(),
                   "hypothalamic_subunits_volumes.v1");
        assert_eq!(TableSource::seg_stats("stats/gtmseg.stats", "gtmseg_stats_vol_mm3").stem(),
                   "gtmseg_stats_vol_mm3");
    }
}
