//! Conversión nativa de `stats/*.stats` a tablas CSV + metadata.

use std::path::PathBuf;

use log::debug;
use recon_core::{StageContext, StageDefinition, StageError, StageKind, StageRunResult};

use super::{emit_tables, file_label, read_text};
use crate::tables::{aparc_table, aseg_table, AparcMeasure, AsegMeasure, StatsFile, Table};

pub const HEMISPHERES: [&str; 2] = ["lh", "rh"];
pub const PARCELLATIONS: [&str; 2] = ["aparc", "aparc.a2009s"];

#[derive(Debug, Default, Clone, Copy)]
pub struct ConvertStatsStage;

impl ConvertStatsStage {
    fn aseg_path(ctx: &StageContext<'_>) -> PathBuf {
        ctx.subject_path("stats/aseg.stats")
    }

    fn aparc_path(ctx: &StageContext<'_>, hemi: &str, parc: &str) -> PathBuf {
        ctx.subject_path(&format!("stats/{hemi}.{parc}.stats"))
    }

    fn tables(&self, ctx: &StageContext<'_>) -> Result<Vec<Table>, StageError> {
        let mut tables = Vec::new();

        let aseg_path = Self::aseg_path(ctx);
        let aseg = StatsFile::parse(&file_label(&aseg_path), &read_text(&aseg_path)?)?;
        for measure in AsegMeasure::ALL {
            tables.push(aseg_table(&aseg, measure)?);
        }

        for hemi in HEMISPHERES {
            for parc in PARCELLATIONS {
                let path = Self::aparc_path(ctx, hemi, parc);
                let stats = StatsFile::parse(&file_label(&path), &read_text(&path)?)?;
                for measure in AparcMeasure::ALL {
                    tables.push(aparc_table(&stats, hemi, parc, measure)?);
                }
            }
        }
        debug!("parsed {} stats tables", tables.len());
        Ok(tables)
    }
}

impl StageDefinition for ConvertStatsStage {
    fn kind(&self) -> StageKind {
        StageKind::ConvertStats
    }

    fn prerequisites(&self, ctx: &StageContext<'_>) -> Vec<PathBuf> {
        let mut files = vec![Self::aseg_path(ctx)];
        for hemi in HEMISPHERES {
            for parc in PARCELLATIONS {
                files.push(Self::aparc_path(ctx, hemi, parc));
            }
        }
        files
    }

    fn run(&self, ctx: &StageContext<'_>) -> StageRunResult {
        match self.tables(ctx).and_then(|t| emit_tables(ctx, self.kind(), &t)) {
            Ok((artifacts, metadata)) => StageRunResult::Success { artifacts, metadata },
            Err(error) => StageRunResult::Failure { error },
        }
    }
}
