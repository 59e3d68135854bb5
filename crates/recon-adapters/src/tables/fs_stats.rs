//! Lector de archivos `*.stats` de FreeSurfer (`aseg.stats`,
//! `lh.aparc.stats`, ...).
//!
//! Formato relevante:
//! ```text
//! # Measure BrainSeg, BrainSegVol, Brain Segmentation Volume, 1143548.000000, mm^3
//! # ColHeaders  Index SegId NVoxels Volume_mm3 StructName normMean ...
//!   1   4  7453  7421.3  Left-Lateral-Ventricle  33.5 ...
//! ```

use indexmap::IndexMap;

use super::{parse_number, Table, TableError};

/// Línea `# Measure <estructura>, <nombre>, <descripción>, <valor>, <unidad>`.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalMeasure {
    pub name: String,
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsFile {
    file: String,
    pub measures: Vec<GlobalMeasure>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl StatsFile {
    /// `file` sólo se usa para los mensajes de error.
    pub fn parse(file: &str, text: &str) -> Result<Self, TableError> {
        let mut measures = Vec::new();
        let mut columns: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let lineno = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix("# Measure ") {
                let parts: Vec<&str> = rest.split(',').map(str::trim).collect();
                if parts.len() != 5 {
                    return Err(TableError::Malformed { file: file.to_string(),
                                                       line: lineno,
                                                       reason: format!("expected 5 fields in measure, found {}", parts.len()) });
                }
                measures.push(GlobalMeasure { name: parts[1].to_string(),
                                              value: parse_number(file, lineno, parts[3])?,
                                              unit: parts[4].to_string() });
            } else if let Some(rest) = trimmed.strip_prefix("# ColHeaders") {
                columns = Some(rest.split_whitespace().map(str::to_string).collect());
            } else if trimmed.starts_with('#') {
                continue;
            } else {
                let Some(cols) = &columns else {
                    return Err(TableError::MissingHeader { file: file.to_string() });
                };
                let cells: Vec<String> = trimmed.split_whitespace().map(str::to_string).collect();
                if cells.len() != cols.len() {
                    return Err(TableError::Malformed { file: file.to_string(),
                                                       line: lineno,
                                                       reason: format!("expected {} columns, found {}", cols.len(), cells.len()) });
                }
                rows.push(cells);
            }
        }

        let columns = columns.ok_or_else(|| TableError::MissingHeader { file: file.to_string() })?;
        Ok(Self { file: file.to_string(),
                  measures,
                  columns,
                  rows })
    }

    fn column(&self, name: &str) -> Result<usize, TableError> {
        self.columns.iter().position(|c| c == name).ok_or_else(|| TableError::MissingColumn { file: self.file.clone(),
                                                                                                column: name.to_string() })
    }

    /// Pares `key_col -> value_col` por fila, con el nombre de columna
    /// transformado por `rename`.
    pub fn pairs(&self, key_col: &str, value_col: &str, rename: impl Fn(&str) -> String)
                 -> Result<IndexMap<String, f64>, TableError> {
        let k = self.column(key_col)?;
        let v = self.column(value_col)?;
        let mut out = IndexMap::with_capacity(self.rows.len());
        for row in &self.rows {
            out.insert(rename(&row[k]), parse_number(&self.file, 0, &row[v])?);
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsegMeasure {
    Volume,
    MeanIntensity,
}

impl AsegMeasure {
    pub const ALL: [AsegMeasure; 2] = [AsegMeasure::Volume, AsegMeasure::MeanIntensity];

    pub fn stem(self) -> &'static str {
        match self {
            Self::Volume => "aseg_stats_vol_mm3",
            Self::MeanIntensity => "aseg_stats_intensity_mean",
        }
    }
}

/// Tabla subcortical; en volumen se agregan las medidas globales en mm^3.
pub fn aseg_table(stats: &StatsFile, measure: AsegMeasure) -> Result<Table, TableError> {
    let table = match measure {
        AsegMeasure::Volume => {
            let mut values = stats.pairs("StructName", "Volume_mm3", str::to_string)?;
            for m in stats.measures.iter().filter(|m| m.unit == "mm^3") {
                values.insert(m.name.clone(), m.value);
            }
            Table::new(measure.stem(), "Measure:volume", values)
        }
        AsegMeasure::MeanIntensity => {
            Table::new(measure.stem(), "Measure:mean", stats.pairs("StructName", "normMean", str::to_string)?)
        }
    };
    non_empty(table, &stats.file)
}

/// Volúmenes de un `.stats` de `mri_segstats` sin medidas globales (p.ej.
/// `stats/gtmseg.stats`).
pub fn seg_volume_table(stats: &StatsFile, stem: &str) -> Result<Table, TableError> {
    let values = stats.pairs("StructName", "Volume_mm3", str::to_string)?;
    non_empty(Table::new(stem, "Measure:volume", values), &stats.file)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AparcMeasure {
    Area,
    Thickness,
}

impl AparcMeasure {
    pub const ALL: [AparcMeasure; 2] = [AparcMeasure::Area, AparcMeasure::Thickness];

    fn column(self) -> &'static str {
        match self {
            Self::Area => "SurfArea",
            Self::Thickness => "ThickAvg",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::Area => "area",
            Self::Thickness => "thickness",
        }
    }

    fn unit(self) -> &'static str {
        match self {
            Self::Area => "mm^2",
            Self::Thickness => "mm",
        }
    }

    /// `lh_aparc_stats_area_mm2`, `rh_aparc.a2009s_stats_thickness_mm`.
    pub fn stem(self, hemi: &str, parc: &str) -> String {
        let unit = match self {
            Self::Area => "mm2",
            Self::Thickness => "mm",
        };
        format!("{hemi}_{parc}_stats_{}_{unit}", self.suffix())
    }
}

/// Tabla cortical por hemisferio y parcelación. Columnas
/// `<hemi>_<región>_<area|thickness>`, más las medidas globales de la misma
/// unidad.
pub fn aparc_table(stats: &StatsFile, hemi: &str, parc: &str, measure: AparcMeasure) -> Result<Table, TableError> {
    let suffix = measure.suffix();
    let mut values = stats.pairs("StructName", measure.column(), |s| format!("{hemi}_{s}_{suffix}"))?;
    for m in stats.measures.iter().filter(|m| m.unit == measure.unit()) {
        values.insert(format!("{hemi}_{}_{suffix}", m.name), m.value);
    }
    non_empty(Table::new(measure.stem(hemi, parc), format!("{hemi}.{parc}.{suffix}"), values),
              &stats.file)
}

fn non_empty(table: Table, file: &str) -> Result<Table, TableError> {
    if table.values.is_empty() {
        Err(TableError::Empty { file: file.to_string() })
    } else {
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASEG: &str = "\
# Title Segmentation Statistics
# Measure BrainSeg, BrainSegVol, Brain Segmentation Volume, 1143548.000000, mm^3
# Measure Cortex, CortexVol, Total cortical gray matter volume, 465832.5, mm^3
# Measure EstimatedTotalIntraCranialVol, eTIV, Estimated Total Intracranial Volume, 1523652.1, mm^3
# Measure BrainSegNotVent, BrainSegVolNotVent, Ratio, 0.75, unitless
# ColHeaders  Index SegId NVoxels Volume_mm3 StructName normMean normStdDev normMin normMax normRange
  1   4     7453     7421.3  Left-Lateral-Ventricle            33.5     10.2     9.0    83.0    74.0
  2   5      301      295.1  Left-Inf-Lat-Vent                 52.7     12.1    21.0    88.0    67.0
";

    const APARC: &str = "\
# Measure Cortex, NumVert, Number of Vertices, 129345, unitless
# Measure Cortex, WhiteSurfArea, White Surface Total Area, 86231.4, mm^2
# Measure Cortex, MeanThickness, Mean Thickness, 2.51, mm
# ColHeaders StructName NumVert SurfArea GrayVol ThickAvg ThickStd MeanCurv GausCurv FoldInd CurvInd
bankssts                                 1466    996   2487  2.545 0.435     0.110     0.021        9     1.3
cuneus                                   2012   1370   3010  1.964 0.416     0.141     0.031       26     2.5
";

    #[test]
    fn aseg_volume_includes_structures_then_global_volumes() {
        let stats = StatsFile::parse("aseg.stats", ASEG).unwrap();
        let t = aseg_table(&stats, AsegMeasure::Volume).unwrap();
        assert_eq!(t.stem, "aseg_stats_vol_mm3");
        let keys: Vec<&str> = t.values.keys().map(String::as_str).collect();
        assert_eq!(keys,
                   ["Left-Lateral-Ventricle", "Left-Inf-Lat-Vent", "BrainSegVol", "CortexVol", "eTIV"]);
        assert_eq!(t.values["Left-Lateral-Ventricle"], 7421.3);
    }

    #[test]
    fn aseg_intensity_uses_norm_mean() {
        let stats = StatsFile::parse("aseg.stats", ASEG).unwrap();
        let t = aseg_table(&stats, AsegMeasure::MeanIntensity).unwrap();
        assert_eq!(t.values.len(), 2);
        assert_eq!(t.values["Left-Inf-Lat-Vent"], 52.7);
    }

    #[test]
    fn aparc_columns_are_prefixed_by_hemisphere() {
        let stats = StatsFile::parse("lh.aparc.stats", APARC).unwrap();
        let area = aparc_table(&stats, "lh", "aparc", AparcMeasure::Area).unwrap();
        assert_eq!(area.stem, "lh_aparc_stats_area_mm2");
        assert_eq!(area.measure, "lh.aparc.area");
        assert_eq!(area.values["lh_cuneus_area"], 1370.0);
        assert_eq!(area.values["lh_WhiteSurfArea_area"], 86231.4);
        assert!(!area.values.contains_key("lh_MeanThickness_area"));

        let thick = aparc_table(&stats, "lh", "aparc", AparcMeasure::Thickness).unwrap();
        assert_eq!(thick.stem, "lh_aparc_stats_thickness_mm");
        assert_eq!(thick.values["lh_bankssts_thickness"], 2.545);
        assert_eq!(thick.values["lh_MeanThickness_thickness"], 2.51);
    }

    #[test]
    fn rows_before_header_are_rejected() {
        let err = StatsFile::parse("aseg.stats", "1 2 3\n").unwrap_err();
        assert_eq!(err, TableError::MissingHeader { file: "aseg.stats".into() });
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let text = "# ColHeaders StructName SurfArea\ncuneus 1370 extra\n";
        let err = StatsFile::parse("lh.aparc.stats", text).unwrap_err();
        assert!(matches!(err, TableError::Malformed { line: 2, .. }));
    }

    #[test]
    fn missing_column_is_reported() {
        let stats = StatsFile::parse("lh.aparc.stats", "# ColHeaders StructName NumVert\ncuneus 10\n").unwrap();
        let err = aparc_table(&stats, "lh", "aparc", AparcMeasure::Area).unwrap_err();
        assert_eq!(err,
                   TableError::MissingColumn { file: "lh.aparc.stats".into(),
                                               column: "SurfArea".into() });
    }
}
