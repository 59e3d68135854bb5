//! Semilla del árbol del sujeto desde el archivo de una corrida previa.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use log::{info, warn};
use recon_core::{ReconError, SubjectId};
use zip::ZipArchive;

/// Extrae `archive` en `subjects_dir` y devuelve el sujeto.
///
/// El archivo debe tener un único directorio de primer nivel, que es el
/// sujeto; se valida antes de extraer nada. Si el archivo está vacío se usa
/// `configured`. En ambos casos el árbol `<subjects_dir>/<sujeto>` debe
/// existir tras la extracción.
pub fn extract_prior_run(archive: &Path, subjects_dir: &Path, configured: Option<&SubjectId>)
                         -> Result<SubjectId, ReconError> {
    let unavailable = |reason: String| ReconError::PriorRunUnavailable(format!("{}: {reason}", archive.display()));

    let file = File::open(archive).map_err(|e| unavailable(e.to_string()))?;
    let mut zip = ZipArchive::new(file).map_err(|e| unavailable(e.to_string()))?;

    let tops: BTreeSet<&str> = zip.file_names()
                                  .filter_map(|name| name.split('/').next())
                                  .filter(|top| !top.is_empty())
                                  .collect();
    if tops.len() > 1 {
        let names: Vec<&str> = tops.into_iter().collect();
        return Err(unavailable(format!("expected a single subject directory, found {}", names.join(", "))));
    }
    let from_archive = tops.into_iter().next().map(str::to_string);

    std::fs::create_dir_all(subjects_dir).map_err(|e| unavailable(e.to_string()))?;
    zip.extract(subjects_dir).map_err(|e| unavailable(e.to_string()))?;

    let subject = match (from_archive, configured) {
        (Some(name), configured) => {
            let id = SubjectId::sanitize(&name)?;
            if let Some(cfg) = configured.filter(|c| *c != &id) {
                warn!("configured subject `{cfg}` differs from archived subject `{id}`; using the archived one");
            }
            id
        }
        (None, Some(cfg)) => cfg.clone(),
        (None, None) => return Err(unavailable("archive is empty and no subject_id was configured".into())),
    };

    if !subjects_dir.join(subject.as_str()).is_dir() {
        return Err(unavailable(format!("no `{subject}` directory after extraction")));
    }
    info!("extracted prior run of `{subject}` into {}", subjects_dir.display());
    Ok(subject)
}
