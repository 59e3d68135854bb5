use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use log::{debug, info};
use recon_core::constants::ARCHIVE_PREFIX;
use recon_core::hashing::hash_value;
use recon_core::{ReconError, SubjectId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Archivo escrito y su membresía.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    /// Entradas en orden, con `/` como separador y prefijo del sujeto.
    pub entries: Vec<String>,
    /// Hash de `entries`; igual para árboles con la misma membresía.
    pub digest: String,
}

/// `<prefijo>_<sujeto>_<run_id>.zip`
pub fn archive_name(subject: &SubjectId, run_id: Uuid) -> String {
    format!("{ARCHIVE_PREFIX}_{subject}_{run_id}.zip")
}

fn packaging(context: &str, err: impl std::fmt::Display) -> ReconError {
    ReconError::Packaging(format!("{context}: {err}"))
}

/// Comprime `<subjects_dir>/<subject>` completo en `target`.
pub fn archive_subject(subjects_dir: &Path, subject: &SubjectId, target: &Path) -> Result<ArchiveSummary, ReconError> {
    let root = subjects_dir.join(subject.as_str());
    if !root.is_dir() {
        return Err(ReconError::Packaging(format!("subject tree {} does not exist", root.display())));
    }
    let label = target.display().to_string();
    let fail = |e: &dyn std::fmt::Display| packaging(&label, e);

    let file = File::create(target).map_err(|e| fail(&e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
                                              .large_file(true);
    let mut entries = Vec::new();

    for entry in WalkDir::new(&root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| fail(&e))?;
        let rel = entry.path().strip_prefix(subjects_dir).map_err(|e| fail(&e))?;
        let mut name = rel.components()
                          .map(|c| c.as_os_str().to_string_lossy().into_owned())
                          .collect::<Vec<_>>()
                          .join("/");
        if entry.file_type().is_dir() {
            name.push('/');
            zip.add_directory(name.as_str(), options).map_err(|e| fail(&e))?;
        } else {
            zip.start_file(name.as_str(), options).map_err(|e| fail(&e))?;
            let mut src = File::open(entry.path()).map_err(|e| fail(&e))?;
            io::copy(&mut src, &mut zip).map_err(|e| fail(&e))?;
        }
        debug!("archived {name}");
        entries.push(name);
    }
    zip.finish().map_err(|e| fail(&e))?;

    let digest = membership_digest(&entries);
    info!("wrote {} ({} entries, membership {digest})", target.display(), entries.len());
    Ok(ArchiveSummary { path: target.to_path_buf(),
                        entries,
                        digest })
}

/// Nombres de las entradas de un zip existente, en orden de archivo.
pub fn membership(path: &Path) -> Result<Vec<String>, ReconError> {
    let label = path.display().to_string();
    let fail = |e: &dyn std::fmt::Display| packaging(&label, e);
    let archive = ZipArchive::new(File::open(path).map_err(|e| fail(&e))?).map_err(|e| fail(&e))?;
    Ok(archive.file_names().map(str::to_string).collect())
}

pub fn membership_digest(entries: &[String]) -> String {
    let mut sorted = entries.to_vec();
    sorted.sort();
    hash_value(&json!({ "entries": sorted }))
}
