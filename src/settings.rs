//! Rutas del job.
//! Se cargan de variables de entorno (incluido `.env`) una sola vez y la CLI
//! puede sobrescribirlas.
use std::env;
use std::path::PathBuf;

use once_cell::sync::Lazy;

/// Raíz del contenedor del job.
pub const DEFAULT_BASE_DIR: &str = "/flywheel/v0";

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_dir: PathBuf,
    /// `config.json` con las secciones `config` e `inputs`.
    pub config_file: PathBuf,
    pub output_dir: PathBuf,
    /// Snapshot del entorno guardado al construir la imagen.
    pub environ_file: PathBuf,
    /// `None` -> el del snapshot de entorno.
    pub subjects_dir: Option<PathBuf>,
}

impl Settings {
    fn from_env() -> Self {
        let base_dir = env::var("RECONFLOW_BASE_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_BASE_DIR));
        let path_or = |key: &str, default: &str| env::var(key).map(PathBuf::from).unwrap_or_else(|_| base_dir.join(default));
        Self { config_file: path_or("RECONFLOW_CONFIG", "config.json"),
               output_dir: path_or("RECONFLOW_OUTPUT_DIR", "output"),
               environ_file: path_or("RECONFLOW_ENVIRON", "gear_environ.json"),
               subjects_dir: env::var("RECONFLOW_SUBJECTS_DIR").ok().map(PathBuf::from),
               base_dir }
    }
}

/// Instancia perezosa, evaluada una sola vez.
pub static SETTINGS: Lazy<Settings> = Lazy::new(|| {
    dotenvy::dotenv().ok();
    Settings::from_env()
});
