//! Constantes del orquestador.
//!
//! Agrupa los nombres de flags de la reconstrucción externa y los valores que
//! participan en los fingerprints. `ENGINE_VERSION` forma parte de cada
//! fingerprint, de modo que un cambio de versión invalida los anteriores aunque
//! los datos no cambien.

/// Versión lógica del orquestador. Mantener estable mientras no haya cambios
/// incompatibles en el journal o en la forma del comando.
pub const ENGINE_VERSION: &str = "R1.0";

/// Binario de la reconstrucción.
pub const RECON_PROGRAM: &str = "recon-all";

pub const INPUT_FLAG: &str = "-i";
pub const SUBJECT_FLAG: &str = "-subjid";
pub const T2_FLAG: &str = "-T2";
pub const FLAIR_FLAG: &str = "-FLAIR";
/// Flag de ejecución multi-hilo, asociado al fallo no determinista conocido.
pub const PARALLEL_FLAG: &str = "-parallel";
pub const THREADS_FLAG: &str = "-openmp";
pub const EXPERT_FLAG: &str = "-expert";

/// Primer T1 más hasta cuatro T1 auxiliares.
pub const MAX_ANATOMICAL_INPUTS: usize = 5;

/// Prefijo de los archivos de salida empaquetados.
pub const ARCHIVE_PREFIX: &str = "freesurfer-recon-all";

pub const DEFAULT_SUBJECTS_DIR: &str = "/usr/local/freesurfer/subjects";

/// Subdirectorio del árbol del sujeto donde las etapas dejan sus derivados.
pub const DERIVED_DIR: &str = "derived";
