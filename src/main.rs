use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use recon_core::{manifest_defaults, ConfigResolver, EnvironmentSnapshot, InMemoryEventStore, SystemProcessRunner};
use reconflow::errors::AppError;
use reconflow::job::JobFile;
use reconflow::settings::SETTINGS;
use reconflow::{Orchestrator, RunLayout};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reconflow", version, about = "Structural reconstruction and post-processing orchestrator")]
struct Cli {
    /// config.json del job (default: <base>/config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directorio de salida (archivo, metadata, journal)
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Raíz SUBJECTS_DIR (default: la del snapshot de entorno)
    #[arg(long)]
    subjects_dir: Option<PathBuf>,
    /// Snapshot JSON del entorno; si no existe se usa el del proceso
    #[arg(long)]
    environ: Option<PathBuf>,
    /// Sobrescribe `gear-log-level` (debug, info, warn)
    #[arg(long)]
    log_level: Option<String>,
}

fn init_logging(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn run(cli: Cli) -> Result<i32, AppError> {
    let config_path = cli.config.unwrap_or_else(|| SETTINGS.config_file.clone());
    let job = JobFile::load(&config_path)?;
    let resolver = ConfigResolver::new(manifest_defaults());

    // El nivel de log sale de la propia config; si no resuelve, se loguea a
    // info y se reporta el error.
    let resolved = job.resolve(&resolver);
    let level = match (&cli.log_level, &resolved) {
        (Some(level), _) => level.clone(),
        (None, Ok((config, _))) => config.log_level.directive().to_string(),
        (None, Err(_)) => "info".to_string(),
    };
    init_logging(&level);
    let (config, inputs) = resolved?;
    info!("host has {} cpus, using {}", resolver.host_cpus(), config.cpu_count);

    let environ_file = cli.environ.unwrap_or_else(|| SETTINGS.environ_file.clone());
    let environ = if environ_file.is_file() {
        EnvironmentSnapshot::from_json_file(&environ_file)?
    } else {
        info!("no environment snapshot at {}, using the process environment", environ_file.display());
        EnvironmentSnapshot::from_process()
    };

    let subjects_dir = cli.subjects_dir
                          .or_else(|| SETTINGS.subjects_dir.clone())
                          .unwrap_or_else(|| environ.subjects_dir());
    let layout = RunLayout::new(subjects_dir, cli.output_dir.unwrap_or_else(|| SETTINGS.output_dir.clone()));
    std::fs::create_dir_all(&layout.output_dir).map_err(recon_core::ReconError::from)?;

    let log_path = layout.output_dir.join("recon-all.log");
    let runner = SystemProcessRunner::new().with_log_file(&log_path);
    let pipeline = recon_adapters::standard_pipeline()?;

    let report = Orchestrator::new(&config, &inputs, &layout, &runner, &pipeline, InMemoryEventStore::default())
        .with_environ(environ)
        .with_log_path(log_path)
        .run();
    if let Ok(json) = serde_json::to_string(&report) {
        log::debug!("run report: {json}");
    }
    Ok(report.exit_code())
}

fn main() -> ExitCode {
    // Carga `.env` antes de leer cualquier variable.
    once_cell::sync::Lazy::force(&SETTINGS);
    let cli = Cli::parse();
    match run(cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            // El logger puede no estar inicializado si falló la lectura del
            // config.json.
            error!("{e}");
            eprintln!("reconflow: {e}");
            ExitCode::FAILURE
        }
    }
}
