//! Command Builder: función pura `(RunConfig, InputSet) -> argv`.
//!
//! Forma del vector:
//! `recon-all -i <T1> [-i <T1_n> ...] [-T2|-FLAIR <vol>] -subjid <id> <flags...>
//!  [-parallel -openmp <n>] [-expert <file>]`
//!
//! Los tokens de los flags pasan tal cual; si la reconstrucción no los
//! reconoce, falla ella. Tampoco se inyecta `-T2pial`/`-FLAIRpial` cuando hay
//! volumen secundario: pedirlo en los flags es responsabilidad del usuario.

use serde_json::json;

use crate::config::{RunConfig, SubjectId};
use crate::constants::{EXPERT_FLAG, INPUT_FLAG, PARALLEL_FLAG, RECON_PROGRAM, SUBJECT_FLAG, THREADS_FLAG};
use crate::hashing::hash_value;
use crate::inputs::InputSet;

pub fn build_command(config: &RunConfig, subject: &SubjectId, inputs: &InputSet) -> Vec<String> {
    let mut argv = vec![RECON_PROGRAM.to_string()];

    for volume in &inputs.anatomical {
        argv.push(INPUT_FLAG.to_string());
        argv.push(volume.display().to_string());
    }

    if let Some(secondary) = &inputs.secondary {
        argv.push(secondary.contrast.flag().to_string());
        argv.push(secondary.path.display().to_string());
    }

    argv.push(SUBJECT_FLAG.to_string());
    argv.push(subject.as_str().to_string());

    argv.extend(config.flag_tokens().map(str::to_string));

    if config.parallel {
        argv.push(PARALLEL_FLAG.to_string());
        argv.push(THREADS_FLAG.to_string());
        argv.push(config.cpu_count.to_string());
    }

    if let Some(expert) = &config.expert_options {
        argv.push(EXPERT_FLAG.to_string());
        argv.push(expert.display().to_string());
    }

    argv
}

/// Verdadero si el vector pide la ejecución paralela (habilita el reintento).
pub fn uses_parallel_flag(argv: &[String]) -> bool {
    argv.iter().any(|a| a == PARALLEL_FLAG)
}

/// Fingerprint del vector de argumentos; idéntico para vectores idénticos.
pub fn command_fingerprint(argv: &[String]) -> String {
    hash_value(&json!({
        "engine_version": crate::constants::ENGINE_VERSION,
        "argv": argv,
    }))
}
