//! Frontera con los procesos externos.
//!
//! El ejecutor y las etapas sólo conocen `ProcessRunner`; en los tests se
//! sustituye por un runner guionado que no lanza nada.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;

use log::{info, warn};

use crate::environ::EnvironmentSnapshot;

/// Código de salida de un proceso. `None` si terminó por señal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn ok() -> Self {
        Self { code: Some(0) }
    }

    pub fn code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

pub trait ProcessRunner {
    /// Corre `argv` hasta que termina. Un `Err` significa que el proceso no
    /// pudo lanzarse.
    fn run(&self, argv: &[String], env: &EnvironmentSnapshot) -> io::Result<ProcessExit>;
}

/// Runner real: lanza el programa, reenvía stdout/stderr línea a línea al
/// log (target = nombre del programa) y opcionalmente a un archivo.
#[derive(Debug, Default)]
pub struct SystemProcessRunner {
    log_file: Option<PathBuf>,
}

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anexa la salida de cada proceso a `path`.
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, argv: &[String], env: &EnvironmentSnapshot) -> io::Result<ProcessExit> {
        let (program, args) = argv.split_first()
                                  .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty argv"))?;
        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        if !env.is_empty() {
            cmd.env_clear().envs(env.iter());
        }

        let sink = match &self.log_file {
            Some(path) => Some(Mutex::new(File::options().create(true).append(true).open(path)?)),
            None => None,
        };

        let mut child = cmd.spawn()?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let target = program_name(program);

        std::thread::scope(|s| {
            if let Some(out) = stdout {
                s.spawn(|| forward_lines(out, &target, false, sink.as_ref()));
            }
            if let Some(err) = stderr {
                s.spawn(|| forward_lines(err, &target, true, sink.as_ref()));
            }
        });

        let status = child.wait()?;
        Ok(ProcessExit { code: status.code() })
    }
}

fn program_name(program: &str) -> String {
    Path::new(program).file_name()
                      .map(|n| n.to_string_lossy().into_owned())
                      .unwrap_or_else(|| program.to_string())
}

/// Lee hasta EOF aunque falle el log o el archivo: si el pipe se cerrara
/// antes, el hijo moriría por SIGPIPE. Los bytes no UTF-8 se reemplazan.
fn forward_lines<R: Read>(reader: R, target: &str, is_stderr: bool, sink: Option<&Mutex<File>>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut sink_failed = false;
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(target: target, "output stream closed: {e}");
                break;
            }
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if is_stderr {
            warn!(target: target, "{line}");
        } else {
            info!(target: target, "{line}");
        }
        if let (Some(sink), false) = (sink, sink_failed) {
            let written = match sink.lock() {
                Ok(mut f) => writeln!(f, "{line}"),
                Err(_) => Err(io::Error::other("log file lock poisoned")),
            };
            if let Err(e) = written {
                warn!(target: target, "could not write to the run log, further output is only logged: {e}");
                sink_failed = true;
            }
        }
    }
}
