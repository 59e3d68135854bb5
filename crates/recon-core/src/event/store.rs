use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use super::{RunEvent, RunEventKind};

/// Almacenamiento de eventos append-only.
pub trait EventStore {
    /// Agrega un evento a partir de su kind y devuelve el evento completo
    /// (con seq y ts).
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent;
    /// Eventos de una corrida, en orden ascendente de seq.
    fn list(&self, run_id: Uuid) -> Vec<RunEvent>;
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    inner: HashMap<Uuid, Vec<RunEvent>>,
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent {
        let events = self.inner.entry(run_id).or_default();
        let ev = RunEvent { seq: events.len() as u64,
                            run_id,
                            kind,
                            ts: Utc::now() };
        events.push(ev.clone());
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.inner.get(&run_id).cloned().unwrap_or_default()
    }
}

/// Escribe los eventos como JSON lines (uno por línea).
pub fn write_jsonl(path: &Path, events: &[RunEvent]) -> std::io::Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    for ev in events {
        serde_json::to_writer(&mut file, ev)?;
        file.write_all(b"\n")?;
    }
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::StageKind;

    #[test]
    fn seq_is_per_run_and_ordered() {
        let mut store = InMemoryEventStore::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.append_kind(a, RunEventKind::StageStarted { stage: StageKind::ConvertStats });
        store.append_kind(b, RunEventKind::StageStarted { stage: StageKind::ConvertVolumes });
        let ev = store.append_kind(a, RunEventKind::ExecutionSkipped { reason: "dry run".into() });
        assert_eq!(ev.seq, 1);
        assert_eq!(store.list(a).len(), 2);
        assert_eq!(store.list(b)[0].seq, 0);
        assert!(store.list(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn jsonl_has_one_tagged_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let mut store = InMemoryEventStore::default();
        let run = Uuid::new_v4();
        store.append_kind(run, RunEventKind::StageStarted { stage: StageKind::ConvertStats });
        store.append_kind(run, RunEventKind::RunCompleted { exit_code: 0, error: None });
        write_jsonl(&path, &store.list(run)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "stage_started");
        assert_eq!(first["stage"], "convert_stats");
        let back: RunEvent = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(back.kind, RunEventKind::RunCompleted { exit_code: 0, error: None });
    }
}
