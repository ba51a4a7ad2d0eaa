use super::{from_micros, to_micros, DeskStore};
use crate::{error::TriageResult, event::EventLogEntry, types::ComplaintId};
use rusqlite::params;

impl DeskStore {
    // ── Event log ──────────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> TriageResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (event_id, complaint_id, actor, event_type, payload, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.event_id,
                entry.complaint_id,
                entry.actor,
                entry.event_type,
                entry.payload,
                to_micros(entry.recorded_at),
            ],
        )?;
        Ok(())
    }

    pub fn events_for_complaint(&self, complaint_id: ComplaintId) -> TriageResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, event_id, complaint_id, actor, event_type, payload, recorded_at
             FROM event_log WHERE complaint_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![complaint_id], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    event_id: row.get(1)?,
                    complaint_id: row.get(2)?,
                    actor: row.get(3)?,
                    event_type: row.get(4)?,
                    payload: row.get(5)?,
                    recorded_at: from_micros(6, row.get(6)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self) -> TriageResult<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM event_log", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}
