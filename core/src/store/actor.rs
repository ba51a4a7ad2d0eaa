use super::{parse_text, DeskStore};
use crate::{
    actor::{Actor, ActorDirectory, NewActor, Role},
    error::TriageResult,
};
use rusqlite::{params, OptionalExtension};

fn actor_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Actor> {
    Ok(Actor {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        role: parse_text(3, row.get(3)?)?,
        is_active: row.get::<_, i32>(4)? != 0,
    })
}

impl DeskStore {
    // ── Actor ──────────────────────────────────────────────────────

    pub fn insert_actor(&self, a: &NewActor) -> TriageResult<Actor> {
        self.conn.execute(
            "INSERT INTO actor (email, full_name, role, is_active) VALUES (?1, ?2, ?3, ?4)",
            params![
                &a.email,
                &a.full_name,
                a.role.as_str(),
                if a.is_active { 1i32 } else { 0i32 },
            ],
        )?;
        Ok(Actor {
            id: self.conn.last_insert_rowid(),
            email: a.email.clone(),
            full_name: a.full_name.clone(),
            role: a.role,
            is_active: a.is_active,
        })
    }

    pub fn set_actor_active(&self, email: &str, active: bool) -> TriageResult<bool> {
        let n = self.conn.execute(
            "UPDATE actor SET is_active = ?1 WHERE email = ?2",
            params![if active { 1i32 } else { 0i32 }, email],
        )?;
        Ok(n > 0)
    }

    pub fn actor_count(&self) -> TriageResult<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM actor", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

impl ActorDirectory for DeskStore {
    fn list_active_actors_by_role(&self, role: Role) -> TriageResult<Vec<Actor>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, email, full_name, role, is_active
             FROM actor WHERE role = ?1 AND is_active = 1
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![role.as_str()], actor_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn get_actor_by_identity(&self, identity: &str) -> TriageResult<Option<Actor>> {
        self.conn
            .query_row(
                "SELECT id, email, full_name, role, is_active FROM actor WHERE email = ?1",
                params![identity],
                actor_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }
}
