//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine calls store methods and never executes SQL directly.

use crate::error::{TriageError, TriageResult};
use chrono::{DateTime, Utc};
use rusqlite::{functions::FunctionFlags, Connection, Transaction, TransactionBehavior};

mod actor;
mod complaint;
mod event_log;

pub struct DeskStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl DeskStore {
    pub fn open(path: &str) -> TriageResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        register_functions(&conn)?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> TriageResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        register_functions(&conn)?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    pub fn reopen(&self) -> TriageResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> TriageResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    /// Start a transaction on this connection. Store calls made while it is
    /// open are part of it; dropping it without `commit` rolls back.
    ///
    /// `immediate` takes the write lock up front, which is what serialized
    /// allocation relies on.
    pub fn begin(&self, immediate: bool) -> TriageResult<Transaction<'_>> {
        let behavior = if immediate {
            TransactionBehavior::Immediate
        } else {
            TransactionBehavior::Deferred
        };
        Transaction::new_unchecked(&self.conn, behavior).map_err(TriageError::from)
    }
}

/// `fold_case(text)`: Unicode lowercase. SQLite's `lower()` folds ASCII only.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

// ── Column helpers ─────────────────────────────────────────────────────

pub(crate) fn to_micros(t: DateTime<Utc>) -> i64 {
    t.timestamp_micros()
}

pub(crate) fn from_micros(idx: usize, micros: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Integer,
            format!("timestamp out of range: {micros}").into(),
        )
    })
}

pub(crate) fn parse_text<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = TriageError>,
{
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            e.to_string().into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        actor::{NewActor, Role},
        complaint::{Category, NewComplaint, Urgency},
    };

    fn sample(created_by: &str) -> NewComplaint {
        NewComplaint {
            text: "The heating in room 12 is off".into(),
            created_by: created_by.into(),
            category: Category::Facilities,
            urgency: Urgency::Medium,
            assigned_to: "sup@x".into(),
            created_at: DateTime::from_timestamp(1_704_067_200, 0).unwrap(),
        }
    }

    fn migrated() -> DeskStore {
        let store = DeskStore::in_memory().unwrap();
        store.migrate().unwrap();
        store
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let store = migrated();
        {
            let _tx = store.begin(false).unwrap();
            store.insert_complaint(&sample("emp@x")).unwrap();
            assert_eq!(store.complaint_count().unwrap(), 1);
        }
        assert_eq!(store.complaint_count().unwrap(), 0);

        let tx = store.begin(true).unwrap();
        store.insert_complaint(&sample("emp@x")).unwrap();
        tx.commit().unwrap();
        assert_eq!(store.complaint_count().unwrap(), 1);
    }

    #[test]
    fn migrations_are_idempotent() {
        let store = migrated();
        store.migrate().unwrap();
        assert_eq!(store.next_allocation_counter().unwrap(), 0);
        assert_eq!(store.next_allocation_counter().unwrap(), 1);
    }

    #[test]
    fn timestamps_keep_microseconds() {
        let store = migrated();
        let mut c = sample("emp@x");
        c.created_at = DateTime::from_timestamp_micros(1_704_067_200_123_456).unwrap();
        let stored = store.insert_complaint(&c).unwrap();
        let read = store.get_complaint(stored.id).unwrap().unwrap();
        assert_eq!(read.created_at, c.created_at);
        assert_eq!(read.updated_at, c.created_at);
    }

    #[test]
    fn reopened_file_store_sees_committed_rows() {
        let path = std::env::temp_dir().join(format!("desk-{}.db", uuid::Uuid::new_v4()));
        let path = path.to_string_lossy().to_string();
        {
            let store = DeskStore::open(&path).unwrap();
            store.migrate().unwrap();
            store.insert_actor(&NewActor::new("sup@x", "Support", Role::Support)).unwrap();
            store.insert_complaint(&sample("emp@x")).unwrap();

            let other = store.reopen().unwrap();
            assert_eq!(other.complaint_count().unwrap(), 1);
            assert_eq!(other.actor_count().unwrap(), 1);
        }
        let _ = std::fs::remove_file(&path);
    }
}
