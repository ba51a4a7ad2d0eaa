use super::{from_micros, parse_text, to_micros, DeskStore};
use crate::{
    access::ReadScope,
    complaint::{Complaint, NewComplaint, Status},
    error::TriageResult,
    query::{ComplaintFilter, Page},
    types::ComplaintId,
};
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension};

const COMPLAINT_COLUMNS: &str = "id, text, created_by, category, urgency, status,
    assigned_to, response, created_at, updated_at";

// Helper function for mapping complaint rows
fn complaint_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Complaint> {
    Ok(Complaint {
        id: row.get(0)?,
        text: row.get(1)?,
        created_by: row.get(2)?,
        category: parse_text(3, row.get(3)?)?,
        urgency: parse_text(4, row.get(4)?)?,
        status: parse_text(5, row.get(5)?)?,
        assigned_to: row.get(6)?,
        response: row.get(7)?,
        created_at: from_micros(8, row.get(8)?)?,
        updated_at: from_micros(9, row.get(9)?)?,
    })
}

/// Role scope and filters rendered as one WHERE clause with positional
/// parameters. Shared by the page query and the count query so both see
/// exactly the same set.
struct WhereClause {
    sql: String,
    params: Vec<Value>,
}

fn where_clause(scope: &ReadScope, filter: &ComplaintFilter) -> WhereClause {
    let mut conditions: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    match scope {
        ReadScope::All => {}
        ReadScope::CreatedBy(email) => {
            conditions.push("created_by = ?");
            params.push(Value::Text(email.clone()));
        }
        ReadScope::AssignedToOrCreatedBy(email) => {
            conditions.push("(assigned_to = ? OR created_by = ?)");
            params.push(Value::Text(email.clone()));
            params.push(Value::Text(email.clone()));
        }
    }

    if let Some(category) = filter.category {
        conditions.push("category = ?");
        params.push(Value::Text(category.as_str().into()));
    }
    if let Some(urgency) = filter.urgency {
        conditions.push("urgency = ?");
        params.push(Value::Text(urgency.as_str().into()));
    }
    if let Some(status) = filter.status {
        conditions.push("status = ?");
        params.push(Value::Text(status.as_str().into()));
    }
    if let Some(assignee) = &filter.assigned_to {
        conditions.push("assigned_to = ?");
        params.push(Value::Text(assignee.clone()));
    }
    if let Some(needle) = &filter.search_text {
        // instr() instead of LIKE so % and _ in the needle stay literal.
        conditions.push("instr(fold_case(text), fold_case(?)) > 0");
        params.push(Value::Text(needle.clone()));
    }

    let sql = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    WhereClause { sql, params }
}

impl DeskStore {
    // ── Complaint ──────────────────────────────────────────────────

    pub fn insert_complaint(&self, c: &NewComplaint) -> TriageResult<Complaint> {
        let created_at = to_micros(c.created_at);
        self.conn.execute(
            "INSERT INTO complaint (
                text, created_by, category, urgency, status, assigned_to,
                response, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7, ?7)",
            params![
                &c.text,
                &c.created_by,
                c.category.as_str(),
                c.urgency.as_str(),
                Status::Pending.as_str(),
                &c.assigned_to,
                created_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        Ok(Complaint {
            id,
            text: c.text.clone(),
            created_by: c.created_by.clone(),
            category: c.category,
            urgency: c.urgency,
            status: Status::Pending,
            assigned_to: Some(c.assigned_to.clone()),
            response: None,
            created_at: c.created_at,
            updated_at: c.created_at,
        })
    }

    pub fn get_complaint(&self, id: ComplaintId) -> TriageResult<Option<Complaint>> {
        self.conn
            .query_row(
                &format!("SELECT {COMPLAINT_COLUMNS} FROM complaint WHERE id = ?1"),
                params![id],
                complaint_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Write back the mutable columns. `id`, `created_by` and `created_at`
    /// are never part of the statement.
    pub fn save_complaint(&self, c: &Complaint) -> TriageResult<bool> {
        let n = self.conn.execute(
            "UPDATE complaint SET text = ?1, category = ?2, urgency = ?3, status = ?4,
                assigned_to = ?5, response = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                &c.text,
                c.category.as_str(),
                c.urgency.as_str(),
                c.status.as_str(),
                c.assigned_to.as_deref(),
                c.response.as_deref(),
                to_micros(c.updated_at),
                c.id,
            ],
        )?;
        Ok(n > 0)
    }

    pub fn delete_complaint(&self, id: ComplaintId) -> TriageResult<bool> {
        let n = self
            .conn
            .execute("DELETE FROM complaint WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    pub fn complaint_count(&self) -> TriageResult<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM complaint", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Read and advance the serialized allocation counter. Call inside an
    /// immediate transaction.
    pub fn next_allocation_counter(&self) -> TriageResult<u64> {
        let current: i64 = self.conn.query_row(
            "SELECT next_value FROM allocation_sequence WHERE id = 1",
            [],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "UPDATE allocation_sequence SET next_value = next_value + 1 WHERE id = 1",
            [],
        )?;
        Ok(current as u64)
    }

    /// One page of the scoped, filtered set, newest first.
    pub fn list_complaints(
        &self,
        scope: &ReadScope,
        filter: &ComplaintFilter,
        page: Page,
    ) -> TriageResult<Vec<Complaint>> {
        let clause = where_clause(scope, filter);
        let sql = format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaint {}
             ORDER BY created_at DESC, id DESC
             LIMIT {} OFFSET {}",
            clause.sql,
            page.limit.min(i64::MAX as u64),
            page.skip.min(i64::MAX as u64),
        );
        log::debug!("list query: {} params={}", clause.sql, clause.params.len());
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(clause.params.iter()), complaint_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Size of the scoped, filtered set, independent of any page window.
    pub fn count_complaints(&self, scope: &ReadScope, filter: &ComplaintFilter) -> TriageResult<u64> {
        let clause = where_clause(scope, filter);
        let sql = format!("SELECT COUNT(*) FROM complaint {}", clause.sql);
        let n: i64 = self
            .conn
            .query_row(&sql, params_from_iter(clause.params.iter()), |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Every complaint in scope, oldest first. Feeds analytics.
    pub fn scoped_complaints(&self, scope: &ReadScope) -> TriageResult<Vec<Complaint>> {
        let clause = where_clause(scope, &ComplaintFilter::default());
        let sql = format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaint {} ORDER BY created_at ASC, id ASC",
            clause.sql
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(clause.params.iter()), complaint_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
