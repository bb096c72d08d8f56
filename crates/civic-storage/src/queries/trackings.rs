// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only tracking log. Entries are never updated or deleted.

use civic_core::CivicError;
use civic_core::types::{InsertIfAbsent, InsertResult, Tracking};
use rusqlite::{params, Row};

use crate::database::{map_tr_err, parse_column, Database};

pub(crate) const TRACKING_COLUMNS: &str =
    "id, issue_id, issue_status, issue_note, kind, created_at";

pub(crate) fn tracking_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<Tracking> {
    Ok(Tracking {
        id: row.get(base)?,
        issue_id: row.get(base + 1)?,
        issue_status: row.get(base + 2)?,
        issue_note: row.get(base + 3)?,
        kind: parse_column(base + 4, row.get(base + 4)?)?,
        created_at: row.get(base + 5)?,
    })
}

/// Write one entry on an existing connection or transaction.
pub(crate) fn insert_tracking_row(
    conn: &rusqlite::Connection,
    entry: &Tracking,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO trackings (id, issue_id, issue_status, issue_note, kind, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.id,
            entry.issue_id,
            entry.issue_status,
            entry.issue_note,
            entry.kind.to_string(),
            entry.created_at,
        ],
    )?;
    Ok(())
}

/// Append a tracking entry.
pub async fn insert_tracking(db: &Database, entry: &Tracking) -> Result<InsertResult, CivicError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| {
            insert_tracking_row(conn, &entry)?;
            Ok(InsertResult::new(entry.id))
        })
        .await
        .map_err(map_tr_err)
}

/// Append `entry` unless one with the same `(issue_id, issue_note)` exists.
///
/// Returns the stored entry either way. The check and the insert are one
/// statement, so repeated confirmations never log twice.
pub async fn insert_tracking_if_absent(
    db: &Database,
    entry: &Tracking,
) -> Result<InsertIfAbsent<Tracking>, CivicError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO trackings (id, issue_id, issue_status, issue_note, kind, created_at)
                 SELECT ?1, ?2, ?3, ?4, ?5, ?6
                 WHERE NOT EXISTS (
                     SELECT 1 FROM trackings WHERE issue_id = ?2 AND issue_note = ?4
                 )",
                params![
                    entry.id,
                    entry.issue_id,
                    entry.issue_status,
                    entry.issue_note,
                    entry.kind.to_string(),
                    entry.created_at,
                ],
            )?;
            let record = conn.query_row(
                &format!(
                    "SELECT {TRACKING_COLUMNS} FROM trackings
                     WHERE issue_id = ?1 AND issue_note = ?2
                     ORDER BY created_at ASC, id ASC LIMIT 1"
                ),
                params![entry.issue_id, entry.issue_note],
                |row| tracking_from_row(row, 0),
            )?;
            Ok(InsertIfAbsent {
                record,
                inserted: inserted == 1,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// All entries for one issue, oldest first.
pub async fn list_for_issue(db: &Database, issue_id: &str) -> Result<Vec<Tracking>, CivicError> {
    let issue_id = issue_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TRACKING_COLUMNS} FROM trackings
                 WHERE issue_id = ?1 ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![issue_id], |row| tracking_from_row(row, 0))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
