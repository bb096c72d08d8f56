// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only aggregations for the dashboards.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Days, FixedOffset, Utc};
use civic_core::CivicError;
use civic_core::types::{
    format_timestamp, AssignedTask, Issue, IssueStatus, Payment, StatusCount, User,
    ASSIGNMENT_MARKER,
};
use rusqlite::params;

use super::issues::{issue_from_row, ISSUE_COLUMNS};
use super::payments::{payment_from_row, PAYMENT_COLUMNS};
use super::trackings::tracking_from_row;
use super::users::{user_from_row, USER_COLUMNS};
use crate::database::{map_tr_err, Database};

/// Every status, in the order dashboards display them.
const ALL_STATUSES: [IssueStatus; 4] = [
    IssueStatus::Pending,
    IssueStatus::InProgress,
    IssueStatus::Resolved,
    IssueStatus::Rejected,
];

/// Which issues an aggregation covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueScope {
    All,
    /// Issues reported by this email.
    Reporter(String),
    /// Issues assigned to this staff email.
    Assignee(String),
}

impl IssueScope {
    fn bindings(&self) -> (Option<String>, Option<String>) {
        match self {
            IssueScope::All => (None, None),
            IssueScope::Reporter(email) => (Some(email.clone()), None),
            IssueScope::Assignee(email) => (None, Some(email.clone())),
        }
    }
}

/// Issue counts per status within `scope`. Statuses with no issues report zero.
pub async fn status_counts(
    db: &Database,
    scope: &IssueScope,
) -> Result<Vec<StatusCount>, CivicError> {
    let (reporter, assignee) = scope.bindings();
    let grouped: HashMap<String, i64> = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM issues
                 WHERE (?1 IS NULL OR reporter_email = ?1)
                   AND (?2 IS NULL OR assigned_email = ?2)
                 GROUP BY status",
            )?;
            let rows = stmt.query_map(params![reporter, assignee], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;

    let mut counts: Vec<StatusCount> = ALL_STATUSES
        .iter()
        .map(|status| StatusCount {
            status: *status,
            count: 0,
        })
        .collect();
    for (raw, count) in grouped {
        if let Ok(status) = IssueStatus::from_str(&raw)
            && let Some(slot) = counts.iter_mut().find(|c| c.status == status)
        {
            slot.count = count as u64;
        }
    }
    Ok(counts)
}

/// Sum of recorded payment amounts, optionally only those paid by `email`.
pub async fn payment_total(db: &Database, email: Option<&str>) -> Result<i64, CivicError> {
    let email = email.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE (?1 IS NULL OR user_email = ?1)",
                params![email],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Number of user and staff accounts.
pub async fn account_counts(db: &Database) -> Result<(u64, u64), CivicError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                "SELECT (SELECT COUNT(*) FROM users), (SELECT COUNT(*) FROM staffs)",
                [],
                |row| {
                    let users: i64 = row.get(0)?;
                    let staffs: i64 = row.get(1)?;
                    Ok((users as u64, staffs as u64))
                },
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Most recently reported issues.
pub async fn recent_issues(db: &Database, limit: u32) -> Result<Vec<Issue>, CivicError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ISSUE_COLUMNS} FROM issues ORDER BY created_at DESC, id DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], |row| issue_from_row(row, 0))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent signups.
pub async fn recent_users(db: &Database, limit: u32) -> Result<Vec<User>, CivicError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], user_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent payments.
pub async fn recent_payments(db: &Database, limit: u32) -> Result<Vec<Payment>, CivicError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY created_at DESC, id DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], payment_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// UTC bounds `[start, end)` of the calendar day containing `now` at `offset`.
pub fn local_day_bounds(now: DateTime<Utc>, offset: FixedOffset) -> (String, String) {
    let local_midnight = now.with_timezone(&offset).date_naive().and_time(chrono::NaiveTime::MIN);
    let start = local_midnight - chrono::Duration::seconds(i64::from(offset.local_minus_utc()));
    let end = start.checked_add_days(Days::new(1)).unwrap_or(start);
    (
        format_timestamp(start.and_utc()),
        format_timestamp(end.and_utc()),
    )
}

/// Assignment events logged in `[start, end)` for issues assigned to `staff_email`.
///
/// An entry counts as an assignment when its kind says so or its note
/// carries the assignment marker, which covers entries written before the
/// kind column existed.
pub async fn assigned_tasks(
    db: &Database,
    staff_email: &str,
    start: &str,
    end: &str,
) -> Result<Vec<AssignedTask>, CivicError> {
    let staff_email = staff_email.to_string();
    let start = start.to_string();
    let end = end.to_string();
    let issue_columns = ISSUE_COLUMNS
        .split(',')
        .map(|c| format!("i.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ");

    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT t.id, t.issue_id, t.issue_status, t.issue_note, t.kind, t.created_at,
                        {issue_columns}
                 FROM trackings t
                 JOIN issues i ON i.id = t.issue_id
                 WHERE (t.kind = 'assignment' OR instr(t.issue_note, ?4) > 0)
                   AND t.created_at >= ?2 AND t.created_at < ?3
                   AND i.assigned_email = ?1
                 ORDER BY t.created_at ASC, t.id ASC"
            ))?;
            let rows = stmt.query_map(
                params![staff_email, start, end, ASSIGNMENT_MARKER],
                |row| {
                    Ok(AssignedTask {
                        tracking: tracking_from_row(row, 0)?,
                        issue: issue_from_row(row, 6)?,
                    })
                },
            )?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
