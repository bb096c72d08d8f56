// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Issue store: listing, lookup, creation, sparse edits, status changes,
//! atomic upvotes, boosting, and deletion.

use std::collections::BTreeSet;

use civic_core::CivicError;
use civic_core::types::{
    now_timestamp, DeleteResult, InsertResult, Issue, IssueFilter, IssuePatch, IssueStatus,
    Person, Tracking, TrackingKind, UpdateResult,
};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tracing::debug;

use crate::database::{map_tr_err, parse_column, Database};
use crate::queries::trackings::insert_tracking_row;

/// Column list matching [`issue_from_row`].
pub(crate) const ISSUE_COLUMNS: &str = "id, title, description, category, status, priority, \
     is_boosted, upvotes, reporter_email, reporter_name, assigned_email, assigned_name, \
     image, location, created_at, updated_at";

/// Listing order: boosted issues first, then oldest first.
const LISTING_ORDER: &str = "ORDER BY is_boosted DESC, created_at ASC, id ASC";

/// One page of a filtered listing plus the unpaginated match count.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuePage {
    pub issues: Vec<Issue>,
    pub total: u64,
}

/// Result of a status change: the issue update and the audit entry written with it.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub result: UpdateResult,
    /// `None` when no issue matched, in which case nothing was logged.
    pub tracking: Option<Tracking>,
}

/// Result of an upvote attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpvoteOutcome {
    /// `false` when the issue is missing, the caller reported it, or already upvoted.
    pub upvoted: bool,
    pub total_upvotes: u64,
}

/// Map a row laid out as [`ISSUE_COLUMNS`], starting at column `base`.
pub(crate) fn issue_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<Issue> {
    let raw_upvotes: String = row.get(base + 7)?;
    let upvotes: BTreeSet<String> = serde_json::from_str(&raw_upvotes).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(base + 7, Type::Text, Box::new(e))
    })?;
    Ok(Issue {
        id: row.get(base)?,
        title: row.get(base + 1)?,
        description: row.get(base + 2)?,
        category: row.get(base + 3)?,
        status: parse_column(base + 4, row.get(base + 4)?)?,
        priority: parse_column(base + 5, row.get(base + 5)?)?,
        is_boosted: row.get(base + 6)?,
        upvotes,
        reported_by: Person {
            email: row.get(base + 8)?,
            name: row.get(base + 9)?,
        },
        assigned_staff: Person {
            email: row.get(base + 10)?,
            name: row.get(base + 11)?,
        },
        image: row.get(base + 12)?,
        location: row.get(base + 13)?,
        created_at: row.get(base + 14)?,
        updated_at: row.get(base + 15)?,
    })
}

/// Escape LIKE wildcards so user input matches literally.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Build the WHERE clause (with leading space) and its bound values.
fn filter_clause(filter: &IssueFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values = Vec::new();

    if let Some(status) = filter.status {
        clauses.push("status = ?");
        values.push(Value::Text(status.to_string()));
    }
    if let Some(status) = filter.except_status {
        clauses.push("status <> ?");
        values.push(Value::Text(status.to_string()));
    }
    if let Some(email) = &filter.reporter_email {
        clauses.push("reporter_email = ?");
        values.push(Value::Text(email.clone()));
    }
    if let Some(email) = &filter.staff_email {
        clauses.push("assigned_email = ?");
        values.push(Value::Text(email.clone()));
    }
    if let Some(category) = &filter.category {
        clauses.push("category = ?");
        values.push(Value::Text(category.clone()));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        clauses.push("(title LIKE ? ESCAPE '\\' OR location LIKE ? ESCAPE '\\')");
        values.push(Value::Text(pattern.clone()));
        values.push(Value::Text(pattern));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

/// Insert a new issue.
pub async fn insert_issue(db: &Database, issue: &Issue) -> Result<InsertResult, CivicError> {
    let issue = issue.clone();
    let upvotes = serde_json::to_string(&issue.upvotes).map_err(CivicError::storage)?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO issues (id, title, description, category, status, priority,
                     is_boosted, upvotes, reporter_email, reporter_name, assigned_email,
                     assigned_name, image, location, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    issue.id,
                    issue.title,
                    issue.description,
                    issue.category,
                    issue.status.to_string(),
                    issue.priority.to_string(),
                    issue.is_boosted,
                    upvotes,
                    issue.reported_by.email,
                    issue.reported_by.name,
                    issue.assigned_staff.email,
                    issue.assigned_staff.name,
                    issue.image,
                    issue.location,
                    issue.created_at,
                    issue.updated_at,
                ],
            )?;
            Ok(InsertResult::new(issue.id))
        })
        .await
        .map_err(map_tr_err)
}

/// Get an issue by ID.
pub async fn get_issue(db: &Database, id: &str) -> Result<Option<Issue>, CivicError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?1"),
                params![id],
                |row| issue_from_row(row, 0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// List issues matching `filter`, boosted first, then oldest first.
///
/// `total` counts every match regardless of `limit`/`skip`. A missing or zero
/// limit means no limit.
pub async fn list_issues(db: &Database, filter: &IssueFilter) -> Result<IssuePage, CivicError> {
    let (where_sql, values) = filter_clause(filter);
    let limit = filter.limit.filter(|l| *l > 0).map_or(-1, i64::from);
    let skip = filter.skip.map_or(0, i64::from);

    db.connection()
        .call(move |conn| {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM issues{where_sql}"),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )?;

            let mut page_values = values;
            page_values.push(Value::Integer(limit));
            page_values.push(Value::Integer(skip));
            let mut stmt = conn.prepare(&format!(
                "SELECT {ISSUE_COLUMNS} FROM issues{where_sql} {LISTING_ORDER} LIMIT ? OFFSET ?"
            ))?;
            let issues = stmt
                .query_map(params_from_iter(page_values.iter()), |row| {
                    issue_from_row(row, 0)
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(IssuePage {
                issues,
                total: total as u64,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Most recently updated issues, optionally restricted to one status.
pub async fn latest_issues(
    db: &Database,
    status: Option<IssueStatus>,
    limit: u32,
) -> Result<Vec<Issue>, CivicError> {
    let status = status.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ISSUE_COLUMNS} FROM issues
                 WHERE (?1 IS NULL OR status = ?1)
                 ORDER BY updated_at DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![status, limit], |row| issue_from_row(row, 0))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a sparse staff edit. Only fields present in `patch` are written.
pub async fn update_issue(
    db: &Database,
    id: &str,
    patch: &IssuePatch,
) -> Result<UpdateResult, CivicError> {
    let id = id.to_string();
    let patch = patch.clone().normalized();

    let mut sets: Vec<&str> = Vec::new();
    let mut values = Vec::new();
    let mut text = |column: &'static str, value: Option<String>| {
        if let Some(v) = value {
            sets.push(column);
            values.push(Value::Text(v));
        }
    };
    text("title = ?", patch.title);
    text("description = ?", patch.description);
    text("category = ?", patch.category);
    text("location = ?", patch.location);
    text("image = ?", patch.image);
    text("priority = ?", patch.priority.map(|p| p.to_string()));
    if let Some(staff) = patch.assigned_staff {
        sets.push("assigned_email = ?");
        values.push(staff.email.map_or(Value::Null, Value::Text));
        sets.push("assigned_name = ?");
        values.push(staff.name.map_or(Value::Null, Value::Text));
    }

    db.connection()
        .call(move |conn| {
            if sets.is_empty() {
                let matched: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM issues WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )?;
                return Ok(UpdateResult::new(matched as u64, 0));
            }

            sets.push("updated_at = ?");
            values.push(Value::Text(now_timestamp()));
            values.push(Value::Text(id));
            let changed = conn.execute(
                &format!("UPDATE issues SET {} WHERE id = ?", sets.join(", ")),
                params_from_iter(values.iter()),
            )?;
            Ok(UpdateResult::new(changed as u64, changed as u64))
        })
        .await
        .map_err(map_tr_err)
}

/// Set an issue's status and append the matching tracking entry.
///
/// Both writes share one transaction. When `note` is `None` a default note
/// naming the new status is logged.
pub async fn change_status(
    db: &Database,
    id: &str,
    status: IssueStatus,
    note: Option<String>,
) -> Result<StatusChange, CivicError> {
    let note = note
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("Issue status changed to {status}"));
    let entry = Tracking::new(id, Some(status.to_string()), note, TrackingKind::StatusChange);
    let id = id.to_string();

    let change = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE issues SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.to_string(), now_timestamp(), id],
            )?;
            let tracking = if changed > 0 {
                insert_tracking_row(&tx, &entry)?;
                Some(entry)
            } else {
                None
            };
            tx.commit()?;
            Ok(StatusChange {
                result: UpdateResult::new(changed as u64, changed as u64),
                tracking,
            })
        })
        .await
        .map_err(map_tr_err)?;

    debug!(matched = change.result.matched_count, status = %status, "issue status changed");
    Ok(change)
}

/// Add `email` to an issue's upvotes in a single conditional statement.
///
/// The update only matches when the issue exists, `email` is not the
/// reporter, and `email` is not already present, so concurrent duplicate
/// upvotes cannot both succeed.
pub async fn upvote(db: &Database, id: &str, email: &str) -> Result<UpvoteOutcome, CivicError> {
    let id = id.to_string();
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE issues SET upvotes = json_insert(upvotes, '$[#]', ?2)
                 WHERE id = ?1
                   AND (reporter_email IS NULL OR reporter_email <> ?2)
                   AND NOT EXISTS (
                       SELECT 1 FROM json_each(issues.upvotes) WHERE json_each.value = ?2
                   )",
                params![id, email],
            )?;
            let total: Option<i64> = conn
                .query_row(
                    "SELECT json_array_length(upvotes) FROM issues WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(UpvoteOutcome {
                upvoted: changed == 1,
                total_upvotes: total.unwrap_or(0) as u64,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Mark an issue as boosted and raise its priority to high.
pub async fn set_boosted(db: &Database, id: &str) -> Result<UpdateResult, CivicError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE issues SET is_boosted = 1, priority = 'high', updated_at = ?2
                 WHERE id = ?1",
                params![id, now_timestamp()],
            )?;
            Ok(UpdateResult::new(changed as u64, changed as u64))
        })
        .await
        .map_err(map_tr_err)
}

/// Delete an issue. Tracking and payment rows referencing it are kept.
pub async fn delete_issue(db: &Database, id: &str) -> Result<DeleteResult, CivicError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM issues WHERE id = ?1", params![id])?;
            Ok(DeleteResult::new(deleted as u64))
        })
        .await
        .map_err(map_tr_err)
}
