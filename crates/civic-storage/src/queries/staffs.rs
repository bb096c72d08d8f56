// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staff records. Both creation paths share the email-uniqueness rule.

use civic_core::CivicError;
use civic_core::types::{DeleteResult, InsertResult, Staff, StaffPatch, UpdateResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use super::{is_unique_violation, Registration};
use crate::database::{map_tr_err, parse_column, Database};

const STAFF_COLUMNS: &str =
    "id, uid, display_name, email, phone, photo_url, status, work_status, role, created_at";

fn staff_from_row(row: &Row<'_>) -> rusqlite::Result<Staff> {
    Ok(Staff {
        id: row.get(0)?,
        uid: row.get(1)?,
        display_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        photo_url: row.get(5)?,
        status: parse_column(6, row.get(6)?)?,
        work_status: parse_column(7, row.get(7)?)?,
        role: parse_column(8, row.get(8)?)?,
        created_at: row.get(9)?,
    })
}

pub async fn list_staffs(db: &Database) -> Result<Vec<Staff>, CivicError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {STAFF_COLUMNS} FROM staffs ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map([], staff_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
pub async fn get_staff(db: &Database, id: &str) -> Result<Option<Staff>, CivicError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {STAFF_COLUMNS} FROM staffs WHERE id = ?1"),
                params![id],
                staff_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_staff_by_email(db: &Database, email: &str) -> Result<Option<Staff>, CivicError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {STAFF_COLUMNS} FROM staffs WHERE email = ?1"),
                params![email],
                staff_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert `staff` unless the email is already registered as staff.
pub async fn register_staff(db: &Database, staff: &Staff) -> Result<Registration, CivicError> {
    let staff = staff.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let exists: bool = tx.query_row(
                "SELECT EXISTS (SELECT 1 FROM staffs WHERE email = ?1)",
                params![staff.email],
                |row| row.get(0),
            )?;
            if exists {
                return Ok(Registration::AlreadyExists);
            }
            let inserted = tx.execute(
                "INSERT INTO staffs (id, uid, display_name, email, phone, photo_url, status,
                     work_status, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    staff.id,
                    staff.uid,
                    staff.display_name,
                    staff.email,
                    staff.phone,
                    staff.photo_url,
                    staff.status.to_string(),
                    staff.work_status.to_string(),
                    staff.role.to_string(),
                    staff.created_at,
                ],
            );
            match inserted {
                Ok(_) => {
                    tx.commit()?;
                    Ok(Registration::Created(InsertResult::new(staff.id)))
                }
                Err(e) if is_unique_violation(&e) => Ok(Registration::AlreadyExists),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a sparse staff update. Callers strip admin-only fields beforehand.
pub async fn update_staff(
    db: &Database,
    id: &str,
    patch: &StaffPatch,
) -> Result<UpdateResult, CivicError> {
    let id = id.to_string();
    let mut sets: Vec<&str> = Vec::new();
    let mut values = Vec::new();
    let mut set = |column: &'static str, value: Option<String>| {
        if let Some(v) = value {
            sets.push(column);
            values.push(Value::Text(v));
        }
    };
    set("display_name = ?", patch.display_name.clone());
    set("phone = ?", patch.phone.clone());
    set("photo_url = ?", patch.photo_url.clone());
    set("work_status = ?", patch.work_status.map(|w| w.to_string()));
    set("status = ?", patch.status.map(|s| s.to_string()));
    set("role = ?", patch.role.map(|r| r.to_string()));

    db.connection()
        .call(move |conn| {
            if sets.is_empty() {
                let matched: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM staffs WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )?;
                return Ok(UpdateResult::new(matched as u64, 0));
            }
            values.push(Value::Text(id));
            let changed = conn.execute(
                &format!("UPDATE staffs SET {} WHERE id = ?", sets.join(", ")),
                params_from_iter(values.iter()),
            )?;
            Ok(UpdateResult::new(changed as u64, changed as u64))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_staff(db: &Database, id: &str) -> Result<DeleteResult, CivicError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM staffs WHERE id = ?1", params![id])?;
            Ok(DeleteResult::new(deleted as u64))
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_core::types::{NewStaff, Role, StaffStatus, WorkStatus};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn applicant(email: &str) -> NewStaff {
        NewStaff {
            display_name: Some("Rahim".into()),
            email: email.to_string(),
            phone: Some("017".into()),
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn both_creation_paths_share_email_uniqueness() {
        let (db, _dir) = setup_db().await;
        let applied = Staff::self_registered(applicant("s@x.com"));
        assert!(matches!(
            register_staff(&db, &applied).await.unwrap(),
            Registration::Created(_)
        ));

        let provisioned = Staff::provisioned(applicant("s@x.com"), "uid-1".into());
        assert_eq!(
            register_staff(&db, &provisioned).await.unwrap(),
            Registration::AlreadyExists
        );

        let stored = get_staff_by_email(&db, "s@x.com").await.unwrap().unwrap();
        assert_eq!(stored.status, StaffStatus::Pending);
        assert_eq!(list_staffs(&db).await.unwrap().len(), 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn sparse_update_changes_only_given_fields() {
        let (db, _dir) = setup_db().await;
        let staff = Staff::self_registered(applicant("s@x.com"));
        register_staff(&db, &staff).await.unwrap();

        let patch = StaffPatch {
            work_status: Some(WorkStatus::Available),
            status: Some(StaffStatus::Active),
            role: Some(Role::Admin),
            ..StaffPatch::default()
        };
        let result = update_staff(&db, &staff.id, &patch).await.unwrap();
        assert_eq!(result, UpdateResult::new(1, 1));

        let stored = get_staff(&db, &staff.id).await.unwrap().unwrap();
        assert_eq!(stored.work_status, WorkStatus::Available);
        assert!(stored.is_admin());
        assert_eq!(stored.phone.as_deref(), Some("017"));

        let noop = update_staff(&db, &staff.id, &StaffPatch::default()).await.unwrap();
        assert_eq!(noop, UpdateResult::new(1, 0));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let (db, _dir) = setup_db().await;
        let staff = Staff::provisioned(applicant("s@x.com"), "uid-1".into());
        register_staff(&db, &staff).await.unwrap();

        assert_eq!(delete_staff(&db, &staff.id).await.unwrap().deleted_count, 1);
        assert!(get_staff(&db, &staff.id).await.unwrap().is_none());
        assert_eq!(delete_staff(&db, &staff.id).await.unwrap().deleted_count, 0);
        db.close().await.unwrap();
    }
}
