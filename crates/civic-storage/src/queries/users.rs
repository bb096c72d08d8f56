// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Citizen accounts, unique by email.

use civic_core::CivicError;
use civic_core::types::{InsertResult, UpdateResult, User, UserPatch};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tracing::debug;

use super::{is_unique_violation, Registration};
use crate::database::{map_tr_err, parse_column, Database};

pub(crate) const USER_COLUMNS: &str =
    "id, email, display_name, photo_url, is_premium, role, created_at";

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        photo_url: row.get(3)?,
        is_premium: row.get(4)?,
        role: parse_column(5, row.get(5)?)?,
        created_at: row.get(6)?,
    })
}

/// List users, optionally only the one with `email`.
pub async fn list_users(db: &Database, email: Option<&str>) -> Result<Vec<User>, CivicError> {
    let email = email.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE (?1 IS NULL OR email = ?1)
                 ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![email], user_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_user_by_email(db: &Database, email: &str) -> Result<Option<User>, CivicError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                user_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert `user` unless the email is already registered.
///
/// The existence check and the insert share a transaction, and the UNIQUE
/// email index turns a lost race into [`Registration::AlreadyExists`].
pub async fn register_user(db: &Database, user: &User) -> Result<Registration, CivicError> {
    let user = user.clone();
    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let exists: bool = tx.query_row(
                "SELECT EXISTS (SELECT 1 FROM users WHERE email = ?1)",
                params![user.email],
                |row| row.get(0),
            )?;
            if exists {
                return Ok(Registration::AlreadyExists);
            }
            let inserted = tx.execute(
                "INSERT INTO users (id, email, display_name, photo_url, is_premium, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user.id,
                    user.email,
                    user.display_name,
                    user.photo_url,
                    user.is_premium,
                    user.role.to_string(),
                    user.created_at,
                ],
            );
            match inserted {
                Ok(_) => {
                    tx.commit()?;
                    Ok(Registration::Created(InsertResult::new(user.id)))
                }
                Err(e) if is_unique_violation(&e) => Ok(Registration::AlreadyExists),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    debug!(created = matches!(outcome, Registration::Created(_)), "user registration");
    Ok(outcome)
}

/// Update display name and photo. Other fields are never touched.
pub async fn update_profile(
    db: &Database,
    id: &str,
    patch: &UserPatch,
) -> Result<UpdateResult, CivicError> {
    let id = id.to_string();
    let mut sets: Vec<&str> = Vec::new();
    let mut values = Vec::new();
    if let Some(name) = &patch.display_name {
        sets.push("display_name = ?");
        values.push(Value::Text(name.clone()));
    }
    if let Some(photo) = &patch.photo_url {
        sets.push("photo_url = ?");
        values.push(Value::Text(photo.clone()));
    }

    db.connection()
        .call(move |conn| {
            if sets.is_empty() {
                let matched: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM users WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )?;
                return Ok(UpdateResult::new(matched as u64, 0));
            }
            values.push(Value::Text(id));
            let changed = conn.execute(
                &format!("UPDATE users SET {} WHERE id = ?", sets.join(", ")),
                params_from_iter(values.iter()),
            )?;
            Ok(UpdateResult::new(changed as u64, changed as u64))
        })
        .await
        .map_err(map_tr_err)
}

/// Flag the account with `email` as premium.
pub async fn set_premium(db: &Database, email: &str) -> Result<UpdateResult, CivicError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            let matched = conn.execute(
                "UPDATE users SET is_premium = 1 WHERE email = ?1",
                params![email],
            )?;
            Ok(UpdateResult::new(matched as u64, matched as u64))
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_core::types::{NewUser, Role};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn signup(email: &str) -> User {
        User::signup(NewUser {
            email: email.to_string(),
            display_name: Some("Citizen".into()),
            photo_url: None,
        })
    }

    #[tokio::test]
    async fn register_then_lookup() {
        let (db, _dir) = setup_db().await;
        let user = signup("a@x.com");

        let outcome = register_user(&db, &user).await.unwrap();
        assert_eq!(outcome, Registration::Created(InsertResult::new(user.id.clone())));

        let stored = get_user_by_email(&db, "a@x.com").await.unwrap().unwrap();
        assert_eq!(stored, user);
        assert_eq!(stored.role, Role::User);
        assert!(!stored.is_premium);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_writing() {
        let (db, _dir) = setup_db().await;
        register_user(&db, &signup("a@x.com")).await.unwrap();

        let again = register_user(&db, &signup("a@x.com")).await.unwrap();
        assert_eq!(again, Registration::AlreadyExists);
        assert_eq!(list_users(&db, None).await.unwrap().len(), 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_signups_create_one_account() {
        let (db, _dir) = setup_db().await;
        let mut handles = Vec::new();
        for _ in 0..6 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                register_user(&db, &signup("race@x.com")).await.unwrap()
            }));
        }
        let mut created = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), Registration::Created(_)) {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_filters_by_email() {
        let (db, _dir) = setup_db().await;
        register_user(&db, &signup("a@x.com")).await.unwrap();
        register_user(&db, &signup("b@x.com")).await.unwrap();

        assert_eq!(list_users(&db, None).await.unwrap().len(), 2);
        let only_b = list_users(&db, Some("b@x.com")).await.unwrap();
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b[0].email, "b@x.com");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn profile_update_and_premium_flag() {
        let (db, _dir) = setup_db().await;
        let user = signup("a@x.com");
        register_user(&db, &user).await.unwrap();

        let patch = UserPatch {
            display_name: Some("Renamed".into()),
            photo_url: None,
        };
        let result = update_profile(&db, &user.id, &patch).await.unwrap();
        assert_eq!(result.modified_count, 1);

        let premium = set_premium(&db, "a@x.com").await.unwrap();
        assert_eq!(premium.matched_count, 1);

        let stored = get_user_by_email(&db, "a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.display_name.as_deref(), Some("Renamed"));
        assert!(stored.photo_url.is_none());
        assert!(stored.is_premium);

        let missing = set_premium(&db, "ghost@x.com").await.unwrap();
        assert_eq!(missing.matched_count, 0);
        db.close().await.unwrap();
    }
}
