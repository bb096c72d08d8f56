// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confirmed payments, one row per gateway session.

use civic_core::CivicError;
use civic_core::types::{InsertIfAbsent, Payment};
use rusqlite::{params, Row};
use tracing::debug;

use crate::database::{map_tr_err, parse_column, Database};

pub(crate) const PAYMENT_COLUMNS: &str =
    "id, session_id, type, user_email, issue_id, amount, created_at";

pub(crate) fn payment_from_row(row: &Row<'_>) -> rusqlite::Result<Payment> {
    Ok(Payment {
        id: row.get(0)?,
        session_id: row.get(1)?,
        payment_type: parse_column(2, row.get(2)?)?,
        user_email: row.get(3)?,
        issue_id: row.get(4)?,
        amount: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Record `payment` unless its session is already recorded.
///
/// An existing row is returned untouched; this never updates.
pub async fn insert_payment_if_absent(
    db: &Database,
    payment: &Payment,
) -> Result<InsertIfAbsent<Payment>, CivicError> {
    let payment = payment.clone();
    let outcome = db
        .connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO payments (id, session_id, type, user_email, issue_id, amount, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(session_id) DO NOTHING",
                params![
                    payment.id,
                    payment.session_id,
                    payment.payment_type.to_string(),
                    payment.user_email,
                    payment.issue_id,
                    payment.amount,
                    payment.created_at,
                ],
            )?;
            let record = conn.query_row(
                &format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE session_id = ?1"),
                params![payment.session_id],
                payment_from_row,
            )?;
            Ok(InsertIfAbsent {
                record,
                inserted: inserted == 1,
            })
        })
        .await
        .map_err(map_tr_err)?;

    debug!(
        session_id = %outcome.record.session_id,
        inserted = outcome.inserted,
        "payment recorded"
    );
    Ok(outcome)
}

/// Payments newest first, optionally only those made by `email`.
pub async fn list_payments(db: &Database, email: Option<&str>) -> Result<Vec<Payment>, CivicError> {
    let email = email.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PAYMENT_COLUMNS} FROM payments
                 WHERE (?1 IS NULL OR user_email = ?1)
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![email], payment_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_core::types::{new_record_id, now_timestamp, PaymentType};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn payment(session: &str, email: &str, amount: i64) -> Payment {
        Payment {
            id: new_record_id(),
            session_id: session.to_string(),
            payment_type: PaymentType::Payment,
            user_email: email.to_string(),
            issue_id: Some("issue-1".into()),
            amount,
            created_at: now_timestamp(),
        }
    }

    #[tokio::test]
    async fn same_session_is_recorded_once() {
        let (db, _dir) = setup_db().await;
        let first = payment("cs_1", "a@x.com", 100);

        let outcome = insert_payment_if_absent(&db, &first).await.unwrap();
        assert!(outcome.inserted);
        assert_eq!(outcome.record, first);

        let mut retry = payment("cs_1", "a@x.com", 999);
        retry.payment_type = PaymentType::Subscription;
        let again = insert_payment_if_absent(&db, &retry).await.unwrap();
        assert!(!again.inserted);
        assert_eq!(again.record, first, "existing row must not be overwritten");

        assert_eq!(list_payments(&db, None).await.unwrap().len(), 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_confirmations_insert_once() {
        let (db, _dir) = setup_db().await;
        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                insert_payment_if_absent(&db, &payment("cs_race", "a@x.com", 100))
                    .await
                    .unwrap()
                    .inserted
            }));
        }
        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_filters_by_payer() {
        let (db, _dir) = setup_db().await;
        insert_payment_if_absent(&db, &payment("cs_1", "a@x.com", 100)).await.unwrap();
        insert_payment_if_absent(&db, &payment("cs_2", "b@x.com", 1000)).await.unwrap();

        let mine = list_payments(&db, Some("b@x.com")).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].amount, 1000);
        assert_eq!(list_payments(&db, None).await.unwrap().len(), 2);
        db.close().await.unwrap();
    }
}
