// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests driving the full HTTP router.
//!
//! Each test creates an isolated TestHarness with a temp SQLite database and
//! mock identity and payment adapters. Tests are independent and
//! order-insensitive.

use std::time::Duration;

use axum::http::{Method, StatusCode};
use civic_test_utils::TestHarness;
use serde_json::{json, Value};

const ADMIN: &str = "admin@city.gov";
const STAFF: &str = "crew@city.gov";

async fn harness() -> TestHarness {
    TestHarness::builder()
        .with_admin(ADMIN)
        .with_staff(STAFF)
        .build()
        .await
        .unwrap()
}

async fn report(harness: &TestHarness, reporter: &str, title: &str) -> String {
    let (status, body) = harness
        .request_as(
            reporter,
            Method::POST,
            "/issues",
            Some(json!({"title": title, "category": "roads", "email": reporter, "name": "A"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["insertedId"].as_str().unwrap().to_string()
}

fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|i| i["_id"].as_str().unwrap().to_string())
        .collect()
}

// ---- Issue lifecycle ----

#[tokio::test]
async fn reported_issue_gets_lifecycle_defaults() {
    let harness = harness().await;
    let id = report(&harness, "a@x.com", "Pothole").await;

    let (status, issue) = harness
        .request_as("a@x.com", Method::GET, &format!("/issues/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(issue["status"], "pending");
    assert_eq!(issue["priority"], "normal");
    assert_eq!(issue["isBoosted"], false);
    assert_eq!(issue["upvotes"], json!([]));
    assert_eq!(issue["assignedStaff"], json!({"email": null, "name": null}));
    assert_eq!(issue["reportedBy"]["email"], "a@x.com");
}

#[tokio::test]
async fn caller_cannot_preset_lifecycle_fields() {
    let harness = harness().await;
    let (status, created) = harness
        .request_as(
            "a@x.com",
            Method::POST,
            "/issues",
            Some(json!({
                "title": "Streetlight out",
                "category": "lighting",
                "status": "resolved",
                "priority": "high",
                "isBoosted": true,
                "upvotes": ["b@x.com", "c@x.com"],
                "assignedStaff": {"email": STAFF, "name": "Crew"},
                "createdAt": "2001-01-01T00:00:00Z",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{created}");
    let id = created["insertedId"].as_str().unwrap();

    let (_, issue) = harness
        .request_as("a@x.com", Method::GET, &format!("/issues/{id}"), None)
        .await;
    assert_eq!(issue["status"], "pending");
    assert_eq!(issue["priority"], "normal");
    assert_eq!(issue["isBoosted"], false);
    assert_eq!(issue["upvotes"], json!([]));
    assert_eq!(issue["assignedStaff"], json!({"email": null, "name": null}));
    assert_ne!(issue["createdAt"], "2001-01-01T00:00:00Z");
    assert_eq!(issue["reportedBy"]["email"], "a@x.com");
}

#[tokio::test]
async fn report_without_title_is_rejected_as_json() {
    let harness = harness().await;
    let (status, body) = harness
        .request_as(
            "a@x.com",
            Method::POST,
            "/issues",
            Some(json!({"category": "roads"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("title"), "{body}");
}

#[tokio::test]
async fn missing_issue_is_null_not_404() {
    let harness = harness().await;
    let (status, body) = harness
        .request_as("a@x.com", Method::GET, "/issues/nope", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn upvote_counts_once_and_never_for_reporter() {
    let harness = harness().await;
    let id = report(&harness, "a@x.com", "Pothole").await;
    let uri = format!("/issues/{id}/upvote");

    let (_, first) = harness.request_as("b@x.com", Method::PATCH, &uri, None).await;
    assert_eq!(first["upvoted"], true);
    assert_eq!(first["totalUpvotes"], 1);

    let (status, second) = harness.request_as("b@x.com", Method::PATCH, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["alreadyUpvoted"], true);
    assert_eq!(second["totalUpvotes"], 1);

    let (_, own) = harness.request_as("a@x.com", Method::PATCH, &uri, None).await;
    assert_eq!(own["upvoted"], false);
    assert_eq!(own["message"], "already upvoted or self-upvote");

    let (_, issue) = harness
        .request_as("a@x.com", Method::GET, &format!("/issues/{id}"), None)
        .await;
    assert_eq!(issue["upvotes"], json!(["b@x.com"]));
}

#[tokio::test]
async fn status_and_except_status_partition_the_listing() {
    let harness = harness().await;
    let first = report(&harness, "a@x.com", "One").await;
    report(&harness, "a@x.com", "Two").await;
    report(&harness, "a@x.com", "Three").await;

    let (_, changed) = harness
        .request_as(
            STAFF,
            Method::PATCH,
            &format!("/issues/{first}/change-status"),
            Some(json!({"status": "resolved"})),
        )
        .await;
    assert_eq!(changed["modifiedCount"], 1);

    let (_, resolved) = harness
        .request(Method::GET, "/issues?status=resolved", None, None)
        .await;
    let (_, rest) = harness
        .request(Method::GET, "/issues?exceptStatus=resolved", None, None)
        .await;
    assert_eq!(resolved["total"], 1);
    assert_eq!(rest["total"], 2);
    assert_eq!(ids(&resolved["result"]), vec![first.clone()]);
    assert!(!ids(&rest["result"]).contains(&first));

    let (_, trail) = harness
        .request_as(STAFF, Method::GET, &format!("/issues/trackings/{first}"), None)
        .await;
    assert_eq!(trail[0]["issueStatus"], "resolved");
    assert_eq!(trail[0]["kind"], "status-change");
}

#[tokio::test]
async fn unknown_status_filter_is_rejected() {
    let harness = harness().await;
    let (status, body) = harness
        .request(Method::GET, "/issues?status=closed", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("closed"));
}

#[tokio::test]
async fn unknown_status_change_is_rejected() {
    let harness = harness().await;
    let id = report(&harness, "a@x.com", "Pothole").await;
    let (status, body) = harness
        .request_as(
            STAFF,
            Method::PATCH,
            &format!("/issues/{id}/change-status"),
            Some(json!({"status": "closed"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string(), "{body}");

    let (_, trail) = harness
        .request_as(STAFF, Method::GET, &format!("/issues/trackings/{id}"), None)
        .await;
    assert_eq!(trail, json!([]));

    let (_, issue) = harness
        .request_as(STAFF, Method::GET, &format!("/issues/{id}"), None)
        .await;
    assert_eq!(issue["status"], "pending");
}

#[tokio::test]
async fn boosted_issues_list_first_then_oldest() {
    let harness = harness().await;
    let older = report(&harness, "a@x.com", "Older").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let newer = report(&harness, "a@x.com", "Newer").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let boosted = report(&harness, "a@x.com", "Boosted").await;

    let (_, checkout) = harness
        .request_as(
            "a@x.com",
            Method::POST,
            "/payments/boost-issue/checkout",
            Some(json!({"issueId": boosted})),
        )
        .await;
    let session = checkout["sessionId"].as_str().unwrap();
    assert!(harness.gateway.mark_paid(session));
    harness
        .request_as(
            "a@x.com",
            Method::PATCH,
            &format!("/update-boost?session_id={session}"),
            None,
        )
        .await;

    let (_, listing) = harness.request(Method::GET, "/issues", None, None).await;
    assert_eq!(ids(&listing["result"]), vec![boosted, older, newer]);
    assert_eq!(listing["result"][0]["priority"], "high");
}

// ---- Payments ----

#[tokio::test]
async fn double_boost_confirmation_records_once() {
    let harness = harness().await;
    let id = report(&harness, "a@x.com", "Streetlight").await;

    let (_, checkout) = harness
        .request_as(
            "a@x.com",
            Method::POST,
            "/payments/boost-issue/checkout",
            Some(json!({"issueId": id})),
        )
        .await;
    let session = checkout["sessionId"].as_str().unwrap().to_string();
    assert!(checkout["url"].as_str().unwrap().starts_with("https://"));

    let confirm = format!("/update-boost?session_id={session}");
    let (status, unpaid) = harness.request_as("a@x.com", Method::PATCH, &confirm, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unpaid["success"], false);

    harness.gateway.mark_paid(&session);
    let (_, first) = harness.request_as("a@x.com", Method::PATCH, &confirm, None).await;
    let (_, second) = harness.request_as("a@x.com", Method::PATCH, &confirm, None).await;
    assert_eq!(first["success"], true);
    assert_eq!(first["alreadyRecorded"], false);
    assert_eq!(second["alreadyRecorded"], true);
    assert_eq!(first["payment"]["_id"], second["payment"]["_id"]);

    let (_, payments) = harness.request_as(ADMIN, Method::GET, "/payments", None).await;
    assert_eq!(payments.as_array().unwrap().len(), 1);
    assert_eq!(payments[0]["type"], "PAYMENT");
    assert_eq!(payments[0]["amount"], 100);

    let (_, trail) = harness
        .request_as("a@x.com", Method::GET, &format!("/issues/trackings/{id}"), None)
        .await;
    let boosts = trail
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["issueNote"] == "Issue boosted")
        .count();
    assert_eq!(boosts, 1);
}

#[tokio::test]
async fn subscription_confirmation_marks_user_premium() {
    let harness = harness().await;
    harness
        .request(
            Method::POST,
            "/users",
            None,
            Some(json!({"email": "c@x.com", "displayName": "C"})),
        )
        .await;

    let (_, checkout) = harness
        .request_as("c@x.com", Method::POST, "/payments/subscribe/checkout", None)
        .await;
    let session = checkout["sessionId"].as_str().unwrap().to_string();
    harness.gateway.mark_paid(&session);
    let (_, confirmed) = harness
        .request_as(
            "c@x.com",
            Method::PATCH,
            &format!("/update-subscription?session_id={session}"),
            None,
        )
        .await;
    assert_eq!(confirmed["success"], true);

    let (_, users) = harness
        .request_as("c@x.com", Method::GET, "/users?email=c@x.com", None)
        .await;
    assert_eq!(users[0]["isPremium"], true);

    let (_, own) = harness.request_as("c@x.com", Method::GET, "/payments", None).await;
    let (_, other) = harness.request_as("d@x.com", Method::GET, "/payments", None).await;
    assert_eq!(own.as_array().unwrap().len(), 1);
    assert_eq!(other, json!([]));
}

#[tokio::test]
async fn unknown_checkout_session_is_a_server_error() {
    let harness = harness().await;
    let (status, body) = harness
        .request_as("a@x.com", Method::PATCH, "/update-subscription?session_id=cs_nope", None)
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].is_string());
}

// ---- Accounts and staff ----

#[tokio::test]
async fn duplicate_signup_returns_message() {
    let harness = harness().await;
    let body = json!({"email": "c@x.com", "displayName": "C", "isPremium": true});
    let (_, first) = harness.request(Method::POST, "/users", None, Some(body.clone())).await;
    let (status, second) = harness.request(Method::POST, "/users", None, Some(body)).await;
    assert_eq!(first["acknowledged"], true);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["message"], "user already exists");

    let (_, users) = harness
        .request_as("c@x.com", Method::GET, "/users?email=c@x.com", None)
        .await;
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["isPremium"], false);
    assert_eq!(users[0]["role"], "user");
}

#[tokio::test]
async fn staff_creation_paths_share_email_uniqueness() {
    let harness = harness().await;

    let (status, created) = harness
        .request_as(
            ADMIN,
            Method::POST,
            "/admin/create-staff",
            Some(json!({"name": "S", "email": "s@city.gov", "password": "hunter22"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["acknowledged"], true);

    let (status, dup) = harness
        .request(
            Method::POST,
            "/staffs",
            None,
            Some(json!({"displayName": "S", "email": "s@city.gov"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dup["message"], "already registered as a staff");

    harness
        .request(Method::POST, "/staffs", None, Some(json!({"email": "t@city.gov"})))
        .await;
    let (status, dup) = harness
        .request_as(
            ADMIN,
            Method::POST,
            "/admin/create-staff",
            Some(json!({"name": "T", "email": "t@city.gov", "password": "hunter22"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dup["message"], "already registered as a staff");
    assert_eq!(harness.identity.created_accounts(), vec!["s@city.gov".to_string()]);

    let (_, staffs) = harness.request_as(ADMIN, Method::GET, "/staffs", None).await;
    let t = staffs
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["email"] == "t@city.gov")
        .unwrap();
    assert_eq!(t["status"], "pending");
    assert_eq!(t["workStatus"], "unavailable");
}

#[tokio::test]
async fn identity_rejection_fails_staff_creation() {
    let harness = harness().await;
    harness.identity.reject_accounts("WEAK_PASSWORD");
    let (status, body) = harness
        .request_as(
            ADMIN,
            Method::POST,
            "/admin/create-staff",
            Some(json!({"name": "S", "email": "s@city.gov", "password": "x"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "WEAK_PASSWORD");

    let (_, role) = harness
        .request_as(ADMIN, Method::GET, "/user/role/s@city.gov", None)
        .await;
    assert_eq!(role["role"], Value::Null);
}

#[tokio::test]
async fn incomplete_staff_provisioning_is_bad_request() {
    let harness = harness().await;
    let (status, body) = harness
        .request_as(
            ADMIN,
            Method::POST,
            "/admin/create-staff",
            Some(json!({"name": "S", "email": "s@city.gov"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("password"), "{body}");
    assert!(harness.identity.created_accounts().is_empty());
}

#[tokio::test]
async fn staff_may_only_edit_own_record() {
    let harness = harness().await;
    let (_, staffs) = harness.request_as(ADMIN, Method::GET, "/staffs", None).await;
    let id_of = |email: &str| {
        staffs
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["email"] == email)
            .map(|s| s["_id"].as_str().unwrap().to_string())
            .unwrap()
    };
    let own = id_of(STAFF);
    let admin = id_of(ADMIN);

    let (status, result) = harness
        .request_as(
            STAFF,
            Method::PATCH,
            &format!("/staffs/{own}"),
            Some(json!({"phone": "555-0100", "role": "admin"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["modifiedCount"], 1);
    let (_, role) = harness
        .request_as(STAFF, Method::GET, &format!("/user/role/{STAFF}"), None)
        .await;
    assert_eq!(role["role"], "staff");

    let (status, _) = harness
        .request_as(
            STAFF,
            Method::PATCH,
            &format!("/staffs/{admin}"),
            Some(json!({"phone": "555-0199"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ---- Identity gate ----

#[tokio::test]
async fn token_routes_require_a_valid_bearer() {
    let harness = harness().await;
    let (status, body) = harness.request(Method::GET, "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "unauthorized access");

    let (status, _) = harness
        .request(Method::GET, "/users", Some("forged"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = harness.request(Method::GET, "/issues", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_routes_reject_non_admins() {
    let harness = harness().await;
    let (status, body) = harness
        .request_as(STAFF, Method::GET, "/stats/admin", None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "forbidden access");

    let (status, _) = harness.request(Method::GET, "/stats/admin", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, stats) = harness
        .request_as(ADMIN, Method::GET, "/stats/admin", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalStaffs"], 2);
    assert_eq!(stats["statusCounts"].as_array().unwrap().len(), 4);
}

// ---- Stats ----

#[tokio::test]
async fn staff_dashboard_lists_todays_assignments() {
    let harness = harness().await;
    let id = report(&harness, "a@x.com", "Broken bench").await;

    harness
        .request_as(
            ADMIN,
            Method::PATCH,
            &format!("/issues/{id}"),
            Some(json!({"assignedStaff": {"email": STAFF, "name": "Crew"}})),
        )
        .await;
    harness
        .request_as(
            ADMIN,
            Method::POST,
            "/issues/trackings",
            Some(json!({"issueId": id, "issueStatus": "pending", "issueNote": "Issue assigned to Staff: Crew"})),
        )
        .await;

    let (status, stats) = harness
        .request_as(STAFF, Method::GET, "/stats/staffs?tzOffsetMinutes=360", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalAssigned"], 1);
    assert_eq!(stats["todaysTasks"][0]["issue"]["_id"], id.as_str());
    assert_eq!(stats["todaysTasks"][0]["tracking"]["kind"], "assignment");

    let (_, mine) = harness.request_as("a@x.com", Method::GET, "/stats/users", None).await;
    assert_eq!(mine["totalIssues"], 1);
    assert_eq!(mine["totalPaid"], 0);
}
