// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full HTTP router with mock adapters and a temp
//! SQLite database. Provides `request()` to drive a single call through the
//! router, including the identity gate.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use civic_config::model::{PaymentConfig, StorageConfig};
use civic_core::types::{NewStaff, Role, Staff};
use civic_core::CivicError;
use civic_gateway::{build_router, AppState};
use civic_storage::queries::staffs;
use civic_storage::Database;

use crate::mock_gateway::MockGateway;
use crate::mock_identity::MockIdentity;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    admins: Vec<String>,
    staffs: Vec<String>,
    payment: PaymentConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            admins: Vec::new(),
            staffs: Vec::new(),
            payment: PaymentConfig {
                site_domain: "http://site.test".to_string(),
                ..PaymentConfig::default()
            },
        }
    }

    /// Seed an active admin staff record.
    pub fn with_admin(mut self, email: &str) -> Self {
        self.admins.push(email.to_string());
        self
    }

    /// Seed an active staff record with role `staff`.
    pub fn with_staff(mut self, email: &str) -> Self {
        self.staffs.push(email.to_string());
        self
    }

    /// Override payment settings such as amounts or site domain.
    pub fn with_payment_config(mut self, payment: PaymentConfig) -> Self {
        self.payment = payment;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, CivicError> {
        let temp_dir = tempfile::TempDir::new().map_err(CivicError::storage)?;
        let db = Database::open_with(&StorageConfig {
            database_path: temp_dir.path().join("test.db").to_string_lossy().to_string(),
            wal_mode: true,
        })
        .await?;

        let seeds = self
            .admins
            .iter()
            .map(|e| (e, Role::Admin))
            .chain(self.staffs.iter().map(|e| (e, Role::Staff)));
        for (email, role) in seeds {
            let mut staff = Staff::provisioned(
                NewStaff {
                    email: email.clone(),
                    ..NewStaff::default()
                },
                format!("uid-{email}"),
            );
            staff.role = role;
            staffs::register_staff(&db, &staff).await?;
        }

        let identity = Arc::new(MockIdentity::new());
        let gateway = Arc::new(MockGateway::new());
        let state = AppState::new(db.clone(), identity.clone(), gateway.clone(), self.payment);

        Ok(TestHarness {
            router: build_router(state),
            db,
            identity,
            gateway,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    pub router: Router,
    /// Store handle shared with the router, for direct assertions.
    pub db: Database,
    pub identity: Arc<MockIdentity>,
    pub gateway: Arc<MockGateway>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Bearer token accepted by the mock identity provider for `email`.
    pub fn token_for(&self, email: &str) -> String {
        self.identity.issue_token(email)
    }

    /// Send one request through the router and decode the JSON response.
    ///
    /// An empty response body decodes as `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap_or_else(|e| panic!("invalid test request {uri}: {e}"));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {});
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map(|b| b.to_bytes())
            .unwrap_or_default();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    /// Shorthand for an authenticated request as `email`.
    pub async fn request_as(
        &self,
        email: &str,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let token = self.token_for(email);
        self.request(method, uri, Some(&token), body).await
    }
}
