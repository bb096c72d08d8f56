// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the storage, gateway, and payment crates.
//!
//! Records serialize with camelCase keys and `_id` identifiers so the JSON
//! shape matches what existing web clients already consume.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Timestamp layout used for every persisted `created_at`/`updated_at`.
///
/// Fixed-width UTC with millisecond precision, so lexicographic order in the
/// database equals chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Note substring that marks a tracking entry as a staff assignment event.
pub const ASSIGNMENT_MARKER: &str = "assigned to Staff";

/// Fixed note text written when a boost payment is confirmed.
pub const BOOST_NOTE: &str = "Issue boosted";

/// Current UTC time in [`TIMESTAMP_FORMAT`].
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Format a UTC instant in [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Generate a fresh record identifier.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// Identifies the kind of external collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Identity,
    Payment,
}

// --- Closed enums with exact wire strings ---

/// Lifecycle state of an issue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum IssueStatus {
    Pending,
    InProgress,
    Resolved,
    Rejected,
}

/// Triage priority of an issue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
}

/// Account role. Citizens are `user`; staff records carry `staff` or `admin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Staff,
    Admin,
}

/// Approval state of a staff record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StaffStatus {
    Pending,
    Active,
}

/// Whether a staff member is currently taking assignments.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WorkStatus {
    Available,
    Unavailable,
}

/// What a payment bought.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    /// Premium subscription for a user account.
    Subscription,
    /// One-off payment boosting a single issue.
    Payment,
}

/// Structured classification of a tracking entry.
///
/// Stored next to the free-text note, which stays the display text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TrackingKind {
    StatusChange,
    Assignment,
    Boost,
    Note,
}

impl TrackingKind {
    /// Classify a free-text note. Notes carrying [`ASSIGNMENT_MARKER`] are
    /// assignment events; everything else is a plain note.
    pub fn classify(note: &str) -> Self {
        if note.contains(ASSIGNMENT_MARKER) {
            TrackingKind::Assignment
        } else {
            TrackingKind::Note
        }
    }
}

// --- Records ---

/// An `{email, name}` pair used for reporters and assignees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// A citizen-reported civic problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: IssueStatus,
    pub priority: Priority,
    pub is_boosted: bool,
    /// Emails of everyone who upvoted. Never contains the reporter.
    pub upvotes: BTreeSet<String>,
    pub reported_by: Person,
    pub assigned_staff: Person,
    pub image: Option<String>,
    pub location: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Caller-controlled fields of a new issue report.
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub category: String,
    pub reported_by: Person,
    pub image: Option<String>,
    pub location: Option<String>,
}

impl Issue {
    /// Build a freshly reported issue. Lifecycle fields are always stamped
    /// from server state, whatever the caller sent.
    pub fn report(new: NewIssue) -> Self {
        let now = now_timestamp();
        Self {
            id: new_record_id(),
            title: new.title,
            description: new.description,
            category: new.category,
            status: IssueStatus::Pending,
            priority: Priority::Normal,
            is_boosted: false,
            upvotes: BTreeSet::new(),
            reported_by: new.reported_by,
            assigned_staff: Person::default(),
            image: new.image,
            location: new.location,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn upvote_count(&self) -> usize {
        self.upvotes.len()
    }
}

/// Sparse staff edit of an issue. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
    pub priority: Option<Priority>,
    pub assigned_staff: Option<Person>,
}

impl IssuePatch {
    /// Drop fields that are present but empty, so they are not applied.
    pub fn normalized(self) -> Self {
        fn keep(v: Option<String>) -> Option<String> {
            v.filter(|s| !s.trim().is_empty())
        }
        Self {
            title: keep(self.title),
            description: keep(self.description),
            category: keep(self.category),
            location: keep(self.location),
            image: keep(self.image),
            priority: self.priority,
            assigned_staff: self
                .assigned_staff
                .filter(|p| p.email.as_deref().is_some_and(|e| !e.trim().is_empty())),
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.location.is_none()
            && self.image.is_none()
            && self.priority.is_none()
            && self.assigned_staff.is_none()
    }
}

/// Query filters for issue listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub except_status: Option<IssueStatus>,
    pub reporter_email: Option<String>,
    pub staff_email: Option<String>,
    pub category: Option<String>,
    /// Case-insensitive substring matched against title or location.
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
}

/// Append-only audit entry describing a change to an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracking {
    #[serde(rename = "_id")]
    pub id: String,
    pub issue_id: String,
    pub issue_status: Option<String>,
    pub issue_note: String,
    pub kind: TrackingKind,
    pub created_at: String,
}

impl Tracking {
    pub fn new(
        issue_id: impl Into<String>,
        issue_status: Option<String>,
        issue_note: impl Into<String>,
        kind: TrackingKind,
    ) -> Self {
        Self {
            id: new_record_id(),
            issue_id: issue_id.into(),
            issue_status,
            issue_note: issue_note.into(),
            kind,
            created_at: now_timestamp(),
        }
    }
}

/// A citizen account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub is_premium: bool,
    pub role: Role,
    pub created_at: String,
}

/// Caller-controlled fields of a signup.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl User {
    /// A first-time signup: never premium, always role `user`.
    pub fn signup(new: NewUser) -> Self {
        Self {
            id: new_record_id(),
            email: new.email,
            display_name: new.display_name,
            photo_url: new.photo_url,
            is_premium: false,
            role: Role::User,
            created_at: now_timestamp(),
        }
    }
}

/// Profile fields a user may change about themselves.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

/// A privileged account that triages issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    #[serde(rename = "_id")]
    pub id: String,
    /// Identity-provider subject. Only set for admin-provisioned staff.
    pub uid: Option<String>,
    pub display_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub status: StaffStatus,
    pub work_status: WorkStatus,
    pub role: Role,
    pub created_at: String,
}

/// Caller-controlled fields shared by both staff-creation paths.
#[derive(Debug, Clone, Default)]
pub struct NewStaff {
    pub display_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
}

impl Staff {
    /// Staff created by an admin, backed by an identity-provider account.
    ///
    /// Defaults: `active`, `available`, role `staff`.
    pub fn provisioned(new: NewStaff, uid: String) -> Self {
        Self {
            id: new_record_id(),
            uid: Some(uid),
            display_name: new.display_name,
            email: new.email,
            phone: new.phone,
            photo_url: new.photo_url,
            status: StaffStatus::Active,
            work_status: WorkStatus::Available,
            role: Role::Staff,
            created_at: now_timestamp(),
        }
    }

    /// Staff who applied on their own. No identity account is created.
    ///
    /// Defaults: `pending`, `unavailable`, role `staff`.
    pub fn self_registered(new: NewStaff) -> Self {
        Self {
            id: new_record_id(),
            uid: None,
            display_name: new.display_name,
            email: new.email,
            phone: new.phone,
            photo_url: new.photo_url,
            status: StaffStatus::Pending,
            work_status: WorkStatus::Unavailable,
            role: Role::Staff,
            created_at: now_timestamp(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Sparse update of a staff record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffPatch {
    pub display_name: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub work_status: Option<WorkStatus>,
    /// Admin-only.
    pub status: Option<StaffStatus>,
    /// Admin-only.
    pub role: Option<Role>,
}

impl StaffPatch {
    /// Strip the fields only an admin may change.
    pub fn self_service(self) -> Self {
        Self {
            status: None,
            role: None,
            ..self
        }
    }
}

/// A confirmed payment. Written once per gateway session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: String,
    pub session_id: String,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub user_email: String,
    pub issue_id: Option<String>,
    pub amount: i64,
    pub created_at: String,
}

// --- Write acknowledgements ---

/// Result of inserting a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl InsertResult {
    pub fn new(inserted_id: impl Into<String>) -> Self {
        Self {
            acknowledged: true,
            inserted_id: inserted_id.into(),
        }
    }
}

/// Result of updating records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateResult {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
        }
    }
}

/// Result of deleting records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

/// Outcome of an insert-if-absent write: the stored record and whether this
/// call created it.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertIfAbsent<T> {
    pub record: T,
    pub inserted: bool,
}

// --- Identity provider types ---

/// An identity resolved from a verified bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: String,
    pub email: String,
}

/// Account to create at the identity provider for admin-provisioned staff.
#[derive(Clone)]
pub struct NewIdentityAccount {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl std::fmt::Debug for NewIdentityAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewIdentityAccount")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("display_name", &self.display_name)
            .finish()
    }
}

// --- Payment gateway types ---

/// Semantic metadata carried by a checkout session from initiation to
/// confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub user_email: String,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub amount: i64,
    pub issue_id: Option<String>,
}

/// Everything a gateway needs to open a checkout session.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub metadata: SessionMetadata,
    pub product_name: String,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A freshly opened checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
}

/// A checkout session as reported back by the gateway at confirmation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySession {
    pub session_id: String,
    pub paid: bool,
    pub metadata: SessionMetadata,
}

// --- Aggregations ---

/// Number of issues in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: IssueStatus,
    pub count: u64,
}

/// An assignment event joined to the issue it assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedTask {
    pub tracking: Tracking,
    pub issue: Issue,
}
