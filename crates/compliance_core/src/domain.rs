//! crates/compliance_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These types are independent of any database row layout or HTTP payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Returned when a stored or submitted string does not name a known enum value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised {kind} value '{value}'")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

//=========================================================================================
// Roles
//=========================================================================================

/// Coarse RBAC role. Priority: admin > manager > user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::User];

    pub fn priority(self) -> u8 {
        match self {
            Role::Admin => 3,
            Role::Manager => 2,
            Role::User => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| UnknownValue {
                kind: "role",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of roles held by one account. Duplicates collapse; iteration order is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when at least one of `allowed` is held.
    pub fn intersects(&self, allowed: &[Role]) -> bool {
        allowed.iter().any(|r| self.0.contains(r))
    }

    /// Roles ordered from highest to lowest priority.
    pub fn by_priority(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.0.iter().copied().collect();
        roles.sort_by(|a, b| b.priority().cmp(&a.priority()));
        roles
    }

    /// The highest-priority role, if any.
    pub fn primary(&self) -> Option<Role> {
        self.by_priority().into_iter().next()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

//=========================================================================================
// Personas
//=========================================================================================

/// Fine-grained account classification used for dashboard routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    CompanyOwner,
    ExternalCa,
    CaFirm,
    InHouseCa,
    InHouseLawyer,
    Admin,
}

impl Persona {
    pub const ALL: [Persona; 6] = [
        Persona::CompanyOwner,
        Persona::ExternalCa,
        Persona::CaFirm,
        Persona::InHouseCa,
        Persona::InHouseLawyer,
        Persona::Admin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Persona::CompanyOwner => "company_owner",
            Persona::ExternalCa => "external_ca",
            Persona::CaFirm => "ca_firm",
            Persona::InHouseCa => "in_house_ca",
            Persona::InHouseLawyer => "in_house_lawyer",
            Persona::Admin => "admin",
        }
    }

    /// Whether this persona needs an approved verification record before landing.
    pub fn requires_verification(self) -> bool {
        match self {
            Persona::CompanyOwner
            | Persona::ExternalCa
            | Persona::CaFirm
            | Persona::InHouseCa
            | Persona::InHouseLawyer
            | Persona::Admin => true,
        }
    }
}

impl FromStr for Persona {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Persona::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| UnknownValue {
                kind: "persona",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// Verification
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    NotSubmitted,
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::NotSubmitted => "not_submitted",
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub fn is_approved(self) -> bool {
        self == VerificationStatus::Approved
    }
}

impl FromStr for VerificationStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "not_submitted" => Ok(VerificationStatus::NotSubmitted),
            "pending" => Ok(VerificationStatus::Pending),
            // Older rows used "verified" for the approved state.
            "approved" | "verified" => Ok(VerificationStatus::Approved),
            "rejected" => Ok(VerificationStatus::Rejected),
            other => Err(UnknownValue {
                kind: "verification status",
                value: other.to_string(),
            }),
        }
    }
}

/// One KYC/credential record per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub user_id: Uuid,
    pub status: VerificationStatus,
    pub full_name: String,
    pub license_number: Option<String>,
    pub organization: Option<String>,
    pub document_url: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// The identity/license metadata a user submits for review.
#[derive(Debug, Clone)]
pub struct VerificationSubmission {
    pub full_name: String,
    pub license_number: Option<String>,
    pub organization: Option<String>,
    pub document_url: Option<String>,
}

//=========================================================================================
// Accounts & Sessions
//=========================================================================================

#[derive(Debug, Clone)]
pub struct Account {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// The output of identity resolution for one authenticated account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub user_id: Uuid,
    pub roles: RoleSet,
    pub persona: Option<Persona>,
    pub verified: bool,
}

impl ResolvedIdentity {
    /// The fail-safe identity: no roles, no persona, unverified.
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            roles: RoleSet::new(),
            persona: None,
            verified: false,
        }
    }

    pub fn primary_role(&self) -> Option<Role> {
        self.roles.primary()
    }
}

//=========================================================================================
// Chat
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of a conversation forwarded to the LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}
