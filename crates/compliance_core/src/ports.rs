//! crates/compliance_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the account database and the LLM gateway.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;
use uuid::Uuid;

use crate::domain::{
    Account, AccountCredentials, ChatMessage, Persona, Role, VerificationRecord,
    VerificationStatus, VerificationSubmission,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// The upstream asked us to slow down; retrying shortly is reasonable.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),
    /// The upstream account is out of credits; retrying will not help.
    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),
    #[error("Upstream call timed out: {0}")]
    Timeout(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// A stream of upstream completion chunks. Each item is the JSON text of one chunk.
pub type ChunkStream = Pin<Box<dyn Stream<Item = PortResult<String>> + Send>>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Read-only view of the role, persona and verification tables.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn get_roles(&self, user_id: Uuid) -> PortResult<Vec<Role>>;

    async fn get_persona(&self, user_id: Uuid) -> PortResult<Option<Persona>>;

    async fn get_verification(&self, user_id: Uuid) -> PortResult<Option<VerificationRecord>>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    // --- Auth Methods ---
    async fn create_account(&self, email: &str, hashed_password: &str) -> PortResult<Account>;

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<AccountCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    /// Removes every expired session; returns how many were removed.
    async fn purge_expired_sessions(&self) -> PortResult<u64>;

    // --- Roles, Persona & Verification ---
    /// Replaces the role set of an account.
    async fn set_roles(&self, user_id: Uuid, roles: &[Role]) -> PortResult<()>;

    /// Records the role-chooser selection. Fails with `Conflict` once a persona is stored.
    /// Any verification on file is reset to `NotSubmitted`, since it attested a different
    /// classification.
    async fn set_persona(&self, user_id: Uuid, persona: Persona) -> PortResult<()>;

    async fn submit_verification(
        &self,
        user_id: Uuid,
        submission: &VerificationSubmission,
    ) -> PortResult<VerificationRecord>;

    async fn set_verification_status(
        &self,
        user_id: Uuid,
        status: VerificationStatus,
    ) -> PortResult<VerificationRecord>;
}

/// An OpenAI-compatible chat-completion gateway.
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Runs one buffered completion and returns the assistant text.
    async fn complete(&self, system: &str, messages: &[ChatMessage]) -> PortResult<String>;

    /// Opens a streamed completion; chunks are forwarded as the upstream sent them.
    async fn stream(&self, system: &str, messages: &[ChatMessage]) -> PortResult<ChunkStream>;
}
