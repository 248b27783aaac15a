//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! `IdentityStore` and `AccountStore` ports from the `core` crate. It handles all
//! interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use compliance_core::domain::{
    Account, AccountCredentials, Persona, Role, VerificationRecord, VerificationStatus,
    VerificationSubmission,
};
use compliance_core::ports::{AccountStore, IdentityStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the persistence ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct AccountRecord {
    user_id: Uuid,
    email: String,
}
impl AccountRecord {
    fn to_domain(self) -> Account {
        Account {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> AccountCredentials {
        AccountCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct VerificationRow {
    user_id: Uuid,
    status: String,
    full_name: String,
    license_number: Option<String>,
    organization: Option<String>,
    document_url: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
}
impl VerificationRow {
    fn to_domain(self) -> VerificationRecord {
        let status = self.status.parse().unwrap_or_else(|e| {
            warn!("Verification for {} has {}; treating as not submitted", self.user_id, e);
            VerificationStatus::NotSubmitted
        });
        VerificationRecord {
            user_id: self.user_id,
            status,
            full_name: self.full_name,
            license_number: self.license_number,
            organization: self.organization,
            document_url: self.document_url,
            submitted_at: self.submitted_at,
        }
    }
}

const VERIFICATION_COLUMNS: &str =
    "user_id, status, full_name, license_number, organization, document_url, submitted_at";

//=========================================================================================
// `IdentityStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityStore for DbAdapter {
    async fn get_roles(&self, user_id: Uuid) -> PortResult<Vec<Role>> {
        let rows: Vec<String> =
            sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(unexpected)?;

        Ok(rows
            .iter()
            .filter_map(|raw| match raw.parse::<Role>() {
                Ok(role) => Some(role),
                Err(e) => {
                    warn!("Ignoring {} for user {}", e, user_id);
                    None
                }
            })
            .collect())
    }

    async fn get_persona(&self, user_id: Uuid) -> PortResult<Option<Persona>> {
        let raw: Option<Option<String>> =
            sqlx::query_scalar("SELECT persona FROM profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(unexpected)?;

        Ok(raw.flatten().and_then(|p| match p.parse::<Persona>() {
            Ok(persona) => Some(persona),
            Err(e) => {
                warn!("Ignoring {} for user {}", e, user_id);
                None
            }
        }))
    }

    async fn get_verification(&self, user_id: Uuid) -> PortResult<Option<VerificationRecord>> {
        let row = sqlx::query_as::<_, VerificationRow>(&format!(
            "SELECT {VERIFICATION_COLUMNS} FROM verifications WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(row.map(VerificationRow::to_domain))
    }
}

//=========================================================================================
// `AccountStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl AccountStore for DbAdapter {
    async fn create_account(&self, email: &str, hashed_password: &str) -> PortResult<Account> {
        let record = sqlx::query_as::<_, AccountRecord>(
            "INSERT INTO accounts (user_id, email, hashed_password) VALUES ($1, $2, $3) RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::Conflict(format!("An account for {} already exists", email))
            }
            other => unexpected(other),
        })?;
        Ok(record.to_domain())
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<AccountCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM accounts WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Account {} not found", email)))?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn purge_expired_sessions(&self) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected())
    }

    async fn set_roles(&self, user_id: Uuid, roles: &[Role]) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        for role in roles {
            sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(user_id)
                .bind(role.as_str())
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
        }
        tx.commit().await.map_err(unexpected)
    }

    async fn set_persona(&self, user_id: Uuid, persona: Persona) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Only writes when no persona is stored yet.
        let stored = sqlx::query(
            "INSERT INTO profiles (user_id, persona) VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE SET persona = EXCLUDED.persona, updated_at = NOW()
             WHERE profiles.persona IS NULL",
        )
        .bind(user_id)
        .bind(persona.as_str())
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        if stored.rows_affected() == 0 {
            return Err(PortError::Conflict(
                "A persona has already been selected for this account".to_string(),
            ));
        }

        sqlx::query(
            "UPDATE verifications SET status = 'not_submitted', reviewed_at = NULL WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)
    }

    async fn submit_verification(
        &self,
        user_id: Uuid,
        submission: &VerificationSubmission,
    ) -> PortResult<VerificationRecord> {
        let row = sqlx::query_as::<_, VerificationRow>(&format!(
            "INSERT INTO verifications (user_id, status, full_name, license_number, organization, document_url, submitted_at)
             VALUES ($1, 'pending', $2, $3, $4, $5, NOW())
             ON CONFLICT (user_id) DO UPDATE SET
                status = 'pending',
                full_name = EXCLUDED.full_name,
                license_number = EXCLUDED.license_number,
                organization = EXCLUDED.organization,
                document_url = EXCLUDED.document_url,
                submitted_at = NOW(),
                reviewed_at = NULL
             RETURNING {VERIFICATION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&submission.full_name)
        .bind(&submission.license_number)
        .bind(&submission.organization)
        .bind(&submission.document_url)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(row.to_domain())
    }

    async fn set_verification_status(
        &self,
        user_id: Uuid,
        status: VerificationStatus,
    ) -> PortResult<VerificationRecord> {
        let row = sqlx::query_as::<_, VerificationRow>(&format!(
            "UPDATE verifications SET status = $2, reviewed_at = NOW() WHERE user_id = $1
             RETURNING {VERIFICATION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            not_found_or_unexpected(e, format!("No verification submitted by {}", user_id))
        })?;
        Ok(row.to_domain())
    }
}
