//! In-memory stand-ins for the database and the LLM gateway.

#![allow(dead_code)]

use api_lib::{
    config::Config,
    web::{self, state::AppState},
};
use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use compliance_core::{
    draft::{DraftPipeline, ValidationPolicy},
    Account, AccountCredentials, AccountStore, ChatMessage, ChatProxy, ChunkStream,
    IdentityResolver, IdentityStore, LlmService, Persona, PortError, PortResult, Role,
    VerificationRecord, VerificationStatus, VerificationSubmission,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

//=========================================================================================
// Accounts, Roles & Verification
//=========================================================================================

#[derive(Default)]
struct Tables {
    credentials: HashMap<String, AccountCredentials>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    roles: HashMap<Uuid, Vec<Role>>,
    personas: HashMap<Uuid, Persona>,
    verifications: HashMap<Uuid, VerificationRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Seeds an account with a live session and returns its id.
    pub fn seed(
        &self,
        token: &str,
        roles: &[Role],
        persona: Option<Persona>,
        status: Option<VerificationStatus>,
    ) -> Uuid {
        let user_id = Uuid::new_v4();
        let mut tables = self.tables.lock().unwrap();
        tables
            .sessions
            .insert(token.to_string(), (user_id, Utc::now() + Duration::hours(1)));
        tables.roles.insert(user_id, roles.to_vec());
        if let Some(persona) = persona {
            tables.personas.insert(user_id, persona);
        }
        if let Some(status) = status {
            tables
                .verifications
                .insert(user_id, record(user_id, status, "Seeded User"));
        }
        user_id
    }

    /// Stores a session for `user_id` that lapsed an hour ago.
    pub fn seed_expired_session(&self, token: &str, user_id: Uuid) {
        self.tables
            .lock()
            .unwrap()
            .sessions
            .insert(token.to_string(), (user_id, Utc::now() - Duration::hours(1)));
    }

    pub fn has_session(&self, token: &str) -> bool {
        self.tables.lock().unwrap().sessions.contains_key(token)
    }

    pub fn verification(&self, user_id: Uuid) -> Option<VerificationRecord> {
        self.tables.lock().unwrap().verifications.get(&user_id).cloned()
    }

    pub fn roles(&self, user_id: Uuid) -> Vec<Role> {
        self.tables
            .lock()
            .unwrap()
            .roles
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn persona(&self, user_id: Uuid) -> Option<Persona> {
        self.tables.lock().unwrap().personas.get(&user_id).copied()
    }
}

fn record(user_id: Uuid, status: VerificationStatus, full_name: &str) -> VerificationRecord {
    VerificationRecord {
        user_id,
        status,
        full_name: full_name.to_string(),
        license_number: None,
        organization: None,
        document_url: None,
        submitted_at: Some(Utc::now()),
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn get_roles(&self, user_id: Uuid) -> PortResult<Vec<Role>> {
        Ok(self.roles(user_id))
    }

    async fn get_persona(&self, user_id: Uuid) -> PortResult<Option<Persona>> {
        Ok(self.persona(user_id))
    }

    async fn get_verification(&self, user_id: Uuid) -> PortResult<Option<VerificationRecord>> {
        Ok(self.verification(user_id))
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_account(&self, email: &str, hashed_password: &str) -> PortResult<Account> {
        let mut tables = self.tables.lock().unwrap();
        if tables.credentials.contains_key(email) {
            return Err(PortError::Conflict(format!("{} is already registered", email)));
        }
        let user_id = Uuid::new_v4();
        tables.credentials.insert(
            email.to_string(),
            AccountCredentials {
                user_id,
                email: email.to_string(),
                hashed_password: hashed_password.to_string(),
            },
        );
        Ok(Account {
            user_id,
            email: email.to_string(),
        })
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<AccountCredentials> {
        self.tables
            .lock()
            .unwrap()
            .credentials
            .get(email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(email.to_string()))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.tables
            .lock()
            .unwrap()
            .sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        self.tables
            .lock()
            .unwrap()
            .sessions
            .get(session_id)
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(user_id, _)| *user_id)
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.lock().unwrap().sessions.remove(session_id);
        Ok(())
    }

    async fn purge_expired_sessions(&self) -> PortResult<u64> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.sessions.len();
        let now = Utc::now();
        tables.sessions.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn set_roles(&self, user_id: Uuid, roles: &[Role]) -> PortResult<()> {
        self.tables
            .lock()
            .unwrap()
            .roles
            .insert(user_id, roles.to_vec());
        Ok(())
    }

    async fn set_persona(&self, user_id: Uuid, persona: Persona) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if tables.personas.contains_key(&user_id) {
            return Err(PortError::Conflict(
                "A persona has already been selected for this account".to_string(),
            ));
        }
        tables.personas.insert(user_id, persona);
        if let Some(stored) = tables.verifications.get_mut(&user_id) {
            stored.status = VerificationStatus::NotSubmitted;
        }
        Ok(())
    }

    async fn submit_verification(
        &self,
        user_id: Uuid,
        submission: &VerificationSubmission,
    ) -> PortResult<VerificationRecord> {
        let mut stored = record(user_id, VerificationStatus::Pending, &submission.full_name);
        stored.license_number = submission.license_number.clone();
        stored.organization = submission.organization.clone();
        stored.document_url = submission.document_url.clone();
        self.tables
            .lock()
            .unwrap()
            .verifications
            .insert(user_id, stored.clone());
        Ok(stored)
    }

    async fn set_verification_status(
        &self,
        user_id: Uuid,
        status: VerificationStatus,
    ) -> PortResult<VerificationRecord> {
        let mut tables = self.tables.lock().unwrap();
        let stored = tables
            .verifications
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("verification for {}", user_id)))?;
        stored.status = status;
        Ok(stored.clone())
    }
}

//=========================================================================================
// LLM Gateway
//=========================================================================================

/// Replays scripted replies in order and records every call.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<PortResult<String>>>,
    chunks: Mutex<Option<Vec<PortResult<String>>>>,
    calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<PortResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        })
    }

    pub fn streaming(chunks: Vec<PortResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            chunks: Mutex::new(Some(chunks)),
            ..Self::default()
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn systems(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(system, _)| system.clone())
            .collect()
    }

    fn record(&self, system: &str, messages: &[ChatMessage]) {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), messages.to_vec()));
    }
}

#[async_trait]
impl LlmService for ScriptedLlm {
    async fn complete(&self, system: &str, messages: &[ChatMessage]) -> PortResult<String> {
        self.record(system, messages);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortError::Unexpected("no scripted reply".to_string())))
    }

    async fn stream(&self, system: &str, messages: &[ChatMessage]) -> PortResult<ChunkStream> {
        self.record(system, messages);
        let chunks = self
            .chunks
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| PortError::Unexpected("no scripted stream".to_string()))?;
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

//=========================================================================================
// Application
//=========================================================================================

pub fn config(extra: &[(&str, &str)]) -> Config {
    let mut env: HashMap<String, String> = HashMap::new();
    env.insert(
        "DATABASE_URL".to_string(),
        "postgres://localhost/compliance_test".to_string(),
    );
    for (key, value) in extra {
        env.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(|key| env.get(key).cloned()).unwrap()
}

/// Builds the full router over in-memory adapters. Drafting and chat share `llm`.
pub fn app(store: Arc<MemoryStore>, llm: Arc<ScriptedLlm>, env: &[(&str, &str)]) -> Router {
    let config = Arc::new(config(env));
    let state = AppState {
        accounts: store.clone(),
        identity: IdentityResolver::new(store).with_deadline(config.identity_timeout),
        drafts: DraftPipeline::new(
            llm.clone(),
            ValidationPolicy {
                min_notice_chars: config.strict_min_notice_chars,
            },
        ),
        chat: ChatProxy::new(llm),
        config,
    };
    web::router(Arc::new(state))
}
