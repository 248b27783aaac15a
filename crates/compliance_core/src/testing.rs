//! In-memory port fakes shared by the unit tests of this crate.

use async_trait::async_trait;
use futures::stream;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::{ChatMessage, Persona, Role, VerificationRecord, VerificationStatus};
use crate::ports::{ChunkStream, IdentityStore, LlmService, PortError, PortResult};

/// An LLM that replays scripted replies in order and records every call.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<PortResult<String>>>,
    chunks: Vec<String>,
    calls: AtomicUsize,
    systems: Mutex<Vec<String>>,
    inputs: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<PortResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    pub fn streaming(chunks: Vec<&str>) -> Self {
        Self {
            chunks: chunks.into_iter().map(String::from).collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn systems(&self) -> Vec<String> {
        self.systems.lock().unwrap().clone()
    }

    pub fn inputs(&self) -> Vec<Vec<ChatMessage>> {
        self.inputs.lock().unwrap().clone()
    }

    fn record(&self, system: &str, messages: &[ChatMessage]) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.systems.lock().unwrap().push(system.to_string());
        self.inputs.lock().unwrap().push(messages.to_vec());
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
        let items: Vec<PortResult<String>> = self.chunks.iter().cloned().map(Ok).collect();
        Ok(Box::pin(stream::iter(items)))
    }
}

/// An identity store backed by maps, with optional failure and latency injection.
#[derive(Default)]
pub struct MemoryIdentityStore {
    pub roles: HashMap<Uuid, Vec<Role>>,
    pub personas: HashMap<Uuid, Persona>,
    pub approved: Vec<Uuid>,
    pub fail: bool,
    pub delay: Option<Duration>,
}

impl MemoryIdentityStore {
    async fn pause(&self) -> PortResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(PortError::Unexpected("store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn get_roles(&self, user_id: Uuid) -> PortResult<Vec<Role>> {
        self.pause().await?;
        Ok(self.roles.get(&user_id).cloned().unwrap_or_default())
    }

    async fn get_persona(&self, user_id: Uuid) -> PortResult<Option<Persona>> {
        self.pause().await?;
        Ok(self.personas.get(&user_id).copied())
    }

    async fn get_verification(&self, user_id: Uuid) -> PortResult<Option<VerificationRecord>> {
        self.pause().await?;
        Ok(self.approved.contains(&user_id).then(|| VerificationRecord {
            user_id,
            status: VerificationStatus::Approved,
            full_name: "Test User".to_string(),
            license_number: None,
            organization: None,
            document_url: None,
            submitted_at: None,
        }))
    }
}
