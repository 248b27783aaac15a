//! services/api/src/web/state.rs
//!
//! The shared application context, built once at startup and handed to every handler.

use compliance_core::{draft::DraftPipeline, AccountStore, ChatProxy, IdentityResolver};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub identity: IdentityResolver,
    pub drafts: DraftPipeline,
    pub chat: ChatProxy,
    pub config: Arc<Config>,
}

//=========================================================================================
// Caller (Specific to One Request)
//=========================================================================================

/// Who is making the current request, as established by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Account(Uuid),
}

impl Caller {
    pub fn account(self) -> Option<Uuid> {
        match self {
            Caller::Account(user_id) => Some(user_id),
            Caller::Anonymous => None,
        }
    }
}
