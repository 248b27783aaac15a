//! crates/compliance_core/src/draft/mod.rs
//!
//! AI drafting of regulatory filings.

pub mod intelligence;
pub mod pipeline;
pub mod prompts;
pub mod request;

pub use intelligence::{Allegation, NoticeIntelligence, NoticeSnapshot};
pub use pipeline::{
    DraftError, DraftMetadata, DraftOutcome, DraftPipeline, PreparedDraft, ValidationPolicy,
};
pub use request::{DocumentType, DraftMode, DraftRequest};

use crate::domain::{ResolvedIdentity, Role};

/// Roles allowed to invoke drafting at the service boundary.
pub const DRAFTING_ROLES: [Role; 2] = [Role::Manager, Role::Admin];

pub fn can_request_drafts(identity: &ResolvedIdentity) -> bool {
    identity.roles.intersects(&DRAFTING_ROLES)
}
