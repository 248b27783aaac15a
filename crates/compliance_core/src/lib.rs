pub mod chat;
pub mod domain;
pub mod draft;
pub mod guard;
pub mod identity;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::{ChatError, ChatProxy};
pub use domain::{
    Account, AccountCredentials, ChatMessage, ChatRole, Persona,
    ResolvedIdentity, Role, RoleSet, VerificationRecord, VerificationStatus,
    VerificationSubmission,
};
pub use guard::{land, Destination, LandingState, Resolution, RouteAccess, RouteGuard};
pub use identity::IdentityResolver;
pub use ports::{
    AccountStore, ChunkStream, IdentityStore, LlmService, PortError, PortResult,
};
