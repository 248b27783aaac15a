//! crates/compliance_core/src/identity.rs
//!
//! Maps an authenticated account id to its roles, persona and verification state.
//!
//! Resolution never fails outward: a store error degrades to the empty identity,
//! and a lookup that overruns its deadline reports "no session" to the caller.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Persona, ResolvedIdentity, Role, RoleSet};
use crate::ports::{IdentityStore, PortResult};

/// Derives a persona for accounts that never stored one.
pub fn derive_persona(roles: &RoleSet) -> Option<Persona> {
    if roles.contains(Role::Admin) {
        Some(Persona::Admin)
    } else if roles.contains(Role::Manager) {
        Some(Persona::ExternalCa)
    } else if roles.contains(Role::User) {
        Some(Persona::CompanyOwner)
    } else {
        None
    }
}

#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
    deadline: Duration,
}

impl IdentityResolver {
    pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(3);

    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self {
            store,
            deadline: Self::DEFAULT_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Resolves an identity, bounded by the configured deadline.
    ///
    /// Returns `None` when the deadline expires; callers treat that as logged out.
    pub async fn resolve_within_deadline(&self, user_id: Uuid) -> Option<ResolvedIdentity> {
        match tokio::time::timeout(self.deadline, self.resolve(user_id)).await {
            Ok(identity) => Some(identity),
            Err(_) => {
                warn!(
                    "Identity resolution for {} exceeded {:?}; treating as signed out",
                    user_id, self.deadline
                );
                None
            }
        }
    }

    /// Resolves an identity without a deadline. Store errors yield the empty identity.
    pub async fn resolve(&self, user_id: Uuid) -> ResolvedIdentity {
        match self.lookup(user_id).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Identity lookup failed for {}: {}", user_id, e);
                ResolvedIdentity::empty(user_id)
            }
        }
    }

    async fn lookup(&self, user_id: Uuid) -> PortResult<ResolvedIdentity> {
        let (roles, stored_persona, verification) = tokio::try_join!(
            self.store.get_roles(user_id),
            self.store.get_persona(user_id),
            self.store.get_verification(user_id),
        )?;

        let roles: RoleSet = roles.into_iter().collect();
        let persona = stored_persona.or_else(|| derive_persona(&roles));
        let verified = verification.is_some_and(|v| v.status.is_approved());

        info!(
            "Resolved identity for {}: primary_role={:?} persona={:?} verified={}",
            user_id,
            roles.primary(),
            persona,
            verified
        );

        Ok(ResolvedIdentity {
            user_id,
            roles,
            persona,
            verified,
        })
    }
}
