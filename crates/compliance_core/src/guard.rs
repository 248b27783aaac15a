//! crates/compliance_core/src/guard.rs
//!
//! The landing state machine and the per-route allow-list guard.
//!
//! Routing never produces an error page: every failed check resolves to a
//! destination the user can act on.

use serde::Serialize;

use crate::domain::{Persona, ResolvedIdentity, Role};

/// Everywhere the guards can send a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Login,
    RoleSelection,
    Verification,
    /// The generic `/dashboard` entry, which re-runs [`land`].
    LandingRouter,
    AdminDashboard,
    LegalDashboard,
    CaDashboard,
    CaFirmDashboard,
    CompanyDashboard,
}

impl Destination {
    pub fn path(self) -> &'static str {
        match self {
            Destination::Login => "/login",
            Destination::RoleSelection => "/signup",
            Destination::Verification => "/verification",
            Destination::LandingRouter => "/dashboard",
            Destination::AdminDashboard => "/dashboard/admin",
            Destination::LegalDashboard => "/dashboard/legal",
            Destination::CaDashboard => "/dashboard/ca",
            Destination::CaFirmDashboard => "/dashboard/ca-firm",
            Destination::CompanyDashboard => "/dashboard/company",
        }
    }
}

/// Where identity resolution currently stands for one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Pending,
    Anonymous,
    Identified(ResolvedIdentity),
}

impl From<Option<ResolvedIdentity>> for Resolution {
    fn from(identity: Option<ResolvedIdentity>) -> Self {
        match identity {
            Some(identity) => Resolution::Identified(identity),
            None => Resolution::Anonymous,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandingState {
    Loading,
    Unauthenticated { return_to: Option<String> },
    NeedsRoleSelection,
    NeedsVerification,
    Landed(Destination),
}

impl LandingState {
    pub fn name(&self) -> &'static str {
        match self {
            LandingState::Loading => "loading",
            LandingState::Unauthenticated { .. } => "unauthenticated",
            LandingState::NeedsRoleSelection => "needs_role_selection",
            LandingState::NeedsVerification => "needs_verification",
            LandingState::Landed(_) => "landed",
        }
    }

    /// The destination to redirect to; `None` while loading.
    pub fn destination(&self) -> Option<Destination> {
        match self {
            LandingState::Loading => None,
            LandingState::Unauthenticated { .. } => Some(Destination::Login),
            LandingState::NeedsRoleSelection => Some(Destination::RoleSelection),
            LandingState::NeedsVerification => Some(Destination::Verification),
            LandingState::Landed(destination) => Some(*destination),
        }
    }
}

/// Picks the landing state for a navigation. Rules are evaluated strictly in order.
pub fn land(resolution: &Resolution, requested_path: Option<&str>) -> LandingState {
    let identity = match resolution {
        Resolution::Pending => return LandingState::Loading,
        Resolution::Anonymous => {
            return LandingState::Unauthenticated {
                return_to: requested_path.map(str::to_string),
            }
        }
        Resolution::Identified(identity) => identity,
    };

    match identity.persona {
        None if identity.roles.is_empty() => LandingState::NeedsRoleSelection,
        Some(persona) if persona.requires_verification() && !identity.verified => {
            LandingState::NeedsVerification
        }
        Some(persona) => LandingState::Landed(persona_destination(persona)),
        None => LandingState::Landed(role_destination(identity)),
    }
}

fn persona_destination(persona: Persona) -> Destination {
    match persona {
        Persona::Admin => Destination::AdminDashboard,
        Persona::InHouseLawyer => Destination::LegalDashboard,
        Persona::ExternalCa | Persona::InHouseCa => Destination::CaDashboard,
        Persona::CaFirm => Destination::CaFirmDashboard,
        Persona::CompanyOwner => Destination::CompanyDashboard,
    }
}

// Legacy role-only accounts.
fn role_destination(identity: &ResolvedIdentity) -> Destination {
    if identity.roles.contains(Role::Admin) {
        Destination::AdminDashboard
    } else if identity.roles.contains(Role::Manager) {
        Destination::CaDashboard
    } else {
        Destination::CompanyDashboard
    }
}

/// The outcome of a [`RouteGuard`] check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Checking,
    Granted,
    Redirect(Destination),
}

/// Allow-lists for one dashboard route. An empty list means "not restricted".
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    pub allowed_roles: Vec<Role>,
    pub allowed_personas: Vec<Persona>,
}

impl RouteGuard {
    pub fn new(allowed_roles: Vec<Role>, allowed_personas: Vec<Persona>) -> Self {
        Self {
            allowed_roles,
            allowed_personas,
        }
    }

    pub fn roles(allowed_roles: Vec<Role>) -> Self {
        Self::new(allowed_roles, Vec::new())
    }

    pub fn personas(allowed_personas: Vec<Persona>) -> Self {
        Self::new(Vec::new(), allowed_personas)
    }

    pub fn check(&self, resolution: &Resolution) -> RouteAccess {
        let identity = match resolution {
            Resolution::Pending => return RouteAccess::Checking,
            Resolution::Anonymous => return RouteAccess::Redirect(Destination::Login),
            Resolution::Identified(identity) => identity,
        };

        let persona_gate = !self.allowed_personas.is_empty();

        if !self.allowed_roles.is_empty() && !identity.roles.intersects(&self.allowed_roles) {
            return if persona_gate {
                RouteAccess::Redirect(Destination::LandingRouter)
            } else {
                RouteAccess::Redirect(Destination::CompanyDashboard)
            };
        }

        if persona_gate
            && !identity
                .persona
                .is_some_and(|p| self.allowed_personas.contains(&p))
        {
            return RouteAccess::Redirect(Destination::LandingRouter);
        }

        RouteAccess::Granted
    }
}
