//! Session model: the tri-state view value and the role claim mapping.
//!
//! DESIGN
//! ======
//! The whole authenticated surface hangs off one `SessionView` value, owned
//! by the resolver task and read by every page render. Roles are a closed set
//! with an explicit fallback that preserves the raw claim for display; beyond
//! that mapping the provider's claim is trusted as delivered.

use crate::provider::{TokenClaims, UserHandle};

// =============================================================================
// ROLE
// =============================================================================

/// Application role asserted by the provider's `role` claim.
///
/// The known variants are the claim values the platform assigns; anything
/// else lands in [`Role::Other`] rather than being rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    FacilityEngineer,
    SustainabilityDirector,
    Auditor,
    /// A claim value outside the known set, preserved verbatim.
    Other(String),
}

impl Role {
    /// Map a raw claim string onto the closed role set.
    #[must_use]
    pub fn from_claim(raw: &str) -> Self {
        match raw {
            "facility_engineer" => Self::FacilityEngineer,
            "sustainability_director" => Self::SustainabilityDirector,
            "auditor" => Self::Auditor,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Display label: the canonical claim string, or the raw value for
    /// unrecognized claims.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::FacilityEngineer => "facility_engineer",
            Self::SustainabilityDirector => "sustainability_director",
            Self::Auditor => "auditor",
            Self::Other(raw) => raw,
        }
    }
}

// =============================================================================
// SESSION VIEW
// =============================================================================

/// The view selector: which of the three pages the console renders.
///
/// Lifecycle: created as `Loading` at process start, mutated only by the
/// resolver in response to provider notifications, reset to `Anonymous` on
/// sign-out or provider-reported absence. There is no terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionView {
    /// No auth-state notification has arrived yet.
    Loading,
    /// The provider reports no signed-in user.
    Anonymous,
    /// A signed-in user with a resolved (possibly absent) role.
    Authenticated { user: UserHandle, role: Option<Role> },
}

impl SessionView {
    /// The view that follows a sign-in notification once claims resolve.
    #[must_use]
    pub fn authenticated(user: UserHandle, claims: &TokenClaims) -> Self {
        Self::Authenticated { user, role: claims.role.as_deref().map(Role::from_claim) }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
