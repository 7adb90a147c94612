// crates/okr-gate-core/src/core/identifiers.rs
// ============================================================================
// Module: OKR Gate Identifiers
// Description: Canonical opaque identifiers for users, tenants, and scopes.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout OKR Gate.
//! Identifiers are opaque UTF-8 strings on the wire. A blank identifier is
//! representable (callers and storage rows may carry one) but is never treated
//! as a resolvable tenant by the decision engine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Declares an opaque string identifier newtype with the shared API surface.
macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true when the identifier is empty or whitespace only.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

string_identifier! {
    /// User (actor) identifier.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; no normalization is applied by this type.
    UserId
}

string_identifier! {
    /// Tenant (organization) identifier.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; blank values never match any tenant.
    TenantId
}

string_identifier! {
    /// Workspace identifier scoped within a tenant.
    WorkspaceId
}

string_identifier! {
    /// Team identifier scoped within a workspace.
    TeamId
}

string_identifier! {
    /// Content object identifier (objective, key result, or initiative).
    ObjectId
}
