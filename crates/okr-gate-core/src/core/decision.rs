// crates/okr-gate-core/src/core/decision.rs
// ============================================================================
// Module: OKR Gate Decisions
// Description: Decision value and stable reason codes.
// Purpose: Represent every authorization outcome as data, never as an error.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every call to the decision engine returns a [`Decision`]: an allow flag, a
//! stable [`ReasonCode`], and an optional structured details map. Reason codes
//! serialize as fixed upper-case strings consumed by callers and tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Reason Codes
// ============================================================================

/// Stable decision reason codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// Every step passed.
    Allow,
    /// Permission matrix denied the action for the actor's roles.
    RoleDeny,
    /// Mutation crosses or lacks a tenant boundary.
    TenantBoundary,
    /// Visibility policy narrowed the read away.
    PrivateVisibility,
    /// Content is published or its cycle is locked.
    PublishLock,
    /// Superuser attempted a mutation.
    SuperuserReadOnly,
}

impl ReasonCode {
    /// All reason codes.
    pub const ALL: [Self; 6] = [
        Self::Allow,
        Self::RoleDeny,
        Self::TenantBoundary,
        Self::PrivateVisibility,
        Self::PublishLock,
        Self::SuperuserReadOnly,
    ];

    /// Returns the stable label for the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "ALLOW",
            Self::RoleDeny => "ROLE_DENY",
            Self::TenantBoundary => "TENANT_BOUNDARY",
            Self::PrivateVisibility => "PRIVATE_VISIBILITY",
            Self::PublishLock => "PUBLISH_LOCK",
            Self::SuperuserReadOnly => "SUPERUSER_READ_ONLY",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Authorization decision for one (actor, action, resource) triple.
///
/// # Invariants
/// - `allow` is true exactly when `reason` is [`ReasonCode::Allow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the action may proceed.
    pub allow: bool,
    /// Stable reason code.
    pub reason: ReasonCode,
    /// Structured, machine-readable details.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl Decision {
    /// Returns an allow decision.
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            allow: true,
            reason: ReasonCode::Allow,
            details: BTreeMap::new(),
        }
    }

    /// Returns a deny decision with the given reason.
    #[must_use]
    pub const fn deny(reason: ReasonCode) -> Self {
        Self {
            allow: false,
            reason,
            details: BTreeMap::new(),
        }
    }

    /// Returns a copy with one detail entry added.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Returns true for deny decisions.
    #[must_use]
    pub const fn is_deny(&self) -> bool {
        !self.allow
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only serialization unwraps.")]

    use super::Decision;
    use super::ReasonCode;

    #[test]
    fn reason_codes_serialize_as_their_labels() {
        for code in ReasonCode::ALL {
            let value = serde_json::to_value(code).unwrap();
            assert_eq!(value, serde_json::Value::String(code.as_str().to_string()));
        }
    }

    #[test]
    fn only_allow_is_not_a_deny() {
        for code in ReasonCode::ALL {
            let decision =
                if code == ReasonCode::Allow { Decision::allow() } else { Decision::deny(code) };
            assert_eq!(decision.is_deny(), code != ReasonCode::Allow);
        }
    }
}
