// crates/okr-gate-core/src/core/time.rs
// ============================================================================
// Module: OKR Gate Time Model
// Description: Canonical timestamp representation for persisted records.
// Purpose: Keep the decision core free of wall-clock reads.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! OKR Gate records carry explicit timestamps supplied by the host. The
//! decision core never reads wall-clock time; cache expiry uses an injected
//! clock (see [`crate::runtime::cache`]).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp used on role assignment records.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(value: i64) -> Self {
        Self(value)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }
}
