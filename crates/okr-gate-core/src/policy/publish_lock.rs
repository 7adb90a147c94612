// crates/okr-gate-core/src/policy/publish_lock.rs
// ============================================================================
// Module: OKR Gate Publish Lock
// Description: Mutation restriction for published or cycle-locked content.
// Purpose: Stop post-publication rewrites except by tenant-level authority.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Lock governance applies to structural content mutations (`create_okr`
//! under existing content, `edit_okr`, `delete_okr`, `publish_okr`). Content
//! is locked when it is published or when its cycle is LOCKED or ARCHIVED.
//! Only tenant owners and tenant admins of the content's tenant may mutate
//! locked content; the object's own owner and scoped leads may not.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::actions::Action;
use crate::core::context::UserContext;
use crate::core::decision::Decision;
use crate::core::decision::ReasonCode;
use crate::core::resource::ContentObject;
use crate::core::resource::CycleState;

// ============================================================================
// SECTION: Lock State
// ============================================================================

/// Reason content is locked against mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    /// Content is published.
    Published,
    /// Containing cycle is locked.
    CycleLocked,
    /// Containing cycle is archived.
    CycleArchived,
}

impl LockKind {
    /// Returns the stable detail label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::CycleLocked => "cycle_locked",
            Self::CycleArchived => "cycle_archived",
        }
    }

    /// Converts the lock into a deny decision.
    #[must_use]
    pub fn into_decision(self) -> Decision {
        Decision::deny(ReasonCode::PublishLock).with_detail("lock", self.as_str())
    }
}

/// Returns the lock currently applying to the content, if any.
///
/// Publication is reported ahead of cycle state.
#[must_use]
pub fn lock_state(content: &ContentObject) -> Option<LockKind> {
    if content.is_published {
        return Some(LockKind::Published);
    }
    let state = content.cycle_state.filter(|state| state.is_locked())?;
    if state == CycleState::Archived {
        Some(LockKind::CycleArchived)
    } else {
        Some(LockKind::CycleLocked)
    }
}

// ============================================================================
// SECTION: Governance
// ============================================================================

/// Checks a content mutation against publish and cycle locks.
///
/// # Errors
///
/// Returns the [`LockKind`] blocking the mutation.
pub fn assert_not_locked(
    action: Action,
    content: &ContentObject,
    user: &UserContext,
) -> Result<(), LockKind> {
    if !action.is_lock_governed() {
        return Ok(());
    }
    let Some(lock) = lock_state(content) else {
        return Ok(());
    };
    if user.is_tenant_admin(&content.tenant_id) {
        return Ok(());
    }
    Err(lock)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
