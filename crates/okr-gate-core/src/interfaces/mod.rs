// crates/okr-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: OKR Gate Interfaces
// Description: Backend-agnostic interfaces for role storage and context caching.
// Purpose: Define the contract surfaces consumed by the OKR Gate runtime.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how OKR Gate integrates with persistence and caching
//! without embedding backend-specific details. Implementations must fail
//! closed: a backend error is surfaced, never interpreted as a deny or an
//! empty role set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::context::UserContext;
use crate::core::identifiers::TeamId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::core::identifiers::WorkspaceId;
use crate::core::roles::AssignmentKey;
use crate::core::roles::RoleAssignment;

// ============================================================================
// SECTION: Role Store
// ============================================================================

/// User record facts needed to build a user context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// User identifier.
    pub user_id: UserId,
    /// Platform superuser flag.
    #[serde(default)]
    pub is_superuser: bool,
    /// Tenant the user belongs to, when recorded.
    #[serde(default)]
    pub home_tenant_id: Option<TenantId>,
}

/// Role store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("role store io error: {0}")]
    Io(String),
    /// Store reported an error.
    #[error("role store error: {0}")]
    Store(String),
    /// Write conflicts with an existing record.
    #[error("role store conflict: {0}")]
    Conflict(String),
    /// Input or stored data is invalid.
    #[error("role store invalid data: {0}")]
    Invalid(String),
    /// Referenced record does not exist.
    #[error("role store record not found: {0}")]
    NotFound(String),
    /// Stored data is corrupted or fails integrity checks.
    #[error("role store corruption: {0}")]
    Corrupt(String),
}

/// Scope & role store: role assignment rows plus the scope directory.
pub trait RoleStore: Send + Sync {
    /// Loads a user record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load_user(&self, user_id: &UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Inserts or replaces a user record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn save_user(&self, record: &UserRecord) -> Result<(), StoreError>;

    /// Loads every role assignment for a user in one pass.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn assignments_for_user(&self, user_id: &UserId) -> Result<Vec<RoleAssignment>, StoreError>;

    /// Inserts a role assignment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the assignment key already exists.
    fn insert_assignment(&self, assignment: &RoleAssignment) -> Result<(), StoreError>;

    /// Deletes a role assignment, returning true when a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn delete_assignment(&self, key: &AssignmentKey) -> Result<bool, StoreError>;

    /// Resolves the tenant owning a workspace.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn workspace_tenant(&self, workspace_id: &WorkspaceId) -> Result<Option<TenantId>, StoreError>;

    /// Resolves the workspace owning a team.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn team_workspace(&self, team_id: &TeamId) -> Result<Option<WorkspaceId>, StoreError>;

    /// Returns true when the tenant exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn tenant_exists(&self, tenant_id: &TenantId) -> Result<bool, StoreError>;
}

// ============================================================================
// SECTION: Context Cache
// ============================================================================

/// Token issued on a cache miss and required to populate the entry.
///
/// # Invariants
/// - A ticket issued before an invalidation of its user is stale; sets with a
///   stale ticket are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTicket {
    /// User the ticket was issued for.
    user_id: UserId,
    /// Cache generation observed when the ticket was issued.
    generation: u64,
}

impl CacheTicket {
    /// Creates a ticket for a user at a cache generation.
    #[must_use]
    pub const fn new(user_id: UserId, generation: u64) -> Self {
        Self {
            user_id,
            generation,
        }
    }

    /// Returns the user the ticket was issued for.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the generation the ticket was issued at.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Fresh cached context.
    Hit(UserContext),
    /// No fresh entry; rebuild and populate with the ticket.
    Miss(CacheTicket),
}

/// Context cache errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Cache backend is unavailable or its state is poisoned.
    #[error("context cache unavailable: {0}")]
    Unavailable(String),
}

/// Short-lived `UserContext` cache keyed by user.
pub trait ContextCache: Send + Sync {
    /// Looks up a fresh context for a user.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend is unavailable.
    fn get(&self, user_id: &UserId) -> Result<CacheLookup, CacheError>;

    /// Populates the entry named by a miss ticket; stale tickets are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend is unavailable.
    fn set(&self, ticket: CacheTicket, context: UserContext) -> Result<(), CacheError>;

    /// Drops the cached context for a user.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend is unavailable.
    fn invalidate(&self, user_id: &UserId) -> Result<(), CacheError>;

    /// Drops every cached context.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend is unavailable.
    fn invalidate_all(&self) -> Result<(), CacheError>;
}
