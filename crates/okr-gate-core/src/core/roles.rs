// crates/okr-gate-core/src/core/roles.rs
// ============================================================================
// Module: OKR Gate Roles
// Description: Scope tiers, enumerated roles, and role assignment records.
// Purpose: Define the fixed role vocabulary consumed by the permission matrix.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Roles form a fixed enumerated set per scope tier. A [`RoleAssignment`]
//! binds one role to one user at one scope; assignments are immutable until
//! revoked. Superuser status is not a role and never appears here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::TeamId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::core::identifiers::WorkspaceId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Scope Tiers
// ============================================================================

/// Scope tier a role assignment applies at.
///
/// # Invariants
/// - Variants are ordered from widest (`Platform`) to narrowest (`Team`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeType {
    /// Platform-wide scope (no scope identifier).
    Platform,
    /// Tenant scope.
    Tenant,
    /// Workspace scope.
    Workspace,
    /// Team scope.
    Team,
}

impl ScopeType {
    /// Returns the stable label for the scope type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Platform => "PLATFORM",
            Self::Tenant => "TENANT",
            Self::Workspace => "WORKSPACE",
            Self::Team => "TEAM",
        }
    }

    /// Parses a stable scope type label (case-insensitive).
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "PLATFORM" => Some(Self::Platform),
            "TENANT" => Some(Self::Tenant),
            "WORKSPACE" => Some(Self::Workspace),
            "TEAM" => Some(Self::Team),
            _ => None,
        }
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Roles
// ============================================================================

/// Enumerated roles, grouped by the scope tier they are granted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Ultimate tenant authority.
    TenantOwner,
    /// Tenant administrator.
    TenantAdmin,
    /// Read-only tenant member.
    TenantViewer,
    /// Workspace lead.
    WorkspaceLead,
    /// Workspace member.
    WorkspaceMember,
    /// Team lead.
    TeamLead,
    /// Team contributor.
    TeamContributor,
}

impl Role {
    /// All roles in declaration order.
    pub const ALL: [Self; 7] = [
        Self::TenantOwner,
        Self::TenantAdmin,
        Self::TenantViewer,
        Self::WorkspaceLead,
        Self::WorkspaceMember,
        Self::TeamLead,
        Self::TeamContributor,
    ];

    /// Returns the scope tier this role is granted at.
    #[must_use]
    pub const fn scope_type(self) -> ScopeType {
        match self {
            Self::TenantOwner | Self::TenantAdmin | Self::TenantViewer => ScopeType::Tenant,
            Self::WorkspaceLead | Self::WorkspaceMember => ScopeType::Workspace,
            Self::TeamLead | Self::TeamContributor => ScopeType::Team,
        }
    }

    /// Returns true for the tenant-admin tier (owner or admin).
    #[must_use]
    pub const fn is_tenant_admin_tier(self) -> bool {
        matches!(self, Self::TenantOwner | Self::TenantAdmin)
    }

    /// Returns the stable label for the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TenantOwner => "TENANT_OWNER",
            Self::TenantAdmin => "TENANT_ADMIN",
            Self::TenantViewer => "TENANT_VIEWER",
            Self::WorkspaceLead => "WORKSPACE_LEAD",
            Self::WorkspaceMember => "WORKSPACE_MEMBER",
            Self::TeamLead => "TEAM_LEAD",
            Self::TeamContributor => "TEAM_CONTRIBUTOR",
        }
    }

    /// Parses a stable role label (case-insensitive).
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|role| role.as_str() == normalized)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Assignments
// ============================================================================

/// Scope a role assignment is bound to.
///
/// # Invariants
/// - `Platform` carries no identifier; every other tier carries exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "scope_type", content = "scope_id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentScope {
    /// Platform-wide scope.
    Platform,
    /// Tenant scope.
    Tenant(TenantId),
    /// Workspace scope.
    Workspace(WorkspaceId),
    /// Team scope.
    Team(TeamId),
}

impl AssignmentScope {
    /// Returns the scope tier.
    #[must_use]
    pub const fn scope_type(&self) -> ScopeType {
        match self {
            Self::Platform => ScopeType::Platform,
            Self::Tenant(_) => ScopeType::Tenant,
            Self::Workspace(_) => ScopeType::Workspace,
            Self::Team(_) => ScopeType::Team,
        }
    }

    /// Returns the raw scope identifier (`None` for platform scope).
    #[must_use]
    pub fn scope_id(&self) -> Option<&str> {
        match self {
            Self::Platform => None,
            Self::Tenant(id) => Some(id.as_str()),
            Self::Workspace(id) => Some(id.as_str()),
            Self::Team(id) => Some(id.as_str()),
        }
    }

    /// Rebuilds a scope from its persisted `(scope_type, scope_id)` columns.
    ///
    /// Returns `None` when the identifier presence does not match the tier.
    #[must_use]
    pub fn from_parts(scope_type: ScopeType, scope_id: Option<&str>) -> Option<Self> {
        match (scope_type, scope_id) {
            (ScopeType::Platform, None) => Some(Self::Platform),
            (ScopeType::Tenant, Some(id)) => Some(Self::Tenant(TenantId::new(id))),
            (ScopeType::Workspace, Some(id)) => Some(Self::Workspace(WorkspaceId::new(id))),
            (ScopeType::Team, Some(id)) => Some(Self::Team(TeamId::new(id))),
            _ => None,
        }
    }
}

/// Uniqueness key for a role assignment.
///
/// # Invariants
/// - At most one assignment exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssignmentKey {
    /// Assigned user.
    pub user_id: UserId,
    /// Assigned role.
    pub role: Role,
    /// Scope the role applies at.
    pub scope: AssignmentScope,
}

/// Persisted role assignment record.
///
/// # Invariants
/// - Immutable until revoked; never updated in place.
/// - Unique on `(user_id, role, scope)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Assigned user.
    pub user_id: UserId,
    /// Assigned role.
    pub role: Role,
    /// Scope the role applies at.
    pub scope: AssignmentScope,
    /// Creation timestamp supplied by the writer.
    pub created_at: Timestamp,
}

impl RoleAssignment {
    /// Returns the uniqueness key for this assignment.
    #[must_use]
    pub fn key(&self) -> AssignmentKey {
        AssignmentKey {
            user_id: self.user_id.clone(),
            role: self.role,
            scope: self.scope.clone(),
        }
    }
}
