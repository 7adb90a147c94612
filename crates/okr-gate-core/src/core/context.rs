// crates/okr-gate-core/src/core/context.rs
// ============================================================================
// Module: OKR Gate User Context
// Description: Derived, request-scoped view of a user's roles per scope.
// Purpose: Give the decision engine a folded, read-only role snapshot.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`UserContext`] is built from role assignment rows by the user context
//! builder (or served from the context cache). It is never persisted. The
//! superuser flag comes from the user record, not from any role.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::TeamId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::core::identifiers::WorkspaceId;
use crate::core::resource::ScopeChain;
use crate::core::roles::Role;

// ============================================================================
// SECTION: User Context
// ============================================================================

/// Folded role snapshot for one user.
///
/// # Invariants
/// - Built deterministically: identical assignment rows yield identical contexts.
/// - `tenant_membership` holds, per tenant, every role the user holds anywhere
///   in that tenant (tenant, workspace, and team tiers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    /// User identifier.
    pub user_id: UserId,
    /// Platform superuser flag (read-all, mutate-nothing).
    pub is_superuser: bool,
    /// Tenant the user belongs to, when recorded.
    #[serde(default)]
    pub home_tenant_id: Option<TenantId>,
    /// Tenant-tier roles keyed by tenant.
    #[serde(default)]
    pub tenant_roles: BTreeMap<TenantId, BTreeSet<Role>>,
    /// Workspace-tier roles keyed by workspace.
    #[serde(default)]
    pub workspace_roles: BTreeMap<WorkspaceId, BTreeSet<Role>>,
    /// Team-tier roles keyed by team.
    #[serde(default)]
    pub team_roles: BTreeMap<TeamId, BTreeSet<Role>>,
    /// Union of roles held anywhere inside each tenant.
    #[serde(default)]
    pub tenant_membership: BTreeMap<TenantId, BTreeSet<Role>>,
}

impl UserContext {
    /// Creates an empty context for a non-superuser.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            is_superuser: false,
            home_tenant_id: None,
            tenant_roles: BTreeMap::new(),
            workspace_roles: BTreeMap::new(),
            team_roles: BTreeMap::new(),
            tenant_membership: BTreeMap::new(),
        }
    }

    /// Creates an empty superuser context.
    #[must_use]
    pub fn superuser(user_id: UserId) -> Self {
        let mut context = Self::new(user_id);
        context.is_superuser = true;
        context
    }

    /// Returns true when the user holds `role` directly at the tenant tier.
    #[must_use]
    pub fn has_tenant_role(&self, tenant_id: &TenantId, role: Role) -> bool {
        self.tenant_roles.get(tenant_id).is_some_and(|roles| roles.contains(&role))
    }

    /// Returns true when the user holds an admin-tier role on the tenant.
    #[must_use]
    pub fn is_tenant_admin(&self, tenant_id: &TenantId) -> bool {
        self.tenant_roles
            .get(tenant_id)
            .is_some_and(|roles| roles.iter().any(|role| role.is_tenant_admin_tier()))
    }

    /// Returns the roles that apply along a scope chain.
    ///
    /// Tenant roles cascade down to workspaces and teams; narrower roles never
    /// cascade upward.
    #[must_use]
    pub fn roles_for_chain(&self, chain: &ScopeChain) -> BTreeSet<Role> {
        let mut roles = BTreeSet::new();
        if let Some(held) = self.tenant_roles.get(&chain.tenant_id) {
            roles.extend(held.iter().copied());
        }
        if let Some(held) = chain.workspace_id.as_ref().and_then(|id| self.workspace_roles.get(id))
        {
            roles.extend(held.iter().copied());
        }
        if let Some(held) = chain.team_id.as_ref().and_then(|id| self.team_roles.get(id)) {
            roles.extend(held.iter().copied());
        }
        roles
    }

    /// Returns every role held anywhere inside the tenant.
    #[must_use]
    pub fn roles_in_tenant(&self, tenant_id: &TenantId) -> BTreeSet<Role> {
        self.tenant_membership.get(tenant_id).cloned().unwrap_or_default()
    }
}
