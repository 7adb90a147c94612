// crates/okr-gate-core/src/core/resource.rs
// ============================================================================
// Module: OKR Gate Resource Context
// Description: Resource facts supplied per decision (tenant, scope, content).
// Purpose: Carry fresh, caller-loaded resource state into the decision engine.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ResourceContext`] describes the target of a decision: its tenant, the
//! resolved scope ancestors (workspace/team), the optional content object, and
//! the optional tenant facts (exec-only whitelist). Resource context is never
//! cached; callers load it fresh for every decision.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ObjectId;
use crate::core::identifiers::TeamId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::core::identifiers::WorkspaceId;

// ============================================================================
// SECTION: Content Classification
// ============================================================================

/// Per-object visibility classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisibilityLevel {
    /// Owner, tenant owner, superuser, and whitelisted users only.
    Private,
    /// Executive-only; same audience as `Private`.
    ExecOnly,
    /// Members of the object's workspace (and tenant-tier roles).
    WorkspaceOnly,
    /// Anyone with `view_okr` in the tenant.
    PublicTenant,
}

impl VisibilityLevel {
    /// Returns true for levels that require the exec-only whitelist.
    #[must_use]
    pub const fn is_restrictive(self) -> bool {
        matches!(self, Self::Private | Self::ExecOnly)
    }

    /// Returns the stable label for the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Private => "PRIVATE",
            Self::ExecOnly => "EXEC_ONLY",
            Self::WorkspaceOnly => "WORKSPACE_ONLY",
            Self::PublicTenant => "PUBLIC_TENANT",
        }
    }
}

/// Lifecycle state of the cycle containing a content object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleState {
    /// Cycle is being planned.
    Draft,
    /// Cycle is in progress.
    Active,
    /// Cycle is locked; structural mutation restricted.
    Locked,
    /// Cycle is archived; structural mutation restricted.
    Archived,
}

impl CycleState {
    /// Returns true when the cycle restricts structural mutation.
    #[must_use]
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Locked | Self::Archived)
    }

    /// Returns the stable label for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Active => "ACTIVE",
            Self::Locked => "LOCKED",
            Self::Archived => "ARCHIVED",
        }
    }
}

// ============================================================================
// SECTION: Resource Facts
// ============================================================================

/// Content object facts (objective, key result, or initiative).
///
/// # Invariants
/// - `tenant_id` is immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentObject {
    /// Object identifier.
    pub id: ObjectId,
    /// Owning user.
    pub owner_id: UserId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Visibility classification.
    pub visibility: VisibilityLevel,
    /// Whether the object has been published.
    #[serde(default)]
    pub is_published: bool,
    /// Lifecycle state of the containing cycle, when the object is in one.
    #[serde(default)]
    pub cycle_state: Option<CycleState>,
}

/// Tenant facts needed for visibility decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantFacts {
    /// Tenant identifier.
    pub id: TenantId,
    /// Users exempt from PRIVATE/EXEC_ONLY narrowing.
    #[serde(default)]
    pub exec_only_whitelist: BTreeSet<UserId>,
}

impl TenantFacts {
    /// Creates tenant facts with an empty whitelist.
    #[must_use]
    pub const fn new(id: TenantId) -> Self {
        Self {
            id,
            exec_only_whitelist: BTreeSet::new(),
        }
    }

    /// Returns true when the user is on the exec-only whitelist.
    #[must_use]
    pub fn is_whitelisted(&self, user_id: &UserId) -> bool {
        self.exec_only_whitelist.contains(user_id)
    }
}

/// Unresolved scope of a resource as named by a caller.
///
/// Resolved into a [`ScopeChain`] through directory lookups before a decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceScope {
    /// Workspace the resource lives in, when known.
    #[serde(default)]
    pub workspace_id: Option<WorkspaceId>,
    /// Team the resource lives in, when known.
    #[serde(default)]
    pub team_id: Option<TeamId>,
}

/// Resolved scope ancestors of a resource, from tenant down.
///
/// # Invariants
/// - A team is only present together with its parent workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeChain {
    /// Ancestor tenant.
    pub tenant_id: TenantId,
    /// Workspace scope, when the resource lives in one.
    #[serde(default)]
    pub workspace_id: Option<WorkspaceId>,
    /// Team scope, when the resource lives in one.
    #[serde(default)]
    pub team_id: Option<TeamId>,
}

impl ScopeChain {
    /// Creates a tenant-level chain.
    #[must_use]
    pub const fn tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            workspace_id: None,
            team_id: None,
        }
    }
}

/// Resource facts supplied by the caller for a single decision.
///
/// # Invariants
/// - Never cached; must reflect current resource state.
/// - `tenant_id = None` denotes a global/system resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceContext {
    /// Tenant owning the resource.
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    /// Workspace ancestor, when resolved.
    #[serde(default)]
    pub workspace_id: Option<WorkspaceId>,
    /// Team ancestor, when resolved.
    #[serde(default)]
    pub team_id: Option<TeamId>,
    /// Content object targeted by the action.
    #[serde(default)]
    pub content_object: Option<ContentObject>,
    /// Tenant facts (exec-only whitelist).
    #[serde(default)]
    pub tenant: Option<TenantFacts>,
}

impl ResourceContext {
    /// Creates a context for a global resource with no tenant.
    #[must_use]
    pub fn global() -> Self {
        Self::default()
    }

    /// Creates a context for a tenant-level resource.
    #[must_use]
    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            ..Self::default()
        }
    }

    /// Creates a context from a resolved scope chain.
    #[must_use]
    pub fn for_chain(chain: ScopeChain) -> Self {
        Self {
            tenant_id: Some(chain.tenant_id),
            workspace_id: chain.workspace_id,
            team_id: chain.team_id,
            ..Self::default()
        }
    }

    /// Creates a context targeting a content object at tenant level.
    #[must_use]
    pub fn for_content(content: ContentObject) -> Self {
        Self {
            tenant_id: Some(content.tenant_id.clone()),
            content_object: Some(content),
            ..Self::default()
        }
    }

    /// Returns a copy with the content object set.
    #[must_use]
    pub fn with_content(mut self, content: ContentObject) -> Self {
        self.content_object = Some(content);
        self
    }

    /// Returns a copy with tenant facts set.
    #[must_use]
    pub fn with_tenant_facts(mut self, tenant: TenantFacts) -> Self {
        self.tenant = Some(tenant);
        self
    }

    /// Returns a copy with the workspace ancestor set.
    #[must_use]
    pub fn with_workspace(mut self, workspace_id: WorkspaceId) -> Self {
        self.workspace_id = Some(workspace_id);
        self
    }

    /// Returns a copy with the team ancestor set.
    #[must_use]
    pub fn with_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    /// Returns the resolved scope chain when the resource has a tenant.
    #[must_use]
    pub fn scope_chain(&self) -> Option<ScopeChain> {
        self.tenant_id.as_ref().map(|tenant_id| ScopeChain {
            tenant_id: tenant_id.clone(),
            workspace_id: self.workspace_id.clone(),
            team_id: self.team_id.clone(),
        })
    }
}
