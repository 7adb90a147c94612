// crates/okr-gate-core/src/runtime/builder.rs
// ============================================================================
// Module: OKR Gate User Context Builder
// Description: Folds a user's role assignment rows into a UserContext.
// Purpose: Produce a deterministic role snapshot from the role store.
// Dependencies: crate::{core, interfaces}, thiserror
// ============================================================================

//! ## Overview
//! The builder loads the user record and every role assignment for the user
//! in one pass, then groups assignments by scope tier. Workspace and team
//! assignments are additionally attributed to their owning tenant through
//! directory lookups, producing `tenant_membership`.
//!
//! Platform rows carry no grantable role and are ignored. A row whose role
//! tier disagrees with its scope tier is reported as store corruption.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::context::UserContext;
use crate::core::identifiers::TeamId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::core::identifiers::WorkspaceId;
use crate::core::roles::AssignmentScope;
use crate::core::roles::RoleAssignment;
use crate::interfaces::RoleStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// User context build failures.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No user record exists for the identifier.
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    /// Role store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds [`UserContext`] values from a role store.
#[derive(Debug)]
pub struct UserContextBuilder<'a, S: ?Sized> {
    /// Role store supplying user records, assignments, and the directory.
    store: &'a S,
}

impl<'a, S> UserContextBuilder<'a, S>
where
    S: RoleStore + ?Sized,
{
    /// Creates a builder over a role store.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self {
            store,
        }
    }

    /// Builds the context for a user.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UserNotFound`] when no user record exists and
    /// [`BuildError::Store`] when the store fails or holds inconsistent rows.
    pub fn build(&self, user_id: &UserId) -> Result<UserContext, BuildError> {
        let record = self
            .store
            .load_user(user_id)?
            .ok_or_else(|| BuildError::UserNotFound(user_id.clone()))?;
        let assignments = self.store.assignments_for_user(user_id)?;

        let mut context = UserContext::new(record.user_id);
        context.is_superuser = record.is_superuser;
        context.home_tenant_id = record.home_tenant_id;

        let mut directory = DirectoryCache::default();
        for assignment in assignments {
            self.fold(&mut context, &mut directory, assignment)?;
        }
        Ok(context)
    }

    /// Folds one assignment into the context.
    fn fold(
        &self,
        context: &mut UserContext,
        directory: &mut DirectoryCache,
        assignment: RoleAssignment,
    ) -> Result<(), StoreError> {
        let role = assignment.role;
        if assignment.scope == AssignmentScope::Platform {
            return Ok(());
        }
        if role.scope_type() != assignment.scope.scope_type() {
            return Err(StoreError::Corrupt(format!(
                "{role} assigned at {} scope for {}",
                assignment.scope.scope_type(),
                assignment.user_id
            )));
        }
        let tenant = match assignment.scope {
            AssignmentScope::Platform => None,
            AssignmentScope::Tenant(tenant_id) => {
                context.tenant_roles.entry(tenant_id.clone()).or_default().insert(role);
                Some(tenant_id)
            }
            AssignmentScope::Workspace(workspace_id) => {
                let tenant = directory.workspace_tenant(self.store, &workspace_id)?;
                context.workspace_roles.entry(workspace_id).or_default().insert(role);
                tenant
            }
            AssignmentScope::Team(team_id) => {
                let tenant = match directory.team_workspace(self.store, &team_id)? {
                    Some(workspace_id) => directory.workspace_tenant(self.store, &workspace_id)?,
                    None => None,
                };
                context.team_roles.entry(team_id).or_default().insert(role);
                tenant
            }
        };
        if let Some(tenant_id) = tenant {
            context.tenant_membership.entry(tenant_id).or_default().insert(role);
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Directory Memo
// ============================================================================

/// Per-build memo of directory lookups.
#[derive(Debug, Default)]
struct DirectoryCache {
    /// Workspace to tenant lookups.
    workspaces: BTreeMap<WorkspaceId, Option<TenantId>>,
    /// Team to workspace lookups.
    teams: BTreeMap<TeamId, Option<WorkspaceId>>,
}

impl DirectoryCache {
    /// Resolves the tenant owning a workspace.
    fn workspace_tenant<S: RoleStore + ?Sized>(
        &mut self,
        store: &S,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<TenantId>, StoreError> {
        if let Some(tenant) = self.workspaces.get(workspace_id) {
            return Ok(tenant.clone());
        }
        let tenant = store.workspace_tenant(workspace_id)?;
        self.workspaces.insert(workspace_id.clone(), tenant.clone());
        Ok(tenant)
    }

    /// Resolves the workspace owning a team.
    fn team_workspace<S: RoleStore + ?Sized>(
        &mut self,
        store: &S,
        team_id: &TeamId,
    ) -> Result<Option<WorkspaceId>, StoreError> {
        if let Some(workspace) = self.teams.get(team_id) {
            return Ok(workspace.clone());
        }
        let workspace = store.team_workspace(team_id)?;
        self.teams.insert(team_id.clone(), workspace.clone());
        Ok(workspace)
    }
}
