// crates/okr-gate-core/src/runtime/store.rs
// ============================================================================
// Module: OKR Gate In-Memory Role Store
// Description: In-memory scope directory and role assignment store.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryRoleStore`] keeps users, the tenant/workspace/team directory, and
//! role assignments behind one mutex so every read observes a consistent
//! snapshot. It backs tests and embedded single-process deployments.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::identifiers::TeamId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::core::identifiers::WorkspaceId;
use crate::core::resource::TenantFacts;
use crate::core::roles::AssignmentKey;
use crate::core::roles::RoleAssignment;
use crate::interfaces::RoleStore;
use crate::interfaces::StoreError;
use crate::interfaces::UserRecord;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Directory and assignment state guarded as one unit.
#[derive(Debug, Default)]
struct Directory {
    /// User records keyed by user.
    users: BTreeMap<UserId, UserRecord>,
    /// Tenant facts keyed by tenant.
    tenants: BTreeMap<TenantId, TenantFacts>,
    /// Workspace to owning tenant.
    workspaces: BTreeMap<WorkspaceId, TenantId>,
    /// Team to owning workspace.
    teams: BTreeMap<TeamId, WorkspaceId>,
    /// Role assignments keyed by uniqueness key.
    assignments: BTreeMap<AssignmentKey, RoleAssignment>,
}

/// In-memory role store for tests and single-process deployments.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRoleStore {
    /// Directory state protected by a mutex.
    state: Arc<Mutex<Directory>>,
}

impl InMemoryRoleStore {
    /// Creates an empty in-memory role store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn upsert_user(&self, record: UserRecord) -> Result<(), StoreError> {
        self.lock()?.users.insert(record.user_id.clone(), record);
        Ok(())
    }

    /// Registers a tenant with an empty exec-only whitelist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the tenant already exists.
    pub fn add_tenant(&self, tenant_id: TenantId) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        if guard.tenants.contains_key(&tenant_id) {
            return Err(StoreError::Conflict(format!("tenant {tenant_id} already exists")));
        }
        guard.tenants.insert(tenant_id.clone(), TenantFacts::new(tenant_id));
        drop(guard);
        Ok(())
    }

    /// Registers a workspace under an existing tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the tenant does not exist and
    /// [`StoreError::Conflict`] when the workspace already exists.
    pub fn add_workspace(
        &self,
        workspace_id: WorkspaceId,
        tenant_id: TenantId,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        if !guard.tenants.contains_key(&tenant_id) {
            return Err(StoreError::NotFound(format!("tenant {tenant_id}")));
        }
        if guard.workspaces.contains_key(&workspace_id) {
            return Err(StoreError::Conflict(format!("workspace {workspace_id} already exists")));
        }
        guard.workspaces.insert(workspace_id, tenant_id);
        drop(guard);
        Ok(())
    }

    /// Registers a team under an existing workspace.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the workspace does not exist and
    /// [`StoreError::Conflict`] when the team already exists.
    pub fn add_team(&self, team_id: TeamId, workspace_id: WorkspaceId) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        if !guard.workspaces.contains_key(&workspace_id) {
            return Err(StoreError::NotFound(format!("workspace {workspace_id}")));
        }
        if guard.teams.contains_key(&team_id) {
            return Err(StoreError::Conflict(format!("team {team_id} already exists")));
        }
        guard.teams.insert(team_id, workspace_id);
        drop(guard);
        Ok(())
    }

    /// Replaces a tenant's exec-only whitelist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the tenant does not exist.
    pub fn set_exec_whitelist(
        &self,
        tenant_id: &TenantId,
        users: BTreeSet<UserId>,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let facts = guard
            .tenants
            .get_mut(tenant_id)
            .ok_or_else(|| StoreError::NotFound(format!("tenant {tenant_id}")))?;
        facts.exec_only_whitelist = users;
        drop(guard);
        Ok(())
    }

    /// Loads tenant facts for visibility decisions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn tenant_facts(&self, tenant_id: &TenantId) -> Result<Option<TenantFacts>, StoreError> {
        Ok(self.lock()?.tenants.get(tenant_id).cloned())
    }

    /// Acquires the directory lock.
    fn lock(&self) -> Result<MutexGuard<'_, Directory>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Store("role store mutex poisoned".to_string()))
    }
}

impl RoleStore for InMemoryRoleStore {
    fn load_user(&self, user_id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.lock()?.users.get(user_id).cloned())
    }

    fn save_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        self.upsert_user(record.clone())
    }

    fn assignments_for_user(&self, user_id: &UserId) -> Result<Vec<RoleAssignment>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .assignments
            .values()
            .filter(|assignment| assignment.user_id == *user_id)
            .cloned()
            .collect())
    }

    fn insert_assignment(&self, assignment: &RoleAssignment) -> Result<(), StoreError> {
        let key = assignment.key();
        let mut guard = self.lock()?;
        if guard.assignments.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "{} already holds {} at {} scope",
                assignment.user_id,
                assignment.role,
                assignment.scope.scope_type()
            )));
        }
        guard.assignments.insert(key, assignment.clone());
        drop(guard);
        Ok(())
    }

    fn delete_assignment(&self, key: &AssignmentKey) -> Result<bool, StoreError> {
        Ok(self.lock()?.assignments.remove(key).is_some())
    }

    fn workspace_tenant(&self, workspace_id: &WorkspaceId) -> Result<Option<TenantId>, StoreError> {
        Ok(self.lock()?.workspaces.get(workspace_id).cloned())
    }

    fn team_workspace(&self, team_id: &TeamId) -> Result<Option<WorkspaceId>, StoreError> {
        Ok(self.lock()?.teams.get(team_id).cloned())
    }

    fn tenant_exists(&self, tenant_id: &TenantId) -> Result<bool, StoreError> {
        Ok(self.lock()?.tenants.contains_key(tenant_id))
    }
}
