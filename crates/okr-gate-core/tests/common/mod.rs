// crates/okr-gate-core/tests/common/mod.rs
// =============================================================================
// Module: Core Test Helpers
// Description: Shared directory fixture and content builders.
// Purpose: Reduce duplication across okr-gate-core integration tests.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use okr_gate_core::AssignmentScope;
use okr_gate_core::ContentObject;
use okr_gate_core::InMemoryRoleStore;
use okr_gate_core::ObjectId;
use okr_gate_core::Role;
use okr_gate_core::RoleAssignment;
use okr_gate_core::RoleStore;
use okr_gate_core::TeamId;
use okr_gate_core::TenantId;
use okr_gate_core::Timestamp;
use okr_gate_core::UserContext;
use okr_gate_core::UserContextBuilder;
use okr_gate_core::UserId;
use okr_gate_core::UserRecord;
use okr_gate_core::VisibilityLevel;
use okr_gate_core::WorkspaceId;

pub type TestResult = Result<(), String>;

pub const ACME: &str = "acme";
pub const GLOBEX: &str = "globex";
pub const ACME_ENG: &str = "acme-eng";
pub const ACME_SALES: &str = "acme-sales";
pub const GLOBEX_OPS: &str = "globex-ops";
pub const ACME_PLATFORM: &str = "acme-platform";

/// Builds the shared two-tenant directory with one user per role.
///
/// | user          | role                               | home   |
/// |---------------|------------------------------------|--------|
/// | root          | superuser                          | -      |
/// | acme-owner    | `TENANT_OWNER` @ acme              | acme   |
/// | acme-admin    | `TENANT_ADMIN` @ acme              | acme   |
/// | acme-viewer   | `TENANT_VIEWER` @ acme             | acme   |
/// | eng-lead      | `WORKSPACE_LEAD` @ acme-eng        | acme   |
/// | eng-member    | `WORKSPACE_MEMBER` @ acme-eng      | acme   |
/// | team-lead     | `TEAM_LEAD` @ acme-platform        | acme   |
/// | contributor   | `TEAM_CONTRIBUTOR` @ acme-platform | acme   |
/// | globex-admin  | `TENANT_ADMIN` @ globex            | globex |
/// | outsider      | none                               | acme   |
pub fn directory() -> Result<InMemoryRoleStore, String> {
    let store = InMemoryRoleStore::new();
    store.add_tenant(TenantId::new(ACME)).map_err(|err| err.to_string())?;
    store.add_tenant(TenantId::new(GLOBEX)).map_err(|err| err.to_string())?;
    store
        .add_workspace(WorkspaceId::new(ACME_ENG), TenantId::new(ACME))
        .map_err(|err| err.to_string())?;
    store
        .add_workspace(WorkspaceId::new(ACME_SALES), TenantId::new(ACME))
        .map_err(|err| err.to_string())?;
    store
        .add_workspace(WorkspaceId::new(GLOBEX_OPS), TenantId::new(GLOBEX))
        .map_err(|err| err.to_string())?;
    store
        .add_team(TeamId::new(ACME_PLATFORM), WorkspaceId::new(ACME_ENG))
        .map_err(|err| err.to_string())?;

    add_user(&store, "root", true, None)?;
    add_user(&store, "outsider", false, Some(ACME))?;
    let seeded = [
        ("acme-owner", Role::TenantOwner, AssignmentScope::Tenant(TenantId::new(ACME)), ACME),
        ("acme-admin", Role::TenantAdmin, AssignmentScope::Tenant(TenantId::new(ACME)), ACME),
        ("acme-viewer", Role::TenantViewer, AssignmentScope::Tenant(TenantId::new(ACME)), ACME),
        (
            "eng-lead",
            Role::WorkspaceLead,
            AssignmentScope::Workspace(WorkspaceId::new(ACME_ENG)),
            ACME,
        ),
        (
            "eng-member",
            Role::WorkspaceMember,
            AssignmentScope::Workspace(WorkspaceId::new(ACME_ENG)),
            ACME,
        ),
        ("team-lead", Role::TeamLead, AssignmentScope::Team(TeamId::new(ACME_PLATFORM)), ACME),
        (
            "contributor",
            Role::TeamContributor,
            AssignmentScope::Team(TeamId::new(ACME_PLATFORM)),
            ACME,
        ),
        (
            "globex-admin",
            Role::TenantAdmin,
            AssignmentScope::Tenant(TenantId::new(GLOBEX)),
            GLOBEX,
        ),
    ];
    for (user, role, scope, home) in seeded {
        add_user(&store, user, false, Some(home))?;
        assign(&store, user, role, scope)?;
    }
    Ok(store)
}

/// Inserts a user record.
pub fn add_user(
    store: &InMemoryRoleStore,
    user: &str,
    is_superuser: bool,
    home: Option<&str>,
) -> TestResult {
    store
        .upsert_user(UserRecord {
            user_id: UserId::new(user),
            is_superuser,
            home_tenant_id: home.map(TenantId::new),
        })
        .map_err(|err| err.to_string())
}

/// Inserts a role assignment directly into the store.
pub fn assign(
    store: &InMemoryRoleStore,
    user: &str,
    role: Role,
    scope: AssignmentScope,
) -> TestResult {
    store
        .insert_assignment(&RoleAssignment {
            user_id: UserId::new(user),
            role,
            scope,
            created_at: Timestamp::from_unix_millis(1_700_000_000_000),
        })
        .map_err(|err| err.to_string())
}

/// Builds a user context from the store.
pub fn context(store: &InMemoryRoleStore, user: &str) -> Result<UserContext, String> {
    UserContextBuilder::new(store).build(&UserId::new(user)).map_err(|err| err.to_string())
}

/// Builds an unpublished content object.
pub fn objective(
    id: &str,
    owner: &str,
    tenant: &str,
    visibility: VisibilityLevel,
) -> ContentObject {
    ContentObject {
        id: ObjectId::new(id),
        owner_id: UserId::new(owner),
        tenant_id: TenantId::new(tenant),
        visibility,
        is_published: false,
        cycle_state: None,
    }
}

/// Builds a published content object.
pub fn published(id: &str, owner: &str, tenant: &str) -> ContentObject {
    ContentObject {
        is_published: true,
        ..objective(id, owner, tenant, VisibilityLevel::PublicTenant)
    }
}

/// Returns a tenant identifier.
pub fn tenant(id: &str) -> TenantId {
    TenantId::new(id)
}
