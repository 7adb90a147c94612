// crates/okr-gate-core/tests/authorizer.rs
// ============================================================================
// Module: Authorizer Facade Tests
// Description: Cache-aware decisions, role writes, and decision logging.
// Purpose: Validate the request-handler call path end to end.
// Dependencies: okr-gate-core, serde_json, tempfile
// ============================================================================
//! ## Overview
//! Exercises [`Authorizer`] over the in-memory directory: grant validation,
//! revocation observed on the very next decision, user record writes, scope
//! chain resolution,
//! list filtering, and the JSON-lines decision log.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::fs;
use std::sync::Arc;
use std::sync::Mutex;

use common::ACME;
use common::ACME_ENG;
use common::ACME_PLATFORM;
use common::ACME_SALES;
use common::GLOBEX;
use common::TestResult;
use common::directory;
use common::objective;
use common::tenant;
use okr_gate_core::Action;
use okr_gate_core::AssignmentKey;
use okr_gate_core::AssignmentScope;
use okr_gate_core::Authorizer;
use okr_gate_core::AuthorizerConfig;
use okr_gate_core::AuthorizerError;
use okr_gate_core::DecisionLogEvent;
use okr_gate_core::DecisionLogSink;
use okr_gate_core::FileDecisionLog;
use okr_gate_core::InMemoryContextCache;
use okr_gate_core::InMemoryRoleStore;
use okr_gate_core::ManualClock;
use okr_gate_core::ReasonCode;
use okr_gate_core::ResourceContext;
use okr_gate_core::ResourceScope;
use okr_gate_core::Role;
use okr_gate_core::RoleChangeLogEvent;
use okr_gate_core::ScopeChain;
use okr_gate_core::StoreError;
use okr_gate_core::TeamId;
use okr_gate_core::Timestamp;
use okr_gate_core::UserId;
use okr_gate_core::UserRecord;
use okr_gate_core::VisibilityLevel;
use okr_gate_core::WorkspaceId;
use serde_json::Value;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Sink capturing serialized events in memory.
#[derive(Default)]
struct RecordingLog {
    lines: Mutex<Vec<Value>>,
}

impl RecordingLog {
    fn events(&self) -> Vec<Value> {
        self.lines.lock().unwrap().clone()
    }
}

impl DecisionLogSink for RecordingLog {
    fn record_decision(&self, event: &DecisionLogEvent) {
        self.lines.lock().unwrap().push(serde_json::to_value(event).unwrap());
    }

    fn record_role_change(&self, event: &RoleChangeLogEvent) {
        self.lines.lock().unwrap().push(serde_json::to_value(event).unwrap());
    }
}

fn authorizer() -> Result<Authorizer<InMemoryRoleStore>, String> {
    let cache = InMemoryContextCache::with_clock(60_000, 100, Arc::new(ManualClock::new(0)));
    Ok(Authorizer::new(directory()?, Arc::new(cache)))
}

fn platform_chain() -> ScopeChain {
    ScopeChain {
        tenant_id: tenant(ACME),
        workspace_id: Some(WorkspaceId::new(ACME_ENG)),
        team_id: Some(TeamId::new(ACME_PLATFORM)),
    }
}

fn now() -> Timestamp {
    Timestamp::from_unix_millis(1_700_000_000_000)
}

// ============================================================================
// SECTION: Decisions
// ============================================================================

#[test]
fn can_as_member_uses_home_tenant() -> TestResult {
    let authz = authorizer()?;
    let resource = ResourceContext::for_chain(platform_chain());
    let decision = authz
        .can_as_member(&UserId::new("contributor"), Action::CreateOkr, &resource)
        .map_err(|err| err.to_string())?;
    assert!(decision.allow);

    let foreign = ResourceContext::for_tenant(tenant(GLOBEX));
    let decision = authz
        .can_as_member(&UserId::new("acme-admin"), Action::ManageUsers, &foreign)
        .map_err(|err| err.to_string())?;
    assert_eq!(decision.reason, ReasonCode::TenantBoundary);
    Ok(())
}

#[test]
fn unknown_user_is_an_error_not_a_deny() -> TestResult {
    let authz = authorizer()?;
    let resource = ResourceContext::for_tenant(tenant(ACME));
    match authz.can(&UserId::new("ghost"), Action::ViewOkr, &resource, None) {
        Err(AuthorizerError::NotFound(_)) => Ok(()),
        other => Err(format!("expected NotFound, got {other:?}")),
    }
}

#[test]
fn inconsistent_resource_is_an_error() -> TestResult {
    let authz = authorizer()?;
    let content = objective("o-1", "acme-owner", ACME, VisibilityLevel::PublicTenant);
    let resource = ResourceContext::for_tenant(tenant(GLOBEX)).with_content(content);
    match authz.can(&UserId::new("acme-owner"), Action::ViewOkr, &resource, None) {
        Err(AuthorizerError::InvalidResource(_)) => Ok(()),
        other => Err(format!("expected InvalidResource, got {other:?}")),
    }
}

#[test]
fn revoke_is_observed_by_the_next_decision() -> TestResult {
    let authz = authorizer()?;
    let user = UserId::new("contributor");
    let resource = ResourceContext::for_chain(platform_chain());
    let acme = tenant(ACME);

    let before =
        authz.can(&user, Action::EditOkr, &resource, Some(&acme)).map_err(|err| err.to_string())?;
    assert!(before.allow);

    let removed = authz
        .revoke(&AssignmentKey {
            user_id: user.clone(),
            role: Role::TeamContributor,
            scope: AssignmentScope::Team(TeamId::new(ACME_PLATFORM)),
        })
        .map_err(|err| err.to_string())?;
    assert!(removed);

    let after =
        authz.can(&user, Action::EditOkr, &resource, Some(&acme)).map_err(|err| err.to_string())?;
    assert_eq!(after.reason, ReasonCode::RoleDeny);
    Ok(())
}

#[test]
fn grant_is_observed_by_the_next_decision() -> TestResult {
    let authz = authorizer()?;
    let user = UserId::new("outsider");
    let resource = ResourceContext::for_tenant(tenant(ACME));
    let acme = tenant(ACME);

    let before = authz
        .can(&user, Action::ExportData, &resource, Some(&acme))
        .map_err(|err| err.to_string())?;
    assert_eq!(before.reason, ReasonCode::RoleDeny);

    authz
        .grant(&user, Role::TenantAdmin, AssignmentScope::Tenant(acme.clone()), now())
        .map_err(|err| err.to_string())?;
    let after = authz
        .can(&user, Action::ExportData, &resource, Some(&acme))
        .map_err(|err| err.to_string())?;
    assert!(after.allow);
    Ok(())
}

#[test]
fn revoking_a_missing_assignment_returns_false() -> TestResult {
    let authz = authorizer()?;
    let removed = authz
        .revoke(&AssignmentKey {
            user_id: UserId::new("outsider"),
            role: Role::TenantViewer,
            scope: AssignmentScope::Tenant(tenant(ACME)),
        })
        .map_err(|err| err.to_string())?;
    assert!(!removed);
    Ok(())
}

// ============================================================================
// SECTION: Grant Validation
// ============================================================================

#[test]
fn grant_rejects_invalid_requests() -> TestResult {
    let authz = authorizer()?;
    let outsider = UserId::new("outsider");

    let cases = [
        (UserId::new("outsider"), Role::TenantViewer, AssignmentScope::Platform, "platform"),
        (
            UserId::new("outsider"),
            Role::TeamLead,
            AssignmentScope::Tenant(tenant(ACME)),
            "tier mismatch",
        ),
        (
            UserId::new("root"),
            Role::TenantViewer,
            AssignmentScope::Tenant(tenant(ACME)),
            "superuser",
        ),
    ];
    for (user, role, scope, label) in cases {
        match authz.grant(&user, role, scope, now()) {
            Err(AuthorizerError::InvalidAssignment(_)) => {}
            other => return Err(format!("{label}: expected InvalidAssignment, got {other:?}")),
        }
    }

    let missing = [
        (UserId::new("ghost"), Role::TenantViewer, AssignmentScope::Tenant(tenant(ACME))),
        (outsider.clone(), Role::TenantViewer, AssignmentScope::Tenant(tenant("initech"))),
        (
            outsider.clone(),
            Role::WorkspaceMember,
            AssignmentScope::Workspace(WorkspaceId::new("nowhere")),
        ),
        (outsider, Role::TeamLead, AssignmentScope::Team(TeamId::new("nobody"))),
    ];
    for (user, role, scope) in missing {
        match authz.grant(&user, role, scope, now()) {
            Err(AuthorizerError::NotFound(_)) => {}
            other => return Err(format!("expected NotFound, got {other:?}")),
        }
    }
    Ok(())
}

#[test]
fn superuser_promotion_requires_scoped_roles_revoked() -> TestResult {
    let authz = authorizer()?;
    let user = UserId::new("contributor");
    let promoted = UserRecord {
        user_id: user.clone(),
        is_superuser: true,
        home_tenant_id: None,
    };

    match authz.save_user(&promoted) {
        Err(AuthorizerError::InvalidUser(message)) => {
            assert!(message.contains("revoke"), "{message}");
        }
        other => return Err(format!("expected InvalidUser, got {other:?}")),
    }
    let unchanged = authz.user_context(&user).map_err(|err| err.to_string())?;
    assert!(!unchanged.is_superuser);
    assert_eq!(unchanged.home_tenant_id, Some(tenant(ACME)));

    authz
        .revoke(&AssignmentKey {
            user_id: user.clone(),
            role: Role::TeamContributor,
            scope: AssignmentScope::Team(TeamId::new(ACME_PLATFORM)),
        })
        .map_err(|err| err.to_string())?;
    authz.save_user(&promoted).map_err(|err| err.to_string())?;
    let context = authz.user_context(&user).map_err(|err| err.to_string())?;
    assert!(context.is_superuser);
    assert!(context.team_roles.is_empty());
    assert!(context.workspace_roles.is_empty());
    assert!(context.tenant_roles.is_empty());
    Ok(())
}

#[test]
fn save_user_rejects_invalid_records() -> TestResult {
    let authz = authorizer()?;
    let homed_superuser = UserRecord {
        user_id: UserId::new("newcomer"),
        is_superuser: true,
        home_tenant_id: Some(tenant(ACME)),
    };
    match authz.save_user(&homed_superuser) {
        Err(AuthorizerError::InvalidUser(_)) => {}
        other => return Err(format!("expected InvalidUser, got {other:?}")),
    }

    let unknown_home = UserRecord {
        user_id: UserId::new("newcomer"),
        is_superuser: false,
        home_tenant_id: Some(tenant("initech")),
    };
    match authz.save_user(&unknown_home) {
        Err(AuthorizerError::NotFound(_)) => {}
        other => return Err(format!("expected NotFound, got {other:?}")),
    }
    match authz.user_context(&UserId::new("newcomer")) {
        Err(AuthorizerError::NotFound(_)) => Ok(()),
        other => Err(format!("rejected records must not be stored, got {other:?}")),
    }
}

#[test]
fn superuser_demotion_is_observed_by_the_next_decision() -> TestResult {
    let authz = authorizer()?;
    let root = UserId::new("root");
    let content = objective("o-1", "acme-owner", ACME, VisibilityLevel::PublicTenant);
    let resource = ResourceContext::for_tenant(tenant(ACME)).with_content(content);

    let before =
        authz.can(&root, Action::ViewOkr, &resource, None).map_err(|err| err.to_string())?;
    assert!(before.allow);

    authz
        .save_user(&UserRecord {
            user_id: root.clone(),
            is_superuser: false,
            home_tenant_id: Some(tenant(ACME)),
        })
        .map_err(|err| err.to_string())?;
    let after =
        authz.can(&root, Action::ViewOkr, &resource, None).map_err(|err| err.to_string())?;
    assert_eq!(after.reason, ReasonCode::RoleDeny);
    Ok(())
}

#[test]
fn home_tenant_move_is_observed_by_the_next_decision() -> TestResult {
    let authz = authorizer()?;
    let user = UserId::new("outsider");
    let resource = ResourceContext::for_tenant(tenant(ACME));

    let before = authz
        .can_as_member(&user, Action::EditOkr, &resource)
        .map_err(|err| err.to_string())?;
    assert_eq!(before.reason, ReasonCode::RoleDeny);

    authz
        .save_user(&UserRecord {
            user_id: user.clone(),
            is_superuser: false,
            home_tenant_id: Some(tenant(GLOBEX)),
        })
        .map_err(|err| err.to_string())?;
    let after = authz
        .can_as_member(&user, Action::EditOkr, &resource)
        .map_err(|err| err.to_string())?;
    assert_eq!(after.reason, ReasonCode::TenantBoundary);
    Ok(())
}

#[test]
fn duplicate_grant_conflicts() -> TestResult {
    let authz = authorizer()?;
    match authz.grant(
        &UserId::new("acme-owner"),
        Role::TenantOwner,
        AssignmentScope::Tenant(tenant(ACME)),
        now(),
    ) {
        Err(AuthorizerError::Store(StoreError::Conflict(_))) => Ok(()),
        other => Err(format!("expected conflict, got {other:?}")),
    }
}

// ============================================================================
// SECTION: Scope Resolution
// ============================================================================

#[test]
fn resolve_scope_chain_fills_ancestors() -> TestResult {
    let authz = authorizer()?;
    let scope = ResourceScope {
        workspace_id: None,
        team_id: Some(TeamId::new(ACME_PLATFORM)),
    };
    let chain = authz.resolve_scope_chain(None, &scope).map_err(|err| err.to_string())?;
    assert_eq!(chain, platform_chain());

    let tenant_only = authz
        .resolve_scope_chain(Some(&tenant(GLOBEX)), &ResourceScope::default())
        .map_err(|err| err.to_string())?;
    assert_eq!(tenant_only, ScopeChain::tenant(tenant(GLOBEX)));
    Ok(())
}

#[test]
fn resolve_scope_chain_rejects_mismatches() -> TestResult {
    let authz = authorizer()?;
    let wrong_workspace = ResourceScope {
        workspace_id: Some(WorkspaceId::new(ACME_SALES)),
        team_id: Some(TeamId::new(ACME_PLATFORM)),
    };
    assert!(matches!(
        authz.resolve_scope_chain(None, &wrong_workspace),
        Err(AuthorizerError::InvalidResource(_))
    ));

    let wrong_tenant = ResourceScope {
        workspace_id: Some(WorkspaceId::new(ACME_ENG)),
        team_id: None,
    };
    assert!(matches!(
        authz.resolve_scope_chain(Some(&tenant(GLOBEX)), &wrong_tenant),
        Err(AuthorizerError::InvalidResource(_))
    ));
    assert!(matches!(
        authz.resolve_scope_chain(None, &ResourceScope::default()),
        Err(AuthorizerError::InvalidResource(_))
    ));
    assert!(matches!(
        authz.resolve_scope_chain(Some(&tenant("initech")), &ResourceScope::default()),
        Err(AuthorizerError::NotFound(_))
    ));
    Ok(())
}

#[test]
fn effective_actions_follow_resolved_chain() -> TestResult {
    let authz = authorizer()?;
    let actions = authz
        .effective_actions(&UserId::new("eng-lead"), &platform_chain())
        .map_err(|err| err.to_string())?;
    assert!(actions.contains(&Action::ManageTeams));
    assert!(actions.contains(&Action::PublishOkr));
    assert!(!actions.contains(&Action::ManageUsers));

    let elsewhere = authz
        .effective_actions(&UserId::new("eng-lead"), &ScopeChain::tenant(tenant(GLOBEX)))
        .map_err(|err| err.to_string())?;
    assert!(elsewhere.is_empty());
    Ok(())
}

// ============================================================================
// SECTION: List Filtering
// ============================================================================

#[test]
fn filter_visible_keeps_only_viewable_items() -> TestResult {
    let authz = authorizer()?;
    let items = vec![
        objective("mine", "eng-member", ACME, VisibilityLevel::Private),
        objective("public", "acme-owner", ACME, VisibilityLevel::PublicTenant),
        objective("secret", "acme-owner", ACME, VisibilityLevel::Private),
        objective("foreign", "globex-admin", GLOBEX, VisibilityLevel::PublicTenant),
    ];
    let visible = authz
        .filter_visible(&UserId::new("eng-member"), items, |item| {
            ResourceContext::for_content(item.clone())
        })
        .map_err(|err| err.to_string())?;
    let ids: Vec<&str> = visible.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["mine", "public"]);
    Ok(())
}

// ============================================================================
// SECTION: Decision Log
// ============================================================================

#[test]
fn denies_are_logged_and_allows_are_not_by_default() -> TestResult {
    let log = Arc::new(RecordingLog::default());
    let authz = authorizer()?.with_log(log.clone());
    let user = UserId::new("acme-viewer");
    let resource = ResourceContext::for_tenant(tenant(ACME));
    let acme = tenant(ACME);

    authz.can(&user, Action::ViewOkr, &resource, Some(&acme)).map_err(|err| err.to_string())?;
    authz.can(&user, Action::ManageUsers, &resource, Some(&acme)).map_err(|err| err.to_string())?;

    let events = log.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event"], "okr_decision");
    assert_eq!(events[0]["action"], "manage_users");
    assert_eq!(events[0]["reason"], "ROLE_DENY");
    assert_eq!(events[0]["allow"], false);
    assert_eq!(events[0]["context_source"], "cache_hit");
    Ok(())
}

#[test]
fn role_changes_are_logged() -> TestResult {
    let log = Arc::new(RecordingLog::default());
    let authz = authorizer()?.with_log(log.clone());
    let user = UserId::new("outsider");
    let scope = AssignmentScope::Workspace(WorkspaceId::new(ACME_SALES));
    authz
        .grant(&user, Role::WorkspaceMember, scope.clone(), now())
        .map_err(|err| err.to_string())?;
    authz
        .revoke(&AssignmentKey {
            user_id: user,
            role: Role::WorkspaceMember,
            scope,
        })
        .map_err(|err| err.to_string())?;

    let events = log.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event"], "okr_role_change");
    assert_eq!(events[0]["change"], "grant");
    assert_eq!(events[0]["scope_type"], "WORKSPACE");
    assert_eq!(events[0]["scope_id"], ACME_SALES);
    assert_eq!(events[1]["change"], "revoke");
    assert_eq!(events[1]["cache_invalidated"], true);
    Ok(())
}

#[test]
fn file_log_appends_json_lines_including_allows() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("decisions.jsonl");
    let sink = FileDecisionLog::new(&path).map_err(|err| err.to_string())?;
    let authz = authorizer()?.with_log(Arc::new(sink)).with_config(AuthorizerConfig {
        log_allows: true,
    });
    let content = objective("o-1", "acme-owner", ACME, VisibilityLevel::PublicTenant);
    let resource = ResourceContext::for_content(content);
    let user = UserId::new("acme-viewer");
    authz.can(&user, Action::ViewOkr, &resource, None).map_err(|err| err.to_string())?;
    authz.can(&user, Action::ViewOkr, &resource, None).map_err(|err| err.to_string())?;

    let contents = fs::read_to_string(&path).map_err(|err| err.to_string())?;
    let lines: Vec<Value> = contents
        .lines()
        .map(serde_json::from_str::<Value>)
        .collect::<Result<_, _>>()
        .map_err(|err| err.to_string())?;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["allow"], true);
    assert_eq!(lines[0]["object_id"], "o-1");
    assert_eq!(lines[0]["tenant_id"], ACME);
    assert_eq!(lines[0]["context_source"], "cache_miss");
    assert_eq!(lines[1]["context_source"], "cache_hit");
    Ok(())
}
