// crates/okr-gate-core/src/policy/matrix.rs
// ============================================================================
// Module: OKR Gate Permission Matrix
// Description: Pure, total mapping of (role, action) to allow/deny.
// Purpose: Single source of truth for role-based permissions.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The permission matrix is compiled in. Every role and action pair is
//! defined by an exhaustive match, so adding a role or action is a compile
//! error until the matrix is extended. `manage_billing` is reserved to
//! tenant owners and `impersonate_user` is granted to no role at all; only
//! the superuser read override reaches it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::core::actions::Action;
use crate::core::roles::Role;

// ============================================================================
// SECTION: Matrix
// ============================================================================

/// Returns true when `role` grants `action`.
#[must_use]
pub const fn allows(role: Role, action: Action) -> bool {
    match role {
        Role::TenantOwner => !matches!(action, Action::ImpersonateUser),
        Role::TenantAdmin => !matches!(action, Action::ImpersonateUser | Action::ManageBilling),
        Role::TenantViewer => matches!(action, Action::ViewOkr),
        Role::WorkspaceLead => matches!(
            action,
            Action::ViewOkr
                | Action::CreateOkr
                | Action::EditOkr
                | Action::DeleteOkr
                | Action::PublishOkr
                | Action::RequestCheckin
                | Action::ManageTeams
        ),
        Role::WorkspaceMember => matches!(
            action,
            Action::ViewOkr | Action::CreateOkr | Action::EditOkr | Action::RequestCheckin
        ),
        Role::TeamLead => matches!(
            action,
            Action::ViewOkr
                | Action::CreateOkr
                | Action::EditOkr
                | Action::DeleteOkr
                | Action::PublishOkr
                | Action::RequestCheckin
        ),
        Role::TeamContributor => {
            matches!(action, Action::ViewOkr | Action::CreateOkr | Action::EditOkr)
        }
    }
}

/// Returns true when any of `roles` grants `action`.
pub fn any_allows<'a>(roles: impl IntoIterator<Item = &'a Role>, action: Action) -> bool {
    roles.into_iter().any(|role| allows(*role, action))
}

/// Returns the union of actions granted by `roles`.
pub fn granted_actions<'a>(roles: impl IntoIterator<Item = &'a Role>) -> BTreeSet<Action> {
    let roles: Vec<Role> = roles.into_iter().copied().collect();
    Action::ALL
        .into_iter()
        .filter(|action| roles.iter().any(|role| allows(*role, *action)))
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
