// crates/okr-gate-core/src/policy/visibility.rs
// ============================================================================
// Module: OKR Gate Visibility Policy
// Description: Per-object read narrowing for PRIVATE and EXEC_ONLY content.
// Purpose: Filter reads of restricted content after role-based allow.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Visibility only narrows. Owners, superusers, and tenant owners of the
//! object's tenant are absolute viewers and bypass both the permission
//! matrix and the narrowing. Everyone else must already hold `view_okr`;
//! restrictive levels additionally require the tenant's exec-only whitelist.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::context::UserContext;
use crate::core::resource::ContentObject;
use crate::core::resource::TenantFacts;
use crate::core::roles::Role;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Returns true for viewers whose access overrides role and visibility checks.
#[must_use]
pub fn is_absolute_viewer(user: &UserContext, content: &ContentObject) -> bool {
    user.user_id == content.owner_id
        || user.is_superuser
        || user.has_tenant_role(&content.tenant_id, Role::TenantOwner)
}

/// Returns true when the user may see the content object.
///
/// Missing tenant facts count as an empty whitelist.
#[must_use]
pub fn can_view(user: &UserContext, content: &ContentObject, tenant: Option<&TenantFacts>) -> bool {
    if is_absolute_viewer(user, content) {
        return true;
    }
    if !content.visibility.is_restrictive() {
        return true;
    }
    tenant.is_some_and(|facts| facts.is_whitelisted(&user.user_id))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::can_view;
    use super::is_absolute_viewer;
    use crate::core::context::UserContext;
    use crate::core::identifiers::ObjectId;
    use crate::core::identifiers::TenantId;
    use crate::core::identifiers::UserId;
    use crate::core::resource::ContentObject;
    use crate::core::resource::TenantFacts;
    use crate::core::resource::VisibilityLevel;
    use crate::core::roles::Role;

    fn content(visibility: VisibilityLevel) -> ContentObject {
        ContentObject {
            id: ObjectId::new("obj-1"),
            owner_id: UserId::new("owner"),
            tenant_id: TenantId::new("t1"),
            visibility,
            is_published: false,
            cycle_state: None,
        }
    }

    #[test]
    fn owner_sees_private_content() {
        let user = UserContext::new(UserId::new("owner"));
        assert!(can_view(&user, &content(VisibilityLevel::Private), None));
    }

    #[test]
    fn tenant_owner_is_absolute() {
        let mut user = UserContext::new(UserId::new("boss"));
        user.tenant_roles.insert(TenantId::new("t1"), BTreeSet::from([Role::TenantOwner]));
        assert!(is_absolute_viewer(&user, &content(VisibilityLevel::ExecOnly)));
    }

    #[test]
    fn tenant_owner_elsewhere_is_not_absolute() {
        let mut user = UserContext::new(UserId::new("boss"));
        user.tenant_roles.insert(TenantId::new("t2"), BTreeSet::from([Role::TenantOwner]));
        assert!(!is_absolute_viewer(&user, &content(VisibilityLevel::ExecOnly)));
    }

    #[test]
    fn restrictive_levels_require_whitelist() {
        let user = UserContext::new(UserId::new("reader"));
        let mut facts = TenantFacts::new(TenantId::new("t1"));
        for level in [VisibilityLevel::Private, VisibilityLevel::ExecOnly] {
            assert!(!can_view(&user, &content(level), None));
            assert!(!can_view(&user, &content(level), Some(&facts)));
        }
        facts.exec_only_whitelist.insert(UserId::new("reader"));
        for level in [VisibilityLevel::Private, VisibilityLevel::ExecOnly] {
            assert!(can_view(&user, &content(level), Some(&facts)));
        }
    }

    #[test]
    fn open_levels_are_visible() {
        let user = UserContext::new(UserId::new("reader"));
        for level in [VisibilityLevel::WorkspaceOnly, VisibilityLevel::PublicTenant] {
            assert!(can_view(&user, &content(level), None));
        }
    }
}
