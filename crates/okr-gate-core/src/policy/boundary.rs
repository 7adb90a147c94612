// crates/okr-gate-core/src/policy/boundary.rs
// ============================================================================
// Module: OKR Gate Tenant Boundary Guard
// Description: Tenant isolation checks for mutating actions.
// Purpose: Enforce tenant isolation independently of role correctness.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The boundary guard runs only for mutating actions. Checks short-circuit in
//! a fixed order: superuser, actor tenant, resource tenant, tenant equality.
//! Blank tenant identifiers are treated as missing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::context::UserContext;
use crate::core::decision::Decision;
use crate::core::decision::ReasonCode;
use crate::core::identifiers::TenantId;

// ============================================================================
// SECTION: Violations
// ============================================================================

/// Reason a mutation was stopped at the tenant boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryViolation {
    /// Superusers never mutate tenant data.
    Superuser,
    /// Actor has no resolvable tenant.
    ActorTenantMissing,
    /// Resource is global (no tenant) and therefore immutable.
    ResourceTenantMissing,
    /// Actor and resource tenants differ.
    TenantMismatch {
        /// Tenant the actor is acting within.
        actor: TenantId,
        /// Tenant owning the resource.
        resource: TenantId,
    },
}

impl BoundaryViolation {
    /// Converts the violation into a deny decision.
    #[must_use]
    pub fn into_decision(self) -> Decision {
        match self {
            Self::Superuser => Decision::deny(ReasonCode::SuperuserReadOnly),
            Self::ActorTenantMissing => Decision::deny(ReasonCode::TenantBoundary)
                .with_detail("boundary", "actor_tenant_missing"),
            Self::ResourceTenantMissing => Decision::deny(ReasonCode::TenantBoundary)
                .with_detail("boundary", "resource_tenant_missing"),
            Self::TenantMismatch {
                actor,
                resource,
            } => Decision::deny(ReasonCode::TenantBoundary)
                .with_detail("boundary", "tenant_mismatch")
                .with_detail("actor_tenant", actor.as_str())
                .with_detail("resource_tenant", resource.as_str()),
        }
    }
}

// ============================================================================
// SECTION: Guard
// ============================================================================

/// Checks a mutation against the tenant boundary.
///
/// # Errors
///
/// Returns the first [`BoundaryViolation`] found.
pub fn check_mutation(
    user: &UserContext,
    resource_tenant: Option<&TenantId>,
    actor_tenant: Option<&TenantId>,
) -> Result<(), BoundaryViolation> {
    if user.is_superuser {
        return Err(BoundaryViolation::Superuser);
    }
    let Some(actor) = actor_tenant.filter(|id| !id.is_blank()) else {
        return Err(BoundaryViolation::ActorTenantMissing);
    };
    let Some(resource) = resource_tenant.filter(|id| !id.is_blank()) else {
        return Err(BoundaryViolation::ResourceTenantMissing);
    };
    if actor != resource {
        return Err(BoundaryViolation::TenantMismatch {
            actor: actor.clone(),
            resource: resource.clone(),
        });
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
