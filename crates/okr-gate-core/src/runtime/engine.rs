// crates/okr-gate-core/src/runtime/engine.rs
// ============================================================================
// Module: OKR Gate Decision Engine
// Description: Orchestrates boundary, lock, matrix, and visibility policies.
// Purpose: Single entry point producing one decision per (actor, action, resource).
// Dependencies: crate::{core, policy}, thiserror
// ============================================================================

//! ## Overview
//! The decision engine is the only caller of the individual policies and
//! fixes their order. The first failing step wins:
//!
//! 1. resource integrity (errors, never denies)
//! 2. tenant boundary, for mutating actions
//! 3. publish/cycle lock, for structural content mutations
//! 4. permission matrix against the roles applying to the resource
//! 5. visibility narrowing, for content reads and check-in requests
//!
//! Evaluation is pure: identical inputs always yield identical decisions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::actions::Action;
use crate::core::context::UserContext;
use crate::core::decision::Decision;
use crate::core::decision::ReasonCode;
use crate::core::identifiers::TenantId;
use crate::core::resource::ResourceContext;
use crate::core::resource::ScopeChain;
use crate::core::resource::VisibilityLevel;
use crate::core::roles::Role;
use crate::policy::boundary;
use crate::policy::matrix;
use crate::policy::publish_lock;
use crate::policy::visibility;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Input-integrity failures. Denies are never errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Resource facts are structurally inconsistent.
    #[error("invalid resource: {0}")]
    InvalidResource(String),
}

// ============================================================================
// SECTION: Decision Engine
// ============================================================================

/// Stateless authorization decision engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionEngine;

impl DecisionEngine {
    /// Creates a decision engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decides whether `user` may perform `action` on `resource`.
    ///
    /// `actor_tenant` is the tenant the actor is acting within; it is only
    /// consulted for mutating actions.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidResource`] when the resource facts are
    /// inconsistent (for example a content object from another tenant).
    pub fn can(
        &self,
        user: &UserContext,
        action: Action,
        resource: &ResourceContext,
        actor_tenant: Option<&TenantId>,
    ) -> Result<Decision, EngineError> {
        validate_resource(resource)?;

        if action.is_mutation()
            && let Err(violation) =
                boundary::check_mutation(user, resource.tenant_id.as_ref(), actor_tenant)
        {
            return Ok(violation.into_decision());
        }

        if let Some(content) = resource.content_object.as_ref()
            && let Err(lock) = publish_lock::assert_not_locked(action, content, user)
        {
            return Ok(lock.into_decision());
        }

        if !matrix_allows(user, action, resource) {
            return Ok(Decision::deny(ReasonCode::RoleDeny).with_detail("action", action.as_str()));
        }

        if action.is_visibility_governed()
            && let Some(content) = resource.content_object.as_ref()
            && !visibility::can_view(user, content, resource.tenant.as_ref())
        {
            return Ok(Decision::deny(ReasonCode::PrivateVisibility)
                .with_detail("visibility", content.visibility.as_str()));
        }

        Ok(Decision::allow())
    }

    /// Returns true when `role` grants `action` in the permission matrix.
    #[must_use]
    pub const fn role_allows(role: Role, action: Action) -> bool {
        matrix::allows(role, action)
    }

    /// Returns the actions the user's roles grant along a scope chain.
    ///
    /// Superusers receive every read action and no mutating action.
    #[must_use]
    pub fn effective_actions(&self, user: &UserContext, chain: &ScopeChain) -> BTreeSet<Action> {
        if user.is_superuser {
            return Action::ALL.into_iter().filter(|action| !action.is_mutation()).collect();
        }
        matrix::granted_actions(&user.roles_for_chain(chain))
    }
}

// ============================================================================
// SECTION: Policy Steps
// ============================================================================

/// Runs the permission matrix step.
fn matrix_allows(user: &UserContext, action: Action, resource: &ResourceContext) -> bool {
    if user.is_superuser && !action.is_mutation() {
        return true;
    }
    let content = resource.content_object.as_ref();
    if action == Action::ViewOkr
        && let Some(content) = content
    {
        if visibility::is_absolute_viewer(user, content) {
            return true;
        }
        if content.visibility == VisibilityLevel::PublicTenant {
            return matrix::any_allows(&user.roles_in_tenant(&content.tenant_id), action);
        }
    }
    resource
        .scope_chain()
        .is_some_and(|chain| matrix::any_allows(&user.roles_for_chain(&chain), action))
}

/// Rejects structurally inconsistent resource facts.
fn validate_resource(resource: &ResourceContext) -> Result<(), EngineError> {
    let tenant_id = resource.tenant_id.as_ref();
    if let Some(content) = resource.content_object.as_ref() {
        match tenant_id {
            None => {
                return Err(EngineError::InvalidResource(format!(
                    "content object {} has no resource tenant",
                    content.id
                )));
            }
            Some(tenant_id) if *tenant_id != content.tenant_id => {
                return Err(EngineError::InvalidResource(format!(
                    "content object {} belongs to tenant {}, not {tenant_id}",
                    content.id, content.tenant_id
                )));
            }
            Some(_) => {}
        }
    }
    if let Some(facts) = resource.tenant.as_ref()
        && tenant_id != Some(&facts.id)
    {
        return Err(EngineError::InvalidResource(format!(
            "tenant facts for {} do not match the resource tenant",
            facts.id
        )));
    }
    if tenant_id.is_none() && (resource.workspace_id.is_some() || resource.team_id.is_some()) {
        return Err(EngineError::InvalidResource(
            "scope ancestors supplied without a resource tenant".to_string(),
        ));
    }
    if resource.team_id.is_some() && resource.workspace_id.is_none() {
        return Err(EngineError::InvalidResource(
            "team scope supplied without its workspace".to_string(),
        ));
    }
    Ok(())
}
