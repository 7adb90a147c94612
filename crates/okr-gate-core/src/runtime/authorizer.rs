// crates/okr-gate-core/src/runtime/authorizer.rs
// ============================================================================
// Module: OKR Gate Authorizer
// Description: Cache-aware facade over the builder, engine, and role store.
// Purpose: Single call path for decisions and role assignment writes.
// Dependencies: crate::{core, interfaces, runtime}, thiserror
// ============================================================================

//! ## Overview
//! [`Authorizer`] is what request handlers call. It resolves the actor's
//! [`UserContext`] through the context cache (rebuilding on a miss), runs the
//! [`DecisionEngine`], and emits decision log events. It also owns the role
//! assignment write path: grants and revokes are validated, persisted, and
//! followed by a synchronous cache invalidation before the call returns, so
//! the next decision always observes the change. User record writes follow
//! the same rule.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

use crate::core::actions::Action;
use crate::core::context::UserContext;
use crate::core::decision::Decision;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::core::resource::ResourceContext;
use crate::core::resource::ResourceScope;
use crate::core::resource::ScopeChain;
use crate::core::roles::AssignmentKey;
use crate::core::roles::AssignmentScope;
use crate::core::roles::Role;
use crate::core::roles::RoleAssignment;
use crate::core::time::Timestamp;
use crate::interfaces::CacheError;
use crate::interfaces::CacheLookup;
use crate::interfaces::ContextCache;
use crate::interfaces::RoleStore;
use crate::interfaces::StoreError;
use crate::interfaces::UserRecord;
use crate::runtime::builder::BuildError;
use crate::runtime::builder::UserContextBuilder;
use crate::runtime::engine::DecisionEngine;
use crate::runtime::engine::EngineError;
use crate::runtime::log::ContextSource;
use crate::runtime::log::DecisionLogEvent;
use crate::runtime::log::DecisionLogEventParams;
use crate::runtime::log::DecisionLogSink;
use crate::runtime::log::NoopDecisionLog;
use crate::runtime::log::RoleChangeKind;
use crate::runtime::log::RoleChangeLogEvent;
use crate::runtime::log::RoleChangeLogEventParams;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authorizer failures. Denies are returned as decisions, never as errors.
#[derive(Debug, Error)]
pub enum AuthorizerError {
    /// Referenced user or scope does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Resource facts are inconsistent.
    #[error("invalid resource: {0}")]
    InvalidResource(String),
    /// Role assignment request is invalid.
    #[error("invalid role assignment: {0}")]
    InvalidAssignment(String),
    /// User record write is invalid.
    #[error("invalid user record: {0}")]
    InvalidUser(String),
    /// Role store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Context cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl From<BuildError> for AuthorizerError {
    fn from(error: BuildError) -> Self {
        match error {
            BuildError::UserNotFound(user_id) => Self::NotFound(format!("user {user_id}")),
            BuildError::Store(error) => Self::Store(error),
        }
    }
}

impl From<EngineError> for AuthorizerError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::InvalidResource(message) => Self::InvalidResource(message),
        }
    }
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Authorizer behavior settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorizerConfig {
    /// Log allow decisions as well as denies.
    pub log_allows: bool,
}

// ============================================================================
// SECTION: Authorizer
// ============================================================================

/// Cache-aware authorization facade.
pub struct Authorizer<S> {
    /// Role store.
    store: S,
    /// User context cache.
    cache: Arc<dyn ContextCache>,
    /// Decision log sink.
    log: Arc<dyn DecisionLogSink>,
    /// Decision engine.
    engine: DecisionEngine,
    /// Behavior settings.
    config: AuthorizerConfig,
}

impl<S: RoleStore> Authorizer<S> {
    /// Creates an authorizer with a silent decision log.
    #[must_use]
    pub fn new(store: S, cache: Arc<dyn ContextCache>) -> Self {
        Self {
            store,
            cache,
            log: Arc::new(NoopDecisionLog),
            engine: DecisionEngine::new(),
            config: AuthorizerConfig::default(),
        }
    }

    /// Replaces the decision log sink.
    #[must_use]
    pub fn with_log(mut self, log: Arc<dyn DecisionLogSink>) -> Self {
        self.log = log;
        self
    }

    /// Replaces the behavior settings.
    #[must_use]
    pub const fn with_config(mut self, config: AuthorizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the underlying role store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the user's context, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizerError::NotFound`] for unknown users and store or
    /// cache errors otherwise.
    pub fn user_context(&self, user_id: &UserId) -> Result<UserContext, AuthorizerError> {
        self.load_context(user_id).map(|(context, _)| context)
    }

    /// Decides an action for a user acting within `actor_tenant`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizerError`] on unknown users, inconsistent resources,
    /// or backend failures.
    pub fn can(
        &self,
        user_id: &UserId,
        action: Action,
        resource: &ResourceContext,
        actor_tenant: Option<&TenantId>,
    ) -> Result<Decision, AuthorizerError> {
        let (context, source) = self.load_context(user_id)?;
        let decision = self.engine.can(&context, action, resource, actor_tenant)?;
        self.log_decision(&context, action, resource, &decision, source);
        Ok(decision)
    }

    /// Decides an action for a user acting within their home tenant.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizerError`] on unknown users, inconsistent resources,
    /// or backend failures.
    pub fn can_as_member(
        &self,
        user_id: &UserId,
        action: Action,
        resource: &ResourceContext,
    ) -> Result<Decision, AuthorizerError> {
        let (context, source) = self.load_context(user_id)?;
        let decision =
            self.engine.can(&context, action, resource, context.home_tenant_id.as_ref())?;
        self.log_decision(&context, action, resource, &decision, source);
        Ok(decision)
    }

    /// Returns the items the user may view, applying the full `view_okr`
    /// decision to each item.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizerError`] when the context cannot be loaded or any
    /// item's resource facts are inconsistent.
    pub fn filter_visible<T, F>(
        &self,
        user_id: &UserId,
        items: impl IntoIterator<Item = T>,
        resource_of: F,
    ) -> Result<Vec<T>, AuthorizerError>
    where
        F: Fn(&T) -> ResourceContext,
    {
        let (context, _) = self.load_context(user_id)?;
        let mut visible = Vec::new();
        for item in items {
            let resource = resource_of(&item);
            if self.engine.can(&context, Action::ViewOkr, &resource, None)?.allow {
                visible.push(item);
            }
        }
        Ok(visible)
    }

    /// Returns the actions the user's roles grant along a scope chain.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizerError`] when the context cannot be loaded.
    pub fn effective_actions(
        &self,
        user_id: &UserId,
        chain: &ScopeChain,
    ) -> Result<BTreeSet<Action>, AuthorizerError> {
        let context = self.user_context(user_id)?;
        Ok(self.engine.effective_actions(&context, chain))
    }

    /// Resolves a resource scope to its ancestor chain.
    ///
    /// `tenant_id` is required when the scope names no workspace or team and
    /// is cross-checked against the resolved tenant otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizerError::NotFound`] for unknown scopes and
    /// [`AuthorizerError::InvalidResource`] for inconsistent ones.
    pub fn resolve_scope_chain(
        &self,
        tenant_id: Option<&TenantId>,
        scope: &ResourceScope,
    ) -> Result<ScopeChain, AuthorizerError> {
        let mut workspace_id = scope.workspace_id.clone();
        if let Some(team_id) = scope.team_id.as_ref() {
            let parent = self
                .store
                .team_workspace(team_id)?
                .ok_or_else(|| AuthorizerError::NotFound(format!("team {team_id}")))?;
            if let Some(stated) = workspace_id.as_ref()
                && *stated != parent
            {
                return Err(AuthorizerError::InvalidResource(format!(
                    "team {team_id} belongs to workspace {parent}, not {stated}"
                )));
            }
            workspace_id = Some(parent);
        }

        let resolved_tenant = match workspace_id.as_ref() {
            Some(workspace) => {
                let owner = self
                    .store
                    .workspace_tenant(workspace)?
                    .ok_or_else(|| AuthorizerError::NotFound(format!("workspace {workspace}")))?;
                if let Some(stated) = tenant_id
                    && *stated != owner
                {
                    return Err(AuthorizerError::InvalidResource(format!(
                        "workspace {workspace} belongs to tenant {owner}, not {stated}"
                    )));
                }
                owner
            }
            None => {
                let tenant = tenant_id.ok_or_else(|| {
                    AuthorizerError::InvalidResource("scope names no tenant".to_string())
                })?;
                if !self.store.tenant_exists(tenant)? {
                    return Err(AuthorizerError::NotFound(format!("tenant {tenant}")));
                }
                tenant.clone()
            }
        };

        Ok(ScopeChain {
            tenant_id: resolved_tenant,
            workspace_id,
            team_id: scope.team_id.clone(),
        })
    }

    /// Creates or replaces a user record and invalidates the user's cached
    /// context.
    ///
    /// Promotion to superuser is refused while the user still holds scoped
    /// assignments; revoke them first.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizerError::InvalidUser`] for a superuser with a home
    /// tenant or with scoped assignments, and [`AuthorizerError::NotFound`]
    /// for an unknown home tenant.
    pub fn save_user(&self, record: &UserRecord) -> Result<(), AuthorizerError> {
        if record.is_superuser {
            if record.home_tenant_id.is_some() {
                return Err(AuthorizerError::InvalidUser(format!(
                    "superuser {} cannot belong to a home tenant",
                    record.user_id
                )));
            }
            let held = self.store.assignments_for_user(&record.user_id)?;
            if !held.is_empty() {
                return Err(AuthorizerError::InvalidUser(format!(
                    "{} holds {} scoped role(s); revoke them before promotion to superuser",
                    record.user_id,
                    held.len()
                )));
            }
        }
        if let Some(tenant_id) = record.home_tenant_id.as_ref()
            && !self.store.tenant_exists(tenant_id)?
        {
            return Err(AuthorizerError::NotFound(format!("tenant {tenant_id}")));
        }
        self.store.save_user(record)?;
        self.cache.invalidate(&record.user_id)?;
        Ok(())
    }

    /// Grants a role and invalidates the user's cached context.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizerError::InvalidAssignment`] for tier mismatches,
    /// platform scope, or superuser targets; [`AuthorizerError::NotFound`]
    /// for unknown users or scopes; and [`StoreError::Conflict`] (wrapped)
    /// for duplicates.
    pub fn grant(
        &self,
        user_id: &UserId,
        role: Role,
        scope: AssignmentScope,
        created_at: Timestamp,
    ) -> Result<RoleAssignment, AuthorizerError> {
        if scope == AssignmentScope::Platform {
            return Err(AuthorizerError::InvalidAssignment(
                "platform scope carries no grantable roles".to_string(),
            ));
        }
        if role.scope_type() != scope.scope_type() {
            return Err(AuthorizerError::InvalidAssignment(format!(
                "{role} is a {} role and cannot be granted at {} scope",
                role.scope_type(),
                scope.scope_type()
            )));
        }
        let user = self
            .store
            .load_user(user_id)?
            .ok_or_else(|| AuthorizerError::NotFound(format!("user {user_id}")))?;
        if user.is_superuser {
            return Err(AuthorizerError::InvalidAssignment(format!(
                "superuser {user_id} cannot hold scoped roles"
            )));
        }
        self.ensure_scope_exists(&scope)?;

        let assignment = RoleAssignment {
            user_id: user_id.clone(),
            role,
            scope,
            created_at,
        };
        self.store.insert_assignment(&assignment)?;
        self.cache.invalidate(user_id)?;
        self.log.record_role_change(&RoleChangeLogEvent::new(RoleChangeLogEventParams {
            change: RoleChangeKind::Grant,
            user_id: user_id.clone(),
            role,
            scope: assignment.scope.clone(),
            cache_invalidated: true,
        }));
        Ok(assignment)
    }

    /// Revokes a role assignment and invalidates the user's cached context.
    ///
    /// Returns true when an assignment was removed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizerError`] on store or cache failures.
    pub fn revoke(&self, key: &AssignmentKey) -> Result<bool, AuthorizerError> {
        let removed = self.store.delete_assignment(key)?;
        self.cache.invalidate(&key.user_id)?;
        if removed {
            self.log.record_role_change(&RoleChangeLogEvent::new(RoleChangeLogEventParams {
                change: RoleChangeKind::Revoke,
                user_id: key.user_id.clone(),
                role: key.role,
                scope: key.scope.clone(),
                cache_invalidated: true,
            }));
        }
        Ok(removed)
    }

    /// Loads the context through the cache, rebuilding on a miss.
    fn load_context(
        &self,
        user_id: &UserId,
    ) -> Result<(UserContext, ContextSource), AuthorizerError> {
        match self.cache.get(user_id)? {
            CacheLookup::Hit(context) => Ok((context, ContextSource::CacheHit)),
            CacheLookup::Miss(ticket) => {
                let context = UserContextBuilder::new(&self.store).build(user_id)?;
                self.cache.set(ticket, context.clone())?;
                Ok((context, ContextSource::CacheMiss))
            }
        }
    }

    /// Verifies the assignment scope references a live entity.
    fn ensure_scope_exists(&self, scope: &AssignmentScope) -> Result<(), AuthorizerError> {
        let exists = match scope {
            AssignmentScope::Platform => true,
            AssignmentScope::Tenant(tenant_id) => self.store.tenant_exists(tenant_id)?,
            AssignmentScope::Workspace(workspace_id) => {
                self.store.workspace_tenant(workspace_id)?.is_some()
            }
            AssignmentScope::Team(team_id) => self.store.team_workspace(team_id)?.is_some(),
        };
        if exists {
            Ok(())
        } else {
            Err(AuthorizerError::NotFound(format!(
                "{} scope {}",
                scope.scope_type(),
                scope.scope_id().unwrap_or_default()
            )))
        }
    }

    /// Emits a decision event when the log settings call for it.
    fn log_decision(
        &self,
        context: &UserContext,
        action: Action,
        resource: &ResourceContext,
        decision: &Decision,
        source: ContextSource,
    ) {
        if decision.allow && !self.config.log_allows {
            return;
        }
        self.log.record_decision(&DecisionLogEvent::new(DecisionLogEventParams {
            user_id: context.user_id.clone(),
            action,
            allow: decision.allow,
            reason: decision.reason,
            tenant_id: resource.tenant_id.clone(),
            object_id: resource.content_object.as_ref().map(|content| content.id.clone()),
            context_source: source,
        }));
    }
}
