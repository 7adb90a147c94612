// crates/okr-gate-core/src/core/mod.rs
// ============================================================================
// Module: OKR Gate Core Types
// Description: Canonical identifiers, roles, actions, resources, and decisions.
// Purpose: Provide stable, serializable types shared by every OKR Gate crate.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types describe who acts (identifiers, roles, user context), what they
//! do (actions), what they act on (resource context), and the outcome
//! (decisions). They carry no behavior beyond simple classification helpers.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod actions;
pub mod context;
pub mod decision;
pub mod identifiers;
pub mod resource;
pub mod roles;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use actions::Action;
pub use actions::ActionClass;
pub use context::UserContext;
pub use decision::Decision;
pub use decision::ReasonCode;
pub use identifiers::ObjectId;
pub use identifiers::TeamId;
pub use identifiers::TenantId;
pub use identifiers::UserId;
pub use identifiers::WorkspaceId;
pub use resource::ContentObject;
pub use resource::CycleState;
pub use resource::ResourceContext;
pub use resource::ResourceScope;
pub use resource::ScopeChain;
pub use resource::TenantFacts;
pub use resource::VisibilityLevel;
pub use roles::AssignmentKey;
pub use roles::AssignmentScope;
pub use roles::Role;
pub use roles::RoleAssignment;
pub use roles::ScopeType;
pub use time::Timestamp;
