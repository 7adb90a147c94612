// crates/okr-gate-core/src/lib.rs
// ============================================================================
// Module: OKR Gate Core Library
// Description: Public API surface for the OKR Gate authorization core.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, policy, runtime}
// ============================================================================

//! ## Overview
//! OKR Gate core decides, for every read or mutation on a multi-tenant OKR
//! platform, whether an actor may proceed. It combines hierarchical role
//! resolution, a compiled permission matrix, tenant-boundary isolation,
//! per-object visibility narrowing, and publish/cycle lock governance into a
//! single [`Decision`] with a stable [`ReasonCode`]. Persistence and caching
//! integrate through the [`RoleStore`] and [`ContextCache`] interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
mod policy;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::CacheError;
pub use interfaces::CacheLookup;
pub use interfaces::CacheTicket;
pub use interfaces::ContextCache;
pub use interfaces::RoleStore;
pub use interfaces::StoreError;
pub use interfaces::UserRecord;
pub use runtime::Authorizer;
pub use runtime::AuthorizerConfig;
pub use runtime::AuthorizerError;
pub use runtime::BuildError;
pub use runtime::Clock;
pub use runtime::ContextSource;
pub use runtime::DEFAULT_CACHE_MAX_ENTRIES;
pub use runtime::DEFAULT_CACHE_TTL_MS;
pub use runtime::DecisionEngine;
pub use runtime::DecisionLogEvent;
pub use runtime::DecisionLogSink;
pub use runtime::EngineError;
pub use runtime::FileDecisionLog;
pub use runtime::InMemoryContextCache;
pub use runtime::InMemoryRoleStore;
pub use runtime::ManualClock;
pub use runtime::MonotonicClock;
pub use runtime::NoopContextCache;
pub use runtime::NoopDecisionLog;
pub use runtime::RoleChangeKind;
pub use runtime::RoleChangeLogEvent;
pub use runtime::StderrDecisionLog;
pub use runtime::UserContextBuilder;
