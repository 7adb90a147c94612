// crates/okr-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: OKR Gate Runtime
// Description: Decision engine, context builder, cache, store, and facade.
// Purpose: Execute authorization decisions against loaded role state.
// Dependencies: crate::{core, interfaces, policy}
// ============================================================================

//! ## Overview
//! Runtime modules compose the policies into the decision engine and wrap
//! it with context loading, caching, and logging. Every consumer routes
//! through [`DecisionEngine::can`] (directly or via [`Authorizer`]) rather
//! than re-implementing role or visibility checks.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod authorizer;
pub mod builder;
pub mod cache;
pub mod engine;
pub mod log;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use authorizer::Authorizer;
pub use authorizer::AuthorizerConfig;
pub use authorizer::AuthorizerError;
pub use builder::BuildError;
pub use builder::UserContextBuilder;
pub use cache::Clock;
pub use cache::DEFAULT_CACHE_MAX_ENTRIES;
pub use cache::DEFAULT_CACHE_TTL_MS;
pub use cache::InMemoryContextCache;
pub use cache::ManualClock;
pub use cache::MonotonicClock;
pub use cache::NoopContextCache;
pub use engine::DecisionEngine;
pub use engine::EngineError;
pub use log::ContextSource;
pub use log::DecisionLogEvent;
pub use log::DecisionLogEventParams;
pub use log::DecisionLogSink;
pub use log::FileDecisionLog;
pub use log::NoopDecisionLog;
pub use log::RoleChangeKind;
pub use log::RoleChangeLogEvent;
pub use log::RoleChangeLogEventParams;
pub use log::StderrDecisionLog;
pub use store::InMemoryRoleStore;
