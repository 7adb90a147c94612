// crates/okr-gate-core/src/policy/mod.rs
// ============================================================================
// Module: OKR Gate Policies
// Description: Individual authorization policies composed by the decision engine.
// Purpose: Keep each policy pure and independently testable.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Policies are crate-private. Callers reach them only through
//! [`crate::runtime::DecisionEngine`], which fixes the evaluation order.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub(crate) mod boundary;
pub(crate) mod matrix;
pub(crate) mod publish_lock;
pub(crate) mod visibility;
