// crates/okr-gate-config/src/lib.rs
// ============================================================================
// Module: OKR Gate Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for okr-gate.toml semantics.
// Dependencies: okr-gate-core, okr-gate-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `okr-gate-config` defines the configuration model for OKR Gate hosts:
//! the user context cache, the role store backend, and the decision log.
//! Validation is strict and fail-closed; an invalid file never produces a
//! partially applied configuration.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
