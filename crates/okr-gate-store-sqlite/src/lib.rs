// crates/okr-gate-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Role Store
// Description: Durable RoleStore backend using SQLite.
// Purpose: Persist users, the scope directory, and role assignments.
// Dependencies: okr-gate-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`RoleStore`] implementation holding
//! user records, the tenant/workspace/team directory, exec-only whitelists,
//! and role assignment rows under a uniqueness constraint. The schema is
//! versioned through a `store_meta` table and unknown versions fail closed.
//! Security posture: database contents are untrusted; rows that do not parse
//! into the role vocabulary surface as corruption, never as grants.
//!
//! [`RoleStore`]: okr_gate_core::RoleStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteRoleStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
