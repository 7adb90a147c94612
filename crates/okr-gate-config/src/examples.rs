// crates/okr-gate-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and `okr-gate config example`.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for OKR Gate configuration. The output is static and
//! must stay loadable by [`crate::OkrGateConfig`].

/// Returns a canonical example `okr-gate.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[cache]
enabled = true
ttl_ms = 30000
max_entries = 10000

[role_store]
type = "sqlite"
path = "okr-gate.db"
journal_mode = "wal"
sync_mode = "full"
busy_timeout_ms = 5000

[decision_log]
enabled = true
path = "okr-gate-decisions.jsonl"
log_allows = false
"#,
    )
}
