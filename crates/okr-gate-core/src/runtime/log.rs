// crates/okr-gate-core/src/runtime/log.rs
// ============================================================================
// Module: OKR Gate Decision Log
// Description: Structured JSON-lines events for decisions and role changes.
// Purpose: Emit operational logs without a hard logging-framework dependency.
// Dependencies: crate::core, serde, serde_json
// ============================================================================

//! ## Overview
//! Decision log events are emitted by the [`crate::runtime::Authorizer`]
//! facade; the decision engine itself stays silent. Sinks serialize each
//! event as one JSON line so deployments can route them to any pipeline.
//! This is an operational log, not the audit ledger.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::actions::Action;
use crate::core::decision::ReasonCode;
use crate::core::identifiers::ObjectId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::core::roles::AssignmentScope;
use crate::core::roles::Role;
use crate::core::roles::ScopeType;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Where the user context for a decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    /// Served from the context cache.
    CacheHit,
    /// Rebuilt from the role store.
    CacheMiss,
}

/// Kind of role assignment change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleChangeKind {
    /// Assignment created.
    Grant,
    /// Assignment revoked.
    Revoke,
}

/// Decision log event payload.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionLogEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Acting user.
    pub user_id: UserId,
    /// Requested action.
    pub action: Action,
    /// Decision outcome.
    pub allow: bool,
    /// Decision reason code.
    pub reason: ReasonCode,
    /// Resource tenant when present.
    pub tenant_id: Option<TenantId>,
    /// Content object when present.
    pub object_id: Option<ObjectId>,
    /// Context provenance.
    pub context_source: ContextSource,
}

/// Role change log event payload.
#[derive(Debug, Clone, Serialize)]
pub struct RoleChangeLogEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Change kind.
    pub change: RoleChangeKind,
    /// Affected user.
    pub user_id: UserId,
    /// Role granted or revoked.
    pub role: Role,
    /// Scope tier.
    pub scope_type: ScopeType,
    /// Scope identifier (absent for platform scope).
    pub scope_id: Option<String>,
    /// Whether the user's cached context was invalidated.
    pub cache_invalidated: bool,
}

/// Parameters for constructing a decision log event.
#[derive(Debug, Clone)]
pub struct DecisionLogEventParams {
    /// Acting user.
    pub user_id: UserId,
    /// Requested action.
    pub action: Action,
    /// Decision outcome.
    pub allow: bool,
    /// Decision reason code.
    pub reason: ReasonCode,
    /// Resource tenant when present.
    pub tenant_id: Option<TenantId>,
    /// Content object when present.
    pub object_id: Option<ObjectId>,
    /// Context provenance.
    pub context_source: ContextSource,
}

/// Parameters for constructing a role change log event.
#[derive(Debug, Clone)]
pub struct RoleChangeLogEventParams {
    /// Change kind.
    pub change: RoleChangeKind,
    /// Affected user.
    pub user_id: UserId,
    /// Role granted or revoked.
    pub role: Role,
    /// Scope of the assignment.
    pub scope: AssignmentScope,
    /// Whether the user's cached context was invalidated.
    pub cache_invalidated: bool,
}

impl DecisionLogEvent {
    /// Creates a decision event with a consistent timestamp.
    #[must_use]
    pub fn new(params: DecisionLogEventParams) -> Self {
        Self {
            event: "okr_decision",
            timestamp_ms: now_millis(),
            user_id: params.user_id,
            action: params.action,
            allow: params.allow,
            reason: params.reason,
            tenant_id: params.tenant_id,
            object_id: params.object_id,
            context_source: params.context_source,
        }
    }
}

impl RoleChangeLogEvent {
    /// Creates a role change event with a consistent timestamp.
    #[must_use]
    pub fn new(params: RoleChangeLogEventParams) -> Self {
        Self {
            event: "okr_role_change",
            timestamp_ms: now_millis(),
            change: params.change,
            user_id: params.user_id,
            role: params.role,
            scope_type: params.scope.scope_type(),
            scope_id: params.scope.scope_id().map(str::to_string),
            cache_invalidated: params.cache_invalidated,
        }
    }
}

/// Returns wall-clock milliseconds since the epoch.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink for decision log events.
pub trait DecisionLogSink: Send + Sync {
    /// Records a decision event.
    fn record_decision(&self, event: &DecisionLogEvent);

    /// Records a role change event.
    fn record_role_change(&self, event: &RoleChangeLogEvent);
}

/// Sink that logs JSON lines to stderr.
pub struct StderrDecisionLog;

impl DecisionLogSink for StderrDecisionLog {
    fn record_decision(&self, event: &DecisionLogEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_role_change(&self, event: &RoleChangeLogEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileDecisionLog {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileDecisionLog {
    /// Opens the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized event.
    fn append(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl DecisionLogSink for FileDecisionLog {
    fn record_decision(&self, event: &DecisionLogEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }

    fn record_role_change(&self, event: &RoleChangeLogEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }
}

/// No-op decision log.
pub struct NoopDecisionLog;

impl DecisionLogSink for NoopDecisionLog {
    fn record_decision(&self, _event: &DecisionLogEvent) {}

    fn record_role_change(&self, _event: &RoleChangeLogEvent) {}
}
