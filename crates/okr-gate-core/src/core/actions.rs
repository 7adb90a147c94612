// crates/okr-gate-core/src/core/actions.rs
// ============================================================================
// Module: OKR Gate Actions
// Description: Enumerated actions and their mutation/content classification.
// Purpose: Give the decision engine a closed action vocabulary.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Actions are a fixed enumerated set. Each action carries three static
//! classifications used by the decision engine: read vs. mutating, whether it
//! targets OKR content, and whether it is governed by the publish/cycle lock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Action Types
// ============================================================================

/// Read vs. mutating classification of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    /// Non-mutating action.
    Read,
    /// Mutating action; tenant boundary applies.
    Mutation,
}

/// Enumerated platform actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// View an objective, key result, or initiative.
    ViewOkr,
    /// Create OKR content (or a child under existing content).
    CreateOkr,
    /// Edit OKR content.
    EditOkr,
    /// Delete OKR content.
    DeleteOkr,
    /// Publish (or unpublish) OKR content.
    PublishOkr,
    /// Request a check-in from a content owner.
    RequestCheckin,
    /// Manage tenant users.
    ManageUsers,
    /// Manage tenant billing.
    ManageBilling,
    /// Manage workspaces.
    ManageWorkspaces,
    /// Manage teams.
    ManageTeams,
    /// Manage tenant-wide settings.
    ManageTenantSettings,
    /// Export tenant data.
    ExportData,
    /// Act as another user (support tooling).
    ImpersonateUser,
}

impl Action {
    /// All actions in declaration order.
    pub const ALL: [Self; 13] = [
        Self::ViewOkr,
        Self::CreateOkr,
        Self::EditOkr,
        Self::DeleteOkr,
        Self::PublishOkr,
        Self::RequestCheckin,
        Self::ManageUsers,
        Self::ManageBilling,
        Self::ManageWorkspaces,
        Self::ManageTeams,
        Self::ManageTenantSettings,
        Self::ExportData,
        Self::ImpersonateUser,
    ];

    /// Returns the read/mutation classification.
    #[must_use]
    pub const fn class(self) -> ActionClass {
        match self {
            Self::ViewOkr | Self::ExportData | Self::ImpersonateUser => ActionClass::Read,
            Self::CreateOkr
            | Self::EditOkr
            | Self::DeleteOkr
            | Self::PublishOkr
            | Self::RequestCheckin
            | Self::ManageUsers
            | Self::ManageBilling
            | Self::ManageWorkspaces
            | Self::ManageTeams
            | Self::ManageTenantSettings => ActionClass::Mutation,
        }
    }

    /// Returns true for mutating actions.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        matches!(self.class(), ActionClass::Mutation)
    }

    /// Returns true when the action requires seeing the content object:
    /// content reads and check-in requests.
    #[must_use]
    pub const fn is_visibility_governed(self) -> bool {
        matches!(self, Self::ViewOkr | Self::RequestCheckin)
    }

    /// Returns true when the action is a structural content mutation subject to
    /// the publish/cycle lock.
    #[must_use]
    pub const fn is_lock_governed(self) -> bool {
        matches!(self, Self::CreateOkr | Self::EditOkr | Self::DeleteOkr | Self::PublishOkr)
    }

    /// Returns the stable label for the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ViewOkr => "view_okr",
            Self::CreateOkr => "create_okr",
            Self::EditOkr => "edit_okr",
            Self::DeleteOkr => "delete_okr",
            Self::PublishOkr => "publish_okr",
            Self::RequestCheckin => "request_checkin",
            Self::ManageUsers => "manage_users",
            Self::ManageBilling => "manage_billing",
            Self::ManageWorkspaces => "manage_workspaces",
            Self::ManageTeams => "manage_teams",
            Self::ManageTenantSettings => "manage_tenant_settings",
            Self::ExportData => "export_data",
            Self::ImpersonateUser => "impersonate_user",
        }
    }

    /// Parses a stable action label (case-insensitive).
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|action| action.as_str() == normalized)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
