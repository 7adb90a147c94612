// crates/okr-gate-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Role Store
// Description: Durable RoleStore and scope directory backed by SQLite.
// Purpose: Persist users, tenants, workspaces, teams, and role assignments.
// Dependencies: okr-gate-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`RoleStore`] using `SQLite`. Role
//! assignments are stored as `(user_id, role, scope_type, scope_id)` rows
//! under a primary key, so duplicate grants surface as conflicts. Platform
//! scope rows store an empty `scope_id`. The directory tables enforce
//! referential integrity between tenants, workspaces, and teams.
//!
//! Security posture: rows are decoded strictly; an unknown role or scope
//! label, or an identifier whose presence disagrees with its scope tier, is
//! reported as [`SqliteStoreError::Corrupt`] and never folded into a grant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use okr_gate_core::AssignmentKey;
use okr_gate_core::AssignmentScope;
use okr_gate_core::Role;
use okr_gate_core::RoleAssignment;
use okr_gate_core::RoleStore;
use okr_gate_core::ScopeType;
use okr_gate_core::StoreError;
use okr_gate_core::TeamId;
use okr_gate_core::TenantFacts;
use okr_gate_core::TenantId;
use okr_gate_core::Timestamp;
use okr_gate_core::UserId;
use okr_gate_core::UserRecord;
use okr_gate_core::WorkspaceId;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Stored `scope_id` for platform scope rows.
const PLATFORM_SCOPE_ID: &str = "";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` role store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config for `path` with default pragmas.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` role store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored rows do not decode.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid input or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Write collides with an existing row.
    #[error("sqlite store conflict: {0}")]
    Conflict(String),
    /// Referenced row does not exist.
    #[error("sqlite store record not found: {0}")]
    NotFound(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => {
                Self::Store(format!("version mismatch: {message}"))
            }
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::Conflict(message) => Self::Conflict(message),
            SqliteStoreError::NotFound(message) => Self::NotFound(message),
        }
    }
}

/// Maps a rusqlite error into a store error.
fn db_error(err: &rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

/// Returns true when the error is a constraint violation.
fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed role store and scope directory.
///
/// # Invariants
/// - At most one assignment row exists per `(user_id, role, scope_type, scope_id)`.
/// - Every workspace references a tenant and every team a workspace.
#[derive(Debug, Clone)]
pub struct SqliteRoleStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteRoleStore {
    /// Opens (or creates) a store at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is unsafe, the database
    /// cannot be opened, or its schema version is unsupported.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Verifies the store can execute a simple SQL statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the readiness query fails.
    pub fn readiness(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard.query_row("SELECT 1", [], |_| Ok(())).map_err(|err| db_error(&err))
    }

    /// Inserts or replaces a user record.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on database failures.
    pub fn upsert_user(&self, record: &UserRecord) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO users (user_id, is_superuser, home_tenant_id) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                   is_superuser = excluded.is_superuser,
                   home_tenant_id = excluded.home_tenant_id",
                params![
                    record.user_id.as_str(),
                    record.is_superuser,
                    record.home_tenant_id.as_ref().map(TenantId::as_str)
                ],
            )
            .map_err(|err| db_error(&err))?;
        drop(guard);
        Ok(())
    }

    /// Lists every user record ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on database failures.
    pub fn list_users(&self) -> Result<Vec<UserRecord>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare("SELECT user_id, is_superuser, home_tenant_id FROM users ORDER BY user_id")
            .map_err(|err| db_error(&err))?;
        let rows = stmt
            .query_map([], |row| {
                let user_id: String = row.get(0)?;
                let is_superuser: bool = row.get(1)?;
                let home_tenant_id: Option<String> = row.get(2)?;
                Ok(UserRecord {
                    user_id: UserId::new(user_id),
                    is_superuser,
                    home_tenant_id: home_tenant_id.map(TenantId::new),
                })
            })
            .map_err(|err| db_error(&err))?;
        let mut users = Vec::new();
        for row in rows {
            users.push(row.map_err(|err| db_error(&err))?);
        }
        Ok(users)
    }

    /// Registers a tenant with an empty exec-only whitelist.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Conflict`] when the tenant already exists.
    pub fn add_tenant(&self, tenant_id: &TenantId) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        let result = guard
            .execute("INSERT INTO tenants (tenant_id) VALUES (?1)", params![tenant_id.as_str()]);
        drop(guard);
        match result {
            Ok(_) => Ok(()),
            Err(err) if is_constraint_violation(&err) => {
                Err(SqliteStoreError::Conflict(format!("tenant {tenant_id} already exists")))
            }
            Err(err) => Err(db_error(&err)),
        }
    }

    /// Registers a workspace under an existing tenant.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when the tenant does not exist
    /// and [`SqliteStoreError::Conflict`] when the workspace already exists.
    pub fn add_workspace(
        &self,
        workspace_id: &WorkspaceId,
        tenant_id: &TenantId,
    ) -> Result<(), SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_error(&err))?;
        if !row_exists(&tx, "SELECT 1 FROM tenants WHERE tenant_id = ?1", tenant_id.as_str())? {
            return Err(SqliteStoreError::NotFound(format!("tenant {tenant_id}")));
        }
        let result = tx.execute(
            "INSERT INTO workspaces (workspace_id, tenant_id) VALUES (?1, ?2)",
            params![workspace_id.as_str(), tenant_id.as_str()],
        );
        match result {
            Ok(_) => {}
            Err(err) if is_constraint_violation(&err) => {
                return Err(SqliteStoreError::Conflict(format!(
                    "workspace {workspace_id} already exists"
                )));
            }
            Err(err) => return Err(db_error(&err)),
        }
        tx.commit().map_err(|err| db_error(&err))
    }

    /// Registers a team under an existing workspace.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when the workspace does not
    /// exist and [`SqliteStoreError::Conflict`] when the team already exists.
    pub fn add_team(
        &self,
        team_id: &TeamId,
        workspace_id: &WorkspaceId,
    ) -> Result<(), SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_error(&err))?;
        if !row_exists(
            &tx,
            "SELECT 1 FROM workspaces WHERE workspace_id = ?1",
            workspace_id.as_str(),
        )? {
            return Err(SqliteStoreError::NotFound(format!("workspace {workspace_id}")));
        }
        let result = tx.execute(
            "INSERT INTO teams (team_id, workspace_id) VALUES (?1, ?2)",
            params![team_id.as_str(), workspace_id.as_str()],
        );
        match result {
            Ok(_) => {}
            Err(err) if is_constraint_violation(&err) => {
                return Err(SqliteStoreError::Conflict(format!("team {team_id} already exists")));
            }
            Err(err) => return Err(db_error(&err)),
        }
        tx.commit().map_err(|err| db_error(&err))
    }

    /// Replaces a tenant's exec-only whitelist.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when the tenant does not exist.
    pub fn set_exec_whitelist(
        &self,
        tenant_id: &TenantId,
        users: &BTreeSet<UserId>,
    ) -> Result<(), SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_error(&err))?;
        if !row_exists(&tx, "SELECT 1 FROM tenants WHERE tenant_id = ?1", tenant_id.as_str())? {
            return Err(SqliteStoreError::NotFound(format!("tenant {tenant_id}")));
        }
        tx.execute(
            "DELETE FROM tenant_exec_whitelist WHERE tenant_id = ?1",
            params![tenant_id.as_str()],
        )
        .map_err(|err| db_error(&err))?;
        for user_id in users {
            tx.execute(
                "INSERT INTO tenant_exec_whitelist (tenant_id, user_id) VALUES (?1, ?2)",
                params![tenant_id.as_str(), user_id.as_str()],
            )
            .map_err(|err| db_error(&err))?;
        }
        tx.commit().map_err(|err| db_error(&err))
    }

    /// Loads tenant facts for visibility decisions.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on database failures.
    pub fn tenant_facts(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<TenantFacts>, SqliteStoreError> {
        let guard = self.lock()?;
        if !row_exists(&guard, "SELECT 1 FROM tenants WHERE tenant_id = ?1", tenant_id.as_str())? {
            return Ok(None);
        }
        let mut stmt = guard
            .prepare(
                "SELECT user_id FROM tenant_exec_whitelist WHERE tenant_id = ?1 ORDER BY user_id",
            )
            .map_err(|err| db_error(&err))?;
        let rows = stmt
            .query_map(params![tenant_id.as_str()], |row| row.get::<_, String>(0))
            .map_err(|err| db_error(&err))?;
        let mut facts = TenantFacts::new(tenant_id.clone());
        for row in rows {
            facts.exec_only_whitelist.insert(UserId::new(row.map_err(|err| db_error(&err))?));
        }
        Ok(Some(facts))
    }

    /// Lists role assignments, optionally restricted to one user.
    ///
    /// Rows are ordered by user, scope tier, scope identifier, and role.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Corrupt`] when a row does not decode.
    pub fn list_assignments(
        &self,
        user_id: Option<&UserId>,
    ) -> Result<Vec<RoleAssignment>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare(
                "SELECT user_id, role, scope_type, scope_id, created_at FROM role_assignments
                 WHERE (?1 IS NULL OR user_id = ?1)
                 ORDER BY user_id, scope_type, scope_id, role",
            )
            .map_err(|err| db_error(&err))?;
        let rows = stmt
            .query_map(params![user_id.map(UserId::as_str)], |row| {
                Ok(AssignmentRow {
                    user_id: row.get(0)?,
                    role: row.get(1)?,
                    scope_type: row.get(2)?,
                    scope_id: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })
            .map_err(|err| db_error(&err))?;
        let mut assignments = Vec::new();
        for row in rows {
            assignments.push(row.map_err(|err| db_error(&err))?.decode()?);
        }
        Ok(assignments)
    }

    /// Acquires the connection lock.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("connection mutex poisoned".to_string()))
    }

    /// Looks up a single optional text column by key.
    fn lookup(&self, sql: &str, key: &str) -> Result<Option<String>, SqliteStoreError> {
        let guard = self.lock()?;
        guard
            .query_row(sql, params![key], |row| row.get(0))
            .optional()
            .map_err(|err| db_error(&err))
    }
}

impl RoleStore for SqliteRoleStore {
    fn load_user(&self, user_id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        let guard = self.lock()?;
        let row: Option<(bool, Option<String>)> = guard
            .query_row(
                "SELECT is_superuser, home_tenant_id FROM users WHERE user_id = ?1",
                params![user_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|err| db_error(&err))?;
        drop(guard);
        Ok(row.map(|(is_superuser, home_tenant_id)| UserRecord {
            user_id: user_id.clone(),
            is_superuser,
            home_tenant_id: home_tenant_id.map(TenantId::new),
        }))
    }

    fn save_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        Ok(self.upsert_user(record)?)
    }

    fn assignments_for_user(&self, user_id: &UserId) -> Result<Vec<RoleAssignment>, StoreError> {
        Ok(self.list_assignments(Some(user_id))?)
    }

    fn insert_assignment(&self, assignment: &RoleAssignment) -> Result<(), StoreError> {
        let guard = self.lock()?;
        let result = guard.execute(
            "INSERT INTO role_assignments (user_id, role, scope_type, scope_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                assignment.user_id.as_str(),
                assignment.role.as_str(),
                assignment.scope.scope_type().as_str(),
                assignment.scope.scope_id().unwrap_or(PLATFORM_SCOPE_ID),
                assignment.created_at.as_unix_millis()
            ],
        );
        drop(guard);
        match result {
            Ok(_) => Ok(()),
            Err(err) if is_constraint_violation(&err) => Err(StoreError::Conflict(format!(
                "{} already holds {} at {} scope",
                assignment.user_id,
                assignment.role,
                assignment.scope.scope_type()
            ))),
            Err(err) => Err(db_error(&err).into()),
        }
    }

    fn delete_assignment(&self, key: &AssignmentKey) -> Result<bool, StoreError> {
        let guard = self.lock()?;
        let removed = guard
            .execute(
                "DELETE FROM role_assignments
                 WHERE user_id = ?1 AND role = ?2 AND scope_type = ?3 AND scope_id = ?4",
                params![
                    key.user_id.as_str(),
                    key.role.as_str(),
                    key.scope.scope_type().as_str(),
                    key.scope.scope_id().unwrap_or(PLATFORM_SCOPE_ID)
                ],
            )
            .map_err(|err| db_error(&err))?;
        drop(guard);
        Ok(removed > 0)
    }

    fn workspace_tenant(&self, workspace_id: &WorkspaceId) -> Result<Option<TenantId>, StoreError> {
        let sql = "SELECT tenant_id FROM workspaces WHERE workspace_id = ?1";
        Ok(self.lookup(sql, workspace_id.as_str())?.map(TenantId::new))
    }

    fn team_workspace(&self, team_id: &TeamId) -> Result<Option<WorkspaceId>, StoreError> {
        Ok(self
            .lookup("SELECT workspace_id FROM teams WHERE team_id = ?1", team_id.as_str())?
            .map(WorkspaceId::new))
    }

    fn tenant_exists(&self, tenant_id: &TenantId) -> Result<bool, StoreError> {
        let guard = self.lock()?;
        Ok(row_exists(&guard, "SELECT 1 FROM tenants WHERE tenant_id = ?1", tenant_id.as_str())?)
    }
}

// ============================================================================
// SECTION: Row Decoding
// ============================================================================

/// Raw role assignment row.
struct AssignmentRow {
    /// Assigned user.
    user_id: String,
    /// Role label.
    role: String,
    /// Scope tier label.
    scope_type: String,
    /// Scope identifier (empty for platform scope).
    scope_id: String,
    /// Creation time in unix milliseconds.
    created_at: i64,
}

impl AssignmentRow {
    /// Decodes the row into a typed assignment.
    fn decode(self) -> Result<RoleAssignment, SqliteStoreError> {
        let role = Role::parse(&self.role).ok_or_else(|| {
            SqliteStoreError::Corrupt(format!("unknown role label {:?}", self.role))
        })?;
        let scope_type = ScopeType::parse(&self.scope_type).ok_or_else(|| {
            SqliteStoreError::Corrupt(format!("unknown scope type {:?}", self.scope_type))
        })?;
        let scope_id = (self.scope_id != PLATFORM_SCOPE_ID).then_some(self.scope_id.as_str());
        let scope = AssignmentScope::from_parts(scope_type, scope_id).ok_or_else(|| {
            SqliteStoreError::Corrupt(format!(
                "scope id {:?} is invalid for {scope_type} scope",
                self.scope_id
            ))
        })?;
        Ok(RoleAssignment {
            user_id: UserId::new(self.user_id),
            role,
            scope,
            created_at: Timestamp::from_unix_millis(self.created_at),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when `sql` yields at least one row for `key`.
fn row_exists(connection: &Connection, sql: &str, key: &str) -> Result<bool, SqliteStoreError> {
    connection
        .query_row(sql, params![key], |_| Ok(()))
        .optional()
        .map(|row| row.is_some())
        .map_err(|err| db_error(&err))
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection =
        Connection::open_with_flags(&config.path, flags).map_err(|err| db_error(&err))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability and integrity.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_error(&err))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx: Transaction<'_> = connection.transaction().map_err(|err| db_error(&err))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| db_error(&err))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| db_error(&err))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| db_error(&err))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    user_id TEXT PRIMARY KEY,
                    is_superuser INTEGER NOT NULL DEFAULT 0,
                    home_tenant_id TEXT
                );
                CREATE TABLE IF NOT EXISTS tenants (
                    tenant_id TEXT PRIMARY KEY
                );
                CREATE TABLE IF NOT EXISTS tenant_exec_whitelist (
                    tenant_id TEXT NOT NULL REFERENCES tenants(tenant_id) ON DELETE CASCADE,
                    user_id TEXT NOT NULL,
                    PRIMARY KEY (tenant_id, user_id)
                );
                CREATE TABLE IF NOT EXISTS workspaces (
                    workspace_id TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL REFERENCES tenants(tenant_id)
                );
                CREATE TABLE IF NOT EXISTS teams (
                    team_id TEXT PRIMARY KEY,
                    workspace_id TEXT NOT NULL REFERENCES workspaces(workspace_id)
                );
                CREATE TABLE IF NOT EXISTS role_assignments (
                    user_id TEXT NOT NULL,
                    role TEXT NOT NULL,
                    scope_type TEXT NOT NULL,
                    scope_id TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    PRIMARY KEY (user_id, role, scope_type, scope_id)
                );
                CREATE INDEX IF NOT EXISTS idx_role_assignments_user
                    ON role_assignments (user_id);
                CREATE INDEX IF NOT EXISTS idx_workspaces_tenant
                    ON workspaces (tenant_id);",
            )
            .map_err(|err| db_error(&err))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| db_error(&err))?;
    Ok(())
}
