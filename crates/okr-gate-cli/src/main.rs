// crates/okr-gate-cli/src/main.rs
// ============================================================================
// Module: OKR Gate CLI Entry Point
// Description: Command dispatcher for OKR Gate decisions and role administration.
// Purpose: Provide a safe operator CLI over the SQLite scope & role store.
// Dependencies: clap, okr-gate-config, okr-gate-core, okr-gate-store-sqlite, serde.
// ============================================================================

//! ## Overview
//! The OKR Gate CLI evaluates authorization requests and administers the
//! durable scope & role store: users, tenants, workspaces, teams, and role
//! assignments. Every command emits JSON on stdout; failures go to stderr
//! with a non-zero exit code. Security posture: request files and flags are
//! untrusted and must be validated; reads are size-bounded and fail closed.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use okr_gate_config::OkrGateConfig;
use okr_gate_config::RoleStoreType;
use okr_gate_config::config_toml_example;
use okr_gate_core::Action;
use okr_gate_core::AssignmentKey;
use okr_gate_core::AssignmentScope;
use okr_gate_core::Authorizer;
use okr_gate_core::AuthorizerConfig;
use okr_gate_core::ContextCache;
use okr_gate_core::Decision;
use okr_gate_core::DecisionLogSink;
use okr_gate_core::NoopContextCache;
use okr_gate_core::NoopDecisionLog;
use okr_gate_core::ResourceContext;
use okr_gate_core::ResourceScope;
use okr_gate_core::Role;
use okr_gate_core::RoleAssignment;
use okr_gate_core::ScopeChain;
use okr_gate_core::ScopeType;
use okr_gate_core::TeamId;
use okr_gate_core::TenantId;
use okr_gate_core::Timestamp;
use okr_gate_core::UserId;
use okr_gate_core::UserRecord;
use okr_gate_core::WorkspaceId;
use okr_gate_store_sqlite::SqliteRoleStore;
use okr_gate_store_sqlite::SqliteStoreConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a decision request file.
const MAX_REQUEST_BYTES: usize = 1024 * 1024;
/// Exit code returned when a decision is a deny.
const DENY_EXIT_CODE: u8 = 2;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "okr-gate", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a decision request file.
    Check(CheckCommand),
    /// Grant a scoped role to a user.
    Grant(GrantCommand),
    /// Revoke a scoped role from a user.
    Revoke(RevokeCommand),
    /// Show the actions a user's roles grant along a scope chain.
    Permissions(PermissionsCommand),
    /// List role assignments.
    Assignments(AssignmentsCommand),
    /// User directory administration.
    User {
        /// Selected user subcommand.
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Tenant directory administration.
    Tenant {
        /// Selected tenant subcommand.
        #[command(subcommand)]
        command: TenantCommand,
    },
    /// Workspace directory administration.
    Workspace {
        /// Selected workspace subcommand.
        #[command(subcommand)]
        command: WorkspaceCommand,
    },
    /// Team directory administration.
    Team {
        /// Selected team subcommand.
        #[command(subcommand)]
        command: TeamCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// User subcommands.
#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create or update a user record.
    Add(UserAddCommand),
    /// List user records.
    List(StoreOnlyCommand),
}

/// Tenant subcommands.
#[derive(Subcommand, Debug)]
enum TenantCommand {
    /// Register a tenant.
    Add(TenantAddCommand),
    /// Replace a tenant's exec-only whitelist.
    Whitelist(TenantWhitelistCommand),
}

/// Workspace subcommands.
#[derive(Subcommand, Debug)]
enum WorkspaceCommand {
    /// Register a workspace under a tenant.
    Add(WorkspaceAddCommand),
}

/// Team subcommands.
#[derive(Subcommand, Debug)]
enum TeamCommand {
    /// Register a team under a workspace.
    Add(TeamAddCommand),
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a config file.
    Validate(ConfigValidateCommand),
    /// Print an annotated example config.
    Example,
}

/// Store location inputs for `SQLite`-backed commands.
#[derive(Args, Debug, Clone, Default)]
struct StoreLocationArgs {
    /// Optional config file path (defaults to okr-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Optional direct `SQLite` store path (overrides config).
    #[arg(long = "store-path", value_name = "PATH")]
    store_path: Option<PathBuf>,
}

/// Scope tiers accepted on the command line.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum ScopeTypeArg {
    /// Platform scope.
    Platform,
    /// Tenant scope.
    Tenant,
    /// Workspace scope.
    Workspace,
    /// Team scope.
    Team,
}

impl From<ScopeTypeArg> for ScopeType {
    fn from(value: ScopeTypeArg) -> Self {
        match value {
            ScopeTypeArg::Platform => Self::Platform,
            ScopeTypeArg::Tenant => Self::Tenant,
            ScopeTypeArg::Workspace => Self::Workspace,
            ScopeTypeArg::Team => Self::Team,
        }
    }
}

/// Role assignment selector shared by grant and revoke.
#[derive(Args, Debug, Clone)]
struct AssignmentArgs {
    /// User identifier.
    #[arg(long = "user", value_name = "USER_ID")]
    user_id: String,
    /// Role label (for example `TEAM_LEAD`).
    #[arg(long, value_name = "ROLE", value_parser = parse_role)]
    role: Role,
    /// Scope tier the role applies at.
    #[arg(long = "scope-type", value_enum, value_name = "TIER")]
    scope_type: ScopeTypeArg,
    /// Scope identifier (omitted for platform scope).
    #[arg(long = "scope-id", value_name = "ID")]
    scope_id: Option<String>,
}

/// Arguments for `check`.
#[derive(Args, Debug)]
struct CheckCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreLocationArgs,
    /// Path to the decision request JSON file.
    #[arg(long, value_name = "PATH")]
    request: PathBuf,
}

/// Arguments for `grant`.
#[derive(Args, Debug)]
struct GrantCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreLocationArgs,
    /// Assignment to create.
    #[command(flatten)]
    assignment: AssignmentArgs,
    /// Optional creation timestamp override (unix millis).
    #[arg(long = "created-at", value_name = "UNIX_MS")]
    created_at: Option<i64>,
}

/// Arguments for `revoke`.
#[derive(Args, Debug)]
struct RevokeCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreLocationArgs,
    /// Assignment to remove.
    #[command(flatten)]
    assignment: AssignmentArgs,
}

/// Arguments for `permissions`.
#[derive(Args, Debug)]
struct PermissionsCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreLocationArgs,
    /// User identifier.
    #[arg(long = "user", value_name = "USER_ID")]
    user_id: String,
    /// Tenant identifier (required when no workspace or team is named).
    #[arg(long = "tenant", value_name = "TENANT_ID")]
    tenant_id: Option<String>,
    /// Workspace identifier.
    #[arg(long = "workspace", value_name = "WORKSPACE_ID")]
    workspace_id: Option<String>,
    /// Team identifier.
    #[arg(long = "team", value_name = "TEAM_ID")]
    team_id: Option<String>,
}

/// Arguments for `assignments`.
#[derive(Args, Debug)]
struct AssignmentsCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreLocationArgs,
    /// Optional user filter.
    #[arg(long = "user", value_name = "USER_ID")]
    user_id: Option<String>,
}

/// Arguments for commands that only need the store.
#[derive(Args, Debug)]
struct StoreOnlyCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreLocationArgs,
}

/// Arguments for `user add`.
#[derive(Args, Debug)]
struct UserAddCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreLocationArgs,
    /// User identifier.
    #[arg(long = "user", value_name = "USER_ID")]
    user_id: String,
    /// Mark the user as a platform superuser.
    #[arg(long, action = ArgAction::SetTrue)]
    superuser: bool,
    /// Tenant the user belongs to.
    #[arg(long = "home-tenant", value_name = "TENANT_ID")]
    home_tenant_id: Option<String>,
}

/// Arguments for `tenant add`.
#[derive(Args, Debug)]
struct TenantAddCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreLocationArgs,
    /// Tenant identifier.
    #[arg(long = "tenant", value_name = "TENANT_ID")]
    tenant_id: String,
}

/// Arguments for `tenant whitelist`.
#[derive(Args, Debug)]
struct TenantWhitelistCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreLocationArgs,
    /// Tenant identifier.
    #[arg(long = "tenant", value_name = "TENANT_ID")]
    tenant_id: String,
    /// Whitelisted user (repeatable; omit to clear the whitelist).
    #[arg(long = "user", value_name = "USER_ID", action = ArgAction::Append)]
    users: Vec<String>,
}

/// Arguments for `workspace add`.
#[derive(Args, Debug)]
struct WorkspaceAddCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreLocationArgs,
    /// Workspace identifier.
    #[arg(long = "workspace", value_name = "WORKSPACE_ID")]
    workspace_id: String,
    /// Owning tenant identifier.
    #[arg(long = "tenant", value_name = "TENANT_ID")]
    tenant_id: String,
}

/// Arguments for `team add`.
#[derive(Args, Debug)]
struct TeamAddCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreLocationArgs,
    /// Team identifier.
    #[arg(long = "team", value_name = "TEAM_ID")]
    team_id: String,
    /// Parent workspace identifier.
    #[arg(long = "workspace", value_name = "WORKSPACE_ID")]
    workspace_id: String,
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to okr-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Request & Output Types
// ============================================================================

/// Decision request read by `check`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CheckRequest {
    /// Acting user.
    user_id: UserId,
    /// Requested action.
    action: Action,
    /// Tenant the actor is operating within; the home tenant when omitted.
    #[serde(default)]
    actor_tenant_id: Option<TenantId>,
    /// Resource facts.
    #[serde(default)]
    resource: ResourceContext,
}

/// Output for `revoke`.
#[derive(Serialize)]
struct RevokeOutput {
    /// Whether an assignment was removed.
    removed: bool,
}

/// Output for `permissions`.
#[derive(Serialize)]
struct PermissionsOutput {
    /// Acting user.
    user_id: UserId,
    /// Resolved scope chain.
    chain: ScopeChain,
    /// Actions granted along the chain.
    actions: BTreeSet<Action>,
}

/// Output for `assignments`.
#[derive(Serialize)]
struct AssignmentsOutput {
    /// Assignments in store order.
    assignments: Vec<RoleAssignment>,
}

/// Output for `user list`.
#[derive(Serialize)]
struct UsersOutput {
    /// User records in identifier order.
    users: Vec<UserRecord>,
}

/// Output for directory additions.
#[derive(Serialize)]
struct DirectoryOutput {
    /// Entity kind (`tenant`, `workspace`, `team`).
    kind: &'static str,
    /// Entity identifier.
    id: String,
    /// Parent entity identifier, when the entity has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
}

/// Output for `tenant whitelist`.
#[derive(Serialize)]
struct WhitelistOutput {
    /// Tenant identifier.
    tenant_id: TenantId,
    /// Whitelisted users.
    exec_only_whitelist: BTreeSet<UserId>,
}

/// Output for `config validate`.
#[derive(Serialize)]
struct ConfigValidateOutput {
    /// Validation status.
    status: &'static str,
    /// Configured role store backend.
    role_store: &'static str,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Errors raised while reading bounded input files.
#[derive(Debug, Error)]
enum ReadLimitError {
    /// Underlying I/O failure.
    #[error("{0}")]
    Io(std::io::Error),
    /// File exceeds the allowed size.
    #[error("file size {size} exceeds limit {limit}")]
    TooLarge {
        /// Observed size in bytes.
        size: u64,
        /// Allowed size in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("okr-gate {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Check(command) => command_check(&command),
        Commands::Grant(command) => command_grant(&command),
        Commands::Revoke(command) => command_revoke(&command),
        Commands::Permissions(command) => command_permissions(&command),
        Commands::Assignments(command) => command_assignments(&command),
        Commands::User {
            command,
        } => command_user(command),
        Commands::Tenant {
            command,
        } => command_tenant(command),
        Commands::Workspace {
            command,
        } => command_workspace(command),
        Commands::Team {
            command,
        } => command_team(command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    let help = command.render_help().to_string();
    write_stdout_line(help.trim_end()).map_err(|err| CliError::new(output_error("stdout", &err)))
}

// ============================================================================
// SECTION: Decision Commands
// ============================================================================

/// Executes the `check` command.
///
/// Tenant facts missing from the request are loaded from the store.
fn command_check(command: &CheckCommand) -> CliResult<ExitCode> {
    let bytes = read_bytes_with_limit(&command.request, MAX_REQUEST_BYTES).map_err(|err| {
        CliError::new(format!("failed to read request {}: {err}", command.request.display()))
    })?;
    let request: CheckRequest = serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("invalid decision request: {err}")))?;

    let authorizer = open_authorizer(&command.location)?;
    let resource = with_stored_tenant_facts(authorizer.store(), request.resource)?;
    let decision = match request.actor_tenant_id.as_ref() {
        Some(actor_tenant) => {
            authorizer.can(&request.user_id, request.action, &resource, Some(actor_tenant))
        }
        None => authorizer.can_as_member(&request.user_id, request.action, &resource),
    }
    .map_err(|err| CliError::new(format!("decision failed: {err}")))?;

    write_json(&decision)?;
    Ok(ExitCode::from(decision_exit_status(&decision)))
}

/// Fills tenant facts from the store when the request omits them.
fn with_stored_tenant_facts(
    store: &SqliteRoleStore,
    mut resource: ResourceContext,
) -> CliResult<ResourceContext> {
    if resource.tenant.is_none()
        && let Some(tenant_id) = resource.tenant_id.as_ref()
    {
        resource.tenant = store
            .tenant_facts(tenant_id)
            .map_err(|err| CliError::new(format!("failed to load tenant facts: {err}")))?;
    }
    Ok(resource)
}

/// Maps a decision to the process exit status.
const fn decision_exit_status(decision: &Decision) -> u8 {
    if decision.is_deny() { DENY_EXIT_CODE } else { 0 }
}

/// Executes the `permissions` command.
fn command_permissions(command: &PermissionsCommand) -> CliResult<ExitCode> {
    let authorizer = open_authorizer(&command.location)?;
    let user_id = UserId::new(command.user_id.as_str());
    let tenant_id = command.tenant_id.as_deref().map(TenantId::new);
    let scope = ResourceScope {
        workspace_id: command.workspace_id.as_deref().map(WorkspaceId::new),
        team_id: command.team_id.as_deref().map(TeamId::new),
    };
    let chain = authorizer
        .resolve_scope_chain(tenant_id.as_ref(), &scope)
        .map_err(|err| CliError::new(format!("scope resolution failed: {err}")))?;
    let actions = authorizer
        .effective_actions(&user_id, &chain)
        .map_err(|err| CliError::new(format!("permission lookup failed: {err}")))?;
    write_json(&PermissionsOutput {
        user_id,
        chain,
        actions,
    })?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Role Assignment Commands
// ============================================================================

/// Executes the `grant` command.
fn command_grant(command: &GrantCommand) -> CliResult<ExitCode> {
    let key = assignment_key(&command.assignment)?;
    let created_at = match command.created_at {
        Some(value) => Timestamp::from_unix_millis(value),
        None => now_timestamp()?,
    };
    let authorizer = open_authorizer(&command.location)?;
    let assignment = authorizer
        .grant(&key.user_id, key.role, key.scope, created_at)
        .map_err(|err| CliError::new(format!("grant failed: {err}")))?;
    write_json(&assignment)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `revoke` command.
fn command_revoke(command: &RevokeCommand) -> CliResult<ExitCode> {
    let key = assignment_key(&command.assignment)?;
    let authorizer = open_authorizer(&command.location)?;
    let removed = authorizer
        .revoke(&key)
        .map_err(|err| CliError::new(format!("revoke failed: {err}")))?;
    write_json(&RevokeOutput {
        removed,
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `assignments` command.
fn command_assignments(command: &AssignmentsCommand) -> CliResult<ExitCode> {
    let store = open_store(&command.location)?;
    let user_id = command.user_id.as_deref().map(UserId::new);
    let assignments = store
        .list_assignments(user_id.as_ref())
        .map_err(|err| CliError::new(format!("failed to list assignments: {err}")))?;
    write_json(&AssignmentsOutput {
        assignments,
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Builds an assignment key from command-line selectors.
fn assignment_key(args: &AssignmentArgs) -> CliResult<AssignmentKey> {
    let scope_type = ScopeType::from(args.scope_type);
    let scope_id = args.scope_id.as_deref().map(str::trim);
    if scope_id.is_some_and(str::is_empty) {
        return Err(CliError::new("--scope-id must be non-empty".to_string()));
    }
    let scope = AssignmentScope::from_parts(scope_type, scope_id).ok_or_else(|| {
        if scope_type == ScopeType::Platform {
            CliError::new("platform scope takes no --scope-id".to_string())
        } else {
            CliError::new(format!("{scope_type} scope requires --scope-id"))
        }
    })?;
    if args.user_id.trim().is_empty() {
        return Err(CliError::new("--user must be non-empty".to_string()));
    }
    Ok(AssignmentKey {
        user_id: UserId::new(args.user_id.trim()),
        role: args.role,
        scope,
    })
}

/// Parses a role label for clap.
fn parse_role(label: &str) -> Result<Role, String> {
    Role::parse(label).ok_or_else(|| {
        let known: Vec<&str> = Role::ALL.iter().map(|role| role.as_str()).collect();
        format!("unknown role {label}; expected one of {}", known.join(", "))
    })
}

// ============================================================================
// SECTION: Directory Commands
// ============================================================================

/// Dispatches user subcommands.
fn command_user(command: UserCommand) -> CliResult<ExitCode> {
    match command {
        UserCommand::Add(command) => command_user_add(&command),
        UserCommand::List(command) => command_user_list(&command),
    }
}

/// Executes the `user add` command.
fn command_user_add(command: &UserAddCommand) -> CliResult<ExitCode> {
    let user_id = non_empty_id("--user", &command.user_id)?;
    let home_tenant_id = command
        .home_tenant_id
        .as_deref()
        .map(|value| non_empty_id("--home-tenant", value))
        .transpose()?;
    let record = UserRecord {
        user_id: UserId::new(user_id),
        is_superuser: command.superuser,
        home_tenant_id: home_tenant_id.map(TenantId::new),
    };
    let authorizer = open_authorizer(&command.location)?;
    authorizer
        .save_user(&record)
        .map_err(|err| CliError::new(format!("failed to save user: {err}")))?;
    write_json(&record)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `user list` command.
fn command_user_list(command: &StoreOnlyCommand) -> CliResult<ExitCode> {
    let store = open_store(&command.location)?;
    let users =
        store.list_users().map_err(|err| CliError::new(format!("failed to list users: {err}")))?;
    write_json(&UsersOutput {
        users,
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Dispatches tenant subcommands.
fn command_tenant(command: TenantCommand) -> CliResult<ExitCode> {
    match command {
        TenantCommand::Add(command) => command_tenant_add(&command),
        TenantCommand::Whitelist(command) => command_tenant_whitelist(&command),
    }
}

/// Executes the `tenant add` command.
fn command_tenant_add(command: &TenantAddCommand) -> CliResult<ExitCode> {
    let tenant_id = TenantId::new(non_empty_id("--tenant", &command.tenant_id)?);
    let store = open_store(&command.location)?;
    store
        .add_tenant(&tenant_id)
        .map_err(|err| CliError::new(format!("failed to add tenant: {err}")))?;
    write_json(&DirectoryOutput {
        kind: "tenant",
        id: tenant_id.to_string(),
        parent_id: None,
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `tenant whitelist` command.
fn command_tenant_whitelist(command: &TenantWhitelistCommand) -> CliResult<ExitCode> {
    let tenant_id = TenantId::new(non_empty_id("--tenant", &command.tenant_id)?);
    let mut users = BTreeSet::new();
    for user in &command.users {
        users.insert(UserId::new(non_empty_id("--user", user)?));
    }
    let store = open_store(&command.location)?;
    store
        .set_exec_whitelist(&tenant_id, &users)
        .map_err(|err| CliError::new(format!("failed to update whitelist: {err}")))?;
    write_json(&WhitelistOutput {
        tenant_id,
        exec_only_whitelist: users,
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Dispatches workspace subcommands.
fn command_workspace(command: WorkspaceCommand) -> CliResult<ExitCode> {
    match command {
        WorkspaceCommand::Add(command) => {
            let workspace_id =
                WorkspaceId::new(non_empty_id("--workspace", &command.workspace_id)?);
            let tenant_id = TenantId::new(non_empty_id("--tenant", &command.tenant_id)?);
            let store = open_store(&command.location)?;
            store
                .add_workspace(&workspace_id, &tenant_id)
                .map_err(|err| CliError::new(format!("failed to add workspace: {err}")))?;
            write_json(&DirectoryOutput {
                kind: "workspace",
                id: workspace_id.to_string(),
                parent_id: Some(tenant_id.to_string()),
            })?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Dispatches team subcommands.
fn command_team(command: TeamCommand) -> CliResult<ExitCode> {
    match command {
        TeamCommand::Add(command) => {
            let team_id = TeamId::new(non_empty_id("--team", &command.team_id)?);
            let workspace_id =
                WorkspaceId::new(non_empty_id("--workspace", &command.workspace_id)?);
            let store = open_store(&command.location)?;
            store
                .add_team(&team_id, &workspace_id)
                .map_err(|err| CliError::new(format!("failed to add team: {err}")))?;
            write_json(&DirectoryOutput {
                kind: "team",
                id: team_id.to_string(),
                parent_id: Some(workspace_id.to_string()),
            })?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Returns a trimmed identifier, rejecting blanks.
fn non_empty_id<'a>(flag: &str, value: &'a str) -> CliResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CliError::new(format!("{flag} must be non-empty")));
    }
    Ok(trimmed)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
        ConfigCommand::Example => {
            write_stdout_line(config_toml_example().trim_end())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = OkrGateConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let role_store = match config.role_store.store_type {
        RoleStoreType::Memory => "memory",
        RoleStoreType::Sqlite => "sqlite",
    };
    write_json(&ConfigValidateOutput {
        status: "ok",
        role_store,
    })?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Store Setup
// ============================================================================

/// Resolved store and logging settings for a command.
struct StoreSetup {
    /// `SQLite` store settings.
    sqlite: SqliteStoreConfig,
    /// Context cache.
    cache: Arc<dyn ContextCache>,
    /// Decision log sink.
    log: Arc<dyn DecisionLogSink>,
    /// Authorizer behavior settings.
    authorizer: AuthorizerConfig,
}

/// Resolves store settings from `--store-path` and the config file.
///
/// A bare `--store-path` skips config loading and runs with defaults.
fn resolve_store_setup(location: &StoreLocationArgs) -> CliResult<StoreSetup> {
    if let Some(store_path) = &location.store_path
        && location.config.is_none()
    {
        return Ok(StoreSetup {
            sqlite: SqliteStoreConfig::new(store_path.clone()),
            cache: Arc::new(NoopContextCache),
            log: Arc::new(NoopDecisionLog),
            authorizer: AuthorizerConfig::default(),
        });
    }

    let config = OkrGateConfig::load(location.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    if config.role_store.store_type != RoleStoreType::Sqlite {
        return Err(CliError::new(
            "the CLI requires role_store.type = \"sqlite\" (or --store-path)".to_string(),
        ));
    }
    let mut sqlite = config
        .role_store
        .sqlite_config()
        .ok_or_else(|| CliError::new("sqlite role_store requires path".to_string()))?;
    if let Some(store_path) = &location.store_path {
        sqlite.path.clone_from(store_path);
    }
    let log = config
        .decision_log
        .build_sink()
        .map_err(|err| CliError::new(format!("failed to open decision log: {err}")))?;
    Ok(StoreSetup {
        sqlite,
        cache: config.cache.build(),
        log,
        authorizer: config.authorizer_config(),
    })
}

/// Opens the `SQLite` store for administration.
fn open_store(location: &StoreLocationArgs) -> CliResult<SqliteRoleStore> {
    let setup = resolve_store_setup(location)?;
    SqliteRoleStore::new(setup.sqlite)
        .map_err(|err| CliError::new(format!("failed to open role store: {err}")))
}

/// Opens an authorizer over the `SQLite` store.
fn open_authorizer(location: &StoreLocationArgs) -> CliResult<Authorizer<SqliteRoleStore>> {
    let setup = resolve_store_setup(location)?;
    let store = SqliteRoleStore::new(setup.sqlite)
        .map_err(|err| CliError::new(format!("failed to open role store: {err}")))?;
    Ok(Authorizer::new(store, setup.cache).with_log(setup.log).with_config(setup.authorizer))
}

// ============================================================================
// SECTION: I/O Helpers
// ============================================================================

/// Reads a file, failing when it exceeds `max_bytes`.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let read_limit = limit.saturating_add(1);
    let mut limited = file.take(read_limit);
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Returns the current wall-clock time as a timestamp.
fn now_timestamp() -> CliResult<Timestamp> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| CliError::new(format!("system clock error: {err}")))?;
    let millis = i64::try_from(elapsed.as_millis())
        .map_err(|_| CliError::new("system clock out of range".to_string()))?;
    Ok(Timestamp::from_unix_millis(millis))
}

/// Writes a value to stdout as a single JSON line.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream failure.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
