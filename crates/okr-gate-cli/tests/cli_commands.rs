// crates/okr-gate-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: End-to-end tests for directory, grant, and check commands.
// Purpose: Ensure the okr-gate binary administers and decides fail-closed.
// Dependencies: okr-gate-cli binary
// ============================================================================
//! ## Overview
//! Drives the `okr-gate` binary against a temporary `SQLite` store.
//!
//! Security posture: denies surface as a distinct exit code and revocations
//! are visible to the very next invocation.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use serde_json::Value;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn okr_gate_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_okr-gate"))
}

struct Fixture {
    dir: TempDir,
    store: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = dir.path().join("roles.db");
        Self {
            dir,
            store,
        }
    }

    fn run(&self, args: &[&str]) -> Output {
        let store = self.store.to_string_lossy().to_string();
        let mut full: Vec<&str> = args.to_vec();
        full.push("--store-path");
        full.push(&store);
        Command::new(okr_gate_bin()).args(&full).output().expect("run okr-gate")
    }

    fn run_ok(&self, args: &[&str]) -> Value {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "okr-gate {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("json output")
    }

    fn write_request(&self, name: &str, request: &Value) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, serde_json::to_vec(request).expect("encode request")).expect("write");
        path
    }

    fn check(&self, request: &Value) -> (Option<i32>, Value) {
        let path = self.write_request("request.json", request);
        let path = path.to_string_lossy().to_string();
        let output = self.run(&["check", "--request", &path]);
        let decision = serde_json::from_slice(&output.stdout).unwrap_or(Value::Null);
        (output.status.code(), decision)
    }

    fn seed_directory(&self) {
        self.run_ok(&["tenant", "add", "--tenant", "t-1"]);
        self.run_ok(&["tenant", "add", "--tenant", "t-2"]);
        self.run_ok(&["workspace", "add", "--workspace", "ws-1", "--tenant", "t-1"]);
        self.run_ok(&["team", "add", "--team", "tm-1", "--workspace", "ws-1"]);
        self.run_ok(&["user", "add", "--user", "alice", "--home-tenant", "t-1"]);
        self.run_ok(&["user", "add", "--user", "bob", "--home-tenant", "t-1"]);
        self.run_ok(&["user", "add", "--user", "root", "--superuser"]);
    }
}

fn edit_request(user: &str, published: bool) -> Value {
    serde_json::json!({
        "user_id": user,
        "action": "edit_okr",
        "resource": {
            "tenant_id": "t-1",
            "workspace_id": "ws-1",
            "team_id": "tm-1",
            "content_object": {
                "id": "obj-1",
                "owner_id": "bob",
                "tenant_id": "t-1",
                "visibility": "PUBLIC_TENANT",
                "is_published": published
            }
        }
    })
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn assert_failure(output: &Output, needle: &str) {
    assert!(!output.status.success(), "expected failure");
    let stderr = stderr_of(output);
    assert!(stderr.contains(needle), "stderr {stderr} did not contain {needle}");
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn grant_then_check_allows_and_revoke_denies() {
    let fixture = Fixture::new();
    fixture.seed_directory();
    let granted = fixture.run_ok(&[
        "grant",
        "--user",
        "alice",
        "--role",
        "TEAM_LEAD",
        "--scope-type",
        "team",
        "--scope-id",
        "tm-1",
        "--created-at",
        "1700000000000",
    ]);
    assert_eq!(granted["role"], "TEAM_LEAD");
    assert_eq!(granted["created_at"], 1_700_000_000_000_i64);

    let (code, decision) = fixture.check(&edit_request("alice", false));
    assert_eq!(code, Some(0));
    assert_eq!(decision["allow"], true);
    assert_eq!(decision["reason"], "ALLOW");

    let revoked = fixture.run_ok(&[
        "revoke",
        "--user",
        "alice",
        "--role",
        "team_lead",
        "--scope-type",
        "team",
        "--scope-id",
        "tm-1",
    ]);
    assert_eq!(revoked["removed"], true);

    let (code, decision) = fixture.check(&edit_request("alice", false));
    assert_eq!(code, Some(2));
    assert_eq!(decision["allow"], false);
    assert_eq!(decision["reason"], "ROLE_DENY");
}

#[test]
fn published_content_is_locked_for_team_leads() {
    let fixture = Fixture::new();
    fixture.seed_directory();
    fixture.run_ok(&[
        "grant",
        "--user",
        "alice",
        "--role",
        "TEAM_LEAD",
        "--scope-type",
        "team",
        "--scope-id",
        "tm-1",
    ]);
    let (code, decision) = fixture.check(&edit_request("alice", true));
    assert_eq!(code, Some(2));
    assert_eq!(decision["reason"], "PUBLISH_LOCK");
}

#[test]
fn superuser_mutation_is_read_only() {
    let fixture = Fixture::new();
    fixture.seed_directory();
    let mut request = edit_request("root", false);
    request["actor_tenant_id"] = Value::from("t-1");
    let (code, decision) = fixture.check(&request);
    assert_eq!(code, Some(2));
    assert_eq!(decision["reason"], "SUPERUSER_READ_ONLY");

    let (code, decision) = fixture.check(&serde_json::json!({
        "user_id": "root",
        "action": "view_okr",
        "resource": {"tenant_id": "t-2"}
    }));
    assert_eq!(code, Some(0));
    assert_eq!(decision["allow"], true);
}

#[test]
fn private_content_uses_stored_whitelist() {
    let fixture = Fixture::new();
    fixture.seed_directory();
    fixture.run_ok(&[
        "grant",
        "--user",
        "alice",
        "--role",
        "TENANT_VIEWER",
        "--scope-type",
        "tenant",
        "--scope-id",
        "t-1",
    ]);
    let request = serde_json::json!({
        "user_id": "alice",
        "action": "view_okr",
        "resource": {
            "tenant_id": "t-1",
            "content_object": {
                "id": "obj-2",
                "owner_id": "bob",
                "tenant_id": "t-1",
                "visibility": "PRIVATE"
            }
        }
    });
    let (code, decision) = fixture.check(&request);
    assert_eq!(code, Some(2));
    assert_eq!(decision["reason"], "PRIVATE_VISIBILITY");

    let whitelist =
        fixture.run_ok(&["tenant", "whitelist", "--tenant", "t-1", "--user", "alice"]);
    assert_eq!(whitelist["exec_only_whitelist"], serde_json::json!(["alice"]));
    let (code, decision) = fixture.check(&request);
    assert_eq!(code, Some(0));
    assert_eq!(decision["allow"], true);
}

#[test]
fn inconsistent_request_fails_closed() {
    let fixture = Fixture::new();
    fixture.seed_directory();
    let path = fixture.write_request(
        "bad.json",
        &serde_json::json!({
            "user_id": "alice",
            "action": "view_okr",
            "resource": {
                "tenant_id": "t-2",
                "content_object": {
                    "id": "obj-1",
                    "owner_id": "bob",
                    "tenant_id": "t-1",
                    "visibility": "PUBLIC_TENANT"
                }
            }
        }),
    );
    let output = fixture.run(&["check", "--request", path.to_string_lossy().as_ref()]);
    assert_eq!(output.status.code(), Some(1));
    assert_failure(&output, "invalid resource");
}

#[test]
fn check_rejects_unknown_request_fields() {
    let fixture = Fixture::new();
    fixture.seed_directory();
    let mut request = edit_request("alice", false);
    request["skip_checks"] = Value::from(true);
    let path = fixture.write_request("extra.json", &request);
    let output = fixture.run(&["check", "--request", path.to_string_lossy().as_ref()]);
    assert_failure(&output, "invalid decision request");
}

#[test]
fn grant_validation_errors_surface() {
    let fixture = Fixture::new();
    fixture.seed_directory();
    let tier_mismatch = fixture.run(&[
        "grant",
        "--user",
        "alice",
        "--role",
        "TENANT_ADMIN",
        "--scope-type",
        "team",
        "--scope-id",
        "tm-1",
    ]);
    assert_failure(&tier_mismatch, "invalid role assignment");

    let unknown_scope = fixture.run(&[
        "grant",
        "--user",
        "alice",
        "--role",
        "TEAM_LEAD",
        "--scope-type",
        "team",
        "--scope-id",
        "tm-404",
    ]);
    assert_failure(&unknown_scope, "not found");

    let superuser = fixture.run(&[
        "grant",
        "--user",
        "root",
        "--role",
        "TENANT_VIEWER",
        "--scope-type",
        "tenant",
        "--scope-id",
        "t-1",
    ]);
    assert_failure(&superuser, "superuser");

    let unknown_role = fixture.run(&[
        "grant",
        "--user",
        "alice",
        "--role",
        "OWNER",
        "--scope-type",
        "tenant",
        "--scope-id",
        "t-1",
    ]);
    assert_failure(&unknown_role, "unknown role");
}

#[test]
fn duplicate_grant_conflicts() {
    let fixture = Fixture::new();
    fixture.seed_directory();
    let args = [
        "grant",
        "--user",
        "bob",
        "--role",
        "WORKSPACE_MEMBER",
        "--scope-type",
        "workspace",
        "--scope-id",
        "ws-1",
    ];
    fixture.run_ok(&args);
    let output = fixture.run(&args);
    assert_failure(&output, "conflict");
}

#[test]
fn user_add_refuses_superuser_promotion_while_roles_are_held() {
    let fixture = Fixture::new();
    fixture.seed_directory();
    let grant = [
        "grant",
        "--user",
        "alice",
        "--role",
        "TEAM_LEAD",
        "--scope-type",
        "team",
        "--scope-id",
        "tm-1",
    ];
    fixture.run_ok(&grant);

    let promoted = fixture.run(&["user", "add", "--user", "alice", "--superuser"]);
    assert_failure(&promoted, "revoke them before promotion");
    let (code, decision) = fixture.check(&edit_request("alice", false));
    assert_eq!(code, Some(0));
    assert_eq!(decision["reason"], "ALLOW");

    let homed =
        fixture.run(&["user", "add", "--user", "carol", "--superuser", "--home-tenant", "t-1"]);
    assert_failure(&homed, "home tenant");
    let unknown_home = fixture.run(&["user", "add", "--user", "carol", "--home-tenant", "t-404"]);
    assert_failure(&unknown_home, "not found");

    let mut revoke = grant;
    revoke[0] = "revoke";
    fixture.run_ok(&revoke);
    let saved = fixture.run_ok(&["user", "add", "--user", "alice", "--superuser"]);
    assert_eq!(saved["is_superuser"], true);
    let (code, decision) = fixture.check(&edit_request("alice", false));
    assert_eq!(code, Some(2));
    assert_eq!(decision["reason"], "SUPERUSER_READ_ONLY");
}

#[test]
fn permissions_and_assignments_report_store_state() {
    let fixture = Fixture::new();
    fixture.seed_directory();
    fixture.run_ok(&[
        "grant",
        "--user",
        "bob",
        "--role",
        "WORKSPACE_MEMBER",
        "--scope-type",
        "workspace",
        "--scope-id",
        "ws-1",
    ]);

    let permissions = fixture.run_ok(&["permissions", "--user", "bob", "--team", "tm-1"]);
    assert_eq!(permissions["chain"]["tenant_id"], "t-1");
    assert_eq!(permissions["chain"]["workspace_id"], "ws-1");
    assert_eq!(
        permissions["actions"],
        serde_json::json!(["view_okr", "create_okr", "edit_okr", "request_checkin"])
    );

    let tenant_level = fixture.run_ok(&["permissions", "--user", "bob", "--tenant", "t-1"]);
    assert_eq!(tenant_level["actions"], serde_json::json!([]));

    let listed = fixture.run_ok(&["assignments", "--user", "bob"]);
    let assignments = listed["assignments"].as_array().expect("assignments array");
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0]["scope"]["scope_type"], "WORKSPACE");
    assert_eq!(assignments[0]["scope"]["scope_id"], "ws-1");

    let none = fixture.run_ok(&["assignments", "--user", "alice"]);
    assert_eq!(none["assignments"], serde_json::json!([]));
}

#[test]
fn directory_commands_reject_orphans_and_blanks() {
    let fixture = Fixture::new();
    fixture.seed_directory();
    let orphan = fixture.run(&["workspace", "add", "--workspace", "ws-9", "--tenant", "t-404"]);
    assert_failure(&orphan, "failed to add workspace");
    let orphan_team = fixture.run(&["team", "add", "--team", "tm-9", "--workspace", "ws-404"]);
    assert_failure(&orphan_team, "failed to add team");
    let blank = fixture.run(&["tenant", "add", "--tenant", "  "]);
    assert_failure(&blank, "--tenant must be non-empty");

    let users = fixture.run_ok(&["user", "list"]);
    let ids: Vec<&str> = users["users"]
        .as_array()
        .expect("users array")
        .iter()
        .filter_map(|user| user["user_id"].as_str())
        .collect();
    assert_eq!(ids, vec!["alice", "bob", "root"]);
}

#[test]
fn config_validate_and_example() {
    let dir = tempfile::tempdir().expect("temp dir");
    let example = Command::new(okr_gate_bin())
        .args(["config", "example"])
        .output()
        .expect("run okr-gate config example");
    assert!(example.status.success());
    let config_path = dir.path().join("okr-gate.toml");
    fs::write(&config_path, &example.stdout).expect("write config");

    let output = Command::new(okr_gate_bin())
        .args(["config", "validate", "--config", config_path.to_string_lossy().as_ref()])
        .output()
        .expect("run okr-gate config validate");
    assert!(output.status.success(), "{}", stderr_of(&output));
    let report: Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(report["status"], "ok");
    assert_eq!(report["role_store"], "sqlite");

    let invalid = dir.path().join("invalid.toml");
    fs::write(&invalid, "[cache]\nttl_ms = 0\n").expect("write config");
    let output = Command::new(okr_gate_bin())
        .args(["config", "validate", "--config", invalid.to_string_lossy().as_ref()])
        .output()
        .expect("run okr-gate config validate");
    assert_failure(&output, "cache.ttl_ms");
}

#[test]
fn config_driven_store_writes_decision_log() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = dir.path().join("configured.db");
    let log = dir.path().join("decisions.jsonl");
    let config_path = dir.path().join("okr-gate.toml");
    let config = format!(
        "[role_store]\ntype = \"sqlite\"\npath = {store:?}\n\n[decision_log]\npath = {log:?}\n",
        store = store.to_string_lossy(),
        log = log.to_string_lossy(),
    );
    fs::write(&config_path, config).expect("write config");
    let config_arg = config_path.to_string_lossy().to_string();

    let run = |args: &[&str]| -> Output {
        let mut full: Vec<&str> = args.to_vec();
        full.push("--config");
        full.push(&config_arg);
        Command::new(okr_gate_bin()).args(&full).output().expect("run okr-gate")
    };
    assert!(run(&["tenant", "add", "--tenant", "t-1"]).status.success());
    assert!(run(&["user", "add", "--user", "carol", "--home-tenant", "t-1"]).status.success());

    let request = dir.path().join("request.json");
    fs::write(
        &request,
        serde_json::to_vec(&serde_json::json!({
            "user_id": "carol",
            "action": "create_okr",
            "resource": {"tenant_id": "t-1"}
        }))
        .expect("encode request"),
    )
    .expect("write request");
    let output = run(&["check", "--request", request.to_string_lossy().as_ref()]);
    assert_eq!(output.status.code(), Some(2));

    let lines = fs::read_to_string(&log).expect("read decision log");
    let event: Value =
        serde_json::from_str(lines.lines().next().expect("one event")).expect("json event");
    assert_eq!(event["event"], "okr_decision");
    assert_eq!(event["user_id"], "carol");
    assert_eq!(event["reason"], "ROLE_DENY");
    assert!(Path::new(&store).exists());
}

#[test]
fn memory_store_config_is_rejected_for_admin_commands() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config_path = dir.path().join("okr-gate.toml");
    fs::write(&config_path, "[role_store]\ntype = \"memory\"\n").expect("write config");
    let output = Command::new(okr_gate_bin())
        .args(["assignments", "--config", config_path.to_string_lossy().as_ref()])
        .output()
        .expect("run okr-gate assignments");
    assert_failure(&output, "role_store.type");
}
