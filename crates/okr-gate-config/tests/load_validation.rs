//! Config load validation tests for okr-gate-config.
// crates/okr-gate-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use okr_gate_config::ConfigError;
use okr_gate_config::OkrGateConfig;
use okr_gate_config::RoleStoreType;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<OkrGateConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn write_config(content: &str) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content.as_bytes()).map_err(|err| err.to_string())?;
    Ok(file)
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(OkrGateConfig::load(Some(path)), "config path exceeds max length")?;
    Ok(())
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(OkrGateConfig::load(Some(path)), "config path component too long")?;
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'a'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(OkrGateConfig::load(Some(file.path())), "config file exceeds size limit")?;
    Ok(())
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(OkrGateConfig::load(Some(file.path())), "config file must be utf-8")?;
    Ok(())
}

#[test]
fn load_rejects_missing_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    assert_invalid(OkrGateConfig::load(Some(&path)), "config io error")?;
    Ok(())
}

#[test]
fn load_rejects_malformed_toml() -> TestResult {
    let file = write_config("[cache\nenabled = true\n")?;
    assert_invalid(OkrGateConfig::load(Some(file.path())), "config parse error")?;
    Ok(())
}

#[test]
fn load_rejects_unknown_store_type() -> TestResult {
    let file = write_config("[role_store]\ntype = \"postgres\"\n")?;
    assert_invalid(OkrGateConfig::load(Some(file.path())), "config parse error")?;
    Ok(())
}

#[test]
fn load_validates_after_parse() -> TestResult {
    let file = write_config("[cache]\nttl_ms = 0\n")?;
    assert_invalid(OkrGateConfig::load(Some(file.path())), "cache.ttl_ms")?;
    Ok(())
}

#[test]
fn load_accepts_sqlite_config() -> TestResult {
    let file = write_config(concat!(
        "[role_store]\ntype = \"sqlite\"\npath = \"roles.db\"\n\n",
        "[decision_log]\nlog_allows = true\n",
    ))?;
    let config = OkrGateConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.role_store.store_type != RoleStoreType::Sqlite {
        return Err("expected sqlite store type".to_string());
    }
    let sqlite = config.role_store.sqlite_config().ok_or("missing sqlite config")?;
    if sqlite.path != Path::new("roles.db") {
        return Err(format!("unexpected sqlite path {}", sqlite.path.display()));
    }
    if !config.authorizer_config().log_allows {
        return Err("expected log_allows".to_string());
    }
    Ok(())
}
