use atlas_provider::config::{ConfigError, ConfigLoader};
use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

const VARS: &[&str] = &[
    "ATLAS_PROFILE",
    "ATLAS_BASE_URL",
    "ATLAS_ACCESS_TOKEN",
    "ATLAS_LOG_LEVEL",
    "ATLAS_LOG_FORMAT",
    "ATLAS_REQUEST_TIMEOUT_MS",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    for var in VARS {
        unsafe {
            env::remove_var(var);
        }
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

fn loader(dir: &TempDir) -> ConfigLoader {
    ConfigLoader::with_base_dir(PathBuf::from(dir.path()))
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let cfg = loader(&temp_dir).load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.base_url, "https://cloud.mongodb.com");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.log_format, "json");
    assert_eq!(cfg.request_timeout_ms, 30_000);
    assert!(cfg.access_token.is_none());
    clear_env();
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "ATLAS_BASE_URL=http://localhost:3000\nATLAS_LOG_LEVEL=warn\n",
    );
    write_env_file(&temp_dir, ".env.test", "ATLAS_BASE_URL=http://localhost:5000\n");
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "ATLAS_BASE_URL=http://localhost:6000/\n",
    );
    // Profile comes from .env.local, before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        "ATLAS_PROFILE=test\nATLAS_BASE_URL=http://localhost:4000\n",
    );

    let cfg = loader(&temp_dir).load().expect("config loads with layered env files");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.base_url, "http://localhost:6000");
    assert_eq!(cfg.log_level, "warn");
    clear_env();
}

#[test]
fn os_environment_has_highest_precedence() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "ATLAS_REQUEST_TIMEOUT_MS=1000\nATLAS_LOG_FORMAT=json\n",
    );

    unsafe {
        env::set_var("ATLAS_REQUEST_TIMEOUT_MS", "2500");
        env::set_var("ATLAS_LOG_FORMAT", "Pretty");
    }

    let cfg = loader(&temp_dir).load().expect("config loads with env override");
    assert_eq!(cfg.request_timeout_ms, 2500);
    assert_eq!(cfg.log_format, "pretty");

    clear_env();
}

#[test]
fn unprefixed_keys_are_ignored() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "BASE_URL=http://ignored.example\n");

    let cfg = loader(&temp_dir).load().unwrap();
    assert_eq!(cfg.base_url, "https://cloud.mongodb.com");
    clear_env();
}

#[test]
fn production_profile_requires_access_token() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "ATLAS_PROFILE=prod\n");

    let err = loader(&temp_dir).load().expect_err("token is required");
    assert!(matches!(err, ConfigError::MissingAccessToken { ref profile } if profile == "prod"));

    write_env_file(&temp_dir, ".env.prod", "ATLAS_ACCESS_TOKEN=  secret-token  \n");
    let cfg = loader(&temp_dir).load().expect("token supplied by profile file");
    assert_eq!(cfg.access_token.as_deref(), Some("secret-token"));
    assert!(!cfg.redacted_json().unwrap().contains("secret-token"));

    clear_env();
}

#[test]
fn invalid_values_return_errors() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();

    unsafe {
        env::set_var("ATLAS_REQUEST_TIMEOUT_MS", "soon");
    }
    let err = loader(&temp_dir).load().expect_err("timeout must be numeric");
    assert!(format!("{}", err).contains("ATLAS_REQUEST_TIMEOUT_MS"));

    unsafe {
        env::remove_var("ATLAS_REQUEST_TIMEOUT_MS");
        env::set_var("ATLAS_BASE_URL", "ftp://cloud.mongodb.com");
    }
    let err = loader(&temp_dir).load().expect_err("base url must be http");
    assert!(matches!(err, ConfigError::UnsupportedBaseUrlScheme { .. }));

    clear_env();
}
