use lunchvote::config::{ConfigError, ConfigLoader};
use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

const VARS: &[&str] = &[
    "LUNCHVOTE_PROFILE",
    "LUNCHVOTE_API_BIND_ADDR",
    "LUNCHVOTE_LOG_LEVEL",
    "LUNCHVOTE_JWT_SECRET",
    "LUNCHVOTE_MAX_CONSECUTIVE_WINS",
    "LUNCHVOTE_PAGE_SIZE",
    "LUNCHVOTE_RUN_MIGRATIONS",
];

const STRONG_SECRET: &str = "a-sufficiently-long-jwt-signing-secret";

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

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8080");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.max_consecutive_wins, 2);
    assert_eq!(cfg.page_size, 10);
    assert!(cfg.run_migrations);
    assert!(cfg.jwt_secret.is_none());
    cfg.bind_addr().expect("default bind addr parses");
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
        "LUNCHVOTE_API_BIND_ADDR=127.0.0.1:3000\nLUNCHVOTE_PAGE_SIZE=5\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test",
        "LUNCHVOTE_API_BIND_ADDR=192.168.0.10:5000\nLUNCHVOTE_MAX_CONSECUTIVE_WINS=3\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "LUNCHVOTE_API_BIND_ADDR=10.0.0.5:6000\n",
    );

    // Select profile via .env.local before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        "LUNCHVOTE_PROFILE=test\nLUNCHVOTE_API_BIND_ADDR=127.0.0.1:4000\n",
    );

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with layered env files");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    assert_eq!(cfg.page_size, 5);
    assert_eq!(cfg.max_consecutive_wins, 3);
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
        "LUNCHVOTE_API_BIND_ADDR=127.0.0.1:3000\nLUNCHVOTE_RUN_MIGRATIONS=false\n",
    );

    unsafe {
        env::set_var("LUNCHVOTE_API_BIND_ADDR", "0.0.0.0:9090");
    }

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with env override");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:9090");
    assert!(!cfg.run_migrations);

    clear_env();
}

#[test]
fn production_profile_requires_a_strong_secret() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    unsafe {
        env::set_var("LUNCHVOTE_PROFILE", "production");
    }
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let err = loader.load().expect_err("missing secret should fail");
    assert!(matches!(err, ConfigError::MissingJwtSecret));

    unsafe {
        env::set_var("LUNCHVOTE_JWT_SECRET", "short");
    }
    let err = loader.load().expect_err("weak secret should fail");
    assert!(matches!(err, ConfigError::WeakJwtSecret { length: 5 }));

    unsafe {
        env::set_var("LUNCHVOTE_JWT_SECRET", STRONG_SECRET);
    }
    let cfg = loader.load().expect("strong secret loads");
    assert_eq!(cfg.signing_secret(), STRONG_SECRET);

    clear_env();
}

#[test]
fn unparsable_numbers_name_the_variable() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    unsafe {
        env::set_var("LUNCHVOTE_MAX_CONSECUTIVE_WINS", "twice");
    }
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let err = loader.load().expect_err("non-numeric value should fail");
    assert!(err.to_string().contains("LUNCHVOTE_MAX_CONSECUTIVE_WINS"));

    unsafe {
        env::set_var("LUNCHVOTE_MAX_CONSECUTIVE_WINS", "0");
    }
    let err = loader.load().expect_err("zero should fail validation");
    assert!(matches!(err, ConfigError::InvalidMaxConsecutiveWins));

    clear_env();
}

#[test]
fn invalid_bind_addr_returns_error() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    unsafe {
        env::set_var("LUNCHVOTE_API_BIND_ADDR", "not-an-addr");
    }
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let err = loader.load().expect_err("invalid bind addr should fail");
    assert!(format!("{}", err).contains("invalid api bind address"));

    clear_env();
}
