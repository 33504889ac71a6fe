use ergocheck::{
    AppConfig,
    config::{DEFAULT_COMPACT_WIDTH, DEFAULT_LOCAL_API_URL, Env},
};
use serial_test::serial;
use std::{env, panic, path::PathBuf};

const VARS: [&str; 4] = [
    "APP_ENV",
    "ERGOCHECK_API_URL",
    "ERGOCHECK_SESSION_FILE",
    "ERGOCHECK_COMPACT_WIDTH",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with exactly `vars` set (every other config variable removed) and
/// restores the previous environment afterwards, even if the test panics.
fn run_with_env<T, R>(vars: &[(&str, &str)], test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> =
        VARS.iter().map(|&var| (var, env::var(var).ok())).collect();

    unsafe {
        for var in VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original) in originals {
        unsafe {
            match original {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_local_defaults() {
    let config = run_with_env(&[], AppConfig::load);

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.api_url, DEFAULT_LOCAL_API_URL);
    assert_eq!(config.compact_width, DEFAULT_COMPACT_WIDTH);
    assert!(config.session_file.ends_with(".ergocheck/session.json"));
}

#[test]
#[serial]
fn test_local_overrides_and_trailing_slash() {
    let config = run_with_env(
        &[
            ("ERGOCHECK_API_URL", "http://10.0.0.5:5000/api/"),
            ("ERGOCHECK_SESSION_FILE", "/tmp/ergo/session.json"),
            ("ERGOCHECK_COMPACT_WIDTH", "80"),
        ],
        AppConfig::load,
    );

    assert_eq!(config.api_url, "http://10.0.0.5:5000/api");
    assert_eq!(config.session_file, PathBuf::from("/tmp/ergo/session.json"));
    assert_eq!(config.compact_width, 80);
}

#[test]
#[serial]
fn test_unparsable_width_falls_back_to_default() {
    let config = run_with_env(&[("ERGOCHECK_COMPACT_WIDTH", "wide")], AppConfig::load);
    assert_eq!(config.compact_width, DEFAULT_COMPACT_WIDTH);
}

#[test]
#[serial]
fn test_production_fail_fast_without_api_url() {
    let result = run_with_env(&[("APP_ENV", "production")], || {
        panic::catch_unwind(AppConfig::load)
    });
    assert!(result.is_err(), "production must refuse to start without a backend URL");
}

#[test]
#[serial]
fn test_production_rejects_plain_http() {
    let result = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("ERGOCHECK_API_URL", "http://api.ergocheck.example/api"),
        ],
        || panic::catch_unwind(AppConfig::load),
    );
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_production_success() {
    let config = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("ERGOCHECK_API_URL", "https://api.ergocheck.example/api"),
        ],
        AppConfig::load,
    );
    assert_eq!(config.env, Env::Production);
    assert_eq!(config.api_url, "https://api.ergocheck.example/api");
}

#[test]
fn test_default_config_is_local_and_non_panicking() {
    let config = AppConfig::default();
    assert_eq!(config.env, Env::Local);
    assert!(config.session_file.starts_with(env::temp_dir()));
}
