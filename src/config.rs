use std::{env, path::PathBuf};

/// AppConfig
///
/// Holds the client's entire configuration state. It is loaded once at startup and
/// handed by value to the `ErgoCheck` container, which shares it read-only with the
/// request client and the terminal front-end.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Base URL of the ErgoCheck backend API (no trailing slash).
    pub api_url: String,
    // Location of the durable session document (token + user).
    pub session_file: PathBuf,
    // Terminal widths strictly below this count as a small viewport.
    pub compact_width: u16,
    // Runtime environment marker. Controls log format and URL strictness.
    pub env: Env,
}

/// Env
///
/// Defines the runtime context. `Local` targets a backend on the developer's
/// machine; `Production` demands an explicit, TLS-protected backend URL.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const DEFAULT_LOCAL_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_COMPACT_WIDTH: u16 = 100;

impl Default for AppConfig {
    /// default
    ///
    /// Provides a non-panicking AppConfig for test setup, pointing at the local backend
    /// and a session file under the system temp directory.
    fn default() -> Self {
        Self {
            api_url: DEFAULT_LOCAL_API_URL.to_string(),
            session_file: env::temp_dir().join("ergocheck-test").join("session.json"),
            compact_width: DEFAULT_COMPACT_WIDTH,
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables and implements the **fail-fast**
    /// principle for production.
    ///
    /// # Panics
    /// Panics in `Env::Production` when `ERGOCHECK_API_URL` is missing or is not an
    /// `https://` URL. A client must never send credentials to a production backend
    /// over plain HTTP.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let api_url = match env {
            Env::Production => {
                let url = env::var("ERGOCHECK_API_URL")
                    .expect("FATAL: ERGOCHECK_API_URL must be set in production.");
                if !url.starts_with("https://") {
                    panic!("FATAL: ERGOCHECK_API_URL must use https:// in production.");
                }
                url
            }
            Env::Local => env::var("ERGOCHECK_API_URL")
                .unwrap_or_else(|_| DEFAULT_LOCAL_API_URL.to_string()),
        };

        let session_file = env::var("ERGOCHECK_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_session_file());

        let compact_width = env::var("ERGOCHECK_COMPACT_WIDTH")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_COMPACT_WIDTH);

        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            session_file,
            compact_width,
            env,
        }
    }
}

/// default_session_file
///
/// `$HOME/.ergocheck/session.json`, or a project-local `.ergocheck/` when no home
/// directory is known (containers, CI).
fn default_session_file() -> PathBuf {
    let base = env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(".ergocheck").join("session.json")
}
