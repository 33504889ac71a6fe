use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tracing::{Instrument, debug};
use uuid::Uuid;

use crate::{
    auth::AuthError,
    models::{ApiMessage, LoginData, LoginRequest, LoginResponse},
    session::SessionState,
};

/// LoginEndpoint
///
/// The backend exposes one credential exchange for enterprise and personal accounts
/// and a separate one for super-admins. Both return the same envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginEndpoint {
    Standard,
    Superadmin,
}

impl LoginEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            LoginEndpoint::Standard => "/auth/login",
            LoginEndpoint::Superadmin => "/auth/super-admin/login",
        }
    }
}

pub const LOGOUT_PATH: &str = "/auth/logout";

// 1. AuthApi Contract
/// AuthApi
///
/// The slice of the backend API the session core depends on. The Auth Gateway only
/// sees this trait, so tests swap in `MockAuthApi` without a network.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for a token and identity.
    async fn login(
        &self,
        endpoint: LoginEndpoint,
        request: &LoginRequest,
    ) -> Result<LoginData, AuthError>;

    /// Invalidates the current token server-side.
    async fn logout(&self) -> Result<(), AuthError>;

    /// Posts a registration payload and returns the backend's confirmation message.
    async fn register(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Option<String>, AuthError>;
}

/// ApiState
pub type ApiState = Arc<dyn AuthApi>;

// 2. The Real Implementation (reqwest)
/// HttpAuthApi
///
/// The shared request client: prefixes every path with the configured base URL,
/// attaches the session's bearer token when one is held, and tags each request with
/// a fresh `x-request-id` so client and backend logs can be correlated.
#[derive(Clone)]
pub struct HttpAuthApi {
    client: reqwest::Client,
    base_url: String,
    session: SessionState,
}

impl HttpAuthApi {
    pub fn new(base_url: impl Into<String>, session: SessionState) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    /// send
    ///
    /// Issues one request and decodes a 2xx body as `T`. Non-2xx responses become
    /// `AuthError::Rejected`, carrying the body's `message` when it has one.
    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, AuthError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "api_request",
            method = %method,
            path = %path,
            req_id = %request_id,
        );

        async move {
            let mut request = self
                .client
                .request(method, format!("{}{}", self.base_url, path))
                .header("x-request-id", request_id.to_string());
            if let Some(token) = self.session.token() {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .map_err(|e| AuthError::Transport(e.to_string()))?;
            let status = response.status();
            debug!(status = status.as_u16(), "response received");

            let bytes = response
                .bytes()
                .await
                .map_err(|e| AuthError::Transport(e.to_string()))?;

            if !status.is_success() {
                return Err(AuthError::Rejected {
                    status: status.as_u16(),
                    message: error_message(&bytes),
                });
            }

            // Endpoints with nothing to say may answer 2xx with an empty body.
            let bytes: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
            serde_json::from_slice(bytes).map_err(|e| AuthError::Decode(e.to_string()))
        }
        .instrument(span)
        .await
    }
}

/// error_message
///
/// Pulls a non-empty `message` out of an error body. Anything else (empty body,
/// HTML error page, JSON without `message`) yields `None` and the caller falls back
/// to its generic text.
pub fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ApiMessage>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(
        &self,
        endpoint: LoginEndpoint,
        request: &LoginRequest,
    ) -> Result<LoginData, AuthError> {
        let response: LoginResponse = self
            .send(Method::POST, endpoint.path(), Some(request))
            .await?;

        if response.error {
            return Err(AuthError::Rejected {
                status: StatusCode::OK.as_u16(),
                message: Some(response.message).filter(|m| !m.trim().is_empty()),
            });
        }

        response
            .data
            .ok_or_else(|| AuthError::Decode("login response carried no data".to_string()))
    }

    async fn logout(&self) -> Result<(), AuthError> {
        let _: Option<serde_json::Value> =
            self.send::<(), _>(Method::POST, LOGOUT_PATH, None).await?;
        Ok(())
    }

    async fn register(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Option<String>, AuthError> {
        let response: Option<ApiMessage> = self.send(Method::POST, path, Some(&body)).await?;
        let response = response.unwrap_or_default();
        if response.error {
            return Err(AuthError::Rejected {
                status: StatusCode::OK.as_u16(),
                message: response.message,
            });
        }
        Ok(response.message)
    }
}

// 3. The Mock Implementation (For Unit Tests)
/// MockOutcome
///
/// What the mock backend answers to a login.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Success(LoginData),
    Rejected { status: u16, message: Option<String> },
    Unreachable,
}

impl MockOutcome {
    fn to_result(&self) -> Result<LoginData, AuthError> {
        match self {
            MockOutcome::Success(data) => Ok(data.clone()),
            MockOutcome::Rejected { status, message } => Err(AuthError::Rejected {
                status: *status,
                message: message.clone(),
            }),
            MockOutcome::Unreachable => {
                Err(AuthError::Transport("connection refused".to_string()))
            }
        }
    }
}

/// MockAuthApi
///
/// A scripted `AuthApi`. Every call is recorded as `"<METHOD> <path>"` so tests can
/// assert which endpoints the gateway hit.
pub struct MockAuthApi {
    pub login_outcome: MockOutcome,
    /// When true, logout and registration calls fail with a 500.
    pub should_fail: bool,
    calls: Mutex<Vec<String>>,
}

impl MockAuthApi {
    pub fn new(login_outcome: MockOutcome) -> Self {
        Self {
            login_outcome,
            should_fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn new_failing(login_outcome: MockOutcome) -> Self {
        Self {
            should_fail: true,
            ..Self::new(login_outcome)
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn server_error() -> AuthError {
        AuthError::Rejected {
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            message: Some("Mock backend failure".to_string()),
        }
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(
        &self,
        endpoint: LoginEndpoint,
        _request: &LoginRequest,
    ) -> Result<LoginData, AuthError> {
        self.calls.lock().push(format!("POST {}", endpoint.path()));
        self.login_outcome.to_result()
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.calls.lock().push(format!("POST {}", LOGOUT_PATH));
        if self.should_fail {
            return Err(Self::server_error());
        }
        Ok(())
    }

    async fn register(
        &self,
        path: &str,
        _body: serde_json::Value,
    ) -> Result<Option<String>, AuthError> {
        self.calls.lock().push(format!("POST {}", path));
        if self.should_fail {
            return Err(Self::server_error());
        }
        Ok(Some("Registered".to_string()))
    }
}
