use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    client::{ApiState, LoginEndpoint},
    models::{
        Identity, LoginRequest, RegisterEmployeeRequest, RegisterPersonalRequest,
        RegisterSupervisorRequest,
    },
    navigation::landing_route,
    routes::{NavigatorState, public::LOGIN_ROUTE},
    session::SessionState,
    storage::StorageError,
};

/// Shown when the backend gives no usable reason for a failed sign-in.
pub const AUTH_FALLBACK_MESSAGE: &str = "Authentication failed";
/// Shown when the backend gives no usable reason for a failed registration.
pub const REGISTER_FALLBACK_MESSAGE: &str = "Registration failed";

/// AuthError
///
/// Every way a backend call made by the gateway can fail. None of these reach the
/// rendering layer raw: the gateway converts them to `user_message()` text and
/// stores it as the session's `last_error`.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Structural validation failed before any request was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A credential exchange is already pending.
    #[error("a sign-in is already in progress")]
    InFlight,

    /// The backend answered with a failure status or an `error: true` envelope.
    #[error("backend rejected the request with status {status}")]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    /// The request never completed (DNS, refused connection, TLS, reset).
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend answered 2xx with a body we could not interpret.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The credential exchange succeeded but the session could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Text suitable for the login screen's error banner.
    pub fn user_message(&self) -> String {
        self.user_message_or(AUTH_FALLBACK_MESSAGE)
    }

    /// Like `user_message`, with a caller-chosen generic fallback.
    pub fn user_message_or(&self, fallback: &str) -> String {
        match self {
            AuthError::InvalidInput(reason) => reason.clone(),
            AuthError::InFlight => "A sign-in is already in progress".to_string(),
            AuthError::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            AuthError::Storage(_) => "Could not save the session on this device".to_string(),
            AuthError::Rejected { message: None, .. }
            | AuthError::Transport(_)
            | AuthError::Decode(_) => fallback.to_string(),
        }
    }
}

fn require(value: &str, what: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::InvalidInput(format!("{} is required", what)));
    }
    Ok(())
}

/// AuthGateway
///
/// Performs sign-in and sign-out against the backend and is the only component that
/// mutates the Session Store. Navigation after a state change happens here, strictly
/// after the session write, so whatever renders the new route already sees the new
/// identity.
#[derive(Clone)]
pub struct AuthGateway {
    session: SessionState,
    api: ApiState,
    navigator: NavigatorState,
}

impl AuthGateway {
    pub fn new(session: SessionState, api: ApiState, navigator: NavigatorState) -> Self {
        Self {
            session,
            api,
            navigator,
        }
    }

    /// login
    ///
    /// Enterprise and personal sign-in. On success the identity and token are
    /// persisted together and the navigator moves to the role's landing route
    /// (`/dashboard` for a role this client does not know). On failure the session
    /// identity is untouched and `last_error` carries the backend's message or the
    /// generic fallback.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.exchange(LoginEndpoint::Standard, email, password).await
    }

    /// login_superadmin
    ///
    /// Same flow as `login` against the super-admin credential exchange.
    pub async fn login_superadmin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        self.exchange(LoginEndpoint::Superadmin, email, password).await
    }

    async fn exchange(
        &self,
        endpoint: LoginEndpoint,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        if let Err(e) = require(email, "Email").and_then(|_| require(password, "Password")) {
            self.session.set_error(Some(e.user_message()));
            return Err(e);
        }

        if !self.session.begin_request() {
            return Err(AuthError::InFlight);
        }
        self.session.set_error(None);
        info!(email = %email, endpoint = endpoint.path(), "signing in");

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let result = match self.api.login(endpoint, &request).await {
            Ok(data) => {
                let (identity, token) = data.into_parts();
                self.session
                    .establish(identity.clone(), token)
                    .map(|_| identity)
                    .map_err(AuthError::from)
            }
            Err(e) => Err(e),
        };
        self.session.end_request();

        match result {
            Ok(identity) => {
                info!(email = %identity.email, role = %identity.role, "signed in");
                self.navigator.push(landing_route(&identity.role));
                Ok(identity)
            }
            Err(e) => {
                warn!(email = %email, "sign-in failed: {}", e);
                self.session.set_error(Some(e.user_message()));
                Err(e)
            }
        }
    }

    /// logout
    ///
    /// Tells the backend (best effort), then clears the local session and returns to
    /// the login route no matter what the backend said. A failed backend call is only
    /// logged.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!("logout request failed, clearing local session anyway: {}", e);
        }
        if let Err(e) = self.session.clear() {
            error!("failed to remove persisted session: {}", e);
        }
        info!("signed out");
        self.navigator.push(LOGIN_ROUTE);
    }

    // --- Registration ---

    /// Creates a personal (self-service) account.
    pub async fn register_personal(
        &self,
        request: RegisterPersonalRequest,
    ) -> Result<String, AuthError> {
        require(&request.name, "Name")?;
        require(&request.email, "Email")?;
        require(&request.password, "Password")?;
        self.register("/personal/register", json!(request)).await
    }

    /// Creates a supervisor account attached to a company.
    pub async fn register_supervisor(
        &self,
        request: RegisterSupervisorRequest,
    ) -> Result<String, AuthError> {
        require(&request.name, "Name")?;
        require(&request.email, "Email")?;
        require(&request.password, "Password")?;
        require(&request.company_id, "Company")?;
        self.register("/supervisor/register", json!(request)).await
    }

    /// Creates an employee in one of the signed-in supervisor's divisions.
    pub async fn register_employee(
        &self,
        request: RegisterEmployeeRequest,
    ) -> Result<String, AuthError> {
        require(&request.name, "Name")?;
        require(&request.email, "Email")?;
        require(&request.password, "Password")?;
        require(&request.division_id, "Division")?;
        self.register("/employee/register", json!(request)).await
    }

    async fn register(&self, path: &str, body: serde_json::Value) -> Result<String, AuthError> {
        match self.api.register(path, body).await {
            Ok(message) => Ok(message.unwrap_or_else(|| "Registration successful".to_string())),
            Err(e) => {
                warn!(path = %path, "registration failed: {}", e);
                Err(e)
            }
        }
    }
}
