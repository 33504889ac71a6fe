use serde::{Deserialize, Serialize};
use std::fmt;

// --- Identity & Roles ---

/// Role
///
/// The RBAC field carried by every identity. The four known roles are closed; any
/// other value read from the wire or from storage is kept verbatim in `Unknown` so
/// that every consumer must decide what an unrecognised role means (they all fail
/// closed: no navigation, no protected views).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Supervisor,
    Employee,
    Personal,
    Superadmin,
    Unknown(String),
}

impl Role {
    /// All roles the dashboard knows how to serve, in display order.
    pub const KNOWN: [Role; 4] = [
        Role::Supervisor,
        Role::Employee,
        Role::Personal,
        Role::Superadmin,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Role::Supervisor => "supervisor",
            Role::Employee => "employee",
            Role::Personal => "personal",
            Role::Superadmin => "superadmin",
            Role::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Role::Unknown(_))
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "supervisor" => Role::Supervisor,
            "employee" => Role::Employee,
            "personal" => Role::Personal,
            "superadmin" => Role::Superadmin,
            _ => Role::Unknown(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity
///
/// The logged-in principal. This is exactly the document persisted under the `user`
/// storage key; the bearer token is persisted separately under `token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    // Display name shown in the shell footer.
    pub name: String,
    // Login handle.
    pub email: String,
    pub role: Role,
}

impl Identity {
    /// First character of the display name, used as the avatar in the shell footer.
    pub fn initial(&self) -> Option<char> {
        self.name.chars().next()
    }
}

// --- Request Payloads ---

/// LoginRequest
///
/// Body of `POST /auth/login` and `POST /auth/super-admin/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// RegisterPersonalRequest
///
/// Body of `POST /personal/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPersonalRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// RegisterSupervisorRequest
///
/// Body of `POST /supervisor/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSupervisorRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub company_id: String,
}

/// RegisterEmployeeRequest
///
/// Body of `POST /employee/register`. Issued by a supervisor, so the request client
/// attaches the supervisor's bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterEmployeeRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub division_id: String,
}

// --- Response Payloads ---

/// LoginData
///
/// The `data` object of a successful credential exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginData {
    pub token: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl LoginData {
    /// Splits the payload into the identity to hold in the session and the bearer token.
    pub fn into_parts(self) -> (Identity, String) {
        let identity = Identity {
            name: self.name,
            email: self.email,
            role: self.role,
        };
        (identity, self.token)
    }
}

/// LoginResponse
///
/// Envelope returned by the login endpoints: `{error, message, data}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<LoginData>,
}

/// ApiMessage
///
/// Minimal envelope shared by error bodies and the registration/logout endpoints.
/// Every field is optional because the backend is only expected to carry `message`
/// on failures, and may omit it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub error: bool,
    pub message: Option<String>,
}
