use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use ergocheck::{
    AuthError, AuthGateway, FileStore, History, HttpAuthApi, MemoryStore, Navigator, Role,
    SessionStore,
    client::{ApiState, AuthApi, LoginEndpoint},
    models::{LoginRequest, RegisterEmployeeRequest, RegisterPersonalRequest},
    routes::public::LOGIN_ROUTE,
    storage::{KeyValueStore, StorageState, TOKEN_KEY, USER_KEY},
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::net::TcpListener;
use uuid::Uuid;

// --- Fake Backend ---

/// One request as the fake backend saw it.
#[derive(Debug, Clone)]
struct Seen {
    path: &'static str,
    authorization: Option<String>,
    request_id: Option<String>,
}

#[derive(Clone, Default)]
struct Backend {
    seen: Arc<Mutex<Vec<Seen>>>,
    logout_fails: Arc<AtomicBool>,
}

impl Backend {
    fn record(&self, path: &'static str, headers: &HeaderMap) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        self.seen.lock().push(Seen {
            path,
            authorization: header("authorization"),
            request_id: header("x-request-id"),
        });
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().clone()
    }
}

async fn login(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    backend.record("/auth/login", &headers);
    match (body["email"].as_str(), body["password"].as_str()) {
        (Some("a@b.com"), Some("secret")) => Json(json!({
            "error": false,
            "message": "Login successful",
            "data": { "token": "t1", "name": "A", "email": "a@b.com", "role": "employee" }
        }))
        .into_response(),
        (Some("html@b.com"), _) => {
            (StatusCode::BAD_GATEWAY, "<html>upstream down</html>").into_response()
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": true, "message": "Invalid credentials" })),
        )
            .into_response(),
    }
}

async fn superadmin_login(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend.record("/auth/super-admin/login", &headers);
    Json(json!({
        "error": false,
        "data": { "token": "root", "name": "Root", "email": "root@x.com", "role": "superadmin" }
    }))
    .into_response()
}

async fn logout(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend.record("/auth/logout", &headers);
    if backend.logout_fails.load(Ordering::SeqCst) {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    } else {
        StatusCode::OK.into_response()
    }
}

async fn register_personal(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    backend.record("/personal/register", &headers);
    if body["email"] == "taken@x.com" {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": true, "message": "Email already registered" })),
        )
            .into_response();
    }
    (
        StatusCode::CREATED,
        Json(json!({ "error": false, "message": "Account created" })),
    )
        .into_response()
}

async fn register_employee(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    backend.record("/employee/register", &headers);
    if body.get("divisionId").is_none() {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    }
    Json(json!({ "error": false, "message": "Employee created" })).into_response()
}

struct TestApp {
    base_url: String,
    backend: Backend,
}

async fn spawn_backend() -> TestApp {
    let backend = Backend::default();
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/super-admin/login", post(superadmin_login))
        .route("/auth/logout", post(logout))
        .route("/personal/register", post(register_personal))
        .route("/employee/register", post(register_employee))
        .with_state(backend.clone());
    let router = Router::new().nest("/api", api);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        base_url: format!("http://127.0.0.1:{}/api", port),
        backend,
    }
}

struct Client {
    gateway: AuthGateway,
    session: Arc<SessionStore>,
    history: Arc<History>,
    storage: StorageState,
}

fn client_for(app: &TestApp, storage: StorageState) -> Client {
    let session = Arc::new(SessionStore::new(storage.clone()));
    session.initialize();
    let api = Arc::new(HttpAuthApi::new(app.base_url.clone(), session.clone())) as ApiState;
    let history = Arc::new(History::new(LOGIN_ROUTE));
    let gateway = AuthGateway::new(session.clone(), api, history.clone());
    Client {
        gateway,
        session,
        history,
        storage,
    }
}

fn scratch_file() -> std::path::PathBuf {
    std::env::temp_dir()
        .join("ergocheck-tests")
        .join(format!("{}.json", Uuid::new_v4()))
}

// --- Login ---

#[tokio::test]
async fn test_login_success_establishes_session_and_navigates() {
    let app = spawn_backend().await;
    let client = client_for(&app, Arc::new(MemoryStore::new()));

    let identity = client.gateway.login("a@b.com", "secret").await.unwrap();

    assert_eq!(identity.name, "A");
    assert_eq!(identity.email, "a@b.com");
    assert_eq!(identity.role, Role::Employee);
    assert_eq!(client.session.get(), Some(identity));
    assert_eq!(client.session.token().as_deref(), Some("t1"));
    assert_eq!(client.history.current(), "/dashboard/employee");
    assert_eq!(client.session.last_error(), None);

    let stored_user: Value =
        serde_json::from_str(&client.storage.get(USER_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored_user["role"], "employee");
}

#[tokio::test]
async fn test_login_rejection_surfaces_backend_message() {
    let app = spawn_backend().await;
    let client = client_for(&app, Arc::new(MemoryStore::new()));

    let err = client.gateway.login("a@b.com", "wrong").await.unwrap_err();

    assert!(matches!(err, AuthError::Rejected { status: 401, .. }));
    assert_eq!(client.session.get(), None);
    assert_eq!(client.session.last_error().as_deref(), Some("Invalid credentials"));
    assert_eq!(client.history.current(), LOGIN_ROUTE);
    assert!(client.storage.get(TOKEN_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_non_json_error_falls_back_to_generic_message() {
    let app = spawn_backend().await;
    let client = client_for(&app, Arc::new(MemoryStore::new()));

    client.gateway.login("html@b.com", "x").await.unwrap_err();

    assert_eq!(
        client.session.last_error().as_deref(),
        Some("Authentication failed")
    );
}

#[tokio::test]
async fn test_repeated_failures_never_touch_identity() {
    let app = spawn_backend().await;
    let client = client_for(&app, Arc::new(MemoryStore::new()));
    client.gateway.login("a@b.com", "secret").await.unwrap();
    let signed_in = client.session.get();

    for _ in 0..2 {
        client.gateway.login("a@b.com", "nope").await.unwrap_err();
        assert_eq!(client.session.get(), signed_in);
        assert!(!client.session.last_error().unwrap_or_default().is_empty());
    }
}

#[tokio::test]
async fn test_unreachable_backend_is_a_transport_error() {
    let session = Arc::new(SessionStore::new(Arc::new(MemoryStore::new())));
    session.initialize();
    // Port 9 (discard) is closed on test hosts.
    let api = HttpAuthApi::new("http://127.0.0.1:9/api", session);
    let request = LoginRequest {
        email: "a@b.com".into(),
        password: "secret".into(),
    };

    let err = api.login(LoginEndpoint::Standard, &request).await.unwrap_err();
    assert!(matches!(err, AuthError::Transport(_)));
    assert_eq!(err.user_message(), "Authentication failed");
}

#[tokio::test]
async fn test_superadmin_login_uses_its_own_endpoint() {
    let app = spawn_backend().await;
    let client = client_for(&app, Arc::new(MemoryStore::new()));

    let identity = client
        .gateway
        .login_superadmin("root@x.com", "pw")
        .await
        .unwrap();

    assert_eq!(identity.role, Role::Superadmin);
    assert_eq!(client.history.current(), "/dashboard/superadmin");
    let paths: Vec<_> = app.backend.seen().iter().map(|s| s.path).collect();
    assert_eq!(paths, ["/auth/super-admin/login"]);
}

// --- Request Headers ---

#[tokio::test]
async fn test_requests_carry_request_id_and_bearer_token_once_signed_in() {
    let app = spawn_backend().await;
    let client = client_for(&app, Arc::new(MemoryStore::new()));

    client.gateway.login("a@b.com", "secret").await.unwrap();
    client.gateway.logout().await;

    let seen = app.backend.seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].authorization, None);
    assert_eq!(seen[1].authorization.as_deref(), Some("Bearer t1"));
    for request in &seen {
        let id = request.request_id.as_deref().expect("x-request-id missing");
        assert!(Uuid::parse_str(id).is_ok());
    }
    assert_ne!(seen[0].request_id, seen[1].request_id);
}

// --- Logout ---

#[tokio::test]
async fn test_logout_clears_durable_session_when_backend_succeeds() {
    let app = spawn_backend().await;
    let path = scratch_file();
    let client = client_for(&app, Arc::new(FileStore::new(path.clone())));
    client.gateway.login("a@b.com", "secret").await.unwrap();

    client.gateway.logout().await;

    assert_eq!(client.session.get(), None);
    assert_eq!(client.history.current(), LOGIN_ROUTE);
    let reopened = FileStore::new(path);
    assert!(reopened.get(TOKEN_KEY).unwrap().is_none());
    assert!(reopened.get(USER_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_logout_clears_session_even_when_backend_fails() {
    let app = spawn_backend().await;
    app.backend.logout_fails.store(true, Ordering::SeqCst);
    let storage = Arc::new(MemoryStore::new());
    let client = client_for(&app, storage.clone());
    client.gateway.login("a@b.com", "secret").await.unwrap();

    client.gateway.logout().await;

    assert_eq!(client.session.get(), None);
    assert!(!storage.contains(TOKEN_KEY));
    assert!(!storage.contains(USER_KEY));
    assert_eq!(client.history.current(), LOGIN_ROUTE);
}

#[tokio::test]
async fn test_persisted_session_is_restored_by_a_new_process() {
    let app = spawn_backend().await;
    let path = scratch_file();
    let first = client_for(&app, Arc::new(FileStore::new(path.clone())));
    first.gateway.login("a@b.com", "secret").await.unwrap();

    let restored = SessionStore::new(Arc::new(FileStore::new(path)));
    let identity = restored.initialize().expect("session should survive restart");
    assert_eq!(identity.email, "a@b.com");
    assert_eq!(restored.token().as_deref(), Some("t1"));
}

// --- Registration ---

#[tokio::test]
async fn test_register_personal_returns_backend_message() {
    let app = spawn_backend().await;
    let client = client_for(&app, Arc::new(MemoryStore::new()));

    let message = client
        .gateway
        .register_personal(RegisterPersonalRequest {
            name: "New".into(),
            email: "new@x.com".into(),
            password: "pw".into(),
        })
        .await
        .unwrap();
    assert_eq!(message, "Account created");

    let err = client
        .gateway
        .register_personal(RegisterPersonalRequest {
            name: "Dup".into(),
            email: "taken@x.com".into(),
            password: "pw".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Email already registered");
    assert_eq!(client.session.get(), None);
}

#[tokio::test]
async fn test_register_employee_sends_camel_case_and_supervisor_token() {
    let app = spawn_backend().await;
    let client = client_for(&app, Arc::new(MemoryStore::new()));
    client.gateway.login("a@b.com", "secret").await.unwrap();

    let message = client
        .gateway
        .register_employee(RegisterEmployeeRequest {
            name: "E".into(),
            email: "e@x.com".into(),
            password: "pw".into(),
            division_id: "div-1".into(),
        })
        .await
        .unwrap();

    assert_eq!(message, "Employee created");
    let last = app.backend.seen().pop().unwrap();
    assert_eq!(last.path, "/employee/register");
    assert_eq!(last.authorization.as_deref(), Some("Bearer t1"));
}
