use std::{fmt, sync::Arc};
use tracing::debug;

// --- Module Structure ---

// Core session components, leaves first.
pub mod config;
pub mod models;
pub mod storage;
pub mod session;
pub mod client;
pub mod auth;
pub mod navigation;
pub mod guard;
pub mod shell;

// Client-side route tables and the navigator seam.
pub mod routes;
use routes::{Access, PageMatch, public};

// --- Public Re-exports ---

pub use auth::{AuthError, AuthGateway};
pub use client::{ApiState, AuthApi, HttpAuthApi, MockAuthApi};
pub use config::{AppConfig, Env};
pub use guard::{AccessGuard, GuardState, GuardView};
pub use models::{Identity, Role};
pub use routes::{History, Navigator, NavigatorState};
pub use session::{Session, SessionState, SessionStore};
pub use shell::{DashboardShell, ShellView};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageState};

/// Redirect chains longer than this are treated as a cycle and render as loading.
const MAX_REDIRECTS: usize = 4;

/// Screen
///
/// The result of rendering the current route once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Session still resolving.
    Loading,
    /// Sign-in form. `busy` disables the submit control.
    Login { error: Option<String>, busy: bool },
    Register,
    /// Any signed-in page, including the access-denied notice, inside the shell.
    Dashboard(ShellView),
    /// Route with no registered page.
    NotFound(String),
}

/// ErgoCheck
///
/// The application container. It owns one of each core component, constructed once
/// per process, and hands them out by reference: the gateway and shell receive the
/// same `SessionState` and `NavigatorState` the guard reads from.
pub struct ErgoCheck {
    pub config: AppConfig,
    pub session: SessionState,
    pub gateway: AuthGateway,
    pub navigator: NavigatorState,
    shell: DashboardShell,
    mounted: Option<Mount>,
}

/// One mounted protected view and its guard.
struct Mount {
    route: String,
    guard: AccessGuard,
}

impl ErgoCheck {
    /// from_config
    ///
    /// Production wiring: file-backed session, HTTP backend, fresh history at `/`.
    pub fn from_config(config: AppConfig, compact: bool) -> Self {
        let storage = Arc::new(FileStore::new(config.session_file.clone())) as StorageState;
        let session = Arc::new(SessionStore::new(storage));
        let api = Arc::new(HttpAuthApi::new(config.api_url.clone(), session.clone())) as ApiState;
        let navigator = Arc::new(History::default()) as NavigatorState;
        Self::with_parts(config, session, api, navigator, compact)
    }

    pub fn with_parts(
        config: AppConfig,
        session: SessionState,
        api: ApiState,
        navigator: NavigatorState,
        compact: bool,
    ) -> Self {
        let gateway = AuthGateway::new(session.clone(), api, navigator.clone());
        let shell = DashboardShell::new(gateway.clone(), navigator.clone(), compact);
        Self {
            config,
            session,
            gateway,
            navigator,
            shell,
            mounted: None,
        }
    }

    /// Reads the persisted session. Until this runs every protected view shows the
    /// loading screen.
    pub fn initialize(&self) -> Option<Identity> {
        self.session.initialize()
    }

    pub fn shell(&self) -> &DashboardShell {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut DashboardShell {
        &mut self.shell
    }

    /// The access-denied notice's "Go back" control.
    pub fn go_back(&mut self) -> bool {
        self.navigator.back()
    }

    /// render
    ///
    /// Renders the navigator's current route, following redirects issued by the
    /// home route and by the Access Guard.
    pub fn render(&mut self) -> Screen {
        for _ in 0..MAX_REDIRECTS {
            let route = self.navigator.current();
            let session = self.session.snapshot();

            let Some(matched) = routes::resolve(&route) else {
                self.mounted = None;
                return Screen::NotFound(route);
            };

            match matched.page.access {
                Access::Public => {
                    self.mounted = None;
                    match matched.page.pattern {
                        public::HOME_ROUTE => match public::home_redirect(&session) {
                            Some(target) => self.navigator.push(target),
                            None => return Screen::Loading,
                        },
                        public::REGISTER_ROUTE => return Screen::Register,
                        _ => {
                            return Screen::Login {
                                error: session.last_error.clone(),
                                busy: session.is_busy(),
                            };
                        }
                    }
                }
                Access::Roles(allowed) => {
                    let navigator = self.navigator.clone();
                    let mount = self.mount(&route, allowed);
                    let view = mount.guard.render(&session, navigator.as_ref(), || {
                        page_content(&matched)
                    });
                    match view {
                        GuardView::Loading => return Screen::Loading,
                        GuardView::Redirecting => continue,
                        GuardView::AccessDenied => {
                            let body = format!(
                                "{}\n{}\n[back] Go Back",
                                guard::ACCESS_DENIED_TITLE,
                                guard::ACCESS_DENIED_MESSAGE
                            );
                            return Screen::Dashboard(self.shell.view(
                                session.identity.as_ref(),
                                &route,
                                body,
                            ));
                        }
                        GuardView::Content(body) => {
                            return Screen::Dashboard(self.shell.view(
                                session.identity.as_ref(),
                                &route,
                                body,
                            ));
                        }
                    }
                }
            }
        }

        debug!("redirect limit reached");
        Screen::Loading
    }

    /// Returns the guard for `route`, remounting when the route changed.
    fn mount(&mut self, route: &str, allowed: &[Role]) -> &mut Mount {
        let remount = self
            .mounted
            .as_ref()
            .is_none_or(|mount| mount.route != route);
        if remount {
            debug!(route = %route, "mounting view");
        }
        let mut mount = match self.mounted.take() {
            Some(mount) if !remount => mount,
            _ => Mount {
                route: route.to_string(),
                guard: AccessGuard::new(allowed.to_vec()),
            },
        };
        mount.guard.set_allowed(allowed.to_vec());
        self.mounted.insert(mount)
    }
}

fn page_content(matched: &PageMatch) -> String {
    match &matched.id {
        Some(id) => format!("{}  (#{})", matched.page.title, id),
        None => matched.page.title.to_string(),
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Loading => writeln!(f, "{}\nLoading...", shell::BRAND),
            Screen::Login { error, busy } => {
                writeln!(f, "{}\nWelcome Back", shell::BRAND)?;
                writeln!(f, "Sign in to your {} account", shell::BRAND)?;
                if let Some(error) = error {
                    writeln!(f, "! {}", error)?;
                }
                if *busy {
                    writeln!(f, "Signing in...")
                } else {
                    writeln!(f, "login <email> <password>")
                }
            }
            Screen::Register => writeln!(
                f,
                "{}\nCreate an account\nregister <name> <email> <password>",
                shell::BRAND
            ),
            Screen::Dashboard(view) => write!(f, "{}", view),
            Screen::NotFound(route) => writeln!(f, "{}\nPage not found: {}", shell::BRAND, route),
        }
    }
}
