//! Access Guard: the gate in front of every protected view.
//!
//! One `AccessGuard` lives for one mount of one view. It starts in `Resolving` and
//! leaves it exactly once; after that it only re-evaluates when the identity it
//! last decided on, or its allow-list, changes. Navigation happens in `update`, on
//! the transition into `Unauthenticated`, never while rendering.

use tracing::{debug, info};

use crate::{
    models::{Identity, Role},
    routes::{Navigator, public::LOGIN_ROUTE},
    session::Session,
};

/// GuardState
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// The session has not been read from storage yet.
    Resolving,
    /// No identity. A redirect to the login route has been issued.
    Unauthenticated,
    /// Signed in, but the role is not on the view's allow-list.
    Forbidden,
    /// Signed in with an allowed role.
    Authorized,
}

/// GuardView
///
/// What the mounted view should show for the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardView<T> {
    /// Neutral loading indicator.
    Loading,
    /// Nothing; the redirect is already under way.
    Redirecting,
    /// "Access denied" notice with a control that goes back in history.
    AccessDenied,
    /// The wrapped content.
    Content(T),
}

pub const ACCESS_DENIED_TITLE: &str = "Access Denied";
pub const ACCESS_DENIED_MESSAGE: &str = "You don't have permission to access this page.";

/// AccessGuard
#[derive(Debug, Clone)]
pub struct AccessGuard {
    allowed: Vec<Role>,
    state: GuardState,
    // The identity the current decision was made for; `None` until resolved.
    decided_for: Option<Option<Identity>>,
}

impl AccessGuard {
    pub fn new(allowed: impl Into<Vec<Role>>) -> Self {
        Self {
            allowed: allowed.into(),
            state: GuardState::Resolving,
            decided_for: None,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Replaces the allow-list. The next `update` re-evaluates.
    pub fn set_allowed(&mut self, allowed: impl Into<Vec<Role>>) {
        let allowed = allowed.into();
        if allowed != self.allowed {
            self.allowed = allowed;
            self.decided_for = None;
        }
    }

    /// True when `role` may see the view. Unknown roles never may, even if an
    /// allow-list names them.
    pub fn permits(&self, role: &Role) -> bool {
        role.is_known() && self.allowed.contains(role)
    }

    /// evaluate
    ///
    /// The pure decision for a session snapshot, ignoring history.
    pub fn evaluate(&self, session: &Session) -> GuardState {
        if session.is_resolving {
            return GuardState::Resolving;
        }
        match &session.identity {
            None => GuardState::Unauthenticated,
            Some(identity) if self.permits(&identity.role) => GuardState::Authorized,
            Some(_) => GuardState::Forbidden,
        }
    }

    /// update
    ///
    /// The single transition function. Applies `evaluate` when the guard is still
    /// resolving or when the identity/allow-list changed since the last decision,
    /// and performs the transition's side effect (the login redirect).
    pub fn update(&mut self, session: &Session, navigator: &dyn Navigator) -> GuardState {
        if self.state != GuardState::Resolving
            && self.decided_for.as_ref() == Some(&session.identity)
        {
            return self.state;
        }

        let next = self.evaluate(session);
        if next == GuardState::Resolving {
            // Either still waiting for the first read, or a finished mount seeing a
            // resolving snapshot; neither moves the guard backwards.
            return self.state;
        }

        self.decided_for = Some(session.identity.clone());
        if next != self.state {
            debug!(from = ?self.state, to = ?next, "access guard transition");
            if next == GuardState::Unauthenticated {
                info!("no session, redirecting to login");
                navigator.push(LOGIN_ROUTE);
            }
            self.state = next;
        }
        self.state
    }

    /// render
    ///
    /// Runs `update` and maps the resulting state to a view. `content` is only
    /// invoked when authorized.
    pub fn render<T>(
        &mut self,
        session: &Session,
        navigator: &dyn Navigator,
        content: impl FnOnce() -> T,
    ) -> GuardView<T> {
        match self.update(session, navigator) {
            GuardState::Resolving => GuardView::Loading,
            GuardState::Unauthenticated => GuardView::Redirecting,
            GuardState::Forbidden => GuardView::AccessDenied,
            GuardState::Authorized => GuardView::Content(content()),
        }
    }
}
