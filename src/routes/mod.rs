/// Router Module Index
///
/// Client-side navigation. `Navigator` is the seam through which the Auth Gateway,
/// the Access Guard and the Dashboard Shell move between routes; the route tables
/// are split the way access is split:

/// Routes reachable without a session (home redirect, login, registration).
pub mod public;

/// Role-restricted dashboard pages, each with its allow-list.
pub mod dashboard;

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

pub use dashboard::{Access, Page, PageMatch, resolve};

/// Navigator
///
/// Client-side route changes. Implementations record the route; rendering is driven
/// separately by whoever owns the event loop.
pub trait Navigator: Send + Sync {
    /// Moves to `route`, recording it in history.
    fn push(&self, route: &str);

    /// Returns to the previous route. False when there is nothing to go back to.
    fn back(&self) -> bool;

    fn current(&self) -> String;
}

/// NavigatorState
pub type NavigatorState = Arc<dyn Navigator>;

/// History
///
/// An in-memory history stack. Pushing the route already on top is a no-op, and the
/// first entry can never be popped.
pub struct History {
    stack: Mutex<Vec<String>>,
}

impl History {
    pub fn new(initial: &str) -> Self {
        Self {
            stack: Mutex::new(vec![initial.to_string()]),
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.stack.lock().clone()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(public::HOME_ROUTE)
    }
}

impl Navigator for History {
    fn push(&self, route: &str) {
        let mut stack = self.stack.lock();
        if stack.last().map(String::as_str) == Some(route) {
            return;
        }
        debug!(route = %route, "navigate");
        stack.push(route.to_string());
    }

    fn back(&self) -> bool {
        let mut stack = self.stack.lock();
        if stack.len() <= 1 {
            return false;
        }
        stack.pop();
        debug!(route = ?stack.last(), "navigate back");
        true
    }

    fn current(&self) -> String {
        self.stack
            .lock()
            .last()
            .cloned()
            .unwrap_or_else(|| public::HOME_ROUTE.to_string())
    }
}
