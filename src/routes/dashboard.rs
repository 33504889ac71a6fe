use crate::models::Role;

/// Access
///
/// Who may see a page. Dashboard pages are never public; they name their roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Roles(&'static [Role]),
}

/// Page
///
/// One registered route. A `{id}` segment in `pattern` matches any single non-empty
/// path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub pattern: &'static str,
    pub title: &'static str,
    pub access: Access,
}

/// PageMatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMatch {
    pub page: &'static Page,
    /// Value of the `{id}` segment, if the pattern has one.
    pub id: Option<String>,
}

static SUPERVISOR: [Role; 1] = [Role::Supervisor];
static EMPLOYEE: [Role; 1] = [Role::Employee];
static PERSONAL: [Role; 1] = [Role::Personal];
static SUPERADMIN: [Role; 1] = [Role::Superadmin];
static EVERY_ROLE: [Role; 4] = Role::KNOWN;

const fn page(pattern: &'static str, title: &'static str, roles: &'static [Role]) -> Page {
    Page {
        pattern,
        title,
        access: Access::Roles(roles),
    }
}

/// Dashboard Router Table
///
/// Every page the dashboard can mount, grouped by owning role. Allow-lists are
/// enforced by the Access Guard when the page mounts.
static PAGES: [Page; 29] = [
    // --- Public ---
    Page {
        pattern: "/",
        title: "ErgoCheck",
        access: Access::Public,
    },
    Page {
        pattern: "/auth/login",
        title: "Sign in",
        access: Access::Public,
    },
    Page {
        pattern: "/auth/register",
        title: "Register",
        access: Access::Public,
    },
    // --- Any signed-in role ---
    page("/dashboard", "Dashboard", &EVERY_ROLE),
    page("/settings", "Settings", &EVERY_ROLE),
    page("/help", "Help & Support", &EVERY_ROLE),
    // --- Supervisor ---
    page("/dashboard/supervisor", "Supervisor Dashboard", &SUPERVISOR),
    page("/dashboard/supervisor/employees", "Employees", &SUPERVISOR),
    page("/dashboard/supervisor/ergonomic-data", "Ergonomic Data", &SUPERVISOR),
    page("/dashboard/supervisor/schedule", "Evaluation Schedule", &SUPERVISOR),
    page("/dashboard/supervisor/quizzes", "Quiz Management", &SUPERVISOR),
    page("/dashboard/supervisor/quizzes/{id}", "Edit Quiz", &SUPERVISOR),
    page("/dashboard/supervisor/reports", "Reports", &SUPERVISOR),
    // --- Employee ---
    page("/dashboard/employee", "Employee Dashboard", &EMPLOYEE),
    page("/dashboard/employee/posture-evaluation", "Posture Evaluation", &EMPLOYEE),
    page("/dashboard/employee/recommendations", "Recommendations", &EMPLOYEE),
    page("/dashboard/employee/quizzes", "Quiz & Learning", &EMPLOYEE),
    page("/dashboard/employee/quizzes/{id}", "Take Quiz", &EMPLOYEE),
    page("/dashboard/employee/progress", "Progress & Rewards", &EMPLOYEE),
    page("/dashboard/employee/history", "Evaluation History", &EMPLOYEE),
    // --- Personal ---
    page("/dashboard/personal", "Personal Dashboard", &PERSONAL),
    page("/dashboard/personal/posture-evaluation", "Posture Evaluation", &PERSONAL),
    page("/dashboard/personal/recommendations", "Recommendations", &PERSONAL),
    page("/dashboard/personal/learning", "Learning Materials", &PERSONAL),
    page("/dashboard/personal/progress", "Progress & Rewards", &PERSONAL),
    // --- Superadmin ---
    page("/dashboard/superadmin", "Superadmin Dashboard", &SUPERADMIN),
    page("/dashboard/superadmin/users", "User Management", &SUPERADMIN),
    page("/dashboard/superadmin/content", "Content Management", &SUPERADMIN),
    page("/dashboard/superadmin/configuration", "System Configuration", &SUPERADMIN),
];

/// resolve
///
/// Finds the page registered for `route`. Query strings and a trailing slash are
/// ignored. Matching is segment-count exact, so a list page and its `{id}` detail
/// page never compete for the same route.
pub fn resolve(route: &str) -> Option<PageMatch> {
    let path = route.split(['?', '#']).next().unwrap_or(route);
    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };

    PAGES.iter().find_map(|page| {
        match_pattern(page.pattern, path).map(|id| PageMatch { page, id })
    })
}

fn match_pattern(pattern: &str, path: &str) -> Option<Option<String>> {
    if pattern == path {
        return Some(None);
    }
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');
    let mut id = None;

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return Some(id),
            (Some("{id}"), Some(segment)) if !segment.is_empty() => {
                id = Some(segment.to_string());
            }
            (Some(expected), Some(segment)) if expected == segment => {}
            _ => return None,
        }
    }
}
