//! Role-to-View Resolver.
//!
//! Pure lookups from a `Role` to the sidebar it is allowed to see and the route it
//! lands on after sign-in. The tables are static, so repeated calls return the very
//! same slice.

use crate::models::Role;

/// Landing route for identities whose role this client does not recognise.
pub const DASHBOARD_FALLBACK_ROUTE: &str = "/dashboard";

/// Icon
///
/// Symbolic icon reference. Front-ends decide how to draw it; the terminal shell uses
/// `glyph()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    LayoutDashboard,
    Users,
    BarChart,
    Calendar,
    BookOpen,
    FileText,
    Camera,
    CheckSquare,
    Award,
    Settings,
    HelpCircle,
    LogOut,
}

impl Icon {
    pub fn glyph(self) -> &'static str {
        match self {
            Icon::LayoutDashboard => "▦",
            Icon::Users => "☺",
            Icon::BarChart => "▤",
            Icon::Calendar => "▣",
            Icon::BookOpen => "✎",
            Icon::FileText => "☰",
            Icon::Camera => "◉",
            Icon::CheckSquare => "☑",
            Icon::Award => "★",
            Icon::Settings => "⚙",
            Icon::HelpCircle => "?",
            Icon::LogOut => "⏻",
        }
    }
}

/// NavigationEntry
///
/// One sidebar item. Entries with children act as expandable groups rather than
/// links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationEntry {
    pub icon: Icon,
    pub label: &'static str,
    pub target_route: &'static str,
    pub children: &'static [NavigationEntry],
}

impl NavigationEntry {
    const fn link(icon: Icon, label: &'static str, target_route: &'static str) -> Self {
        Self {
            icon,
            label,
            target_route,
            children: &[],
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

static SUPERVISOR_NAV: [NavigationEntry; 6] = [
    NavigationEntry::link(Icon::LayoutDashboard, "Dashboard", "/dashboard/supervisor"),
    NavigationEntry::link(Icon::Users, "Employees", "/dashboard/supervisor/employees"),
    NavigationEntry::link(
        Icon::BarChart,
        "Ergonomic Data",
        "/dashboard/supervisor/ergonomic-data",
    ),
    NavigationEntry::link(
        Icon::Calendar,
        "Evaluation Schedule",
        "/dashboard/supervisor/schedule",
    ),
    NavigationEntry::link(Icon::BookOpen, "Quiz Management", "/dashboard/supervisor/quizzes"),
    NavigationEntry::link(Icon::FileText, "Reports", "/dashboard/supervisor/reports"),
];

static EMPLOYEE_NAV: [NavigationEntry; 5] = [
    NavigationEntry::link(Icon::LayoutDashboard, "Dashboard", "/dashboard/employee"),
    NavigationEntry::link(
        Icon::Camera,
        "Posture Evaluation",
        "/dashboard/employee/posture-evaluation",
    ),
    NavigationEntry::link(
        Icon::CheckSquare,
        "Recommendations",
        "/dashboard/employee/recommendations",
    ),
    NavigationEntry::link(Icon::BookOpen, "Quiz & Learning", "/dashboard/employee/quizzes"),
    NavigationEntry::link(Icon::Award, "Progress & Rewards", "/dashboard/employee/progress"),
];

static PERSONAL_NAV: [NavigationEntry; 5] = [
    NavigationEntry::link(Icon::LayoutDashboard, "Dashboard", "/dashboard/personal"),
    NavigationEntry::link(
        Icon::Camera,
        "Posture Evaluation",
        "/dashboard/personal/posture-evaluation",
    ),
    NavigationEntry::link(
        Icon::CheckSquare,
        "Recommendations",
        "/dashboard/personal/recommendations",
    ),
    NavigationEntry::link(Icon::BookOpen, "Learning Materials", "/dashboard/personal/learning"),
    NavigationEntry::link(Icon::Award, "Progress & Rewards", "/dashboard/personal/progress"),
];

static SUPERADMIN_NAV: [NavigationEntry; 4] = [
    NavigationEntry::link(Icon::LayoutDashboard, "Dashboard", "/dashboard/superadmin"),
    NavigationEntry::link(Icon::Users, "User Management", "/dashboard/superadmin/users"),
    NavigationEntry::link(
        Icon::FileText,
        "Content Management",
        "/dashboard/superadmin/content",
    ),
    NavigationEntry::link(
        Icon::Settings,
        "System Configuration",
        "/dashboard/superadmin/configuration",
    ),
];

/// Sidebar entries for `role`, in display order. Unknown roles get nothing.
pub fn navigation_for(role: &Role) -> &'static [NavigationEntry] {
    match role {
        Role::Supervisor => &SUPERVISOR_NAV,
        Role::Employee => &EMPLOYEE_NAV,
        Role::Personal => &PERSONAL_NAV,
        Role::Superadmin => &SUPERADMIN_NAV,
        Role::Unknown(_) => &[],
    }
}

/// Route a freshly signed-in `role` is sent to.
pub fn landing_route(role: &Role) -> &'static str {
    match role {
        Role::Supervisor => "/dashboard/supervisor",
        Role::Employee => "/dashboard/employee",
        Role::Personal => "/dashboard/personal",
        Role::Superadmin => "/dashboard/superadmin",
        Role::Unknown(_) => DASHBOARD_FALLBACK_ROUTE,
    }
}
