//! Dashboard Shell: the persistent chrome around every signed-in page.

use std::{collections::HashSet, fmt};

use crate::{
    auth::AuthGateway,
    models::Identity,
    navigation::{Icon, NavigationEntry, navigation_for},
    routes::NavigatorState,
};

pub const BRAND: &str = "ErgoCheck";

/// Links shown under the identity badge for every role, before "Sign out".
pub const FOOTER_LINKS: [(Icon, &str, &str); 2] = [
    (Icon::Settings, "Settings", "/settings"),
    (Icon::HelpCircle, "Help & Support", "/help"),
];

/// SidebarItem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarItem {
    pub icon: Icon,
    pub label: &'static str,
    pub target_route: &'static str,
    pub active: bool,
    pub expanded: bool,
    pub children: Vec<SidebarItem>,
}

/// IdentityBadge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityBadge {
    pub initial: Option<char>,
    pub name: String,
    pub email: String,
}

/// ShellView
///
/// Everything the shell displays for one render. Front-ends draw it; the terminal
/// uses the `Display` impl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellView {
    pub items: Vec<SidebarItem>,
    pub badge: Option<IdentityBadge>,
    /// False only on a small viewport with the sidebar closed.
    pub sidebar_visible: bool,
    /// Whether the menu toggle is offered (small viewports).
    pub show_menu_toggle: bool,
    pub content: String,
}

/// SelectOutcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Navigated(&'static str),
    Toggled { expanded: bool },
    NoSuchEntry,
}

/// DashboardShell
///
/// Holds only presentation state: whether the sidebar is open on a small viewport
/// and which groups are expanded. Navigation entries come from the Role-to-View
/// Resolver on every render, so a role change shows up immediately.
pub struct DashboardShell {
    gateway: AuthGateway,
    navigator: NavigatorState,
    compact: bool,
    sidebar_open: bool,
    expanded: HashSet<&'static str>,
}

impl DashboardShell {
    pub fn new(gateway: AuthGateway, navigator: NavigatorState, compact: bool) -> Self {
        Self {
            gateway,
            navigator,
            compact,
            sidebar_open: false,
            expanded: HashSet::new(),
        }
    }

    pub fn is_compact(&self) -> bool {
        self.compact
    }

    /// Viewport changed size.
    pub fn set_compact(&mut self, compact: bool) {
        self.compact = compact;
        if !compact {
            self.sidebar_open = false;
        }
    }

    pub fn is_sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.sidebar_open = !self.sidebar_open;
        self.sidebar_open
    }

    /// view
    ///
    /// Builds the chrome for `identity` at `route` around `content`. The entry whose
    /// target equals `route` is marked active. A missing identity or an unknown role
    /// yields an empty sidebar.
    pub fn view(
        &self,
        identity: Option<&Identity>,
        route: &str,
        content: impl Into<String>,
    ) -> ShellView {
        let entries = identity
            .map(|identity| navigation_for(&identity.role))
            .unwrap_or(&[]);

        ShellView {
            items: entries
                .iter()
                .map(|entry| self.item(entry, route))
                .collect(),
            badge: identity.map(|identity| IdentityBadge {
                initial: identity.initial(),
                name: identity.name.clone(),
                email: identity.email.clone(),
            }),
            sidebar_visible: !self.compact || self.sidebar_open,
            show_menu_toggle: self.compact,
            content: content.into(),
        }
    }

    fn item(&self, entry: &NavigationEntry, route: &str) -> SidebarItem {
        SidebarItem {
            icon: entry.icon,
            label: entry.label,
            target_route: entry.target_route,
            active: entry.target_route == route,
            expanded: self.expanded.contains(entry.target_route),
            children: entry
                .children
                .iter()
                .map(|child| self.item(child, route))
                .collect(),
        }
    }

    /// select
    ///
    /// Activates the `index`-th (0-based) top-level entry of `identity`'s sidebar.
    pub fn select(&mut self, identity: &Identity, index: usize) -> SelectOutcome {
        match navigation_for(&identity.role).get(index) {
            Some(entry) => self.activate(entry),
            None => SelectOutcome::NoSuchEntry,
        }
    }

    /// activate
    ///
    /// Groups toggle their expansion; links navigate and, on a small viewport,
    /// close the sidebar.
    pub fn activate(&mut self, entry: &'static NavigationEntry) -> SelectOutcome {
        if entry.has_children() {
            let expanded = if self.expanded.remove(entry.target_route) {
                false
            } else {
                self.expanded.insert(entry.target_route);
                true
            };
            return SelectOutcome::Toggled { expanded };
        }

        self.follow(entry.target_route);
        SelectOutcome::Navigated(entry.target_route)
    }

    /// Follows one of the footer links (Settings, Help & Support).
    pub fn follow(&mut self, route: &str) {
        self.navigator.push(route);
        if self.compact {
            self.sidebar_open = false;
        }
    }

    /// sign_out
    ///
    /// The footer's "Sign out" control.
    pub async fn sign_out(&mut self) {
        self.sidebar_open = false;
        self.expanded.clear();
        self.gateway.logout().await;
    }
}

impl fmt::Display for ShellView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "─".repeat(48);

        write!(f, "{}", BRAND)?;
        if self.show_menu_toggle {
            write!(f, "   [menu: {}]", if self.sidebar_visible { "close" } else { "open" })?;
        }
        writeln!(f)?;
        writeln!(f, "{}", rule)?;

        if self.sidebar_visible {
            for (index, item) in self.items.iter().enumerate() {
                write_item(f, item, &format!("{}.", index + 1), 0)?;
            }
            if let Some(badge) = &self.badge {
                writeln!(f)?;
                writeln!(
                    f,
                    "  ({}) {} <{}>",
                    badge.initial.unwrap_or(' '),
                    badge.name,
                    badge.email
                )?;
            }
            let footer: Vec<String> = FOOTER_LINKS
                .iter()
                .map(|(icon, label, _)| format!("{} {}", icon.glyph(), label))
                .chain(std::iter::once(format!("{} Sign out", Icon::LogOut.glyph())))
                .collect();
            writeln!(f, "  {}", footer.join("  ·  "))?;
            writeln!(f, "{}", rule)?;
        }

        writeln!(f, "{}", self.content)
    }
}

fn write_item(
    f: &mut fmt::Formatter<'_>,
    item: &SidebarItem,
    number: &str,
    depth: usize,
) -> fmt::Result {
    let marker = if item.active { '>' } else { ' ' };
    let suffix = match (item.children.is_empty(), item.expanded) {
        (true, _) => "",
        (false, true) => " ▴",
        (false, false) => " ▾",
    };
    writeln!(
        f,
        "{}{} {:>3} {} {}{}",
        "    ".repeat(depth),
        marker,
        number,
        item.icon.glyph(),
        item.label,
        suffix
    )?;
    if item.expanded {
        for child in &item.children {
            write_item(f, child, "-", depth + 1)?;
        }
    }
    Ok(())
}
