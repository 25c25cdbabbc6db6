use serde::Serialize;

// Everything on the dashboard is placeholder content; nothing here is read
// from the document store.

#[derive(Serialize, Clone, Debug)]
pub struct StatCard {
    pub title: &'static str,
    pub value: u32,
    pub color: &'static str,
}

#[derive(Serialize, Clone, Debug)]
pub struct ActivityEntry {
    pub kind: &'static str,
    pub description: &'static str,
    pub timestamp: &'static str,
    pub email: Option<&'static str>,
}

#[derive(Serialize, Clone, Debug)]
pub struct QuickAction {
    pub title: &'static str,
    pub description: &'static str,
    pub href: Option<&'static str>,
    pub color: &'static str,
}

#[derive(Serialize, Clone, Debug)]
pub struct SystemStatus {
    pub name: &'static str,
    pub status: &'static str,
}

#[derive(Serialize, Clone, Debug)]
pub struct DashboardContent {
    pub stats: Vec<StatCard>,
    pub activity: Vec<ActivityEntry>,
    pub quick_actions: Vec<QuickAction>,
    pub system_status: Vec<SystemStatus>,
}

pub fn placeholder_dashboard() -> DashboardContent {
    DashboardContent {
        stats: vec![
            StatCard { title: "Total Services", value: 12, color: "blue" },
            StatCard { title: "Active Services", value: 8, color: "green" },
            StatCard { title: "Total Users", value: 156, color: "purple" },
            StatCard { title: "New Users (30d)", value: 23, color: "yellow" },
        ],
        activity: vec![
            ActivityEntry {
                kind: "user_signup",
                description: "New user registered",
                timestamp: "2 minutes ago",
                email: Some("user@example.com"),
            },
            ActivityEntry {
                kind: "service_inquiry",
                description: "New service inquiry",
                timestamp: "1 hour ago",
                email: None,
            },
            ActivityEntry {
                kind: "system",
                description: "System update completed",
                timestamp: "3 hours ago",
                email: None,
            },
        ],
        quick_actions: vec![
            QuickAction {
                title: "Add New Service",
                description: "Create a new trading service",
                href: Some("/services/new"),
                color: "blue",
            },
            QuickAction {
                title: "View Analytics",
                description: "Check performance metrics",
                href: None,
                color: "green",
            },
            QuickAction {
                title: "Manage Users",
                description: "View and manage user accounts",
                href: Some("/users"),
                color: "purple",
            },
            QuickAction {
                title: "Support Tickets",
                description: "Handle customer inquiries",
                href: None,
                color: "yellow",
            },
        ],
        system_status: vec![
            SystemStatus { name: "Database", status: "operational" },
            SystemStatus { name: "API Services", status: "operational" },
            SystemStatus { name: "Website", status: "operational" },
        ],
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct SettingsSection {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub static SETTINGS_SECTIONS: [SettingsSection; 3] = [
    SettingsSection {
        id: "general",
        title: "General Settings",
        description: "Configure general application settings",
    },
    SettingsSection {
        id: "security",
        title: "Security",
        description: "Update security and authentication settings",
    },
    SettingsSection {
        id: "notifications",
        title: "Notifications",
        description: "Manage notification preferences",
    },
];

/// Unknown or missing section ids fall back to "general".
pub fn settings_section(requested: Option<&str>) -> &'static SettingsSection {
    requested
        .and_then(|id| SETTINGS_SECTIONS.iter().find(|s| s.id == id))
        .unwrap_or(&SETTINGS_SECTIONS[0])
}
