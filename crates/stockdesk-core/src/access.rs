//! # Access Module
//!
//! Role-gated navigation. Decides what the client SHOWS; the backend decides
//! what is ALLOWED.
//!
//! ## Capability Sets
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Role        Capabilities                                               │
//! │  ────        ────────────                                               │
//! │  Admin   ──► everything                                                 │
//! │  Manager ──► everything except shops and users                          │
//! │  Staff   ──► record sales, view sales, manage customers                 │
//! │                                                                         │
//! │  NavSection ──► required_capability() ──► Role::can() ──► visible?      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Something a user may do in the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    RecordSales,
    ViewSales,
    ManageProducts,
    ManageBatches,
    ManageCustomers,
    ManageCategories,
    ManageRestockRules,
    ViewReports,
    ViewForecasts,
    ManageShops,
    ManageUsers,
}

const ADMIN: &[Capability] = &[
    Capability::RecordSales,
    Capability::ViewSales,
    Capability::ManageProducts,
    Capability::ManageBatches,
    Capability::ManageCustomers,
    Capability::ManageCategories,
    Capability::ManageRestockRules,
    Capability::ViewReports,
    Capability::ViewForecasts,
    Capability::ManageShops,
    Capability::ManageUsers,
];

const MANAGER: &[Capability] = &[
    Capability::RecordSales,
    Capability::ViewSales,
    Capability::ManageProducts,
    Capability::ManageBatches,
    Capability::ManageCustomers,
    Capability::ManageCategories,
    Capability::ManageRestockRules,
    Capability::ViewReports,
    Capability::ViewForecasts,
];

const STAFF: &[Capability] = &[
    Capability::RecordSales,
    Capability::ViewSales,
    Capability::ManageCustomers,
];

/// The signed-in user's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    Staff,
}

impl Role {
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::Admin => ADMIN,
            Role::Manager => MANAGER,
            Role::Staff => STAFF,
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Manager => write!(f, "manager"),
            Role::Staff => write!(f, "staff"),
        }
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "staff" => Ok(Role::Staff),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["admin".into(), "manager".into(), "staff".into()],
            }),
        }
    }
}

/// Top-level navigation entries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavSection {
    Dashboard,
    NewSale,
    Sales,
    Products,
    Batches,
    Customers,
    Categories,
    RestockRules,
    Reports,
    Forecasts,
    Shops,
    Users,
}

impl NavSection {
    pub const ALL: [NavSection; 12] = [
        NavSection::Dashboard,
        NavSection::NewSale,
        NavSection::Sales,
        NavSection::Products,
        NavSection::Batches,
        NavSection::Customers,
        NavSection::Categories,
        NavSection::RestockRules,
        NavSection::Reports,
        NavSection::Forecasts,
        NavSection::Shops,
        NavSection::Users,
    ];

    /// `None` means every signed-in user sees it.
    pub fn required_capability(&self) -> Option<Capability> {
        match self {
            NavSection::Dashboard => None,
            NavSection::NewSale => Some(Capability::RecordSales),
            NavSection::Sales => Some(Capability::ViewSales),
            NavSection::Products => Some(Capability::ManageProducts),
            NavSection::Batches => Some(Capability::ManageBatches),
            NavSection::Customers => Some(Capability::ManageCustomers),
            NavSection::Categories => Some(Capability::ManageCategories),
            NavSection::RestockRules => Some(Capability::ManageRestockRules),
            NavSection::Reports => Some(Capability::ViewReports),
            NavSection::Forecasts => Some(Capability::ViewForecasts),
            NavSection::Shops => Some(Capability::ManageShops),
            NavSection::Users => Some(Capability::ManageUsers),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            NavSection::Dashboard => "Dashboard",
            NavSection::NewSale => "New Sale",
            NavSection::Sales => "Sales",
            NavSection::Products => "Products",
            NavSection::Batches => "Batches",
            NavSection::Customers => "Customers",
            NavSection::Categories => "Categories",
            NavSection::RestockRules => "Restock Rules",
            NavSection::Reports => "Reports",
            NavSection::Forecasts => "Forecasts",
            NavSection::Shops => "Shops",
            NavSection::Users => "Users",
        }
    }

    pub fn is_visible_to(&self, role: Role) -> bool {
        self.required_capability().map_or(true, |cap| role.can(cap))
    }
}

/// Sections `role` should see, in display order.
pub fn visible_sections(role: Role) -> Vec<NavSection> {
    NavSection::ALL
        .iter()
        .copied()
        .filter(|section| section.is_visible_to(role))
        .collect()
}
