//! Role and status enums shared with the backend.

use serde::{Deserialize, Serialize};

/// Account role.
///
/// Assigned at registration. The backend holds the authoritative copy; the
/// client only caches the value the backend reports at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Shops, checks out, submits recycle items.
    #[default]
    Customer,
    /// Manages products on the seller dashboard.
    Seller,
    /// Reviews recycle submissions and users.
    Admin,
}

impl Role {
    /// All roles, in registration-form order.
    pub const ALL: [Self; 3] = [Self::Customer, Self::Seller, Self::Admin];

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Review status of a recycle-program submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RecycleStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RecycleStatus {
    /// Whether an admin has already decided on the item.
    #[must_use]
    pub const fn is_decided(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for RecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Approved => write!(f, "Approved"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Decision an admin can record on a pending recycle item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecycleDecision {
    Approved,
    Rejected,
}

impl From<RecycleDecision> for RecycleStatus {
    fn from(decision: RecycleDecision) -> Self {
        match decision {
            RecycleDecision::Approved => Self::Approved,
            RecycleDecision::Rejected => Self::Rejected,
        }
    }
}
