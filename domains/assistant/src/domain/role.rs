//! Sender role

use serde::{Deserialize, Serialize};

/// Privilege of a sender within one tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SenderRole {
    AdminOrStaff,
    #[default]
    Customer,
}

impl SenderRole {
    /// Role of a sender given the matching tenant user's role, if any
    pub fn from_user_role(role: Option<&str>) -> Self {
        match role.map(|r| r.trim().to_ascii_lowercase()) {
            Some(r) if r == "admin" || r == "staff" => SenderRole::AdminOrStaff,
            _ => SenderRole::Customer,
        }
    }

    pub fn is_privileged(&self) -> bool {
        matches!(self, SenderRole::AdminOrStaff)
    }
}
