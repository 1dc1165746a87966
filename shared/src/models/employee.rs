//! Staff Model

use serde::{Deserialize, Serialize};

use super::role::Role;

/// Staff member (员工)
///
/// Lifecycle is managed outside the order core; only identity and role are
/// read from it. Dashboards only ever receive [`StaffIdentity`], never the PIN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub pin: String,
}

impl Staff {
    pub fn identity(&self) -> StaffIdentity {
        StaffIdentity {
            id: self.id.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// Authenticated staff identity attached to every mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffIdentity {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl StaffIdentity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }
}
