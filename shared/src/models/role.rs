//! Role Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::menu::ItemCategory;

/// Staff role (岗位)
///
/// Every dashboard session carries exactly one role; what it may see and do
/// is derived from the role alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Waiter,
    Kitchen,
    Bar,
    Cashier,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Waiter,
        Role::Kitchen,
        Role::Bar,
        Role::Cashier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Waiter => "WAITER",
            Role::Kitchen => "KITCHEN",
            Role::Bar => "BAR",
            Role::Cashier => "CASHIER",
        }
    }

    /// Preparation station this role works at, if any.
    ///
    /// Station roles only ever see and touch items of their own category.
    pub fn station(&self) -> Option<ItemCategory> {
        match self {
            Role::Kitchen => Some(ItemCategory::Kitchen),
            Role::Bar => Some(ItemCategory::Bar),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "WAITER" => Ok(Role::Waiter),
            "KITCHEN" => Ok(Role::Kitchen),
            "BAR" => Ok(Role::Bar),
            "CASHIER" => Ok(Role::Cashier),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!("kitchen".parse::<Role>().unwrap(), Role::Kitchen);
        assert!("chef".parse::<Role>().is_err());
    }

    #[test]
    fn test_only_station_roles_have_station() {
        assert_eq!(Role::Kitchen.station(), Some(ItemCategory::Kitchen));
        assert_eq!(Role::Bar.station(), Some(ItemCategory::Bar));
        assert_eq!(Role::Waiter.station(), None);
        assert_eq!(Role::Admin.station(), None);
        assert_eq!(Role::Cashier.station(), None);
    }
}
