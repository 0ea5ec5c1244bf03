//! Application roles, used for role-based decisions such as export.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of the signed-in user acting on a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Firm attorney managing cases.
    Attorney,
    /// RN case manager coordinating care.
    RnCaseManager,
    /// Injured client.
    Client,
    /// Treating medical provider.
    Provider,
    /// Platform staff with full access.
    SuperAdmin,
    /// Automated actor (lifecycle evaluation, batch jobs).
    System,
}

impl Role {
    /// Convert role to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Attorney => "ATTORNEY",
            Role::RnCaseManager => "RN_CASE_MANAGER",
            Role::Client => "CLIENT",
            Role::Provider => "PROVIDER",
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::System => "SYSTEM",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ATTORNEY" => Ok(Role::Attorney),
            "RN_CASE_MANAGER" => Ok(Role::RnCaseManager),
            "CLIENT" => Ok(Role::Client),
            "PROVIDER" => Ok(Role::Provider),
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "SYSTEM" => Ok(Role::System),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_strings_parse() {
        assert_eq!("RN_CASE_MANAGER".parse::<Role>().unwrap(), Role::RnCaseManager);
        assert_eq!(
            serde_json::from_str::<Role>("\"SUPER_ADMIN\"").unwrap(),
            Role::SuperAdmin
        );
        assert!("rn".parse::<Role>().is_err());
    }
}
