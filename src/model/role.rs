use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Authorization class of a user. Stored as its lowercase name.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    #[default]
    Employee,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Admin => "admin",
        }
    }

    /// Whether an identity holding `self` may pass a gate requiring `required`.
    pub fn satisfies(self, required: Role) -> bool {
        match required {
            Role::Admin => matches!(self, Role::Admin),
            Role::Employee => matches!(self, Role::Employee),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_names() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("employee".parse::<Role>().unwrap(), Role::Employee);
        assert!("Admin".parse::<Role>().is_err());
        assert!("hr".parse::<Role>().is_err());
    }

    #[test]
    fn display_matches_storage() {
        assert_eq!(Role::Admin.to_string(), Role::Admin.as_str());
        assert_eq!(Role::Employee.to_string(), Role::Employee.as_str());
    }

    #[test]
    fn gate_requires_exact_role() {
        assert!(Role::Admin.satisfies(Role::Admin));
        assert!(!Role::Employee.satisfies(Role::Admin));
        assert!(Role::Employee.satisfies(Role::Employee));
        assert!(!Role::Admin.satisfies(Role::Employee));
    }
}
