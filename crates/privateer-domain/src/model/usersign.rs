//! Usersign - The identity a request is evaluated as
//!
//! Every request carries exactly one Usersign. Unauthenticated requests
//! carry the guest usersign; delegated requests carry the usersign of
//! the mapping's owner.

/// Name given to unauthenticated requests
pub const GUEST_NAME: &str = "GUEST";

/// Identity context: user name plus role set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usersign {
    name: String,
    roles: Vec<String>,
}

impl Usersign {
    pub fn new(name: impl Into<String>, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// The unauthenticated identity
    pub fn guest() -> Self {
        Self {
            name: GUEST_NAME.to_string(),
            roles: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn is_guest(&self) -> bool {
        self.name == GUEST_NAME
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl Default for Usersign {
    fn default() -> Self {
        Self::guest()
    }
}

impl core::fmt::Display for Usersign {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest() {
        let guest = Usersign::guest();
        assert!(guest.is_guest());
        assert!(guest.roles().is_empty());
        assert_eq!(Usersign::default(), guest);
    }

    #[test]
    fn test_user_with_roles() {
        let user = Usersign::new("cdent", ["ADMIN", "EDITOR"]);
        assert!(!user.is_guest());
        assert!(user.has_role("ADMIN"));
        assert!(!user.has_role("admin"));
        assert_eq!(user.to_string(), "cdent");
    }
}
