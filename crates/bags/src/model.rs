//! Bags, tiddlers and the policies that guard them

use std::collections::BTreeMap;

use serde::Serialize;

use privateer_domain::Usersign;
use shared::{PolicyConfig, TiddlerConfig};

/// Policy entry that denies everyone
pub const NONE: &str = "NONE";
/// Policy entry that admits any authenticated user
pub const ANY: &str = "ANY";
/// Prefix of a role entry, e.g. `R:ADMIN`
pub const ROLE_PREFIX: &str = "R:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyOp {
    Read,
    Write,
    Create,
    Manage,
    Accept,
}

/// Per-operation constraint lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    pub read: Vec<String>,
    pub write: Vec<String>,
    pub create: Vec<String>,
    pub manage: Vec<String>,
    pub accept: Vec<String>,
}

impl Policy {
    /// Policy that nobody passes, for any operation
    pub fn none() -> Self {
        let deny = vec![NONE.to_string()];
        Self {
            read: deny.clone(),
            write: deny.clone(),
            create: deny.clone(),
            manage: deny.clone(),
            accept: deny,
        }
    }

    pub fn constraint(&self, op: PolicyOp) -> &[String] {
        match op {
            PolicyOp::Read => &self.read,
            PolicyOp::Write => &self.write,
            PolicyOp::Create => &self.create,
            PolicyOp::Manage => &self.manage,
            PolicyOp::Accept => &self.accept,
        }
    }

    pub fn allows(&self, op: PolicyOp, usersign: &Usersign) -> bool {
        permits(self.constraint(op), usersign)
    }
}

impl From<&PolicyConfig> for Policy {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            read: config.read.clone(),
            write: config.write.clone(),
            create: config.create.clone(),
            manage: config.manage.clone(),
            accept: config.accept.clone(),
        }
    }
}

/// Evaluate one constraint list. Empty admits all; `NONE` anywhere denies all.
pub fn permits(constraint: &[String], usersign: &Usersign) -> bool {
    if constraint.is_empty() {
        return true;
    }
    if constraint.iter().any(|entry| entry == NONE) {
        return false;
    }
    constraint.iter().any(|entry| match entry.as_str() {
        ANY => !usersign.is_guest(),
        entry => match entry.strip_prefix(ROLE_PREFIX) {
            Some(role) => usersign.has_role(role),
            None => entry == usersign.name(),
        },
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bag {
    pub name: String,
    pub policy: Policy,
}

impl Bag {
    pub fn new(name: impl Into<String>, policy: Policy) -> Self {
        Self {
            name: name.into(),
            policy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tiddler {
    pub title: String,
    pub bag: String,
    pub text: String,
    pub fields: BTreeMap<String, String>,
}

impl Tiddler {
    pub fn new(title: impl Into<String>, bag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            bag: bag.into(),
            text: text.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn from_config(bag: &str, config: &TiddlerConfig) -> Self {
        Self {
            title: config.title.clone(),
            bag: bag.to_string(),
            text: config.text.clone(),
            fields: config.fields.clone(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Core attributes first, then custom fields
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(&self.title),
            "bag" => Some(&self.bag),
            "text" => Some(&self.text),
            other => self.fields.get(other).map(String::as_str),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, roles: &[&str]) -> Usersign {
        Usersign::new(name, roles.iter().copied())
    }

    fn list(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_empty_constraint_admits_everyone() {
        assert!(permits(&[], &Usersign::guest()));
        assert!(permits(&[], &user("cdent", &[])));
    }

    #[test]
    fn test_named_user() {
        let constraint = list(&["cdent"]);
        assert!(permits(&constraint, &user("cdent", &[])));
        assert!(!permits(&constraint, &user("fnd", &[])));
        assert!(!permits(&constraint, &Usersign::guest()));
    }

    #[test]
    fn test_any_and_roles() {
        assert!(permits(&list(&["ANY"]), &user("fnd", &[])));
        assert!(!permits(&list(&["ANY"]), &Usersign::guest()));

        let admins = list(&["R:ADMIN"]);
        assert!(permits(&admins, &user("fnd", &["ADMIN"])));
        assert!(!permits(&admins, &user("cdent", &[])));
    }

    #[test]
    fn test_none_wins() {
        let constraint = list(&["cdent", "NONE"]);
        assert!(!permits(&constraint, &user("cdent", &["ADMIN"])));
    }

    #[test]
    fn test_policy_none_denies_every_op() {
        let policy = Policy::none();
        let admin = user("cdent", &["ADMIN"]);
        for op in [
            PolicyOp::Read,
            PolicyOp::Write,
            PolicyOp::Create,
            PolicyOp::Manage,
            PolicyOp::Accept,
        ] {
            assert!(!policy.allows(op, &admin));
            assert!(!policy.allows(op, &Usersign::guest()));
        }
    }

    #[test]
    fn test_policy_from_config() {
        let config = PolicyConfig {
            read: list(&["cdent"]),
            ..Default::default()
        };
        let policy = Policy::from(&config);
        assert!(policy.allows(PolicyOp::Read, &user("cdent", &[])));
        assert!(!policy.allows(PolicyOp::Read, &Usersign::guest()));
        assert!(policy.allows(PolicyOp::Write, &Usersign::guest()));
    }

    #[test]
    fn test_tiddler_fields() {
        let tiddler = Tiddler::new("junk", "ho", "i am unique").with_field("tags", "x");
        assert_eq!(tiddler.field("title"), Some("junk"));
        assert_eq!(tiddler.field("bag"), Some("ho"));
        assert_eq!(tiddler.field("text"), Some("i am unique"));
        assert_eq!(tiddler.field("tags"), Some("x"));
        assert_eq!(tiddler.field("missing"), None);
    }
}
