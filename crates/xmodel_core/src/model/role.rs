//! Role attribute delegates.
//!
//! # Responsibility
//! - Derive one boolean property per role attribute (`salesRep` -> `isSalesRep`).
//! - Keep every derived property equal to the truthiness of its role attribute.
//!
//! # Invariants
//! - Any change to any watched role recomputes all role properties.
//! - Role/property pairs are fixed configuration, never derived from input.

use crate::model::record::{Attributes, ChangeObserver, Delegates};
use crate::model::value::{is_truthy, NULL};
use log::debug;

/// One role attribute and the derived property that mirrors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleDelegate {
    pub role: &'static str,
    pub property: &'static str,
}

/// Account roles in declaration order.
pub const ACCOUNT_ROLE_DELEGATES: &[RoleDelegate] = &[
    RoleDelegate {
        role: "salesRep",
        property: "isSalesRep",
    },
    RoleDelegate {
        role: "taxAuthority",
        property: "isTaxAuthority",
    },
    RoleDelegate {
        role: "userAccount",
        property: "isUserAccount",
    },
    RoleDelegate {
        role: "competitor",
        property: "isCompetitor",
    },
    RoleDelegate {
        role: "partner",
        property: "isPartner",
    },
];

/// Returns the derived property name for a role attribute.
///
/// `"is"` followed by the role with its first character upper-cased.
pub fn role_property_name(role: &str) -> String {
    let mut chars = role.chars();
    let mut name = String::with_capacity(role.len() + 2);
    name.push_str("is");
    if let Some(first) = chars.next() {
        name.extend(first.to_uppercase());
        name.push_str(chars.as_str());
    }
    name
}

/// Change observer that mirrors role attributes into boolean properties.
#[derive(Debug, Clone, Copy)]
pub struct RoleDelegateSync {
    roles: &'static [RoleDelegate],
}

impl RoleDelegateSync {
    pub const fn new(roles: &'static [RoleDelegate]) -> Self {
        Self { roles }
    }
}

impl ChangeObserver for RoleDelegateSync {
    fn name(&self) -> &'static str {
        "role_delegates"
    }

    fn watches(&self, attribute: &str) -> bool {
        self.roles.iter().any(|delegate| delegate.role == attribute)
    }

    fn sync(&self, attributes: &Attributes, delegates: &mut Delegates) {
        let mut active = 0usize;
        for delegate in self.roles {
            let value = is_truthy(attributes.get(delegate.role).unwrap_or(&NULL));
            if value {
                active += 1;
            }
            delegates.insert(delegate.property.to_string(), value);
        }
        debug!(
            "event=role_sync module=model status=ok roles={} active={}",
            self.roles.len(),
            active
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{role_property_name, RoleDelegateSync, ACCOUNT_ROLE_DELEGATES};
    use crate::model::record::{Attributes, ChangeObserver, Delegates};
    use serde_json::json;

    #[test]
    fn property_names_follow_naming_transform() {
        for delegate in ACCOUNT_ROLE_DELEGATES {
            assert_eq!(role_property_name(delegate.role), delegate.property);
        }
    }

    #[test]
    fn account_roles_keep_declared_order() {
        let roles: Vec<&str> = ACCOUNT_ROLE_DELEGATES.iter().map(|d| d.role).collect();
        assert_eq!(
            roles,
            ["salesRep", "taxAuthority", "userAccount", "competitor", "partner"]
        );
    }

    #[test]
    fn naming_transform_examples() {
        assert_eq!(role_property_name("salesRep"), "isSalesRep");
        assert_eq!(role_property_name("taxAuthority"), "isTaxAuthority");
        assert_eq!(role_property_name("x"), "isX");
        assert_eq!(role_property_name(""), "is");
    }

    #[test]
    fn sync_recomputes_every_role() {
        let sync = RoleDelegateSync::new(ACCOUNT_ROLE_DELEGATES);
        let mut delegates = Delegates::new();
        delegates.insert("isPartner".to_string(), true);

        let attributes = Attributes::from([("competitor".to_string(), json!(1))]);
        sync.sync(&attributes, &mut delegates);

        assert_eq!(delegates.len(), ACCOUNT_ROLE_DELEGATES.len());
        assert_eq!(delegates["isCompetitor"], true);
        assert_eq!(delegates["isPartner"], false);
    }

    #[test]
    fn reports_stable_observer_name() {
        assert_eq!(
            RoleDelegateSync::new(ACCOUNT_ROLE_DELEGATES).name(),
            "role_delegates"
        );
    }

    #[test]
    fn watches_only_role_attributes() {
        let sync = RoleDelegateSync::new(ACCOUNT_ROLE_DELEGATES);
        assert!(sync.watches("userAccount"));
        assert!(!sync.watches("name"));
        assert!(!sync.watches("isUserAccount"));
    }
}
