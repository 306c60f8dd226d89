//! Account record family.
//!
//! # Responsibility
//! - Declare `XM.Account` with its defaults, required attributes and role
//!   delegates.
//! - Declare the comment, assignment and info types that hang off accounts.
//!
//! # Invariants
//! - An account can never be its own parent (`xt2006`).
//! - `isSalesRep`, `isTaxAuthority`, `isUserAccount`, `isCompetitor` and
//!   `isPartner` always mirror their role attributes.

use crate::model::context::ModelContext;
use crate::model::record::{Attributes, Record, RecordValidationError};
use crate::model::role::{RoleDelegateSync, ACCOUNT_ROLE_DELEGATES};
use crate::model::schema::{AttributeDef, CrudPrivileges, RecordType, SchemaError, ValueType};
use serde_json::Value;
use std::sync::Arc;

pub const ACCOUNT: &str = "XM.Account";
pub const ACCOUNT_COMMENT: &str = "XM.AccountComment";
pub const ACCOUNT_RELATION: &str = "XM.AccountRelation";
pub const ACCOUNT_LIST_ITEM: &str = "XM.AccountListItem";
pub const ACCOUNT_CHARACTERISTIC: &str = "XM.AccountCharacteristic";
pub const ACCOUNT_LIST_ITEM_CHARACTERISTIC: &str = "XM.AccountListItemCharacteristic";
pub const ACCOUNT_ADDRESS_LIST_ITEM: &str = "XM.AccountAddressListItem";

/// Settings key selecting manual/automatic account numbering.
pub const ACCOUNT_NUMBER_POLICY_SETTING: &str = "CRMAccountNumberGeneration";

/// Account type code for organizations.
pub const ORGANIZATION_ACCOUNT_TYPE: &str = "O";

/// `(class name, attribute, target type)` for document assignment types.
const DOCUMENT_ASSIGNMENTS: &[(&str, &str, &str)] = &[
    ("XM.AccountAccount", "account", "XM.AccountInfo"),
    ("XM.AccountContact", "contact", "XM.ContactInfo"),
    ("XM.AccountIncident", "incident", "XM.IncidentInfo"),
    ("XM.AccountItem", "item", "XM.ItemInfo"),
    ("XM.AccountFile", "file", "XM.FileInfo"),
    ("XM.AccountUrl", "url", "XM.Url"),
    ("XM.AccountProject", "project", "XM.ProjectInfo"),
];

/// Declares the account type and every related type.
pub fn account_record_types() -> Result<Vec<RecordType>, SchemaError> {
    let mut types = vec![
        account()?,
        account_comment()?,
        account_characteristic()?,
        account_relation()?,
        account_list_item()?,
        account_list_item_characteristic()?,
        account_address_list_item()?,
    ];
    for (class_name, attribute, target) in DOCUMENT_ASSIGNMENTS {
        types.push(document_assignment(class_name, attribute, target)?);
    }
    Ok(types)
}

fn account() -> Result<RecordType, SchemaError> {
    let mut builder = RecordType::builder(ACCOUNT)
        .attribute(AttributeDef::attr("number", ValueType::String))
        .attribute(AttributeDef::attr("name", ValueType::String))
        .attribute(AttributeDef::attr("isActive", ValueType::Boolean))
        .attribute(AttributeDef::attr("accountType", ValueType::String))
        .attribute(AttributeDef::to_one("owner", "XM.UserAccountInfo"))
        .attribute(AttributeDef::to_one("parent", "XM.AccountInfo"))
        .attribute(AttributeDef::nested("primaryContact", "XM.ContactInfo"))
        .attribute(AttributeDef::attr("notes", ValueType::String))
        .attribute(AttributeDef::to_many("comments", ACCOUNT_COMMENT, true))
        .attribute(AttributeDef::to_many(
            "characteristics",
            ACCOUNT_CHARACTERISTIC,
            true,
        ));
    for delegate in ACCOUNT_ROLE_DELEGATES {
        builder = builder.attribute(AttributeDef::attr(delegate.role, ValueType::Any));
    }
    builder
        .required(&["accountType", "isActive", "number", "name"])
        .defaults(account_defaults)
        .edit_validator(validate_account_edit)
        .number_policy_setting(ACCOUNT_NUMBER_POLICY_SETTING)
        .observer(Arc::new(RoleDelegateSync::new(ACCOUNT_ROLE_DELEGATES)))
        .build()
}

fn account_defaults(context: &ModelContext) -> Attributes {
    let owner = context
        .current_user
        .clone()
        .map_or(Value::Null, Value::String);
    Attributes::from([
        ("owner".to_string(), owner),
        ("isActive".to_string(), Value::Bool(true)),
        (
            "accountType".to_string(),
            Value::String(ORGANIZATION_ACCOUNT_TYPE.to_string()),
        ),
    ])
}

fn validate_account_edit(
    record: &Record,
    pending: &[(String, Value)],
) -> Result<(), RecordValidationError> {
    let own_id = record.id().to_string();
    let self_parent = pending
        .iter()
        .filter(|(name, _)| name == "parent")
        .any(|(_, value)| reference_id(value).as_deref() == Some(own_id.as_str()));
    if self_parent {
        return Err(RecordValidationError::SelfParent);
    }
    Ok(())
}

/// Extracts the referenced id from `{"id": ..}` or a bare key.
pub(crate) fn reference_id(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map.get("id").and_then(reference_id),
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn account_comment() -> Result<RecordType, SchemaError> {
    RecordType::builder(ACCOUNT_COMMENT)
        .nested_record_namespace()
        .privileges(CrudPrivileges::NO_UPDATE)
        .attribute(AttributeDef::to_one("source", ACCOUNT))
        .attribute(AttributeDef::attr("commentType", ValueType::String))
        .attribute(AttributeDef::attr("text", ValueType::String))
        .attribute(AttributeDef::attr("isPublic", ValueType::Boolean))
        .attribute(AttributeDef::attr("createdBy", ValueType::String))
        .attribute(AttributeDef::attr("created", ValueType::Date))
        .source_name("CRMA")
        .build()
}

fn account_characteristic() -> Result<RecordType, SchemaError> {
    RecordType::builder(ACCOUNT_CHARACTERISTIC)
        .nested_record_namespace()
        .attribute(AttributeDef::to_one("source", ACCOUNT))
        .attribute(AttributeDef::to_one("characteristic", "XM.Characteristic"))
        .attribute(AttributeDef::attr("value", ValueType::String))
        .build()
}

fn account_relation() -> Result<RecordType, SchemaError> {
    RecordType::builder(ACCOUNT_RELATION)
        .privileges(CrudPrivileges::READ_ONLY)
        .attribute(AttributeDef::attr("number", ValueType::String))
        .attribute(AttributeDef::attr("name", ValueType::String))
        .attribute(AttributeDef::attr("isActive", ValueType::Boolean))
        .editable_model(ACCOUNT)
        .description_key("name")
        .build()
}

fn account_list_item() -> Result<RecordType, SchemaError> {
    RecordType::builder(ACCOUNT_LIST_ITEM)
        .privileges(CrudPrivileges::READ_ONLY)
        .attribute(AttributeDef::attr("number", ValueType::String))
        .attribute(AttributeDef::attr("name", ValueType::String))
        .attribute(AttributeDef::attr("isActive", ValueType::Boolean))
        .attribute(AttributeDef::attr("accountType", ValueType::String))
        .attribute(AttributeDef::to_one("owner", "XM.UserAccountInfo"))
        .attribute(AttributeDef::nested("primaryContact", "XM.ContactInfo"))
        .attribute(AttributeDef::to_many(
            "characteristics",
            ACCOUNT_LIST_ITEM_CHARACTERISTIC,
            true,
        ))
        .editable_model(ACCOUNT)
        .build()
}

fn account_list_item_characteristic() -> Result<RecordType, SchemaError> {
    RecordType::builder(ACCOUNT_LIST_ITEM_CHARACTERISTIC)
        .nested_record_namespace()
        .privileges(CrudPrivileges::READ_ONLY)
        .attribute(AttributeDef::to_one("source", ACCOUNT_LIST_ITEM))
        .attribute(AttributeDef::to_one("characteristic", "XM.Characteristic"))
        .attribute(AttributeDef::attr("value", ValueType::String))
        .build()
}

// Address rows shown in account pickers; the address itself is owned elsewhere.
fn account_address_list_item() -> Result<RecordType, SchemaError> {
    RecordType::builder(ACCOUNT_ADDRESS_LIST_ITEM)
        .privileges(CrudPrivileges::READ_ONLY)
        .attribute(AttributeDef::to_one("account", ACCOUNT))
        .attribute(AttributeDef::nested("address", "XM.AddressInfo"))
        .attribute(AttributeDef::attr("isPrimary", ValueType::Boolean))
        .build()
}

fn document_assignment(
    class_name: &str,
    attribute: &str,
    target: &str,
) -> Result<RecordType, SchemaError> {
    RecordType::builder(class_name)
        .nested_record_namespace()
        .privileges(CrudPrivileges::NO_UPDATE)
        .attribute(AttributeDef::to_one("source", ACCOUNT))
        .attribute(AttributeDef::nested(attribute, target))
        .attribute(AttributeDef::attr("purpose", ValueType::String))
        .document_assignment()
        .build()
}

#[cfg(test)]
mod tests {
    use super::{account_record_types, reference_id, ACCOUNT, ACCOUNT_NUMBER_POLICY_SETTING};
    use crate::model::schema::Action;
    use serde_json::json;

    #[test]
    fn declares_account_family() {
        let types = account_record_types().unwrap();
        let names: Vec<&str> = types.iter().map(|t| t.class_name()).collect();
        assert!(names.contains(&ACCOUNT));
        assert!(names.contains(&"XM.AccountComment"));
        assert!(names.contains(&"XM.AccountProject"));
        assert!(names.contains(&"XM.AccountCharacteristic"));
        assert!(names.contains(&"XM.AccountListItemCharacteristic"));
        assert!(names.contains(&"XM.AccountAddressListItem"));
        assert_eq!(types.len(), 14);
        assert_eq!(
            types
                .iter()
                .filter(|record_type| record_type.is_document_assignment())
                .count(),
            7
        );
    }

    #[test]
    fn account_declares_roles_and_number_policy() {
        let types = account_record_types().unwrap();
        let account = types.iter().find(|t| t.class_name() == ACCOUNT).unwrap();
        for role in ["salesRep", "taxAuthority", "userAccount", "competitor", "partner"] {
            assert!(account.attribute(role).is_some(), "missing role {role}");
        }
        assert_eq!(
            account.number_policy_setting(),
            Some(ACCOUNT_NUMBER_POLICY_SETTING)
        );
        assert_eq!(account.observers().len(), 1);
    }

    #[test]
    fn list_projections_are_read_only() {
        let types = account_record_types().unwrap();
        for name in [
            "XM.AccountListItem",
            "XM.AccountListItemCharacteristic",
            "XM.AccountAddressListItem",
        ] {
            let record_type = types.iter().find(|t| t.class_name() == name).unwrap();
            assert!(record_type.allows(Action::Read), "{name}");
            assert!(!record_type.allows(Action::Create), "{name}");
        }
    }

    #[test]
    fn comment_source_name_is_crma() {
        let types = account_record_types().unwrap();
        let comment = types
            .iter()
            .find(|t| t.class_name() == "XM.AccountComment")
            .unwrap();
        assert_eq!(comment.source_name(), Some("CRMA"));
    }

    #[test]
    fn reference_id_reads_objects_and_keys() {
        assert_eq!(reference_id(&json!({"id": "abc"})).as_deref(), Some("abc"));
        assert_eq!(reference_id(&json!({"id": 12})).as_deref(), Some("12"));
        assert_eq!(reference_id(&json!("abc")).as_deref(), Some("abc"));
        assert_eq!(reference_id(&json!({"name": "x"})), None);
        assert_eq!(reference_id(&json!(null)), None);
    }
}
