//! Declarative record type descriptors.
//!
//! # Responsibility
//! - Describe attributes, relationships and privileges of one record type.
//! - Decide whether a value fits the declared kind of an attribute.
//!
//! # Invariants
//! - Attribute names are unique within a record type.
//! - Every required attribute is a declared attribute.
//! - `Null` is accepted by every attribute kind.

use crate::model::context::ModelContext;
use crate::model::record::{Attributes, ChangeObserver, Record, RecordValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Name of the primary key attribute shared by every record type.
pub const GUID_ATTRIBUTE: &str = "guid";

/// Scalar value type of a plain attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Number,
    String,
    Boolean,
    /// ISO-8601 text.
    Date,
    /// Accepts any value; used for flag-like attributes holding nested data.
    Any,
}

/// Shape of one declared attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    /// Scalar attribute.
    Attr(ValueType),
    /// Single reference. `is_nested` marks an owned sub-record.
    ToOne { target: String, is_nested: bool },
    /// Collection of references.
    ToMany { target: String, is_nested: bool },
}

impl AttributeKind {
    /// Returns whether `value` may be stored under this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            Self::Attr(ValueType::Any) => true,
            Self::Attr(ValueType::Number) => value.is_number(),
            Self::Attr(ValueType::String) | Self::Attr(ValueType::Date) => value.is_string(),
            Self::Attr(ValueType::Boolean) => value.is_boolean(),
            Self::ToOne { .. } => value.is_object() || value.is_number() || value.is_string(),
            Self::ToMany { .. } => value.is_array(),
        }
    }

    /// Short kind label used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Attr(value_type) => format!("{value_type:?}").to_ascii_lowercase(),
            Self::ToOne { target, .. } => format!("to_one({target})"),
            Self::ToMany { target, .. } => format!("to_many({target})"),
        }
    }
}

/// One declared attribute of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDef {
    pub name: String,
    pub kind: AttributeKind,
    /// Label key resolved by the UI layer, e.g. `_purpose`.
    pub label: Option<String>,
}

impl AttributeDef {
    /// Numeric primary key. Carries no label.
    pub fn guid() -> Self {
        Self {
            name: GUID_ATTRIBUTE.to_string(),
            kind: AttributeKind::Attr(ValueType::Number),
            label: None,
        }
    }

    pub fn attr(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::labelled(name.into(), AttributeKind::Attr(value_type))
    }

    pub fn to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::labelled(
            name.into(),
            AttributeKind::ToOne {
                target: target.into(),
                is_nested: false,
            },
        )
    }

    /// Single reference to an owned sub-record.
    pub fn nested(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::labelled(
            name.into(),
            AttributeKind::ToOne {
                target: target.into(),
                is_nested: true,
            },
        )
    }

    pub fn to_many(name: impl Into<String>, target: impl Into<String>, is_nested: bool) -> Self {
        Self::labelled(
            name.into(),
            AttributeKind::ToMany {
                target: target.into(),
                is_nested,
            },
        )
    }

    fn labelled(name: String, kind: AttributeKind) -> Self {
        let label = Some(format!("_{name}"));
        Self { name, kind, label }
    }
}

/// Record-level operation guarded by privileges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Create/read/update/delete flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrudPrivileges {
    pub create: bool,
    pub read: bool,
    pub update: bool,
    pub delete: bool,
}

impl CrudPrivileges {
    pub const FULL: Self = Self {
        create: true,
        read: true,
        update: true,
        delete: true,
    };

    pub const READ_ONLY: Self = Self {
        create: false,
        read: true,
        update: false,
        delete: false,
    };

    /// Attach-and-detach only: rows may be created and deleted, never edited.
    pub const NO_UPDATE: Self = Self {
        create: true,
        read: true,
        update: false,
        delete: true,
    };
}

/// Privilege table keyed by grant scope.
///
/// Serialized as `{"all": {"create": .., "read": .., "update": .., "delete": ..}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeTable {
    pub all: CrudPrivileges,
}

impl PrivilegeTable {
    pub const fn new(all: CrudPrivileges) -> Self {
        Self { all }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Create => self.all.create,
            Action::Read => self.all.read,
            Action::Update => self.all.update,
            Action::Delete => self.all.delete,
        }
    }
}

impl Default for PrivilegeTable {
    fn default() -> Self {
        Self::new(CrudPrivileges::FULL)
    }
}

/// Computes default attribute values for a freshly created record.
pub type DefaultsFn = fn(&ModelContext) -> Attributes;

/// Rejects a pending edit before any attribute is applied.
pub type EditValidator = fn(&Record, &[(String, Value)]) -> Result<(), RecordValidationError>;

/// Invalid record type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    DuplicateAttribute { class_name: String, attribute: String },
    UndeclaredRequired { class_name: String, attribute: String },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateAttribute {
                class_name,
                attribute,
            } => write!(f, "{class_name} declares `{attribute}` more than once"),
            Self::UndeclaredRequired {
                class_name,
                attribute,
            } => write!(
                f,
                "{class_name} requires `{attribute}` but does not declare it"
            ),
        }
    }
}

impl Error for SchemaError {}

/// Descriptor of one record type.
pub struct RecordType {
    class_name: String,
    nested_record_namespace: bool,
    privileges: PrivilegeTable,
    attributes: Vec<AttributeDef>,
    required_attributes: Vec<String>,
    defaults: Option<DefaultsFn>,
    edit_validator: Option<EditValidator>,
    number_policy_setting: Option<&'static str>,
    source_name: Option<&'static str>,
    editable_model: Option<&'static str>,
    description_key: Option<&'static str>,
    is_document_assignment: bool,
    observers: Vec<Arc<dyn ChangeObserver>>,
}

impl RecordType {
    pub fn builder(class_name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder {
            inner: RecordType {
                class_name: class_name.into(),
                nested_record_namespace: false,
                privileges: PrivilegeTable::default(),
                attributes: vec![AttributeDef::guid()],
                required_attributes: Vec::new(),
                defaults: None,
                edit_validator: None,
                number_policy_setting: None,
                source_name: None,
                editable_model: None,
                description_key: None,
                is_document_assignment: false,
                observers: Vec::new(),
            },
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Whether nested records resolve their types in the shared namespace.
    pub fn nested_record_namespace(&self) -> bool {
        self.nested_record_namespace
    }

    pub fn privileges(&self) -> &PrivilegeTable {
        &self.privileges
    }

    pub fn allows(&self, action: Action) -> bool {
        self.privileges.allows(action)
    }

    pub fn attributes(&self) -> &[AttributeDef] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    pub fn required_attributes(&self) -> &[String] {
        &self.required_attributes
    }

    pub fn defaults(&self, context: &ModelContext) -> Attributes {
        self.defaults.map(|f| f(context)).unwrap_or_default()
    }

    pub(crate) fn edit_validator(&self) -> Option<EditValidator> {
        self.edit_validator
    }

    /// Settings key that selects the document number policy.
    pub fn number_policy_setting(&self) -> Option<&'static str> {
        self.number_policy_setting
    }

    /// Comment source code, e.g. `CRMA` for account comments.
    pub fn source_name(&self) -> Option<&'static str> {
        self.source_name
    }

    /// Editable record type behind a read-only info type.
    pub fn editable_model(&self) -> Option<&'static str> {
        self.editable_model
    }

    pub fn description_key(&self) -> Option<&'static str> {
        self.description_key
    }

    pub fn is_document_assignment(&self) -> bool {
        self.is_document_assignment
    }

    pub fn observers(&self) -> &[Arc<dyn ChangeObserver>] {
        &self.observers
    }
}

impl Debug for RecordType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordType")
            .field("class_name", &self.class_name)
            .field("privileges", &self.privileges)
            .field("attributes", &self.attributes.len())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

/// Consuming builder for [`RecordType`].
pub struct RecordTypeBuilder {
    inner: RecordType,
}

impl RecordTypeBuilder {
    pub fn nested_record_namespace(mut self) -> Self {
        self.inner.nested_record_namespace = true;
        self
    }

    pub fn privileges(mut self, all: CrudPrivileges) -> Self {
        self.inner.privileges = PrivilegeTable::new(all);
        self
    }

    pub fn attribute(mut self, attribute: AttributeDef) -> Self {
        self.inner.attributes.push(attribute);
        self
    }

    pub fn required(mut self, names: &[&str]) -> Self {
        self.inner
            .required_attributes
            .extend(names.iter().map(|name| name.to_string()));
        self
    }

    pub fn defaults(mut self, defaults: DefaultsFn) -> Self {
        self.inner.defaults = Some(defaults);
        self
    }

    pub fn edit_validator(mut self, validator: EditValidator) -> Self {
        self.inner.edit_validator = Some(validator);
        self
    }

    pub fn number_policy_setting(mut self, key: &'static str) -> Self {
        self.inner.number_policy_setting = Some(key);
        self
    }

    pub fn source_name(mut self, name: &'static str) -> Self {
        self.inner.source_name = Some(name);
        self
    }

    pub fn editable_model(mut self, class_name: &'static str) -> Self {
        self.inner.editable_model = Some(class_name);
        self
    }

    pub fn description_key(mut self, key: &'static str) -> Self {
        self.inner.description_key = Some(key);
        self
    }

    pub fn document_assignment(mut self) -> Self {
        self.inner.is_document_assignment = true;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ChangeObserver>) -> Self {
        self.inner.observers.push(observer);
        self
    }

    /// Finishes the declaration.
    ///
    /// # Errors
    /// - `DuplicateAttribute` when two attributes share a name.
    /// - `UndeclaredRequired` when a required name is not an attribute.
    pub fn build(self) -> Result<RecordType, SchemaError> {
        let record_type = self.inner;
        for (index, attribute) in record_type.attributes.iter().enumerate() {
            if record_type.attributes[..index]
                .iter()
                .any(|earlier| earlier.name == attribute.name)
            {
                return Err(SchemaError::DuplicateAttribute {
                    class_name: record_type.class_name.clone(),
                    attribute: attribute.name.clone(),
                });
            }
        }
        for required in &record_type.required_attributes {
            if record_type.attribute(required).is_none() {
                return Err(SchemaError::UndeclaredRequired {
                    class_name: record_type.class_name.clone(),
                    attribute: required.clone(),
                });
            }
        }
        Ok(record_type)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Action, AttributeDef, AttributeKind, CrudPrivileges, PrivilegeTable, RecordType,
        SchemaError, ValueType,
    };
    use serde_json::json;

    #[test]
    fn null_fits_every_kind() {
        let kinds = [
            AttributeKind::Attr(ValueType::Number),
            AttributeKind::Attr(ValueType::Boolean),
            AttributeDef::nested("file", "XM.FileInfo").kind,
            AttributeDef::to_many("comments", "XM.AccountComment", true).kind,
        ];
        for kind in kinds {
            assert!(kind.accepts(&json!(null)), "{kind:?} should accept null");
        }
    }

    #[test]
    fn scalar_kinds_reject_mismatched_values() {
        assert!(!AttributeKind::Attr(ValueType::Number).accepts(&json!("12")));
        assert!(!AttributeKind::Attr(ValueType::String).accepts(&json!(12)));
        assert!(!AttributeKind::Attr(ValueType::Boolean).accepts(&json!(1)));
        assert!(AttributeKind::Attr(ValueType::Date).accepts(&json!("2012-06-01")));
        assert!(AttributeKind::Attr(ValueType::Any).accepts(&json!({"nested": true})));
    }

    #[test]
    fn to_one_accepts_object_or_key() {
        let kind = AttributeDef::to_one("source", "XM.Customer").kind;
        assert!(kind.accepts(&json!({"id": 1})));
        assert!(kind.accepts(&json!(1)));
        assert!(kind.accepts(&json!("C-100")));
        assert!(!kind.accepts(&json!([1])));
    }

    #[test]
    fn labels_default_to_underscored_name() {
        assert_eq!(
            AttributeDef::attr("purpose", ValueType::String).label.as_deref(),
            Some("_purpose")
        );
        assert_eq!(AttributeDef::guid().label, None);
    }

    #[test]
    fn privilege_table_serializes_in_scope_shape() {
        let table = PrivilegeTable::new(CrudPrivileges::NO_UPDATE);
        assert_eq!(
            serde_json::to_value(table).unwrap(),
            json!({"all": {"create": true, "read": true, "update": false, "delete": true}})
        );
        assert!(table.allows(Action::Delete));
        assert!(!table.allows(Action::Update));
    }

    #[test]
    fn build_rejects_duplicate_attributes() {
        let err = RecordType::builder("XM.Broken")
            .attribute(AttributeDef::attr("name", ValueType::String))
            .attribute(AttributeDef::attr("name", ValueType::String))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateAttribute {
                class_name: "XM.Broken".to_string(),
                attribute: "name".to_string(),
            }
        );
    }

    #[test]
    fn build_rejects_undeclared_required_attribute() {
        let err = RecordType::builder("XM.Broken")
            .required(&["number"])
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UndeclaredRequired { .. }));
    }

    #[test]
    fn builder_always_declares_guid() {
        let record_type = RecordType::builder("XM.Plain").build().unwrap();
        assert!(record_type.attribute("guid").is_some());
        assert_eq!(record_type.attributes().len(), 1);
    }
}
