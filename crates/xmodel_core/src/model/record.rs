//! Record instances and attribute change notification.
//!
//! # Responsibility
//! - Hold attribute state for one record of a declared record type.
//! - Apply single and bulk attribute updates atomically.
//! - Notify change observers once per update and keep derived delegates current.
//!
//! # Invariants
//! - A record is returned from its constructor only after every observer ran
//!   its first synchronization pass.
//! - Observers read attributes and write delegates only; delegate writes never
//!   count as attribute changes.
//! - A rejected update leaves attributes and delegates untouched.

use crate::model::context::ModelContext;
use crate::model::schema::{Action, RecordType};
use crate::model::value::NULL;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Opaque client-side identity, unique within a record type.
pub type RecordId = Uuid;

/// Attribute name to current value.
pub type Attributes = BTreeMap<String, Value>;

/// Derived property name to boolean value.
pub type Delegates = BTreeMap<String, bool>;

pub type RecordResult<T> = Result<T, RecordError>;

/// Derives delegate properties from attribute state.
///
/// Implementations must be total: `sync` has no error path.
pub trait ChangeObserver: Send + Sync {
    /// Stable name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Returns whether a change to `attribute` must trigger `sync`.
    fn watches(&self, attribute: &str) -> bool;

    /// Recomputes derived properties from current attribute values.
    fn sync(&self, attributes: &Attributes, delegates: &mut Delegates);
}

/// Business rule violations detected on a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    /// Required attribute is null, missing or an empty string.
    MissingRequired(String),
    /// Record was assigned itself as parent.
    SelfParent,
}

impl RecordValidationError {
    /// Stable error code shared with the client error catalog.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingRequired(_) => "xt1004",
            Self::SelfParent => "xt2006",
        }
    }
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired(name) => {
                write!(f, "{}: attribute `{name}` is required", self.code())
            }
            Self::SelfParent => write!(f, "{}: a record can not be its own parent", self.code()),
        }
    }
}

impl Error for RecordValidationError {}

/// Record mutation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    Deleted(RecordId),
    NotPermitted {
        class_name: String,
        action: Action,
    },
    UnknownAttribute {
        class_name: String,
        attribute: String,
    },
    TypeMismatch {
        attribute: String,
        expected: String,
    },
    Validation(RecordValidationError),
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deleted(id) => write!(f, "record is deleted: {id}"),
            Self::NotPermitted { class_name, action } => {
                write!(f, "{} is not permitted on {class_name}", action.as_str())
            }
            Self::UnknownAttribute {
                class_name,
                attribute,
            } => write!(f, "{class_name} has no attribute `{attribute}`"),
            Self::TypeMismatch {
                attribute,
                expected,
            } => write!(f, "attribute `{attribute}` expects {expected}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RecordError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecordValidationError> for RecordError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

/// One record of a declared record type.
#[derive(Debug, Clone)]
pub struct Record {
    record_type: Arc<RecordType>,
    id: RecordId,
    attributes: Attributes,
    delegates: Delegates,
    is_new: bool,
    is_deleted: bool,
    is_converted: bool,
}

/// Serializable view of a record including derived delegates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSnapshot {
    pub record_type: String,
    pub id: RecordId,
    pub attributes: Attributes,
    pub delegates: Delegates,
}

impl Record {
    /// Creates a new record with type defaults applied.
    ///
    /// # Errors
    /// - `NotPermitted` when the type forbids `create`.
    pub fn create(record_type: Arc<RecordType>, context: &ModelContext) -> RecordResult<Self> {
        ensure_allowed(&record_type, Action::Create)?;
        let attributes = record_type.defaults(context);
        Ok(Self::assemble(record_type, Uuid::new_v4(), attributes, true))
    }

    /// Materializes an existing record from stored attribute values.
    ///
    /// # Errors
    /// - `NotPermitted` when the type forbids `read`.
    /// - `UnknownAttribute` / `TypeMismatch` for values that do not fit the
    ///   declaration.
    pub fn load(
        record_type: Arc<RecordType>,
        id: RecordId,
        attributes: Attributes,
    ) -> RecordResult<Self> {
        ensure_allowed(&record_type, Action::Read)?;
        for (name, value) in &attributes {
            check_attribute(&record_type, name, value)?;
        }
        Ok(Self::assemble(record_type, id, attributes, false))
    }

    fn assemble(
        record_type: Arc<RecordType>,
        id: RecordId,
        attributes: Attributes,
        is_new: bool,
    ) -> Self {
        let mut record = Self {
            record_type,
            id,
            attributes,
            delegates: Delegates::new(),
            is_new,
            is_deleted: false,
            is_converted: false,
        };
        record.resync();
        record
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    pub fn class_name(&self) -> &str {
        self.record_type.class_name()
    }

    /// Returns the current value of `name`, `Null` when never assigned.
    pub fn get(&self, name: &str) -> &Value {
        self.attributes.get(name).unwrap_or(&NULL)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns a derived property value, `None` for unknown properties.
    pub fn delegate(&self, property: &str) -> Option<bool> {
        self.delegates.get(property).copied()
    }

    pub fn delegates(&self) -> &Delegates {
        &self.delegates
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn is_converted(&self) -> bool {
        self.is_converted
    }

    /// Records that a data source accepted this record.
    pub fn mark_persisted(&mut self) {
        self.is_new = false;
    }

    /// Records that this record was converted into another document type.
    pub fn mark_converted(&mut self) {
        self.is_converted = true;
    }

    /// Sets one attribute. Same contract as [`Record::set_many`].
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> RecordResult<()> {
        self.set_many([(name.into(), value)])
    }

    /// Applies all `pairs` as one update, then notifies observers once.
    ///
    /// # Errors
    /// - `Deleted` after [`Record::destroy`].
    /// - `NotPermitted` when editing a stored record of a type that forbids
    ///   `update`.
    /// - `UnknownAttribute` / `TypeMismatch` for any pair that does not fit.
    /// - `Validation` when the type's edit validator rejects the pairs.
    pub fn set_many<I, K>(&mut self, pairs: I) -> RecordResult<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        if self.is_deleted {
            return Err(RecordError::Deleted(self.id));
        }
        if !self.is_new {
            ensure_allowed(&self.record_type, Action::Update)?;
        }

        let pending: Vec<(String, Value)> = pairs
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        for (name, value) in &pending {
            check_attribute(&self.record_type, name, value)?;
        }
        if let Some(validator) = self.record_type.edit_validator() {
            if let Err(err) = validator(self, &pending) {
                warn!(
                    "event=record_edit module=model status=error record_type={} error_code={}",
                    self.record_type.class_name(),
                    err.code()
                );
                return Err(err.into());
            }
        }

        let mut changed: Vec<String> = Vec::new();
        for (name, value) in pending {
            if self.get(&name) == &value {
                continue;
            }
            self.attributes.insert(name.clone(), value);
            changed.push(name);
        }
        if changed.is_empty() {
            return Ok(());
        }

        let mut notified: Vec<&'static str> = Vec::new();
        for observer in self.record_type.observers() {
            if changed.iter().any(|name| observer.watches(name)) {
                observer.sync(&self.attributes, &mut self.delegates);
                notified.push(observer.name());
            }
        }
        debug!(
            "event=record_change module=model status=ok record_type={} changed={} observers={}",
            self.record_type.class_name(),
            changed.len(),
            notified.join(",")
        );
        Ok(())
    }

    /// Re-runs every observer against current attribute state.
    pub fn resync(&mut self) {
        for observer in self.record_type.observers() {
            observer.sync(&self.attributes, &mut self.delegates);
        }
    }

    /// Checks that every required attribute holds a value.
    ///
    /// `false` and `0` count as values; `null` and `""` do not.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        for name in self.record_type.required_attributes() {
            let missing = match self.get(name) {
                Value::Null => true,
                Value::String(text) => text.is_empty(),
                _ => false,
            };
            if missing {
                return Err(RecordValidationError::MissingRequired(name.clone()));
            }
        }
        Ok(())
    }

    /// Tombstones the record.
    ///
    /// # Errors
    /// - `NotPermitted` when the type forbids `delete`.
    /// - `Deleted` when already tombstoned.
    pub fn destroy(&mut self) -> RecordResult<()> {
        ensure_allowed(&self.record_type, Action::Delete)?;
        if self.is_deleted {
            return Err(RecordError::Deleted(self.id));
        }
        self.is_deleted = true;
        Ok(())
    }

    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            record_type: self.record_type.class_name().to_string(),
            id: self.id,
            attributes: self.attributes.clone(),
            delegates: self.delegates.clone(),
        }
    }
}

fn ensure_allowed(record_type: &RecordType, action: Action) -> RecordResult<()> {
    if record_type.allows(action) {
        return Ok(());
    }
    Err(RecordError::NotPermitted {
        class_name: record_type.class_name().to_string(),
        action,
    })
}

fn check_attribute(record_type: &RecordType, name: &str, value: &Value) -> RecordResult<()> {
    let Some(attribute) = record_type.attribute(name) else {
        return Err(RecordError::UnknownAttribute {
            class_name: record_type.class_name().to_string(),
            attribute: name.to_string(),
        });
    };
    if !attribute.kind.accepts(value) {
        return Err(RecordError::TypeMismatch {
            attribute: name.to_string(),
            expected: attribute.kind.describe(),
        });
    }
    Ok(())
}
