//! Record type registry.
//!
//! # Responsibility
//! - Map class names (`XM.Account`) to record type descriptors.
//! - Construct records by class name.
//!
//! # Invariants
//! - The registry is populated explicitly; nothing registers itself.
//! - Class names are unique and match `XM.<PascalName>`.

use crate::model::account::account_record_types;
use crate::model::catalog::catalog_record_types;
use crate::model::context::ModelContext;
use crate::model::record::{Attributes, Record, RecordError, RecordId};
use crate::model::schema::{RecordType, SchemaError};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

static CLASS_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^XM\.[A-Z][A-Za-z0-9]*$").expect("valid class name regex"));

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registration, lookup and construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    InvalidTypeName(String),
    DuplicateTypeName(String),
    TypeNotFound(String),
    Schema(SchemaError),
    Record(RecordError),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTypeName(value) => write!(f, "record type name is invalid: {value}"),
            Self::DuplicateTypeName(value) => {
                write!(f, "record type already registered: {value}")
            }
            Self::TypeNotFound(value) => write!(f, "record type not found: {value}"),
            Self::Schema(err) => write!(f, "{err}"),
            Self::Record(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            Self::Record(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SchemaError> for RegistryError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<RecordError> for RegistryError {
    fn from(value: RecordError) -> Self {
        Self::Record(value)
    }
}

/// Explicit class-name to record-type table.
#[derive(Debug, Default)]
pub struct RecordTypeRegistry {
    types: BTreeMap<String, Arc<RecordType>>,
}

impl RecordTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry holding every record type shipped with the core.
    pub fn with_builtin_types() -> RegistryResult<Self> {
        let mut registry = Self::new();
        for record_type in account_record_types()?
            .into_iter()
            .chain(catalog_record_types()?)
        {
            registry.register(record_type)?;
        }
        info!(
            "event=registry_init module=registry status=ok types={}",
            registry.len()
        );
        Ok(registry)
    }

    /// Registers one record type.
    pub fn register(&mut self, record_type: RecordType) -> RegistryResult<Arc<RecordType>> {
        let class_name = record_type.class_name().to_string();
        if !CLASS_NAME_RE.is_match(&class_name) {
            return Err(RegistryError::InvalidTypeName(class_name));
        }
        if self.types.contains_key(&class_name) {
            return Err(RegistryError::DuplicateTypeName(class_name));
        }
        let record_type = Arc::new(record_type);
        self.types.insert(class_name, Arc::clone(&record_type));
        Ok(record_type)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Returns sorted class names.
    pub fn type_names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    pub fn get(&self, class_name: &str) -> Option<Arc<RecordType>> {
        self.types.get(class_name).cloned()
    }

    /// Creates a new record of `class_name` with defaults applied.
    pub fn create(&self, class_name: &str, context: &ModelContext) -> RegistryResult<Record> {
        let record_type = self.require(class_name)?;
        Ok(Record::create(record_type, context)?)
    }

    /// Materializes a stored record of `class_name`.
    pub fn load(
        &self,
        class_name: &str,
        id: RecordId,
        attributes: Attributes,
    ) -> RegistryResult<Record> {
        let record_type = self.require(class_name)?;
        Ok(Record::load(record_type, id, attributes)?)
    }

    fn require(&self, class_name: &str) -> RegistryResult<Arc<RecordType>> {
        self.get(class_name)
            .ok_or_else(|| RegistryError::TypeNotFound(class_name.to_string()))
    }
}
