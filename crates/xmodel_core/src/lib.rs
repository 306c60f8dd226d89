//! Core model layer for XModel business records.
//! This crate is the single source of truth for record invariants.

pub mod datasource;
pub mod logging;
pub mod model;
pub mod registry;
pub mod service;

pub use datasource::{DataSource, DispatchError, DispatchResult, MemoryDataSource};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::context::ModelContext;
pub use model::record::{
    Attributes, ChangeObserver, Delegates, Record, RecordError, RecordId, RecordResult,
    RecordSnapshot, RecordValidationError,
};
pub use model::role::{role_property_name, RoleDelegate, RoleDelegateSync, ACCOUNT_ROLE_DELEGATES};
pub use model::schema::{
    Action, AttributeDef, AttributeKind, CrudPrivileges, PrivilegeTable, RecordType, SchemaError,
    ValueType,
};
pub use model::value::is_truthy;
pub use registry::{RecordTypeRegistry, RegistryError, RegistryResult};
pub use service::account_service::{AccountService, ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
