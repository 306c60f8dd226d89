//! Account lookup use-cases.
//!
//! # Responsibility
//! - Translate account lookups into data source dispatch calls.
//! - Normalize dispatch replies into typed results.
//!
//! # Invariants
//! - A converted account never dispatches `findExisting`.
//! - A reply of `0` from `findExisting` means "no match".

use crate::datasource::{DataSource, DispatchError, FIND_EXISTING, USED};
use crate::model::account::ACCOUNT;
use crate::model::record::{Record, RecordId};
use log::{info, warn};
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Record passed to an account use-case is of another type.
    NotAnAccount(String),
    Dispatch(DispatchError),
    /// Data source replied with a value outside the method contract.
    UnexpectedReply { method: &'static str, reply: String },
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnAccount(class_name) => write!(f, "expected {ACCOUNT}, got {class_name}"),
            Self::Dispatch(err) => write!(f, "{err}"),
            Self::UnexpectedReply { method, reply } => {
                write!(f, "unexpected reply from {method}: {reply}")
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Dispatch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DispatchError> for ServiceError {
    fn from(value: DispatchError) -> Self {
        Self::Dispatch(value)
    }
}

/// Use-case service for account lookups.
pub struct AccountService<D: DataSource> {
    data_source: D,
}

impl<D: DataSource> AccountService<D> {
    pub fn new(data_source: D) -> Self {
        Self { data_source }
    }

    /// Returns the id of another account whose `key` equals `value`.
    ///
    /// # Contract
    /// - Returns `Ok(None)` without dispatching for converted accounts.
    /// - Excludes `account` itself unless it is new.
    pub fn find_existing(
        &self,
        account: &Record,
        key: &str,
        value: Value,
    ) -> ServiceResult<Option<RecordId>> {
        if account.class_name() != ACCOUNT {
            return Err(ServiceError::NotAnAccount(account.class_name().to_string()));
        }
        if account.is_converted() {
            return Ok(None);
        }

        let exclude = if account.is_new() {
            json!(-1)
        } else {
            json!(account.id().to_string())
        };
        let reply = self.dispatch(FIND_EXISTING, &json!([key, value, exclude]))?;
        match &reply {
            Value::Number(number) if number.as_i64() == Some(0) => Ok(None),
            Value::String(text) => Uuid::parse_str(text)
                .map(Some)
                .map_err(|_| unexpected(FIND_EXISTING, &reply)),
            _ => Err(unexpected(FIND_EXISTING, &reply)),
        }
    }

    /// Returns whether any other record references account `id`.
    pub fn used(&self, id: RecordId) -> ServiceResult<bool> {
        let reply = self.dispatch(USED, &json!(id.to_string()))?;
        reply
            .as_bool()
            .ok_or_else(|| unexpected(USED, &reply))
    }

    fn dispatch(&self, method: &'static str, params: &Value) -> ServiceResult<Value> {
        let started_at = Instant::now();
        match self.data_source.dispatch(ACCOUNT, method, params) {
            Ok(reply) => {
                info!(
                    "event=dispatch module=service record_type={} method={} status=ok duration_ms={}",
                    ACCOUNT,
                    method,
                    started_at.elapsed().as_millis()
                );
                Ok(reply)
            }
            Err(err) => {
                warn!(
                    "event=dispatch module=service record_type={} method={} status=error duration_ms={} error={}",
                    ACCOUNT,
                    method,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }
}

fn unexpected(method: &'static str, reply: &Value) -> ServiceError {
    ServiceError::UnexpectedReply {
        method,
        reply: reply.to_string(),
    }
}
