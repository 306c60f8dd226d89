use serde_json::{json, Value};
use std::cell::RefCell;
use xmodel_core::{
    AccountService, DataSource, DispatchError, DispatchResult, MemoryDataSource, ModelContext,
    Record, RecordTypeRegistry, ServiceError,
};

fn account(registry: &RecordTypeRegistry, number: &str) -> Record {
    let mut record = registry
        .create("XM.Account", &ModelContext::new())
        .unwrap();
    record
        .set_many([("number", json!(number)), ("name", json!(number))])
        .unwrap();
    record
}

/// Records every dispatch and replies with a canned value.
struct RecordingSource {
    calls: RefCell<Vec<(String, String, Value)>>,
    reply: Value,
}

impl RecordingSource {
    fn replying(reply: Value) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            reply,
        }
    }
}

impl DataSource for RecordingSource {
    fn dispatch(&self, record_type: &str, method: &str, params: &Value) -> DispatchResult<Value> {
        self.calls.borrow_mut().push((
            record_type.to_string(),
            method.to_string(),
            params.clone(),
        ));
        Ok(self.reply.clone())
    }
}

#[test]
fn find_existing_returns_matching_account() {
    let registry = RecordTypeRegistry::with_builtin_types().unwrap();
    let stored = account(&registry, "ACME");
    let mut source = MemoryDataSource::new();
    source.insert(&stored);
    let service = AccountService::new(&source);

    let candidate = account(&registry, "NEW");
    let found = service
        .find_existing(&candidate, "number", json!("ACME"))
        .unwrap();
    assert_eq!(found, Some(stored.id()));

    let missing = service
        .find_existing(&candidate, "number", json!("OTHER"))
        .unwrap();
    assert_eq!(missing, None);
}

#[test]
fn find_existing_ignores_the_account_itself_once_stored() {
    let registry = RecordTypeRegistry::with_builtin_types().unwrap();
    let mut stored = account(&registry, "ACME");
    stored.mark_persisted();
    let mut source = MemoryDataSource::new();
    source.insert(&stored);
    let service = AccountService::new(&source);

    let found = service
        .find_existing(&stored, "number", json!("ACME"))
        .unwrap();
    assert_eq!(found, None);
}

#[test]
fn find_existing_sends_exclusion_id() {
    let registry = RecordTypeRegistry::with_builtin_types().unwrap();
    let source = RecordingSource::replying(json!(0));
    let service = AccountService::new(&source);

    let mut candidate = account(&registry, "ACME");
    service
        .find_existing(&candidate, "number", json!("ACME"))
        .unwrap();
    candidate.mark_persisted();
    service
        .find_existing(&candidate, "number", json!("ACME"))
        .unwrap();

    let calls = source.calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "XM.Account");
    assert_eq!(calls[0].1, "findExisting");
    assert_eq!(calls[0].2, json!(["number", "ACME", -1]));
    assert_eq!(
        calls[1].2,
        json!(["number", "ACME", candidate.id().to_string()])
    );
}

#[test]
fn converted_account_skips_dispatch() {
    let registry = RecordTypeRegistry::with_builtin_types().unwrap();
    let source = RecordingSource::replying(json!("not-consulted"));
    let service = AccountService::new(&source);

    let mut candidate = account(&registry, "ACME");
    candidate.mark_converted();
    let found = service
        .find_existing(&candidate, "number", json!("ACME"))
        .unwrap();

    assert_eq!(found, None);
    assert!(source.calls.borrow().is_empty());
}

#[test]
fn find_existing_rejects_non_accounts_and_bad_replies() {
    let registry = RecordTypeRegistry::with_builtin_types().unwrap();
    let source = RecordingSource::replying(json!("not-a-uuid"));
    let service = AccountService::new(&source);

    let file = registry
        .create("XM.CustomerFile", &ModelContext::new())
        .unwrap();
    assert_eq!(
        service
            .find_existing(&file, "purpose", json!("S"))
            .unwrap_err(),
        ServiceError::NotAnAccount("XM.CustomerFile".to_string())
    );

    let candidate = account(&registry, "ACME");
    let err = service
        .find_existing(&candidate, "number", json!("ACME"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::UnexpectedReply { .. }));
}

#[test]
fn used_detects_references_from_other_records() {
    let registry = RecordTypeRegistry::with_builtin_types().unwrap();
    let parent = account(&registry, "PARENT");
    let mut child = account(&registry, "CHILD");
    let mut source = MemoryDataSource::new();
    source.insert(&parent);
    source.insert(&child);
    let service = AccountService::new(&source);

    assert!(!service.used(parent.id()).unwrap());

    child
        .set("parent", json!({"id": parent.id().to_string()}))
        .unwrap();
    let mut source = MemoryDataSource::new();
    source.insert(&parent);
    source.insert(&child);
    let service = AccountService::new(&source);

    assert!(service.used(parent.id()).unwrap());
    assert!(!service.used(child.id()).unwrap());
}

#[test]
fn self_reference_does_not_count_as_used() {
    let registry = RecordTypeRegistry::with_builtin_types().unwrap();
    let mut loner = account(&registry, "SELF");
    let own_id = loner.id();
    loner
        .set("comments", json!([{"id": own_id.to_string()}]))
        .unwrap();
    let mut source = MemoryDataSource::new();
    source.insert(&loner);
    let service = AccountService::new(&source);

    assert!(!service.used(own_id).unwrap());
}

#[test]
fn used_scans_nested_collections() {
    let registry = RecordTypeRegistry::with_builtin_types().unwrap();
    let target = account(&registry, "TARGET");
    let mut holder = account(&registry, "HOLDER");
    holder
        .set(
            "comments",
            json!([{"id": "c-1", "source": {"id": target.id().to_string()}}]),
        )
        .unwrap();
    let mut source = MemoryDataSource::new();
    source.insert(&holder);

    assert_eq!(
        source
            .dispatch("XM.Account", "used", &json!(target.id().to_string()))
            .unwrap(),
        json!(false)
    );

    holder
        .set("comments", json!([{"id": target.id().to_string()}]))
        .unwrap();
    source.insert(&holder);
    let service = AccountService::new(&source);
    assert!(service.used(target.id()).unwrap());
}

#[test]
fn dispatch_errors_surface_through_service() {
    struct FailingSource;

    impl DataSource for FailingSource {
        fn dispatch(&self, _: &str, _: &str, _: &Value) -> DispatchResult<Value> {
            Err(DispatchError::Backend("offline".to_string()))
        }
    }

    let service = AccountService::new(FailingSource);
    let err = service.used(uuid::Uuid::new_v4()).unwrap_err();
    assert_eq!(
        err,
        ServiceError::Dispatch(DispatchError::Backend("offline".to_string()))
    );
}
