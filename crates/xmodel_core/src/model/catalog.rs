//! Customer, project and ledger record declarations.

use crate::model::schema::{AttributeDef, CrudPrivileges, RecordType, SchemaError, ValueType};

pub const CUSTOMER_FILE: &str = "XM.CustomerFile";
pub const PROJECT_URL: &str = "XM.ProjectUrl";
pub const LEDGER_ACCOUNT_BROWSE: &str = "XM.LedgerAccountBrowse";

pub fn catalog_record_types() -> Result<Vec<RecordType>, SchemaError> {
    Ok(vec![
        customer_file()?,
        project_url()?,
        ledger_account_browse()?,
    ])
}

fn customer_file() -> Result<RecordType, SchemaError> {
    RecordType::builder(CUSTOMER_FILE)
        .nested_record_namespace()
        .privileges(CrudPrivileges::NO_UPDATE)
        .attribute(AttributeDef::to_one("source", "XM.Customer"))
        .attribute(AttributeDef::nested("file", "XM.FileInfo"))
        .attribute(AttributeDef::attr("purpose", ValueType::String))
        .build()
}

fn project_url() -> Result<RecordType, SchemaError> {
    RecordType::builder(PROJECT_URL)
        .nested_record_namespace()
        .privileges(CrudPrivileges::NO_UPDATE)
        .attribute(AttributeDef::to_one("source", "XM.Project"))
        .attribute(AttributeDef::nested("url", "XM.Url"))
        .attribute(AttributeDef::attr("purpose", ValueType::String))
        .build()
}

// Browse rows are a read-only projection of the chart of accounts.
fn ledger_account_browse() -> Result<RecordType, SchemaError> {
    let mut builder =
        RecordType::builder(LEDGER_ACCOUNT_BROWSE).privileges(CrudPrivileges::READ_ONLY);
    for name in [
        "company",
        "profitCenter",
        "number",
        "subAccount",
        "description",
        "accountType",
    ] {
        builder = builder.attribute(AttributeDef::attr(name, ValueType::String));
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::{catalog_record_types, CUSTOMER_FILE, LEDGER_ACCOUNT_BROWSE};
    use crate::model::schema::{Action, AttributeKind};

    #[test]
    fn customer_file_nests_file_info() {
        let types = catalog_record_types().unwrap();
        let file = types.iter().find(|t| t.class_name() == CUSTOMER_FILE).unwrap();

        assert!(file.nested_record_namespace());
        assert_eq!(
            file.attribute("file").unwrap().kind,
            AttributeKind::ToOne {
                target: "XM.FileInfo".to_string(),
                is_nested: true,
            }
        );
        assert!(file.allows(Action::Create));
        assert!(!file.allows(Action::Update));
    }

    #[test]
    fn ledger_browse_is_read_only() {
        let types = catalog_record_types().unwrap();
        let browse = types
            .iter()
            .find(|t| t.class_name() == LEDGER_ACCOUNT_BROWSE)
            .unwrap();

        assert!(browse.allows(Action::Read));
        for action in [Action::Create, Action::Update, Action::Delete] {
            assert!(!browse.allows(action));
        }
        assert!(!browse.nested_record_namespace());
        assert_eq!(browse.attributes().len(), 7);
    }
}
