//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `xmodel_core` linkage and builtin registry wiring.
//! - Keep output deterministic for quick local sanity checks.

use std::process::ExitCode;
use xmodel_core::{ModelContext, RecordTypeRegistry};

fn main() -> ExitCode {
    println!("xmodel_core ping={}", xmodel_core::ping());
    println!("xmodel_core version={}", xmodel_core::core_version());

    let registry = match RecordTypeRegistry::with_builtin_types() {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("xmodel_core registry error={err}");
            return ExitCode::FAILURE;
        }
    };
    println!("xmodel_core record_types={}", registry.len());
    for name in registry.type_names() {
        println!("  {name}");
    }

    match registry.create("XM.Account", &ModelContext::new()) {
        Ok(account) => {
            for (property, value) in account.delegates() {
                println!("xmodel_core account.{property}={value}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("xmodel_core account error={err}");
            ExitCode::FAILURE
        }
    }
}
