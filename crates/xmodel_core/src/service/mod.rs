//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate data source dispatch into use-case level APIs.
//! - Keep callers decoupled from dispatch method names and reply shapes.

pub mod account_service;
