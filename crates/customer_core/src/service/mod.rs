//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate DAO calls into use-case level APIs.
//! - Keep transport shims decoupled from storage details.

pub mod customer_service;
