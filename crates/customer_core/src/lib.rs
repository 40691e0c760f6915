//! Core customer lifecycle logic.
//! This crate is the single source of truth for customer invariants: email
//! uniqueness, sparse-update semantics and DAO backend parity.

pub mod config;
pub mod dao;
pub mod db;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod service;

pub use config::{BackendKind, ConfigError, CoreConfig};
pub use dao::{
    CustomerDao, CustomerEntity, DaoError, DaoResult, MappedCustomerDao, SqliteCustomerDao,
};
pub use db::ConstraintKind;
pub use logging::{default_log_level, init_logging};
pub use model::customer::{
    Customer, CustomerId, CustomerRegistrationRequest, CustomerUpdateRequest,
    CustomerValidationError, NewCustomer, DEFAULT_CUSTOMER_AGE,
};
pub use service::customer_service::{
    CustomerService, ErrorCategory, ServiceError, ServiceResult,
};

use rusqlite::Connection;

/// Builds the DAO backend selected by `backend` over a migrated connection.
///
/// The choice is made once, at process wiring time; every call made through
/// the returned DAO uses the same backend.
pub fn dao_for(backend: BackendKind, conn: &Connection) -> DaoResult<Box<dyn CustomerDao + '_>> {
    let dao: Box<dyn CustomerDao + '_> = match backend {
        BackendKind::DirectSql => Box::new(SqliteCustomerDao::try_new(conn)?),
        BackendKind::Mapped => Box::new(MappedCustomerDao::try_new(conn)?),
    };
    Ok(dao)
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
