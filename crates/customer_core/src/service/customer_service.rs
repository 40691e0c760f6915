//! Customer use-case service.
//!
//! # Responsibility
//! - Validate requests and enforce email uniqueness above the DAO port.
//! - Resolve sparse update patches into fully-merged customers.
//! - Translate DAO outcomes into domain errors for transport callers.
//!
//! # Invariants
//! - A duplicate email never reaches `CustomerDao::save`.
//! - An update patch without an effective delta never reaches
//!   `CustomerDao::update_customer`.
//! - A rejected update persists nothing, even if other fields changed in
//!   memory first.
//! - `CustomerDao::update_customer` always receives a fully-resolved record.

use crate::dao::{CustomerDao, DaoError};
use crate::db::ConstraintKind;
use crate::model::customer::{
    Customer, CustomerId, CustomerRegistrationRequest, CustomerUpdateRequest,
    CustomerValidationError,
};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Transport-facing error class of a `ServiceError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Conflict,
    Validation,
    Internal,
}

impl ErrorCategory {
    /// HTTP status code used by transport shims for this category.
    pub fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Validation => 400,
            Self::Internal => 500,
        }
    }
}

/// Errors from customer service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// No customer carries the id.
    NotFound(CustomerId),
    /// Pre-check found another customer holding the email.
    DuplicateResource(String),
    /// Update patch matched the stored values.
    NoChanges,
    /// The store rejected a write that passed the pre-check (concurrent
    /// writer inside the race window, or a NOT NULL column left empty).
    ConstraintViolation(DaoError),
    /// Request shape violation.
    Validation(CustomerValidationError),
    /// Any other persistence failure.
    Dao(DaoError),
}

impl ServiceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::DuplicateResource(_) | Self::ConstraintViolation(_) => ErrorCategory::Conflict,
            Self::NoChanges | Self::Validation(_) => ErrorCategory::Validation,
            Self::Dao(_) => ErrorCategory::Internal,
        }
    }

    pub fn http_status(&self) -> u16 {
        self.category().http_status()
    }

    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::DuplicateResource(_) => "duplicate_email",
            Self::NoChanges => "no_changes",
            Self::ConstraintViolation(_) => "constraint_violation",
            Self::Validation(_) => "validation",
            Self::Dao(_) => "dao_failed",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "Customer with id = [{id}] not found"),
            Self::DuplicateResource(email) => {
                write!(f, "Customer with email = [{email}] already exists")
            }
            Self::NoChanges => write!(f, "No changes found"),
            // Raw store text stays in `source()` and the service log.
            Self::ConstraintViolation(err) => match err.constraint_kind() {
                Some(ConstraintKind::Unique) => write!(f, "Customer with email already exists"),
                Some(ConstraintKind::NotNull) => {
                    write!(f, "Customer is missing a required field")
                }
                _ => write!(f, "Customer violates a store constraint"),
            },
            Self::Validation(err) => write!(f, "{err}"),
            Self::Dao(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ConstraintViolation(err) | Self::Dao(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DaoError> for ServiceError {
    fn from(value: DaoError) -> Self {
        match value {
            DaoError::NotFound(id) => Self::NotFound(id),
            err if err.is_constraint_violation() => Self::ConstraintViolation(err),
            other => Self::Dao(other),
        }
    }
}

impl From<CustomerValidationError> for ServiceError {
    fn from(value: CustomerValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Customer service facade over a DAO backend chosen at wiring time.
pub struct CustomerService<D: CustomerDao> {
    dao: D,
}

impl<D: CustomerDao> CustomerService<D> {
    pub fn new(dao: D) -> Self {
        Self { dao }
    }

    /// Returns the DAO this service writes through.
    pub fn dao(&self) -> &D {
        &self.dao
    }

    pub fn find_all_customers(&self) -> ServiceResult<Vec<Customer>> {
        let customers = self.dao.find_all_customers()?;
        debug!(
            "event=customer_list module=service status=ok count={}",
            customers.len()
        );
        Ok(customers)
    }

    pub fn find_customer_by_id(&self, id: CustomerId) -> ServiceResult<Customer> {
        let found = self.dao.find_customer_by_id(id)?;
        debug!(
            "event=customer_get module=service status={} customer_id={id}",
            if found.is_some() { "ok" } else { "not_found" }
        );
        found.ok_or(ServiceError::NotFound(id))
    }

    /// Registers a new customer.
    ///
    /// A registration without `age` is stored with `DEFAULT_CUSTOMER_AGE`.
    ///
    /// # Errors
    /// - `Validation` for a blank name, malformed email or negative age.
    /// - `DuplicateResource` when the email is already taken; nothing is
    ///   written.
    /// - `ConstraintViolation` when the store rejects the row anyway.
    pub fn save_customer(
        &self,
        registration: CustomerRegistrationRequest,
    ) -> ServiceResult<Customer> {
        let started_at = Instant::now();
        let result = self.save_customer_inner(registration);
        log_outcome("customer_save", started_at, &result, |customer| customer.id);
        result
    }

    fn save_customer_inner(
        &self,
        registration: CustomerRegistrationRequest,
    ) -> ServiceResult<Customer> {
        registration.validate()?;

        if self.dao.exists_by_email(&registration.email)? {
            return Err(ServiceError::DuplicateResource(registration.email));
        }

        let saved = self.dao.save(&registration.into_new_customer())?;
        Ok(saved)
    }

    /// Hard-deletes one customer.
    pub fn delete_customer(&self, id: CustomerId) -> ServiceResult<()> {
        let started_at = Instant::now();
        let result = self.delete_customer_inner(id);
        log_outcome("customer_delete", started_at, &result, |_| id);
        result
    }

    fn delete_customer_inner(&self, id: CustomerId) -> ServiceResult<()> {
        if !self.dao.exists_by_id(id)? {
            return Err(ServiceError::NotFound(id));
        }

        self.dao.delete_by_id(id)?;
        Ok(())
    }

    /// Applies a sparse patch to one customer.
    ///
    /// Fields are compared in the fixed order name, age, email. A field equal
    /// to the stored value is not a change and, for email, skips the
    /// uniqueness check.
    ///
    /// # Errors
    /// - `NotFound` when the id is unknown.
    /// - `DuplicateResource` when a changed email belongs to another
    ///   customer; nothing is persisted.
    /// - `NoChanges` when no field differs; the DAO is not written.
    pub fn update_customer(
        &self,
        id: CustomerId,
        patch: CustomerUpdateRequest,
    ) -> ServiceResult<Customer> {
        let started_at = Instant::now();
        let result = self.update_customer_inner(id, patch);
        log_outcome("customer_update", started_at, &result, |customer| customer.id);
        result
    }

    fn update_customer_inner(
        &self,
        id: CustomerId,
        patch: CustomerUpdateRequest,
    ) -> ServiceResult<Customer> {
        patch.validate()?;

        let mut customer = self.find_customer_by_id(id)?;
        let mut changed = false;

        if let Some(name) = patch.name {
            if name != customer.name {
                customer.name = name;
                changed = true;
            }
        }

        if let Some(age) = patch.age {
            if age != customer.age {
                customer.age = age;
                changed = true;
            }
        }

        if let Some(email) = patch.email {
            if email != customer.email {
                if self.dao.exists_by_email(&email)? {
                    return Err(ServiceError::DuplicateResource(email));
                }
                customer.email = email;
                changed = true;
            }
        }

        if !changed {
            return Err(ServiceError::NoChanges);
        }

        let updated = self.dao.update_customer(&customer)?;
        Ok(updated)
    }
}

fn log_outcome<T>(
    event: &str,
    started_at: Instant,
    result: &ServiceResult<T>,
    customer_id: impl FnOnce(&T) -> CustomerId,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(value) => info!(
            "event={event} module=service status=ok customer_id={} duration_ms={duration_ms}",
            customer_id(value)
        ),
        Err(err) if err.category() == ErrorCategory::Internal => error!(
            "event={event} module=service status=error error_code={} duration_ms={duration_ms} error={err}",
            err.code()
        ),
        Err(ServiceError::ConstraintViolation(cause)) => warn!(
            "event={event} module=service status=rejected error_code=constraint_violation http_status=409 duration_ms={duration_ms} error={cause}"
        ),
        Err(err) => warn!(
            "event={event} module=service status=rejected error_code={} http_status={} duration_ms={duration_ms}",
            err.code(),
            err.http_status()
        ),
    }
}
