//! Customer domain model and request shapes.
//!
//! # Responsibility
//! - Define the persisted `Customer` record and its creation input.
//! - Define the transport-facing registration and sparse update requests.
//! - Validate request shape before anything reaches persistence.
//!
//! # Invariants
//! - `id` is assigned by the store exactly once and never changes.
//! - `Customer` value-equality covers `{name, email, age}` only; identity is
//!   compared through `id` explicitly (`same_identity`).
//! - A `Customer` has no optional fields, so a partially-resolved record can
//!   never be handed to a DAO backend.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

/// Store-assigned customer identifier.
pub type CustomerId = i64;

/// Age stored for a registration that leaves `age` out.
pub const DEFAULT_CUSTOMER_AGE: i32 = 0;

/// Persisted customer record.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    /// Unique across all customers.
    pub email: String,
    pub age: i32,
}

impl Customer {
    pub fn new(
        id: CustomerId,
        name: impl Into<String>,
        email: impl Into<String>,
        age: i32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            age,
        }
    }

    /// Returns whether both records refer to the same stored row.
    pub fn same_identity(&self, other: &Customer) -> bool {
        self.id == other.id
    }
}

impl PartialEq for Customer {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.email == other.email && self.age == other.age
    }
}

/// Customer data before the store has assigned an id.
///
/// `age` stays optional at this level; the store's NOT NULL constraint rejects
/// a missing value. The service always resolves it before calling `save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
}

impl NewCustomer {
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: Option<i32>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age,
        }
    }
}

/// Request body for registering a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRegistrationRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub age: Option<i32>,
}

impl CustomerRegistrationRequest {
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: Option<i32>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age,
        }
    }

    /// Checks required fields and email shape.
    pub fn validate(&self) -> Result<(), CustomerValidationError> {
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        if let Some(age) = self.age {
            validate_age(age)?;
        }
        Ok(())
    }

    /// Resolves the stored shape; a missing age becomes `DEFAULT_CUSTOMER_AGE`.
    pub(crate) fn into_new_customer(self) -> NewCustomer {
        NewCustomer {
            name: self.name,
            email: self.email,
            age: Some(self.age.unwrap_or(DEFAULT_CUSTOMER_AGE)),
        }
    }
}

/// Sparse patch; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
}

impl CustomerUpdateRequest {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_age(mut self, age: i32) -> Self {
        self.age = Some(age);
        self
    }

    /// Validates only the fields the patch carries.
    pub fn validate(&self) -> Result<(), CustomerValidationError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(age) = self.age {
            validate_age(age)?;
        }
        Ok(())
    }
}

/// Request shape violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerValidationError {
    BlankName,
    InvalidEmail(String),
    NegativeAge(i32),
}

impl Display for CustomerValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "customer name must not be blank"),
            Self::InvalidEmail(value) => write!(f, "customer email is not well formed: `{value}`"),
            Self::NegativeAge(value) => write!(f, "customer age must not be negative: {value}"),
        }
    }
}

impl Error for CustomerValidationError {}

fn validate_name(name: &str) -> Result<(), CustomerValidationError> {
    if name.trim().is_empty() {
        return Err(CustomerValidationError::BlankName);
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), CustomerValidationError> {
    if !EMAIL_RE.is_match(email) {
        return Err(CustomerValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

fn validate_age(age: i32) -> Result<(), CustomerValidationError> {
    if age < 0 {
        return Err(CustomerValidationError::NegativeAge(age));
    }
    Ok(())
}
