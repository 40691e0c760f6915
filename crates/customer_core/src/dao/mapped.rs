//! Entity-mapped customer backend.
//!
//! # Responsibility
//! - Serve the `CustomerDao` port through `EntityRepository<CustomerEntity>`.
//! - Convert between the mapped persistence shape and the domain record.
//!
//! # Invariants
//! - `update_customer` replaces the full row; it never inserts a missing id.
//! - Returned customers are always re-read from the store after writes.

use crate::dao::{
    ensure_customer_connection_ready, CustomerDao, DaoError, DaoResult, CUSTOMER_TABLE,
};
use crate::mapping::{Entity, EntityRepository};
use crate::model::customer::{Customer, CustomerId, NewCustomer};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

/// Mapped persistence shape of the `customer` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerEntity {
    pub id: Option<CustomerId>,
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
}

impl Entity for CustomerEntity {
    const TABLE: &'static str = CUSTOMER_TABLE;
    const ID_COLUMN: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &["name", "email", "age"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.email.clone()),
            self.age.map_or(Value::Null, |age| Value::Integer(i64::from(age))),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            name: row.get("name")?,
            email: row.get("email")?,
            age: row.get("age")?,
        })
    }
}

impl From<&NewCustomer> for CustomerEntity {
    fn from(value: &NewCustomer) -> Self {
        Self {
            id: None,
            name: value.name.clone(),
            email: value.email.clone(),
            age: value.age,
        }
    }
}

impl From<&Customer> for CustomerEntity {
    fn from(value: &Customer) -> Self {
        Self {
            id: Some(value.id),
            name: value.name.clone(),
            email: value.email.clone(),
            age: Some(value.age),
        }
    }
}

impl TryFrom<CustomerEntity> for Customer {
    type Error = DaoError;

    fn try_from(value: CustomerEntity) -> Result<Self, Self::Error> {
        let id = value
            .id
            .ok_or_else(|| DaoError::InvalidData("mapped customer has no id".to_string()))?;
        if id <= 0 {
            return Err(DaoError::InvalidData(format!(
                "invalid id value `{id}` in customer.id"
            )));
        }
        let age = value.age.ok_or_else(|| {
            DaoError::InvalidData(format!("missing age for customer {id} in customer.age"))
        })?;

        Ok(Customer {
            id,
            name: value.name,
            email: value.email,
            age,
        })
    }
}

/// Customer DAO backed by the declarative mapping layer.
pub struct MappedCustomerDao<'conn> {
    repository: EntityRepository<'conn, CustomerEntity>,
}

impl<'conn> MappedCustomerDao<'conn> {
    /// Constructs a DAO from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> DaoResult<Self> {
        ensure_customer_connection_ready(conn)?;
        Ok(Self {
            repository: EntityRepository::new(conn),
        })
    }
}

impl CustomerDao for MappedCustomerDao<'_> {
    fn find_all_customers(&self) -> DaoResult<Vec<Customer>> {
        self.repository
            .find_all()?
            .into_iter()
            .map(Customer::try_from)
            .collect()
    }

    fn find_customer_by_id(&self, id: CustomerId) -> DaoResult<Option<Customer>> {
        self.repository
            .find_by_id(id)?
            .map(Customer::try_from)
            .transpose()
    }

    fn exists_by_email(&self, email: &str) -> DaoResult<bool> {
        Ok(self.repository.exists_by("email", email)?)
    }

    fn exists_by_id(&self, id: CustomerId) -> DaoResult<bool> {
        Ok(self.repository.exists_by_id(id)?)
    }

    fn save(&self, new_customer: &NewCustomer) -> DaoResult<Customer> {
        let stored = self.repository.save(&CustomerEntity::from(new_customer))?;
        Customer::try_from(stored)
    }

    fn delete_by_id(&self, id: CustomerId) -> DaoResult<()> {
        self.repository.delete_by_id(id)?;
        Ok(())
    }

    fn update_customer(&self, customer: &Customer) -> DaoResult<Customer> {
        if !self.repository.exists_by_id(customer.id)? {
            return Err(DaoError::NotFound(customer.id));
        }

        let stored = self.repository.save(&CustomerEntity::from(customer))?;
        Customer::try_from(stored)
    }
}
