//! Customer persistence port and its storage backends.
//!
//! # Responsibility
//! - Define the `CustomerDao` contract the service depends on.
//! - Keep SQL and mapping details behind that contract.
//!
//! # Invariants
//! - Both backends return observably identical results for identical call
//!   sequences.
//! - Store-level constraint failures surface as
//!   `DaoError::ConstraintViolation`, never as raw storage errors.

use crate::db::migrations::latest_version;
use crate::db::{ConstraintKind, DbError};
use crate::mapping::MappingError;
use crate::model::customer::{Customer, CustomerId, NewCustomer};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod mapped;
pub mod sqlite;

pub use mapped::{CustomerEntity, MappedCustomerDao};
pub use sqlite::SqliteCustomerDao;

pub(crate) const CUSTOMER_TABLE: &str = "customer";
pub(crate) const CUSTOMER_COLUMNS: [&str; 4] = ["id", "name", "email", "age"];

pub type DaoResult<T> = Result<T, DaoError>;

/// Errors from customer persistence operations.
#[derive(Debug)]
pub enum DaoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// The store rejected the write through one of its constraints.
    ConstraintViolation {
        constraint: ConstraintKind,
        message: String,
    },
    /// No row carries the given id.
    NotFound(CustomerId),
    /// Persisted row cannot be converted to a valid `Customer`.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl DaoError {
    pub fn is_constraint_violation(&self) -> bool {
        self.constraint_kind().is_some()
    }

    /// Returns the violated constraint family, if any.
    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            Self::ConstraintViolation { constraint, .. } => Some(*constraint),
            _ => None,
        }
    }
}

impl Display for DaoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ConstraintViolation {
                constraint,
                message,
            } => write!(f, "store constraint violated ({constraint}): {message}"),
            Self::NotFound(id) => write!(f, "customer not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted customer data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "customer store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "customer store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "customer store requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for DaoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for DaoError {
    fn from(value: DbError) -> Self {
        match value.constraint_kind() {
            Some(constraint) => Self::ConstraintViolation {
                constraint,
                message: value.to_string(),
            },
            None => Self::Db(value),
        }
    }
}

impl From<rusqlite::Error> for DaoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(DbError::Sqlite(value))
    }
}

impl From<MappingError> for DaoError {
    fn from(value: MappingError) -> Self {
        match value {
            MappingError::Db(err) => Self::from(err),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

/// Persistence port for customers.
///
/// # Contract
/// - Callers hand `update_customer` a fully-resolved record: every field holds
///   the value the row must end up with. Backends differ in how they write
///   (per-field statements vs full-row replace) and only agree on the result
///   because of this. `Customer` has no optional fields, which keeps partial
///   records out of this call.
/// - `delete_by_id` on an unknown id is a no-op.
/// - `update_customer` on an unknown id fails with `DaoError::NotFound`.
/// - Rows come back in store-natural order (`id` ascending).
pub trait CustomerDao {
    fn find_all_customers(&self) -> DaoResult<Vec<Customer>>;
    fn find_customer_by_id(&self, id: CustomerId) -> DaoResult<Option<Customer>>;
    fn exists_by_email(&self, email: &str) -> DaoResult<bool>;
    fn exists_by_id(&self, id: CustomerId) -> DaoResult<bool>;
    /// Persists a new row and returns it with the store-assigned id.
    fn save(&self, new_customer: &NewCustomer) -> DaoResult<Customer>;
    fn delete_by_id(&self, id: CustomerId) -> DaoResult<()>;
    /// Writes the given field values for `customer.id`.
    fn update_customer(&self, customer: &Customer) -> DaoResult<Customer>;
}

impl<D: CustomerDao + ?Sized> CustomerDao for &D {
    fn find_all_customers(&self) -> DaoResult<Vec<Customer>> {
        (**self).find_all_customers()
    }

    fn find_customer_by_id(&self, id: CustomerId) -> DaoResult<Option<Customer>> {
        (**self).find_customer_by_id(id)
    }

    fn exists_by_email(&self, email: &str) -> DaoResult<bool> {
        (**self).exists_by_email(email)
    }

    fn exists_by_id(&self, id: CustomerId) -> DaoResult<bool> {
        (**self).exists_by_id(id)
    }

    fn save(&self, new_customer: &NewCustomer) -> DaoResult<Customer> {
        (**self).save(new_customer)
    }

    fn delete_by_id(&self, id: CustomerId) -> DaoResult<()> {
        (**self).delete_by_id(id)
    }

    fn update_customer(&self, customer: &Customer) -> DaoResult<Customer> {
        (**self).update_customer(customer)
    }
}

impl<D: CustomerDao + ?Sized> CustomerDao for Box<D> {
    fn find_all_customers(&self) -> DaoResult<Vec<Customer>> {
        (**self).find_all_customers()
    }

    fn find_customer_by_id(&self, id: CustomerId) -> DaoResult<Option<Customer>> {
        (**self).find_customer_by_id(id)
    }

    fn exists_by_email(&self, email: &str) -> DaoResult<bool> {
        (**self).exists_by_email(email)
    }

    fn exists_by_id(&self, id: CustomerId) -> DaoResult<bool> {
        (**self).exists_by_id(id)
    }

    fn save(&self, new_customer: &NewCustomer) -> DaoResult<Customer> {
        (**self).save(new_customer)
    }

    fn delete_by_id(&self, id: CustomerId) -> DaoResult<()> {
        (**self).delete_by_id(id)
    }

    fn update_customer(&self, customer: &Customer) -> DaoResult<Customer> {
        (**self).update_customer(customer)
    }
}

/// Verifies `conn` is migrated and carries the full `customer` table.
pub(crate) fn ensure_customer_connection_ready(conn: &Connection) -> DaoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(DaoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, CUSTOMER_TABLE)? {
        return Err(DaoError::MissingRequiredTable(CUSTOMER_TABLE));
    }

    for column in CUSTOMER_COLUMNS {
        if !table_has_column(conn, CUSTOMER_TABLE, column)? {
            return Err(DaoError::MissingRequiredColumn {
                table: CUSTOMER_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> DaoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> DaoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
