//! Declarative entity-to-table mapping.
//!
//! # Responsibility
//! - Describe an entity once (table, id column, data columns, row codec).
//! - Derive the generic repository operations from that description so
//!   backends built on it carry no hand-written SQL.
//!
//! # Invariants
//! - `Entity::values()` yields exactly one value per `Entity::COLUMNS` entry,
//!   in the same order.
//! - Column names used in lookups must be declared by the entity.

use crate::db::DbError;
use rusqlite::types::Value;
use rusqlite::Row;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod repository;

pub use repository::EntityRepository;

pub type MappingResult<T> = Result<T, MappingError>;

/// Description of a table-backed entity with a store-generated integer key.
pub trait Entity: Sized {
    const TABLE: &'static str;
    const ID_COLUMN: &'static str;
    /// Data columns, excluding the id column.
    const COLUMNS: &'static [&'static str];

    /// `None` until the store has assigned a key.
    fn id(&self) -> Option<i64>;
    /// Values for `COLUMNS`, in declaration order.
    fn values(&self) -> Vec<Value>;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Errors raised by the mapping layer.
#[derive(Debug)]
pub enum MappingError {
    Db(DbError),
    /// Lookup referenced a column the entity does not declare.
    UnknownColumn {
        table: &'static str,
        column: String,
    },
    /// Entity values do not line up with the declared columns.
    ColumnCountMismatch {
        table: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A written row could not be read back.
    RefreshFailed { table: &'static str, id: i64 },
}

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UnknownColumn { table, column } => {
                write!(f, "table `{table}` has no mapped column `{column}`")
            }
            Self::ColumnCountMismatch {
                table,
                expected,
                actual,
            } => write!(
                f,
                "entity for `{table}` produced {actual} values for {expected} columns"
            ),
            Self::RefreshFailed { table, id } => {
                write!(f, "row {id} in `{table}` vanished after write")
            }
        }
    }
}

impl Error for MappingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for MappingError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for MappingError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
