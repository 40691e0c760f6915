//! Generic repository derived from an `Entity` description.

use super::{Entity, MappingError, MappingResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, ToSql};
use std::marker::PhantomData;

/// Statements rendered once from the entity description.
#[derive(Debug, Clone)]
struct EntitySql {
    select_all: String,
    select_by_id: String,
    exists_by_id: String,
    insert: String,
    merge: String,
    delete_by_id: String,
}

impl EntitySql {
    fn render<E: Entity>() -> Self {
        let table = E::TABLE;
        let id = E::ID_COLUMN;
        let columns = E::COLUMNS.join(", ");
        let select = format!("SELECT {id}, {columns} FROM {table}");

        let insert_slots = placeholders(1, E::COLUMNS.len());
        let merge_slots = placeholders(2, E::COLUMNS.len());
        let assignments = E::COLUMNS
            .iter()
            .map(|column| format!("{column} = excluded.{column}"))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            select_all: format!("{select} ORDER BY {id} ASC;"),
            select_by_id: format!("{select} WHERE {id} = ?1;"),
            exists_by_id: format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE {id} = ?1);"),
            insert: format!("INSERT INTO {table} ({columns}) VALUES ({insert_slots});"),
            merge: format!(
                "INSERT INTO {table} ({id}, {columns}) VALUES (?1, {merge_slots})
                 ON CONFLICT({id}) DO UPDATE SET {assignments};"
            ),
            delete_by_id: format!("DELETE FROM {table} WHERE {id} = ?1;"),
        }
    }
}

fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Repository over one mapped entity type.
///
/// `save` inserts entities without an id and merges (full-row replace)
/// entities that carry one; both paths return the row as re-read from the
/// store.
pub struct EntityRepository<'conn, E: Entity> {
    conn: &'conn Connection,
    sql: EntitySql,
    _entity: PhantomData<E>,
}

impl<'conn, E: Entity> EntityRepository<'conn, E> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            sql: EntitySql::render::<E>(),
            _entity: PhantomData,
        }
    }

    pub fn find_all(&self) -> MappingResult<Vec<E>> {
        let mut stmt = self.conn.prepare(&self.sql.select_all)?;
        let entities = stmt
            .query_map([], |row| E::from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entities)
    }

    pub fn find_by_id(&self, id: i64) -> MappingResult<Option<E>> {
        let entity = self
            .conn
            .query_row(&self.sql.select_by_id, [id], |row| E::from_row(row))
            .optional()?;
        Ok(entity)
    }

    pub fn exists_by_id(&self, id: i64) -> MappingResult<bool> {
        let exists: i64 = self
            .conn
            .query_row(&self.sql.exists_by_id, [id], |row| row.get(0))?;
        Ok(exists == 1)
    }

    /// Existence probe on any declared column.
    pub fn exists_by(&self, column: &str, value: impl ToSql) -> MappingResult<bool> {
        let column = self.declared_column(column)?;
        let exists: i64 = self.conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE {column} = ?1);",
                E::TABLE
            ),
            [value],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    pub fn save(&self, entity: &E) -> MappingResult<E> {
        let values = entity.values();
        if values.len() != E::COLUMNS.len() {
            return Err(MappingError::ColumnCountMismatch {
                table: E::TABLE,
                expected: E::COLUMNS.len(),
                actual: values.len(),
            });
        }

        let id = match entity.id() {
            Some(id) => {
                let bound = std::iter::once(Value::Integer(id)).chain(values);
                self.conn.execute(&self.sql.merge, params_from_iter(bound))?;
                id
            }
            None => {
                self.conn
                    .execute(&self.sql.insert, params_from_iter(values))?;
                self.conn.last_insert_rowid()
            }
        };

        self.find_by_id(id)?.ok_or(MappingError::RefreshFailed {
            table: E::TABLE,
            id,
        })
    }

    /// Returns the number of deleted rows (0 or 1).
    pub fn delete_by_id(&self, id: i64) -> MappingResult<usize> {
        let deleted = self.conn.execute(&self.sql.delete_by_id, [id])?;
        Ok(deleted)
    }

    fn declared_column(&self, column: &str) -> MappingResult<&'static str> {
        std::iter::once(E::ID_COLUMN)
            .chain(E::COLUMNS.iter().copied())
            .find(|declared| *declared == column)
            .ok_or_else(|| MappingError::UnknownColumn {
                table: E::TABLE,
                column: column.to_string(),
            })
    }
}
