//! Direct-SQL customer backend.
//!
//! # Responsibility
//! - Serve the `CustomerDao` port with hand-written statements.
//! - Map rows to `Customer` manually.
//!
//! # Invariants
//! - `update_customer` writes one targeted `UPDATE` per field inside a single
//!   immediate transaction; a failing statement rolls every field back.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::dao::{ensure_customer_connection_ready, CustomerDao, DaoError, DaoResult};
use crate::model::customer::{Customer, CustomerId, NewCustomer};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const CUSTOMER_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    age
FROM customer";

/// SQLite-backed customer DAO using hand-written statements.
pub struct SqliteCustomerDao<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCustomerDao<'conn> {
    /// Constructs a DAO from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> DaoResult<Self> {
        ensure_customer_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_customers(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> DaoResult<Vec<Customer>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut customers = Vec::new();

        while let Some(row) = rows.next()? {
            customers.push(parse_customer_row(row)?);
        }

        Ok(customers)
    }
}

impl CustomerDao for SqliteCustomerDao<'_> {
    fn find_all_customers(&self) -> DaoResult<Vec<Customer>> {
        self.query_customers(&format!("{CUSTOMER_SELECT_SQL} ORDER BY id ASC;"), [])
    }

    fn find_customer_by_id(&self, id: CustomerId) -> DaoResult<Option<Customer>> {
        let mut customers =
            self.query_customers(&format!("{CUSTOMER_SELECT_SQL} WHERE id = ?1;"), [id])?;
        Ok(customers.pop())
    }

    fn exists_by_email(&self, email: &str) -> DaoResult<bool> {
        let matches =
            self.query_customers(&format!("{CUSTOMER_SELECT_SQL} WHERE email = ?1;"), [email])?;
        Ok(!matches.is_empty())
    }

    fn exists_by_id(&self, id: CustomerId) -> DaoResult<bool> {
        Ok(self.find_customer_by_id(id)?.is_some())
    }

    fn save(&self, new_customer: &NewCustomer) -> DaoResult<Customer> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO customer (
                name,
                email,
                age
            ) VALUES (?1, ?2, ?3)
            RETURNING id, name, email, age;",
        )?;
        let mut rows = stmt.query(params![
            new_customer.name.as_str(),
            new_customer.email.as_str(),
            new_customer.age,
        ])?;

        if let Some(row) = rows.next()? {
            return parse_customer_row(row);
        }

        Err(DaoError::InvalidData(
            "insert returned no generated key".to_string(),
        ))
    }

    fn delete_by_id(&self, id: CustomerId) -> DaoResult<()> {
        self.conn.execute("DELETE FROM customer WHERE id = ?1;", [id])?;
        Ok(())
    }

    fn update_customer(&self, customer: &Customer) -> DaoResult<Customer> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let fields = [
            ("name", Value::Text(customer.name.clone())),
            ("email", Value::Text(customer.email.clone())),
            ("age", Value::Integer(i64::from(customer.age))),
        ];
        for (column, value) in fields {
            let changed = tx.execute(
                &format!("UPDATE customer SET {column} = ?1 WHERE id = ?2;"),
                params![value, customer.id],
            )?;
            if changed == 0 {
                return Err(DaoError::NotFound(customer.id));
            }
        }

        tx.commit()?;
        Ok(customer.clone())
    }
}

fn parse_customer_row(row: &Row<'_>) -> DaoResult<Customer> {
    let id: CustomerId = row.get("id")?;
    if id <= 0 {
        return Err(DaoError::InvalidData(format!(
            "invalid id value `{id}` in customer.id"
        )));
    }

    let age = row.get::<_, Option<i32>>("age")?.ok_or_else(|| {
        DaoError::InvalidData(format!("missing age for customer {id} in customer.age"))
    })?;

    Ok(Customer {
        id,
        name: row.get("name")?,
        email: row.get("email")?,
        age,
    })
}
