#![allow(dead_code)]

use customer_core::db::open_db_in_memory;
use customer_core::{
    dao_for, BackendKind, ConstraintKind, Customer, CustomerDao, CustomerId,
    CustomerRegistrationRequest, DaoError, DaoResult, NewCustomer,
};
use rusqlite::Connection;
use std::cell::{Cell, RefCell};

pub const BACKENDS: [BackendKind; 2] = [BackendKind::DirectSql, BackendKind::Mapped];

const FIRST_NAMES: &[&str] = &["Ada", "Grace", "Alan", "Edsger", "Barbara", "Donald"];
const LAST_NAMES: &[&str] = &["Lovelace", "Hopper", "Turing", "Dijkstra", "Liskov", "Knuth"];

/// Seedable test-data generator; each test builds its own.
pub struct TestData {
    state: u64,
}

impl TestData {
    pub fn seeded(seed: u64) -> Self {
        Self { state: seed }
    }

    // splitmix64
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn pick(&mut self, values: &[&'static str]) -> &'static str {
        values[(self.next_u64() % values.len() as u64) as usize]
    }

    pub fn name(&mut self) -> String {
        let first = self.pick(FIRST_NAMES);
        let last = self.pick(LAST_NAMES);
        format!("{first} {last}")
    }

    /// Unique per generator call; derived from seeded bytes.
    pub fn email(&mut self) -> String {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.next_u64().to_le_bytes());
        bytes[8..].copy_from_slice(&self.next_u64().to_le_bytes());
        let id = uuid::Builder::from_random_bytes(bytes).into_uuid();
        format!("{}@example.com", id.simple())
    }

    pub fn age(&mut self) -> i32 {
        16 + (self.next_u64() % 64) as i32
    }

    pub fn registration(&mut self) -> CustomerRegistrationRequest {
        CustomerRegistrationRequest::new(self.name(), self.email(), Some(self.age()))
    }

    pub fn new_customer(&mut self) -> NewCustomer {
        NewCustomer::new(self.name(), self.email(), Some(self.age()))
    }
}

/// Opens a fresh migrated store and hands `check` the DAO of `backend`.
pub fn with_backend<T>(
    backend: BackendKind,
    check: impl FnOnce(&dyn CustomerDao, &Connection) -> T,
) -> T {
    let conn = open_db_in_memory().unwrap();
    let dao = dao_for(backend, &conn).unwrap();
    check(&*dao, &conn)
}

pub fn row_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM customer;", [], |row| row.get(0))
        .unwrap()
}

/// In-memory DAO fake that records every port call.
#[derive(Default)]
pub struct RecordingDao {
    rows: RefCell<Vec<Customer>>,
    next_id: Cell<CustomerId>,
    calls: RefCell<Vec<&'static str>>,
    /// Makes the next `save`/`update_customer` fail like a lost race on the
    /// email unique index.
    pub reject_next_write: Cell<bool>,
}

impl RecordingDao {
    pub fn with_rows(rows: Vec<Customer>) -> Self {
        let next_id = rows.iter().map(|row| row.id).max().unwrap_or(0);
        let dao = Self::default();
        dao.next_id.set(next_id);
        *dao.rows.borrow_mut() = rows;
        dao
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.borrow().iter().filter(|call| **call == name).count()
    }

    pub fn stored(&self, id: CustomerId) -> Option<Customer> {
        self.rows.borrow().iter().find(|row| row.id == id).cloned()
    }

    fn record(&self, name: &'static str) {
        self.calls.borrow_mut().push(name);
    }

    fn take_rejection(&self) -> DaoResult<()> {
        if self.reject_next_write.replace(false) {
            return Err(DaoError::ConstraintViolation {
                constraint: ConstraintKind::Unique,
                message: "UNIQUE constraint failed: customer.email".to_string(),
            });
        }
        Ok(())
    }
}

impl CustomerDao for RecordingDao {
    fn find_all_customers(&self) -> DaoResult<Vec<Customer>> {
        self.record("find_all_customers");
        Ok(self.rows.borrow().clone())
    }

    fn find_customer_by_id(&self, id: CustomerId) -> DaoResult<Option<Customer>> {
        self.record("find_customer_by_id");
        Ok(self.stored(id))
    }

    fn exists_by_email(&self, email: &str) -> DaoResult<bool> {
        self.record("exists_by_email");
        Ok(self.rows.borrow().iter().any(|row| row.email == email))
    }

    fn exists_by_id(&self, id: CustomerId) -> DaoResult<bool> {
        self.record("exists_by_id");
        Ok(self.stored(id).is_some())
    }

    fn save(&self, new_customer: &NewCustomer) -> DaoResult<Customer> {
        self.record("save");
        self.take_rejection()?;
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let customer = Customer::new(
            id,
            new_customer.name.clone(),
            new_customer.email.clone(),
            new_customer.age.unwrap_or_default(),
        );
        self.rows.borrow_mut().push(customer.clone());
        Ok(customer)
    }

    fn delete_by_id(&self, id: CustomerId) -> DaoResult<()> {
        self.record("delete_by_id");
        self.rows.borrow_mut().retain(|row| row.id != id);
        Ok(())
    }

    fn update_customer(&self, customer: &Customer) -> DaoResult<Customer> {
        self.record("update_customer");
        self.take_rejection()?;
        let mut rows = self.rows.borrow_mut();
        let row = rows
            .iter_mut()
            .find(|row| row.id == customer.id)
            .ok_or(DaoError::NotFound(customer.id))?;
        *row = customer.clone();
        Ok(customer.clone())
    }
}
