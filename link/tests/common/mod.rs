//! Shared fixtures for dbq-link integration tests.
//!
//! `MockDb` stands in for a live driver: it replays scripted columns and
//! rows, fails the first N round trips with scripted errors, and records
//! every statement and argument list it receives.

#![allow(dead_code)]

use async_trait::async_trait;
use dbq_link::{ColumnDescriptor, DriverError, ExecResult, Executor, Param, Queryer, RawCell, RowCursor};
use std::collections::VecDeque;
use std::sync::Mutex;

pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}

/// One recorded round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub sql: String,
    pub params: Vec<Param>,
}

pub struct MockDb {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Vec<RawCell>>,
    failures: Mutex<VecDeque<DriverError>>,
    cursor_error_after: Option<usize>,
    exec_result: ExecResult,
    calls: Mutex<Vec<Call>>,
}

impl MockDb {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            failures: Mutex::new(VecDeque::new()),
            cursor_error_after: None,
            exec_result: ExecResult::default(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Append a row given as text cells (`None` is SQL NULL).
    pub fn with_row(mut self, cells: &[Option<&str>]) -> Self {
        self.rows.push(cells.iter().map(|c| RawCell::from(*c)).collect());
        self
    }

    pub fn with_raw_row(mut self, cells: Vec<RawCell>) -> Self {
        self.rows.push(cells);
        self
    }

    /// Fail the next round trip with `err`. Queued errors are consumed in order.
    pub fn with_failure(self, err: DriverError) -> Self {
        self.lock_failures().push_back(err);
        self
    }

    /// Cursor yields `n` rows, then a transport error.
    pub fn with_cursor_error_after(mut self, n: usize) -> Self {
        self.cursor_error_after = Some(n);
        self
    }

    pub fn with_exec_result(mut self, result: ExecResult) -> Self {
        self.exec_result = result;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, VecDeque<DriverError>> {
        self.failures.lock().unwrap()
    }

    fn record(&self, sql: &str, params: &[Param]) -> Result<(), DriverError> {
        self.calls.lock().unwrap().push(Call {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        match self.lock_failures().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct MockCursor {
    columns: Vec<ColumnDescriptor>,
    rows: VecDeque<Vec<RawCell>>,
    remaining_before_error: Option<usize>,
}

#[async_trait]
impl RowCursor for MockCursor {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    async fn next_row(&mut self) -> Result<Option<Vec<RawCell>>, DriverError> {
        if let Some(remaining) = self.remaining_before_error.as_mut() {
            if *remaining == 0 {
                return Err(DriverError::Transport("connection reset while streaming".into()));
            }
            *remaining -= 1;
        }
        Ok(self.rows.pop_front())
    }
}

#[async_trait]
impl Queryer for MockDb {
    async fn query(&self, sql: &str, params: &[Param]) -> Result<Box<dyn RowCursor>, DriverError> {
        self.record(sql, params)?;
        Ok(Box::new(MockCursor {
            columns: self.columns.clone(),
            rows: self.rows.clone().into(),
            remaining_before_error: self.cursor_error_after,
        }))
    }
}

#[async_trait]
impl Executor for MockDb {
    async fn execute(&self, sql: &str, params: &[Param]) -> Result<ExecResult, DriverError> {
        self.record(sql, params)?;
        Ok(self.exec_result)
    }
}

/// `id BIGINT NOT NULL, name VARCHAR, score DOUBLE` with three rows.
pub fn users_db() -> MockDb {
    MockDb::new(vec![
        ColumnDescriptor::new("id", "BIGINT").not_null(),
        ColumnDescriptor::new("name", "VARCHAR").nullable(),
        ColumnDescriptor::new("score", "DOUBLE"),
    ])
    .with_row(&[Some("1"), Some("alice"), Some("9.5")])
    .with_row(&[Some("2"), None, Some("7")])
    .with_row(&[Some("3"), Some("carol"), None])
}
