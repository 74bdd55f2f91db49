//! An in-memory [`Driver`] for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::driver::{CallContext, Driver};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::row::Row;

#[derive(Clone, Debug)]
enum Canned {
    Rows(Vec<Row>),
    Error(String),
}

#[derive(Debug, Default)]
struct State {
    canned: HashMap<String, VecDeque<Canned>>,
    sent: Vec<String>,
    query_tags: Vec<Option<String>>,
}

/// Serves canned rows or remote errors per exact SQL text and records what was sent.
///
/// Registering the same statement more than once queues the answers; the last
/// one keeps being served once the queue is drained. A statement with no
/// canned answer fails like a compilation error would.
#[derive(Clone, Debug, Default)]
pub(crate) struct FakeDriver {
    state: Arc<Mutex<State>>,
}

impl FakeDriver {
    pub fn new() -> FakeDriver {
        FakeDriver::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(self, sql: &str, canned: Canned) -> FakeDriver {
        self.state()
            .canned
            .entry(sql.to_owned())
            .or_default()
            .push_back(canned);
        self
    }

    /// Accept a statement that returns no rows
    pub fn with_exec(self, sql: &str) -> FakeDriver {
        self.push(sql, Canned::Rows(vec![]))
    }

    pub fn with_rows(self, sql: &str, rows: Vec<Row>) -> FakeDriver {
        self.push(sql, Canned::Rows(rows))
    }

    /// Fail a statement with a remote SQL error carrying `message`
    pub fn with_error(self, sql: &str, message: &str) -> FakeDriver {
        self.push(sql, Canned::Error(message.to_owned()))
    }

    pub fn sent(&self) -> Vec<String> {
        self.state().sent.clone()
    }

    pub fn last_query_tag(&self) -> Option<String> {
        self.state().query_tags.last().cloned().flatten()
    }

    fn answer(&self, sql: &str, context: &CallContext) -> SnowflakeResult<Vec<Row>> {
        let mut state = self.state();
        state.sent.push(sql.to_owned());
        state.query_tags.push(context.query_tag.clone());
        let query_id = format!("01fake-{:04}", state.sent.len());
        context.record_query_id(&query_id);

        let queue = state.canned.get_mut(sql).ok_or_else(|| SnowflakeError::ServerError {
            code: "001003".into(),
            message: format!("SQL compilation error: no canned answer for {sql:?}"),
        })?;
        let canned = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match canned {
            Some(Canned::Rows(rows)) => Ok(rows),
            Some(Canned::Error(message)) => Err(SnowflakeError::ServerError {
                code: "002003".into(),
                message,
            }),
            None => Ok(vec![]),
        }
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn exec(&self, sql: &str, context: &CallContext) -> SnowflakeResult<u64> {
        self.answer(sql, context).map(|rows| rows.len() as u64)
    }

    async fn query_rows(&self, sql: &str, context: &CallContext) -> SnowflakeResult<Vec<Row>> {
        self.answer(sql, context)
    }
}

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
