//! The transport seam.
//!
//! Everything above this trait only renders SQL and shapes rows; a [`Driver`]
//! is what actually talks to Snowflake. [`crate::SnowflakeClient`] implements it
//! over the SQL REST API, and tests implement it in memory.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::row::Row;

/// A slot the driver writes the server-assigned query id into.
///
/// Clones share the slot, so keep one clone and hand the other to the call.
#[derive(Clone, Debug, Default)]
pub struct QueryIdSink(Arc<Mutex<Option<String>>>);

impl QueryIdSink {
    pub fn new() -> QueryIdSink {
        QueryIdSink::default()
    }

    pub fn record(&self, query_id: impl Into<String>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(query_id.into());
    }

    pub fn query_id(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Per-invocation metadata passed along with every statement.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    pub query_tag: Option<String>,
    pub query_id_sink: Option<QueryIdSink>,
}

impl CallContext {
    pub(crate) fn record_query_id(&self, query_id: &str) {
        if let Some(sink) = &self.query_id_sink {
            sink.record(query_id);
        }
    }
}

#[async_trait]
pub trait Driver: Send + Sync {
    /// Run a statement whose rows are not needed, returning the affected row count
    async fn exec(&self, sql: &str, context: &CallContext) -> SnowflakeResult<u64>;

    /// Run a statement and materialise every row it returns
    async fn query_rows(&self, sql: &str, context: &CallContext) -> SnowflakeResult<Vec<Row>>;

    /// Run a statement that must return at least one row and keep the first
    async fn query_one(&self, sql: &str, context: &CallContext) -> SnowflakeResult<Row> {
        self.query_rows(sql, context)
            .await?
            .into_iter()
            .next()
            .ok_or(SnowflakeError::EmptyResult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_clones_share_the_slot() {
        let sink = QueryIdSink::new();
        let context = CallContext {
            query_tag: None,
            query_id_sink: Some(sink.clone()),
        };
        assert_eq!(sink.query_id(), None);
        context.record_query_id("01b2-0000");
        assert_eq!(sink.query_id().as_deref(), Some("01b2-0000"));
    }

    #[test]
    fn sink_survives_a_poisoned_lock() {
        let sink = QueryIdSink::new();
        sink.record("01b2-0001");
        let holder = sink.clone();
        let panicked = std::thread::spawn(move || {
            let _slot = holder.0.lock();
            panic!("poison the slot");
        })
        .join();
        assert!(panicked.is_err());
        assert!(sink.0.is_poisoned());

        assert_eq!(sink.query_id().as_deref(), Some("01b2-0001"));
        sink.record("01b2-0002");
        assert_eq!(sink.query_id().as_deref(), Some("01b2-0002"));
    }
}
