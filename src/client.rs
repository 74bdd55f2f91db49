//! The dispatcher: renders requests, sends them through a [`Driver`] and maps
//! the rows that come back.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::driver::{CallContext, Driver, QueryIdSink};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::ObjectIdentifier;
use crate::objects::common::{
    DescribeStatement, DropOptions, DropStatement, Properties, ShowOptions, ShowScope,
    ShowStatement,
};
use crate::row::{FromRow, Row};
use crate::sql::Render;

/// Entry point to every object namespace.
///
/// Cloning is cheap; all clones share the driver. The call context
/// (query tag, query id sink) is per clone, see [`Client::with_query_tag`].
#[derive(Clone)]
pub struct Client {
    driver: Arc<dyn Driver>,
    context: CallContext,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(driver: impl Driver + 'static) -> Client {
        Client::from_arc(Arc::new(driver))
    }

    pub fn from_arc(driver: Arc<dyn Driver>) -> Client {
        Client {
            driver,
            context: CallContext::default(),
        }
    }

    /// A copy of this client whose statements carry the given `QUERY_TAG`
    pub fn with_query_tag(&self, query_tag: impl Into<String>) -> Client {
        let mut client = self.clone();
        client.context.query_tag = Some(query_tag.into());
        client
    }

    /// A copy of this client that reports every query id into `sink`
    pub fn with_query_id_sink(&self, sink: QueryIdSink) -> Client {
        let mut client = self.clone();
        client.context.query_id_sink = Some(sink);
        client
    }

    pub fn context(&self) -> &CallContext {
        &self.context
    }

    /// Run arbitrary SQL. Nothing is validated or classified.
    pub async fn exec_unsafe(&self, sql: &str) -> SnowflakeResult<u64> {
        debug!("exec (unsafe): {sql}");
        self.driver.exec(sql, &self.context).await
    }

    /// Run arbitrary SQL and return the raw rows.
    pub async fn query_unsafe(&self, sql: &str) -> SnowflakeResult<Vec<Row>> {
        debug!("query (unsafe): {sql}");
        self.driver.query_rows(sql, &self.context).await
    }

    pub(crate) async fn exec<R: Render + Sync + ?Sized>(&self, request: &R) -> SnowflakeResult<()> {
        let sql = request.render()?;
        debug!("exec: {sql}");
        let affected = self
            .driver
            .exec(&sql, &self.context)
            .await
            .map_err(SnowflakeError::classify)?;
        trace!("{affected} rows affected");
        Ok(())
    }

    pub(crate) async fn query_rows<R: Render + Sync + ?Sized>(
        &self,
        request: &R,
    ) -> SnowflakeResult<Vec<Row>> {
        let sql = request.render()?;
        debug!("query: {sql}");
        let rows = self
            .driver
            .query_rows(&sql, &self.context)
            .await
            .map_err(SnowflakeError::classify)?;
        trace!("{} rows returned", rows.len());
        Ok(rows)
    }

    pub(crate) async fn query<T: FromRow, R: Render + Sync + ?Sized>(
        &self,
        request: &R,
    ) -> SnowflakeResult<Vec<T>> {
        self.query_rows(request)
            .await?
            .iter()
            .map(T::from_row)
            .collect()
    }

    pub(crate) async fn query_one<T: FromRow, R: Render + Sync + ?Sized>(
        &self,
        request: &R,
    ) -> SnowflakeResult<T> {
        let sql = request.render()?;
        debug!("query one: {sql}");
        let row = self
            .driver
            .query_one(&sql, &self.context)
            .await
            .map_err(SnowflakeError::classify)?;
        T::from_row(&row)
    }

    /// `SHOW <noun>` with the given refinements
    pub(crate) async fn show<T: FromRow>(
        &self,
        noun: &'static str,
        options: &ShowOptions,
    ) -> SnowflakeResult<Vec<T>> {
        self.query(&ShowStatement { noun, options }).await
    }

    /// `SHOW <noun> LIKE '<name>' IN <scope>` narrowed to the exact identifier
    pub(crate) async fn show_by_id<T>(&self, noun: &'static str, id: &T::Id) -> SnowflakeResult<T>
    where
        T: FromRow + Identifiable,
        T::Id: ShowScope,
    {
        let items = self.show::<T>(noun, &id.show_by_id_options()).await?;
        find_by_id(items, id)
    }

    pub(crate) async fn drop_object(
        &self,
        noun: &'static str,
        id: &impl ObjectIdentifier,
        options: &DropOptions,
    ) -> SnowflakeResult<()> {
        self.exec(&DropStatement {
            noun,
            name: id.fully_qualified_name(),
            options,
        })
        .await
    }

    pub(crate) async fn describe_rows(
        &self,
        noun: &'static str,
        id: &impl ObjectIdentifier,
    ) -> SnowflakeResult<Vec<Row>> {
        self.query_rows(&DescribeStatement {
            noun,
            name: id.fully_qualified_name(),
        })
        .await
    }

    /// `DESCRIBE <noun> <id>` for objects that answer with one row per property
    pub(crate) async fn describe_properties(
        &self,
        noun: &'static str,
        id: &impl ObjectIdentifier,
    ) -> SnowflakeResult<Properties> {
        Properties::from_rows(&self.describe_rows(noun, id).await?)
    }
}

/// An entity that can report its own identifier.
pub trait Identifiable {
    type Id: ObjectIdentifier;

    fn id(&self) -> Self::Id;
}

/// Keep the single item whose identifier equals `id`.
///
/// `LIKE` is case-insensitive and treats `_` as a wildcard, so a SHOW-by-id
/// can return siblings; only an exact identifier match counts.
pub(crate) fn find_by_id<T: Identifiable>(items: Vec<T>, id: &T::Id) -> SnowflakeResult<T> {
    let mut matches = items.into_iter().filter(|item| &item.id() == id);
    let found = matches.next().ok_or_else(SnowflakeError::not_found)?;
    if matches.next().is_some() {
        warn!("more than one object matched {}, keeping the first", id.fully_qualified_name());
    }
    Ok(found)
}

/// Show an object by id, telling "the object is gone" apart from "a scope it lives in is gone".
///
/// The error always matches [`crate::ErrorKind::ObjectNotFound`] together with
/// exactly one of [`crate::ErrorKind::ObjectNotExistOrAuthorized`] (the
/// object itself is missing) or
/// [`crate::ErrorKind::DoesNotExistOrOperationCannotBePerformed`] (an
/// enclosing database or schema is missing).
pub async fn safe_show_by_id<I, T, F, Fut>(show_by_id: F, id: I) -> SnowflakeResult<T>
where
    I: ObjectIdentifier,
    F: FnOnce(I) -> Fut,
    Fut: Future<Output = SnowflakeResult<T>>,
{
    let name = id.fully_qualified_name();
    show_by_id(id)
        .await
        .map_err(|err| err.into_object_not_found(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::identifiers::AccountObjectIdentifier;
    use crate::testing::FakeDriver;

    #[derive(Debug)]
    struct Named(AccountObjectIdentifier);

    impl Identifiable for Named {
        type Id = AccountObjectIdentifier;

        fn id(&self) -> AccountObjectIdentifier {
            self.0.clone()
        }
    }

    #[test]
    fn find_by_id_skips_case_insensitive_siblings() -> SnowflakeResult<()> {
        let wanted = AccountObjectIdentifier::new("abc")?;
        let items = vec![
            Named(AccountObjectIdentifier::new("ABC")?),
            Named(AccountObjectIdentifier::new("abc")?),
        ];
        assert_eq!(find_by_id(items, &wanted)?.0, wanted);

        let err = find_by_id(vec![Named(AccountObjectIdentifier::new("ABC")?)], &wanted)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ObjectNotFound);
        Ok(())
    }

    #[tokio::test]
    async fn query_tag_and_sink_reach_the_driver() -> SnowflakeResult<()> {
        let driver = FakeDriver::new().with_exec("SELECT 1");
        let sink = QueryIdSink::new();
        let client = Client::new(driver.clone())
            .with_query_tag("nightly")
            .with_query_id_sink(sink.clone());
        client.exec_unsafe("SELECT 1").await?;
        assert_eq!(driver.last_query_tag().as_deref(), Some("nightly"));
        assert!(sink.query_id().is_some());
        Ok(())
    }

    #[tokio::test]
    async fn safe_show_synthesises_not_authorized_cause() -> SnowflakeResult<()> {
        let id = AccountObjectIdentifier::new("GONE")?;
        let err = safe_show_by_id(
            |_id: AccountObjectIdentifier| async { Err::<(), _>(SnowflakeError::not_found()) },
            id,
        )
        .await
        .unwrap_err();
        assert!(err.is(ErrorKind::ObjectNotFound));
        assert!(err.is(ErrorKind::ObjectNotExistOrAuthorized));
        assert!(!err.is(ErrorKind::DoesNotExistOrOperationCannotBePerformed));
        Ok(())
    }
}
