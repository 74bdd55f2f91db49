use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, TryStream, TryStreamExt};
use serde::{Deserialize, Serialize};

use crate::driver::{CallContext, Driver};
use crate::errors::{SnowflakeError, SnowflakeResult, SnowflakeWireResult};
use crate::partition::{Partition, StringTable};
use crate::row::Row;
use crate::{jwt, SnowflakeClient};

/// One statement submitted to the SQL API (created by [`SnowflakeClient::prepare`]).
#[derive(Debug, Clone)]
pub struct Statement {
    host: String,
    wire: WireStatement,
    request_id: uuid::Uuid,
    config: SnowflakeClient,
}

impl Statement {
    pub fn new(sql: &str, config: &SnowflakeClient) -> Statement {
        Statement {
            host: config.base_url(),
            wire: WireStatement {
                statement: sql.to_owned(),
                timeout: Some(config.timeout_secs),
                database: config.database.as_ref().map(|x| x.to_ascii_uppercase()),
                warehouse: config.warehouse.as_ref().map(|x| x.to_ascii_uppercase()),
                role: config.role.as_ref().map(|x| x.to_ascii_uppercase()),
                parameters: HashMap::new(),
            },
            request_id: uuid::Uuid::new_v4(),
            config: config.to_owned(),
        }
    }

    fn client(&self) -> SnowflakeResult<reqwest::Client> {
        use reqwest::header::*;
        let token = jwt::create_token(&self.config.key_pair, &self.config.account, &self.config.user)?;

        let mut headers = HeaderMap::with_capacity(5);
        headers.append(CONTENT_TYPE, "application/json".parse()?);
        headers.append(AUTHORIZATION, format!("Bearer {token}").parse()?);
        headers.append(
            "X-Snowflake-Authorization-Token-Type",
            "KEYPAIR_JWT".parse()?,
        );
        headers.append(ACCEPT, "application/json".parse()?);
        headers.append(
            USER_AGENT,
            concat!(env!("CARGO_PKG_NAME"), '/', env!("CARGO_PKG_VERSION")).parse()?,
        );

        Ok(reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(
                self.wire.timeout.unwrap_or(self.config.timeout_secs) + 15,
            ))
            .build()?)
    }

    async fn send(&self) -> SnowflakeResult<reqwest::Response> {
        log::debug!("sending statement: {}", serde_json::to_string(&self.wire)?);
        Ok(self
            .client()?
            .post(format!(
                "{}/api/v2/statements?nullable=true&requestId={}",
                self.host, self.request_id
            ))
            .json(&self.wire)
            .send()
            .await?)
    }

    /// Submit the statement and buffer the first partition of its result
    pub async fn execute(&self) -> SnowflakeResult<QueryResponse> {
        self.execute_in(&CallContext::default()).await
    }

    /// Like [`Statement::execute`], recording the statement handle in the
    /// context's sink even when the statement fails
    pub(crate) async fn execute_in(&self, context: &CallContext) -> SnowflakeResult<QueryResponse> {
        let wire = self
            .send()
            .await?
            .json::<SnowflakeWireResult<WireQueryResponse>>()
            .await?;
        match &wire {
            SnowflakeWireResult::Ok(response) => context.record_query_id(&response.statement_handle),
            SnowflakeWireResult::Error {
                statement_handle: Some(handle),
                ..
            } => context.record_query_id(handle),
            SnowflakeWireResult::Error { .. } => {}
        }
        Ok(wire.into_result()?.hydrate(self.clone()))
    }

    /// Server-side timeout; the HTTP client waits 15 seconds longer
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Statement {
        self.wire.timeout = Some(timeout_seconds);
        self
    }

    /// Label the statement with `QUERY_TAG` for this call only
    pub fn with_query_tag(mut self, query_tag: &str) -> Statement {
        self.wire
            .parameters
            .insert("QUERY_TAG".to_owned(), query_tag.to_owned());
        self
    }
}

/// The result of a submitted statement.
///
/// The first partition arrives with the response; the rest are fetched on
/// demand through the statement status URL.
#[derive(Debug)]
pub struct QueryResponse {
    num_rows: usize,
    num_partitions: usize,
    columns: Arc<Vec<ColumnType>>,
    data: Arc<StringTable>,
    statement_handle: String,
    statement_status_url: String,
    statement: Statement,
}

impl QueryResponse {
    /// Rows across all partitions
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_partitions(&self) -> usize {
        self.num_partitions
    }

    pub fn column_types(&self) -> &[ColumnType] {
        &self.columns
    }

    /// The server-assigned id of the statement
    pub fn statement_handle(&self) -> &str {
        &self.statement_handle
    }

    fn first_partition(&self) -> Partition {
        Partition {
            index: 0,
            columns: self.columns.clone(),
            data: self.data.clone(),
        }
    }

    async fn fetch_partition(&self, index: usize) -> SnowflakeResult<Partition> {
        if index == 0 {
            return Ok(self.first_partition());
        }
        let url = self.statement.host.trim_end_matches('/').to_owned() + &self.statement_status_url;
        let response = self
            .statement
            .client()?
            .get(&url)
            .query(&[("partition", index)])
            .send()
            .await?
            .json::<SnowflakeWireResult<WirePartitionResponse>>()
            .await?
            .into_result()?;
        Ok(Partition {
            index,
            columns: self.columns.clone(),
            data: response.data,
        })
    }

    /// A single partition, or `None` past the last one
    pub async fn partition(&self, index: usize) -> SnowflakeResult<Option<Partition>> {
        if index == 0 || index < self.num_partitions {
            self.fetch_partition(index).await.map(Some)
        } else {
            Ok(None)
        }
    }

    /// Every partition in order, keeping one request in flight
    pub fn partitions(&self) -> impl TryStream<Ok = Partition, Error = SnowflakeError> + '_ {
        let count = self.num_partitions.max(1);
        futures::stream::iter((0..count).map(|index| self.fetch_partition(index))).buffered(1)
    }

    /// Concatenate all partitions into one
    pub async fn concat_partitions(&self) -> SnowflakeResult<Partition> {
        let mut cells = Vec::with_capacity(self.num_rows);
        let partitions = self.partitions().try_collect::<Vec<_>>().await?;
        for partition in partitions {
            cells.extend(partition.data.iter().cloned());
        }
        Ok(Partition {
            index: 0,
            columns: self.columns.clone(),
            data: Arc::new(cells),
        })
    }

    /// Every row of every partition
    pub async fn rows(&self) -> SnowflakeResult<Vec<Row>> {
        Ok(self.concat_partitions().await?.rows())
    }
}

impl SnowflakeClient {
    fn statement_for(&self, sql: &str, context: &CallContext) -> Statement {
        let statement = self.prepare(sql);
        match &context.query_tag {
            Some(tag) => statement.with_query_tag(tag),
            None => statement,
        }
    }
}

#[async_trait]
impl Driver for SnowflakeClient {
    async fn exec(&self, sql: &str, context: &CallContext) -> SnowflakeResult<u64> {
        let response = self.statement_for(sql, context).execute_in(context).await?;
        Ok(response.num_rows() as u64)
    }

    async fn query_rows(&self, sql: &str, context: &CallContext) -> SnowflakeResult<Vec<Row>> {
        let response = self.statement_for(sql, context).execute_in(context).await?;
        let rows = response.rows().await?;
        log::trace!(
            "{} rows in {} partitions",
            rows.len(),
            response.num_partitions()
        );
        Ok(rows)
    }
}

//
// Wire types
//

/// A column of the result set as described by `resultSetMetaData.rowType`.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ColumnType {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct WireStatementMetaData {
    num_rows: usize,
    row_type: Vec<ColumnType>,
    #[serde(default)]
    partition_info: Vec<serde_json::Value>,
}

#[derive(Serialize, Debug, Clone)]
struct WireStatement {
    statement: String,
    timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    parameters: HashMap<String, String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct WireQueryResponse {
    result_set_meta_data: WireStatementMetaData,
    data: Arc<StringTable>,
    statement_handle: String,
    statement_status_url: String,
}

impl WireQueryResponse {
    fn hydrate(self, statement: Statement) -> QueryResponse {
        QueryResponse {
            num_rows: self.result_set_meta_data.num_rows,
            num_partitions: self.result_set_meta_data.partition_info.len(),
            columns: Arc::new(self.result_set_meta_data.row_type),
            data: self.data,
            statement_handle: self.statement_handle,
            statement_status_url: self.statement_status_url,
            statement,
        }
    }
}

#[derive(Deserialize, Debug)]
struct WirePartitionResponse {
    data: Arc<StringTable>,
}

#[cfg(test)]
mod tests {
    use jwt_simple::algorithms::RS256KeyPair;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::driver::QueryIdSink;
    use crate::errors::ErrorKind;
    use crate::{Client, ShowOptions};

    fn config(host: &str) -> SnowflakeResult<SnowflakeClient> {
        Ok(SnowflakeClient {
            key_pair: RS256KeyPair::generate(2048)?,
            account: "xy12345".into(),
            user: "svc".into(),
            database: Some("db".into()),
            warehouse: None,
            role: Some("sysadmin".into()),
            host: Some(host.into()),
            timeout_secs: 30,
        })
    }

    fn column(name: &str) -> serde_json::Value {
        json!({"name": name, "type": "text", "nullable": true})
    }

    #[test]
    fn wire_statement_uppercases_context() -> SnowflakeResult<()> {
        let statement = config("http://localhost")?
            .prepare("SHOW WAREHOUSES")
            .with_query_tag("nightly");
        let body = serde_json::to_value(&statement.wire)?;
        assert_eq!(body["database"], "DB");
        assert_eq!(body["role"], "SYSADMIN");
        assert!(body.get("warehouse").is_none());
        assert_eq!(body["parameters"]["QUERY_TAG"], "nightly");
        Ok(())
    }

    #[tokio::test]
    async fn rows_span_partitions_and_record_the_handle() -> SnowflakeResult<()> {
        crate::testing::init_logging();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/statements"))
            .and(body_partial_json(json!({
                "statement": "SHOW WAREHOUSES",
                "parameters": {"QUERY_TAG": "nightly"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resultSetMetaData": {
                    "numRows": 2,
                    "format": "jsonv2",
                    "rowType": [column("name"), column("comment")],
                    "partitionInfo": [{"rowCount": 1}, {"rowCount": 1}]
                },
                "data": [["WH1", null]],
                "code": "090001",
                "statementStatusUrl": "/api/v2/statements/01b0-handle",
                "statementHandle": "01b0-handle",
                "requestId": "r",
                "sqlState": "00000",
                "message": "Statement executed successfully."
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/statements/01b0-handle"))
            .and(query_param("partition", "1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": [["WH2", "second"]]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let sink = QueryIdSink::new();
        let client = Client::new(config(&server.uri())?)
            .with_query_tag("nightly")
            .with_query_id_sink(sink.clone());
        let rows = client.query_unsafe("SHOW WAREHOUSES").await?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].opt_string("comment").as_deref(), Some("second"));
        assert_eq!(sink.query_id().as_deref(), Some("01b0-handle"));
        Ok(())
    }

    #[tokio::test]
    async fn server_errors_are_classified() -> SnowflakeResult<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/statements"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "code": "002003",
                "message": "SQL compilation error:\nDatabase 'NOPE' does not exist or not authorized.",
                "sqlState": "02000",
                "statementHandle": "01b0-failed"
            })))
            .mount(&server)
            .await;

        let sink = QueryIdSink::new();
        let client = Client::new(config(&server.uri())?).with_query_id_sink(sink.clone());
        let err = client
            .warehouses()
            .show(&ShowOptions::new().like("NOPE"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ObjectNotExistOrAuthorized);
        assert!(err.to_string().contains("Database 'NOPE' does not exist"));
        assert_eq!(sink.query_id().as_deref(), Some("01b0-failed"));
        Ok(())
    }
}
