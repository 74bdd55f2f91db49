//! Typed identifiers, DDL request builders and SHOW/DESCRIBE mappers for Snowflake.
//!
//! Requests are plain values built with chained setters and rendered to one
//! deterministic SQL statement each. A [`Client`] renders them, sends the SQL
//! through a [`Driver`] and maps the rows it gets back onto typed records.
//! [`SnowflakeClient`] is the bundled driver, talking to the SQL REST API with
//! key-pair authentication.
//!
//! Example usage:
//!
//! ```rust,no_run
//! use light_snowflake_sdk::objects::warehouse::{CreateWarehouse, WarehouseProperties, WarehouseSize};
//! use light_snowflake_sdk::{AccountObjectIdentifier, Client, SnowflakeClient, SnowflakeError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SnowflakeError> {
//!     let client = Client::new(SnowflakeClient::from_env()?).with_query_tag("provisioning");
//!
//!     let id = AccountObjectIdentifier::new("REPORTING_WH")?;
//!     client
//!         .warehouses()
//!         .create(
//!             &CreateWarehouse::new(id.clone()).if_not_exists().properties(
//!                 WarehouseProperties::new()
//!                     .warehouse_size(WarehouseSize::XSmall)
//!                     .auto_suspend(60),
//!             ),
//!         )
//!         .await?;
//!
//!     let warehouse = client.warehouses().show_by_id(&id).await?;
//!     println!("{} is {:?}", warehouse.name, warehouse.state);
//!     Ok(())
//! }
//! ```
use jwt_simple::algorithms::RS256KeyPair;

#[macro_use]
mod macros;

mod client;
mod config;
mod datatypes;
mod driver;
mod errors;
mod identifiers;
mod jwt;
#[cfg(test)]
#[cfg(feature = "live-tests")]
mod live_tests;
pub mod objects;
mod partition;
mod row;
mod sql;
mod statement;
#[cfg(test)]
mod testing;

pub use client::{safe_show_by_id, Client, Identifiable};
pub use config::DEFAULT_TIMEOUT_SECS;
pub use datatypes::{DataType, TimestampTypeMapping, VectorElementType};
pub use driver::{CallContext, Driver, QueryIdSink};
pub use errors::{ErrorKind, SnowflakeError, SnowflakeResult, ALTER_NEEDS_EXACTLY_ONE_ACTION};
pub use identifiers::{
    AccountIdentifier, AccountObjectIdentifier, AnyObjectIdentifier, DatabaseObjectIdentifier,
    ExternalObjectIdentifier, ObjectIdentifier, SchemaObjectIdentifier,
    SchemaObjectIdentifierWithArguments, TableColumnIdentifier,
};
pub use jwt_simple;
pub use objects::common::{DropOptions, ObjectType, Properties, Property, ShowOptions, TagAssociation};
pub use partition::Partition;
pub use row::{FromRow, Row};
pub use sql::{dollar_quote, quote_string, Render};
pub use statement::{ColumnType, QueryResponse, Statement};

/// Connection settings for the SQL REST API, and the [`Driver`] built on them.
#[derive(Debug, Clone)]
pub struct SnowflakeClient {
    pub key_pair: RS256KeyPair,
    pub account: String,
    pub user: String,
    pub database: Option<String>,
    pub warehouse: Option<String>,
    pub role: Option<String>,
    /// Overrides `https://<account>.snowflakecomputing.com`
    pub host: Option<String>,
    /// Server-side statement timeout
    pub timeout_secs: u64,
}

impl SnowflakeClient {
    pub fn prepare(&self, sql: &str) -> Statement {
        Statement::new(sql, self)
    }
}
