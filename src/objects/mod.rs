//! Request builders, entity records and namespaces, one module per object kind.
//!
//! Each module follows the same shape: an entity record mapped from `SHOW`
//! rows, `Create*`/`Alter*` requests with chained setters, and a namespace
//! reached through [`crate::Client`] (`client.warehouses()`, `client.tasks()`,
//! ...) that renders and dispatches them.

pub mod common;

pub mod application_package;
pub mod cortex_search_service;
pub mod database;
pub mod database_role;
pub mod dynamic_table;
pub mod event_table;
pub mod external_table;
pub mod failover_group;
pub mod grants;
pub mod masking_policy;
pub mod network_policy;
pub mod notification_integration;
pub mod policy_references;
pub mod resource_monitor;
pub mod role;
pub mod row_access_policy;
pub mod schema;
pub mod secret;
pub mod sequence;
pub mod stage;
pub mod storage_integration;
pub mod stream;
pub mod table;
pub mod tag;
pub mod task;
pub mod user;
pub mod view;
pub mod warehouse;
