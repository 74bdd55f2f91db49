use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{AccountObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{DropOptions, ShowOptions, TagAssociation};
use crate::row::{FromRow, Row};
use crate::sql::{exactly_one_action, quote_string, Render, SqlBuilder};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WarehouseType {
    Standard,
    SnowparkOptimized,
}

impl WarehouseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarehouseType::Standard => "STANDARD",
            WarehouseType::SnowparkOptimized => "SNOWPARK-OPTIMIZED",
        }
    }
}

impl FromStr for WarehouseType {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> SnowflakeResult<Self> {
        match s.trim().to_ascii_uppercase().replace('_', "-").as_str() {
            "STANDARD" => Ok(WarehouseType::Standard),
            "SNOWPARK-OPTIMIZED" => Ok(WarehouseType::SnowparkOptimized),
            other => Err(SnowflakeError::InvalidRequest(format!(
                "unknown warehouse type {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WarehouseSize {
    XSmall,
    Small,
    Medium,
    Large,
    XLarge,
    XXLarge,
    XXXLarge,
    X4Large,
    X5Large,
    X6Large,
}

impl WarehouseSize {
    pub fn as_str(&self) -> &'static str {
        use WarehouseSize::*;
        match self {
            XSmall => "XSMALL",
            Small => "SMALL",
            Medium => "MEDIUM",
            Large => "LARGE",
            XLarge => "XLARGE",
            XXLarge => "XXLARGE",
            XXXLarge => "XXXLARGE",
            X4Large => "X4LARGE",
            X5Large => "X5LARGE",
            X6Large => "X6LARGE",
        }
    }
}

impl fmt::Display for WarehouseSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WarehouseSize {
    type Err = SnowflakeError;

    /// Accepts both the DDL spelling (`XSMALL`) and the SHOW spelling (`X-Small`, `2X-Large`).
    fn from_str(s: &str) -> SnowflakeResult<Self> {
        use WarehouseSize::*;
        let normalised = s.trim().to_ascii_uppercase().replace(['-', '_', ' '], "");
        Ok(match normalised.as_str() {
            "XSMALL" => XSmall,
            "SMALL" => Small,
            "MEDIUM" => Medium,
            "LARGE" => Large,
            "XLARGE" => XLarge,
            "XXLARGE" | "X2LARGE" | "2XLARGE" => XXLarge,
            "XXXLARGE" | "X3LARGE" | "3XLARGE" => XXXLarge,
            "X4LARGE" | "4XLARGE" => X4Large,
            "X5LARGE" | "5XLARGE" => X5Large,
            "X6LARGE" | "6XLARGE" => X6Large,
            _ => {
                return Err(SnowflakeError::InvalidRequest(format!(
                    "unknown warehouse size {s}"
                )))
            }
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalingPolicy {
    Standard,
    Economy,
}

impl ScalingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalingPolicy::Standard => "STANDARD",
            ScalingPolicy::Economy => "ECONOMY",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Warehouse {
    pub name: String,
    pub state: Option<String>,
    pub warehouse_type: Option<WarehouseType>,
    pub size: Option<WarehouseSize>,
    pub min_cluster_count: Option<i64>,
    pub max_cluster_count: Option<i64>,
    pub started_clusters: Option<i64>,
    pub running: Option<i64>,
    pub queued: Option<i64>,
    pub is_default: bool,
    pub is_current: bool,
    pub auto_suspend: Option<i64>,
    pub auto_resume: bool,
    pub created_on: Option<DateTime<Utc>>,
    pub resumed_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub enable_query_acceleration: bool,
    pub query_acceleration_max_scale_factor: Option<i64>,
    /// Unescaped name of the attached resource monitor
    pub resource_monitor: Option<String>,
    pub scaling_policy: Option<String>,
    pub owner_role_type: Option<String>,
}

impl Warehouse {
    pub fn resource_monitor_id(&self) -> Option<AccountObjectIdentifier> {
        self.resource_monitor
            .as_deref()
            .map(AccountObjectIdentifier::from_trusted)
    }
}

impl FromRow for Warehouse {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(Warehouse {
            name: row.string("name")?,
            state: row.opt_string("state"),
            warehouse_type: row.opt_string("type").and_then(|t| t.parse().ok()),
            size: row.opt_string("size").and_then(|s| s.parse().ok()),
            min_cluster_count: row.opt_int("min_cluster_count"),
            max_cluster_count: row.opt_int("max_cluster_count"),
            started_clusters: row.opt_int("started_clusters"),
            running: row.opt_int("running"),
            queued: row.opt_int("queued"),
            is_default: row.opt_bool("is_default").unwrap_or(false),
            is_current: row.opt_bool("is_current").unwrap_or(false),
            auto_suspend: row.opt_int("auto_suspend"),
            auto_resume: row.opt_bool("auto_resume").unwrap_or(false),
            created_on: row.opt_timestamp("created_on"),
            resumed_on: row.opt_timestamp("resumed_on"),
            updated_on: row.opt_timestamp("updated_on"),
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            enable_query_acceleration: row.opt_bool("enable_query_acceleration").unwrap_or(false),
            query_acceleration_max_scale_factor: row.opt_int("query_acceleration_max_scale_factor"),
            // SHOW spells a missing monitor as the text "null"
            resource_monitor: row
                .opt_string("resource_monitor")
                .filter(|m| !m.eq_ignore_ascii_case("null")),
            scaling_policy: row.opt_string("scaling_policy"),
            owner_role_type: row.opt_string("owner_role_type"),
        })
    }
}

impl Identifiable for Warehouse {
    type Id = AccountObjectIdentifier;

    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::from_trusted(&self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WarehouseDetail {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub kind: String,
}

impl FromRow for WarehouseDetail {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(WarehouseDetail {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            kind: row.string("kind")?,
        })
    }
}

/// Properties shared by CREATE and ALTER ... SET.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WarehouseProperties {
    warehouse_type: Option<WarehouseType>,
    warehouse_size: Option<WarehouseSize>,
    max_cluster_count: Option<u32>,
    min_cluster_count: Option<u32>,
    scaling_policy: Option<ScalingPolicy>,
    auto_suspend: Option<u32>,
    auto_resume: Option<bool>,
    resource_monitor: Option<AccountObjectIdentifier>,
    comment: Option<String>,
    enable_query_acceleration: Option<bool>,
    query_acceleration_max_scale_factor: Option<u32>,
    max_concurrency_level: Option<u32>,
    statement_queued_timeout_in_seconds: Option<u32>,
    statement_timeout_in_seconds: Option<u32>,
}

impl WarehouseProperties {
    pub fn new() -> WarehouseProperties {
        WarehouseProperties::default()
    }

    fn is_empty(&self) -> bool {
        self == &WarehouseProperties::default()
    }

    fn render_into(&self, sql: &mut SqlBuilder) {
        sql.opt_param(
            "WAREHOUSE_TYPE",
            self.warehouse_type.map(|t| quote_string(t.as_str())),
        )
        .opt_param("WAREHOUSE_SIZE", self.warehouse_size)
        .opt_param("MAX_CLUSTER_COUNT", self.max_cluster_count)
        .opt_param("MIN_CLUSTER_COUNT", self.min_cluster_count)
        .opt_param("SCALING_POLICY", self.scaling_policy.map(|p| p.as_str()))
        .opt_param("AUTO_SUSPEND", self.auto_suspend)
        .bool_param("AUTO_RESUME", self.auto_resume)
        .identifier_param("RESOURCE_MONITOR", self.resource_monitor.as_ref())
        .comment(self.comment.as_deref())
        .bool_param("ENABLE_QUERY_ACCELERATION", self.enable_query_acceleration)
        .opt_param(
            "QUERY_ACCELERATION_MAX_SCALE_FACTOR",
            self.query_acceleration_max_scale_factor,
        )
        .opt_param("MAX_CONCURRENCY_LEVEL", self.max_concurrency_level)
        .opt_param(
            "STATEMENT_QUEUED_TIMEOUT_IN_SECONDS",
            self.statement_queued_timeout_in_seconds,
        )
        .opt_param("STATEMENT_TIMEOUT_IN_SECONDS", self.statement_timeout_in_seconds);
    }
}

setters!(WarehouseProperties {
    warehouse_type: WarehouseType,
    warehouse_size: WarehouseSize,
    max_cluster_count: u32,
    min_cluster_count: u32,
    scaling_policy: ScalingPolicy,
    auto_suspend: u32,
    auto_resume: bool,
    resource_monitor: AccountObjectIdentifier,
    enable_query_acceleration: bool,
    query_acceleration_max_scale_factor: u32,
    max_concurrency_level: u32,
    statement_queued_timeout_in_seconds: u32,
    statement_timeout_in_seconds: u32,
});
string_setters!(WarehouseProperties { comment });

#[derive(Clone, Debug, PartialEq)]
pub struct CreateWarehouse {
    id: AccountObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    properties: WarehouseProperties,
    initially_suspended: Option<bool>,
    tags: Vec<TagAssociation>,
}

impl CreateWarehouse {
    pub fn new(id: AccountObjectIdentifier) -> CreateWarehouse {
        CreateWarehouse {
            id,
            or_replace: false,
            if_not_exists: false,
            properties: WarehouseProperties::default(),
            initially_suspended: None,
            tags: vec![],
        }
    }

    pub fn properties(mut self, properties: WarehouseProperties) -> Self {
        self.properties = properties;
        self
    }
}

flags!(CreateWarehouse { or_replace, if_not_exists });
setters!(CreateWarehouse { initially_suspended: bool });
list_setters!(CreateWarehouse { tags: TagAssociation });

impl Render for CreateWarehouse {
    fn render(&self) -> SnowflakeResult<String> {
        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword("WAREHOUSE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id);
        self.properties.render_into(&mut sql);
        sql.bool_param("INITIALLY_SUSPENDED", self.initially_suspended)
            .tags("WITH TAG", &self.tags);
        Ok(sql.finish())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WarehouseUnset {
    warehouse_type: bool,
    max_cluster_count: bool,
    min_cluster_count: bool,
    scaling_policy: bool,
    auto_suspend: bool,
    auto_resume: bool,
    resource_monitor: bool,
    comment: bool,
    enable_query_acceleration: bool,
    query_acceleration_max_scale_factor: bool,
    max_concurrency_level: bool,
    statement_queued_timeout_in_seconds: bool,
    statement_timeout_in_seconds: bool,
}

impl WarehouseUnset {
    pub fn new() -> WarehouseUnset {
        WarehouseUnset::default()
    }
}

flags!(WarehouseUnset {
    warehouse_type,
    max_cluster_count,
    min_cluster_count,
    scaling_policy,
    auto_suspend,
    auto_resume,
    resource_monitor,
    comment,
    enable_query_acceleration,
    query_acceleration_max_scale_factor,
    max_concurrency_level,
    statement_queued_timeout_in_seconds,
    statement_timeout_in_seconds,
});

#[derive(Clone, Debug, PartialEq)]
pub struct AlterWarehouse {
    id: AccountObjectIdentifier,
    if_exists: bool,
    suspend: bool,
    resume: bool,
    if_suspended: bool,
    abort_all_queries: bool,
    rename_to: Option<AccountObjectIdentifier>,
    set: Option<WarehouseProperties>,
    wait_for_completion: Option<bool>,
    unset: Option<WarehouseUnset>,
    set_tags: Vec<TagAssociation>,
    unset_tags: Vec<SchemaObjectIdentifier>,
}

impl AlterWarehouse {
    pub fn new(id: AccountObjectIdentifier) -> AlterWarehouse {
        AlterWarehouse {
            id,
            if_exists: false,
            suspend: false,
            resume: false,
            if_suspended: false,
            abort_all_queries: false,
            rename_to: None,
            set: None,
            wait_for_completion: None,
            unset: None,
            set_tags: vec![],
            unset_tags: vec![],
        }
    }
}

flags!(AlterWarehouse { if_exists, suspend, resume, if_suspended, abort_all_queries });
setters!(AlterWarehouse {
    rename_to: AccountObjectIdentifier,
    set: WarehouseProperties,
    wait_for_completion: bool,
    unset: WarehouseUnset,
});
list_setters!(AlterWarehouse { set_tags: TagAssociation, unset_tags: SchemaObjectIdentifier });

impl Render for AlterWarehouse {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.suspend,
            self.resume,
            self.abort_all_queries,
            self.rename_to.is_some(),
            self.set.is_some(),
            self.unset.is_some(),
            !self.set_tags.is_empty(),
            !self.unset_tags.is_empty(),
        ])?;
        let mut sql = SqlBuilder::new("ALTER WAREHOUSE");
        sql.keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_if(self.suspend, "SUSPEND")
            .keyword_if(self.resume, "RESUME")
            .keyword_if(self.resume && self.if_suspended, "IF SUSPENDED")
            .keyword_if(self.abort_all_queries, "ABORT ALL QUERIES")
            .keyword_identifier("RENAME TO", self.rename_to.as_ref())
            .set_tags(&self.set_tags)
            .unset_tags(&self.unset_tags);
        if let Some(set) = &self.set {
            if set.is_empty() && self.wait_for_completion.is_none() {
                return Err(SnowflakeError::InvalidRequest(
                    "ALTER WAREHOUSE SET: at least one property must be set".into(),
                ));
            }
            sql.keyword("SET");
            set.render_into(&mut sql);
            sql.bool_param("WAIT_FOR_COMPLETION", self.wait_for_completion);
        }
        if let Some(unset) = &self.unset {
            sql.checked_unset(
                "ALTER WAREHOUSE UNSET",
                &[
                    ("WAREHOUSE_TYPE", unset.warehouse_type),
                    ("MAX_CLUSTER_COUNT", unset.max_cluster_count),
                    ("MIN_CLUSTER_COUNT", unset.min_cluster_count),
                    ("SCALING_POLICY", unset.scaling_policy),
                    ("AUTO_SUSPEND", unset.auto_suspend),
                    ("AUTO_RESUME", unset.auto_resume),
                    ("RESOURCE_MONITOR", unset.resource_monitor),
                    ("COMMENT", unset.comment),
                    ("ENABLE_QUERY_ACCELERATION", unset.enable_query_acceleration),
                    (
                        "QUERY_ACCELERATION_MAX_SCALE_FACTOR",
                        unset.query_acceleration_max_scale_factor,
                    ),
                    ("MAX_CONCURRENCY_LEVEL", unset.max_concurrency_level),
                    (
                        "STATEMENT_QUEUED_TIMEOUT_IN_SECONDS",
                        unset.statement_queued_timeout_in_seconds,
                    ),
                    ("STATEMENT_TIMEOUT_IN_SECONDS", unset.statement_timeout_in_seconds),
                ],
            )?;
        }
        Ok(sql.finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Warehouses<'a> {
    client: &'a Client,
}

impl Client {
    pub fn warehouses(&self) -> Warehouses<'_> {
        Warehouses { client: self }
    }
}

impl Warehouses<'_> {
    pub async fn create(&self, request: &CreateWarehouse) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterWarehouse) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &AccountObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("WAREHOUSE", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<Warehouse>> {
        self.client.show("WAREHOUSES", options).await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Warehouse> {
        self.client.show_by_id("WAREHOUSES", id).await
    }

    pub async fn describe(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<WarehouseDetail> {
        let rows = self.client.describe_rows("WAREHOUSE", id).await?;
        let row = rows.first().ok_or(SnowflakeError::EmptyResult)?;
        WarehouseDetail::from_row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorKind, ALTER_NEEDS_EXACTLY_ONE_ACTION};
    use crate::testing::FakeDriver;

    #[test]
    fn create_with_monitor_needing_quotes() -> SnowflakeResult<()> {
        let id = AccountObjectIdentifier::new("a\"bc")?;
        let sql = CreateWarehouse::new(id.clone())
            .properties(
                WarehouseProperties::new()
                    .warehouse_type(WarehouseType::SnowparkOptimized)
                    .warehouse_size(WarehouseSize::Medium)
                    .auto_suspend(60)
                    .auto_resume(true)
                    .resource_monitor(id),
            )
            .initially_suspended(true)
            .render()?;
        assert_eq!(
            sql,
            "CREATE WAREHOUSE \"a\"\"bc\" WAREHOUSE_TYPE = 'SNOWPARK-OPTIMIZED' WAREHOUSE_SIZE = MEDIUM \
             AUTO_SUSPEND = 60 AUTO_RESUME = true RESOURCE_MONITOR = \"a\"\"bc\" INITIALLY_SUSPENDED = true"
        );
        Ok(())
    }

    #[test]
    fn sizes_parse_from_show() -> SnowflakeResult<()> {
        assert_eq!("X-Small".parse::<WarehouseSize>()?, WarehouseSize::XSmall);
        assert_eq!("2X-Large".parse::<WarehouseSize>()?, WarehouseSize::XXLarge);
        assert_eq!("X6LARGE".parse::<WarehouseSize>()?, WarehouseSize::X6Large);
        assert!("huge".parse::<WarehouseSize>().is_err());
        Ok(())
    }

    #[test]
    fn alter_variants() -> SnowflakeResult<()> {
        let id = AccountObjectIdentifier::new("WH")?;
        assert_eq!(
            AlterWarehouse::new(id.clone()).resume().if_suspended().render()?,
            "ALTER WAREHOUSE WH RESUME IF SUSPENDED"
        );
        assert_eq!(
            AlterWarehouse::new(id.clone())
                .set(WarehouseProperties::new().warehouse_size(WarehouseSize::Small))
                .wait_for_completion(true)
                .render()?,
            "ALTER WAREHOUSE WH SET WAREHOUSE_SIZE = SMALL WAIT_FOR_COMPLETION = true"
        );
        assert_eq!(
            AlterWarehouse::new(id.clone())
                .unset(WarehouseUnset::new().resource_monitor().comment())
                .render()?,
            "ALTER WAREHOUSE WH UNSET RESOURCE_MONITOR, COMMENT"
        );
        let err = AlterWarehouse::new(id).suspend().resume().render().unwrap_err();
        assert_eq!(err.to_string(), ALTER_NEEDS_EXACTLY_ONE_ACTION);
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        Ok(())
    }

    #[tokio::test]
    async fn show_maps_quoted_monitor() -> SnowflakeResult<()> {
        let driver = FakeDriver::new().with_rows(
            "SHOW WAREHOUSES LIKE 'a\"bc'",
            vec![Row::new()
                .with("name", "a\"bc")
                .with("size", "X-Small")
                .with("type", "STANDARD")
                .with("auto_resume", "true")
                .with("resource_monitor", "a\"bc")],
        );
        let client = Client::new(driver);
        let id = AccountObjectIdentifier::new("a\"bc")?;
        let warehouse = client.warehouses().show_by_id(&id).await?;
        assert_eq!(warehouse.name, "a\"bc");
        assert_eq!(warehouse.resource_monitor.as_deref(), Some("a\"bc"));
        assert_eq!(warehouse.resource_monitor_id(), Some(id));
        assert_eq!(warehouse.size, Some(WarehouseSize::XSmall));
        Ok(())
    }
}
