use std::fmt;

use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::SnowflakeResult;
use crate::identifiers::{AccountObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{DropOptions, ShowOptions};
use crate::objects::table::ColumnDetail;
use crate::row::{FromRow, Row};
use crate::sql::{at_least_one, exactly_one_action, quote_string, required, Render, SqlBuilder};

/// How stale a dynamic table may become.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetLag {
    /// A duration such as `2 minutes`
    MaximumDuration(String),
    /// Refresh only when a downstream dynamic table needs it
    Downstream,
}

impl TargetLag {
    fn to_sql(&self) -> String {
        match self {
            TargetLag::MaximumDuration(duration) => quote_string(duration),
            TargetLag::Downstream => "DOWNSTREAM".to_owned(),
        }
    }

    fn parse(value: &str) -> TargetLag {
        if value.trim().eq_ignore_ascii_case("DOWNSTREAM") {
            TargetLag::Downstream
        } else {
            TargetLag::MaximumDuration(value.trim().to_owned())
        }
    }
}

impl fmt::Display for TargetLag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetLag::MaximumDuration(duration) => f.write_str(duration),
            TargetLag::Downstream => f.write_str("DOWNSTREAM"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshMode {
    Auto,
    Full,
    Incremental,
}

impl RefreshMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshMode::Auto => "AUTO",
            RefreshMode::Full => "FULL",
            RefreshMode::Incremental => "INCREMENTAL",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Initialize {
    OnCreate,
    OnSchedule,
}

impl Initialize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Initialize::OnCreate => "ON_CREATE",
            Initialize::OnSchedule => "ON_SCHEDULE",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DynamicTable {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub cluster_by: Option<String>,
    pub rows: Option<i64>,
    pub bytes: Option<i64>,
    pub owner: Option<String>,
    pub target_lag: Option<TargetLag>,
    pub refresh_mode: Option<String>,
    pub refresh_mode_reason: Option<String>,
    pub warehouse: Option<String>,
    pub comment: Option<String>,
    pub text: Option<String>,
    pub automatic_clustering: bool,
    pub scheduling_state: Option<String>,
    pub last_suspended_on: Option<DateTime<Utc>>,
    pub is_clone: bool,
    pub is_replica: bool,
    pub data_timestamp: Option<DateTime<Utc>>,
    pub owner_role_type: Option<String>,
}

impl FromRow for DynamicTable {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(DynamicTable {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            cluster_by: row.opt_string("cluster_by"),
            rows: row.opt_int("rows"),
            bytes: row.opt_int("bytes"),
            owner: row.opt_string("owner"),
            target_lag: row.opt_string("target_lag").map(|v| TargetLag::parse(&v)),
            refresh_mode: row.opt_string("refresh_mode"),
            refresh_mode_reason: row.opt_string("refresh_mode_reason"),
            warehouse: row.opt_string("warehouse"),
            comment: row.opt_string("comment"),
            text: row.opt_string("text"),
            automatic_clustering: row.opt_bool("automatic_clustering").unwrap_or(false),
            scheduling_state: row.opt_string("scheduling_state"),
            last_suspended_on: row.opt_timestamp("last_suspended_on"),
            is_clone: row.opt_bool("is_clone").unwrap_or(false),
            is_replica: row.opt_bool("is_replica").unwrap_or(false),
            data_timestamp: row.opt_timestamp("data_timestamp"),
            owner_role_type: row.opt_string("owner_role_type"),
        })
    }
}

impl Identifiable for DynamicTable {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::from_trusted(&self.database_name, &self.schema_name, &self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateDynamicTable {
    id: SchemaObjectIdentifier,
    target_lag: TargetLag,
    warehouse: AccountObjectIdentifier,
    query: String,
    or_replace: bool,
    refresh_mode: Option<RefreshMode>,
    initialize: Option<Initialize>,
    cluster_by: Vec<String>,
    comment: Option<String>,
}

impl CreateDynamicTable {
    pub fn new(
        id: SchemaObjectIdentifier,
        warehouse: AccountObjectIdentifier,
        target_lag: TargetLag,
        query: impl Into<String>,
    ) -> CreateDynamicTable {
        CreateDynamicTable {
            id,
            target_lag,
            warehouse,
            query: query.into(),
            or_replace: false,
            refresh_mode: None,
            initialize: None,
            cluster_by: vec![],
            comment: None,
        }
    }
}

flags!(CreateDynamicTable { or_replace });
setters!(CreateDynamicTable { refresh_mode: RefreshMode, initialize: Initialize });
string_setters!(CreateDynamicTable { comment });
list_setters!(CreateDynamicTable { cluster_by: String });

impl Render for CreateDynamicTable {
    fn render(&self) -> SnowflakeResult<String> {
        required("CREATE DYNAMIC TABLE query", &self.query)?;
        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword("DYNAMIC TABLE")
            .identifier(&self.id)
            .param("TARGET_LAG", self.target_lag.to_sql())
            .identifier_param("WAREHOUSE", Some(&self.warehouse))
            .opt_param("REFRESH_MODE", self.refresh_mode.map(|m| m.as_str()))
            .opt_param("INITIALIZE", self.initialize.map(|i| i.as_str()));
        if !self.cluster_by.is_empty() {
            sql.keyword("CLUSTER BY").list(self.cluster_by.iter().cloned());
        }
        sql.comment(self.comment.as_deref())
            .keyword("AS")
            .raw(self.query.as_str());
        Ok(sql.finish())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DynamicTableSet {
    target_lag: Option<TargetLag>,
    warehouse: Option<AccountObjectIdentifier>,
}

impl DynamicTableSet {
    pub fn new() -> DynamicTableSet {
        DynamicTableSet::default()
    }
}

setters!(DynamicTableSet { target_lag: TargetLag, warehouse: AccountObjectIdentifier });

#[derive(Clone, Debug, PartialEq)]
pub struct AlterDynamicTable {
    id: SchemaObjectIdentifier,
    if_exists: bool,
    suspend: bool,
    resume: bool,
    refresh: bool,
    set: Option<DynamicTableSet>,
}

impl AlterDynamicTable {
    pub fn new(id: SchemaObjectIdentifier) -> AlterDynamicTable {
        AlterDynamicTable {
            id,
            if_exists: false,
            suspend: false,
            resume: false,
            refresh: false,
            set: None,
        }
    }
}

flags!(AlterDynamicTable { if_exists, suspend, resume, refresh });
setters!(AlterDynamicTable { set: DynamicTableSet });

impl Render for AlterDynamicTable {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[self.suspend, self.resume, self.refresh, self.set.is_some()])?;
        let mut sql = SqlBuilder::new("ALTER DYNAMIC TABLE");
        sql.keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_if(self.suspend, "SUSPEND")
            .keyword_if(self.resume, "RESUME")
            .keyword_if(self.refresh, "REFRESH");
        if let Some(set) = &self.set {
            at_least_one(
                "ALTER DYNAMIC TABLE SET",
                &[set.target_lag.is_some(), set.warehouse.is_some()],
            )?;
            sql.keyword("SET")
                .opt_param("TARGET_LAG", set.target_lag.as_ref().map(TargetLag::to_sql))
                .identifier_param("WAREHOUSE", set.warehouse.as_ref());
        }
        Ok(sql.finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DynamicTables<'a> {
    client: &'a Client,
}

impl Client {
    pub fn dynamic_tables(&self) -> DynamicTables<'_> {
        DynamicTables { client: self }
    }
}

impl DynamicTables<'_> {
    pub async fn create(&self, request: &CreateDynamicTable) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterDynamicTable) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &SchemaObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("DYNAMIC TABLE", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<DynamicTable>> {
        self.client.show("DYNAMIC TABLES", options).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<DynamicTable> {
        self.client.show_by_id("DYNAMIC TABLES", id).await
    }

    pub async fn describe_columns(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Vec<ColumnDetail>> {
        self.client
            .describe_rows("DYNAMIC TABLE", id)
            .await?
            .iter()
            .map(ColumnDetail::from_row)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ALTER_NEEDS_EXACTLY_ONE_ACTION;
    use crate::testing::FakeDriver;

    fn ids() -> SnowflakeResult<(SchemaObjectIdentifier, AccountObjectIdentifier)> {
        Ok((
            SchemaObjectIdentifier::new("DB", "SC", "DT")?,
            AccountObjectIdentifier::new("WH")?,
        ))
    }

    #[test]
    fn create_with_both_lag_kinds() -> SnowflakeResult<()> {
        let (id, warehouse) = ids()?;
        let lagged = TargetLag::MaximumDuration("2 minutes".into());
        assert_eq!(
            CreateDynamicTable::new(id.clone(), warehouse.clone(), lagged, "SELECT * FROM T")
                .or_replace()
                .render()?,
            "CREATE OR REPLACE DYNAMIC TABLE DB.SC.DT TARGET_LAG = '2 minutes' WAREHOUSE = WH \
             AS SELECT * FROM T"
        );
        assert_eq!(
            CreateDynamicTable::new(id, warehouse, TargetLag::Downstream, "SELECT * FROM T")
                .refresh_mode(RefreshMode::Full)
                .render()?,
            "CREATE DYNAMIC TABLE DB.SC.DT TARGET_LAG = DOWNSTREAM WAREHOUSE = WH \
             REFRESH_MODE = FULL AS SELECT * FROM T"
        );
        Ok(())
    }

    #[test]
    fn suspend_and_resume_together_is_rejected() -> SnowflakeResult<()> {
        let (id, _) = ids()?;
        let err = AlterDynamicTable::new(id.clone())
            .suspend()
            .resume()
            .render()
            .unwrap_err();
        assert_eq!(err.to_string(), ALTER_NEEDS_EXACTLY_ONE_ACTION);
        assert_eq!(
            AlterDynamicTable::new(id)
                .set(DynamicTableSet::new().target_lag(TargetLag::Downstream))
                .render()?,
            "ALTER DYNAMIC TABLE DB.SC.DT SET TARGET_LAG = DOWNSTREAM"
        );
        Ok(())
    }

    #[tokio::test]
    async fn show_reads_target_lag() -> SnowflakeResult<()> {
        let (id, _) = ids()?;
        let row = |lag: &str| {
            Row::new()
                .with("name", "DT")
                .with("database_name", "DB")
                .with("schema_name", "SC")
                .with("target_lag", lag)
        };
        let show = "SHOW DYNAMIC TABLES LIKE 'DT' IN SCHEMA DB.SC";
        let driver = FakeDriver::new()
            .with_rows(show, vec![row("2 minutes")])
            .with_rows(show, vec![row("DOWNSTREAM")]);
        let client = Client::new(driver);
        let first = client.dynamic_tables().show_by_id(&id).await?;
        assert_eq!(first.target_lag.map(|l| l.to_string()).as_deref(), Some("2 minutes"));
        let second = client.dynamic_tables().show_by_id(&id).await?;
        assert_eq!(second.target_lag, Some(TargetLag::Downstream));
        Ok(())
    }
}
