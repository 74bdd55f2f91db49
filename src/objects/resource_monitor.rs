use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{quote_part, AccountObjectIdentifier};
use crate::objects::common::{DropOptions, ShowOptions};
use crate::row::{FromRow, Row};
use crate::sql::{Render, SqlBuilder};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Frequency {
    Monthly,
    Daily,
    Weekly,
    Yearly,
    Never,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Monthly => "MONTHLY",
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Yearly => "YEARLY",
            Frequency::Never => "NEVER",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerAction {
    Suspend,
    SuspendImmediate,
    Notify,
}

impl TriggerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerAction::Suspend => "SUSPEND",
            TriggerAction::SuspendImmediate => "SUSPEND_IMMEDIATE",
            TriggerAction::Notify => "NOTIFY",
        }
    }
}

/// `ON <threshold> PERCENT DO <action>`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Trigger {
    pub threshold: u32,
    pub action: TriggerAction,
}

impl Trigger {
    pub fn new(threshold: u32, action: TriggerAction) -> Trigger {
        Trigger { threshold, action }
    }

    fn to_sql(self) -> String {
        format!("ON {} PERCENT DO {}", self.threshold, self.action.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResourceMonitor {
    pub name: String,
    pub credit_quota: Option<f64>,
    pub used_credits: Option<f64>,
    pub remaining_credits: Option<f64>,
    pub level: Option<String>,
    pub frequency: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub notify_at: Vec<u32>,
    pub suspend_at: Option<u32>,
    pub suspend_immediate_at: Option<u32>,
    pub created_on: Option<DateTime<Utc>>,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub notify_users: Vec<String>,
}

fn percent(value: &str) -> Option<u32> {
    value.trim().trim_end_matches('%').parse().ok()
}

impl FromRow for ResourceMonitor {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        let float = |column: &str| -> Option<f64> { row.opt_string(column).and_then(|v| v.parse().ok()) };
        Ok(ResourceMonitor {
            name: row.string("name")?,
            credit_quota: float("credit_quota"),
            used_credits: float("used_credits"),
            remaining_credits: float("remaining_credits"),
            level: row.opt_string("level"),
            frequency: row.opt_string("frequency"),
            start_time: row.opt_string("start_time"),
            end_time: row.opt_string("end_time"),
            notify_at: row
                .list("notify_at")
                .iter()
                .filter_map(|v| percent(v))
                .collect(),
            suspend_at: row.opt_string("suspend_at").and_then(|v| percent(&v)),
            suspend_immediate_at: row
                .opt_string("suspend_immediately_at")
                .and_then(|v| percent(&v)),
            created_on: row.opt_timestamp("created_on"),
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            notify_users: row.list("notify_users"),
        })
    }
}

impl Identifiable for ResourceMonitor {
    type Id = AccountObjectIdentifier;

    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::from_trusted(&self.name)
    }
}

/// The `WITH`/`SET` parameters plus the notification settings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceMonitorOptions {
    credit_quota: Option<u32>,
    frequency: Option<Frequency>,
    start_timestamp: Option<String>,
    end_timestamp: Option<String>,
    notify_users: Option<Vec<String>>,
    triggers: Option<Vec<Trigger>>,
}

impl ResourceMonitorOptions {
    pub fn new() -> ResourceMonitorOptions {
        ResourceMonitorOptions::default()
    }

    fn has_parameters(&self) -> bool {
        self.credit_quota.is_some()
            || self.frequency.is_some()
            || self.start_timestamp.is_some()
            || self.end_timestamp.is_some()
            || self.notify_users.is_some()
    }

    fn render_into(&self, sql: &mut SqlBuilder, lead: &str) {
        if self.has_parameters() {
            sql.keyword(lead)
                .opt_param("CREDIT_QUOTA", self.credit_quota)
                .opt_param("FREQUENCY", self.frequency.map(|f| f.as_str()))
                .opt_param(
                    "START_TIMESTAMP",
                    self.start_timestamp.as_deref().map(timestamp_literal),
                )
                .opt_param(
                    "END_TIMESTAMP",
                    self.end_timestamp.as_deref().map(timestamp_literal),
                );
            if let Some(users) = &self.notify_users {
                sql.param(
                    "NOTIFY_USERS",
                    crate::sql::parenthesized(users.iter().map(|u| quote_part(u))),
                );
            }
        }
        if let Some(triggers) = &self.triggers {
            if !triggers.is_empty() {
                sql.keyword("TRIGGERS")
                    .raw(triggers.iter().map(|t| t.to_sql()).collect::<Vec<_>>().join(" "));
            }
        }
    }
}

/// `IMMEDIATELY` is a keyword; anything else is a timestamp string.
fn timestamp_literal(value: &str) -> String {
    if value.eq_ignore_ascii_case("IMMEDIATELY") {
        "IMMEDIATELY".to_owned()
    } else {
        crate::sql::quote_string(value)
    }
}

setters!(ResourceMonitorOptions {
    credit_quota: u32,
    frequency: Frequency,
    notify_users: Vec<String>,
    triggers: Vec<Trigger>,
});
string_setters!(ResourceMonitorOptions { start_timestamp, end_timestamp });

#[derive(Clone, Debug, PartialEq)]
pub struct CreateResourceMonitor {
    id: AccountObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    options: ResourceMonitorOptions,
}

impl CreateResourceMonitor {
    pub fn new(id: AccountObjectIdentifier) -> CreateResourceMonitor {
        CreateResourceMonitor {
            id,
            or_replace: false,
            if_not_exists: false,
            options: ResourceMonitorOptions::default(),
        }
    }

    pub fn options(mut self, options: ResourceMonitorOptions) -> Self {
        self.options = options;
        self
    }
}

flags!(CreateResourceMonitor { or_replace, if_not_exists });

impl Render for CreateResourceMonitor {
    fn render(&self) -> SnowflakeResult<String> {
        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword("RESOURCE MONITOR")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id);
        self.options.render_into(&mut sql, "WITH");
        Ok(sql.finish())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AlterResourceMonitor {
    id: AccountObjectIdentifier,
    if_exists: bool,
    set: ResourceMonitorOptions,
}

impl AlterResourceMonitor {
    pub fn new(id: AccountObjectIdentifier, set: ResourceMonitorOptions) -> AlterResourceMonitor {
        AlterResourceMonitor {
            id,
            if_exists: false,
            set,
        }
    }
}

flags!(AlterResourceMonitor { if_exists });

impl Render for AlterResourceMonitor {
    fn render(&self) -> SnowflakeResult<String> {
        if self.set == ResourceMonitorOptions::default() {
            return Err(SnowflakeError::InvalidRequest(
                "ALTER RESOURCE MONITOR: at least one property must be set".into(),
            ));
        }
        let mut sql = SqlBuilder::new("ALTER RESOURCE MONITOR");
        sql.keyword_if(self.if_exists, "IF EXISTS").identifier(&self.id);
        self.set.render_into(&mut sql, "SET");
        Ok(sql.finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ResourceMonitors<'a> {
    client: &'a Client,
}

impl Client {
    pub fn resource_monitors(&self) -> ResourceMonitors<'_> {
        ResourceMonitors { client: self }
    }
}

impl ResourceMonitors<'_> {
    pub async fn create(&self, request: &CreateResourceMonitor) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterResourceMonitor) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &AccountObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("RESOURCE MONITOR", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<ResourceMonitor>> {
        self.client.show("RESOURCE MONITORS", options).await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<ResourceMonitor> {
        self.client.show_by_id("RESOURCE MONITORS", id).await
    }
}
