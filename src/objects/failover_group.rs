use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::warn;

use crate::client::{find_by_id, Client, Identifiable};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{
    AccountIdentifier, AccountObjectIdentifier, ExternalObjectIdentifier, ObjectIdentifier,
};
use crate::objects::common::DropOptions;
use crate::objects::database::Database;
use crate::row::{FromRow, Row};
use crate::sql::{at_least_one, exactly_one_action, Render, SqlBuilder};

/// Object types a failover group can replicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PluralObjectType {
    AccountParameters,
    Databases,
    Integrations,
    NetworkPolicies,
    ResourceMonitors,
    Roles,
    Shares,
    Users,
    Warehouses,
}

impl PluralObjectType {
    const ALL: [PluralObjectType; 9] = [
        PluralObjectType::AccountParameters,
        PluralObjectType::Databases,
        PluralObjectType::Integrations,
        PluralObjectType::NetworkPolicies,
        PluralObjectType::ResourceMonitors,
        PluralObjectType::Roles,
        PluralObjectType::Shares,
        PluralObjectType::Users,
        PluralObjectType::Warehouses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PluralObjectType::AccountParameters => "ACCOUNT PARAMETERS",
            PluralObjectType::Databases => "DATABASES",
            PluralObjectType::Integrations => "INTEGRATIONS",
            PluralObjectType::NetworkPolicies => "NETWORK POLICIES",
            PluralObjectType::ResourceMonitors => "RESOURCE MONITORS",
            PluralObjectType::Roles => "ROLES",
            PluralObjectType::Shares => "SHARES",
            PluralObjectType::Users => "USERS",
            PluralObjectType::Warehouses => "WAREHOUSES",
        }
    }
}

impl fmt::Display for PluralObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluralObjectType {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> SnowflakeResult<Self> {
        let normalised = s.trim().to_ascii_uppercase().replace('_', " ");
        PluralObjectType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalised)
            .ok_or_else(|| SnowflakeError::InvalidColumnValue {
                column: "object_types".into(),
                value: s.to_owned(),
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntegrationType {
    SecurityIntegrations,
    ApiIntegrations,
    NotificationIntegrations,
    StorageIntegrations,
}

impl IntegrationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationType::SecurityIntegrations => "SECURITY INTEGRATIONS",
            IntegrationType::ApiIntegrations => "API INTEGRATIONS",
            IntegrationType::NotificationIntegrations => "NOTIFICATION INTEGRATIONS",
            IntegrationType::StorageIntegrations => "STORAGE INTEGRATIONS",
        }
    }
}

fn joined<T>(items: &[T], render: impl Fn(&T) -> String) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        Some(items.iter().map(render).collect::<Vec<_>>().join(", "))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FailoverGroup {
    pub region_group: Option<String>,
    pub snowflake_region: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub account_name: Option<String>,
    pub name: String,
    pub group_type: Option<String>,
    pub comment: Option<String>,
    pub is_primary: bool,
    pub primary: Option<ExternalObjectIdentifier>,
    pub object_types: Vec<PluralObjectType>,
    pub allowed_integration_types: Vec<String>,
    pub allowed_accounts: Vec<AccountIdentifier>,
    pub organization_name: Option<String>,
    pub account_locator: Option<String>,
    pub replication_schedule: Option<String>,
    pub secondary_state: Option<String>,
    pub next_scheduled_refresh: Option<String>,
    pub owner: Option<String>,
}

impl FromRow for FailoverGroup {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(FailoverGroup {
            region_group: row.opt_string("region_group"),
            snowflake_region: row.opt_string("snowflake_region"),
            created_on: row.opt_timestamp("created_on"),
            account_name: row.opt_string("account_name"),
            name: row.string("name")?,
            group_type: row.opt_string("type"),
            comment: row.opt_string("comment"),
            is_primary: row.opt_bool("is_primary").unwrap_or(false),
            primary: row
                .opt_string("primary")
                .map(|p| p.parse::<ExternalObjectIdentifier>())
                .transpose()?,
            object_types: row
                .list("object_types")
                .iter()
                .filter_map(|t| match t.parse::<PluralObjectType>() {
                    Ok(object_type) => Some(object_type),
                    Err(_) => {
                        warn!("skipping unknown failover group object type {t:?}");
                        None
                    }
                })
                .collect(),
            allowed_integration_types: row.list("allowed_integration_types"),
            allowed_accounts: row
                .list("allowed_accounts")
                .iter()
                .map(|a| a.parse::<AccountIdentifier>())
                .collect::<SnowflakeResult<_>>()?,
            organization_name: row.opt_string("organization_name"),
            account_locator: row.opt_string("account_locator"),
            replication_schedule: row.opt_string("replication_schedule"),
            secondary_state: row.opt_string("secondary_state"),
            next_scheduled_refresh: row.opt_string("next_scheduled_refresh"),
            owner: row.opt_string("owner"),
        })
    }
}

impl Identifiable for FailoverGroup {
    type Id = AccountObjectIdentifier;

    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::from_trusted(&self.name)
    }
}

/// A row of `SHOW SHARES IN FAILOVER GROUP`.
#[derive(Clone, Debug, PartialEq)]
pub struct FailoverGroupShare {
    pub created_on: Option<DateTime<Utc>>,
    pub kind: Option<String>,
    pub name: String,
    pub database_name: Option<String>,
    pub to: Vec<String>,
    pub owner: Option<String>,
    pub comment: Option<String>,
}

impl FromRow for FailoverGroupShare {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(FailoverGroupShare {
            created_on: row.opt_timestamp("created_on"),
            kind: row.opt_string("kind"),
            name: row.string("name")?,
            database_name: row.opt_string("database_name"),
            to: row.list("to"),
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
        })
    }
}

/// `CREATE FAILOVER GROUP` on the source account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateFailoverGroup {
    id: AccountObjectIdentifier,
    if_not_exists: bool,
    object_types: Vec<PluralObjectType>,
    allowed_databases: Vec<AccountObjectIdentifier>,
    allowed_shares: Vec<AccountObjectIdentifier>,
    allowed_integration_types: Vec<IntegrationType>,
    allowed_accounts: Vec<AccountIdentifier>,
    ignore_edition_check: bool,
    replication_schedule: Option<String>,
}

impl CreateFailoverGroup {
    pub fn new(
        id: AccountObjectIdentifier,
        object_types: Vec<PluralObjectType>,
        allowed_accounts: Vec<AccountIdentifier>,
    ) -> CreateFailoverGroup {
        CreateFailoverGroup {
            id,
            if_not_exists: false,
            object_types,
            allowed_databases: vec![],
            allowed_shares: vec![],
            allowed_integration_types: vec![],
            allowed_accounts,
            ignore_edition_check: false,
            replication_schedule: None,
        }
    }
}

flags!(CreateFailoverGroup { if_not_exists, ignore_edition_check });
list_setters!(CreateFailoverGroup {
    allowed_databases: AccountObjectIdentifier,
    allowed_shares: AccountObjectIdentifier,
    allowed_integration_types: IntegrationType,
});
string_setters!(CreateFailoverGroup { replication_schedule });

impl Render for CreateFailoverGroup {
    fn render(&self) -> SnowflakeResult<String> {
        if self.object_types.is_empty() {
            return Err(SnowflakeError::InvalidRequest(
                "CREATE FAILOVER GROUP: OBJECT_TYPES must not be empty".into(),
            ));
        }
        if self.allowed_accounts.is_empty() {
            return Err(SnowflakeError::InvalidRequest(
                "CREATE FAILOVER GROUP: ALLOWED_ACCOUNTS must not be empty".into(),
            ));
        }
        Ok(SqlBuilder::new("CREATE FAILOVER GROUP")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id)
            .opt_param("OBJECT_TYPES", joined(&self.object_types, |t| t.to_string()))
            .opt_param(
                "ALLOWED_DATABASES",
                joined(&self.allowed_databases, |d| d.fully_qualified_name()),
            )
            .opt_param(
                "ALLOWED_SHARES",
                joined(&self.allowed_shares, |s| s.fully_qualified_name()),
            )
            .opt_param(
                "ALLOWED_INTEGRATION_TYPES",
                joined(&self.allowed_integration_types, |t| t.as_str().to_owned()),
            )
            .opt_param(
                "ALLOWED_ACCOUNTS",
                joined(&self.allowed_accounts, |a| a.fully_qualified_name()),
            )
            .keyword_if(self.ignore_edition_check, "IGNORE EDITION CHECK")
            .string_param("REPLICATION_SCHEDULE", self.replication_schedule.as_deref())
            .finish())
    }
}

/// `CREATE FAILOVER GROUP <id> AS REPLICA OF <org.account.group>` on a target account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateSecondaryFailoverGroup {
    id: AccountObjectIdentifier,
    if_not_exists: bool,
    primary: ExternalObjectIdentifier,
}

impl CreateSecondaryFailoverGroup {
    pub fn new(id: AccountObjectIdentifier, primary: ExternalObjectIdentifier) -> CreateSecondaryFailoverGroup {
        CreateSecondaryFailoverGroup {
            id,
            if_not_exists: false,
            primary,
        }
    }
}

flags!(CreateSecondaryFailoverGroup { if_not_exists });

impl Render for CreateSecondaryFailoverGroup {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("CREATE FAILOVER GROUP")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id)
            .keyword("AS REPLICA OF")
            .identifier(&self.primary)
            .finish())
    }
}

/// The object-type SET clause of a source-side ALTER.
///
/// The replication schedule cannot share a SET with these, so it is a
/// separate action on [`AlterSourceFailoverGroup`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FailoverGroupSet {
    object_types: Vec<PluralObjectType>,
    allowed_integration_types: Vec<IntegrationType>,
}

impl FailoverGroupSet {
    pub fn new() -> FailoverGroupSet {
        FailoverGroupSet::default()
    }
}

list_setters!(FailoverGroupSet {
    object_types: PluralObjectType,
    allowed_integration_types: IntegrationType,
});

/// Membership changes on the source side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailoverGroupMembership {
    AddDatabases(Vec<AccountObjectIdentifier>),
    RemoveDatabases(Vec<AccountObjectIdentifier>),
    MoveDatabases {
        databases: Vec<AccountObjectIdentifier>,
        to: AccountObjectIdentifier,
    },
    AddShares(Vec<AccountObjectIdentifier>),
    RemoveShares(Vec<AccountObjectIdentifier>),
    MoveShares {
        shares: Vec<AccountObjectIdentifier>,
        to: AccountObjectIdentifier,
    },
    AddAccounts {
        accounts: Vec<AccountIdentifier>,
        ignore_edition_check: bool,
    },
    RemoveAccounts(Vec<AccountIdentifier>),
}

fn names<I: ObjectIdentifier>(ids: &[I]) -> SnowflakeResult<String> {
    joined(ids, |id| id.fully_qualified_name()).ok_or_else(|| {
        SnowflakeError::InvalidRequest("ALTER FAILOVER GROUP: the object list is empty".into())
    })
}

impl FailoverGroupMembership {
    fn render_into(&self, sql: &mut SqlBuilder) -> SnowflakeResult<()> {
        match self {
            FailoverGroupMembership::AddDatabases(databases) => {
                sql.keyword("ADD").raw(names(databases)?).keyword("TO ALLOWED_DATABASES");
            }
            FailoverGroupMembership::RemoveDatabases(databases) => {
                sql.keyword("REMOVE").raw(names(databases)?).keyword("FROM ALLOWED_DATABASES");
            }
            FailoverGroupMembership::MoveDatabases { databases, to } => {
                sql.keyword("MOVE DATABASES")
                    .raw(names(databases)?)
                    .keyword("TO FAILOVER GROUP")
                    .identifier(to);
            }
            FailoverGroupMembership::AddShares(shares) => {
                sql.keyword("ADD").raw(names(shares)?).keyword("TO ALLOWED_SHARES");
            }
            FailoverGroupMembership::RemoveShares(shares) => {
                sql.keyword("REMOVE").raw(names(shares)?).keyword("FROM ALLOWED_SHARES");
            }
            FailoverGroupMembership::MoveShares { shares, to } => {
                sql.keyword("MOVE SHARES")
                    .raw(names(shares)?)
                    .keyword("TO FAILOVER GROUP")
                    .identifier(to);
            }
            FailoverGroupMembership::AddAccounts {
                accounts,
                ignore_edition_check,
            } => {
                sql.keyword("ADD")
                    .raw(names(accounts)?)
                    .keyword("TO ALLOWED_ACCOUNTS")
                    .keyword_if(*ignore_edition_check, "IGNORE EDITION CHECK");
            }
            FailoverGroupMembership::RemoveAccounts(accounts) => {
                sql.keyword("REMOVE").raw(names(accounts)?).keyword("FROM ALLOWED_ACCOUNTS");
            }
        }
        Ok(())
    }
}

/// `ALTER FAILOVER GROUP` run on the source account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlterSourceFailoverGroup {
    id: AccountObjectIdentifier,
    if_exists: bool,
    rename_to: Option<AccountObjectIdentifier>,
    set: Option<FailoverGroupSet>,
    set_replication_schedule: Option<String>,
    membership: Option<FailoverGroupMembership>,
}

impl AlterSourceFailoverGroup {
    pub fn new(id: AccountObjectIdentifier) -> AlterSourceFailoverGroup {
        AlterSourceFailoverGroup {
            id,
            if_exists: false,
            rename_to: None,
            set: None,
            set_replication_schedule: None,
            membership: None,
        }
    }
}

flags!(AlterSourceFailoverGroup { if_exists });
string_setters!(AlterSourceFailoverGroup { set_replication_schedule });
setters!(AlterSourceFailoverGroup {
    rename_to: AccountObjectIdentifier,
    set: FailoverGroupSet,
    membership: FailoverGroupMembership,
});

impl Render for AlterSourceFailoverGroup {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.rename_to.is_some(),
            self.set.is_some(),
            self.set_replication_schedule.is_some(),
            self.membership.is_some(),
        ])?;
        let mut sql = SqlBuilder::new("ALTER FAILOVER GROUP");
        sql.keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_identifier("RENAME TO", self.rename_to.as_ref());
        if let Some(set) = &self.set {
            at_least_one(
                "ALTER FAILOVER GROUP SET",
                &[
                    !set.object_types.is_empty(),
                    !set.allowed_integration_types.is_empty(),
                ],
            )?;
            sql.keyword("SET")
                .opt_param("OBJECT_TYPES", joined(&set.object_types, |t| t.to_string()))
                .opt_param(
                    "ALLOWED_INTEGRATION_TYPES",
                    joined(&set.allowed_integration_types, |t| t.as_str().to_owned()),
                );
        }
        if let Some(schedule) = &self.set_replication_schedule {
            sql.keyword("SET").string_param("REPLICATION_SCHEDULE", Some(schedule.as_str()));
        }
        if let Some(membership) = &self.membership {
            membership.render_into(&mut sql)?;
        }
        Ok(sql.finish())
    }
}

/// `ALTER FAILOVER GROUP` run on a target account holding a secondary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlterTargetFailoverGroup {
    id: AccountObjectIdentifier,
    if_exists: bool,
    refresh: bool,
    primary: bool,
    suspend: bool,
    resume: bool,
}

impl AlterTargetFailoverGroup {
    pub fn new(id: AccountObjectIdentifier) -> AlterTargetFailoverGroup {
        AlterTargetFailoverGroup {
            id,
            if_exists: false,
            refresh: false,
            primary: false,
            suspend: false,
            resume: false,
        }
    }
}

flags!(AlterTargetFailoverGroup { if_exists, refresh, primary, suspend, resume });

impl Render for AlterTargetFailoverGroup {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[self.refresh, self.primary, self.suspend, self.resume])?;
        Ok(SqlBuilder::new("ALTER FAILOVER GROUP")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_if(self.refresh, "REFRESH")
            .keyword_if(self.primary, "PRIMARY")
            .keyword_if(self.suspend, "SUSPEND")
            .keyword_if(self.resume, "RESUME")
            .finish())
    }
}

/// `SHOW FAILOVER GROUPS [IN ACCOUNT <org.account>]`; LIKE is not supported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShowFailoverGroups {
    in_account: Option<AccountIdentifier>,
}

impl ShowFailoverGroups {
    pub fn new() -> ShowFailoverGroups {
        ShowFailoverGroups::default()
    }
}

setters!(ShowFailoverGroups { in_account: AccountIdentifier });

impl Render for ShowFailoverGroups {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("SHOW FAILOVER GROUPS")
            .keyword_identifier("IN ACCOUNT", self.in_account.as_ref())
            .finish())
    }
}

/// `SHOW { DATABASES | SHARES } IN FAILOVER GROUP <id>`
struct ShowInFailoverGroup<'a> {
    noun: &'static str,
    id: &'a AccountObjectIdentifier,
}

impl Render for ShowInFailoverGroup<'_> {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("SHOW")
            .keyword(self.noun)
            .keyword("IN FAILOVER GROUP")
            .identifier(self.id)
            .finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FailoverGroups<'a> {
    client: &'a Client,
}

impl Client {
    pub fn failover_groups(&self) -> FailoverGroups<'_> {
        FailoverGroups { client: self }
    }
}

impl FailoverGroups<'_> {
    pub async fn create(&self, request: &CreateFailoverGroup) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn create_secondary(&self, request: &CreateSecondaryFailoverGroup) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter_source(&self, request: &AlterSourceFailoverGroup) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter_target(&self, request: &AlterTargetFailoverGroup) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &AccountObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("FAILOVER GROUP", id, options).await
    }

    pub async fn show(&self, request: &ShowFailoverGroups) -> SnowflakeResult<Vec<FailoverGroup>> {
        self.client.query(request).await
    }

    /// Lists every group visible to the account and keeps the exact match.
    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<FailoverGroup> {
        find_by_id(self.show(&ShowFailoverGroups::new()).await?, id)
    }

    pub async fn show_databases(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Vec<Database>> {
        self.client
            .query(&ShowInFailoverGroup { noun: "DATABASES", id })
            .await
    }

    pub async fn show_shares(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Vec<FailoverGroupShare>> {
        self.client
            .query(&ShowInFailoverGroup { noun: "SHARES", id })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::testing::{init_logging, FakeDriver};

    fn group() -> SnowflakeResult<AccountObjectIdentifier> {
        AccountObjectIdentifier::new("FG")
    }

    #[test]
    fn create_primary_and_secondary() -> SnowflakeResult<()> {
        let sql = CreateFailoverGroup::new(
            group()?,
            vec![PluralObjectType::Integrations, PluralObjectType::Databases],
            vec![AccountIdentifier::new("ORG", "TARGET")?],
        )
        .allowed_integration_types(vec![IntegrationType::SecurityIntegrations])
        .allowed_databases(vec![AccountObjectIdentifier::new("DB")?])
        .replication_schedule("10 MINUTE")
        .render()?;
        assert_eq!(
            sql,
            "CREATE FAILOVER GROUP FG OBJECT_TYPES = INTEGRATIONS, DATABASES \
             ALLOWED_DATABASES = DB ALLOWED_INTEGRATION_TYPES = SECURITY INTEGRATIONS \
             ALLOWED_ACCOUNTS = ORG.TARGET REPLICATION_SCHEDULE = '10 MINUTE'"
        );
        let primary = ExternalObjectIdentifier::new(
            AccountIdentifier::new("ORG", "SOURCE")?,
            group()?,
        );
        assert_eq!(
            CreateSecondaryFailoverGroup::new(group()?, primary).render()?,
            "CREATE FAILOVER GROUP FG AS REPLICA OF ORG.SOURCE.FG"
        );
        Ok(())
    }

    #[test]
    fn membership_changes() -> SnowflakeResult<()> {
        let sql = AlterSourceFailoverGroup::new(group()?)
            .membership(FailoverGroupMembership::MoveDatabases {
                databases: vec![AccountObjectIdentifier::new("DB1")?],
                to: AccountObjectIdentifier::new("OTHER")?,
            })
            .render()?;
        assert_eq!(sql, "ALTER FAILOVER GROUP FG MOVE DATABASES DB1 TO FAILOVER GROUP OTHER");
        assert!(AlterSourceFailoverGroup::new(group()?)
            .membership(FailoverGroupMembership::AddDatabases(vec![]))
            .render()
            .is_err());
        assert_eq!(
            AlterTargetFailoverGroup::new(group()?).refresh().render()?,
            "ALTER FAILOVER GROUP FG REFRESH"
        );
        Ok(())
    }

    #[tokio::test]
    async fn replication_schedule_is_its_own_alter() -> SnowflakeResult<()> {
        let types = FailoverGroupSet::new()
            .object_types(vec![PluralObjectType::Integrations, PluralObjectType::Databases])
            .allowed_integration_types(vec![IntegrationType::SecurityIntegrations]);
        let err = AlterSourceFailoverGroup::new(group()?)
            .set(types.clone())
            .set_replication_schedule("20 MINUTE")
            .render()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(err.to_string(), crate::errors::ALTER_NEEDS_EXACTLY_ONE_ACTION);

        let types_only = AlterSourceFailoverGroup::new(group()?).set(types);
        let schedule_only =
            AlterSourceFailoverGroup::new(group()?).set_replication_schedule("20 MINUTE");
        assert_eq!(
            types_only.render()?,
            "ALTER FAILOVER GROUP FG SET OBJECT_TYPES = INTEGRATIONS, DATABASES \
             ALLOWED_INTEGRATION_TYPES = SECURITY INTEGRATIONS"
        );
        assert_eq!(
            schedule_only.render()?,
            "ALTER FAILOVER GROUP FG SET REPLICATION_SCHEDULE = '20 MINUTE'"
        );

        let driver = FakeDriver::new()
            .with_exec(&types_only.render()?)
            .with_exec(&schedule_only.render()?);
        let client = Client::new(driver);
        let groups = client.failover_groups();
        groups.alter_source(&types_only).await?;
        groups.alter_source(&schedule_only).await?;
        Ok(())
    }

    #[tokio::test]
    async fn show_by_id_filters_full_listing() -> SnowflakeResult<()> {
        let driver = FakeDriver::new().with_rows(
            "SHOW FAILOVER GROUPS",
            vec![
                Row::new().with("name", "OTHER"),
                Row::new()
                    .with("name", "FG")
                    .with("is_primary", "true")
                    .with("primary", "ORG.SOURCE.FG")
                    .with("object_types", "DATABASES, INTEGRATIONS")
                    .with("allowed_accounts", "ORG.SOURCE,ORG.TARGET"),
            ],
        );
        let fg = Client::new(driver).failover_groups().show_by_id(&group()?).await?;
        assert!(fg.is_primary);
        assert_eq!(
            fg.object_types,
            vec![PluralObjectType::Databases, PluralObjectType::Integrations]
        );
        assert_eq!(fg.allowed_accounts.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_object_types_are_skipped() -> SnowflakeResult<()> {
        init_logging();
        let driver = FakeDriver::new().with_rows(
            "SHOW FAILOVER GROUPS",
            vec![
                Row::new()
                    .with("name", "NEWER")
                    .with("object_types", "DATABASES, EXTERNAL VOLUMES"),
                Row::new().with("name", "FG").with("object_types", "ROLES"),
            ],
        );
        let groups = Client::new(driver)
            .failover_groups()
            .show(&ShowFailoverGroups::new())
            .await?;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].object_types, vec![PluralObjectType::Databases]);
        assert_eq!(groups[1].object_types, vec![PluralObjectType::Roles]);
        Ok(())
    }
}
