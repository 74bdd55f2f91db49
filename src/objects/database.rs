use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::SnowflakeResult;
use crate::identifiers::{AccountObjectIdentifier, ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{DropOptions, ShowOptions, TagAssociation, UndropStatement};
use crate::row::{FromRow, Row};
use crate::sql::{at_least_one, exactly_one_action, Render, SqlBuilder};

#[derive(Clone, Debug, PartialEq)]
pub struct Database {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub is_default: bool,
    pub is_current: bool,
    pub origin: Option<String>,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub options: Option<String>,
    pub retention_time: Option<i64>,
    pub kind: Option<String>,
    pub dropped_on: Option<DateTime<Utc>>,
    pub owner_role_type: Option<String>,
}

impl Database {
    pub fn is_transient(&self) -> bool {
        self.options
            .as_deref()
            .map(|o| o.to_ascii_uppercase().contains("TRANSIENT"))
            .unwrap_or(false)
    }
}

impl FromRow for Database {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(Database {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            is_default: row.opt_bool("is_default").unwrap_or(false),
            is_current: row.opt_bool("is_current").unwrap_or(false),
            origin: row.opt_string("origin"),
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            options: row.opt_string("options"),
            retention_time: row.opt_int("retention_time"),
            kind: row.opt_string("kind"),
            dropped_on: row.opt_timestamp("dropped_on"),
            owner_role_type: row.opt_string("owner_role_type"),
        })
    }
}

impl Identifiable for Database {
    type Id = AccountObjectIdentifier;

    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::from_trusted(&self.name)
    }
}

/// One row of `DESCRIBE DATABASE`: a schema in the database.
#[derive(Clone, Debug, PartialEq)]
pub struct DatabaseDetail {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub kind: String,
}

impl FromRow for DatabaseDetail {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(DatabaseDetail {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            kind: row.string("kind")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateDatabase {
    id: AccountObjectIdentifier,
    or_replace: bool,
    transient: bool,
    if_not_exists: bool,
    clone_source: Option<AccountObjectIdentifier>,
    data_retention_time_in_days: Option<u32>,
    max_data_extension_time_in_days: Option<u32>,
    external_volume: Option<AccountObjectIdentifier>,
    catalog: Option<AccountObjectIdentifier>,
    default_ddl_collation: Option<String>,
    log_level: Option<String>,
    trace_level: Option<String>,
    comment: Option<String>,
    tags: Vec<TagAssociation>,
}

impl CreateDatabase {
    pub fn new(id: AccountObjectIdentifier) -> CreateDatabase {
        CreateDatabase {
            id,
            or_replace: false,
            transient: false,
            if_not_exists: false,
            clone_source: None,
            data_retention_time_in_days: None,
            max_data_extension_time_in_days: None,
            external_volume: None,
            catalog: None,
            default_ddl_collation: None,
            log_level: None,
            trace_level: None,
            comment: None,
            tags: vec![],
        }
    }
}

flags!(CreateDatabase { or_replace, transient, if_not_exists });
setters!(CreateDatabase {
    clone_source: AccountObjectIdentifier,
    data_retention_time_in_days: u32,
    max_data_extension_time_in_days: u32,
    external_volume: AccountObjectIdentifier,
    catalog: AccountObjectIdentifier,
});
string_setters!(CreateDatabase { default_ddl_collation, log_level, trace_level, comment });
list_setters!(CreateDatabase { tags: TagAssociation });

impl Render for CreateDatabase {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword_if(self.transient, "TRANSIENT")
            .keyword("DATABASE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id)
            .keyword_identifier("CLONE", self.clone_source.as_ref())
            .opt_param("DATA_RETENTION_TIME_IN_DAYS", self.data_retention_time_in_days)
            .opt_param("MAX_DATA_EXTENSION_TIME_IN_DAYS", self.max_data_extension_time_in_days)
            .identifier_param("EXTERNAL_VOLUME", self.external_volume.as_ref())
            .identifier_param("CATALOG", self.catalog.as_ref())
            .string_param("DEFAULT_DDL_COLLATION", self.default_ddl_collation.as_deref())
            .string_param("LOG_LEVEL", self.log_level.as_deref())
            .string_param("TRACE_LEVEL", self.trace_level.as_deref())
            .comment(self.comment.as_deref())
            .tags("WITH TAG", &self.tags)
            .finish())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatabaseSet {
    data_retention_time_in_days: Option<u32>,
    max_data_extension_time_in_days: Option<u32>,
    external_volume: Option<AccountObjectIdentifier>,
    default_ddl_collation: Option<String>,
    log_level: Option<String>,
    trace_level: Option<String>,
    comment: Option<String>,
}

impl DatabaseSet {
    pub fn new() -> DatabaseSet {
        DatabaseSet::default()
    }

    fn render_into(&self, sql: &mut SqlBuilder) -> SnowflakeResult<()> {
        at_least_one(
            "ALTER DATABASE SET",
            &[
                self.data_retention_time_in_days.is_some(),
                self.max_data_extension_time_in_days.is_some(),
                self.external_volume.is_some(),
                self.default_ddl_collation.is_some(),
                self.log_level.is_some(),
                self.trace_level.is_some(),
                self.comment.is_some(),
            ],
        )?;
        sql.keyword("SET")
            .opt_param("DATA_RETENTION_TIME_IN_DAYS", self.data_retention_time_in_days)
            .opt_param("MAX_DATA_EXTENSION_TIME_IN_DAYS", self.max_data_extension_time_in_days)
            .identifier_param("EXTERNAL_VOLUME", self.external_volume.as_ref())
            .string_param("DEFAULT_DDL_COLLATION", self.default_ddl_collation.as_deref())
            .string_param("LOG_LEVEL", self.log_level.as_deref())
            .string_param("TRACE_LEVEL", self.trace_level.as_deref())
            .comment(self.comment.as_deref());
        Ok(())
    }
}

setters!(DatabaseSet {
    data_retention_time_in_days: u32,
    max_data_extension_time_in_days: u32,
    external_volume: AccountObjectIdentifier,
});
string_setters!(DatabaseSet { default_ddl_collation, log_level, trace_level, comment });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatabaseUnset {
    data_retention_time_in_days: bool,
    max_data_extension_time_in_days: bool,
    external_volume: bool,
    default_ddl_collation: bool,
    log_level: bool,
    trace_level: bool,
    comment: bool,
}

impl DatabaseUnset {
    pub fn new() -> DatabaseUnset {
        DatabaseUnset::default()
    }

    fn render_into(&self, sql: &mut SqlBuilder) -> SnowflakeResult<()> {
        let properties = [
            ("DATA_RETENTION_TIME_IN_DAYS", self.data_retention_time_in_days),
            ("MAX_DATA_EXTENSION_TIME_IN_DAYS", self.max_data_extension_time_in_days),
            ("EXTERNAL_VOLUME", self.external_volume),
            ("DEFAULT_DDL_COLLATION", self.default_ddl_collation),
            ("LOG_LEVEL", self.log_level),
            ("TRACE_LEVEL", self.trace_level),
            ("COMMENT", self.comment),
        ];
        sql.checked_unset("ALTER DATABASE UNSET", &properties)?;
        Ok(())
    }
}

flags!(DatabaseUnset {
    data_retention_time_in_days,
    max_data_extension_time_in_days,
    external_volume,
    default_ddl_collation,
    log_level,
    trace_level,
    comment,
});

#[derive(Clone, Debug, PartialEq)]
pub struct AlterDatabase {
    id: AccountObjectIdentifier,
    if_exists: bool,
    rename_to: Option<AccountObjectIdentifier>,
    swap_with: Option<AccountObjectIdentifier>,
    set: Option<DatabaseSet>,
    unset: Option<DatabaseUnset>,
    set_tags: Vec<TagAssociation>,
    unset_tags: Vec<SchemaObjectIdentifier>,
}

impl AlterDatabase {
    pub fn new(id: AccountObjectIdentifier) -> AlterDatabase {
        AlterDatabase {
            id,
            if_exists: false,
            rename_to: None,
            swap_with: None,
            set: None,
            unset: None,
            set_tags: vec![],
            unset_tags: vec![],
        }
    }
}

flags!(AlterDatabase { if_exists });
setters!(AlterDatabase {
    rename_to: AccountObjectIdentifier,
    swap_with: AccountObjectIdentifier,
    set: DatabaseSet,
    unset: DatabaseUnset,
});
list_setters!(AlterDatabase { set_tags: TagAssociation, unset_tags: SchemaObjectIdentifier });

impl Render for AlterDatabase {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.rename_to.is_some(),
            self.swap_with.is_some(),
            self.set.is_some(),
            self.unset.is_some(),
            !self.set_tags.is_empty(),
            !self.unset_tags.is_empty(),
        ])?;
        let mut sql = SqlBuilder::new("ALTER DATABASE");
        sql.keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_identifier("RENAME TO", self.rename_to.as_ref())
            .keyword_identifier("SWAP WITH", self.swap_with.as_ref())
            .set_tags(&self.set_tags)
            .unset_tags(&self.unset_tags);
        if let Some(set) = &self.set {
            set.render_into(&mut sql)?;
        }
        if let Some(unset) = &self.unset {
            unset.render_into(&mut sql)?;
        }
        Ok(sql.finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Databases<'a> {
    client: &'a Client,
}

impl Client {
    pub fn databases(&self) -> Databases<'_> {
        Databases { client: self }
    }
}

impl Databases<'_> {
    pub async fn create(&self, request: &CreateDatabase) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterDatabase) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &AccountObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("DATABASE", id, options).await
    }

    pub async fn undrop(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        self.client
            .exec(&UndropStatement {
                noun: "DATABASE",
                name: id.fully_qualified_name(),
            })
            .await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<Database>> {
        self.client.show("DATABASES", options).await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Database> {
        self.client.show_by_id("DATABASES", id).await
    }

    pub async fn describe(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Vec<DatabaseDetail>> {
        self.client
            .describe_rows("DATABASE", id)
            .await?
            .iter()
            .map(DatabaseDetail::from_row)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::testing::FakeDriver;

    fn db(name: &str) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(name).unwrap()
    }

    #[test]
    fn create_full() -> SnowflakeResult<()> {
        let tag = SchemaObjectIdentifier::new("DB", "SC", "COST_CENTER")?;
        let sql = CreateDatabase::new(db("analytics"))
            .or_replace()
            .transient()
            .data_retention_time_in_days(1)
            .comment("scratch")
            .tags(vec![TagAssociation::new(tag, "finance")])
            .render()?;
        assert_eq!(
            sql,
            "CREATE OR REPLACE TRANSIENT DATABASE \"analytics\" DATA_RETENTION_TIME_IN_DAYS = 1 \
             COMMENT = 'scratch' WITH TAG (DB.SC.COST_CENTER = 'finance')"
        );
        Ok(())
    }

    #[test]
    fn create_quoted_pair() -> SnowflakeResult<()> {
        let id: AccountObjectIdentifier = "\"A.A\"".parse()?;
        assert_eq!(CreateDatabase::new(id).render()?, "CREATE DATABASE \"A.A\"");
        Ok(())
    }

    #[test]
    fn alter_actions() -> SnowflakeResult<()> {
        let sql = AlterDatabase::new(db("DB"))
            .if_exists()
            .set(DatabaseSet::new().comment("c").log_level("INFO"))
            .render()?;
        assert_eq!(sql, "ALTER DATABASE IF EXISTS DB SET LOG_LEVEL = 'INFO' COMMENT = 'c'");

        let sql = AlterDatabase::new(db("DB"))
            .unset(DatabaseUnset::new().comment().log_level())
            .render()?;
        assert_eq!(sql, "ALTER DATABASE DB UNSET LOG_LEVEL, COMMENT");

        let sql = AlterDatabase::new(db("DB")).rename_to(db("DB2")).render()?;
        assert_eq!(sql, "ALTER DATABASE DB RENAME TO DB2");

        let err = AlterDatabase::new(db("DB"))
            .rename_to(db("DB2"))
            .set(DatabaseSet::new().comment("c"))
            .render()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        Ok(())
    }

    #[tokio::test]
    async fn show_by_id_and_undrop() -> SnowflakeResult<()> {
        let driver = FakeDriver::new()
            .with_rows(
                "SHOW DATABASES LIKE 'DB'",
                vec![Row::new()
                    .with("name", "DB")
                    .with("owner", "SYSADMIN")
                    .with("options", "TRANSIENT")
                    .with("retention_time", "1")],
            )
            .with_exec("UNDROP DATABASE DB");
        let client = Client::new(driver.clone());
        let found = client.databases().show_by_id(&db("DB")).await?;
        assert_eq!(found.id(), db("DB"));
        assert!(found.is_transient());
        assert_eq!(found.retention_time, Some(1));
        client.databases().undrop(&db("DB")).await?;
        assert_eq!(driver.sent().len(), 2);
        Ok(())
    }
}
