use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::SnowflakeResult;
use crate::identifiers::{DatabaseObjectIdentifier, ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{DropOptions, ShowOptions, TagAssociation, UndropStatement};
use crate::row::{FromRow, Row};
use crate::sql::{at_least_one, exactly_one_action, Render, SqlBuilder};

#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub is_default: bool,
    pub is_current: bool,
    pub database_name: String,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub options: Option<String>,
    pub retention_time: Option<i64>,
    pub owner_role_type: Option<String>,
}

impl Schema {
    pub fn is_managed_access(&self) -> bool {
        self.options
            .as_deref()
            .map(|o| o.to_ascii_uppercase().contains("MANAGED ACCESS"))
            .unwrap_or(false)
    }
}

impl FromRow for Schema {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(Schema {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            is_default: row.opt_bool("is_default").unwrap_or(false),
            is_current: row.opt_bool("is_current").unwrap_or(false),
            database_name: row.string("database_name")?,
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            options: row.opt_string("options"),
            retention_time: row.opt_int("retention_time"),
            owner_role_type: row.opt_string("owner_role_type"),
        })
    }
}

impl Identifiable for Schema {
    type Id = DatabaseObjectIdentifier;

    fn id(&self) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::from_trusted(&self.database_name, &self.name)
    }
}

/// One row of `DESCRIBE SCHEMA`: an object in the schema.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaDetail {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub kind: String,
}

impl FromRow for SchemaDetail {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(SchemaDetail {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            kind: row.string("kind")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateSchema {
    id: DatabaseObjectIdentifier,
    or_replace: bool,
    transient: bool,
    if_not_exists: bool,
    clone_source: Option<DatabaseObjectIdentifier>,
    with_managed_access: bool,
    data_retention_time_in_days: Option<u32>,
    max_data_extension_time_in_days: Option<u32>,
    default_ddl_collation: Option<String>,
    log_level: Option<String>,
    trace_level: Option<String>,
    comment: Option<String>,
    tags: Vec<TagAssociation>,
}

impl CreateSchema {
    pub fn new(id: DatabaseObjectIdentifier) -> CreateSchema {
        CreateSchema {
            id,
            or_replace: false,
            transient: false,
            if_not_exists: false,
            clone_source: None,
            with_managed_access: false,
            data_retention_time_in_days: None,
            max_data_extension_time_in_days: None,
            default_ddl_collation: None,
            log_level: None,
            trace_level: None,
            comment: None,
            tags: vec![],
        }
    }
}

flags!(CreateSchema { or_replace, transient, if_not_exists, with_managed_access });
setters!(CreateSchema {
    clone_source: DatabaseObjectIdentifier,
    data_retention_time_in_days: u32,
    max_data_extension_time_in_days: u32,
});
string_setters!(CreateSchema { default_ddl_collation, log_level, trace_level, comment });
list_setters!(CreateSchema { tags: TagAssociation });

impl Render for CreateSchema {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword_if(self.transient, "TRANSIENT")
            .keyword("SCHEMA")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id)
            .keyword_identifier("CLONE", self.clone_source.as_ref())
            .keyword_if(self.with_managed_access, "WITH MANAGED ACCESS")
            .opt_param("DATA_RETENTION_TIME_IN_DAYS", self.data_retention_time_in_days)
            .opt_param("MAX_DATA_EXTENSION_TIME_IN_DAYS", self.max_data_extension_time_in_days)
            .string_param("DEFAULT_DDL_COLLATION", self.default_ddl_collation.as_deref())
            .string_param("LOG_LEVEL", self.log_level.as_deref())
            .string_param("TRACE_LEVEL", self.trace_level.as_deref())
            .comment(self.comment.as_deref())
            .tags("WITH TAG", &self.tags)
            .finish())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchemaSet {
    data_retention_time_in_days: Option<u32>,
    max_data_extension_time_in_days: Option<u32>,
    default_ddl_collation: Option<String>,
    log_level: Option<String>,
    trace_level: Option<String>,
    comment: Option<String>,
}

impl SchemaSet {
    pub fn new() -> SchemaSet {
        SchemaSet::default()
    }
}

setters!(SchemaSet {
    data_retention_time_in_days: u32,
    max_data_extension_time_in_days: u32,
});
string_setters!(SchemaSet { default_ddl_collation, log_level, trace_level, comment });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchemaUnset {
    data_retention_time_in_days: bool,
    max_data_extension_time_in_days: bool,
    default_ddl_collation: bool,
    log_level: bool,
    trace_level: bool,
    comment: bool,
}

impl SchemaUnset {
    pub fn new() -> SchemaUnset {
        SchemaUnset::default()
    }
}

flags!(SchemaUnset {
    data_retention_time_in_days,
    max_data_extension_time_in_days,
    default_ddl_collation,
    log_level,
    trace_level,
    comment,
});

#[derive(Clone, Debug, PartialEq)]
pub struct AlterSchema {
    id: DatabaseObjectIdentifier,
    if_exists: bool,
    rename_to: Option<DatabaseObjectIdentifier>,
    swap_with: Option<DatabaseObjectIdentifier>,
    set: Option<SchemaSet>,
    unset: Option<SchemaUnset>,
    set_tags: Vec<TagAssociation>,
    unset_tags: Vec<SchemaObjectIdentifier>,
    enable_managed_access: bool,
    disable_managed_access: bool,
}

impl AlterSchema {
    pub fn new(id: DatabaseObjectIdentifier) -> AlterSchema {
        AlterSchema {
            id,
            if_exists: false,
            rename_to: None,
            swap_with: None,
            set: None,
            unset: None,
            set_tags: vec![],
            unset_tags: vec![],
            enable_managed_access: false,
            disable_managed_access: false,
        }
    }
}

flags!(AlterSchema { if_exists, enable_managed_access, disable_managed_access });
setters!(AlterSchema {
    rename_to: DatabaseObjectIdentifier,
    swap_with: DatabaseObjectIdentifier,
    set: SchemaSet,
    unset: SchemaUnset,
});
list_setters!(AlterSchema { set_tags: TagAssociation, unset_tags: SchemaObjectIdentifier });

impl Render for AlterSchema {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.rename_to.is_some(),
            self.swap_with.is_some(),
            self.set.is_some(),
            self.unset.is_some(),
            !self.set_tags.is_empty(),
            !self.unset_tags.is_empty(),
            self.enable_managed_access,
            self.disable_managed_access,
        ])?;
        let mut sql = SqlBuilder::new("ALTER SCHEMA");
        sql.keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_identifier("RENAME TO", self.rename_to.as_ref())
            .keyword_identifier("SWAP WITH", self.swap_with.as_ref())
            .set_tags(&self.set_tags)
            .unset_tags(&self.unset_tags)
            .keyword_if(self.enable_managed_access, "ENABLE MANAGED ACCESS")
            .keyword_if(self.disable_managed_access, "DISABLE MANAGED ACCESS");
        if let Some(set) = &self.set {
            at_least_one(
                "ALTER SCHEMA SET",
                &[
                    set.data_retention_time_in_days.is_some(),
                    set.max_data_extension_time_in_days.is_some(),
                    set.default_ddl_collation.is_some(),
                    set.log_level.is_some(),
                    set.trace_level.is_some(),
                    set.comment.is_some(),
                ],
            )?;
            sql.keyword("SET")
                .opt_param("DATA_RETENTION_TIME_IN_DAYS", set.data_retention_time_in_days)
                .opt_param("MAX_DATA_EXTENSION_TIME_IN_DAYS", set.max_data_extension_time_in_days)
                .string_param("DEFAULT_DDL_COLLATION", set.default_ddl_collation.as_deref())
                .string_param("LOG_LEVEL", set.log_level.as_deref())
                .string_param("TRACE_LEVEL", set.trace_level.as_deref())
                .comment(set.comment.as_deref());
        }
        if let Some(unset) = &self.unset {
            sql.checked_unset(
                "ALTER SCHEMA UNSET",
                &[
                    ("DATA_RETENTION_TIME_IN_DAYS", unset.data_retention_time_in_days),
                    ("MAX_DATA_EXTENSION_TIME_IN_DAYS", unset.max_data_extension_time_in_days),
                    ("DEFAULT_DDL_COLLATION", unset.default_ddl_collation),
                    ("LOG_LEVEL", unset.log_level),
                    ("TRACE_LEVEL", unset.trace_level),
                    ("COMMENT", unset.comment),
                ],
            )?;
        }
        Ok(sql.finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Schemas<'a> {
    client: &'a Client,
}

impl Client {
    pub fn schemas(&self) -> Schemas<'_> {
        Schemas { client: self }
    }
}

impl Schemas<'_> {
    pub async fn create(&self, request: &CreateSchema) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterSchema) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &DatabaseObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("SCHEMA", id, options).await
    }

    pub async fn undrop(&self, id: &DatabaseObjectIdentifier) -> SnowflakeResult<()> {
        self.client
            .exec(&UndropStatement {
                noun: "SCHEMA",
                name: id.fully_qualified_name(),
            })
            .await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<Schema>> {
        self.client.show("SCHEMAS", options).await
    }

    pub async fn show_by_id(&self, id: &DatabaseObjectIdentifier) -> SnowflakeResult<Schema> {
        self.client.show_by_id("SCHEMAS", id).await
    }

    pub async fn describe(&self, id: &DatabaseObjectIdentifier) -> SnowflakeResult<Vec<SchemaDetail>> {
        self.client
            .describe_rows("SCHEMA", id)
            .await?
            .iter()
            .map(SchemaDetail::from_row)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::testing::FakeDriver;

    #[test]
    fn create_managed() -> SnowflakeResult<()> {
        let id = DatabaseObjectIdentifier::new("DB", "raw data")?;
        let sql = CreateSchema::new(id)
            .if_not_exists()
            .with_managed_access()
            .max_data_extension_time_in_days(7)
            .render()?;
        assert_eq!(
            sql,
            "CREATE SCHEMA IF NOT EXISTS DB.\"raw data\" WITH MANAGED ACCESS MAX_DATA_EXTENSION_TIME_IN_DAYS = 7"
        );
        Ok(())
    }

    #[test]
    fn alter_rejects_empty_unset() -> SnowflakeResult<()> {
        let id = DatabaseObjectIdentifier::new("DB", "SC")?;
        let err = AlterSchema::new(id.clone())
            .unset(SchemaUnset::new())
            .render()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        let sql = AlterSchema::new(id).enable_managed_access().render()?;
        assert_eq!(sql, "ALTER SCHEMA DB.SC ENABLE MANAGED ACCESS");
        Ok(())
    }

    #[tokio::test]
    async fn show_by_id_filters_in_database() -> SnowflakeResult<()> {
        let driver = FakeDriver::new().with_rows(
            "SHOW SCHEMAS LIKE 'SC' IN DATABASE DB",
            vec![
                Row::new().with("name", "SC").with("database_name", "DB"),
                Row::new()
                    .with("name", "SC")
                    .with("database_name", "DB")
                    .with("options", "MANAGED ACCESS"),
            ],
        );
        let client = Client::new(driver);
        let id = DatabaseObjectIdentifier::new("DB", "SC")?;
        let schema = client.schemas().show_by_id(&id).await?;
        assert_eq!(schema.id(), id);
        assert!(!schema.is_managed_access());
        Ok(())
    }
}
