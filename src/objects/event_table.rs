use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::SnowflakeResult;
use crate::identifiers::SchemaObjectIdentifier;
use crate::objects::common::{DropOptions, ShowOptions, TagAssociation};
use crate::objects::table::{ColumnDetail, RowAccessPolicyReference};
use crate::row::{FromRow, Row};
use crate::sql::{at_least_one, exactly_one_action, Render, SqlBuilder};

/// A row of `SHOW EVENT TABLES`. Event tables have a fixed, predefined set of columns.
#[derive(Clone, Debug, PartialEq)]
pub struct EventTable {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub owner_role_type: Option<String>,
}

impl FromRow for EventTable {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(EventTable {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            owner_role_type: row.opt_string("owner_role_type"),
        })
    }
}

impl Identifiable for EventTable {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::from_trusted(&self.database_name, &self.schema_name, &self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateEventTable {
    id: SchemaObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    cluster_by: Vec<String>,
    data_retention_time_in_days: Option<u32>,
    max_data_extension_time_in_days: Option<u32>,
    change_tracking: Option<bool>,
    default_ddl_collation: Option<String>,
    copy_grants: bool,
    comment: Option<String>,
    row_access_policy: Option<RowAccessPolicyReference>,
    tags: Vec<TagAssociation>,
}

impl CreateEventTable {
    pub fn new(id: SchemaObjectIdentifier) -> CreateEventTable {
        CreateEventTable {
            id,
            or_replace: false,
            if_not_exists: false,
            cluster_by: vec![],
            data_retention_time_in_days: None,
            max_data_extension_time_in_days: None,
            change_tracking: None,
            default_ddl_collation: None,
            copy_grants: false,
            comment: None,
            row_access_policy: None,
            tags: vec![],
        }
    }
}

flags!(CreateEventTable { or_replace, if_not_exists, copy_grants });
setters!(CreateEventTable {
    data_retention_time_in_days: u32,
    max_data_extension_time_in_days: u32,
    change_tracking: bool,
    row_access_policy: RowAccessPolicyReference,
});
string_setters!(CreateEventTable { default_ddl_collation, comment });
list_setters!(CreateEventTable { cluster_by: String, tags: TagAssociation });

impl Render for CreateEventTable {
    fn render(&self) -> SnowflakeResult<String> {
        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword("EVENT TABLE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id);
        if !self.cluster_by.is_empty() {
            sql.keyword("CLUSTER BY").list(self.cluster_by.iter().cloned());
        }
        sql.opt_param("DATA_RETENTION_TIME_IN_DAYS", self.data_retention_time_in_days)
            .opt_param(
                "MAX_DATA_EXTENSION_TIME_IN_DAYS",
                self.max_data_extension_time_in_days,
            )
            .bool_param("CHANGE_TRACKING", self.change_tracking)
            .string_param("DEFAULT_DDL_COLLATION", self.default_ddl_collation.as_deref())
            .keyword_if(self.copy_grants, "COPY GRANTS")
            .comment(self.comment.as_deref());
        if let Some(policy) = &self.row_access_policy {
            policy.render_into("WITH ROW ACCESS POLICY", &mut sql);
        }
        sql.tags("WITH TAG", &self.tags);
        Ok(sql.finish())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventTableSet {
    data_retention_time_in_days: Option<u32>,
    max_data_extension_time_in_days: Option<u32>,
    change_tracking: Option<bool>,
    comment: Option<String>,
}

impl EventTableSet {
    pub fn new() -> EventTableSet {
        EventTableSet::default()
    }
}

setters!(EventTableSet {
    data_retention_time_in_days: u32,
    max_data_extension_time_in_days: u32,
    change_tracking: bool,
});
string_setters!(EventTableSet { comment });

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventTableUnset {
    data_retention_time_in_days: bool,
    max_data_extension_time_in_days: bool,
    change_tracking: bool,
    comment: bool,
}

impl EventTableUnset {
    pub fn new() -> EventTableUnset {
        EventTableUnset::default()
    }
}

flags!(EventTableUnset {
    data_retention_time_in_days,
    max_data_extension_time_in_days,
    change_tracking,
    comment,
});

#[derive(Clone, Debug, PartialEq)]
pub struct AlterEventTable {
    id: SchemaObjectIdentifier,
    if_exists: bool,
    rename_to: Option<SchemaObjectIdentifier>,
    cluster_by: Vec<String>,
    drop_clustering_key: bool,
    set: Option<EventTableSet>,
    unset: Option<EventTableUnset>,
    set_tags: Vec<TagAssociation>,
    unset_tags: Vec<SchemaObjectIdentifier>,
}

impl AlterEventTable {
    pub fn new(id: SchemaObjectIdentifier) -> AlterEventTable {
        AlterEventTable {
            id,
            if_exists: false,
            rename_to: None,
            cluster_by: vec![],
            drop_clustering_key: false,
            set: None,
            unset: None,
            set_tags: vec![],
            unset_tags: vec![],
        }
    }
}

flags!(AlterEventTable { if_exists, drop_clustering_key });
setters!(AlterEventTable {
    rename_to: SchemaObjectIdentifier,
    set: EventTableSet,
    unset: EventTableUnset,
});
list_setters!(AlterEventTable {
    cluster_by: String,
    set_tags: TagAssociation,
    unset_tags: SchemaObjectIdentifier,
});

impl Render for AlterEventTable {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.rename_to.is_some(),
            !self.cluster_by.is_empty(),
            self.drop_clustering_key,
            self.set.is_some(),
            self.unset.is_some(),
            !self.set_tags.is_empty(),
            !self.unset_tags.is_empty(),
        ])?;
        let mut sql = SqlBuilder::new("ALTER TABLE");
        sql.keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_identifier("RENAME TO", self.rename_to.as_ref());
        if !self.cluster_by.is_empty() {
            sql.keyword("CLUSTER BY").list(self.cluster_by.iter().cloned());
        }
        sql.keyword_if(self.drop_clustering_key, "DROP CLUSTERING KEY");
        if let Some(set) = &self.set {
            at_least_one(
                "ALTER EVENT TABLE SET",
                &[
                    set.data_retention_time_in_days.is_some(),
                    set.max_data_extension_time_in_days.is_some(),
                    set.change_tracking.is_some(),
                    set.comment.is_some(),
                ],
            )?;
            sql.keyword("SET")
                .opt_param("DATA_RETENTION_TIME_IN_DAYS", set.data_retention_time_in_days)
                .opt_param(
                    "MAX_DATA_EXTENSION_TIME_IN_DAYS",
                    set.max_data_extension_time_in_days,
                )
                .bool_param("CHANGE_TRACKING", set.change_tracking)
                .comment(set.comment.as_deref());
        }
        if let Some(unset) = &self.unset {
            sql.checked_unset(
                "ALTER EVENT TABLE UNSET",
                &[
                    ("DATA_RETENTION_TIME_IN_DAYS", unset.data_retention_time_in_days),
                    (
                        "MAX_DATA_EXTENSION_TIME_IN_DAYS",
                        unset.max_data_extension_time_in_days,
                    ),
                    ("CHANGE_TRACKING", unset.change_tracking),
                    ("COMMENT", unset.comment),
                ],
            )?;
        }
        sql.set_tags(&self.set_tags).unset_tags(&self.unset_tags);
        Ok(sql.finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct EventTables<'a> {
    client: &'a Client,
}

impl Client {
    pub fn event_tables(&self) -> EventTables<'_> {
        EventTables { client: self }
    }
}

impl EventTables<'_> {
    pub async fn create(&self, request: &CreateEventTable) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterEventTable) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &SchemaObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("TABLE", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<EventTable>> {
        self.client.show("EVENT TABLES", options).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<EventTable> {
        self.client.show_by_id("EVENT TABLES", id).await
    }

    pub async fn describe_columns(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Vec<ColumnDetail>> {
        self.client
            .describe_rows("EVENT TABLE", id)
            .await?
            .iter()
            .map(ColumnDetail::from_row)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_event_table_statements() -> SnowflakeResult<()> {
        let id = SchemaObjectIdentifier::new("DB", "SC", "EVENTS")?;
        assert_eq!(
            CreateEventTable::new(id.clone())
                .if_not_exists()
                .change_tracking(true)
                .comment("telemetry")
                .render()?,
            "CREATE EVENT TABLE IF NOT EXISTS DB.SC.EVENTS CHANGE_TRACKING = true COMMENT = 'telemetry'"
        );
        assert_eq!(
            AlterEventTable::new(id.clone())
                .set(EventTableSet::new().data_retention_time_in_days(7))
                .render()?,
            "ALTER TABLE DB.SC.EVENTS SET DATA_RETENTION_TIME_IN_DAYS = 7"
        );
        assert!(AlterEventTable::new(id).unset(EventTableUnset::new()).render().is_err());
        Ok(())
    }
}
