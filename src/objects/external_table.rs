//! External tables over staged files, including manually partitioned,
//! Delta Lake and schema-inferred (`USING TEMPLATE`) variants.

use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::datatypes::DataType;
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{quote_part, SchemaObjectIdentifier};
use crate::objects::common::{DropOptions, ShowOptions, TagAssociation};
use crate::objects::stage::FileFormat;
use crate::objects::table::{ColumnDetail, RowAccessPolicyReference};
use crate::row::{FromRow, Row};
use crate::sql::{at_least_one, exactly_one_action, quote_string, required, Render, SqlBuilder};

#[derive(Clone, Debug, PartialEq)]
pub struct ExternalTable {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub invalid: bool,
    pub invalid_reason: Option<String>,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub stage: Option<String>,
    pub location: Option<String>,
    pub file_format_name: Option<String>,
    pub file_format_type: Option<String>,
    pub cloud: Option<String>,
    pub region: Option<String>,
    pub notification_channel: Option<String>,
    pub last_refreshed_on: Option<DateTime<Utc>>,
    pub table_format: Option<String>,
    pub last_refresh_details: Option<String>,
    pub owner_role_type: Option<String>,
}

impl FromRow for ExternalTable {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(ExternalTable {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            invalid: row.opt_bool("invalid").unwrap_or(false),
            invalid_reason: row.opt_string("invalid_reason"),
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            stage: row.opt_string("stage"),
            location: row.opt_string("location"),
            file_format_name: row.opt_string("file_format_name"),
            file_format_type: row.opt_string("file_format_type"),
            cloud: row.opt_string("cloud"),
            region: row.opt_string("region"),
            notification_channel: row.opt_string("notification_channel"),
            last_refreshed_on: row.opt_timestamp("last_refreshed_on"),
            table_format: row.opt_string("table_format"),
            last_refresh_details: row.opt_string("last_refresh_details"),
            owner_role_type: row.opt_string("owner_role_type"),
        })
    }
}

impl Identifiable for ExternalTable {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::from_trusted(&self.database_name, &self.schema_name, &self.name)
    }
}

/// A virtual column: `<name> <type> AS (<expression>)`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalTableColumn {
    pub name: String,
    pub data_type: DataType,
    pub expression: String,
    pub not_null: bool,
}

impl ExternalTableColumn {
    pub fn new(name: impl Into<String>, data_type: DataType, expression: impl Into<String>) -> Self {
        ExternalTableColumn {
            name: name.into(),
            data_type,
            expression: expression.into(),
            not_null: false,
        }
    }

    fn to_sql(&self) -> String {
        let mut sql = format!(
            "{} {} AS ({})",
            quote_part(&self.name),
            self.data_type.canonical(),
            self.expression
        );
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        sql
    }
}

flags!(ExternalTableColumn { not_null });

/// The four CREATE EXTERNAL TABLE shapes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExternalTableKind {
    /// Partitions derived from the file path
    Standard,
    /// `PARTITION_TYPE = USER_SPECIFIED`, partitions added with ALTER
    UserSpecifiedPartitions,
    /// `TABLE_FORMAT = DELTA`
    DeltaLake,
    /// Columns inferred from staged files with `USING TEMPLATE <query>`
    Template(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateExternalTable {
    id: SchemaObjectIdentifier,
    kind: ExternalTableKind,
    location: String,
    file_format: FileFormat,
    or_replace: bool,
    if_not_exists: bool,
    columns: Vec<ExternalTableColumn>,
    partition_by: Vec<String>,
    refresh_on_create: Option<bool>,
    auto_refresh: Option<bool>,
    pattern: Option<String>,
    aws_sns_topic: Option<String>,
    copy_grants: bool,
    comment: Option<String>,
    row_access_policy: Option<RowAccessPolicyReference>,
    tags: Vec<TagAssociation>,
}

impl CreateExternalTable {
    /// `location` is a stage reference such as `@db.sc.stage/path/`
    pub fn new(
        id: SchemaObjectIdentifier,
        location: impl Into<String>,
        file_format: FileFormat,
    ) -> CreateExternalTable {
        CreateExternalTable {
            id,
            kind: ExternalTableKind::Standard,
            location: location.into(),
            file_format,
            or_replace: false,
            if_not_exists: false,
            columns: vec![],
            partition_by: vec![],
            refresh_on_create: None,
            auto_refresh: None,
            pattern: None,
            aws_sns_topic: None,
            copy_grants: false,
            comment: None,
            row_access_policy: None,
            tags: vec![],
        }
    }

    pub fn with_user_specified_partitions(mut self) -> Self {
        self.kind = ExternalTableKind::UserSpecifiedPartitions;
        self
    }

    pub fn delta_lake(mut self) -> Self {
        self.kind = ExternalTableKind::DeltaLake;
        self
    }

    pub fn using_template(mut self, query: impl Into<String>) -> Self {
        self.kind = ExternalTableKind::Template(query.into());
        self
    }
}

flags!(CreateExternalTable { or_replace, if_not_exists, copy_grants });
setters!(CreateExternalTable {
    refresh_on_create: bool,
    auto_refresh: bool,
    row_access_policy: RowAccessPolicyReference,
});
string_setters!(CreateExternalTable { pattern, aws_sns_topic, comment });
list_setters!(CreateExternalTable {
    columns: ExternalTableColumn,
    partition_by: String,
    tags: TagAssociation,
});

impl Render for CreateExternalTable {
    fn render(&self) -> SnowflakeResult<String> {
        required("CREATE EXTERNAL TABLE location", &self.location)?;
        if self.kind == ExternalTableKind::DeltaLake && self.auto_refresh == Some(true) {
            return Err(SnowflakeError::InvalidRequest(
                "CREATE EXTERNAL TABLE: Delta Lake tables do not support AUTO_REFRESH".into(),
            ));
        }
        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword("EXTERNAL TABLE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id);
        match &self.kind {
            ExternalTableKind::Template(query) => {
                required("CREATE EXTERNAL TABLE template query", query)?;
                sql.keyword("USING TEMPLATE").raw(format!("({query})"));
            }
            _ if !self.columns.is_empty() => {
                sql.list(self.columns.iter().map(ExternalTableColumn::to_sql));
            }
            _ => {}
        }
        if !self.partition_by.is_empty() {
            sql.keyword("PARTITION BY")
                .list(self.partition_by.iter().map(|c| quote_part(c)));
        }
        sql.param("LOCATION", &self.location)
            .keyword_if(
                self.kind == ExternalTableKind::UserSpecifiedPartitions,
                "PARTITION_TYPE = USER_SPECIFIED",
            )
            .bool_param("REFRESH_ON_CREATE", self.refresh_on_create)
            .bool_param("AUTO_REFRESH", self.auto_refresh)
            .string_param("PATTERN", self.pattern.as_deref())
            .param("FILE_FORMAT", self.file_format.to_sql())
            .keyword_if(self.kind == ExternalTableKind::DeltaLake, "TABLE_FORMAT = DELTA")
            .string_param("AWS_SNS_TOPIC", self.aws_sns_topic.as_deref())
            .keyword_if(self.copy_grants, "COPY GRANTS")
            .comment(self.comment.as_deref());
        if let Some(policy) = &self.row_access_policy {
            policy.render_into("WITH ROW ACCESS POLICY", &mut sql);
        }
        sql.tags("WITH TAG", &self.tags);
        Ok(sql.finish())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AlterExternalTable {
    id: SchemaObjectIdentifier,
    if_exists: bool,
    refresh: Option<String>,
    add_files: Vec<String>,
    remove_files: Vec<String>,
    auto_refresh: Option<bool>,
    set_tags: Vec<TagAssociation>,
    unset_tags: Vec<SchemaObjectIdentifier>,
}

impl AlterExternalTable {
    pub fn new(id: SchemaObjectIdentifier) -> AlterExternalTable {
        AlterExternalTable {
            id,
            if_exists: false,
            refresh: None,
            add_files: vec![],
            remove_files: vec![],
            auto_refresh: None,
            set_tags: vec![],
            unset_tags: vec![],
        }
    }

    /// `REFRESH` the whole location
    pub fn refresh(self) -> Self {
        self.refresh_path("")
    }

    /// `REFRESH '<relative path>'`
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh = Some(path.into());
        self
    }
}

flags!(AlterExternalTable { if_exists });
setters!(AlterExternalTable { auto_refresh: bool });
list_setters!(AlterExternalTable {
    add_files: String,
    remove_files: String,
    set_tags: TagAssociation,
    unset_tags: SchemaObjectIdentifier,
});

impl Render for AlterExternalTable {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.refresh.is_some(),
            !self.add_files.is_empty(),
            !self.remove_files.is_empty(),
            self.auto_refresh.is_some(),
            !self.set_tags.is_empty(),
            !self.unset_tags.is_empty(),
        ])?;
        let mut sql = SqlBuilder::new("ALTER EXTERNAL TABLE");
        sql.keyword_if(self.if_exists, "IF EXISTS").identifier(&self.id);
        if let Some(path) = &self.refresh {
            sql.keyword("REFRESH");
            if !path.is_empty() {
                sql.string(path);
            }
        }
        if !self.add_files.is_empty() {
            sql.keyword("ADD FILES")
                .list(self.add_files.iter().map(|f| quote_string(f)));
        }
        if !self.remove_files.is_empty() {
            sql.keyword("REMOVE FILES")
                .list(self.remove_files.iter().map(|f| quote_string(f)));
        }
        if let Some(auto_refresh) = self.auto_refresh {
            sql.keyword("SET").bool_param("AUTO_REFRESH", Some(auto_refresh));
        }
        sql.set_tags(&self.set_tags).unset_tags(&self.unset_tags);
        Ok(sql.finish())
    }
}

/// Partition maintenance for tables created with user-specified partitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlterExternalTablePartitions {
    id: SchemaObjectIdentifier,
    if_exists: bool,
    add: Vec<(String, String)>,
    drop: bool,
    location: String,
}

impl AlterExternalTablePartitions {
    /// `ADD PARTITION (col = 'value', ...) LOCATION '<path>'`
    pub fn add(
        id: SchemaObjectIdentifier,
        values: Vec<(String, String)>,
        location: impl Into<String>,
    ) -> Self {
        AlterExternalTablePartitions {
            id,
            if_exists: false,
            add: values,
            drop: false,
            location: location.into(),
        }
    }

    /// `DROP PARTITION LOCATION '<path>'`
    pub fn drop(id: SchemaObjectIdentifier, location: impl Into<String>) -> Self {
        AlterExternalTablePartitions {
            id,
            if_exists: false,
            add: vec![],
            drop: true,
            location: location.into(),
        }
    }
}

flags!(AlterExternalTablePartitions { if_exists });

impl Render for AlterExternalTablePartitions {
    fn render(&self) -> SnowflakeResult<String> {
        required("ALTER EXTERNAL TABLE partition location", &self.location)?;
        let mut sql = SqlBuilder::new("ALTER EXTERNAL TABLE");
        sql.keyword_if(self.if_exists, "IF EXISTS").identifier(&self.id);
        if self.drop {
            sql.keyword("DROP PARTITION");
        } else {
            at_least_one("ALTER EXTERNAL TABLE ADD PARTITION", &[!self.add.is_empty()])?;
            sql.keyword("ADD PARTITION").list(
                self.add
                    .iter()
                    .map(|(column, value)| format!("{} = {}", quote_part(column), quote_string(value))),
            );
        }
        sql.keyword_string("LOCATION", Some(self.location.as_str()));
        Ok(sql.finish())
    }
}

/// Which half of `DESCRIBE EXTERNAL TABLE` to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DescribeType {
    Columns,
    Stage,
}

struct DescribeExternalTable<'a> {
    id: &'a SchemaObjectIdentifier,
    kind: DescribeType,
}

impl Render for DescribeExternalTable<'_> {
    fn render(&self) -> SnowflakeResult<String> {
        let kind = match self.kind {
            DescribeType::Columns => "COLUMNS",
            DescribeType::Stage => "STAGE",
        };
        Ok(SqlBuilder::new("DESCRIBE EXTERNAL TABLE")
            .identifier(self.id)
            .param("TYPE", kind)
            .finish())
    }
}

/// One row of `DESCRIBE EXTERNAL TABLE ... TYPE = STAGE`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalTableStageDetail {
    pub parent_property: Option<String>,
    pub property: String,
    pub property_type: Option<String>,
    pub property_value: Option<String>,
    pub property_default: Option<String>,
}

impl FromRow for ExternalTableStageDetail {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(ExternalTableStageDetail {
            parent_property: row.opt_string("parent_property"),
            property: row.string("property")?,
            property_type: row.opt_string("property_type"),
            property_value: row.opt_string("property_value"),
            property_default: row.opt_string("property_default"),
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ExternalTables<'a> {
    client: &'a Client,
}

impl Client {
    pub fn external_tables(&self) -> ExternalTables<'_> {
        ExternalTables { client: self }
    }
}

impl ExternalTables<'_> {
    pub async fn create(&self, request: &CreateExternalTable) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterExternalTable) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter_partitions(&self, request: &AlterExternalTablePartitions) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &SchemaObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("EXTERNAL TABLE", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<ExternalTable>> {
        self.client.show("EXTERNAL TABLES", options).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<ExternalTable> {
        self.client.show_by_id("EXTERNAL TABLES", id).await
    }

    pub async fn describe_columns(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Vec<ColumnDetail>> {
        self.client
            .query(&DescribeExternalTable {
                id,
                kind: DescribeType::Columns,
            })
            .await
    }

    pub async fn describe_stage(
        &self,
        id: &SchemaObjectIdentifier,
    ) -> SnowflakeResult<Vec<ExternalTableStageDetail>> {
        self.client
            .query(&DescribeExternalTable {
                id,
                kind: DescribeType::Stage,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::stage::FileFormatType;
    use crate::testing::FakeDriver;

    fn id() -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new("DB", "SC", "EXT").unwrap()
    }

    fn csv() -> FileFormat {
        FileFormat::Type(FileFormatType::Csv)
    }

    #[test]
    fn create_variants() -> SnowflakeResult<()> {
        let column = ExternalTableColumn::new("ID", DataType::parse("NUMBER")?, "value:c1::number");
        assert_eq!(
            CreateExternalTable::new(id(), "@DB.SC.ST/data/", csv())
                .columns(vec![column.clone()])
                .auto_refresh(false)
                .render()?,
            "CREATE EXTERNAL TABLE DB.SC.EXT (ID NUMBER(38,0) AS (value:c1::number)) \
             LOCATION = @DB.SC.ST/data/ AUTO_REFRESH = false FILE_FORMAT = (TYPE = CSV)"
        );
        assert_eq!(
            CreateExternalTable::new(id(), "@DB.SC.ST", csv())
                .with_user_specified_partitions()
                .columns(vec![column])
                .partition_by(vec!["ID".into()])
                .render()?,
            "CREATE EXTERNAL TABLE DB.SC.EXT (ID NUMBER(38,0) AS (value:c1::number)) \
             PARTITION BY (ID) LOCATION = @DB.SC.ST PARTITION_TYPE = USER_SPECIFIED \
             FILE_FORMAT = (TYPE = CSV)"
        );
        assert_eq!(
            CreateExternalTable::new(id(), "@DB.SC.ST", FileFormat::Type(FileFormatType::Parquet))
                .delta_lake()
                .auto_refresh(false)
                .render()?,
            "CREATE EXTERNAL TABLE DB.SC.EXT LOCATION = @DB.SC.ST AUTO_REFRESH = false \
             FILE_FORMAT = (TYPE = PARQUET) TABLE_FORMAT = DELTA"
        );
        assert!(CreateExternalTable::new(id(), "@DB.SC.ST", csv())
            .delta_lake()
            .auto_refresh(true)
            .render()
            .is_err());
        assert_eq!(
            CreateExternalTable::new(id(), "@DB.SC.ST", csv())
                .using_template("SELECT ARRAY_AGG(OBJECT_CONSTRUCT(*)) FROM t")
                .render()?,
            "CREATE EXTERNAL TABLE DB.SC.EXT USING TEMPLATE (SELECT ARRAY_AGG(OBJECT_CONSTRUCT(*)) FROM t) \
             LOCATION = @DB.SC.ST FILE_FORMAT = (TYPE = CSV)"
        );
        Ok(())
    }

    #[test]
    fn alter_and_partitions() -> SnowflakeResult<()> {
        assert_eq!(
            AlterExternalTable::new(id()).refresh().render()?,
            "ALTER EXTERNAL TABLE DB.SC.EXT REFRESH"
        );
        assert_eq!(
            AlterExternalTable::new(id())
                .add_files(vec!["a/1.csv".into(), "a/2.csv".into()])
                .render()?,
            "ALTER EXTERNAL TABLE DB.SC.EXT ADD FILES ('a/1.csv', 'a/2.csv')"
        );
        assert!(AlterExternalTable::new(id())
            .refresh()
            .auto_refresh(true)
            .render()
            .is_err());
        assert_eq!(
            AlterExternalTablePartitions::add(id(), vec![("P".into(), "2024".into())], "2024/")
                .render()?,
            "ALTER EXTERNAL TABLE DB.SC.EXT ADD PARTITION (P = '2024') LOCATION '2024/'"
        );
        assert_eq!(
            AlterExternalTablePartitions::drop(id(), "2024/").render()?,
            "ALTER EXTERNAL TABLE DB.SC.EXT DROP PARTITION LOCATION '2024/'"
        );
        Ok(())
    }

    #[tokio::test]
    async fn describe_stage_properties() -> SnowflakeResult<()> {
        let driver = FakeDriver::new().with_rows(
            "DESCRIBE EXTERNAL TABLE DB.SC.EXT TYPE = STAGE",
            vec![Row::new()
                .with("parent_property", "STAGE_FILE_FORMAT")
                .with("property", "TYPE")
                .with("property_type", "String")
                .with("property_value", "CSV")
                .with("property_default", "CSV")],
        );
        let client = Client::new(driver);
        let details = client.external_tables().describe_stage(&id()).await?;
        assert_eq!(details[0].property_value.as_deref(), Some("CSV"));
        Ok(())
    }
}
