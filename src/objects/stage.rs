use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::SnowflakeResult;
use crate::identifiers::{AccountObjectIdentifier, ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{DropOptions, Properties, ShowOptions, TagAssociation};
use crate::row::{FromRow, Row};
use crate::sql::{at_most_one, exactly_one_action, quote_string, Render, SqlBuilder};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileFormatType {
    Csv,
    Json,
    Avro,
    Orc,
    Parquet,
    Xml,
}

impl FileFormatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormatType::Csv => "CSV",
            FileFormatType::Json => "JSON",
            FileFormatType::Avro => "AVRO",
            FileFormatType::Orc => "ORC",
            FileFormatType::Parquet => "PARQUET",
            FileFormatType::Xml => "XML",
        }
    }
}

/// `FILE_FORMAT = (FORMAT_NAME = '...')` or `FILE_FORMAT = (TYPE = ...)`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Named(SchemaObjectIdentifier),
    Type(FileFormatType),
}

impl FileFormat {
    pub(crate) fn to_sql(&self) -> String {
        match self {
            FileFormat::Named(id) => {
                format!("(FORMAT_NAME = {})", quote_string(&id.fully_qualified_name()))
            }
            FileFormat::Type(kind) => format!("(TYPE = {})", kind.as_str()),
        }
    }
}

/// Where a stage keeps its files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageLocation {
    /// Snowflake-managed storage
    Internal,
    /// `URL = 's3://...' | 'gcs://...' | 'azure://...'` read through a storage integration
    External {
        url: String,
        storage_integration: Option<AccountObjectIdentifier>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub url: Option<String>,
    pub has_credentials: bool,
    pub has_encryption_key: bool,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub region: Option<String>,
    pub stage_type: Option<String>,
    pub cloud: Option<String>,
    pub storage_integration: Option<String>,
    pub endpoint: Option<String>,
    pub owner_role_type: Option<String>,
    pub directory_enabled: bool,
}

impl FromRow for Stage {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(Stage {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            url: row.opt_string("url"),
            has_credentials: row.opt_bool("has_credentials").unwrap_or(false),
            has_encryption_key: row.opt_bool("has_encryption_key").unwrap_or(false),
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            region: row.opt_string("region"),
            stage_type: row.opt_string("type"),
            cloud: row.opt_string("cloud"),
            storage_integration: row.opt_string("storage_integration"),
            endpoint: row.opt_string("endpoint"),
            owner_role_type: row.opt_string("owner_role_type"),
            directory_enabled: row.opt_bool("directory_enabled").unwrap_or(false),
        })
    }
}

impl Identifiable for Stage {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::from_trusted(&self.database_name, &self.schema_name, &self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateStage {
    id: SchemaObjectIdentifier,
    location: StageLocation,
    or_replace: bool,
    temporary: bool,
    if_not_exists: bool,
    directory_enabled: Option<bool>,
    directory_auto_refresh: Option<bool>,
    file_format: Option<FileFormat>,
    comment: Option<String>,
    tags: Vec<TagAssociation>,
}

impl CreateStage {
    pub fn internal(id: SchemaObjectIdentifier) -> CreateStage {
        CreateStage::new(id, StageLocation::Internal)
    }

    pub fn external(
        id: SchemaObjectIdentifier,
        url: impl Into<String>,
        storage_integration: AccountObjectIdentifier,
    ) -> CreateStage {
        CreateStage::new(
            id,
            StageLocation::External {
                url: url.into(),
                storage_integration: Some(storage_integration),
            },
        )
    }

    pub fn new(id: SchemaObjectIdentifier, location: StageLocation) -> CreateStage {
        CreateStage {
            id,
            location,
            or_replace: false,
            temporary: false,
            if_not_exists: false,
            directory_enabled: None,
            directory_auto_refresh: None,
            file_format: None,
            comment: None,
            tags: vec![],
        }
    }
}

flags!(CreateStage { or_replace, temporary, if_not_exists });
setters!(CreateStage {
    directory_enabled: bool,
    directory_auto_refresh: bool,
    file_format: FileFormat,
});
string_setters!(CreateStage { comment });
list_setters!(CreateStage { tags: TagAssociation });

impl Render for CreateStage {
    fn render(&self) -> SnowflakeResult<String> {
        at_most_one(
            "CREATE STAGE",
            &[("OR REPLACE", self.or_replace), ("IF NOT EXISTS", self.if_not_exists)],
        )?;
        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword_if(self.temporary, "TEMPORARY")
            .keyword("STAGE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id);
        if let StageLocation::External {
            url,
            storage_integration,
        } = &self.location
        {
            sql.string_param("URL", Some(url.as_str()))
                .identifier_param("STORAGE_INTEGRATION", storage_integration.as_ref());
        }
        if self.directory_enabled.is_some() || self.directory_auto_refresh.is_some() {
            let mut directory = SqlBuilder::default();
            directory
                .bool_param("ENABLE", self.directory_enabled)
                .bool_param("AUTO_REFRESH", self.directory_auto_refresh);
            sql.param("DIRECTORY", format!("({})", directory.finish()));
        }
        sql.opt_param("FILE_FORMAT", self.file_format.as_ref().map(FileFormat::to_sql))
            .comment(self.comment.as_deref())
            .tags("WITH TAG", &self.tags);
        Ok(sql.finish())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AlterStage {
    id: SchemaObjectIdentifier,
    if_exists: bool,
    rename_to: Option<SchemaObjectIdentifier>,
    set_comment: Option<String>,
    refresh_directory: bool,
    set_tags: Vec<TagAssociation>,
    unset_tags: Vec<SchemaObjectIdentifier>,
}

impl AlterStage {
    pub fn new(id: SchemaObjectIdentifier) -> AlterStage {
        AlterStage {
            id,
            if_exists: false,
            rename_to: None,
            set_comment: None,
            refresh_directory: false,
            set_tags: vec![],
            unset_tags: vec![],
        }
    }
}

flags!(AlterStage { if_exists, refresh_directory });
setters!(AlterStage { rename_to: SchemaObjectIdentifier });
string_setters!(AlterStage { set_comment });
list_setters!(AlterStage { set_tags: TagAssociation, unset_tags: SchemaObjectIdentifier });

impl Render for AlterStage {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.rename_to.is_some(),
            self.set_comment.is_some(),
            self.refresh_directory,
            !self.set_tags.is_empty(),
            !self.unset_tags.is_empty(),
        ])?;
        Ok(SqlBuilder::new("ALTER STAGE")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_identifier("RENAME TO", self.rename_to.as_ref())
            .keyword_if(self.set_comment.is_some(), "SET")
            .comment(self.set_comment.as_deref())
            .keyword_if(self.refresh_directory, "REFRESH")
            .set_tags(&self.set_tags)
            .unset_tags(&self.unset_tags)
            .finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Stages<'a> {
    client: &'a Client,
}

impl Client {
    pub fn stages(&self) -> Stages<'_> {
        Stages { client: self }
    }
}

impl Stages<'_> {
    pub async fn create(&self, request: &CreateStage) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterStage) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &SchemaObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("STAGE", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<Stage>> {
        self.client.show("STAGES", options).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Stage> {
        self.client.show_by_id("STAGES", id).await
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Properties> {
        self.client.describe_properties("STAGE", id).await
    }
}
