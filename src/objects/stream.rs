use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::SchemaObjectIdentifier;
use crate::objects::common::{DropOptions, ShowOptions, TagAssociation};
use crate::row::{FromRow, Row};
use crate::sql::{at_most_one, bool_literal, exactly_one_action, quote_string, Render, SqlBuilder};

#[derive(Clone, Debug, PartialEq)]
pub struct Stream {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub table_name: Option<String>,
    pub source_type: Option<String>,
    pub base_tables: Vec<String>,
    pub stream_type: Option<String>,
    pub stale: bool,
    pub mode: Option<String>,
    pub stale_after: Option<DateTime<Utc>>,
    pub invalid_reason: Option<String>,
    pub owner_role_type: Option<String>,
}

impl FromRow for Stream {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(Stream {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            table_name: row.opt_string("table_name"),
            source_type: row.opt_string("source_type"),
            base_tables: row.list("base_tables"),
            stream_type: row.opt_string("type"),
            stale: row.opt_bool("stale").unwrap_or(false),
            mode: row.opt_string("mode"),
            stale_after: row.opt_timestamp("stale_after"),
            invalid_reason: row.opt_string("invalid_reason"),
            owner_role_type: row.opt_string("owner_role_type"),
        })
    }
}

impl Identifiable for Stream {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::from_trusted(&self.database_name, &self.schema_name, &self.name)
    }
}

/// The point a stream starts tracking from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimeTravelPoint {
    /// A timestamp expression, e.g. `TO_TIMESTAMP_TZ('2024-01-01 00:00:00 +00:00')`
    Timestamp(String),
    /// Seconds relative to now, e.g. `-60`
    Offset(i64),
    /// A query id
    Statement(String),
    /// The current offset of another stream
    Stream(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimeTravel {
    At(TimeTravelPoint),
    Before(TimeTravelPoint),
}

impl TimeTravel {
    fn to_sql(&self) -> String {
        let (keyword, point) = match self {
            TimeTravel::At(point) => ("AT", point),
            TimeTravel::Before(point) => ("BEFORE", point),
        };
        let point = match point {
            TimeTravelPoint::Timestamp(expression) => format!("TIMESTAMP => {expression}"),
            TimeTravelPoint::Offset(offset) => format!("OFFSET => {offset}"),
            TimeTravelPoint::Statement(query_id) => format!("STATEMENT => {}", quote_string(query_id)),
            TimeTravelPoint::Stream(stream) => format!("STREAM => {}", quote_string(stream)),
        };
        format!("{keyword} ({point})")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamSource {
    Table(SchemaObjectIdentifier),
    ExternalTable(SchemaObjectIdentifier),
    /// The directory table of a stage
    Stage(SchemaObjectIdentifier),
    View(SchemaObjectIdentifier),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateStream {
    id: SchemaObjectIdentifier,
    source: StreamSource,
    or_replace: bool,
    if_not_exists: bool,
    copy_grants: bool,
    time_travel: Option<TimeTravel>,
    append_only: Option<bool>,
    insert_only: Option<bool>,
    show_initial_rows: Option<bool>,
    comment: Option<String>,
    tags: Vec<TagAssociation>,
}

impl CreateStream {
    pub fn new(id: SchemaObjectIdentifier, source: StreamSource) -> CreateStream {
        CreateStream {
            id,
            source,
            or_replace: false,
            if_not_exists: false,
            copy_grants: false,
            time_travel: None,
            append_only: None,
            insert_only: None,
            show_initial_rows: None,
            comment: None,
            tags: vec![],
        }
    }

    pub fn on_table(id: SchemaObjectIdentifier, table: SchemaObjectIdentifier) -> CreateStream {
        CreateStream::new(id, StreamSource::Table(table))
    }

    pub fn on_external_table(id: SchemaObjectIdentifier, table: SchemaObjectIdentifier) -> CreateStream {
        CreateStream::new(id, StreamSource::ExternalTable(table))
    }

    pub fn on_stage(id: SchemaObjectIdentifier, stage: SchemaObjectIdentifier) -> CreateStream {
        CreateStream::new(id, StreamSource::Stage(stage))
    }

    pub fn on_view(id: SchemaObjectIdentifier, view: SchemaObjectIdentifier) -> CreateStream {
        CreateStream::new(id, StreamSource::View(view))
    }
}

flags!(CreateStream { or_replace, if_not_exists, copy_grants });
setters!(CreateStream {
    time_travel: TimeTravel,
    append_only: bool,
    insert_only: bool,
    show_initial_rows: bool,
});
string_setters!(CreateStream { comment });
list_setters!(CreateStream { tags: TagAssociation });

impl Render for CreateStream {
    fn render(&self) -> SnowflakeResult<String> {
        at_most_one(
            "CREATE STREAM",
            &[("OR REPLACE", self.or_replace), ("IF NOT EXISTS", self.if_not_exists)],
        )?;
        let (on, source, tabular) = match &self.source {
            StreamSource::Table(id) => ("ON TABLE", id, true),
            StreamSource::ExternalTable(id) => ("ON EXTERNAL TABLE", id, true),
            StreamSource::Stage(id) => ("ON STAGE", id, false),
            StreamSource::View(id) => ("ON VIEW", id, true),
        };
        let is_external = matches!(self.source, StreamSource::ExternalTable(_));
        if !tabular && self.time_travel.is_some() {
            return Err(SnowflakeError::InvalidRequest(
                "CREATE STREAM: a stream on a stage cannot use AT or BEFORE".into(),
            ));
        }
        if self.insert_only.is_some() && !is_external {
            return Err(SnowflakeError::InvalidRequest(
                "CREATE STREAM: INSERT_ONLY only applies to external tables".into(),
            ));
        }
        if is_external && (self.append_only.is_some() || self.show_initial_rows.is_some()) {
            return Err(SnowflakeError::InvalidRequest(
                "CREATE STREAM: external table streams only support INSERT_ONLY".into(),
            ));
        }

        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword("STREAM")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id)
            .tags("WITH TAG", &self.tags)
            .keyword_if(self.copy_grants, "COPY GRANTS")
            .keyword(on)
            .identifier(source);
        if let Some(time_travel) = &self.time_travel {
            sql.raw(time_travel.to_sql());
        }
        let upper = |value: bool| bool_literal(value).to_ascii_uppercase();
        sql.opt_param("APPEND_ONLY", self.append_only.map(upper))
            .opt_param("INSERT_ONLY", self.insert_only.map(upper))
            .opt_param("SHOW_INITIAL_ROWS", self.show_initial_rows.map(upper))
            .comment(self.comment.as_deref());
        Ok(sql.finish())
    }
}

/// `CREATE STREAM <id> CLONE <source>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloneStream {
    id: SchemaObjectIdentifier,
    source: SchemaObjectIdentifier,
    or_replace: bool,
    copy_grants: bool,
}

impl CloneStream {
    pub fn new(id: SchemaObjectIdentifier, source: SchemaObjectIdentifier) -> CloneStream {
        CloneStream {
            id,
            source,
            or_replace: false,
            copy_grants: false,
        }
    }
}

flags!(CloneStream { or_replace, copy_grants });

impl Render for CloneStream {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("STREAM")
            .identifier(&self.id)
            .keyword("CLONE")
            .identifier(&self.source)
            .keyword_if(self.copy_grants, "COPY GRANTS")
            .finish())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AlterStream {
    id: SchemaObjectIdentifier,
    if_exists: bool,
    set_comment: Option<String>,
    unset_comment: bool,
    set_tags: Vec<TagAssociation>,
    unset_tags: Vec<SchemaObjectIdentifier>,
}

impl AlterStream {
    pub fn new(id: SchemaObjectIdentifier) -> AlterStream {
        AlterStream {
            id,
            if_exists: false,
            set_comment: None,
            unset_comment: false,
            set_tags: vec![],
            unset_tags: vec![],
        }
    }
}

flags!(AlterStream { if_exists, unset_comment });
string_setters!(AlterStream { set_comment });
list_setters!(AlterStream { set_tags: TagAssociation, unset_tags: SchemaObjectIdentifier });

impl Render for AlterStream {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.set_comment.is_some(),
            self.unset_comment,
            !self.set_tags.is_empty(),
            !self.unset_tags.is_empty(),
        ])?;
        Ok(SqlBuilder::new("ALTER STREAM")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_if(self.set_comment.is_some(), "SET")
            .comment(self.set_comment.as_deref())
            .keyword_if(self.unset_comment, "UNSET COMMENT")
            .set_tags(&self.set_tags)
            .unset_tags(&self.unset_tags)
            .finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Streams<'a> {
    client: &'a Client,
}

impl Client {
    pub fn streams(&self) -> Streams<'_> {
        Streams { client: self }
    }
}

impl Streams<'_> {
    pub async fn create(&self, request: &CreateStream) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn clone_stream(&self, request: &CloneStream) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterStream) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &SchemaObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("STREAM", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<Stream>> {
        self.client.show("STREAMS", options).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Stream> {
        self.client.show_by_id("STREAMS", id).await
    }

    /// DESCRIBE STREAM answers with the same columns as SHOW STREAMS
    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Stream> {
        let rows = self.client.describe_rows("STREAM", id).await?;
        let row = rows.first().ok_or(SnowflakeError::EmptyResult)?;
        Stream::from_row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;

    fn ids() -> SnowflakeResult<(SchemaObjectIdentifier, SchemaObjectIdentifier)> {
        Ok((
            SchemaObjectIdentifier::new("DB", "SC", "S")?,
            SchemaObjectIdentifier::new("DB", "SC", "T")?,
        ))
    }

    #[test]
    fn stream_on_table_with_offset() -> SnowflakeResult<()> {
        let (id, table) = ids()?;
        let sql = CreateStream::on_table(id, table)
            .or_replace()
            .time_travel(TimeTravel::Before(TimeTravelPoint::Offset(-60)))
            .append_only(true)
            .comment("cdc")
            .render()?;
        assert_eq!(
            sql,
            "CREATE OR REPLACE STREAM DB.SC.S ON TABLE DB.SC.T BEFORE (OFFSET => -60) \
             APPEND_ONLY = TRUE COMMENT = 'cdc'"
        );
        Ok(())
    }

    #[test]
    fn source_specific_options() -> SnowflakeResult<()> {
        let (id, source) = ids()?;
        assert_eq!(
            CreateStream::on_external_table(id.clone(), source.clone())
                .insert_only(true)
                .render()?,
            "CREATE STREAM DB.SC.S ON EXTERNAL TABLE DB.SC.T INSERT_ONLY = TRUE"
        );
        assert!(CreateStream::on_table(id.clone(), source.clone())
            .insert_only(true)
            .render()
            .is_err());
        assert!(CreateStream::on_stage(id.clone(), source.clone())
            .time_travel(TimeTravel::At(TimeTravelPoint::Stream("DB.SC.OTHER".into())))
            .render()
            .is_err());
        assert_eq!(
            CloneStream::new(id, source).copy_grants().render()?,
            "CREATE STREAM DB.SC.S CLONE DB.SC.T COPY GRANTS"
        );
        Ok(())
    }

    #[tokio::test]
    async fn show_maps_base_tables() -> SnowflakeResult<()> {
        let (id, _) = ids()?;
        let driver = FakeDriver::new().with_rows(
            "SHOW STREAMS LIKE 'S' IN SCHEMA DB.SC",
            vec![Row::new()
                .with("name", "S")
                .with("database_name", "DB")
                .with("schema_name", "SC")
                .with("source_type", "Table")
                .with("base_tables", "DB.SC.T")
                .with("mode", "APPEND_ONLY")
                .with("stale", "false")],
        );
        let client = Client::new(driver);
        let stream = client.streams().show_by_id(&id).await?;
        assert_eq!(stream.base_tables, vec!["DB.SC.T"]);
        assert_eq!(stream.mode.as_deref(), Some("APPEND_ONLY"));
        assert!(!stream.stale);
        Ok(())
    }
}
