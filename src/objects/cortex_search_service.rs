use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{quote_part, AccountObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{DropOptions, ShowOptions};
use crate::row::{FromRow, Row};
use crate::sql::{at_least_one, at_most_one, required, Render, SqlBuilder};

#[derive(Clone, Debug, PartialEq)]
pub struct CortexSearchService {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub comment: Option<String>,
}

impl FromRow for CortexSearchService {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(CortexSearchService {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            comment: row.opt_string("comment"),
        })
    }
}

impl Identifiable for CortexSearchService {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::from_trusted(&self.database_name, &self.schema_name, &self.name)
    }
}

/// The single row `DESCRIBE CORTEX SEARCH SERVICE` answers with.
#[derive(Clone, Debug, PartialEq)]
pub struct CortexSearchServiceDetails {
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub target_lag: String,
    pub warehouse: String,
    pub search_column: Option<String>,
    pub attribute_columns: Vec<String>,
    pub columns: Vec<String>,
    pub definition: Option<String>,
    pub comment: Option<String>,
    pub service_query_url: Option<String>,
    pub data_timestamp: Option<DateTime<Utc>>,
    pub source_data_num_rows: Option<i64>,
    pub indexing_state: Option<String>,
    pub indexing_error: Option<String>,
}

impl FromRow for CortexSearchServiceDetails {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(CortexSearchServiceDetails {
            name: row.string("name")?,
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            target_lag: row.string("target_lag")?,
            warehouse: row.string("warehouse")?,
            search_column: row.opt_string("search_column"),
            attribute_columns: row.list("attribute_columns"),
            columns: row.list("columns"),
            definition: row.opt_string("definition"),
            comment: row.opt_string("comment"),
            service_query_url: row.opt_string("service_query_url"),
            data_timestamp: row.opt_timestamp("data_timestamp"),
            source_data_num_rows: row.opt_int("source_data_num_rows"),
            indexing_state: row.opt_string("indexing_state"),
            indexing_error: row.opt_string("indexing_error"),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateCortexSearchService {
    id: SchemaObjectIdentifier,
    on: String,
    warehouse: AccountObjectIdentifier,
    target_lag: String,
    query: String,
    or_replace: bool,
    if_not_exists: bool,
    attributes: Vec<String>,
    comment: Option<String>,
}

impl CreateCortexSearchService {
    /// A service indexing column `on` of `query`, refreshed by `warehouse` within `target_lag`
    pub fn new(
        id: SchemaObjectIdentifier,
        on: impl Into<String>,
        warehouse: AccountObjectIdentifier,
        target_lag: impl Into<String>,
        query: impl Into<String>,
    ) -> CreateCortexSearchService {
        CreateCortexSearchService {
            id,
            on: on.into(),
            warehouse,
            target_lag: target_lag.into(),
            query: query.into(),
            or_replace: false,
            if_not_exists: false,
            attributes: vec![],
            comment: None,
        }
    }
}

flags!(CreateCortexSearchService { or_replace, if_not_exists });
string_setters!(CreateCortexSearchService { comment });
list_setters!(CreateCortexSearchService { attributes: String });

impl Render for CreateCortexSearchService {
    fn render(&self) -> SnowflakeResult<String> {
        at_most_one(
            "CREATE CORTEX SEARCH SERVICE",
            &[("OR REPLACE", self.or_replace), ("IF NOT EXISTS", self.if_not_exists)],
        )?;
        required("search column", &self.on)?;
        required("target lag", &self.target_lag)?;
        required("query", &self.query)?;
        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword("CORTEX SEARCH SERVICE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id)
            .keyword("ON")
            .raw(quote_part(&self.on));
        if !self.attributes.is_empty() {
            sql.keyword("ATTRIBUTES")
                .comma_separated(self.attributes.iter().map(|a| quote_part(a)));
        }
        sql.identifier_param("WAREHOUSE", Some(&self.warehouse))
            .string_param("TARGET_LAG", Some(self.target_lag.as_str()))
            .comment(self.comment.as_deref())
            .keyword("AS")
            .raw(self.query.as_str());
        Ok(sql.finish())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlterCortexSearchService {
    id: SchemaObjectIdentifier,
    if_exists: bool,
    warehouse: Option<AccountObjectIdentifier>,
    target_lag: Option<String>,
    comment: Option<String>,
}

impl AlterCortexSearchService {
    pub fn new(id: SchemaObjectIdentifier) -> AlterCortexSearchService {
        AlterCortexSearchService {
            id,
            if_exists: false,
            warehouse: None,
            target_lag: None,
            comment: None,
        }
    }
}

flags!(AlterCortexSearchService { if_exists });
setters!(AlterCortexSearchService { warehouse: AccountObjectIdentifier });
string_setters!(AlterCortexSearchService { target_lag, comment });

impl Render for AlterCortexSearchService {
    fn render(&self) -> SnowflakeResult<String> {
        at_least_one(
            "ALTER CORTEX SEARCH SERVICE SET",
            &[
                self.warehouse.is_some(),
                self.target_lag.is_some(),
                self.comment.is_some(),
            ],
        )?;
        Ok(SqlBuilder::new("ALTER CORTEX SEARCH SERVICE")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword("SET")
            .identifier_param("WAREHOUSE", self.warehouse.as_ref())
            .string_param("TARGET_LAG", self.target_lag.as_deref())
            .comment(self.comment.as_deref())
            .finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CortexSearchServices<'a> {
    client: &'a Client,
}

impl Client {
    pub fn cortex_search_services(&self) -> CortexSearchServices<'_> {
        CortexSearchServices { client: self }
    }
}

impl CortexSearchServices<'_> {
    pub async fn create(&self, request: &CreateCortexSearchService) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterCortexSearchService) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &SchemaObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("CORTEX SEARCH SERVICE", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<CortexSearchService>> {
        self.client.show("CORTEX SEARCH SERVICES", options).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<CortexSearchService> {
        self.client.show_by_id("CORTEX SEARCH SERVICES", id).await
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<CortexSearchServiceDetails> {
        let rows = self.client.describe_rows("CORTEX SEARCH SERVICE", id).await?;
        CortexSearchServiceDetails::from_row(rows.first().ok_or(SnowflakeError::EmptyResult)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;

    fn id() -> SnowflakeResult<SchemaObjectIdentifier> {
        SchemaObjectIdentifier::new("DB", "SC", "SEARCH")
    }

    #[test]
    fn create_renders_on_and_attributes() -> SnowflakeResult<()> {
        let sql = CreateCortexSearchService::new(
            id()?,
            "description",
            AccountObjectIdentifier::new("WH")?,
            "2 minutes",
            "SELECT description, region FROM DB.SC.DOCS",
        )
        .or_replace()
        .attributes(vec!["REGION".into()])
        .render()?;
        assert_eq!(
            sql,
            "CREATE OR REPLACE CORTEX SEARCH SERVICE DB.SC.SEARCH ON \"description\" \
             ATTRIBUTES REGION WAREHOUSE = WH TARGET_LAG = '2 minutes' \
             AS SELECT description, region FROM DB.SC.DOCS"
        );
        Ok(())
    }

    #[test]
    fn alter_needs_a_property() -> SnowflakeResult<()> {
        assert!(AlterCortexSearchService::new(id()?).render().is_err());
        assert_eq!(
            AlterCortexSearchService::new(id()?).target_lag("1 hour").render()?,
            "ALTER CORTEX SEARCH SERVICE DB.SC.SEARCH SET TARGET_LAG = '1 hour'"
        );
        Ok(())
    }

    #[tokio::test]
    async fn describe_reads_the_single_row() -> SnowflakeResult<()> {
        let driver = FakeDriver::new().with_rows(
            "DESCRIBE CORTEX SEARCH SERVICE DB.SC.SEARCH",
            vec![Row::new()
                .with("name", "SEARCH")
                .with("database_name", "DB")
                .with("schema_name", "SC")
                .with("target_lag", "2 minutes")
                .with("warehouse", "WH")
                .with("search_column", "DESCRIPTION")
                .with("attribute_columns", "REGION")
                .with("columns", "DESCRIPTION,REGION")],
        );
        let details = Client::new(driver).cortex_search_services().describe(&id()?).await?;
        assert_eq!(details.target_lag, "2 minutes");
        assert_eq!(details.columns, vec!["DESCRIPTION", "REGION"]);
        assert_eq!(details.attribute_columns, vec!["REGION"]);
        Ok(())
    }
}
