use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::SchemaObjectIdentifier;
use crate::objects::common::{
    render_arguments, Argument, DropOptions, PolicyDescription, ShowOptions, TagAssociation,
};
use crate::row::{FromRow, Row};
use crate::sql::{at_most_one, exactly_one_action, required, Render, SqlBuilder};

#[derive(Clone, Debug, PartialEq)]
pub struct RowAccessPolicy {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub kind: Option<String>,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub options: Option<String>,
    pub owner_role_type: Option<String>,
}

impl FromRow for RowAccessPolicy {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(RowAccessPolicy {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            kind: row.opt_string("kind"),
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            options: row.opt_string("options"),
            owner_role_type: row.opt_string("owner_role_type"),
        })
    }
}

impl Identifiable for RowAccessPolicy {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::from_trusted(&self.database_name, &self.schema_name, &self.name)
    }
}

/// `CREATE ROW ACCESS POLICY <id> AS (<args>) RETURNS BOOLEAN -> <body>`
#[derive(Clone, Debug, PartialEq)]
pub struct CreateRowAccessPolicy {
    id: SchemaObjectIdentifier,
    arguments: Vec<Argument>,
    body: String,
    or_replace: bool,
    if_not_exists: bool,
    comment: Option<String>,
}

impl CreateRowAccessPolicy {
    pub fn new(
        id: SchemaObjectIdentifier,
        arguments: Vec<Argument>,
        body: impl Into<String>,
    ) -> CreateRowAccessPolicy {
        CreateRowAccessPolicy {
            id,
            arguments,
            body: body.into(),
            or_replace: false,
            if_not_exists: false,
            comment: None,
        }
    }
}

flags!(CreateRowAccessPolicy { or_replace, if_not_exists });
string_setters!(CreateRowAccessPolicy { comment });

impl Render for CreateRowAccessPolicy {
    fn render(&self) -> SnowflakeResult<String> {
        at_most_one(
            "CREATE ROW ACCESS POLICY",
            &[("OR REPLACE", self.or_replace), ("IF NOT EXISTS", self.if_not_exists)],
        )?;
        if self.arguments.is_empty() {
            return Err(SnowflakeError::InvalidRequest(
                "CREATE ROW ACCESS POLICY: at least one argument is required".into(),
            ));
        }
        required("CREATE ROW ACCESS POLICY body", &self.body)?;
        Ok(SqlBuilder::new("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("ROW ACCESS POLICY")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id)
            .keyword("AS")
            .raw(render_arguments(&self.arguments))
            .keyword("RETURNS BOOLEAN ->")
            .raw(self.body.as_str())
            .comment(self.comment.as_deref())
            .finish())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AlterRowAccessPolicy {
    id: SchemaObjectIdentifier,
    if_exists: bool,
    rename_to: Option<SchemaObjectIdentifier>,
    set_body: Option<String>,
    set_comment: Option<String>,
    unset_comment: bool,
    set_tags: Vec<TagAssociation>,
    unset_tags: Vec<SchemaObjectIdentifier>,
}

impl AlterRowAccessPolicy {
    pub fn new(id: SchemaObjectIdentifier) -> AlterRowAccessPolicy {
        AlterRowAccessPolicy {
            id,
            if_exists: false,
            rename_to: None,
            set_body: None,
            set_comment: None,
            unset_comment: false,
            set_tags: vec![],
            unset_tags: vec![],
        }
    }
}

flags!(AlterRowAccessPolicy { if_exists, unset_comment });
setters!(AlterRowAccessPolicy { rename_to: SchemaObjectIdentifier });
string_setters!(AlterRowAccessPolicy { set_body, set_comment });
list_setters!(AlterRowAccessPolicy {
    set_tags: TagAssociation,
    unset_tags: SchemaObjectIdentifier,
});

impl Render for AlterRowAccessPolicy {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.rename_to.is_some(),
            self.set_body.is_some(),
            self.set_comment.is_some(),
            self.unset_comment,
            !self.set_tags.is_empty(),
            !self.unset_tags.is_empty(),
        ])?;
        let mut sql = SqlBuilder::new("ALTER ROW ACCESS POLICY");
        sql.keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_identifier("RENAME TO", self.rename_to.as_ref());
        if let Some(body) = &self.set_body {
            sql.keyword("SET BODY ->").raw(body.as_str());
        }
        sql.keyword_if(self.set_comment.is_some(), "SET")
            .comment(self.set_comment.as_deref())
            .keyword_if(self.unset_comment, "UNSET COMMENT")
            .set_tags(&self.set_tags)
            .unset_tags(&self.unset_tags);
        Ok(sql.finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RowAccessPolicies<'a> {
    client: &'a Client,
}

impl Client {
    pub fn row_access_policies(&self) -> RowAccessPolicies<'_> {
        RowAccessPolicies { client: self }
    }
}

impl RowAccessPolicies<'_> {
    pub async fn create(&self, request: &CreateRowAccessPolicy) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterRowAccessPolicy) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &SchemaObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("ROW ACCESS POLICY", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<RowAccessPolicy>> {
        self.client.show("ROW ACCESS POLICIES", options).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<RowAccessPolicy> {
        self.client.show_by_id("ROW ACCESS POLICIES", id).await
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<PolicyDescription> {
        let rows = self.client.describe_rows("ROW ACCESS POLICY", id).await?;
        let row = rows.first().ok_or(SnowflakeError::EmptyResult)?;
        PolicyDescription::from_row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::DataType;
    use crate::testing::FakeDriver;

    #[test]
    fn create_renders_boolean_body() -> SnowflakeResult<()> {
        let id = SchemaObjectIdentifier::new("DB", "SC", "RAP")?;
        let sql = CreateRowAccessPolicy::new(
            id.clone(),
            vec![Argument::new("X", DataType::parse("TIMESTAMP")?)],
            "true",
        )
        .comment("all rows")
        .render()?;
        assert_eq!(
            sql,
            "CREATE ROW ACCESS POLICY DB.SC.RAP AS (X TIMESTAMP_NTZ(9)) RETURNS BOOLEAN -> true \
             COMMENT = 'all rows'"
        );
        assert!(CreateRowAccessPolicy::new(id, vec![], "true").render().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn describe_normalises_signature() -> SnowflakeResult<()> {
        let cases = [
            ("TS", "(x TIMESTAMP)", "(x TIMESTAMP_NTZ)", DataType::TimestampNtz { precision: 9 }),
            ("VC", "(x VARCHAR(200))", "(x VARCHAR)", DataType::Varchar { length: 200 }),
            ("NUM", "(x NUMBER(38,0))", "(x NUMBER)", DataType::Number { precision: 38, scale: 0 }),
        ];
        let mut driver = FakeDriver::new();
        for (name, raw, _, _) in &cases {
            driver = driver.with_rows(
                &format!("DESCRIBE ROW ACCESS POLICY DB.SC.{name}"),
                vec![Row::new()
                    .with("name", *name)
                    .with("signature", *raw)
                    .with("return_type", "BOOLEAN")
                    .with("body", "true")],
            );
        }
        let client = Client::new(driver);

        for (name, _, normalised, data_type) in cases {
            let id = SchemaObjectIdentifier::new("DB", "SC", name)?;
            let description = client.row_access_policies().describe(&id).await?;
            assert_eq!(description.signature_text(), normalised);
            assert_eq!(description.signature.len(), 1);
            assert_eq!(description.signature[0].name, "x");
            assert_eq!(description.signature[0].data_type, data_type);
            assert_eq!(description.return_type, DataType::Boolean);
            assert_eq!(description.body, "true");
        }
        Ok(())
    }
}
