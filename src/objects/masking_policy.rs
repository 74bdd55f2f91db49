use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::datatypes::DataType;
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::SchemaObjectIdentifier;
use crate::objects::common::{
    render_arguments, Argument, DropOptions, PolicyDescription, ShowOptions, TagAssociation,
};
use crate::row::{parse_bool, FromRow, Row};
use crate::sql::{at_most_one, exactly_one_action, required, Render, SqlBuilder};

#[derive(Clone, Debug, PartialEq)]
pub struct MaskingPolicy {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub kind: Option<String>,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub exempt_other_policies: bool,
    pub owner_role_type: Option<String>,
}

/// `options` is a JSON object such as `{"EXEMPT_OTHER_POLICIES": "TRUE"}`
fn exempt_from_options(options: Option<String>) -> SnowflakeResult<bool> {
    let Some(options) = options else {
        return Ok(false);
    };
    let options: HashMap<String, serde_json::Value> = serde_json::from_str(&options)?;
    Ok(match options.get("EXEMPT_OTHER_POLICIES") {
        Some(serde_json::Value::Bool(value)) => *value,
        Some(serde_json::Value::String(value)) => parse_bool(value).unwrap_or(false),
        _ => false,
    })
}

impl FromRow for MaskingPolicy {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(MaskingPolicy {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            kind: row.opt_string("kind"),
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            exempt_other_policies: exempt_from_options(row.opt_string("options"))?,
            owner_role_type: row.opt_string("owner_role_type"),
        })
    }
}

impl Identifiable for MaskingPolicy {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::from_trusted(&self.database_name, &self.schema_name, &self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateMaskingPolicy {
    id: SchemaObjectIdentifier,
    signature: Vec<Argument>,
    returns: DataType,
    body: String,
    or_replace: bool,
    if_not_exists: bool,
    comment: Option<String>,
    exempt_other_policies: Option<bool>,
}

impl CreateMaskingPolicy {
    /// The first argument is the masked value; `returns` must match its type.
    pub fn new(
        id: SchemaObjectIdentifier,
        signature: Vec<Argument>,
        returns: DataType,
        body: impl Into<String>,
    ) -> CreateMaskingPolicy {
        CreateMaskingPolicy {
            id,
            signature,
            returns,
            body: body.into(),
            or_replace: false,
            if_not_exists: false,
            comment: None,
            exempt_other_policies: None,
        }
    }
}

flags!(CreateMaskingPolicy { or_replace, if_not_exists });
setters!(CreateMaskingPolicy { exempt_other_policies: bool });
string_setters!(CreateMaskingPolicy { comment });

impl Render for CreateMaskingPolicy {
    fn render(&self) -> SnowflakeResult<String> {
        at_most_one(
            "CREATE MASKING POLICY",
            &[("OR REPLACE", self.or_replace), ("IF NOT EXISTS", self.if_not_exists)],
        )?;
        if self.signature.is_empty() {
            return Err(SnowflakeError::InvalidRequest(
                "CREATE MASKING POLICY: the signature needs at least the masked value".into(),
            ));
        }
        required("CREATE MASKING POLICY body", &self.body)?;
        Ok(SqlBuilder::new("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("MASKING POLICY")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id)
            .keyword("AS")
            .raw(render_arguments(&self.signature))
            .keyword("RETURNS")
            .raw(self.returns.canonical())
            .keyword("->")
            .raw(self.body.as_str())
            .comment(self.comment.as_deref())
            .bool_param("EXEMPT_OTHER_POLICIES", self.exempt_other_policies)
            .finish())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AlterMaskingPolicy {
    id: SchemaObjectIdentifier,
    if_exists: bool,
    rename_to: Option<SchemaObjectIdentifier>,
    set_body: Option<String>,
    set_comment: Option<String>,
    unset_comment: bool,
    set_tags: Vec<TagAssociation>,
    unset_tags: Vec<SchemaObjectIdentifier>,
}

impl AlterMaskingPolicy {
    pub fn new(id: SchemaObjectIdentifier) -> AlterMaskingPolicy {
        AlterMaskingPolicy {
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

flags!(AlterMaskingPolicy { if_exists, unset_comment });
setters!(AlterMaskingPolicy { rename_to: SchemaObjectIdentifier });
string_setters!(AlterMaskingPolicy { set_body, set_comment });
list_setters!(AlterMaskingPolicy {
    set_tags: TagAssociation,
    unset_tags: SchemaObjectIdentifier,
});

impl Render for AlterMaskingPolicy {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.rename_to.is_some(),
            self.set_body.is_some(),
            self.set_comment.is_some(),
            self.unset_comment,
            !self.set_tags.is_empty(),
            !self.unset_tags.is_empty(),
        ])?;
        let mut sql = SqlBuilder::new("ALTER MASKING POLICY");
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
pub struct MaskingPolicies<'a> {
    client: &'a Client,
}

impl Client {
    pub fn masking_policies(&self) -> MaskingPolicies<'_> {
        MaskingPolicies { client: self }
    }
}

impl MaskingPolicies<'_> {
    pub async fn create(&self, request: &CreateMaskingPolicy) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterMaskingPolicy) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &SchemaObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("MASKING POLICY", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<MaskingPolicy>> {
        self.client.show("MASKING POLICIES", options).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<MaskingPolicy> {
        self.client.show_by_id("MASKING POLICIES", id).await
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<PolicyDescription> {
        let rows = self.client.describe_rows("MASKING POLICY", id).await?;
        let row = rows.first().ok_or(SnowflakeError::EmptyResult)?;
        PolicyDescription::from_row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;

    #[test]
    fn create_masking_policy() -> SnowflakeResult<()> {
        let sql = CreateMaskingPolicy::new(
            SchemaObjectIdentifier::new("DB", "SC", "MASK_EMAIL")?,
            vec![
                Argument::new("val", DataType::parse("STRING")?),
                Argument::new("role", DataType::parse("TEXT")?),
            ],
            DataType::parse("STRING")?,
            "CASE WHEN role = 'ADMIN' THEN val ELSE '***' END",
        )
        .or_replace()
        .exempt_other_policies(true)
        .render()?;
        assert_eq!(
            sql,
            "CREATE OR REPLACE MASKING POLICY DB.SC.MASK_EMAIL AS \
             (\"val\" VARCHAR(16777216), \"role\" VARCHAR(16777216)) RETURNS VARCHAR(16777216) -> \
             CASE WHEN role = 'ADMIN' THEN val ELSE '***' END EXEMPT_OTHER_POLICIES = true"
        );
        Ok(())
    }

    #[test]
    fn alter_masking_policy() -> SnowflakeResult<()> {
        let id = SchemaObjectIdentifier::new("DB", "SC", "M")?;
        assert_eq!(
            AlterMaskingPolicy::new(id.clone()).set_body("'***'").render()?,
            "ALTER MASKING POLICY DB.SC.M SET BODY -> '***'"
        );
        assert!(AlterMaskingPolicy::new(id)
            .set_comment("a")
            .unset_comment()
            .render()
            .is_err());
        Ok(())
    }

    #[tokio::test]
    async fn show_reads_exemption_option() -> SnowflakeResult<()> {
        let id = SchemaObjectIdentifier::new("DB", "SC", "M")?;
        let driver = FakeDriver::new().with_rows(
            "SHOW MASKING POLICIES LIKE 'M' IN SCHEMA DB.SC",
            vec![Row::new()
                .with("name", "M")
                .with("database_name", "DB")
                .with("schema_name", "SC")
                .with("kind", "MASKING_POLICY")
                .with("options", r#"{"EXEMPT_OTHER_POLICIES": "TRUE"}"#)],
        );
        let policy = Client::new(driver).masking_policies().show_by_id(&id).await?;
        assert!(policy.exempt_other_policies);
        Ok(())
    }
}
