//! Tags, and attaching them to any taggable object.
//!
//! Most CREATE and ALTER requests carry their own `TAG (...)` and
//! `SET TAG`/`UNSET TAG` clauses. [`SetTags`] and [`UnsetTags`] cover the
//! remaining case of tagging an object by type and identifier, including
//! table columns, which go through `ALTER TABLE ... MODIFY COLUMN`.

use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{quote_part, AnyObjectIdentifier, ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{DropOptions, ObjectType, ShowOptions, TagAssociation, UndropStatement};
use crate::row::{FromRow, Row};
use crate::sql::{at_most_one, exactly_one_action, quote_string, Render, SqlBuilder};

#[derive(Clone, Debug, PartialEq)]
pub struct Tag {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub allowed_values: Vec<String>,
    pub owner_role_type: Option<String>,
}

impl FromRow for Tag {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        // `["a","b"]`, or NULL when any value is allowed
        let allowed_values = match row.opt_string("allowed_values") {
            Some(json) => serde_json::from_str::<Vec<String>>(&json)?,
            None => vec![],
        };
        Ok(Tag {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            allowed_values,
            owner_role_type: row.opt_string("owner_role_type"),
        })
    }
}

impl Identifiable for Tag {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::from_trusted(&self.database_name, &self.schema_name, &self.name)
    }
}

fn quoted_values(values: &[String]) -> Vec<String> {
    values.iter().map(|v| quote_string(v)).collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateTag {
    id: SchemaObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    allowed_values: Vec<String>,
    comment: Option<String>,
}

impl CreateTag {
    pub fn new(id: SchemaObjectIdentifier) -> CreateTag {
        CreateTag {
            id,
            or_replace: false,
            if_not_exists: false,
            allowed_values: vec![],
            comment: None,
        }
    }
}

flags!(CreateTag { or_replace, if_not_exists });
string_setters!(CreateTag { comment });
list_setters!(CreateTag { allowed_values: String });

impl Render for CreateTag {
    fn render(&self) -> SnowflakeResult<String> {
        at_most_one(
            "CREATE TAG",
            &[("OR REPLACE", self.or_replace), ("IF NOT EXISTS", self.if_not_exists)],
        )?;
        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword("TAG")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id);
        if !self.allowed_values.is_empty() {
            sql.keyword("ALLOWED_VALUES")
                .comma_separated(quoted_values(&self.allowed_values));
        }
        sql.comment(self.comment.as_deref());
        Ok(sql.finish())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlterTag {
    id: SchemaObjectIdentifier,
    if_exists: bool,
    rename_to: Option<SchemaObjectIdentifier>,
    add_allowed_values: Vec<String>,
    drop_allowed_values: Vec<String>,
    unset_allowed_values: bool,
    set_masking_policies: Vec<SchemaObjectIdentifier>,
    force: bool,
    unset_masking_policies: Vec<SchemaObjectIdentifier>,
    set_comment: Option<String>,
    unset_comment: bool,
}

impl AlterTag {
    pub fn new(id: SchemaObjectIdentifier) -> AlterTag {
        AlterTag {
            id,
            if_exists: false,
            rename_to: None,
            add_allowed_values: vec![],
            drop_allowed_values: vec![],
            unset_allowed_values: false,
            set_masking_policies: vec![],
            force: false,
            unset_masking_policies: vec![],
            set_comment: None,
            unset_comment: false,
        }
    }
}

flags!(AlterTag {
    if_exists,
    unset_allowed_values,
    force,
    unset_comment,
});
setters!(AlterTag { rename_to: SchemaObjectIdentifier });
string_setters!(AlterTag { set_comment });
list_setters!(AlterTag {
    add_allowed_values: String,
    drop_allowed_values: String,
    set_masking_policies: SchemaObjectIdentifier,
    unset_masking_policies: SchemaObjectIdentifier,
});

fn masking_policy_list(policies: &[SchemaObjectIdentifier]) -> Vec<String> {
    policies
        .iter()
        .map(|p| format!("MASKING POLICY {}", p.fully_qualified_name()))
        .collect()
}

impl Render for AlterTag {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.rename_to.is_some(),
            !self.add_allowed_values.is_empty(),
            !self.drop_allowed_values.is_empty(),
            self.unset_allowed_values,
            !self.set_masking_policies.is_empty(),
            !self.unset_masking_policies.is_empty(),
            self.set_comment.is_some(),
            self.unset_comment,
        ])?;
        let mut sql = SqlBuilder::new("ALTER TAG");
        sql.keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_identifier("RENAME TO", self.rename_to.as_ref());
        if !self.add_allowed_values.is_empty() {
            sql.keyword("ADD ALLOWED_VALUES")
                .comma_separated(quoted_values(&self.add_allowed_values));
        }
        if !self.drop_allowed_values.is_empty() {
            sql.keyword("DROP ALLOWED_VALUES")
                .comma_separated(quoted_values(&self.drop_allowed_values));
        }
        sql.keyword_if(self.unset_allowed_values, "UNSET ALLOWED_VALUES");
        if !self.set_masking_policies.is_empty() {
            sql.keyword("SET")
                .comma_separated(masking_policy_list(&self.set_masking_policies))
                .keyword_if(self.force, "FORCE");
        }
        if !self.unset_masking_policies.is_empty() {
            sql.keyword("UNSET")
                .comma_separated(masking_policy_list(&self.unset_masking_policies));
        }
        if let Some(comment) = &self.set_comment {
            sql.keyword("SET").comment(Some(comment.as_str()));
        }
        sql.keyword_if(self.unset_comment, "UNSET COMMENT");
        Ok(sql.finish())
    }
}

fn alter_object_head(
    object_type: ObjectType,
    id: &AnyObjectIdentifier,
    if_exists: bool,
) -> SnowflakeResult<SqlBuilder> {
    if !object_type.is_taggable() {
        return Err(SnowflakeError::InvalidRequest(format!(
            "{object_type} objects cannot carry tags"
        )));
    }
    let mut sql = SqlBuilder::new("ALTER");
    match (object_type, id) {
        (ObjectType::Column, AnyObjectIdentifier::Column(column)) => {
            sql.keyword("TABLE")
                .keyword_if(if_exists, "IF EXISTS")
                .identifier(column.table_id())
                .keyword("MODIFY COLUMN")
                .raw(quote_part(column.name()));
        }
        (ObjectType::Column, _) => {
            return Err(SnowflakeError::InvalidRequest(
                "column tags need a table column identifier".to_owned(),
            ));
        }
        (object_type, id) => {
            sql.keyword(object_type.as_str())
                .keyword_if(if_exists, "IF EXISTS")
                .raw(id.fully_qualified_name());
        }
    }
    Ok(sql)
}

/// `ALTER <type> <id> SET TAG ...`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetTags {
    object_type: ObjectType,
    id: AnyObjectIdentifier,
    if_exists: bool,
    tags: Vec<TagAssociation>,
}

impl SetTags {
    pub fn new(
        object_type: ObjectType,
        id: impl Into<AnyObjectIdentifier>,
        tags: Vec<TagAssociation>,
    ) -> SetTags {
        SetTags {
            object_type,
            id: id.into(),
            if_exists: false,
            tags,
        }
    }
}

flags!(SetTags { if_exists });

impl Render for SetTags {
    fn render(&self) -> SnowflakeResult<String> {
        if self.tags.is_empty() {
            return Err(SnowflakeError::InvalidRequest(
                "SET TAG needs at least one tag".to_owned(),
            ));
        }
        Ok(alter_object_head(self.object_type, &self.id, self.if_exists)?
            .set_tags(&self.tags)
            .finish())
    }
}

/// `ALTER <type> <id> UNSET TAG ...`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsetTags {
    object_type: ObjectType,
    id: AnyObjectIdentifier,
    if_exists: bool,
    tags: Vec<SchemaObjectIdentifier>,
}

impl UnsetTags {
    pub fn new(
        object_type: ObjectType,
        id: impl Into<AnyObjectIdentifier>,
        tags: Vec<SchemaObjectIdentifier>,
    ) -> UnsetTags {
        UnsetTags {
            object_type,
            id: id.into(),
            if_exists: false,
            tags,
        }
    }
}

flags!(UnsetTags { if_exists });

impl Render for UnsetTags {
    fn render(&self) -> SnowflakeResult<String> {
        if self.tags.is_empty() {
            return Err(SnowflakeError::InvalidRequest(
                "UNSET TAG needs at least one tag".to_owned(),
            ));
        }
        Ok(alter_object_head(self.object_type, &self.id, self.if_exists)?
            .unset_tags(&self.tags)
            .finish())
    }
}

/// The object domain `SYSTEM$GET_TAG` expects; every table-like object answers to `TABLE`.
fn tag_domain(object_type: ObjectType) -> &'static str {
    match object_type {
        ObjectType::View
        | ObjectType::ExternalTable
        | ObjectType::EventTable
        | ObjectType::DynamicTable => "TABLE",
        other => other.as_str(),
    }
}

/// `SELECT SYSTEM$GET_TAG('<tag>', '<object>', '<domain>')`
struct GetTag<'a> {
    tag: &'a SchemaObjectIdentifier,
    id: &'a AnyObjectIdentifier,
    object_type: ObjectType,
}

impl Render for GetTag<'_> {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(format!(
            "SELECT SYSTEM$GET_TAG({}, {}, {}) AS \"TAG_VALUE\"",
            quote_string(&self.tag.fully_qualified_name()),
            quote_string(&self.id.fully_qualified_name()),
            quote_string(tag_domain(self.object_type)),
        ))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Tags<'a> {
    client: &'a Client,
}

impl Client {
    pub fn tags(&self) -> Tags<'_> {
        Tags { client: self }
    }
}

impl Tags<'_> {
    pub async fn create(&self, request: &CreateTag) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterTag) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &SchemaObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("TAG", id, options).await
    }

    pub async fn undrop(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        self.client
            .exec(&UndropStatement {
                noun: "TAG",
                name: id.fully_qualified_name(),
            })
            .await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<Tag>> {
        self.client.show("TAGS", options).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Tag> {
        self.client.show_by_id("TAGS", id).await
    }

    pub async fn set(&self, request: &SetTags) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn unset(&self, request: &UnsetTags) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    /// The value of `tag` on an object, or `None` when the tag is not set on it
    pub async fn get(
        &self,
        tag: &SchemaObjectIdentifier,
        object_type: ObjectType,
        id: impl Into<AnyObjectIdentifier>,
    ) -> SnowflakeResult<Option<String>> {
        let id = id.into();
        let rows = self
            .client
            .query_rows(&GetTag {
                tag,
                id: &id,
                object_type,
            })
            .await?;
        Ok(rows
            .first()
            .ok_or(SnowflakeError::EmptyResult)?
            .opt_string("TAG_VALUE"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::AccountObjectIdentifier;
    use crate::testing::FakeDriver;

    fn tag() -> SnowflakeResult<SchemaObjectIdentifier> {
        SchemaObjectIdentifier::new("DB", "SC", "COST_CENTER")
    }

    #[test]
    fn create_and_alter() -> SnowflakeResult<()> {
        assert_eq!(
            CreateTag::new(tag()?)
                .allowed_values(vec!["finance".into(), "eng".into()])
                .comment("owner")
                .render()?,
            "CREATE TAG DB.SC.COST_CENTER ALLOWED_VALUES 'finance', 'eng' COMMENT = 'owner'"
        );
        let policy = SchemaObjectIdentifier::new("DB", "SC", "MASK")?;
        assert_eq!(
            AlterTag::new(tag()?)
                .set_masking_policies(vec![policy.clone()])
                .force()
                .render()?,
            "ALTER TAG DB.SC.COST_CENTER SET MASKING POLICY DB.SC.MASK FORCE"
        );
        assert_eq!(
            AlterTag::new(tag()?).unset_masking_policies(vec![policy]).render()?,
            "ALTER TAG DB.SC.COST_CENTER UNSET MASKING POLICY DB.SC.MASK"
        );
        assert_eq!(
            AlterTag::new(tag()?).drop_allowed_values(vec!["eng".into()]).render()?,
            "ALTER TAG DB.SC.COST_CENTER DROP ALLOWED_VALUES 'eng'"
        );
        assert!(AlterTag::new(tag()?).render().is_err());
        Ok(())
    }

    #[test]
    fn set_and_unset_on_objects() -> SnowflakeResult<()> {
        let table = SchemaObjectIdentifier::new("DB", "SC", "T")?;
        assert_eq!(
            SetTags::new(
                ObjectType::Table,
                table.clone(),
                vec![TagAssociation::new(tag()?, "finance")]
            )
            .if_exists()
            .render()?,
            "ALTER TABLE IF EXISTS DB.SC.T SET TAG DB.SC.COST_CENTER = 'finance'"
        );
        assert_eq!(
            UnsetTags::new(ObjectType::Column, table.column("amount")?, vec![tag()?]).render()?,
            "ALTER TABLE DB.SC.T MODIFY COLUMN \"amount\" UNSET TAG DB.SC.COST_CENTER"
        );
        assert_eq!(
            UnsetTags::new(
                ObjectType::Warehouse,
                AccountObjectIdentifier::new("WH")?,
                vec![tag()?]
            )
            .render()?,
            "ALTER WAREHOUSE WH UNSET TAG DB.SC.COST_CENTER"
        );
        assert!(UnsetTags::new(ObjectType::Column, table, vec![tag()?]).render().is_err());
        assert!(SetTags::new(
            ObjectType::ResourceMonitor,
            AccountObjectIdentifier::new("RM")?,
            vec![TagAssociation::new(tag()?, "x")]
        )
        .render()
        .is_err());
        Ok(())
    }

    #[tokio::test]
    async fn get_tag_and_allowed_values() -> SnowflakeResult<()> {
        let view = SchemaObjectIdentifier::new("DB", "SC", "V")?;
        let driver = FakeDriver::new()
            .with_rows(
                "SELECT SYSTEM$GET_TAG('DB.SC.COST_CENTER', 'DB.SC.V', 'TABLE') AS \"TAG_VALUE\"",
                vec![Row::new().with("TAG_VALUE", "finance")],
            )
            .with_rows(
                "SHOW TAGS LIKE 'COST_CENTER' IN SCHEMA DB.SC",
                vec![Row::new()
                    .with("name", "COST_CENTER")
                    .with("database_name", "DB")
                    .with("schema_name", "SC")
                    .with("allowed_values", "[\"finance\",\"eng\"]")],
            );
        let client = Client::new(driver);
        let value = client.tags().get(&tag()?, ObjectType::View, view).await?;
        assert_eq!(value.as_deref(), Some("finance"));
        let shown = client.tags().show_by_id(&tag()?).await?;
        assert_eq!(shown.allowed_values, vec!["finance", "eng"]);
        Ok(())
    }
}
