use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{quote_part, SchemaObjectIdentifier};
use crate::objects::common::{DropOptions, ShowOptions, TagAssociation};
use crate::objects::table::{ColumnDetail, ColumnMaskingPolicy, RowAccessPolicyReference};
use crate::row::{FromRow, Row};
use crate::sql::{at_most_one, exactly_one_action, required, Render, SqlBuilder};

#[derive(Clone, Debug, PartialEq)]
pub struct View {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub kind: Option<String>,
    pub reserved: Option<String>,
    pub database_name: String,
    pub schema_name: String,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub text: Option<String>,
    pub is_secure: bool,
    pub is_materialized: bool,
    pub owner_role_type: Option<String>,
    pub change_tracking: Option<String>,
}

impl FromRow for View {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(View {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            kind: row.opt_string("kind"),
            reserved: row.opt_string("reserved"),
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            text: row.opt_string("text"),
            is_secure: row.opt_bool("is_secure").unwrap_or(false),
            is_materialized: row.opt_bool("is_materialized").unwrap_or(false),
            owner_role_type: row.opt_string("owner_role_type"),
            change_tracking: row.opt_string("change_tracking"),
        })
    }
}

impl Identifiable for View {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::from_trusted(&self.database_name, &self.schema_name, &self.name)
    }
}

/// A column in the optional column list of CREATE VIEW
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewColumn {
    pub name: String,
    pub comment: Option<String>,
    pub masking_policy: Option<ColumnMaskingPolicy>,
}

impl ViewColumn {
    pub fn new(name: impl Into<String>) -> ViewColumn {
        ViewColumn {
            name: name.into(),
            comment: None,
            masking_policy: None,
        }
    }

    fn to_sql(&self) -> String {
        let mut sql = SqlBuilder::default();
        sql.raw(quote_part(&self.name));
        if let Some(masking) = &self.masking_policy {
            sql.keyword("MASKING POLICY").identifier(&masking.policy);
            if !masking.using.is_empty() {
                sql.keyword("USING")
                    .list(masking.using.iter().map(|c| quote_part(c)));
            }
        }
        sql.keyword_string("COMMENT", self.comment.as_deref());
        sql.finish()
    }
}

string_setters!(ViewColumn { comment });
setters!(ViewColumn { masking_policy: ColumnMaskingPolicy });

#[derive(Clone, Debug, PartialEq)]
pub struct CreateView {
    id: SchemaObjectIdentifier,
    query: String,
    or_replace: bool,
    secure: bool,
    temporary: bool,
    recursive: bool,
    if_not_exists: bool,
    columns: Vec<ViewColumn>,
    copy_grants: bool,
    comment: Option<String>,
    row_access_policy: Option<RowAccessPolicyReference>,
    tags: Vec<TagAssociation>,
}

impl CreateView {
    pub fn new(id: SchemaObjectIdentifier, query: impl Into<String>) -> CreateView {
        CreateView {
            id,
            query: query.into(),
            or_replace: false,
            secure: false,
            temporary: false,
            recursive: false,
            if_not_exists: false,
            columns: vec![],
            copy_grants: false,
            comment: None,
            row_access_policy: None,
            tags: vec![],
        }
    }
}

flags!(CreateView { or_replace, secure, temporary, recursive, if_not_exists, copy_grants });
string_setters!(CreateView { comment });
setters!(CreateView { row_access_policy: RowAccessPolicyReference });
list_setters!(CreateView { columns: ViewColumn, tags: TagAssociation });

impl Render for CreateView {
    fn render(&self) -> SnowflakeResult<String> {
        required("CREATE VIEW query", &self.query)?;
        at_most_one(
            "CREATE VIEW",
            &[("OR REPLACE", self.or_replace), ("IF NOT EXISTS", self.if_not_exists)],
        )?;
        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword_if(self.secure, "SECURE")
            .keyword_if(self.temporary, "TEMPORARY")
            .keyword_if(self.recursive, "RECURSIVE")
            .keyword("VIEW")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id);
        if !self.columns.is_empty() {
            sql.list(self.columns.iter().map(ViewColumn::to_sql));
        }
        sql.keyword_if(self.copy_grants, "COPY GRANTS")
            .comment(self.comment.as_deref());
        if let Some(policy) = &self.row_access_policy {
            policy.render_into("WITH ROW ACCESS POLICY", &mut sql);
        }
        sql.tags("WITH TAG", &self.tags)
            .keyword("AS")
            .raw(self.query.as_str());
        Ok(sql.finish())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AlterView {
    id: SchemaObjectIdentifier,
    if_exists: bool,
    rename_to: Option<SchemaObjectIdentifier>,
    set_comment: Option<String>,
    unset_comment: bool,
    set_secure: bool,
    unset_secure: bool,
    change_tracking: Option<bool>,
    add_row_access_policy: Option<RowAccessPolicyReference>,
    drop_row_access_policy: Option<SchemaObjectIdentifier>,
    drop_all_row_access_policies: bool,
    set_tags: Vec<TagAssociation>,
    unset_tags: Vec<SchemaObjectIdentifier>,
}

impl AlterView {
    pub fn new(id: SchemaObjectIdentifier) -> AlterView {
        AlterView {
            id,
            if_exists: false,
            rename_to: None,
            set_comment: None,
            unset_comment: false,
            set_secure: false,
            unset_secure: false,
            change_tracking: None,
            add_row_access_policy: None,
            drop_row_access_policy: None,
            drop_all_row_access_policies: false,
            set_tags: vec![],
            unset_tags: vec![],
        }
    }
}

flags!(AlterView {
    if_exists,
    unset_comment,
    set_secure,
    unset_secure,
    drop_all_row_access_policies,
});
setters!(AlterView {
    rename_to: SchemaObjectIdentifier,
    change_tracking: bool,
    add_row_access_policy: RowAccessPolicyReference,
    drop_row_access_policy: SchemaObjectIdentifier,
});
string_setters!(AlterView { set_comment });
list_setters!(AlterView { set_tags: TagAssociation, unset_tags: SchemaObjectIdentifier });

impl Render for AlterView {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.rename_to.is_some(),
            self.set_comment.is_some(),
            self.unset_comment,
            self.set_secure,
            self.unset_secure,
            self.change_tracking.is_some(),
            self.add_row_access_policy.is_some(),
            self.drop_row_access_policy.is_some(),
            self.drop_all_row_access_policies,
            !self.set_tags.is_empty(),
            !self.unset_tags.is_empty(),
        ])?;
        let mut sql = SqlBuilder::new("ALTER VIEW");
        sql.keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_identifier("RENAME TO", self.rename_to.as_ref())
            .keyword_if(self.set_comment.is_some(), "SET")
            .comment(self.set_comment.as_deref())
            .keyword_if(self.unset_comment, "UNSET COMMENT")
            .keyword_if(self.set_secure, "SET SECURE")
            .keyword_if(self.unset_secure, "UNSET SECURE");
        if let Some(change_tracking) = self.change_tracking {
            sql.keyword("SET").bool_param("CHANGE_TRACKING", Some(change_tracking));
        }
        if let Some(policy) = &self.add_row_access_policy {
            policy.render_into("ADD ROW ACCESS POLICY", &mut sql);
        }
        sql.keyword_identifier("DROP ROW ACCESS POLICY", self.drop_row_access_policy.as_ref())
            .keyword_if(self.drop_all_row_access_policies, "DROP ALL ROW ACCESS POLICIES")
            .set_tags(&self.set_tags)
            .unset_tags(&self.unset_tags);
        Ok(sql.finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Views<'a> {
    client: &'a Client,
}

impl Client {
    pub fn views(&self) -> Views<'_> {
        Views { client: self }
    }
}

impl Views<'_> {
    pub async fn create(&self, request: &CreateView) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterView) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &SchemaObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("VIEW", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<View>> {
        self.client.show("VIEWS", options).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<View> {
        self.client.show_by_id("VIEWS", id).await
    }

    pub async fn describe_columns(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Vec<ColumnDetail>> {
        let rows = self.client.describe_rows("VIEW", id).await?;
        if rows.is_empty() {
            return Err(SnowflakeError::EmptyResult);
        }
        rows.iter().map(ColumnDetail::from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_secure_view_with_columns() -> SnowflakeResult<()> {
        let id = SchemaObjectIdentifier::new("DB", "SC", "V")?;
        let sql = CreateView::new(id, "SELECT id, email FROM t")
            .or_replace()
            .secure()
            .columns(vec![
                ViewColumn::new("ID"),
                ViewColumn::new("EMAIL").masking_policy(ColumnMaskingPolicy {
                    policy: SchemaObjectIdentifier::new("DB", "SC", "MASK")?,
                    using: vec![],
                }),
            ])
            .comment("masked")
            .render()?;
        assert_eq!(
            sql,
            "CREATE OR REPLACE SECURE VIEW DB.SC.V (ID, EMAIL MASKING POLICY DB.SC.MASK) \
             COMMENT = 'masked' AS SELECT id, email FROM t"
        );
        Ok(())
    }

    #[test]
    fn alter_view_single_action() -> SnowflakeResult<()> {
        let id = SchemaObjectIdentifier::new("DB", "SC", "V")?;
        assert_eq!(
            AlterView::new(id.clone()).change_tracking(true).render()?,
            "ALTER VIEW DB.SC.V SET CHANGE_TRACKING = true"
        );
        assert_eq!(
            AlterView::new(id.clone()).unset_secure().render()?,
            "ALTER VIEW DB.SC.V UNSET SECURE"
        );
        assert!(AlterView::new(id).set_secure().unset_comment().render().is_err());
        Ok(())
    }
}
