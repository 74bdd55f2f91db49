use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::SnowflakeResult;
use crate::identifiers::{AccountObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{DropOptions, ShowOptions, TagAssociation};
use crate::row::{FromRow, Row};
use crate::sql::{exactly_one_action, Render, SqlBuilder};

#[derive(Clone, Debug, PartialEq)]
pub struct Role {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub is_default: bool,
    pub is_current: bool,
    pub is_inherited: bool,
    pub assigned_to_users: Option<i64>,
    pub granted_to_roles: Option<i64>,
    pub granted_roles: Option<i64>,
    pub owner: Option<String>,
    pub comment: Option<String>,
}

impl FromRow for Role {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(Role {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            is_default: row.opt_bool("is_default").unwrap_or(false),
            is_current: row.opt_bool("is_current").unwrap_or(false),
            is_inherited: row.opt_bool("is_inherited").unwrap_or(false),
            assigned_to_users: row.opt_int("assigned_to_users"),
            granted_to_roles: row.opt_int("granted_to_roles"),
            granted_roles: row.opt_int("granted_roles"),
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
        })
    }
}

impl Identifiable for Role {
    type Id = AccountObjectIdentifier;

    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::from_trusted(&self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateRole {
    id: AccountObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    comment: Option<String>,
    tags: Vec<TagAssociation>,
}

impl CreateRole {
    pub fn new(id: AccountObjectIdentifier) -> CreateRole {
        CreateRole {
            id,
            or_replace: false,
            if_not_exists: false,
            comment: None,
            tags: vec![],
        }
    }
}

flags!(CreateRole { or_replace, if_not_exists });
string_setters!(CreateRole { comment });
list_setters!(CreateRole { tags: TagAssociation });

impl Render for CreateRole {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("ROLE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id)
            .comment(self.comment.as_deref())
            .tags("WITH TAG", &self.tags)
            .finish())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AlterRole {
    id: AccountObjectIdentifier,
    if_exists: bool,
    rename_to: Option<AccountObjectIdentifier>,
    set_comment: Option<String>,
    unset_comment: bool,
    set_tags: Vec<TagAssociation>,
    unset_tags: Vec<SchemaObjectIdentifier>,
}

impl AlterRole {
    pub fn new(id: AccountObjectIdentifier) -> AlterRole {
        AlterRole {
            id,
            if_exists: false,
            rename_to: None,
            set_comment: None,
            unset_comment: false,
            set_tags: vec![],
            unset_tags: vec![],
        }
    }
}

flags!(AlterRole { if_exists, unset_comment });
setters!(AlterRole { rename_to: AccountObjectIdentifier });
string_setters!(AlterRole { set_comment });
list_setters!(AlterRole { set_tags: TagAssociation, unset_tags: SchemaObjectIdentifier });

impl Render for AlterRole {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.rename_to.is_some(),
            self.set_comment.is_some(),
            self.unset_comment,
            !self.set_tags.is_empty(),
            !self.unset_tags.is_empty(),
        ])?;
        Ok(SqlBuilder::new("ALTER ROLE")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_identifier("RENAME TO", self.rename_to.as_ref())
            .keyword_if(self.set_comment.is_some(), "SET")
            .comment(self.set_comment.as_deref())
            .keyword_if(self.unset_comment, "UNSET COMMENT")
            .set_tags(&self.set_tags)
            .unset_tags(&self.unset_tags)
            .finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Roles<'a> {
    client: &'a Client,
}

impl Client {
    pub fn roles(&self) -> Roles<'_> {
        Roles { client: self }
    }
}

impl Roles<'_> {
    pub async fn create(&self, request: &CreateRole) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterRole) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &AccountObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("ROLE", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<Role>> {
        self.client.show("ROLES", options).await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Role> {
        self.client.show_by_id("ROLES", id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_role_statements() -> SnowflakeResult<()> {
        let id = AccountObjectIdentifier::new("ANALYST")?;
        assert_eq!(
            CreateRole::new(id.clone()).if_not_exists().comment("reads").render()?,
            "CREATE ROLE IF NOT EXISTS ANALYST COMMENT = 'reads'"
        );
        assert_eq!(
            AlterRole::new(id.clone()).set_comment("x").render()?,
            "ALTER ROLE ANALYST SET COMMENT = 'x'"
        );
        assert_eq!(
            AlterRole::new(id.clone()).unset_comment().render()?,
            "ALTER ROLE ANALYST UNSET COMMENT"
        );
        assert!(AlterRole::new(id).render().is_err());
        Ok(())
    }
}
