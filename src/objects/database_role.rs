use chrono::{DateTime, Utc};

use crate::client::{find_by_id, Client, Identifiable};
use crate::errors::SnowflakeResult;
use crate::identifiers::{AccountObjectIdentifier, DatabaseObjectIdentifier, ObjectIdentifier};
use crate::objects::common::{DropOptions, LimitFrom, Like};
use crate::row::{FromRow, Row};
use crate::sql::{exactly_one_action, Render, SqlBuilder};

/// A row of `SHOW DATABASE ROLES`.
///
/// The listing does not repeat the database, so [`DatabaseRoles::show`] fills
/// `database_name` in from the request.
#[derive(Clone, Debug, PartialEq)]
pub struct DatabaseRole {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub is_default: bool,
    pub is_current: bool,
    pub is_inherited: bool,
    pub granted_to_roles: Option<i64>,
    pub granted_to_database_roles: Option<i64>,
    pub granted_database_roles: Option<i64>,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub owner_role_type: Option<String>,
}

impl FromRow for DatabaseRole {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(DatabaseRole {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            database_name: row.opt_string("database_name").unwrap_or_default(),
            is_default: row.opt_bool("is_default").unwrap_or(false),
            is_current: row.opt_bool("is_current").unwrap_or(false),
            is_inherited: row.opt_bool("is_inherited").unwrap_or(false),
            granted_to_roles: row.opt_int("granted_to_roles"),
            granted_to_database_roles: row.opt_int("granted_to_database_roles"),
            granted_database_roles: row.opt_int("granted_database_roles"),
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            owner_role_type: row.opt_string("owner_role_type"),
        })
    }
}

impl Identifiable for DatabaseRole {
    type Id = DatabaseObjectIdentifier;

    fn id(&self) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::from_trusted(&self.database_name, &self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateDatabaseRole {
    id: DatabaseObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    comment: Option<String>,
}

impl CreateDatabaseRole {
    pub fn new(id: DatabaseObjectIdentifier) -> CreateDatabaseRole {
        CreateDatabaseRole {
            id,
            or_replace: false,
            if_not_exists: false,
            comment: None,
        }
    }
}

flags!(CreateDatabaseRole { or_replace, if_not_exists });
string_setters!(CreateDatabaseRole { comment });

impl Render for CreateDatabaseRole {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("DATABASE ROLE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id)
            .comment(self.comment.as_deref())
            .finish())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AlterDatabaseRole {
    id: DatabaseObjectIdentifier,
    if_exists: bool,
    rename_to: Option<DatabaseObjectIdentifier>,
    set_comment: Option<String>,
    unset_comment: bool,
}

impl AlterDatabaseRole {
    pub fn new(id: DatabaseObjectIdentifier) -> AlterDatabaseRole {
        AlterDatabaseRole {
            id,
            if_exists: false,
            rename_to: None,
            set_comment: None,
            unset_comment: false,
        }
    }
}

flags!(AlterDatabaseRole { if_exists, unset_comment });
setters!(AlterDatabaseRole { rename_to: DatabaseObjectIdentifier });
string_setters!(AlterDatabaseRole { set_comment });

impl Render for AlterDatabaseRole {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.rename_to.is_some(),
            self.set_comment.is_some(),
            self.unset_comment,
        ])?;
        Ok(SqlBuilder::new("ALTER DATABASE ROLE")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_identifier("RENAME TO", self.rename_to.as_ref())
            .keyword_if(self.set_comment.is_some(), "SET")
            .comment(self.set_comment.as_deref())
            .keyword_if(self.unset_comment, "UNSET COMMENT")
            .finish())
    }
}

/// `SHOW DATABASE ROLES [LIKE ...] IN DATABASE <db> [LIMIT ...]`; the database is mandatory.
#[derive(Clone, Debug, PartialEq)]
pub struct ShowDatabaseRoles {
    database: AccountObjectIdentifier,
    like: Option<Like>,
    limit: Option<LimitFrom>,
}

impl ShowDatabaseRoles {
    pub fn new(database: AccountObjectIdentifier) -> ShowDatabaseRoles {
        ShowDatabaseRoles {
            database,
            like: None,
            limit: None,
        }
    }

    pub fn like(mut self, pattern: impl Into<String>) -> Self {
        self.like = Some(Like {
            pattern: pattern.into(),
        });
        self
    }

    pub fn limit(mut self, rows: u32) -> Self {
        self.limit = Some(LimitFrom { rows, from: None });
        self
    }
}

impl Render for ShowDatabaseRoles {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("SHOW DATABASE ROLES")
            .like(self.like.as_ref())
            .keyword("IN DATABASE")
            .identifier(&self.database)
            .limit(self.limit.as_ref())
            .finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DatabaseRoles<'a> {
    client: &'a Client,
}

impl Client {
    pub fn database_roles(&self) -> DatabaseRoles<'_> {
        DatabaseRoles { client: self }
    }
}

impl DatabaseRoles<'_> {
    pub async fn create(&self, request: &CreateDatabaseRole) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterDatabaseRole) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &DatabaseObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("DATABASE ROLE", id, options).await
    }

    pub async fn show(&self, request: &ShowDatabaseRoles) -> SnowflakeResult<Vec<DatabaseRole>> {
        let mut roles: Vec<DatabaseRole> = self.client.query(request).await?;
        for role in &mut roles {
            if role.database_name.is_empty() {
                role.database_name = request.database.name().to_owned();
            }
        }
        Ok(roles)
    }

    pub async fn show_by_id(&self, id: &DatabaseObjectIdentifier) -> SnowflakeResult<DatabaseRole> {
        let request = ShowDatabaseRoles::new(id.database_id()).like(id.name());
        find_by_id(self.show(&request).await?, id)
    }
}
