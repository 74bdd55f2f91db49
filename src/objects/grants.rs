use chrono::{DateTime, Utc};

use crate::client::Client;
use crate::errors::SnowflakeResult;
use crate::identifiers::{
    AccountObjectIdentifier, AnyObjectIdentifier, DatabaseObjectIdentifier, ObjectIdentifier,
};
use crate::objects::common::ObjectType;
use crate::row::{FromRow, Row};
use crate::sql::{Render, SqlBuilder};

/// One row of `SHOW GRANTS`.
///
/// `SHOW GRANTS OF ROLE` answers with a `role` column instead of
/// `privilege`/`granted_on`/`name`; the role lands in `name` and the other
/// two stay empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Grant {
    pub created_on: Option<DateTime<Utc>>,
    pub privilege: Option<String>,
    pub granted_on: Option<String>,
    pub name: String,
    pub granted_to: Option<String>,
    pub grantee_name: String,
    pub grant_option: bool,
    pub granted_by: Option<String>,
}

impl FromRow for Grant {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        let name = match row.opt_string("name") {
            Some(name) => name,
            None => row.string("role")?,
        };
        Ok(Grant {
            created_on: row.opt_timestamp("created_on"),
            privilege: row.opt_string("privilege"),
            granted_on: row.opt_string("granted_on"),
            name,
            granted_to: row.opt_string("granted_to"),
            grantee_name: row.string("grantee_name")?,
            grant_option: row.opt_bool("grant_option").unwrap_or(false),
            granted_by: row.opt_string("granted_by"),
        })
    }
}

/// What a `SHOW GRANTS` lists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShowGrants {
    /// Privileges granted on an object
    On {
        object_type: ObjectType,
        id: AnyObjectIdentifier,
    },
    /// Privileges granted on the account itself
    OnAccount,
    /// Privileges and roles granted to a role
    ToRole(AccountObjectIdentifier),
    /// Privileges and roles granted to a database role
    ToDatabaseRole(DatabaseObjectIdentifier),
    /// Roles granted to a user
    ToUser(AccountObjectIdentifier),
    /// Users and roles a role has been granted to
    OfRole(AccountObjectIdentifier),
}

impl ShowGrants {
    pub fn on(object_type: ObjectType, id: impl Into<AnyObjectIdentifier>) -> ShowGrants {
        ShowGrants::On {
            object_type,
            id: id.into(),
        }
    }
}

impl Render for ShowGrants {
    fn render(&self) -> SnowflakeResult<String> {
        let mut sql = SqlBuilder::new("SHOW GRANTS");
        match self {
            ShowGrants::On { object_type, id } => {
                sql.keyword("ON")
                    .keyword(object_type.as_str())
                    .raw(id.fully_qualified_name());
            }
            ShowGrants::OnAccount => {
                sql.keyword("ON ACCOUNT");
            }
            ShowGrants::ToRole(role) => {
                sql.keyword("TO ROLE").identifier(role);
            }
            ShowGrants::ToDatabaseRole(role) => {
                sql.keyword("TO DATABASE ROLE").identifier(role);
            }
            ShowGrants::ToUser(user) => {
                sql.keyword("TO USER").identifier(user);
            }
            ShowGrants::OfRole(role) => {
                sql.keyword("OF ROLE").identifier(role);
            }
        }
        Ok(sql.finish())
    }
}

/// Who receives a granted role.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoleGrantee {
    Role(AccountObjectIdentifier),
    User(AccountObjectIdentifier),
}

impl RoleGrantee {
    fn render_into(&self, sql: &mut SqlBuilder) {
        match self {
            RoleGrantee::Role(role) => sql.keyword("ROLE").identifier(role),
            RoleGrantee::User(user) => sql.keyword("USER").identifier(user),
        };
    }
}

/// `GRANT ROLE <role> TO { ROLE | USER } <grantee>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrantRole {
    role: AccountObjectIdentifier,
    grantee: RoleGrantee,
}

impl GrantRole {
    pub fn new(role: AccountObjectIdentifier, grantee: RoleGrantee) -> GrantRole {
        GrantRole { role, grantee }
    }
}

impl Render for GrantRole {
    fn render(&self) -> SnowflakeResult<String> {
        let mut sql = SqlBuilder::new("GRANT ROLE");
        sql.identifier(&self.role).keyword("TO");
        self.grantee.render_into(&mut sql);
        Ok(sql.finish())
    }
}

/// `REVOKE ROLE <role> FROM { ROLE | USER } <grantee>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevokeRole {
    role: AccountObjectIdentifier,
    grantee: RoleGrantee,
}

impl RevokeRole {
    pub fn new(role: AccountObjectIdentifier, grantee: RoleGrantee) -> RevokeRole {
        RevokeRole { role, grantee }
    }
}

impl Render for RevokeRole {
    fn render(&self) -> SnowflakeResult<String> {
        let mut sql = SqlBuilder::new("REVOKE ROLE");
        sql.identifier(&self.role).keyword("FROM");
        self.grantee.render_into(&mut sql);
        Ok(sql.finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Grants<'a> {
    client: &'a Client,
}

impl Client {
    pub fn grants(&self) -> Grants<'_> {
        Grants { client: self }
    }
}

impl Grants<'_> {
    pub async fn show(&self, request: &ShowGrants) -> SnowflakeResult<Vec<Grant>> {
        self.client.query(request).await
    }

    pub async fn grant_role(&self, request: &GrantRole) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn revoke_role(&self, request: &RevokeRole) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    /// Whether `role` has been granted to `grantee`, read back through `SHOW GRANTS OF ROLE`
    pub async fn is_role_granted(
        &self,
        role: &AccountObjectIdentifier,
        grantee: &RoleGrantee,
    ) -> SnowflakeResult<bool> {
        let (granted_to, name) = match grantee {
            RoleGrantee::Role(id) => ("ROLE", id),
            RoleGrantee::User(id) => ("USER", id),
        };
        let grants = self.show(&ShowGrants::OfRole(role.clone())).await?;
        Ok(grants.iter().any(|grant| {
            grant.granted_to.as_deref() == Some(granted_to) && grant.grantee_name == name.name()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::SchemaObjectIdentifier;
    use crate::testing::FakeDriver;

    #[test]
    fn show_grants_targets() -> SnowflakeResult<()> {
        let table = SchemaObjectIdentifier::new("DB", "SC", "T")?;
        assert_eq!(
            ShowGrants::on(ObjectType::Table, table).render()?,
            "SHOW GRANTS ON TABLE DB.SC.T"
        );
        assert_eq!(ShowGrants::OnAccount.render()?, "SHOW GRANTS ON ACCOUNT");
        assert_eq!(
            ShowGrants::ToDatabaseRole(DatabaseObjectIdentifier::new("DB", "READER")?).render()?,
            "SHOW GRANTS TO DATABASE ROLE DB.READER"
        );
        assert_eq!(
            ShowGrants::OfRole(AccountObjectIdentifier::new("analyst")?).render()?,
            "SHOW GRANTS OF ROLE \"analyst\""
        );
        Ok(())
    }

    #[test]
    fn grant_and_revoke_role() -> SnowflakeResult<()> {
        let role = AccountObjectIdentifier::new("ANALYST")?;
        assert_eq!(
            GrantRole::new(role.clone(), RoleGrantee::Role(AccountObjectIdentifier::new("SYSADMIN")?))
                .render()?,
            "GRANT ROLE ANALYST TO ROLE SYSADMIN"
        );
        assert_eq!(
            RevokeRole::new(role, RoleGrantee::User(AccountObjectIdentifier::new("JDOE")?))
                .render()?,
            "REVOKE ROLE ANALYST FROM USER JDOE"
        );
        Ok(())
    }

    #[tokio::test]
    async fn grants_of_role_use_role_column() -> SnowflakeResult<()> {
        let driver = FakeDriver::new().with_rows(
            "SHOW GRANTS OF ROLE ANALYST",
            vec![Row::new()
                .with("role", "ANALYST")
                .with("granted_to", "USER")
                .with("grantee_name", "JDOE")
                .with("granted_by", "SECURITYADMIN")],
        );
        let client = Client::new(driver);
        let role = AccountObjectIdentifier::new("ANALYST")?;
        let grants = client.grants().show(&ShowGrants::OfRole(role.clone())).await?;
        assert_eq!(grants[0].name, "ANALYST");
        assert_eq!(grants[0].privilege, None);
        assert!(
            client
                .grants()
                .is_role_granted(&role, &RoleGrantee::User(AccountObjectIdentifier::new("JDOE")?))
                .await?
        );
        assert!(
            !client
                .grants()
                .is_role_granted(&role, &RoleGrantee::Role(AccountObjectIdentifier::new("JDOE")?))
                .await?
        );
        Ok(())
    }
}
