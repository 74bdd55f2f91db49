use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{AccountObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{DropOptions, Properties, ShowOptions, TagAssociation};
use crate::row::{FromRow, Row};
use crate::sql::{exactly_one_action, Render, SqlBuilder};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UserType {
    Person,
    Service,
    LegacyService,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Person => "PERSON",
            UserType::Service => "SERVICE",
            UserType::LegacyService => "LEGACY_SERVICE",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub name: String,
    pub created_on: Option<DateTime<Utc>>,
    pub login_name: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub mins_to_unlock: Option<i64>,
    pub days_to_expiry: Option<String>,
    pub comment: Option<String>,
    pub disabled: bool,
    pub must_change_password: bool,
    pub snowflake_lock: bool,
    pub default_warehouse: Option<String>,
    pub default_namespace: Option<String>,
    pub default_role: Option<String>,
    pub default_secondary_roles: Option<String>,
    pub mins_to_bypass_mfa: Option<i64>,
    pub owner: Option<String>,
    pub last_success_login: Option<DateTime<Utc>>,
    pub expires_at_time: Option<DateTime<Utc>>,
    pub locked_until_time: Option<DateTime<Utc>>,
    pub has_password: bool,
    pub has_rsa_public_key: bool,
    pub user_type: Option<String>,
}

impl FromRow for User {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(User {
            name: row.string("name")?,
            created_on: row.opt_timestamp("created_on"),
            login_name: row.opt_string("login_name"),
            display_name: row.opt_string("display_name"),
            first_name: row.opt_string("first_name"),
            last_name: row.opt_string("last_name"),
            email: row.opt_string("email"),
            mins_to_unlock: row.opt_int("mins_to_unlock"),
            days_to_expiry: row.opt_string("days_to_expiry"),
            comment: row.opt_string("comment"),
            disabled: row.opt_bool("disabled").unwrap_or(false),
            must_change_password: row.opt_bool("must_change_password").unwrap_or(false),
            snowflake_lock: row.opt_bool("snowflake_lock").unwrap_or(false),
            default_warehouse: row.opt_string("default_warehouse"),
            default_namespace: row.opt_string("default_namespace"),
            default_role: row.opt_string("default_role"),
            default_secondary_roles: row.opt_string("default_secondary_roles"),
            mins_to_bypass_mfa: row.opt_int("mins_to_bypass_mfa"),
            owner: row.opt_string("owner"),
            last_success_login: row.opt_timestamp("last_success_login"),
            expires_at_time: row.opt_timestamp("expires_at_time"),
            locked_until_time: row.opt_timestamp("locked_until_time"),
            has_password: row.opt_bool("has_password").unwrap_or(false),
            has_rsa_public_key: row.opt_bool("has_rsa_public_key").unwrap_or(false),
            user_type: row.opt_string("type"),
        })
    }
}

impl Identifiable for User {
    type Id = AccountObjectIdentifier;

    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::from_trusted(&self.name)
    }
}

/// Properties accepted by CREATE USER and ALTER USER ... SET.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserProperties {
    password: Option<String>,
    login_name: Option<String>,
    display_name: Option<String>,
    first_name: Option<String>,
    middle_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    must_change_password: Option<bool>,
    disabled: Option<bool>,
    days_to_expiry: Option<u32>,
    mins_to_unlock: Option<u32>,
    default_warehouse: Option<AccountObjectIdentifier>,
    default_namespace: Option<String>,
    default_role: Option<AccountObjectIdentifier>,
    default_secondary_roles_all: Option<bool>,
    mins_to_bypass_mfa: Option<u32>,
    rsa_public_key: Option<String>,
    rsa_public_key_2: Option<String>,
    user_type: Option<UserType>,
    comment: Option<String>,
}

impl UserProperties {
    pub fn new() -> UserProperties {
        UserProperties::default()
    }

    fn render_into(&self, sql: &mut SqlBuilder) {
        sql.string_param("PASSWORD", self.password.as_deref())
            .string_param("LOGIN_NAME", self.login_name.as_deref())
            .string_param("DISPLAY_NAME", self.display_name.as_deref())
            .string_param("FIRST_NAME", self.first_name.as_deref())
            .string_param("MIDDLE_NAME", self.middle_name.as_deref())
            .string_param("LAST_NAME", self.last_name.as_deref())
            .string_param("EMAIL", self.email.as_deref())
            .bool_param("MUST_CHANGE_PASSWORD", self.must_change_password)
            .bool_param("DISABLED", self.disabled)
            .opt_param("DAYS_TO_EXPIRY", self.days_to_expiry)
            .opt_param("MINS_TO_UNLOCK", self.mins_to_unlock)
            .identifier_param("DEFAULT_WAREHOUSE", self.default_warehouse.as_ref())
            .string_param("DEFAULT_NAMESPACE", self.default_namespace.as_deref())
            .identifier_param("DEFAULT_ROLE", self.default_role.as_ref())
            .opt_param(
                "DEFAULT_SECONDARY_ROLES",
                self.default_secondary_roles_all
                    .map(|all| if all { "('ALL')" } else { "()" }),
            )
            .opt_param("MINS_TO_BYPASS_MFA", self.mins_to_bypass_mfa)
            .string_param("RSA_PUBLIC_KEY", self.rsa_public_key.as_deref())
            .string_param("RSA_PUBLIC_KEY_2", self.rsa_public_key_2.as_deref())
            .opt_param("TYPE", self.user_type.map(|t| t.as_str()))
            .comment(self.comment.as_deref());
    }
}

string_setters!(UserProperties {
    password,
    login_name,
    display_name,
    first_name,
    middle_name,
    last_name,
    email,
    default_namespace,
    rsa_public_key,
    rsa_public_key_2,
    comment,
});
setters!(UserProperties {
    must_change_password: bool,
    disabled: bool,
    days_to_expiry: u32,
    mins_to_unlock: u32,
    default_warehouse: AccountObjectIdentifier,
    default_role: AccountObjectIdentifier,
    default_secondary_roles_all: bool,
    mins_to_bypass_mfa: u32,
    user_type: UserType,
});

#[derive(Clone, Debug, PartialEq)]
pub struct CreateUser {
    id: AccountObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    properties: UserProperties,
    tags: Vec<TagAssociation>,
}

impl CreateUser {
    pub fn new(id: AccountObjectIdentifier) -> CreateUser {
        CreateUser {
            id,
            or_replace: false,
            if_not_exists: false,
            properties: UserProperties::default(),
            tags: vec![],
        }
    }

    pub fn properties(mut self, properties: UserProperties) -> Self {
        self.properties = properties;
        self
    }
}

flags!(CreateUser { or_replace, if_not_exists });
list_setters!(CreateUser { tags: TagAssociation });

impl Render for CreateUser {
    fn render(&self) -> SnowflakeResult<String> {
        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword("USER")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id);
        self.properties.render_into(&mut sql);
        sql.tags("WITH TAG", &self.tags);
        Ok(sql.finish())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserUnset {
    password: bool,
    login_name: bool,
    display_name: bool,
    first_name: bool,
    middle_name: bool,
    last_name: bool,
    email: bool,
    must_change_password: bool,
    disabled: bool,
    days_to_expiry: bool,
    mins_to_unlock: bool,
    default_warehouse: bool,
    default_namespace: bool,
    default_role: bool,
    default_secondary_roles: bool,
    mins_to_bypass_mfa: bool,
    rsa_public_key: bool,
    rsa_public_key_2: bool,
    comment: bool,
}

impl UserUnset {
    pub fn new() -> UserUnset {
        UserUnset::default()
    }
}

flags!(UserUnset {
    password,
    login_name,
    display_name,
    first_name,
    middle_name,
    last_name,
    email,
    must_change_password,
    disabled,
    days_to_expiry,
    mins_to_unlock,
    default_warehouse,
    default_namespace,
    default_role,
    default_secondary_roles,
    mins_to_bypass_mfa,
    rsa_public_key,
    rsa_public_key_2,
    comment,
});

#[derive(Clone, Debug, PartialEq)]
pub struct AlterUser {
    id: AccountObjectIdentifier,
    if_exists: bool,
    rename_to: Option<AccountObjectIdentifier>,
    reset_password: bool,
    abort_all_queries: bool,
    set: Option<UserProperties>,
    unset: Option<UserUnset>,
    set_tags: Vec<TagAssociation>,
    unset_tags: Vec<SchemaObjectIdentifier>,
}

impl AlterUser {
    pub fn new(id: AccountObjectIdentifier) -> AlterUser {
        AlterUser {
            id,
            if_exists: false,
            rename_to: None,
            reset_password: false,
            abort_all_queries: false,
            set: None,
            unset: None,
            set_tags: vec![],
            unset_tags: vec![],
        }
    }
}

flags!(AlterUser { if_exists, reset_password, abort_all_queries });
setters!(AlterUser {
    rename_to: AccountObjectIdentifier,
    set: UserProperties,
    unset: UserUnset,
});
list_setters!(AlterUser { set_tags: TagAssociation, unset_tags: SchemaObjectIdentifier });

impl Render for AlterUser {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.rename_to.is_some(),
            self.reset_password,
            self.abort_all_queries,
            self.set.is_some(),
            self.unset.is_some(),
            !self.set_tags.is_empty(),
            !self.unset_tags.is_empty(),
        ])?;
        let mut sql = SqlBuilder::new("ALTER USER");
        sql.keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_identifier("RENAME TO", self.rename_to.as_ref())
            .keyword_if(self.reset_password, "RESET PASSWORD")
            .keyword_if(self.abort_all_queries, "ABORT ALL QUERIES")
            .set_tags(&self.set_tags)
            .unset_tags(&self.unset_tags);
        if let Some(set) = &self.set {
            if set == &UserProperties::default() {
                return Err(SnowflakeError::InvalidRequest(
                    "ALTER USER SET: at least one property must be set".into(),
                ));
            }
            sql.keyword("SET");
            set.render_into(&mut sql);
        }
        if let Some(unset) = &self.unset {
            sql.checked_unset(
                "ALTER USER UNSET",
                &[
                    ("PASSWORD", unset.password),
                    ("LOGIN_NAME", unset.login_name),
                    ("DISPLAY_NAME", unset.display_name),
                    ("FIRST_NAME", unset.first_name),
                    ("MIDDLE_NAME", unset.middle_name),
                    ("LAST_NAME", unset.last_name),
                    ("EMAIL", unset.email),
                    ("MUST_CHANGE_PASSWORD", unset.must_change_password),
                    ("DISABLED", unset.disabled),
                    ("DAYS_TO_EXPIRY", unset.days_to_expiry),
                    ("MINS_TO_UNLOCK", unset.mins_to_unlock),
                    ("DEFAULT_WAREHOUSE", unset.default_warehouse),
                    ("DEFAULT_NAMESPACE", unset.default_namespace),
                    ("DEFAULT_ROLE", unset.default_role),
                    ("DEFAULT_SECONDARY_ROLES", unset.default_secondary_roles),
                    ("MINS_TO_BYPASS_MFA", unset.mins_to_bypass_mfa),
                    ("RSA_PUBLIC_KEY", unset.rsa_public_key),
                    ("RSA_PUBLIC_KEY_2", unset.rsa_public_key_2),
                    ("COMMENT", unset.comment),
                ],
            )?;
        }
        Ok(sql.finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Users<'a> {
    client: &'a Client,
}

impl Client {
    pub fn users(&self) -> Users<'_> {
        Users { client: self }
    }
}

impl Users<'_> {
    pub async fn create(&self, request: &CreateUser) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterUser) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &AccountObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("USER", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<User>> {
        self.client.show("USERS", options).await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<User> {
        self.client.show_by_id("USERS", id).await
    }

    pub async fn describe(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Properties> {
        self.client.describe_properties("USER", id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;

    #[test]
    fn create_service_user() -> SnowflakeResult<()> {
        let sql = CreateUser::new(AccountObjectIdentifier::new("etl_bot")?)
            .properties(
                UserProperties::new()
                    .user_type(UserType::Service)
                    .default_role(AccountObjectIdentifier::new("LOADER")?)
                    .default_secondary_roles_all(true)
                    .rsa_public_key("MIIB"),
            )
            .render()?;
        assert_eq!(
            sql,
            "CREATE USER \"etl_bot\" DEFAULT_ROLE = LOADER DEFAULT_SECONDARY_ROLES = ('ALL') \
             RSA_PUBLIC_KEY = 'MIIB' TYPE = SERVICE"
        );
        Ok(())
    }

    #[test]
    fn alter_user_actions() -> SnowflakeResult<()> {
        let id = AccountObjectIdentifier::new("JDOE")?;
        assert_eq!(
            AlterUser::new(id.clone()).reset_password().render()?,
            "ALTER USER JDOE RESET PASSWORD"
        );
        assert_eq!(
            AlterUser::new(id.clone())
                .unset(UserUnset::new().email().default_role())
                .render()?,
            "ALTER USER JDOE UNSET EMAIL, DEFAULT_ROLE"
        );
        assert!(AlterUser::new(id).set(UserProperties::new()).render().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn describe_reads_value_columns() -> SnowflakeResult<()> {
        let driver = FakeDriver::new().with_rows(
            "DESCRIBE USER JDOE",
            vec![
                Row::new().with("property", "EMAIL").with("value", "j@x.io").with_null("default"),
                Row::new().with("property", "DISABLED").with("value", "false").with("default", "false"),
            ],
        );
        let client = Client::new(driver);
        let properties = client.users().describe(&AccountObjectIdentifier::new("JDOE")?).await?;
        assert_eq!(properties.value("email"), Some("j@x.io"));
        assert_eq!(properties.get("DISABLED").and_then(|p| p.default.as_deref()), Some("false"));
        Ok(())
    }
}
