use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{AccountObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{DropOptions, ShowOptions};
use crate::row::{FromRow, Row};
use crate::sql::{at_least_one, at_most_one, exactly_one_action, Render, SqlBuilder};

#[derive(Clone, Debug, PartialEq)]
pub struct Secret {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub secret_type: Option<String>,
    pub oauth_scopes: Vec<String>,
    pub owner_role_type: Option<String>,
}

impl FromRow for Secret {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(Secret {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            secret_type: row.opt_string("secret_type"),
            oauth_scopes: row.list("oauth_scopes"),
            owner_role_type: row.opt_string("owner_role_type"),
        })
    }
}

impl Identifiable for Secret {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::from_trusted(&self.database_name, &self.schema_name, &self.name)
    }
}

/// The single row of `DESCRIBE SECRET`. Secret values are never returned.
#[derive(Clone, Debug, PartialEq)]
pub struct SecretDetails {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub secret_type: Option<String>,
    pub username: Option<String>,
    pub oauth_access_token_expiry_time: Option<DateTime<Utc>>,
    pub oauth_refresh_token_expiry_time: Option<DateTime<Utc>>,
    pub oauth_scopes: Vec<String>,
    pub integration_name: Option<String>,
}

impl FromRow for SecretDetails {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(SecretDetails {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            secret_type: row.opt_string("secret_type"),
            username: row.opt_string("username"),
            oauth_access_token_expiry_time: row.opt_timestamp("oauth_access_token_expiry_time"),
            oauth_refresh_token_expiry_time: row.opt_timestamp("oauth_refresh_token_expiry_time"),
            oauth_scopes: row.list("oauth_scopes"),
            integration_name: row.opt_string("integration_name"),
        })
    }
}

/// What a secret holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SecretKind {
    /// `TYPE = OAUTH2` using the client credentials flow. An explicitly empty
    /// scope list renders as `OAUTH_SCOPES = ()` and describes as no scopes.
    OAuthClientCredentials {
        api_authentication: AccountObjectIdentifier,
        oauth_scopes: Option<Vec<String>>,
    },
    /// `TYPE = OAUTH2` using the authorization code flow
    OAuthAuthorizationCode {
        api_authentication: AccountObjectIdentifier,
        oauth_refresh_token: String,
        oauth_refresh_token_expiry_time: String,
    },
    Password {
        username: String,
        password: String,
    },
    GenericString {
        secret_string: String,
    },
}

impl SecretKind {
    fn render_into(&self, sql: &mut SqlBuilder) {
        match self {
            SecretKind::OAuthClientCredentials {
                api_authentication,
                oauth_scopes,
            } => {
                sql.keyword("TYPE = OAUTH2")
                    .identifier_param("API_AUTHENTICATION", Some(api_authentication))
                    .string_list_param("OAUTH_SCOPES", oauth_scopes.as_deref());
            }
            SecretKind::OAuthAuthorizationCode {
                api_authentication,
                oauth_refresh_token,
                oauth_refresh_token_expiry_time,
            } => {
                sql.keyword("TYPE = OAUTH2")
                    .string_param("OAUTH_REFRESH_TOKEN", Some(oauth_refresh_token.as_str()))
                    .string_param(
                        "OAUTH_REFRESH_TOKEN_EXPIRY_TIME",
                        Some(oauth_refresh_token_expiry_time.as_str()),
                    )
                    .identifier_param("API_AUTHENTICATION", Some(api_authentication));
            }
            SecretKind::Password { username, password } => {
                sql.keyword("TYPE = PASSWORD")
                    .string_param("USERNAME", Some(username.as_str()))
                    .string_param("PASSWORD", Some(password.as_str()));
            }
            SecretKind::GenericString { secret_string } => {
                sql.keyword("TYPE = GENERIC_STRING")
                    .string_param("SECRET_STRING", Some(secret_string.as_str()));
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateSecret {
    id: SchemaObjectIdentifier,
    kind: SecretKind,
    or_replace: bool,
    if_not_exists: bool,
    comment: Option<String>,
}

impl CreateSecret {
    pub fn new(id: SchemaObjectIdentifier, kind: SecretKind) -> CreateSecret {
        CreateSecret {
            id,
            kind,
            or_replace: false,
            if_not_exists: false,
            comment: None,
        }
    }
}

flags!(CreateSecret { or_replace, if_not_exists });
string_setters!(CreateSecret { comment });

impl Render for CreateSecret {
    fn render(&self) -> SnowflakeResult<String> {
        at_most_one(
            "CREATE SECRET",
            &[("OR REPLACE", self.or_replace), ("IF NOT EXISTS", self.if_not_exists)],
        )?;
        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword("SECRET")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id);
        self.kind.render_into(&mut sql);
        sql.comment(self.comment.as_deref());
        Ok(sql.finish())
    }
}

/// Values that can be changed on an existing secret; which ones apply depends on its type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecretSet {
    comment: Option<String>,
    oauth_scopes: Option<Vec<String>>,
    oauth_refresh_token: Option<String>,
    oauth_refresh_token_expiry_time: Option<String>,
    username: Option<String>,
    password: Option<String>,
    secret_string: Option<String>,
}

impl SecretSet {
    pub fn new() -> SecretSet {
        SecretSet::default()
    }
}

setters!(SecretSet { oauth_scopes: Vec<String> });
string_setters!(SecretSet {
    comment,
    oauth_refresh_token,
    oauth_refresh_token_expiry_time,
    username,
    password,
    secret_string,
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlterSecret {
    id: SchemaObjectIdentifier,
    if_exists: bool,
    set: Option<SecretSet>,
    unset_comment: bool,
}

impl AlterSecret {
    pub fn new(id: SchemaObjectIdentifier) -> AlterSecret {
        AlterSecret {
            id,
            if_exists: false,
            set: None,
            unset_comment: false,
        }
    }
}

flags!(AlterSecret { if_exists, unset_comment });
setters!(AlterSecret { set: SecretSet });

impl Render for AlterSecret {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[self.set.is_some(), self.unset_comment])?;
        let mut sql = SqlBuilder::new("ALTER SECRET");
        sql.keyword_if(self.if_exists, "IF EXISTS").identifier(&self.id);
        if let Some(set) = &self.set {
            at_least_one(
                "ALTER SECRET SET",
                &[
                    set.comment.is_some(),
                    set.oauth_scopes.is_some(),
                    set.oauth_refresh_token.is_some(),
                    set.oauth_refresh_token_expiry_time.is_some(),
                    set.username.is_some(),
                    set.password.is_some(),
                    set.secret_string.is_some(),
                ],
            )?;
            sql.keyword("SET")
                .string_list_param("OAUTH_SCOPES", set.oauth_scopes.as_deref())
                .string_param("OAUTH_REFRESH_TOKEN", set.oauth_refresh_token.as_deref())
                .string_param(
                    "OAUTH_REFRESH_TOKEN_EXPIRY_TIME",
                    set.oauth_refresh_token_expiry_time.as_deref(),
                )
                .string_param("USERNAME", set.username.as_deref())
                .string_param("PASSWORD", set.password.as_deref())
                .string_param("SECRET_STRING", set.secret_string.as_deref())
                .comment(set.comment.as_deref());
        }
        sql.keyword_if(self.unset_comment, "UNSET COMMENT");
        Ok(sql.finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Secrets<'a> {
    client: &'a Client,
}

impl Client {
    pub fn secrets(&self) -> Secrets<'_> {
        Secrets { client: self }
    }
}

impl Secrets<'_> {
    pub async fn create(&self, request: &CreateSecret) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterSecret) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &SchemaObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("SECRET", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<Secret>> {
        self.client.show("SECRETS", options).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Secret> {
        self.client.show_by_id("SECRETS", id).await
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<SecretDetails> {
        let rows = self.client.describe_rows("SECRET", id).await?;
        let row = rows.first().ok_or(SnowflakeError::EmptyResult)?;
        SecretDetails::from_row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;

    fn id() -> SnowflakeResult<SchemaObjectIdentifier> {
        SchemaObjectIdentifier::new("DB", "SC", "S")
    }

    #[test]
    fn four_flavours() -> SnowflakeResult<()> {
        let integration = AccountObjectIdentifier::new("API_INT")?;
        let cases = [
            (
                SecretKind::OAuthClientCredentials {
                    api_authentication: integration.clone(),
                    oauth_scopes: Some(vec!["read".into(), "write".into()]),
                },
                "TYPE = OAUTH2 API_AUTHENTICATION = API_INT OAUTH_SCOPES = ('read', 'write')",
            ),
            (
                SecretKind::OAuthAuthorizationCode {
                    api_authentication: integration,
                    oauth_refresh_token: "tok".into(),
                    oauth_refresh_token_expiry_time: "2030-01-01".into(),
                },
                "TYPE = OAUTH2 OAUTH_REFRESH_TOKEN = 'tok' \
                 OAUTH_REFRESH_TOKEN_EXPIRY_TIME = '2030-01-01' API_AUTHENTICATION = API_INT",
            ),
            (
                SecretKind::Password {
                    username: "svc".into(),
                    password: "p'w".into(),
                },
                r"TYPE = PASSWORD USERNAME = 'svc' PASSWORD = 'p\'w'",
            ),
            (
                SecretKind::GenericString {
                    secret_string: "s3cr3t".into(),
                },
                "TYPE = GENERIC_STRING SECRET_STRING = 's3cr3t'",
            ),
        ];
        for (kind, expected) in cases {
            assert_eq!(
                CreateSecret::new(id()?, kind).render()?,
                format!("CREATE SECRET DB.SC.S {expected}")
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn empty_scopes_render_and_describe_as_empty() -> SnowflakeResult<()> {
        let request = CreateSecret::new(
            id()?,
            SecretKind::OAuthClientCredentials {
                api_authentication: AccountObjectIdentifier::new("API_INT")?,
                oauth_scopes: Some(vec![]),
            },
        );
        let sql = request.render()?;
        assert_eq!(
            sql,
            "CREATE SECRET DB.SC.S TYPE = OAUTH2 API_AUTHENTICATION = API_INT OAUTH_SCOPES = ()"
        );
        let driver = FakeDriver::new().with_exec(&sql).with_rows(
            "DESCRIBE SECRET DB.SC.S",
            vec![Row::new()
                .with("name", "S")
                .with("database_name", "DB")
                .with("schema_name", "SC")
                .with("secret_type", "OAUTH2")
                .with("oauth_scopes", "[]")
                .with("integration_name", "API_INT")],
        );
        let client = Client::new(driver);
        client.secrets().create(&request).await?;
        let details = client.secrets().describe(&id()?).await?;
        assert!(details.oauth_scopes.is_empty());
        assert_eq!(details.integration_name.as_deref(), Some("API_INT"));
        Ok(())
    }
}
