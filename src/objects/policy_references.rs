use crate::client::Client;
use crate::errors::SnowflakeResult;
use crate::identifiers::{AnyObjectIdentifier, SchemaObjectIdentifier};
use crate::row::{FromRow, Row};
use crate::sql::{quote_string, Render};

/// The kind of entity a policy is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PolicyEntityDomain {
    Account,
    Column,
    Integration,
    Table,
    Tag,
    User,
    View,
}

impl PolicyEntityDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyEntityDomain::Account => "ACCOUNT",
            PolicyEntityDomain::Column => "COLUMN",
            PolicyEntityDomain::Integration => "INTEGRATION",
            PolicyEntityDomain::Table => "TABLE",
            PolicyEntityDomain::Tag => "TAG",
            PolicyEntityDomain::User => "USER",
            PolicyEntityDomain::View => "VIEW",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyReference {
    pub policy_db: Option<String>,
    pub policy_schema: Option<String>,
    pub policy_name: String,
    pub policy_kind: String,
    pub ref_database_name: Option<String>,
    pub ref_schema_name: Option<String>,
    pub ref_entity_name: String,
    pub ref_entity_domain: String,
    pub ref_column_name: Option<String>,
    pub ref_arg_column_names: Vec<String>,
    pub tag_database: Option<String>,
    pub tag_schema: Option<String>,
    pub tag_name: Option<String>,
    pub policy_status: Option<String>,
}

impl PolicyReference {
    /// The referenced policy, when its database and schema are reported
    pub fn policy_id(&self) -> Option<SchemaObjectIdentifier> {
        match (&self.policy_db, &self.policy_schema) {
            (Some(db), Some(schema)) => Some(SchemaObjectIdentifier::from_trusted(
                db,
                schema,
                &self.policy_name,
            )),
            _ => None,
        }
    }
}

impl FromRow for PolicyReference {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(PolicyReference {
            policy_db: row.opt_string("policy_db"),
            policy_schema: row.opt_string("policy_schema"),
            policy_name: row.string("policy_name")?,
            policy_kind: row.string("policy_kind")?,
            ref_database_name: row.opt_string("ref_database_name"),
            ref_schema_name: row.opt_string("ref_schema_name"),
            ref_entity_name: row.string("ref_entity_name")?,
            ref_entity_domain: row.string("ref_entity_domain")?,
            ref_column_name: row.opt_string("ref_column_name"),
            ref_arg_column_names: row.list("ref_arg_column_names"),
            tag_database: row.opt_string("tag_database"),
            tag_schema: row.opt_string("tag_schema"),
            tag_name: row.opt_string("tag_name"),
            policy_status: row.opt_string("policy_status"),
        })
    }
}

struct PolicyReferencesQuery<'a> {
    entity: &'a AnyObjectIdentifier,
    domain: PolicyEntityDomain,
}

impl Render for PolicyReferencesQuery<'_> {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(format!(
            "SELECT * FROM TABLE(SNOWFLAKE.INFORMATION_SCHEMA.POLICY_REFERENCES(\
             REF_ENTITY_NAME => {}, REF_ENTITY_DOMAIN => {}))",
            quote_string(&self.entity.fully_qualified_name()),
            quote_string(self.domain.as_str()),
        ))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PolicyReferences<'a> {
    client: &'a Client,
}

impl Client {
    pub fn policy_references(&self) -> PolicyReferences<'_> {
        PolicyReferences { client: self }
    }
}

impl PolicyReferences<'_> {
    /// Every policy attached to `entity`
    pub async fn get_for_entity(
        &self,
        entity: impl Into<AnyObjectIdentifier>,
        domain: PolicyEntityDomain,
    ) -> SnowflakeResult<Vec<PolicyReference>> {
        let entity = entity.into();
        self.client
            .query(&PolicyReferencesQuery {
                entity: &entity,
                domain,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;

    #[tokio::test]
    async fn references_for_a_table() -> SnowflakeResult<()> {
        let driver = FakeDriver::new().with_rows(
            "SELECT * FROM TABLE(SNOWFLAKE.INFORMATION_SCHEMA.POLICY_REFERENCES(\
             REF_ENTITY_NAME => 'DB.SC.T', REF_ENTITY_DOMAIN => 'TABLE'))",
            vec![Row::new()
                .with("POLICY_DB", "DB")
                .with("POLICY_SCHEMA", "SC")
                .with("POLICY_NAME", "RAP")
                .with("POLICY_KIND", "ROW_ACCESS_POLICY")
                .with("REF_ENTITY_NAME", "T")
                .with("REF_ENTITY_DOMAIN", "TABLE")
                .with("REF_ARG_COLUMN_NAMES", "[ \"ID\" ]")
                .with("POLICY_STATUS", "ACTIVE")],
        );
        let references = Client::new(driver)
            .policy_references()
            .get_for_entity(
                SchemaObjectIdentifier::new("DB", "SC", "T")?,
                PolicyEntityDomain::Table,
            )
            .await?;
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].ref_arg_column_names, vec!["ID"]);
        assert_eq!(
            references[0].policy_id(),
            Some(SchemaObjectIdentifier::new("DB", "SC", "RAP")?)
        );
        Ok(())
    }
}
