use crate::client::Client;
use crate::errors::SnowflakeResult;
use crate::identifiers::{AccountObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{
    DropOptions, Integration, Properties, ShowOptions, TagAssociation,
};
use crate::sql::{at_least_one, at_most_one, exactly_one_action, Render, SqlBuilder};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum S3Protocol {
    S3,
    S3Gov,
    S3China,
}

impl S3Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            S3Protocol::S3 => "S3",
            S3Protocol::S3Gov => "S3GOV",
            S3Protocol::S3China => "S3CHINA",
        }
    }
}

/// Cloud-specific parameters of a storage integration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageProvider {
    S3 {
        protocol: S3Protocol,
        storage_aws_role_arn: String,
        storage_aws_object_acl: Option<String>,
        storage_aws_external_id: Option<String>,
    },
    Gcs,
    Azure {
        azure_tenant_id: String,
    },
}

impl StorageProvider {
    pub fn s3(storage_aws_role_arn: impl Into<String>) -> StorageProvider {
        StorageProvider::S3 {
            protocol: S3Protocol::S3,
            storage_aws_role_arn: storage_aws_role_arn.into(),
            storage_aws_object_acl: None,
            storage_aws_external_id: None,
        }
    }

    fn render_into(&self, sql: &mut SqlBuilder) {
        match self {
            StorageProvider::S3 {
                protocol,
                storage_aws_role_arn,
                storage_aws_object_acl,
                storage_aws_external_id,
            } => {
                sql.string_param("STORAGE_PROVIDER", Some(protocol.as_str()))
                    .string_param("STORAGE_AWS_ROLE_ARN", Some(storage_aws_role_arn.as_str()))
                    .string_param("STORAGE_AWS_EXTERNAL_ID", storage_aws_external_id.as_deref())
                    .string_param("STORAGE_AWS_OBJECT_ACL", storage_aws_object_acl.as_deref());
            }
            StorageProvider::Gcs => {
                sql.string_param("STORAGE_PROVIDER", Some("GCS"));
            }
            StorageProvider::Azure { azure_tenant_id } => {
                sql.string_param("STORAGE_PROVIDER", Some("AZURE"))
                    .string_param("AZURE_TENANT_ID", Some(azure_tenant_id.as_str()));
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateStorageIntegration {
    id: AccountObjectIdentifier,
    provider: StorageProvider,
    enabled: bool,
    storage_allowed_locations: Vec<String>,
    storage_blocked_locations: Vec<String>,
    or_replace: bool,
    if_not_exists: bool,
    comment: Option<String>,
}

impl CreateStorageIntegration {
    pub fn new(
        id: AccountObjectIdentifier,
        provider: StorageProvider,
        enabled: bool,
        storage_allowed_locations: Vec<String>,
    ) -> CreateStorageIntegration {
        CreateStorageIntegration {
            id,
            provider,
            enabled,
            storage_allowed_locations,
            storage_blocked_locations: vec![],
            or_replace: false,
            if_not_exists: false,
            comment: None,
        }
    }
}

flags!(CreateStorageIntegration { or_replace, if_not_exists });
string_setters!(CreateStorageIntegration { comment });
list_setters!(CreateStorageIntegration { storage_blocked_locations: String });

impl Render for CreateStorageIntegration {
    fn render(&self) -> SnowflakeResult<String> {
        at_most_one(
            "CREATE STORAGE INTEGRATION",
            &[("OR REPLACE", self.or_replace), ("IF NOT EXISTS", self.if_not_exists)],
        )?;
        at_least_one(
            "CREATE STORAGE INTEGRATION STORAGE_ALLOWED_LOCATIONS",
            &[!self.storage_allowed_locations.is_empty()],
        )?;
        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword("STORAGE INTEGRATION")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id)
            .keyword("TYPE = EXTERNAL_STAGE");
        self.provider.render_into(&mut sql);
        sql.bool_param("ENABLED", Some(self.enabled))
            .string_list_param(
                "STORAGE_ALLOWED_LOCATIONS",
                Some(self.storage_allowed_locations.as_slice()),
            )
            .string_list_param(
                "STORAGE_BLOCKED_LOCATIONS",
                (!self.storage_blocked_locations.is_empty())
                    .then_some(self.storage_blocked_locations.as_slice()),
            )
            .comment(self.comment.as_deref());
        Ok(sql.finish())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageIntegrationSet {
    enabled: Option<bool>,
    storage_aws_role_arn: Option<String>,
    storage_aws_object_acl: Option<String>,
    azure_tenant_id: Option<String>,
    storage_allowed_locations: Option<Vec<String>>,
    storage_blocked_locations: Option<Vec<String>>,
    comment: Option<String>,
}

impl StorageIntegrationSet {
    pub fn new() -> StorageIntegrationSet {
        StorageIntegrationSet::default()
    }
}

setters!(StorageIntegrationSet {
    enabled: bool,
    storage_allowed_locations: Vec<String>,
    storage_blocked_locations: Vec<String>,
});
string_setters!(StorageIntegrationSet {
    storage_aws_role_arn,
    storage_aws_object_acl,
    azure_tenant_id,
    comment,
});

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageIntegrationUnset {
    enabled: bool,
    storage_aws_object_acl: bool,
    storage_blocked_locations: bool,
    comment: bool,
}

impl StorageIntegrationUnset {
    pub fn new() -> StorageIntegrationUnset {
        StorageIntegrationUnset::default()
    }
}

flags!(StorageIntegrationUnset {
    enabled,
    storage_aws_object_acl,
    storage_blocked_locations,
    comment,
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlterStorageIntegration {
    id: AccountObjectIdentifier,
    if_exists: bool,
    set: Option<StorageIntegrationSet>,
    unset: Option<StorageIntegrationUnset>,
    set_tags: Vec<TagAssociation>,
    unset_tags: Vec<SchemaObjectIdentifier>,
}

impl AlterStorageIntegration {
    pub fn new(id: AccountObjectIdentifier) -> AlterStorageIntegration {
        AlterStorageIntegration {
            id,
            if_exists: false,
            set: None,
            unset: None,
            set_tags: vec![],
            unset_tags: vec![],
        }
    }
}

flags!(AlterStorageIntegration { if_exists });
setters!(AlterStorageIntegration {
    set: StorageIntegrationSet,
    unset: StorageIntegrationUnset,
});
list_setters!(AlterStorageIntegration {
    set_tags: TagAssociation,
    unset_tags: SchemaObjectIdentifier,
});

impl Render for AlterStorageIntegration {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.set.is_some(),
            self.unset.is_some(),
            !self.set_tags.is_empty(),
            !self.unset_tags.is_empty(),
        ])?;
        let mut sql = SqlBuilder::new("ALTER STORAGE INTEGRATION");
        sql.keyword_if(self.if_exists, "IF EXISTS").identifier(&self.id);
        if let Some(set) = &self.set {
            at_least_one(
                "ALTER STORAGE INTEGRATION SET",
                &[
                    set.enabled.is_some(),
                    set.storage_aws_role_arn.is_some(),
                    set.storage_aws_object_acl.is_some(),
                    set.azure_tenant_id.is_some(),
                    set.storage_allowed_locations.is_some(),
                    set.storage_blocked_locations.is_some(),
                    set.comment.is_some(),
                ],
            )?;
            sql.keyword("SET")
                .string_param("STORAGE_AWS_ROLE_ARN", set.storage_aws_role_arn.as_deref())
                .string_param("STORAGE_AWS_OBJECT_ACL", set.storage_aws_object_acl.as_deref())
                .string_param("AZURE_TENANT_ID", set.azure_tenant_id.as_deref())
                .bool_param("ENABLED", set.enabled)
                .string_list_param(
                    "STORAGE_ALLOWED_LOCATIONS",
                    set.storage_allowed_locations.as_deref(),
                )
                .string_list_param(
                    "STORAGE_BLOCKED_LOCATIONS",
                    set.storage_blocked_locations.as_deref(),
                )
                .comment(set.comment.as_deref());
        }
        if let Some(unset) = &self.unset {
            sql.checked_unset(
                "ALTER STORAGE INTEGRATION UNSET",
                &[
                    ("STORAGE_AWS_OBJECT_ACL", unset.storage_aws_object_acl),
                    ("ENABLED", unset.enabled),
                    ("STORAGE_BLOCKED_LOCATIONS", unset.storage_blocked_locations),
                    ("COMMENT", unset.comment),
                ],
            )?;
        }
        sql.set_tags(&self.set_tags).unset_tags(&self.unset_tags);
        Ok(sql.finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StorageIntegrations<'a> {
    client: &'a Client,
}

impl Client {
    pub fn storage_integrations(&self) -> StorageIntegrations<'_> {
        StorageIntegrations { client: self }
    }
}

impl StorageIntegrations<'_> {
    pub async fn create(&self, request: &CreateStorageIntegration) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterStorageIntegration) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &AccountObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("STORAGE INTEGRATION", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<Integration>> {
        self.client.show("STORAGE INTEGRATIONS", options).await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Integration> {
        self.client.show_by_id("STORAGE INTEGRATIONS", id).await
    }

    pub async fn describe(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Properties> {
        self.client.describe_properties("STORAGE INTEGRATION", id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Row;
    use crate::testing::FakeDriver;

    fn id() -> SnowflakeResult<AccountObjectIdentifier> {
        AccountObjectIdentifier::new("STORAGE_INT")
    }

    #[test]
    fn providers() -> SnowflakeResult<()> {
        let locations = vec!["s3://bucket/a/".to_owned()];
        assert_eq!(
            CreateStorageIntegration::new(
                id()?,
                StorageProvider::s3("arn:aws:iam::1:role/r"),
                true,
                locations,
            )
            .storage_blocked_locations(vec!["s3://bucket/a/private/".into()])
            .render()?,
            "CREATE STORAGE INTEGRATION STORAGE_INT TYPE = EXTERNAL_STAGE STORAGE_PROVIDER = 'S3' \
             STORAGE_AWS_ROLE_ARN = 'arn:aws:iam::1:role/r' ENABLED = true \
             STORAGE_ALLOWED_LOCATIONS = ('s3://bucket/a/') \
             STORAGE_BLOCKED_LOCATIONS = ('s3://bucket/a/private/')"
        );
        assert_eq!(
            CreateStorageIntegration::new(
                id()?,
                StorageProvider::Azure {
                    azure_tenant_id: "tenant".into()
                },
                false,
                vec!["azure://acct.blob.core.windows.net/c/".into()],
            )
            .render()?,
            "CREATE STORAGE INTEGRATION STORAGE_INT TYPE = EXTERNAL_STAGE STORAGE_PROVIDER = 'AZURE' \
             AZURE_TENANT_ID = 'tenant' ENABLED = false \
             STORAGE_ALLOWED_LOCATIONS = ('azure://acct.blob.core.windows.net/c/')"
        );
        assert!(CreateStorageIntegration::new(id()?, StorageProvider::Gcs, true, vec![])
            .render()
            .is_err());
        Ok(())
    }

    #[tokio::test]
    async fn describe_reads_property_rows() -> SnowflakeResult<()> {
        let driver = FakeDriver::new().with_rows(
            "DESCRIBE STORAGE INTEGRATION STORAGE_INT",
            vec![
                Row::new()
                    .with("property", "ENABLED")
                    .with("property_type", "Boolean")
                    .with("property_value", "true")
                    .with("property_default", "false"),
                Row::new()
                    .with("property", "STORAGE_PROVIDER")
                    .with("property_type", "String")
                    .with("property_value", "S3"),
            ],
        );
        let properties = Client::new(driver).storage_integrations().describe(&id()?).await?;
        assert_eq!(properties.value("enabled"), Some("true"));
        assert_eq!(properties.value("STORAGE_PROVIDER"), Some("S3"));
        Ok(())
    }
}
