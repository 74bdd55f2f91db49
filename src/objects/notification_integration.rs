use crate::client::Client;
use crate::errors::SnowflakeResult;
use crate::identifiers::AccountObjectIdentifier;
use crate::objects::common::{DropOptions, Integration, Properties, ShowOptions};
use crate::sql::{at_least_one, at_most_one, exactly_one_action, Render, SqlBuilder};

/// Where notifications come from or go to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationTarget {
    /// Inbound auto-ingest events from a Google Pub/Sub subscription
    GcpPubsubAutoIngest { subscription_name: String },
    /// Inbound auto-ingest events from an Azure storage queue
    AzureStorageQueue {
        primary_uri: String,
        azure_tenant_id: String,
    },
    /// Outbound push to an Amazon SNS topic
    AwsSnsOutbound { topic_arn: String, role_arn: String },
    /// Outbound push to a Google Pub/Sub topic
    GcpPubsubOutbound { topic_name: String },
    /// Outbound push to an Azure Event Grid topic
    AzureEventGridOutbound {
        topic_endpoint: String,
        azure_tenant_id: String,
    },
    /// `TYPE = EMAIL` with the recipients it may send to
    Email { allowed_recipients: Vec<String> },
}

impl NotificationTarget {
    fn render_into(&self, sql: &mut SqlBuilder) {
        match self {
            NotificationTarget::GcpPubsubAutoIngest { subscription_name } => {
                sql.keyword("TYPE = QUEUE NOTIFICATION_PROVIDER = GCP_PUBSUB")
                    .string_param("GCP_PUBSUB_SUBSCRIPTION_NAME", Some(subscription_name.as_str()));
            }
            NotificationTarget::AzureStorageQueue {
                primary_uri,
                azure_tenant_id,
            } => {
                sql.keyword("TYPE = QUEUE NOTIFICATION_PROVIDER = AZURE_STORAGE_QUEUE")
                    .string_param("AZURE_STORAGE_QUEUE_PRIMARY_URI", Some(primary_uri.as_str()))
                    .string_param("AZURE_TENANT_ID", Some(azure_tenant_id.as_str()));
            }
            NotificationTarget::AwsSnsOutbound {
                topic_arn,
                role_arn,
            } => {
                sql.keyword("DIRECTION = OUTBOUND TYPE = QUEUE NOTIFICATION_PROVIDER = AWS_SNS")
                    .string_param("AWS_SNS_TOPIC_ARN", Some(topic_arn.as_str()))
                    .string_param("AWS_SNS_ROLE_ARN", Some(role_arn.as_str()));
            }
            NotificationTarget::GcpPubsubOutbound { topic_name } => {
                sql.keyword("DIRECTION = OUTBOUND TYPE = QUEUE NOTIFICATION_PROVIDER = GCP_PUBSUB")
                    .string_param("GCP_PUBSUB_TOPIC_NAME", Some(topic_name.as_str()));
            }
            NotificationTarget::AzureEventGridOutbound {
                topic_endpoint,
                azure_tenant_id,
            } => {
                sql.keyword(
                    "DIRECTION = OUTBOUND TYPE = QUEUE NOTIFICATION_PROVIDER = AZURE_EVENT_GRID",
                )
                .string_param("AZURE_EVENT_GRID_TOPIC_ENDPOINT", Some(topic_endpoint.as_str()))
                .string_param("AZURE_TENANT_ID", Some(azure_tenant_id.as_str()));
            }
            NotificationTarget::Email { allowed_recipients } => {
                sql.keyword("TYPE = EMAIL")
                    .string_list_param("ALLOWED_RECIPIENTS", Some(allowed_recipients.as_slice()));
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateNotificationIntegration {
    id: AccountObjectIdentifier,
    enabled: bool,
    target: NotificationTarget,
    or_replace: bool,
    if_not_exists: bool,
    comment: Option<String>,
}

impl CreateNotificationIntegration {
    pub fn new(
        id: AccountObjectIdentifier,
        enabled: bool,
        target: NotificationTarget,
    ) -> CreateNotificationIntegration {
        CreateNotificationIntegration {
            id,
            enabled,
            target,
            or_replace: false,
            if_not_exists: false,
            comment: None,
        }
    }
}

flags!(CreateNotificationIntegration { or_replace, if_not_exists });
string_setters!(CreateNotificationIntegration { comment });

impl Render for CreateNotificationIntegration {
    fn render(&self) -> SnowflakeResult<String> {
        at_most_one(
            "CREATE NOTIFICATION INTEGRATION",
            &[("OR REPLACE", self.or_replace), ("IF NOT EXISTS", self.if_not_exists)],
        )?;
        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword("NOTIFICATION INTEGRATION")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id)
            .bool_param("ENABLED", Some(self.enabled));
        self.target.render_into(&mut sql);
        sql.comment(self.comment.as_deref());
        Ok(sql.finish())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotificationIntegrationSet {
    enabled: Option<bool>,
    allowed_recipients: Option<Vec<String>>,
    gcp_pubsub_subscription_name: Option<String>,
    aws_sns_topic_arn: Option<String>,
    aws_sns_role_arn: Option<String>,
    comment: Option<String>,
}

impl NotificationIntegrationSet {
    pub fn new() -> NotificationIntegrationSet {
        NotificationIntegrationSet::default()
    }
}

setters!(NotificationIntegrationSet {
    enabled: bool,
    allowed_recipients: Vec<String>,
});
string_setters!(NotificationIntegrationSet {
    gcp_pubsub_subscription_name,
    aws_sns_topic_arn,
    aws_sns_role_arn,
    comment,
});

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotificationIntegrationUnset {
    enabled: bool,
    allowed_recipients: bool,
    comment: bool,
}

impl NotificationIntegrationUnset {
    pub fn new() -> NotificationIntegrationUnset {
        NotificationIntegrationUnset::default()
    }
}

flags!(NotificationIntegrationUnset { enabled, allowed_recipients, comment });

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlterNotificationIntegration {
    id: AccountObjectIdentifier,
    if_exists: bool,
    set: Option<NotificationIntegrationSet>,
    unset: Option<NotificationIntegrationUnset>,
}

impl AlterNotificationIntegration {
    pub fn new(id: AccountObjectIdentifier) -> AlterNotificationIntegration {
        AlterNotificationIntegration {
            id,
            if_exists: false,
            set: None,
            unset: None,
        }
    }
}

flags!(AlterNotificationIntegration { if_exists });
setters!(AlterNotificationIntegration {
    set: NotificationIntegrationSet,
    unset: NotificationIntegrationUnset,
});

impl Render for AlterNotificationIntegration {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[self.set.is_some(), self.unset.is_some()])?;
        let mut sql = SqlBuilder::new("ALTER NOTIFICATION INTEGRATION");
        sql.keyword_if(self.if_exists, "IF EXISTS").identifier(&self.id);
        if let Some(set) = &self.set {
            at_least_one(
                "ALTER NOTIFICATION INTEGRATION SET",
                &[
                    set.enabled.is_some(),
                    set.allowed_recipients.is_some(),
                    set.gcp_pubsub_subscription_name.is_some(),
                    set.aws_sns_topic_arn.is_some(),
                    set.aws_sns_role_arn.is_some(),
                    set.comment.is_some(),
                ],
            )?;
            sql.keyword("SET")
                .bool_param("ENABLED", set.enabled)
                .string_list_param("ALLOWED_RECIPIENTS", set.allowed_recipients.as_deref())
                .string_param(
                    "GCP_PUBSUB_SUBSCRIPTION_NAME",
                    set.gcp_pubsub_subscription_name.as_deref(),
                )
                .string_param("AWS_SNS_TOPIC_ARN", set.aws_sns_topic_arn.as_deref())
                .string_param("AWS_SNS_ROLE_ARN", set.aws_sns_role_arn.as_deref())
                .comment(set.comment.as_deref());
        }
        if let Some(unset) = &self.unset {
            sql.checked_unset(
                "ALTER NOTIFICATION INTEGRATION UNSET",
                &[
                    ("ENABLED", unset.enabled),
                    ("ALLOWED_RECIPIENTS", unset.allowed_recipients),
                    ("COMMENT", unset.comment),
                ],
            )?;
        }
        Ok(sql.finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct NotificationIntegrations<'a> {
    client: &'a Client,
}

impl Client {
    pub fn notification_integrations(&self) -> NotificationIntegrations<'_> {
        NotificationIntegrations { client: self }
    }
}

impl NotificationIntegrations<'_> {
    pub async fn create(&self, request: &CreateNotificationIntegration) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterNotificationIntegration) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &AccountObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("NOTIFICATION INTEGRATION", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<Integration>> {
        self.client.show("NOTIFICATION INTEGRATIONS", options).await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Integration> {
        self.client.show_by_id("NOTIFICATION INTEGRATIONS", id).await
    }

    pub async fn describe(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Properties> {
        self.client.describe_properties("NOTIFICATION INTEGRATION", id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_targets() -> SnowflakeResult<()> {
        let id = AccountObjectIdentifier::new("NI")?;
        assert_eq!(
            CreateNotificationIntegration::new(
                id.clone(),
                true,
                NotificationTarget::Email {
                    allowed_recipients: vec!["ops@example.com".into()]
                },
            )
            .comment("alerts")
            .render()?,
            "CREATE NOTIFICATION INTEGRATION NI ENABLED = true TYPE = EMAIL \
             ALLOWED_RECIPIENTS = ('ops@example.com') COMMENT = 'alerts'"
        );
        assert_eq!(
            CreateNotificationIntegration::new(
                id.clone(),
                false,
                NotificationTarget::AwsSnsOutbound {
                    topic_arn: "arn:aws:sns:t".into(),
                    role_arn: "arn:aws:iam::1:role/r".into(),
                },
            )
            .render()?,
            "CREATE NOTIFICATION INTEGRATION NI ENABLED = false DIRECTION = OUTBOUND TYPE = QUEUE \
             NOTIFICATION_PROVIDER = AWS_SNS AWS_SNS_TOPIC_ARN = 'arn:aws:sns:t' \
             AWS_SNS_ROLE_ARN = 'arn:aws:iam::1:role/r'"
        );
        assert_eq!(
            AlterNotificationIntegration::new(id)
                .unset(NotificationIntegrationUnset::new().comment())
                .render()?,
            "ALTER NOTIFICATION INTEGRATION NI UNSET COMMENT"
        );
        Ok(())
    }
}
