use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::SnowflakeResult;
use crate::identifiers::{AccountObjectIdentifier, ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{DropOptions, ShowOptions};
use crate::row::{FromRow, Row};
use crate::sql::{at_least_one, at_most_one, exactly_one_action, Render, SqlBuilder};

/// A row of `SHOW NETWORK POLICIES`. Only list sizes are reported; use
/// [`NetworkPolicies::describe`] for the entries themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkPolicy {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub comment: Option<String>,
    pub entries_in_allowed_ip_list: i64,
    pub entries_in_blocked_ip_list: i64,
    pub entries_in_allowed_network_rules: i64,
    pub entries_in_blocked_network_rules: i64,
}

impl FromRow for NetworkPolicy {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(NetworkPolicy {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            comment: row.opt_string("comment"),
            entries_in_allowed_ip_list: row.opt_int("entries_in_allowed_ip_list").unwrap_or(0),
            entries_in_blocked_ip_list: row.opt_int("entries_in_blocked_ip_list").unwrap_or(0),
            entries_in_allowed_network_rules: row
                .opt_int("entries_in_allowed_network_rules")
                .unwrap_or(0),
            entries_in_blocked_network_rules: row
                .opt_int("entries_in_blocked_network_rules")
                .unwrap_or(0),
        })
    }
}

impl Identifiable for NetworkPolicy {
    type Id = AccountObjectIdentifier;

    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::from_trusted(&self.name)
    }
}

/// One `name`/`value` row of `DESCRIBE NETWORK POLICY`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkPolicyProperty {
    pub name: String,
    pub value: String,
}

impl FromRow for NetworkPolicyProperty {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(NetworkPolicyProperty {
            name: row.string("name")?,
            value: row.string("value")?,
        })
    }
}

fn rule_names(rules: &Option<Vec<SchemaObjectIdentifier>>) -> Option<Vec<String>> {
    rules
        .as_ref()
        .map(|rules| rules.iter().map(|r| r.fully_qualified_name()).collect())
}

/// The four lists a policy is made of.
///
/// `None` leaves a list out of the statement, `Some(vec![])` renders it as
/// `= ()`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkPolicyLists {
    allowed_network_rule_list: Option<Vec<SchemaObjectIdentifier>>,
    blocked_network_rule_list: Option<Vec<SchemaObjectIdentifier>>,
    allowed_ip_list: Option<Vec<String>>,
    blocked_ip_list: Option<Vec<String>>,
}

impl NetworkPolicyLists {
    pub fn new() -> NetworkPolicyLists {
        NetworkPolicyLists::default()
    }

    fn any(&self) -> bool {
        self.allowed_network_rule_list.is_some()
            || self.blocked_network_rule_list.is_some()
            || self.allowed_ip_list.is_some()
            || self.blocked_ip_list.is_some()
    }

    fn render_into(&self, sql: &mut SqlBuilder) {
        sql.string_list_param(
            "ALLOWED_NETWORK_RULE_LIST",
            rule_names(&self.allowed_network_rule_list).as_deref(),
        )
        .string_list_param(
            "BLOCKED_NETWORK_RULE_LIST",
            rule_names(&self.blocked_network_rule_list).as_deref(),
        )
        .string_list_param("ALLOWED_IP_LIST", self.allowed_ip_list.as_deref())
        .string_list_param("BLOCKED_IP_LIST", self.blocked_ip_list.as_deref());
    }
}

setters!(NetworkPolicyLists {
    allowed_network_rule_list: Vec<SchemaObjectIdentifier>,
    blocked_network_rule_list: Vec<SchemaObjectIdentifier>,
    allowed_ip_list: Vec<String>,
    blocked_ip_list: Vec<String>,
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateNetworkPolicy {
    id: AccountObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    lists: NetworkPolicyLists,
    comment: Option<String>,
}

impl CreateNetworkPolicy {
    pub fn new(id: AccountObjectIdentifier) -> CreateNetworkPolicy {
        CreateNetworkPolicy {
            id,
            or_replace: false,
            if_not_exists: false,
            lists: NetworkPolicyLists::default(),
            comment: None,
        }
    }

    pub fn lists(mut self, lists: NetworkPolicyLists) -> Self {
        self.lists = lists;
        self
    }
}

flags!(CreateNetworkPolicy { or_replace, if_not_exists });
string_setters!(CreateNetworkPolicy { comment });

impl Render for CreateNetworkPolicy {
    fn render(&self) -> SnowflakeResult<String> {
        at_most_one(
            "CREATE NETWORK POLICY",
            &[("OR REPLACE", self.or_replace), ("IF NOT EXISTS", self.if_not_exists)],
        )?;
        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword("NETWORK POLICY")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id);
        self.lists.render_into(&mut sql);
        sql.comment(self.comment.as_deref());
        Ok(sql.finish())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkPolicySet {
    lists: NetworkPolicyLists,
    comment: Option<String>,
}

impl NetworkPolicySet {
    pub fn new() -> NetworkPolicySet {
        NetworkPolicySet::default()
    }

    pub fn lists(mut self, lists: NetworkPolicyLists) -> Self {
        self.lists = lists;
        self
    }
}

string_setters!(NetworkPolicySet { comment });

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkPolicyUnset {
    allowed_network_rule_list: bool,
    blocked_network_rule_list: bool,
    allowed_ip_list: bool,
    blocked_ip_list: bool,
    comment: bool,
}

impl NetworkPolicyUnset {
    pub fn new() -> NetworkPolicyUnset {
        NetworkPolicyUnset::default()
    }
}

flags!(NetworkPolicyUnset {
    allowed_network_rule_list,
    blocked_network_rule_list,
    allowed_ip_list,
    blocked_ip_list,
    comment,
});

/// Adds or removes one network rule without restating the whole list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetworkRuleChange {
    Allowed(SchemaObjectIdentifier),
    Blocked(SchemaObjectIdentifier),
}

impl NetworkRuleChange {
    fn render_into(&self, sql: &mut SqlBuilder) {
        let (key, rule) = match self {
            NetworkRuleChange::Allowed(rule) => ("ALLOWED_NETWORK_RULE_LIST", rule),
            NetworkRuleChange::Blocked(rule) => ("BLOCKED_NETWORK_RULE_LIST", rule),
        };
        sql.string_param(key, Some(rule.fully_qualified_name().as_str()));
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlterNetworkPolicy {
    id: AccountObjectIdentifier,
    if_exists: bool,
    set: Option<NetworkPolicySet>,
    unset: Option<NetworkPolicyUnset>,
    add: Option<NetworkRuleChange>,
    remove: Option<NetworkRuleChange>,
    rename_to: Option<AccountObjectIdentifier>,
}

impl AlterNetworkPolicy {
    pub fn new(id: AccountObjectIdentifier) -> AlterNetworkPolicy {
        AlterNetworkPolicy {
            id,
            if_exists: false,
            set: None,
            unset: None,
            add: None,
            remove: None,
            rename_to: None,
        }
    }
}

flags!(AlterNetworkPolicy { if_exists });
setters!(AlterNetworkPolicy {
    set: NetworkPolicySet,
    unset: NetworkPolicyUnset,
    add: NetworkRuleChange,
    remove: NetworkRuleChange,
    rename_to: AccountObjectIdentifier,
});

impl Render for AlterNetworkPolicy {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.set.is_some(),
            self.unset.is_some(),
            self.add.is_some(),
            self.remove.is_some(),
            self.rename_to.is_some(),
        ])?;
        let mut sql = SqlBuilder::new("ALTER NETWORK POLICY");
        sql.keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id);
        if let Some(set) = &self.set {
            at_least_one(
                "ALTER NETWORK POLICY SET",
                &[set.lists.any(), set.comment.is_some()],
            )?;
            sql.keyword("SET");
            set.lists.render_into(&mut sql);
            sql.comment(set.comment.as_deref());
        }
        if let Some(unset) = &self.unset {
            sql.checked_unset(
                "ALTER NETWORK POLICY UNSET",
                &[
                    ("ALLOWED_NETWORK_RULE_LIST", unset.allowed_network_rule_list),
                    ("BLOCKED_NETWORK_RULE_LIST", unset.blocked_network_rule_list),
                    ("ALLOWED_IP_LIST", unset.allowed_ip_list),
                    ("BLOCKED_IP_LIST", unset.blocked_ip_list),
                    ("COMMENT", unset.comment),
                ],
            )?;
        }
        if let Some(add) = &self.add {
            sql.keyword("ADD");
            add.render_into(&mut sql);
        }
        if let Some(remove) = &self.remove {
            sql.keyword("REMOVE");
            remove.render_into(&mut sql);
        }
        sql.keyword_identifier("RENAME TO", self.rename_to.as_ref());
        Ok(sql.finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct NetworkPolicies<'a> {
    client: &'a Client,
}

impl Client {
    pub fn network_policies(&self) -> NetworkPolicies<'_> {
        NetworkPolicies { client: self }
    }
}

impl NetworkPolicies<'_> {
    pub async fn create(&self, request: &CreateNetworkPolicy) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterNetworkPolicy) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &AccountObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("NETWORK POLICY", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<NetworkPolicy>> {
        self.client.show("NETWORK POLICIES", options).await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<NetworkPolicy> {
        self.client.show_by_id("NETWORK POLICIES", id).await
    }

    pub async fn describe(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Vec<NetworkPolicyProperty>> {
        self.client
            .describe_rows("NETWORK POLICY", id)
            .await?
            .iter()
            .map(NetworkPolicyProperty::from_row)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;

    #[test]
    fn create_with_rules_and_ips() -> SnowflakeResult<()> {
        let sql = CreateNetworkPolicy::new(AccountObjectIdentifier::new("NP")?)
            .lists(
                NetworkPolicyLists::new()
                    .allowed_network_rule_list(vec![SchemaObjectIdentifier::new("DB", "SC", "R")?])
                    .allowed_ip_list(vec!["192.168.1.0/24".into()])
                    .blocked_ip_list(vec!["192.168.1.99".into()]),
            )
            .comment("office")
            .render()?;
        assert_eq!(
            sql,
            "CREATE NETWORK POLICY NP ALLOWED_NETWORK_RULE_LIST = ('DB.SC.R') \
             ALLOWED_IP_LIST = ('192.168.1.0/24') BLOCKED_IP_LIST = ('192.168.1.99') COMMENT = 'office'"
        );
        Ok(())
    }

    #[test]
    fn alter_add_and_remove_rules() -> SnowflakeResult<()> {
        let id = AccountObjectIdentifier::new("NP")?;
        let rule = SchemaObjectIdentifier::new("DB", "SC", "R")?;
        assert_eq!(
            AlterNetworkPolicy::new(id.clone())
                .add(NetworkRuleChange::Blocked(rule.clone()))
                .render()?,
            "ALTER NETWORK POLICY NP ADD BLOCKED_NETWORK_RULE_LIST = 'DB.SC.R'"
        );
        assert_eq!(
            AlterNetworkPolicy::new(id.clone())
                .remove(NetworkRuleChange::Allowed(rule))
                .render()?,
            "ALTER NETWORK POLICY NP REMOVE ALLOWED_NETWORK_RULE_LIST = 'DB.SC.R'"
        );
        assert!(AlterNetworkPolicy::new(id)
            .set(NetworkPolicySet::new())
            .render()
            .is_err());
        Ok(())
    }

    #[tokio::test]
    async fn empty_list_and_unset_both_count_zero() -> SnowflakeResult<()> {
        let emptied = AccountObjectIdentifier::new("NP_EMPTY")?;
        let unset = AccountObjectIdentifier::new("NP_UNSET")?;
        let set_empty = AlterNetworkPolicy::new(emptied.clone())
            .set(NetworkPolicySet::new().lists(NetworkPolicyLists::new().allowed_ip_list(vec![])));
        let unset_list = AlterNetworkPolicy::new(unset.clone())
            .unset(NetworkPolicyUnset::new().allowed_ip_list());
        assert_eq!(set_empty.render()?, "ALTER NETWORK POLICY NP_EMPTY SET ALLOWED_IP_LIST = ()");
        assert_eq!(unset_list.render()?, "ALTER NETWORK POLICY NP_UNSET UNSET ALLOWED_IP_LIST");

        let row = |name: &str| {
            Row::new()
                .with("name", name)
                .with("entries_in_allowed_ip_list", "0")
                .with("entries_in_blocked_ip_list", "0")
        };
        let driver = FakeDriver::new()
            .with_exec("ALTER NETWORK POLICY NP_EMPTY SET ALLOWED_IP_LIST = ()")
            .with_exec("ALTER NETWORK POLICY NP_UNSET UNSET ALLOWED_IP_LIST")
            .with_rows("SHOW NETWORK POLICIES LIKE 'NP_EMPTY'", vec![row("NP_EMPTY")])
            .with_rows("SHOW NETWORK POLICIES LIKE 'NP_UNSET'", vec![row("NP_UNSET")]);
        let client = Client::new(driver);
        let policies = client.network_policies();

        policies.alter(&set_empty).await?;
        policies.alter(&unset_list).await?;
        assert_eq!(policies.show_by_id(&emptied).await?.entries_in_allowed_ip_list, 0);
        assert_eq!(policies.show_by_id(&unset).await?.entries_in_allowed_ip_list, 0);
        Ok(())
    }
}
