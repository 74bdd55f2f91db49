//! Round trips against a real account, driven by `SNOWFLAKE_*` variables.
//!
//! Every test creates uniquely named objects and drops them again, so the
//! suite can run against a shared sandbox account.

use crate::datatypes::DataType;
use crate::errors::ErrorKind;
use crate::objects::common::{Argument, DropOptions};
use crate::objects::database::CreateDatabase;
use crate::objects::database_role::CreateDatabaseRole;
use crate::objects::dynamic_table::{AlterDynamicTable, CreateDynamicTable, TargetLag};
use crate::objects::failover_group::{
    AlterSourceFailoverGroup, CreateFailoverGroup, FailoverGroupSet, IntegrationType,
    PluralObjectType,
};
use crate::objects::network_policy::{
    AlterNetworkPolicy, CreateNetworkPolicy, NetworkPolicyLists, NetworkPolicySet,
    NetworkPolicyUnset,
};
use crate::objects::resource_monitor::CreateResourceMonitor;
use crate::objects::row_access_policy::CreateRowAccessPolicy;
use crate::objects::schema::CreateSchema;
use crate::objects::table::{CreateTable, TableColumn};
use crate::objects::warehouse::{CreateWarehouse, WarehouseProperties};
use crate::{
    safe_show_by_id, AccountObjectIdentifier, Client, DatabaseObjectIdentifier, ObjectIdentifier,
    SchemaObjectIdentifier, SnowflakeClient, SnowflakeError, SnowflakeResult,
    ALTER_NEEDS_EXACTLY_ONE_ACTION,
};

fn default_client() -> SnowflakeResult<Client> {
    let _ = env_logger::try_init();
    Ok(Client::new(SnowflakeClient::from_env()?).with_query_tag("light-snowflake-sdk live tests"))
}

/// `PREFIX_<random>`, unique per call
fn unique_name(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    format!("{prefix}_{}", &suffix[..12])
}

fn configured_warehouse() -> SnowflakeResult<AccountObjectIdentifier> {
    let name = std::env::var("SNOWFLAKE_WAREHOUSE")
        .map_err(|_| SnowflakeError::Config("SNOWFLAKE_WAREHOUSE is not set".into()))?;
    AccountObjectIdentifier::new(name)
}

/// A fresh database with one schema in it
async fn scratch_schema(
    client: &Client,
) -> SnowflakeResult<(AccountObjectIdentifier, DatabaseObjectIdentifier)> {
    let database = AccountObjectIdentifier::new(unique_name("LIVE_DB"))?;
    client.databases().create(&CreateDatabase::new(database.clone())).await?;
    let schema = database.database_object("LIVE")?;
    client.schemas().create(&CreateSchema::new(schema.clone())).await?;
    Ok((database, schema))
}

async fn drop_database(client: &Client, database: &AccountObjectIdentifier) -> SnowflakeResult<()> {
    client
        .databases()
        .drop(database, &DropOptions::new().if_exists())
        .await
}

#[tokio::test]
async fn can_login() -> SnowflakeResult<()> {
    let client = default_client()?;
    let rows = client.query_unsafe("SELECT 1 AS ONE").await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].int("one")?, 1);
    Ok(())
}

#[tokio::test]
async fn warehouse_keeps_quoted_resource_monitor() -> SnowflakeResult<()> {
    let client = default_client()?;
    let monitor = AccountObjectIdentifier::new(format!("{}\"bc", unique_name("a")))?;
    let warehouse = AccountObjectIdentifier::new(format!("{}\"bc", unique_name("a")))?;

    client
        .resource_monitors()
        .create(&CreateResourceMonitor::new(monitor.clone()))
        .await?;
    client
        .warehouses()
        .create(
            &CreateWarehouse::new(warehouse.clone())
                .properties(WarehouseProperties::new().resource_monitor(monitor.clone())),
        )
        .await?;

    let shown = client.warehouses().show_by_id(&warehouse).await;

    client
        .warehouses()
        .drop(&warehouse, &DropOptions::new().if_exists())
        .await?;
    client
        .resource_monitors()
        .drop(&monitor, &DropOptions::new().if_exists())
        .await?;

    let shown = shown?;
    assert_eq!(shown.name, warehouse.name());
    assert_eq!(shown.resource_monitor.as_deref(), Some(monitor.name()));
    Ok(())
}

#[tokio::test]
async fn dynamic_table_target_lag_round_trips() -> SnowflakeResult<()> {
    let client = default_client()?;
    let warehouse = configured_warehouse()?;
    let (database, schema) = scratch_schema(&client).await?;
    let source = schema.schema_object("SOURCE")?;
    let id = schema.schema_object("LAGGED")?;

    let outcome = async {
        client
            .tables()
            .create(&CreateTable::new(
                source.clone(),
                vec![TableColumn::new("ID", DataType::parse("NUMBER")?)],
            ))
            .await?;
        let query = format!("SELECT ID FROM {}", source.fully_qualified_name());

        client
            .dynamic_tables()
            .create(&CreateDynamicTable::new(
                id.clone(),
                warehouse.clone(),
                TargetLag::MaximumDuration("2 minutes".into()),
                query.clone(),
            ))
            .await?;
        let shown = client.dynamic_tables().show_by_id(&id).await?;
        assert_eq!(
            shown.target_lag,
            Some(TargetLag::MaximumDuration("2 minutes".into()))
        );

        client
            .dynamic_tables()
            .create(
                &CreateDynamicTable::new(id.clone(), warehouse.clone(), TargetLag::Downstream, query)
                    .or_replace(),
            )
            .await?;
        let shown = client.dynamic_tables().show_by_id(&id).await?;
        assert_eq!(shown.target_lag, Some(TargetLag::Downstream));

        let err = client
            .dynamic_tables()
            .alter(&AlterDynamicTable::new(id.clone()).suspend().resume())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), ALTER_NEEDS_EXACTLY_ONE_ACTION);
        SnowflakeResult::Ok(())
    }
    .await;

    drop_database(&client, &database).await?;
    outcome
}

#[tokio::test]
async fn failover_group_set_must_be_split() -> SnowflakeResult<()> {
    let client = default_client()?;
    let id = AccountObjectIdentifier::new(unique_name("LIVE_FG"))?;
    client
        .failover_groups()
        .create(
            &CreateFailoverGroup::new(
                id.clone(),
                vec![PluralObjectType::Integrations, PluralObjectType::Databases],
                vec![],
            )
            .allowed_integration_types(vec![IntegrationType::SecurityIntegrations])
            .replication_schedule("10 MINUTE"),
        )
        .await?;

    let outcome = async {
        let combined = AlterSourceFailoverGroup::new(id.clone())
            .set(FailoverGroupSet::new().object_types(vec![PluralObjectType::Databases]))
            .set_replication_schedule("20 MINUTE");
        assert!(combined.render().is_err());
        let err = client
            .exec_unsafe(&format!(
                "ALTER FAILOVER GROUP {} SET OBJECT_TYPES = INTEGRATIONS, DATABASES \
                 ALLOWED_INTEGRATION_TYPES = SECURITY INTEGRATIONS, API INTEGRATIONS \
                 REPLICATION_SCHEDULE = '20 MINUTE'",
                id.fully_qualified_name()
            ))
            .await
            .unwrap_err();
        assert!(
            err.to_string().contains("unexpected 'REPLICATION_SCHEDULE'"),
            "{err}"
        );

        client
            .failover_groups()
            .alter_source(
                &AlterSourceFailoverGroup::new(id.clone()).set(
                    FailoverGroupSet::new()
                        .object_types(vec![
                            PluralObjectType::Integrations,
                            PluralObjectType::Databases,
                        ])
                        .allowed_integration_types(vec![
                            IntegrationType::SecurityIntegrations,
                            IntegrationType::ApiIntegrations,
                        ]),
                ),
            )
            .await?;
        client
            .failover_groups()
            .alter_source(
                &AlterSourceFailoverGroup::new(id.clone()).set_replication_schedule("20 MINUTE"),
            )
            .await?;

        let shown = client.failover_groups().show_by_id(&id).await?;
        assert_eq!(shown.replication_schedule.as_deref(), Some("20 MINUTE"));
        SnowflakeResult::Ok(())
    }
    .await;

    client
        .failover_groups()
        .drop(&id, &DropOptions::new().if_exists())
        .await?;
    outcome
}

#[tokio::test]
async fn network_policy_empty_and_unset_lists() -> SnowflakeResult<()> {
    let client = default_client()?;
    let emptied = AccountObjectIdentifier::new(unique_name("LIVE_NP"))?;
    let unset = AccountObjectIdentifier::new(unique_name("LIVE_NP"))?;
    let ips = || NetworkPolicyLists::new().allowed_ip_list(vec!["192.168.0.100".into()]);
    for id in [&emptied, &unset] {
        client
            .network_policies()
            .create(&CreateNetworkPolicy::new(id.clone()).lists(ips()))
            .await?;
    }

    let outcome = async {
        client
            .network_policies()
            .alter(&AlterNetworkPolicy::new(emptied.clone()).set(
                NetworkPolicySet::new().lists(NetworkPolicyLists::new().allowed_ip_list(vec![])),
            ))
            .await?;
        client
            .network_policies()
            .alter(
                &AlterNetworkPolicy::new(unset.clone())
                    .unset(NetworkPolicyUnset::new().allowed_ip_list()),
            )
            .await?;

        for id in [&emptied, &unset] {
            let shown = client.network_policies().show_by_id(id).await?;
            assert_eq!(shown.entries_in_allowed_ip_list, 0, "{}", id.name());
        }
        SnowflakeResult::Ok(())
    }
    .await;

    for id in [&emptied, &unset] {
        client
            .network_policies()
            .drop(id, &DropOptions::new().if_exists())
            .await?;
    }
    outcome
}

#[tokio::test]
async fn row_access_policy_signature_is_normalized() -> SnowflakeResult<()> {
    let client = default_client()?;
    let (database, schema) = scratch_schema(&client).await?;

    let outcome = async {
        for (declared, described) in [("TIMESTAMP", "(x TIMESTAMP_NTZ)"), ("VARCHAR(200)", "(x VARCHAR)")] {
            let id = schema.schema_object(unique_name("LIVE_RAP"))?;
            client
                .row_access_policies()
                .create(&CreateRowAccessPolicy::new(
                    id.clone(),
                    vec![Argument::new("x", DataType::parse(declared)?)],
                    "true",
                ))
                .await?;
            let description = client.row_access_policies().describe(&id).await?;
            assert_eq!(description.signature_text(), described);
            assert_eq!(description.return_type, DataType::Boolean);
            assert_eq!(description.body, "true");
        }
        SnowflakeResult::Ok(())
    }
    .await;

    drop_database(&client, &database).await?;
    outcome
}

#[tokio::test]
async fn safe_show_follows_cascading_drops() -> SnowflakeResult<()> {
    let client = default_client()?;
    let (database, schema) = scratch_schema(&client).await?;
    let table = schema.schema_object("T")?;
    client
        .tables()
        .create(&CreateTable::new(
            table.clone(),
            vec![TableColumn::new("ID", DataType::parse("NUMBER")?)],
        ))
        .await?;
    let tables = client.tables();
    let show_table = || {
        safe_show_by_id(
            |id: SchemaObjectIdentifier| async move { tables.show_by_id(&id).await },
            table.clone(),
        )
    };

    tables.drop(&table, &DropOptions::new()).await?;
    let err = show_table().await.unwrap_err();
    assert!(err.is(ErrorKind::ObjectNotFound), "{err}");

    client.schemas().drop(&schema, &DropOptions::new()).await?;
    let err = show_table().await.unwrap_err();
    assert!(err.is(ErrorKind::ObjectNotFound), "{err}");
    assert!(err.is(ErrorKind::DoesNotExistOrOperationCannotBePerformed), "{err}");

    client.databases().drop(&database, &DropOptions::new()).await?;
    let err = show_table().await.unwrap_err();
    assert!(err.is(ErrorKind::ObjectNotFound), "{err}");
    assert!(err.is(ErrorKind::DoesNotExistOrOperationCannotBePerformed), "{err}");
    Ok(())
}

#[tokio::test]
async fn safe_show_database_role_after_database_drop() -> SnowflakeResult<()> {
    let client = default_client()?;
    let database = AccountObjectIdentifier::new(unique_name("LIVE_DB"))?;
    client.databases().create(&CreateDatabase::new(database.clone())).await?;
    let role = database.database_object("R")?;
    client
        .database_roles()
        .create(&CreateDatabaseRole::new(role.clone()))
        .await?;
    let roles = client.database_roles();
    let show_role = || {
        safe_show_by_id(
            |id: DatabaseObjectIdentifier| async move { roles.show_by_id(&id).await },
            role.clone(),
        )
    };

    roles.drop(&role, &DropOptions::new()).await?;
    let err = show_role().await.unwrap_err();
    assert!(err.is(ErrorKind::ObjectNotFound), "{err}");

    client.databases().drop(&database, &DropOptions::new()).await?;
    let err = show_role().await.unwrap_err();
    assert!(err.is(ErrorKind::ObjectNotFound), "{err}");
    assert!(err.is(ErrorKind::ObjectNotExistOrAuthorized), "{err}");

    Ok(())
}
