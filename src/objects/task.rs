use std::fmt;

use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{AccountObjectIdentifier, ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{DropOptions, ShowOptions, TagAssociation};
use crate::objects::warehouse::WarehouseSize;
use crate::row::{FromRow, Row};
use crate::sql::{
    at_least_one, at_most_one, bool_literal, dollar_quote, exactly_one_action, quote_string,
    required, Render, SqlBuilder,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskState {
    Started,
    Suspended,
}

impl TaskState {
    fn parse(value: &str) -> Option<TaskState> {
        match value.trim().to_ascii_lowercase().as_str() {
            "started" => Some(TaskState::Started),
            "suspended" => Some(TaskState::Suspended),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub id: Option<String>,
    pub database_name: String,
    pub schema_name: String,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub warehouse: Option<String>,
    pub schedule: Option<String>,
    pub predecessors: Vec<SchemaObjectIdentifier>,
    pub state: Option<TaskState>,
    pub definition: Option<String>,
    pub condition: Option<String>,
    pub allow_overlapping_execution: bool,
    pub error_integration: Option<String>,
    pub last_committed_on: Option<DateTime<Utc>>,
    pub last_suspended_on: Option<DateTime<Utc>>,
    pub owner_role_type: Option<String>,
    pub config: Option<String>,
    pub budget: Option<String>,
    pub last_suspended_reason: Option<String>,
}

/// SHOW TASKS reports predecessors as a JSON array of fully qualified names.
fn parse_predecessors(value: Option<String>) -> SnowflakeResult<Vec<SchemaObjectIdentifier>> {
    let Some(value) = value else {
        return Ok(vec![]);
    };
    let names: Vec<String> = serde_json::from_str(&value)?;
    names.iter().map(|name| name.parse()).collect()
}

impl FromRow for Task {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(Task {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            id: row.opt_string("id"),
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            owner: row.opt_string("owner"),
            comment: row.opt_string("comment"),
            warehouse: row.opt_string("warehouse"),
            schedule: row.opt_string("schedule"),
            predecessors: parse_predecessors(row.opt_string("predecessors"))?,
            state: row.opt_string("state").as_deref().and_then(TaskState::parse),
            definition: row.opt_string("definition"),
            condition: row.opt_string("condition"),
            allow_overlapping_execution: row
                .opt_bool("allow_overlapping_execution")
                .unwrap_or(false),
            error_integration: row.opt_string("error_integration"),
            last_committed_on: row.opt_timestamp("last_committed_on"),
            last_suspended_on: row.opt_timestamp("last_suspended_on"),
            owner_role_type: row.opt_string("owner_role_type"),
            config: row.opt_string("config"),
            budget: row.opt_string("budget"),
            last_suspended_reason: row.opt_string("last_suspended_reason"),
        })
    }
}

impl Identifiable for Task {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::from_trusted(&self.database_name, &self.schema_name, &self.name)
    }
}

/// The compute a task runs on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskWarehouse {
    Warehouse(AccountObjectIdentifier),
    /// Serverless, starting from the given size
    UserManaged(WarehouseSize),
}

/// A session parameter applied while the task runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionParameter {
    name: String,
    value: String,
}

impl SessionParameter {
    pub fn string(name: impl Into<String>, value: &str) -> SessionParameter {
        SessionParameter {
            name: name.into(),
            value: quote_string(value),
        }
    }

    pub fn bool(name: impl Into<String>, value: bool) -> SessionParameter {
        SessionParameter {
            name: name.into(),
            value: bool_literal(value).to_owned(),
        }
    }

    pub fn number(name: impl Into<String>, value: i64) -> SessionParameter {
        SessionParameter {
            name: name.into(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for SessionParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name.to_ascii_uppercase(), self.value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateTask {
    id: SchemaObjectIdentifier,
    sql: String,
    or_replace: bool,
    if_not_exists: bool,
    warehouse: Option<TaskWarehouse>,
    schedule: Option<String>,
    config: Option<String>,
    allow_overlapping_execution: Option<bool>,
    session_parameters: Vec<SessionParameter>,
    user_task_timeout_ms: Option<u64>,
    suspend_task_after_num_failures: Option<u32>,
    error_integration: Option<AccountObjectIdentifier>,
    comment: Option<String>,
    finalize: Option<SchemaObjectIdentifier>,
    task_auto_retry_attempts: Option<u32>,
    user_task_minimum_trigger_interval_in_seconds: Option<u32>,
    tags: Vec<TagAssociation>,
    after: Vec<SchemaObjectIdentifier>,
    when: Option<String>,
}

impl CreateTask {
    pub fn new(id: SchemaObjectIdentifier, sql: impl Into<String>) -> CreateTask {
        CreateTask {
            id,
            sql: sql.into(),
            or_replace: false,
            if_not_exists: false,
            warehouse: None,
            schedule: None,
            config: None,
            allow_overlapping_execution: None,
            session_parameters: vec![],
            user_task_timeout_ms: None,
            suspend_task_after_num_failures: None,
            error_integration: None,
            comment: None,
            finalize: None,
            task_auto_retry_attempts: None,
            user_task_minimum_trigger_interval_in_seconds: None,
            tags: vec![],
            after: vec![],
            when: None,
        }
    }
}

flags!(CreateTask { or_replace, if_not_exists });
setters!(CreateTask {
    warehouse: TaskWarehouse,
    allow_overlapping_execution: bool,
    user_task_timeout_ms: u64,
    suspend_task_after_num_failures: u32,
    error_integration: AccountObjectIdentifier,
    finalize: SchemaObjectIdentifier,
    task_auto_retry_attempts: u32,
    user_task_minimum_trigger_interval_in_seconds: u32,
});
string_setters!(CreateTask { schedule, config, comment, when });
list_setters!(CreateTask {
    session_parameters: SessionParameter,
    tags: TagAssociation,
    after: SchemaObjectIdentifier,
});

fn render_warehouse(sql: &mut SqlBuilder, warehouse: Option<&TaskWarehouse>) {
    match warehouse {
        Some(TaskWarehouse::Warehouse(id)) => {
            sql.identifier_param("WAREHOUSE", Some(id));
        }
        Some(TaskWarehouse::UserManaged(size)) => {
            sql.string_param("USER_TASK_MANAGED_INITIAL_WAREHOUSE_SIZE", Some(size.as_str()));
        }
        None => {}
    }
}

impl Render for CreateTask {
    fn render(&self) -> SnowflakeResult<String> {
        at_most_one(
            "CREATE TASK",
            &[("OR REPLACE", self.or_replace), ("IF NOT EXISTS", self.if_not_exists)],
        )?;
        required("CREATE TASK body", &self.sql)?;
        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword("TASK")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id);
        render_warehouse(&mut sql, self.warehouse.as_ref());
        sql.string_param("SCHEDULE", self.schedule.as_deref())
            .opt_param("CONFIG", self.config.as_deref().map(dollar_quote))
            .bool_param("ALLOW_OVERLAPPING_EXECUTION", self.allow_overlapping_execution)
            .comma_separated(self.session_parameters.iter().map(ToString::to_string))
            .opt_param("USER_TASK_TIMEOUT_MS", self.user_task_timeout_ms)
            .opt_param(
                "SUSPEND_TASK_AFTER_NUM_FAILURES",
                self.suspend_task_after_num_failures,
            )
            .identifier_param("ERROR_INTEGRATION", self.error_integration.as_ref())
            .comment(self.comment.as_deref())
            .identifier_param("FINALIZE", self.finalize.as_ref())
            .opt_param("TASK_AUTO_RETRY_ATTEMPTS", self.task_auto_retry_attempts)
            .tags("WITH TAG", &self.tags)
            .opt_param(
                "USER_TASK_MINIMUM_TRIGGER_INTERVAL_IN_SECONDS",
                self.user_task_minimum_trigger_interval_in_seconds,
            );
        if !self.after.is_empty() {
            sql.keyword("AFTER")
                .comma_separated(self.after.iter().map(|id| id.fully_qualified_name()));
        }
        if let Some(condition) = &self.when {
            sql.keyword("WHEN").raw(condition.as_str());
        }
        sql.keyword("AS").raw(self.sql.as_str());
        Ok(sql.finish())
    }
}

/// `CREATE TASK <id> CLONE <source>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloneTask {
    id: SchemaObjectIdentifier,
    source: SchemaObjectIdentifier,
    or_replace: bool,
    copy_grants: bool,
}

impl CloneTask {
    pub fn new(id: SchemaObjectIdentifier, source: SchemaObjectIdentifier) -> CloneTask {
        CloneTask {
            id,
            source,
            or_replace: false,
            copy_grants: false,
        }
    }
}

flags!(CloneTask { or_replace, copy_grants });

impl Render for CloneTask {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("TASK")
            .identifier(&self.id)
            .keyword("CLONE")
            .identifier(&self.source)
            .keyword_if(self.copy_grants, "COPY GRANTS")
            .finish())
    }
}

/// `EXECUTE TASK <id> [RETRY LAST]`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecuteTask {
    id: SchemaObjectIdentifier,
    retry_last: bool,
}

impl ExecuteTask {
    pub fn new(id: SchemaObjectIdentifier) -> ExecuteTask {
        ExecuteTask {
            id,
            retry_last: false,
        }
    }
}

flags!(ExecuteTask { retry_last });

impl Render for ExecuteTask {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("EXECUTE TASK")
            .identifier(&self.id)
            .keyword_if(self.retry_last, "RETRY LAST")
            .finish())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskSet {
    warehouse: Option<TaskWarehouse>,
    schedule: Option<String>,
    config: Option<String>,
    allow_overlapping_execution: Option<bool>,
    user_task_timeout_ms: Option<u64>,
    suspend_task_after_num_failures: Option<u32>,
    error_integration: Option<AccountObjectIdentifier>,
    comment: Option<String>,
    session_parameters: Vec<SessionParameter>,
}

impl TaskSet {
    pub fn new() -> TaskSet {
        TaskSet::default()
    }
}

setters!(TaskSet {
    warehouse: TaskWarehouse,
    allow_overlapping_execution: bool,
    user_task_timeout_ms: u64,
    suspend_task_after_num_failures: u32,
    error_integration: AccountObjectIdentifier,
});
string_setters!(TaskSet { schedule, config, comment });
list_setters!(TaskSet { session_parameters: SessionParameter });

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskUnset {
    warehouse: bool,
    schedule: bool,
    config: bool,
    allow_overlapping_execution: bool,
    user_task_timeout_ms: bool,
    suspend_task_after_num_failures: bool,
    error_integration: bool,
    comment: bool,
    session_parameters: Vec<String>,
}

impl TaskUnset {
    pub fn new() -> TaskUnset {
        TaskUnset::default()
    }
}

flags!(TaskUnset {
    warehouse,
    schedule,
    config,
    allow_overlapping_execution,
    user_task_timeout_ms,
    suspend_task_after_num_failures,
    error_integration,
    comment,
});
list_setters!(TaskUnset { session_parameters: String });

#[derive(Clone, Debug, PartialEq)]
pub struct AlterTask {
    id: SchemaObjectIdentifier,
    if_exists: bool,
    resume: bool,
    suspend: bool,
    remove_after: Vec<SchemaObjectIdentifier>,
    add_after: Vec<SchemaObjectIdentifier>,
    set: Option<TaskSet>,
    unset: Option<TaskUnset>,
    set_tags: Vec<TagAssociation>,
    unset_tags: Vec<SchemaObjectIdentifier>,
    modify_as: Option<String>,
    modify_when: Option<String>,
    remove_when: bool,
}

impl AlterTask {
    pub fn new(id: SchemaObjectIdentifier) -> AlterTask {
        AlterTask {
            id,
            if_exists: false,
            resume: false,
            suspend: false,
            remove_after: vec![],
            add_after: vec![],
            set: None,
            unset: None,
            set_tags: vec![],
            unset_tags: vec![],
            modify_as: None,
            modify_when: None,
            remove_when: false,
        }
    }
}

flags!(AlterTask { if_exists, resume, suspend, remove_when });
setters!(AlterTask { set: TaskSet, unset: TaskUnset });
string_setters!(AlterTask { modify_as, modify_when });
list_setters!(AlterTask {
    remove_after: SchemaObjectIdentifier,
    add_after: SchemaObjectIdentifier,
    set_tags: TagAssociation,
    unset_tags: SchemaObjectIdentifier,
});

impl AlterTask {
    fn render_set(sql: &mut SqlBuilder, set: &TaskSet) -> SnowflakeResult<()> {
        at_least_one(
            "ALTER TASK SET",
            &[
                set.warehouse.is_some(),
                set.schedule.is_some(),
                set.config.is_some(),
                set.allow_overlapping_execution.is_some(),
                set.user_task_timeout_ms.is_some(),
                set.suspend_task_after_num_failures.is_some(),
                set.error_integration.is_some(),
                set.comment.is_some(),
                !set.session_parameters.is_empty(),
            ],
        )?;
        sql.keyword("SET");
        render_warehouse(sql, set.warehouse.as_ref());
        sql.string_param("SCHEDULE", set.schedule.as_deref())
            .opt_param("CONFIG", set.config.as_deref().map(dollar_quote))
            .bool_param("ALLOW_OVERLAPPING_EXECUTION", set.allow_overlapping_execution)
            .opt_param("USER_TASK_TIMEOUT_MS", set.user_task_timeout_ms)
            .opt_param(
                "SUSPEND_TASK_AFTER_NUM_FAILURES",
                set.suspend_task_after_num_failures,
            )
            .identifier_param("ERROR_INTEGRATION", set.error_integration.as_ref())
            .comment(set.comment.as_deref())
            .comma_separated(set.session_parameters.iter().map(ToString::to_string));
        Ok(())
    }

    fn render_unset(sql: &mut SqlBuilder, unset: &TaskUnset) -> SnowflakeResult<()> {
        let mut names: Vec<(&str, bool)> = vec![
            ("WAREHOUSE", unset.warehouse),
            ("SCHEDULE", unset.schedule),
            ("CONFIG", unset.config),
            ("ALLOW_OVERLAPPING_EXECUTION", unset.allow_overlapping_execution),
            ("USER_TASK_TIMEOUT_MS", unset.user_task_timeout_ms),
            ("SUSPEND_TASK_AFTER_NUM_FAILURES", unset.suspend_task_after_num_failures),
            ("ERROR_INTEGRATION", unset.error_integration),
            ("COMMENT", unset.comment),
        ];
        names.extend(unset.session_parameters.iter().map(|p| (p.as_str(), true)));
        sql.checked_unset("ALTER TASK UNSET", &names)?;
        Ok(())
    }
}

impl Render for AlterTask {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.resume,
            self.suspend,
            !self.remove_after.is_empty(),
            !self.add_after.is_empty(),
            self.set.is_some(),
            self.unset.is_some(),
            !self.set_tags.is_empty(),
            !self.unset_tags.is_empty(),
            self.modify_as.is_some(),
            self.modify_when.is_some(),
            self.remove_when,
        ])?;
        let mut sql = SqlBuilder::new("ALTER TASK");
        sql.keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_if(self.resume, "RESUME")
            .keyword_if(self.suspend, "SUSPEND");
        if !self.remove_after.is_empty() {
            sql.keyword("REMOVE AFTER")
                .comma_separated(self.remove_after.iter().map(|id| id.fully_qualified_name()));
        }
        if !self.add_after.is_empty() {
            sql.keyword("ADD AFTER")
                .comma_separated(self.add_after.iter().map(|id| id.fully_qualified_name()));
        }
        if let Some(set) = &self.set {
            AlterTask::render_set(&mut sql, set)?;
        }
        if let Some(unset) = &self.unset {
            AlterTask::render_unset(&mut sql, unset)?;
        }
        sql.set_tags(&self.set_tags).unset_tags(&self.unset_tags);
        if let Some(body) = &self.modify_as {
            sql.keyword("MODIFY AS").raw(body.as_str());
        }
        if let Some(condition) = &self.modify_when {
            sql.keyword("MODIFY WHEN").raw(condition.as_str());
        }
        sql.keyword_if(self.remove_when, "REMOVE WHEN");
        Ok(sql.finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Tasks<'a> {
    client: &'a Client,
}

impl Client {
    pub fn tasks(&self) -> Tasks<'_> {
        Tasks { client: self }
    }
}

impl Tasks<'_> {
    pub async fn create(&self, request: &CreateTask) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn clone_task(&self, request: &CloneTask) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterTask) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn execute(&self, request: &ExecuteTask) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &SchemaObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("TASK", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<Task>> {
        self.client.show("TASKS", options).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Task> {
        self.client.show_by_id("TASKS", id).await
    }

    /// DESCRIBE TASK answers with the same columns as SHOW TASKS
    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Task> {
        let rows = self.client.describe_rows("TASK", id).await?;
        let row = rows.first().ok_or(SnowflakeError::EmptyResult)?;
        Task::from_row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;

    #[test]
    fn serverless_task_with_everything() -> SnowflakeResult<()> {
        let id = SchemaObjectIdentifier::new("DB", "SC", "T")?;
        let root = SchemaObjectIdentifier::new("DB", "SC", "ROOT")?;
        let sql = CreateTask::new(id, "SELECT 1")
            .warehouse(TaskWarehouse::UserManaged(WarehouseSize::XSmall))
            .schedule("10 MINUTE")
            .config(r#"{"output_dir": "/temp"}"#)
            .session_parameters(vec![
                SessionParameter::string("timezone", "UTC"),
                SessionParameter::bool("autocommit", false),
            ])
            .user_task_timeout_ms(5000)
            .suspend_task_after_num_failures(3)
            .comment("nightly")
            .after(vec![root])
            .when("SYSTEM$STREAM_HAS_DATA('DB.SC.S')")
            .render()?;
        assert_eq!(
            sql,
            "CREATE TASK DB.SC.T USER_TASK_MANAGED_INITIAL_WAREHOUSE_SIZE = 'XSMALL' \
             SCHEDULE = '10 MINUTE' CONFIG = $${\"output_dir\": \"/temp\"}$$ \
             TIMEZONE = 'UTC', AUTOCOMMIT = false USER_TASK_TIMEOUT_MS = 5000 \
             SUSPEND_TASK_AFTER_NUM_FAILURES = 3 COMMENT = 'nightly' AFTER DB.SC.ROOT \
             WHEN SYSTEM$STREAM_HAS_DATA('DB.SC.S') AS SELECT 1"
        );
        Ok(())
    }

    #[test]
    fn alter_task_actions() -> SnowflakeResult<()> {
        let id = SchemaObjectIdentifier::new("DB", "SC", "T")?;
        assert_eq!(
            AlterTask::new(id.clone()).resume().render()?,
            "ALTER TASK DB.SC.T RESUME"
        );
        assert_eq!(
            AlterTask::new(id.clone())
                .unset(TaskUnset::new().schedule().session_parameters(vec!["TIMEZONE".into()]))
                .render()?,
            "ALTER TASK DB.SC.T UNSET SCHEDULE, TIMEZONE"
        );
        assert_eq!(
            AlterTask::new(id.clone())
                .set(TaskSet::new().warehouse(TaskWarehouse::Warehouse(
                    AccountObjectIdentifier::new("WH")?
                )))
                .render()?,
            "ALTER TASK DB.SC.T SET WAREHOUSE = WH"
        );
        assert_eq!(
            AlterTask::new(id.clone()).modify_when("1 = 1").render()?,
            "ALTER TASK DB.SC.T MODIFY WHEN 1 = 1"
        );
        assert!(AlterTask::new(id.clone()).resume().suspend().render().is_err());
        assert_eq!(
            ExecuteTask::new(id).retry_last().render()?,
            "EXECUTE TASK DB.SC.T RETRY LAST"
        );
        Ok(())
    }

    #[tokio::test]
    async fn show_parses_predecessors() -> SnowflakeResult<()> {
        let id = SchemaObjectIdentifier::new("DB", "SC", "CHILD")?;
        let driver = FakeDriver::new().with_rows(
            "SHOW TASKS LIKE 'CHILD' IN SCHEMA DB.SC",
            vec![Row::new()
                .with("name", "CHILD")
                .with("database_name", "DB")
                .with("schema_name", "SC")
                .with("state", "suspended")
                .with("predecessors", r#"["\"DB\".\"SC\".\"ROOT\"", "DB.SC.\"lower\""]"#)],
        );
        let task = Client::new(driver).tasks().show_by_id(&id).await?;
        assert_eq!(task.state, Some(TaskState::Suspended));
        assert_eq!(
            task.predecessors,
            vec![
                SchemaObjectIdentifier::new("DB", "SC", "ROOT")?,
                SchemaObjectIdentifier::new("DB", "SC", "lower")?,
            ]
        );
        Ok(())
    }
}
