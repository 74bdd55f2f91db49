//! Tables: column definitions with inline and out-of-line constraints, the
//! ALTER TABLE action set, and DESCRIBE TABLE column details.

use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::datatypes::DataType;
use crate::errors::{SnowflakeError, SnowflakeResult, ALTER_NEEDS_EXACTLY_ONE_ACTION};
use crate::identifiers::{quote_part, ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{DropOptions, ShowOptions, TagAssociation, UndropStatement};
use crate::row::{FromRow, Row};
use crate::sql::{at_least_one, at_most_one, quote_string, Render, SqlBuilder};

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub kind: Option<String>,
    pub comment: Option<String>,
    pub cluster_by: Option<String>,
    pub rows: Option<i64>,
    pub bytes: Option<i64>,
    pub owner: Option<String>,
    pub retention_time: Option<i64>,
    pub automatic_clustering: bool,
    pub change_tracking: bool,
    pub search_optimization: bool,
    pub search_optimization_progress: Option<String>,
    pub search_optimization_bytes: Option<i64>,
    pub is_external: bool,
    pub enable_schema_evolution: bool,
    pub owner_role_type: Option<String>,
    pub is_event: bool,
    pub is_hybrid: bool,
    pub is_iceberg: bool,
    pub is_dynamic: bool,
}

impl Table {
    pub fn is_transient(&self) -> bool {
        self.kind.as_deref() == Some("TRANSIENT")
    }
}

impl FromRow for Table {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        let flag = |column: &str| row.opt_bool(column).unwrap_or(false);
        Ok(Table {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            kind: row.opt_string("kind"),
            comment: row.opt_string("comment"),
            cluster_by: row.opt_string("cluster_by"),
            rows: row.opt_int("rows"),
            bytes: row.opt_int("bytes"),
            owner: row.opt_string("owner"),
            retention_time: row.opt_int("retention_time"),
            automatic_clustering: flag("automatic_clustering"),
            change_tracking: flag("change_tracking"),
            search_optimization: flag("search_optimization"),
            search_optimization_progress: row.opt_string("search_optimization_progress"),
            search_optimization_bytes: row.opt_int("search_optimization_bytes"),
            is_external: flag("is_external"),
            enable_schema_evolution: flag("enable_schema_evolution"),
            owner_role_type: row.opt_string("owner_role_type"),
            is_event: flag("is_event"),
            is_hybrid: flag("is_hybrid"),
            is_iceberg: flag("is_iceberg"),
            is_dynamic: flag("is_dynamic"),
        })
    }
}

impl Identifiable for Table {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::from_trusted(&self.database_name, &self.schema_name, &self.name)
    }
}

/// `DEFAULT <expr>` or an identity specification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnDefault {
    Expression(String),
    Sequence(SchemaObjectIdentifier),
    Identity {
        start: i64,
        increment: i64,
        order: Option<bool>,
    },
}

impl ColumnDefault {
    fn to_sql(&self) -> String {
        match self {
            ColumnDefault::Expression(expression) => format!("DEFAULT {expression}"),
            ColumnDefault::Sequence(sequence) => {
                format!("DEFAULT {}.NEXTVAL", sequence.fully_qualified_name())
            }
            ColumnDefault::Identity {
                start,
                increment,
                order,
            } => {
                let mut sql = format!("IDENTITY START {start} INCREMENT {increment}");
                match order {
                    Some(true) => sql.push_str(" ORDER"),
                    Some(false) => sql.push_str(" NOORDER"),
                    None => {}
                }
                sql
            }
        }
    }
}

/// A constraint declared next to its column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InlineConstraint {
    Unique,
    PrimaryKey,
    ForeignKey {
        table: SchemaObjectIdentifier,
        column: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnInlineConstraint {
    pub name: Option<String>,
    pub constraint: InlineConstraint,
}

impl ColumnInlineConstraint {
    fn to_sql(&self) -> String {
        let mut sql = SqlBuilder::default();
        if let Some(name) = &self.name {
            sql.keyword("CONSTRAINT").raw(quote_part(name));
        }
        match &self.constraint {
            InlineConstraint::Unique => sql.keyword("UNIQUE"),
            InlineConstraint::PrimaryKey => sql.keyword("PRIMARY KEY"),
            InlineConstraint::ForeignKey { table, column } => {
                sql.keyword("FOREIGN KEY REFERENCES").identifier(table);
                if let Some(column) = column {
                    sql.list([quote_part(column)]);
                }
                &mut sql
            }
        };
        sql.finish()
    }
}

/// `WITH MASKING POLICY <policy> [USING (col, ...)]`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMaskingPolicy {
    pub policy: SchemaObjectIdentifier,
    pub using: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableColumn {
    name: String,
    data_type: DataType,
    collate: Option<String>,
    comment: Option<String>,
    default: Option<ColumnDefault>,
    not_null: bool,
    masking_policy: Option<ColumnMaskingPolicy>,
    tags: Vec<TagAssociation>,
    inline_constraint: Option<ColumnInlineConstraint>,
}

impl TableColumn {
    pub fn new(name: impl Into<String>, data_type: DataType) -> TableColumn {
        TableColumn {
            name: name.into(),
            data_type,
            collate: None,
            comment: None,
            default: None,
            not_null: false,
            masking_policy: None,
            tags: vec![],
            inline_constraint: None,
        }
    }

    pub(crate) fn to_sql(&self) -> String {
        let mut sql = SqlBuilder::default();
        sql.raw(quote_part(&self.name))
            .raw(self.data_type.canonical())
            .keyword_string("COLLATE", self.collate.as_deref())
            .keyword_string("COMMENT", self.comment.as_deref());
        if let Some(default) = &self.default {
            sql.raw(default.to_sql());
        }
        sql.keyword_if(self.not_null, "NOT NULL");
        if let Some(masking) = &self.masking_policy {
            sql.keyword("WITH MASKING POLICY").identifier(&masking.policy);
            if !masking.using.is_empty() {
                sql.keyword("USING")
                    .list(masking.using.iter().map(|c| quote_part(c)));
            }
        }
        sql.tags("WITH TAG", &self.tags);
        if let Some(constraint) = &self.inline_constraint {
            sql.raw(constraint.to_sql());
        }
        sql.finish()
    }
}

flags!(TableColumn { not_null });
string_setters!(TableColumn { collate, comment });
setters!(TableColumn {
    default: ColumnDefault,
    masking_policy: ColumnMaskingPolicy,
    inline_constraint: ColumnInlineConstraint,
});
list_setters!(TableColumn { tags: TagAssociation });

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    PrimaryKey,
    ForeignKey {
        table: SchemaObjectIdentifier,
        columns: Vec<String>,
    },
}

/// A table-level constraint over one or more columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutOfLineConstraint {
    pub name: Option<String>,
    pub kind: ConstraintKind,
    pub columns: Vec<String>,
}

impl OutOfLineConstraint {
    pub fn new(kind: ConstraintKind, columns: Vec<String>) -> OutOfLineConstraint {
        OutOfLineConstraint {
            name: None,
            kind,
            columns,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn to_sql(&self) -> SnowflakeResult<String> {
        if self.columns.is_empty() {
            return Err(SnowflakeError::InvalidRequest(
                "constraint needs at least one column".into(),
            ));
        }
        let mut sql = SqlBuilder::default();
        if let Some(name) = &self.name {
            sql.keyword("CONSTRAINT").raw(quote_part(name));
        }
        let columns = self.columns.iter().map(|c| quote_part(c));
        match &self.kind {
            ConstraintKind::Unique => sql.keyword("UNIQUE").list(columns),
            ConstraintKind::PrimaryKey => sql.keyword("PRIMARY KEY").list(columns),
            ConstraintKind::ForeignKey {
                table,
                columns: referenced,
            } => {
                sql.keyword("FOREIGN KEY")
                    .list(columns)
                    .keyword("REFERENCES")
                    .identifier(table);
                if !referenced.is_empty() {
                    sql.list(referenced.iter().map(|c| quote_part(c)));
                }
                &mut sql
            }
        };
        Ok(sql.finish())
    }
}

/// `WITH ROW ACCESS POLICY <policy> ON (col, ...)`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowAccessPolicyReference {
    pub policy: SchemaObjectIdentifier,
    pub on: Vec<String>,
}

impl RowAccessPolicyReference {
    pub(crate) fn render_into(&self, prefix: &str, sql: &mut SqlBuilder) {
        sql.keyword(prefix)
            .identifier(&self.policy)
            .keyword("ON")
            .list(self.on.iter().map(|c| quote_part(c)));
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateTable {
    id: SchemaObjectIdentifier,
    or_replace: bool,
    transient: bool,
    if_not_exists: bool,
    columns: Vec<TableColumn>,
    constraints: Vec<OutOfLineConstraint>,
    cluster_by: Vec<String>,
    enable_schema_evolution: Option<bool>,
    data_retention_time_in_days: Option<u32>,
    max_data_extension_time_in_days: Option<u32>,
    change_tracking: Option<bool>,
    default_ddl_collation: Option<String>,
    copy_grants: bool,
    row_access_policy: Option<RowAccessPolicyReference>,
    comment: Option<String>,
    tags: Vec<TagAssociation>,
}

impl CreateTable {
    pub fn new(id: SchemaObjectIdentifier, columns: Vec<TableColumn>) -> CreateTable {
        CreateTable {
            id,
            or_replace: false,
            transient: false,
            if_not_exists: false,
            columns,
            constraints: vec![],
            cluster_by: vec![],
            enable_schema_evolution: None,
            data_retention_time_in_days: None,
            max_data_extension_time_in_days: None,
            change_tracking: None,
            default_ddl_collation: None,
            copy_grants: false,
            row_access_policy: None,
            comment: None,
            tags: vec![],
        }
    }
}

flags!(CreateTable { or_replace, transient, if_not_exists, copy_grants });
setters!(CreateTable {
    enable_schema_evolution: bool,
    data_retention_time_in_days: u32,
    max_data_extension_time_in_days: u32,
    change_tracking: bool,
    row_access_policy: RowAccessPolicyReference,
});
string_setters!(CreateTable { default_ddl_collation, comment });
list_setters!(CreateTable {
    constraints: OutOfLineConstraint,
    cluster_by: String,
    tags: TagAssociation,
});

impl Render for CreateTable {
    fn render(&self) -> SnowflakeResult<String> {
        at_most_one(
            "CREATE TABLE",
            &[("OR REPLACE", self.or_replace), ("IF NOT EXISTS", self.if_not_exists)],
        )?;
        if self.columns.is_empty() {
            return Err(SnowflakeError::InvalidRequest(
                "CREATE TABLE needs at least one column".into(),
            ));
        }
        let mut elements: Vec<String> = self.columns.iter().map(TableColumn::to_sql).collect();
        for constraint in &self.constraints {
            elements.push(constraint.to_sql()?);
        }

        let mut sql = SqlBuilder::new("CREATE");
        sql.keyword_if(self.or_replace, "OR REPLACE")
            .keyword_if(self.transient, "TRANSIENT")
            .keyword("TABLE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id)
            .list(elements);
        if !self.cluster_by.is_empty() {
            sql.keyword("CLUSTER BY").list(self.cluster_by.iter().cloned());
        }
        sql.bool_param("ENABLE_SCHEMA_EVOLUTION", self.enable_schema_evolution)
            .opt_param("DATA_RETENTION_TIME_IN_DAYS", self.data_retention_time_in_days)
            .opt_param(
                "MAX_DATA_EXTENSION_TIME_IN_DAYS",
                self.max_data_extension_time_in_days,
            )
            .bool_param("CHANGE_TRACKING", self.change_tracking)
            .string_param("DEFAULT_DDL_COLLATION", self.default_ddl_collation.as_deref())
            .keyword_if(self.copy_grants, "COPY GRANTS")
            .comment(self.comment.as_deref());
        if let Some(policy) = &self.row_access_policy {
            policy.render_into("WITH ROW ACCESS POLICY", &mut sql);
        }
        sql.tags("WITH TAG", &self.tags);
        Ok(sql.finish())
    }
}

/// A change to one or more columns.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnAction {
    Add {
        column: TableColumn,
        if_not_exists: bool,
    },
    Rename {
        old_name: String,
        new_name: String,
    },
    Alter(Vec<ColumnAlteration>),
    SetMaskingPolicy {
        column: String,
        policy: ColumnMaskingPolicy,
        force: bool,
    },
    UnsetMaskingPolicy {
        column: String,
    },
    SetTags {
        column: String,
        tags: Vec<TagAssociation>,
    },
    UnsetTags {
        column: String,
        tags: Vec<SchemaObjectIdentifier>,
    },
    Drop {
        columns: Vec<String>,
        if_exists: bool,
    },
}

/// One `ALTER COLUMN` clause; several can be combined in a single statement.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnAlteration {
    SetDataType { column: String, data_type: DataType },
    SetNotNull { column: String },
    DropNotNull { column: String },
    DropDefault { column: String },
    SetDefaultSequence { column: String, sequence: SchemaObjectIdentifier },
    Comment { column: String, comment: String },
    UnsetComment { column: String },
}

impl ColumnAlteration {
    fn to_sql(&self) -> String {
        let column = |name: &str| format!("COLUMN {}", quote_part(name));
        match self {
            ColumnAlteration::SetDataType { column: c, data_type } => {
                format!("{} SET DATA TYPE {}", column(c), data_type.canonical())
            }
            ColumnAlteration::SetNotNull { column: c } => format!("{} SET NOT NULL", column(c)),
            ColumnAlteration::DropNotNull { column: c } => format!("{} DROP NOT NULL", column(c)),
            ColumnAlteration::DropDefault { column: c } => format!("{} DROP DEFAULT", column(c)),
            ColumnAlteration::SetDefaultSequence { column: c, sequence } => format!(
                "{} SET DEFAULT {}.NEXTVAL",
                column(c),
                sequence.fully_qualified_name()
            ),
            ColumnAlteration::Comment { column: c, comment } => {
                format!("{} COMMENT {}", column(c), quote_string(comment))
            }
            ColumnAlteration::UnsetComment { column: c } => format!("{} UNSET COMMENT", column(c)),
        }
    }
}

impl ColumnAction {
    fn render_into(&self, sql: &mut SqlBuilder) -> SnowflakeResult<()> {
        match self {
            ColumnAction::Add {
                column,
                if_not_exists,
            } => {
                sql.keyword("ADD COLUMN")
                    .keyword_if(*if_not_exists, "IF NOT EXISTS")
                    .raw(column.to_sql());
            }
            ColumnAction::Rename { old_name, new_name } => {
                sql.keyword("RENAME COLUMN")
                    .raw(quote_part(old_name))
                    .keyword("TO")
                    .raw(quote_part(new_name));
            }
            ColumnAction::Alter(alterations) => {
                if alterations.is_empty() {
                    return Err(SnowflakeError::InvalidRequest(
                        "ALTER TABLE ALTER COLUMN needs at least one change".into(),
                    ));
                }
                sql.keyword("ALTER")
                    .comma_separated(alterations.iter().map(ColumnAlteration::to_sql));
            }
            ColumnAction::SetMaskingPolicy {
                column,
                policy,
                force,
            } => {
                sql.keyword("MODIFY COLUMN")
                    .raw(quote_part(column))
                    .keyword("SET MASKING POLICY")
                    .identifier(&policy.policy);
                if !policy.using.is_empty() {
                    sql.keyword("USING")
                        .list(policy.using.iter().map(|c| quote_part(c)));
                }
                sql.keyword_if(*force, "FORCE");
            }
            ColumnAction::UnsetMaskingPolicy { column } => {
                sql.keyword("MODIFY COLUMN")
                    .raw(quote_part(column))
                    .keyword("UNSET MASKING POLICY");
            }
            ColumnAction::SetTags { column, tags } => {
                at_least_one("ALTER TABLE MODIFY COLUMN SET TAG", &[!tags.is_empty()])?;
                sql.keyword("MODIFY COLUMN")
                    .raw(quote_part(column))
                    .set_tags(tags);
            }
            ColumnAction::UnsetTags { column, tags } => {
                at_least_one("ALTER TABLE MODIFY COLUMN UNSET TAG", &[!tags.is_empty()])?;
                sql.keyword("MODIFY COLUMN")
                    .raw(quote_part(column))
                    .unset_tags(tags);
            }
            ColumnAction::Drop { columns, if_exists } => {
                at_least_one("ALTER TABLE DROP COLUMN", &[!columns.is_empty()])?;
                sql.keyword("DROP COLUMN")
                    .keyword_if(*if_exists, "IF EXISTS")
                    .comma_separated(columns.iter().map(|c| quote_part(c)));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstraintAction {
    Add(OutOfLineConstraint),
    Rename { old_name: String, new_name: String },
    Drop { name: String, cascade: bool },
    DropPrimaryKey,
}

/// Columns of an external table are virtual: `<name> <type> AS (<expr>)`.
#[derive(Clone, Debug, PartialEq)]
pub enum ExternalTableColumnAction {
    Add {
        name: String,
        data_type: DataType,
        expression: String,
    },
    Rename {
        old_name: String,
        new_name: String,
    },
    Drop {
        names: Vec<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOptimizationAction {
    /// `ADD SEARCH OPTIMIZATION [ON method(col), ...]`
    Add { on: Vec<String> },
    Drop { on: Vec<String> },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableSet {
    data_retention_time_in_days: Option<u32>,
    max_data_extension_time_in_days: Option<u32>,
    change_tracking: Option<bool>,
    default_ddl_collation: Option<String>,
    enable_schema_evolution: Option<bool>,
    comment: Option<String>,
}

impl TableSet {
    pub fn new() -> TableSet {
        TableSet::default()
    }
}

setters!(TableSet {
    data_retention_time_in_days: u32,
    max_data_extension_time_in_days: u32,
    change_tracking: bool,
    enable_schema_evolution: bool,
});
string_setters!(TableSet { default_ddl_collation, comment });

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableUnset {
    data_retention_time_in_days: bool,
    max_data_extension_time_in_days: bool,
    change_tracking: bool,
    default_ddl_collation: bool,
    enable_schema_evolution: bool,
    comment: bool,
}

impl TableUnset {
    pub fn new() -> TableUnset {
        TableUnset::default()
    }
}

flags!(TableUnset {
    data_retention_time_in_days,
    max_data_extension_time_in_days,
    change_tracking,
    default_ddl_collation,
    enable_schema_evolution,
    comment,
});

/// The single action an ALTER TABLE performs.
#[derive(Clone, Debug, PartialEq)]
pub enum TableAction {
    Rename(SchemaObjectIdentifier),
    Swap(SchemaObjectIdentifier),
    ClusterBy(Vec<String>),
    DropClusteringKey,
    SuspendRecluster,
    ResumeRecluster,
    Column(ColumnAction),
    Constraint(ConstraintAction),
    ExternalTableColumn(ExternalTableColumnAction),
    SearchOptimization(SearchOptimizationAction),
    Set(TableSet),
    Unset(TableUnset),
    SetTags(Vec<TagAssociation>),
    UnsetTags(Vec<SchemaObjectIdentifier>),
    AddRowAccessPolicy(RowAccessPolicyReference),
    DropRowAccessPolicy(SchemaObjectIdentifier),
    DropAllRowAccessPolicies,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AlterTable {
    id: SchemaObjectIdentifier,
    if_exists: bool,
    actions: Vec<TableAction>,
}

impl AlterTable {
    pub fn new(id: SchemaObjectIdentifier) -> AlterTable {
        AlterTable {
            id,
            if_exists: false,
            actions: vec![],
        }
    }

    /// Add an action; rendering fails unless exactly one was added
    pub fn action(mut self, action: TableAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn rename_to(self, id: SchemaObjectIdentifier) -> Self {
        self.action(TableAction::Rename(id))
    }

    pub fn swap_with(self, id: SchemaObjectIdentifier) -> Self {
        self.action(TableAction::Swap(id))
    }

    pub fn column(self, action: ColumnAction) -> Self {
        self.action(TableAction::Column(action))
    }

    pub fn constraint(self, action: ConstraintAction) -> Self {
        self.action(TableAction::Constraint(action))
    }

    pub fn set(self, set: TableSet) -> Self {
        self.action(TableAction::Set(set))
    }

    pub fn unset(self, unset: TableUnset) -> Self {
        self.action(TableAction::Unset(unset))
    }

    pub fn set_tags(self, tags: Vec<TagAssociation>) -> Self {
        self.action(TableAction::SetTags(tags))
    }

    pub fn unset_tags(self, tags: Vec<SchemaObjectIdentifier>) -> Self {
        self.action(TableAction::UnsetTags(tags))
    }
}

flags!(AlterTable { if_exists });

impl Render for AlterTable {
    fn render(&self) -> SnowflakeResult<String> {
        let [action] = self.actions.as_slice() else {
            return Err(SnowflakeError::InvalidRequest(
                ALTER_NEEDS_EXACTLY_ONE_ACTION.to_owned(),
            ));
        };
        let mut sql = SqlBuilder::new("ALTER TABLE");
        sql.keyword_if(self.if_exists, "IF EXISTS").identifier(&self.id);
        match action {
            TableAction::Rename(id) => {
                sql.keyword("RENAME TO").identifier(id);
            }
            TableAction::Swap(id) => {
                sql.keyword("SWAP WITH").identifier(id);
            }
            TableAction::ClusterBy(expressions) => {
                at_least_one("ALTER TABLE CLUSTER BY", &[!expressions.is_empty()])?;
                sql.keyword("CLUSTER BY").list(expressions.iter().cloned());
            }
            TableAction::DropClusteringKey => {
                sql.keyword("DROP CLUSTERING KEY");
            }
            TableAction::SuspendRecluster => {
                sql.keyword("SUSPEND RECLUSTER");
            }
            TableAction::ResumeRecluster => {
                sql.keyword("RESUME RECLUSTER");
            }
            TableAction::Column(action) => action.render_into(&mut sql)?,
            TableAction::Constraint(action) => match action {
                ConstraintAction::Add(constraint) => {
                    sql.keyword("ADD").raw(constraint.to_sql()?);
                }
                ConstraintAction::Rename { old_name, new_name } => {
                    sql.keyword("RENAME CONSTRAINT")
                        .raw(quote_part(old_name))
                        .keyword("TO")
                        .raw(quote_part(new_name));
                }
                ConstraintAction::Drop { name, cascade } => {
                    sql.keyword("DROP CONSTRAINT")
                        .raw(quote_part(name))
                        .keyword_if(*cascade, "CASCADE");
                }
                ConstraintAction::DropPrimaryKey => {
                    sql.keyword("DROP PRIMARY KEY");
                }
            },
            TableAction::ExternalTableColumn(action) => match action {
                ExternalTableColumnAction::Add {
                    name,
                    data_type,
                    expression,
                } => {
                    sql.keyword("ADD COLUMN")
                        .raw(quote_part(name))
                        .raw(data_type.canonical())
                        .keyword("AS")
                        .raw(format!("({expression})"));
                }
                ExternalTableColumnAction::Rename { old_name, new_name } => {
                    sql.keyword("RENAME COLUMN")
                        .raw(quote_part(old_name))
                        .keyword("TO")
                        .raw(quote_part(new_name));
                }
                ExternalTableColumnAction::Drop { names } => {
                    at_least_one("ALTER TABLE DROP COLUMN", &[!names.is_empty()])?;
                    sql.keyword("DROP COLUMN")
                        .comma_separated(names.iter().map(|c| quote_part(c)));
                }
            },
            TableAction::SearchOptimization(action) => {
                let (keyword, on) = match action {
                    SearchOptimizationAction::Add { on } => ("ADD SEARCH OPTIMIZATION", on),
                    SearchOptimizationAction::Drop { on } => ("DROP SEARCH OPTIMIZATION", on),
                };
                sql.keyword(keyword);
                if !on.is_empty() {
                    sql.keyword("ON").comma_separated(on.iter().cloned());
                }
            }
            TableAction::Set(set) => {
                at_least_one(
                    "ALTER TABLE SET",
                    &[
                        set.data_retention_time_in_days.is_some(),
                        set.max_data_extension_time_in_days.is_some(),
                        set.change_tracking.is_some(),
                        set.default_ddl_collation.is_some(),
                        set.enable_schema_evolution.is_some(),
                        set.comment.is_some(),
                    ],
                )?;
                sql.keyword("SET")
                    .opt_param("DATA_RETENTION_TIME_IN_DAYS", set.data_retention_time_in_days)
                    .opt_param(
                        "MAX_DATA_EXTENSION_TIME_IN_DAYS",
                        set.max_data_extension_time_in_days,
                    )
                    .bool_param("CHANGE_TRACKING", set.change_tracking)
                    .string_param("DEFAULT_DDL_COLLATION", set.default_ddl_collation.as_deref())
                    .bool_param("ENABLE_SCHEMA_EVOLUTION", set.enable_schema_evolution)
                    .comment(set.comment.as_deref());
            }
            TableAction::Unset(unset) => {
                sql.checked_unset(
                    "ALTER TABLE UNSET",
                    &[
                        ("DATA_RETENTION_TIME_IN_DAYS", unset.data_retention_time_in_days),
                        (
                            "MAX_DATA_EXTENSION_TIME_IN_DAYS",
                            unset.max_data_extension_time_in_days,
                        ),
                        ("CHANGE_TRACKING", unset.change_tracking),
                        ("DEFAULT_DDL_COLLATION", unset.default_ddl_collation),
                        ("ENABLE_SCHEMA_EVOLUTION", unset.enable_schema_evolution),
                        ("COMMENT", unset.comment),
                    ],
                )?;
            }
            TableAction::SetTags(tags) => {
                at_least_one("ALTER TABLE SET TAG", &[!tags.is_empty()])?;
                sql.set_tags(tags);
            }
            TableAction::UnsetTags(tags) => {
                at_least_one("ALTER TABLE UNSET TAG", &[!tags.is_empty()])?;
                sql.unset_tags(tags);
            }
            TableAction::AddRowAccessPolicy(policy) => {
                policy.render_into("ADD ROW ACCESS POLICY", &mut sql);
            }
            TableAction::DropRowAccessPolicy(policy) => {
                sql.keyword("DROP ROW ACCESS POLICY").identifier(policy);
            }
            TableAction::DropAllRowAccessPolicies => {
                sql.keyword("DROP ALL ROW ACCESS POLICIES");
            }
        }
        Ok(sql.finish())
    }
}

/// One row of `DESCRIBE TABLE` / `DESCRIBE VIEW`.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDetail {
    pub name: String,
    pub data_type: DataType,
    pub kind: Option<String>,
    pub nullable: bool,
    pub default: Option<String>,
    pub primary_key: bool,
    pub unique_key: bool,
    pub check: Option<String>,
    pub expression: Option<String>,
    pub comment: Option<String>,
    pub policy_name: Option<String>,
}

impl FromRow for ColumnDetail {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(ColumnDetail {
            name: row.string("name")?,
            data_type: DataType::normalise_describe(&row.string("type")?)?,
            kind: row.opt_string("kind"),
            nullable: row.opt_bool("null?").unwrap_or(true),
            default: row.opt_string("default"),
            primary_key: row.opt_bool("primary key").unwrap_or(false),
            unique_key: row.opt_bool("unique key").unwrap_or(false),
            check: row.opt_string("check"),
            expression: row.opt_string("expression"),
            comment: row.opt_string("comment"),
            policy_name: row.opt_string("policy name"),
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Tables<'a> {
    client: &'a Client,
}

impl Client {
    pub fn tables(&self) -> Tables<'_> {
        Tables { client: self }
    }
}

impl Tables<'_> {
    pub async fn create(&self, request: &CreateTable) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterTable) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &SchemaObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("TABLE", id, options).await
    }

    pub async fn undrop(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        self.client
            .exec(&UndropStatement {
                noun: "TABLE",
                name: id.fully_qualified_name(),
            })
            .await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<Table>> {
        self.client.show("TABLES", options).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Table> {
        self.client.show_by_id("TABLES", id).await
    }

    pub async fn describe_columns(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Vec<ColumnDetail>> {
        self.client
            .describe_rows("TABLE", id)
            .await?
            .iter()
            .map(ColumnDetail::from_row)
            .collect()
    }
}
