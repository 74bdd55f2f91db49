//! Pieces shared by several object kinds: SHOW refinements, DROP and DESCRIBE
//! statements, tag associations and argument signatures.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::datatypes::DataType;
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{
    quote_part, split_top_level, AccountObjectIdentifier, DatabaseObjectIdentifier,
    ObjectIdentifier, SchemaObjectIdentifier,
};
use crate::row::{FromRow, Row};
use crate::sql::{quote_string, Render, SqlBuilder};

/// A `tag = 'value'` pair attached to a taggable object.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TagAssociation {
    pub name: SchemaObjectIdentifier,
    pub value: String,
}

impl TagAssociation {
    pub fn new(name: SchemaObjectIdentifier, value: impl Into<String>) -> TagAssociation {
        TagAssociation {
            name,
            value: value.into(),
        }
    }

    pub(crate) fn to_sql(&self) -> String {
        format!(
            "{} = {}",
            self.name.fully_qualified_name(),
            quote_string(&self.value)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Like {
    pub pattern: String,
}

/// `IN ACCOUNT | IN DATABASE <db> | IN SCHEMA <db>.<schema>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum In {
    Account,
    Database(AccountObjectIdentifier),
    Schema(DatabaseObjectIdentifier),
}

impl In {
    pub(crate) fn to_sql(&self) -> String {
        match self {
            In::Account => "IN ACCOUNT".to_owned(),
            In::Database(id) => format!("IN DATABASE {}", id.fully_qualified_name()),
            In::Schema(id) => format!("IN SCHEMA {}", id.fully_qualified_name()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LimitFrom {
    pub rows: u32,
    pub from: Option<String>,
}

/// Refinements accepted by `SHOW <objects>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShowOptions {
    pub terse: bool,
    pub like: Option<Like>,
    pub in_scope: Option<In>,
    pub starts_with: Option<String>,
    pub limit: Option<LimitFrom>,
}

impl ShowOptions {
    pub fn new() -> ShowOptions {
        ShowOptions::default()
    }

    pub fn terse(mut self) -> Self {
        self.terse = true;
        self
    }

    pub fn like(mut self, pattern: impl Into<String>) -> Self {
        self.like = Some(Like {
            pattern: pattern.into(),
        });
        self
    }

    pub fn in_account(mut self) -> Self {
        self.in_scope = Some(In::Account);
        self
    }

    pub fn in_database(mut self, database: AccountObjectIdentifier) -> Self {
        self.in_scope = Some(In::Database(database));
        self
    }

    pub fn in_schema(mut self, schema: DatabaseObjectIdentifier) -> Self {
        self.in_scope = Some(In::Schema(schema));
        self
    }

    pub fn starts_with(mut self, prefix: impl Into<String>) -> Self {
        self.starts_with = Some(prefix.into());
        self
    }

    pub fn limit(mut self, rows: u32) -> Self {
        self.limit = Some(LimitFrom { rows, from: None });
        self
    }

    pub fn limit_from(mut self, rows: u32, from: impl Into<String>) -> Self {
        self.limit = Some(LimitFrom {
            rows,
            from: Some(from.into()),
        });
        self
    }
}

/// The SHOW refinements that narrow a listing down to one identifier's siblings.
pub trait ShowScope: ObjectIdentifier {
    fn show_by_id_options(&self) -> ShowOptions;
}

impl ShowScope for AccountObjectIdentifier {
    fn show_by_id_options(&self) -> ShowOptions {
        ShowOptions::new().like(self.name())
    }
}

impl ShowScope for DatabaseObjectIdentifier {
    fn show_by_id_options(&self) -> ShowOptions {
        ShowOptions::new()
            .like(self.name())
            .in_database(self.database_id())
    }
}

impl ShowScope for SchemaObjectIdentifier {
    fn show_by_id_options(&self) -> ShowOptions {
        ShowOptions::new().like(self.name()).in_schema(self.schema_id())
    }
}

pub(crate) struct ShowStatement<'a> {
    pub noun: &'static str,
    pub options: &'a ShowOptions,
}

impl Render for ShowStatement<'_> {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("SHOW")
            .keyword_if(self.options.terse, "TERSE")
            .keyword(self.noun)
            .like(self.options.like.as_ref())
            .in_scope(self.options.in_scope.as_ref())
            .starts_with(self.options.starts_with.as_deref())
            .limit(self.options.limit.as_ref())
            .finish())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropBehavior {
    Cascade,
    Restrict,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DropOptions {
    pub if_exists: bool,
    pub behavior: Option<DropBehavior>,
}

impl DropOptions {
    pub fn new() -> DropOptions {
        DropOptions::default()
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn cascade(mut self) -> Self {
        self.behavior = Some(DropBehavior::Cascade);
        self
    }

    pub fn restrict(mut self) -> Self {
        self.behavior = Some(DropBehavior::Restrict);
        self
    }
}

pub(crate) struct DropStatement<'a> {
    pub noun: &'static str,
    pub name: String,
    pub options: &'a DropOptions,
}

impl Render for DropStatement<'_> {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("DROP")
            .keyword(self.noun)
            .keyword_if(self.options.if_exists, "IF EXISTS")
            .raw(self.name.as_str())
            .keyword_if(self.options.behavior == Some(DropBehavior::Cascade), "CASCADE")
            .keyword_if(self.options.behavior == Some(DropBehavior::Restrict), "RESTRICT")
            .finish())
    }
}

pub(crate) struct DescribeStatement {
    pub noun: &'static str,
    pub name: String,
}

impl Render for DescribeStatement {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("DESCRIBE")
            .keyword(self.noun)
            .raw(self.name.as_str())
            .finish())
    }
}

/// `UNDROP <noun> <name>`
pub(crate) struct UndropStatement {
    pub noun: &'static str,
    pub name: String,
}

impl Render for UndropStatement {
    fn render(&self) -> SnowflakeResult<String> {
        Ok(SqlBuilder::new("UNDROP")
            .keyword(self.noun)
            .raw(self.name.as_str())
            .finish())
    }
}

/// One row of a property-style DESCRIBE.
///
/// Integrations answer with `property_value`/`property_default`, users and
/// stages with `value`/`default`; both spellings are read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub kind: Option<String>,
    pub value: Option<String>,
    pub default: Option<String>,
}

impl FromRow for Property {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(Property {
            name: row.string("property")?,
            kind: row
                .opt_string("property_type")
                .or_else(|| row.opt_string("type")),
            value: row
                .opt_string("property_value")
                .or_else(|| row.opt_string("value")),
            default: row
                .opt_string("property_default")
                .or_else(|| row.opt_string("default")),
        })
    }
}

/// The result of a property-style DESCRIBE, looked up by property name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    properties: Vec<Property>,
    index: HashMap<String, usize>,
}

impl Properties {
    pub(crate) fn from_rows(rows: &[Row]) -> SnowflakeResult<Properties> {
        let properties = rows
            .iter()
            .map(Property::from_row)
            .collect::<SnowflakeResult<Vec<_>>>()?;
        let index = properties
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.to_ascii_uppercase(), i))
            .collect();
        Ok(Properties { properties, index })
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.index
            .get(&name.to_ascii_uppercase())
            .map(|i| &self.properties[*i])
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|p| p.value.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// A row of `SHOW <kind> INTEGRATIONS`; every integration kind answers with these columns.
#[derive(Clone, Debug, PartialEq)]
pub struct Integration {
    pub name: String,
    pub integration_type: Option<String>,
    pub category: Option<String>,
    pub enabled: bool,
    pub comment: Option<String>,
    pub created_on: Option<chrono::DateTime<chrono::Utc>>,
}

impl FromRow for Integration {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(Integration {
            name: row.string("name")?,
            integration_type: row.opt_string("type"),
            category: row.opt_string("category"),
            enabled: row.opt_bool("enabled").unwrap_or(false),
            comment: row.opt_string("comment"),
            created_on: row.opt_timestamp("created_on"),
        })
    }
}

impl crate::client::Identifiable for Integration {
    type Id = AccountObjectIdentifier;

    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::from_trusted(&self.name)
    }
}

/// A named, typed routine or policy argument: `x TIMESTAMP_NTZ`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Argument {
    pub name: String,
    pub data_type: DataType,
}

impl Argument {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Argument {
        Argument {
            name: name.into(),
            data_type,
        }
    }

    pub(crate) fn to_sql(&self) -> String {
        format!("{} {}", quote_part(&self.name), self.data_type.canonical())
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type.canonical_kind())
    }
}

/// Parse a describe signature such as `(x TIMESTAMP_NTZ, "y z" VARCHAR)`.
pub fn parse_signature(signature: &str) -> SnowflakeResult<Vec<Argument>> {
    let trimmed = signature.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| {
            SnowflakeError::InvalidRequest(format!("malformed signature {signature:?}"))
        })?;
    split_top_level(inner)
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (name, data_type) = split_argument(part).ok_or_else(|| {
                SnowflakeError::InvalidRequest(format!("malformed argument {part:?}"))
            })?;
            Ok(Argument {
                name: name.to_owned(),
                data_type: DataType::normalise_describe(data_type)?,
            })
        })
        .collect()
}

fn split_argument(part: &str) -> Option<(&str, &str)> {
    if let Some(rest) = part.strip_prefix('"') {
        let end = rest.find('"')?;
        return Some((&rest[..end], rest[end + 1..].trim()));
    }
    let (name, data_type) = part.split_once(char::is_whitespace)?;
    Some((name, data_type.trim()))
}

pub(crate) fn render_arguments(arguments: &[Argument]) -> String {
    crate::sql::parenthesized(arguments.iter().map(Argument::to_sql))
}

/// The single row returned by `DESCRIBE MASKING POLICY` and `DESCRIBE ROW ACCESS POLICY`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyDescription {
    pub name: String,
    pub signature: Vec<Argument>,
    pub return_type: DataType,
    pub body: String,
}

impl PolicyDescription {
    /// The signature as Snowflake prints it, e.g. `(x TIMESTAMP_NTZ)`
    pub fn signature_text(&self) -> String {
        crate::sql::parenthesized(self.signature.iter().map(ToString::to_string))
    }
}

impl FromRow for PolicyDescription {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(PolicyDescription {
            name: row.string("name")?,
            signature: parse_signature(&row.string("signature")?)?,
            return_type: DataType::normalise_describe(&row.string("return_type")?)?,
            body: row.string("body")?,
        })
    }
}

/// Object types accepted by `ALTER <type> ... SET TAG` and the tag functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Account,
    ApplicationPackage,
    Column,
    CortexSearchService,
    Database,
    DatabaseRole,
    DynamicTable,
    EventTable,
    ExternalTable,
    FailoverGroup,
    Integration,
    MaskingPolicy,
    NetworkPolicy,
    ResourceMonitor,
    Role,
    RowAccessPolicy,
    Schema,
    Secret,
    Sequence,
    Stage,
    Stream,
    Table,
    Tag,
    Task,
    User,
    View,
    Warehouse,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        use ObjectType::*;
        match self {
            Account => "ACCOUNT",
            ApplicationPackage => "APPLICATION PACKAGE",
            Column => "COLUMN",
            CortexSearchService => "CORTEX SEARCH SERVICE",
            Database => "DATABASE",
            DatabaseRole => "DATABASE ROLE",
            DynamicTable => "DYNAMIC TABLE",
            EventTable => "EVENT TABLE",
            ExternalTable => "EXTERNAL TABLE",
            FailoverGroup => "FAILOVER GROUP",
            Integration => "INTEGRATION",
            MaskingPolicy => "MASKING POLICY",
            NetworkPolicy => "NETWORK POLICY",
            ResourceMonitor => "RESOURCE MONITOR",
            Role => "ROLE",
            RowAccessPolicy => "ROW ACCESS POLICY",
            Schema => "SCHEMA",
            Secret => "SECRET",
            Sequence => "SEQUENCE",
            Stage => "STAGE",
            Stream => "STREAM",
            Table => "TABLE",
            Tag => "TAG",
            Task => "TASK",
            User => "USER",
            View => "VIEW",
            Warehouse => "WAREHOUSE",
        }
    }

    /// Whether objects of this type can carry tags
    pub fn is_taggable(&self) -> bool {
        !matches!(self, ObjectType::Tag | ObjectType::ResourceMonitor)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> SnowflakeResult<Self> {
        use ObjectType::*;
        let normalised = s.trim().to_ascii_uppercase().replace('_', " ");
        let all = [
            Account, ApplicationPackage, Column, CortexSearchService, Database, DatabaseRole,
            DynamicTable, EventTable, ExternalTable, FailoverGroup, Integration, MaskingPolicy,
            NetworkPolicy, ResourceMonitor, Role, RowAccessPolicy, Schema, Secret, Sequence,
            Stage, Stream, Table, Tag, Task, User, View, Warehouse,
        ];
        all.into_iter()
            .find(|t| t.as_str() == normalised)
            .ok_or_else(|| SnowflakeError::InvalidRequest(format!("unknown object type {s:?}")))
    }
}
