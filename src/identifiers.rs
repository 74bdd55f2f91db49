//! Qualified names for Snowflake objects.
//!
//! Every object lives at one of three depths: directly in the account
//! (databases, warehouses, roles, integrations, ...), inside a database
//! (schemas, database roles) or inside a schema (tables, views, tasks, ...).
//! Overloadable routines additionally carry their argument types.
//!
//! Parts are stored unescaped. Rendering quotes a part unless it is a plain
//! upper-case identifier, doubling any embedded `"`; parsing undoes exactly
//! that, so `parse(render(id)) == id` for every valid identifier.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::datatypes::DataType;
use crate::errors::{SnowflakeError, SnowflakeResult};

/// Words that must stay quoted even when they look like bare identifiers.
const RESERVED_WORDS: &[&str] = &[
    "ACCOUNT", "ALL", "ALTER", "AND", "ANY", "AS", "BETWEEN", "BY", "CASE", "CAST", "CHECK",
    "COLUMN", "CONNECT", "CONNECTION", "CONSTRAINT", "CREATE", "CROSS", "CURRENT",
    "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER", "DATABASE", "DELETE",
    "DISTINCT", "DROP", "ELSE", "EXISTS", "FALSE", "FOLLOWING", "FOR", "FROM", "FULL", "GRANT",
    "GROUP", "GSCLUSTER", "HAVING", "ILIKE", "IN", "INCREMENT", "INNER", "INSERT", "INTERSECT",
    "INTO", "IS", "ISSUE", "JOIN", "LATERAL", "LEFT", "LIKE", "LOCALTIME", "LOCALTIMESTAMP",
    "MINUS", "NATURAL", "NOT", "NULL", "OF", "ON", "OR", "ORDER", "ORGANIZATION", "QUALIFY",
    "REGEXP", "REVOKE", "RIGHT", "RLIKE", "ROW", "ROWS", "SAMPLE", "SCHEMA", "SELECT", "SET",
    "SOME", "START", "TABLE", "TABLESAMPLE", "THEN", "TO", "TRIGGER", "TRUE", "TRY_CAST",
    "UNION", "UNIQUE", "UPDATE", "USING", "VALUES", "VIEW", "WHEN", "WHENEVER", "WHERE", "WITH",
];

fn is_bare(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        && !RESERVED_WORDS.contains(&part)
}

/// Render one name part, quoting it unless it is a plain upper-case identifier.
pub fn quote_part(part: &str) -> String {
    if is_bare(part) {
        part.to_owned()
    } else {
        format!("\"{}\"", part.replace('"', "\"\""))
    }
}

/// Trim one surrounding pair of quotes (each side independently) and reject empty parts.
fn normalize_part(part: &str) -> SnowflakeResult<String> {
    let trimmed = trim_quotes(part);
    if trimmed.is_empty() {
        return Err(SnowflakeError::invalid_identifier(format!(
            "empty identifier part in {part:?}"
        )));
    }
    Ok(trimmed.to_owned())
}

fn trim_quotes(part: &str) -> &str {
    let part = part.strip_prefix('"').unwrap_or(part);
    part.strip_suffix('"').unwrap_or(part)
}

/// Split a dotted name into its unescaped parts.
///
/// Dots inside a quoted part do not split; `""` inside a quoted part is an
/// escaped quote. A quote anywhere else is rejected.
pub fn parse_identifier_parts(input: &str) -> SnowflakeResult<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();
    // Whether the part being read started with a quote, and whether it has closed.
    let mut quoted = false;
    let mut closed = false;
    let mut at_part_start = true;

    while let Some(c) = chars.next() {
        if quoted && !closed {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    closed = true;
                }
            } else {
                current.push(c);
            }
            continue;
        }
        match c {
            '.' => {
                parts.push(std::mem::take(&mut current));
                quoted = false;
                closed = false;
                at_part_start = true;
                continue;
            }
            '"' if at_part_start => quoted = true,
            '"' => return Err(SnowflakeError::invalid_identifier("unexpected '\"'")),
            _ if closed => {
                return Err(SnowflakeError::invalid_identifier(format!(
                    "unexpected {c:?} after closing '\"'"
                )))
            }
            _ => current.push(c),
        }
        at_part_start = false;
    }
    if quoted && !closed {
        return Err(SnowflakeError::invalid_identifier("unexpected '\"'"));
    }
    parts.push(current);

    if parts.iter().any(|p| p.is_empty()) {
        return Err(SnowflakeError::invalid_identifier(format!(
            "empty identifier part in {input:?}"
        )));
    }
    Ok(parts)
}

fn parse_exact<const N: usize>(input: &str, what: &str) -> SnowflakeResult<[String; N]> {
    let parts = parse_identifier_parts(input)?;
    let len = parts.len();
    parts.try_into().map_err(|_| {
        SnowflakeError::invalid_identifier(format!(
            "{what} identifier needs {N} part(s), got {len} in {input:?}"
        ))
    })
}

/// Common surface of every identifier tier.
pub trait ObjectIdentifier: Clone + fmt::Debug + PartialEq + Eq + std::hash::Hash {
    /// The unescaped rightmost part
    fn name(&self) -> &str;

    /// Dot-joined parts, each quoted as needed
    fn fully_qualified_name(&self) -> String;
}

/// An object that lives directly in the account: database, warehouse, role, user, ...
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountObjectIdentifier {
    name: String,
}

impl AccountObjectIdentifier {
    pub fn new(name: impl AsRef<str>) -> SnowflakeResult<Self> {
        Ok(Self {
            name: normalize_part(name.as_ref())?,
        })
    }

    /// Build from a name Snowflake returned, applying the same trimming as [`Self::new`].
    pub(crate) fn from_trusted(name: &str) -> Self {
        Self {
            name: trim_quotes(name).to_owned(),
        }
    }

    pub fn database_object(&self, name: impl AsRef<str>) -> SnowflakeResult<DatabaseObjectIdentifier> {
        DatabaseObjectIdentifier::new(&self.name, name)
    }
}

impl ObjectIdentifier for AccountObjectIdentifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn fully_qualified_name(&self) -> String {
        quote_part(&self.name)
    }
}

/// An object inside a database: schema or database role.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatabaseObjectIdentifier {
    database: String,
    name: String,
}

impl DatabaseObjectIdentifier {
    pub fn new(database: impl AsRef<str>, name: impl AsRef<str>) -> SnowflakeResult<Self> {
        Ok(Self {
            database: normalize_part(database.as_ref())?,
            name: normalize_part(name.as_ref())?,
        })
    }

    pub(crate) fn from_trusted(database: &str, name: &str) -> Self {
        Self {
            database: trim_quotes(database).to_owned(),
            name: trim_quotes(name).to_owned(),
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    pub fn database_id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier {
            name: self.database.clone(),
        }
    }

    /// An object in the schema this identifier names
    pub fn schema_object(&self, name: impl AsRef<str>) -> SnowflakeResult<SchemaObjectIdentifier> {
        SchemaObjectIdentifier::new(&self.database, &self.name, name)
    }
}

impl ObjectIdentifier for DatabaseObjectIdentifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn fully_qualified_name(&self) -> String {
        format!("{}.{}", quote_part(&self.database), quote_part(&self.name))
    }
}

/// An object inside a schema: table, view, stream, task, policy, ...
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaObjectIdentifier {
    database: String,
    schema: String,
    name: String,
}

impl SchemaObjectIdentifier {
    pub fn new(
        database: impl AsRef<str>,
        schema: impl AsRef<str>,
        name: impl AsRef<str>,
    ) -> SnowflakeResult<Self> {
        Ok(Self {
            database: normalize_part(database.as_ref())?,
            schema: normalize_part(schema.as_ref())?,
            name: normalize_part(name.as_ref())?,
        })
    }

    pub(crate) fn from_trusted(database: &str, schema: &str, name: &str) -> Self {
        Self {
            database: trim_quotes(database).to_owned(),
            schema: trim_quotes(schema).to_owned(),
            name: trim_quotes(name).to_owned(),
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    pub fn database_id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier {
            name: self.database.clone(),
        }
    }

    pub fn schema_id(&self) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier {
            database: self.database.clone(),
            name: self.schema.clone(),
        }
    }

    pub fn with_arguments(&self, arguments: Vec<DataType>) -> SchemaObjectIdentifierWithArguments {
        SchemaObjectIdentifierWithArguments {
            database: self.database.clone(),
            schema: self.schema.clone(),
            name: self.name.clone(),
            arguments,
        }
    }

    pub fn column(&self, column: impl AsRef<str>) -> SnowflakeResult<TableColumnIdentifier> {
        Ok(TableColumnIdentifier {
            table: self.clone(),
            column: normalize_part(column.as_ref())?,
        })
    }
}

impl ObjectIdentifier for SchemaObjectIdentifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn fully_qualified_name(&self) -> String {
        format!(
            "{}.{}.{}",
            quote_part(&self.database),
            quote_part(&self.schema),
            quote_part(&self.name)
        )
    }
}

/// A schema object that is addressed together with its argument types (functions, procedures).
///
/// Snowflake resolves overloads by argument kind only, so `NUMBER(10,2)` and
/// `NUMBER` name the same routine. Equality and hashing follow that.
#[derive(Clone, Debug)]
pub struct SchemaObjectIdentifierWithArguments {
    database: String,
    schema: String,
    name: String,
    arguments: Vec<DataType>,
}

impl SchemaObjectIdentifierWithArguments {
    pub fn new(
        database: impl AsRef<str>,
        schema: impl AsRef<str>,
        name: impl AsRef<str>,
        arguments: Vec<DataType>,
    ) -> SnowflakeResult<Self> {
        Ok(SchemaObjectIdentifier::new(database, schema, name)?.with_arguments(arguments))
    }

    pub fn arguments(&self) -> &[DataType] {
        &self.arguments
    }

    pub fn schema_object_id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier {
            database: self.database.clone(),
            schema: self.schema.clone(),
            name: self.name.clone(),
        }
    }

    pub fn schema_id(&self) -> DatabaseObjectIdentifier {
        self.schema_object_id().schema_id()
    }

    fn argument_kinds(&self) -> impl Iterator<Item = String> + '_ {
        self.arguments.iter().map(argument_kind)
    }
}

/// How an argument appears in a routine reference. VECTOR keeps its
/// parameters since a bare `VECTOR` does not parse.
fn argument_kind(data_type: &DataType) -> String {
    match data_type {
        DataType::Vector { .. } => data_type.canonical(),
        other => other.canonical_kind().to_owned(),
    }
}

impl PartialEq for SchemaObjectIdentifierWithArguments {
    fn eq(&self, other: &Self) -> bool {
        self.database == other.database
            && self.schema == other.schema
            && self.name == other.name
            && self.argument_kinds().eq(other.argument_kinds())
    }
}

impl Eq for SchemaObjectIdentifierWithArguments {}

impl Hash for SchemaObjectIdentifierWithArguments {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.database.hash(state);
        self.schema.hash(state);
        self.name.hash(state);
        for kind in self.argument_kinds() {
            kind.hash(state);
        }
    }
}

impl ObjectIdentifier for SchemaObjectIdentifierWithArguments {
    fn name(&self) -> &str {
        &self.name
    }

    fn fully_qualified_name(&self) -> String {
        let arguments = self.argument_kinds().collect::<Vec<_>>().join(", ");
        format!("{}({})", self.schema_object_id().fully_qualified_name(), arguments)
    }
}

/// A column of a table or view, used for column-level tagging.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableColumnIdentifier {
    table: SchemaObjectIdentifier,
    column: String,
}

impl TableColumnIdentifier {
    pub fn table_id(&self) -> &SchemaObjectIdentifier {
        &self.table
    }
}

impl ObjectIdentifier for TableColumnIdentifier {
    fn name(&self) -> &str {
        &self.column
    }

    fn fully_qualified_name(&self) -> String {
        format!("{}.{}", self.table.fully_qualified_name(), quote_part(&self.column))
    }
}

/// `<organization>.<account>`, as used by replication.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AccountIdentifier {
    organization: String,
    account: String,
}

impl AccountIdentifier {
    pub fn new(organization: impl AsRef<str>, account: impl AsRef<str>) -> SnowflakeResult<Self> {
        Ok(Self {
            organization: normalize_part(organization.as_ref())?,
            account: normalize_part(account.as_ref())?,
        })
    }

    pub fn organization_name(&self) -> &str {
        &self.organization
    }

    pub fn account_name(&self) -> &str {
        &self.account
    }
}

impl ObjectIdentifier for AccountIdentifier {
    fn name(&self) -> &str {
        &self.account
    }

    fn fully_qualified_name(&self) -> String {
        format!("{}.{}", quote_part(&self.organization), quote_part(&self.account))
    }
}

/// An account object living in another account: `<organization>.<account>.<name>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExternalObjectIdentifier {
    account: AccountIdentifier,
    object: AccountObjectIdentifier,
}

impl ExternalObjectIdentifier {
    pub fn new(account: AccountIdentifier, object: AccountObjectIdentifier) -> Self {
        Self { account, object }
    }

    pub fn account_identifier(&self) -> &AccountIdentifier {
        &self.account
    }

    pub fn object_identifier(&self) -> &AccountObjectIdentifier {
        &self.object
    }
}

impl ObjectIdentifier for ExternalObjectIdentifier {
    fn name(&self) -> &str {
        self.object.name()
    }

    fn fully_qualified_name(&self) -> String {
        format!(
            "{}.{}",
            self.account.fully_qualified_name(),
            self.object.fully_qualified_name()
        )
    }
}

/// Any identifier tier, for statements that accept objects of every depth.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AnyObjectIdentifier {
    Account(AccountObjectIdentifier),
    Database(DatabaseObjectIdentifier),
    Schema(SchemaObjectIdentifier),
    SchemaWithArguments(SchemaObjectIdentifierWithArguments),
    Column(TableColumnIdentifier),
}

impl AnyObjectIdentifier {
    pub fn fully_qualified_name(&self) -> String {
        match self {
            AnyObjectIdentifier::Account(id) => id.fully_qualified_name(),
            AnyObjectIdentifier::Database(id) => id.fully_qualified_name(),
            AnyObjectIdentifier::Schema(id) => id.fully_qualified_name(),
            AnyObjectIdentifier::SchemaWithArguments(id) => id.fully_qualified_name(),
            AnyObjectIdentifier::Column(id) => id.fully_qualified_name(),
        }
    }
}

impl From<AccountObjectIdentifier> for AnyObjectIdentifier {
    fn from(id: AccountObjectIdentifier) -> Self {
        AnyObjectIdentifier::Account(id)
    }
}

impl From<DatabaseObjectIdentifier> for AnyObjectIdentifier {
    fn from(id: DatabaseObjectIdentifier) -> Self {
        AnyObjectIdentifier::Database(id)
    }
}

impl From<SchemaObjectIdentifier> for AnyObjectIdentifier {
    fn from(id: SchemaObjectIdentifier) -> Self {
        AnyObjectIdentifier::Schema(id)
    }
}

impl From<SchemaObjectIdentifierWithArguments> for AnyObjectIdentifier {
    fn from(id: SchemaObjectIdentifierWithArguments) -> Self {
        AnyObjectIdentifier::SchemaWithArguments(id)
    }
}

impl From<TableColumnIdentifier> for AnyObjectIdentifier {
    fn from(id: TableColumnIdentifier) -> Self {
        AnyObjectIdentifier::Column(id)
    }
}

macro_rules! impl_display {
    ($($ty: ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.fully_qualified_name())
                }
            }
        )*
    };
}
impl_display!(
    AccountObjectIdentifier,
    DatabaseObjectIdentifier,
    SchemaObjectIdentifier,
    SchemaObjectIdentifierWithArguments,
    TableColumnIdentifier,
    AccountIdentifier,
    ExternalObjectIdentifier,
    AnyObjectIdentifier
);

impl FromStr for AccountObjectIdentifier {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> SnowflakeResult<Self> {
        let [name] = parse_exact::<1>(s, "account object")?;
        Ok(Self { name })
    }
}

impl FromStr for DatabaseObjectIdentifier {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> SnowflakeResult<Self> {
        let [database, name] = parse_exact::<2>(s, "database object")?;
        Ok(Self { database, name })
    }
}

impl FromStr for SchemaObjectIdentifier {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> SnowflakeResult<Self> {
        let [database, schema, name] = parse_exact::<3>(s, "schema object")?;
        Ok(Self {
            database,
            schema,
            name,
        })
    }
}

impl FromStr for TableColumnIdentifier {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> SnowflakeResult<Self> {
        let [database, schema, name, column] = parse_exact::<4>(s, "table column")?;
        Ok(Self {
            table: SchemaObjectIdentifier {
                database,
                schema,
                name,
            },
            column,
        })
    }
}

impl FromStr for AccountIdentifier {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> SnowflakeResult<Self> {
        let [organization, account] = parse_exact::<2>(s, "account")?;
        Ok(Self {
            organization,
            account,
        })
    }
}

impl FromStr for ExternalObjectIdentifier {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> SnowflakeResult<Self> {
        let [organization, account, name] = parse_exact::<3>(s, "external object")?;
        Ok(Self {
            account: AccountIdentifier {
                organization,
                account,
            },
            object: AccountObjectIdentifier { name },
        })
    }
}

impl FromStr for SchemaObjectIdentifierWithArguments {
    type Err = SnowflakeError;

    /// Parses `db.schema.name(TYPE, TYPE)`; the argument list is required.
    fn from_str(s: &str) -> SnowflakeResult<Self> {
        let open = find_unquoted(s, '(').ok_or_else(|| {
            SnowflakeError::invalid_identifier(format!("missing argument list in {s:?}"))
        })?;
        let inner = s[open + 1..].strip_suffix(')').ok_or_else(|| {
            SnowflakeError::invalid_identifier(format!("unterminated argument list in {s:?}"))
        })?;
        let id: SchemaObjectIdentifier = s[..open].parse()?;
        let arguments = split_top_level(inner)
            .into_iter()
            .filter(|a| !a.trim().is_empty())
            .map(|a| a.parse::<DataType>())
            .collect::<SnowflakeResult<Vec<_>>>()?;
        Ok(id.with_arguments(arguments))
    }
}

fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c == needle && !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split on commas that are not nested in parentheses.
pub(crate) fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_trim_quotes() -> SnowflakeResult<()> {
        let id = AccountObjectIdentifier::new("\"abc\"")?;
        assert_eq!(id.name(), "abc");
        let id = SchemaObjectIdentifier::new("\"DB\"", "SC", "\"a\"\"bc\"")?;
        assert_eq!(id.database_name(), "DB");
        assert_eq!(id.name(), "a\"\"bc");
        Ok(())
    }

    #[test]
    fn constructors_reject_empty_parts() {
        for bad in ["", "\"", "\"\""] {
            let err = AccountObjectIdentifier::new(bad).unwrap_err();
            assert!(err.to_string().contains("invalid object identifier"), "{bad:?}");
        }
        assert!(DatabaseObjectIdentifier::new("DB", "").is_err());
        assert!(SchemaObjectIdentifier::new("DB", "\"", "T").is_err());
    }

    #[test]
    fn bare_parts_render_without_quotes() -> SnowflakeResult<()> {
        let id = SchemaObjectIdentifier::new("DB", "PUBLIC", "MY_TABLE_1")?;
        assert_eq!(id.fully_qualified_name(), "DB.PUBLIC.MY_TABLE_1");
        let id = DatabaseObjectIdentifier::new("_X", "A1")?;
        assert_eq!(id.fully_qualified_name(), "_X.A1");
        Ok(())
    }

    #[test]
    fn other_parts_render_quoted() -> SnowflakeResult<()> {
        let id = SchemaObjectIdentifier::new("db", "1SC", "a-b")?;
        assert_eq!(id.fully_qualified_name(), "\"db\".\"1SC\".\"a-b\"");
        let id = AccountObjectIdentifier::new("a\"bc")?;
        assert_eq!(id.fully_qualified_name(), "\"a\"\"bc\"");
        let id = AccountObjectIdentifier::new("TABLE")?;
        assert_eq!(id.fully_qualified_name(), "\"TABLE\"");
        Ok(())
    }

    #[test]
    fn dot_inside_quotes() -> SnowflakeResult<()> {
        let id: AccountObjectIdentifier = "\".\"".parse()?;
        assert_eq!(id.name(), ".");
        assert_eq!(id.fully_qualified_name(), "\".\"");
        Ok(())
    }

    #[test]
    fn escaped_quote_round_trip() -> SnowflakeResult<()> {
        let id: AccountObjectIdentifier = "\"a\"\"bc\"".parse()?;
        assert_eq!(id.name(), "a\"bc");
        assert_eq!(id.name().chars().count(), 3);
        assert_eq!(id.fully_qualified_name(), "\"a\"\"bc\"");
        Ok(())
    }

    #[test]
    fn bare_quote_rejected() {
        let err = "a\"bc".parse::<AccountObjectIdentifier>().unwrap_err();
        assert!(err.to_string().contains("unexpected '\"'"));
        let err = "\"abc".parse::<AccountObjectIdentifier>().unwrap_err();
        assert!(err.to_string().contains("unexpected '\"'"));
    }

    #[test]
    fn empty_parts_rejected_by_parser() {
        for bad in ["", "a..b", "a.", ".a", "\"\".a"] {
            let err = parse_identifier_parts(bad).unwrap_err();
            assert!(err.to_string().contains("invalid object identifier"), "{bad:?}");
        }
    }

    #[test]
    fn arity_is_checked() {
        assert!("a.b".parse::<AccountObjectIdentifier>().is_err());
        assert!("a.b.c".parse::<DatabaseObjectIdentifier>().is_err());
        assert!("a.b".parse::<SchemaObjectIdentifier>().is_err());
    }

    #[test]
    fn uppercase_canonicalisation() -> SnowflakeResult<()> {
        let sent = DatabaseObjectIdentifier::new("\"ABC\"", "\"ABC\"")?;
        let returned: DatabaseObjectIdentifier = "ABC.ABC".parse()?;
        assert_eq!(sent, returned);
        assert_eq!(returned.fully_qualified_name(), "ABC.ABC");
        let lower = DatabaseObjectIdentifier::new("abc", "abc")?;
        assert_ne!(sent, lower);
        Ok(())
    }

    #[test]
    fn parse_render_round_trip() -> SnowflakeResult<()> {
        let names = ["ABC", "abc", "a\"bc", ".", "a.b", "1X", "_", "with space", "\"\"q", "SELECT"];
        for database in names {
            for name in names {
                let id = SchemaObjectIdentifier::new(database, "S\"", name);
                // Leading/trailing quotes are trimmed by the constructor, so skip those inputs.
                let Ok(id) = id else { continue };
                let rendered = id.fully_qualified_name();
                assert_eq!(rendered.parse::<SchemaObjectIdentifier>()?, id, "{rendered}");
                assert_eq!(id.fully_qualified_name(), rendered);
            }
        }
        Ok(())
    }

    #[test]
    fn arguments_identifier() -> SnowflakeResult<()> {
        let id: SchemaObjectIdentifierWithArguments =
            "DB.SC.\"my.fn\"(NUMBER, VARCHAR(20), NUMBER(10,2))".parse()?;
        assert_eq!(id.name(), "my.fn");
        assert_eq!(id.arguments().len(), 3);
        assert_eq!(
            id.fully_qualified_name(),
            "DB.SC.\"my.fn\"(NUMBER, VARCHAR, NUMBER)"
        );
        let reparsed: SchemaObjectIdentifierWithArguments = id.fully_qualified_name().parse()?;
        assert_eq!(reparsed, id);
        let no_args: SchemaObjectIdentifierWithArguments = "DB.SC.FN()".parse()?;
        assert!(no_args.arguments().is_empty());
        assert_eq!(no_args.fully_qualified_name(), "DB.SC.FN()");
        Ok(())
    }

    #[test]
    fn parameterised_arguments_round_trip() -> SnowflakeResult<()> {
        use std::collections::HashSet;

        let id: SchemaObjectIdentifierWithArguments =
            "DB.SC.F(NUMBER(10,2), VARCHAR(20), VECTOR(FLOAT, 8))".parse()?;
        let rendered = id.fully_qualified_name();
        assert_eq!(rendered, "DB.SC.F(NUMBER, VARCHAR, VECTOR(FLOAT, 8))");
        let reparsed: SchemaObjectIdentifierWithArguments = rendered.parse()?;
        assert_eq!(reparsed, id);
        assert_eq!(reparsed.fully_qualified_name(), rendered);

        let by_kind = HashSet::from([id.clone(), reparsed]);
        assert_eq!(by_kind.len(), 1);

        let other_overload: SchemaObjectIdentifierWithArguments =
            "DB.SC.F(NUMBER, NUMBER, VECTOR(FLOAT, 8))".parse()?;
        assert_ne!(other_overload, id);
        let other_dimension: SchemaObjectIdentifierWithArguments =
            "DB.SC.F(NUMBER, VARCHAR, VECTOR(FLOAT, 16))".parse()?;
        assert_ne!(other_dimension, id);
        Ok(())
    }

    #[test]
    fn external_and_account_identifiers() -> SnowflakeResult<()> {
        let id: ExternalObjectIdentifier = "ORG.ACCT.fg".parse()?;
        assert_eq!(id.account_identifier().organization_name(), "ORG");
        assert_eq!(id.fully_qualified_name(), "ORG.ACCT.\"fg\"");
        let account = AccountIdentifier::new("ORG", "acct")?;
        assert_eq!(account.fully_qualified_name(), "ORG.\"acct\"");
        Ok(())
    }

    #[test]
    fn column_identifier() -> SnowflakeResult<()> {
        let column = SchemaObjectIdentifier::new("DB", "SC", "T")?.column("id")?;
        assert_eq!(column.fully_qualified_name(), "DB.SC.T.\"id\"");
        assert_eq!(column.fully_qualified_name().parse::<TableColumnIdentifier>()?, column);
        Ok(())
    }
}
