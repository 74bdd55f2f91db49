use chrono::{DateTime, Utc};

use crate::client::{Client, Identifiable};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::SchemaObjectIdentifier;
use crate::objects::common::{DropOptions, ShowOptions};
use crate::row::{FromRow, Row};
use crate::sql::{at_least_one, at_most_one, exactly_one_action, Render, SqlBuilder};

/// Whether generated values must be strictly increasing across sessions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValuesBehavior {
    Order,
    NoOrder,
}

impl ValuesBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValuesBehavior::Order => "ORDER",
            ValuesBehavior::NoOrder => "NOORDER",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sequence {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub next_value: i64,
    pub interval: i64,
    pub owner: Option<String>,
    pub owner_role_type: Option<String>,
    pub comment: Option<String>,
    pub ordered: bool,
}

impl FromRow for Sequence {
    fn from_row(row: &Row) -> SnowflakeResult<Self> {
        Ok(Sequence {
            created_on: row.opt_timestamp("created_on"),
            name: row.string("name")?,
            database_name: row.string("database_name")?,
            schema_name: row.string("schema_name")?,
            next_value: row.int("next_value")?,
            interval: row.int("interval")?,
            owner: row.opt_string("owner"),
            owner_role_type: row.opt_string("owner_role_type"),
            comment: row.opt_string("comment"),
            ordered: row.opt_bool("ordered").unwrap_or(false),
        })
    }
}

impl Identifiable for Sequence {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::from_trusted(&self.database_name, &self.schema_name, &self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateSequence {
    id: SchemaObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    with: bool,
    start: Option<i64>,
    increment: Option<i64>,
    values_behavior: Option<ValuesBehavior>,
    comment: Option<String>,
}

impl CreateSequence {
    pub fn new(id: SchemaObjectIdentifier) -> CreateSequence {
        CreateSequence {
            id,
            or_replace: false,
            if_not_exists: false,
            with: false,
            start: None,
            increment: None,
            values_behavior: None,
            comment: None,
        }
    }
}

flags!(CreateSequence { or_replace, if_not_exists, with });
setters!(CreateSequence {
    start: i64,
    increment: i64,
    values_behavior: ValuesBehavior,
});
string_setters!(CreateSequence { comment });

impl Render for CreateSequence {
    fn render(&self) -> SnowflakeResult<String> {
        at_most_one(
            "CREATE SEQUENCE",
            &[("OR REPLACE", self.or_replace), ("IF NOT EXISTS", self.if_not_exists)],
        )?;
        Ok(SqlBuilder::new("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("SEQUENCE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(&self.id)
            .keyword_if(self.with, "WITH")
            .opt_param("START", self.start)
            .opt_param("INCREMENT", self.increment)
            .keyword(self.values_behavior.map(|v| v.as_str()).unwrap_or_default())
            .comment(self.comment.as_deref())
            .finish())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceSet {
    values_behavior: Option<ValuesBehavior>,
    comment: Option<String>,
}

impl SequenceSet {
    pub fn new() -> SequenceSet {
        SequenceSet::default()
    }
}

setters!(SequenceSet { values_behavior: ValuesBehavior });
string_setters!(SequenceSet { comment });

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlterSequence {
    id: SchemaObjectIdentifier,
    if_exists: bool,
    rename_to: Option<SchemaObjectIdentifier>,
    set_increment: Option<i64>,
    set: Option<SequenceSet>,
    unset_comment: bool,
}

impl AlterSequence {
    pub fn new(id: SchemaObjectIdentifier) -> AlterSequence {
        AlterSequence {
            id,
            if_exists: false,
            rename_to: None,
            set_increment: None,
            set: None,
            unset_comment: false,
        }
    }
}

flags!(AlterSequence { if_exists, unset_comment });
setters!(AlterSequence {
    rename_to: SchemaObjectIdentifier,
    set_increment: i64,
    set: SequenceSet,
});

impl Render for AlterSequence {
    fn render(&self) -> SnowflakeResult<String> {
        exactly_one_action(&[
            self.rename_to.is_some(),
            self.set_increment.is_some(),
            self.set.is_some(),
            self.unset_comment,
        ])?;
        let mut sql = SqlBuilder::new("ALTER SEQUENCE");
        sql.keyword_if(self.if_exists, "IF EXISTS")
            .identifier(&self.id)
            .keyword_identifier("RENAME TO", self.rename_to.as_ref())
            .keyword_if(self.set_increment.is_some(), "SET")
            .opt_param("INCREMENT", self.set_increment);
        if let Some(set) = &self.set {
            at_least_one(
                "ALTER SEQUENCE SET",
                &[set.values_behavior.is_some(), set.comment.is_some()],
            )?;
            sql.keyword("SET")
                .keyword(set.values_behavior.map(|v| v.as_str()).unwrap_or_default())
                .comment(set.comment.as_deref());
        }
        sql.keyword_if(self.unset_comment, "UNSET COMMENT");
        Ok(sql.finish())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Sequences<'a> {
    client: &'a Client,
}

impl Client {
    pub fn sequences(&self) -> Sequences<'_> {
        Sequences { client: self }
    }
}

impl Sequences<'_> {
    pub async fn create(&self, request: &CreateSequence) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn alter(&self, request: &AlterSequence) -> SnowflakeResult<()> {
        self.client.exec(request).await
    }

    pub async fn drop(&self, id: &SchemaObjectIdentifier, options: &DropOptions) -> SnowflakeResult<()> {
        self.client.drop_object("SEQUENCE", id, options).await
    }

    pub async fn show(&self, options: &ShowOptions) -> SnowflakeResult<Vec<Sequence>> {
        self.client.show("SEQUENCES", options).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Sequence> {
        self.client.show_by_id("SEQUENCES", id).await
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Sequence> {
        let rows = self.client.describe_rows("SEQUENCE", id).await?;
        Sequence::from_row(rows.first().ok_or(SnowflakeError::EmptyResult)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;

    fn id() -> SnowflakeResult<SchemaObjectIdentifier> {
        SchemaObjectIdentifier::new("DB", "SC", "SEQ")
    }

    #[test]
    fn create_with_values_behavior() -> SnowflakeResult<()> {
        assert_eq!(
            CreateSequence::new(id()?)
                .or_replace()
                .with()
                .start(1)
                .increment(2)
                .values_behavior(ValuesBehavior::NoOrder)
                .comment("ids")
                .render()?,
            "CREATE OR REPLACE SEQUENCE DB.SC.SEQ WITH START = 1 INCREMENT = 2 NOORDER COMMENT = 'ids'"
        );
        assert_eq!(
            CreateSequence::new(id()?).render()?,
            "CREATE SEQUENCE DB.SC.SEQ"
        );
        Ok(())
    }

    #[test]
    fn alter_actions() -> SnowflakeResult<()> {
        assert_eq!(
            AlterSequence::new(id()?).set_increment(5).render()?,
            "ALTER SEQUENCE DB.SC.SEQ SET INCREMENT = 5"
        );
        assert_eq!(
            AlterSequence::new(id()?)
                .set(SequenceSet::new().values_behavior(ValuesBehavior::Order).comment("c"))
                .render()?,
            "ALTER SEQUENCE DB.SC.SEQ SET ORDER COMMENT = 'c'"
        );
        assert!(AlterSequence::new(id()?).unset_comment().set_increment(1).render().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn show_by_id_reads_ordered_flag() -> SnowflakeResult<()> {
        let driver = FakeDriver::new().with_rows(
            "SHOW SEQUENCES LIKE 'SEQ' IN SCHEMA DB.SC",
            vec![Row::new()
                .with("name", "SEQ")
                .with("database_name", "DB")
                .with("schema_name", "SC")
                .with("next_value", "1")
                .with("interval", "2")
                .with("ordered", "N")],
        );
        let sequence = Client::new(driver).sequences().show_by_id(&id()?).await?;
        assert_eq!(sequence.interval, 2);
        assert!(!sequence.ordered);
        Ok(())
    }
}
