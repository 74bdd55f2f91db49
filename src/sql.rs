//! Rendering requests into SQL text.
//!
//! Every request type implements [`Render`]. Statements are built token by
//! token with [`SqlBuilder`] and joined with single spaces, so the output only
//! depends on the request value.

use std::fmt::Display;

use crate::errors::{SnowflakeError, SnowflakeResult, ALTER_NEEDS_EXACTLY_ONE_ACTION};
use crate::identifiers::ObjectIdentifier;
use crate::objects::common::{In, LimitFrom, Like, TagAssociation};

/// A request that renders to exactly one SQL statement.
pub trait Render {
    fn render(&self) -> SnowflakeResult<String>;
}

/// Quote a string literal, escaping backslashes and single quotes.
pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Wrap a body in `$$` delimiters, used where the text is itself SQL or JSON.
pub fn dollar_quote(value: &str) -> String {
    format!("$${value}$$")
}

pub(crate) fn bool_literal(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Fail unless exactly one of the ALTER actions is set.
pub(crate) fn exactly_one_action(actions: &[bool]) -> SnowflakeResult<()> {
    if actions.iter().filter(|set| **set).count() == 1 {
        Ok(())
    } else {
        Err(SnowflakeError::InvalidRequest(
            ALTER_NEEDS_EXACTLY_ONE_ACTION.to_owned(),
        ))
    }
}

/// Fail when more than one of a group of mutually exclusive options is set.
pub(crate) fn at_most_one(what: &str, options: &[(&str, bool)]) -> SnowflakeResult<()> {
    let set: Vec<&str> = options
        .iter()
        .filter(|(_, set)| *set)
        .map(|(name, _)| *name)
        .collect();
    if set.len() > 1 {
        return Err(SnowflakeError::InvalidRequest(format!(
            "{what}: only one of {} may be set, got {}",
            options.iter().map(|(n, _)| *n).collect::<Vec<_>>().join(", "),
            set.join(", ")
        )));
    }
    Ok(())
}

/// Fail when an UNSET (or similar) clause would be empty.
pub(crate) fn at_least_one(what: &str, options: &[bool]) -> SnowflakeResult<()> {
    if options.iter().any(|set| *set) {
        Ok(())
    } else {
        Err(SnowflakeError::InvalidRequest(format!(
            "{what}: at least one property must be set"
        )))
    }
}

pub(crate) fn required(what: &str, value: &str) -> SnowflakeResult<()> {
    if value.trim().is_empty() {
        Err(SnowflakeError::InvalidRequest(format!("{what} must not be empty")))
    } else {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct SqlBuilder {
    tokens: Vec<String>,
}

impl SqlBuilder {
    pub fn new(head: &str) -> SqlBuilder {
        let mut builder = SqlBuilder::default();
        builder.keyword(head);
        builder
    }

    pub fn keyword(&mut self, keyword: &str) -> &mut Self {
        if !keyword.is_empty() {
            self.tokens.push(keyword.to_owned());
        }
        self
    }

    pub fn keyword_if(&mut self, condition: bool, keyword: &str) -> &mut Self {
        if condition {
            self.keyword(keyword);
        }
        self
    }

    pub fn raw(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if !text.is_empty() {
            self.tokens.push(text);
        }
        self
    }

    pub fn identifier(&mut self, id: &impl ObjectIdentifier) -> &mut Self {
        self.tokens.push(id.fully_qualified_name());
        self
    }

    /// `KEYWORD <id>` when the identifier is present
    pub fn keyword_identifier(
        &mut self,
        keyword: &str,
        id: Option<&impl ObjectIdentifier>,
    ) -> &mut Self {
        if let Some(id) = id {
            self.keyword(keyword).identifier(id);
        }
        self
    }

    pub fn string(&mut self, value: &str) -> &mut Self {
        self.tokens.push(quote_string(value));
        self
    }

    /// `KEYWORD '<value>'` when the value is present
    pub fn keyword_string(&mut self, keyword: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.keyword(keyword).string(value);
        }
        self
    }

    pub fn param(&mut self, key: &str, value: impl Display) -> &mut Self {
        self.tokens.push(format!("{key} = {value}"));
        self
    }

    pub fn opt_param<T: Display>(&mut self, key: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.param(key, value);
        }
        self
    }

    pub fn string_param(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.param(key, quote_string(value));
        }
        self
    }

    pub fn bool_param(&mut self, key: &str, value: Option<bool>) -> &mut Self {
        if let Some(value) = value {
            self.param(key, bool_literal(value));
        }
        self
    }

    pub fn identifier_param(
        &mut self,
        key: &str,
        value: Option<&impl ObjectIdentifier>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.param(key, value.fully_qualified_name());
        }
        self
    }

    /// `KEY = ('a', 'b')`; an explicitly empty list renders as `KEY = ()`
    pub fn string_list_param(&mut self, key: &str, values: Option<&[String]>) -> &mut Self {
        if let Some(values) = values {
            self.param(key, parenthesized(values.iter().map(|v| quote_string(v))));
        }
        self
    }

    /// `(a, b)` built from already rendered items
    pub fn list(&mut self, items: impl IntoIterator<Item = String>) -> &mut Self {
        self.tokens.push(parenthesized(items));
        self
    }

    /// `a, b` built from already rendered items
    pub fn comma_separated(&mut self, items: impl IntoIterator<Item = String>) -> &mut Self {
        let joined = items.into_iter().collect::<Vec<_>>().join(", ");
        self.raw(joined)
    }

    /// `<prefix> (tag = 'value', ...)` when there are tags
    pub fn tags(&mut self, prefix: &str, tags: &[TagAssociation]) -> &mut Self {
        if !tags.is_empty() {
            self.keyword(prefix)
                .list(tags.iter().map(TagAssociation::to_sql));
        }
        self
    }

    /// `SET TAG tag = 'value', ...` as used by ALTER
    pub fn set_tags(&mut self, tags: &[TagAssociation]) -> &mut Self {
        if !tags.is_empty() {
            self.keyword("SET TAG")
                .comma_separated(tags.iter().map(TagAssociation::to_sql));
        }
        self
    }

    /// `UNSET TAG tag, ...` as used by ALTER
    pub fn unset_tags<I: ObjectIdentifier>(&mut self, tags: &[I]) -> &mut Self {
        if !tags.is_empty() {
            self.keyword("UNSET TAG")
                .comma_separated(tags.iter().map(|t| t.fully_qualified_name()));
        }
        self
    }

    /// `UNSET A, B` for the switched-on names; at least one must be on
    pub fn checked_unset(
        &mut self,
        what: &str,
        properties: &[(&str, bool)],
    ) -> SnowflakeResult<&mut Self> {
        let names: Vec<String> = properties
            .iter()
            .filter(|(_, set)| *set)
            .map(|(name, _)| (*name).to_owned())
            .collect();
        if names.is_empty() {
            return Err(SnowflakeError::InvalidRequest(format!(
                "{what}: at least one property must be set"
            )));
        }
        Ok(self.keyword("UNSET").comma_separated(names))
    }

    pub fn comment(&mut self, comment: Option<&str>) -> &mut Self {
        self.string_param("COMMENT", comment)
    }

    pub fn like(&mut self, like: Option<&Like>) -> &mut Self {
        if let Some(like) = like {
            self.keyword("LIKE").string(&like.pattern);
        }
        self
    }

    pub fn in_scope(&mut self, scope: Option<&In>) -> &mut Self {
        if let Some(scope) = scope {
            self.raw(scope.to_sql());
        }
        self
    }

    pub fn starts_with(&mut self, prefix: Option<&str>) -> &mut Self {
        self.keyword_string("STARTS WITH", prefix)
    }

    pub fn limit(&mut self, limit: Option<&LimitFrom>) -> &mut Self {
        if let Some(limit) = limit {
            self.keyword("LIMIT").raw(limit.rows.to_string());
            self.keyword_string("FROM", limit.from.as_deref());
        }
        self
    }

    pub fn finish(&self) -> String {
        self.tokens.join(" ")
    }
}

pub(crate) fn parenthesized(items: impl IntoIterator<Item = String>) -> String {
    format!("({})", items.into_iter().collect::<Vec<_>>().join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::AccountObjectIdentifier;

    #[test]
    fn string_literals_are_escaped() {
        assert_eq!(quote_string("it's"), r"'it\'s'");
        assert_eq!(quote_string(r"a\b"), r"'a\\b'");
        assert_eq!(dollar_quote("{\"a\": 1}"), "$${\"a\": 1}$$");
    }

    #[test]
    fn builder_skips_absent_options() -> SnowflakeResult<()> {
        let id = AccountObjectIdentifier::new("WH")?;
        let sql = SqlBuilder::new("CREATE")
            .keyword_if(true, "OR REPLACE")
            .keyword("WAREHOUSE")
            .keyword_if(false, "IF NOT EXISTS")
            .identifier(&id)
            .opt_param("AUTO_SUSPEND", Some(60))
            .opt_param::<u32>("MAX_CLUSTER_COUNT", None)
            .bool_param("AUTO_RESUME", Some(false))
            .comment(Some("it's"))
            .finish();
        assert_eq!(
            sql,
            r"CREATE OR REPLACE WAREHOUSE WH AUTO_SUSPEND = 60 AUTO_RESUME = false COMMENT = 'it\'s'"
        );
        Ok(())
    }

    #[test]
    fn empty_lists_are_explicit() {
        let empty: Vec<String> = vec![];
        let sql = SqlBuilder::new("SET")
            .string_list_param("ALLOWED_IP_LIST", Some(empty.as_slice()))
            .string_list_param("BLOCKED_IP_LIST", None)
            .finish();
        assert_eq!(sql, "SET ALLOWED_IP_LIST = ()");
    }

    #[test]
    fn action_counting() {
        assert!(exactly_one_action(&[false, true, false]).is_ok());
        for bad in [&[false, false][..], &[true, true][..]] {
            let err = exactly_one_action(bad).unwrap_err();
            assert_eq!(err.to_string(), ALTER_NEEDS_EXACTLY_ONE_ACTION);
        }
        assert!(at_most_one("x", &[("a", true), ("b", true)]).is_err());
        assert!(at_most_one("x", &[("a", true), ("b", false)]).is_ok());
    }
}
