use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};

use crate::errors::{SnowflakeError, SnowflakeResult};

/// One result row as column name -> nullable string, the way Snowflake returns it.
///
/// Column names are matched case-insensitively: SHOW output uses lower case
/// (`created_on`) while table functions use upper case (`POLICY_NAME`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    columns: HashMap<String, Option<String>>,
}

impl Row {
    pub fn new() -> Row {
        Row::default()
    }

    /// Add a non-null column, builder style
    pub fn with(mut self, column: &str, value: impl Into<String>) -> Row {
        self.insert(column, Some(value.into()));
        self
    }

    /// Add a NULL column, builder style
    pub fn with_null(mut self, column: &str) -> Row {
        self.insert(column, None);
        self
    }

    pub fn insert(&mut self, column: &str, value: Option<String>) {
        self.columns.insert(column.to_ascii_lowercase(), value);
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(&column.to_ascii_lowercase())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    fn raw(&self, column: &str) -> SnowflakeResult<Option<&str>> {
        self.columns
            .get(&column.to_ascii_lowercase())
            .map(|value| value.as_deref())
            .ok_or_else(|| SnowflakeError::MissingColumn(column.to_owned()))
    }

    /// The value of a column that must be present; NULL reads as an empty string
    pub fn string(&self, column: &str) -> SnowflakeResult<String> {
        Ok(self.raw(column)?.unwrap_or_default().to_owned())
    }

    /// The value of an optional column; absent, NULL and empty all read as `None`
    pub fn opt_string(&self, column: &str) -> Option<String> {
        match self.raw(column) {
            Ok(Some(value)) if !value.is_empty() => Some(value.to_owned()),
            _ => None,
        }
    }

    pub fn bool(&self, column: &str) -> SnowflakeResult<bool> {
        let value = self.string(column)?;
        parse_bool(&value).ok_or(SnowflakeError::InvalidColumnValue {
            column: column.to_owned(),
            value,
        })
    }

    pub fn opt_bool(&self, column: &str) -> Option<bool> {
        self.opt_string(column).and_then(|v| parse_bool(&v))
    }

    pub fn int(&self, column: &str) -> SnowflakeResult<i64> {
        let value = self.string(column)?;
        parse_int(&value).ok_or(SnowflakeError::InvalidColumnValue {
            column: column.to_owned(),
            value,
        })
    }

    pub fn opt_int(&self, column: &str) -> Option<i64> {
        self.opt_string(column).and_then(|v| parse_int(&v))
    }

    pub fn opt_timestamp(&self, column: &str) -> Option<DateTime<Utc>> {
        self.opt_string(column).and_then(|v| parse_timestamp(&v))
    }

    /// A comma separated list column, as `SHOW` uses for allowed accounts, object types, ...
    pub fn list(&self, column: &str) -> Vec<String> {
        self.opt_string(column)
            .map(|v| split_list(&v))
            .unwrap_or_default()
    }
}

impl FromIterator<(String, Option<String>)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Option<String>)>>(iter: T) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.insert(&column, value);
        }
        row
    }
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "y" | "yes" | "on" | "1" => Some(true),
        "false" | "n" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_int(value: &str) -> Option<i64> {
    let value = value.trim();
    value
        .parse()
        .ok()
        .or_else(|| value.trim_end_matches(".0").parse().ok())
}

/// Split `a, b,c` (optionally wrapped in `[]`) into trimmed, non-empty items.
pub(crate) fn split_list(value: &str) -> Vec<String> {
    let value = value.trim();
    let value = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);
    value
        .split(',')
        .map(|item| item.trim().trim_matches('"').to_owned())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Timestamps arrive as epoch seconds with a fraction from the SQL API
/// (`1700000000.123000000`) and as formatted text from other drivers.
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Some(parsed) = parse_epoch(value) {
        return Some(parsed);
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%d %H:%M:%S %z"] {
        if let Ok(parsed) = DateTime::<FixedOffset>::parse_from_str(value, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

fn parse_epoch(value: &str) -> Option<DateTime<Utc>> {
    // The SQL API may append a time zone offset in minutes: "1700000000.000000000 1440".
    let value = value.split_whitespace().next()?;
    let (seconds, fraction) = value.split_once('.').unwrap_or((value, ""));
    let seconds: i64 = seconds.parse().ok()?;
    if !fraction.chars().all(|c| c.is_ascii_digit()) || fraction.len() > 9 {
        return None;
    }
    let nanos: u32 = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<9}").parse().ok()?
    };
    DateTime::<Utc>::from_timestamp(seconds, nanos)
}

/// Something that can be built from one result row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> SnowflakeResult<Self>;
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn column_lookup_is_case_insensitive() -> SnowflakeResult<()> {
        let row = Row::new().with("POLICY_NAME", "P").with("name", "n");
        assert_eq!(row.string("policy_name")?, "P");
        assert_eq!(row.string("NAME")?, "n");
        assert!(matches!(row.string("missing"), Err(SnowflakeError::MissingColumn(_))));
        Ok(())
    }

    #[test]
    fn nulls_and_empties() -> SnowflakeResult<()> {
        let row = Row::new().with_null("comment").with("owner", "");
        assert_eq!(row.string("comment")?, "");
        assert_eq!(row.opt_string("comment"), None);
        assert_eq!(row.opt_string("owner"), None);
        assert_eq!(row.opt_string("absent"), None);
        Ok(())
    }

    #[test]
    fn coercions() -> SnowflakeResult<()> {
        let row = Row::new()
            .with("a", "true")
            .with("b", "N")
            .with("c", "ON")
            .with("n", "42")
            .with("f", "3.0")
            .with("bad", "maybe")
            .with("list", "[a, \"b\",c]");
        assert!(row.bool("a")?);
        assert!(!row.bool("b")?);
        assert_eq!(row.opt_bool("c"), Some(true));
        assert_eq!(row.int("n")?, 42);
        assert_eq!(row.opt_int("f"), Some(3));
        assert!(matches!(
            row.bool("bad"),
            Err(SnowflakeError::InvalidColumnValue { .. })
        ));
        assert_eq!(row.list("list"), vec!["a", "b", "c"]);
        Ok(())
    }

    #[test]
    fn timestamps() {
        let epoch = parse_timestamp("1700000000.250000000").unwrap();
        assert_eq!(epoch.timestamp(), 1_700_000_000);
        assert_eq!(epoch.timestamp_subsec_millis(), 250);
        let with_offset = parse_timestamp("1700000000.000000000 1440").unwrap();
        assert_eq!(with_offset.timestamp(), 1_700_000_000);
        let text = parse_timestamp("2024-01-02 03:04:05.678 -0800").unwrap();
        assert_eq!(text.year(), 2024);
        assert_eq!(text.hour(), 11);
        assert!(parse_timestamp("yesterday").is_none());
    }
}
