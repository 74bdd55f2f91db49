//! Snowflake data types and their synonyms.
//!
//! Snowflake accepts many spellings for the same type (`INT`, `BIGINT` and
//! `NUMBER(38,0)` are all one type). [`DataType`] keeps only the canonical
//! kind plus its parameters, so two spellings of the same type compare equal
//! and always render the same way.

use std::fmt;
use std::str::FromStr;

use crate::errors::{SnowflakeError, SnowflakeResult};

pub const DEFAULT_NUMBER_PRECISION: u8 = 38;
pub const DEFAULT_NUMBER_SCALE: u8 = 0;
pub const DEFAULT_VARCHAR_LENGTH: u32 = 16_777_216;
pub const DEFAULT_CHAR_LENGTH: u32 = 1;
pub const DEFAULT_BINARY_LENGTH: u32 = 8_388_608;
pub const DEFAULT_TIME_PRECISION: u8 = 9;

/// Session policy deciding what a bare `TIMESTAMP` means (`TIMESTAMP_TYPE_MAPPING`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimestampTypeMapping {
    Ltz,
    #[default]
    Ntz,
    Tz,
}

impl FromStr for TimestampTypeMapping {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> SnowflakeResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TIMESTAMP_LTZ" => Ok(TimestampTypeMapping::Ltz),
            "TIMESTAMP_NTZ" => Ok(TimestampTypeMapping::Ntz),
            "TIMESTAMP_TZ" => Ok(TimestampTypeMapping::Tz),
            other => Err(SnowflakeError::InvalidDataType(format!(
                "unknown timestamp type mapping {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VectorElementType {
    Int,
    Float,
}

impl VectorElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorElementType::Int => "INT",
            VectorElementType::Float => "FLOAT",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    Number { precision: u8, scale: u8 },
    Float,
    Varchar { length: u32 },
    Binary { length: u32 },
    Boolean,
    Date,
    Time { precision: u8 },
    TimestampLtz { precision: u8 },
    TimestampNtz { precision: u8 },
    TimestampTz { precision: u8 },
    Variant,
    Object,
    Array,
    Geography,
    Geometry,
    Vector {
        element: VectorElementType,
        dimension: u32,
    },
}

/// How many arguments a synonym group accepts.
#[derive(Clone, Copy, PartialEq)]
enum Arity {
    None,
    UpTo(usize),
}

#[derive(Clone, Copy, PartialEq)]
enum Family {
    Number,
    Integer,
    Float,
    Double,
    Varchar,
    Char,
    Binary,
    Boolean,
    Date,
    Time,
    Timestamp,
    TimestampLtz,
    TimestampNtz,
    TimestampTz,
    Variant,
    Object,
    Array,
    Geography,
    Geometry,
    Vector,
}

const SYNONYMS: &[(&str, Family)] = &[
    ("NUMBER", Family::Number),
    ("DECIMAL", Family::Number),
    ("DEC", Family::Number),
    ("NUMERIC", Family::Number),
    ("INT", Family::Integer),
    ("INTEGER", Family::Integer),
    ("BIGINT", Family::Integer),
    ("SMALLINT", Family::Integer),
    ("TINYINT", Family::Integer),
    ("BYTEINT", Family::Integer),
    ("FLOAT", Family::Float),
    ("FLOAT4", Family::Float),
    ("FLOAT8", Family::Float),
    ("REAL", Family::Float),
    ("DOUBLE", Family::Double),
    ("DOUBLE PRECISION", Family::Double),
    ("VARCHAR", Family::Varchar),
    ("STRING", Family::Varchar),
    ("TEXT", Family::Varchar),
    ("NVARCHAR", Family::Varchar),
    ("NVARCHAR2", Family::Varchar),
    ("CHAR VARYING", Family::Varchar),
    ("NCHAR VARYING", Family::Varchar),
    ("CHAR", Family::Char),
    ("CHARACTER", Family::Char),
    ("NCHAR", Family::Char),
    ("BINARY", Family::Binary),
    ("VARBINARY", Family::Binary),
    ("BOOLEAN", Family::Boolean),
    ("DATE", Family::Date),
    ("TIME", Family::Time),
    ("TIMESTAMP", Family::Timestamp),
    ("DATETIME", Family::TimestampNtz),
    ("TIMESTAMP_LTZ", Family::TimestampLtz),
    ("TIMESTAMPLTZ", Family::TimestampLtz),
    ("TIMESTAMP WITH LOCAL TIME ZONE", Family::TimestampLtz),
    ("TIMESTAMP_NTZ", Family::TimestampNtz),
    ("TIMESTAMPNTZ", Family::TimestampNtz),
    ("TIMESTAMP WITHOUT TIME ZONE", Family::TimestampNtz),
    ("TIMESTAMP_TZ", Family::TimestampTz),
    ("TIMESTAMPTZ", Family::TimestampTz),
    ("TIMESTAMP WITH TIME ZONE", Family::TimestampTz),
    ("VARIANT", Family::Variant),
    ("OBJECT", Family::Object),
    ("ARRAY", Family::Array),
    ("GEOGRAPHY", Family::Geography),
    ("GEOMETRY", Family::Geometry),
    ("VECTOR", Family::Vector),
];

/// Legacy spellings that only show up in DESCRIBE / SHOW COLUMNS output.
const DESCRIBE_SYNONYMS: &[(&str, Family)] = &[("FIXED", Family::Number)];

impl Family {
    fn arity(self) -> Arity {
        match self {
            Family::Number => Arity::UpTo(2),
            // Undocumented, but the server accepts FLOAT(20), FLOAT4(20), FLOAT8(20) and REAL(20).
            Family::Float => Arity::UpTo(1),
            Family::Varchar | Family::Char | Family::Binary => Arity::UpTo(1),
            Family::Time
            | Family::Timestamp
            | Family::TimestampLtz
            | Family::TimestampNtz
            | Family::TimestampTz => Arity::UpTo(1),
            Family::Vector => Arity::UpTo(2),
            Family::Integer
            | Family::Double
            | Family::Boolean
            | Family::Date
            | Family::Variant
            | Family::Object
            | Family::Array
            | Family::Geography
            | Family::Geometry => Arity::None,
        }
    }
}

fn lookup(name: &str, table: &[(&str, Family)]) -> Option<Family> {
    table
        .iter()
        .find(|(spelling, _)| *spelling == name)
        .map(|(_, family)| *family)
}

fn invalid(text: &str, reason: impl fmt::Display) -> SnowflakeError {
    SnowflakeError::InvalidDataType(format!("{text:?}: {reason}"))
}

/// Split `NAME(args)` into the normalised name and its raw arguments.
fn split_arguments(text: &str) -> SnowflakeResult<(String, Option<Vec<String>>)> {
    let (name, arguments) = match text.find('(') {
        Some(open) => {
            let inner = text[open + 1..]
                .trim_end()
                .strip_suffix(')')
                .ok_or_else(|| invalid(text, "unterminated argument list"))?;
            let arguments = if inner.trim().is_empty() {
                Vec::new()
            } else {
                inner.split(',').map(|a| a.trim().to_owned()).collect()
            };
            (&text[..open], Some(arguments))
        }
        None => (text, None),
    };
    let name = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase();
    Ok((name, arguments))
}

fn parse_number<T: FromStr>(text: &str, argument: &str) -> SnowflakeResult<T> {
    argument
        .parse()
        .map_err(|_| invalid(text, format!("{argument:?} is not a valid size")))
}

impl DataType {
    /// Parse with the default `TIMESTAMP_NTZ` mapping for a bare `TIMESTAMP`.
    pub fn parse(text: &str) -> SnowflakeResult<DataType> {
        Self::parse_with_mapping(text, TimestampTypeMapping::default())
    }

    pub fn parse_with_mapping(
        text: &str,
        mapping: TimestampTypeMapping,
    ) -> SnowflakeResult<DataType> {
        Self::parse_from(text, mapping, SYNONYMS)
    }

    /// Parse a type as DESCRIBE reports it, which may use a different synonym than was sent.
    pub fn normalise_describe(text: &str) -> SnowflakeResult<DataType> {
        let trimmed = text.trim();
        let trimmed = trimmed
            .strip_suffix(" NOT NULL")
            .or_else(|| trimmed.strip_suffix(" not null"))
            .unwrap_or(trimmed);
        Self::parse_from(trimmed, TimestampTypeMapping::default(), SYNONYMS).or_else(|err| {
            let (name, _) = split_arguments(trimmed)?;
            match lookup(&name, DESCRIBE_SYNONYMS) {
                Some(_) => Self::parse_from(trimmed, TimestampTypeMapping::default(), DESCRIBE_SYNONYMS),
                None => Err(err),
            }
        })
    }

    fn parse_from(
        text: &str,
        mapping: TimestampTypeMapping,
        table: &[(&str, Family)],
    ) -> SnowflakeResult<DataType> {
        let text = text.trim();
        let (name, arguments) = split_arguments(text)?;
        let family = lookup(&name, table).ok_or_else(|| invalid(text, "unknown data type"))?;

        if family == Family::Vector {
            return Self::parse_vector(text, arguments);
        }

        let arguments = arguments.unwrap_or_default();
        match family.arity() {
            Arity::None if !arguments.is_empty() => {
                return Err(invalid(text, format!("{name} takes no arguments")))
            }
            Arity::UpTo(n) if arguments.len() > n => {
                return Err(invalid(text, format!("{name} takes at most {n} argument(s)")))
            }
            _ => {}
        }
        if arguments.iter().any(|a| a.is_empty()) {
            return Err(invalid(text, "empty argument"));
        }

        let first = arguments.first().map(String::as_str);
        let precision = |default: u8| -> SnowflakeResult<u8> {
            match first {
                Some(arg) => {
                    let p: u8 = parse_number(text, arg)?;
                    if p > 9 {
                        return Err(invalid(text, "precision must be between 0 and 9"));
                    }
                    Ok(p)
                }
                None => Ok(default),
            }
        };
        let length = |default: u32| -> SnowflakeResult<u32> {
            match first {
                Some(arg) => {
                    let l: u32 = parse_number(text, arg)?;
                    if l == 0 {
                        return Err(invalid(text, "length must be positive"));
                    }
                    Ok(l)
                }
                None => Ok(default),
            }
        };

        Ok(match family {
            Family::Number => {
                let precision = match first {
                    Some(arg) => parse_number(text, arg)?,
                    None => DEFAULT_NUMBER_PRECISION,
                };
                let scale = match arguments.get(1) {
                    Some(arg) => parse_number(text, arg)?,
                    None => DEFAULT_NUMBER_SCALE,
                };
                if precision == 0 || precision > 38 {
                    return Err(invalid(text, "precision must be between 1 and 38"));
                }
                if scale > precision {
                    return Err(invalid(text, "scale must not exceed precision"));
                }
                DataType::Number { precision, scale }
            }
            Family::Integer => DataType::Number {
                precision: DEFAULT_NUMBER_PRECISION,
                scale: DEFAULT_NUMBER_SCALE,
            },
            Family::Float => {
                if let Some(arg) = first {
                    let _: u32 = parse_number(text, arg)?;
                }
                DataType::Float
            }
            Family::Double => DataType::Float,
            Family::Varchar => DataType::Varchar {
                length: length(DEFAULT_VARCHAR_LENGTH)?,
            },
            Family::Char => DataType::Varchar {
                length: length(DEFAULT_CHAR_LENGTH)?,
            },
            Family::Binary => DataType::Binary {
                length: length(DEFAULT_BINARY_LENGTH)?,
            },
            Family::Boolean => DataType::Boolean,
            Family::Date => DataType::Date,
            Family::Time => DataType::Time {
                precision: precision(DEFAULT_TIME_PRECISION)?,
            },
            Family::Timestamp => {
                let precision = precision(DEFAULT_TIME_PRECISION)?;
                match mapping {
                    TimestampTypeMapping::Ltz => DataType::TimestampLtz { precision },
                    TimestampTypeMapping::Ntz => DataType::TimestampNtz { precision },
                    TimestampTypeMapping::Tz => DataType::TimestampTz { precision },
                }
            }
            Family::TimestampLtz => DataType::TimestampLtz {
                precision: precision(DEFAULT_TIME_PRECISION)?,
            },
            Family::TimestampNtz => DataType::TimestampNtz {
                precision: precision(DEFAULT_TIME_PRECISION)?,
            },
            Family::TimestampTz => DataType::TimestampTz {
                precision: precision(DEFAULT_TIME_PRECISION)?,
            },
            Family::Variant => DataType::Variant,
            Family::Object => DataType::Object,
            Family::Array => DataType::Array,
            Family::Geography => DataType::Geography,
            Family::Geometry => DataType::Geometry,
            Family::Vector => return Self::parse_vector(text, None),
        })
    }

    // VECTOR's first argument is a type, not a size, so it gets its own branch.
    fn parse_vector(text: &str, arguments: Option<Vec<String>>) -> SnowflakeResult<DataType> {
        let arguments = arguments.ok_or_else(|| invalid(text, "VECTOR needs an element type and a dimension"))?;
        let [element, dimension] = arguments.as_slice() else {
            return Err(invalid(text, "VECTOR needs an element type and a dimension"));
        };
        let element = match DataType::parse(element)? {
            DataType::Number { scale: 0, .. } => VectorElementType::Int,
            DataType::Float => VectorElementType::Float,
            _ => return Err(invalid(text, "VECTOR elements must be INT or FLOAT")),
        };
        let dimension: u32 = parse_number(text, dimension)?;
        if dimension == 0 {
            return Err(invalid(text, "VECTOR dimension must be positive"));
        }
        Ok(DataType::Vector { element, dimension })
    }

    pub fn vector(element: VectorElementType, dimension: u32) -> DataType {
        DataType::Vector { element, dimension }
    }

    /// The canonical kind without parameters, e.g. `NUMBER` or `TIMESTAMP_NTZ`.
    pub fn canonical_kind(&self) -> &'static str {
        match self {
            DataType::Number { .. } => "NUMBER",
            DataType::Float => "FLOAT",
            DataType::Varchar { .. } => "VARCHAR",
            DataType::Binary { .. } => "BINARY",
            DataType::Boolean => "BOOLEAN",
            DataType::Date => "DATE",
            DataType::Time { .. } => "TIME",
            DataType::TimestampLtz { .. } => "TIMESTAMP_LTZ",
            DataType::TimestampNtz { .. } => "TIMESTAMP_NTZ",
            DataType::TimestampTz { .. } => "TIMESTAMP_TZ",
            DataType::Variant => "VARIANT",
            DataType::Object => "OBJECT",
            DataType::Array => "ARRAY",
            DataType::Geography => "GEOGRAPHY",
            DataType::Geometry => "GEOMETRY",
            DataType::Vector { .. } => "VECTOR",
        }
    }

    /// The one spelling used when rendering SQL.
    pub fn canonical(&self) -> String {
        match self {
            DataType::Number { precision, scale } => format!("NUMBER({precision},{scale})"),
            DataType::Varchar { length } => format!("VARCHAR({length})"),
            DataType::Binary { length } => format!("BINARY({length})"),
            DataType::Time { precision }
            | DataType::TimestampLtz { precision }
            | DataType::TimestampNtz { precision }
            | DataType::TimestampTz { precision } => {
                format!("{}({precision})", self.canonical_kind())
            }
            DataType::Vector { element, dimension } => {
                format!("VECTOR({}, {dimension})", element.as_str())
            }
            _ => self.canonical_kind().to_owned(),
        }
    }
}

impl FromStr for DataType {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> SnowflakeResult<Self> {
        DataType::parse(s)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synonyms_collapse_to_canonical() -> SnowflakeResult<()> {
        let table = [
            ("NUMBER", "NUMBER(38,0)"),
            ("DECIMAL", "NUMBER(38,0)"),
            ("dec", "NUMBER(38,0)"),
            ("NUMERIC", "NUMBER(38,0)"),
            ("INT", "NUMBER(38,0)"),
            ("INTEGER", "NUMBER(38,0)"),
            ("BIGINT", "NUMBER(38,0)"),
            ("SMALLINT", "NUMBER(38,0)"),
            ("TINYINT", "NUMBER(38,0)"),
            ("BYTEINT", "NUMBER(38,0)"),
            ("FLOAT", "FLOAT"),
            ("FLOAT4", "FLOAT"),
            ("FLOAT8", "FLOAT"),
            ("DOUBLE", "FLOAT"),
            ("double  precision", "FLOAT"),
            ("REAL", "FLOAT"),
            ("VARCHAR", "VARCHAR(16777216)"),
            ("STRING", "VARCHAR(16777216)"),
            ("TEXT", "VARCHAR(16777216)"),
            ("NVARCHAR2", "VARCHAR(16777216)"),
            ("CHAR VARYING", "VARCHAR(16777216)"),
            ("CHAR", "VARCHAR(1)"),
            ("CHARACTER", "VARCHAR(1)"),
            ("BINARY", "BINARY(8388608)"),
            ("VARBINARY", "BINARY(8388608)"),
            ("BOOLEAN", "BOOLEAN"),
            ("DATE", "DATE"),
            ("DATETIME", "TIMESTAMP_NTZ(9)"),
            ("TIME", "TIME(9)"),
            ("TIMESTAMP", "TIMESTAMP_NTZ(9)"),
            ("TIMESTAMPLTZ", "TIMESTAMP_LTZ(9)"),
            ("TIMESTAMP WITH LOCAL TIME ZONE", "TIMESTAMP_LTZ(9)"),
            ("TIMESTAMP WITHOUT TIME ZONE", "TIMESTAMP_NTZ(9)"),
            ("TIMESTAMPTZ", "TIMESTAMP_TZ(9)"),
            ("TIMESTAMP WITH TIME ZONE", "TIMESTAMP_TZ(9)"),
            ("VARIANT", "VARIANT"),
            ("OBJECT", "OBJECT"),
            ("ARRAY", "ARRAY"),
            ("GEOGRAPHY", "GEOGRAPHY"),
            ("GEOMETRY", "GEOMETRY"),
        ];
        for (synonym, canonical) in table {
            assert_eq!(DataType::parse(synonym)?.canonical(), canonical, "{synonym}");
        }
        Ok(())
    }

    #[test]
    fn arguments() -> SnowflakeResult<()> {
        assert_eq!(
            DataType::parse("NUMBER(36)")?,
            DataType::Number {
                precision: 36,
                scale: 0
            }
        );
        assert_eq!(DataType::parse("NUMBER(36, 5)")?.canonical(), "NUMBER(36,5)");
        assert_eq!(DataType::parse("VARCHAR(200)")?.canonical(), "VARCHAR(200)");
        assert_eq!(DataType::parse("TIMESTAMP_TZ(3)")?.canonical(), "TIMESTAMP_TZ(3)");
        assert_eq!(DataType::parse("NUMBER()")?.canonical(), "NUMBER(38,0)");
        Ok(())
    }

    #[test]
    fn argumentless_types_reject_arguments() {
        for bad in ["BOOLEAN(1)", "DATE(1)", "ARRAY(36)", "INT(10)", "VARIANT(1)"] {
            assert!(DataType::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn float_size_quirk() {
        for ok in ["FLOAT(20)", "FLOAT4(20)", "FLOAT8(20)", "REAL(20)"] {
            assert_eq!(DataType::parse(ok).unwrap(), DataType::Float, "{ok}");
        }
        for bad in ["DOUBLE(1)", "DOUBLE PRECISION(1)"] {
            assert!(DataType::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn invalid_types() {
        for bad in ["", "NOPE", "NUMBER(39)", "NUMBER(5,6)", "VARCHAR(x)", "TIME(10)", "NUMBER(1"] {
            assert!(DataType::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn timestamp_mapping() -> SnowflakeResult<()> {
        let ltz = DataType::parse_with_mapping("TIMESTAMP", "TIMESTAMP_LTZ".parse()?)?;
        assert_eq!(ltz.canonical_kind(), "TIMESTAMP_LTZ");
        assert_eq!(DataType::parse("TIMESTAMP")?.canonical_kind(), "TIMESTAMP_NTZ");
        Ok(())
    }

    #[test]
    fn vectors() -> SnowflakeResult<()> {
        assert_eq!(
            DataType::parse("VECTOR(INT, 16)")?,
            DataType::vector(VectorElementType::Int, 16)
        );
        assert_eq!(DataType::parse("vector(float,256)")?.canonical(), "VECTOR(FLOAT, 256)");
        assert!(DataType::parse("VECTOR(VARCHAR, 3)").is_err());
        assert!(DataType::parse("VECTOR(INT)").is_err());
        assert!(DataType::parse("VECTOR").is_err());
        Ok(())
    }

    #[test]
    fn describe_spellings() -> SnowflakeResult<()> {
        assert_eq!(DataType::normalise_describe("TIMESTAMP")?.canonical_kind(), "TIMESTAMP_NTZ");
        assert_eq!(DataType::normalise_describe("FIXED")?.canonical(), "NUMBER(38,0)");
        assert_eq!(DataType::normalise_describe("NUMBER(38,0) NOT NULL")?.canonical(), "NUMBER(38,0)");
        assert_eq!(DataType::normalise_describe("TEXT")?.canonical_kind(), "VARCHAR");
        assert!(DataType::normalise_describe("NOPE").is_err());
        Ok(())
    }
}
