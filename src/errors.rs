use serde::Deserialize;

/// Message returned for every ALTER request that does not select exactly one action.
pub const ALTER_NEEDS_EXACTLY_ONE_ACTION: &str =
    "alter statement needs exactly one action from: set, unset, refresh";

#[derive(thiserror::Error, Debug)]
pub enum SnowflakeError {
    #[error(transparent)]
    Token(#[from] jwt_simple::Error),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("Snowflake server error: {code}: {message}")]
    ServerError { code: String, message: String },
    #[error(transparent)]
    JSONError(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid object identifier: {0}")]
    InvalidObjectIdentifier(String),
    #[error("invalid data type: {0}")]
    InvalidDataType(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("object does not exist{}", caused_by(.cause))]
    ObjectNotFound {
        #[source]
        cause: Option<Box<SnowflakeError>>,
    },
    #[error("object does not exist or not authorized: {message}")]
    ObjectNotExistOrAuthorized { message: String },
    #[error("does not exist or operation cannot be performed: {message}")]
    DoesNotExistOrOperationCannotBePerformed { message: String },

    #[error("column {0} missing from result row")]
    MissingColumn(String),
    #[error("column {column} holds unexpected value {value:?}")]
    InvalidColumnValue { column: String, value: String },
    #[error("query returned no rows")]
    EmptyResult,
}

fn caused_by(cause: &Option<Box<SnowflakeError>>) -> String {
    match cause {
        Some(cause) => format!(" ({cause})"),
        None => String::new(),
    }
}

pub type SnowflakeResult<T> = Result<T, SnowflakeError>;

/// The stable error taxonomy callers match on.
///
/// Several [`SnowflakeError`] variants share a kind; use [`SnowflakeError::is`]
/// rather than matching variants when the cause chain matters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidObjectIdentifier,
    InvalidRequest,
    ObjectNotFound,
    ObjectNotExistOrAuthorized,
    DoesNotExistOrOperationCannotBePerformed,
    Driver,
}

impl SnowflakeError {
    pub fn kind(&self) -> ErrorKind {
        use SnowflakeError::*;
        match self {
            InvalidObjectIdentifier(_) => ErrorKind::InvalidObjectIdentifier,
            InvalidDataType(_) | InvalidRequest(_) => ErrorKind::InvalidRequest,
            ObjectNotFound { .. } => ErrorKind::ObjectNotFound,
            ObjectNotExistOrAuthorized { .. } => ErrorKind::ObjectNotExistOrAuthorized,
            DoesNotExistOrOperationCannotBePerformed { .. } => {
                ErrorKind::DoesNotExistOrOperationCannotBePerformed
            }
            Token(_)
            | Request(_)
            | ServerError { .. }
            | JSONError(_)
            | InvalidHeaderValue(_)
            | Io(_)
            | Config(_)
            | MissingColumn(_)
            | InvalidColumnValue { .. }
            | EmptyResult => ErrorKind::Driver,
        }
    }

    /// Whether this error, or any error it wraps, is of the given kind
    pub fn is(&self, kind: ErrorKind) -> bool {
        if self.kind() == kind {
            return true;
        }
        match self {
            SnowflakeError::ObjectNotFound { cause: Some(cause) } => cause.is(kind),
            _ => false,
        }
    }

    pub(crate) fn not_found() -> SnowflakeError {
        SnowflakeError::ObjectNotFound { cause: None }
    }

    pub(crate) fn invalid_identifier(reason: impl Into<String>) -> SnowflakeError {
        SnowflakeError::InvalidObjectIdentifier(reason.into())
    }

    /// Map a remote error onto the existence kinds using the stable fragments
    /// of Snowflake's messages. Anything else is returned untouched.
    pub fn classify(self) -> SnowflakeError {
        match self {
            SnowflakeError::ServerError { code, message } => {
                let lowered = message.to_ascii_lowercase();
                if lowered.contains("does not exist or not authorized") {
                    SnowflakeError::ObjectNotExistOrAuthorized { message }
                } else if lowered.contains("does not exist or operation cannot be performed")
                    || lowered.contains("does not exist, or operation cannot be performed")
                {
                    SnowflakeError::DoesNotExistOrOperationCannotBePerformed { message }
                } else {
                    SnowflakeError::ServerError { code, message }
                }
            }
            other => other,
        }
    }

    /// Fold a failed lookup into `ObjectNotFound`, keeping the remote reason as the cause.
    ///
    /// A bare `ObjectNotFound` means the enclosing scopes answered but the object was
    /// absent, which is reported as "does not exist or not authorized" for `name`.
    pub(crate) fn into_object_not_found(self, name: &str) -> SnowflakeError {
        match self.kind() {
            ErrorKind::ObjectNotFound => match self {
                SnowflakeError::ObjectNotFound { cause: None } => SnowflakeError::ObjectNotFound {
                    cause: Some(Box::new(SnowflakeError::ObjectNotExistOrAuthorized {
                        message: format!("Object '{name}' does not exist or not authorized."),
                    })),
                },
                other => other,
            },
            ErrorKind::ObjectNotExistOrAuthorized
            | ErrorKind::DoesNotExistOrOperationCannotBePerformed => {
                SnowflakeError::ObjectNotFound {
                    cause: Some(Box::new(self)),
                }
            }
            _ => self,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum SnowflakeWireResult<T> {
    Ok(T),
    Error {
        code: String,
        message: String,
        #[serde(rename = "statementHandle", default)]
        statement_handle: Option<String>,
    },
}

impl<T> SnowflakeWireResult<T> {
    /// Convert from the custom wire format to a standard result
    pub fn into_result(self) -> SnowflakeResult<T> {
        match self {
            SnowflakeWireResult::Error { code, message, .. } => {
                Err(SnowflakeError::ServerError { code, message })
            }
            SnowflakeWireResult::Ok(t) => Ok(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(message: &str) -> SnowflakeError {
        SnowflakeError::ServerError {
            code: "002003".into(),
            message: message.into(),
        }
    }

    #[test]
    fn classify_not_authorized() {
        let err = server("SQL compilation error:\nDatabase 'X' does not exist or not authorized.")
            .classify();
        assert_eq!(err.kind(), ErrorKind::ObjectNotExistOrAuthorized);
        assert!(err.to_string().contains("Database 'X' does not exist"));
    }

    #[test]
    fn classify_operation_cannot_be_performed() {
        let err = server("SQL compilation error:\nObject does not exist, or operation cannot be performed.")
            .classify();
        assert_eq!(err.kind(), ErrorKind::DoesNotExistOrOperationCannotBePerformed);
        let err = server("Schema does not exist or operation cannot be performed").classify();
        assert_eq!(err.kind(), ErrorKind::DoesNotExistOrOperationCannotBePerformed);
    }

    #[test]
    fn classify_leaves_other_errors_verbatim() {
        let err = server("syntax error line 1 at position 80 unexpected 'REPLICATION_SCHEDULE'.")
            .classify();
        assert_eq!(err.kind(), ErrorKind::Driver);
        assert!(err.to_string().contains("unexpected 'REPLICATION_SCHEDULE'"));
    }

    #[test]
    fn not_found_stacks_with_cause() {
        let err = server("Object does not exist, or operation cannot be performed.")
            .classify()
            .into_object_not_found("DB.SC.T");
        assert!(err.is(ErrorKind::ObjectNotFound));
        assert!(err.is(ErrorKind::DoesNotExistOrOperationCannotBePerformed));
        assert!(!err.is(ErrorKind::ObjectNotExistOrAuthorized));

        let err = SnowflakeError::not_found().into_object_not_found("DB.SC.T");
        assert!(err.is(ErrorKind::ObjectNotFound));
        assert!(err.is(ErrorKind::ObjectNotExistOrAuthorized));
        assert!(!err.is(ErrorKind::DoesNotExistOrOperationCannotBePerformed));
    }

    #[derive(Deserialize, Debug)]
    struct Data {
        #[allow(dead_code)]
        data: Vec<Vec<Option<String>>>,
    }

    #[test]
    fn wire_error_becomes_server_error() {
        let wire: SnowflakeWireResult<Data> =
            serde_json::from_str(r#"{"code": "000904", "message": "invalid identifier 'X'"}"#)
                .unwrap();
        let err = wire.into_result().unwrap_err();
        assert!(matches!(err, SnowflakeError::ServerError { ref code, .. } if code == "000904"));
    }
}
