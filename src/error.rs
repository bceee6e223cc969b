//! Error types for Episodic Platform requests

use thiserror::Error;

use crate::models::Api;
use crate::transport::HttpResponse;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The server answered with an `<error>` envelope.
    #[error("{0}")]
    Response(Box<ResponseError>),

    #[error("File upload failed: {0}")]
    FileUploadFailed(String),

    #[error("Request failed: {0}")]
    Http(String),

    #[error("HTTP error {status}")]
    Status { status: u16, body: String },

    #[error("XML error: {0}")]
    Xml(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No connection established for the {0} API")]
    NoConnection(Api),
}

impl Error {
    /// The error kind when this is a server error envelope.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Response(e) => Some(e.kind),
            _ => None,
        }
    }

    pub fn as_response(&self) -> Option<&ResponseError> {
        match self {
            Error::Response(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Error::Http(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

/// Which failure an error envelope reported, keyed by its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The API key is missing or invalid, or the signature did not match.
    InvalidApiKey,
    /// The report token is invalid or the report has expired.
    ReportNotFound,
    MissingRequiredParameter,
    /// One or more parameter values were rejected.
    InvalidParameters,
    /// The `expires` parameter is in the past.
    RequestExpired,
    /// The requested show, episode or playlist does not exist.
    NotFound,
    ApiAccessDisabled,
    /// Any code without a dedicated kind.
    Generic,
}

impl ErrorKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ErrorKind::InvalidApiKey,
            2 => ErrorKind::ReportNotFound,
            3 => ErrorKind::MissingRequiredParameter,
            4 => ErrorKind::InvalidParameters,
            5 => ErrorKind::RequestExpired,
            6 => ErrorKind::NotFound,
            7 => ErrorKind::ApiAccessDisabled,
            _ => ErrorKind::Generic,
        }
    }
}

/// A single rejected parameter from an invalid-parameters envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidParameter {
    pub name: String,
    pub message: String,
}

/// Details of an `<error>` envelope, including the raw response.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ResponseError {
    pub kind: ErrorKind,
    pub code: i64,
    /// Server message. For invalid parameters each offending field is
    /// appended on its own line as `name: message`.
    pub message: String,
    pub invalid_parameters: Vec<InvalidParameter>,
    pub response: HttpResponse,
}

impl ResponseError {
    pub fn new(
        code: i64,
        message: impl Into<String>,
        invalid_parameters: Vec<InvalidParameter>,
        response: HttpResponse,
    ) -> Self {
        let kind = ErrorKind::from_code(code);
        let mut message = message.into();
        if kind == ErrorKind::InvalidParameters {
            for param in &invalid_parameters {
                message.push_str(&format!("\n{}: {}", param.name, param.message));
            }
        }
        Self {
            kind,
            code,
            message,
            invalid_parameters,
            response,
        }
    }
}

impl From<ResponseError> for Error {
    fn from(err: ResponseError) -> Self {
        Error::Response(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_table() {
        assert_eq!(ErrorKind::from_code(1), ErrorKind::InvalidApiKey);
        assert_eq!(ErrorKind::from_code(2), ErrorKind::ReportNotFound);
        assert_eq!(ErrorKind::from_code(3), ErrorKind::MissingRequiredParameter);
        assert_eq!(ErrorKind::from_code(4), ErrorKind::InvalidParameters);
        assert_eq!(ErrorKind::from_code(5), ErrorKind::RequestExpired);
        assert_eq!(ErrorKind::from_code(6), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_code(7), ErrorKind::ApiAccessDisabled);
        assert_eq!(ErrorKind::from_code(0), ErrorKind::Generic);
        assert_eq!(ErrorKind::from_code(99), ErrorKind::Generic);
    }

    #[test]
    fn test_invalid_parameters_message() {
        let err = ResponseError::new(
            4,
            "Invalid parameters",
            vec![
                InvalidParameter { name: "air_date".into(), message: "is not a date".into() },
                InvalidParameter { name: "name".into(), message: "is too long".into() },
            ],
            HttpResponse::new(200, ""),
        );
        assert_eq!(err.message, "Invalid parameters\nair_date: is not a date\nname: is too long");
    }

    #[test]
    fn test_other_kinds_keep_message() {
        let err = ResponseError::new(
            6,
            "Show not found",
            vec![InvalidParameter { name: "x".into(), message: "y".into() }],
            HttpResponse::new(200, ""),
        );
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "Show not found");
        let err: Error = err.into();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
        assert_eq!(err.to_string(), "Show not found");
    }
}
