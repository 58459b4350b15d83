use std::error;
use std::fmt;
use std::io;

use backtrace::Backtrace;

use crate::error::DynamoError;

#[derive(Debug)]
pub(crate) struct Error {
    kind: ErrorKind,
    backtrace: Option<Backtrace>,
}

#[derive(Debug)]
pub(crate) enum ErrorKind {
    Io(io::Error),
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
    // Attribute value has no json representation.
    Decode { description: String },
    Config { description: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind() {
            ErrorKind::Io(err) => err.fmt(f),
            ErrorKind::Yaml(err) => write!(f, "yaml error. {}", err),
            ErrorKind::Json(err) => write!(f, "json error. {}", err),
            ErrorKind::Decode { description } => {
                write!(f, "attribute decode error. {}", description)
            }
            ErrorKind::Config { description } => write!(f, "{}", description),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::from(ErrorKind::Io(err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::from(ErrorKind::Yaml(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::from(ErrorKind::Json(err))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::with_backtrace(kind)
    }
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    fn with_backtrace(kind: ErrorKind) -> Self {
        Self {
            kind,
            backtrace: Some(Backtrace::new()),
        }
    }
}

impl error::Error for Error {}

impl From<Error> for DynamoError {
    fn from(err: Error) -> Self {
        if let Some(backtrace) = err.backtrace.as_ref() {
            tracing::trace!("{:?}", backtrace);
        }
        match err.kind {
            ErrorKind::Io(err) => DynamoError::Io(err),
            ErrorKind::Yaml(err) => DynamoError::Config {
                description: err.to_string(),
            },
            ErrorKind::Json(err) => DynamoError::InvalidParameter {
                description: err.to_string(),
            },
            ErrorKind::Decode { description } => DynamoError::Decode { description },
            ErrorKind::Config { description } => DynamoError::Config { description },
        }
    }
}
