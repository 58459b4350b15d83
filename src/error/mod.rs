pub(crate) mod internal;

use std::fmt;
use std::io;

/// Error code the service returns for unknown tables and indexes.
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
/// Error code the service returns for malformed requests.
pub const VALIDATION: &str = "ValidationException";

#[derive(Debug)]
pub enum DynamoError {
    // Table, index or item does not exist.
    NotFound { resource: String },
    // Request parameters were rejected before or by the service.
    InvalidParameter { description: String },
    // Projected attribute is absent from the scanned items.
    MissingAttribute { description: String },
    // Raw error reported by the service.
    Service(ServiceError),
    // Stored value could not be converted to json.
    Decode { description: String },
    Config { description: String },
    Io(io::Error),
    Internal(String),
}

/// Error reported by the storage service with its error code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub code: String,
    pub message: String,
    pub status: Option<u16>,
}

impl ServiceError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{}({}): {}", self.code, status, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

impl fmt::Display for DynamoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DynamoError::NotFound { resource } => write!(f, "{} not found", resource),
            DynamoError::InvalidParameter { description } => {
                write!(f, "invalid parameter. {}", description)
            }
            DynamoError::MissingAttribute { description } => write!(f, "{}", description),
            DynamoError::Service(err) => err.fmt(f),
            DynamoError::Decode { description } => write!(f, "decode error. {}", description),
            DynamoError::Config { description } => write!(f, "config error. {}", description),
            DynamoError::Io(err) => err.fmt(f),
            DynamoError::Internal(description) => write!(f, "internal error. {}", description),
        }
    }
}

impl std::error::Error for DynamoError {}

impl From<io::Error> for DynamoError {
    fn from(err: io::Error) -> Self {
        DynamoError::Io(err)
    }
}

impl From<ServiceError> for DynamoError {
    fn from(err: ServiceError) -> Self {
        DynamoError::Service(err)
    }
}

impl DynamoError {
    pub(crate) fn invalid(description: impl Into<String>) -> Self {
        DynamoError::InvalidParameter {
            description: description.into(),
        }
    }

    /// Service error code, if the error came from the service.
    pub fn code(&self) -> Option<&str> {
        match self {
            DynamoError::Service(err) => Some(err.code.as_str()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DynamoError::NotFound { .. })
    }

    /// Map well known service codes to their dedicated variants.
    /// `resource` names the table or index the request targeted.
    pub(crate) fn classify(self, resource: &str) -> Self {
        match self {
            DynamoError::Service(err) if err.code == RESOURCE_NOT_FOUND => DynamoError::NotFound {
                resource: resource.to_owned(),
            },
            DynamoError::Service(err) if err.code == VALIDATION => DynamoError::InvalidParameter {
                description: err.message,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_service_codes() {
        let err = DynamoError::from(ServiceError::new(
            RESOURCE_NOT_FOUND,
            "Requested resource not found",
        ))
        .classify("messages");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "messages not found");

        let err = DynamoError::from(ServiceError::new(VALIDATION, "bad key")).classify("messages");
        assert!(matches!(
            err,
            DynamoError::InvalidParameter { ref description } if description == "bad key"
        ));

        let err = DynamoError::from(
            ServiceError::new("ThrottlingException", "slow down").with_status(400),
        )
        .classify("messages");
        assert_eq!(err.code(), Some("ThrottlingException"));
        assert_eq!(err.to_string(), "ThrottlingException(400): slow down");
    }
}
