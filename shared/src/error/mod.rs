use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Mail dispatch unavailable: {0}")]
    DispatchUnavailable(String),

    /// Startup settings that cannot be used; never produced while serving
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Failure reported by a mail dispatch collaborator for a single send.
///
/// `Rejected` is scoped to one message (bad address, mailbox refused, ...)
/// and is folded into the delivery report. `Unavailable` means the transport
/// itself could not be reached and aborts the whole batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("message rejected: {0}")]
    Rejected(String),

    #[error("mail transport unavailable: {0}")]
    Unavailable(String),
}

// Helper function to map general DynamoDB errors
pub fn map_dynamo_error<E>(operation: &str, err: SdkError<E>) -> ServiceError {
    ServiceError::InternalError(format!("DynamoDB {} error: {}", operation, err))
}

// Helper function to map GetItem errors
pub fn map_get_dynamo_error(err: SdkError<GetItemError>, id: &str) -> ServiceError {
    match &err {
        SdkError::ServiceError(service_err) => {
            if service_err.err().is_resource_not_found_exception() {
                ServiceError::NotFound(format!("Resource not found with ID: {}", id))
            } else {
                ServiceError::InternalError(format!("DynamoDB get_item error: {}", err))
            }
        }
        _ => ServiceError::InternalError(format!("DynamoDB get_item error: {}", err)),
    }
}

// Helper function to map Scan errors
pub fn map_scan_dynamo_error(err: SdkError<ScanError>) -> ServiceError {
    ServiceError::InternalError(format!("DynamoDB scan error: {}", err))
}

impl From<serde_dynamo::Error> for ServiceError {
    fn from(err: serde_dynamo::Error) -> Self {
        ServiceError::InternalError(format!("DynamoDB serialization error: {}", err))
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::InternalError(format!("JSON serialization error: {}", err))
    }
}

impl From<MailError> for ServiceError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::Unavailable(msg) => ServiceError::DispatchUnavailable(msg),
            MailError::Rejected(msg) => ServiceError::InternalError(format!("Mail rejected: {}", msg)),
        }
    }
}
