use async_trait::async_trait;

use crate::error::MailError;

// Expose the SMTP transport module
pub mod smtp;

/// MailDispatcher trait for the outbound mail transport
///
/// Implementations must tell a refused message (`MailError::Rejected`) apart
/// from a transport that cannot be reached at all (`MailError::Unavailable`).
#[async_trait]
pub trait MailDispatcher: Send + Sync + 'static {
    /// Sends one HTML message to a single address
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError>;
}
