use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Event, User};

// Expose the DynamoDB store module
pub mod dynamo;

/// EventStore trait defining the read-only lookups invitation dispatch needs
#[async_trait]
pub trait EventStore: Send + Sync + 'static {
    /// Gets an event by ID
    async fn get_event(&self, id: &str) -> Result<Event>;

    /// Gets the users who marked interest in an event, in interest order
    async fn get_interested_users(&self, event: &Event) -> Result<Vec<User>>;

    /// Gets every user registered on the platform
    async fn get_all_platform_users(&self) -> Result<Vec<User>>;
}
