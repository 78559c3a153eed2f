use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::types::{AttributeValue, KeysAndAttributes};
use aws_sdk_dynamodb::Client;
use futures::future::try_join_all;
use serde_dynamo::from_item;
use std::collections::{HashMap, HashSet};
use std::env;
use std::time::Duration;

use crate::error::{map_dynamo_error, map_get_dynamo_error, map_scan_dynamo_error, Result, ServiceError};
use crate::models::{Event, User};

// Event Store Constants
const EVENT_TABLE_NAME: &str = "event-table";
const USER_TABLE_NAME: &str = "user-table";

// DynamoDB caps BatchGetItem at 100 keys per request
const BATCH_GET_LIMIT: usize = 100;
const MAX_BATCH_RETRIES: u32 = 5;

// DynamoEventStore

/// DynamoDB store for events and the platform user directory
pub struct DynamoEventStore {
    client: Client,
    events_table: String,
    users_table: String,
}

impl DynamoEventStore {
    pub async fn new() -> Self {
        // Use the recommended defaults() function with latest behavior version
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        let client = Client::new(&config);

        // Use environment variables for table names if available
        let events_table =
            env::var("EVENTS_TABLE").unwrap_or_else(|_| EVENT_TABLE_NAME.to_string());
        let users_table = env::var("USERS_TABLE").unwrap_or_else(|_| USER_TABLE_NAME.to_string());

        Self {
            client,
            events_table,
            users_table,
        }
    }

    /// Creates a new DynamoDB store with the specified client and table names.
    /// This is mainly useful for testing with a local DynamoDB instance.
    #[allow(dead_code)]
    pub fn with_client_and_tables(client: Client, events_table: String, users_table: String) -> Self {
        Self {
            client,
            events_table,
            users_table,
        }
    }

    // One BatchGetItem call, retrying whatever DynamoDB leaves unprocessed
    async fn get_users_batch(&self, ids: &[String]) -> Result<Vec<User>> {
        let keys = ids
            .iter()
            .map(|id| HashMap::from([("id".to_string(), AttributeValue::S(id.clone()))]))
            .collect();
        let keys_and_attributes = KeysAndAttributes::builder()
            .set_keys(Some(keys))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("DynamoDB request error: {}", e)))?;

        let mut pending = Some(HashMap::from([(self.users_table.clone(), keys_and_attributes)]));
        let mut users = Vec::with_capacity(ids.len());
        let mut retries = 0u32;

        while let Some(request_items) = pending.take() {
            let response = self
                .client
                .batch_get_item()
                .set_request_items(Some(request_items))
                .send()
                .await
                .map_err(|e| map_dynamo_error("batch_get_item", e))?;

            if let Some(items) = response.responses().and_then(|r| r.get(&self.users_table)) {
                for item in items {
                    users.push(from_item(item.clone())?);
                }
            }

            pending = response
                .unprocessed_keys()
                .filter(|unprocessed| !unprocessed.is_empty())
                .cloned();

            if pending.is_some() {
                retries += 1;
                if retries > MAX_BATCH_RETRIES {
                    return Err(ServiceError::InternalError(
                        "DynamoDB batch_get_item left keys unprocessed".to_string(),
                    ));
                }
                tokio::time::sleep(Duration::from_millis(50 * u64::from(retries))).await;
            }
        }

        Ok(users)
    }
}

// Distinct ids in first-seen order, split into BatchGetItem-sized chunks
fn batch_chunks(ids: &[String]) -> Vec<Vec<String>> {
    let mut seen = HashSet::new();
    let unique: Vec<String> = ids.iter().filter(|id| seen.insert(*id)).cloned().collect();
    unique
        .chunks(BATCH_GET_LIMIT)
        .map(|chunk| chunk.to_vec())
        .collect()
}

// Puts users back in interest order; ids with no record are logged and skipped
fn in_interest_order(event: &Event, found: Vec<User>) -> Vec<User> {
    let by_id: HashMap<String, User> = found.into_iter().map(|u| (u.id.clone(), u)).collect();
    let mut seen = HashSet::new();

    event
        .interested_user_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .filter_map(|id| {
            let user = by_id.get(id).cloned();
            if user.is_none() {
                log::warn!(
                    "Interested user {} of event {} has no user record, skipping",
                    id,
                    event.id
                );
            }
            user
        })
        .collect()
}

#[async_trait]
impl super::EventStore for DynamoEventStore {
    /// Gets an event by ID
    async fn get_event(&self, id: &str) -> Result<Event> {
        let key = HashMap::from([("id".to_string(), AttributeValue::S(id.to_string()))]);

        let response = self
            .client
            .get_item()
            .table_name(&self.events_table)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|e| map_get_dynamo_error(e, id))?;

        let item = response
            .item()
            .ok_or_else(|| ServiceError::NotFound(format!("Event not found: {}", id)))?;

        let event = from_item(item.clone())?;
        Ok(event)
    }

    /// Gets the interested users of an event, skipping ids with no user record
    async fn get_interested_users(&self, event: &Event) -> Result<Vec<User>> {
        let chunks = batch_chunks(&event.interested_user_ids);
        let found = try_join_all(chunks.iter().map(|chunk| self.get_users_batch(chunk))).await?;

        Ok(in_interest_order(event, found.into_iter().flatten().collect()))
    }

    /// Gets every platform user by paging through the users table
    async fn get_all_platform_users(&self) -> Result<Vec<User>> {
        let mut users = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let response = self
                .client
                .scan()
                .table_name(&self.users_table)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(map_scan_dynamo_error)?;

            for item in response.items() {
                let user: User = from_item(item.clone())?;
                users.push(user);
            }

            match response.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        log::debug!("Loaded {} platform users from {}", users.len(), self.users_table);
        Ok(users)
    }
}
