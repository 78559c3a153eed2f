use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, ServiceError};
use crate::models::{Event, User};
use crate::store::EventStore;

/// Mock implementation of EventStore for testing
pub struct MockEventStore {
    events: Mutex<HashMap<String, Event>>,
    users: Mutex<Vec<User>>,
    platform_loads: AtomicUsize,
    error_mode: bool,
}

impl MockEventStore {
    /// Create a new empty MockEventStore
    pub fn new() -> Self {
        Self {
            events: Mutex::new(HashMap::new()),
            users: Mutex::new(Vec::new()),
            platform_loads: AtomicUsize::new(0),
            error_mode: false,
        }
    }

    /// Create a MockEventStore with initial events and platform users
    pub fn with_data(events: Vec<Event>, users: Vec<User>) -> Self {
        let store = Self::new();

        {
            let mut stored = store.events.lock().unwrap();
            for event in events {
                stored.insert(event.id.clone(), event);
            }
        }
        *store.users.lock().unwrap() = users;

        store
    }

    /// Create a new MockEventStore in error mode where all operations fail
    pub fn new_error() -> Self {
        Self {
            error_mode: true,
            ..Self::new()
        }
    }

    /// Number of times the full platform directory was requested
    pub fn platform_loads(&self) -> usize {
        self.platform_loads.load(Ordering::SeqCst)
    }
}

impl Default for MockEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for MockEventStore {
    async fn get_event(&self, id: &str) -> Result<Event> {
        if self.error_mode {
            return Err(ServiceError::InternalError("Mock".into()));
        }
        self.events
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("Event not found: {}", id)))
    }

    async fn get_interested_users(&self, event: &Event) -> Result<Vec<User>> {
        if self.error_mode {
            return Err(ServiceError::InternalError("Mock".into()));
        }
        let users = self.users.lock().unwrap();

        // Keep the event's interest order, skip ids with no user record
        let interested = event
            .interested_user_ids
            .iter()
            .filter_map(|id| users.iter().find(|u| &u.id == id).cloned())
            .collect();

        Ok(interested)
    }

    async fn get_all_platform_users(&self) -> Result<Vec<User>> {
        if self.error_mode {
            return Err(ServiceError::InternalError("Mock".into()));
        }
        self.platform_loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.lock().unwrap().clone())
    }
}
