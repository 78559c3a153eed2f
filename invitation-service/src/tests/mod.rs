mod service_tests;

use eventhub_shared::models::{Event, User};
use eventhub_shared::test_utils::mock_event_store::MockEventStore;

pub const EVENT_ID: &str = "evt-career";

pub fn career_fair() -> Event {
    Event {
        id: EVENT_ID.to_string(),
        title: "Career Fair 2025".to_string(),
        date: "2025-03-04".to_string(),
        time: "10:00 AM".to_string(),
        location: "Main Hall".to_string(),
        category: "career".to_string(),
        organizer: "Careers Office".to_string(),
        interested_user_ids: vec!["a".into(), "b".into(), "c".into()],
    }
}

pub fn user(id: &str, name: &str, email: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
    }
}

/// Three interested users plus two platform-only users, one without an email
pub fn platform_users() -> Vec<User> {
    vec![
        user("a", "Alice", "a@x.com"),
        user("b", "Bob", "b@x.com"),
        user("c", "Carol", "c@x.com"),
        user("e", "Eve", "e@y.org"),
        user("n", "Nobody", ""),
    ]
}

pub fn seeded_store() -> MockEventStore {
    MockEventStore::with_data(vec![career_fair()], platform_users())
}
