//! Turns a selection request into the ordered, deduplicated set of people an
//! invitation goes to.
//!
//! Identity is the lower-cased email: the first spelling seen wins and later
//! duplicates are dropped. People without an email are never recipients.

use std::collections::HashSet;
use std::future::Future;

use eventhub_shared::error::{Result, ServiceError};
use eventhub_shared::models::{email_key, is_valid_email, Event, Recipient, User};

use crate::models::{SelectionMode, SelectionRequest};

/// Insertion-ordered recipient list keyed by lower-cased email
#[derive(Default)]
struct RecipientSet {
    seen: HashSet<String>,
    recipients: Vec<Recipient>,
}

impl RecipientSet {
    fn insert(&mut self, name: &str, email: &str) -> bool {
        let email = email.trim();
        if email.is_empty() {
            log::debug!("Skipping {} without an email address", name);
            return false;
        }
        if !self.seen.insert(email_key(email)) {
            return false;
        }
        self.recipients.push(Recipient {
            name: name.to_string(),
            email: email.to_string(),
        });
        true
    }

    fn into_vec(self) -> Vec<Recipient> {
        self.recipients
    }
}

/// Resolves the recipients of an invitation batch.
///
/// `load_platform_users` is only awaited in `AllPlatform` mode. A `Specific`
/// request that resolves to nobody fails with a validation error before
/// anything is sent.
pub async fn resolve<F, Fut>(
    event: &Event,
    interested_users: &[User],
    load_platform_users: F,
    request: &SelectionRequest,
) -> Result<Vec<Recipient>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<User>>>,
{
    let mut set = RecipientSet::default();

    match request.mode {
        SelectionMode::Interested => {
            for user in interested_users {
                set.insert(&user.name, &user.email);
            }
        }
        SelectionMode::AllPlatform => {
            let platform_users = load_platform_users().await?;
            let total = platform_users.len();
            for user in platform_users.iter().filter(|u| is_valid_email(u.email.trim())) {
                set.insert(&user.name, &user.email);
            }
            log::debug!(
                "Platform directory returned {} users, {} with a usable email",
                total,
                set.recipients.len()
            );
        }
        SelectionMode::Specific => {
            // Selected users first, in interest order, then hand-typed addresses
            for user in interested_users
                .iter()
                .filter(|u| request.selected_user_ids.contains(&u.id))
            {
                set.insert(&user.name, &user.email);
            }
            for email in &request.explicit_emails {
                let name = display_name_for(email, interested_users);
                set.insert(&name, email);
            }

            if set.recipients.is_empty() {
                log::warn!("Specific selection for event {} matched no recipients", event.id);
                return Err(ServiceError::ValidationError("no recipients".to_string()));
            }
        }
    }

    log::info!(
        "Resolved {} recipients for event {} (mode={:?})",
        set.recipients.len(),
        event.id,
        request.mode
    );
    Ok(set.into_vec())
}

// A typed address that belongs to an interested user keeps that user's name
fn display_name_for(email: &str, interested_users: &[User]) -> String {
    let key = email_key(email);
    interested_users
        .iter()
        .find(|u| email_key(&u.email) == key)
        .map(|u| u.name.clone())
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string())
}
