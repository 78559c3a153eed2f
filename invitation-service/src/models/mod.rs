use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use eventhub_shared::models::{is_valid_email, MessageTemplate};

/// Which recipients an invitation request targets
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionMode {
    #[serde(rename = "interested")]
    Interested,
    #[serde(rename = "all")]
    AllPlatform,
    #[serde(rename = "specific")]
    Specific,
}

/// Recipient selection handed to the resolver.
///
/// `explicit_emails` and `selected_user_ids` are only populated for
/// `Specific`; explicit emails have already passed the syntax check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionRequest {
    pub mode: SelectionMode,
    pub explicit_emails: Vec<String>,
    pub selected_user_ids: HashSet<String>,
}

impl SelectionRequest {
    pub fn interested() -> Self {
        Self {
            mode: SelectionMode::Interested,
            explicit_emails: Vec::new(),
            selected_user_ids: HashSet::new(),
        }
    }

    pub fn all_platform() -> Self {
        Self {
            mode: SelectionMode::AllPlatform,
            explicit_emails: Vec::new(),
            selected_user_ids: HashSet::new(),
        }
    }

    /// Builds a `Specific` selection. Malformed explicit emails are dropped here.
    pub fn specific<E, U>(explicit_emails: E, selected_user_ids: U) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        U: IntoIterator,
        U::Item: Into<String>,
    {
        let explicit_emails = explicit_emails
            .into_iter()
            .filter_map(|raw| {
                let email = raw.as_ref().trim();
                if is_valid_email(email) {
                    Some(email.to_string())
                } else {
                    log::debug!("Dropping malformed explicit email: {:?}", email);
                    None
                }
            })
            .collect();

        Self {
            mode: SelectionMode::Specific,
            explicit_emails,
            selected_user_ids: selected_user_ids.into_iter().map(Into::into).collect(),
        }
    }
}

// Request DTOs
#[derive(Deserialize, Debug, Clone)]
pub struct InvitationRequest {
    pub mode: SelectionMode,
    pub subject: String,
    pub body: String,
    #[serde(rename = "explicitEmails", default)]
    pub explicit_emails: Vec<String>,
    #[serde(rename = "selectedUserIds", default)]
    pub selected_user_ids: Vec<String>,
}

impl InvitationRequest {
    pub fn template(&self) -> MessageTemplate {
        MessageTemplate {
            subject: self.subject.clone(),
            body: self.body.clone(),
        }
    }

    /// Point of entry for recipient selection; lists are ignored outside `Specific`
    pub fn selection(&self) -> SelectionRequest {
        match self.mode {
            SelectionMode::Interested => SelectionRequest::interested(),
            SelectionMode::AllPlatform => SelectionRequest::all_platform(),
            SelectionMode::Specific => SelectionRequest::specific(
                &self.explicit_emails,
                self.selected_user_ids.iter().cloned(),
            ),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct PreviewRequest {
    pub subject: String,
    pub body: String,
    #[serde(rename = "sampleUserId", default)]
    pub sample_user_id: Option<String>,
}

impl PreviewRequest {
    pub fn template(&self) -> MessageTemplate {
        MessageTemplate {
            subject: self.subject.clone(),
            body: self.body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_wire_names() {
        let request: InvitationRequest = serde_json::from_value(json!({
            "mode": "all",
            "subject": "s",
            "body": "b"
        }))
        .unwrap();
        assert_eq!(request.mode, SelectionMode::AllPlatform);
        assert!(request.explicit_emails.is_empty());

        let bad = serde_json::from_value::<InvitationRequest>(json!({
            "mode": "everyone",
            "subject": "s",
            "body": "b"
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_specific_selection_drops_malformed_emails() {
        let selection = SelectionRequest::specific(
            ["d@x.com", "not-an-email", " e@y.org ", "f@nodot"],
            ["a"],
        );
        assert_eq!(selection.mode, SelectionMode::Specific);
        assert_eq!(selection.explicit_emails, vec!["d@x.com", "e@y.org"]);
        assert!(selection.selected_user_ids.contains("a"));
    }

    #[test]
    fn test_lists_ignored_outside_specific_mode() {
        let request: InvitationRequest = serde_json::from_value(json!({
            "mode": "interested",
            "subject": "s",
            "body": "b",
            "explicitEmails": ["d@x.com"],
            "selectedUserIds": ["a"]
        }))
        .unwrap();

        let selection = request.selection();
        assert_eq!(selection, SelectionRequest::interested());
    }
}
