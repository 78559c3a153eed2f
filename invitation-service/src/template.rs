//! Placeholder substitution for invitation subjects and bodies.
//!
//! Recognized tokens are matched literally and case-sensitively:
//!
//! ```text
//! {{name}} {{eventTitle}} {{eventDate}} {{eventTime}} {{eventLocation}}
//! ```
//!
//! Any other `{{...}}` is copied through untouched. Substitution is a single
//! left-to-right pass, so values containing braces are never expanded again.

use chrono::{DateTime, NaiveDate};

use eventhub_shared::models::{Event, MessageTemplate, User};

/// Name used by previews when no real recipient is picked
pub const SAMPLE_RECIPIENT_NAME: &str = "Sample User";

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Per-recipient substitution values
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderContext {
    pub name: String,
    pub event_title: String,
    pub event_date: String,
    pub event_time: String,
    pub event_location: String,
}

impl RenderContext {
    /// Context for one recipient of `event`, with the date already formatted
    pub fn for_recipient(event: &Event, name: &str) -> Self {
        Self {
            name: name.to_string(),
            event_title: event.title.clone(),
            event_date: format_event_date(&event.date),
            event_time: event.time.clone(),
            event_location: event.location.clone(),
        }
    }

    fn value(&self, token: &str) -> Option<&str> {
        match token {
            "name" => Some(self.name.as_str()),
            "eventTitle" => Some(self.event_title.as_str()),
            "eventDate" => Some(self.event_date.as_str()),
            "eventTime" => Some(self.event_time.as_str()),
            "eventLocation" => Some(self.event_location.as_str()),
            _ => None,
        }
    }
}

/// Long human date, e.g. "Tuesday, March 4, 2025".
///
/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp; anything else is returned as is.
pub fn format_event_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()));

    match date {
        Some(date) => date.format("%A, %B %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

/// Renders subject and body independently from the same context
pub fn render(template: &MessageTemplate, context: &RenderContext) -> MessageTemplate {
    MessageTemplate {
        subject: render_text(&template.subject, context),
        body: render_text(&template.body, context),
    }
}

/// Preview against a real recipient, or "Sample User" when none is given
pub fn preview(template: &MessageTemplate, event: &Event, sample: Option<&User>) -> MessageTemplate {
    let name = sample.map(|u| u.name.as_str()).unwrap_or(SAMPLE_RECIPIENT_NAME);
    render(template, &RenderContext::for_recipient(event, name))
}

fn render_text(text: &str, context: &RenderContext) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];

        match placeholder_at(after, context) {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &after[consumed..];
            }
            None => {
                // Not ours: keep the braces and rescan right after them
                out.push_str(OPEN);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

// Value and length of a recognized `token}}` at the start of `after`
fn placeholder_at<'a>(after: &str, context: &'a RenderContext) -> Option<(&'a str, usize)> {
    let end = after.find(CLOSE)?;
    let value = context.value(&after[..end])?;
    Some((value, end + CLOSE.len()))
}
