use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::MailError;
use crate::mail::MailDispatcher;
use crate::models::email_key;

/// A message captured by MockMailer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mock implementation of MailDispatcher for testing
///
/// Records every accepted message, rejects configured addresses and can
/// simulate a transport outage.
pub struct MockMailer {
    sent: Mutex<Vec<SentMail>>,
    rejections: HashMap<String, String>,
    unavailable: AtomicBool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockMailer {
    /// Create a mailer that accepts everything
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            rejections: HashMap::new(),
            unavailable: AtomicBool::new(false),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Create a mailer whose transport is down for every call
    pub fn new_unavailable() -> Self {
        let mailer = Self::new();
        mailer.unavailable.store(true, Ordering::SeqCst);
        mailer
    }

    /// Reject messages to `email` with the given reason
    pub fn rejecting(mut self, email: &str, reason: &str) -> Self {
        self.rejections.insert(email_key(email), reason.to_string());
        self
    }

    /// Hold every send for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Toggle the simulated outage
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Messages accepted so far
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    /// Total number of send calls, accepted or not
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of sends observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailDispatcher for MockMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = if self.unavailable.load(Ordering::SeqCst) {
            Err(MailError::Unavailable("connection refused".into()))
        } else if let Some(reason) = self.rejections.get(&email_key(to)) {
            Err(MailError::Rejected(reason.clone()))
        } else {
            self.sent.lock().unwrap().push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: html_body.to_string(),
            });
            Ok(())
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
