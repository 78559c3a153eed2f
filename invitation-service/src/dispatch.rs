//! Fan-out of rendered invitations to the mail transport.
//!
//! Each recipient is one independent attempt. A refused message is recorded
//! as a failed attempt and its siblings carry on. A transport outage stops
//! new sends, lets the in-flight ones finish and then fails the batch with
//! no report. Attempts are collected and folded once the batch has drained,
//! so nothing is shared between sends.

use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;

use eventhub_shared::error::{MailError, Result};
use eventhub_shared::mail::MailDispatcher;
use eventhub_shared::models::{
    DeliveryAttempt, DeliveryOutcome, DeliveryReport, Event, MessageTemplate, Recipient,
};

use crate::template::{render, RenderContext};

/// Concurrency and cancellation for one dispatch run
#[derive(Clone, Debug)]
pub struct DispatchOptions {
    /// Maximum sends in flight at once; 0 is treated as 1
    pub concurrency: usize,
    /// Once cancelled, no new sends start and in-flight sends finish
    pub cancel: CancellationToken,
}

impl DispatchOptions {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Sends `template` to every recipient and reports the outcome.
///
/// Failed recipients are listed in recipient order whatever order the sends
/// complete in.
pub async fn dispatch<M>(
    recipients: &[Recipient],
    template: &MessageTemplate,
    event: &Event,
    mailer: &M,
    options: &DispatchOptions,
) -> Result<DeliveryReport>
where
    M: MailDispatcher + ?Sized,
{
    let limit = options.concurrency.max(1);
    let cancel = &options.cancel;

    log::info!(
        "Dispatching invitations for event {} to {} recipients (concurrency={})",
        event.id,
        recipients.len(),
        limit
    );

    let mut attempts: Vec<Option<DeliveryAttempt>> = vec![None; recipients.len()];
    let mut queue = recipients.iter().enumerate();
    let mut in_flight = FuturesUnordered::new();
    let mut outage: Option<MailError> = None;

    loop {
        // Top up to the limit; after cancellation the rest are only recorded
        while outage.is_none() && in_flight.len() < limit {
            let Some((index, recipient)) = queue.next() else {
                break;
            };
            if cancel.is_cancelled() {
                attempts[index] = Some(DeliveryAttempt::not_attempted(&recipient.email));
                continue;
            }
            in_flight.push(async move {
                (index, attempt_delivery(recipient, template, event, mailer).await)
            });
        }

        let Some((index, attempt)) = in_flight.next().await else {
            break;
        };
        match attempt {
            Ok(attempt) => attempts[index] = Some(attempt),
            Err(err) => {
                if outage.is_none() {
                    log::error!(
                        "Mail transport unavailable during batch for event {}, draining {} in-flight sends: {}",
                        event.id,
                        in_flight.len(),
                        err
                    );
                    outage = Some(err);
                }
            }
        }
    }

    if let Some(err) = outage {
        let delivered = attempts
            .iter()
            .flatten()
            .filter(|a| a.outcome == DeliveryOutcome::Sent)
            .count();
        log::error!(
            "Aborted invitation batch for event {}: {} of {} invitations were delivered before the outage",
            event.id,
            delivered,
            recipients.len()
        );
        return Err(err.into());
    }

    let report = DeliveryReport::from_attempts(attempts.into_iter().flatten());
    log::info!(
        "Invitation batch for event {} finished: attempted={}, succeeded={}, failed={}, not_attempted={}, partial={}",
        event.id,
        report.total_attempted,
        report.succeeded,
        report.failed,
        report.not_attempted,
        report.is_partial_success()
    );
    Ok(report)
}

// Only a transport outage comes back as Err; a rejection is a Failed attempt
async fn attempt_delivery<M>(
    recipient: &Recipient,
    template: &MessageTemplate,
    event: &Event,
    mailer: &M,
) -> std::result::Result<DeliveryAttempt, MailError>
where
    M: MailDispatcher + ?Sized,
{
    let context = RenderContext::for_recipient(event, &recipient.name);
    let message = render(template, &context);

    match mailer
        .send(&recipient.email, &message.subject, &message.body)
        .await
    {
        Ok(()) => {
            log::debug!("Invitation sent to {}", recipient.email);
            Ok(DeliveryAttempt::sent(&recipient.email))
        }
        Err(MailError::Rejected(reason)) => {
            log::warn!("Invitation to {} rejected: {}", recipient.email, reason);
            Ok(DeliveryAttempt::failed(&recipient.email, reason))
        }
        Err(err @ MailError::Unavailable(_)) => Err(err),
    }
}
