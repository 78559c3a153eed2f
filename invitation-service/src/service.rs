use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use eventhub_shared::error::{Result, ServiceError};
use eventhub_shared::mail::MailDispatcher;
use eventhub_shared::models::{DeliveryReport, MessageTemplate};
use eventhub_shared::store::EventStore;

use crate::dispatch::{dispatch, DispatchOptions};
use crate::models::{InvitationRequest, PreviewRequest, SelectionMode};
use crate::publisher::ReportPublisher;
use crate::resolver::resolve;
use crate::template::preview;

/// Invitation dispatch over an event store and a mail transport.
///
/// Stateless between calls: every request resolves, renders and sends from
/// scratch.
pub struct InvitationService<S, M> {
    store: Arc<S>,
    mailer: Arc<M>,
    publisher: Option<Arc<dyn ReportPublisher>>,
    concurrency: usize,
}

impl<S, M> InvitationService<S, M>
where
    S: EventStore,
    M: MailDispatcher,
{
    pub fn new(store: Arc<S>, mailer: Arc<M>, concurrency: usize) -> Self {
        Self {
            store,
            mailer,
            publisher: None,
            concurrency,
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn ReportPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Resolves recipients, sends one rendered invitation each and reports.
    ///
    /// Validation problems and a missing event fail before anything is sent.
    /// A mail transport outage fails the whole call. Individual rejections
    /// are part of the returned report.
    pub async fn send_invitations(
        &self,
        event_id: &str,
        request: InvitationRequest,
        cancel: CancellationToken,
    ) -> Result<DeliveryReport> {
        let template = request.template();
        validate_template(&template)?;

        let event = self.store.get_event(event_id).await?;
        let selection = request.selection();

        let interested = match selection.mode {
            SelectionMode::AllPlatform => Vec::new(),
            _ => self.store.get_interested_users(&event).await?,
        };

        let recipients = resolve(
            &event,
            &interested,
            || self.store.get_all_platform_users(),
            &selection,
        )
        .await?;

        let options = DispatchOptions::new(self.concurrency).with_cancel(cancel);
        let report = dispatch(&recipients, &template, &event, self.mailer.as_ref(), &options).await?;

        if let Some(publisher) = &self.publisher {
            if let Err(err) = publisher.publish(event_id, &report).await {
                log::error!("Failed to publish delivery report for event {}: {}", event_id, err);
            }
        }

        Ok(report)
    }

    /// Renders the template for a sample recipient without sending anything.
    ///
    /// `sample_user_id` must name one of the event's interested users.
    pub async fn preview_invitation(&self, event_id: &str, request: PreviewRequest) -> Result<MessageTemplate> {
        let event = self.store.get_event(event_id).await?;

        let sample = match &request.sample_user_id {
            Some(user_id) => {
                let interested = self.store.get_interested_users(&event).await?;
                let user = interested
                    .into_iter()
                    .find(|u| &u.id == user_id)
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "User {} is not interested in event {}",
                            user_id, event_id
                        ))
                    })?;
                Some(user)
            }
            None => None,
        };

        Ok(preview(&request.template(), &event, sample.as_ref()))
    }
}

fn validate_template(template: &MessageTemplate) -> Result<()> {
    if template.subject.trim().is_empty() {
        return Err(ServiceError::ValidationError("subject is required".to_string()));
    }
    if template.body.trim().is_empty() {
        return Err(ServiceError::ValidationError("body is required".to_string()));
    }
    Ok(())
}
