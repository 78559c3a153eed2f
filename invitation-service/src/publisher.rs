use async_trait::async_trait;
use aws_sdk_sns::types::MessageAttributeValue;
use aws_sdk_sns::Client as SnsClient;
use chrono::Utc;
use serde_json::{json, Value};

use eventhub_shared::error::{Result, ServiceError};
use eventhub_shared::models::DeliveryReport;

const REPORT_EVENT_TYPE: &str = "invitations_dispatched";

/// Hands completed delivery reports to whoever keeps them
#[async_trait]
pub trait ReportPublisher: Send + Sync + 'static {
    async fn publish(&self, event_id: &str, report: &DeliveryReport) -> Result<()>;
}

/// Publishes delivery reports to an SNS topic
pub struct SnsReportPublisher {
    client: SnsClient,
    topic_arn: String,
}

impl SnsReportPublisher {
    pub async fn new(topic_arn: String) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::with_client(SnsClient::new(&config), topic_arn)
    }

    pub fn with_client(client: SnsClient, topic_arn: String) -> Self {
        Self { client, topic_arn }
    }
}

#[async_trait]
impl ReportPublisher for SnsReportPublisher {
    async fn publish(&self, event_id: &str, report: &DeliveryReport) -> Result<()> {
        let message = serde_json::to_string(&report_event_payload(event_id, report))?;

        let message_attribute = MessageAttributeValue::builder()
            .data_type("String")
            .string_value(REPORT_EVENT_TYPE)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("SNS attribute error: {}", e)))?;

        self.client
            .publish()
            .topic_arn(&self.topic_arn)
            .message(message)
            .subject("Invitations Dispatched")
            .message_attributes("eventType", message_attribute)
            .send()
            .await
            .map_err(|e| ServiceError::InternalError(format!("SNS publish error: {}", e)))?;

        log::debug!("Published delivery report for event {} to {}", event_id, self.topic_arn);
        Ok(())
    }
}

/// Event body published for a finished invitation batch
pub fn report_event_payload(event_id: &str, report: &DeliveryReport) -> Value {
    json!({
        "event_type": REPORT_EVENT_TYPE,
        "event_id": event_id,
        "report": report,
        "timestamp": Utc::now().to_rfc3339()
    })
}
