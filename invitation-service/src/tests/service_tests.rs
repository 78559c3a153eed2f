use async_trait::async_trait;
use mockall::mock;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use eventhub_shared::error::{Result, ServiceError};
use eventhub_shared::models::{DeliveryReport, Event, User};
use eventhub_shared::store::EventStore;
use eventhub_shared::test_utils::mock_event_store::MockEventStore;
use eventhub_shared::test_utils::mock_mailer::MockMailer;
use eventhub_shared::test_utils::test_logging::init_test_logging;

use super::{career_fair, platform_users, seeded_store, user, EVENT_ID};
use crate::models::{InvitationRequest, PreviewRequest, SelectionMode};
use crate::publisher::ReportPublisher;
use crate::service::InvitationService;

mock! {
    pub Store {}

    #[async_trait]
    impl EventStore for Store {
        async fn get_event(&self, id: &str) -> Result<Event>;
        async fn get_interested_users(&self, event: &Event) -> Result<Vec<User>>;
        async fn get_all_platform_users(&self) -> Result<Vec<User>>;
    }
}

#[derive(Default)]
struct RecordingPublisher {
    reports: Mutex<Vec<(String, DeliveryReport)>>,
    fail: bool,
}

#[async_trait]
impl ReportPublisher for RecordingPublisher {
    async fn publish(&self, event_id: &str, report: &DeliveryReport) -> Result<()> {
        self.reports
            .lock()
            .unwrap()
            .push((event_id.to_string(), report.clone()));
        if self.fail {
            return Err(ServiceError::InternalError("topic gone".into()));
        }
        Ok(())
    }
}

fn request(mode: SelectionMode, explicit: &[&str], selected: &[&str]) -> InvitationRequest {
    InvitationRequest {
        mode,
        subject: "Invitation: {{eventTitle}}".to_string(),
        body: "<p>Dear {{name}}, join us on {{eventDate}}. See you, {{name}}!</p>".to_string(),
        explicit_emails: explicit.iter().map(|s| s.to_string()).collect(),
        selected_user_ids: selected.iter().map(|s| s.to_string()).collect(),
    }
}

fn service_with(
    store: MockEventStore,
    mailer: MockMailer,
) -> (InvitationService<MockEventStore, MockMailer>, Arc<MockMailer>) {
    init_test_logging();
    let mailer = Arc::new(mailer);
    let service = InvitationService::new(Arc::new(store), mailer.clone(), 4);
    (service, mailer)
}

fn sorted_recipients(mailer: &MockMailer) -> Vec<String> {
    let mut to: Vec<String> = mailer.sent().into_iter().map(|m| m.to).collect();
    to.sort();
    to
}

#[tokio::test]
async fn test_career_fair_specific_invitations() {
    let (service, mailer) = service_with(seeded_store(), MockMailer::new());

    let report = service
        .send_invitations(
            EVENT_ID,
            request(SelectionMode::Specific, &["b@x.com", "d@x.com"], &["a", "b"]),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.total_attempted, 3);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(sorted_recipients(&mailer), vec!["a@x.com", "b@x.com", "d@x.com"]);

    let to_bob = mailer.sent().into_iter().find(|m| m.to == "b@x.com").unwrap();
    assert_eq!(to_bob.subject, "Invitation: Career Fair 2025");
    assert_eq!(
        to_bob.body,
        "<p>Dear Bob, join us on Tuesday, March 4, 2025. See you, Bob!</p>"
    );
}

#[tokio::test]
async fn test_interested_mode_with_partial_failure() {
    let (service, mailer) = service_with(
        seeded_store(),
        MockMailer::new().rejecting("c@x.com", "550 mailbox unavailable"),
    );

    let report = service
        .send_invitations(
            EVENT_ID,
            request(SelectionMode::Interested, &[], &[]),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.total_attempted, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failed_recipients[0].email, "c@x.com");
    assert_eq!(report.failed_recipients[0].error_detail, "550 mailbox unavailable");
    assert_eq!(sorted_recipients(&mailer), vec!["a@x.com", "b@x.com"]);
}

#[tokio::test]
async fn test_all_platform_mode_skips_users_without_email() {
    let (service, mailer) = service_with(seeded_store(), MockMailer::new());

    let report = service
        .send_invitations(
            EVENT_ID,
            request(SelectionMode::AllPlatform, &[], &[]),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.succeeded, 4);
    assert_eq!(
        sorted_recipients(&mailer),
        vec!["a@x.com", "b@x.com", "c@x.com", "e@y.org"]
    );
}

#[tokio::test]
async fn test_blank_subject_or_body_is_rejected_before_sending() {
    let (service, mailer) = service_with(seeded_store(), MockMailer::new());

    let mut blank_subject = request(SelectionMode::Interested, &[], &[]);
    blank_subject.subject = "   ".to_string();
    let result = service
        .send_invitations(EVENT_ID, blank_subject, CancellationToken::new())
        .await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));

    let mut blank_body = request(SelectionMode::Interested, &[], &[]);
    blank_body.body = String::new();
    let result = service
        .send_invitations(EVENT_ID, blank_body, CancellationToken::new())
        .await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));

    assert_eq!(mailer.calls(), 0);
}

#[tokio::test]
async fn test_specific_mode_with_only_malformed_emails_is_rejected() {
    let (service, mailer) = service_with(seeded_store(), MockMailer::new());

    let result = service
        .send_invitations(
            EVENT_ID,
            request(SelectionMode::Specific, &["not-an-email", "x@nodot"], &[]),
            CancellationToken::new(),
        )
        .await;

    match result {
        Err(ServiceError::ValidationError(msg)) => assert_eq!(msg, "no recipients"),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(mailer.calls(), 0);
}

#[tokio::test]
async fn test_unknown_event_is_not_found() {
    let (service, mailer) = service_with(seeded_store(), MockMailer::new());

    let result = service
        .send_invitations(
            "no-such-event",
            request(SelectionMode::Interested, &[], &[]),
            CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
    assert_eq!(mailer.calls(), 0);
}

#[tokio::test]
async fn test_transport_outage_fails_whole_request_and_publishes_nothing() {
    let publisher = Arc::new(RecordingPublisher::default());
    let (service, mailer) = service_with(seeded_store(), MockMailer::new_unavailable());
    let service = service.with_publisher(publisher.clone());

    let result = service
        .send_invitations(
            EVENT_ID,
            request(SelectionMode::Interested, &[], &[]),
            CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(ServiceError::DispatchUnavailable(_))));
    assert!(mailer.sent().is_empty());
    assert!(publisher.reports.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_completed_report_is_published() {
    let publisher = Arc::new(RecordingPublisher::default());
    let (service, _mailer) = service_with(seeded_store(), MockMailer::new());
    let service = service.with_publisher(publisher.clone());

    let report = service
        .send_invitations(
            EVENT_ID,
            request(SelectionMode::Interested, &[], &[]),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    let published = publisher.reports.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, EVENT_ID);
    assert_eq!(published[0].1, report);
}

#[tokio::test]
async fn test_publish_failure_does_not_change_the_result() {
    let publisher = Arc::new(RecordingPublisher {
        fail: true,
        ..Default::default()
    });
    let (service, _mailer) = service_with(seeded_store(), MockMailer::new());
    let service = service.with_publisher(publisher.clone());

    let report = service
        .send_invitations(
            EVENT_ID,
            request(SelectionMode::Interested, &[], &[]),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.succeeded, 3);
    assert_eq!(publisher.reports.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancelled_before_start_sends_nothing() {
    let (service, mailer) = service_with(seeded_store(), MockMailer::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = service
        .send_invitations(EVENT_ID, request(SelectionMode::Interested, &[], &[]), cancel)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.total_attempted, 0);
    assert_eq!(report.not_attempted, 3);
    assert_eq!(mailer.calls(), 0);
}

#[tokio::test]
async fn test_specific_mode_never_loads_platform_directory() {
    init_test_logging();
    let mut store = MockStore::new();
    store
        .expect_get_event()
        .times(1)
        .returning(|_| Ok(career_fair()));
    store
        .expect_get_interested_users()
        .times(1)
        .returning(|_| Ok(vec![user("a", "Alice", "a@x.com")]));
    store.expect_get_all_platform_users().never();

    let mailer = Arc::new(MockMailer::new());
    let service = InvitationService::new(Arc::new(store), mailer.clone(), 2);

    let report = service
        .send_invitations(
            EVENT_ID,
            request(SelectionMode::Specific, &["z@y.org"], &["a"]),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.succeeded, 2);
}

#[tokio::test]
async fn test_all_platform_mode_skips_interested_lookup() {
    init_test_logging();
    let mut store = MockStore::new();
    store
        .expect_get_event()
        .times(1)
        .returning(|_| Ok(career_fair()));
    store.expect_get_interested_users().never();
    store
        .expect_get_all_platform_users()
        .times(1)
        .returning(|| Ok(platform_users()));

    let mailer = Arc::new(MockMailer::new());
    let service = InvitationService::new(Arc::new(store), mailer.clone(), 2);

    let report = service
        .send_invitations(
            EVENT_ID,
            request(SelectionMode::AllPlatform, &[], &[]),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.succeeded, 4);
}

#[tokio::test]
async fn test_preview_with_and_without_sample_recipient() {
    let (service, mailer) = service_with(seeded_store(), MockMailer::new());

    let generic = service
        .preview_invitation(
            EVENT_ID,
            PreviewRequest {
                subject: "{{eventTitle}} for {{name}}".to_string(),
                body: "Hello {{name}}".to_string(),
                sample_user_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(generic.subject, "Career Fair 2025 for Sample User");
    assert_eq!(generic.body, "Hello Sample User");

    let personal = service
        .preview_invitation(
            EVENT_ID,
            PreviewRequest {
                subject: "{{eventTitle}} for {{name}}".to_string(),
                body: "Hello {{name}}".to_string(),
                sample_user_id: Some("c".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(personal.body, "Hello Carol");

    // Previews never send
    assert_eq!(mailer.calls(), 0);
}

#[tokio::test]
async fn test_preview_with_uninterested_sample_is_not_found() {
    let (service, _mailer) = service_with(seeded_store(), MockMailer::new());

    let result = service
        .preview_invitation(
            EVENT_ID,
            PreviewRequest {
                subject: "s".to_string(),
                body: "b".to_string(),
                sample_user_id: Some("e".to_string()),
            },
        )
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}
