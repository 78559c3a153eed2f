use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use eventhub_shared::{
    error::ServiceError,
    mail::MailDispatcher,
    models::{DeliveryReport, MessageTemplate},
    store::EventStore,
};

use crate::{
    error::Result,
    models::{InvitationRequest, PreviewRequest},
    service::InvitationService,
};

// POST /events/:event_id/invitations - Send invitations for an event
pub async fn send_invitations<S: EventStore, M: MailDispatcher>(
    State(service): State<Arc<InvitationService<S, M>>>,
    Path(event_id): Path<String>,
    Json(request): Json<InvitationRequest>,
) -> Result<Json<DeliveryReport>> {
    let cancel = CancellationToken::new();

    // If the caller goes away this handler is dropped: the guard cancels the
    // batch, in-flight sends still complete inside the spawned task
    let _cancel_on_drop = cancel.clone().drop_guard();

    let batch = tokio::spawn(async move {
        service
            .send_invitations(&event_id, request, cancel)
            .await
    });

    let report = batch
        .await
        .map_err(|e| ServiceError::InternalError(format!("Invitation task failed: {}", e)))??;

    Ok(Json(report))
}

// POST /events/:event_id/invitations/preview - Render without sending
pub async fn preview_invitation<S: EventStore, M: MailDispatcher>(
    State(service): State<Arc<InvitationService<S, M>>>,
    Path(event_id): Path<String>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<MessageTemplate>> {
    let rendered = service.preview_invitation(&event_id, request).await?;
    Ok(Json(rendered))
}

// GET /health
pub async fn health() -> &'static str {
    "ok"
}
