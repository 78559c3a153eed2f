use axum::{
    extract::Request,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use eventhub_shared::error::Result;
use eventhub_shared::mail::{smtp::SmtpMailer, MailDispatcher};
use eventhub_shared::store::{dynamo::DynamoEventStore, EventStore};

use crate::config::ServiceConfig;
use crate::handlers::invitation_handlers::{health, preview_invitation, send_invitations};
use crate::publisher::SnsReportPublisher;
use crate::service::InvitationService;

/// Creates a router backed by DynamoDB and SMTP
pub async fn create_router(config: &ServiceConfig) -> Result<Router> {
    tracing::info!("Creating router with DynamoDB store and SMTP mailer");

    let store = Arc::new(DynamoEventStore::new().await);
    let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);

    let mut service = InvitationService::new(store, mailer, config.dispatch_concurrency);
    if let Some(topic_arn) = &config.report_topic_arn {
        tracing::info!("Publishing delivery reports to {}", topic_arn);
        service = service.with_publisher(Arc::new(SnsReportPublisher::new(topic_arn.clone()).await));
    }

    tracing::info!("Using API route prefix: {:?}", config.route_prefix);
    Ok(create_router_with_service(Arc::new(service), &config.route_prefix))
}

/// Creates a router over a given service implementation
pub fn create_router_with_service<S, M>(service: Arc<InvitationService<S, M>>, prefix: &str) -> Router
where
    S: EventStore,
    M: MailDispatcher,
{
    tracing::info!("Setting up API routes with prefix: {:?}", prefix);

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Logging middleware to trace all requests
    async fn logging_middleware(
        req: Request,
        next: axum::middleware::Next,
    ) -> impl axum::response::IntoResponse {
        tracing::info!(
            "Router received request: method={}, uri={}",
            req.method(),
            req.uri()
        );
        next.run(req).await
    }

    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/events/:event_id/invitations", post(send_invitations::<S, M>))
        .route(
            "/events/:event_id/invitations/preview",
            post(preview_invitation::<S, M>),
        )
        .with_state(service);

    // Nesting at "" is rejected by axum, so an empty prefix merges instead
    let router = if prefix.is_empty() {
        Router::new().merge(api_routes)
    } else {
        Router::new().nest(prefix, api_routes)
    };

    router
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
        .fallback(|req: Request| async move {
            tracing::warn!("No route matched for: {} {}", req.method(), req.uri());
            (
                axum::http::StatusCode::NOT_FOUND,
                "The requested resource was not found".to_string(),
            )
        })
}
