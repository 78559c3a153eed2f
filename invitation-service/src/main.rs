use eventhub_invitation_service::{config::ServiceConfig, routes};
use lambda_http::Error;
use log::info;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize env_logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Logging initialized with env_logger");

    let config = ServiceConfig::from_env()?;
    let app = routes::create_router(&config).await?;

    if let Ok(function_name) = std::env::var("AWS_LAMBDA_FUNCTION_NAME") {
        info!(
            "Running in AWS Lambda environment: {} (version: {})",
            function_name,
            std::env::var("AWS_LAMBDA_FUNCTION_VERSION").unwrap_or_else(|_| "unknown".into())
        );
        lambda_http::run(app).await?;
    } else {
        info!("Starting service in non-Lambda environment");
        let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
        info!("listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app.into_make_service()).await?;
    }

    info!("Service finished");
    Ok(())
}
