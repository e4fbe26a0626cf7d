// src/server.rs

//! Liveness endpoint.
//!
//! Answers `GET /` with a fixed plaintext message for uptime probes. Shares
//! no state with the monitor.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::routing::get;

use crate::error::{AppError, Result};
use crate::models::ServerConfig;

/// Build the liveness router.
pub fn router(message: impl Into<String>) -> Router {
    let message: Arc<str> = Arc::from(message.into());
    Router::new().route("/", get(alive)).with_state(message)
}

async fn alive(State(message): State<Arc<str>>) -> String {
    message.to_string()
}

/// Bind and serve the liveness endpoint until the process exits.
pub async fn serve(config: &ServerConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::config(format!("Invalid server address: {e}")))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Liveness endpoint listening on http://{}", addr);

    axum::serve(listener, router(config.message.clone())).await?;
    Ok(())
}

/// Spawn the liveness endpoint as an independent task.
///
/// Failures are logged; they never affect the monitor.
pub fn spawn(config: ServerConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = serve(&config).await {
            log::error!("Liveness endpoint stopped: {}", e);
        }
    })
}

#[cfg(test)]
mod tests {
    use axum::body::{self, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt as _;

    use super::*;

    #[tokio::test]
    async fn test_root_returns_fixed_message() {
        let app = router("Announcement Bot is alive and checking!");

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));
        let bytes = body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"Announcement Bot is alive and checking!");
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let response = router("ok")
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_address_is_config_error() {
        let config = ServerConfig {
            host: "not an address".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(serve(&config).await, Err(AppError::Config(_))));
    }
}
