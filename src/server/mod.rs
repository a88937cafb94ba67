//! HTTP surface for theme stylesheets
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /{org}/{repo}/{sha}/build/theme.css` | built stylesheet, immutable |
//! | `GET /{org}/{repo}/{ref}/build/theme.css` | `307` to the commit URL |
//! | `GET /health` | `ok` |

mod routes;

pub use routes::{error_response, router, stylesheet_url, AppState};

use crate::error::{ShowcaseError, ShowcaseResult};
use crate::showcase::Showcase;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tracing::{error, info, warn};

/// Serve stylesheets on `host:port` until SIGINT or SIGTERM
pub async fn serve(showcase: Arc<Showcase>, host: &str, port: u16) -> ShowcaseResult<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ShowcaseError::io(format!("binding {}", addr), e))?;

    info!(
        target: "server::startup",
        addr = %addr,
        cache = %showcase.store().root().display(),
        "Server is ready and listening for connections"
    );
    if host == "0.0.0.0" || host == "::" {
        warn!(
            target: "server::startup",
            "Server is bound to all interfaces. Ensure firewall rules are properly configured."
        );
    }

    let app = router(AppState { showcase });
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!(target: "server::shutdown", error = %e, "Server encountered an error");
            ShowcaseError::io("serving HTTP", e)
        })?;

    info!(target: "server::shutdown", "Server shut down gracefully");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = ctrl_c().await {
            error!(target: "server::shutdown", error = %e, "Failed to install Ctrl+C handler");
        } else {
            info!(target: "server::shutdown", "Received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!(target: "server::shutdown", "Received SIGTERM, shutting down");
            }
            Err(e) => {
                error!(target: "server::shutdown", error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {},
        () = terminate => {},
    }
}
