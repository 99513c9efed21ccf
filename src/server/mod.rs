//! Presentation/dispatch shell: resolves one poll outcome and serves the
//! page until shutdown.

pub mod page;

use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;

use crate::{
    core::logs::{LogEntry, LogLevel, LogMetadata, StatusLog},
    core::reading::{ResolvedReading, SensorReading, DEFAULT_LATITUDE, DEFAULT_LONGITUDE},
    dispatch::{dispatch, DispatchOutcome},
    poller::AcquireError,
};

/// Shared state for the axum page server
#[derive(Clone)]
pub struct AppState {
    inner: Arc<SharedState>,
}

struct SharedState {
    view: ResolvedReading,
    status: StatusLog,
    /// Last endpoint entered in the form, pre-filled on the next render
    endpoint: Mutex<String>,
}

impl AppState {
    pub fn new(view: ResolvedReading, status: StatusLog, endpoint: String) -> Self {
        Self {
            inner: Arc::new(SharedState {
                view,
                status,
                endpoint: Mutex::new(endpoint),
            }),
        }
    }
}

/// Resolve one poll outcome into the reading to render. On failure the
/// documented default coordinates are substituted (distances zeroed) and
/// the fallback is reported to the operator.
pub fn resolve_outcome(
    outcome: std::result::Result<SensorReading, AcquireError>,
    status: &StatusLog,
) -> ResolvedReading {
    match outcome {
        Ok(reading) => {
            status.info(format!(
                "Current location: latitude {}, longitude {}",
                reading.latitude, reading.longitude
            ));
            ResolvedReading::live(reading)
        }
        Err(_) => {
            status.warning(format!(
                "Using default coordinates ({DEFAULT_LATITUDE}, {DEFAULT_LONGITUDE})"
            ));
            ResolvedReading::degraded()
        }
    }
}

/// Record a dispatch outcome in the status log
pub fn record_outcome(status: &StatusLog, endpoint: &str, outcome: DispatchOutcome) {
    match outcome {
        DispatchOutcome::Accepted { status: code, body } => status.push(LogEntry::with_metadata(
            format!("Data sent successfully. Response: {body}"),
            LogLevel::Info,
            LogMetadata::Dispatch {
                endpoint: endpoint.to_string(),
                status: Some(code),
            },
        )),
        DispatchOutcome::Rejected { status: code, body } => status.push(LogEntry::with_metadata(
            format!("Failed to send data. Status code: {code}. Response: {body}"),
            LogLevel::Error,
            LogMetadata::Dispatch {
                endpoint: endpoint.to_string(),
                status: Some(code),
            },
        )),
        DispatchOutcome::Transport(message) => status.push(LogEntry::with_metadata(
            format!("Error sending data to IoT system: {message}"),
            LogLevel::Error,
            LogMetadata::Dispatch {
                endpoint: endpoint.to_string(),
                status: None,
            },
        )),
    }
}

/// Build the router with the page and dispatch routes
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_page))
        .route("/dispatch", post(handle_dispatch))
        .with_state(state)
}

async fn handle_page(State(state): State<AppState>) -> Html<String> {
    let entries = state.inner.status.snapshot();
    let endpoint = state.inner.endpoint.lock().unwrap().clone();
    Html(page::render_page(&state.inner.view, &entries, &endpoint))
}

#[derive(Debug, Deserialize)]
struct DispatchForm {
    endpoint: String,
}

async fn handle_dispatch(
    State(state): State<AppState>,
    Form(form): Form<DispatchForm>,
) -> Redirect {
    let endpoint = form.endpoint.trim().to_string();
    *state.inner.endpoint.lock().unwrap() = endpoint.clone();

    let reading = state.inner.view.reading;
    // ureq is synchronous; keep it off the async runtime
    let outcome = match tokio::task::spawn_blocking({
        let endpoint = endpoint.clone();
        move || dispatch(&endpoint, &reading)
    })
    .await
    {
        Ok(outcome) => outcome,
        Err(err) => DispatchOutcome::Transport(format!("Dispatch task failed: {err}")),
    };

    record_outcome(&state.inner.status, &endpoint, outcome);
    Redirect::to("/")
}

/// Run the page server until the shutdown channel fires
pub fn serve(listen: &str, state: AppState, shutdown_rx: flume::Receiver<()>) -> Result<()> {
    log::info!("Starting page server on {listen}");

    let app = router(state);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("Failed to create tokio runtime: {e}"))?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(listen)
            .await
            .map_err(|e| anyhow!("Failed to bind page server to {listen}: {e}"))?;

        log::info!("Page server listening on http://{listen}");

        let shutdown_signal = async move {
            match shutdown_rx.recv_async().await {
                Ok(()) => log::info!("Page server received shutdown signal, exiting"),
                Err(_) => log::info!("Shutdown channel closed, exiting"),
            }
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| anyhow!("Page server error: {e}"))?;

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_failure_substitutes_defaults() {
        let status = StatusLog::new(10);
        let resolved = resolve_outcome(Err(AcquireError::Exhausted { attempts: 5 }), &status);

        assert!(resolved.fallback);
        assert_eq!(resolved.reading.latitude, 13.394968);
        assert_eq!(resolved.reading.longitude, 77.728851);
        assert!(status
            .snapshot()
            .iter()
            .any(|entry| entry.message.contains("default coordinates")));
    }

    #[test]
    fn test_resolve_success_keeps_reading() {
        let status = StatusLog::new(10);
        let reading = SensorReading {
            latitude: 1.0,
            longitude: 2.0,
            distance1: 3.0,
            distance2: 4.0,
            distance3: 5.0,
        };

        let resolved = resolve_outcome(Ok(reading), &status);
        assert!(!resolved.fallback);
        assert_eq!(resolved.reading, reading);
    }

    #[test]
    fn test_record_outcome_messages() {
        let status = StatusLog::new(10);
        record_outcome(
            &status,
            "http://h/api",
            DispatchOutcome::Accepted {
                status: 200,
                body: "{\"ok\":true}".to_string(),
            },
        );
        record_outcome(
            &status,
            "http://h/api",
            DispatchOutcome::Rejected {
                status: 500,
                body: "boom".to_string(),
            },
        );
        record_outcome(
            &status,
            "http://h/api",
            DispatchOutcome::Transport("connection refused".to_string()),
        );

        let entries = status.snapshot();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].message.contains("Data sent successfully"));
        assert!(entries[0].message.contains("{\"ok\":true}"));
        assert!(entries[1].message.contains("Status code: 500"));
        assert!(entries[1].message.contains("boom"));
        assert!(entries[2].message.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_page_handler_renders_view() {
        let status = StatusLog::new(10);
        let state = AppState::new(
            ResolvedReading::degraded(),
            status,
            "http://example.com/api".to_string(),
        );

        let Html(body) = handle_page(State(state)).await;
        assert!(body.contains("setView([13.394968, 77.728851], 15)"));
        assert!(body.contains("value=\"http://example.com/api\""));
    }
}
