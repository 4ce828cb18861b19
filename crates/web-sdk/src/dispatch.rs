//! Dispatch strategy — delivers a payload through the host's API callback or
//! an HTTP POST, and contains every failure at this boundary.
//!
//! Deliveries started from DOM listeners run as detached tasks. No timeout is
//! applied: a callback or request that never resolves simply never reports.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::anyhow;
use beacon_core::diagnostics::tracing_sink;
use beacon_core::{
    log_message, AnalyticsPayload, BeaconError, BeaconResult, DiagnosticSink, LogLevel, Transport,
};
use futures::FutureExt;
use reqwest::header::CONTENT_TYPE;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    tasks: TaskTracker,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            tasks: TaskTracker::new(),
            diagnostics: tracing_sink(),
        }
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots, ...).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Route warnings and unlogged failures to `sink`.
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn diagnostics(&self) -> &Arc<dyn DiagnosticSink> {
        &self.diagnostics
    }

    /// Deliver one payload. The API callback wins over the URL when both are
    /// configured. Non-success HTTP statuses are logged but not treated as
    /// failures.
    pub async fn deliver(
        &self,
        transport: &Transport,
        payload: &AnalyticsPayload,
    ) -> BeaconResult<()> {
        if let Some(callback) = &transport.api_callback {
            let call = std::panic::catch_unwind(AssertUnwindSafe(|| callback(payload.clone())))
                .map_err(|panic| BeaconError::Callback(anyhow!(panic_message(panic))))?;
            return AssertUnwindSafe(call)
                .catch_unwind()
                .await
                .map_err(|panic| BeaconError::Callback(anyhow!(panic_message(panic))))?
                .map_err(BeaconError::Callback);
        }

        if let Some(url) = &transport.url {
            let mut request = self.client.post(url.clone());
            for (name, value) in &transport.headers {
                if name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
                    continue;
                }
                request = request.header(name.as_str(), value.as_str());
            }
            let response = request
                .json(payload)
                .send()
                .await
                .map_err(|e| BeaconError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                warn!(%status, url = %url, "analytics endpoint answered with a non-success status");
            }
            return Ok(());
        }

        Err(BeaconError::NoTransport)
    }

    /// Deliver and swallow the outcome. Failures go to the transport's log
    /// callback when there is one, otherwise to the diagnostic sink.
    pub async fn send(&self, transport: Transport, payload: AnalyticsPayload) {
        let event_type = payload.event_type;
        match self.deliver(&transport, &payload).await {
            Ok(()) => {
                metrics::counter!("beacon.dispatch.delivered").increment(1);
                debug!(%event_type, target = %payload.target, "tracking event delivered");
            }
            Err(e) => {
                metrics::counter!("beacon.dispatch.failed").increment(1);
                match &transport.log_callback {
                    Some(callback) => log_message(
                        &format!("Error sending tracking event: '{event_type}' to tracking API: {e}"),
                        LogLevel::Error,
                        Some(callback),
                    ),
                    None => self.diagnostics.error(&format!("Tracking failed: {e}")),
                }
            }
        }
    }

    /// Run `task` detached on the current tokio runtime. Returns `false` and
    /// reports when there is no runtime to run it on.
    pub fn spawn<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let _ = self.tasks.spawn_on(task, &handle);
                true
            }
            Err(_) => {
                self.diagnostics
                    .error("Tracking failed: no async runtime available to dispatch the event");
                false
            }
        }
    }

    /// Number of detached deliveries still running.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Wait until every detached delivery spawned so far has finished.
    pub async fn settle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        return format!("callback panicked: {message}");
    }
    if let Some(message) = panic.downcast_ref::<String>() {
        return format!("callback panicked: {message}");
    }
    "callback panicked".to_string()
}
