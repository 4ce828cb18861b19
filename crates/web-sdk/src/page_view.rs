//! Page-view tracking for host page components.
//!
//! The host calls [`PageViewTracker::track_page_view`] whenever a page is
//! shown or its name/config changes. Delivery failures are logged, never
//! returned.

use std::sync::Arc;

use beacon_core::{
    log_message, AnalyticsConfig, AnalyticsConfigProvider, AnalyticsPayload, BeaconResult,
    EventType, LogLevel, Transport,
};
use tracing::debug;

use crate::dispatch::Dispatcher;

pub const UNKNOWN_PAGE: &str = "UnknownPage";

/// Per-page inputs.
#[derive(Clone, Default)]
pub struct PageTrackingProps {
    pub page_name: Option<String>,
    /// Replaces the provider configuration for this page only.
    pub analytics_config: Option<Arc<AnalyticsConfig>>,
}

impl PageTrackingProps {
    pub fn named(page_name: impl Into<String>) -> Self {
        Self {
            page_name: Some(page_name.into()),
            analytics_config: None,
        }
    }

    pub fn with_config(mut self, config: Arc<AnalyticsConfig>) -> Self {
        self.analytics_config = Some(config);
        self
    }
}

/// Explicit page name, else the component name, else [`UNKNOWN_PAGE`].
/// Empty names count as absent.
pub fn resolve_page_name(page_name: Option<&str>, component_name: Option<&str>) -> String {
    page_name
        .filter(|name| !name.is_empty())
        .or(component_name.filter(|name| !name.is_empty()))
        .unwrap_or(UNKNOWN_PAGE)
        .to_string()
}

#[derive(Clone, Default)]
pub struct PageViewTracker {
    dispatcher: Dispatcher,
}

impl PageViewTracker {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Send one `Navigate` event for the page.
    ///
    /// Fails only when `provider` holds no configuration; that is a host
    /// wiring error, not a delivery failure.
    pub async fn track_page_view(
        &self,
        provider: &AnalyticsConfigProvider,
        props: &PageTrackingProps,
        component_name: Option<&str>,
    ) -> BeaconResult<()> {
        let context = provider.use_analytics_config()?;
        let page_name = resolve_page_name(props.page_name.as_deref(), component_name);
        let transport = page_transport(&context, props.analytics_config.as_deref());

        if let Some(callback) = &transport.log_callback {
            log_message(
                &format!("Sending tracking event: 'page view, {page_name}'"),
                LogLevel::Info,
                Some(callback),
            );
        }

        let payload = AnalyticsPayload::new(EventType::Navigation, page_name, None, None);
        match self.dispatcher.deliver(&transport, &payload).await {
            Ok(()) => {
                metrics::counter!("beacon.dispatch.delivered").increment(1);
                debug!(page = %payload.target, "page view delivered");
            }
            Err(e) => {
                metrics::counter!("beacon.dispatch.failed").increment(1);
                log_message(
                    &format!("Error sending tracking event: 'page view' to tracking API: {e}"),
                    LogLevel::Error,
                    transport.log_callback.as_ref(),
                );
            }
        }
        Ok(())
    }
}

fn page_transport(context: &AnalyticsConfig, page: Option<&AnalyticsConfig>) -> Transport {
    let effective = page.unwrap_or(context);
    let headers = page
        .and_then(|config| config.headers.clone())
        .or_else(|| context.headers.clone())
        .unwrap_or_default();

    Transport {
        headers,
        ..effective.transport()
    }
}
