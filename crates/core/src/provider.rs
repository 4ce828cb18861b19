//! Analytics configuration provider — builds one [`AnalyticsConfig`] for a
//! host subtree and hands it to consumers.
//!
//! A broken configuration never takes the host down: the failure is reported
//! and the provider simply has nothing to hand out.

use std::sync::Arc;

use crate::config::{AnalyticsConfig, ApiCallback, HttpHeaders};
use crate::diagnostics::{tracing_sink, DiagnosticSink};
use crate::error::{BeaconError, BeaconResult};
use crate::logging::{LogCallback, LogLevel};

/// Inputs accepted by [`AnalyticsConfigProvider`].
#[derive(Clone, Default)]
pub struct AnalyticsConfigProviderProps {
    pub url: Option<String>,
    pub headers: Option<HttpHeaders>,
    pub log_callback: Option<LogCallback>,
    pub api_callback: Option<ApiCallback>,
}

pub struct AnalyticsConfigProvider {
    config: Option<Arc<AnalyticsConfig>>,
}

impl AnalyticsConfigProvider {
    pub fn new(props: AnalyticsConfigProviderProps) -> Self {
        Self::with_diagnostics(props, tracing_sink())
    }

    pub fn with_diagnostics(
        props: AnalyticsConfigProviderProps,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let log_callback = props.log_callback.clone();
        let built = AnalyticsConfig::new(
            props.url.as_deref(),
            props.headers,
            props.log_callback,
            props.api_callback,
        );

        match built {
            Ok(config) => Self {
                config: Some(Arc::new(config)),
            },
            Err(e) => {
                diagnostics.error(&format!("AnalyticsConfigProvider error: {e}"));
                if let Some(callback) = log_callback {
                    callback(&e.to_string(), LogLevel::Error);
                }
                Self { config: None }
            }
        }
    }

    /// Wrap an already-built configuration.
    pub fn from_config(config: AnalyticsConfig) -> Self {
        Self {
            config: Some(Arc::new(config)),
        }
    }

    /// The provided configuration, or [`BeaconError::MissingProvider`] when
    /// the provider could not build one.
    pub fn use_analytics_config(&self) -> BeaconResult<Arc<AnalyticsConfig>> {
        self.config.clone().ok_or(BeaconError::MissingProvider)
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }
}
