//! Transport configuration shared by the page-view and interaction trackers,
//! and file/environment settings for hosts that configure tracking
//! declaratively.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;
use url::Url;

use crate::error::{BeaconError, BeaconResult};
use crate::logging::{LogCallback, LogLevel};
use crate::payload::{AnalyticsPayload, EventType};

pub type HttpHeaders = HashMap<String, String>;

/// Host-supplied delivery function. Takes precedence over URL dispatch.
pub type ApiCallback =
    Arc<dyn Fn(AnalyticsPayload) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// DOM events observed when the tracker config names none.
pub const DEFAULT_EVENTS: &[&str] = &["click", "change"];

/// Elements tracked when the tracker config names no include selectors.
pub const DEFAULT_INCLUDE_SELECTORS: &[&str] = &["button", "a", "select", "input"];

/// Wrap an async closure as an [`ApiCallback`].
pub fn api_callback<F, Fut>(f: F) -> ApiCallback
where
    F: Fn(AnalyticsPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |payload| f(payload).boxed())
}

/// Wrap a closure as a [`LogCallback`].
pub fn log_callback<F>(f: F) -> LogCallback
where
    F: Fn(&str, LogLevel) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Snapshot of the delivery fields, taken when an event is dispatched.
#[derive(Clone, Default)]
pub struct Transport {
    pub url: Option<Url>,
    pub headers: HttpHeaders,
    pub log_callback: Option<LogCallback>,
    pub api_callback: Option<ApiCallback>,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("url", &self.url.as_ref().map(Url::as_str))
            .field("headers", &self.headers)
            .field("log_callback", &self.log_callback.is_some())
            .field("api_callback", &self.api_callback.is_some())
            .finish()
    }
}

/// Validated analytics configuration. Construction fails unless a URL or an
/// API callback is supplied.
#[derive(Clone)]
pub struct AnalyticsConfig {
    url: Option<Url>,
    pub headers: Option<HttpHeaders>,
    pub log_callback: Option<LogCallback>,
    pub api_callback: Option<ApiCallback>,
}

impl AnalyticsConfig {
    pub fn new(
        url: Option<&str>,
        headers: Option<HttpHeaders>,
        log_callback: Option<LogCallback>,
        api_callback: Option<ApiCallback>,
    ) -> BeaconResult<Self> {
        if api_callback.is_none() && url.is_none() {
            return Err(BeaconError::Config(
                "You must provide either an apiCallback or a url (with optional headers).".into(),
            ));
        }

        let mut config = Self {
            url: None,
            headers,
            log_callback,
            api_callback,
        };
        config.set_url(url)?;
        Ok(config)
    }

    /// URL-only configuration.
    pub fn with_url(url: &str) -> BeaconResult<Self> {
        Self::new(Some(url), None, None, None)
    }

    /// Callback-only configuration; cannot fail.
    pub fn with_api_callback(api_callback: ApiCallback) -> Self {
        Self {
            url: None,
            headers: None,
            log_callback: None,
            api_callback: Some(api_callback),
        }
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Replace the URL. `None` clears it; an unparsable value leaves the
    /// current URL untouched.
    pub fn set_url(&mut self, url: Option<&str>) -> BeaconResult<()> {
        self.url = match url {
            Some(raw) => Some(Url::parse(raw)?),
            None => None,
        };
        Ok(())
    }

    pub fn transport(&self) -> Transport {
        Transport {
            url: self.url.clone(),
            headers: self.headers.clone().unwrap_or_default(),
            log_callback: self.log_callback.clone(),
            api_callback: self.api_callback.clone(),
        }
    }

    /// Build from declarative settings. Settings cannot carry callbacks, so
    /// a URL is required.
    pub fn from_settings(settings: &BeaconSettings) -> BeaconResult<Self> {
        let headers = (!settings.headers.is_empty()).then(|| settings.headers.clone());
        Self::new(settings.url.as_deref(), headers, None, None)
    }
}

impl fmt::Debug for AnalyticsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticsConfig")
            .field("url", &self.url.as_ref().map(Url::as_str))
            .field("headers", &self.headers)
            .field("log_callback", &self.log_callback.is_some())
            .field("api_callback", &self.api_callback.is_some())
            .finish()
    }
}

/// Root settings. Loaded from environment variables with the prefix
/// `BEACON__` and an optional config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BeaconSettings {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub headers: HttpHeaders,
    #[serde(default)]
    pub tracker: TrackerSettings,
}

/// Interaction tracker settings. Absent lists fall back to the tracker's
/// defaults ([`DEFAULT_EVENTS`], [`DEFAULT_INCLUDE_SELECTORS`]).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackerSettings {
    #[serde(default)]
    pub events: Option<Vec<String>>,
    #[serde(default)]
    pub include_selectors: Option<Vec<String>>,
    #[serde(default)]
    pub exclude_selectors: Option<Vec<String>>,
    #[serde(default)]
    pub meta_data: HashMap<String, String>,
    #[serde(default)]
    pub logged_event_type: Option<EventType>,
    #[serde(default)]
    pub target: Option<String>,
}

impl BeaconSettings {
    /// Load settings from `file` (if given) overlaid with `BEACON__*`
    /// environment variables.
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("BEACON")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("tracker.events")
                .with_list_parse_key("tracker.include_selectors")
                .with_list_parse_key("tracker.exclude_selectors"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
