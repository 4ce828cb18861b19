//! Interaction tracker — attaches delegated capture-phase listeners to a
//! document, filters events by include/exclude selectors, builds the
//! enriched payload and hands it to the dispatcher as a detached task.
//!
//! The tracker is either idle (no listeners) or tracking. Configuration is
//! read when an event fires, so changes made through
//! [`InteractionTracker::update_config`] apply to the next event. Event
//! names and selectors are resolved once per `start_event_tracking`.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use beacon_core::config::{DEFAULT_EVENTS, DEFAULT_INCLUDE_SELECTORS};
use beacon_core::payload::merge_payload;
use beacon_core::{
    log_message, AnalyticsConfig, AnalyticsPayload, ApiCallback, BeaconResult, BeaconSettings,
    EventDetails, EventType, HttpHeaders, LogCallback, LogLevel, Transport,
};
use parking_lot::{RwLock, RwLockReadGuard};
use serde_json::{Map, Value};
use tracing::{debug, info, trace};
use url::Url;

use crate::classify::map_event_type;
use crate::dispatch::Dispatcher;
use crate::dom::{listener, Document, DomEvent, ListenerId};
use crate::selectors::{element_matches_any, validate_and_filter_selectors};

/// Builds the additional payload from the raw event. Replaces the default
/// empty payload; metadata and page details are still merged underneath.
pub type CustomPayloadFn = Arc<dyn Fn(&DomEvent<'_>) -> Map<String, Value> + Send + Sync>;

/// Computes the logged target from the raw event.
pub type TargetResolverFn = Arc<dyn Fn(&DomEvent<'_>) -> String + Send + Sync>;

#[derive(Clone)]
pub enum TargetOverride {
    Literal(String),
    Resolver(TargetResolverFn),
}

impl fmt::Debug for TargetOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetOverride::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            TargetOverride::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// Interaction tracker configuration. Every `Option` slot that is `None`
/// falls back to the default behaviour.
#[derive(Clone, Default)]
pub struct TrackerConfig {
    pub url: Option<Url>,
    pub headers: HttpHeaders,
    pub log_callback: Option<LogCallback>,
    pub api_callback: Option<ApiCallback>,
    /// DOM event names to observe. Default: `click`, `change`.
    pub events: Option<Vec<String>>,
    /// Default: `button`, `a`, `select`, `input`.
    pub include_selectors: Option<Vec<String>>,
    /// Default: none.
    pub exclude_selectors: Option<Vec<String>>,
    /// Merged into every payload above the page details.
    pub meta_data: Map<String, Value>,
    pub custom_payload: Option<CustomPayloadFn>,
    /// Forces the logged event type instead of classifying the event.
    pub logged_event_type: Option<EventType>,
    pub target: Option<TargetOverride>,
}

impl TrackerConfig {
    /// Seed the transport fields from a provider configuration.
    pub fn from_analytics(config: &AnalyticsConfig) -> Self {
        Self {
            url: config.url().cloned(),
            headers: config.headers.clone().unwrap_or_default(),
            log_callback: config.log_callback.clone(),
            api_callback: config.api_callback.clone(),
            ..Default::default()
        }
    }

    /// Build from declarative settings. Unlike [`AnalyticsConfig`], a missing
    /// URL is allowed here; dispatch then fails per event.
    pub fn from_settings(settings: &BeaconSettings) -> BeaconResult<Self> {
        let url = settings.url.as_deref().map(Url::parse).transpose()?;
        let tracker = &settings.tracker;
        Ok(Self {
            url,
            headers: settings.headers.clone(),
            events: tracker.events.clone(),
            include_selectors: tracker.include_selectors.clone(),
            exclude_selectors: tracker.exclude_selectors.clone(),
            meta_data: tracker
                .meta_data
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
            logged_event_type: tracker.logged_event_type,
            target: tracker.target.clone().map(TargetOverride::Literal),
            ..Default::default()
        })
    }

    pub fn with_url(mut self, url: &str) -> BeaconResult<Self> {
        self.url = Some(Url::parse(url)?);
        Ok(self)
    }

    pub fn with_headers(mut self, headers: HttpHeaders) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_log_callback(mut self, callback: LogCallback) -> Self {
        self.log_callback = Some(callback);
        self
    }

    pub fn with_api_callback(mut self, callback: ApiCallback) -> Self {
        self.api_callback = Some(callback);
        self
    }

    pub fn with_events<S: Into<String>>(mut self, events: impl IntoIterator<Item = S>) -> Self {
        self.events = Some(events.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_include_selectors<S: Into<String>>(
        mut self,
        selectors: impl IntoIterator<Item = S>,
    ) -> Self {
        self.include_selectors = Some(selectors.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_exclude_selectors<S: Into<String>>(
        mut self,
        selectors: impl IntoIterator<Item = S>,
    ) -> Self {
        self.exclude_selectors = Some(selectors.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_meta_data(mut self, meta_data: Map<String, Value>) -> Self {
        self.meta_data = meta_data;
        self
    }

    pub fn with_custom_payload<F>(mut self, f: F) -> Self
    where
        F: Fn(&DomEvent<'_>) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.custom_payload = Some(Arc::new(f));
        self
    }

    pub fn with_logged_event_type(mut self, event_type: EventType) -> Self {
        self.logged_event_type = Some(event_type);
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(TargetOverride::Literal(target.into()));
        self
    }

    pub fn with_target_resolver<F>(mut self, f: F) -> Self
    where
        F: Fn(&DomEvent<'_>) -> String + Send + Sync + 'static,
    {
        self.target = Some(TargetOverride::Resolver(Arc::new(f)));
        self
    }

    pub fn resolved_events(&self) -> Vec<String> {
        resolve(&self.events, DEFAULT_EVENTS)
    }

    pub fn resolved_include_selectors(&self) -> Vec<String> {
        resolve(&self.include_selectors, DEFAULT_INCLUDE_SELECTORS)
    }

    pub fn resolved_exclude_selectors(&self) -> Vec<String> {
        resolve(&self.exclude_selectors, &[])
    }

    pub fn transport(&self) -> Transport {
        Transport {
            url: self.url.clone(),
            headers: self.headers.clone(),
            log_callback: self.log_callback.clone(),
            api_callback: self.api_callback.clone(),
        }
    }
}

fn resolve(configured: &Option<Vec<String>>, defaults: &[&str]) -> Vec<String> {
    match configured {
        Some(values) => values.clone(),
        None => defaults.iter().map(|s| s.to_string()).collect(),
    }
}

impl fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("url", &self.url.as_ref().map(Url::as_str))
            .field("events", &self.events)
            .field("include_selectors", &self.include_selectors)
            .field("exclude_selectors", &self.exclude_selectors)
            .field("logged_event_type", &self.logged_event_type)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Idle,
    Tracking,
}

/// State shared between the tracker and the listeners it installs.
struct TrackerCore {
    config: RwLock<TrackerConfig>,
    dispatcher: Dispatcher,
}

impl TrackerCore {
    fn handle(&self, event_name: &str, include: &[String], exclude: &[String], event: &DomEvent<'_>) {
        let Some(target) = event.target() else {
            return;
        };

        let diagnostics = self.dispatcher.diagnostics();
        let included = element_matches_any(include, target, &**diagnostics);
        let excluded = element_matches_any(exclude, target, &**diagnostics);
        if !included || excluded {
            metrics::counter!("beacon.events.filtered").increment(1);
            trace!(event = event_name, included, excluded, "interaction not tracked");
            return;
        }

        // Copy the strategy slots out so host callbacks run without the lock.
        let (forced_type, target_override, custom_payload) = {
            let config = self.config.read();
            (
                config.logged_event_type,
                config.target.clone(),
                config.custom_payload.clone(),
            )
        };

        let event_type = forced_type.unwrap_or_else(|| map_event_type(event_name, target));
        let logged_target = match target_override {
            Some(TargetOverride::Literal(value)) => value,
            Some(TargetOverride::Resolver(resolve)) => resolve(event),
            None => event_name.to_string(),
        };
        let additional = custom_payload.map(|build| build(event)).unwrap_or_default();

        metrics::counter!("beacon.events.tracked").increment(1);
        let document = event.document();
        let details = EventDetails::new(document.location(), document.title());
        let task = self.log_event_task(details, event_type, logged_target, additional);
        self.dispatcher.spawn(task);
    }

    fn log_event_task(
        &self,
        details: EventDetails,
        event_type: EventType,
        target: String,
        additional: Map<String, Value>,
    ) -> impl Future<Output = ()> + Send + 'static {
        let (transport, meta_data) = {
            let config = self.config.read();
            (config.transport(), config.meta_data.clone())
        };

        let details = details.into_map();
        let merged = merge_payload([&details, &meta_data, &additional]);
        let payload = AnalyticsPayload::new(event_type, target, Some(String::new()), Some(merged));

        if let Some(callback) = &transport.log_callback {
            log_message(
                &format!("Logging {event_type} event for target: {}", payload.target),
                LogLevel::Info,
                Some(callback),
            );
        }

        let dispatcher = self.dispatcher.clone();
        async move { dispatcher.send(transport, payload).await }
    }
}

pub struct InteractionTracker {
    core: Arc<TrackerCore>,
    document: Rc<Document>,
    listeners: HashMap<String, Vec<ListenerId>>,
    state: TrackingState,
}

impl InteractionTracker {
    pub fn new(config: TrackerConfig, document: Rc<Document>) -> Self {
        Self::with_dispatcher(config, document, Dispatcher::new())
    }

    pub fn with_dispatcher(
        config: TrackerConfig,
        document: Rc<Document>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            core: Arc::new(TrackerCore {
                config: RwLock::new(config),
                dispatcher,
            }),
            document,
            listeners: HashMap::new(),
            state: TrackingState::Idle,
        }
    }

    pub fn tracker_config(&self) -> RwLockReadGuard<'_, TrackerConfig> {
        self.core.config.read()
    }

    /// Mutate the configuration; listeners see the change on the next event.
    pub fn update_config(&self, update: impl FnOnce(&mut TrackerConfig)) {
        update(&mut self.core.config.write());
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn document(&self) -> &Rc<Document> {
        &self.document
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.core.dispatcher
    }

    /// Number of listener handles currently recorded by this tracker.
    pub fn registered_listeners(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    /// Attach one capture-phase listener per configured event name.
    ///
    /// Calling this again while tracking adds a second set of listeners, so
    /// each matching event is dispatched once per call. All of them are
    /// removed by [`stop_event_tracking`](Self::stop_event_tracking).
    pub fn start_event_tracking(&mut self) {
        let (events, include, exclude) = {
            let config = self.core.config.read();
            (
                config.resolved_events(),
                config.resolved_include_selectors(),
                config.resolved_exclude_selectors(),
            )
        };

        let diagnostics = Arc::clone(self.core.dispatcher.diagnostics());
        let include: Rc<[String]> = validate_and_filter_selectors(&include, &*diagnostics).into();
        let exclude: Rc<[String]> = validate_and_filter_selectors(&exclude, &*diagnostics).into();

        for event_name in &events {
            let core = Arc::clone(&self.core);
            let name = event_name.clone();
            let include = Rc::clone(&include);
            let exclude = Rc::clone(&exclude);
            let handler = listener(move |event| core.handle(&name, &include, &exclude, event));

            let id = self.document.add_event_listener(event_name, handler, true);
            self.listeners.entry(event_name.clone()).or_default().push(id);
        }

        if self.state == TrackingState::Tracking {
            debug!(events = ?events, "tracking restarted without stop; listeners added again");
        }
        self.state = TrackingState::Tracking;
        info!(
            events = ?events,
            include = ?include,
            exclude = ?exclude,
            "interaction tracking started"
        );
    }

    /// Remove every listener this tracker recorded. A no-op when idle.
    pub fn stop_event_tracking(&mut self) {
        let mut removed = 0usize;
        for (event_name, ids) in self.listeners.drain() {
            for id in ids {
                if self.document.remove_event_listener(&event_name, id, true) {
                    removed += 1;
                }
            }
        }
        if self.state == TrackingState::Tracking {
            info!(removed, "interaction tracking stopped");
        }
        self.state = TrackingState::Idle;
    }

    /// Build the payload for one event and return its delivery. Page details
    /// and the INFO log line are captured now; delivery happens when the
    /// future is polled. Failures are reported, never returned.
    pub fn log_event(
        &self,
        event_type: EventType,
        target: impl Into<String>,
        additional_payload: Map<String, Value>,
    ) -> impl Future<Output = ()> + Send + 'static {
        let details = EventDetails::new(self.document.location(), self.document.title());
        self.core
            .log_event_task(details, event_type, target.into(), additional_payload)
    }

    /// Wait for deliveries started by listeners to finish.
    pub fn settle(&self) -> impl Future<Output = ()> + Send + 'static {
        let dispatcher = self.core.dispatcher.clone();
        async move { dispatcher.settle().await }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::format_target;
    use beacon_core::config::api_callback;
    use beacon_core::diagnostics::{capture_sink, CaptureSink, Severity};
    use beacon_core::logging::CaptureLog;
    use parking_lot::Mutex;
    use serde_json::json;

    const PAGE: &str = r#"<html><head><title>Store</title></head><body>
        <div id="outer"><button class="inner" id="buy"><span id="buy-label">Buy</span></button></div>
        <button id="skip" class="no-track">Skip</button>
        <a id="home" href="/home"> Home </a>
        <input id="email" type="email">
        <select id="plan"><option>Pro</option></select>
        <div id="plain">Plain</div>
    </body></html>"#;

    type Captured = Arc<Mutex<Vec<AnalyticsPayload>>>;

    fn document() -> Rc<Document> {
        Rc::new(Document::parse(PAGE, "https://shop.example.com/cart"))
    }

    fn capturing(config: TrackerConfig) -> (TrackerConfig, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        let config = config.with_api_callback(api_callback(move |payload| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().push(payload);
                Ok(())
            }
        }));
        (config, captured)
    }

    fn tracker(config: TrackerConfig) -> (InteractionTracker, Captured, Arc<CaptureSink>) {
        let (config, captured) = capturing(config);
        let sink = capture_sink();
        let dispatcher = Dispatcher::new().with_diagnostics(sink.clone());
        let tracker = InteractionTracker::with_dispatcher(config, document(), dispatcher);
        (tracker, captured, sink)
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_defaults_resolved() {
        let config = TrackerConfig::default();
        assert_eq!(config.resolved_events(), vec!["click", "change"]);
        assert_eq!(
            config.resolved_include_selectors(),
            vec!["button", "a", "select", "input"]
        );
        assert!(config.resolved_exclude_selectors().is_empty());
    }

    #[test]
    fn test_default_start_registers_click_and_change() {
        let (mut tracker, _, _) = tracker(TrackerConfig::default());
        assert_eq!(tracker.state(), TrackingState::Idle);

        tracker.start_event_tracking();

        assert_eq!(tracker.state(), TrackingState::Tracking);
        let doc = tracker.document();
        assert_eq!(doc.listener_count("click"), 1);
        assert_eq!(doc.listener_count("change"), 1);
        assert_eq!(doc.total_listener_count(), 2);
        assert_eq!(tracker.registered_listeners(), 2);
    }

    #[tokio::test]
    async fn test_default_tags_tracked() {
        let (mut tracker, captured, _) = tracker(TrackerConfig::default());
        tracker.start_event_tracking();
        let doc = Rc::clone(tracker.document());

        doc.fire("click", "#buy").unwrap();
        doc.fire("click", "#home").unwrap();
        doc.fire("change", "#plan").unwrap();
        doc.fire("click", "#plain").unwrap();
        tracker.settle().await;

        let types: Vec<EventType> = captured.lock().iter().map(|p| p.event_type).collect();
        assert_eq!(
            types,
            vec![EventType::Navigation, EventType::Link, EventType::UserInput]
        );
    }

    #[tokio::test]
    async fn test_include_exclude_filtering() {
        let (mut tracker, captured, _) = tracker(
            TrackerConfig::default()
                .with_events(["click"])
                .with_include_selectors(["button"])
                .with_exclude_selectors([".no-track"]),
        );
        tracker.start_event_tracking();
        let doc = Rc::clone(tracker.document());

        doc.fire("click", "#buy").unwrap();
        tracker.settle().await;
        assert_eq!(captured.lock().len(), 1);

        doc.fire("click", "#skip").unwrap();
        doc.fire("click", "#home").unwrap();
        tracker.settle().await;
        assert_eq!(captured.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_nested_target_matches_through_ancestor() {
        let (mut tracker, captured, _) =
            tracker(TrackerConfig::default().with_include_selectors(["#outer"]));
        tracker.start_event_tracking();
        let doc = Rc::clone(tracker.document());

        doc.fire("click", "#buy-label").unwrap();
        tracker.settle().await;

        let captured = captured.lock();
        assert_eq!(captured.len(), 1);
        // Classified by the actual target, a <span>.
        assert_eq!(captured[0].event_type, EventType::Other);
    }

    #[tokio::test]
    async fn test_missing_target_dropped() {
        let (mut tracker, captured, sink) = tracker(TrackerConfig::default());
        tracker.start_event_tracking();

        tracker.document().dispatch_event("click", None);
        tracker.settle().await;

        assert!(captured.lock().is_empty());
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_default_payload_shape() {
        let meta = object(json!({ "app": "storefront", "pageTitle": "Meta title" }));
        let (mut tracker, captured, _) = tracker(TrackerConfig::default().with_meta_data(meta));
        tracker.start_event_tracking();
        let doc = Rc::clone(tracker.document());

        doc.fire("click", "#home").unwrap();
        tracker.settle().await;

        let captured = captured.lock();
        let payload = &captured[0];
        assert_eq!(payload.event_type, EventType::Link);
        assert_eq!(payload.target, "click");
        assert_eq!(payload.error_message.as_deref(), Some(""));
        assert_eq!(
            payload.additional_payload,
            Some(object(json!({
                "pageUrl": "https://shop.example.com/cart",
                "pageTitle": "Meta title",
                "app": "storefront"
            })))
        );
    }

    #[tokio::test]
    async fn test_custom_payload_wins_over_meta() {
        let (mut tracker, captured, _) = tracker(
            TrackerConfig::default()
                .with_meta_data(object(json!({ "app": "storefront", "plan": "free" })))
                .with_custom_payload(|event| {
                    let mut map = Map::new();
                    map.insert("plan".into(), json!("pro"));
                    map.insert("dom".into(), json!(event.event_type()));
                    map
                }),
        );
        tracker.start_event_tracking();
        let doc = Rc::clone(tracker.document());

        doc.fire("change", "#email").unwrap();
        tracker.settle().await;

        let captured = captured.lock();
        let extra = captured[0].additional_payload.as_ref().unwrap();
        assert_eq!(extra["plan"], "pro");
        assert_eq!(extra["app"], "storefront");
        assert_eq!(extra["dom"], "change");
        assert_eq!(extra["pageTitle"], "Store");
    }

    #[tokio::test]
    async fn test_forced_type_and_literal_target() {
        let (mut tracker, captured, _) = tracker(
            TrackerConfig::default()
                .with_logged_event_type(EventType::Outbound)
                .with_target("cta"),
        );
        tracker.start_event_tracking();
        let doc = Rc::clone(tracker.document());

        doc.fire("click", "#buy").unwrap();
        tracker.settle().await;

        let captured = captured.lock();
        assert_eq!(captured[0].event_type, EventType::Outbound);
        assert_eq!(captured[0].target, "cta");
    }

    #[tokio::test]
    async fn test_target_resolver_receives_event() {
        let (mut tracker, captured, _) = tracker(TrackerConfig::default().with_target_resolver(
            |event| {
                let target = event.target().expect("tracked events have a target");
                format_target("Link", target)
            },
        ));
        tracker.start_event_tracking();
        let doc = Rc::clone(tracker.document());

        doc.fire("click", "#home").unwrap();
        tracker.settle().await;

        assert_eq!(captured.lock()[0].target, "Home </home>");
    }

    #[tokio::test]
    async fn test_config_read_at_event_time() {
        let (mut tracker, captured, _) = tracker(TrackerConfig::default().with_target("before"));
        tracker.start_event_tracking();
        let doc = Rc::clone(tracker.document());

        doc.fire("click", "#buy").unwrap();
        tracker.update_config(|config| config.target = Some(TargetOverride::Literal("after".into())));
        doc.fire("click", "#buy").unwrap();
        tracker.settle().await;

        let targets: Vec<String> = captured.lock().iter().map(|p| p.target.clone()).collect();
        assert_eq!(targets, vec!["before", "after"]);
    }

    #[tokio::test]
    async fn test_stop_removes_every_listener() {
        let (mut tracker, captured, _) = tracker(TrackerConfig::default());
        tracker.start_event_tracking();
        tracker.stop_event_tracking();

        assert_eq!(tracker.state(), TrackingState::Idle);
        assert_eq!(tracker.document().total_listener_count(), 0);
        assert_eq!(tracker.registered_listeners(), 0);

        tracker.document().fire("click", "#buy").unwrap();
        tracker.settle().await;
        assert!(captured.lock().is_empty());
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let doc = document();
        let other = doc.add_event_listener("click", listener(|_| {}), true);
        let mut tracker = InteractionTracker::new(TrackerConfig::default(), Rc::clone(&doc));

        tracker.stop_event_tracking();

        assert_eq!(tracker.state(), TrackingState::Idle);
        assert_eq!(doc.total_listener_count(), 1);
        assert!(doc.remove_event_listener("click", other, true));
    }

    #[tokio::test]
    async fn test_repeated_start_duplicates_dispatch() {
        let (mut tracker, captured, _) = tracker(TrackerConfig::default());
        tracker.start_event_tracking();
        tracker.start_event_tracking();
        let doc = Rc::clone(tracker.document());

        assert_eq!(doc.listener_count("click"), 2);
        doc.fire("click", "#buy").unwrap();
        tracker.settle().await;
        assert_eq!(captured.lock().len(), 2);

        tracker.stop_event_tracking();
        assert_eq!(doc.total_listener_count(), 0);
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let (mut tracker, captured, _) = tracker(TrackerConfig::default());
        tracker.start_event_tracking();
        tracker.stop_event_tracking();
        tracker.start_event_tracking();
        let doc = Rc::clone(tracker.document());

        doc.fire("click", "#buy").unwrap();
        tracker.settle().await;
        assert_eq!(captured.lock().len(), 1);
    }

    #[test]
    fn test_invalid_selectors_warned_once_at_start() {
        let (mut tracker, _, sink) = tracker(
            TrackerConfig::default()
                .with_include_selectors(["button", "##bad", ""])
                .with_exclude_selectors(["div["]),
        );
        tracker.start_event_tracking();

        assert_eq!(
            sink.messages(Severity::Warning),
            vec![
                "Invalid selector syntax provided: ##bad".to_string(),
                "Invalid selector syntax provided: ".to_string(),
                "Invalid selector syntax provided: div[".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_trackers_are_independent() {
        let doc = document();
        let (config_a, captured_a) = capturing(TrackerConfig::default().with_events(["click"]));
        let (config_b, captured_b) = capturing(TrackerConfig::default().with_events(["click"]));
        let mut a = InteractionTracker::new(config_a, Rc::clone(&doc));
        let mut b = InteractionTracker::new(config_b, Rc::clone(&doc));

        a.start_event_tracking();
        b.start_event_tracking();
        a.stop_event_tracking();

        doc.fire("click", "#buy").unwrap();
        b.settle().await;

        assert!(captured_a.lock().is_empty());
        assert_eq!(captured_b.lock().len(), 1);
        assert_eq!(doc.listener_count("click"), 1);
    }

    #[tokio::test]
    async fn test_log_event_info_line_and_callback() {
        let log = CaptureLog::new();
        let (tracker, captured, _) =
            tracker(TrackerConfig::default().with_log_callback(log.callback()));

        let delivery = tracker.log_event(EventType::Link, "Home </home>", Map::new());
        // The INFO line is written before delivery starts.
        assert_eq!(
            log.lines(),
            vec![(
                "Logging Link event for target: Home </home>".to_string(),
                LogLevel::Info
            )]
        );
        delivery.await;

        assert_eq!(captured.lock().len(), 1);
        assert_eq!(log.count_level(LogLevel::Error), 0);
    }

    #[tokio::test]
    async fn test_log_event_without_transport_logs_error() {
        let log = CaptureLog::new();
        let sink = capture_sink();
        let tracker = InteractionTracker::with_dispatcher(
            TrackerConfig::default().with_log_callback(log.callback()),
            document(),
            Dispatcher::new().with_diagnostics(sink.clone()),
        );

        tracker.log_event(EventType::Other, "x", Map::new()).await;

        let errors: Vec<String> = log
            .lines()
            .into_iter()
            .filter(|(_, level)| *level == LogLevel::Error)
            .map(|(message, _)| message)
            .collect();
        assert_eq!(
            errors,
            vec!["Error sending tracking event: 'Other' to tracking API: No apiCallback or url provided for analytics tracking.".to_string()]
        );
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_log_event_without_transport_or_logger_uses_diagnostics() {
        let sink = capture_sink();
        let tracker = InteractionTracker::with_dispatcher(
            TrackerConfig::default(),
            document(),
            Dispatcher::new().with_diagnostics(sink.clone()),
        );

        tracker.log_event(EventType::Other, "x", Map::new()).await;

        assert_eq!(
            sink.messages(Severity::Error),
            vec!["Tracking failed: No apiCallback or url provided for analytics tracking.".to_string()]
        );
    }

    #[test]
    fn test_from_settings() {
        let settings: BeaconSettings = serde_json::from_value(json!({
            "url": "https://collect.example.com/events",
            "tracker": {
                "include_selectors": ["a.nav"],
                "meta_data": { "app": "docs" },
                "target": "nav"
            }
        }))
        .unwrap();

        let config = TrackerConfig::from_settings(&settings).unwrap();
        assert_eq!(
            config.url.as_ref().map(Url::as_str),
            Some("https://collect.example.com/events")
        );
        assert_eq!(config.resolved_include_selectors(), vec!["a.nav"]);
        assert_eq!(config.resolved_events(), vec!["click", "change"]);
        assert_eq!(config.meta_data["app"], "docs");
        assert!(matches!(config.target, Some(TargetOverride::Literal(ref t)) if t == "nav"));
    }

    #[test]
    fn test_from_analytics_copies_transport() {
        let analytics = AnalyticsConfig::new(
            Some("https://collect.example.com/"),
            Some(HttpHeaders::from([("x-team".to_string(), "web".to_string())])),
            None,
            None,
        )
        .unwrap();
        let config = TrackerConfig::from_analytics(&analytics);
        let transport = config.transport();
        assert_eq!(transport.url.unwrap().as_str(), "https://collect.example.com/");
        assert_eq!(transport.headers["x-team"], "web");
        assert!(config.events.is_none());
    }
}
