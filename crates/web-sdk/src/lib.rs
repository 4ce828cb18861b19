//! Web SDK — document-level interaction tracking and page-view reporting
//! for hosts that render HTML pages.
//!
//! # Modules
//!
//! - [`dom`] — Parsed document, page location/title and listener registry
//! - [`selectors`] — Include/exclude selector validation and matching
//! - [`classify`] — DOM event to analytics event type, target formatting
//! - [`dispatch`] — API-callback or HTTP delivery of payloads
//! - [`tracker`] — Delegated interaction tracker
//! - [`page_view`] — Page-view events for page components

pub mod classify;
pub mod dispatch;
pub mod dom;
pub mod page_view;
pub mod selectors;
pub mod tracker;

pub use classify::{classify, format_target, map_event_type};
pub use dispatch::Dispatcher;
pub use dom::{listener, Document, DomEvent, EventListener, ListenerId};
pub use page_view::{resolve_page_name, PageTrackingProps, PageViewTracker};
pub use selectors::{element_matches_any, validate_and_filter_selectors};
pub use tracker::{InteractionTracker, TargetOverride, TrackerConfig, TrackingState};
