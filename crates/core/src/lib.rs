pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod payload;
pub mod provider;

pub use config::{AnalyticsConfig, ApiCallback, BeaconSettings, HttpHeaders, Transport};
pub use diagnostics::DiagnosticSink;
pub use error::{BeaconError, BeaconResult};
pub use logging::{log_message, LogCallback, LogLevel};
pub use payload::{AnalyticsPayload, EventDetails, EventType};
pub use provider::{AnalyticsConfigProvider, AnalyticsConfigProviderProps};
