//! Alert History client
//!
//! Detects whether a source has an alerting engine, queries its alert events
//! for a time window and keeps a typed view state in sync as the window
//! changes. Rendering is left to the caller, which observes [`view::ViewState`].

// Core modules
pub mod config;
pub mod logging;

// Source access
pub mod client;
pub mod capability;
pub mod query;

// Pure transforms
pub mod mapper;
pub mod time_window;

// View state machine
pub mod view;

pub use alert_history_common as common;
pub use capability::{CapabilityProbe, KapacitorProbe};
pub use config::AlertHistoryConfig;
pub use query::{AlertQueryClient, InfluxAlertQuery, QueryOutcome};
pub use view::{ViewHandle, ViewState, ViewStateController};
