//! Alert history view state and its transitions
//!
//! Transitions are plain functions of `(state, event)`. Side effects are
//! returned as a [`Command`] for the controller to run; their completions come
//! back as events.

use alert_history_common::{AlertRecord, TimeWindow};
use serde::Serialize;

use crate::client::ClientError;
use crate::mapper;
use crate::query::QueryOutcome;

/// Where the view is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initializing,
    ProbingCapability,
    NoCapability,
    Loading,
    Ready,
    Error,
}

/// Error shown alongside the view state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ViewError {
    /// The alerting engine or the query endpoint could not be reached
    #[error("Could not reach the alerting engine: {0}")]
    Transport(String),
    /// The query returned rows that could not be turned into alerts
    #[error("Could not read alert history: {0}")]
    Mapping(String),
}

impl From<ClientError> for ViewError {
    fn from(e: ClientError) -> Self {
        ViewError::Transport(e.to_string())
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// The view was mounted
    Mount,
    CapabilityProbed(Result<bool, ViewError>),
    AlertsFetched {
        request: u64,
        result: Result<QueryOutcome, ViewError>,
    },
    TogglePicker,
    ClosePicker,
    ApplyWindow(TimeWindow),
    /// Re-run whichever step put the view into `Error`
    Retry,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ProbeCapability,
    FetchAlerts { request: u64, window: TimeWindow },
}

/// Everything the rendering layer needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub phase: Phase,
    pub loading: bool,
    pub has_capability: bool,
    pub alerts: Vec<AlertRecord>,
    pub time_window: TimeWindow,
    pub is_picker_open: bool,
    pub error: Option<ViewError>,
    /// Sequence number of the most recently issued fetch
    pub latest_request: u64,
}

impl ViewState {
    pub fn new(time_window: TimeWindow) -> Self {
        Self {
            phase: Phase::Initializing,
            loading: true,
            has_capability: false,
            alerts: Vec::new(),
            time_window,
            is_picker_open: false,
            error: None,
            latest_request: 0,
        }
    }

    /// Apply one event in place, returning the side effect it requires
    pub fn apply(&mut self, event: ViewEvent) -> Option<Command> {
        let before = self.phase;

        let command = match event {
            ViewEvent::Mount => self.on_mount(),
            ViewEvent::CapabilityProbed(result) => self.on_probed(result),
            ViewEvent::AlertsFetched { request, result } => self.on_fetched(request, result),
            ViewEvent::TogglePicker => {
                self.is_picker_open = !self.is_picker_open;
                None
            }
            ViewEvent::ClosePicker => {
                self.is_picker_open = false;
                None
            }
            ViewEvent::ApplyWindow(window) => self.on_window(window),
            ViewEvent::Retry => self.on_retry(),
        };

        if before != self.phase {
            tracing::debug!(from = ?before, to = ?self.phase, "Alert history view transition");
        }
        command
    }

    fn on_mount(&mut self) -> Option<Command> {
        if self.phase != Phase::Initializing {
            return None;
        }
        self.phase = Phase::ProbingCapability;
        self.loading = true;
        Some(Command::ProbeCapability)
    }

    fn on_probed(&mut self, result: Result<bool, ViewError>) -> Option<Command> {
        if self.phase != Phase::ProbingCapability {
            tracing::debug!(phase = ?self.phase, "Ignoring capability result outside of probing");
            return None;
        }

        match result {
            Ok(true) => {
                self.has_capability = true;
                self.error = None;
                Some(self.start_fetch())
            }
            Ok(false) => {
                self.has_capability = false;
                self.loading = false;
                self.error = None;
                self.phase = Phase::NoCapability;
                None
            }
            Err(e) => {
                self.has_capability = false;
                self.fail(e);
                None
            }
        }
    }

    fn on_fetched(&mut self, request: u64, result: Result<QueryOutcome, ViewError>) -> Option<Command> {
        if request != self.latest_request || self.phase != Phase::Loading {
            tracing::debug!(
                request,
                latest = self.latest_request,
                "Discarding stale alert history response"
            );
            return None;
        }

        self.loading = false;
        match result {
            Ok(QueryOutcome::Empty) => {
                self.alerts.clear();
                self.error = None;
                self.phase = Phase::Ready;
            }
            Ok(QueryOutcome::Series(raw)) => {
                match mapper::map(&raw) {
                    Ok(alerts) => {
                        self.alerts = alerts;
                        self.error = None;
                    }
                    Err(e) => {
                        // keep the last good alerts on screen
                        tracing::warn!("Failed to map alert history: {}", e);
                        self.error = Some(ViewError::Mapping(e.to_string()));
                    }
                }
                self.phase = Phase::Ready;
            }
            Err(e) => self.fail(e),
        }
        None
    }

    fn on_window(&mut self, window: TimeWindow) -> Option<Command> {
        if window == self.time_window {
            return None;
        }
        self.time_window = window;

        match self.phase {
            Phase::Loading | Phase::Ready | Phase::Error if self.has_capability => Some(self.start_fetch()),
            _ => None,
        }
    }

    fn on_retry(&mut self) -> Option<Command> {
        if self.phase != Phase::Error {
            return None;
        }
        self.error = None;

        if self.has_capability {
            Some(self.start_fetch())
        } else {
            self.phase = Phase::ProbingCapability;
            self.loading = true;
            Some(Command::ProbeCapability)
        }
    }

    fn start_fetch(&mut self) -> Command {
        self.latest_request += 1;
        self.phase = Phase::Loading;
        self.loading = true;
        Command::FetchAlerts {
            request: self.latest_request,
            window: self.time_window.clone(),
        }
    }

    fn fail(&mut self, error: ViewError) {
        tracing::warn!("{}", error);
        self.loading = false;
        self.error = Some(error);
        self.phase = Phase::Error;
    }
}

/// Pure form of [`ViewState::apply`]
pub fn transition(mut state: ViewState, event: ViewEvent) -> (ViewState, Option<Command>) {
    let command = state.apply(event);
    (state, command)
}
