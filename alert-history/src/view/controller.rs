//! Async driver for the alert history state machine
//!
//! The controller owns the [`ViewState`] and is the only thing that mutates
//! it. Picker requests arrive through a [`ViewHandle`]; probe and query
//! completions come back from spawned tasks. Snapshots are published on a
//! `watch` channel after every event.

use std::collections::HashMap;
use std::sync::Arc;

use alert_history_common::{DurationTable, Source, TimeWindow};
use chrono::Utc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinError, JoinSet};

use super::state::{Command, ViewError, ViewEvent, ViewState};
use crate::capability::{CapabilityProbe, KapacitorProbe};
use crate::client::{ClientError, SourceClient};
use crate::config::AlertHistoryConfig;
use crate::query::{AlertQueryClient, InfluxAlertQuery};
use crate::time_window;

/// Errors building a controller
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] ClientError),
    #[error(transparent)]
    Window(#[from] alert_history_common::Error),
}

/// Errors sending a request to a running view
#[derive(Error, Debug)]
pub enum ViewRequestError {
    #[error("Alert history view has been unmounted")]
    Unmounted,
    #[error(transparent)]
    InvalidWindow(#[from] alert_history_common::Error),
}

enum Inbox {
    Event(ViewEvent),
    Unmount,
}

/// Cloneable handle used by the picker and the rendering layer
#[derive(Clone)]
pub struct ViewHandle {
    tx: mpsc::UnboundedSender<Inbox>,
    state_rx: watch::Receiver<ViewState>,
    durations: Arc<DurationTable>,
}

impl ViewHandle {
    fn send(&self, message: Inbox) -> Result<(), ViewRequestError> {
        self.tx.send(message).map_err(|_| ViewRequestError::Unmounted)
    }

    pub fn toggle_picker(&self) -> Result<(), ViewRequestError> {
        self.send(Inbox::Event(ViewEvent::TogglePicker))
    }

    pub fn close_picker(&self) -> Result<(), ViewRequestError> {
        self.send(Inbox::Event(ViewEvent::ClosePicker))
    }

    /// Apply a window chosen in the picker; it must be a valid absolute window
    pub fn apply_window(&self, window: TimeWindow) -> Result<(), ViewRequestError> {
        window.validate()?;
        self.send(Inbox::Event(ViewEvent::ApplyWindow(window)))
    }

    /// Apply one of the picker's relative ranges, ending now.
    ///
    /// `label` is looked up in the duration table the view was built with.
    pub fn apply_duration(&self, label: &str) -> Result<(), ViewRequestError> {
        let window = time_window::resolve(Some(label), &self.durations, Utc::now())?;
        self.send(Inbox::Event(ViewEvent::ApplyWindow(window)))
    }

    /// Relative ranges the picker can offer
    pub fn durations(&self) -> &DurationTable {
        &self.durations
    }

    pub fn retry(&self) -> Result<(), ViewRequestError> {
        self.send(Inbox::Event(ViewEvent::Retry))
    }

    /// Tear the view down; in-flight requests are abandoned
    pub fn unmount(&self) -> Result<(), ViewRequestError> {
        self.send(Inbox::Unmount)
    }

    /// Latest published state
    pub fn state(&self) -> ViewState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state_rx.clone()
    }

    /// Wait until the published state satisfies `predicate`.
    ///
    /// Returns `None` if the view is torn down first.
    pub async fn wait_for(&self, predicate: impl FnMut(&ViewState) -> bool) -> Option<ViewState> {
        let mut rx = self.state_rx.clone();
        let state = rx.wait_for(predicate).await.ok()?;
        Some(state.clone())
    }
}

/// Owns the alert history state and runs its event loop
pub struct ViewStateController {
    source: Source,
    probe: Arc<dyn CapabilityProbe>,
    query: Arc<dyn AlertQueryClient>,
    state: ViewState,
    events: mpsc::UnboundedReceiver<Inbox>,
    state_tx: watch::Sender<ViewState>,
    tasks: JoinSet<ViewEvent>,
    in_flight: HashMap<task::Id, Command>,
}

impl ViewStateController {
    pub fn new(
        source: Source,
        time_window: TimeWindow,
        probe: Arc<dyn CapabilityProbe>,
        query: Arc<dyn AlertQueryClient>,
    ) -> (Self, ViewHandle) {
        Self::with_durations(source, time_window, probe, query, DurationTable::default())
    }

    /// Like [`ViewStateController::new`], with the relative ranges offered
    /// through [`ViewHandle::apply_duration`].
    pub fn with_durations(
        source: Source,
        time_window: TimeWindow,
        probe: Arc<dyn CapabilityProbe>,
        query: Arc<dyn AlertQueryClient>,
        durations: DurationTable,
    ) -> (Self, ViewHandle) {
        let state = ViewState::new(time_window);
        let (tx, events) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(state.clone());

        let controller = Self {
            source,
            probe,
            query,
            state,
            events,
            state_tx,
            tasks: JoinSet::new(),
            in_flight: HashMap::new(),
        };

        let handle = ViewHandle {
            tx,
            state_rx,
            durations: Arc::new(durations),
        };
        (controller, handle)
    }

    /// Build a controller talking to `base_url` over HTTP, with the initial
    /// window resolved from `hint` against the configured durations.
    pub fn with_config(
        source: Source,
        base_url: &str,
        hint: Option<&str>,
        config: &AlertHistoryConfig,
    ) -> Result<(Self, ViewHandle), SetupError> {
        let window = time_window::resolve(hint, &config.time_ranges, Utc::now())?;
        let client = SourceClient::new(base_url, &config.http)?;

        let probe = Arc::new(KapacitorProbe::new(client.clone()));
        let query = Arc::new(InfluxAlertQuery::new(client, config.query.clone()));

        Ok(Self::with_durations(source, window, probe, query, config.time_ranges.clone()))
    }

    /// Run until unmounted or every handle is dropped; returns the final state
    pub async fn run(mut self) -> ViewState {
        tracing::debug!(source_id = %self.source.id, source = %self.source.name, window = %self.state.time_window, "Alert history view mounted");
        self.dispatch(ViewEvent::Mount);

        loop {
            tokio::select! {
                message = self.events.recv() => match message {
                    Some(Inbox::Event(event)) => self.dispatch(event),
                    Some(Inbox::Unmount) | None => break,
                },
                Some(joined) = self.tasks.join_next_with_id(), if !self.tasks.is_empty() => {
                    let event = match joined {
                        Ok((id, event)) => {
                            self.in_flight.remove(&id);
                            Some(event)
                        }
                        Err(e) => self.task_failed(e),
                    };
                    if let Some(event) = event {
                        self.dispatch(event);
                    }
                }
            }
        }

        self.tasks.abort_all();
        self.in_flight.clear();
        tracing::debug!(source_id = %self.source.id, "Alert history view unmounted");
        self.state
    }

    fn dispatch(&mut self, event: ViewEvent) {
        if let Some(command) = self.state.apply(event) {
            self.execute(command);
        }
        self.state_tx.send_replace(self.state.clone());
    }

    fn execute(&mut self, command: Command) {
        let spawned = match command.clone() {
            Command::ProbeCapability => {
                let probe = Arc::clone(&self.probe);
                let source = self.source.clone();
                self.tasks.spawn(async move {
                    ViewEvent::CapabilityProbed(probe.probe(&source).await.map_err(Into::into))
                })
            }
            Command::FetchAlerts { request, window } => {
                tracing::debug!(request, window = %window, "Fetching alert history");
                let query = Arc::clone(&self.query);
                let proxy = self.source.links.proxy.clone();
                self.tasks.spawn(async move {
                    let result = query.fetch(&proxy, &window).await.map_err(Into::into);
                    ViewEvent::AlertsFetched { request, result }
                })
            }
        };
        self.in_flight.insert(spawned.id(), command);
    }

    // A task that panicked still owes the state machine a completion,
    // otherwise the view would stay loading.
    fn task_failed(&mut self, e: JoinError) -> Option<ViewEvent> {
        let command = self.in_flight.remove(&e.id())?;
        tracing::error!(source_id = %self.source.id, ?command, "Alert history task failed: {}", e);

        let error = ViewError::Transport(format!("task failed: {}", e));
        Some(match command {
            Command::ProbeCapability => ViewEvent::CapabilityProbed(Err(error)),
            Command::FetchAlerts { request, .. } => ViewEvent::AlertsFetched {
                request,
                result: Err(error),
            },
        })
    }
}
