use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{FixedOffset, Local, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{AppConfig, EventRow, SpendSnapshot, UsageSnapshot};
use crate::modules::api::UsageClient;
use crate::modules::formatter::{
    self, SpendLines, UsageLines, EVENT_SLOTS, TITLE_ERROR, TITLE_LOADING,
};

/// What started a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Startup,
    Timer,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Refreshing,
}

/// Everything the tray shows, already formatted
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub title: String,
    pub request_usage: String,
    pub request_bar: String,
    pub request_reset: String,
    pub money_usage: String,
    pub money_bar: String,
    pub events: Vec<String>,
    pub last_error: Option<String>,
    pub phase: RefreshPhase,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            title: TITLE_LOADING.to_string(),
            request_usage: TITLE_LOADING.to_string(),
            request_bar: TITLE_LOADING.to_string(),
            request_reset: TITLE_LOADING.to_string(),
            money_usage: TITLE_LOADING.to_string(),
            money_bar: TITLE_LOADING.to_string(),
            events: vec![TITLE_LOADING.to_string(); EVENT_SLOTS],
            last_error: None,
            phase: RefreshPhase::Idle,
        }
    }
}

impl DisplayState {
    /// Error-only state used when the client could not even be set up
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            title: TITLE_ERROR.to_string(),
            last_error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Receives every new display state; implemented by the tray
pub trait DisplaySink: Send + Sync {
    fn render(&self, state: &DisplayState);
}

/// Owns the display state; `validate` and `refresh` are the only ways to change it
pub struct RefreshService {
    client: UsageClient,
    default_request_limit: i64,
    sink: Arc<dyn DisplaySink>,
    state: RwLock<DisplayState>,
    in_flight: tokio::sync::Mutex<()>,
    event_offset: Option<FixedOffset>,
}

impl RefreshService {
    pub fn new(client: UsageClient, config: &AppConfig, sink: Arc<dyn DisplaySink>) -> Self {
        Self {
            client,
            default_request_limit: config.default_request_limit,
            sink,
            state: RwLock::new(DisplayState::default()),
            in_flight: tokio::sync::Mutex::new(()),
            event_offset: None,
        }
    }

    /// Render event dates at a fixed offset instead of the local zone
    #[cfg(test)]
    pub fn with_event_offset(mut self, offset: FixedOffset) -> Self {
        self.event_offset = Some(offset);
        self
    }

    pub fn snapshot(&self) -> DisplayState {
        match self.state.read() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update(&self, f: impl FnOnce(&mut DisplayState)) {
        let rendered = {
            let mut state = match self.state.write() {
                Ok(state) => state,
                Err(poisoned) => poisoned.into_inner(),
            };
            f(&mut state);
            state.clone()
        };
        self.sink.render(&rendered);
    }

    /// Check the session token once before the first refresh.
    ///
    /// A rejected token is shown like a failed refresh, so the timer and the
    /// Refresh menu item can still recover once the token works again.
    pub async fn validate(&self) -> AppResult<()> {
        let _guard = self.in_flight.lock().await;
        match self.client.validate_token().await {
            Ok(()) => {
                info!("Session token validated");
                Ok(())
            }
            Err(e) => {
                error!("Token validation failed: {}", e);
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    fn record_failure(&self, e: &AppError) {
        let message = format!("{} ({})", e, e.kind());
        self.update(|state| {
            state.title = TITLE_ERROR.to_string();
            state.last_error = Some(message);
        });
    }

    /// Fetch all three endpoints and update the display.
    ///
    /// Concurrent callers are serialized. Only a failure of the usage call is
    /// returned; spend and event failures are logged and keep the previous rows.
    pub async fn refresh(&self, trigger: RefreshTrigger) -> AppResult<()> {
        let _guard = self.in_flight.lock().await;
        info!("Refreshing usage ({:?})", trigger);

        self.update(|state| {
            state.phase = RefreshPhase::Refreshing;
            if trigger == RefreshTrigger::Manual {
                state.title = TITLE_LOADING.to_string();
            }
        });

        let result = self.fetch_and_format().await;

        self.update(|state| state.phase = RefreshPhase::Idle);
        result
    }

    async fn fetch_and_format(&self) -> AppResult<()> {
        let now = Utc::now();

        let usage = match self.client.get_usage().await {
            Ok(usage) => usage,
            Err(e) => {
                error!("Error fetching usage: {}", e);
                self.record_failure(&e);
                return Err(e);
            }
        };

        let snapshot = UsageSnapshot::from_response(&usage, now);
        let lines = UsageLines::new(&snapshot, self.default_request_limit);
        self.update(|state| {
            state.title = lines.title;
            state.request_usage = lines.usage;
            state.request_bar = lines.bar;
            state.request_reset = lines.reset;
            state.last_error = None;
        });

        match self.client.get_usage_summary().await {
            Ok(summary) => {
                let spend = SpendLines::new(&SpendSnapshot::from(&summary));
                self.update(|state| {
                    state.money_usage = spend.usage;
                    state.money_bar = spend.bar;
                });
            }
            Err(e) => warn!("Error fetching usage summary: {}", e),
        }

        match self
            .client
            .get_filtered_usage_events(snapshot.billing_cycle_start, now, 1, EVENT_SLOTS as u32)
            .await
        {
            Ok(events) => {
                let rows: Vec<EventRow> = events
                    .usage_events_display
                    .iter()
                    .map(EventRow::from)
                    .collect();
                let slots = match self.event_offset {
                    Some(offset) => formatter::event_slots(&rows, &offset),
                    None => formatter::event_slots(&rows, &Local),
                };
                self.update(|state| state.events = slots);
            }
            Err(e) => warn!("Error fetching events: {}", e),
        }

        Ok(())
    }

    /// Refresh every `period`; the first tick fires one period from now
    pub async fn run_timer(self: Arc<Self>, period: Duration) {
        every(period, || {
            let service = self.clone();
            async move {
                // Errors are already reflected in the display state
                let _ = service.refresh(RefreshTrigger::Timer).await;
            }
        })
        .await;
    }
}

/// Run `tick` forever, one period apart, starting one period from now.
/// Ticks missed while a slow `tick` was running are dropped, not replayed.
async fn every<F, Fut>(period: Duration, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let start = tokio::time::Instant::now() + period;
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        tick().await;
    }
}
