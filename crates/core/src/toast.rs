// Toast Coordinator
//
// Single-slot scheduler for ephemeral alerts. Each toast walks
// Pending -> Visible -> FadingOut -> Destroyed. A new request always takes the
// slot: the previous occupant has its timers cancelled and fades out
// immediately. There is no queue.
//
// Timers are spawned tasks. Besides being aborted on preemption, every timer
// re-checks the toast id and phase under the lock before transitioning, so a
// timer that lost the race against preemption is a no-op.
//
// Callers must be inside a Tokio runtime.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::bus::{AlertBus, AlertPayload, AppEvent};
use crate::config::duration_millis;
use crate::i18n::Translator;
use crate::model::{Notification, NotificationId};
use crate::summary::describe;

pub type ToastId = u64;

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
    Auth,
    Notification,
    Network,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationProfile {
    #[default]
    Default,
    Slide,
    Bounce,
    Shake,
    Pulse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastPhase {
    Pending,
    Visible,
    FadingOut,
    Destroyed,
}

/// Why a toast left the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastOutcome {
    /// Hold duration elapsed
    Expired,
    /// Replaced by a newer request
    Preempted,
    /// Closed by the user
    Dismissed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToastConfig {
    /// Hold used when a request does not carry its own
    #[serde(with = "duration_millis")]
    pub default_hold: Duration,

    /// Time spent in FadingOut before destruction
    #[serde(with = "duration_millis")]
    pub exit_duration: Duration,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            default_hold: Duration::from_millis(3000),
            exit_duration: Duration::from_millis(500),
        }
    }
}

/// A request to show one toast
#[derive(Debug, Clone, PartialEq)]
pub struct ToastRequest {
    pub message: String,
    pub short_message: Option<String>,
    pub kind: ToastKind,
    pub animation: AnimationProfile,
    /// `None` uses [`ToastConfig::default_hold`]
    pub hold: Option<Duration>,
    pub source_notification_id: Option<NotificationId>,
}

impl ToastRequest {
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            short_message: None,
            kind,
            animation: AnimationProfile::Default,
            hold: None,
            source_notification_id: None,
        }
    }

    pub fn with_short_message(mut self, short: impl Into<String>) -> Self {
        self.short_message = Some(short.into());
        self
    }

    pub fn with_animation(mut self, animation: AnimationProfile) -> Self {
        self.animation = animation;
        self
    }

    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = Some(hold);
        self
    }

    pub fn with_source(mut self, id: NotificationId) -> Self {
        self.source_notification_id = Some(id);
        self
    }
}

// ============================================================================
// Event mapping
// ============================================================================

/// Presentation defaults for one event source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDefaults {
    pub kind: ToastKind,
    pub animation: AnimationProfile,
    pub hold: Duration,
    /// Catalog prefix, e.g. `toast.auth_error`
    pub catalog_prefix: &'static str,
}

impl EventDefaults {
    pub fn for_event(event: &AppEvent, config: &ToastConfig) -> Self {
        let (kind, animation, hold, catalog_prefix) = match event {
            AppEvent::NewNotification(_) => (
                ToastKind::Notification,
                AnimationProfile::Slide,
                config.default_hold,
                "toast.new_notification",
            ),
            AppEvent::AuthError(_) => (
                ToastKind::Auth,
                AnimationProfile::Shake,
                Duration::from_millis(5000),
                "toast.auth_error",
            ),
            AppEvent::RateLimitError(_) => (
                ToastKind::Warning,
                AnimationProfile::Bounce,
                Duration::from_millis(4000),
                "toast.rate_limit_error",
            ),
            AppEvent::NetworkError(_) => (
                ToastKind::Network,
                AnimationProfile::Pulse,
                Duration::from_millis(4000),
                "toast.network_error",
            ),
            AppEvent::ApiRetry(_) => (
                ToastKind::Info,
                AnimationProfile::Pulse,
                Duration::from_millis(2000),
                "toast.api_retry",
            ),
            AppEvent::ShowError(_) => (
                ToastKind::Error,
                AnimationProfile::Shake,
                Duration::from_millis(4000),
                "toast.show_error",
            ),
        };
        Self {
            kind,
            animation,
            hold,
            catalog_prefix,
        }
    }
}

fn notification_request(
    notification: &Notification,
    defaults: EventDefaults,
    translator: &dyn Translator,
) -> ToastRequest {
    let sender = notification
        .sender
        .as_ref()
        .map(|s| s.display_name().to_string())
        .unwrap_or_else(|| translator.translate("sender.system", &vec![]));
    let short = translator.translate(
        &format!("{}.short", defaults.catalog_prefix),
        &vec![("sender", sender)],
    );

    ToastRequest::new(defaults.kind, describe(notification, translator))
        .with_short_message(short)
        .with_animation(defaults.animation)
        .with_hold(defaults.hold)
        .with_source(notification.id)
}

fn alert_request(
    payload: &AlertPayload,
    defaults: EventDefaults,
    translator: &dyn Translator,
) -> ToastRequest {
    let params = match payload.attempt {
        Some(attempt) => vec![("attempt", attempt.to_string())],
        None => vec![],
    };
    let message = if payload.message.trim().is_empty() {
        translator.translate(&format!("{}.message", defaults.catalog_prefix), &params)
    } else {
        payload.message.clone()
    };
    let short = payload
        .short_message
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| {
            translator.translate(&format!("{}.short", defaults.catalog_prefix), &params)
        });

    ToastRequest::new(payload.kind.unwrap_or(defaults.kind), message)
        .with_short_message(short)
        .with_animation(payload.animation.unwrap_or(defaults.animation))
        .with_hold(defaults.hold)
}

impl ToastRequest {
    /// Map a bus event to a request, filling every missing field with the
    /// event's defaults. Never fails.
    pub fn from_event(event: &AppEvent, config: &ToastConfig, translator: &dyn Translator) -> Self {
        let defaults = EventDefaults::for_event(event, config);
        match event {
            AppEvent::NewNotification(n) => notification_request(n, defaults, translator),
            AppEvent::AuthError(p)
            | AppEvent::RateLimitError(p)
            | AppEvent::NetworkError(p)
            | AppEvent::ApiRetry(p)
            | AppEvent::ShowError(p) => alert_request(p, defaults, translator),
        }
    }
}

// ============================================================================
// Coordinator
// ============================================================================

/// Observable state of a live toast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToastView {
    pub id: ToastId,
    pub message: String,
    pub short_message: Option<String>,
    pub kind: ToastKind,
    pub animation: AnimationProfile,
    #[serde(with = "duration_millis")]
    pub hold: Duration,
    pub phase: ToastPhase,
    pub source_notification_id: Option<NotificationId>,
    /// Source notification was marked read while the toast was live
    pub source_read: bool,
}

/// Invoked once when a toast is destroyed
pub type CompletionCallback = Box<dyn FnOnce(ToastId, ToastOutcome) + Send + 'static>;

#[derive(Clone, Copy)]
enum Timer {
    Hold(Duration),
    Exit,
}

type Completion = (CompletionCallback, ToastId, ToastOutcome);

struct LiveToast {
    view: ToastView,
    timer: Option<JoinHandle<()>>,
    outcome: ToastOutcome,
    on_complete: Option<CompletionCallback>,
}

impl LiveToast {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Destroy from inside its own exit timer
    fn destroy_without_abort(mut self) -> Option<Completion> {
        self.timer = None;
        self.destroy()
    }

    /// Destroy and hand back the callback to run outside the lock
    fn destroy(mut self) -> Option<Completion> {
        self.cancel_timer();
        self.view.phase = ToastPhase::Destroyed;
        trace!(toast_id = self.view.id, outcome = ?self.outcome, "Toast destroyed");
        self.on_complete
            .take()
            .map(|cb| (cb, self.view.id, self.outcome))
    }
}

#[derive(Default)]
struct SlotState {
    next_id: ToastId,
    /// The slot: Visible, or FadingOut at the end of its natural life
    active: Option<LiveToast>,
    /// Preempted toast finishing its exit animation
    departing: Option<LiveToast>,
}

struct Inner {
    state: Mutex<SlotState>,
    config: ToastConfig,
    active_tx: watch::Sender<Option<ToastView>>,
}

fn run_completions(completions: Vec<Completion>) {
    for (cb, id, outcome) in completions {
        cb(id, outcome);
    }
}

impl Inner {
    fn publish_active(&self, state: &SlotState) {
        let view = state.active.as_ref().map(|t| t.view.clone());
        self.active_tx.send_replace(view);
    }

    fn spawn_timer(self: &Arc<Self>, id: ToastId, timer: Timer) -> JoinHandle<()> {
        let inner = Arc::clone(self);
        let delay = match timer {
            Timer::Hold(hold) => hold,
            Timer::Exit => self.config.exit_duration,
        };
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match timer {
                Timer::Hold(_) => inner.on_hold_elapsed(id),
                Timer::Exit => inner.on_exit_elapsed(id),
            }
        })
    }

    /// Move `toast` out of the slot into the departing position.
    fn depart(
        self: &Arc<Self>,
        state: &mut SlotState,
        mut toast: LiveToast,
        outcome: ToastOutcome,
        completions: &mut Vec<Completion>,
    ) {
        // Only one toast may be fading out off-slot
        if let Some(older) = state.departing.take() {
            completions.extend(older.destroy());
        }

        if toast.view.phase == ToastPhase::Visible {
            toast.cancel_timer();
            toast.view.phase = ToastPhase::FadingOut;
            toast.outcome = outcome;
            toast.timer = Some(self.spawn_timer(toast.view.id, Timer::Exit));
        }
        // Already fading out naturally: keep its running exit timer

        debug!(toast_id = toast.view.id, outcome = ?outcome, "Toast leaving slot");
        state.departing = Some(toast);
    }

    fn on_hold_elapsed(self: &Arc<Self>, id: ToastId) {
        let mut state = self.state.lock();
        let exit_timer_needed = matches!(
            &state.active,
            Some(t) if t.view.id == id && t.view.phase == ToastPhase::Visible
        );
        if !exit_timer_needed {
            trace!(toast_id = id, "Stale hold timer ignored");
            return;
        }

        let timer = self.spawn_timer(id, Timer::Exit);
        if let Some(toast) = state.active.as_mut() {
            toast.view.phase = ToastPhase::FadingOut;
            toast.outcome = ToastOutcome::Expired;
            toast.timer = Some(timer);
        }
        self.publish_active(&state);
    }

    fn on_exit_elapsed(&self, id: ToastId) {
        let mut completions = Vec::new();
        {
            let mut state = self.state.lock();
            let active_done = matches!(
                &state.active,
                Some(t) if t.view.id == id && t.view.phase == ToastPhase::FadingOut
            );
            if active_done {
                if let Some(toast) = state.active.take() {
                    // Timer is the running task itself; nothing to abort
                    completions.extend(toast.destroy_without_abort());
                }
                self.publish_active(&state);
            } else if matches!(&state.departing, Some(t) if t.view.id == id) {
                if let Some(toast) = state.departing.take() {
                    completions.extend(toast.destroy_without_abort());
                }
            } else {
                trace!(toast_id = id, "Stale exit timer ignored");
            }
        }
        run_completions(completions);
    }
}

/// Shared handle to the toast coordinator
#[derive(Clone)]
pub struct ToastCoordinator {
    inner: Arc<Inner>,
}

impl Default for ToastCoordinator {
    fn default() -> Self {
        Self::new(ToastConfig::default())
    }
}

impl ToastCoordinator {
    pub fn new(config: ToastConfig) -> Self {
        let (active_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SlotState::default()),
                config,
                active_tx,
            }),
        }
    }

    pub fn config(&self) -> &ToastConfig {
        &self.inner.config
    }

    /// Show a toast, preempting whatever occupies the slot.
    pub fn show(&self, request: ToastRequest) -> ToastId {
        self.show_with(request, None)
    }

    /// Like [`ToastCoordinator::show`], with a callback run on destruction.
    pub fn show_with(&self, request: ToastRequest, on_complete: Option<CompletionCallback>) -> ToastId {
        let mut completions = Vec::new();
        let id = {
            let mut state = self.inner.state.lock();
            state.next_id += 1;
            let id = state.next_id;

            if let Some(previous) = state.active.take() {
                self.inner
                    .depart(&mut state, previous, ToastOutcome::Preempted, &mut completions);
            }

            let hold = request.hold.unwrap_or(self.inner.config.default_hold);
            let mut toast = LiveToast {
                view: ToastView {
                    id,
                    message: request.message,
                    short_message: request.short_message,
                    kind: request.kind,
                    animation: request.animation,
                    hold,
                    phase: ToastPhase::Pending,
                    source_notification_id: request.source_notification_id,
                    source_read: false,
                },
                timer: None,
                outcome: ToastOutcome::Expired,
                on_complete,
            };
            // The slot is free at this point, so Pending resolves immediately
            toast.view.phase = ToastPhase::Visible;
            toast.timer = Some(self.inner.spawn_timer(id, Timer::Hold(hold)));

            debug!(toast_id = id, kind = ?toast.view.kind, hold_ms = hold.as_millis() as u64, "Toast visible");
            state.active = Some(toast);
            self.inner.publish_active(&state);
            id
        };
        run_completions(completions);
        id
    }

    /// Start the exit animation of the active toast early.
    ///
    /// Returns `false` if `id` is not the visible occupant.
    pub fn dismiss(&self, id: ToastId) -> bool {
        let mut state = self.inner.state.lock();
        let visible = matches!(
            &state.active,
            Some(t) if t.view.id == id && t.view.phase == ToastPhase::Visible
        );
        if !visible {
            return false;
        }

        let timer = self.inner.spawn_timer(id, Timer::Exit);
        if let Some(toast) = state.active.as_mut() {
            toast.cancel_timer();
            toast.view.phase = ToastPhase::FadingOut;
            toast.outcome = ToastOutcome::Dismissed;
            toast.timer = Some(timer);
        }
        self.inner.publish_active(&state);
        true
    }

    /// Record that these notifications were read elsewhere.
    ///
    /// Toasts showing them keep their natural lifecycle.
    pub fn reflect_read(&self, ids: &[NotificationId]) {
        let mut state = self.inner.state.lock();
        let mut active_changed = false;
        if let Some(toast) = state.active.as_mut() {
            if let Some(source) = toast.view.source_notification_id {
                if ids.contains(&source) && !toast.view.source_read {
                    toast.view.source_read = true;
                    active_changed = true;
                }
            }
        }
        if let Some(toast) = state.departing.as_mut() {
            if let Some(source) = toast.view.source_notification_id {
                if ids.contains(&source) {
                    toast.view.source_read = true;
                }
            }
        }
        if active_changed {
            self.inner.publish_active(&state);
        }
    }

    /// The slot occupant
    pub fn active(&self) -> Option<ToastView> {
        self.inner
            .state
            .lock()
            .active
            .as_ref()
            .map(|t| t.view.clone())
    }

    /// All live toasts, the departing one first
    pub fn snapshot(&self) -> Vec<ToastView> {
        let state = self.inner.state.lock();
        state
            .departing
            .iter()
            .chain(state.active.iter())
            .map(|t| t.view.clone())
            .collect()
    }

    /// Phase of a toast by id; ids no longer live are `Destroyed`.
    pub fn phase(&self, id: ToastId) -> ToastPhase {
        let state = self.inner.state.lock();
        state
            .active
            .iter()
            .chain(state.departing.iter())
            .find(|t| t.view.id == id)
            .map(|t| t.view.phase)
            .unwrap_or(if id > state.next_id {
                ToastPhase::Pending
            } else {
                ToastPhase::Destroyed
            })
    }

    /// Watch the slot occupant (for renderers)
    pub fn subscribe(&self) -> watch::Receiver<Option<ToastView>> {
        self.inner.active_tx.subscribe()
    }

    /// Show the toast for one bus event.
    pub fn handle_event(&self, event: &AppEvent, translator: &dyn Translator) -> ToastId {
        let request = ToastRequest::from_event(event, &self.inner.config, translator);
        debug!(event = event.name(), kind = ?request.kind, "Alert event received");
        self.show(request)
    }

    /// Consume events from `bus` until the bus closes or the handle drops.
    pub fn listen(&self, bus: &AlertBus, translator: Arc<dyn Translator>) -> ListenerHandle {
        let mut rx = bus.subscribe();
        let coordinator = self.clone();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        coordinator.handle_event(&event, translator.as_ref());
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Only the newest event matters for a single slot
                        warn!(skipped, "Toast listener lagged behind alert bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("Toast listener stopped");
        });
        ListenerHandle { task }
    }
}

/// Owns the bus listener task; dropping it stops listening.
pub struct ListenerHandle {
    task: JoinHandle<()>,
}

impl ListenerHandle {
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
