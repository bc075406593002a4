// Notification Core
//
// Transport-agnostic implementation of the notification pipeline:
// poll → store → group → panel, and new-notification / alert events → toast.
//
// Key design decisions:
// - The backend is reached only through the NotificationTransport trait
// - The store is the single source of truth; views read, the reconciler and
//   poller write
// - Cross-cutting alerts travel over an explicit typed AlertBus instead of
//   stringly-typed global events
// - The toast coordinator has exactly one slot; new requests preempt
// - User-facing text always goes through the Translator capability

pub mod bus;
pub mod center;
pub mod config;
pub mod error;
pub mod extract;
pub mod grouping;
pub mod i18n;
pub mod model;
pub mod panel;
pub mod poller;
pub mod reconciler;
pub mod store;
pub mod summary;
pub mod toast;
pub mod transport;

// In-memory transport for examples and testing
pub mod memory;

// Re-exports for convenience
pub use bus::{AlertBus, AlertPayload, AppEvent};
pub use center::{CenterHandle, NotificationCenter};
pub use config::PulseConfig;
pub use error::{ConfigError, PollerError, TransportError};
pub use grouping::{group, Group, GroupKey};
pub use i18n::{CatalogTranslator, Locale, Params, PluralCategory, Translator};
pub use model::{Notification, NotificationId, NotificationType, Sender, UserId};
pub use panel::{badge_text, GroupView, PanelState, PanelView};
pub use poller::{Poller, PollerConfig, PollerHandle, RefreshOutcome};
pub use reconciler::{GroupReadOutcome, ReadStateReconciler};
pub use store::{NotificationStore, StoreSnapshot};
pub use summary::{describe, summarize};
pub use toast::{
    AnimationProfile, ListenerHandle, ToastConfig, ToastCoordinator, ToastId, ToastKind,
    ToastOutcome, ToastPhase, ToastRequest, ToastView,
};
pub use transport::{Ack, NotificationPage, NotificationTransport, UnreadCountResponse};
