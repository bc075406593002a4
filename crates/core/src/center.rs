// Notification Center
//
// Wires the subsystem together for one UI context: store, alert bus, toast
// coordinator, reconciler and poller share one transport. `start` launches
// the background tasks; dropping the returned handle tears them down.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::bus::AlertBus;
use crate::config::PulseConfig;
use crate::grouping::GroupKey;
use crate::i18n::Translator;
use crate::panel::{PanelState, PanelView};
use crate::poller::{Poller, PollerHandle};
use crate::reconciler::ReadStateReconciler;
use crate::store::NotificationStore;
use crate::toast::{ListenerHandle, ToastCoordinator};
use crate::transport::NotificationTransport;

pub struct NotificationCenter {
    store: NotificationStore,
    bus: AlertBus,
    toasts: ToastCoordinator,
    reconciler: ReadStateReconciler,
    poller: Arc<Poller>,
    translator: Arc<dyn Translator>,
    panel: Mutex<PanelState>,
}

/// Background tasks of a running center
pub struct CenterHandle {
    pub poller: PollerHandle,
    pub listener: ListenerHandle,
}

impl CenterHandle {
    pub async fn stop(self) {
        self.listener.stop();
        self.poller.stop().await;
    }
}

impl NotificationCenter {
    /// Build a center. Pass the bus the transport publishes to, so transport
    /// failures surface as toasts.
    pub fn new(
        transport: Arc<dyn NotificationTransport>,
        bus: AlertBus,
        config: PulseConfig,
        translator: Arc<dyn Translator>,
    ) -> Self {
        let store = NotificationStore::new();
        let toasts = ToastCoordinator::new(config.toast);
        let reconciler = ReadStateReconciler::new(Arc::clone(&transport), store.clone())
            .with_toasts(toasts.clone());
        let poller = Arc::new(Poller::new(transport, store.clone(), bus.clone(), config.poller));

        Self {
            store,
            bus,
            toasts,
            reconciler,
            poller,
            translator,
            panel: Mutex::new(PanelState::new()),
        }
    }

    /// Start polling and listening for alerts.
    pub fn start(&self) -> CenterHandle {
        let listener = self.toasts.listen(&self.bus, Arc::clone(&self.translator));
        let poller = Arc::clone(&self.poller).spawn();
        CenterHandle { poller, listener }
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn bus(&self) -> &AlertBus {
        &self.bus
    }

    pub fn toasts(&self) -> &ToastCoordinator {
        &self.toasts
    }

    pub fn reconciler(&self) -> &ReadStateReconciler {
        &self.reconciler
    }

    pub fn poller(&self) -> &Arc<Poller> {
        &self.poller
    }

    pub fn translator(&self) -> &dyn Translator {
        self.translator.as_ref()
    }

    /// Open the panel; a closed-to-open transition refreshes on demand.
    pub async fn open_panel(&self) -> PanelView {
        let was_closed = self.panel.lock().open();
        if was_closed {
            debug!("Panel opened, refreshing");
            // Failure is reported through the view's sync_error
            let _ = self.poller.refresh().await;
        }
        self.panel_view()
    }

    pub fn close_panel(&self) {
        self.panel.lock().close();
    }

    pub fn toggle_group(&self, key: GroupKey) -> bool {
        self.panel.lock().toggle(key)
    }

    pub fn panel_view(&self) -> PanelView {
        self.panel
            .lock()
            .render(&self.store, self.translator.as_ref(), self.poller.last_error())
    }
}
