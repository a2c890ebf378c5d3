//! Events the coordinator publishes and the listener registry delivering them.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use sl_domain::{ParamType, Parameter};
use sl_protocol::{CommandResult, StreamEvent};
use tokio::sync::broadcast;

/// Something observable happened on the station.
#[derive(Debug, Clone)]
pub enum StationEvent {
    Connected {
        station: String,
        address: String,
    },
    Disconnected {
        station: String,
    },
    /// One of the station's own parameters changed.
    ParameterChanged {
        owner: String,
        param_type: ParamType,
        value: Value,
        modified: i64,
    },
    /// Fresh parameter bundle for an attached device, split out of a
    /// camera-info response.
    DeviceParametersUpdated {
        device: String,
        parameters: BTreeMap<ParamType, Parameter>,
    },
    CommandResult(CommandResult),
    DownloadStarted(StreamEvent),
    DownloadFinished(StreamEvent),
    LivestreamStarted(StreamEvent),
    LivestreamStopped(StreamEvent),
    RssiChanged {
        owner: String,
        rssi: i32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Disconnected,
    ParameterChanged,
    DeviceParametersUpdated,
    CommandResult,
    DownloadStarted,
    DownloadFinished,
    LivestreamStarted,
    LivestreamStopped,
    RssiChanged,
}

impl StationEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StationEvent::Connected { .. } => EventKind::Connected,
            StationEvent::Disconnected { .. } => EventKind::Disconnected,
            StationEvent::ParameterChanged { .. } => EventKind::ParameterChanged,
            StationEvent::DeviceParametersUpdated { .. } => EventKind::DeviceParametersUpdated,
            StationEvent::CommandResult(_) => EventKind::CommandResult,
            StationEvent::DownloadStarted(_) => EventKind::DownloadStarted,
            StationEvent::DownloadFinished(_) => EventKind::DownloadFinished,
            StationEvent::LivestreamStarted(_) => EventKind::LivestreamStarted,
            StationEvent::LivestreamStopped(_) => EventKind::LivestreamStopped,
            StationEvent::RssiChanged { .. } => EventKind::RssiChanged,
        }
    }
}

/// Handle returned by `subscribe`; pass it to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Listener = Arc<dyn Fn(&StationEvent) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    /// `None` receives every kind.
    kind: Option<EventKind>,
    listener: Listener,
}

/// Synchronous listener registry plus a broadcast channel for async
/// consumers.
///
/// Listeners run on the emitting task, in registration order, after the
/// registry lock has been released, so a listener may subscribe or
/// unsubscribe without deadlocking.
pub struct EventBus {
    subs: Mutex<Vec<Subscription>>,
    next_id: Mutex<u64>,
    tx: broadcast::Sender<StationEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            subs: Mutex::new(Vec::new()),
            next_id: Mutex::new(0),
            tx,
        }
    }

    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: Fn(&StationEvent) + Send + Sync + 'static,
    {
        self.add(Some(kind), Arc::new(listener))
    }

    pub fn subscribe_all<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&StationEvent) + Send + Sync + 'static,
    {
        self.add(None, Arc::new(listener))
    }

    /// Returns `false` if `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subs.lock();
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    /// Async receiver for every event emitted from now on.
    pub fn receiver(&self) -> broadcast::Receiver<StationEvent> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.subs
            .lock()
            .iter()
            .filter(|s| s.kind.map_or(true, |k| k == kind))
            .count()
    }

    pub fn emit(&self, event: StationEvent) {
        let kind = event.kind();
        let listeners: Vec<Listener> = self
            .subs
            .lock()
            .iter()
            .filter(|s| s.kind.map_or(true, |k| k == kind))
            .map(|s| s.listener.clone())
            .collect();

        for listener in listeners {
            listener(&event);
        }

        // No receivers is fine.
        let _ = self.tx.send(event);
    }

    fn add(&self, kind: Option<EventKind>, listener: Listener) -> SubscriptionId {
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            SubscriptionId(*next)
        };
        self.subs.lock().push(Subscription { id, kind, listener });
        id
    }
}
