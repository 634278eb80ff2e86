//! Gateway hub: device registry and received-event subscribers
//!
//! Every RFXtrx platform shares one hub. The registry maps the slugified
//! hardware id of a device to the entity some platform created for it, and
//! the subscriber list holds one handler per platform. Events are dispatched
//! to subscribers one at a time, in subscription order.

use crate::device::RxEvent;
use crate::error::RfxtrxResult;
use crate::switch_multistate::MultiStateSwitch;
use dashmap::DashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace};

/// A registry entry, tagged by the platform that owns it
#[derive(Debug, Clone)]
pub enum RfxEntry {
    MultiStateSwitch(MultiStateSwitch),
    /// Entity owned by another RFXtrx platform (light, switch, sensor)
    Other { platform: String, name: String },
}

/// Identifies a subscriber so re-running a platform setup cannot add it twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberKey(&'static str);

impl SubscriberKey {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

type Subscriber = Arc<dyn Fn(&RfxtrxHub, &RxEvent) -> RfxtrxResult<()> + Send + Sync>;

#[derive(Default)]
pub struct RfxtrxHub {
    devices: DashMap<String, RfxEntry>,
    subscribers: RwLock<Vec<(SubscriberKey, Subscriber)>>,
}

impl RfxtrxHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.devices.contains_key(id)
    }

    /// The entry registered under `id`
    ///
    /// Switch handles share their state with the registered entity.
    pub fn get(&self, id: &str) -> Option<RfxEntry> {
        self.devices.get(id).map(|e| e.clone())
    }

    /// Register `entry` under `id`, replacing whatever was there
    pub fn insert(&self, id: impl Into<String>, entry: RfxEntry) {
        let id = id.into();
        trace!(id = %id, "Registering rfxtrx device");
        self.devices.insert(id, entry);
    }

    /// The multistate switch registered under `id`, if that is what it is
    pub fn multistate_switch(&self, id: &str) -> Option<MultiStateSwitch> {
        match self.devices.get(id)?.value() {
            RfxEntry::MultiStateSwitch(switch) => Some(switch.clone()),
            RfxEntry::Other { .. } => None,
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Append a subscriber unless one with the same key is already present
    ///
    /// Returns whether the subscriber was added.
    pub fn subscribe<F>(&self, key: SubscriberKey, handler: F) -> bool
    where
        F: Fn(&RfxtrxHub, &RxEvent) -> RfxtrxResult<()> + Send + Sync + 'static,
    {
        let mut subscribers = match self.subscribers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if subscribers.iter().any(|(k, _)| *k == key) {
            debug!(subscriber = key.as_str(), "Subscriber already registered");
            return false;
        }
        subscribers.push((key, Arc::new(handler)));
        debug!(subscriber = key.as_str(), "Subscribed to received events");
        true
    }

    pub fn is_subscribed(&self, key: SubscriberKey) -> bool {
        self.subscriber_snapshot().iter().any(|(k, _)| *k == key)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriber_snapshot().len()
    }

    /// Hand `event` to every subscriber in order
    ///
    /// A failing subscriber is logged and does not stop the others. Returns the
    /// number of subscribers that failed.
    pub fn dispatch(&self, event: &RxEvent) -> usize {
        trace!(device = %event.device.id_string, "Dispatching received event");

        let mut failures = 0;
        for (key, handler) in self.subscriber_snapshot() {
            if let Err(e) = handler(self, event) {
                error!(
                    subscriber = key.as_str(),
                    device = %event.device.id_string,
                    "Error handling rfxtrx event: {}",
                    e
                );
                failures += 1;
            }
        }
        failures
    }

    /// Dispatch every event from the gateway until its channel closes
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<RxEvent>) {
        info!("RFXtrx event loop started");
        while let Some(event) = events.recv().await {
            self.dispatch(&event);
        }
        info!("RFXtrx event loop stopped");
    }

    // Handlers are called outside the lock so they may subscribe themselves
    fn subscriber_snapshot(&self) -> Vec<(SubscriberKey, Subscriber)> {
        match self.subscribers.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
