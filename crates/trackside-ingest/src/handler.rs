//! Telemetry ingestion handler
//!
//! Bridges the reserved ingestion topic to in-process listeners: each
//! inbound frame is decoded and fanned out to every registered listener,
//! with one listener's failure never affecting the others.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rumqttc::QoS;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::client::{MessageCallback, MqttClient};
use crate::decode::decode_payload;

/// A decoded telemetry frame.
#[derive(Debug, Clone)]
pub struct TelemetryMessage {
    /// Topic the frame arrived on
    pub topic: String,
    /// Decoded JSON object payload
    pub payload: Map<String, Value>,
    /// Raw frame bytes as received
    pub raw: Vec<u8>,
}

/// Listener invoked for every successfully decoded frame.
///
/// Handle identity (`Arc::ptr_eq`) is the dedup and removal key.
pub type TelemetryListener = Arc<dyn Fn(&TelemetryMessage) -> anyhow::Result<()> + Send + Sync>;

/// Decodes frames from the reserved ingestion topic and fans them out.
///
/// `start()` registers a single callback with the bus client; `stop()`
/// removes exactly that callback again. Listeners can be added and removed
/// at any time, including while frames are being dispatched.
pub struct TelemetryHandler {
    bus: Arc<MqttClient>,
    topic: String,
    listeners: Arc<Mutex<Vec<TelemetryListener>>>,
    dispatch: MessageCallback,
    running: AtomicBool,
}

impl TelemetryHandler {
    /// Bind a handler to a bus client and the reserved ingestion topic.
    #[must_use]
    pub fn new(bus: Arc<MqttClient>, topic: impl Into<String>) -> Self {
        let topic = topic.into();
        let listeners: Arc<Mutex<Vec<TelemetryListener>>> = Arc::new(Mutex::new(Vec::new()));

        // Built once so stop() can unsubscribe the same handle start()
        // registered.
        let dispatch_listeners = Arc::clone(&listeners);
        let dispatch: MessageCallback = Arc::new(move |topic, payload| {
            dispatch_frame(&dispatch_listeners, topic, payload);
            Ok(())
        });

        Self {
            bus,
            topic,
            listeners,
            dispatch,
            running: AtomicBool::new(false),
        }
    }

    /// Subscribe to the ingestion topic. Idempotent.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("telemetry handler already running");
            return;
        }
        self.bus
            .subscribe(
                self.topic.clone(),
                Arc::clone(&self.dispatch),
                QoS::AtMostOnce,
            )
            .await;
        info!(topic = %self.topic, "telemetry handler started");
    }

    /// Unsubscribe from the ingestion topic. Idempotent.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            debug!("telemetry handler not running");
            return;
        }
        self.bus.unsubscribe(&self.topic, Some(&self.dispatch)).await;
        info!(topic = %self.topic, "telemetry handler stopped");
    }

    /// Register a listener unless the same handle is already present.
    pub fn add_listener(&self, listener: TelemetryListener) {
        let Some(mut listeners) = self.lock_listeners() else {
            return;
        };
        if listeners.iter().any(|existing| Arc::ptr_eq(existing, &listener)) {
            debug!("telemetry listener already registered");
            return;
        }
        listeners.push(listener);
        debug!(listeners = listeners.len(), "telemetry listener added");
    }

    /// Remove a listener by handle identity. Absent handles are a no-op.
    pub fn remove_listener(&self, listener: &TelemetryListener) {
        let Some(mut listeners) = self.lock_listeners() else {
            return;
        };
        if let Some(index) = listeners.iter().position(|l| Arc::ptr_eq(l, listener)) {
            listeners.remove(index);
            debug!(listeners = listeners.len(), "telemetry listener removed");
        }
    }

    /// Whether the handler currently holds its bus subscription.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock_listeners().map_or(0, |listeners| listeners.len())
    }

    /// The reserved ingestion topic this handler is bound to.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    fn lock_listeners(&self) -> Option<std::sync::MutexGuard<'_, Vec<TelemetryListener>>> {
        match self.listeners.lock() {
            Ok(guard) => Some(guard),
            Err(e) => {
                warn!("listener set lock poisoned: {}", e);
                None
            }
        }
    }
}

/// Decode one frame and deliver it to a snapshot of the listener set.
///
/// Malformed frames are dropped with a warning; a failing listener is
/// logged and the remaining listeners still run. The lock is never held
/// while a listener executes.
fn dispatch_frame(listeners: &Mutex<Vec<TelemetryListener>>, topic: &str, raw: &[u8]) {
    let payload = match decode_payload(raw) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(topic = %topic, error = %e, "discarding malformed telemetry frame");
            return;
        }
    };

    let message = TelemetryMessage {
        topic: topic.to_string(),
        payload,
        raw: raw.to_vec(),
    };
    debug!(topic = %topic, payload = ?message.payload, "telemetry frame received");

    let snapshot: Vec<TelemetryListener> = match listeners.lock() {
        Ok(guard) => guard.clone(),
        Err(e) => {
            warn!("listener set lock poisoned: {}", e);
            return;
        }
    };
    for listener in snapshot {
        if let Err(e) = listener(&message) {
            error!(topic = %topic, error = %e, "telemetry listener failed");
        }
    }
}
