//! Managed MQTT client
//!
//! Owns the broker connection lifecycle and a registry of message callbacks
//! keyed by exact topic. A background task drives the network event loop;
//! registered topics are resubscribed whenever the connection is
//! (re-)established.

mod transport;


pub use transport::MqttTransport;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use rumqttc::{AsyncClient, ConnAck, ConnectReturnCode, Event, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::MqttConfig;
use crate::error::{Error, Result};

/// Callback invoked for every message arriving on a subscribed topic.
///
/// Handle identity (`Arc::ptr_eq`) is the registry's dedup and removal key.
pub type MessageCallback = Arc<dyn Fn(&str, &[u8]) -> anyhow::Result<()> + Send + Sync>;

/// Connection lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No broker connection and none being established
    Disconnected,
    /// Connection attempt in flight
    Connecting,
    /// Broker accepted the connection
    Connected,
}

impl ConnectionState {
    /// Lowercase label, as used in logs and health reports
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            2 => Self::Connected,
            1 => Self::Connecting,
            _ => Self::Disconnected,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const EVENT_CHANNEL_CAPACITY: usize = 64;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
// rumqttc rejects keepalive intervals below 5 seconds
const MIN_KEEPALIVE_SECS: u64 = 5;

/// Managed MQTT client.
///
/// Constructed once per process and shared by handle; `start()` connects
/// and spawns the event loop, `stop()` tears both down. Subscribe,
/// unsubscribe and publish are fire-and-forget: transport errors are
/// logged, never raised.
pub struct MqttClient {
    config: MqttConfig,
    shared: Arc<Shared>,
    runtime: tokio::sync::Mutex<Option<EventLoopHandle>>,
}

struct EventLoopHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct Shared {
    subscriptions: Mutex<HashMap<String, Vec<MessageCallback>>>,
    state: AtomicU8,
    transport: RwLock<Option<Arc<dyn MqttTransport>>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            subscriptions: Mutex::new(HashMap::new()),
            state: AtomicU8::new(ConnectionState::Disconnected as u8),
            transport: RwLock::new(None),
        }
    }

    fn registry(&self) -> Option<MutexGuard<'_, HashMap<String, Vec<MessageCallback>>>> {
        match self.subscriptions.lock() {
            Ok(guard) => Some(guard),
            Err(e) => {
                warn!("subscription registry lock poisoned: {}", e);
                None
            }
        }
    }

    fn transport(&self) -> Option<Arc<dyn MqttTransport>> {
        match self.transport.read() {
            Ok(guard) => guard.clone(),
            Err(e) => {
                warn!("transport lock poisoned: {}", e);
                None
            }
        }
    }

    fn install_transport(&self, transport: Arc<dyn MqttTransport>) {
        match self.transport.write() {
            Ok(mut guard) => *guard = Some(transport),
            Err(e) => warn!("transport lock poisoned: {}", e),
        }
    }

    fn clear_transport(&self) {
        match self.transport.write() {
            Ok(mut guard) => *guard = None,
            Err(e) => warn!("transport lock poisoned: {}", e),
        }
    }

    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn swap_state(&self, state: ConnectionState) -> ConnectionState {
        ConnectionState::from_u8(self.state.swap(state as u8, Ordering::SeqCst))
    }

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    async fn handle_event(&self, event: &Event) {
        match event {
            Event::Incoming(Packet::ConnAck(ack)) => self.handle_connack(ack).await,
            Event::Incoming(Packet::Publish(publish)) => {
                self.dispatch_message(&publish.topic, &publish.payload);
            }
            _ => {}
        }
    }

    /// Broker acknowledged the connection: mark connected and replay every
    /// registered topic as a fresh subscription.
    async fn handle_connack(&self, ack: &ConnAck) {
        if ack.code != ConnectReturnCode::Success {
            warn!(code = ?ack.code, "broker refused connection");
            self.set_state(ConnectionState::Disconnected);
            return;
        }

        self.set_state(ConnectionState::Connected);
        info!("connected to mqtt broker");

        let topics: Vec<String> = match self.registry() {
            Some(registry) => registry.keys().cloned().collect(),
            None => return,
        };
        let Some(transport) = self.transport() else {
            return;
        };
        for topic in topics {
            debug!(topic = %topic, "restoring subscription");
            if let Err(e) = transport.subscribe(&topic, QoS::AtMostOnce).await {
                warn!(topic = %topic, error = %e, "failed to restore subscription");
            }
        }
    }

    /// The event loop hit a connection error: drop to disconnected and log.
    fn connection_lost(&self, reason: &str) {
        let previous = self.swap_state(ConnectionState::Disconnected);
        if previous == ConnectionState::Connected {
            warn!(reason = %reason, "broker connection lost");
        } else {
            warn!(reason = %reason, "broker connection attempt failed");
        }
    }

    /// Deliver an inbound message to every callback registered for its
    /// topic. The registry lock is released before any callback runs.
    fn dispatch_message(&self, topic: &str, payload: &[u8]) {
        let callbacks: Vec<MessageCallback> = {
            let Some(registry) = self.registry() else {
                return;
            };
            registry.get(topic).cloned().unwrap_or_default()
        };

        if callbacks.is_empty() {
            debug!(topic = %topic, "dropping message for topic without callbacks");
            return;
        }

        for callback in callbacks {
            if let Err(e) = callback(topic, payload) {
                error!(topic = %topic, error = %e, "message callback failed");
            }
        }
    }
}

impl MqttClient {
    /// Create a client from configuration. No connection is made until
    /// [`start`](Self::start).
    #[must_use]
    pub fn new(config: MqttConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared::new()),
            runtime: tokio::sync::Mutex::new(None),
        }
    }

    /// Connect to the broker and spawn the background event loop.
    ///
    /// Idempotent: calling while already started is a no-op. A failure to
    /// establish the initial connection is returned to the caller; retry
    /// policy belongs there. Once started, lost connections are retried
    /// in the background.
    pub async fn start(&self) -> Result<()> {
        let mut runtime = self.runtime.lock().await;
        if runtime.is_some() {
            debug!("mqtt client already started");
            return Ok(());
        }

        self.shared.set_state(ConnectionState::Connecting);

        let client_id = self.config.effective_client_id();
        let mut options = MqttOptions::new(client_id, &self.config.host, self.config.port);
        options.set_keep_alive(Duration::from_secs(
            self.config.keepalive_secs.max(MIN_KEEPALIVE_SECS),
        ));
        if let Some(username) = &self.config.username {
            options.set_credentials(username, self.config.password.clone().unwrap_or_default());
        }

        let (client, mut eventloop) = AsyncClient::new(options, EVENT_CHANNEL_CAPACITY);
        self.shared.install_transport(Arc::new(client));

        info!(host = %self.config.host, port = self.config.port, "connecting to mqtt broker");

        // Drive the first poll inline so a broker that is down or refusing
        // connections surfaces here instead of in the background task.
        match tokio::time::timeout(CONNECT_TIMEOUT, eventloop.poll()).await {
            Ok(Ok(event)) => self.shared.handle_event(&event).await,
            Ok(Err(e)) => {
                error!(host = %self.config.host, port = self.config.port, error = %e,
                       "failed to connect to mqtt broker");
                self.shared.clear_transport();
                self.shared.set_state(ConnectionState::Disconnected);
                return Err(Error::Connection(e.to_string()));
            }
            Err(_) => {
                error!(host = %self.config.host, port = self.config.port,
                       "timed out connecting to mqtt broker");
                self.shared.clear_transport();
                self.shared.set_state(ConnectionState::Disconnected);
                return Err(Error::Connection(format!(
                    "timed out after {}s",
                    CONNECT_TIMEOUT.as_secs()
                )));
            }
        }

        let shared = Arc::clone(&self.shared);
        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = loop_cancel.cancelled() => {
                        debug!("mqtt event loop cancelled");
                        break;
                    }
                    polled = eventloop.poll() => match polled {
                        Ok(event) => shared.handle_event(&event).await,
                        Err(e) => {
                            shared.connection_lost(&e.to_string());
                            tokio::select! {
                                _ = loop_cancel.cancelled() => break,
                                _ = tokio::time::sleep(RECONNECT_DELAY) => {
                                    shared.set_state(ConnectionState::Connecting);
                                }
                            }
                        }
                    }
                }
            }
        });

        *runtime = Some(EventLoopHandle { cancel, task });
        Ok(())
    }

    /// Stop the event loop and disconnect.
    ///
    /// Idempotent and infallible: teardown errors are logged only.
    pub async fn stop(&self) {
        let mut runtime = self.runtime.lock().await;
        let Some(handle) = runtime.take() else {
            debug!("mqtt client not started");
            return;
        };

        handle.cancel.cancel();
        if let Some(transport) = self.shared.transport() {
            if let Err(e) = transport.disconnect().await {
                debug!(error = %e, "broker disconnect request not delivered");
            }
        }
        if let Err(e) = handle.task.await {
            warn!(error = %e, "mqtt event loop task ended abnormally");
        }

        self.shared.clear_transport();
        self.shared.set_state(ConnectionState::Disconnected);
        info!("mqtt client stopped");
    }

    /// Publish a payload. Fire-and-forget: a transport failure is logged
    /// as a warning and never raised. Attempted regardless of connection
    /// state; the transport queues while reconnecting.
    pub async fn publish(&self, topic: &str, payload: impl Into<Vec<u8>>, qos: QoS, retain: bool) {
        let Some(transport) = self.shared.transport() else {
            warn!(topic = %topic, "publish before start; message dropped");
            return;
        };
        if let Err(e) = transport.publish(topic, qos, retain, payload.into()).await {
            warn!(topic = %topic, error = %e, "publish failed");
        }
    }

    /// Register a callback for an exact topic.
    ///
    /// Registering the same handle twice is a no-op for the registry. When
    /// currently connected, a broker subscribe is issued immediately;
    /// otherwise it is deferred until the next (re)connect.
    pub async fn subscribe(&self, topic: impl Into<String>, callback: MessageCallback, qos: QoS) {
        let topic = topic.into();
        {
            let Some(mut registry) = self.shared.registry() else {
                return;
            };
            let callbacks = registry.entry(topic.clone()).or_default();
            if callbacks.iter().any(|existing| Arc::ptr_eq(existing, &callback)) {
                debug!(topic = %topic, "callback already registered");
            } else {
                callbacks.push(callback);
                debug!(topic = %topic, callbacks = callbacks.len(), "registered message callback");
            }
        }

        if self.shared.is_connected() {
            if let Some(transport) = self.shared.transport() {
                if let Err(e) = transport.subscribe(&topic, qos).await {
                    warn!(topic = %topic, error = %e, "broker subscribe failed");
                }
            }
        }
    }

    /// Remove a callback, or all callbacks when `callback` is `None`.
    ///
    /// When the last callback for a topic goes away the topic is dropped
    /// from the registry and, if connected, a broker unsubscribe is issued.
    /// Unknown topics and absent handles are silent no-ops.
    pub async fn unsubscribe(&self, topic: &str, callback: Option<&MessageCallback>) {
        let topic_released = {
            let Some(mut registry) = self.shared.registry() else {
                return;
            };
            let Some(callbacks) = registry.get_mut(topic) else {
                debug!(topic = %topic, "unsubscribe for unknown topic");
                return;
            };
            match callback {
                Some(target) => {
                    if let Some(index) = callbacks.iter().position(|c| Arc::ptr_eq(c, target)) {
                        callbacks.remove(index);
                        debug!(topic = %topic, "removed message callback");
                    }
                }
                None => callbacks.clear(),
            }
            if callbacks.is_empty() {
                registry.remove(topic);
                true
            } else {
                false
            }
        };

        if topic_released && self.shared.is_connected() {
            if let Some(transport) = self.shared.transport() {
                if let Err(e) = transport.unsubscribe(topic).await {
                    warn!(topic = %topic, error = %e, "broker unsubscribe failed");
                }
            }
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Whether the broker has acknowledged the connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.is_connected()
    }

    /// Number of topics with at least one registered callback.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.shared.registry().map_or(0, |registry| registry.len())
    }

    /// Build a client around a pre-installed transport, bypassing `start()`.
    #[cfg(test)]
    pub(crate) fn with_transport(config: MqttConfig, transport: Arc<dyn MqttTransport>) -> Self {
        let client = Self::new(config);
        client.shared.install_transport(transport);
        client
    }

    /// Test hook: behave as if the broker acknowledged the connection.
    #[cfg(test)]
    pub(crate) async fn simulate_connack(&self) {
        let ack = ConnAck {
            session_present: false,
            code: ConnectReturnCode::Success,
        };
        self.shared.handle_connack(&ack).await;
    }

    /// Test hook: deliver an inbound frame to the dispatch path.
    #[cfg(test)]
    pub(crate) fn simulate_message(&self, topic: &str, payload: &[u8]) {
        self.shared.dispatch_message(topic, payload);
    }

    /// Test hook: behave as if the event loop lost the connection.
    #[cfg(test)]
    pub(crate) fn simulate_connection_loss(&self, reason: &str) {
        self.shared.connection_lost(reason);
    }
}
