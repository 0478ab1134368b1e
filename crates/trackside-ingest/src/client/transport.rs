//! Broker command surface
//!
//! The client talks to the broker through this trait so the registry and
//! dispatch logic can be exercised against a recording fake. The production
//! implementation is `rumqttc::AsyncClient`.

use async_trait::async_trait;
use rumqttc::{AsyncClient, QoS};

/// Commands issued toward the broker.
#[async_trait]
pub trait MqttTransport: Send + Sync {
    /// Subscribe to a topic.
    async fn subscribe(&self, topic: &str, qos: QoS) -> anyhow::Result<()>;

    /// Unsubscribe from a topic.
    async fn unsubscribe(&self, topic: &str) -> anyhow::Result<()>;

    /// Publish a payload.
    async fn publish(&self, topic: &str, qos: QoS, retain: bool, payload: Vec<u8>)
        -> anyhow::Result<()>;

    /// Request a protocol-level disconnect.
    async fn disconnect(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl MqttTransport for AsyncClient {
    async fn subscribe(&self, topic: &str, qos: QoS) -> anyhow::Result<()> {
        AsyncClient::subscribe(self, topic, qos).await?;
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> anyhow::Result<()> {
        AsyncClient::unsubscribe(self, topic).await?;
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        qos: QoS,
        retain: bool,
        payload: Vec<u8>,
    ) -> anyhow::Result<()> {
        AsyncClient::publish(self, topic, qos, retain, payload).await?;
        Ok(())
    }

    async fn disconnect(&self) -> anyhow::Result<()> {
        AsyncClient::disconnect(self).await?;
        Ok(())
    }
}
