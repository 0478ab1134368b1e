//! Live position view fed by telemetry frames.
//!
//! A `PositionTracker` registers as a telemetry listener and keeps the
//! latest decoded frame per beacon. The REST layer exposes the snapshot
//! at `/api/v1/positions`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use trackside_ingest::{TelemetryListener, TelemetryMessage};
use utoipa::ToSchema;

/// Latest observed sample for one beacon.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PositionSample {
    /// Beacon MAC reported by the trackside gateway
    pub beacon: String,
    /// Full decoded frame payload
    pub payload: serde_json::Value,
    /// When the frame was received
    pub received_at: DateTime<Utc>,
}

/// Keeps the latest sample per beacon.
#[derive(Debug, Default)]
pub struct PositionTracker {
    samples: Mutex<HashMap<String, PositionSample>>,
    total_frames: AtomicU64,
}

impl PositionTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one decoded frame.
    ///
    /// Frames without a string `beacon` field are counted but not stored.
    pub fn record(&self, message: &TelemetryMessage) {
        self.total_frames.fetch_add(1, Ordering::Relaxed);

        let Some(beacon) = message.payload.get("beacon").and_then(|v| v.as_str()) else {
            debug!(topic = %message.topic, "telemetry frame without beacon field");
            return;
        };

        let sample = PositionSample {
            beacon: beacon.to_string(),
            payload: serde_json::Value::Object(message.payload.clone()),
            received_at: Utc::now(),
        };

        let mut samples = match self.samples.lock() {
            Ok(guard) => guard,
            Err(e) => {
                warn!(error = %e, "position map lock poisoned; dropping frame");
                return;
            }
        };
        samples.insert(beacon.to_string(), sample);
    }

    /// Current samples, ordered by beacon for stable output.
    pub fn snapshot(&self) -> Vec<PositionSample> {
        let samples = match self.samples.lock() {
            Ok(guard) => guard,
            Err(e) => {
                warn!(error = %e, "position map lock poisoned");
                return Vec::new();
            }
        };
        let mut all: Vec<PositionSample> = samples.values().cloned().collect();
        all.sort_by(|a, b| a.beacon.cmp(&b.beacon));
        all
    }

    /// Frames seen since startup, including ones without a beacon.
    pub fn total_frames(&self) -> u64 {
        self.total_frames.load(Ordering::Relaxed)
    }

    /// Listener handle for registration with the ingestion handler.
    ///
    /// The returned handle must be kept around to remove the listener later.
    pub fn listener(self: Arc<Self>) -> TelemetryListener {
        Arc::new(move |message: &TelemetryMessage| {
            self.record(message);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(beacon: Option<&str>, speed: u64) -> TelemetryMessage {
        let mut payload = serde_json::Map::new();
        if let Some(mac) = beacon {
            payload.insert("beacon".into(), serde_json::Value::String(mac.into()));
        }
        payload.insert("speed".into(), serde_json::Value::from(speed));
        let raw = serde_json::Value::Object(payload.clone()).to_string().into_bytes();
        TelemetryMessage {
            topic: "trackside/lora/rx".into(),
            payload,
            raw,
        }
    }

    #[test]
    fn test_latest_sample_wins() {
        let tracker = PositionTracker::new();
        tracker.record(&frame(Some("AA:BB"), 10));
        tracker.record(&frame(Some("AA:BB"), 20));

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].payload["speed"], 20);
        assert_eq!(tracker.total_frames(), 2);
    }

    #[test]
    fn test_frame_without_beacon_counted_not_stored() {
        let tracker = PositionTracker::new();
        tracker.record(&frame(None, 5));

        assert!(tracker.snapshot().is_empty());
        assert_eq!(tracker.total_frames(), 1);
    }

    #[test]
    fn test_non_string_beacon_is_skipped() {
        let tracker = PositionTracker::new();
        let mut message = frame(None, 5);
        message
            .payload
            .insert("beacon".into(), serde_json::Value::from(42));
        tracker.record(&message);

        assert!(tracker.snapshot().is_empty());
    }

    #[test]
    fn test_snapshot_sorted_by_beacon() {
        let tracker = PositionTracker::new();
        tracker.record(&frame(Some("CC:02"), 1));
        tracker.record(&frame(Some("AA:01"), 2));

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot[0].beacon, "AA:01");
        assert_eq!(snapshot[1].beacon, "CC:02");
    }

    #[test]
    fn test_listener_records() {
        let tracker = Arc::new(PositionTracker::new());
        let listener = Arc::clone(&tracker).listener();

        listener(&frame(Some("AA:BB"), 30)).unwrap();
        assert_eq!(tracker.total_frames(), 1);
        assert_eq!(tracker.snapshot().len(), 1);
    }
}
