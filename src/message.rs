//! Messages into the audio side
//!
//! The audio side never shares a Pattern with the editor. Instead the editor
//! publishes whole snapshots and the processor replaces its private copy.
//! Other messages travel through a lock-free single-producer,
//! single-consumer ring. The audio side only ever uses `try_lock` and
//! `try_pop`, so it never blocks.

use std::sync::Arc;

use parking_lot::Mutex;
use ringbuf::{HeapCons, HeapProd, HeapRb, traits::*};
use serde::{Deserialize, Serialize};

use crate::format::PatternFormat;
use crate::radar::{ObserverId, Pattern};

/// Everything the processor can be told
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RadarMessage {
    /// Replace the loop audio; `channels[c][frame]`
    SetAudio { channels: Vec<Vec<f32>>, frames: usize },
    /// Replace the processor's pattern copy
    UpdatePattern { format: PatternFormat },
    TransportPlay,
    TransportPause,
    /// Seek to a normalized loop position in [0, 1)
    TransportMove { position: f64 },
}

impl RadarMessage {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Create a connected publisher/receiver pair
///
/// Transport and audio messages queue in a ring of up to `capacity`
/// entries. Pattern snapshots bypass it: the newest one waits in a single
/// slot and replaces any snapshot not yet picked up, so the audio side always
/// ends on the editor's latest pattern.
pub fn snapshot_channel(capacity: usize) -> (PatternPublisher, MessageReceiver) {
    let rb = HeapRb::new(capacity.max(1));
    let (producer, consumer) = rb.split();
    let latest = Arc::new(Mutex::new(None));
    (
        PatternPublisher {
            producer,
            latest: Arc::clone(&latest),
            capacity,
            dropped: 0,
        },
        MessageReceiver { consumer, latest },
    )
}

/// Editor end of the channel
pub struct PatternPublisher {
    producer: HeapProd<RadarMessage>,
    /// Newest snapshot the audio side hasn't taken yet
    latest: Arc<Mutex<Option<PatternFormat>>>,
    /// Capacity for logging overflow warnings
    capacity: usize,
    dropped: usize,
}

impl PatternPublisher {
    /// Queue a message; returns false if the ring was full and it was dropped
    ///
    /// Pattern updates never drop, they go to the snapshot slot.
    pub fn send(&mut self, message: RadarMessage) -> bool {
        let message = match message {
            RadarMessage::UpdatePattern { format } => {
                self.post_snapshot(format);
                return true;
            }
            other => other,
        };
        if self.producer.try_push(message).is_ok() {
            return true;
        }
        self.dropped += 1;
        log::warn!(
            "Radar message queue full (capacity: {}), message dropped",
            self.capacity
        );
        false
    }

    /// Hand a snapshot of `pattern` to the audio side
    pub fn publish(&mut self, pattern: &Pattern) -> bool {
        self.send(RadarMessage::UpdatePattern {
            format: pattern.serialize(),
        })
    }

    fn post_snapshot(&mut self, format: PatternFormat) {
        if self.latest.lock().replace(format).is_some() {
            log::debug!("Replaced a pattern snapshot the audio side hadn't taken");
        }
    }

    /// Publish `pattern` now and after every change to it
    pub fn attach(mut self, pattern: &mut Pattern) -> ObserverId {
        self.publish(pattern);
        pattern.add_observer(move |p| {
            self.publish(p);
        })
    }

    /// Messages lost to a full ring so far
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Audio end of the channel
pub struct MessageReceiver {
    consumer: HeapCons<RadarMessage>,
    latest: Arc<Mutex<Option<PatternFormat>>>,
}

impl MessageReceiver {
    /// Next queued message, then the pending snapshot
    ///
    /// Never blocks: if the editor is writing the snapshot slot right now,
    /// the snapshot is picked up on the next call.
    pub fn try_recv(&mut self) -> Option<RadarMessage> {
        if let Some(message) = self.consumer.try_pop() {
            return Some(message);
        }
        let format = self.latest.try_lock()?.take()?;
        Some(RadarMessage::UpdatePattern { format })
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty() && self.latest.try_lock().is_some_and(|slot| slot.is_none())
    }
}
