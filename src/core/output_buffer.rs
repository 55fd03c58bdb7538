//! Shared, append-only output buffer
//!
//! The buffer is written by the runner's line callback on a background task
//! and observed by the renderer through a broadcast channel of
//! [`BufferEvent`]s, so readers never have to poll the text itself.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default number of events a slow observer may fall behind
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// A single mutation of the buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BufferEvent {
    Cleared,
    Replaced(String),
    Appended(String),
}

#[derive(Debug, Clone)]
pub struct OutputBuffer {
    text: Arc<RwLock<String>>,
    events: broadcast::Sender<BufferEvent>,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl OutputBuffer {
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            text: Arc::new(RwLock::new(String::new())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BufferEvent> {
        self.events.subscribe()
    }

    /// Append one line followed by `\n`
    pub fn append_line(&self, line: &str) {
        let mut text = self.text.write();
        text.push_str(line);
        text.push('\n');
        self.publish(BufferEvent::Appended(line.to_string()));
    }

    pub fn replace(&self, content: impl Into<String>) {
        let content = content.into();
        let mut text = self.text.write();
        *text = content.clone();
        self.publish(BufferEvent::Replaced(content));
    }

    pub fn clear(&self) {
        let mut text = self.text.write();
        text.clear();
        self.publish(BufferEvent::Cleared);
    }

    pub fn snapshot(&self) -> String {
        self.text.read().clone()
    }

    pub fn len(&self) -> usize {
        self.text.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.read().is_empty()
    }

    /// Called with the write lock held so event order matches text order
    fn publish(&self, event: BufferEvent) {
        // 没有订阅者时发送失败是正常情况
        let _ = self.events.send(event);
    }
}
