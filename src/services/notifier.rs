//! Message delivery to the configured destination chats.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// A transport able to deliver one message to one chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to `chat_id`.
    async fn send(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// Outcome of broadcasting one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
}

impl DeliveryReport {
    pub fn any_sent(&self) -> bool {
        self.sent > 0
    }
}

/// Sends each message to every destination, pacing the sends.
#[derive(Clone)]
pub struct Broadcaster {
    notifier: Arc<dyn Notifier>,
    destinations: Vec<String>,
    delay: Duration,
}

impl Broadcaster {
    pub fn new(notifier: Arc<dyn Notifier>, destinations: Vec<String>, delay: Duration) -> Self {
        Self {
            notifier,
            destinations,
            delay,
        }
    }

    /// Deliver `text` to all destinations.
    ///
    /// A failed destination is logged and counted; the remaining ones are
    /// still attempted. The pacing delay follows every send.
    pub async fn broadcast(&self, text: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        if self.destinations.is_empty() {
            log::error!("No destination chats configured; message dropped");
            return report;
        }

        for chat_id in &self.destinations {
            match self.notifier.send(chat_id, text).await {
                Ok(()) => report.sent += 1,
                Err(error) => {
                    report.failed += 1;
                    log::warn!("Delivery to {} failed: {}", chat_id, error);
                }
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
        report
    }
}
