//! In-process security event bus
//!
//! A `tokio::sync::broadcast` channel carrying typed security events.
//! Delivery is fire-and-forget: at most once per live subscriber, nothing
//! durable, and a publisher with no subscribers simply drops the event.
//! Slow subscribers that overflow the channel lose the oldest events.

use crate::domain::{DataCategory, RiskLevel};
use crate::workflow::BreachDetails;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events exchanged between the engines through the orchestrator
#[derive(Debug, Clone)]
pub enum SecurityEvent {
    /// An encrypt or decrypt operation failed for a category
    EncryptionFailure {
        category: DataCategory,
        detail: String,
    },
    /// An access attempt was denied
    UnauthorizedAccess {
        resource: String,
        principal: Option<String>,
    },
    /// A breach has been confirmed and must be recorded
    BreachConfirmed { details: BreachDetails },
    /// A security audit finished
    AuditCompleted {
        audit_id: Uuid,
        risk_level: RiskLevel,
        overall_score: f64,
    },
    /// A category key was rotated
    KeyRotated { category: DataCategory },
}

/// Broadcast bus for [`SecurityEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SecurityEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event; returns how many subscribers received it
    pub fn publish(&self, event: SecurityEvent) -> usize {
        // send only fails when there are no subscribers
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SecurityEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::default();
        let delivered = bus.publish(SecurityEvent::KeyRotated {
            category: DataCategory::Health,
        });
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_every_live_subscriber_receives() {
        let bus = EventBus::default();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        let delivered = bus.publish(SecurityEvent::UnauthorizedAccess {
            resource: "keys.blob".to_string(),
            principal: None,
        });
        assert_eq!(delivered, 2);

        assert!(matches!(
            a.recv().await.unwrap(),
            SecurityEvent::UnauthorizedAccess { .. }
        ));
        assert!(matches!(
            b.recv().await.unwrap(),
            SecurityEvent::UnauthorizedAccess { .. }
        ));
    }
}
