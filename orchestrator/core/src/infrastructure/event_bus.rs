// Event Bus Implementation - Pub/Sub for Domain Events
//
// Provides in-memory event streaming using tokio broadcast channels.
// The deploy pipeline and the policy service publish here; the CLI renders
// deployment progress from a subscription.
//
// In-memory only: events published with no subscriber are dropped.

use crate::domain::deployment::DeploymentId;
use crate::domain::events::{DeploymentEvent, PolicyEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Unified domain event type for the event bus
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Deployment(DeploymentEvent),
    Policy(PolicyEvent),
}

/// Event bus for publishing and subscribing to domain events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    /// Capacity determines how many events can be buffered before dropping old ones
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    pub fn publish_deployment_event(&self, event: DeploymentEvent) {
        self.publish(DomainEvent::Deployment(event));
    }

    pub fn publish_policy_event(&self, event: PolicyEvent) {
        self.publish(DomainEvent::Policy(event));
    }

    fn publish(&self, event: DomainEvent) {
        debug!("Publishing event: {:?}", event);

        let receiver_count = self.sender.send(event).unwrap_or(0);

        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all domain events
    pub fn subscribe(&self) -> EventReceiver {
        let receiver = self.sender.subscribe();
        EventReceiver { receiver }
    }

    /// Subscribe to the events of a single deployment
    pub fn subscribe_deployment(&self, deployment_id: DeploymentId) -> DeploymentEventReceiver {
        let receiver = self.sender.subscribe();
        DeploymentEventReceiver {
            receiver,
            deployment_id: Some(deployment_id),
        }
    }

    /// Subscribe to deployment events of every deployment
    pub fn subscribe_deployments(&self) -> DeploymentEventReceiver {
        let receiver = self.sender.subscribe();
        DeploymentEventReceiver {
            receiver,
            deployment_id: None,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

fn map_try_recv_error(e: broadcast::error::TryRecvError) -> EventBusError {
    match e {
        broadcast::error::TryRecvError::Empty => EventBusError::Empty,
        broadcast::error::TryRecvError::Closed => EventBusError::Closed,
        broadcast::error::TryRecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Receiver for all domain events
pub struct EventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
}

impl EventReceiver {
    /// Receive the next event (waits until one is available)
    pub async fn recv(&mut self) -> Result<DomainEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<DomainEvent, EventBusError> {
        self.receiver.try_recv().map_err(map_try_recv_error)
    }
}

/// Receiver for deployment events, optionally filtered to one deployment
pub struct DeploymentEventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
    deployment_id: Option<DeploymentId>,
}

impl DeploymentEventReceiver {
    /// Receive the next matching deployment event
    pub async fn recv(&mut self) -> Result<DeploymentEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if let Some(matched) = self.filter(event) {
                return Ok(matched);
            }
        }
    }

    /// Try to receive the next matching deployment event without blocking
    pub fn try_recv(&mut self) -> Result<DeploymentEvent, EventBusError> {
        loop {
            let event = self.receiver.try_recv().map_err(map_try_recv_error)?;
            if let Some(matched) = self.filter(event) {
                return Ok(matched);
            }
        }
    }

    fn filter(&self, event: DomainEvent) -> Option<DeploymentEvent> {
        match event {
            DomainEvent::Deployment(event) => match self.deployment_id {
                Some(id) if event.deployment_id() != id => None,
                _ => Some(event),
            },
            DomainEvent::Policy(_) => None,
        }
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deployment::DeploymentStep;
    use crate::domain::policy::PolicyId;
    use chrono::Utc;

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        event_bus.publish_policy_event(PolicyEvent::SuppressionsUpdated {
            policy_id: PolicyId::new("AWS.CloudTrail.Enabled"),
            version: 2,
            suppression_count: 3,
            updated_at: Utc::now(),
        });

        let received = receiver.recv().await.unwrap();
        match received {
            DomainEvent::Policy(PolicyEvent::SuppressionsUpdated { version, .. }) => {
                assert_eq!(version, 2);
            }
            _ => panic!("Wrong event type received"),
        }
    }

    #[tokio::test]
    async fn test_deployment_event_filtering() {
        let event_bus = EventBus::new(10);
        let deployment_id = DeploymentId::new();
        let other_deployment_id = DeploymentId::new();

        let mut receiver = event_bus.subscribe_deployment(deployment_id);

        // Other deployment and policy events are filtered out
        event_bus.publish_deployment_event(DeploymentEvent::StepStarted {
            deployment_id: other_deployment_id,
            step: DeploymentStep::GenerateDashboards,
            started_at: Utc::now(),
        });
        event_bus.publish_policy_event(PolicyEvent::SuppressionsRejected {
            policy_id: PolicyId::new("p"),
            violations: vec![],
            rejected_at: Utc::now(),
        });
        event_bus.publish_deployment_event(DeploymentEvent::StepStarted {
            deployment_id,
            step: DeploymentStep::GenerateMetrics,
            started_at: Utc::now(),
        });

        let received = receiver.recv().await.unwrap();
        match received {
            DeploymentEvent::StepStarted { deployment_id: id, step, .. } => {
                assert_eq!(id, deployment_id);
                assert_eq!(step, DeploymentStep::GenerateMetrics);
            }
            _ => panic!("Wrong event type received"),
        }
        assert!(matches!(receiver.try_recv(), Err(EventBusError::Empty)));
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut receiver1 = event_bus.subscribe();
        let mut receiver2 = event_bus.subscribe_deployments();

        assert_eq!(event_bus.subscriber_count(), 2);

        event_bus.publish_deployment_event(DeploymentEvent::DeploymentCompleted {
            deployment_id: DeploymentId::new(),
            stack_name: "app-monitoring".to_string(),
            completed_at: Utc::now(),
        });

        let _ = receiver1.recv().await.unwrap();
        let _ = receiver2.recv().await.unwrap();
    }

    #[test]
    fn test_publish_without_subscribers_is_dropped() {
        let event_bus = EventBus::default();
        event_bus.publish_deployment_event(DeploymentEvent::DeploymentStarted {
            deployment_id: DeploymentId::new(),
            stack_name: "app-monitoring".to_string(),
            region: "us-east-1".to_string(),
            started_at: Utc::now(),
        });
        assert_eq!(event_bus.subscriber_count(), 0);
    }
}
