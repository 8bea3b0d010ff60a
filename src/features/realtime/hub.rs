use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::{BulkApplicationEvent, RealtimeEvent};
use crate::features::applications::models::RemovedApplication;
use crate::features::auth::model::AuthenticatedUser;

/// Who an event is meant for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    User(Uuid),
    Users(Vec<Uuid>),
}

impl Audience {
    pub fn includes(&self, user: &AuthenticatedUser) -> bool {
        match self {
            Audience::Everyone => true,
            Audience::User(id) => *id == user.id,
            Audience::Users(ids) => ids.contains(&user.id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Envelope {
    pub audience: Audience,
    pub event: RealtimeEvent,
}

/// Fan-out point between request handlers and open WebSocket connections.
///
/// Publishing never blocks and never fails: with nobody listening the event
/// is dropped, and a connection that falls behind skips what it missed.
pub struct EventHub {
    sender: broadcast::Sender<Envelope>,
    connections: AtomicUsize,
}

impl EventHub {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            connections: AtomicUsize::new(0),
        }
    }

    pub fn publish(&self, audience: Audience, event: RealtimeEvent) {
        let name = event.name();
        match self.sender.send(Envelope { audience, event }) {
            Ok(receivers) => tracing::debug!("Published {} to {} connection(s)", name, receivers),
            Err(_) => tracing::debug!("No live connections, dropped {} event", name),
        }
    }

    /// Sends one `delete` bulk update per HR user for applications removed
    /// along with a resume or an account
    pub fn publish_removed_applications(&self, removed: &[RemovedApplication]) {
        let mut by_hr: BTreeMap<Uuid, Vec<Uuid>> = BTreeMap::new();
        for item in removed {
            by_hr.entry(item.hr_id).or_default().push(item.application_id);
        }

        for (hr_id, application_ids) in by_hr {
            let count = application_ids.len();
            self.publish(
                Audience::User(hr_id),
                RealtimeEvent::BulkApplicationUpdate(BulkApplicationEvent {
                    action: "delete".to_string(),
                    application_ids,
                    count,
                }),
            );
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }

    /// Registers an open connection until the guard is dropped
    pub fn connect(self: &Arc<Self>) -> ConnectionGuard {
        self.connections.fetch_add(1, Ordering::Relaxed);
        ConnectionGuard {
            hub: Arc::clone(self),
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

pub struct ConnectionGuard {
    hub: Arc<EventHub>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.hub.connections.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::realtime::events::JobEvent;
    use crate::features::users::models::UserRole;
    use crate::shared::test_helpers::test_user;

    fn job_event() -> RealtimeEvent {
        RealtimeEvent::JobDeleted(JobEvent {
            job_id: Uuid::now_v7(),
            title: None,
            is_active: None,
        })
    }

    #[test]
    fn test_publish_without_subscribers_is_dropped() {
        let hub = EventHub::new(4);
        hub.publish(Audience::Everyone, job_event());
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_envelope() {
        let hub = EventHub::new(4);
        let mut rx = hub.subscribe();
        let event = job_event();
        let user_id = Uuid::now_v7();

        hub.publish(Audience::User(user_id), event.clone());

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.event, event);
        assert_eq!(envelope.audience, Audience::User(user_id));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_missed_events() {
        let hub = EventHub::new(2);
        let mut rx = hub.subscribe();
        for _ in 0..5 {
            hub.publish(Audience::Everyone, job_event());
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
        assert!(rx.recv().await.is_ok());
    }

    #[test]
    fn test_audience_matching() {
        let hr = test_user(Some(UserRole::Hr));
        let candidate = test_user(Some(UserRole::Candidate));
        let undecided = test_user(None);

        assert!(Audience::Everyone.includes(&undecided));
        assert!(Audience::User(candidate.id).includes(&candidate));
        assert!(!Audience::User(candidate.id).includes(&hr));
        assert!(Audience::Users(vec![hr.id, candidate.id]).includes(&hr));
    }

    #[tokio::test]
    async fn test_removed_applications_grouped_per_hr() {
        let hub = EventHub::new(8);
        let mut rx = hub.subscribe();
        let hr_a = Uuid::now_v7();
        let hr_b = Uuid::now_v7();
        let removed = vec![
            RemovedApplication { application_id: Uuid::now_v7(), hr_id: hr_a },
            RemovedApplication { application_id: Uuid::now_v7(), hr_id: hr_b },
            RemovedApplication { application_id: Uuid::now_v7(), hr_id: hr_a },
        ];

        hub.publish_removed_applications(&removed);

        let mut seen = Vec::new();
        for _ in 0..2 {
            let envelope = rx.recv().await.unwrap();
            let RealtimeEvent::BulkApplicationUpdate(event) = envelope.event else {
                panic!("unexpected event");
            };
            assert_eq!(event.action, "delete");
            assert_eq!(event.count, event.application_ids.len());
            seen.push((envelope.audience, event.count));
        }
        assert!(seen.contains(&(Audience::User(hr_a), 2)));
        assert!(seen.contains(&(Audience::User(hr_b), 1)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_nothing_removed_publishes_nothing() {
        let hub = EventHub::new(4);
        let mut rx = hub.subscribe();
        hub.publish_removed_applications(&[]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_connection_guard_tracks_count() {
        let hub = Arc::new(EventHub::new(4));
        let first = hub.connect();
        let second = hub.connect();
        assert_eq!(hub.connection_count(), 2);

        drop(first);
        assert_eq!(hub.connection_count(), 1);
        drop(second);
        assert_eq!(hub.connection_count(), 0);
    }
}
