//! In-process change-event hub backed by a `tokio::sync::broadcast` channel.
//!
//! [`BroadcastHub`] is shared via `Arc` between the services that publish
//! refetch hints and the SSE connections that relay them to browser tabs.
//! Each connection holds a [`Subscription`] scoped to an actor and a set of
//! topics.

use async_trait::async_trait;
use repairdesk_core::events::{Broadcaster, ChangeEvent};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::DEFAULT_BROADCAST_CAPACITY;

pub struct BroadcastHub {
    sender: broadcast::Sender<ChangeEvent>,
}

impl BroadcastHub {
    /// When the buffer is full the oldest events are dropped and slow
    /// subscribers skip ahead.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Sends one event to every current subscriber. Returns how many
    /// subscribers were connected; zero is not an error.
    pub fn send(&self, event: ChangeEvent) -> usize {
        tracing::debug!(topic = %event.topic, name = %event.name, "Broadcasting change event");
        self.sender.send(event).unwrap_or(0)
    }

    /// `topics` empty means every topic.
    pub fn subscribe(&self, actor: Option<Uuid>, topics: Vec<String>) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            actor,
            topics,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_BROADCAST_CAPACITY)
    }
}

#[async_trait]
impl Broadcaster for BroadcastHub {
    async fn publish(&self, event: ChangeEvent) -> eyre::Result<()> {
        self.send(event);
        Ok(())
    }
}

pub struct Subscription {
    receiver: broadcast::Receiver<ChangeEvent>,
    actor: Option<Uuid>,
    topics: Vec<String>,
}

impl Subscription {
    pub fn wants(&self, event: &ChangeEvent) -> bool {
        wants(&self.topics, self.actor, event)
    }

    /// Next event for this subscriber, or `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Subscriber lagged, skipping missed events");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-buffered event, without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Subscriber lagged, skipping missed events");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

fn wants(topics: &[String], actor: Option<Uuid>, event: &ChangeEvent) -> bool {
    let on_topic = topics.is_empty() || topics.iter().any(|topic| *topic == event.topic);
    on_topic && event.is_visible_to(actor)
}

/// Turns a subscription into a stream for long-lived connections. Lagged
/// positions are dropped silently since events are only refetch hints. The
/// stream ends once `shutdown` is cancelled.
pub fn event_stream(
    subscription: Subscription,
    shutdown: CancellationToken,
) -> impl Stream<Item = ChangeEvent> + Send + 'static {
    let Subscription {
        receiver,
        actor,
        topics,
    } = subscription;

    let events = BroadcastStream::new(receiver).filter_map(move |result| match result {
        Ok(event) if wants(&topics, actor, &event) => Some(event),
        _ => None,
    });
    futures::StreamExt::take_until(events, shutdown.cancelled_owned())
}
