use std::{
    collections::HashMap,
    pin::Pin,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    task::{Context, Poll},
};

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_stream::Stream;
use types::{ConnectedMessage, ThemeEnvelope};

pub type SubscriberId = u64;

/// One message on a subscriber's stream, already serialized as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelMessage {
    Connected(Arc<str>),
    ThemeUpdate(Arc<str>),
}

impl ChannelMessage {
    #[must_use]
    pub fn as_json(&self) -> &str {
        match self {
            Self::Connected(json) | Self::ThemeUpdate(json) => json,
        }
    }
}

/// Registry of connected push subscribers.
///
/// Each subscriber owns a bounded queue. Broadcasting never waits on a
/// subscriber: a queue that is closed or full gets its subscriber dropped
/// from the registry, and everyone else still receives the message.
#[derive(Debug)]
pub struct UpdateChannel {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<ChannelMessage>>>,
    next_id: AtomicU64,
    buffer: usize,
    closed: AtomicBool,
}

impl UpdateChannel {
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Register a new subscriber. The returned stream yields the
    /// connection acknowledgment first and theme updates after it; it does
    /// not replay the current theme. After [`close`](Self::close) the
    /// stream ends right after the acknowledgment.
    #[must_use]
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.buffer);

        // the queue is fresh and holds at least one message
        let _ = sender.try_send(ChannelMessage::Connected(connected_json()));

        let mut subscribers = self.lock();
        if self.closed.load(Ordering::Acquire) {
            tracing::debug!(subscriber_id = id, "push channel is closed");
        } else {
            subscribers.insert(id, sender);
            tracing::debug!(subscriber_id = id, "push subscriber connected");
        }
        drop(subscribers);

        Subscription {
            id,
            receiver,
            channel: Arc::clone(self),
        }
    }

    /// Serialize `envelope` once and hand it to every subscriber.
    /// Returns how many subscribers accepted the message.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope cannot be serialized; no
    /// subscriber is touched in that case.
    pub fn broadcast(
        &self,
        envelope: &ThemeEnvelope,
    ) -> Result<usize, serde_json::Error> {
        let message =
            ChannelMessage::ThemeUpdate(serde_json::to_string(envelope)?.into());

        let mut delivered = 0;
        self.lock().retain(|id, sender| {
            match sender.try_send(message.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        subscriber_id = id,
                        "dropping push subscriber that is not keeping up"
                    );
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(
                        subscriber_id = id,
                        "dropping disconnected push subscriber"
                    );
                    false
                }
            }
        });

        Ok(delivered)
    }

    /// Drop every subscriber and refuse new ones. Open streams drain what
    /// is already queued and then end.
    pub fn close(&self) {
        let mut subscribers = self.lock();
        self.closed.store(true, Ordering::Release);
        let dropped = subscribers.len();
        subscribers.clear();
        drop(subscribers);

        tracing::info!(subscribers = dropped, "push channel closed");
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn unsubscribe(&self, id: SubscriberId) {
        if self.lock().remove(&id).is_some() {
            tracing::debug!(subscriber_id = id, "push subscriber disconnected");
        }
    }

    fn lock(
        &self,
    ) -> MutexGuard<'_, HashMap<SubscriberId, mpsc::Sender<ChannelMessage>>>
    {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn connected_json() -> Arc<str> {
    serde_json::to_string(&ConnectedMessage::default())
        .unwrap_or_else(|_| {
            r#"{"type":"connected","message":"SSE connection established"}"#
                .to_string()
        })
        .into()
}

/// A live subscription. Dropping it, which is what happens when the
/// remote side hangs up and the response body is discarded, removes the
/// subscriber from the registry.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<ChannelMessage>,
    channel: Arc<UpdateChannel>,
}

impl Subscription {
    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next message. `None` once the subscriber has been
    /// dropped from the registry and its queue is drained.
    pub async fn recv(&mut self) -> Option<ChannelMessage> {
        self.receiver.recv().await
    }
}

impl Stream for Subscription {
    type Item = ChannelMessage;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.channel.unsubscribe(self.id);
    }
}
