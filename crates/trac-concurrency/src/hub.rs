//! Small reactive combinators used by the read path .: a hub
//! multiplexes one producer stream to N subscribers so the same batch
//! sequence can simultaneously be folded into a byte count and inspected
//! for its first element, without either consumer buffering the whole
//! stream.
//!
//! Grounded on `coroutines`'s philosophy of small, direct adapters rather
//! than a general reactive-streams framework.

use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// A fan-out handle: publishing to a [`Hub`] feeds every subscriber created
/// with [`Hub::subscribe`] before the publish call.
pub struct Hub<T> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> Hub<T> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Hub { sender }
    }

    pub fn subscribe(&self) -> impl Stream<Item = T> {
        BroadcastStream::new(self.sender.subscribe()).filter_map(|item| async move { item.ok() })
    }

    pub fn publish(&self, value: T) {
        // Lagging/zero-subscriber sends are not actionable here; the pipeline
        // stage that owns the Hub observes completion via its own stream end.
        let _ = self.sender.send(value);
    }
}

/// Drains `publisher` and forwards every item to every current subscriber of
/// `hub`, then drops `hub` so subscriber streams end.
pub async fn publish_into<T, S>(hub: Hub<T>, mut publisher: S)
where
    T: Clone + Send + 'static,
    S: Stream<Item = T> + Unpin,
{
    while let Some(item) = publisher.next().await {
        hub.publish(item);
    }
}

/// Returns a future resolving to the first item of `stream`, or `None` if
/// the stream ends without producing one.
pub async fn first<S>(mut stream: S) -> Option<S::Item>
where
    S: Stream + Unpin,
{
    stream.next().await
}

/// Folds `stream` with `reducer`, starting from `init`.
pub async fn fold<S, B, F>(mut stream: S, init: B, mut reducer: F) -> B
where
    S: Stream + Unpin,
    F: FnMut(B, S::Item) -> B,
{
    let mut acc = init;
    while let Some(item) = stream.next().await {
        acc = reducer(acc, item);
    }
    acc
}

/// Maps a stream with `f`, lazily (no intermediate buffering).
pub fn map<S, B, F>(stream: S, f: F) -> impl Stream<Item = B>
where
    S: Stream,
    F: FnMut(S::Item) -> B,
{
    stream.map(f)
}

/// Turns an iterable into a stream, for feeding fixed test fixtures through
/// the same combinators as live pipelines.
pub fn publish<I>(iterable: I) -> impl Stream<Item = I::Item>
where
    I: IntoIterator,
{
    futures::stream::iter(iterable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn hub_fans_out_to_two_subscribers() {
        let hub = Hub::new(16);
        let sub_a = hub.subscribe();
        let sub_b = hub.subscribe();

        let fold_task = tokio::spawn(async move { fold(sub_a, 0, |acc, n: i32| acc + n).await });
        let first_task = tokio::spawn(async move { first(sub_b).await });

        hub.publish(1);
        hub.publish(2);
        hub.publish(3);
        drop(hub);

        assert_eq!(fold_task.await.unwrap(), 6);
        assert_eq!(first_task.await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn map_transforms_each_item_lazily() {
        let stream = publish(vec![1, 2, 3]);
        let mapped: Vec<i32> = map(stream, |n| n * 2).collect().await;
        assert_eq!(mapped, vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn fold_reduces_entire_stream() {
        let stream = publish(vec!["a", "bb", "ccc"]);
        let total_len = fold(stream, 0usize, |acc, s: &str| acc + s.len()).await;
        assert_eq!(total_len, 6);
    }
}
