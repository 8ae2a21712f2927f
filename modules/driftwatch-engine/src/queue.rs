//! Bounded FIFO channel between the collector and the annotation worker.
//!
//! The only synchronization point in a session. `put` awaits when the
//! queue is full (backpressure when annotation lags collection); `get`
//! awaits when it is empty and returns `None` only once the queue is
//! closed and fully drained. Dropping the sender closes the queue.

use tokio::sync::mpsc;

use driftwatch_common::Post;

pub fn bounded(capacity: usize) -> (PostSender, PostReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (PostSender { tx }, PostReceiver { rx })
}

/// Clone to add producers; a session holds exactly one today.
#[derive(Clone)]
pub struct PostSender {
    tx: mpsc::Sender<Post>,
}

impl PostSender {
    /// Enqueue one post, awaiting while the queue is full. Returns the
    /// post back if the consumer is gone.
    pub async fn put(&self, post: Post) -> Result<(), Post> {
        self.tx.send(post).await.map_err(|e| e.0)
    }
}

pub struct PostReceiver {
    rx: mpsc::Receiver<Post>,
}

impl PostReceiver {
    /// Dequeue the next post, awaiting while the queue is empty.
    /// `None` is the end-of-stream signal: the queue is closed and drained.
    pub async fn get(&mut self) -> Option<Post> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn post(key: &str) -> Post {
        Post {
            key: key.to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            author: "ada".to_string(),
            body: "body".to_string(),
        }
    }

    #[tokio::test]
    async fn single_producer_fifo_order() {
        let (tx, mut rx) = bounded(8);
        for n in 0..5 {
            tx.put(post(&format!("k{n}"))).await.unwrap();
        }
        drop(tx);

        let mut keys = Vec::new();
        while let Some(p) = rx.get().await {
            keys.push(p.key);
        }
        assert_eq!(keys, vec!["k0", "k1", "k2", "k3", "k4"]);
    }

    #[tokio::test]
    async fn put_blocks_when_full() {
        let (tx, mut rx) = bounded(1);
        tx.put(post("first")).await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), tx.put(post("second"))).await;
        assert!(blocked.is_err(), "put should await while the queue is full");

        // Draining one slot unblocks the producer.
        assert_eq!(rx.get().await.unwrap().key, "first");
        tokio::time::timeout(Duration::from_millis(50), tx.put(post("second")))
            .await
            .expect("put should complete once capacity frees")
            .unwrap();
    }

    #[tokio::test]
    async fn get_returns_none_only_after_close_and_drain() {
        let (tx, mut rx) = bounded(4);
        tx.put(post("queued")).await.unwrap();

        // Still open: get must not signal end-of-stream while empty.
        assert_eq!(rx.get().await.unwrap().key, "queued");
        let pending = tokio::time::timeout(Duration::from_millis(50), rx.get()).await;
        assert!(pending.is_err(), "get should await while the queue is open");

        drop(tx);
        assert!(rx.get().await.is_none());
    }

    #[tokio::test]
    async fn put_fails_when_consumer_gone() {
        let (tx, rx) = bounded(4);
        drop(rx);
        let rejected = tx.put(post("orphan")).await;
        assert_eq!(rejected.unwrap_err().key, "orphan");
    }
}
