//! Counter updates.
//!
//! Search counters are updated off the request path by a bounded work queue
//! with a single worker. Requests enqueue and return; a full queue drops the
//! update with a warning. Failures are logged and counted, never returned to
//! the request that triggered them.
//!
//! Read counters are updated inline with one atomic statement.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use super::category::RowShape;
use super::mapper;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{Book, ReadRequest};
use crate::store::{CatalogStore, StoreError};

/// Default number of pending counter updates.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Work item for the counter worker.
#[derive(Debug)]
enum CounterTask {
    /// A search returned these books for this word.
    Search { book_ids: Vec<String>, word: String },
    /// Acknowledge once every earlier task is done.
    Flush(oneshot::Sender<()>),
}

#[derive(Debug, Default)]
struct CounterStats {
    completed: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time view of the counter queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// Search updates fully applied.
    pub completed: u64,
    /// Search updates with at least one failed statement.
    pub failed: u64,
    /// Search updates never queued (queue full or stopped).
    pub dropped: u64,
}

/// Bounded queue feeding the search counter worker.
pub struct CounterQueue {
    sender: mpsc::Sender<CounterTask>,
    stats: Arc<CounterStats>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl CounterQueue {
    /// Spawn the worker and return its queue.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(store: Arc<dyn CatalogStore>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let stats = Arc::new(CounterStats::default());
        let tracker = TaskTracker::new();
        let shutdown = CancellationToken::new();

        tracker.spawn(run_worker(
            store,
            receiver,
            Arc::clone(&stats),
            shutdown.clone(),
        ));
        tracker.close();

        Self {
            sender,
            stats,
            tracker,
            shutdown,
        }
    }

    /// Queue the counter updates for one search. Never waits.
    ///
    /// Returns whether the update was queued.
    pub fn record_search(&self, books: &[Book], word: &str) -> bool {
        let task = CounterTask::Search {
            book_ids: books.iter().map(|b| b.id.clone()).collect(),
            word: word.to_string(),
        };
        match self.sender.try_send(task) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(word = %word, "counter queue full; dropping search update");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(word = %word, "counter worker stopped; dropping search update");
                false
            }
        }
    }

    /// Wait until every update queued before this call has been applied.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(CounterTask::Flush(ack)).await.is_ok() {
            let _ = done.await;
        }
    }

    /// Stop the worker after it drains the queue.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.wait().await;
        info!(stats = ?self.stats(), "counter worker stopped");
    }

    /// Whether the worker has exited.
    pub fn is_stopped(&self) -> bool {
        self.tracker.is_empty()
    }

    pub fn stats(&self) -> CounterSnapshot {
        CounterSnapshot {
            completed: self.stats.completed.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            dropped: self.stats.dropped.load(Ordering::Relaxed),
        }
    }
}

async fn run_worker(
    store: Arc<dyn CatalogStore>,
    mut receiver: mpsc::Receiver<CounterTask>,
    stats: Arc<CounterStats>,
    shutdown: CancellationToken,
) {
    debug!("counter worker started");
    loop {
        tokio::select! {
            biased;
            task = receiver.recv() => match task {
                Some(task) => apply(store.as_ref(), &stats, task).await,
                None => break,
            },
            () = shutdown.cancelled() => break,
        }
    }

    receiver.close();
    while let Ok(task) = receiver.try_recv() {
        apply(store.as_ref(), &stats, task).await;
    }
}

async fn apply(store: &dyn CatalogStore, stats: &CounterStats, task: CounterTask) {
    match task {
        CounterTask::Search { book_ids, word } => {
            let mut ok = true;

            match store.increment_searches(&book_ids).await {
                Ok(changed) => debug!(books = book_ids.len(), changed, "book search counters updated"),
                Err(e) => {
                    error!(error = %e, books = book_ids.len(), "failed to update book search counters");
                    ok = false;
                }
            }

            match store.increment_search_word(&word).await {
                Ok(counter) => debug!(word = %counter.word, count = counter.count, "search word counted"),
                Err(e) => {
                    error!(error = %e, word = %word, "failed to update search word counter");
                    ok = false;
                }
            }

            let counter = if ok { &stats.completed } else { &stats.failed };
            counter.fetch_add(1, Ordering::Relaxed);
        }
        CounterTask::Flush(ack) => {
            let _ = ack.send(());
        }
    }
}

/// Add one read to a book and return the updated book.
///
/// The client id must be present but is not otherwise used. An updated row
/// that cannot be decoded is a persistence failure: the read was counted.
pub async fn record_read(store: &dyn CatalogStore, request: &ReadRequest) -> CatalogResult<Book> {
    if !request.is_valid() {
        return Err(CatalogError::invalid("book_id and client_id are required"));
    }

    let row = store
        .increment_reads(&request.book_id)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("book {}", request.book_id)))?;

    let book = mapper::decode_book(0, row, RowShape::Base).map_err(|e| {
        warn!(error = %e, book_id = %request.book_id, "updated book row failed to decode");
        CatalogError::Persistence(StoreError::MalformedRow(format!(
            "book {}: {e}",
            request.book_id
        )))
    })?;

    debug!(book_id = %book.id, total_reads = book.total_reads, "read recorded");
    Ok(book)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::MemoryCatalogStore;
    use serde_json::json;

    fn row(id: &str) -> serde_json::Value {
        json!({
            "id": id, "name": "n", "abbreviation": "", "author": "a", "cover": "",
            "author_avatar": "", "finished": false, "total_reads": 7, "total_chars": 0,
            "last_update_time": "", "class": "c", "total_searches": 0, "total_votes": 0,
            "last_chapter_title": "", "last_chapter_url": "", "with_vip_chapter": false,
            "gender": "boy", "score": 0
        })
    }

    fn book(id: &str) -> Book {
        serde_json::from_value(row(id)).unwrap()
    }

    #[tokio::test]
    async fn search_updates_apply_in_background() {
        let store = Arc::new(MemoryCatalogStore::new());
        store.insert_book(row("b1"));
        store.insert_book(row("b2"));
        let queue = CounterQueue::start(store.clone(), 8);

        assert!(queue.record_search(&[book("b1"), book("b2")], "斗罗"));
        assert!(queue.record_search(&[book("b1")], "斗罗"));
        queue.flush().await;

        assert_eq!(store.book("b1").unwrap()["total_searches"], 2);
        assert_eq!(store.book("b2").unwrap()["total_searches"], 1);
        assert_eq!(store.search_word_count("斗罗"), Some(2));
        assert_eq!(queue.stats().completed, 2);
    }

    #[tokio::test]
    async fn failures_are_counted_not_returned() {
        let store = Arc::new(MemoryCatalogStore::new());
        let queue = CounterQueue::start(store.clone(), 8);
        store.set_unavailable(true);

        assert!(queue.record_search(&[book("b1")], "w"));
        queue.flush().await;

        let stats = queue.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.completed, 0);
    }

    #[tokio::test]
    async fn shutdown_drains_pending_updates() {
        let store = Arc::new(MemoryCatalogStore::new());
        let queue = CounterQueue::start(store.clone(), 8);
        for _ in 0..5 {
            queue.record_search(&[], "w");
        }
        queue.shutdown().await;

        assert!(queue.is_stopped());
        assert_eq!(store.search_word_count("w"), Some(5));
        assert!(!queue.record_search(&[], "late"));
        assert_eq!(queue.stats().dropped, 1);
    }

    #[tokio::test]
    async fn record_read_increments_and_returns_book() {
        let store = MemoryCatalogStore::new();
        store.insert_book(row("b1"));
        let request = ReadRequest {
            book_id: "b1".into(),
            client_id: "c1".into(),
        };

        let book = record_read(&store, &request).await.unwrap();
        assert_eq!(book.total_reads, 8);
        let book = record_read(&store, &request).await.unwrap();
        assert_eq!(book.total_reads, 9);
    }

    #[tokio::test]
    async fn record_read_unknown_book_is_not_found() {
        let store = MemoryCatalogStore::new();
        store.insert_book(row("b1"));
        let request = ReadRequest {
            book_id: "nope".into(),
            client_id: "c1".into(),
        };

        let err = record_read(&store, &request).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
        assert_eq!(store.book("b1").unwrap()["total_reads"], 7);
    }

    #[tokio::test]
    async fn record_read_requires_client_id() {
        let store = MemoryCatalogStore::new();
        store.insert_book(row("b1"));
        let request = ReadRequest {
            book_id: "b1".into(),
            client_id: String::new(),
        };

        let err = record_read(&store, &request).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInput(_)));
        assert_eq!(store.book("b1").unwrap()["total_reads"], 7);
    }

    #[tokio::test]
    async fn undecodable_updated_row_is_a_persistence_failure() {
        let store = MemoryCatalogStore::new();
        let mut bad = row("b1");
        bad["name"] = json!(42);
        store.insert_book(bad);
        let request = ReadRequest {
            book_id: "b1".into(),
            client_id: "c1".into(),
        };

        let err = record_read(&store, &request).await.unwrap_err();
        assert!(
            matches!(err, CatalogError::Persistence(StoreError::MalformedRow(_))),
            "{err:?}"
        );
        assert_eq!(store.book("b1").unwrap()["total_reads"], 8);
    }
}
