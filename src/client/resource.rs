use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{api::ClientError, cache::CacheStore};

type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<T, ClientError>> + Send>>;
type Fetcher<T> = Arc<dyn Fn() -> FetchFuture<T> + Send + Sync>;

/// What a caller sees of a cached endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    pub is_validating: bool,
}

struct Inner<T> {
    data: Option<T>,
    error: Option<String>,
    last_revalidate: Option<Instant>,
}

/// Marks one fetch as in flight. Dropping it, including when the caller's
/// future is cancelled mid-fetch, frees the slot unless a newer fetch has
/// already taken it.
struct InFlight<'a> {
    slot: &'a AtomicU64,
    ticket: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let _ = self
            .slot
            .compare_exchange(self.ticket, 0, Ordering::SeqCst, Ordering::SeqCst);
    }
}

/// Read-through cache over one GET endpoint.
///
/// Data is served from the durable store until [`Resource::revalidate`]
/// fetches a fresh copy. A failed fetch keeps the stale data and is not
/// retried; revalidations closer together than the dedupe interval
/// collapse into one.
pub struct Resource<T> {
    key: String,
    fetcher: Fetcher<T>,
    store: Arc<dyn CacheStore>,
    dedupe_interval: Duration,
    inner: Mutex<Inner<T>>,
    // Ticket of the fetch in flight, 0 when idle.
    in_flight: AtomicU64,
    // Last ticket handed out; a fetch whose ticket is no longer the latest
    // has been superseded and its result is dropped.
    tickets: AtomicU64,
}

impl<T> Resource<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub(crate) async fn load<F, Fut>(
        key: String,
        store: Arc<dyn CacheStore>,
        dedupe_interval: Duration,
        fetch: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let data = match store.get(&key).await {
            Ok(Some(value)) => match serde_json::from_value::<T>(value) {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!(%key, error = %e, "ignoring stale cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(%key, error = ?e, "cache read failed");
                None
            }
        };

        Self {
            key,
            fetcher: Arc::new(move || Box::pin(fetch()) as FetchFuture<T>),
            store,
            dedupe_interval,
            inner: Mutex::new(Inner {
                data,
                error: None,
                last_revalidate: None,
            }),
            in_flight: AtomicU64::new(0),
            tickets: AtomicU64::new(0),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn snapshot(&self) -> ResourceState<T> {
        let inner = self.inner.lock().await;
        self.state_of(&inner)
    }

    fn state_of(&self, inner: &Inner<T>) -> ResourceState<T> {
        ResourceState {
            data: inner.data.clone(),
            error: inner.error.clone(),
            is_validating: self.in_flight.load(Ordering::SeqCst) != 0,
        }
    }

    /// Fetch a fresh copy unless one is in flight or the last started
    /// within the dedupe interval.
    pub async fn revalidate(&self) -> ResourceState<T> {
        let ticket = {
            let mut inner = self.inner.lock().await;
            let recent = inner
                .last_revalidate
                .is_some_and(|at| at.elapsed() < self.dedupe_interval);
            if self.in_flight.load(Ordering::SeqCst) != 0 || recent {
                debug!(key = %self.key, "revalidation deduplicated");
                return self.state_of(&inner);
            }
            let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
            self.in_flight.store(ticket, Ordering::SeqCst);
            inner.last_revalidate = Some(Instant::now());
            ticket
        };

        let guard = InFlight {
            slot: &self.in_flight,
            ticket,
        };
        let result = (self.fetcher)().await;
        drop(guard);

        let mut inner = self.inner.lock().await;
        if self.tickets.load(Ordering::SeqCst) != ticket {
            debug!(key = %self.key, ticket, "superseded revalidation discarded");
            return self.state_of(&inner);
        }
        match result {
            Ok(data) => {
                self.persist(&data).await;
                inner.data = Some(data);
                inner.error = None;
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "revalidation failed");
                inner.error = Some(e.to_string());
            }
        }
        self.state_of(&inner)
    }

    /// `Some(data)` overwrites the cached value locally without fetching.
    /// `None` drops the cached value and revalidates immediately, even if an
    /// earlier fetch is still outstanding.
    pub async fn mutate(&self, data: Option<T>) -> ResourceState<T> {
        match data {
            Some(data) => {
                self.persist(&data).await;
                let mut inner = self.inner.lock().await;
                inner.data = Some(data);
                inner.error = None;
                self.state_of(&inner)
            }
            None => {
                if let Err(e) = self.store.remove(&self.key).await {
                    warn!(key = %self.key, error = ?e, "cache remove failed");
                }
                {
                    let mut inner = self.inner.lock().await;
                    inner.data = None;
                    inner.last_revalidate = None;
                    self.in_flight.store(0, Ordering::SeqCst);
                }
                self.revalidate().await
            }
        }
    }

    async fn persist(&self, data: &T) {
        let stored = match serde_json::to_value(data) {
            Ok(value) => self.store.put(&self.key, value).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = stored {
            warn!(key = %self.key, error = ?e, "cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryCacheStore;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn counting_resource(
        store: Arc<dyn CacheStore>,
        dedupe: Duration,
        fail: bool,
    ) -> (Arc<AtomicUsize>, impl Future<Output = Resource<Vec<i64>>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let resource = Resource::load("nums".into(), store, dedupe, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if fail {
                    Err(ClientError::Status {
                        status: 500,
                        message: "internal server error".into(),
                    })
                } else {
                    Ok(vec![n as i64])
                }
            }
        });
        (calls, resource)
    }

    #[tokio::test]
    async fn revalidate_fills_and_persists() {
        let store = Arc::new(MemoryCacheStore::new());
        let (calls, resource) = counting_resource(store.clone(), Duration::ZERO, false);
        let resource = resource.await;

        assert_eq!(resource.snapshot().await.data, None);
        let state = resource.revalidate().await;
        assert_eq!(state.data, Some(vec![1]));
        assert!(!state.is_validating);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get("nums").await.unwrap(), Some(json!([1])));
    }

    #[tokio::test]
    async fn loads_from_store_before_fetching() {
        let store = Arc::new(MemoryCacheStore::new());
        store.put("nums", json!([7, 8])).await.unwrap();
        let (calls, resource) = counting_resource(store, Duration::ZERO, false);
        let resource = resource.await;

        assert_eq!(resource.snapshot().await.data, Some(vec![7, 8]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rapid_revalidations_are_deduplicated() {
        let store = Arc::new(MemoryCacheStore::new());
        let (calls, resource) = counting_resource(store, Duration::from_secs(60), false);
        let resource = resource.await;

        resource.revalidate().await;
        resource.revalidate().await;
        resource.revalidate().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_keeps_stale_data_and_is_not_retried() {
        let store = Arc::new(MemoryCacheStore::new());
        store.put("nums", json!([3])).await.unwrap();
        let (calls, resource) = counting_resource(store, Duration::ZERO, true);
        let resource = resource.await;

        let state = resource.revalidate().await;
        assert_eq!(state.data, Some(vec![3]));
        assert!(state.error.unwrap().contains("500"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mutate_none_bypasses_dedupe() {
        let store = Arc::new(MemoryCacheStore::new());
        let (calls, resource) = counting_resource(store, Duration::from_secs(60), false);
        let resource = resource.await;

        resource.revalidate().await;
        let state = resource.mutate(None).await;
        assert_eq!(state.data, Some(vec![2]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn mutate_some_sets_data_without_fetching() {
        let store = Arc::new(MemoryCacheStore::new());
        let (calls, resource) = counting_resource(store.clone(), Duration::ZERO, false);
        let resource = resource.await;

        let state = resource.mutate(Some(vec![42])).await;
        assert_eq!(state.data, Some(vec![42]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.get("nums").await.unwrap(), Some(json!([42])));
    }

    #[tokio::test]
    async fn cancelled_revalidate_does_not_wedge_the_resource() {
        let store = Arc::new(MemoryCacheStore::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let resource = Resource::load("slow".into(), store, Duration::ZERO, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 1 {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                Ok::<_, ClientError>(vec![n as i64])
            }
        })
        .await;

        let timed_out =
            tokio::time::timeout(Duration::from_millis(50), resource.revalidate()).await;
        assert!(timed_out.is_err());
        assert!(!resource.snapshot().await.is_validating);

        let state = resource.revalidate().await;
        assert_eq!(state.data, Some(vec![2]));
        assert!(!state.is_validating);

        let state = resource.mutate(None).await;
        assert_eq!(state.data, Some(vec![3]));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn mutate_none_supersedes_an_outstanding_fetch() {
        let store = Arc::new(MemoryCacheStore::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let resource = Arc::new(
            Resource::load("race".into(), store, Duration::from_secs(60), move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == 1 {
                        tokio::time::sleep(Duration::from_millis(200)).await;
                    }
                    Ok::<_, ClientError>(vec![n as i64])
                }
            })
            .await,
        );

        let slow = tokio::spawn({
            let resource = resource.clone();
            async move { resource.revalidate().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(resource.snapshot().await.is_validating);

        let state = resource.mutate(None).await;
        assert_eq!(state.data, Some(vec![2]));

        let stale = slow.await.unwrap();
        assert_eq!(stale.data, Some(vec![2]));
        assert_eq!(resource.snapshot().await.data, Some(vec![2]));
    }
}
