//! An observable, in-memory copy of a user's collection of records.
//!
//! Every refresh takes a [FetchToken] before it queries the store. Starting a
//! newer fetch invalidates every older token, so a slow fetch that finishes
//! late can never replace data published by a newer one. A failed fetch leaves
//! the last published collection in place.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::watch;

use crate::Error;

/// Identifies one fetch of a [Snapshot]'s collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchToken {
    generation: u64,
}

/// The latest successfully fetched collection of `T`, shared across handlers.
///
/// Cloning a `Snapshot` gives another handle to the same collection.
#[derive(Debug)]
pub struct Snapshot<T> {
    inner: Arc<SnapshotInner<T>>,
}

#[derive(Debug)]
struct SnapshotInner<T> {
    name: &'static str,
    latest_generation: AtomicU64,
    sender: watch::Sender<Arc<Vec<T>>>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Snapshot<T> {
    /// Create an empty snapshot. `name` identifies the collection in logs and errors.
    pub fn new(name: &'static str) -> Self {
        let (sender, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            inner: Arc::new(SnapshotInner {
                name,
                latest_generation: AtomicU64::new(0),
                sender,
            }),
        }
    }

    /// Start a fetch, invalidating the tokens of all earlier fetches.
    pub fn begin_fetch(&self) -> FetchToken {
        let generation = self.inner.latest_generation.fetch_add(1, Ordering::SeqCst) + 1;

        FetchToken { generation }
    }

    /// Publish the result of the fetch identified by `token`.
    ///
    /// # Errors
    /// Returns [Error::StaleResponse] and leaves the snapshot unchanged if a
    /// newer fetch was started after `token` was issued.
    pub fn complete(&self, token: FetchToken, items: Vec<T>) -> Result<Arc<Vec<T>>, Error> {
        let items = Arc::new(items);
        let mut is_stale = false;

        // The token is checked while holding the channel's write lock so two
        // completions cannot interleave between the check and the write.
        self.inner.sender.send_if_modified(|current| {
            if token.generation != self.inner.latest_generation.load(Ordering::SeqCst) {
                is_stale = true;
                return false;
            }

            *current = items.clone();
            true
        });

        if is_stale {
            tracing::warn!("Discarded a stale fetch of {}", self.inner.name);
            return Err(Error::StaleResponse(self.inner.name));
        }

        Ok(items)
    }

    /// Fetch the collection with `fetch` and publish it.
    ///
    /// # Errors
    /// Returns the error from `fetch`, or [Error::StaleResponse] if a newer
    /// fetch started while `fetch` was running. In both cases the snapshot is
    /// left unchanged.
    pub fn refresh(
        &self,
        fetch: impl FnOnce() -> Result<Vec<T>, Error>,
    ) -> Result<Arc<Vec<T>>, Error> {
        let token = self.begin_fetch();
        let items = fetch()?;

        self.complete(token, items)
    }

    /// Like [Snapshot::refresh], but falls back to the last published
    /// collection if the fetch fails or is superseded.
    pub fn refresh_or_current(
        &self,
        fetch: impl FnOnce() -> Result<Vec<T>, Error>,
    ) -> Arc<Vec<T>> {
        match self.refresh(fetch) {
            Ok(items) => items,
            Err(Error::StaleResponse(_)) => self.current(),
            Err(error) => {
                tracing::warn!(
                    "Could not refresh {}, using the last snapshot: {error}",
                    self.inner.name
                );
                self.current()
            }
        }
    }

    /// The last published collection.
    pub fn current(&self) -> Arc<Vec<T>> {
        self.inner.sender.borrow().clone()
    }

    /// Observe every collection published from now on.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<T>>> {
        self.inner.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, snapshot::Snapshot};

    #[test]
    fn starts_empty() {
        let snapshot: Snapshot<i32> = Snapshot::new("numbers");

        assert!(snapshot.current().is_empty());
    }

    #[test]
    fn publishes_latest_fetch() {
        let snapshot = Snapshot::new("numbers");
        let token = snapshot.begin_fetch();

        let published = snapshot.complete(token, vec![1, 2, 3]).unwrap();

        assert_eq!(*published, vec![1, 2, 3]);
        assert_eq!(*snapshot.current(), vec![1, 2, 3]);
    }

    #[test]
    fn stale_fetch_cannot_overwrite_newer_data() {
        let snapshot = Snapshot::new("numbers");
        let old_token = snapshot.begin_fetch();
        let new_token = snapshot.begin_fetch();

        snapshot.complete(new_token, vec![2]).unwrap();
        let result = snapshot.complete(old_token, vec![1]);

        assert_eq!(result, Err(Error::StaleResponse("numbers")));
        assert_eq!(*snapshot.current(), vec![2]);
    }

    #[test]
    fn older_fetch_is_stale_even_before_newer_completes() {
        let snapshot = Snapshot::new("numbers");
        let old_token = snapshot.begin_fetch();
        let _new_token = snapshot.begin_fetch();

        let result = snapshot.complete(old_token, vec![1]);

        assert_eq!(result, Err(Error::StaleResponse("numbers")));
        assert!(snapshot.current().is_empty());
    }

    #[test]
    fn failed_refresh_keeps_last_snapshot() {
        let snapshot = Snapshot::new("numbers");
        snapshot.refresh(|| Ok(vec![7])).unwrap();

        let got = snapshot.refresh_or_current(|| Err(Error::DatabaseLockError));

        assert_eq!(*got, vec![7]);
        assert_eq!(*snapshot.current(), vec![7]);
    }

    #[test]
    fn superseded_refresh_returns_current() {
        let snapshot = Snapshot::new("numbers");
        let clone = snapshot.clone();

        let got = snapshot.refresh_or_current(|| {
            // A newer refresh finishes while this one is still running.
            clone.refresh(|| Ok(vec![9])).unwrap();
            Ok(vec![1])
        });

        assert_eq!(*got, vec![9]);
    }

    #[tokio::test]
    async fn subscribers_observe_updates() {
        let snapshot = Snapshot::new("numbers");
        let mut receiver = snapshot.subscribe();

        snapshot.refresh(|| Ok(vec![4, 5])).unwrap();

        receiver.changed().await.unwrap();
        assert_eq!(**receiver.borrow_and_update(), vec![4, 5]);
    }

    #[test]
    fn clones_share_state() {
        let snapshot = Snapshot::new("numbers");
        let clone = snapshot.clone();

        clone.refresh(|| Ok(vec![3])).unwrap();

        assert_eq!(*snapshot.current(), vec![3]);
    }
}
