//! In-memory wizard session store.
//!
//! One store per wizard, each entry keyed by a v4 session id carried in a
//! hidden form field. Nothing is persisted; sessions idle past the
//! configured timeout are swept by a background task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

struct Entry<S> {
    session: S,
    last_seen: Instant,
}

/// Map of live sessions for one wizard.
pub struct SessionStore<S> {
    entries: Mutex<HashMap<Uuid, Entry<S>>>,
    idle_timeout: Duration,
}

impl<S> SessionStore<S> {
    pub fn new(idle_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
            idle_timeout,
        })
    }

    /// Insert a fresh session and return its id.
    pub async fn create(&self, session: S) -> Uuid {
        let id = Uuid::new_v4();
        let mut entries = self.entries.lock().await;
        entries.insert(
            id,
            Entry {
                session,
                last_seen: Instant::now(),
            },
        );
        debug!(session_id = %id, live = entries.len(), "Session created");
        id
    }

    /// Run `f` against the session for `id`, refreshing its idle clock.
    /// Returns `None` when the id is unknown or already swept.
    ///
    /// The store lock is held only for the duration of `f`; callers must
    /// not perform remote calls inside it.
    pub async fn with<R>(&self, id: Uuid, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(f(&mut entry.session))
    }

    /// Drop sessions idle longer than the timeout. Returns how many went.
    pub async fn sweep_idle(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.last_seen.elapsed() < self.idle_timeout);
        let swept = before - entries.len();
        if swept > 0 {
            info!(swept, live = entries.len(), "Swept idle sessions");
        }
        swept
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

/// Spawn the periodic idle sweep for one store (runs every 60s).
pub fn spawn_sweep_task<S: Send + 'static>(
    store: Arc<SessionStore<S>>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            store.sweep_idle().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        clicks: u32,
    }

    #[tokio::test]
    async fn create_and_mutate() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert!(store.is_empty().await);

        let id = store.create(Counter::default()).await;
        assert_eq!(store.len().await, 1);

        let clicks = store
            .with(id, |s| {
                s.clicks += 1;
                s.clicks
            })
            .await;
        assert_eq!(clicks, Some(1));
    }

    #[tokio::test]
    async fn unknown_id_returns_none() {
        let store: Arc<SessionStore<Counter>> = SessionStore::new(Duration::from_secs(60));
        let result = store.with(Uuid::new_v4(), |s| s.clicks).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn sweep_removes_only_idle_sessions() {
        let store = SessionStore::new(Duration::from_millis(20));
        let stale = store.create(Counter::default()).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        let fresh = store.create(Counter::default()).await;

        let swept = store.sweep_idle().await;
        assert_eq!(swept, 1);
        assert!(store.with(stale, |_| ()).await.is_none());
        assert!(store.with(fresh, |_| ()).await.is_some());
    }

    #[tokio::test]
    async fn touching_a_session_resets_its_idle_clock() {
        let store = SessionStore::new(Duration::from_millis(50));
        let id = store.create(Counter::default()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        store.with(id, |_| ()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        // 60ms old but touched 30ms ago, so it survives.
        assert_eq!(store.sweep_idle().await, 0);
        assert!(store.with(id, |_| ()).await.is_some());
    }
}
