//! Quiet-period debouncing with last-call-wins semantics.
//!
//! Every call takes a ticket. A call only proceeds once the quiet period
//! passes without a newer ticket, and its result is only kept if no newer
//! ticket was issued while it ran. Work already in flight is never
//! cancelled, only discarded.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Debounced<T> {
    /// The call was the latest one from start to finish.
    Fresh(T),
    /// A newer call arrived during the quiet period; the work never ran.
    Superseded,
    /// A newer call arrived while the work ran; its result was dropped.
    Stale,
}

impl<T> Debounced<T> {
    pub fn into_fresh(self) -> Option<T> {
        match self {
            Self::Fresh(value) => Some(value),
            Self::Superseded | Self::Stale => None,
        }
    }
}

#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    latest: AtomicU64,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            latest: AtomicU64::new(0),
        }
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Wait out the quiet period, then run `work` if nothing newer came in.
    pub async fn run<F, Fut, T>(&self, work: F) -> Debounced<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let ticket = self.issue();
        if !self.quiet.is_zero() {
            tokio::time::sleep(self.quiet).await;
        }
        if !self.is_current(ticket) {
            return Debounced::Superseded;
        }

        let value = work().await;
        if self.is_current(ticket) {
            Debounced::Fresh(value)
        } else {
            Debounced::Stale
        }
    }
}

struct SessionEntry {
    debouncer: Arc<Debouncer>,
    last_used: Instant,
}

/// One debouncer per input session (one per address field being typed
/// into). Sessions idle for longer than `ttl` are dropped.
pub struct DebounceSessions {
    quiet: Duration,
    ttl: Duration,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl DebounceSessions {
    pub fn new(quiet: Duration, ttl: Duration) -> Self {
        Self {
            quiet,
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn session(&self, key: &str) -> Arc<Debouncer> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        sessions.retain(|_, entry| now.duration_since(entry.last_used) <= self.ttl);

        let entry = sessions
            .entry(key.to_string())
            .or_insert_with(|| SessionEntry {
                debouncer: Arc::new(Debouncer::new(self.quiet)),
                last_used: now,
            });
        entry.last_used = now;
        Arc::clone(&entry.debouncer)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn only_the_last_call_in_a_burst_runs() {
        let debouncer = Arc::new(Debouncer::new(Duration::from_millis(300)));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = tokio::spawn({
            let (debouncer, calls) = (debouncer.clone(), calls.clone());
            async move {
                debouncer
                    .run(|| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        "ab"
                    })
                    .await
            }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = tokio::spawn({
            let (debouncer, calls) = (debouncer.clone(), calls.clone());
            async move {
                debouncer
                    .run(|| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        "abc"
                    })
                    .await
            }
        });

        assert_eq!(first.await.unwrap(), Debounced::Superseded);
        assert_eq!(second.await.unwrap(), Debounced::Fresh("abc"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn calls_spaced_beyond_quiet_period_both_run() {
        let debouncer = Debouncer::new(Duration::from_millis(300));

        assert_eq!(debouncer.run(|| async { 1 }).await, Debounced::Fresh(1));
        assert_eq!(debouncer.run(|| async { 2 }).await, Debounced::Fresh(2));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_result_is_discarded_when_newer_call_arrives() {
        let debouncer = Arc::new(Debouncer::new(Duration::from_millis(300)));

        let slow = tokio::spawn({
            let debouncer = debouncer.clone();
            async move {
                debouncer
                    .run(|| async {
                        tokio::time::sleep(Duration::from_secs(2)).await;
                        "old"
                    })
                    .await
            }
        });
        // Past the quiet period, while the slow work is in flight.
        tokio::time::sleep(Duration::from_millis(500)).await;
        let fast = debouncer.run(|| async { "new" }).await;

        assert_eq!(fast, Debounced::Fresh("new"));
        assert_eq!(slow.await.unwrap(), Debounced::Stale);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_are_evicted() {
        let sessions = DebounceSessions::new(Duration::from_millis(300), Duration::from_secs(60));

        let a = sessions.session("a");
        assert!(Arc::ptr_eq(&a, &sessions.session("a")));
        sessions.session("b");
        assert_eq!(sessions.len(), 2);

        tokio::time::advance(Duration::from_secs(61)).await;
        sessions.session("b");
        assert_eq!(sessions.len(), 1);
        assert!(!Arc::ptr_eq(&a, &sessions.session("a")));
    }
}
