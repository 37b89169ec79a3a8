//! The generic round-based poller abstraction (C1, spec §4.1).
//!
//! A `Poller` owns exactly one background task and exactly one
//! cancellation token (spec §9 "Poller loop" — no shared mutable
//! `isRunning` flag outside the owner). `start()` spawns that task;
//! `stop()` cancels it and awaits its exit. Calling `start()` twice is a
//! programmer error and panics, as spec §4.1 "Errors" requires.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use hub_telemetry::metrics::{POLLER_ROUND_DURATION, POLLER_ROUNDS_TOTAL};

/// Implemented by whatever a concrete poller (health poller, orders
/// poller, chain pollers, ...) wants to do each round.
#[async_trait]
pub trait PollerTask<S, T>: Send + Sync
where
    S: Send + Sync,
    T: Send,
{
    /// Fetches one server's result. Transport/schema failures are this
    /// method's responsibility to observe (log, mark unhealthy, ...); it
    /// simply returns `None` on failure, per spec §4.1 step 3 ("failures
    /// are swallowed at the poller layer").
    async fn fetch_one(&self, server: &S, cancel: CancellationToken) -> Option<T>;

    /// Called exactly once per round with every success, after all
    /// `fetch_one` calls for that round have settled.
    async fn on_round(&self, successes: Vec<T>);

    /// Interval until the next round starts, measured from round start.
    /// A constant for most pollers; chain-S's tiered backoff makes this
    /// dynamic (spec §4.10).
    fn interval(&self) -> Duration;
}

pub struct PollerConfig {
    pub request_timeout: Duration,
    pub jitter: Duration,
    pub name: &'static str,
}

struct Inner<S, T, P> {
    servers: Vec<S>,
    task: P,
    config: PollerConfig,
    _marker: std::marker::PhantomData<T>,
}

/// Owns the poller's single background task and its single cancellation
/// token.
pub struct Poller<S, T, P>
where
    S: Clone + Send + Sync + 'static,
    T: Send + 'static,
    P: PollerTask<S, T> + 'static,
{
    inner: Arc<Inner<S, T, P>>,
    handle: AsyncMutex<Option<(JoinHandle<()>, CancellationToken)>>,
}

impl<S, T, P> Poller<S, T, P>
where
    S: Clone + Send + Sync + 'static,
    T: Send + 'static,
    P: PollerTask<S, T> + 'static,
{
    pub fn new(servers: Vec<S>, task: P, config: PollerConfig) -> Self {
        assert!(!servers.is_empty(), "poller requires at least one server");
        Self {
            inner: Arc::new(Inner {
                servers,
                task,
                config,
                _marker: std::marker::PhantomData,
            }),
            handle: AsyncMutex::new(None),
        }
    }

    /// Spawns the round loop. Calling this a second time before `stop()`
    /// is a programmer error and panics (spec §4.1 "Errors").
    pub async fn start(&self) {
        let mut guard = self.handle.lock().await;
        assert!(
            guard.is_none(),
            "poller '{}' started twice without an intervening stop()",
            self.inner.config.name
        );

        let cancel = CancellationToken::new();
        let inner = self.inner.clone();
        let loop_cancel = cancel.clone();
        let join = tokio::spawn(async move {
            run_loop(inner, loop_cancel).await;
        });
        *guard = Some((join, cancel));
    }

    /// Cancels the current round's in-flight sleeps/requests and awaits
    /// loop exit. Idempotent: calling `stop()` when not running is a
    /// no-op.
    pub async fn stop(&self) {
        let handle = self.handle.lock().await.take();
        if let Some((join, cancel)) = handle {
            cancel.cancel();
            let _ = join.await;
        }
    }
}

async fn run_loop<S, T, P>(inner: Arc<Inner<S, T, P>>, cancel: CancellationToken)
where
    S: Clone + Send + Sync + 'static,
    T: Send + 'static,
    P: PollerTask<S, T> + 'static,
{
    loop {
        if cancel.is_cancelled() {
            return;
        }

        let round_start = Instant::now();

        let jitter = jitter_delay(inner.config.jitter);
        if jitter > Duration::ZERO && !crate::clock::sleep(jitter, &cancel).await {
            return;
        }

        let successes = fan_out(&inner, &cancel).await;
        let Some(successes) = successes else {
            return;
        };

        POLLER_ROUNDS_TOTAL
            .with_label_values(&[inner.config.name, "ok"])
            .inc();
        debug!(poller = inner.config.name, successes = successes.len(), "round complete");

        inner.task.on_round(successes).await;

        POLLER_ROUND_DURATION
            .with_label_values(&[inner.config.name])
            .observe(round_start.elapsed().as_secs_f64());

        let elapsed = round_start.elapsed();
        let interval = inner.task.interval();
        let remaining = interval.saturating_sub(elapsed);
        if remaining > Duration::ZERO && !crate::clock::sleep(remaining, &cancel).await {
            return;
        }
    }
}

type FetchFuture<T> = Pin<Box<dyn Future<Output = Option<T>> + Send>>;

/// Concurrently fetches every server, each bounded by its own deadline
/// derived from `request_timeout`. Returns `None` if the round itself was
/// cancelled before settling (so `on_round` is correctly skipped, per
/// spec §5 "in-flight rounds see it cancelled and `onRound` is not
/// called").
async fn fan_out<S, T, P>(inner: &Arc<Inner<S, T, P>>, cancel: &CancellationToken) -> Option<Vec<T>>
where
    S: Clone + Send + Sync + 'static,
    T: Send + 'static,
    P: PollerTask<S, T> + 'static,
{
    let mut futures: Vec<FetchFuture<T>> = Vec::with_capacity(inner.servers.len());
    for server in &inner.servers {
        let server = server.clone();
        let inner = inner.clone();
        let deadline_signal = CancellationToken::new();
        let timeout = inner.config.request_timeout;
        let deadline_for_timer = deadline_signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            deadline_for_timer.cancel();
        });
        futures.push(Box::pin(async move { inner.task.fetch_one(&server, deadline_signal).await }));
    }

    let joined = futures::future::join_all(futures);
    tokio::select! {
        results = joined => Some(results.into_iter().flatten().collect()),
        _ = cancel.cancelled() => {
            warn!("poller round cancelled mid fan-out");
            None
        }
    }
}

fn jitter_delay(max_jitter: Duration) -> Duration {
    if max_jitter.is_zero() {
        return Duration::ZERO;
    }
    let millis = max_jitter.as_millis().max(1) as u64;
    let chosen = rand::thread_rng().gen_range(0..=millis);
    Duration::from_millis(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct CountingTask {
        calls: Arc<AtomicUsize>,
        rounds: Arc<Mutex<Vec<usize>>>,
        fail_every: usize,
    }

    #[async_trait]
    impl PollerTask<u32, u32> for CountingTask {
        async fn fetch_one(&self, server: &u32, _cancel: CancellationToken) -> Option<u32> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_every != 0 && n % self.fail_every == 0 {
                None
            } else {
                Some(*server)
            }
        }

        async fn on_round(&self, successes: Vec<u32>) {
            self.rounds.lock().await.push(successes.len());
        }

        fn interval(&self) -> Duration {
            Duration::from_millis(5)
        }
    }

    #[tokio::test]
    async fn fan_out_reports_exactly_the_successes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rounds = Arc::new(Mutex::new(Vec::new()));
        let task = CountingTask {
            calls,
            rounds: rounds.clone(),
            fail_every: 0,
        };
        let poller = Poller::new(
            vec![1, 2, 3],
            task,
            PollerConfig {
                request_timeout: Duration::from_millis(50),
                jitter: Duration::ZERO,
                name: "test",
            },
        );
        poller.start().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        poller.stop().await;

        let seen = rounds.lock().await;
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|&n| n == 3));
    }

    #[tokio::test]
    #[should_panic(expected = "started twice")]
    async fn starting_twice_panics() {
        let task = CountingTask {
            calls: Arc::new(AtomicUsize::new(0)),
            rounds: Arc::new(Mutex::new(Vec::new())),
            fail_every: 0,
        };
        let poller = Poller::new(
            vec![1],
            task,
            PollerConfig {
                request_timeout: Duration::from_millis(50),
                jitter: Duration::ZERO,
                name: "test",
            },
        );
        poller.start().await;
        poller.start().await;
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let task = CountingTask {
            calls: Arc::new(AtomicUsize::new(0)),
            rounds: Arc::new(Mutex::new(Vec::new())),
            fail_every: 0,
        };
        let poller = Poller::new(
            vec![1],
            task,
            PollerConfig {
                request_timeout: Duration::from_millis(50),
                jitter: Duration::ZERO,
                name: "test",
            },
        );
        poller.start().await;
        poller.stop().await;
        poller.stop().await;
    }
}
