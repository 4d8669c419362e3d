//! Bounded-concurrency fetch orchestrator.
//!
//! Fans a URL list out over the fallback chain. A permit is taken from the
//! semaphore *before* each task is spawned, so no more than `max_concurrent`
//! fetch tasks exist at any moment. Tasks are joined as they finish, so
//! progress is reported in settle order; each outcome is written to the slot
//! at its input index and slots are read only after all tasks have settled.

use std::collections::HashMap;
use std::sync::Arc;

use newsforge_shared::{FetchOutcome, ProviderSettings, Result};
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::chain::FallbackChain;

/// Runs the fallback chain across many URLs at once.
#[derive(Debug, Clone)]
pub struct FetchOrchestrator {
    chain: Arc<FallbackChain>,
}

impl FetchOrchestrator {
    pub fn new(chain: FallbackChain) -> Self {
        Self {
            chain: Arc::new(chain),
        }
    }

    /// Orchestrator over the standard provider chain.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        Ok(Self::new(FallbackChain::from_settings(settings)?))
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    /// Fetch a single URL through the chain.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_one(&self, url: &str, cancel: &CancellationToken) -> FetchOutcome {
        self.chain.run(url, cancel).await
    }

    /// Fetch every URL with at most `max_concurrent` in flight.
    ///
    /// Outcomes come back in input order. URLs not yet started when
    /// `cancel` fires are never launched and produce no outcome.
    pub async fn fetch_all(
        &self,
        urls: &[String],
        max_concurrent: usize,
        cancel: &CancellationToken,
    ) -> Vec<FetchOutcome> {
        self.fetch_all_with_progress(urls, max_concurrent, cancel, |_, _, _| {})
            .await
    }

    /// [`FetchOrchestrator::fetch_all`] with a callback per settled URL:
    /// `(outcome, settled_so_far, total)`.
    #[instrument(skip_all, fields(urls = urls.len(), max_concurrent))]
    pub async fn fetch_all_with_progress<F>(
        &self,
        urls: &[String],
        max_concurrent: usize,
        cancel: &CancellationToken,
        on_settled: F,
    ) -> Vec<FetchOutcome>
    where
        F: Fn(&FetchOutcome, usize, usize),
    {
        let total = urls.len();
        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let mut tasks = JoinSet::new();
        let mut index_of: HashMap<task::Id, usize> = HashMap::with_capacity(total);
        let mut slots: Vec<Option<FetchOutcome>> = vec![None; total];
        let mut settled = 0;

        let mut pending = urls.iter().enumerate();
        let mut next = pending.next();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled(), if next.is_some() => {
                    let launched = next.map_or(total, |(index, _)| index);
                    info!(launched, remaining = total - launched, "cancelled, not launching remaining urls");
                    next = None;
                }
                Some(joined) = tasks.join_next_with_id() => {
                    let (id, outcome) = match joined {
                        Ok(done) => done,
                        Err(e) => {
                            let url = index_of.get(&e.id()).map_or("", |&i| urls[i].as_str());
                            warn!(%url, error = %e, "fetch task failed");
                            let outcome = FetchOutcome::failed(
                                url,
                                self.chain.last_kind(),
                                format!("fetch task failed: {e}"),
                            );
                            (e.id(), outcome)
                        }
                    };
                    settled += 1;
                    on_settled(&outcome, settled, total);
                    if let Some(index) = index_of.remove(&id) {
                        slots[index] = Some(outcome);
                    }
                }
                permit = Arc::clone(&semaphore).acquire_owned(), if next.is_some() => {
                    let (Ok(permit), Some((index, url))) = (permit, next) else {
                        next = None;
                        continue;
                    };
                    let chain = Arc::clone(&self.chain);
                    let cancel = cancel.clone();
                    let task_url = url.clone();
                    let handle = tasks.spawn(async move {
                        let _permit = permit;
                        chain.run(&task_url, &cancel).await
                    });
                    index_of.insert(handle.id(), index);
                    next = pending.next();
                }
                else => break,
            }
        }

        let outcomes: Vec<FetchOutcome> = slots.into_iter().flatten().collect();
        info!(
            requested = total,
            settled = outcomes.len(),
            succeeded = outcomes.iter().filter(|o| o.success).count(),
            "fetch batch complete"
        );
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::tests::StubProvider;
    use crate::{FetchError, FetchProvider, FetchedContent};
    use async_trait::async_trait;
    use newsforge_shared::ProviderKind;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Tracks how many fetches run at the same time.
    struct Gauge {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl FetchProvider for Gauge {
        fn kind(&self) -> ProviderKind {
            ProviderKind::CrawlService
        }

        async fn fetch(&self, url: &str) -> std::result::Result<FetchedContent, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if url.contains("panic") {
                panic!("provider blew up");
            }
            Ok(FetchedContent {
                content: format!("content of {url}"),
                title: String::new(),
                cost: None,
            })
        }
    }

    fn gauge() -> Arc<Gauge> {
        Arc::new(Gauge {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    fn orchestrator_over(provider: Arc<dyn FetchProvider>) -> FetchOrchestrator {
        FetchOrchestrator::new(FallbackChain::new(vec![provider]))
    }

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://site{i}.example/story")).collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_max_concurrent() {
        let g = gauge();
        let orchestrator = orchestrator_over(g.clone());

        let out = orchestrator
            .fetch_all(&urls(12), 3, &CancellationToken::new())
            .await;

        assert_eq!(out.len(), 12);
        assert!(out.iter().all(|o| o.success));
        let peak = g.peak.load(Ordering::SeqCst);
        assert!((1..=3).contains(&peak), "peak in flight was {peak}");
    }

    #[tokio::test]
    async fn outcomes_follow_input_order() {
        let orchestrator = orchestrator_over(gauge());
        let input = urls(5);

        let out = orchestrator
            .fetch_all(&input, 2, &CancellationToken::new())
            .await;

        let got: Vec<&str> = out.iter().map(|o| o.url.as_str()).collect();
        let want: Vec<&str> = input.iter().map(String::as_str).collect();
        assert_eq!(got, want);
    }

    #[tokio::test]
    async fn zero_concurrency_still_makes_progress() {
        let orchestrator = orchestrator_over(gauge());
        let out = orchestrator
            .fetch_all(&urls(2), 0, &CancellationToken::new())
            .await;
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn panicking_task_fails_only_its_url() {
        let orchestrator = orchestrator_over(gauge());
        let input = vec![
            "https://ok.example/1".to_string(),
            "https://panic.example/2".to_string(),
            "https://ok.example/3".to_string(),
        ];

        let out = orchestrator
            .fetch_all(&input, 3, &CancellationToken::new())
            .await;

        assert_eq!(out.len(), 3);
        assert!(out[0].success && out[2].success);
        assert!(!out[1].success);
        assert_eq!(out[1].provider, ProviderKind::CrawlService);
        assert!(out[1].error.as_deref().unwrap_or("").contains("fetch task failed"));
    }

    #[tokio::test]
    async fn cancelled_before_start_launches_nothing() {
        let stub = StubProvider::ok(ProviderKind::CrawlService, "text", None);
        let orchestrator = orchestrator_over(stub.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let out = orchestrator.fetch_all(&urls(4), 2, &cancel).await;

        assert!(out.is_empty());
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn cancellation_keeps_settled_and_skips_pending() {
        let slow = StubProvider::slow(ProviderKind::CrawlService, Duration::from_secs(30));
        let orchestrator = orchestrator_over(slow.clone());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let out = orchestrator.fetch_all(&urls(3), 1, &cancel).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(out.len(), 1);
        assert!(!out[0].success);
        assert_eq!(out[0].error.as_deref(), Some("cancelled"));
        assert_eq!(slow.calls(), 1);
    }

    #[tokio::test]
    async fn progress_reports_every_settled_url() {
        let orchestrator = orchestrator_over(gauge());
        let seen = Mutex::new(Vec::new());

        orchestrator
            .fetch_all_with_progress(&urls(4), 2, &CancellationToken::new(), |o, done, total| {
                seen.lock().unwrap().push((o.url.clone(), done, total));
            })
            .await;

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen.last().map(|s| (s.1, s.2)), Some((4, 4)));
    }

    /// Sleeps only for URLs containing "slow".
    struct SlowWhenAsked;

    #[async_trait]
    impl FetchProvider for SlowWhenAsked {
        fn kind(&self) -> ProviderKind {
            ProviderKind::HttpBasic
        }

        async fn fetch(&self, url: &str) -> std::result::Result<FetchedContent, FetchError> {
            if url.contains("slow") {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            Ok(FetchedContent {
                content: format!("content of {url}"),
                title: String::new(),
                cost: None,
            })
        }
    }

    #[tokio::test]
    async fn progress_follows_settle_order_not_input_order() {
        let orchestrator = orchestrator_over(Arc::new(SlowWhenAsked));
        let input = vec![
            "https://slow.example/1".to_string(),
            "https://fast.example/2".to_string(),
            "https://fast.example/3".to_string(),
        ];
        let seen = Mutex::new(Vec::new());

        let out = orchestrator
            .fetch_all_with_progress(&input, 3, &CancellationToken::new(), |o, done, _| {
                seen.lock().unwrap().push((o.url.clone(), done));
            })
            .await;

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.last(), Some(&("https://slow.example/1".to_string(), 3)));
        assert!(seen[..2].iter().all(|(url, _)| url.contains("fast")));

        let got: Vec<&str> = out.iter().map(|o| o.url.as_str()).collect();
        let want: Vec<&str> = input.iter().map(String::as_str).collect();
        assert_eq!(got, want);
    }

    #[tokio::test]
    async fn fetch_one_runs_the_chain() {
        let providers: Vec<Arc<dyn FetchProvider>> = vec![
            StubProvider::unconfigured(ProviderKind::CrawlService),
            StubProvider::ok(ProviderKind::Firecrawl, "scraped", Some(0.01)),
        ];
        let orchestrator = FetchOrchestrator::new(FallbackChain::new(providers));
        let out = orchestrator
            .fetch_one("https://a.example/x", &CancellationToken::new())
            .await;
        assert_eq!(out.provider, ProviderKind::Firecrawl);
        assert_eq!(out.cost, Some(0.01));
    }
}
