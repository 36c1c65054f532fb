//! Approved-catalogue lookup.
//!
//! Walks every page of approved, active catalogues in the registry and
//! caches the snapshot for a bounded time. The cache is dropped on an
//! explicit `invalidate()` or on any `catalogue.*` event seen by the
//! invalidation listener.

use crate::deadline::with_deadline;
use catalogue_core::{ApprovedCatalogues, ChangeEvent, Result, CATALOGUE_TYPE};
use catalogue_registry::{PageRequest, RecordQuery, Registry};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct Cached {
    snapshot: ApprovedCatalogues,
    fetched_at: Instant,
}

pub struct CatalogueLookup {
    registry: Arc<dyn Registry>,
    page_size: usize,
    ttl: Option<Duration>,
    call_timeout: Duration,
    cache: RwLock<Option<Cached>>,
}

impl CatalogueLookup {
    pub fn new(
        registry: Arc<dyn Registry>,
        page_size: usize,
        ttl: Option<Duration>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            page_size: page_size.max(1),
            ttl,
            call_timeout,
            cache: RwLock::new(None),
        }
    }

    /// Current snapshot, served from cache while it is fresh.
    pub async fn approved(&self) -> Result<ApprovedCatalogues> {
        if let Some(ttl) = self.ttl {
            if let Some(cached) = self.cache.read().await.as_ref() {
                if cached.fetched_at.elapsed() < ttl {
                    return Ok(cached.snapshot.clone());
                }
            }
        }

        let snapshot = self.fetch_approved_catalogue_ids().await?;
        if self.ttl.is_some() {
            *self.cache.write().await = Some(Cached {
                snapshot: snapshot.clone(),
                fetched_at: Instant::now(),
            });
        }
        Ok(snapshot)
    }

    /// Uncached fetch of every approved, active catalogue id.
    pub async fn fetch_approved_catalogue_ids(&self) -> Result<ApprovedCatalogues> {
        let query = RecordQuery::approved_catalogues();
        let mut ids = Vec::new();
        let mut from = 0;
        loop {
            let page = with_deadline(
                "catalogue lookup",
                self.call_timeout,
                self.registry.get_all(&query, PageRequest::new(from, self.page_size)),
            )
            .await?;
            let fetched = page.results.len();
            ids.extend(page.results.into_iter().map(|r| r.document.id));
            if fetched == 0 || page.to >= page.total {
                break;
            }
            from = page.to;
        }
        debug!("fetched {} approved catalogues", ids.len());
        Ok(ApprovedCatalogues::new(ids))
    }

    pub async fn invalidate(&self) {
        if self.cache.write().await.take().is_some() {
            debug!("approved-catalogue cache invalidated");
        }
    }

    /// Invalidate the cache whenever a catalogue event arrives. Stops when
    /// `cancel` fires or the bus closes.
    pub fn spawn_invalidation_listener(
        self: Arc<Self>,
        mut events: broadcast::Receiver<ChangeEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("catalogue cache listener started");
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = events.recv() => match received {
                        Ok(event) if event.kind == CATALOGUE_TYPE => self.invalidate().await,
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("catalogue cache listener lagged by {} events", n);
                            self.invalidate().await;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            info!("catalogue cache listener stopped");
        })
    }
}
