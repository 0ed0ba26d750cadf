//! Repeat worker tasks and their completion queue.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::RepeatId;
use crate::transaction::{HttpIssuer, HttpService, Transaction};

// ============================================================================
// RepeatReport
// ============================================================================

/// Result of one repeat, delivered back to the owning session.
#[derive(Debug)]
pub struct RepeatReport {
    /// Repeat this report belongs to.
    pub id: RepeatId,

    /// Service the request was sent to.
    pub service: HttpService,

    /// Whether the result should become a bookmark, captured at spawn time.
    pub also_bookmark: bool,

    /// New transaction, or [`Error::NetworkFailure`].
    pub outcome: Result<Transaction>,
}

impl RepeatReport {
    /// Returns `true` if the request completed.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

// ============================================================================
// RepeatWorkflow
// ============================================================================

/// Issues repeats off the control thread.
///
/// Each [`spawn`](Self::spawn) starts an independent tokio task. Finished
/// tasks push a [`RepeatReport`] onto an unbounded channel that only the
/// owner drains, so workers never touch bookmark state.
pub struct RepeatWorkflow {
    /// Request issuer shared by all workers.
    issuer: Arc<dyn HttpIssuer>,

    /// Runtime the workers run on.
    runtime: Handle,

    /// Optional cap on in-flight requests.
    limit: Option<Arc<Semaphore>>,

    /// Cloned into each worker.
    report_tx: mpsc::UnboundedSender<RepeatReport>,

    /// Drained by the owner.
    report_rx: mpsc::UnboundedReceiver<RepeatReport>,

    /// Spawned repeats whose report has not been taken yet.
    pending: usize,
}

impl RepeatWorkflow {
    /// Creates a workflow.
    ///
    /// # Arguments
    ///
    /// * `issuer` - Sends the requests
    /// * `runtime` - Runtime to spawn workers on
    /// * `max_concurrent` - In-flight cap, `None` for unbounded
    #[must_use]
    pub fn new(
        issuer: Arc<dyn HttpIssuer>,
        runtime: Handle,
        max_concurrent: Option<usize>,
    ) -> Self {
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        Self {
            issuer,
            runtime,
            limit: max_concurrent.map(|n| Arc::new(Semaphore::new(n))),
            report_tx,
            report_rx,
            pending: 0,
        }
    }

    /// Starts a repeat and returns immediately.
    pub fn spawn(&mut self, service: HttpService, request: Vec<u8>, also_bookmark: bool) -> RepeatId {
        let id = RepeatId::generate();
        let issuer = Arc::clone(&self.issuer);
        let limit = self.limit.clone();
        let report_tx = self.report_tx.clone();

        debug!(%id, service = %service, len = request.len(), also_bookmark, "Spawning repeat");

        self.runtime.spawn(async move {
            let outcome = run_repeat(issuer.as_ref(), &service, &request, limit).await;

            match &outcome {
                Ok(_) => info!(%id, service = %service, "Repeat completed"),
                Err(e) => warn!(%id, service = %service, error = %e, "Repeat failed"),
            }

            let report = RepeatReport {
                id,
                service,
                also_bookmark,
                outcome,
            };
            if report_tx.send(report).is_err() {
                debug!(%id, "Repeat owner dropped, discarding report");
            }
        });

        self.pending += 1;
        id
    }

    /// Returns a finished report without waiting.
    pub fn try_next(&mut self) -> Option<RepeatReport> {
        let report = self.report_rx.try_recv().ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(report)
    }

    /// Waits for the next report. Returns `None` when nothing is in flight.
    pub async fn next(&mut self) -> Option<RepeatReport> {
        if self.pending == 0 {
            return None;
        }
        let report = self.report_rx.recv().await?;
        self.pending -= 1;
        Some(report)
    }

    /// Returns the number of repeats not yet reported back.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending
    }
}

impl fmt::Debug for RepeatWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepeatWorkflow")
            .field("pending", &self.pending)
            .field(
                "available_permits",
                &self.limit.as_ref().map(|s| s.available_permits()),
            )
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Worker
// ============================================================================

/// Issues one request. Every failure, including a panic in the issuer,
/// comes back as [`Error::NetworkFailure`].
async fn run_repeat(
    issuer: &dyn HttpIssuer,
    service: &HttpService,
    request: &[u8],
    limit: Option<Arc<Semaphore>>,
) -> Result<Transaction> {
    let target = service.authority();

    let _permit = match limit {
        Some(semaphore) => Some(
            semaphore
                .acquire_owned()
                .await
                .map_err(|_| Error::network_failure(&target, "repeat limiter closed"))?,
        ),
        None => None,
    };

    match AssertUnwindSafe(issuer.issue(service, request))
        .catch_unwind()
        .await
    {
        Ok(Ok(transaction)) => Ok(transaction),
        Ok(Err(e @ Error::NetworkFailure { .. })) => Err(e),
        Ok(Err(e)) => Err(Error::network_failure(target, e.to_string())),
        Err(_) => Err(Error::network_failure(target, "repeat worker panicked")),
    }
}

// ============================================================================
// Tests
// ============================================================================
