//! Kit progress tracking and reconciliation.
//!
//! A station counts its own completed kits locally and displays a running
//! total. A background poller periodically fetches the authoritative total
//! from the shared store and the station adopts it; the displayed value is
//! therefore at most one poll interval stale.

use crate::db::log::ttlog_soft;
use crate::db::pool::DbPool;
use crate::db::progress;
use crate::errors::{AppError, AppResult};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Local view of one station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitTracker {
    pub job_id: i64,
    pub station_number: u32,
    local_completed: u64,
    displayed_total: u64,
}

impl KitTracker {
    pub fn new(job_id: i64, station_number: u32, initial_total: u64) -> Self {
        Self {
            job_id,
            station_number,
            local_completed: 0,
            displayed_total: initial_total,
        }
    }

    /// Count a kit finished at this station (optimistic local update).
    pub fn record_local(&mut self) -> u64 {
        self.local_completed += 1;
        self.displayed_total += 1;
        self.displayed_total
    }

    /// Adopt the authoritative total; returns how far the local view had drifted.
    pub fn reconcile(&mut self, authoritative: u64) -> i64 {
        let drift = i64::try_from(authoritative).unwrap_or(i64::MAX)
            - i64::try_from(self.displayed_total).unwrap_or(i64::MAX);
        self.displayed_total = authoritative;
        drift
    }

    pub fn local_completed(&self) -> u64 {
        self.local_completed
    }

    pub fn displayed_total(&self) -> u64 {
        self.displayed_total
    }
}

/// Persist one completed kit and return the new authoritative total.
pub fn record_kit(
    pool: &mut DbPool,
    job_id: i64,
    station_number: u32,
    station_name: &str,
) -> AppResult<u64> {
    if !crate::db::jobs::job_exists(&pool.conn, job_id)? {
        return Err(AppError::InvalidReference(format!("job {} does not exist", job_id)));
    }
    if station_number == 0 {
        return Err(AppError::Validation("station numbers start at 1".into()));
    }

    let total = progress::record_kit(&mut pool.conn, job_id, station_number, station_name)?;
    ttlog_soft(
        &pool.conn,
        "kit_done",
        &format!("job {}", job_id),
        &format!("station {} → total {}", station_number, total),
    );
    Ok(total)
}

/// Fixed-interval poll running on its own thread until stopped.
/// A failed fetch is logged and skipped; only freshness suffers.
pub struct ProgressPoller {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl ProgressPoller {
    /// Poll immediately, then once per `interval`.
    pub fn spawn<F, G>(interval: Duration, mut fetch: F, mut on_total: G) -> Self
    where
        F: FnMut() -> AppResult<u64> + Send + 'static,
        G: FnMut(u64) + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                match fetch() {
                    Ok(total) => {
                        debug!(total, "kit total polled");
                        on_total(total);
                    }
                    Err(e) => warn!(error = %e, "kit total poll failed"),
                }

                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Self { stop_tx, handle }
    }

    /// Stop polling and wait for the thread to exit.
    pub fn stop(self) {
        // A closed channel means the thread is already gone.
        let _ = self.stop_tx.send(());
        if self.handle.join().is_err() {
            warn!("kit poller thread panicked");
        }
    }
}

/// Poller reading `completed_kits_total` of one job from its own connection.
pub fn spawn_db_poller<G>(
    db_path: &str,
    busy_ms: u64,
    job_id: i64,
    interval: Duration,
    on_total: G,
) -> AppResult<ProgressPoller>
where
    G: FnMut(u64) + Send + 'static,
{
    let pool = DbPool::with_busy_timeout(db_path, busy_ms)?;
    Ok(ProgressPoller::spawn(
        interval,
        move || progress::completed_total(&pool.conn, job_id),
        on_total,
    ))
}
