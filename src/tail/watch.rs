//! Timer-driven poll loop.
//!
//! One spawned task per watched file runs [`TailEngine::poll`] on a fixed
//! interval. Ticks never overlap: a slow tick delays the next one instead of
//! running beside it. Shutdown goes through a `watch` channel and takes effect
//! between ticks.

use crate::error::{Result, TailError};
use crate::file_handler::RangeReader;
use crate::history::SharedHistory;
use crate::tail::engine::TailEngine;
use crate::tail::protocol::PollOutcome;
use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

impl<R: RangeReader + 'static> TailEngine<R> {
    /// Take the startup snapshot, then watch the file on a background task.
    ///
    /// Startup errors are returned here and no task is spawned.
    pub async fn start(mut self) -> Result<TailHandle> {
        self.initialize().await?;

        let history = self.history();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(watch_loop(self, shutdown_rx));

        Ok(TailHandle {
            history,
            shutdown_tx,
            task,
        })
    }
}

/// Handle to a running watcher.
///
/// Dropping the handle also stops the watcher at its next tick boundary.
pub struct TailHandle {
    history: SharedHistory,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TailHandle {
    /// Current history, oldest first
    pub fn logs(&self) -> Vec<String> {
        self.history.snapshot()
    }

    pub fn history(&self) -> SharedHistory {
        self.history.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the poll timer and wait for the watcher to exit
    pub async fn shutdown(self) -> Result<()> {
        // Err only when the loop already exited
        let _ = self.shutdown_tx.send(true);
        self.task
            .await
            .map_err(|e| TailError::other(format!("tail watcher failed: {e}")))
    }
}

/// Poll `engine` every `poll_interval` until `shutdown` flips to true or its
/// sender is dropped. Per-tick errors are logged and retried next tick.
pub async fn watch_loop<R: RangeReader>(
    mut engine: TailEngine<R>,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = engine.config().poll_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        "watching {} every {:?}",
        engine.state().path.display(),
        period
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => match engine.poll().await {
                Ok(PollOutcome::Unchanged) => {}
                Ok(outcome) => debug!("poll of {}: {:?}", engine.state().path.display(), outcome),
                Err(err) => warn!(
                    "poll of {} failed, retrying next tick: {}",
                    engine.state().path.display(),
                    err
                ),
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    engine.mark_stopped();
    info!("stopped watching {}", engine.state().path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TailConfig;
    use crate::file_handler::MemoryRangeReader;
    use crate::tail::protocol::Batch;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn test_watcher_polls_on_interval() {
        let reader = Arc::new(MemoryRangeReader::new(b"first\n".to_vec()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let config = TailConfig::new("memory.log").with_poll_interval(Duration::from_millis(100));
        let handle = TailEngine::with_reader(config, Arc::clone(&reader))
            .with_sink(tx)
            .start()
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            Batch::init(vec!["first".to_string()])
        );

        reader.append(b"second\n");
        let update = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("update timed out")
            .unwrap();
        assert_eq!(update, Batch::update(vec!["second".to_string()]));
        assert_eq!(handle.logs(), vec!["first", "second"]);

        handle.shutdown().await.unwrap();
        // The engine and its sink are gone once the loop exits
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_watcher() {
        let reader = Arc::new(MemoryRangeReader::new(b"a\n".to_vec()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = TailEngine::with_reader(TailConfig::new("memory.log"), reader)
            .with_sink(tx)
            .start()
            .await
            .unwrap();
        rx.recv().await.unwrap();

        drop(handle);
        let closed = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert!(closed.is_none());
    }
}
