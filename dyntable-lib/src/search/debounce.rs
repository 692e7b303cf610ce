//! Restartable quiet-interval timer

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Fires once `delay` after the most recent [`Debouncer::schedule`].
///
/// Scheduling again before the delay elapses cancels the armed timer and
/// starts a new one. Each schedule has a generation number; a timer that
/// raced its own cancellation is discarded by generation, so at most one
/// firing is observed per quiet interval.
///
/// Must be used inside a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: u64,
    armed: Option<CancellationToken>,
    tx: mpsc::UnboundedSender<u64>,
    rx: mpsc::UnboundedReceiver<u64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            delay,
            generation: 0,
            armed: None,
            tx,
            rx,
        }
    }

    /// Returns true while a timer is armed and has not fired.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// (Re)starts the timer.
    pub fn schedule(&mut self) {
        self.cancel();
        self.generation += 1;

        let token = CancellationToken::new();
        let cancel = token.clone();
        let tx = self.tx.clone();
        let generation = self.generation;
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(generation);
                }
            }
        });
        self.armed = Some(token);
    }

    /// Disarms the timer without firing.
    pub fn cancel(&mut self) {
        if let Some(token) = self.armed.take() {
            token.cancel();
        }
    }

    /// Waits until the current timer fires.
    ///
    /// Pends forever if nothing is armed and nothing gets scheduled.
    pub async fn fired(&mut self) {
        while let Some(generation) = self.rx.recv().await {
            if generation == self.generation && self.armed.is_some() {
                self.armed = None;
                return;
            }
            log::trace!("Discarding stale debounce generation {}", generation);
        }
        std::future::pending::<()>().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_restart_delays_firing() {
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        let start = Instant::now();

        debouncer.schedule();
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.schedule();
        debouncer.fired().await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_millis(510));
        assert!(!debouncer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.schedule();
        debouncer.cancel();

        let fired = tokio::time::timeout(Duration::from_secs(1), debouncer.fired()).await;
        assert!(fired.is_err());
    }
}
