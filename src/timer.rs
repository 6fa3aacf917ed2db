use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Periodic task that sends one `()` per period until cancelled or dropped.
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    pub fn spawn(period: Duration, tx: mpsc::Sender<()>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Owns at most one [`Ticker`] and keeps it alive exactly while the
/// session clock runs.
#[derive(Debug)]
pub struct Clock {
    ticker: Option<Ticker>,
    tx: mpsc::Sender<()>,
    period: Duration,
}

impl Clock {
    pub fn new(tx: mpsc::Sender<()>) -> Self {
        Self::with_period(Duration::from_secs(1), tx)
    }

    pub fn with_period(period: Duration, tx: mpsc::Sender<()>) -> Self {
        Self {
            ticker: None,
            tx,
            period,
        }
    }

    /// Spawn or cancel the ticker to match `ticking`.
    pub fn sync(&mut self, ticking: bool) {
        match (ticking, self.ticker.is_some()) {
            (true, false) => self.ticker = Some(Ticker::spawn(self.period, self.tx.clone())),
            (false, true) => self.stop(),
            _ => {}
        }
    }

    pub fn stop(&mut self) {
        if let Some(t) = self.ticker.take() {
            t.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }
}
