//! Simulated progress for long stage calls.
//!
//! The service reports nothing while a stage runs, so displays show a
//! gauge that ramps toward a ceiling on a timer and only reaches 100 when
//! the call actually succeeds. The gauge is a pure observer; nothing in
//! the pipeline reads it back.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;

/// Interval between simulated progress ticks.
pub const PROGRESS_TICK: Duration = Duration::from_millis(300);

/// Ceiling the simulation ramps toward while the call is in flight.
pub const PROGRESS_CEILING: u8 = 90;

/// Shared percentage gauge, cheap to clone and hand to a display layer.
#[derive(Debug, Clone, Default)]
pub struct ProgressGauge {
    percent: Arc<RwLock<u8>>,
}

impl ProgressGauge {
    /// Creates a gauge at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current percentage.
    #[must_use]
    pub fn percent(&self) -> u8 {
        *self.percent.read()
    }

    fn set(&self, value: u8) {
        *self.percent.write() = value.min(100);
    }
}

/// Timer-driven ramp that animates a [`ProgressGauge`] while one stage
/// call is outstanding.
#[derive(Debug)]
pub struct SimulatedProgress {
    gauge: ProgressGauge,
    ticker: JoinHandle<()>,
}

impl SimulatedProgress {
    /// Starts the ramp from zero.
    ///
    /// Each tick closes a tenth of the remaining distance to the ceiling,
    /// at least one point, so the gauge decelerates as it approaches 90
    /// and never reaches it exactly under simulation alone.
    #[must_use]
    pub fn start(gauge: ProgressGauge) -> Self {
        gauge.set(0);
        let ticking = gauge.clone();
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(PROGRESS_TICK);
            interval.tick().await;
            loop {
                interval.tick().await;
                let current = ticking.percent();
                if current >= PROGRESS_CEILING {
                    continue;
                }
                let step = ((PROGRESS_CEILING - current) / 10).max(1);
                ticking.set((current + step).min(PROGRESS_CEILING));
            }
        });
        Self { gauge, ticker }
    }

    /// Stops the ramp; on success the gauge jumps to 100, on failure it
    /// freezes where it is.
    pub fn finish(self, success: bool) {
        self.ticker.abort();
        if success {
            self.gauge.set(100);
        }
    }
}

impl Drop for SimulatedProgress {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ramp_never_passes_ceiling() {
        let gauge = ProgressGauge::new();
        let sim = SimulatedProgress::start(gauge.clone());

        // Far longer than the ramp needs to saturate.
        tokio::time::sleep(Duration::from_secs(60)).await;
        tokio::task::yield_now().await;

        assert!(gauge.percent() <= PROGRESS_CEILING);
        assert!(gauge.percent() >= PROGRESS_CEILING - 1);
        sim.finish(false);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ramp_decelerates() {
        let gauge = ProgressGauge::new();
        let sim = SimulatedProgress::start(gauge.clone());

        tokio::time::sleep(PROGRESS_TICK).await;
        tokio::task::yield_now().await;
        let first = gauge.percent();

        tokio::time::sleep(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;
        let late_before = gauge.percent();
        tokio::time::sleep(PROGRESS_TICK).await;
        tokio::task::yield_now().await;
        let late_after = gauge.percent();

        // First step closes 9 points; near the ceiling steps shrink to 1.
        assert_eq!(first, 9);
        assert!(late_after - late_before <= first);
        sim.finish(false);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_jumps_to_hundred() {
        let gauge = ProgressGauge::new();
        let sim = SimulatedProgress::start(gauge.clone());

        tokio::time::sleep(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;
        sim.finish(true);

        assert_eq!(gauge.percent(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_freezes_gauge() {
        let gauge = ProgressGauge::new();
        let sim = SimulatedProgress::start(gauge.clone());

        tokio::time::sleep(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;
        let before = gauge.percent();
        sim.finish(false);

        tokio::time::sleep(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;
        assert_eq!(gauge.percent(), before);
        assert!(before < 100);
    }
}
