//! Fixed-interval tick scheduler for the Oinky server loop.
//!
//! The coordinator does one unit of work per tick and then sleeps until
//! the next tick boundary:
//!
//! ```ignore
//! let mut scheduler = TickScheduler::with_interval(TICK_DURATION);
//! loop {
//!     coordinator.step();
//!     scheduler.record_tick_end();
//!     scheduler.wait_for_tick().await;
//! }
//! ```
//!
//! Boundaries are kept on a fixed cadence (`start + n * interval`) so
//! the simulation rate doesn't drift with the time each step takes.
//! When a step runs long, the [`TickPolicy`] decides how to recover.

use std::time::{Duration, Instant};

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the loop falls behind its cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Skip the missed boundaries and resume from now.
    /// Prevents death spirals.
    #[default]
    Skip,
    /// Fire up to `max_catchup` late ticks back to back before giving up
    /// and resuming from now.
    CatchUp {
        /// Hard cap on consecutive catch-up ticks.
        max_catchup: u32,
    },
}

/// Full configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between tick boundaries. Zero is bumped to 1 ms.
    pub interval: Duration,
    /// Overrun handling policy.
    pub policy: TickPolicy,
    /// Budget warning threshold (0.0 to 1.0). Default: 0.80 (80%).
    pub budget_warn_threshold: f64,
    /// Budget critical threshold (0.0 to 1.0). Default: 1.0 (100%).
    pub budget_critical_threshold: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(50),
            policy: TickPolicy::default(),
            budget_warn_threshold: 0.80,
            budget_critical_threshold: 1.0,
        }
    }
}

impl TickConfig {
    /// Create a config for a specific interval with default thresholds.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.interval.is_zero() {
            warn!("tick interval of zero, using 1 ms");
            self.interval = Duration::from_millis(1);
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self.budget_critical_threshold =
            self.budget_critical_threshold.clamp(0.0, 1.0);
        if self.budget_warn_threshold > self.budget_critical_threshold {
            self.budget_warn_threshold = self.budget_critical_threshold;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Information about a tick boundary, returned by
/// [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// `true` if the boundary was reached late.
    pub overrun: bool,
    /// How many boundaries were dropped to recover (0 normally).
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Runtime metrics for the tick scheduler.
///
/// Timing values refer to the work reported via
/// [`TickScheduler::record_tick_end`].
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    /// Total ticks executed.
    pub total_ticks: u64,
    /// Total overruns detected.
    pub total_overruns: u64,
    /// Total boundaries skipped.
    pub total_skipped: u64,
    /// Exponential moving average of step time (α = 0.1).
    pub avg_tick_time: Duration,
    /// Maximum step time observed.
    pub max_tick_time: Duration,
    /// Last budget utilization. Above 1.0 means overrun.
    pub budget_utilization: f64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-interval tick scheduler. One per server loop.
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    /// When the next boundary is due (Tokio instant for `sleep_until`).
    next_tick: TokioInstant,
    /// Wall-clock start of the current step, consumed by `record_tick_end`.
    step_start: Instant,
    /// Consecutive catch-up ticks fired so far.
    catching_up: u32,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Create a new scheduler. The first boundary is one interval away.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();

        debug!(
            interval_ms = config.interval.as_secs_f64() * 1000.0,
            policy = ?config.policy,
            "tick scheduler created"
        );

        Self {
            next_tick: TokioInstant::now() + config.interval,
            config,
            tick_count: 0,
            step_start: Instant::now(),
            catching_up: 0,
            metrics: TickMetrics::default(),
        }
    }

    /// Create a scheduler for a specific interval with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self::new(TickConfig::with_interval(interval))
    }

    /// Sleep until the next tick boundary and return its [`TickInfo`].
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let interval = self.config.interval;
        let due = self.next_tick;

        time::sleep_until(due).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.step_start = Instant::now();

        // More than 10% late counts as an overrun.
        let late_by = now.saturating_duration_since(due);
        let overrun = late_by > interval / 10;
        let behind = late_by.as_nanos() / interval.as_nanos();
        let behind = u64::try_from(behind).unwrap_or(u64::MAX);
        let mut ticks_skipped = 0u64;

        self.next_tick = match self.config.policy {
            _ if !overrun => {
                self.catching_up = 0;
                due + interval
            }
            TickPolicy::CatchUp { max_catchup }
                if self.catching_up < max_catchup && behind > 0 =>
            {
                self.catching_up += 1;
                warn!(
                    tick = self.tick_count,
                    behind,
                    catching_up = self.catching_up,
                    "tick overrun, catching up"
                );
                due + interval
            }
            _ => {
                self.catching_up = 0;
                ticks_skipped = behind;
                if ticks_skipped > 0 {
                    warn!(
                        tick = self.tick_count,
                        skipped = ticks_skipped,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "tick overrun, skipping ahead"
                    );
                }
                now + interval
            }
        };

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += ticks_skipped;
        self.metrics.total_ticks += 1;

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Record that the work for the current tick has finished.
    ///
    /// Measures wall-clock time since the last boundary against the
    /// interval and logs when the budget thresholds are crossed.
    pub fn record_tick_end(&mut self) {
        let elapsed = self.step_start.elapsed();
        let budget = self.config.interval;
        let utilization = elapsed.as_secs_f64() / budget.as_secs_f64();
        self.metrics.budget_utilization = utilization;

        if utilization >= self.config.budget_critical_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = budget.as_secs_f64() * 1000.0,
                "CRITICAL: tick exceeded budget"
            );
        } else if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = budget.as_secs_f64() * 1000.0,
                "tick approaching budget limit"
            );
        }

        if elapsed > self.metrics.max_tick_time {
            self.metrics.max_tick_time = elapsed;
        }
        let alpha = 0.1;
        let prev = self.metrics.avg_tick_time.as_secs_f64();
        self.metrics.avg_tick_time = Duration::from_secs_f64(
            prev * (1.0 - alpha) + elapsed.as_secs_f64() * alpha,
        );
    }

    /// Current tick count.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Snapshot of current metrics.
    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        self.config.interval
    }
}
