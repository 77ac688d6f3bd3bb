use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Sliding window over the most recent step durations.
///
/// Statistics cover only the retained window; `total_steps` counts every
/// recorded step.
#[derive(Debug, Clone)]
pub struct StepTimer {
    window: VecDeque<Duration>,
    capacity: usize,
    total_steps: u64,
}

impl StepTimer {
    /// A window of at least one sample.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            total_steps: 0,
        }
    }

    pub fn record(&mut self, elapsed: Duration) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(elapsed);
        self.total_steps += 1;
    }

    /// Run `f`, record how long it took, and pass its result through.
    pub fn time<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(start.elapsed());
        out
    }

    pub fn average(&self) -> Duration {
        match self.window.len() {
            0 => Duration::ZERO,
            n => self.window.iter().sum::<Duration>() / n as u32,
        }
    }

    pub fn min(&self) -> Duration {
        self.window.iter().copied().min().unwrap_or_default()
    }

    pub fn max(&self) -> Duration {
        self.window.iter().copied().max().unwrap_or_default()
    }

    /// Samples currently in the window.
    pub fn count(&self) -> usize {
        self.window.len()
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }
}

impl fmt::Display for StepTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "steps={} window={} avg={:?} min={:?} max={:?}",
            self.total_steps,
            self.count(),
            self.average(),
            self.min(),
            self.max()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn empty_timer_reports_zero() {
        let timer = StepTimer::new(4);
        assert_eq!(timer.count(), 0);
        assert_eq!(timer.average(), Duration::ZERO);
        assert_eq!(timer.min(), Duration::ZERO);
        assert_eq!(timer.max(), Duration::ZERO);
    }

    #[test]
    fn statistics_over_partial_window() {
        let mut timer = StepTimer::new(8);
        for v in [4, 8, 6] {
            timer.record(ms(v));
        }
        assert_eq!(timer.count(), 3);
        assert_eq!(timer.average(), ms(6));
        assert_eq!(timer.min(), ms(4));
        assert_eq!(timer.max(), ms(8));
    }

    #[test]
    fn window_drops_oldest_samples() {
        let mut timer = StepTimer::new(2);
        for v in [100, 10, 30] {
            timer.record(ms(v));
        }
        assert_eq!(timer.count(), 2);
        assert_eq!(timer.total_steps(), 3);
        assert_eq!(timer.average(), ms(20));
        assert_eq!(timer.max(), ms(30));
    }

    #[test]
    fn zero_capacity_keeps_one_sample() {
        let mut timer = StepTimer::new(0);
        timer.record(ms(1));
        timer.record(ms(2));
        assert_eq!(timer.count(), 1);
        assert_eq!(timer.average(), ms(2));
    }

    #[test]
    fn time_records_and_returns() {
        let mut timer = StepTimer::new(4);
        let value = timer.time(|| 21 * 2);
        assert_eq!(value, 42);
        assert_eq!(timer.total_steps(), 1);
        assert!(format!("{timer}").contains("steps=1"));
    }
}
