use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trait for high-precision timers
pub trait Timer: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, ts: Self::Timestamp) -> Duration;
    fn sleep(&self, d: Duration);
}

/// Monotonic wall clock with nanosecond timestamps since creation.
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    pub start: Instant,
}

impl Timer for HighPrecisionTimer {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(not(target_os = "linux"))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC, EINTR, TIMER_ABSTIME};

        let mut deadline = timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `deadline` is a valid, writable timespec.
        unsafe {
            libc::clock_gettime(CLOCK_MONOTONIC, &mut deadline);
        }
        let nanos = deadline.tv_nsec as u64 + duration.subsec_nanos() as u64;
        deadline.tv_sec +=
            (duration.as_secs() + nanos / 1_000_000_000) as libc::time_t;
        deadline.tv_nsec = (nanos % 1_000_000_000) as libc::c_long;

        // Absolute deadline so signal interruptions resume without drift.
        loop {
            // SAFETY: `deadline` outlives the call and the remainder pointer may be null
            // for absolute sleeps.
            let rc = unsafe {
                clock_nanosleep(CLOCK_MONOTONIC, TIMER_ABSTIME, &deadline, std::ptr::null_mut())
            };
            if rc != EINTR {
                break;
            }
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Virtual clock that only moves when told to.
///
/// Clones share the same time, so a scripted input source can advance the clock
/// the presenter reads from. `sleep` advances instead of blocking.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    now_ns: Arc<AtomicU64>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        self.now_ns.fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Timer for ManualTimer {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
    fn sleep(&self, d: Duration) {
        self.advance(d)
    }
}

/// Rolling window of frame presentation durations.
#[derive(Debug, Clone)]
pub struct FrameTimings {
    pub frame_times: Vec<Duration>,
    pub max_samples: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameStats {
    pub samples: usize,
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
}

impl FrameTimings {
    pub fn new(max_samples: usize) -> Self {
        Self {
            frame_times: Vec::with_capacity(max_samples),
            max_samples,
        }
    }

    pub fn record_frame(&mut self, d: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.remove(0);
        }
        self.frame_times.push(d);
    }

    pub fn stats(&self) -> Option<FrameStats> {
        if self.frame_times.is_empty() {
            return None;
        }
        let times: Vec<f64> = self
            .frame_times
            .iter()
            .map(|d| d.as_nanos() as f64)
            .collect();
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(FrameStats {
            samples: times.len(),
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
        })
    }
}

impl Default for FrameTimings {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_timer_clones_share_time() {
        let timer = ManualTimer::new();
        let other = timer.clone();
        let t0 = timer.now();
        other.advance(Duration::from_millis(5));
        timer.sleep(Duration::from_millis(2));
        assert_eq!(timer.elapsed(t0), Duration::from_millis(7));
    }

    #[test]
    fn high_precision_sleep_waits_at_least_duration() {
        let timer = HighPrecisionTimer::new();
        let t0 = timer.now();
        timer.sleep(Duration::from_millis(2));
        assert!(timer.elapsed(t0) >= Duration::from_millis(2));
    }

    #[test]
    fn frame_timings_keep_a_bounded_window() {
        let mut timings = FrameTimings::new(2);
        assert!(timings.stats().is_none());
        for ms in [10, 20, 30] {
            timings.record_frame(Duration::from_millis(ms));
        }
        let stats = timings.stats().unwrap();
        assert_eq!(stats.samples, 2);
        assert_eq!(stats.average_frame_time_ns, 25_000_000.0);
        assert_eq!(stats.min_frame_time_ns, 20_000_000.0);
        assert_eq!(stats.max_frame_time_ns, 30_000_000.0);
        assert_eq!(stats.jitter_ns, 5_000_000.0);
    }
}
