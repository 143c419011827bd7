//! Call duration measurement.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch for `time`, or 0 if the clock is before the epoch.
pub fn epoch_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
struct Reference(std::time::Instant);

#[cfg(not(target_arch = "wasm32"))]
impl Reference {
    fn now(_wall: SystemTime) -> Self {
        Self(std::time::Instant::now())
    }

    fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

// wasm32-unknown has no monotonic clock; wall-clock subtraction may skew on clock adjustment.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy)]
struct Reference(SystemTime);

#[cfg(target_arch = "wasm32")]
impl Reference {
    fn now(wall: SystemTime) -> Self {
        Self(wall)
    }

    fn elapsed(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.0)
            .unwrap_or(Duration::ZERO)
    }
}

/// A running measurement started at a fixed reference instant.
///
/// `elapsed()` can be read any number of times and never decreases.
#[derive(Debug, Clone, Copy)]
pub struct DurationMeasurement {
    started_at: SystemTime,
    reference: Reference,
}

impl DurationMeasurement {
    /// Fix the reference instant now.
    pub fn start() -> Self {
        let started_at = SystemTime::now();
        Self {
            started_at,
            reference: Reference::now(started_at),
        }
    }

    /// Wall-clock start time, stable for event correlation.
    pub fn start_time(&self) -> SystemTime {
        self.started_at
    }

    /// Wall-clock start time in epoch milliseconds.
    pub fn start_timestamp_ms(&self) -> u64 {
        epoch_millis(self.started_at)
    }

    pub fn elapsed(&self) -> Duration {
        self.reference.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }
}
