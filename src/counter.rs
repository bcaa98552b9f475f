use std::time::{Duration, Instant};

use log::info;

use crate::model::{SampleBatch, Sink, StreamError};

const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Measures incoming samples per second (per channel).
pub struct SampleCounter {
    count: usize,
    last_report: Instant,
    sps: Option<f32>,
}

impl SampleCounter {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        Self {
            count: 0,
            last_report: now,
            sps: None,
        }
    }

    /// Latest measured rate, `None` until a full interval has passed.
    pub fn sps(&self) -> Option<f32> {
        self.sps
    }

    /// Adds `samples` and returns a fresh rate once an interval has elapsed.
    pub fn record_at(&mut self, samples: usize, now: Instant) -> Option<f32> {
        self.count += samples;
        let elapsed = now.saturating_duration_since(self.last_report);
        if elapsed <= REPORT_INTERVAL {
            return None;
        }
        let sps = 1000.0 * self.count as f32 / elapsed.as_millis() as f32;
        self.sps = Some(sps);
        self.count = 0;
        self.last_report = now;
        Some(sps)
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.sps = None;
        self.last_report = Instant::now();
    }
}

impl Default for SampleCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for SampleCounter {
    fn feed_in(&mut self, batch: &SampleBatch) -> Result<(), StreamError> {
        if let Some(sps) = self.record_at(batch.num_samples(), Instant::now()) {
            let precision = if sps < 1.0 { 3 } else { 0 };
            info!("{sps:.precision$} sps");
        }
        Ok(())
    }

    fn set_num_channels(&mut self, _num_channels: usize, _has_x: bool) -> Result<(), StreamError> {
        Ok(())
    }
}
