// src/source/mod.rs
pub mod ascii;
pub mod demo;
pub mod serial;

use std::collections::VecDeque;

use crate::model::{SampleBatch, StreamError};

pub use ascii::AsciiReader;
pub use demo::DemoSource;
pub use serial::{available_ports, open_serial, SerialReader};

/// Something that yields decoded sample batches on demand.
///
/// `num_channels`/`has_x` announce the shape of the batches the source
/// currently produces; consumers reconfigure when it changes.
pub trait SampleSource {
    fn num_channels(&self) -> usize;

    fn has_x(&self) -> bool {
        false
    }

    /// `Ok(None)` means nothing is available right now (or ever again).
    fn next_batch(&mut self) -> Result<Option<SampleBatch>, StreamError>;
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn num_channels(&self) -> usize {
        (**self).num_channels()
    }

    fn has_x(&self) -> bool {
        (**self).has_x()
    }

    fn next_batch(&mut self) -> Result<Option<SampleBatch>, StreamError> {
        (**self).next_batch()
    }
}

/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    num_channels: usize,
    has_x: bool,
    queue: VecDeque<SampleBatch>,
}

impl ManualSource {
    pub fn new(num_channels: usize, batches: impl IntoIterator<Item = SampleBatch>) -> Self {
        Self {
            num_channels,
            has_x: false,
            queue: batches.into_iter().collect(),
        }
    }

    pub fn with_x(mut self, has_x: bool) -> Self {
        self.has_x = has_x;
        self
    }

    pub fn push(&mut self, batch: SampleBatch) {
        self.queue.push_back(batch);
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl SampleSource for ManualSource {
    fn num_channels(&self) -> usize {
        self.num_channels
    }

    fn has_x(&self) -> bool {
        self.has_x
    }

    fn next_batch(&mut self) -> Result<Option<SampleBatch>, StreamError> {
        Ok(self.queue.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_source_replays_in_order() {
        let a = SampleBatch::new(vec![vec![1.0]]).unwrap();
        let b = SampleBatch::new(vec![vec![2.0]]).unwrap();
        let mut source: Box<dyn SampleSource> = Box::new(ManualSource::new(1, [a.clone(), b]));
        assert_eq!(source.num_channels(), 1);
        assert!(!source.has_x());
        assert_eq!(source.next_batch().unwrap(), Some(a));
        assert!(source.next_batch().unwrap().is_some());
        assert_eq!(source.next_batch().unwrap(), None);
    }
}
