use crate::model::{SampleBatch, StreamError};

/// Anything that consumes decoded batches from a source.
pub trait Sink {
    fn feed_in(&mut self, batch: &SampleBatch) -> Result<(), StreamError>;

    /// Called by the producer before it starts sending batches of a new shape.
    fn set_num_channels(&mut self, num_channels: usize, has_x: bool) -> Result<(), StreamError>;
}
