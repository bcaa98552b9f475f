use log::{debug, error};

use crate::counter::SampleCounter;
use crate::model::{SampleBatch, Sink, Stream, StreamError};
use crate::source::SampleSource;

/// Pulls batches from a source and hands them to the stream and a rate counter.
pub struct Pipeline<S: SampleSource> {
    source: S,
    stream: Stream,
    counter: SampleCounter,
}

impl<S: SampleSource> Pipeline<S> {
    pub fn new(source: S, stream: Stream) -> Self {
        Self {
            source,
            stream,
            counter: SampleCounter::new(),
        }
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut Stream {
        &mut self.stream
    }

    pub fn counter(&self) -> &SampleCounter {
        &self.counter
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_parts(self) -> (S, Stream) {
        (self.source, self.stream)
    }

    /// Pumps one batch. Returns `Ok(false)` when the source had nothing.
    pub fn pump_once(&mut self) -> Result<bool, StreamError> {
        self.sync_shape()?;
        let Some(batch) = self.source.next_batch()? else {
            return Ok(false);
        };
        self.dispatch(&batch)?;
        Ok(true)
    }

    /// Pumps until the source is dry or `max_batches` were handled
    /// (`0` means no limit). Returns the number of batches handled.
    pub fn pump(&mut self, max_batches: usize) -> Result<usize, StreamError> {
        let mut handled = 0;
        while max_batches == 0 || handled < max_batches {
            if !self.pump_once()? {
                break;
            }
            handled += 1;
        }
        Ok(handled)
    }

    fn sync_shape(&mut self) -> Result<(), StreamError> {
        let (num_channels, has_x) = (self.source.num_channels(), self.source.has_x());
        if num_channels != self.stream.num_channels() || has_x != self.stream.has_x() {
            debug!("source shape changed to {num_channels} channels, x = {has_x}");
            let sinks: [&mut dyn Sink; 2] = [&mut self.stream, &mut self.counter];
            for sink in sinks {
                sink.set_num_channels(num_channels, has_x)?;
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, batch: &SampleBatch) -> Result<(), StreamError> {
        let sinks: [&mut dyn Sink; 2] = [&mut self.stream, &mut self.counter];
        for sink in sinks {
            if let Err(e) = sink.feed_in(batch) {
                if e.is_shape_violation() {
                    error!("source sent a batch that does not match its announced shape");
                }
                return Err(e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::model::ChannelRegistry;
    use crate::source::{DemoSource, ManualSource};

    fn stream(num_channels: usize, num_samples: usize) -> Stream {
        Stream::new(
            num_channels,
            false,
            num_samples,
            Rc::new(RefCell::new(ChannelRegistry::new())),
        )
        .unwrap()
    }

    #[test]
    fn pipeline_buffers_batches() {
        let batch = SampleBatch::new(vec![vec![0.0; 128], vec![1.0; 128]]).unwrap();
        let source = ManualSource::new(2, vec![batch.clone(), batch]);
        let mut pipeline = Pipeline::new(source, stream(2, 200));
        assert_eq!(pipeline.pump(0).unwrap(), 2);
        let view = pipeline.stream().channel(1).unwrap();
        assert_eq!(view.count(), 200);
        assert_eq!(view.latest(), Some(1.0));
        assert!(!pipeline.pump_once().unwrap());
    }

    #[test]
    fn follows_source_channel_count() {
        let mut pipeline = Pipeline::new(DemoSource::new(3, 10, 20.0).with_seed(1), stream(1, 50));
        assert_eq!(pipeline.pump(4).unwrap(), 4);
        assert_eq!(pipeline.stream().num_channels(), 3);
        assert!(pipeline.stream().channels().all(|c| c.count() == 40));
    }

    #[test]
    fn lying_source_fails_loudly() {
        let bad = SampleBatch::new(vec![vec![1.0]]).unwrap();
        let mut pipeline = Pipeline::new(ManualSource::new(2, vec![bad]), stream(2, 8));
        let err = pipeline.pump_once().unwrap_err();
        assert!(matches!(err, StreamError::ChannelMismatch { .. }));
        assert!(pipeline.stream().channels().all(|c| c.count() == 0));
    }
}
