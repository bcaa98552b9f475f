use crate::model::{CircularSampleBuffer, SeriesData, StreamError, XSource};

/// Read-only view of one channel, valid until the stream is next mutated.
#[derive(Clone, Copy, Debug)]
pub struct ChannelView<'a> {
    index: usize,
    samples: &'a CircularSampleBuffer,
    x: &'a XSource,
}

impl<'a> ChannelView<'a> {
    pub(crate) fn new(index: usize, samples: &'a CircularSampleBuffer, x: &'a XSource) -> Self {
        Self { index, samples, x }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Samples currently stored, at most the stream's capacity.
    pub fn count(&self) -> usize {
        self.samples.count()
    }

    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }

    pub fn sample_at(&self, index: usize) -> Result<f64, StreamError> {
        self.samples.read(index)
    }

    pub fn x_at(&self, index: usize) -> Result<f64, StreamError> {
        self.x.value_at(index)
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.latest()
    }

    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.samples.min_max()
    }

    /// `[x, y]` pairs, oldest first.
    pub fn points(&self) -> impl Iterator<Item = [f64; 2]> + 'a {
        let x: &'a XSource = self.x;
        let samples: &'a CircularSampleBuffer = self.samples;
        samples
            .iter()
            .enumerate()
            .map_while(move |(i, y)| x.value_at(i).ok().map(|xv| [xv, y]))
    }
}

impl SeriesData for ChannelView<'_> {
    fn count(&self) -> usize {
        self.samples.count()
    }

    fn sample(&self, index: usize) -> Result<f64, StreamError> {
        self.samples.read(index)
    }
}
