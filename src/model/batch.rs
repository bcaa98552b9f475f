use crate::model::StreamError;

/// One decoded batch of samples for every channel, plus optional x values.
///
/// Shape is checked on construction, so every channel holds exactly
/// `num_samples()` values and `x`, when present, has the same length.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBatch {
    data: Vec<Vec<f64>>, // channels x samples
    x: Option<Vec<f64>>,
    num_samples: usize,
}

impl SampleBatch {
    pub fn new(data: Vec<Vec<f64>>) -> Result<Self, StreamError> {
        let num_samples = Self::check_channels(&data)?;
        Ok(Self {
            data,
            x: None,
            num_samples,
        })
    }

    pub fn with_x(data: Vec<Vec<f64>>, x: Vec<f64>) -> Result<Self, StreamError> {
        let num_samples = Self::check_channels(&data)?;
        if x.len() != num_samples {
            return Err(StreamError::RaggedBatch {
                channel: data.len(),
                expected: num_samples,
                actual: x.len(),
            });
        }
        Ok(Self {
            data,
            x: Some(x),
            num_samples,
        })
    }

    /// Batch with `num_channels` channels and no samples.
    pub fn empty(num_channels: usize) -> Self {
        Self {
            data: vec![Vec::new(); num_channels],
            x: None,
            num_samples: 0,
        }
    }

    fn check_channels(data: &[Vec<f64>]) -> Result<usize, StreamError> {
        let expected = data.first().map(|c| c.len()).unwrap_or(0);
        for (channel, samples) in data.iter().enumerate() {
            if samples.len() != expected {
                return Err(StreamError::RaggedBatch {
                    channel,
                    expected,
                    actual: samples.len(),
                });
            }
        }
        Ok(expected)
    }

    pub fn num_channels(&self) -> usize {
        self.data.len()
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn has_x(&self) -> bool {
        self.x.is_some()
    }

    /// Samples of one channel. Panics if `index >= num_channels()`.
    pub fn channel(&self, index: usize) -> &[f64] {
        &self.data[index]
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f64]> {
        self.data.iter().map(Vec::as_slice)
    }

    pub fn x(&self) -> Option<&[f64]> {
        self.x.as_deref()
    }
}
