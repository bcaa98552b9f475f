use serde::{Deserialize, Serialize};

use crate::model::{CircularSampleBuffer, StreamError};

/// How the stream derives x values when batches carry none.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XAxis {
    pub as_index: bool,
    pub min: f64,
    pub max: f64,
}

impl XAxis {
    pub fn index() -> Self {
        Self::default()
    }

    pub fn linear(min: f64, max: f64) -> Self {
        Self {
            as_index: false,
            min,
            max,
        }
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if !self.as_index {
            check_range(self.min, self.max)?;
        }
        Ok(())
    }
}

impl Default for XAxis {
    fn default() -> Self {
        Self {
            as_index: true,
            min: 0.0,
            max: 1.0,
        }
    }
}

fn check_range(min: f64, max: f64) -> Result<(), StreamError> {
    // also rejects NaN bounds
    if min < max {
        Ok(())
    } else {
        Err(StreamError::InvalidRange { min, max })
    }
}

/// X coordinate shared by every channel of a stream.
///
/// `Index` and `Linear` compute values on demand; `Sampled` keeps the x
/// values that arrived with each batch in a ring of its own.
#[derive(Clone, Debug)]
pub enum XSource {
    Index {
        capacity: usize,
    },
    Linear {
        capacity: usize,
        min: f64,
        max: f64,
        step: f64,
    },
    Sampled(CircularSampleBuffer),
}

impl XSource {
    pub fn index(capacity: usize) -> Self {
        XSource::Index { capacity }
    }

    pub fn linear(capacity: usize, min: f64, max: f64) -> Result<Self, StreamError> {
        check_range(min, max)?;
        Ok(XSource::Linear {
            capacity,
            min,
            max,
            step: linear_step(capacity, min, max),
        })
    }

    pub fn sampled(capacity: usize) -> Self {
        XSource::Sampled(CircularSampleBuffer::new(capacity))
    }

    /// Builds the computed source matching `axis`.
    pub fn from_axis(axis: &XAxis, capacity: usize) -> Result<Self, StreamError> {
        if axis.as_index {
            Ok(Self::index(capacity))
        } else {
            Self::linear(capacity, axis.min, axis.max)
        }
    }

    pub fn capacity(&self) -> usize {
        match self {
            XSource::Index { capacity } | XSource::Linear { capacity, .. } => *capacity,
            XSource::Sampled(buf) => buf.capacity(),
        }
    }

    /// Number of positions that currently have an x value.
    pub fn len(&self) -> usize {
        match self {
            XSource::Sampled(buf) => buf.count(),
            _ => self.capacity(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_sampled(&self) -> bool {
        matches!(self, XSource::Sampled(_))
    }

    pub fn value_at(&self, index: usize) -> Result<f64, StreamError> {
        match self {
            XSource::Sampled(buf) => buf.read(index),
            XSource::Index { capacity } => {
                check_index(index, *capacity)?;
                Ok(index as f64)
            }
            XSource::Linear {
                capacity,
                min,
                max,
                step,
            } => {
                check_index(index, *capacity)?;
                // last slot is exactly max
                if index > 0 && index + 1 == *capacity {
                    Ok(*max)
                } else {
                    Ok(min + index as f64 * step)
                }
            }
        }
    }

    pub fn resize(&mut self, new_capacity: usize) {
        match self {
            XSource::Index { capacity } => *capacity = new_capacity,
            XSource::Linear {
                capacity,
                min,
                max,
                step,
            } => {
                *capacity = new_capacity;
                *step = linear_step(new_capacity, *min, *max);
            }
            XSource::Sampled(buf) => buf.resize(new_capacity),
        }
    }

    /// Moves the bounds of a linear source. Other variants ignore the call.
    pub fn set_range(&mut self, new_min: f64, new_max: f64) -> Result<(), StreamError> {
        check_range(new_min, new_max)?;
        if let XSource::Linear {
            capacity,
            min,
            max,
            step,
        } = self
        {
            *min = new_min;
            *max = new_max;
            *step = linear_step(*capacity, new_min, new_max);
        }
        Ok(())
    }

    pub(crate) fn append(&mut self, x: &[f64]) {
        if let XSource::Sampled(buf) = self {
            buf.append(x);
        }
    }

    pub(crate) fn clear(&mut self) {
        if let XSource::Sampled(buf) = self {
            buf.clear();
        }
    }
}

fn check_index(index: usize, capacity: usize) -> Result<(), StreamError> {
    if index < capacity {
        Ok(())
    } else {
        Err(StreamError::OutOfRange {
            index,
            count: capacity,
        })
    }
}

fn linear_step(capacity: usize, min: f64, max: f64) -> f64 {
    if capacity > 1 {
        (max - min) / (capacity - 1) as f64
    } else {
        0.0
    }
}
