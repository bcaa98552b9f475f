use crate::model::StreamError;

/// Read capability shared by sample buffers and channel views.
///
/// Renderers and exporters depend on this instead of a concrete buffer type.
pub trait SeriesData {
    /// Number of samples currently readable.
    fn count(&self) -> usize;
    /// Sample at `index`, where 0 is the oldest retained sample.
    fn sample(&self, index: usize) -> Result<f64, StreamError>;
}

/// Fixed-capacity ring of samples for one channel. Once full, every new
/// sample overwrites the oldest one.
#[derive(Clone, Debug)]
pub struct CircularSampleBuffer {
    values: Vec<f64>,
    write_cursor: usize,
    count: usize,
}

impl CircularSampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: vec![0.0; capacity],
            write_cursor: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    /// Appends `samples`, wrapping around. When more samples than the
    /// capacity arrive at once only the newest `capacity` survive.
    pub fn append(&mut self, samples: &[f64]) {
        let capacity = self.capacity();
        if capacity == 0 || samples.is_empty() {
            return;
        }
        let n = samples.len();
        let next_cursor = (self.write_cursor + n) % capacity;
        if n >= capacity {
            // oldest survivor lands on the new cursor
            self.write_wrapped(next_cursor, &samples[n - capacity..]);
        } else {
            self.write_wrapped(self.write_cursor, samples);
        }
        self.write_cursor = next_cursor;
        self.count = (self.count + n).min(capacity);
    }

    fn write_wrapped(&mut self, start: usize, src: &[f64]) {
        let head = src.len().min(self.capacity() - start);
        self.values[start..start + head].copy_from_slice(&src[..head]);
        self.values[..src.len() - head].copy_from_slice(&src[head..]);
    }

    pub fn read(&self, index: usize) -> Result<f64, StreamError> {
        if index >= self.count {
            return Err(StreamError::OutOfRange {
                index,
                count: self.count,
            });
        }
        Ok(self.values[self.physical(index)])
    }

    fn physical(&self, index: usize) -> usize {
        let capacity = self.capacity();
        (self.write_cursor + capacity - self.count + index) % capacity
    }

    /// Newest sample, if any.
    pub fn latest(&self) -> Option<f64> {
        self.count.checked_sub(1).and_then(|i| self.read(i).ok())
    }

    /// Stored samples as two slices, oldest first.
    pub fn as_slices(&self) -> (&[f64], &[f64]) {
        if self.count == 0 {
            return (&[], &[]);
        }
        let start = self.physical(0);
        let end = start + self.count;
        if end <= self.capacity() {
            (&self.values[start..end], &[])
        } else {
            (&self.values[start..], &self.values[..end - self.capacity()])
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let (a, b) = self.as_slices();
        a.iter().chain(b).copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }

    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.iter().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Changes the capacity, keeping the newest `min(count, new_capacity)`
    /// samples re-indexed from 0.
    pub fn resize(&mut self, new_capacity: usize) {
        if new_capacity == self.capacity() {
            return;
        }
        let keep = self.count.min(new_capacity);
        let mut values = Vec::with_capacity(new_capacity);
        values.extend(self.iter().skip(self.count - keep));
        values.resize(new_capacity, 0.0);
        self.values = values;
        self.count = keep;
        self.write_cursor = if new_capacity == 0 {
            0
        } else {
            keep % new_capacity
        };
    }

    /// Forgets all samples; storage is kept.
    pub fn clear(&mut self) {
        self.count = 0;
        self.write_cursor = 0;
    }
}

impl SeriesData for CircularSampleBuffer {
    fn count(&self) -> usize {
        self.count
    }

    fn sample(&self, index: usize) -> Result<f64, StreamError> {
        self.read(index)
    }
}
