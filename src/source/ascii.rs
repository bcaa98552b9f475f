use std::io::{BufRead, ErrorKind};

use log::warn;

use crate::model::{SampleBatch, StreamError};
use crate::source::SampleSource;

const DEFAULT_LINES_PER_BATCH: usize = 64;

/// Decodes text lines into batches. Each line carries one sample for every
/// channel, separated by commas, semicolons or whitespace.
///
/// Lines with the wrong number of fields or unparsable numbers are skipped.
/// A read timeout ends the current batch; the partial line is kept for the
/// next call.
pub struct AsciiReader<R> {
    reader: R,
    num_channels: usize,
    lines_per_batch: usize,
    pending: Vec<u8>,
    skipped: usize,
}

impl<R: BufRead> AsciiReader<R> {
    pub fn new(reader: R, num_channels: usize) -> Self {
        Self {
            reader,
            num_channels,
            lines_per_batch: DEFAULT_LINES_PER_BATCH,
            pending: Vec::new(),
            skipped: 0,
        }
    }

    pub fn with_lines_per_batch(mut self, lines: usize) -> Self {
        self.lines_per_batch = lines.max(1);
        self
    }

    /// Number of malformed lines dropped so far.
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn take_line(&mut self, columns: &mut [Vec<f64>]) -> bool {
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        if fields.is_empty() {
            return false;
        }
        if fields.len() != self.num_channels {
            self.skipped += 1;
            warn!(
                "skipping line with {} fields, expected {}: {:?}",
                fields.len(),
                self.num_channels,
                line.trim_end()
            );
            return false;
        }
        let parsed: Result<Vec<f64>, _> = fields.iter().map(|f| f.parse::<f64>()).collect();
        match parsed {
            Ok(values) => {
                for (column, value) in columns.iter_mut().zip(values) {
                    column.push(value);
                }
                true
            }
            Err(e) => {
                self.skipped += 1;
                warn!("skipping unparsable line {:?}: {e}", line.trim_end());
                false
            }
        }
    }
}

impl<R: BufRead> SampleSource for AsciiReader<R> {
    fn num_channels(&self) -> usize {
        self.num_channels
    }

    fn next_batch(&mut self) -> Result<Option<SampleBatch>, StreamError> {
        let mut columns = vec![Vec::new(); self.num_channels];
        let mut rows = 0;
        while rows < self.lines_per_batch {
            match self.reader.read_until(b'\n', &mut self.pending) {
                Ok(0) => {
                    // EOF; flush a final line without terminator
                    if !self.pending.is_empty() && self.take_line(&mut columns) {
                        rows += 1;
                    }
                    break;
                }
                Ok(_) => {
                    if self.pending.ends_with(b"\n") && self.take_line(&mut columns) {
                        rows += 1;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => break,
                Err(e) => return Err(e.into()),
            }
        }
        if rows == 0 {
            return Ok(None);
        }
        SampleBatch::new(columns).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn decodes_mixed_separators() {
        let input = "1,2\n3; 4\n5\t6\n";
        let mut reader = AsciiReader::new(Cursor::new(input), 2);
        let batch = reader.next_batch().unwrap().unwrap();
        assert_eq!(batch.channel(0), &[1.0, 3.0, 5.0]);
        assert_eq!(batch.channel(1), &[2.0, 4.0, 6.0]);
        assert_eq!(reader.next_batch().unwrap(), None);
    }

    #[test]
    fn skips_malformed_lines() {
        let input = "1,2\n3\nx,4\n\n5,6";
        let mut reader = AsciiReader::new(Cursor::new(input), 2);
        let batch = reader.next_batch().unwrap().unwrap();
        assert_eq!(batch.channel(0), &[1.0, 5.0]);
        assert_eq!(reader.skipped_lines(), 2);
    }

    #[test]
    fn splits_long_input_into_batches() {
        let input: String = (0..5).map(|i| format!("{i}\n")).collect();
        let mut reader = AsciiReader::new(Cursor::new(input), 1).with_lines_per_batch(2);
        let sizes: Vec<usize> = std::iter::from_fn(|| reader.next_batch().unwrap())
            .map(|b| b.num_samples())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }
}
