use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use crate::model::{Stream, StreamError};

#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotChannel {
    pub name: String,
    pub points: Vec<[f64; 2]>, // [x, y], oldest first
}

/// Owned copy of a stream's contents, detached from later ingestion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub channels: Vec<SnapshotChannel>,
}

impl Snapshot {
    pub fn capture(stream: &Stream) -> Self {
        let registry = stream.registry().borrow();
        let channels = stream
            .channels()
            .map(|view| SnapshotChannel {
                name: registry.name(view.index()),
                points: view.points().collect(),
            })
            .collect();
        Self { channels }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Length of the longest channel.
    pub fn num_rows(&self) -> usize {
        self.channels
            .iter()
            .map(|c| c.points.len())
            .max()
            .unwrap_or(0)
    }

    /// Writes `x,<channel names...>` followed by one row per sample.
    /// Channels shorter than the longest one leave their cells empty.
    pub fn write_csv<W: Write>(&self, mut w: W) -> Result<(), StreamError> {
        write!(w, "x")?;
        for channel in &self.channels {
            write!(w, ",{}", csv_field(&channel.name))?;
        }
        writeln!(w)?;
        for row in 0..self.num_rows() {
            let x = self
                .channels
                .iter()
                .find_map(|c| c.points.get(row))
                .map(|p| p[0])
                .unwrap_or(row as f64);
            write!(w, "{x}")?;
            for channel in &self.channels {
                match channel.points.get(row) {
                    Some(p) => write!(w, ",{}", p[1])?,
                    None => write!(w, ",")?,
                }
            }
            writeln!(w)?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<(), StreamError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        self.write_csv(BufWriter::new(file))?;
        info!("snapshot saved: {}", path.display());
        Ok(())
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::model::{ChannelRegistry, SampleBatch};

    fn two_channel_stream() -> Stream {
        let registry = Rc::new(RefCell::new(ChannelRegistry::new()));
        registry.borrow_mut().set_name(1, "volts, raw");
        let mut stream = Stream::new(2, false, 4, registry).unwrap();
        stream
            .feed_in(&SampleBatch::new(vec![vec![1.0, 2.0], vec![3.5, 4.5]]).unwrap())
            .unwrap();
        stream
    }

    #[test]
    fn capture_is_detached_from_stream() {
        let mut stream = two_channel_stream();
        let snap = stream.snapshot();
        stream.clear();
        assert_eq!(snap.num_channels(), 2);
        assert_eq!(snap.channels[0].name, "Channel 1");
        assert_eq!(snap.channels[1].points, vec![[0.0, 3.5], [1.0, 4.5]]);
    }

    #[test]
    fn csv_has_header_and_rows() {
        let snap = two_channel_stream().snapshot();
        let mut out = Vec::new();
        snap.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "x,Channel 1,\"volts, raw\"\n0,1,3.5\n1,2,4.5\n");
    }

    #[test]
    fn short_channels_leave_empty_cells() {
        let mut stream = two_channel_stream();
        stream.set_num_channels(3, false).unwrap();
        let mut out = Vec::new();
        stream.snapshot().write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().nth(1), Some("0,1,3.5,"));
    }
}
