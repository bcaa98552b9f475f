//! Bounded, always-current history for multi-channel sample streams.
//!
//! Decoded [`SampleBatch`]es go into a [`Stream`], which keeps one ring
//! buffer per channel plus a shared x axis, applies per-channel gain and
//! offset on the way in, and hands out read-only [`ChannelView`]s.
pub mod config;
pub mod counter;
pub mod model;
pub mod pipeline;
pub mod snapshot;
pub mod source;

pub use config::{AppConfig, SourceConfig};
pub use counter::SampleCounter;
pub use model::{
    ChannelInfo, ChannelRegistry, ChannelTransform, ChannelView, CircularSampleBuffer,
    ListenerId, Rgba, SampleBatch, SeriesData, Sink, Stream, StreamError, StreamEvent, XAxis,
    XSource, MAX_NUM_CHANNELS,
};
pub use pipeline::Pipeline;
pub use snapshot::Snapshot;
pub use source::{AsciiReader, DemoSource, ManualSource, SampleSource};
