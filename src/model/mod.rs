// src/model/mod.rs
pub mod batch;
pub mod error;
pub mod registry;
pub mod ring;
pub mod sink;
pub mod stream;
pub mod transform;
pub mod view;
pub mod xsource;

pub use batch::SampleBatch;
pub use error::StreamError;
pub use registry::{ChannelInfo, ChannelRegistry, Rgba, DEFAULT_PALETTE};
pub use ring::{CircularSampleBuffer, SeriesData};
pub use sink::Sink;
pub use stream::{ListenerId, Stream, StreamEvent, MAX_NUM_CHANNELS};
pub use transform::ChannelTransform;
pub use view::ChannelView;
pub use xsource::{XAxis, XSource};
