use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, error, trace};

use crate::model::{
    ChannelRegistry, ChannelView, CircularSampleBuffer, SampleBatch, Sink, StreamError, XAxis,
    XSource,
};
use crate::snapshot::Snapshot;

/// Largest channel count a stream accepts.
pub const MAX_NUM_CHANNELS: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// A non-paused batch was stored. Fired once per batch.
    DataAdded,
    /// The number of channels changed to the given value.
    NumChannelsChanged(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&StreamEvent)>;

/// Owns one ring buffer per channel plus the x source they share.
///
/// Every buffer and the x source always have the same capacity. Mutating
/// calls either finish completely or fail before touching any buffer.
pub struct Stream {
    channels: Vec<CircularSampleBuffer>,
    x_source: XSource,
    x_axis: XAxis,
    has_x: bool,
    num_samples: usize,
    paused: bool,
    registry: Rc<RefCell<ChannelRegistry>>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    scratch: Vec<f64>,
}

impl Stream {
    pub fn new(
        num_channels: usize,
        has_x: bool,
        num_samples: usize,
        registry: Rc<RefCell<ChannelRegistry>>,
    ) -> Result<Self, StreamError> {
        check_channel_count(num_channels)?;
        let x_axis = XAxis::default();
        let x_source = if has_x {
            XSource::sampled(num_samples)
        } else {
            XSource::from_axis(&x_axis, num_samples)?
        };
        Ok(Self {
            channels: (0..num_channels)
                .map(|_| CircularSampleBuffer::new(num_samples))
                .collect(),
            x_source,
            x_axis,
            has_x,
            num_samples,
            paused: false,
            registry,
            listeners: Vec::new(),
            next_listener: 0,
            scratch: Vec::new(),
        })
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Configured capacity, not the current fill level.
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn has_x(&self) -> bool {
        self.has_x
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn x_axis(&self) -> XAxis {
        self.x_axis
    }

    pub fn x_source(&self) -> &XSource {
        &self.x_source
    }

    pub fn registry(&self) -> &Rc<RefCell<ChannelRegistry>> {
        &self.registry
    }

    pub fn channel(&self, index: usize) -> Option<ChannelView<'_>> {
        self.channels
            .get(index)
            .map(|buf| ChannelView::new(index, buf, &self.x_source))
    }

    pub fn channels(&self) -> impl Iterator<Item = ChannelView<'_>> {
        self.channels
            .iter()
            .enumerate()
            .map(move |(idx, buf)| ChannelView::new(idx, buf, &self.x_source))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    /// Registers `listener`; listeners run synchronously in registration order.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&StreamEvent) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, event: StreamEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    fn check_shape(&self, batch: &SampleBatch) -> Result<(), StreamError> {
        if batch.num_channels() != self.channels.len() {
            error!(
                "rejecting batch with {} channels, stream has {}",
                batch.num_channels(),
                self.channels.len()
            );
            return Err(StreamError::ChannelMismatch {
                expected: self.channels.len(),
                actual: batch.num_channels(),
            });
        }
        if batch.has_x() != self.has_x {
            error!(
                "rejecting batch with x = {}, stream expects x = {}",
                batch.has_x(),
                self.has_x
            );
            return Err(StreamError::XMismatch {
                expected: self.has_x,
                actual: batch.has_x(),
            });
        }
        Ok(())
    }

    /// Stores `batch` in every channel, applying gain/offset where enabled.
    ///
    /// A batch whose shape disagrees with the stream is rejected before any
    /// buffer changes, paused or not. While paused a valid batch is dropped
    /// without notifying listeners.
    pub fn feed_in(&mut self, batch: &SampleBatch) -> Result<(), StreamError> {
        self.check_shape(batch)?;
        if self.paused {
            trace!("paused, dropping {} samples", batch.num_samples());
            return Ok(());
        }
        {
            let registry = self.registry.borrow();
            if registry.any_transform_enabled(self.channels.len()) {
                let pairs = self.channels.iter_mut().zip(batch.channels());
                for (idx, (buf, samples)) in pairs.enumerate() {
                    let transform = registry.transform(idx);
                    if transform.is_active() {
                        self.scratch.clear();
                        self.scratch.extend_from_slice(samples);
                        transform.apply_in_place(&mut self.scratch);
                        buf.append(&self.scratch);
                    } else {
                        buf.append(samples);
                    }
                }
            } else {
                for (buf, samples) in self.channels.iter_mut().zip(batch.channels()) {
                    buf.append(samples);
                }
            }
        }
        if let Some(x) = batch.x() {
            self.x_source.append(x);
        }
        trace!(
            "stored {} samples x {} channels",
            batch.num_samples(),
            batch.num_channels()
        );
        self.notify(StreamEvent::DataAdded);
        Ok(())
    }

    /// Grows or shrinks the channel list (from the tail) and switches
    /// between external and computed x.
    pub fn set_num_channels(
        &mut self,
        num_channels: usize,
        has_x: bool,
    ) -> Result<(), StreamError> {
        check_channel_count(num_channels)?;
        let old = self.channels.len();
        if old == num_channels && has_x == self.has_x {
            return Ok(());
        }
        let new_x = if has_x == self.has_x {
            None
        } else if has_x {
            Some(XSource::sampled(self.num_samples))
        } else {
            Some(XSource::from_axis(&self.x_axis, self.num_samples)?)
        };

        let num_samples = self.num_samples;
        self.channels
            .resize_with(num_channels, || CircularSampleBuffer::new(num_samples));
        if let Some(x_source) = new_x {
            debug!("x source switched, external x = {has_x}");
            self.x_source = x_source;
            self.has_x = has_x;
        }
        if num_channels != old {
            debug!("channel count {old} -> {num_channels}");
            self.notify(StreamEvent::NumChannelsChanged(num_channels));
        }
        Ok(())
    }

    /// Resizes every channel and the x source to `num_samples`.
    pub fn set_num_samples(&mut self, num_samples: usize) {
        if num_samples == self.num_samples {
            return;
        }
        debug!("capacity {} -> {num_samples}", self.num_samples);
        self.num_samples = num_samples;
        self.x_source.resize(num_samples);
        for buf in &mut self.channels {
            buf.resize(num_samples);
        }
    }

    /// Chooses index or linear x. Applied right away unless the stream takes
    /// x from its batches, in which case it is kept for when that stops.
    pub fn set_x_axis(&mut self, as_index: bool, min: f64, max: f64) -> Result<(), StreamError> {
        let axis = XAxis { as_index, min, max };
        axis.validate()?;
        self.x_axis = axis;
        if !self.has_x {
            self.x_source = XSource::from_axis(&axis, self.num_samples)?;
            debug!("x axis set to {axis:?}");
        }
        Ok(())
    }

    pub fn pause(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Empties every channel; capacity, x axis and pause state are kept.
    pub fn clear(&mut self) {
        for buf in &mut self.channels {
            buf.clear();
        }
        self.x_source.clear();
    }
}

impl Sink for Stream {
    fn feed_in(&mut self, batch: &SampleBatch) -> Result<(), StreamError> {
        Stream::feed_in(self, batch)
    }

    fn set_num_channels(&mut self, num_channels: usize, has_x: bool) -> Result<(), StreamError> {
        Stream::set_num_channels(self, num_channels, has_x)
    }
}

fn check_channel_count(num_channels: usize) -> Result<(), StreamError> {
    if num_channels == 0 {
        return Err(StreamError::InvalidConfig(
            "a stream needs at least one channel".into(),
        ));
    }
    if num_channels > MAX_NUM_CHANNELS {
        return Err(StreamError::TooManyChannels {
            requested: num_channels,
            max: MAX_NUM_CHANNELS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn stream(num_channels: usize, num_samples: usize) -> Stream {
        Stream::new(
            num_channels,
            false,
            num_samples,
            Rc::new(RefCell::new(ChannelRegistry::new())),
        )
        .unwrap()
    }

    fn batch(data: Vec<Vec<f64>>) -> SampleBatch {
        SampleBatch::new(data).unwrap()
    }

    fn samples(stream: &Stream, channel: usize) -> Vec<f64> {
        let view = stream.channel(channel).unwrap();
        (0..view.count()).map(|i| view.sample_at(i).unwrap()).collect()
    }

    fn event_log(stream: &mut Stream) -> Rc<RefCell<Vec<StreamEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        stream.subscribe(move |e| sink.borrow_mut().push(*e));
        log
    }

    #[test]
    fn feeds_every_channel_and_notifies_once() {
        let mut s = stream(2, 4);
        let events = event_log(&mut s);
        s.feed_in(&batch(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]))
            .unwrap();
        assert_eq!(samples(&s, 0), vec![1.0, 2.0, 3.0]);
        assert_eq!(samples(&s, 1), vec![4.0, 5.0, 6.0]);
        assert_eq!(*events.borrow(), vec![StreamEvent::DataAdded]);
    }

    #[test]
    fn gain_applies_before_offset() {
        let registry = Rc::new(RefCell::new(ChannelRegistry::new()));
        registry.borrow_mut().set_gain(1, true, 2.0);
        registry.borrow_mut().set_offset(1, true, 10.0);
        let mut s = Stream::new(2, false, 8, Rc::clone(&registry)).unwrap();
        let input = batch(vec![vec![5.0], vec![5.0]]);
        s.feed_in(&input).unwrap();
        assert_eq!(samples(&s, 0), vec![5.0]);
        assert_eq!(samples(&s, 1), vec![20.0]);
        // caller's batch is untouched
        assert_eq!(input.channel(1), &[5.0]);
    }

    #[test]
    fn transform_changes_only_affect_later_batches() {
        let registry = Rc::new(RefCell::new(ChannelRegistry::new()));
        let mut s = Stream::new(1, false, 8, Rc::clone(&registry)).unwrap();
        s.feed_in(&batch(vec![vec![1.0]])).unwrap();
        registry.borrow_mut().set_gain(0, true, 3.0);
        s.feed_in(&batch(vec![vec![1.0]])).unwrap();
        assert_eq!(samples(&s, 0), vec![1.0, 3.0]);
    }

    #[test]
    fn mismatched_batch_is_rejected_without_side_effects() {
        let mut s = stream(2, 4);
        let events = event_log(&mut s);
        s.feed_in(&batch(vec![vec![1.0], vec![2.0]])).unwrap();
        let err = s.feed_in(&batch(vec![vec![9.0]])).unwrap_err();
        assert!(matches!(
            err,
            StreamError::ChannelMismatch {
                expected: 2,
                actual: 1
            }
        ));
        let with_x = SampleBatch::with_x(vec![vec![1.0], vec![2.0]], vec![0.0]).unwrap();
        assert!(matches!(
            s.feed_in(&with_x),
            Err(StreamError::XMismatch {
                expected: false,
                actual: true
            })
        ));
        assert_eq!(samples(&s, 0), vec![1.0]);
        assert_eq!(samples(&s, 1), vec![2.0]);
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn paused_stream_drops_batches_silently() {
        let mut s = stream(1, 4);
        let events = event_log(&mut s);
        let b = batch(vec![vec![7.0, 8.0]]);
        s.pause(true);
        s.feed_in(&b).unwrap();
        s.feed_in(&b).unwrap();
        assert_eq!(s.channel(0).unwrap().count(), 0);
        assert!(events.borrow().is_empty());

        s.pause(false);
        s.feed_in(&b).unwrap();
        assert_eq!(samples(&s, 0), vec![7.0, 8.0]);
        assert_eq!(*events.borrow(), vec![StreamEvent::DataAdded]);
    }

    #[test]
    fn paused_stream_still_accepts_reconfiguration() {
        let mut s = stream(1, 4);
        s.pause(true);
        s.set_num_channels(3, false).unwrap();
        s.set_num_samples(2);
        assert_eq!(s.num_channels(), 3);
        assert_eq!(s.num_samples(), 2);
        assert!(s.is_paused());
    }

    #[test]
    fn growing_channels_keeps_existing_history() {
        let mut s = stream(2, 4);
        let events = event_log(&mut s);
        s.feed_in(&batch(vec![vec![1.0, 2.0], vec![3.0, 4.0]])).unwrap();
        s.set_num_channels(4, false).unwrap();
        assert_eq!(s.num_channels(), 4);
        assert_eq!(samples(&s, 0), vec![1.0, 2.0]);
        assert_eq!(samples(&s, 1), vec![3.0, 4.0]);
        assert_eq!(s.channel(2).unwrap().count(), 0);
        assert_eq!(s.channel(3).unwrap().count(), 0);
        assert_eq!(s.channel(3).unwrap().capacity(), 4);
        assert_eq!(
            events.borrow().last(),
            Some(&StreamEvent::NumChannelsChanged(4))
        );
    }

    #[test]
    fn shrinking_channels_drops_the_tail() {
        let mut s = stream(3, 4);
        s.feed_in(&batch(vec![vec![1.0], vec![2.0], vec![3.0]]))
            .unwrap();
        s.set_num_channels(1, false).unwrap();
        assert_eq!(s.num_channels(), 1);
        assert_eq!(samples(&s, 0), vec![1.0]);
        assert!(s.channel(1).is_none());
    }

    #[test]
    fn unchanged_channel_count_is_silent() {
        let mut s = stream(2, 4);
        let events = event_log(&mut s);
        s.set_num_channels(2, false).unwrap();
        s.set_num_channels(2, true).unwrap();
        assert!(events.borrow().is_empty());
        assert!(s.has_x());
        assert!(s.x_source().is_sampled());
    }

    #[test]
    fn channel_count_limits() {
        let mut s = stream(1, 4);
        assert!(matches!(
            s.set_num_channels(MAX_NUM_CHANNELS + 1, false),
            Err(StreamError::TooManyChannels { .. })
        ));
        assert!(s.set_num_channels(0, false).is_err());
        assert_eq!(s.num_channels(), 1);
    }

    #[test]
    fn capacity_change_resizes_channels_and_x() {
        let mut s = stream(2, 5);
        s.feed_in(&batch(vec![
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
            vec![6.0, 7.0, 8.0, 9.0, 10.0],
        ]))
        .unwrap();
        s.set_num_samples(3);
        assert_eq!(samples(&s, 0), vec![3.0, 4.0, 5.0]);
        assert_eq!(samples(&s, 1), vec![8.0, 9.0, 10.0]);
        assert_eq!(s.x_source().capacity(), 3);
        assert!(s.channels().all(|c| c.capacity() == 3));
    }

    #[test]
    fn switching_to_linear_x_is_immediate() {
        let mut s = stream(1, 10);
        assert_eq!(s.channel(0).unwrap().x_at(9).unwrap(), 9.0);
        s.set_x_axis(false, 0.0, 10.0).unwrap();
        let view = s.channel(0).unwrap();
        assert_eq!(view.x_at(0).unwrap(), 0.0);
        assert_eq!(view.x_at(9).unwrap(), 10.0);
    }

    #[test]
    fn invalid_linear_range_keeps_previous_axis() {
        let mut s = stream(1, 10);
        assert!(matches!(
            s.set_x_axis(false, 3.0, 1.0),
            Err(StreamError::InvalidRange { .. })
        ));
        assert_eq!(s.x_axis(), XAxis::index());
        assert_eq!(s.channel(0).unwrap().x_at(4).unwrap(), 4.0);
    }

    #[test]
    fn external_x_is_stored_alongside_samples() {
        let mut s = stream(1, 3);
        s.set_x_axis(false, 0.0, 2.0).unwrap();
        s.set_num_channels(1, true).unwrap();
        let b = SampleBatch::with_x(vec![vec![1.0, 2.0, 3.0, 4.0]], vec![0.1, 0.2, 0.3, 0.4])
            .unwrap();
        s.feed_in(&b).unwrap();
        let points: Vec<[f64; 2]> = s.channel(0).unwrap().points().collect();
        assert_eq!(points, vec![[0.2, 2.0], [0.3, 3.0], [0.4, 4.0]]);

        // remembered linear axis comes back once x is no longer supplied
        s.set_num_channels(1, false).unwrap();
        assert_eq!(s.channel(0).unwrap().x_at(2).unwrap(), 2.0);
    }

    #[test]
    fn clear_then_refeed_reproduces_contents() {
        let mut s = stream(2, 3);
        let b = batch(vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]]);
        s.feed_in(&b).unwrap();
        let before = (samples(&s, 0), samples(&s, 1));
        s.pause(true);
        s.clear();
        assert!(s.channels().all(|c| c.count() == 0));
        assert_eq!(s.num_samples(), 3);
        assert!(s.is_paused());
        s.pause(false);
        s.feed_in(&b).unwrap();
        assert_eq!((samples(&s, 0), samples(&s, 1)), before);
    }

    #[test]
    fn unsubscribed_listener_stops_receiving() {
        let mut s = stream(1, 2);
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let id = s.subscribe(move |_| counter.set(counter.get() + 1));
        s.feed_in(&batch(vec![vec![1.0]])).unwrap();
        assert!(s.unsubscribe(id));
        assert!(!s.unsubscribe(id));
        s.feed_in(&batch(vec![vec![1.0]])).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let mut s = stream(1, 2);
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in 0..3 {
            let order = Rc::clone(&order);
            s.subscribe(move |_| order.borrow_mut().push(tag));
        }
        s.feed_in(&batch(vec![vec![1.0]])).unwrap();
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }
}
