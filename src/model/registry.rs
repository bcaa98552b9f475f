use serde::{Deserialize, Serialize};

use crate::model::ChannelTransform;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Colors handed out to channels in order, wrapping around.
pub const DEFAULT_PALETTE: [Rgba; 7] = [
    Rgba::rgb(0, 0, 255),
    Rgba::rgb(255, 0, 0),
    Rgba::rgb(0, 255, 0),
    Rgba::rgb(0, 255, 255),
    Rgba::rgb(255, 0, 255),
    Rgba::rgb(255, 255, 0),
    Rgba::rgb(255, 255, 255),
];

/// Descriptive metadata for one channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub name: String,
    pub color: Rgba,
    pub visible: bool,
    #[serde(flatten)]
    pub transform: ChannelTransform,
}

impl ChannelInfo {
    pub fn default_for(index: usize) -> Self {
        Self {
            name: default_name(index),
            color: default_color(index),
            visible: true,
            transform: ChannelTransform::default(),
        }
    }
}

fn default_name(index: usize) -> String {
    format!("Channel {}", index + 1)
}

fn default_color(index: usize) -> Rgba {
    DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()]
}

/// Channel metadata keyed by channel index.
///
/// Entries are created on first write; any index without one reads as
/// [`ChannelInfo::default_for`]. The registry therefore never has to track
/// the stream's channel count, and the stream only ever reads from it.
#[derive(Clone, Debug, Default)]
pub struct ChannelRegistry {
    infos: Vec<ChannelInfo>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self, index: usize) -> ChannelInfo {
        self.infos
            .get(index)
            .cloned()
            .unwrap_or_else(|| ChannelInfo::default_for(index))
    }

    pub fn name(&self, index: usize) -> String {
        self.infos
            .get(index)
            .map(|i| i.name.clone())
            .unwrap_or_else(|| default_name(index))
    }

    pub fn color(&self, index: usize) -> Rgba {
        self.infos
            .get(index)
            .map(|i| i.color)
            .unwrap_or_else(|| default_color(index))
    }

    pub fn visible(&self, index: usize) -> bool {
        self.infos.get(index).map_or(true, |i| i.visible)
    }

    pub fn transform(&self, index: usize) -> ChannelTransform {
        self.infos
            .get(index)
            .map(|i| i.transform)
            .unwrap_or_default()
    }

    pub fn gain_enabled(&self, index: usize) -> bool {
        self.transform(index).gain_enabled
    }

    pub fn gain(&self, index: usize) -> f64 {
        self.transform(index).gain
    }

    pub fn offset_enabled(&self, index: usize) -> bool {
        self.transform(index).offset_enabled
    }

    pub fn offset(&self, index: usize) -> f64 {
        self.transform(index).offset
    }

    /// True when any of the first `num_channels` channels has gain or offset on.
    pub fn any_transform_enabled(&self, num_channels: usize) -> bool {
        self.infos
            .iter()
            .take(num_channels)
            .any(|i| i.transform.is_active())
    }

    fn entry(&mut self, index: usize) -> &mut ChannelInfo {
        while self.infos.len() <= index {
            let next = self.infos.len();
            self.infos.push(ChannelInfo::default_for(next));
        }
        &mut self.infos[index]
    }

    pub fn set_name(&mut self, index: usize, name: impl Into<String>) {
        self.entry(index).name = name.into();
    }

    pub fn set_color(&mut self, index: usize, color: Rgba) {
        self.entry(index).color = color;
    }

    pub fn set_visible(&mut self, index: usize, visible: bool) {
        self.entry(index).visible = visible;
    }

    pub fn set_gain(&mut self, index: usize, enabled: bool, gain: f64) {
        let t = &mut self.entry(index).transform;
        t.gain_enabled = enabled;
        t.gain = gain;
    }

    pub fn set_offset(&mut self, index: usize, enabled: bool, offset: f64) {
        let t = &mut self.entry(index).transform;
        t.offset_enabled = enabled;
        t.offset = offset;
    }

    pub fn reset_names(&mut self) {
        for (idx, info) in self.infos.iter_mut().enumerate() {
            info.name = default_name(idx);
        }
    }

    pub fn reset_colors(&mut self) {
        for (idx, info) in self.infos.iter_mut().enumerate() {
            info.color = default_color(idx);
        }
    }

    pub fn reset_visibility(&mut self) {
        for info in &mut self.infos {
            info.visible = true;
        }
    }

    pub fn reset_gains(&mut self) {
        for info in &mut self.infos {
            info.transform.gain_enabled = false;
            info.transform.gain = 1.0;
        }
    }

    pub fn reset_offsets(&mut self) {
        for info in &mut self.infos {
            info.transform.offset_enabled = false;
            info.transform.offset = 0.0;
        }
    }
}
