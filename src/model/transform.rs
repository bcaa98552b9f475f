use serde::{Deserialize, Serialize};

/// Per-channel linear correction applied once, on ingestion.
///
/// Gain is applied before offset. A disabled term is skipped entirely, so a
/// channel with nothing enabled stores its raw samples bit for bit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelTransform {
    pub gain_enabled: bool,
    pub gain: f64,
    pub offset_enabled: bool,
    pub offset: f64,
}

impl ChannelTransform {
    pub fn is_active(&self) -> bool {
        self.gain_enabled || self.offset_enabled
    }

    pub fn apply(&self, value: f64) -> f64 {
        let mut v = value;
        if self.gain_enabled {
            v *= self.gain;
        }
        if self.offset_enabled {
            v += self.offset;
        }
        v
    }

    pub fn apply_in_place(&self, samples: &mut [f64]) {
        if self.gain_enabled {
            for v in samples.iter_mut() {
                *v *= self.gain;
            }
        }
        if self.offset_enabled {
            for v in samples.iter_mut() {
                *v += self.offset;
            }
        }
    }
}

impl Default for ChannelTransform {
    fn default() -> Self {
        Self {
            gain_enabled: false,
            gain: 1.0,
            offset_enabled: false,
            offset: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_then_offset() {
        let t = ChannelTransform {
            gain_enabled: true,
            gain: 2.0,
            offset_enabled: true,
            offset: 10.0,
        };
        assert_eq!(t.apply(5.0), 20.0);
        let mut samples = [5.0, -5.0];
        t.apply_in_place(&mut samples);
        assert_eq!(samples, [20.0, 0.0]);
    }

    #[test]
    fn disabled_terms_leave_value_untouched() {
        let t = ChannelTransform {
            gain_enabled: false,
            gain: 3.0,
            offset_enabled: false,
            offset: 7.0,
        };
        assert!(!t.is_active());
        let odd = 0.1 + 0.2;
        assert_eq!(t.apply(odd).to_bits(), odd.to_bits());
    }

    #[test]
    fn offset_only() {
        let t = ChannelTransform {
            offset_enabled: true,
            offset: -1.5,
            ..ChannelTransform::default()
        };
        assert!(t.is_active());
        assert_eq!(t.apply(1.5), 0.0);
    }
}
