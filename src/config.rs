use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::{StreamError, XAxis, MAX_NUM_CHANNELS};
use crate::source::{open_serial, AsciiReader, DemoSource, SampleSource};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub num_channels: usize,
    /// Samples kept per channel.
    pub num_samples: usize,
    pub x_axis: XAxis,
    pub source: SourceConfig,
    /// Batches to pump before exiting, 0 = until the source runs dry.
    pub max_batches: usize,
    /// Where to write the final CSV snapshot; stdout when absent.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            num_channels: 1,
            num_samples: 1000,
            x_axis: XAxis::default(),
            source: SourceConfig::default(),
            max_batches: 100,
            snapshot_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_json(text: &str) -> Result<Self, StreamError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if self.num_channels == 0 {
            return Err(StreamError::InvalidConfig(
                "num_channels must be at least 1".into(),
            ));
        }
        if self.num_channels > MAX_NUM_CHANNELS {
            return Err(StreamError::TooManyChannels {
                requested: self.num_channels,
                max: MAX_NUM_CHANNELS,
            });
        }
        if self.num_samples == 0 {
            return Err(StreamError::InvalidConfig(
                "num_samples must be at least 1".into(),
            ));
        }
        self.x_axis.validate()
    }

    pub fn open_source(&self) -> Result<Box<dyn SampleSource>, StreamError> {
        self.source.open(self.num_channels)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Demo {
        #[serde(default = "default_samples_per_batch")]
        samples_per_batch: usize,
        #[serde(default = "default_period")]
        period: f64,
        #[serde(default = "default_noise")]
        noise: f64,
        #[serde(default)]
        seed: Option<u64>,
    },
    Serial {
        port: String,
        #[serde(default = "default_baud_rate")]
        baud_rate: u32,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
    File {
        path: PathBuf,
    },
}

fn default_samples_per_batch() -> usize {
    10
}

fn default_period() -> f64 {
    100.0
}

fn default_noise() -> f64 {
    0.05
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_timeout_ms() -> u64 {
    100
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Demo {
            samples_per_batch: default_samples_per_batch(),
            period: default_period(),
            noise: default_noise(),
            seed: None,
        }
    }
}

impl SourceConfig {
    pub fn open(&self, num_channels: usize) -> Result<Box<dyn SampleSource>, StreamError> {
        let source: Box<dyn SampleSource> = match self {
            SourceConfig::Demo {
                samples_per_batch,
                period,
                noise,
                seed,
            } => {
                let demo =
                    DemoSource::new(num_channels, *samples_per_batch, *period).with_noise(*noise);
                Box::new(match seed {
                    Some(seed) => demo.with_seed(*seed),
                    None => demo,
                })
            }
            SourceConfig::Serial {
                port,
                baud_rate,
                timeout_ms,
            } => Box::new(open_serial(
                port,
                *baud_rate,
                Duration::from_millis(*timeout_ms),
                num_channels,
            )?),
            SourceConfig::File { path } => {
                let file = File::open(path)?;
                Box::new(AsciiReader::new(BufReader::new(file), num_channels))
            }
        };
        Ok(source)
    }
}
