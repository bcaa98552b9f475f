// src/main.rs
use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;

use anyhow::{Context, Result};
use log::{info, warn};

use sampleflow::source::available_ports;
use sampleflow::{AppConfig, ChannelRegistry, Pipeline, SourceConfig, Stream, StreamEvent};

/// Consecutive empty reads tolerated from a live port before giving up.
const SERIAL_IDLE_LIMIT: usize = 50;

fn load_config() -> Result<AppConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            AppConfig::load(&path).with_context(|| format!("failed to load config from {path}"))
        }
        None => {
            info!("no config given, using defaults");
            Ok(AppConfig::default())
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let config = load_config()?;

    let registry = Rc::new(RefCell::new(ChannelRegistry::new()));
    let mut stream = Stream::new(
        config.num_channels,
        false,
        config.num_samples,
        Rc::clone(&registry),
    )?;
    let x = config.x_axis;
    stream.set_x_axis(x.as_index, x.min, x.max)?;

    let redraws = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&redraws);
    stream.subscribe(move |event| match event {
        StreamEvent::DataAdded => counter.set(counter.get() + 1),
        StreamEvent::NumChannelsChanged(n) => info!("now plotting {n} channels"),
    });

    let live = matches!(config.source, SourceConfig::Serial { .. });
    if live {
        match available_ports() {
            Ok(ports) => info!("serial ports: {ports:?}"),
            Err(e) => warn!("could not list serial ports: {e}"),
        }
    }
    let source = config.open_source().context("failed to open sample source")?;
    let mut pipeline = Pipeline::new(source, stream);

    let handled = if live {
        let mut handled = 0;
        let mut idle = 0;
        while (config.max_batches == 0 || handled < config.max_batches) && idle < SERIAL_IDLE_LIMIT
        {
            if pipeline.pump_once()? {
                handled += 1;
                idle = 0;
            } else {
                idle += 1;
            }
        }
        handled
    } else {
        pipeline.pump(config.max_batches)?
    };
    info!(
        "handled {handled} batches, {} redraw notifications, rate {:?} sps",
        redraws.get(),
        pipeline.counter().sps()
    );

    let snapshot = pipeline.stream().snapshot();
    match &config.snapshot_path {
        Some(path) => snapshot
            .save_csv(path)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => snapshot.write_csv(io::stdout().lock())?,
    }
    Ok(())
}
