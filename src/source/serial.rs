use std::io::BufReader;
use std::time::Duration;

use log::{debug, info};
use serialport::SerialPort;

use crate::model::StreamError;
use crate::source::AsciiReader;

pub type SerialReader = AsciiReader<BufReader<Box<dyn SerialPort>>>;

/// Names of the serial ports present on this machine.
pub fn available_ports() -> Result<Vec<String>, StreamError> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// Opens `port` and decodes its text lines into `num_channels` channels.
///
/// `timeout` bounds how long one `next_batch` call waits for data.
pub fn open_serial(
    port: &str,
    baud_rate: u32,
    timeout: Duration,
    num_channels: usize,
) -> Result<SerialReader, StreamError> {
    debug!("opening {port} at {baud_rate} baud");
    let handle = serialport::new(port, baud_rate).timeout(timeout).open()?;
    info!("serial port {port} open");
    Ok(AsciiReader::new(BufReader::new(handle), num_channels))
}
