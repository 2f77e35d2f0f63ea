use std::io::{Read, Write};
use std::time::Duration;
use serialport::{SerialPort, SerialPortType};

use super::{LineReader, Result, SerialDeviceInfo, SerialError};

pub const DEFAULT_DEVICE_PATH: &str = "/dev/cu.usbmodem207236A254527";
pub const BAUD_RATE: u32 = 115200;
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);
/// Switches the device into its periodic status-reporting mode.
pub const INIT_COMMAND: &[u8] = b"at+adb\r\n";

/// Exclusive handle to the battery-reporting device.
pub struct SerialLink<P = Box<dyn SerialPort>> {
    port_name: String,
    reader: LineReader<P>,
}

impl SerialLink {
    /// List the serial ports the OS currently reports
    pub fn list_ports() -> Result<Vec<SerialDeviceInfo>> {
        let ports = serialport::available_ports()?;
        let mut devices = Vec::new();

        for port in ports {
            let device = match port.port_type {
                SerialPortType::UsbPort(usb_info) => SerialDeviceInfo {
                    port_name: port.port_name,
                    vid: Some(usb_info.vid),
                    pid: Some(usb_info.pid),
                    serial_number: usb_info.serial_number,
                    manufacturer: usb_info.manufacturer,
                    product: usb_info.product,
                },
                _ => SerialDeviceInfo {
                    port_name: port.port_name,
                    vid: None,
                    pid: None,
                    serial_number: None,
                    manufacturer: None,
                    product: None,
                },
            };
            devices.push(device);
        }

        Ok(devices)
    }

    /// Open the device and put it into reporting mode
    pub fn open(
        port_name: &str,
        baud_rate: u32,
        read_timeout: Duration,
        init_command: &[u8],
    ) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(read_timeout)
            .open()
            .map_err(|e| SerialError::DeviceUnavailable(format!("{}: {}", port_name, e)))?;

        let link = Self::from_port(port_name, port, init_command)?;
        log::info!("Connected to battery device on {} at {} baud", port_name, baud_rate);
        Ok(link)
    }
}

impl<P: Read + Write> SerialLink<P> {
    /// Take over an already-open port and put it into reporting mode
    pub fn from_port(port_name: &str, port: P, init_command: &[u8]) -> Result<Self> {
        let mut link = Self {
            port_name: port_name.to_string(),
            reader: LineReader::new(port),
        };
        if !init_command.is_empty() {
            link.send_data(init_command)?;
        }
        Ok(link)
    }

    /// Next newline-delimited record, or `None` when the read timeout expires first
    pub fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        self.reader.read_line()
    }

    /// Send raw bytes to the device
    pub fn send_data(&mut self, data: &[u8]) -> Result<()> {
        let port = self.reader.get_mut();
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }
}

impl<P> Drop for SerialLink<P> {
    fn drop(&mut self) {
        log::info!("Disconnecting from {}", self.port_name);
    }
}
