use std::env;

use inquire::Select;
use riden_rd_psu::{
    config::SessionConfig, memory::MemorySlot, psu::RdPsu, register::State,
    transport::RtuTransport,
};
use serialport::SerialPort;

// Configuration constants - adjust these for your setup
const OUTPUT_VOLTAGE: f64 = 5.5;
const CURRENT_LIMIT: f64 = 0.1;
const STABILIZATION_DELAY_MS: u64 = 1000;

pub struct PortWrapper(Box<dyn SerialPort>);

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::ConnectionRefused => embedded_io::ErrorKind::ConnectionRefused,
            std::io::ErrorKind::ConnectionReset => embedded_io::ErrorKind::ConnectionReset,
            std::io::ErrorKind::ConnectionAborted => embedded_io::ErrorKind::ConnectionAborted,
            std::io::ErrorKind::NotConnected => embedded_io::ErrorKind::NotConnected,
            std::io::ErrorKind::AddrInUse => embedded_io::ErrorKind::AddrInUse,
            std::io::ErrorKind::AddrNotAvailable => embedded_io::ErrorKind::AddrNotAvailable,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::AlreadyExists => embedded_io::ErrorKind::AlreadyExists,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            std::io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            std::io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for PortWrapper {
    type Error = IoError;
}

impl embedded_io::Read for PortWrapper {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::ReadReady for PortWrapper {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        self.0
            .bytes_to_read()
            .map(|pending| pending > 0)
            .map_err(|e| IoError(e.into()))
    }
}

impl embedded_io::Write for PortWrapper {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

fn main() {
    let config = SessionConfig::default();

    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    let port = serialport::new(&port_name, config.baud_rate)
        .timeout(config.response_timeout_std())
        .open()
        .expect("Failed to open serial port");

    // The session identifies the PSU before returning.
    let transport: RtuTransport<PortWrapper> = RtuTransport::from_config(PortWrapper(port), &config);
    let mut psu = RdPsu::from_config(transport, &config).expect("Failed to identify the PSU");

    let identity = psu.identity();
    println!(
        "Model: RD{} (raw {}), serial {}, firmware {:.2}",
        identity.model_code(),
        identity.model_raw,
        identity.serial_number,
        identity.firmware_version()
    );
    println!("Scaling: {:?}", psu.scale_profile());

    println!("\n--- Status ---");
    let status = psu.read_status().unwrap();
    println!("{:#?}", status);

    println!("\n--- Clock ---");
    println!("{:?} {:?}", psu.read_date().unwrap(), psu.read_time().unwrap());

    println!("\n--- Memory slots ---");
    for slot in MemorySlot::ALL {
        println!("{:?}: {:?}", slot, psu.read_memory_slot(slot).unwrap());
    }

    psu.set_voltage(OUTPUT_VOLTAGE).unwrap();
    println!("\nSet output voltage to {}V", OUTPUT_VOLTAGE);

    psu.set_current(CURRENT_LIMIT).unwrap();
    println!("Set current limit to {}A", CURRENT_LIMIT);

    psu.set_output_state(State::On).unwrap();
    println!("Output enabled");

    // Wait for output to stabilize
    std::thread::sleep(std::time::Duration::from_millis(STABILIZATION_DELAY_MS));

    println!(
        "Measured output: {:.2}V {:.3}A {:.2}W ({:?})",
        psu.read_output_voltage().unwrap(),
        psu.read_output_current().unwrap(),
        psu.read_output_power().unwrap(),
        psu.get_control_mode().unwrap()
    );

    psu.set_output_state(false).unwrap();
    println!("Output disabled");
}
