/*!
 # BLE LED Strip Scheduler

 A Rust library for keeping a set of Bluetooth LED strips connected and
 switching them on and off from independently configured time windows.

 ## Features

 * Per-device discovery and connection lifecycle
 * Single-flight command dispatch (newer commands are dropped, never queued)
 * RGB color, brightness and animation mode encoding
 * Repeating, optionally inverted schedule windows
 * Named light and schedule presets shared between devices
 * Serializable registry snapshot for loading and saving settings

 ## Example

 ```no_run
 use std::time::Duration;
 use ble_led_scheduler::*;

 #[tokio::main]
 async fn main() -> Result<()> {
     // Initialize tracing for logs
     tracing_subscriber::fmt::init();

     let transport = BtleplugTransport::new().await?;
     let mut registry = DeviceRegistry::new(transport, LinkConfig::default());
     registry.register("ELK-BLEDOM")?;
     registry.request_connect("ELK-BLEDOM")?;

     let mut engine = ScheduleEngine::new(EngineConfig::default());
     engine.resume();

     loop {
         registry.poll_connections();
         engine.tick(&mut registry);
         tokio::time::sleep(Duration::from_millis(100)).await;
     }
 }
 ```
*/

use thiserror::Error;

/// Custom error types for the LED scheduler library
#[derive(Error, Debug)]
pub enum Error {
    /// No Bluetooth adapters found
    #[error("No Bluetooth adapters found")]
    NoBluetoothAdapters,

    /// The Bluetooth radio of the adapter is switched off
    #[error("Bluetooth is not enabled")]
    RadioDisabled,

    /// No peripheral advertised the requested identity during the scan window
    #[error("Could not find the peripheral")]
    DeviceNotFound,

    /// A matching peripheral was found but the connection attempt failed
    #[error("Failed to connect")]
    ConnectFailed,

    /// A command was issued to a device that is not connected
    #[error("Peripheral is not connected")]
    NotConnected,

    /// A command was dropped because another one is still in flight
    #[error("Device is busy, command dropped")]
    Busy,

    /// The transport rejected a write
    #[error("Write failed: {0}")]
    TransportWriteFailed(String),

    /// Schedule window is empty or negative
    #[error("Invalid schedule window [{start}, {end})")]
    InvalidScheduleWindow { start: f32, end: f32 },

    /// No device is registered under this identity
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    /// A device with this identity is already registered
    #[error("Device already registered: {0}")]
    DuplicateDevice(String),

    /// No preset exists at this index
    #[error("Unknown configuration preset: {0}")]
    UnknownPreset(usize),

    /// BLE communication error
    #[error("BLE communication error: {0}")]
    Ble(String),

    /// Error from btleplug
    #[error(transparent)]
    BtlePlug(#[from] btleplug::Error),

    /// Settings file could not be read or written
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Settings document is malformed
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod bluetooth;
pub mod config;
pub mod connection;
pub mod effects;
pub mod engine;
pub mod presets;
pub mod profile;
pub mod protocol;
pub mod registry;
pub mod schedule;
pub mod transport;

// Re-export key types
pub use bluetooth::BtleplugTransport;
pub use config::{EngineConfig, LinkConfig, Settings};
pub use connection::{ConnectionManager, ConnectionState, DispatchOutcome, LinkStatus};
pub use effects::{Effect, EFFECTS};
pub use engine::ScheduleEngine;
pub use presets::{ProfilePreset, SchedulePreset};
pub use profile::{DeviceProfile, Mode};
pub use registry::{DeviceEntry, DeviceRecord, DeviceRegistry, RegistrySnapshot};
pub use schedule::Schedule;
pub use transport::{Discovered, Transport};
