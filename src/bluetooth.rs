use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralState, CharPropFlags, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio::time::{self, Instant};
use tracing::{debug, info, instrument, trace};
use uuid::Uuid;

use crate::transport::{Discovered, Transport};
use crate::{Error, Result};

/// How often the peripheral list is polled while scanning
const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// [`Transport`] backed by the platform BLE stack through btleplug
pub struct BtleplugTransport {
    manager: Manager,
}

impl BtleplugTransport {
    #[instrument]
    pub async fn new() -> Result<Self> {
        debug!("Initializing BLE manager");
        Ok(Self {
            manager: Manager::new().await?,
        })
    }
}

#[async_trait]
impl Transport for BtleplugTransport {
    type Adapter = Adapter;
    type Peripheral = Peripheral;

    async fn list_adapters(&self) -> Result<Vec<Adapter>> {
        let adapters = self.manager.adapters().await?;
        debug!("Found {} Bluetooth adapters", adapters.len());
        Ok(adapters)
    }

    async fn radio_enabled(&self, adapter: &Adapter) -> Result<bool> {
        let state = adapter.adapter_state().await?;
        debug!("Adapter state: {:?}", state);
        // Unknown counts as enabled
        Ok(!matches!(state, CentralState::PoweredOff))
    }

    #[instrument(skip(self, adapter, on_found))]
    async fn scan(
        &self,
        adapter: &Adapter,
        duration: Duration,
        on_found: &mut (dyn FnMut(Discovered<Peripheral>) + Send),
    ) -> Result<()> {
        info!("Scanning for BLE devices for {:?}", duration);
        adapter.start_scan(ScanFilter::default()).await?;

        let start_time = Instant::now();
        let mut reported = HashSet::new();

        while start_time.elapsed() < duration {
            let peripherals = match adapter.peripherals().await {
                Ok(peripherals) => peripherals,
                Err(e) => {
                    adapter.stop_scan().await?;
                    return Err(e.into());
                }
            };
            debug!("Found {} BLE peripherals so far", peripherals.len());

            for p in peripherals {
                if reported.contains(&p.id()) {
                    continue;
                }
                if let Ok(Some(props)) = p.properties().await {
                    if let Some(name) = props.local_name {
                        trace!("Found device: {} ({})", name, p.address());
                        reported.insert(p.id());
                        on_found(Discovered {
                            identifier: name,
                            peripheral: p,
                        });
                    }
                }
            }

            let remaining = duration.saturating_sub(start_time.elapsed());
            time::sleep(SCAN_POLL_INTERVAL.min(remaining)).await;
        }

        adapter.stop_scan().await?;
        debug!("Scan stopped after {:?}", start_time.elapsed());
        Ok(())
    }

    #[instrument(skip_all)]
    async fn connect(&self, peripheral: &Peripheral) -> Result<bool> {
        info!("Connecting to device...");
        if !peripheral.is_connected().await? {
            peripheral.connect().await?;
        }

        debug!("Discovering services...");
        peripheral.discover_services().await?;
        Ok(peripheral.is_connected().await?)
    }

    async fn is_connected(&self, peripheral: &Peripheral) -> Result<bool> {
        Ok(peripheral.is_connected().await?)
    }

    #[instrument(skip(self, peripheral, data), fields(cmd_length = data.len()))]
    async fn write_request(
        &self,
        peripheral: &Peripheral,
        service: Uuid,
        characteristic: Uuid,
        data: &[u8],
    ) -> Result<()> {
        let write_characteristic = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == characteristic && c.service_uuid == service)
            .ok_or_else(|| Error::Ble(format!("characteristic {} not found", characteristic)))?;

        // Prefer WriteWithResponse when supported
        let write_type = if write_characteristic
            .properties
            .contains(CharPropFlags::WRITE)
        {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };

        trace!("Sending BLE command {:02x?}", data);
        peripheral
            .write(&write_characteristic, data, write_type)
            .await?;
        Ok(())
    }

    async fn disconnect(&self, peripheral: &Peripheral) -> Result<()> {
        if peripheral.is_connected().await? {
            peripheral.disconnect().await?;
        }
        Ok(())
    }
}
