/*!
 # Transport capability

 The wireless link is injected into the connection managers through the
 [`Transport`] trait. [`crate::bluetooth::BtleplugTransport`] is the
 production implementation.
*/

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::Result;

/// A peripheral seen during a scan
#[derive(Debug, Clone)]
pub struct Discovered<P> {
    /// Advertised identifier, compared exactly against a device identity
    pub identifier: String,
    pub peripheral: P,
}

/// Discovery, connection and write operations of a BLE stack
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Adapter: Send + Sync + 'static;
    type Peripheral: Clone + Send + Sync + 'static;

    async fn list_adapters(&self) -> Result<Vec<Self::Adapter>>;

    async fn radio_enabled(&self, adapter: &Self::Adapter) -> Result<bool>;

    /// Scans for `duration`, reporting every discovered peripheral to `on_found`.
    /// Returns once the scan has been stopped.
    async fn scan(
        &self,
        adapter: &Self::Adapter,
        duration: Duration,
        on_found: &mut (dyn FnMut(Discovered<Self::Peripheral>) + Send),
    ) -> Result<()>;

    /// Connects and returns whether the peripheral reports itself connected
    async fn connect(&self, peripheral: &Self::Peripheral) -> Result<bool>;

    async fn is_connected(&self, peripheral: &Self::Peripheral) -> Result<bool>;

    async fn write_request(
        &self,
        peripheral: &Self::Peripheral,
        service: Uuid,
        characteristic: Uuid,
        data: &[u8],
    ) -> Result<()>;

    async fn disconnect(&self, peripheral: &Self::Peripheral) -> Result<()>;
}
