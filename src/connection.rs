/*!
 # Connection lifecycle and command dispatch

 One [`ConnectionManager`] exists per registered device. It owns the
 discovery/connect state machine and a single-flight command dispatcher:

 ```text
 Idle ──request_connect──▶ Scanning ──match & connect ok──▶ Connected
                              │                               │
                              ├─ match & connect fails ─▶ ConnectFailed
                              ├─ no match in window ────▶ NotFound
                              └─ radio off / no adapter ▶ RadioDisabled
 Connected ──transport reports disconnect──▶ Idle
 ```

 Scans, writes and the liveness watch of a connected device run on
 background tasks. Nothing here blocks the caller; results are published
 through atomics and picked up by
 [`ConnectionManager::poll_connection_lifecycle`].
*/

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::config::LinkConfig;
use crate::profile::DeviceProfile;
use crate::protocol;
use crate::transport::{Discovered, Transport};
use crate::{Error, Result};

/// Connection state of one device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Idle = 0,
    Scanning = 1,
    Connected = 2,
    /// No peripheral advertised the identity during the scan window
    NotFound = 3,
    /// A match was found but connecting failed
    ConnectFailed = 4,
    /// Radio switched off or no adapter present
    RadioDisabled = 5,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Scanning,
            2 => Self::Connected,
            3 => Self::NotFound,
            4 => Self::ConnectFailed,
            5 => Self::RadioDisabled,
            _ => Self::Idle,
        }
    }
}

/// Last recorded outcome, shown to the user as a short string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    NoStatus,
    Scanning,
    Connected,
    ConnectFailed,
    NotFound,
    NotConnected,
    RadioDisabled,
    NoAdapters,
    Busy,
    WriteFailed(String),
    Error(String),
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::NoStatus => write!(f, "No Status"),
            LinkStatus::Scanning => write!(f, "Scanning for device..."),
            LinkStatus::Connected => write!(f, "Connected!"),
            LinkStatus::ConnectFailed => write!(f, "Failed to connect!"),
            LinkStatus::NotFound => write!(f, "Could not find the peripheral!"),
            LinkStatus::NotConnected => write!(f, "Peripheral is not connected!"),
            LinkStatus::RadioDisabled => write!(f, "Bluetooth is not enabled!"),
            LinkStatus::NoAdapters => write!(f, "No Bluetooth adapter found!"),
            LinkStatus::Busy => write!(f, "Device is busy, command dropped"),
            LinkStatus::WriteFailed(e) => write!(f, "Write failed: {}", e),
            LinkStatus::Error(e) => write!(f, "Bluetooth error: {}", e),
        }
    }
}

impl From<&Error> for LinkStatus {
    fn from(error: &Error) -> Self {
        match error {
            Error::NoBluetoothAdapters => LinkStatus::NoAdapters,
            Error::RadioDisabled => LinkStatus::RadioDisabled,
            Error::DeviceNotFound => LinkStatus::NotFound,
            Error::ConnectFailed => LinkStatus::ConnectFailed,
            Error::NotConnected => LinkStatus::NotConnected,
            Error::Busy => LinkStatus::Busy,
            Error::TransportWriteFailed(e) => LinkStatus::WriteFailed(e.clone()),
            other => LinkStatus::Error(other.to_string()),
        }
    }
}

/// What happened to a command handed to [`ConnectionManager::send_command`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Write launched on the background task
    Sent,
    /// Dropped because another command is in flight
    Busy,
    /// Dropped because the device is not connected
    NotConnected,
}

/// State shared between the manager and its own background tasks
struct Shared<P> {
    state: AtomicU8,
    sending: AtomicBool,
    /// Set by the scan task on connect, consumed by the poll
    fresh_connection: AtomicBool,
    /// Set by the write or watch task when the link dropped, consumed by the poll
    link_lost: AtomicBool,
    status: Mutex<LinkStatus>,
    peripheral: Mutex<Option<P>>,
}

impl<P> Shared<P> {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(ConnectionState::Idle as u8),
            sending: AtomicBool::new(false),
            fresh_connection: AtomicBool::new(false),
            link_lost: AtomicBool::new(false),
            status: Mutex::new(LinkStatus::NoStatus),
            peripheral: Mutex::new(None),
        }
    }

    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn set_status(&self, status: LinkStatus) {
        *self.status.lock() = status;
    }

    fn record(&self, error: &Error) {
        self.set_status(LinkStatus::from(error));
    }
}

/// Per-device connection state machine and single-flight dispatcher
pub struct ConnectionManager<T: Transport> {
    identity: String,
    transport: Arc<T>,
    config: LinkConfig,
    shared: Arc<Shared<T::Peripheral>>,
    scan_task: Option<JoinHandle<()>>,
    write_task: Option<JoinHandle<()>>,
    watch_task: Option<JoinHandle<()>>,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(identity: impl Into<String>, transport: Arc<T>, config: LinkConfig) -> Self {
        Self {
            identity: identity.into(),
            transport,
            config,
            shared: Arc::new(Shared::new()),
            scan_task: None,
            write_task: None,
            watch_task: None,
        }
    }

    /// Identity this manager scans for
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Last recorded outcome
    pub fn status(&self) -> LinkStatus {
        self.shared.status.lock().clone()
    }

    /// Current status as a short descriptive string
    pub fn status_str(&self) -> String {
        self.status().to_string()
    }

    pub fn is_scanning(&self) -> bool {
        self.state() == ConnectionState::Scanning
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Whether a command is in flight
    pub fn is_sending(&self) -> bool {
        self.shared.sending.load(Ordering::Acquire)
    }

    /// Starts discovery and connection on a background task.
    /// Does nothing while already scanning or connected.
    #[instrument(skip(self), fields(device = %self.identity))]
    pub fn request_connect(&mut self) {
        match self.state() {
            ConnectionState::Scanning | ConnectionState::Connected => {
                debug!("Connect requested while {:?}, ignoring", self.state());
                return;
            }
            _ => {}
        }

        self.shared.set_state(ConnectionState::Scanning);
        self.shared.set_status(LinkStatus::Scanning);

        let task = scan_and_connect(
            Arc::clone(&self.transport),
            Arc::clone(&self.shared),
            self.identity.clone(),
            self.config.clone(),
        );
        self.scan_task = Some(tokio::spawn(task));
    }

    /// Writes a single command unless the device is disconnected or busy
    pub fn send_command(&mut self, command: &[u8]) -> DispatchOutcome {
        self.dispatch(vec![command.to_vec()])
    }

    /// Sends power, color and mode as one ordered batch so the device
    /// matches the profile
    pub fn apply_full_state(&mut self, profile: &DeviceProfile) -> DispatchOutcome {
        self.dispatch(protocol::encode_full_state(profile))
    }

    /// Flips the desired power state and sends the matching power command.
    /// The flip sticks even when the command is dropped.
    pub fn toggle(&mut self, profile: &mut DeviceProfile) -> DispatchOutcome {
        profile.is_on = !profile.is_on;
        info!(
            device = %self.identity,
            "Turning LED strip {}",
            if profile.is_on { "on" } else { "off" }
        );
        self.set_power(profile)
    }

    /// Sends the power command for the profile's current power state
    pub fn set_power(&mut self, profile: &DeviceProfile) -> DispatchOutcome {
        self.send_command(&protocol::encode_power(profile.is_on))
    }

    /// Reconciles background task results. Never blocks; call once per host loop iteration.
    pub fn poll_connection_lifecycle(&mut self, profile: &DeviceProfile) {
        if self.scan_task.as_ref().is_some_and(JoinHandle::is_finished) {
            trace!(device = %self.identity, "Scan task finished");
            self.scan_task = None;
        }
        if self.write_task.as_ref().is_some_and(JoinHandle::is_finished) {
            self.write_task = None;
        }
        if self.watch_task.as_ref().is_some_and(JoinHandle::is_finished) {
            self.watch_task = None;
        }

        if self.shared.link_lost.swap(false, Ordering::AcqRel) && self.is_connected() {
            warn!(device = %self.identity, "Device disconnected");
            if let Some(task) = self.watch_task.take() {
                task.abort();
            }
            self.shared.peripheral.lock().take();
            self.shared.fresh_connection.store(false, Ordering::Release);
            self.shared.set_state(ConnectionState::Idle);
            self.shared.record(&Error::NotConnected);
        }

        if self.is_connected() && self.watch_task.is_none() {
            self.start_watch();
        }

        if self.is_connected() && self.shared.fresh_connection.load(Ordering::Acquire) {
            debug!(device = %self.identity, "Applying stored state to new connection");
            // A busy link keeps the flag so the next poll tries again
            if self.apply_full_state(profile) != DispatchOutcome::Busy {
                self.shared.fresh_connection.store(false, Ordering::Release);
            }
        }
    }

    /// Waits for in-flight scan and write tasks, then disconnects
    #[instrument(skip(self), fields(device = %self.identity))]
    pub async fn shutdown(mut self) {
        if let Some(task) = self.watch_task.take() {
            task.abort();
        }
        if let Some(task) = self.scan_task.take() {
            debug!("Waiting for scan to finish");
            if let Err(e) = task.await {
                error!("Scan task failed: {}", e);
            }
        }
        if let Some(task) = self.write_task.take() {
            debug!("Waiting for command write to finish");
            if let Err(e) = task.await {
                error!("Write task failed: {}", e);
            }
        }

        let peripheral = self.shared.peripheral.lock().take();
        if let Some(peripheral) = peripheral {
            if let Err(e) = self.transport.disconnect(&peripheral).await {
                warn!("Disconnect failed: {}", e);
            }
        }
        self.shared.set_state(ConnectionState::Idle);
        info!("Connection closed");
    }

    fn dispatch(&mut self, batch: Vec<Vec<u8>>) -> DispatchOutcome {
        match self.try_dispatch(batch) {
            Ok(()) => DispatchOutcome::Sent,
            Err(e) => {
                self.shared.record(&e);
                match e {
                    Error::Busy => DispatchOutcome::Busy,
                    _ => DispatchOutcome::NotConnected,
                }
            }
        }
    }

    /// Claims the flight slot and spawns the write task
    fn try_dispatch(&mut self, batch: Vec<Vec<u8>>) -> Result<()> {
        let peripheral = if self.is_connected() {
            self.shared.peripheral.lock().clone()
        } else {
            None
        };
        let Some(peripheral) = peripheral else {
            debug!(device = %self.identity, "Not connected, command not sent");
            return Err(Error::NotConnected);
        };

        if self
            .shared
            .sending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(device = %self.identity, "Command in flight, dropping new command");
            return Err(Error::Busy);
        }

        let task = write_batch(
            Arc::clone(&self.transport),
            Arc::clone(&self.shared),
            peripheral,
            self.config.clone(),
            batch,
        );
        self.write_task = Some(tokio::spawn(task));
        Ok(())
    }

    fn start_watch(&mut self) {
        let Some(peripheral) = self.shared.peripheral.lock().clone() else {
            return;
        };
        trace!(device = %self.identity, "Watching connection");
        let task = watch_link(
            Arc::clone(&self.transport),
            Arc::clone(&self.shared),
            peripheral,
            self.config.liveness_interval(),
        );
        self.watch_task = Some(tokio::spawn(task));
    }
}

impl<T: Transport> Drop for ConnectionManager<T> {
    fn drop(&mut self) {
        if let Some(task) = self.watch_task.take() {
            task.abort();
        }
    }
}

/// Finds the first adapter, checks the radio and scans for the identity,
/// then connects to the match
async fn discover<T: Transport>(
    transport: &T,
    identity: &str,
    config: &LinkConfig,
) -> Result<T::Peripheral> {
    let adapter = transport
        .list_adapters()
        .await?
        .into_iter()
        .next()
        .ok_or(Error::NoBluetoothAdapters)?;

    if !transport.radio_enabled(&adapter).await? {
        return Err(Error::RadioDisabled);
    }

    let mut found = None;
    let mut on_found = |d: Discovered<T::Peripheral>| {
        if found.is_none() && d.identifier == identity {
            debug!("Found matching device: {}", d.identifier);
            found = Some(d.peripheral);
        }
    };
    if let Err(e) = transport
        .scan(&adapter, config.scan_window(), &mut on_found)
        .await
    {
        warn!("Scan aborted: {}", e);
    }

    let peripheral = found.ok_or(Error::DeviceNotFound)?;
    match transport.connect(&peripheral).await {
        Ok(true) => Ok(peripheral),
        Ok(false) => Err(Error::ConnectFailed),
        Err(e) => {
            warn!("Connect error: {}", e);
            Err(Error::ConnectFailed)
        }
    }
}

#[instrument(skip(transport, shared, config))]
async fn scan_and_connect<T: Transport>(
    transport: Arc<T>,
    shared: Arc<Shared<T::Peripheral>>,
    identity: String,
    config: LinkConfig,
) {
    info!("Scanning for device...");
    match discover(&*transport, &identity, &config).await {
        Ok(peripheral) => {
            *shared.peripheral.lock() = Some(peripheral);
            shared.link_lost.store(false, Ordering::Release);
            shared.fresh_connection.store(true, Ordering::Release);
            shared.set_status(LinkStatus::Connected);
            shared.set_state(ConnectionState::Connected);
            info!("Successfully connected");
        }
        Err(e) => {
            let state = match e {
                Error::NoBluetoothAdapters | Error::RadioDisabled => ConnectionState::RadioDisabled,
                Error::ConnectFailed => ConnectionState::ConnectFailed,
                _ => ConnectionState::NotFound,
            };
            error!("Connection attempt failed: {}", e);
            shared.record(&e);
            shared.set_state(state);
        }
    }
}

/// Writes every command in order, stopping at the first failure
async fn write_all<T: Transport>(
    transport: &T,
    peripheral: &T::Peripheral,
    config: &LinkConfig,
    batch: &[Vec<u8>],
) -> Result<()> {
    for command in batch {
        trace!("Writing {:02x?}", command);
        transport
            .write_request(peripheral, config.service, config.characteristic, command)
            .await
            .map_err(|e| Error::TransportWriteFailed(e.to_string()))?;
    }
    Ok(())
}

#[instrument(skip_all, fields(commands = batch.len()))]
async fn write_batch<T: Transport>(
    transport: Arc<T>,
    shared: Arc<Shared<T::Peripheral>>,
    peripheral: T::Peripheral,
    config: LinkConfig,
    batch: Vec<Vec<u8>>,
) {
    match write_all(&*transport, &peripheral, &config, &batch).await {
        Ok(()) => {
            trace!("Commands sent successfully");
            shared.set_status(LinkStatus::Connected);
        }
        Err(e) => {
            warn!("Command failed: {}", e);
            shared.record(&e);
            if !transport.is_connected(&peripheral).await.unwrap_or(false) {
                shared.link_lost.store(true, Ordering::Release);
            }
        }
    }
    shared.sending.store(false, Ordering::Release);
}

/// Asks the transport every `period` whether the peripheral is still
/// connected. Exits once it is not or the manager left `Connected`.
#[instrument(skip_all)]
async fn watch_link<T: Transport>(
    transport: Arc<T>,
    shared: Arc<Shared<T::Peripheral>>,
    peripheral: T::Peripheral,
    period: Duration,
) {
    loop {
        time::sleep(period).await;
        if shared.state() != ConnectionState::Connected {
            return;
        }
        match transport.is_connected(&peripheral).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("Peripheral reports disconnected");
                break;
            }
            Err(e) => {
                warn!("Connection check failed: {}", e);
                break;
            }
        }
    }
    shared.link_lost.store(true, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::protocol::{TURN_OFF_CMD, TURN_ON_CMD};
    use crate::transport::mock::MockTransport;

    const NAME: &str = "LEDDMX-00-4ACB";

    fn manager(transport: &Arc<MockTransport>) -> ConnectionManager<MockTransport> {
        ConnectionManager::new(NAME, Arc::clone(transport), LinkConfig::default())
    }

    async fn wait_for_scan(link: &ConnectionManager<MockTransport>) {
        while link.is_scanning() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    async fn wait_for_write(link: &ConnectionManager<MockTransport>) {
        while link.is_sending() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn connected(transport: &Arc<MockTransport>, profile: &DeviceProfile) -> ConnectionManager<MockTransport> {
        let mut link = manager(transport);
        link.request_connect();
        wait_for_scan(&link).await;
        link.poll_connection_lifecycle(profile);
        wait_for_write(&link).await;
        link
    }

    #[test(tokio::test(start_paused = true))]
    async fn connects_and_applies_full_state() {
        let transport = Arc::new(MockTransport::advertising(&["other", NAME]));
        let mut profile = DeviceProfile::new(NAME);
        profile.is_on = true;

        let mut link = manager(&transport);
        link.request_connect();
        assert_eq!(link.state(), ConnectionState::Scanning);
        assert_eq!(link.status_str(), "Scanning for device...");

        wait_for_scan(&link).await;
        assert_eq!(link.state(), ConnectionState::Connected);
        assert_eq!(link.status_str(), "Connected!");

        link.poll_connection_lifecycle(&profile);
        wait_for_write(&link).await;

        assert_eq!(transport.written(), protocol::encode_full_state(&profile));

        // Only the first poll after connecting syncs state
        link.poll_connection_lifecycle(&profile);
        wait_for_write(&link).await;
        assert_eq!(transport.written().len(), 3);
    }

    #[test(tokio::test(start_paused = true))]
    async fn second_request_starts_no_scan() {
        let transport = Arc::new(MockTransport::advertising(&[NAME]));
        let mut link = manager(&transport);

        link.request_connect();
        link.request_connect();
        wait_for_scan(&link).await;
        link.request_connect();
        tokio::task::yield_now().await;

        assert_eq!(transport.scan_count(), 1);
        assert!(link.is_connected());
    }

    #[test(tokio::test(start_paused = true))]
    async fn reports_missing_device() {
        let transport = Arc::new(MockTransport::advertising(&["LEDDMX-00-4ACB-2"]));
        let mut link = manager(&transport);

        link.request_connect();
        wait_for_scan(&link).await;

        assert_eq!(link.state(), ConnectionState::NotFound);
        assert_eq!(link.status_str(), "Could not find the peripheral!");

        // Terminal until asked again
        transport.advertised.lock().push(NAME.to_string());
        link.request_connect();
        wait_for_scan(&link).await;
        assert!(link.is_connected());
        assert_eq!(transport.scan_count(), 2);
    }

    #[test(tokio::test(start_paused = true))]
    async fn reports_disabled_radio_without_scanning() {
        let transport = Arc::new(MockTransport::advertising(&[NAME]));
        transport.radio_enabled.store(false, Ordering::SeqCst);
        let mut link = manager(&transport);

        link.request_connect();
        wait_for_scan(&link).await;

        assert_eq!(link.state(), ConnectionState::RadioDisabled);
        assert_eq!(link.status(), LinkStatus::RadioDisabled);
        assert_eq!(transport.scan_count(), 0);
    }

    #[test(tokio::test(start_paused = true))]
    async fn reports_missing_adapter() {
        let transport = Arc::new(MockTransport::advertising(&[NAME]));
        transport.adapters.store(0, Ordering::SeqCst);
        let mut link = manager(&transport);

        link.request_connect();
        wait_for_scan(&link).await;

        assert_eq!(link.state(), ConnectionState::RadioDisabled);
        assert_eq!(link.status(), LinkStatus::NoAdapters);
    }

    #[test(tokio::test(start_paused = true))]
    async fn distinguishes_failed_connect_from_not_found() {
        let transport = Arc::new(MockTransport::advertising(&[NAME]));
        transport.connect_ok.store(false, Ordering::SeqCst);
        let mut link = manager(&transport);

        link.request_connect();
        wait_for_scan(&link).await;

        assert_eq!(link.state(), ConnectionState::ConnectFailed);
        assert_eq!(link.status_str(), "Failed to connect!");
    }

    #[test(tokio::test)]
    async fn send_without_connection_is_recorded() {
        let transport = Arc::new(MockTransport::advertising(&[NAME]));
        let mut link = manager(&transport);

        assert_eq!(link.send_command(&TURN_ON_CMD), DispatchOutcome::NotConnected);
        assert_eq!(link.status(), LinkStatus::NotConnected);
        assert!(!link.is_sending());
        assert!(transport.written().is_empty());
    }

    #[test(tokio::test(start_paused = true))]
    async fn drops_commands_while_one_is_in_flight() {
        let transport = Arc::new(MockTransport::advertising(&[NAME]).holding_writes());
        let profile = DeviceProfile::new(NAME);
        let mut link = manager(&transport);
        link.request_connect();
        wait_for_scan(&link).await;

        // Full state sync occupies the slot until the gate opens
        link.poll_connection_lifecycle(&profile);
        assert!(link.is_sending());

        assert_eq!(link.send_command(&TURN_ON_CMD), DispatchOutcome::Busy);
        assert_eq!(link.status(), LinkStatus::Busy);
        assert!(link.is_sending());

        transport.release_writes(3);
        wait_for_write(&link).await;
        assert_eq!(transport.written(), protocol::encode_full_state(&profile));

        transport.release_writes(1);
        assert_eq!(link.send_command(&TURN_ON_CMD), DispatchOutcome::Sent);
        wait_for_write(&link).await;
        assert_eq!(transport.written().last(), Some(&TURN_ON_CMD.to_vec()));
        assert_eq!(transport.written().len(), 4);
    }

    #[test(tokio::test(start_paused = true))]
    async fn toggle_flips_profile_even_when_dropped() {
        let transport = Arc::new(MockTransport::advertising(&[NAME]));
        let mut profile = DeviceProfile::new(NAME);
        let mut link = manager(&transport);

        assert_eq!(link.toggle(&mut profile), DispatchOutcome::NotConnected);
        assert!(profile.is_on);

        let mut link = connected(&transport, &profile).await;
        assert_eq!(link.toggle(&mut profile), DispatchOutcome::Sent);
        wait_for_write(&link).await;
        assert!(!profile.is_on);
        assert_eq!(transport.written().last(), Some(&TURN_OFF_CMD.to_vec()));
    }

    #[test(tokio::test(start_paused = true))]
    async fn failed_write_on_dead_link_returns_to_idle() {
        let transport = Arc::new(MockTransport::advertising(&[NAME]));
        let profile = DeviceProfile::new(NAME);
        let mut link = connected(&transport, &profile).await;

        transport.fail_writes.store(true, Ordering::SeqCst);
        transport.connected.store(false, Ordering::SeqCst);
        assert_eq!(link.send_command(&TURN_ON_CMD), DispatchOutcome::Sent);
        wait_for_write(&link).await;

        assert!(matches!(link.status(), LinkStatus::WriteFailed(_)));
        assert!(link.is_connected());

        link.poll_connection_lifecycle(&profile);
        assert_eq!(link.state(), ConnectionState::Idle);
        assert_eq!(link.send_command(&TURN_ON_CMD), DispatchOutcome::NotConnected);
    }

    #[test(tokio::test(start_paused = true))]
    async fn failed_write_on_live_link_stays_connected() {
        let transport = Arc::new(MockTransport::advertising(&[NAME]));
        let profile = DeviceProfile::new(NAME);
        let mut link = connected(&transport, &profile).await;

        transport.fail_writes.store(true, Ordering::SeqCst);
        link.send_command(&TURN_ON_CMD);
        wait_for_write(&link).await;
        link.poll_connection_lifecycle(&profile);

        assert!(link.is_connected());
        assert_eq!(link.status_str(), "Write failed: BLE communication error: write rejected");
    }

    #[test(tokio::test(start_paused = true))]
    async fn idle_disconnect_is_noticed_and_reconnects() {
        let transport = Arc::new(MockTransport::advertising(&[NAME]));
        let profile = DeviceProfile::new(NAME);
        let mut link = connected(&transport, &profile).await;

        // Link drops with nothing in flight
        transport.connected.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        link.poll_connection_lifecycle(&profile);

        assert_eq!(link.state(), ConnectionState::Idle);
        assert_eq!(link.status(), LinkStatus::NotConnected);

        link.request_connect();
        wait_for_scan(&link).await;
        assert!(link.is_connected());
        assert_eq!(transport.scan_count(), 2);
    }

    #[test(tokio::test(start_paused = true))]
    async fn live_link_stays_connected_between_checks() {
        let transport = Arc::new(MockTransport::advertising(&[NAME]));
        let profile = DeviceProfile::new(NAME);
        let mut link = connected(&transport, &profile).await;

        for _ in 0..5 {
            tokio::time::sleep(Duration::from_secs(1)).await;
            link.poll_connection_lifecycle(&profile);
        }
        assert!(link.is_connected());
        assert_eq!(link.status_str(), "Connected!");
    }

    #[test]
    fn status_follows_error() {
        let cases = [
            (Error::NoBluetoothAdapters, LinkStatus::NoAdapters),
            (Error::RadioDisabled, LinkStatus::RadioDisabled),
            (Error::DeviceNotFound, LinkStatus::NotFound),
            (Error::ConnectFailed, LinkStatus::ConnectFailed),
            (Error::NotConnected, LinkStatus::NotConnected),
            (Error::Busy, LinkStatus::Busy),
            (
                Error::TransportWriteFailed("timeout".into()),
                LinkStatus::WriteFailed("timeout".into()),
            ),
            (
                Error::Ble("adapter gone".into()),
                LinkStatus::Error("BLE communication error: adapter gone".into()),
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(LinkStatus::from(&error), expected);
        }
    }

    #[test(tokio::test(start_paused = true))]
    async fn shutdown_waits_for_scan_and_disconnects() {
        let transport = Arc::new(MockTransport::advertising(&[NAME]));
        let mut link = manager(&transport);

        link.request_connect();
        link.shutdown().await;

        assert_eq!(transport.scan_count(), 1);
        assert!(!transport.connected.load(Ordering::SeqCst));
    }
}
