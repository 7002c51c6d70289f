/*!
 # Device registry

 Ordered collection of managed devices keyed by their identity. Each entry
 owns the device's [`DeviceProfile`], [`Schedule`] and
 [`ConnectionManager`]. The registry also holds the named
 [`ProfilePreset`]s and [`SchedulePreset`]s devices can select, and
 converts to and from the serializable [`RegistrySnapshot`].
*/

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::LinkConfig;
use crate::connection::{ConnectionManager, DispatchOutcome};
use crate::presets::{
    default_color, default_one, default_repeat, default_speed, default_true, default_window_end,
    ProfilePreset, SchedulePreset,
};
use crate::profile::{DeviceProfile, Mode};
use crate::schedule::Schedule;
use crate::transport::Transport;
use crate::{Error, Result};

/// Everything the registry keeps for one device
pub struct DeviceEntry<T: Transport> {
    pub profile: DeviceProfile,
    pub schedule: Schedule,
    link: ConnectionManager<T>,
    /// A schedule toggle was dropped and the power command still has to go out
    pub(crate) power_pending: bool,
    profile_preset: Option<usize>,
    schedule_preset: Option<usize>,
}

impl<T: Transport> DeviceEntry<T> {
    fn new(identity: &str, transport: Arc<T>, config: LinkConfig) -> Self {
        Self {
            profile: DeviceProfile::new(identity),
            schedule: Schedule::default(),
            link: ConnectionManager::new(identity, transport, config),
            power_pending: false,
            profile_preset: None,
            schedule_preset: None,
        }
    }

    pub fn identity(&self) -> &str {
        self.profile.identity()
    }

    /// Connection manager of this device
    pub fn link(&self) -> &ConnectionManager<T> {
        &self.link
    }

    /// Index of the profile preset last selected for this device
    pub fn profile_preset(&self) -> Option<usize> {
        self.profile_preset
    }

    /// Index of the schedule preset last selected for this device
    pub fn schedule_preset(&self) -> Option<usize> {
        self.schedule_preset
    }

    pub fn request_connect(&mut self) {
        self.link.request_connect();
    }

    /// Flips the power state and sends it
    pub fn toggle(&mut self) -> DispatchOutcome {
        self.link.toggle(&mut self.profile)
    }

    /// Sends the current power state
    pub fn set_power(&mut self) -> DispatchOutcome {
        self.link.set_power(&self.profile)
    }

    /// Sends power, color and mode from the profile
    pub fn apply_full_state(&mut self) -> DispatchOutcome {
        self.link.apply_full_state(&self.profile)
    }

    pub fn send_command(&mut self, command: &[u8]) -> DispatchOutcome {
        self.link.send_command(command)
    }

    /// Reconciles the connection's background work
    pub fn poll(&mut self) {
        self.link.poll_connection_lifecycle(&self.profile);
    }
}

/// Ordered collection of devices keyed by identity
pub struct DeviceRegistry<T: Transport> {
    transport: Arc<T>,
    config: LinkConfig,
    devices: Vec<DeviceEntry<T>>,
    selected: Option<String>,
    profile_presets: Vec<ProfilePreset>,
    schedule_presets: Vec<SchedulePreset>,
}

impl<T: Transport> DeviceRegistry<T> {
    /// Creates an empty registry owning the transport
    pub fn new(transport: T, config: LinkConfig) -> Self {
        Self::with_shared(Arc::new(transport), config)
    }

    /// Creates an empty registry on a transport shared with the caller
    pub fn with_shared(transport: Arc<T>, config: LinkConfig) -> Self {
        Self {
            transport,
            config,
            devices: Vec::new(),
            selected: None,
            profile_presets: Vec::new(),
            schedule_presets: Vec::new(),
        }
    }

    /// Creates profile, default schedule and connection manager for a new device.
    /// The first registered device becomes the selection.
    #[instrument(skip(self))]
    pub fn register(&mut self, identity: &str) -> Result<&mut DeviceEntry<T>> {
        if self.position(identity).is_some() {
            return Err(Error::DuplicateDevice(identity.to_string()));
        }
        info!("Registering device");
        self.devices.push(DeviceEntry::new(
            identity,
            Arc::clone(&self.transport),
            self.config.clone(),
        ));
        if self.selected.is_none() {
            self.selected = Some(identity.to_string());
        }
        self.devices
            .last_mut()
            .ok_or_else(|| Error::UnknownDevice(identity.to_string()))
    }

    /// Removes a device once its in-flight scan or write has finished
    #[instrument(skip(self))]
    pub async fn deregister(&mut self, identity: &str) -> Result<()> {
        let index = self
            .position(identity)
            .ok_or_else(|| Error::UnknownDevice(identity.to_string()))?;
        let entry = self.devices.remove(index);
        if self.selected.as_deref() == Some(identity) {
            self.selected = self.devices.first().map(|d| d.identity().to_string());
        }
        entry.link.shutdown().await;
        info!("Device removed");
        Ok(())
    }

    /// Changes the display alias. The identity is left alone.
    pub fn rename(&mut self, identity: &str, alias: &str) -> Result<()> {
        self.get_mut(identity)?.profile.set_alias(alias);
        Ok(())
    }

    /// Looks up a device by identity
    pub fn get(&self, identity: &str) -> Result<&DeviceEntry<T>> {
        self.devices
            .iter()
            .find(|d| d.identity() == identity)
            .ok_or_else(|| Error::UnknownDevice(identity.to_string()))
    }

    pub fn get_mut(&mut self, identity: &str) -> Result<&mut DeviceEntry<T>> {
        self.devices
            .iter_mut()
            .find(|d| d.identity() == identity)
            .ok_or_else(|| Error::UnknownDevice(identity.to_string()))
    }

    /// Whether a device with this identity is registered
    pub fn contains(&self, identity: &str) -> bool {
        self.position(identity).is_some()
    }

    /// Devices in registration order
    pub fn iter(&self) -> impl Iterator<Item = &DeviceEntry<T>> {
        self.devices.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DeviceEntry<T>> {
        self.devices.iter_mut()
    }

    /// Identities in registration order
    pub fn identities(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.identity().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Makes a registered device the selection
    pub fn select(&mut self, identity: &str) -> Result<()> {
        if !self.contains(identity) {
            return Err(Error::UnknownDevice(identity.to_string()));
        }
        self.selected = Some(identity.to_string());
        Ok(())
    }

    /// Currently selected device, if any
    pub fn selected(&self) -> Option<&DeviceEntry<T>> {
        self.selected.as_deref().and_then(|id| self.get(id).ok())
    }

    pub fn request_connect(&mut self, identity: &str) -> Result<()> {
        self.get_mut(identity)?.request_connect();
        Ok(())
    }

    pub fn toggle(&mut self, identity: &str) -> Result<DispatchOutcome> {
        Ok(self.get_mut(identity)?.toggle())
    }

    pub fn set_power(&mut self, identity: &str) -> Result<DispatchOutcome> {
        Ok(self.get_mut(identity)?.set_power())
    }

    pub fn apply_full_state(&mut self, identity: &str) -> Result<DispatchOutcome> {
        Ok(self.get_mut(identity)?.apply_full_state())
    }

    /// Adds a profile preset and returns its index
    pub fn add_profile_preset(&mut self, preset: ProfilePreset) -> usize {
        self.profile_presets.push(preset);
        self.profile_presets.len() - 1
    }

    /// Adds a schedule preset and returns its index
    pub fn add_schedule_preset(&mut self, preset: SchedulePreset) -> usize {
        self.schedule_presets.push(preset);
        self.schedule_presets.len() - 1
    }

    pub fn profile_presets(&self) -> &[ProfilePreset] {
        &self.profile_presets
    }

    pub fn schedule_presets(&self) -> &[SchedulePreset] {
        &self.schedule_presets
    }

    /// Replaces a profile preset. Devices keep the values they copied
    /// until the preset is selected again.
    pub fn update_profile_preset(&mut self, index: usize, preset: ProfilePreset) -> Result<()> {
        let slot = self
            .profile_presets
            .get_mut(index)
            .ok_or(Error::UnknownPreset(index))?;
        *slot = preset;
        Ok(())
    }

    /// Replaces a schedule preset. Devices keep their current schedule
    /// until the preset is selected again.
    pub fn update_schedule_preset(&mut self, index: usize, preset: SchedulePreset) -> Result<()> {
        let slot = self
            .schedule_presets
            .get_mut(index)
            .ok_or(Error::UnknownPreset(index))?;
        *slot = preset;
        Ok(())
    }

    /// Copies a profile preset into a device and pushes the result to it
    #[instrument(skip(self))]
    pub fn select_config(&mut self, identity: &str, index: usize) -> Result<DispatchOutcome> {
        let preset = self
            .profile_presets
            .get(index)
            .cloned()
            .ok_or(Error::UnknownPreset(index))?;
        let entry = self.get_mut(identity)?;
        preset.apply(&mut entry.profile);
        entry.profile_preset = Some(index);
        entry.power_pending = false;
        info!("Selected profile preset {}", preset.name);
        Ok(entry.apply_full_state())
    }

    /// Replaces a device's schedule with a fresh one built from a preset
    #[instrument(skip(self))]
    pub fn select_schedule(&mut self, identity: &str, index: usize) -> Result<()> {
        let schedule = self
            .schedule_presets
            .get(index)
            .map(SchedulePreset::to_schedule)
            .ok_or(Error::UnknownPreset(index))?;
        let entry = self.get_mut(identity)?;
        entry.schedule = schedule;
        entry.schedule_preset = Some(index);
        entry.power_pending = false;
        info!("Selected schedule preset {}", index);
        Ok(())
    }

    /// Reconciles every device's background tasks. Never blocks.
    pub fn poll_connections(&mut self) {
        for device in &mut self.devices {
            device.poll();
        }
    }

    /// Waits for all in-flight work and disconnects every device
    #[instrument(skip(self), fields(devices = self.devices.len()))]
    pub async fn shutdown(&mut self) {
        let links = self.devices.drain(..).map(|d| d.link.shutdown());
        join_all(links).await;
        self.selected = None;
        info!("All devices shut down");
    }

    /// Captures every persisted field
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            devices: self.devices.iter().map(DeviceRecord::from).collect(),
            selected: self.selected.clone(),
            profile_presets: self.profile_presets.clone(),
            schedule_presets: self.schedule_presets.clone(),
        }
    }

    /// Replaces the presets, registers missing devices and overwrites the
    /// fields of known ones. Preset selections pointing past the restored
    /// lists are dropped.
    #[instrument(skip_all, fields(devices = snapshot.devices.len()))]
    pub fn restore(&mut self, snapshot: &RegistrySnapshot) -> Result<()> {
        self.profile_presets = snapshot.profile_presets.clone();
        self.schedule_presets = snapshot.schedule_presets.clone();
        let profiles = self.profile_presets.len();
        let schedules = self.schedule_presets.len();

        for record in &snapshot.devices {
            if !self.contains(&record.identity) {
                self.register(&record.identity)?;
            }
            let entry = self.get_mut(&record.identity)?;
            record.apply(entry);
            entry.profile_preset = record.profile_preset.filter(|&i| i < profiles);
            entry.schedule_preset = record.schedule_preset.filter(|&i| i < schedules);
            debug!(device = %record.identity, "Restored device");
        }
        if let Some(selected) = &snapshot.selected {
            if self.select(selected).is_err() {
                debug!("Selected device {} is not registered", selected);
            }
        }
        Ok(())
    }

    fn position(&self, identity: &str) -> Option<usize> {
        self.devices.iter().position(|d| d.identity() == identity)
    }
}

/// Serializable registry contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySnapshot {
    pub devices: Vec<DeviceRecord>,
    pub selected: Option<String>,
    pub profile_presets: Vec<ProfilePreset>,
    pub schedule_presets: Vec<SchedulePreset>,
}

/// Persisted fields of one device. Everything but the identity is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub identity: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub is_on: bool,
    #[serde(default = "default_color")]
    pub color: [f32; 3],
    #[serde(default = "default_one")]
    pub brightness: f32,
    #[serde(default)]
    pub mode_index: usize,
    #[serde(default = "default_speed")]
    pub mode_speed: f32,
    #[serde(default)]
    pub window_start: f32,
    #[serde(default = "default_window_end")]
    pub window_end: f32,
    #[serde(default = "default_repeat")]
    pub repeat_count: u32,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Index into [`RegistrySnapshot::profile_presets`]
    #[serde(default)]
    pub profile_preset: Option<usize>,
    /// Index into [`RegistrySnapshot::schedule_presets`]
    #[serde(default)]
    pub schedule_preset: Option<usize>,
}

impl DeviceRecord {
    /// Record with every field at its default
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            alias: None,
            is_on: false,
            color: default_color(),
            brightness: default_one(),
            mode_index: 0,
            mode_speed: default_speed(),
            window_start: 0.0,
            window_end: default_window_end(),
            repeat_count: default_repeat(),
            inverted: false,
            enabled: true,
            profile_preset: None,
            schedule_preset: None,
        }
    }

    fn apply<T: Transport>(&self, entry: &mut DeviceEntry<T>) {
        let profile = &mut entry.profile;
        profile.set_alias(self.alias.clone().unwrap_or_else(|| self.identity.clone()));
        profile.is_on = self.is_on;
        profile.set_color(self.color);
        profile.set_brightness(self.brightness);
        profile.set_mode(Mode::new(self.mode_index, self.mode_speed));

        let mut schedule = Schedule::new(
            self.window_start,
            self.window_end,
            self.repeat_count,
            self.inverted,
        );
        schedule.enabled = self.enabled;
        entry.schedule = schedule;
    }
}

impl<T: Transport> From<&DeviceEntry<T>> for DeviceRecord {
    fn from(entry: &DeviceEntry<T>) -> Self {
        let profile = &entry.profile;
        let schedule = &entry.schedule;
        let mode = profile.mode();
        Self {
            identity: profile.identity().to_string(),
            alias: Some(profile.alias().to_string()),
            is_on: profile.is_on,
            color: profile.color(),
            brightness: profile.brightness(),
            mode_index: mode.index,
            mode_speed: mode.speed,
            window_start: schedule.window_start(),
            window_end: schedule.window_end(),
            repeat_count: schedule.repeat_count(),
            inverted: schedule.inverted,
            enabled: schedule.enabled,
            profile_preset: entry.profile_preset,
            schedule_preset: entry.schedule_preset,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::connection::ConnectionState;
    use crate::transport::mock::MockTransport;

    fn registry(names: &[&str]) -> (Arc<MockTransport>, DeviceRegistry<MockTransport>) {
        let transport = Arc::new(MockTransport::advertising(names));
        let registry = DeviceRegistry::with_shared(Arc::clone(&transport), LinkConfig::default());
        (transport, registry)
    }

    #[test]
    fn registers_with_defaults_and_selects_first() {
        let (_, mut registry) = registry(&[]);
        registry.register("a").unwrap();
        registry.register("b").unwrap();

        let entry = registry.get("b").unwrap();
        assert_eq!(entry.schedule, Schedule::default());
        assert_eq!(entry.profile, DeviceProfile::new("b"));
        assert_eq!(entry.link().state(), ConnectionState::Idle);
        assert_eq!(registry.identities(), vec!["a", "b"]);
        assert_eq!(registry.selected().map(DeviceEntry::identity), Some("a"));
    }

    #[test]
    fn rejects_duplicates_and_unknown_lookups() {
        let (_, mut registry) = registry(&[]);
        registry.register("a").unwrap();

        assert!(matches!(registry.register("a"), Err(Error::DuplicateDevice(id)) if id == "a"));
        assert!(matches!(registry.get("zz"), Err(Error::UnknownDevice(_))));
        assert!(matches!(registry.rename("zz", "x"), Err(Error::UnknownDevice(_))));
        assert!(matches!(registry.select("zz"), Err(Error::UnknownDevice(_))));
        assert!(matches!(registry.toggle("zz"), Err(Error::UnknownDevice(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rename_keeps_identity_for_lookup() {
        let (_, mut registry) = registry(&[]);
        registry.register("ELK-BLEDOM").unwrap();
        registry.rename("ELK-BLEDOM", "Desk").unwrap();

        let entry = registry.get("ELK-BLEDOM").unwrap();
        assert_eq!(entry.profile.alias(), "Desk");
        assert_eq!(entry.link().identity(), "ELK-BLEDOM");
        assert!(registry.get("Desk").is_err());
    }

    #[test(tokio::test(start_paused = true))]
    async fn deregister_waits_for_scan_and_moves_selection() {
        let (transport, mut registry) = registry(&["a"]);
        registry.register("a").unwrap();
        registry.register("b").unwrap();
        registry.request_connect("a").unwrap();

        registry.deregister("a").await.unwrap();

        assert_eq!(transport.scan_count(), 1);
        assert!(!registry.contains("a"));
        assert_eq!(registry.selected().map(DeviceEntry::identity), Some("b"));
        assert!(matches!(registry.deregister("a").await, Err(Error::UnknownDevice(_))));
    }

    #[test(tokio::test(start_paused = true))]
    async fn polls_every_device() {
        let (transport, mut registry) = registry(&["a", "b"]);
        for id in ["a", "b"] {
            registry.register(id).unwrap();
            registry.request_connect(id).unwrap();
        }
        while registry.iter().any(|d| d.link().is_scanning()) {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        registry.poll_connections();
        while registry.iter().any(|d| d.link().is_sending()) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(transport.written().len(), 6);
        registry.shutdown().await;
        assert!(registry.is_empty());
    }

    #[test]
    fn partial_records_fall_back_to_defaults() {
        let snapshot: RegistrySnapshot =
            serde_json::from_str(r#"{"devices": [{"identity": "a"}, {"identity": "b", "brightness": 0.5, "inverted": true}]}"#)
                .unwrap();
        let (_, mut registry) = registry(&[]);
        registry.restore(&snapshot).unwrap();

        let a = registry.get("a").unwrap();
        assert_eq!(a.profile, DeviceProfile::new("a"));
        assert_eq!(a.schedule, Schedule::default());

        let b = registry.get("b").unwrap();
        assert_eq!(b.profile.brightness(), 0.5);
        assert!(b.schedule.inverted);
        assert_eq!(b.schedule.window_end(), 10.0);
    }

    #[test]
    fn snapshot_restores_into_fresh_registry() {
        let (_, mut registry) = registry(&[]);
        let entry = registry.register("a").unwrap();
        entry.profile.set_color([0.1, 0.2, 0.3]);
        entry.profile.set_mode(Mode::new(4, 0.75));
        entry.profile.is_on = true;
        entry.schedule = Schedule::new(2.0, 5.0, 3, true);
        registry.register("b").unwrap();
        registry.rename("b", "Shelf").unwrap();
        registry.select("b").unwrap();

        let snapshot = registry.snapshot();
        let (_, mut restored) = self::registry(&[]);
        restored.restore(&snapshot).unwrap();

        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.selected().map(|d| d.profile.alias()), Some("Shelf"));
    }

    #[test]
    fn restored_values_are_clamped() {
        let mut record = DeviceRecord::new("a");
        record.color = [2.0, -1.0, 0.5];
        record.window_start = 8.0;
        record.window_end = 4.0;
        let snapshot = RegistrySnapshot {
            devices: vec![record],
            ..RegistrySnapshot::default()
        };
        let (_, mut registry) = registry(&[]);
        registry.restore(&snapshot).unwrap();

        let a = registry.get("a").unwrap();
        assert_eq!(a.profile.color(), [1.0, 0.0, 0.5]);
        assert!(a.schedule.is_done());
    }

    fn evening() -> ProfilePreset {
        ProfilePreset {
            color: [1.0, 0.5, 0.0],
            brightness: 0.4,
            is_on: true,
            ..ProfilePreset::new("Evening")
        }
    }

    #[test]
    fn select_config_rejects_out_of_range_index() {
        let (_, mut registry) = registry(&[]);
        registry.register("a").unwrap();
        registry.add_profile_preset(evening());
        registry.add_schedule_preset(SchedulePreset::new("Ten seconds"));

        assert!(matches!(registry.select_config("a", 1), Err(Error::UnknownPreset(1))));
        assert!(matches!(registry.select_schedule("a", 5), Err(Error::UnknownPreset(5))));
        assert!(matches!(
            registry.update_profile_preset(3, evening()),
            Err(Error::UnknownPreset(3))
        ));
        assert!(matches!(registry.select_config("zz", 0), Err(Error::UnknownDevice(_))));

        let entry = registry.get("a").unwrap();
        assert_eq!(entry.profile, DeviceProfile::new("a"));
        assert_eq!(entry.profile_preset(), None);
    }

    #[test(tokio::test(start_paused = true))]
    async fn select_config_copies_preset_and_pushes_it() {
        let (transport, mut registry) = registry(&["a"]);
        registry.register("a").unwrap();
        registry.request_connect("a").unwrap();
        while registry.get("a").unwrap().link().is_scanning() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        let index = registry.add_profile_preset(evening());

        let outcome = registry.select_config("a", index).unwrap();

        assert_eq!(outcome, DispatchOutcome::Sent);
        while registry.get("a").unwrap().link().is_sending() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let entry = registry.get("a").unwrap();
        assert_eq!(entry.profile_preset(), Some(index));
        assert_eq!(entry.profile.color(), [1.0, 0.5, 0.0]);
        assert!(entry.profile.is_on);
        assert_eq!(transport.written(), crate::protocol::encode_full_state(&entry.profile));

        // Editing the device leaves the preset alone
        registry.get_mut("a").unwrap().profile.set_brightness(1.0);
        assert_eq!(registry.profile_presets()[index].brightness, 0.4);
    }

    #[test]
    fn select_schedule_starts_fresh_window() {
        let (_, mut registry) = registry(&[]);
        registry.register("a").unwrap();
        let index = registry.add_schedule_preset(SchedulePreset {
            window_start: 2.0,
            window_end: 5.0,
            repeat_count: 2,
            ..SchedulePreset::new("Blink")
        });

        registry.select_schedule("a", index).unwrap();

        let entry = registry.get("a").unwrap();
        assert_eq!(entry.schedule, Schedule::new(2.0, 5.0, 2, false));
        assert_eq!(entry.schedule_preset(), Some(index));
    }

    #[test]
    fn presets_and_selections_survive_snapshot() {
        let (_, mut registry) = registry(&[]);
        registry.register("a").unwrap();
        registry.register("b").unwrap();
        let light = registry.add_profile_preset(evening());
        let window = registry.add_schedule_preset(SchedulePreset::new("Default"));
        registry.select_config("a", light).unwrap();
        registry.select_schedule("b", window).unwrap();

        let snapshot = registry.snapshot();
        let (_, mut restored) = self::registry(&[]);
        restored.restore(&snapshot).unwrap();

        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.profile_presets(), &[evening()]);
        assert_eq!(restored.get("a").unwrap().profile_preset(), Some(light));
        assert_eq!(restored.get("b").unwrap().schedule_preset(), Some(window));
    }

    #[test]
    fn dangling_selection_is_dropped_on_restore() {
        let snapshot: RegistrySnapshot = serde_json::from_str(
            r#"{"devices": [{"identity": "a", "profile_preset": 2, "schedule_preset": 0}],
                "schedule_presets": [{"name": "Default"}]}"#,
        )
        .unwrap();
        let (_, mut registry) = registry(&[]);
        registry.restore(&snapshot).unwrap();

        let a = registry.get("a").unwrap();
        assert_eq!(a.profile_preset(), None);
        assert_eq!(a.schedule_preset(), Some(0));
    }
}
