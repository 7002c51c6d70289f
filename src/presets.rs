/*!
 # Configuration presets

 Named light and schedule settings shared by every device in a registry.
 Selecting a preset for a device copies its values into that device's
 [`DeviceProfile`] or [`Schedule`]; later edits to the device do not write
 back into the preset.
*/

use serde::{Deserialize, Serialize};

use crate::profile::{DeviceProfile, Mode};
use crate::schedule::Schedule;

pub(crate) fn default_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

pub(crate) fn default_one() -> f32 {
    1.0
}

pub(crate) fn default_speed() -> f32 {
    Mode::default().speed
}

pub(crate) fn default_window_end() -> f32 {
    10.0
}

pub(crate) fn default_repeat() -> u32 {
    1
}

pub(crate) fn default_true() -> bool {
    true
}

/// Named color, brightness, mode and power state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePreset {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: [f32; 3],
    #[serde(default = "default_one")]
    pub brightness: f32,
    #[serde(default)]
    pub mode_index: usize,
    #[serde(default = "default_speed")]
    pub mode_speed: f32,
    #[serde(default)]
    pub is_on: bool,
}

impl ProfilePreset {
    /// White, full brightness, no animation, off
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: default_color(),
            brightness: default_one(),
            mode_index: 0,
            mode_speed: default_speed(),
            is_on: false,
        }
    }

    /// Captures the light settings of a device under a new name
    pub fn from_profile(name: impl Into<String>, profile: &DeviceProfile) -> Self {
        let mode = profile.mode();
        Self {
            name: name.into(),
            color: profile.color(),
            brightness: profile.brightness(),
            mode_index: mode.index,
            mode_speed: mode.speed,
            is_on: profile.is_on,
        }
    }

    /// Copies the preset into a profile. Identity and alias are kept.
    pub fn apply(&self, profile: &mut DeviceProfile) {
        profile.set_color(self.color);
        profile.set_brightness(self.brightness);
        profile.set_mode(Mode::new(self.mode_index, self.mode_speed));
        profile.is_on = self.is_on;
    }
}

/// Named schedule window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePreset {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub window_start: f32,
    #[serde(default = "default_window_end")]
    pub window_end: f32,
    #[serde(default = "default_repeat")]
    pub repeat_count: u32,
    #[serde(default)]
    pub inverted: bool,
}

impl SchedulePreset {
    /// Same window as [`Schedule::default`]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            window_start: 0.0,
            window_end: default_window_end(),
            repeat_count: default_repeat(),
            inverted: false,
        }
    }

    pub fn from_schedule(name: impl Into<String>, schedule: &Schedule) -> Self {
        Self {
            name: name.into(),
            enabled: schedule.enabled,
            window_start: schedule.window_start(),
            window_end: schedule.window_end(),
            repeat_count: schedule.repeat_count(),
            inverted: schedule.inverted,
        }
    }

    /// Builds a fresh schedule with no progress
    pub fn to_schedule(&self) -> Schedule {
        let mut schedule = Schedule::new(
            self.window_start,
            self.window_end,
            self.repeat_count,
            self.inverted,
        );
        schedule.enabled = self.enabled;
        schedule
    }
}
