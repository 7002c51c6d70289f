/*!
 # Device profile

 The configured state of one LED strip: identity, display alias, color,
 brightness, animation mode and the desired power state. This is the state
 a connection pushes to the device.
*/

use crate::effects;

/// Clamps a value to [0, 1], mapping NaN to 0
pub(crate) fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Animation mode selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mode {
    /// Index into [`effects::EFFECTS`]
    pub index: usize,
    /// Animation speed, 0 = fastest, 1 = slowest
    pub speed: f32,
}

impl Mode {
    /// Creates a mode, clamping the speed to [0, 1]
    pub fn new(index: usize, speed: f32) -> Self {
        Self {
            index,
            speed: unit(speed),
        }
    }

    /// Protocol byte for this mode, or the "no animation" sentinel
    pub fn code(&self) -> u8 {
        effects::effect_code(self.index)
    }

    /// Display name, "None" for unknown indices
    pub fn name(&self) -> &'static str {
        effects::effect(self.index).map_or(effects::EFFECTS[0].name, |e| e.name)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self {
            index: 0,
            speed: 0.5,
        }
    }
}

/// Configured state of one LED strip
///
/// Color and brightness are kept in [0, 1]; all setters clamp.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    identity: String,
    alias: String,
    color: [f32; 3],
    brightness: f32,
    mode: Mode,
    /// Authoritative desired power state
    pub is_on: bool,
}

impl DeviceProfile {
    /// Creates a profile with white color, full brightness and no animation
    pub fn new(identity: impl Into<String>) -> Self {
        let identity = identity.into();
        Self {
            alias: identity.clone(),
            identity,
            color: [1.0, 1.0, 1.0],
            brightness: 1.0,
            mode: Mode::default(),
            is_on: false,
        }
    }

    /// Identity used for lookups and BLE matching. Never changes.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Display name shown to the user
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Renames the device for display only
    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = alias.into();
    }

    /// RGB color, each channel in [0, 1]
    pub fn color(&self) -> [f32; 3] {
        self.color
    }

    /// Sets the color, clamping every channel
    pub fn set_color(&mut self, color: [f32; 3]) {
        self.color = color.map(unit);
    }

    /// Brightness in [0, 1], multiplied into every color channel
    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Sets the brightness, clamped
    pub fn set_brightness(&mut self, brightness: f32) {
        self.brightness = unit(brightness);
    }

    /// Selected animation mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Sets the animation mode, clamping its speed
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = Mode::new(mode.index, mode.speed);
    }
}
