/*!
 # Command encoding

 Pure translation of a [`DeviceProfile`] into the fixed-format byte commands
 written to the strip's write characteristic. Inputs are clamped before
 encoding, so none of these functions can fail.
*/

use uuid::Uuid;

use crate::profile::{unit, DeviceProfile};

/// GATT service holding the write characteristic
pub const WRITE_SERVICE: Uuid = Uuid::from_u128(0x0000ffd5_0000_1000_8000_00805f9b34fb);
/// Characteristic all commands are written to
pub const WRITE_CHARACTERISTIC: Uuid = Uuid::from_u128(0x0000ffd9_0000_1000_8000_00805f9b34fb);

/// Command to turn the device on
pub const TURN_ON_CMD: [u8; 3] = [0xcc, 0x23, 0x33];
/// Command to turn the device off
pub const TURN_OFF_CMD: [u8; 3] = [0xcc, 0x24, 0x33];
/// Color command, RGB bytes go at offsets 1..=3
pub const COLOR_TEMPLATE: [u8; 7] = [0x56, 0x00, 0x00, 0x00, 0x00, 0xf0, 0xaa];
/// Mode command, mode byte at offset 1 and speed byte at offset 2
pub const MODE_TEMPLATE: [u8; 4] = [0xbb, 0x00, 0x00, 0x44];

/// Fastest animation speed byte
pub const SPEED_MIN: u8 = 1;
/// Slowest animation speed byte
pub const SPEED_MAX: u8 = 31;

/// Scales a color channel by brightness into a byte
pub fn channel_byte(channel: f32, brightness: f32) -> u8 {
    (unit(channel) * unit(brightness) * 255.0)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Maps speed (0 = fastest, 1 = slowest) onto the inverted [1, 31] protocol range
pub fn speed_byte(speed: f32) -> u8 {
    let span = f32::from(SPEED_MAX - SPEED_MIN);
    (f32::from(SPEED_MIN) + (1.0 - unit(speed)) * span)
        .round()
        .clamp(f32::from(SPEED_MIN), f32::from(SPEED_MAX)) as u8
}

pub fn encode_power(is_on: bool) -> [u8; 3] {
    if is_on {
        TURN_ON_CMD
    } else {
        TURN_OFF_CMD
    }
}

pub fn encode_color(profile: &DeviceProfile) -> [u8; 7] {
    let mut cmd = COLOR_TEMPLATE;
    let brightness = profile.brightness();
    for (slot, channel) in cmd[1..4].iter_mut().zip(profile.color()) {
        *slot = channel_byte(channel, brightness);
    }
    cmd
}

pub fn encode_mode(profile: &DeviceProfile) -> [u8; 4] {
    let mode = profile.mode();
    let mut cmd = MODE_TEMPLATE;
    cmd[1] = mode.code();
    cmd[2] = speed_byte(mode.speed);
    cmd
}

/// Power, color and mode commands in the order the firmware expects them
pub fn encode_full_state(profile: &DeviceProfile) -> Vec<Vec<u8>> {
    vec![
        encode_power(profile.is_on).to_vec(),
        encode_color(profile).to_vec(),
        encode_mode(profile).to_vec(),
    ]
}
