/*!
 # Animation modes for LED strips

 This module defines the fixed table of animation modes understood by the
 strip firmware. Index 0 is "no animation"; every other index maps to a
 crossfade, strobe or jump pattern.
*/

/// Mode byte sent when no animation is active or the index is unknown
pub const NO_EFFECT: u8 = 0x00;

/// A single entry of the animation mode table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
    /// Human readable name
    pub name: &'static str,
    /// Protocol byte placed in the mode command
    pub code: u8,
}

/// Predefined animation modes with their command values, indexed by mode index
pub const EFFECTS: [Effect; 21] = [
    Effect { name: "None", code: NO_EFFECT },
    Effect { name: "Seven color cross fade", code: 0x25 },
    Effect { name: "Red gradual change", code: 0x26 },
    Effect { name: "Green gradual change", code: 0x27 },
    Effect { name: "Blue gradual change", code: 0x28 },
    Effect { name: "Yellow gradual change", code: 0x29 },
    Effect { name: "Cyan gradual change", code: 0x2a },
    Effect { name: "Purple gradual change", code: 0x2b },
    Effect { name: "White gradual change", code: 0x2c },
    Effect { name: "Red, Green cross fade", code: 0x2d },
    Effect { name: "Red blue cross fade", code: 0x2e },
    Effect { name: "Green blue cross fade", code: 0x2f },
    Effect { name: "Seven color strobe flash", code: 0x30 },
    Effect { name: "Red strobe flash", code: 0x31 },
    Effect { name: "Green strobe flash", code: 0x32 },
    Effect { name: "Blue strobe flash", code: 0x33 },
    Effect { name: "Yellow strobe flash", code: 0x34 },
    Effect { name: "Cyan strobe flash", code: 0x35 },
    Effect { name: "Purple strobe flash", code: 0x36 },
    Effect { name: "White strobe flash", code: 0x37 },
    Effect { name: "Seven color jumping change", code: 0x38 },
];

/// Looks up an effect by mode index
pub fn effect(index: usize) -> Option<&'static Effect> {
    EFFECTS.get(index)
}

/// Protocol byte for a mode index; unknown indices fall back to [`NO_EFFECT`]
pub fn effect_code(index: usize) -> u8 {
    effect(index).map_or(NO_EFFECT, |e| e.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::none(0, 0x00)]
    #[case::first(1, 0x25)]
    #[case::last(20, 0x38)]
    #[case::out_of_range(21, NO_EFFECT)]
    #[case::far_out_of_range(usize::MAX, NO_EFFECT)]
    fn maps_index_to_code(#[case] index: usize, #[case] expected: u8) {
        assert_eq!(effect_code(index), expected);
    }

    #[test]
    fn codes_are_contiguous_after_none() {
        for (i, e) in EFFECTS.iter().enumerate().skip(1) {
            assert_eq!(e.code, 0x24 + i as u8, "{}", e.name);
        }
    }
}
